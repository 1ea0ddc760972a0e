//! Persistence bridge for persistent world-state variables.
//!
//! Variables live in two parallel stores: the live store that dialogue reads
//! and mutates, and the save store the host serializes. The bridge copies
//! variable values live→save when the host writes a save, and save→live once
//! the host finishes restoring a loaded world. Outside that transition
//! window the two stores agree on every variable value.

use crate::data::DataStore;
use tracing::debug;

/// Mirror every persistent variable from the live store into the save store.
///
/// Runs just before the host's own save procedure so the variables ride
/// along in the same save file. Records of any other kind are skipped.
pub fn mirror_variables(live: &DataStore, save: &mut DataStore) {
    let mut mirrored = 0usize;
    for record in live.records() {
        if !record.kind.is_variable() {
            continue;
        }
        let id = save.create(record.kind, record.string_id.clone(), record.name.clone());
        if let Some(saved) = save.get_mut(id) {
            saved.copy_values_from(record);
            mirrored += 1;
        }
    }
    debug!(mirrored, "mirrored persistent variables into save store");
}

/// Copy every persistent variable from a restored save store into the live
/// store, overwriting whatever the live store currently holds.
///
/// Matching is by stable string identifier. A saved variable with no live
/// counterpart is skipped silently; that soft inconsistency is accepted.
pub fn restore_variables(save: &DataStore, live: &mut DataStore) {
    let mut restored = 0usize;
    for record in save.records() {
        if !record.kind.is_variable() {
            continue;
        }
        if live.update_from_record(record) {
            restored += 1;
        } else {
            debug!(string_id = %record.string_id, "saved variable has no live counterpart");
        }
    }
    debug!(restored, "restored persistent variables from save store");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::VALUE_FIELD;
    use crate::data::{DataKind, DataRecord, DataStore};

    fn variable(string_id: &str, value: i32) -> DataRecord {
        let mut record = DataRecord::new(DataKind::VARIABLE, string_id, string_id);
        record.set_int(VALUE_FIELD, value);
        record
    }

    #[test]
    fn test_mirror_copies_only_variables() {
        let mut live = DataStore::new();
        live.insert(variable("var-a", 3));
        live.insert(DataRecord::new(DataKind(2), "item-sword", "Sword"));

        let mut save = DataStore::new();
        mirror_variables(&live, &mut save);

        assert_eq!(save.len(), 1);
        assert_eq!(save.by_string_id("var-a").unwrap().int(VALUE_FIELD), Some(3));
        assert!(save.by_string_id("item-sword").is_none());
    }

    #[test]
    fn test_mirror_overwrites_stale_save_entry() {
        let mut live = DataStore::new();
        live.insert(variable("var-a", 9));

        let mut save = DataStore::new();
        save.insert(variable("var-a", 1));
        mirror_variables(&live, &mut save);

        assert_eq!(save.len(), 1);
        assert_eq!(save.by_string_id("var-a").unwrap().int(VALUE_FIELD), Some(9));
    }

    #[test]
    fn test_restore_overwrites_live_value() {
        let mut live = DataStore::new();
        live.insert(variable("var-a", 99));

        let mut save = DataStore::new();
        save.insert(variable("var-a", 7));
        restore_variables(&save, &mut live);

        assert_eq!(live.by_string_id("var-a").unwrap().int(VALUE_FIELD), Some(7));
    }

    #[test]
    fn test_restore_skips_unknown_variable() {
        let mut live = DataStore::new();
        live.insert(variable("var-a", 1));

        let mut save = DataStore::new();
        save.insert(variable("var-gone", 5));
        restore_variables(&save, &mut live);

        assert_eq!(live.len(), 1);
        assert_eq!(live.by_string_id("var-a").unwrap().int(VALUE_FIELD), Some(1));
    }
}
