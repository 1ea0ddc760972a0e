//! QA tests for persistent-variable save/load and the association invariant.
//!
//! These tests verify that variable state survives the host's save/load
//! cycle and that the query-association invariant is enforced loudly:
//! - live→save mirroring on save
//! - save→live restoration on load completion
//! - the full round trip with an intervening mutation
//! - save-store JSON serialization (the host serializes the container)
//!
//! Run with: `cargo test --test qa_persistence`

use dialogue_extensions::data::{DataKind, DataRecord, DataRef, DataStore};
use dialogue_extensions::effects::SET_VARIABLE;
use dialogue_extensions::testing::ScriptedHost;
use dialogue_extensions::{
    DataId, DialogueContext, Extensions, ExtensionError, LineData, QueryId,
};

fn setup() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn variable(string_id: &str, value: i32) -> DataRecord {
    let mut record = DataRecord::new(DataKind::VARIABLE, string_id, string_id);
    record.set_int("value", value);
    record
}

// =============================================================================
// SAVE / LOAD ROUND TRIP
// =============================================================================

#[test]
fn test_variable_round_trip_survives_mutation() {
    setup();
    let extensions = Extensions::new();
    let mut live = DataStore::new();
    let variable_id = live.insert(variable("var-debt", 0));

    // Set the variable to 7 through a dialogue effect.
    let mut host = ScriptedHost::new();
    let speaker = host.add_character("speaker");
    let partner = host.add_character("partner");
    let mut line_record = DataRecord::new(DataKind(7), "line-set", "Line");
    line_record.push_ref(SET_VARIABLE, DataRef::new(variable_id, 7));
    let line = LineData::new(live.insert(line_record));
    let ctx = DialogueContext::new(speaker, partner);
    extensions.run_actions(&mut host, &mut live, &line, &ctx, || {});
    assert_eq!(live.get(variable_id).unwrap().int("value"), Some(7));

    // Save.
    let mut save = DataStore::new();
    let mut host_saved = false;
    extensions.save_world_state(&live, &mut save, |_| host_saved = true);
    assert!(host_saved);
    assert_eq!(save.by_string_id("var-debt").unwrap().int("value"), Some(7));

    // Mutate the live value after the save.
    live.get_mut(variable_id).unwrap().set_int("value", 3);

    // Load completion restores the saved value over the live one.
    let mut host_loaded = false;
    extensions.platoons_loaded(&save, &mut live, || host_loaded = true);
    assert!(host_loaded);
    assert_eq!(live.get(variable_id).unwrap().int("value"), Some(7));
}

#[test]
fn test_save_skips_non_variable_records() {
    setup();
    let extensions = Extensions::new();
    let mut live = DataStore::new();
    live.insert(variable("var-a", 2));
    live.insert(DataRecord::new(DataKind(2), "item-katana", "Katana"));
    live.insert(DataRecord::new(DataKind(7), "line-1", "Line"));

    let mut save = DataStore::new();
    extensions.save_world_state(&live, &mut save, |_| {});

    assert_eq!(save.len(), 1);
    assert!(save.by_string_id("var-a").is_some());
}

#[test]
fn test_load_with_orphaned_saved_variable() {
    setup();
    let extensions = Extensions::new();
    let mut live = DataStore::new();
    live.insert(variable("var-kept", 1));

    // The save came from a world that knew a variable this one does not.
    let mut save = DataStore::new();
    save.insert(variable("var-kept", 5));
    save.insert(variable("var-orphan", 9));

    extensions.platoons_loaded(&save, &mut live, || {});

    assert_eq!(live.by_string_id("var-kept").unwrap().int("value"), Some(5));
    assert!(live.by_string_id("var-orphan").is_none());
}

#[test]
fn test_save_store_serializes_to_json() {
    setup();
    let extensions = Extensions::new();
    let mut live = DataStore::new();
    live.insert(variable("var-debt", 7));

    let mut save = DataStore::new();
    extensions.save_world_state(&live, &mut save, |_| {});

    // The host writes the container to disk; the shape must round-trip.
    let json = serde_json::to_string_pretty(&save).expect("save store should serialize");
    let reloaded: DataStore = serde_json::from_str(&json).expect("save store should deserialize");

    let mut restored = DataStore::new();
    restored.insert(variable("var-debt", 0));
    extensions.platoons_loaded(&reloaded, &mut restored, || {});
    assert_eq!(restored.by_string_id("var-debt").unwrap().int("value"), Some(7));
}

// =============================================================================
// ASSOCIATION INVARIANT
// =============================================================================

#[test]
fn test_every_evaluated_query_must_be_recorded() {
    setup();
    let extensions = Extensions::new();
    let mut store = DataStore::new();

    let variable_id = store.insert(variable("var-gate", 1));
    let mut query_data = DataRecord::new(DataKind(9), "query-1", "Gate");
    query_data.push_ref("variable equals", DataRef::new(variable_id, 1));
    let data_id = store.insert(query_data);

    let recorded = QueryId::new();
    let stray = QueryId::new();
    extensions.query_created(recorded, data_id);

    assert!(extensions.associations().lookup(recorded).is_ok());
    // A query that skipped the recording path is an invariant violation the
    // harness must flag, even though production degrades gracefully.
    assert_eq!(
        extensions.associations().lookup(stray),
        Err(ExtensionError::AssociationNotFound(stray))
    );
    assert!(extensions.query_truth(&store, stray, || true));
}

#[test]
fn test_recording_is_idempotent_across_reuse() {
    setup();
    let extensions = Extensions::new();
    let first = DataId::new();
    let second = DataId::new();
    let query = QueryId::new();

    // The host may hand the same query object through the creation path
    // repeatedly; the first association wins and the table does not grow.
    extensions.query_created(query, first);
    extensions.query_created(query, second);

    assert_eq!(extensions.associations().len(), 1);
    assert_eq!(extensions.associations().lookup(query).unwrap(), first);
}
