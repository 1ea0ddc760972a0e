//! Association table between host query objects and their defining data.
//!
//! The host's world-state query objects do not keep a reference to the data
//! record they were built from, so the creation hook records the pairing
//! here and the truth hook looks it back up.

use crate::data::DataId;
use crate::errors::ExtensionError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use uuid::Uuid;

/// Opaque identity of a host query object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryId(pub Uuid);

impl QueryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for QueryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Thread-safe map from query identity to the data record that defines it.
///
/// The table only grows. Query objects may be reused by the host for the
/// process lifetime and their disposal is not observable from here, so stale
/// entries are tolerated as a small, bounded leak across reloads rather than
/// tracked with speculative eviction.
#[derive(Debug, Default)]
pub struct AssociationTable {
    map: Mutex<HashMap<QueryId, DataId>>,
}

impl AssociationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an association. Idempotent: a duplicate query identity keeps
    /// the first recorded data id.
    pub fn record(&self, query: QueryId, data: DataId) {
        let mut map = self.map.lock().expect("association table lock poisoned");
        map.entry(query).or_insert(data);
    }

    /// Look up the data record for a query.
    ///
    /// The host guarantees every evaluated query first went through the
    /// recording path, so `AssociationNotFound` is an invariant violation:
    /// tests treat it as a failure, production call sites log it and fall
    /// back to the host's original verdict.
    pub fn lookup(&self, query: QueryId) -> Result<DataId, ExtensionError> {
        let map = self.map.lock().expect("association table lock poisoned");
        map.get(&query)
            .copied()
            .ok_or(ExtensionError::AssociationNotFound(query))
    }

    pub fn len(&self) -> usize {
        self.map.lock().expect("association table lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_lookup() {
        let table = AssociationTable::new();
        let query = QueryId::new();
        let data = DataId::new();

        table.record(query, data);
        assert_eq!(table.lookup(query).unwrap(), data);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_duplicate_record_keeps_first() {
        let table = AssociationTable::new();
        let query = QueryId::new();
        let first = DataId::new();
        let second = DataId::new();

        table.record(query, first);
        table.record(query, second);
        assert_eq!(table.lookup(query).unwrap(), first);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_lookup_unrecorded_is_flagged() {
        let table = AssociationTable::new();
        let query = QueryId::new();

        assert_eq!(
            table.lookup(query),
            Err(ExtensionError::AssociationNotFound(query))
        );
    }

    #[test]
    fn test_concurrent_recording() {
        use std::sync::Arc;

        let table = Arc::new(AssociationTable::new());
        let queries: Vec<(QueryId, DataId)> =
            (0..64).map(|_| (QueryId::new(), DataId::new())).collect();

        let handles: Vec<_> = queries
            .chunks(16)
            .map(|chunk| {
                let table = Arc::clone(&table);
                let chunk = chunk.to_vec();
                std::thread::spawn(move || {
                    for (query, data) in chunk {
                        table.record(query, data);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(table.len(), 64);
        for (query, data) in queries {
            assert_eq!(table.lookup(query).unwrap(), data);
        }
    }
}
