//! Generic keyed game-data containers.
//!
//! The host engine stores every piece of authored content — dialogue lines,
//! item types, world-state variables — as a generic record of named integer
//! fields plus named reference lists. This module models that shape, along
//! with the stores (live and save) the records live in.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for a game-data record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataId(pub Uuid);

impl DataId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DataId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Record Kinds
// ============================================================================

/// Category of a game-data record.
///
/// The host defines its own categories below 1000; this layer claims the
/// range above for extension records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataKind(pub i32);

impl DataKind {
    /// A persistent world-state variable. The only extension category.
    pub const VARIABLE: DataKind = DataKind(1000);

    pub fn is_variable(&self) -> bool {
        *self == Self::VARIABLE
    }
}

// ============================================================================
// Records
// ============================================================================

/// A single entry in a reference list: a target record plus integer operands.
///
/// The first operand carries the authored value for that entry (transfer
/// count, comparison operand, and so on).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataRef {
    pub target: DataId,
    pub values: Vec<i32>,
}

impl DataRef {
    pub fn new(target: DataId, value: i32) -> Self {
        Self {
            target,
            values: vec![value],
        }
    }

    /// First operand, or 0 when the entry carries none.
    pub fn value0(&self) -> i32 {
        self.values.first().copied().unwrap_or(0)
    }
}

/// A generic keyed-property container owned by the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataRecord {
    pub id: DataId,
    pub kind: DataKind,
    /// Stable string identifier, unique within a store. Survives save/load.
    pub string_id: String,
    /// Display name, not used for matching.
    pub name: String,
    /// Named integer fields.
    pub ints: HashMap<String, i32>,
    /// Named reference lists.
    pub references: HashMap<String, Vec<DataRef>>,
}

impl DataRecord {
    pub fn new(kind: DataKind, string_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: DataId::new(),
            kind,
            string_id: string_id.into(),
            name: name.into(),
            ints: HashMap::new(),
            references: HashMap::new(),
        }
    }

    /// Read a named integer field.
    pub fn int(&self, key: &str) -> Option<i32> {
        self.ints.get(key).copied()
    }

    /// Write a named integer field.
    pub fn set_int(&mut self, key: impl Into<String>, value: i32) {
        self.ints.insert(key.into(), value);
    }

    /// A named reference list, or an empty slice when the key is absent.
    pub fn refs(&self, key: &str) -> &[DataRef] {
        self.references.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True if the record carries the named reference list at all.
    pub fn has_refs(&self, key: &str) -> bool {
        self.references.contains_key(key)
    }

    pub fn push_ref(&mut self, key: impl Into<String>, entry: DataRef) {
        self.references.entry(key.into()).or_default().push(entry);
    }

    /// Copy the integer fields of another record into this one.
    ///
    /// Reference lists are left alone: the save mirror only needs values.
    pub fn copy_values_from(&mut self, other: &DataRecord) {
        for (key, value) in &other.ints {
            self.ints.insert(key.clone(), *value);
        }
    }
}

// ============================================================================
// Stores
// ============================================================================

/// A store of game-data records, indexed by id and by stable string id.
///
/// The host keeps two of these that this layer cares about: the live store
/// (active gameplay data) and the save store (the serialized snapshot).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataStore {
    records: HashMap<DataId, DataRecord>,
    string_ids: HashMap<String, DataId>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, indexing it by string id.
    pub fn insert(&mut self, record: DataRecord) -> DataId {
        let id = record.id;
        self.string_ids.insert(record.string_id.clone(), id);
        self.records.insert(id, record);
        id
    }

    /// Create an empty record of the given kind.
    ///
    /// When a record with the same string id already exists, no new record is
    /// made and the existing id is returned.
    pub fn create(
        &mut self,
        kind: DataKind,
        string_id: impl Into<String>,
        name: impl Into<String>,
    ) -> DataId {
        let string_id = string_id.into();
        if let Some(&existing) = self.string_ids.get(&string_id) {
            return existing;
        }
        self.insert(DataRecord::new(kind, string_id, name))
    }

    pub fn get(&self, id: DataId) -> Option<&DataRecord> {
        self.records.get(&id)
    }

    pub fn get_mut(&mut self, id: DataId) -> Option<&mut DataRecord> {
        self.records.get_mut(&id)
    }

    pub fn by_string_id(&self, string_id: &str) -> Option<&DataRecord> {
        self.string_ids
            .get(string_id)
            .and_then(|id| self.records.get(id))
    }

    pub fn by_string_id_mut(&mut self, string_id: &str) -> Option<&mut DataRecord> {
        let id = *self.string_ids.get(string_id)?;
        self.records.get_mut(&id)
    }

    /// Copy another record's values into the record with the same string id.
    ///
    /// Returns false when no such record exists here; the caller decides
    /// whether that matters.
    pub fn update_from_record(&mut self, source: &DataRecord) -> bool {
        match self.by_string_id_mut(&source.string_id) {
            Some(record) => {
                record.copy_values_from(source);
                true
            }
            None => false,
        }
    }

    pub fn records(&self) -> impl Iterator<Item = &DataRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
