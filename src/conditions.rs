//! Extended dialogue-condition descriptors and their evaluator.
//!
//! Conditions are authored in host data and arrive either pre-parsed on a
//! dialogue line or as entries of a "conditions" reference list on the
//! line's data container. Evaluation is pure: it reads character state
//! through [`Host`] and never mutates anything.

use crate::data::{DataRecord, DataStore};
use crate::errors::ExtensionError;
use crate::host::{CharId, Host};
use serde::{Deserialize, Serialize};
use tracing::warn;

// ============================================================================
// Reference-list keys
// ============================================================================

/// Key of the extended-condition reference list on a dialogue line.
pub const CONDITIONS_KEY: &str = "conditions";

/// Variable-comparison reference lists, paired with their operators.
pub const VARIABLE_CONDITION_KEYS: [(&str, Comparison); 3] = [
    ("variable equals", Comparison::Equals),
    ("variable less than", Comparison::LessThan),
    ("variable greater than", Comparison::GreaterThan),
];

/// Integer field holding a persistent variable's current value.
pub const VALUE_FIELD: &str = "value";

// ============================================================================
// Descriptor pieces
// ============================================================================

/// Comparison operator, applied to `(measured, operand)` in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    Equals,
    LessThan,
    GreaterThan,
}

impl Comparison {
    pub fn from_key(key: i32) -> Option<Self> {
        match key {
            0 => Some(Comparison::Equals),
            1 => Some(Comparison::LessThan),
            2 => Some(Comparison::GreaterThan),
            _ => None,
        }
    }

    pub fn matches(&self, measured: i32, operand: i32) -> bool {
        match self {
            Comparison::Equals => measured == operand,
            Comparison::LessThan => measured < operand,
            Comparison::GreaterThan => measured > operand,
        }
    }
}

/// Whose state a condition examines.
///
/// Only `Me` and `WholeSquad` are distinguished by the subject-resolution
/// rule; every other authored value behaves like `Target`, so unknown keys
/// fold into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Talker {
    Me,
    Target,
    WholeSquad,
}

impl Talker {
    pub fn from_key(key: i32) -> Self {
        match key {
            0 => Talker::Me,
            2 => Talker::WholeSquad,
            _ => Talker::Target,
        }
    }
}

/// The extended condition kinds. Keys start at 1000, above the host's own
/// condition range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionKind {
    IsSleeping,
    HasShortTermTag,
    IsAllyBecauseOfDisguise,
    StatLevelUnmodified,
    StatLevelModified,
    WeaponLevel,
    ArmourLevel,
}

impl ConditionKind {
    pub fn from_key(key: i32) -> Option<Self> {
        match key {
            1000 => Some(ConditionKind::IsSleeping),
            1001 => Some(ConditionKind::HasShortTermTag),
            1002 => Some(ConditionKind::IsAllyBecauseOfDisguise),
            1003 => Some(ConditionKind::StatLevelUnmodified),
            1004 => Some(ConditionKind::StatLevelModified),
            1005 => Some(ConditionKind::WeaponLevel),
            1006 => Some(ConditionKind::ArmourLevel),
            _ => None,
        }
    }

    pub fn key(&self) -> i32 {
        match self {
            ConditionKind::IsSleeping => 1000,
            ConditionKind::HasShortTermTag => 1001,
            ConditionKind::IsAllyBecauseOfDisguise => 1002,
            ConditionKind::StatLevelUnmodified => 1003,
            ConditionKind::StatLevelModified => 1004,
            ConditionKind::WeaponLevel => 1005,
            ConditionKind::ArmourLevel => 1006,
        }
    }
}

/// A single authored condition: kind key, operator, subject selector, tag or
/// stat index, and integer operand. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionDescriptor {
    pub key: i32,
    pub compare_by: Comparison,
    pub who: Talker,
    pub tag: i32,
    pub value: i32,
}

impl ConditionDescriptor {
    pub fn new(kind: ConditionKind, compare_by: Comparison, who: Talker, tag: i32, value: i32) -> Self {
        Self {
            key: kind.key(),
            compare_by,
            who,
            tag,
            value,
        }
    }

    /// The extended kind, or None for a host-native condition key.
    pub fn kind(&self) -> Option<ConditionKind> {
        ConditionKind::from_key(self.key)
    }

    /// Parse a descriptor from a referenced condition record. `operand` is
    /// the reference entry's first value.
    pub fn from_record(record: &DataRecord, operand: i32) -> Option<Self> {
        Some(Self {
            key: record.int("condition name")?,
            compare_by: Comparison::from_key(record.int("compare by")?)?,
            who: Talker::from_key(record.int("who")?),
            tag: record.int("tag").unwrap_or(0),
            value: operand,
        })
    }
}

/// Parse every well-formed descriptor out of a line's "conditions" list.
pub fn descriptors_from_refs(store: &DataStore, line: &DataRecord) -> Vec<ConditionDescriptor> {
    line.refs(CONDITIONS_KEY)
        .iter()
        .filter_map(|entry| {
            let record = store.get(entry.target)?;
            ConditionDescriptor::from_record(record, entry.value0())
        })
        .collect()
}

// ============================================================================
// Subject resolution
// ============================================================================

/// Resolve who a condition examines and who it compares against.
///
/// `Me` and `WholeSquad` keep the acting character as subject and the
/// dialogue partner as target; every other selector swaps the roles. A
/// missing subject aborts the whole condition list; a missing target is
/// tolerated and reported so evaluation can continue without one.
pub fn resolve_roles(
    who: Talker,
    actor: Option<CharId>,
    partner: Option<CharId>,
) -> Result<(CharId, Option<CharId>), ExtensionError> {
    let (subject, target) = match who {
        Talker::Me | Talker::WholeSquad => (actor, partner),
        Talker::Target => (partner, actor),
    };
    let subject = subject.ok_or(ExtensionError::MissingSubject)?;
    Ok((subject, target))
}

// ============================================================================
// Evaluator
// ============================================================================

/// Evaluate one extended condition against a subject character.
///
/// Pure with respect to game state. Host-native keys are not this layer's
/// problem and evaluate true so the host's own check decides them.
pub fn evaluate(
    host: &dyn Host,
    condition: &ConditionDescriptor,
    subject: CharId,
    target: Option<CharId>,
) -> bool {
    let Some(kind) = condition.kind() else {
        return true;
    };

    match kind {
        ConditionKind::IsSleeping => {
            let measured = host.is_in_bed(subject) as i32;
            condition.compare_by.matches(measured, condition.value)
        }
        ConditionKind::IsAllyBecauseOfDisguise => {
            let measured = target
                .map(|t| host.is_ally(subject, t, true) && !host.is_ally(subject, t, false))
                .unwrap_or(false) as i32;
            condition.compare_by.matches(measured, condition.value)
        }
        ConditionKind::HasShortTermTag => match target {
            Some(t) => {
                let measured = host.memory_tag(subject, t, condition.tag);
                condition.compare_by.matches(measured, condition.value)
            }
            // Memory tags are about someone; with nobody there the
            // condition cannot hold.
            None => false,
        },
        ConditionKind::StatLevelUnmodified | ConditionKind::StatLevelModified => {
            let unmodified = kind == ConditionKind::StatLevelUnmodified;
            let measured = host.stat_level(subject, condition.tag, unmodified) as i32;
            condition.compare_by.matches(measured, condition.value)
        }
        ConditionKind::WeaponLevel => {
            let measured = weapon_level(host, subject);
            condition.compare_by.matches(measured, condition.value)
        }
        ConditionKind::ArmourLevel => armour_level_matches(host, subject, condition),
    }
}

/// Best weapon level: the held (or preferred-slot) weapon if any, otherwise
/// the maximum over weapon-attach inventory sections. -1 means unarmed.
fn weapon_level(host: &dyn Host, subject: CharId) -> i32 {
    if let Some(level) = host.held_weapon_level(subject) {
        return level;
    }
    host.stowed_weapon_levels(subject)
        .into_iter()
        .fold(-1, i32::max)
}

/// True if any equipped armour piece satisfies the comparison, or if the
/// character is unarmoured and -1 satisfies it directly.
fn armour_level_matches(host: &dyn Host, subject: CharId, condition: &ConditionDescriptor) -> bool {
    let levels = host.equipped_armour_levels(subject);
    if levels.is_empty() {
        return condition.compare_by.matches(-1, condition.value);
    }
    levels
        .iter()
        .any(|&level| condition.compare_by.matches(level, condition.value))
}

// ============================================================================
// Variable conditions
// ============================================================================

/// Check the three variable-comparison reference lists on a data record.
///
/// Every entry of every present list must satisfy
/// `comparison(variable value, operand)`. An entry whose variable record is
/// missing its value field is reported and skipped.
pub fn variable_conditions_hold(store: &DataStore, data: &DataRecord) -> bool {
    for (key, comparison) in VARIABLE_CONDITION_KEYS {
        for entry in data.refs(key) {
            let Some(variable) = store.get(entry.target) else {
                warn!(key, target = %entry.target, "variable reference points at no record");
                continue;
            };
            let Some(value) = variable.int(VALUE_FIELD) else {
                warn!(
                    error = %ExtensionError::MissingField {
                        string_id: variable.string_id.clone(),
                    },
                    key,
                    "skipping variable condition",
                );
                continue;
            };
            if !comparison.matches(value, entry.value0()) {
                return false;
            }
        }
    }
    true
}
