//! The host interface this layer calls into.
//!
//! The host's dialogue player, inventory, stat, and spatial subsystems are
//! black boxes; this trait is the exact surface the extension core needs from
//! them. Condition evaluation takes `&dyn Host` and never mutates; effects
//! take `&mut dyn Host`.

use crate::conditions::ConditionDescriptor;
use crate::data::DataId;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for a host character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharId(pub Uuid);

impl CharId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CharId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CharId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an item stack instance in a host inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StackId(pub Uuid);

impl StackId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for StackId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Spatial
// ============================================================================

/// A world position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance_to(&self, other: Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

// ============================================================================
// Dialogue views
// ============================================================================

/// A dialogue line as the hooks see it: the line's generic data container
/// plus the host's pre-parsed condition list.
#[derive(Debug, Clone)]
pub struct LineData {
    pub data: DataId,
    pub conditions: Vec<ConditionDescriptor>,
}

impl LineData {
    pub fn new(data: DataId) -> Self {
        Self {
            data,
            conditions: Vec::new(),
        }
    }

    pub fn with_conditions(data: DataId, conditions: Vec<ConditionDescriptor>) -> Self {
        Self { data, conditions }
    }
}

/// The two characters of a running dialogue.
///
/// Either side can be unresolvable; interjection nodes in particular arrive
/// without a partner.
#[derive(Debug, Clone, Copy)]
pub struct DialogueContext {
    /// The character speaking the line.
    pub actor: Option<CharId>,
    /// The conversation target.
    pub partner: Option<CharId>,
}

impl DialogueContext {
    pub fn new(actor: CharId, partner: CharId) -> Self {
        Self {
            actor: Some(actor),
            partner: Some(partner),
        }
    }
}

// ============================================================================
// Host trait
// ============================================================================

/// The surface the extension core needs from the host engine.
///
/// All character and stack handles are host-owned; this layer never retains
/// one past the call it received it in.
pub trait Host {
    // --- character state ---

    /// Whether the character is currently in a bed.
    fn is_in_bed(&self, ch: CharId) -> bool;

    /// Host ally check. `count_disguises` includes allies-by-disguise.
    fn is_ally(&self, ch: CharId, other: CharId, count_disguises: bool) -> bool;

    /// The character's short-term memory tag value about another character.
    fn memory_tag(&self, ch: CharId, about: CharId, tag: i32) -> i32;

    /// A stat level, raw (`unmodified`) or with modifiers applied.
    fn stat_level(&self, ch: CharId, stat: i32, unmodified: bool) -> f32;

    // --- equipment ---

    /// Level of the weapon in hand, falling back to the preferred slot.
    /// None when both are empty.
    fn held_weapon_level(&self, ch: CharId) -> Option<i32>;

    /// Levels of weapons stowed in weapon-attach inventory sections.
    fn stowed_weapon_levels(&self, ch: CharId) -> Vec<i32>;

    /// Levels of every equipped armour piece.
    fn equipped_armour_levels(&self, ch: CharId) -> Vec<i32>;

    // --- spatial / squads ---

    fn position(&self, ch: CharId) -> Position;

    /// Members of the anchor's squad within `radius` of the anchor.
    ///
    /// Returns None when the anchor has no squad. The returned buffer is
    /// owned by the caller and dropped on every exit path.
    fn squad_members_within(&self, anchor: CharId, radius: f32) -> Option<Vec<CharId>>;

    // --- inventory ---

    /// Fetch one stack of the given item type from a character's inventory.
    fn fetch_stack(&self, owner: CharId, item: DataId) -> Option<StackId>;

    fn stack_quantity(&self, stack: StackId) -> u32;

    fn set_stack_quantity(&mut self, stack: StackId, quantity: u32);

    /// Factory-copy a stack with the given quantity. The copy is unowned
    /// until given to someone.
    fn copy_stack(&mut self, stack: StackId, quantity: u32) -> StackId;

    /// Remove a stack from a character's inventory without destroying it.
    fn remove_stack(&mut self, owner: CharId, stack: StackId);

    /// Place a stack into a character's inventory.
    fn give_stack(&mut self, owner: CharId, stack: StackId);

    /// Destroy a stack outright. `reason` feeds the host's event log.
    fn destroy_stack(&mut self, stack: StackId, reason: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_distance() {
        let a = Position::new(0.0, 0.0, 0.0);
        let b = Position::new(3.0, 4.0, 0.0);
        assert!((a.distance_to(b) - 5.0).abs() < f32::EPSILON);
        assert!((b.distance_to(a) - 5.0).abs() < f32::EPSILON);
    }
}
