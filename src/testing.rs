//! Testing utilities for the extension layer.
//!
//! [`ScriptedHost`] is a small in-memory stand-in for the host engine: just
//! enough character state, squad membership, and stack-based inventory to
//! exercise every condition kind and effect without a running game.

use crate::data::DataId;
use crate::host::{CharId, Host, Position, StackId};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
struct CharacterState {
    name: String,
    position: Position,
    in_bed: bool,
    held_weapon_level: Option<i32>,
    stowed_weapon_levels: Vec<i32>,
    armour_levels: Vec<i32>,
    /// stat index -> (raw, modified)
    stats: HashMap<i32, (f32, f32)>,
    /// (about, tag) -> value
    memory_tags: HashMap<(CharId, i32), i32>,
    allies_counting_disguises: HashSet<CharId>,
    allies_ignoring_disguises: HashSet<CharId>,
    /// Ordered stack handles; fetch returns the front-most match.
    inventory: Vec<StackId>,
    squad: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
struct StackState {
    item: DataId,
    quantity: u32,
}

/// A scripted in-memory host for deterministic tests.
#[derive(Debug, Default)]
pub struct ScriptedHost {
    characters: HashMap<CharId, CharacterState>,
    stacks: HashMap<StackId, StackState>,
    squads: Vec<Vec<CharId>>,
    destroyed: u32,
}

impl ScriptedHost {
    pub fn new() -> Self {
        Self::default()
    }

    // --- world building ---

    pub fn add_character(&mut self, name: impl Into<String>) -> CharId {
        let id = CharId::new();
        self.characters.insert(
            id,
            CharacterState {
                name: name.into(),
                ..CharacterState::default()
            },
        );
        id
    }

    pub fn set_position(&mut self, ch: CharId, x: f32, y: f32, z: f32) {
        self.character_mut(ch).position = Position::new(x, y, z);
    }

    pub fn set_in_bed(&mut self, ch: CharId, in_bed: bool) {
        self.character_mut(ch).in_bed = in_bed;
    }

    /// Script the directional ally relation from `ch` towards `other`.
    pub fn set_ally(&mut self, ch: CharId, other: CharId, counting_disguises: bool, ignoring_disguises: bool) {
        let state = self.character_mut(ch);
        if counting_disguises {
            state.allies_counting_disguises.insert(other);
        } else {
            state.allies_counting_disguises.remove(&other);
        }
        if ignoring_disguises {
            state.allies_ignoring_disguises.insert(other);
        } else {
            state.allies_ignoring_disguises.remove(&other);
        }
    }

    pub fn set_memory_tag(&mut self, ch: CharId, about: CharId, tag: i32, value: i32) {
        self.character_mut(ch).memory_tags.insert((about, tag), value);
    }

    pub fn set_stat(&mut self, ch: CharId, stat: i32, raw: f32, modified: f32) {
        self.character_mut(ch).stats.insert(stat, (raw, modified));
    }

    pub fn set_held_weapon_level(&mut self, ch: CharId, level: Option<i32>) {
        self.character_mut(ch).held_weapon_level = level;
    }

    pub fn set_stowed_weapon_levels(&mut self, ch: CharId, levels: Vec<i32>) {
        self.character_mut(ch).stowed_weapon_levels = levels;
    }

    pub fn set_armour_levels(&mut self, ch: CharId, levels: Vec<i32>) {
        self.character_mut(ch).armour_levels = levels;
    }

    /// Put the given characters into one squad together.
    pub fn form_squad(&mut self, members: &[CharId]) {
        let index = self.squads.len();
        self.squads.push(members.to_vec());
        for &member in members {
            self.character_mut(member).squad = Some(index);
        }
    }

    /// Add a stack of `quantity` units of an item type to a character.
    pub fn add_stack(&mut self, owner: CharId, item: DataId, quantity: u32) -> StackId {
        let stack = StackId::new();
        self.stacks.insert(stack, StackState { item, quantity });
        self.character_mut(owner).inventory.push(stack);
        stack
    }

    // --- assertions ---

    /// Total units of an item type across a character's stacks.
    pub fn total_quantity(&self, owner: CharId, item: DataId) -> u32 {
        self.character(owner)
            .inventory
            .iter()
            .filter_map(|stack| self.stacks.get(stack))
            .filter(|state| state.item == item)
            .map(|state| state.quantity)
            .sum()
    }

    /// Number of distinct stacks of an item type a character holds.
    pub fn stack_count(&self, owner: CharId, item: DataId) -> usize {
        self.character(owner)
            .inventory
            .iter()
            .filter_map(|stack| self.stacks.get(stack))
            .filter(|state| state.item == item)
            .count()
    }

    /// How many stacks have been destroyed outright.
    pub fn destroyed_stacks(&self) -> u32 {
        self.destroyed
    }

    pub fn character_name(&self, ch: CharId) -> &str {
        &self.character(ch).name
    }

    fn character(&self, ch: CharId) -> &CharacterState {
        self.characters.get(&ch).expect("unknown scripted character")
    }

    fn character_mut(&mut self, ch: CharId) -> &mut CharacterState {
        self.characters.get_mut(&ch).expect("unknown scripted character")
    }

    fn stack(&self, stack: StackId) -> &StackState {
        self.stacks.get(&stack).expect("unknown scripted stack")
    }
}

impl Host for ScriptedHost {
    fn is_in_bed(&self, ch: CharId) -> bool {
        self.character(ch).in_bed
    }

    fn is_ally(&self, ch: CharId, other: CharId, count_disguises: bool) -> bool {
        let state = self.character(ch);
        if count_disguises {
            state.allies_counting_disguises.contains(&other)
        } else {
            state.allies_ignoring_disguises.contains(&other)
        }
    }

    fn memory_tag(&self, ch: CharId, about: CharId, tag: i32) -> i32 {
        self.character(ch)
            .memory_tags
            .get(&(about, tag))
            .copied()
            .unwrap_or(0)
    }

    fn stat_level(&self, ch: CharId, stat: i32, unmodified: bool) -> f32 {
        let (raw, modified) = self
            .character(ch)
            .stats
            .get(&stat)
            .copied()
            .unwrap_or((0.0, 0.0));
        if unmodified {
            raw
        } else {
            modified
        }
    }

    fn held_weapon_level(&self, ch: CharId) -> Option<i32> {
        self.character(ch).held_weapon_level
    }

    fn stowed_weapon_levels(&self, ch: CharId) -> Vec<i32> {
        self.character(ch).stowed_weapon_levels.clone()
    }

    fn equipped_armour_levels(&self, ch: CharId) -> Vec<i32> {
        self.character(ch).armour_levels.clone()
    }

    fn position(&self, ch: CharId) -> Position {
        self.character(ch).position
    }

    fn squad_members_within(&self, anchor: CharId, radius: f32) -> Option<Vec<CharId>> {
        let squad = self.character(anchor).squad?;
        let center = self.position(anchor);
        Some(
            self.squads[squad]
                .iter()
                .copied()
                .filter(|&member| self.position(member).distance_to(center) <= radius)
                .collect(),
        )
    }

    fn fetch_stack(&self, owner: CharId, item: DataId) -> Option<StackId> {
        self.character(owner)
            .inventory
            .iter()
            .copied()
            .find(|&stack| self.stack(stack).item == item)
    }

    fn stack_quantity(&self, stack: StackId) -> u32 {
        self.stack(stack).quantity
    }

    fn set_stack_quantity(&mut self, stack: StackId, quantity: u32) {
        self.stacks
            .get_mut(&stack)
            .expect("unknown scripted stack")
            .quantity = quantity;
    }

    fn copy_stack(&mut self, stack: StackId, quantity: u32) -> StackId {
        let item = self.stack(stack).item;
        let copy = StackId::new();
        self.stacks.insert(copy, StackState { item, quantity });
        copy
    }

    fn remove_stack(&mut self, owner: CharId, stack: StackId) {
        self.character_mut(owner).inventory.retain(|&s| s != stack);
    }

    fn give_stack(&mut self, owner: CharId, stack: StackId) {
        self.character_mut(owner).inventory.push(stack);
    }

    fn destroy_stack(&mut self, stack: StackId, _reason: &str) {
        self.stacks.remove(&stack);
        self.destroyed += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_inventory() {
        let mut host = ScriptedHost::new();
        let owner = host.add_character("owner");
        let item = DataId::new();
        host.add_stack(owner, item, 3);
        host.add_stack(owner, item, 2);

        assert_eq!(host.total_quantity(owner, item), 5);
        assert_eq!(host.stack_count(owner, item), 2);

        let stack = host.fetch_stack(owner, item).unwrap();
        host.remove_stack(owner, stack);
        host.destroy_stack(stack, "test");
        assert_eq!(host.total_quantity(owner, item), 2);
        assert_eq!(host.destroyed_stacks(), 1);
    }

    #[test]
    fn test_scripted_squad_radius() {
        let mut host = ScriptedHost::new();
        let a = host.add_character("a");
        let b = host.add_character("b");
        host.form_squad(&[a, b]);
        host.set_position(b, 0.0, 500.0, 0.0);

        let members = host.squad_members_within(a, 900.0).unwrap();
        assert_eq!(members.len(), 2);

        let members = host.squad_members_within(a, 100.0).unwrap();
        assert_eq!(members, vec![a]);
    }
}
