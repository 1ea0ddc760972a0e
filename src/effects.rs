//! Side-effecting dialogue actions: item transfer, item destruction, and
//! persistent-variable mutation.
//!
//! Effects are irreversible and not transactional. A squad-wide transfer
//! that reaches its target count simply stops; nothing is rolled back.

use crate::conditions::VALUE_FIELD;
use crate::data::{DataId, DataRef, DataStore};
use crate::errors::ExtensionError;
use crate::host::{CharId, DialogueContext, Host, LineData};
use crate::squad;
use tracing::{debug, error};

// ============================================================================
// Reference-list keys
// ============================================================================

pub const TAKE_ITEM: &str = "take item";
pub const TAKE_ITEM_FROM_SQUAD: &str = "take item from squad";
pub const DESTROY_ITEM: &str = "destroy item";
pub const DESTROY_ITEM_FROM_SQUAD: &str = "destroy item from squad";
pub const SET_VARIABLE: &str = "set variable";
pub const ADD_TO_VARIABLE: &str = "add to variable";

/// How a variable effect changes the stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableAction {
    Set,
    Add,
}

// ============================================================================
// Item transfer
// ============================================================================

/// Transfer up to `count` units of an item type from giver to taker.
///
/// Stacks are fetched one at a time. A stack larger than the remainder is
/// split: the source stack shrinks and a factory copy of the remainder goes
/// to the taker. Smaller stacks move whole. Returns the units actually
/// moved, which is less than `count` when the giver runs out.
pub fn take_items(
    host: &mut dyn Host,
    giver: CharId,
    taker: CharId,
    item: DataId,
    count: u32,
) -> u32 {
    let mut taken = 0;
    while taken < count {
        let Some(stack) = host.fetch_stack(giver, item) else {
            return taken;
        };

        let remaining = count - taken;
        let quantity = host.stack_quantity(stack);
        if quantity > remaining {
            host.set_stack_quantity(stack, quantity - remaining);
            let split = host.copy_stack(stack, remaining);
            host.give_stack(taker, split);
            return count;
        }

        taken += quantity;
        host.remove_stack(giver, stack);
        host.give_stack(taker, stack);
    }
    count
}

/// Squad variant: the giver's nearby squad members each give in turn until
/// the requested count is reached or every member is exhausted.
pub fn take_items_from_squad(
    host: &mut dyn Host,
    giver: CharId,
    taker: CharId,
    item: DataId,
    count: u32,
) -> u32 {
    squad::drain_members(host, giver, count, |host, member, needed| {
        take_items(host, member, taker, item, needed)
    })
}

// ============================================================================
// Item destruction
// ============================================================================

/// Remove and destroy up to `count` units of an item type from a character.
///
/// Same loop shape as [`take_items`]: oversized stacks are decremented in
/// place, smaller stacks are removed and destroyed whole. Returns the units
/// actually destroyed.
pub fn destroy_items(host: &mut dyn Host, owner: CharId, item: DataId, count: u32) -> u32 {
    let mut destroyed = 0;
    while destroyed < count {
        let Some(stack) = host.fetch_stack(owner, item) else {
            return destroyed;
        };

        let remaining = count - destroyed;
        let quantity = host.stack_quantity(stack);
        if quantity > remaining {
            host.set_stack_quantity(stack, quantity - remaining);
            return count;
        }

        destroyed += quantity;
        host.remove_stack(owner, stack);
        host.destroy_stack(stack, "destroy item effect");
    }
    count
}

/// Squad variant of [`destroy_items`], enumerating the owner's squad.
pub fn destroy_items_from_squad(
    host: &mut dyn Host,
    owner: CharId,
    item: DataId,
    count: u32,
) -> u32 {
    squad::drain_members(host, owner, count, |host, member, needed| {
        destroy_items(host, member, item, needed)
    })
}

// ============================================================================
// Variable mutation
// ============================================================================

/// Apply a set/add action to every referenced variable.
///
/// A variable missing its value field is reported and left untouched.
pub fn change_variables(store: &mut DataStore, entries: &[DataRef], action: VariableAction) {
    for entry in entries {
        let Some(variable) = store.get_mut(entry.target) else {
            error!(target = %entry.target, "variable effect points at no record");
            continue;
        };
        match variable.int(VALUE_FIELD) {
            Some(current) => {
                let next = match action {
                    VariableAction::Set => entry.value0(),
                    VariableAction::Add => current + entry.value0(),
                };
                variable.set_int(VALUE_FIELD, next);
            }
            None => {
                error!(
                    error = %ExtensionError::MissingField {
                        string_id: variable.string_id.clone(),
                    },
                    "skipping variable effect",
                );
            }
        }
    }
}

// ============================================================================
// Action dispatch
// ============================================================================

/// Run every extension action authored on a dialogue line.
///
/// Item actions need both dialogue characters resolved; entries with a
/// missing giver or taker are skipped. An action key present with an empty
/// reference list is authored wrong and reported.
pub fn apply_actions(
    host: &mut dyn Host,
    store: &mut DataStore,
    line: &LineData,
    ctx: &DialogueContext,
) {
    let Some(data) = store.get(line.data) else {
        error!(line = %line.data, "dialogue line has no data record");
        return;
    };

    let item_keys = [
        TAKE_ITEM,
        TAKE_ITEM_FROM_SQUAD,
        DESTROY_ITEM,
        DESTROY_ITEM_FROM_SQUAD,
    ];
    let item_actions: Vec<(&'static str, Vec<DataRef>)> = item_keys
        .into_iter()
        .filter(|key| data.has_refs(key))
        .map(|key| (key, data.refs(key).to_vec()))
        .collect();

    let variable_keys = [
        (VariableAction::Set, SET_VARIABLE),
        (VariableAction::Add, ADD_TO_VARIABLE),
    ];
    let variable_actions: Vec<(VariableAction, &'static str, Vec<DataRef>)> = variable_keys
        .into_iter()
        .filter(|(_, key)| data.has_refs(key))
        .map(|(action, key)| (action, key, data.refs(key).to_vec()))
        .collect();

    for (action, entries) in item_actions {
        if entries.is_empty() {
            error!(
                error = %ExtensionError::MissingReference {
                    action: action.to_string(),
                },
                "skipping item action",
            );
            continue;
        }
        run_item_action(host, action, &entries, ctx);
    }

    for (action, key, entries) in variable_actions {
        if entries.is_empty() {
            error!(
                error = %ExtensionError::MissingReference { action: key.to_string() },
                "skipping variable action",
            );
            continue;
        }
        change_variables(store, &entries, action);
    }
}

fn run_item_action(
    host: &mut dyn Host,
    action: &str,
    entries: &[DataRef],
    ctx: &DialogueContext,
) {
    // The conversation partner gives up or loses items; the speaker receives.
    let (Some(partner), actor) = (ctx.partner, ctx.actor) else {
        debug!(action, "no conversation partner, skipping item action");
        return;
    };

    for entry in entries {
        let count = entry.value0().max(0) as u32;
        match action {
            TAKE_ITEM | TAKE_ITEM_FROM_SQUAD => {
                let Some(taker) = actor else {
                    debug!(action, "no speaker to receive items, skipping");
                    return;
                };
                let moved = if action == TAKE_ITEM {
                    take_items(host, partner, taker, entry.target, count)
                } else {
                    take_items_from_squad(host, partner, taker, entry.target, count)
                };
                debug!(action, item = %entry.target, requested = count, moved, "item transfer");
            }
            DESTROY_ITEM | DESTROY_ITEM_FROM_SQUAD => {
                let destroyed = if action == DESTROY_ITEM {
                    destroy_items(host, partner, entry.target, count)
                } else {
                    destroy_items_from_squad(host, partner, entry.target, count)
                };
                debug!(action, item = %entry.target, requested = count, destroyed, "item destruction");
            }
            _ => unreachable!("unknown item action {action}"),
        }
    }
}
