//! Squad resolution for whole-squad conditions and effects.
//!
//! A "whole squad" target expands to the squad members within a fixed radius
//! of the anchor character. The member buffer is owned by the call and
//! dropped on every exit path, early exits included.

use crate::host::{CharId, Host};

/// Radius for whole-squad checks, in world distance units. Matches the
/// host's interjection radius.
pub const SQUAD_CHECK_RADIUS: f32 = 900.0;

/// Any-match quantifier over the anchor's nearby squad members.
///
/// True if at least one member satisfies `check`. No squad means no match,
/// not an error.
pub fn any_member(
    host: &dyn Host,
    anchor: CharId,
    mut check: impl FnMut(&dyn Host, CharId) -> bool,
) -> bool {
    let Some(members) = host.squad_members_within(anchor, SQUAD_CHECK_RADIUS) else {
        return false;
    };
    members.into_iter().any(|member| check(host, member))
}

/// Destructive variant for effects: draw from members one by one until
/// `requested` units are accumulated or the squad is exhausted.
///
/// `draw` receives the member and how many units are still needed, and
/// returns how many it supplied. Returns the total drawn.
pub fn drain_members(
    host: &mut dyn Host,
    anchor: CharId,
    requested: u32,
    mut draw: impl FnMut(&mut dyn Host, CharId, u32) -> u32,
) -> u32 {
    let Some(members) = host.squad_members_within(anchor, SQUAD_CHECK_RADIUS) else {
        return 0;
    };

    let mut drawn = 0;
    for member in members {
        if drawn >= requested {
            break;
        }
        drawn += draw(host, member, requested - drawn);
    }
    drawn
}
