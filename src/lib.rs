//! Runtime extension layer for a host game engine's dialogue system.
//!
//! This crate layers new behavior over a running host without owning any of
//! its object graphs:
//! - Extended dialogue conditions (sleeping state, short-term memory tags,
//!   disguise-only allies, stat levels, best-weapon and equipped-armour
//!   levels), with whole-squad any-match evaluation
//! - Dialogue effects that transfer or destroy inventory stacks and mutate
//!   persistent world-state variables
//! - Persistent variables that survive the host's save/load cycle by riding
//!   along in its save container
//!
//! Everything operates through intercepted host entry points: each shim runs
//! the extension logic and delegates to the original behavior. See
//! [`hooks::Extensions`] for the registry the shims go through, and
//! [`host::Host`] for the surface the core needs from the engine.
//!
//! # Quick Start
//!
//! ```
//! use dialogue_extensions::data::{DataKind, DataRecord, DataRef, DataStore};
//! use dialogue_extensions::hooks::Extensions;
//! use dialogue_extensions::assoc::QueryId;
//!
//! let extensions = Extensions::new();
//! let mut store = DataStore::new();
//!
//! let mut bounty = DataRecord::new(DataKind::VARIABLE, "var-bounty", "Bounty Paid");
//! bounty.set_int("value", 1);
//! let bounty_id = store.insert(bounty);
//!
//! let mut query_data = DataRecord::new(DataKind(9), "query-1", "Bounty gate");
//! query_data.push_ref("variable equals", DataRef::new(bounty_id, 1));
//! let data_id = store.insert(query_data);
//!
//! let query = QueryId::new();
//! extensions.query_created(query, data_id);
//! assert!(extensions.query_truth(&store, query, || true));
//! ```

pub mod assoc;
pub mod conditions;
pub mod data;
pub mod effects;
pub mod errors;
pub mod hooks;
pub mod host;
pub mod persist;
pub mod squad;
pub mod testing;

// Primary public API
pub use assoc::{AssociationTable, QueryId};
pub use conditions::{Comparison, ConditionDescriptor, ConditionKind, Talker};
pub use data::{DataId, DataKind, DataRecord, DataRef, DataStore};
pub use errors::{ExtensionError, HookError};
pub use hooks::{install_all, Extensions, HookInstaller, HookPoint};
pub use host::{CharId, DialogueContext, Host, LineData, Position, StackId};
pub use squad::SQUAD_CHECK_RADIUS;
