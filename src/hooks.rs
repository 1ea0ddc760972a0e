//! The interception layer.
//!
//! Every intercepted host entry point follows the same shape: capture the
//! arguments, run extension logic (which may short-circuit with a definitive
//! false or mutate state), then delegate to the original implementation. The
//! original behavior arrives as a closure handle; the concrete detour
//! mechanism belongs to the host-control layer, not to this crate.
//!
//! [`Extensions`] is the one-per-process registry object all shims go
//! through. It owns the association table and nothing else.

use crate::assoc::{AssociationTable, QueryId};
use crate::conditions::{self, ConditionDescriptor, Talker};
use crate::data::{DataId, DataStore};
use crate::effects;
use crate::errors::{ExtensionError, HookError};
use crate::host::{CharId, DialogueContext, Host, LineData};
use crate::persist;
use crate::squad;
use tracing::{error, warn};

// ============================================================================
// Override points
// ============================================================================

/// The host entry points this layer overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    /// Query-object creation; where associations are recorded.
    QueryCreated,
    /// Query truth evaluation.
    QueryTruth,
    /// Dialogue-line condition check.
    LineConditions,
    /// Dialogue-line tag check.
    LineTags,
    /// Dialogue-line action execution.
    LineActions,
    /// World-state save.
    SaveWorldState,
    /// Platoon-loading completion after a save is restored.
    PlatoonsLoaded,
}

impl HookPoint {
    pub const ALL: [HookPoint; 7] = [
        HookPoint::QueryCreated,
        HookPoint::QueryTruth,
        HookPoint::LineConditions,
        HookPoint::LineTags,
        HookPoint::LineActions,
        HookPoint::SaveWorldState,
        HookPoint::PlatoonsLoaded,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            HookPoint::QueryCreated => "query created",
            HookPoint::QueryTruth => "query truth",
            HookPoint::LineConditions => "line conditions",
            HookPoint::LineTags => "line tags",
            HookPoint::LineActions => "line actions",
            HookPoint::SaveWorldState => "save world state",
            HookPoint::PlatoonsLoaded => "platoons loaded",
        }
    }
}

/// Capability supplied by the host-control layer: redirect a named host
/// operation to this layer's shim and keep a handle to the original.
pub trait HookInstaller {
    fn install(&mut self, point: HookPoint) -> Result<(), HookError>;
}

/// Install every override point, logging failures without aborting. A point
/// that fails to install leaves the host's native behavior in place.
pub fn install_all(installer: &mut dyn HookInstaller) {
    for point in HookPoint::ALL {
        if let Err(err) = installer.install(point) {
            error!(%err, point = point.name(), "hook installation failed");
        }
    }
}

// ============================================================================
// Registry
// ============================================================================

/// The extension registry: constructed once at process start and passed by
/// reference into every intercepted entry point.
#[derive(Debug, Default)]
pub struct Extensions {
    associations: AssociationTable,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn associations(&self) -> &AssociationTable {
        &self.associations
    }

    /// Query-creation shim: remember which data record defines the query,
    /// because the query object itself carries no back-reference.
    pub fn query_created(&self, query: QueryId, data: DataId) {
        self.associations.record(query, data);
    }

    /// Query-truth shim: the host's verdict first, then the extended
    /// variable conditions on the query's defining record may veto it.
    pub fn query_truth(
        &self,
        store: &DataStore,
        query: QueryId,
        original: impl FnOnce() -> bool,
    ) -> bool {
        let verdict = original();

        let data = match self.associations.lookup(query) {
            Ok(data) => data,
            Err(err) => {
                // Every evaluated query is supposed to have passed through
                // the recording path; fall back to the host's verdict.
                error!(%err, "query evaluated without a recorded association");
                return verdict;
            }
        };
        let Some(record) = store.get(data) else {
            error!(%data, "query association points at no record");
            return verdict;
        };

        if !conditions::variable_conditions_hold(store, record) {
            return false;
        }
        verdict
    }

    /// Condition-check shim: every extended condition on the line must hold
    /// or the line is rejected without consulting the host; otherwise the
    /// host's own check decides.
    pub fn line_conditions_pass(
        &self,
        host: &dyn Host,
        line: &LineData,
        actor: Option<CharId>,
        target: Option<CharId>,
        original: impl FnOnce() -> bool,
    ) -> bool {
        if !conditions_pass(host, &line.conditions, actor, target) {
            return false;
        }
        original()
    }

    /// Tag-check shim: extended conditions authored on the line's
    /// "conditions" reference list, then the line's variable comparisons,
    /// then the host's native tag check.
    pub fn line_tags_pass(
        &self,
        host: &dyn Host,
        store: &DataStore,
        line: &LineData,
        actor: Option<CharId>,
        target: Option<CharId>,
        original: impl FnOnce() -> bool,
    ) -> bool {
        let Some(data) = store.get(line.data) else {
            error!(line = %line.data, "dialogue line has no data record");
            return original();
        };

        let descriptors = conditions::descriptors_from_refs(store, data);
        if !conditions_pass(host, &descriptors, actor, target) {
            return false;
        }
        if !conditions::variable_conditions_hold(store, data) {
            return false;
        }
        original()
    }

    /// Action-execution shim: run the extension effects, then the host's own
    /// actions.
    pub fn run_actions(
        &self,
        host: &mut dyn Host,
        store: &mut DataStore,
        line: &LineData,
        ctx: &DialogueContext,
        original: impl FnOnce(),
    ) {
        effects::apply_actions(host, store, line, ctx);
        original();
    }

    /// Save shim: mirror the persistent variables into the save container,
    /// then continue the host's normal save procedure with it.
    pub fn save_world_state(
        &self,
        live: &DataStore,
        save: &mut DataStore,
        original: impl FnOnce(&mut DataStore),
    ) {
        persist::mirror_variables(live, save);
        original(save);
    }

    /// Load-completion shim: let the host finish restoring the world, then
    /// copy the saved variable values over the live ones.
    pub fn platoons_loaded(
        &self,
        save: &DataStore,
        live: &mut DataStore,
        original: impl FnOnce(),
    ) {
        original();
        persist::restore_variables(save, live);
    }
}

/// Shared condition-list walk for both check shims.
///
/// A condition the layer does not know is left for the host's own check.
/// Whole-squad conditions pass when any nearby squad member satisfies them.
fn conditions_pass(
    host: &dyn Host,
    descriptors: &[ConditionDescriptor],
    actor: Option<CharId>,
    target: Option<CharId>,
) -> bool {
    for condition in descriptors {
        let (subject, cond_target) = match conditions::resolve_roles(condition.who, actor, target)
        {
            Ok(roles) => roles,
            Err(err) => {
                error!(%err, "aborting dialogue condition list");
                return false;
            }
        };
        if cond_target.is_none() {
            warn!(error = %ExtensionError::MissingTarget, "evaluating condition without a target");
        }
        if condition.kind().is_none() {
            continue;
        }

        let passed = if condition.who == Talker::WholeSquad {
            squad::any_member(host, subject, |h, member| {
                conditions::evaluate(h, condition, member, cond_target)
            })
        } else {
            conditions::evaluate(host, condition, subject, cond_target)
        };
        if !passed {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::{Comparison, ConditionKind, VALUE_FIELD};
    use crate::data::{DataKind, DataRecord, DataRef};
    use crate::testing::ScriptedHost;
    use std::cell::Cell;

    fn sleeping_condition(who: Talker) -> ConditionDescriptor {
        ConditionDescriptor::new(ConditionKind::IsSleeping, Comparison::Equals, who, 0, 1)
    }

    #[test]
    fn test_query_truth_veto() {
        let extensions = Extensions::new();
        let mut store = DataStore::new();

        let mut variable = DataRecord::new(DataKind::VARIABLE, "var-a", "A");
        variable.set_int(VALUE_FIELD, 3);
        let variable_id = store.insert(variable);

        let mut query_data = DataRecord::new(DataKind(9), "query-1", "Query");
        query_data.push_ref("variable equals", DataRef::new(variable_id, 3));
        let data_id = store.insert(query_data);

        let query = QueryId::new();
        extensions.query_created(query, data_id);

        assert!(extensions.query_truth(&store, query, || true));
        // The host's verdict is never upgraded, only vetoed.
        assert!(!extensions.query_truth(&store, query, || false));

        store
            .get_mut(variable_id)
            .unwrap()
            .set_int(VALUE_FIELD, 4);
        assert!(!extensions.query_truth(&store, query, || true));
    }

    #[test]
    fn test_query_truth_without_association_falls_back() {
        let extensions = Extensions::new();
        let store = DataStore::new();
        let stray = QueryId::new();

        assert!(extensions.query_truth(&store, stray, || true));
        assert!(!extensions.query_truth(&store, stray, || false));
        // The table itself still reports the violation for tests to assert on.
        assert!(extensions.associations().lookup(stray).is_err());
    }

    #[test]
    fn test_line_conditions_short_circuit_skips_original() {
        let extensions = Extensions::new();
        let mut host = ScriptedHost::new();
        let actor = host.add_character("actor");
        let partner = host.add_character("partner");

        let line = LineData::with_conditions(DataId::new(), vec![sleeping_condition(Talker::Me)]);
        let called = Cell::new(false);
        let passed = extensions.line_conditions_pass(
            &host,
            &line,
            Some(actor),
            Some(partner),
            || {
                called.set(true);
                true
            },
        );
        assert!(!passed);
        assert!(!called.get());

        host.set_in_bed(actor, true);
        let passed =
            extensions.line_conditions_pass(&host, &line, Some(actor), Some(partner), || true);
        assert!(passed);
    }

    #[test]
    fn test_line_conditions_missing_speaker_fails_list() {
        let extensions = Extensions::new();
        let mut host = ScriptedHost::new();
        let partner = host.add_character("partner");

        let line = LineData::with_conditions(DataId::new(), vec![sleeping_condition(Talker::Me)]);
        let passed = extensions.line_conditions_pass(&host, &line, None, Some(partner), || true);
        assert!(!passed);
    }

    #[test]
    fn test_line_conditions_whole_squad() {
        let extensions = Extensions::new();
        let mut host = ScriptedHost::new();
        let actor = host.add_character("actor");
        let partner = host.add_character("partner");
        let mate = host.add_character("mate");
        host.form_squad(&[actor, mate]);
        host.set_in_bed(mate, true);

        let line = LineData::with_conditions(
            DataId::new(),
            vec![sleeping_condition(Talker::WholeSquad)],
        );
        let passed =
            extensions.line_conditions_pass(&host, &line, Some(actor), Some(partner), || true);
        assert!(passed);
    }

    #[test]
    fn test_line_tags_reads_conditions_reference_list() {
        let extensions = Extensions::new();
        let mut host = ScriptedHost::new();
        let actor = host.add_character("actor");
        let partner = host.add_character("partner");
        host.set_stat(actor, 2, 30.0, 30.0);

        let mut store = DataStore::new();
        let mut authored = DataRecord::new(DataKind(8), "cond-stat", "Stat check");
        authored.set_int("condition name", ConditionKind::StatLevelUnmodified.key());
        authored.set_int("compare by", 2);
        authored.set_int("who", 0);
        authored.set_int("tag", 2);
        let authored_id = store.insert(authored);

        let mut line_record = DataRecord::new(DataKind(7), "line-1", "Line");
        line_record.push_ref(conditions::CONDITIONS_KEY, DataRef::new(authored_id, 25));
        let line = LineData::new(store.insert(line_record));

        assert!(extensions.line_tags_pass(&host, &store, &line, Some(actor), Some(partner), || true));

        host.set_stat(actor, 2, 20.0, 20.0);
        assert!(!extensions.line_tags_pass(&host, &store, &line, Some(actor), Some(partner), || true));
    }

    #[test]
    fn test_install_all_reports_failures() {
        struct Recorder {
            installed: Vec<HookPoint>,
        }
        impl HookInstaller for Recorder {
            fn install(&mut self, point: HookPoint) -> Result<(), HookError> {
                if point == HookPoint::LineTags {
                    return Err(HookError::InstallFailed(point.name()));
                }
                self.installed.push(point);
                Ok(())
            }
        }

        let mut recorder = Recorder { installed: vec![] };
        install_all(&mut recorder);

        // Installation continues past a failed point.
        assert_eq!(recorder.installed.len(), HookPoint::ALL.len() - 1);
        assert!(!recorder.installed.contains(&HookPoint::LineTags));
        assert!(recorder.installed.contains(&HookPoint::PlatoonsLoaded));
    }
}
