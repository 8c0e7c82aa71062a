//! Executes resolved commands.
//!
//! The [`Dispatcher`] is the only writer of the session [`UnitPolicy`] and
//! owns the [`ValueCache`] that keeps converted cells honest. Host actions
//! are looked up through an [`ActionMap`]; clipboard work is handed back to
//! the caller as [`Outcome::Copy`] because writing is asynchronous.

mod error;
pub mod yank;

use std::fmt;

use actions::{Axis, Command, VisibilityTarget};
use cell_cache::{ReconcileReport, ValueCache};
use host::{panel, ActionHost, CellText, PanelHost, SceneTree};
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};
use units::UnitPolicy;

pub use error::DispatchError;

/// Symbolic action name to host identifier. Unmapped names pass through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionMap {
    ids: FxHashMap<String, String>,
}

impl ActionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, host_id: impl Into<String>) {
        self.ids.insert(name.into(), host_id.into());
    }

    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.ids.get(name).map(String::as_str).unwrap_or(name)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ActionMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            ids: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Symbolic name of the grid-plane toggle for `axis`.
pub fn grid_plane_action(axis: Axis) -> String {
    format!("grid-plane-{axis}")
}

/// Result of a successfully executed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A host action ran; `active` is its state afterwards when known.
    Action { label: String, active: Option<bool> },
    Units(UnitPolicy),
    Visibility {
        target: VisibilityTarget,
        visible: Option<bool>,
    },
    /// Text waiting to be written to the clipboard.
    Copy { text: String, what: String },
}

impl Outcome {
    /// Notification to show right away. Copies report once the clipboard
    /// write finishes.
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Copy { .. } => None,
            other => Some(other.to_string()),
        }
    }
}

fn on_off(state: bool, on: &str, off: &str) -> String {
    let word = if state { on } else { off };
    word.to_string()
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Action {
                label,
                active: Some(active),
            } => write!(f, "{label}: {}", on_off(*active, "on", "off")),
            Self::Action {
                label,
                active: None,
            } => write!(f, "{label}"),
            Self::Units(policy) => write!(f, "Units: {policy}"),
            Self::Visibility { target, visible } => {
                let subject = match target {
                    VisibilityTarget::All => "All nodes".to_string(),
                    VisibilityTarget::Node(n) => format!("Node {n}"),
                };
                match visible {
                    Some(visible) => {
                        write!(f, "{subject} {}", on_off(*visible, "shown", "hidden"))
                    }
                    None => write!(f, "{subject} toggled"),
                }
            }
            Self::Copy { what, .. } => write!(f, "Copied {what}"),
        }
    }
}

pub struct Dispatcher {
    policy: UnitPolicy,
    cache: ValueCache,
    actions: ActionMap,
    camera_views: Vec<String>,
}

impl Dispatcher {
    pub fn new(policy: UnitPolicy, actions: ActionMap, camera_views: Vec<String>) -> Self {
        Self {
            policy,
            cache: ValueCache::new(),
            actions,
            camera_views,
        }
    }

    pub fn policy(&self) -> &UnitPolicy {
        &self.policy
    }

    pub fn cache(&self) -> &ValueCache {
        &self.cache
    }

    pub fn camera_views(&self) -> &[String] {
        &self.camera_views
    }

    /// Replace the action map and camera views. The unit policy is session
    /// state and stays as it is.
    pub fn reconfigure(&mut self, actions: ActionMap, camera_views: Vec<String>) {
        self.actions = actions;
        self.camera_views = camera_views;
    }

    pub fn execute<H>(&mut self, command: &Command, host: &mut H) -> Result<Outcome, DispatchError>
    where
        H: ActionHost + PanelHost + CellText + SceneTree,
    {
        debug!(%command, "dispatching");
        match command {
            Command::ToggleTool { action, label } | Command::ToggleViewOption { action, label } => {
                self.invoke(host, action, label)
            }
            Command::SetCameraView(index) => {
                let name = index
                    .checked_sub(1)
                    .and_then(|i| self.camera_views.get(i))
                    .ok_or_else(|| {
                        DispatchError::out_of_range("Camera view", *index, self.camera_views.len())
                    })?
                    .clone();
                self.invoke(host, &name, &format!("View {name}"))
            }
            Command::ToggleGridPlane(axis) => {
                let label = format!("Grid plane {}", axis.as_char().to_ascii_uppercase());
                self.invoke(host, &grid_plane_action(*axis), &label)
            }
            Command::ToggleUnit => {
                self.policy.toggle_unit();
                if self.policy.is_inch() {
                    self.reconcile(host);
                } else {
                    self.cache.restore(host);
                }
                info!(policy = %self.policy, "unit changed");
                Ok(Outcome::Units(self.policy))
            }
            Command::CyclePrecision => {
                self.policy.cycle_precision();
                self.reconcile(host);
                Ok(Outcome::Units(self.policy))
            }
            Command::ToggleFeet => {
                self.policy.toggle_feet();
                self.reconcile(host);
                Ok(Outcome::Units(self.policy))
            }
            Command::YankPrimary => {
                let rows = panel::snapshot(&*host);
                let text = yank::primary_text(&self.cache, &*host, &self.policy, &rows)?;
                Ok(copy(text, "primary value".to_string()))
            }
            Command::YankRow(index) => {
                let rows = panel::snapshot(&*host);
                let text = yank::row_text(&self.cache, &*host, &self.policy, &rows, *index)?;
                Ok(copy(text, format!("row {index}")))
            }
            Command::YankRowAxis(index, axis) => {
                let rows = panel::snapshot(&*host);
                let text =
                    yank::axis_text(&self.cache, &*host, &self.policy, &rows, *index, *axis)?;
                Ok(copy(text, format!("row {index} {axis}")))
            }
            Command::YankTable => {
                let rows = panel::snapshot(&*host);
                let text = yank::table_text(&self.cache, &*host, &self.policy, &rows)?;
                Ok(copy(text, format!("{} rows", rows.len())))
            }
            Command::ToggleVisibility(target) => self.toggle_visibility(host, *target),
        }
    }

    /// One synchronization pass: drop vanished cells, then convert when
    /// inch mode is active.
    pub fn reconcile<H>(&mut self, host: &mut H) -> ReconcileReport
    where
        H: PanelHost + CellText,
    {
        let cells = panel::cells(&panel::snapshot(&*host));
        self.cache.sweep(&cells);
        if !self.policy.is_inch() {
            return ReconcileReport::default();
        }
        self.cache.reconcile(host, &cells, &self.policy)
    }

    fn invoke(
        &self,
        host: &mut impl ActionHost,
        name: &str,
        label: &str,
    ) -> Result<Outcome, DispatchError> {
        let id = self.actions.resolve(name);
        let invocation = host.invoke(id);
        if !invocation.found {
            warn!(action = name, host_id = id, "host action not found");
            return Err(DispatchError::NotReady(label.to_string()));
        }
        Ok(Outcome::Action {
            label: label.to_string(),
            active: invocation.active_after,
        })
    }

    fn toggle_visibility(
        &self,
        host: &mut impl SceneTree,
        target: VisibilityTarget,
    ) -> Result<Outcome, DispatchError> {
        let available = host.node_count();
        if available == 0 {
            return Err(DispatchError::NotReady("Scene tree".to_string()));
        }
        let visible = match target {
            VisibilityTarget::All => host.toggle_all(),
            VisibilityTarget::Node(index) => {
                if index == 0 || index > available {
                    return Err(DispatchError::out_of_range("Node", index, available));
                }
                host.toggle_node(index)
            }
        };
        Ok(Outcome::Visibility { target, visible })
    }
}

fn copy(text: String, what: String) -> Outcome {
    Outcome::Copy { text, what }
}

#[cfg(test)]
mod tests {
    use super::*;
    use host::MemoryHost;
    use pretty_assertions::assert_eq;
    use test_case::test_case;
    use units::Precision;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(
            UnitPolicy::millimeters(),
            ActionMap::new(),
            vec!["view-front".into(), "view-top".into(), "view-iso".into()],
        )
    }

    fn panel_host() -> MemoryHost {
        let mut host = MemoryHost::new();
        host.push_scalar_row("Length", "25.4");
        host.push_vector_row("Delta", ["12.7", "-6.35", "0"]);
        host.push_scalar_row("Angle", "90°");
        host.push_header_row("Notes");
        host
    }

    fn copied(outcome: Outcome) -> String {
        match outcome {
            Outcome::Copy { text, .. } => text,
            other => panic!("expected copy, got {other:?}"),
        }
    }

    #[test]
    fn tool_toggle_reports_state_after() {
        let mut host = MemoryHost::new();
        host.add_toggle("measure", false);
        let mut d = dispatcher();

        let outcome = d.execute(&Command::tool("measure", "Measure"), &mut host).unwrap();
        assert_eq!(
            outcome,
            Outcome::Action {
                label: "Measure".into(),
                active: Some(true)
            }
        );
        assert_eq!(outcome.message().as_deref(), Some("Measure: on"));
        assert_eq!(host.toggle_state("measure"), Some(true));
    }

    #[test]
    fn action_map_translates_to_host_ids() {
        let mut host = MemoryHost::new();
        host.add_command("cmd.camera.top");
        let mut d = dispatcher();
        d.reconfigure(
            [("view-top", "cmd.camera.top")].into_iter().collect(),
            vec!["view-front".into(), "view-top".into()],
        );

        let outcome = d.execute(&Command::SetCameraView(2), &mut host).unwrap();
        assert_eq!(outcome.message().as_deref(), Some("View view-top"));
        assert_eq!(host.invoked(), &["cmd.camera.top".to_string()]);
    }

    #[test]
    fn missing_action_is_not_ready() {
        let mut host = MemoryHost::new();
        let mut d = dispatcher();
        assert_eq!(
            d.execute(&Command::tool("section", "Section"), &mut host),
            Err(DispatchError::NotReady("Section".into()))
        );
        assert_eq!(
            d.execute(&Command::ToggleGridPlane(Axis::Z), &mut host),
            Err(DispatchError::NotReady("Grid plane Z".into()))
        );
    }

    #[test_case(0)]
    #[test_case(4)]
    fn camera_view_out_of_range(index: usize) {
        let mut host = MemoryHost::new();
        let mut d = dispatcher();
        assert_eq!(
            d.execute(&Command::SetCameraView(index), &mut host),
            Err(DispatchError::out_of_range("Camera view", index, 3))
        );
        assert!(host.invoked().is_empty());
    }

    #[test]
    fn toggling_to_inches_converts_and_back_restores() {
        let mut host = panel_host();
        let mut d = dispatcher();

        let outcome = d.execute(&Command::ToggleUnit, &mut host).unwrap();
        assert_eq!(outcome.message().as_deref(), Some("Units: inch (1/16\")"));
        let rows = panel::snapshot(&host);
        let cells: Vec<_> = rows.iter().flat_map(|r| r.cells()).collect();
        let texts: Vec<_> = cells.iter().map(|c| host.text(*c).unwrap()).collect();
        assert_eq!(texts, vec!["1\"", "1/2\"", "-1/4\"", "0\"", "90°"]);

        d.execute(&Command::ToggleUnit, &mut host).unwrap();
        let texts: Vec<_> = cells.iter().map(|c| host.text(*c).unwrap()).collect();
        assert_eq!(texts, vec!["25.400", "12.700", "-6.350", "0.000", "90°"]);
        assert!(d.cache().is_empty());
    }

    #[test]
    fn precision_and_feet_rerender_from_canonical_values() {
        let mut host = MemoryHost::new();
        let cell = host.push_scalar_row("Length", "330.2");
        let mut d = dispatcher();

        d.execute(&Command::ToggleUnit, &mut host).unwrap();
        assert_eq!(host.text(cell), Some("13\""));
        d.execute(&Command::ToggleFeet, &mut host).unwrap();
        assert_eq!(host.text(cell), Some("1' 1\""));
        d.execute(&Command::CyclePrecision, &mut host).unwrap();
        assert_eq!(d.policy().precision, Precision::ThirtySecond);
        assert_eq!(host.text(cell), Some("1' 1\""));
    }

    #[test]
    fn precision_change_in_mm_mode_writes_nothing() {
        let mut host = panel_host();
        let mut d = dispatcher();
        d.execute(&Command::CyclePrecision, &mut host).unwrap();
        assert_eq!(host.write_count(), 0);
        assert!(d.cache().is_empty());
    }

    #[test]
    fn yank_row_uses_canonical_value_under_policy() {
        let mut host = panel_host();
        let mut d = dispatcher();
        assert_eq!(copied(d.execute(&Command::YankRow(1), &mut host).unwrap()), "25.4");

        d.execute(&Command::ToggleUnit, &mut host).unwrap();
        assert_eq!(copied(d.execute(&Command::YankRow(1), &mut host).unwrap()), "1\"");
        assert_eq!(
            copied(d.execute(&Command::YankRow(2), &mut host).unwrap()),
            "1/2\"\t-1/4\"\t0\""
        );
    }

    #[test]
    fn yank_axis_and_primary() {
        let mut host = panel_host();
        let mut d = dispatcher();
        assert_eq!(
            copied(d.execute(&Command::YankRowAxis(2, Axis::Y), &mut host).unwrap()),
            "-6.35"
        );
        assert_eq!(
            d.execute(&Command::YankRowAxis(1, Axis::X), &mut host),
            Err(DispatchError::NoVectorValue(1))
        );
        assert_eq!(copied(d.execute(&Command::YankPrimary, &mut host).unwrap()), "25.4");
    }

    #[test]
    fn yank_table_lists_every_row() {
        let mut host = panel_host();
        let mut d = dispatcher();
        let outcome = d.execute(&Command::YankTable, &mut host).unwrap();
        assert_eq!(outcome.to_string(), "Copied 4 rows");
        assert_eq!(
            copied(outcome),
            "Length\t25.4\nDelta\t12.7\t-6.35\t0\nAngle\t90°\nNotes"
        );
    }

    #[test]
    fn yank_errors() {
        let mut host = panel_host();
        let mut d = dispatcher();
        assert_eq!(
            d.execute(&Command::YankRow(9), &mut host),
            Err(DispatchError::out_of_range("Row", 9, 4))
        );
        assert_eq!(
            d.execute(&Command::YankRow(4), &mut host),
            Err(DispatchError::NotConvertible(4))
        );

        let mut empty = MemoryHost::new();
        assert_eq!(d.execute(&Command::YankTable, &mut empty), Err(DispatchError::NoRows));
        assert_eq!(d.execute(&Command::YankPrimary, &mut empty), Err(DispatchError::NoRows));
    }

    #[test]
    fn yank_after_host_overwrite_copies_new_text() {
        let mut host = MemoryHost::new();
        let cell = host.push_scalar_row("Length", "25.4");
        let mut d = dispatcher();
        d.execute(&Command::ToggleUnit, &mut host).unwrap();
        host.overwrite(cell, " 50.8 ");
        assert_eq!(copied(d.execute(&Command::YankRow(1), &mut host).unwrap()), "50.8");
    }

    #[test]
    fn visibility_toggles() {
        let mut host = MemoryHost::new();
        host.set_node_count(3);
        let mut d = dispatcher();

        let outcome = d
            .execute(&Command::toggle_visibility(2), &mut host)
            .unwrap();
        assert_eq!(outcome.message().as_deref(), Some("Node 2 hidden"));
        assert_eq!(host.node_visible(2), Some(false));

        let outcome = d
            .execute(&Command::toggle_visibility(0), &mut host)
            .unwrap();
        assert_eq!(outcome.message().as_deref(), Some("All nodes hidden"));

        assert_eq!(
            d.execute(&Command::toggle_visibility(4), &mut host),
            Err(DispatchError::out_of_range("Node", 4, 3))
        );
    }

    #[test]
    fn visibility_without_nodes_is_not_ready() {
        let mut host = MemoryHost::new();
        let mut d = dispatcher();
        assert_eq!(
            d.execute(&Command::toggle_visibility(0), &mut host),
            Err(DispatchError::NotReady("Scene tree".into()))
        );
    }

    #[test]
    fn reconcile_sweeps_removed_rows() {
        let mut host = panel_host();
        let mut d = dispatcher();
        d.execute(&Command::ToggleUnit, &mut host).unwrap();
        assert_eq!(d.cache().len(), 4);
        host.remove_row(1);
        d.reconcile(&mut host);
        assert_eq!(d.cache().len(), 1);
    }

    #[test]
    fn error_messages_read_naturally() {
        assert_eq!(
            DispatchError::out_of_range("Row", 7, 2).to_string(),
            "Row 7 is out of range (2 available)"
        );
        assert_eq!(DispatchError::NotReady("Measure".into()).to_string(), "Measure is not ready");
    }
}
