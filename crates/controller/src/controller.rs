//! The single owner of keylayer's session state.
//!
//! A [`Controller`] holds the sequence machine, the dispatcher (and through
//! it the unit policy and value cache) and the host. Everything mutates
//! through `&mut self`, one event at a time; [`run`] feeds it from a
//! single-threaded tokio loop.

mod event_loop;
pub mod tables;

use std::time::{Duration, Instant};

use cell_cache::ReconcileReport;
use dispatch::{Dispatcher, Outcome};
use host::{ClipboardError, Host, Notifier, PromptSurface};
use sequence::{DeadlineToken, KeyEvent, SequenceMachine, Signal, Step};
use settings::Config;
use tracing::{info, warn};
use units::UnitPolicy;

pub use event_loop::run;

/// Text waiting for the asynchronous clipboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyJob {
    pub text: String,
    /// Short description for the confirmation toast ("row 2").
    pub what: String,
}

pub struct Controller<H> {
    host: H,
    machine: SequenceMachine,
    dispatcher: Dispatcher,
    reconcile_interval: Duration,
    copies: Vec<CopyJob>,
}

impl<H: Host> Controller<H> {
    pub fn new(host: H, config: &Config) -> Self {
        let machine = SequenceMachine::new(
            tables::binding_table(&config.keybindings),
            tables::view_menu(&config.view_options),
            config.sequence_timeout(),
        );
        let dispatcher = Dispatcher::new(
            config.unit_policy(),
            tables::action_map(config),
            config.camera_views.clone(),
        );
        Self {
            host,
            machine,
            dispatcher,
            reconcile_interval: config.reconcile_interval(),
            copies: Vec::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn machine(&self) -> &SequenceMachine {
        &self.machine
    }

    pub fn policy(&self) -> &UnitPolicy {
        self.dispatcher.policy()
    }

    pub fn reconcile_interval(&self) -> Duration {
        self.reconcile_interval
    }

    pub fn pending_deadline(&self) -> Option<DeadlineToken> {
        self.machine.pending_deadline()
    }

    /// Feed one key. Returns whether keylayer consumed it; unconsumed keys
    /// belong to the host.
    pub fn handle_key(&mut self, event: &KeyEvent, now: Instant) -> bool {
        let step = self.machine.handle_key(event, now);
        let consumed = step.consumed;
        self.apply(step);
        consumed
    }

    pub fn handle_deadline(&mut self, token: DeadlineToken, now: Instant) {
        let step = self.machine.handle_deadline(token, now);
        self.apply(step);
    }

    /// Periodic synchronization pass over the measurement panel.
    pub fn tick(&mut self) -> ReconcileReport {
        self.dispatcher.reconcile(&mut self.host)
    }

    /// Clipboard writes produced since the last call.
    pub fn take_copies(&mut self) -> Vec<CopyJob> {
        std::mem::take(&mut self.copies)
    }

    /// Report how a clipboard write went.
    pub fn copy_finished(&mut self, what: &str, result: Result<(), ClipboardError>) {
        match result {
            Ok(()) => self.host.notify(&format!("Copied {what}"), true),
            Err(e) => {
                warn!(what, "clipboard write failed: {e}");
                self.host.notify(&format!("Copy failed: {e}"), false);
            }
        }
    }

    /// Swap in a reloaded config. A pending sequence is dropped; the unit
    /// policy is session state and is left alone.
    pub fn apply_config(&mut self, config: &Config) {
        let step = self.machine.reconfigure(
            tables::binding_table(&config.keybindings),
            tables::view_menu(&config.view_options),
            config.sequence_timeout(),
        );
        self.apply(step);
        self.dispatcher
            .reconfigure(tables::action_map(config), config.camera_views.clone());
        self.reconcile_interval = config.reconcile_interval();
        info!(
            timeout = ?config.sequence_timeout(),
            interval = ?self.reconcile_interval,
            "config applied"
        );
    }

    fn apply(&mut self, step: Step) {
        for signal in step.signals {
            match signal {
                Signal::ShowPrompt(prompt) => self.host.show_prompt(&prompt),
                Signal::HidePrompt => self.host.hide_prompt(),
                Signal::Rejected(message) => {
                    warn!("{message}");
                    self.host.notify(&message, false);
                }
                Signal::Resolved(command) => {
                    match self.dispatcher.execute(&command, &mut self.host) {
                        Ok(Outcome::Copy { text, what }) => {
                            self.copies.push(CopyJob { text, what });
                        }
                        Ok(outcome) => {
                            if let Some(message) = outcome.message() {
                                self.host.notify(&message, true);
                            }
                        }
                        Err(e) => {
                            warn!(%command, "command failed: {e}");
                            self.host.notify(&e.to_string(), false);
                        }
                    }
                }
            }
        }
    }
}
