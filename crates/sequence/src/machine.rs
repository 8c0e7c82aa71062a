use std::time::{Duration, Instant};

use actions::{Axis, BindingTable, Chord, Command, ViewMenu};
use host::{Prompt, PromptOption};
use smallvec::SmallVec;
use tracing::{debug, info};

use crate::deadline::{Deadline, DeadlineToken};
use crate::key::KeyEvent;

/// The interpreter's working memory between keys.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SequenceState {
    #[default]
    Idle,
    NumPrefix {
        digits: String,
    },
    /// Count plus an axis letter, waiting for a confirming `y`.
    NumPrefixAxisPending {
        digits: String,
        axis: Axis,
    },
    YankPending,
    ViewPrefixPending,
}

impl SequenceState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Everything a single input produces, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    Resolved(Command),
    ShowPrompt(Prompt),
    HidePrompt,
    /// The key did not fit the grammar. Carries the user-facing message.
    Rejected(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Step {
    /// Whether the key was taken by the grammar instead of the host.
    pub consumed: bool,
    pub signals: SmallVec<[Signal; 4]>,
}

impl Step {
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.signals.iter().filter_map(|signal| match signal {
            Signal::Resolved(command) => Some(command),
            _ => None,
        })
    }

    pub fn rejections(&self) -> impl Iterator<Item = &str> {
        self.signals.iter().filter_map(|signal| match signal {
            Signal::Rejected(message) => Some(message.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interrupt {
    Key,
    Timeout,
}

/// Saturating parse of a buffered count.
fn count(digits: &str) -> usize {
    digits
        .bytes()
        .filter(u8::is_ascii_digit)
        .fold(0usize, |n, b| {
            n.saturating_mul(10).saturating_add(usize::from(b - b'0'))
        })
}

fn is_digit(chord: Chord) -> bool {
    !chord.shift && chord.key.is_ascii_digit()
}

fn is_plain(chord: Chord, key: char) -> bool {
    !chord.shift && chord.key == key
}

pub struct SequenceMachine {
    state: SequenceState,
    deadline: Deadline,
    timeout: Duration,
    bindings: BindingTable,
    view_menu: ViewMenu,
    last_event: Option<Instant>,
}

impl SequenceMachine {
    pub fn new(bindings: BindingTable, view_menu: ViewMenu, timeout: Duration) -> Self {
        Self {
            state: SequenceState::Idle,
            deadline: Deadline::new(),
            timeout,
            bindings,
            view_menu,
            last_event: None,
        }
    }

    pub fn state(&self) -> &SequenceState {
        &self.state
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn pending_deadline(&self) -> Option<DeadlineToken> {
        self.deadline.pending()
    }

    pub fn last_event(&self) -> Option<Instant> {
        self.last_event
    }

    pub fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    pub fn view_menu(&self) -> &ViewMenu {
        &self.view_menu
    }

    /// Swap tables and timeout. Any half-typed sequence is dropped.
    pub fn reconfigure(
        &mut self,
        bindings: BindingTable,
        view_menu: ViewMenu,
        timeout: Duration,
    ) -> Step {
        let step = self.reset();
        self.bindings = bindings;
        self.view_menu = view_menu;
        self.timeout = timeout;
        step
    }

    /// Drop back to idle without resolving anything.
    pub fn reset(&mut self) -> Step {
        let mut step = Step::default();
        self.clear(&mut step);
        step
    }

    pub fn handle_key(&mut self, event: &KeyEvent, now: Instant) -> Step {
        let mut step = Step::default();
        if self.deadline.is_due(now) {
            self.deadline.cancel();
            self.expire(&mut step);
        }
        self.last_event = Some(now);
        step.consumed = self.process(event, now, &mut step);
        step
    }

    /// Deliver a timer firing. Stale or early tokens are ignored.
    pub fn handle_deadline(&mut self, token: DeadlineToken, now: Instant) -> Step {
        let mut step = Step::default();
        if self.deadline.fire(token, now) {
            self.expire(&mut step);
        } else {
            debug!("ignoring stale sequence deadline");
        }
        step
    }

    fn process(&mut self, event: &KeyEvent, now: Instant, step: &mut Step) -> bool {
        if event.is_escape() {
            let pending = !self.state.is_idle();
            if pending {
                debug!(state = ?self.state, "sequence cancelled");
            }
            self.clear(step);
            return pending;
        }

        let Some(chord) = event.chord() else {
            match self.state.clone() {
                SequenceState::Idle => {}
                SequenceState::NumPrefixAxisPending { digits, axis } => {
                    self.resolve_unconfirmed_axis(&digits, axis, Interrupt::Key, step);
                }
                _ => {
                    debug!(%event, "sequence aborted by passthrough key");
                    self.clear(step);
                }
            }
            return false;
        };

        match self.state.clone() {
            SequenceState::Idle => self.idle(chord, now, step),
            SequenceState::NumPrefix { mut digits } => {
                if is_digit(chord) {
                    digits.push(chord.key);
                    self.enter(SequenceState::NumPrefix { digits }, now, step);
                    return true;
                }
                if let Some(axis) = Axis::from_char(chord.key).filter(|_| !chord.shift) {
                    self.enter(SequenceState::NumPrefixAxisPending { digits, axis }, now, step);
                    return true;
                }
                let n = count(&digits);
                if is_plain(chord, 'v') {
                    self.resolve(Command::SetCameraView(n), step);
                    return true;
                }
                if is_plain(chord, 'h') {
                    self.resolve(Command::toggle_visibility(n), step);
                    return true;
                }
                debug!(%digits, key = %chord, "count discarded");
                self.clear(step);
                self.idle(chord, now, step)
            }
            SequenceState::NumPrefixAxisPending { digits, axis } => {
                if is_plain(chord, 'y') {
                    self.resolve(Command::YankRowAxis(count(&digits), axis), step);
                    return true;
                }
                self.resolve_unconfirmed_axis(&digits, axis, Interrupt::Key, step);
                self.idle(chord, now, step)
            }
            SequenceState::YankPending => {
                if is_plain(chord, 'y') {
                    self.resolve(Command::YankPrimary, step);
                    return true;
                }
                self.clear(step);
                self.idle(chord, now, step)
            }
            SequenceState::ViewPrefixPending => {
                let entry = (!chord.shift)
                    .then(|| self.view_menu.lookup(chord.key))
                    .flatten()
                    .map(|entry| entry.command.clone());
                match entry {
                    Some(command) => self.resolve(command, step),
                    None => {
                        self.clear(step);
                        step.signals
                            .push(Signal::Rejected(format!("Unknown command: v {chord}")));
                    }
                }
                true
            }
        }
    }

    fn idle(&mut self, chord: Chord, now: Instant, step: &mut Step) -> bool {
        if is_digit(chord) {
            let digits = chord.key.to_string();
            self.enter(SequenceState::NumPrefix { digits }, now, step);
        } else if is_plain(chord, 'y') {
            self.enter(SequenceState::YankPending, now, step);
        } else if is_plain(chord, 'v') {
            self.enter(SequenceState::ViewPrefixPending, now, step);
        } else if let Some(binding) = self.bindings.lookup(chord) {
            let command = binding.command.clone();
            self.resolve(command, step);
        } else {
            return false;
        }
        true
    }

    fn expire(&mut self, step: &mut Step) {
        debug!(state = ?self.state, "sequence timed out");
        match self.state.clone() {
            SequenceState::Idle => {}
            SequenceState::NumPrefixAxisPending { digits, axis } => {
                self.resolve_unconfirmed_axis(&digits, axis, Interrupt::Timeout, step);
            }
            SequenceState::ViewPrefixPending => {
                self.clear(step);
                step.signals
                    .push(Signal::Rejected("Unknown command: v".to_string()));
            }
            SequenceState::NumPrefix { .. } | SequenceState::YankPending => self.clear(step),
        }
    }

    /// A count and axis that never got their confirming `y`. Shared by the
    /// timer and the next-key path.
    fn resolve_unconfirmed_axis(
        &mut self,
        digits: &str,
        axis: Axis,
        interrupt: Interrupt,
        step: &mut Step,
    ) {
        match (axis, interrupt) {
            (Axis::Y, _) => self.resolve(Command::yank_row(count(digits)), step),
            (_, Interrupt::Key) => {
                self.clear(step);
                step.signals
                    .push(Signal::Rejected(format!("Invalid sequence: {digits}{axis}")));
            }
            (_, Interrupt::Timeout) => self.clear(step),
        }
    }

    fn enter(&mut self, state: SequenceState, now: Instant, step: &mut Step) {
        debug!(?state, "sequence pending");
        self.state = state;
        self.deadline.arm(now + self.timeout);
        step.signals.push(Signal::ShowPrompt(self.prompt()));
    }

    fn resolve(&mut self, command: Command, step: &mut Step) {
        info!(%command, "sequence resolved");
        self.clear(step);
        step.signals.push(Signal::Resolved(command));
    }

    fn clear(&mut self, step: &mut Step) {
        self.deadline.cancel();
        if !self.state.is_idle() {
            self.state = SequenceState::Idle;
            step.signals.push(Signal::HidePrompt);
        }
    }

    /// Which-key content for the current state.
    pub fn prompt(&self) -> Prompt {
        match &self.state {
            SequenceState::Idle => Prompt {
                title: String::new(),
                options: self
                    .bindings
                    .iter()
                    .map(|b| PromptOption::new(b.chord.to_string(), b.label.clone()))
                    .collect(),
            },
            SequenceState::NumPrefix { digits } => {
                let n = count(digits);
                let (row, node) = if n == 0 {
                    ("Yank table".to_string(), "Toggle all".to_string())
                } else {
                    (format!("Yank row {n}"), format!("Toggle node {n}"))
                };
                Prompt {
                    title: digits.clone(),
                    options: vec![
                        PromptOption::new("0-9", "Count"),
                        PromptOption::new("y", row),
                        PromptOption::new("x z", "Pick axis, then y"),
                        PromptOption::new("v", format!("Camera view {n}")),
                        PromptOption::new("h", node),
                    ],
                }
            }
            SequenceState::NumPrefixAxisPending { digits, axis } => {
                let n = count(digits);
                let mut options = vec![PromptOption::new("y", format!("Yank {axis} of row {n}"))];
                if *axis == Axis::Y {
                    let label = if n == 0 {
                        "Yank table".to_string()
                    } else {
                        format!("Yank row {n}")
                    };
                    options.push(PromptOption::new("wait", label));
                }
                Prompt {
                    title: format!("{digits}{axis}"),
                    options,
                }
            }
            SequenceState::YankPending => Prompt {
                title: "y".to_string(),
                options: vec![PromptOption::new("y", "Yank primary value")],
            },
            SequenceState::ViewPrefixPending => Prompt {
                title: "v".to_string(),
                options: self
                    .view_menu
                    .iter()
                    .map(|entry| PromptOption::new(entry.key.to_string(), entry.label.clone()))
                    .collect(),
            },
        }
    }
}
