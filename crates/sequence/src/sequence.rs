//! Modal key-sequence interpreter.
//!
//! Raw key events go in; resolved [`actions::Command`]s, prompt updates and
//! rejections come out as [`Signal`]s. The machine never executes
//! anything itself and never sleeps: time is passed in with every event,
//! and the owner is expected to wake it through
//! [`SequenceMachine::handle_deadline`] when the armed
//! [`DeadlineToken`] comes due.

pub mod deadline;
pub mod key;
pub mod machine;

pub use deadline::{Deadline, DeadlineToken};
pub use key::{Key, KeyEvent, KeyParseError, Modifiers};
pub use machine::{SequenceMachine, SequenceState, Signal, Step};
