use thiserror::Error;

/// Why a resolved command could not be carried out. Every variant is
/// reported to the user and none of them is fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("{0} is not ready")]
    NotReady(String),

    #[error("{what} {index} is out of range ({available} available)")]
    OutOfRange {
        what: &'static str,
        index: usize,
        available: usize,
    },

    #[error("Row {0} has no x/y/z value")]
    NoVectorValue(usize),

    #[error("Nothing to copy")]
    NoRows,

    /// The row exists but shows no value cell.
    #[error("Row {0} has no value to copy")]
    NotConvertible(usize),
}

impl DispatchError {
    pub(crate) fn out_of_range(what: &'static str, index: usize, available: usize) -> Self {
        Self::OutOfRange {
            what,
            index,
            available,
        }
    }
}
