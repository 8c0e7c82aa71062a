//! Compile-time defaults and limits, grouped by component.

/// Key-sequence interpreter timing.
pub mod sequence {
    use std::time::Duration;

    /// How long a partial sequence waits for its next key.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);
    pub const MIN_TIMEOUT: Duration = Duration::from_millis(100);
    pub const MAX_TIMEOUT: Duration = Duration::from_millis(10_000);
}

/// Cell synchronizer polling.
pub mod reconcile {
    use std::time::Duration;

    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(250);
    pub const MIN_INTERVAL: Duration = Duration::from_millis(50);
    pub const MAX_INTERVAL: Duration = Duration::from_millis(5000);
}

/// Camera views selected by a count followed by `v`, in order.
pub mod views {
    pub const DEFAULT_CAMERA_VIEWS: &[&str] = &[
        "view-front",
        "view-back",
        "view-top",
        "view-bottom",
        "view-left",
        "view-right",
        "view-iso",
    ];
}

/// Settings file validation limits.
pub mod settings {
    use std::time::Duration;

    /// Maximum settings file size in bytes (64 KB).
    /// Settings files should be tiny; anything larger is suspicious.
    pub const MAX_FILE_SIZE: u64 = 64 * 1024;

    /// Maximum length for string fields (action names, labels).
    pub const MAX_STRING_LENGTH: usize = 256;

    /// Quiet period before a burst of file events counts as one change.
    pub const WATCH_DEBOUNCE: Duration = Duration::from_millis(100);
}
