/// PIN and password hashing
pub mod credentials;

/// Scheduled daily notification tick
pub mod daily;

/// Flat roster queries and admin updates
pub mod flat;

/// Month lifecycle: open, close, reopen
pub mod month;

/// Payment submission and the status state machine
pub mod payment;

/// Append-only reminder log and cooldown helper
pub mod reminder;

/// Month report data and plain-text rendering
pub mod report;

/// Typed key-value settings store
pub mod settings;

/// Collection status, defaulters and per-flat views
pub mod summary;
