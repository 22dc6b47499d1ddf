/// Notification gateway trait, Telegram implementation and dispatch
pub mod gateway;

/// Notice text builders and the collection trigger rule
pub mod message;
