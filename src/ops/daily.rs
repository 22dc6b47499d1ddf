//! Scheduler entry point for the daily notification tick.
//!
//! There is no session here: the caller is the in-process scheduler (or an
//! externally authenticated cron hook), not a logged-in user. The heavy
//! lifting lives in `core::daily`; this module only fixes the operation
//! surface so every externally reachable action goes through `ops`.

use crate::{
    core::daily::{self, DailyTickOutcome},
    errors::Result,
    notify::gateway::NotificationGateway,
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;

/// Runs the daily notification tick for `today`.
pub async fn run_daily_tick(
    db: &DatabaseConnection,
    gateway: &dyn NotificationGateway,
    today: NaiveDate,
) -> Result<DailyTickOutcome> {
    daily::run_daily_tick(db, gateway, today).await
}
