//! Daily notification tick.
//!
//! Driven hourly by the scheduler in `main`; the day-keyed marker in the
//! settings store keeps actual sends to at most once per day. The tick
//! auto-opens the current month, evaluates the day-of-month reminder rules
//! and the collection trigger, claims the marker only when something is due,
//! and hands the notices to the gateway.

use crate::{
    core::{settings, summary},
    errors::Result,
    notify::{
        gateway::{self, Notice, NotificationGateway},
        message,
    },
};
use chrono::{Datelike, NaiveDate};
use sea_orm::DatabaseConnection;

/// Day of the month on which security is asked to chase defaulters.
pub const SECURITY_REMINDER_DAY: u32 = 11;
/// Day of the month on which the admin gets copy-paste reminder texts.
pub const ADMIN_REMINDER_DAY: u32 = 20;

/// What a single tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DailyTickOutcome {
    /// The current month is closed; nothing to evaluate
    MonthClosed,
    /// Rules evaluated, no notice due today
    NothingDue,
    /// Notices were due but an earlier run already sent today's batch
    AlreadyNotified,
    /// Today's notices went out
    Sent {
        /// Notices the rules produced
        notices: usize,
        /// Notices the gateway actually delivered
        delivered: usize,
    },
}

/// Runs the scheduled tick for `today`.
///
/// Safe to call any number of times per day: a marker in the settings store
/// is claimed atomically before the first send, so repeat runs return
/// [`DailyTickOutcome::AlreadyNotified`] instead of double-sending.
pub async fn run_daily_tick(
    db: &DatabaseConnection,
    gateway: &dyn NotificationGateway,
    today: NaiveDate,
) -> Result<DailyTickOutcome> {
    let due_date_day = settings::get_due_date_day(db).await?;
    let month = crate::core::month::get_or_open_month(
        db,
        i32::try_from(today.month())?,
        today.year(),
        due_date_day,
    )
    .await?;

    if !month.is_open() {
        return Ok(DailyTickOutcome::MonthClosed);
    }

    let label = month.label();
    let day = today.day();
    let defaulters = summary::defaulters(db, month.id).await?;
    let status = summary::collection_status(db, month.id).await?;

    let mut notices = Vec::new();
    if day == SECURITY_REMINDER_DAY && !defaulters.is_empty() {
        notices.push(Notice::security(message::security_defaulter_notice(
            &defaulters,
            &label,
        )));
    }
    if day == ADMIN_REMINDER_DAY && !defaulters.is_empty() {
        notices.push(Notice::admin(message::admin_defaulter_notice(
            &defaulters,
            &label,
        )));
    }
    if let Some(notice) = message::collection_trigger(&status, &label) {
        notices.push(notice);
    }

    if notices.is_empty() {
        return Ok(DailyTickOutcome::NothingDue);
    }

    // Claim today's marker before sending; a concurrent tick that loses
    // the claim backs off.
    if !settings::claim_daily_marker(db, today).await? {
        return Ok(DailyTickOutcome::AlreadyNotified);
    }

    let count = notices.len();
    let delivered = gateway::dispatch(gateway, notices).await;
    tracing::info!(
        day,
        month = month.month,
        year = month.year,
        delivered,
        "Daily tick sent notices"
    );

    Ok(DailyTickOutcome::Sent {
        notices: count,
        delivered,
    })
}
