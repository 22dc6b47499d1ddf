//! Reminder log operations behind role guards.
//!
//! Admin and security share this surface: either can log a nudge or read the
//! month's trail. The acting role is recorded as `sent_by`, so the audit
//! trail says who did the nudging without a separate user table.

use crate::{
    core::{flat, reminder},
    errors::Result,
    ops::{Session, require_staff},
};
use sea_orm::prelude::*;
use std::collections::HashMap;

/// One reminder log row joined with its flat number.
#[derive(Debug, Clone)]
pub struct ReminderView {
    /// Reminder id
    pub id: i64,
    /// Flat the reminder was about
    pub flat_id: i64,
    /// Flat number
    pub flat_number: String,
    /// Month record id
    pub month_id: i64,
    /// Role that sent the reminder
    pub sent_by: String,
    /// When the reminder was logged
    pub sent_at: DateTimeUtc,
}

/// Lists a month's reminders, most recent first.
pub async fn list_reminders(
    db: &DatabaseConnection,
    session: &Session,
    month_id: i64,
) -> Result<Vec<ReminderView>> {
    require_staff(session)?;

    let flat_numbers: HashMap<i64, String> = flat::get_all_flats(db)
        .await?
        .into_iter()
        .map(|f| (f.id, f.flat_number))
        .collect();

    Ok(reminder::get_reminders_for_month(db, month_id)
        .await?
        .into_iter()
        .map(|r| ReminderView {
            id: r.id,
            flat_id: r.flat_id,
            flat_number: flat_numbers
                .get(&r.flat_id)
                .cloned()
                .unwrap_or_default(),
            month_id: r.month_id,
            sent_by: r.sent_by,
            sent_at: r.sent_at,
        })
        .collect())
}

/// Logs a reminder for a flat, attributed to the caller's role.
pub async fn record_reminder(
    db: &DatabaseConnection,
    session: &Session,
    flat_id: i64,
    month_id: i64,
) -> Result<ReminderView> {
    require_staff(session)?;

    let flat_number = flat::get_flat_by_id(db, flat_id)
        .await?
        .map(|f| f.flat_number)
        .unwrap_or_default();

    let row = reminder::record_reminder(db, flat_id, month_id, session.role.as_str()).await?;
    Ok(ReminderView {
        id: row.id,
        flat_id: row.flat_id,
        flat_number,
        month_id: row.month_id,
        sent_by: row.sent_by,
        sent_at: row.sent_at,
    })
}
