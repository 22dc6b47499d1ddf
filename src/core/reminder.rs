//! Reminder log business logic.
//!
//! Reminders are an append-only audit trail: who nudged which flat for which
//! month and when. There is no payment-status precondition, so a reminder
//! can be logged even for a flat that has already submitted. The two-day
//! cooldown is advisory only; callers use [`can_remind_again`] to decide
//! whether to surface a warning, the data layer never enforces it.

use crate::{
    entities::{Flat, Month, Reminder, reminder},
    errors::{Error, Result},
};
use chrono::{Duration, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use std::collections::HashMap;

/// Hours after which a flat may reasonably be reminded again.
pub const REMINDER_COOLDOWN_HOURS: i64 = 48;

/// Logs a reminder for a flat and month.
///
/// Both the flat and the month must exist; the month does not have to be
/// open, so a nudge about an overdue closed-out correction still gets logged.
pub async fn record_reminder(
    db: &DatabaseConnection,
    flat_id: i64,
    month_id: i64,
    sent_by: &str,
) -> Result<reminder::Model> {
    Flat::find_by_id(flat_id)
        .one(db)
        .await?
        .ok_or(Error::FlatNotFound { id: flat_id })?;
    Month::find_by_id(month_id)
        .one(db)
        .await?
        .ok_or(Error::MonthNotFound { id: month_id })?;

    let model = reminder::ActiveModel {
        flat_id: Set(flat_id),
        month_id: Set(month_id),
        sent_by: Set(sent_by.to_string()),
        sent_at: Set(Utc::now()),
        ..Default::default()
    };

    model.insert(db).await.map_err(Into::into)
}

/// Retrieves all reminders for a month, most recent first.
pub async fn get_reminders_for_month(
    db: &DatabaseConnection,
    month_id: i64,
) -> Result<Vec<reminder::Model>> {
    Reminder::find()
        .filter(reminder::Column::MonthId.eq(month_id))
        .order_by_desc(reminder::Column::SentAt)
        .order_by_desc(reminder::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Maps each flat that has been reminded this month to its most recent
/// reminder time. Feeds the "last reminded" column of the status grid.
pub async fn last_reminded_map(
    db: &DatabaseConnection,
    month_id: i64,
) -> Result<HashMap<i64, DateTimeUtc>> {
    let reminders = get_reminders_for_month(db, month_id).await?;

    let mut latest = HashMap::new();
    for entry in reminders {
        // Entries arrive newest first, so the first one per flat wins
        latest.entry(entry.flat_id).or_insert(entry.sent_at);
    }
    Ok(latest)
}

/// Whether enough time has passed since the last reminder to send another
/// without badgering the flat. `None` means never reminded.
#[must_use]
pub fn can_remind_again(last_sent_at: Option<DateTimeUtc>, now: DateTimeUtc) -> bool {
    match last_sent_at {
        Some(last) => now - last >= Duration::hours(REMINDER_COOLDOWN_HOURS),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_record_reminder() -> Result<()> {
        let (db, flat, month) = setup_with_month().await?;

        let reminder = record_reminder(&db, flat.id, month.id, "admin").await?;
        assert_eq!(reminder.flat_id, flat.id);
        assert_eq!(reminder.month_id, month.id);
        assert_eq!(reminder.sent_by, "admin");

        Ok(())
    }

    #[tokio::test]
    async fn test_record_reminder_unknown_flat_or_month() -> Result<()> {
        let (db, flat, month) = setup_with_month().await?;

        let result = record_reminder(&db, 999, month.id, "admin").await;
        assert!(matches!(result.unwrap_err(), Error::FlatNotFound { id: 999 }));

        let result = record_reminder(&db, flat.id, 999, "security").await;
        assert!(matches!(
            result.unwrap_err(),
            Error::MonthNotFound { id: 999 }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_reminders_append_and_order() -> Result<()> {
        let (db, flat, month) = setup_with_month().await?;
        let other = create_test_flat(&db, "902").await?;

        let first = record_reminder(&db, flat.id, month.id, "security").await?;
        let second = record_reminder(&db, other.id, month.id, "admin").await?;
        let third = record_reminder(&db, flat.id, month.id, "admin").await?;

        let all = get_reminders_for_month(&db, month.id).await?;
        assert_eq!(all.len(), 3);
        // Most recent first
        assert_eq!(all[0].id, third.id);
        assert_eq!(all[1].id, second.id);
        assert_eq!(all[2].id, first.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_reminder_allowed_for_paid_flat() -> Result<()> {
        let (db, flat, month) = setup_with_month().await?;

        let p = submit_test_payment(&db, flat.id, month.id, "gpay").await?;
        crate::core::payment::approve_payment(&db, p.id).await?;

        // No status precondition: the log accepts it
        let reminder = record_reminder(&db, flat.id, month.id, "admin").await?;
        assert_eq!(reminder.flat_id, flat.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_last_reminded_map_keeps_latest() -> Result<()> {
        let (db, flat, month) = setup_with_month().await?;
        let other = create_test_flat(&db, "902").await?;

        record_reminder(&db, flat.id, month.id, "admin").await?;
        let latest_for_flat = record_reminder(&db, flat.id, month.id, "security").await?;
        let only_for_other = record_reminder(&db, other.id, month.id, "admin").await?;

        let map = last_reminded_map(&db, month.id).await?;
        assert_eq!(map.len(), 2);
        assert_eq!(map[&flat.id], latest_for_flat.sent_at);
        assert_eq!(map[&other.id], only_for_other.sent_at);

        Ok(())
    }

    #[test]
    fn test_can_remind_again_cooldown() {
        let now = Utc::now();

        assert!(can_remind_again(None, now));
        assert!(can_remind_again(Some(now - Duration::hours(49)), now));
        assert!(!can_remind_again(Some(now - Duration::hours(47)), now));
        assert!(!can_remind_again(Some(now), now));
    }
}
