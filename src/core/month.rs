//! Month lifecycle business logic.
//!
//! Months move `open -> closed` and may be reopened by the admin. Closing is
//! the only gated transition: every flat must have a paid payment first.
//! Reopening deliberately re-checks nothing beyond the current status, so an
//! admin can reopen a settled month to record a correction.

use crate::{
    entities::{Flat, Month, MonthStatus, Payment, PaymentStatus, month, payment},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, SqlErr, prelude::*};

/// First year the tracker accepts; guards against typo years.
pub const MIN_YEAR: i32 = 2024;
/// Last year the tracker accepts.
pub const MAX_YEAR: i32 = 2100;

/// Finds a month by its unique ID.
pub async fn get_month_by_id(
    db: &DatabaseConnection,
    month_id: i64,
) -> Result<Option<month::Model>> {
    Month::find_by_id(month_id).one(db).await.map_err(Into::into)
}

/// Finds the month record for a specific (month, year) pair.
pub async fn get_month_by_date(
    db: &DatabaseConnection,
    month: i32,
    year: i32,
) -> Result<Option<month::Model>> {
    Month::find()
        .filter(month::Column::Month.eq(month))
        .filter(month::Column::Year.eq(year))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all months, newest first.
pub async fn get_all_months(db: &DatabaseConnection) -> Result<Vec<month::Model>> {
    Month::find()
        .order_by_desc(month::Column::Year)
        .order_by_desc(month::Column::Month)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves only the months still open for payment activity, newest first.
pub async fn get_open_months(db: &DatabaseConnection) -> Result<Vec<month::Model>> {
    Month::find()
        .filter(month::Column::Status.eq(MonthStatus::Open.as_str()))
        .order_by_desc(month::Column::Year)
        .order_by_desc(month::Column::Month)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Opens a new billing month.
///
/// Validates the calendar values, then inserts an `open` month with the given
/// due date day. A month that already exists for the pair is a conflict; the
/// unique index on (month, year) backstops concurrent opens.
pub async fn open_month(
    db: &DatabaseConnection,
    month: i32,
    year: i32,
    due_date_day: i32,
) -> Result<month::Model> {
    if !(1..=12).contains(&month) {
        return Err(Error::Validation {
            message: format!("Month must be 1-12, got {month}"),
        });
    }
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(Error::Validation {
            message: format!("Year must be {MIN_YEAR}-{MAX_YEAR}, got {year}"),
        });
    }
    if !(1..=28).contains(&due_date_day) {
        return Err(Error::Validation {
            message: format!("Due date day must be 1-28, got {due_date_day}"),
        });
    }

    if get_month_by_date(db, month, year).await?.is_some() {
        return Err(month_conflict(month, year));
    }

    let model = month::ActiveModel {
        month: Set(month),
        year: Set(year),
        status: Set(MonthStatus::Open.as_str().to_string()),
        due_date_day: Set(due_date_day),
        created_at: Set(Utc::now()),
        closed_at: Set(None),
        ..Default::default()
    };

    match model.insert(db).await {
        Ok(created) => {
            tracing::info!(month, year, "Opened month");
            Ok(created)
        }
        Err(e) => {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                Err(month_conflict(month, year))
            } else {
                Err(e.into())
            }
        }
    }
}

/// Returns the month record for the pair, opening it if it does not exist.
///
/// Used by the daily tick so that the current month is always tracked even
/// when the admin has not opened it by hand. If a concurrent open wins the
/// race the existing record is returned.
pub async fn get_or_open_month(
    db: &DatabaseConnection,
    month: i32,
    year: i32,
    due_date_day: i32,
) -> Result<month::Model> {
    if let Some(existing) = get_month_by_date(db, month, year).await? {
        return Ok(existing);
    }

    match open_month(db, month, year, due_date_day).await {
        Ok(created) => Ok(created),
        Err(Error::MonthAlreadyExists { .. }) => get_month_by_date(db, month, year)
            .await?
            .ok_or(Error::Internal {
                message: format!("Month {month}/{year} vanished after conflict"),
            }),
        Err(e) => Err(e),
    }
}

/// Closes a month once every flat has paid.
///
/// Requires the month to be `open` and every flat to have a payment in the
/// `paid` status for it. Fails with [`Error::UnpaidFlats`] carrying the count
/// of flats that still owe. On success the status becomes `closed` and
/// `closed_at` is stamped.
pub async fn close_month(db: &DatabaseConnection, month_id: i64) -> Result<month::Model> {
    let month = get_month_by_id(db, month_id)
        .await?
        .ok_or(Error::MonthNotFound { id: month_id })?;

    if !month.is_open() {
        return Err(Error::InvalidState {
            expected: MonthStatus::Open.as_str(),
            actual: month.status,
        });
    }

    let total_flats = Flat::find().count(db).await?;
    let paid_count = Payment::find()
        .filter(payment::Column::MonthId.eq(month_id))
        .filter(payment::Column::Status.eq(PaymentStatus::Paid.as_str()))
        .count(db)
        .await?;

    if paid_count < total_flats {
        return Err(Error::UnpaidFlats {
            count: total_flats - paid_count,
        });
    }

    let mut active_model: month::ActiveModel = month.into();
    active_model.status = Set(MonthStatus::Closed.as_str().to_string());
    active_model.closed_at = Set(Some(Utc::now()));
    let closed = active_model.update(db).await?;

    tracing::info!(month = closed.month, year = closed.year, "Closed month");
    Ok(closed)
}

/// Reopens a closed month.
///
/// Only the status is checked: payment completeness is not re-validated, so
/// corrections can be recorded and the month closed again afterwards.
pub async fn reopen_month(db: &DatabaseConnection, month_id: i64) -> Result<month::Model> {
    let month = get_month_by_id(db, month_id)
        .await?
        .ok_or(Error::MonthNotFound { id: month_id })?;

    if month.is_open() {
        return Err(Error::InvalidState {
            expected: MonthStatus::Closed.as_str(),
            actual: month.status,
        });
    }

    let mut active_model: month::ActiveModel = month.into();
    active_model.status = Set(MonthStatus::Open.as_str().to_string());
    active_model.closed_at = Set(None);
    let reopened = active_model.update(db).await?;

    tracing::info!(
        month = reopened.month,
        year = reopened.year,
        "Reopened month"
    );
    Ok(reopened)
}

fn month_conflict(month: i32, year: i32) -> Error {
    // Validation above guarantees the range; clamp keeps the error type total.
    let month = u32::try_from(month).unwrap_or(0);
    Error::MonthAlreadyExists { month, year }
}
