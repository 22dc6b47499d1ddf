//! Payment state machine business logic.
//!
//! A payment is created by a resident submission and then moves through the
//! verification flow for its mode. Digital payments (gpay/phonepe) await
//! admin verification of the screenshot; cash payments await the security
//! guard's receipt confirmation and then the admin's collection. Every
//! transition is guarded by a conditional update on the current status, so
//! two concurrent actors cannot both win the same transition.

use crate::{
    entities::{Flat, Month, Payment, PaymentMode, PaymentStatus, payment},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, SqlErr, TransactionTrait, prelude::*};
use std::str::FromStr;

/// Longest accepted admin note or rejection reason, in characters.
pub const MAX_NOTE_LEN: usize = 500;

/// Admin-supplied fields for recording a payment on a flat's behalf.
/// `None` fields fall back to defaults: `cash` mode, `paid` status, the
/// flat's maintenance amount, and a "Recorded by admin" note.
#[derive(Debug, Clone, Default)]
pub struct AdminCreatePayment {
    /// Flat the payment belongs to
    pub flat_id: i64,
    /// Month the payment belongs to
    pub month_id: i64,
    /// Amount override; defaults to the flat's maintenance amount
    pub amount: Option<f64>,
    /// Payment mode; defaults to cash
    pub mode: Option<PaymentMode>,
    /// Status to record; defaults to paid
    pub status: Option<PaymentStatus>,
    /// Note to attach; defaults to "Recorded by admin"
    pub note: Option<String>,
    /// Date the payment was actually made, if known
    pub paid_on: Option<Date>,
}

/// Finds a payment by its unique ID.
pub async fn get_payment_by_id(
    db: &DatabaseConnection,
    payment_id: i64,
) -> Result<Option<payment::Model>> {
    Payment::find_by_id(payment_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds the payment for a (flat, month) pair, regardless of status.
pub async fn get_payment_for_flat_month(
    db: &DatabaseConnection,
    flat_id: i64,
    month_id: i64,
) -> Result<Option<payment::Model>> {
    Payment::find()
        .filter(payment::Column::FlatId.eq(flat_id))
        .filter(payment::Column::MonthId.eq(month_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves payments matching the given filters, newest first.
pub async fn find_payments(
    db: &DatabaseConnection,
    flat_id: Option<i64>,
    month_id: Option<i64>,
    status: Option<PaymentStatus>,
) -> Result<Vec<payment::Model>> {
    let mut query = Payment::find();
    if let Some(flat_id) = flat_id {
        query = query.filter(payment::Column::FlatId.eq(flat_id));
    }
    if let Some(month_id) = month_id {
        query = query.filter(payment::Column::MonthId.eq(month_id));
    }
    if let Some(status) = status {
        query = query.filter(payment::Column::Status.eq(status.as_str()));
    }
    query
        .order_by_desc(payment::Column::SubmittedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Submits a resident payment for a month.
///
/// The month must be open and the flat must not already have a non-rejected
/// payment for it. A previously rejected payment is deleted and replaced,
/// which is the only deletion in the system. The amount is always taken from
/// the flat's configured maintenance amount, never from the caller. Cash
/// payments start in `pending_security`; digital payments start in
/// `pending_verification`.
pub async fn submit_payment(
    db: &DatabaseConnection,
    flat_id: i64,
    month_id: i64,
    mode: PaymentMode,
    paid_on: Option<Date>,
) -> Result<payment::Model> {
    let txn = db.begin().await?;

    let month = Month::find_by_id(month_id)
        .one(&txn)
        .await?
        .ok_or(Error::MonthNotFound { id: month_id })?;
    if !month.is_open() {
        return Err(Error::InvalidState {
            expected: "open",
            actual: month.status,
        });
    }

    let flat = Flat::find_by_id(flat_id)
        .one(&txn)
        .await?
        .ok_or(Error::FlatNotFound { id: flat_id })?;

    let existing = Payment::find()
        .filter(payment::Column::FlatId.eq(flat_id))
        .filter(payment::Column::MonthId.eq(month_id))
        .one(&txn)
        .await?;
    if let Some(existing) = existing {
        if existing.status != PaymentStatus::Rejected.as_str() {
            return Err(Error::PaymentAlreadyExists { flat_id, month_id });
        }
        // Resubmission replaces the rejected attempt entirely
        Payment::delete_by_id(existing.id).exec(&txn).await?;
    }

    let status = if mode.is_digital() {
        PaymentStatus::PendingVerification
    } else {
        PaymentStatus::PendingSecurity
    };

    let model = payment::ActiveModel {
        flat_id: Set(flat_id),
        month_id: Set(month_id),
        amount: Set(flat.maintenance_amount),
        payment_mode: Set(mode.as_str().to_string()),
        status: Set(status.as_str().to_string()),
        screenshot_ref: Set(None),
        submitted_at: Set(Utc::now()),
        paid_on: Set(paid_on),
        security_confirmed_at: Set(None),
        verified_at: Set(None),
        collected_at: Set(None),
        admin_note: Set(None),
        ..Default::default()
    };

    let inserted = match model.insert(&txn).await {
        Ok(inserted) => inserted,
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            return Err(Error::PaymentAlreadyExists { flat_id, month_id });
        }
        Err(e) => return Err(e.into()),
    };

    txn.commit().await?;

    tracing::info!(
        flat_id,
        month_id,
        mode = mode.as_str(),
        status = status.as_str(),
        "Payment submitted"
    );
    Ok(inserted)
}

/// Approves a digital payment: `pending_verification -> paid`.
///
/// Stamps `verified_at`. Fails with [`Error::InvalidState`] carrying the
/// current status if the payment is in any other state.
pub async fn approve_payment(db: &DatabaseConnection, payment_id: i64) -> Result<payment::Model> {
    use sea_orm::sea_query::Expr;

    let result = Payment::update_many()
        .col_expr(
            payment::Column::Status,
            Expr::value(PaymentStatus::Paid.as_str()),
        )
        .col_expr(payment::Column::VerifiedAt, Expr::value(Some(Utc::now())))
        .filter(payment::Column::Id.eq(payment_id))
        .filter(payment::Column::Status.eq(PaymentStatus::PendingVerification.as_str()))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(transition_failure(db, payment_id, PaymentStatus::PendingVerification).await);
    }

    get_payment_by_id(db, payment_id)
        .await?
        .ok_or(Error::PaymentNotFound { id: payment_id })
}

/// Rejects a digital payment: `pending_verification -> rejected`.
///
/// The reason is mandatory (1 to [`MAX_NOTE_LEN`] characters after trimming)
/// and is stored as the admin note. The flat may submit again afterwards.
pub async fn reject_payment(
    db: &DatabaseConnection,
    payment_id: i64,
    reason: &str,
) -> Result<payment::Model> {
    use sea_orm::sea_query::Expr;

    let reason = reason.trim();
    if reason.is_empty() {
        return Err(Error::Validation {
            message: "Rejection reason is required".to_string(),
        });
    }
    if reason.chars().count() > MAX_NOTE_LEN {
        return Err(Error::Validation {
            message: format!("Rejection reason must be at most {MAX_NOTE_LEN} characters"),
        });
    }

    let result = Payment::update_many()
        .col_expr(
            payment::Column::Status,
            Expr::value(PaymentStatus::Rejected.as_str()),
        )
        .col_expr(payment::Column::VerifiedAt, Expr::value(Some(Utc::now())))
        .col_expr(payment::Column::AdminNote, Expr::value(Some(reason)))
        .filter(payment::Column::Id.eq(payment_id))
        .filter(payment::Column::Status.eq(PaymentStatus::PendingVerification.as_str()))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(transition_failure(db, payment_id, PaymentStatus::PendingVerification).await);
    }

    get_payment_by_id(db, payment_id)
        .await?
        .ok_or(Error::PaymentNotFound { id: payment_id })
}

/// Confirms cash receipt: `pending_security -> pending_collection`.
///
/// Recorded by the security guard; stamps `security_confirmed_at`. The cash
/// is then with security until the admin collects it.
pub async fn security_confirm(db: &DatabaseConnection, payment_id: i64) -> Result<payment::Model> {
    use sea_orm::sea_query::Expr;

    let result = Payment::update_many()
        .col_expr(
            payment::Column::Status,
            Expr::value(PaymentStatus::PendingCollection.as_str()),
        )
        .col_expr(
            payment::Column::SecurityConfirmedAt,
            Expr::value(Some(Utc::now())),
        )
        .filter(payment::Column::Id.eq(payment_id))
        .filter(payment::Column::Status.eq(PaymentStatus::PendingSecurity.as_str()))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(transition_failure(db, payment_id, PaymentStatus::PendingSecurity).await);
    }

    get_payment_by_id(db, payment_id)
        .await?
        .ok_or(Error::PaymentNotFound { id: payment_id })
}

/// Records cash collection: `pending_collection -> paid`.
///
/// Stamps `collected_at`, completing the cash flow.
pub async fn collect_cash(db: &DatabaseConnection, payment_id: i64) -> Result<payment::Model> {
    use sea_orm::sea_query::Expr;

    let result = Payment::update_many()
        .col_expr(
            payment::Column::Status,
            Expr::value(PaymentStatus::Paid.as_str()),
        )
        .col_expr(payment::Column::CollectedAt, Expr::value(Some(Utc::now())))
        .filter(payment::Column::Id.eq(payment_id))
        .filter(payment::Column::Status.eq(PaymentStatus::PendingCollection.as_str()))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(transition_failure(db, payment_id, PaymentStatus::PendingCollection).await);
    }

    get_payment_by_id(db, payment_id)
        .await?
        .ok_or(Error::PaymentNotFound { id: payment_id })
}

/// Forces a payment into an arbitrary status while its month is still open.
///
/// Correction tool for mistakes in the normal flow. Setting `paid` backfills
/// `verified_at` (and `collected_at` for cash) when unset so the record
/// stays consistent with payments that took the normal path. At least one of
/// `new_status` and `note` must be given.
pub async fn admin_override(
    db: &DatabaseConnection,
    payment_id: i64,
    new_status: Option<PaymentStatus>,
    note: Option<String>,
) -> Result<payment::Model> {
    if new_status.is_none() && note.is_none() {
        return Err(Error::Validation {
            message: "Nothing to update".to_string(),
        });
    }
    if let Some(note) = &note
        && note.chars().count() > MAX_NOTE_LEN
    {
        return Err(Error::Validation {
            message: format!("Note must be at most {MAX_NOTE_LEN} characters"),
        });
    }

    let existing = get_payment_by_id(db, payment_id)
        .await?
        .ok_or(Error::PaymentNotFound { id: payment_id })?;

    let month = Month::find_by_id(existing.month_id)
        .one(db)
        .await?
        .ok_or(Error::MonthNotFound {
            id: existing.month_id,
        })?;
    if !month.is_open() {
        return Err(Error::InvalidState {
            expected: "open",
            actual: month.status,
        });
    }

    let mode = PaymentMode::from_str(&existing.payment_mode)?;
    let now = Utc::now();
    let mut active_model: payment::ActiveModel = existing.clone().into();

    if let Some(status) = new_status {
        active_model.status = Set(status.as_str().to_string());
        if status == PaymentStatus::Paid {
            if existing.verified_at.is_none() {
                active_model.verified_at = Set(Some(now));
            }
            if mode == PaymentMode::Cash && existing.collected_at.is_none() {
                active_model.collected_at = Set(Some(now));
            }
        }
    }
    if let Some(note) = note {
        active_model.admin_note = Set(Some(note));
    }

    let updated = active_model.update(db).await?;
    tracing::info!(
        payment_id,
        status = updated.status,
        "Payment overridden by admin"
    );
    Ok(updated)
}

/// Records a payment on a flat's behalf, admin only.
///
/// Unlike resident submission this refuses to touch an existing payment in
/// any status, including rejected: corrections to existing rows go through
/// [`admin_override`] instead. Timestamps are backfilled to match the
/// recorded status.
pub async fn admin_create_payment(
    db: &DatabaseConnection,
    input: AdminCreatePayment,
) -> Result<payment::Model> {
    if let Some(amount) = input.amount
        && amount <= 0.0
    {
        return Err(Error::Validation {
            message: format!("Amount must be positive, got {amount}"),
        });
    }
    if let Some(note) = &input.note
        && note.chars().count() > MAX_NOTE_LEN
    {
        return Err(Error::Validation {
            message: format!("Note must be at most {MAX_NOTE_LEN} characters"),
        });
    }

    let txn = db.begin().await?;

    let flat = Flat::find_by_id(input.flat_id)
        .one(&txn)
        .await?
        .ok_or(Error::FlatNotFound { id: input.flat_id })?;
    Month::find_by_id(input.month_id)
        .one(&txn)
        .await?
        .ok_or(Error::MonthNotFound { id: input.month_id })?;

    let existing = Payment::find()
        .filter(payment::Column::FlatId.eq(input.flat_id))
        .filter(payment::Column::MonthId.eq(input.month_id))
        .one(&txn)
        .await?;
    if existing.is_some() {
        return Err(Error::PaymentAlreadyExists {
            flat_id: input.flat_id,
            month_id: input.month_id,
        });
    }

    let mode = input.mode.unwrap_or(PaymentMode::Cash);
    let status = input.status.unwrap_or(PaymentStatus::Paid);
    let amount = input.amount.unwrap_or(flat.maintenance_amount);
    let note = input.note.unwrap_or_else(|| "Recorded by admin".to_string());
    let now = Utc::now();

    let verified_at = (status == PaymentStatus::Paid).then_some(now);
    let collected_at = (status == PaymentStatus::Paid && mode == PaymentMode::Cash).then_some(now);
    let security_confirmed_at = (mode == PaymentMode::Cash
        && matches!(
            status,
            PaymentStatus::Paid | PaymentStatus::PendingCollection
        ))
    .then_some(now);

    let model = payment::ActiveModel {
        flat_id: Set(input.flat_id),
        month_id: Set(input.month_id),
        amount: Set(amount),
        payment_mode: Set(mode.as_str().to_string()),
        status: Set(status.as_str().to_string()),
        screenshot_ref: Set(None),
        submitted_at: Set(now),
        paid_on: Set(input.paid_on),
        security_confirmed_at: Set(security_confirmed_at),
        verified_at: Set(verified_at),
        collected_at: Set(collected_at),
        admin_note: Set(Some(note)),
        ..Default::default()
    };

    let inserted = match model.insert(&txn).await {
        Ok(inserted) => inserted,
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            return Err(Error::PaymentAlreadyExists {
                flat_id: input.flat_id,
                month_id: input.month_id,
            });
        }
        Err(e) => return Err(e.into()),
    };

    txn.commit().await?;

    tracing::info!(
        flat_id = input.flat_id,
        month_id = input.month_id,
        status = inserted.status,
        "Payment recorded by admin"
    );
    Ok(inserted)
}

/// Attaches a screenshot reference to a digital payment awaiting verification.
pub async fn attach_screenshot(
    db: &DatabaseConnection,
    payment_id: i64,
    screenshot_ref: String,
) -> Result<payment::Model> {
    if screenshot_ref.trim().is_empty() {
        return Err(Error::Validation {
            message: "Screenshot reference cannot be empty".to_string(),
        });
    }

    let existing = get_payment_by_id(db, payment_id)
        .await?
        .ok_or(Error::PaymentNotFound { id: payment_id })?;

    let mode = PaymentMode::from_str(&existing.payment_mode)?;
    if !mode.is_digital() {
        return Err(Error::Validation {
            message: "Screenshots apply only to digital payments".to_string(),
        });
    }
    if existing.status != PaymentStatus::PendingVerification.as_str() {
        return Err(Error::InvalidState {
            expected: PaymentStatus::PendingVerification.as_str(),
            actual: existing.status,
        });
    }

    let mut active_model: payment::ActiveModel = existing.into();
    active_model.screenshot_ref = Set(Some(screenshot_ref));
    active_model.update(db).await.map_err(Into::into)
}

/// Builds the error for a guarded transition that matched no row: either the
/// payment does not exist, or its current status differs from the expected
/// one, in which case the actual status is reported.
async fn transition_failure(
    db: &DatabaseConnection,
    payment_id: i64,
    expected: PaymentStatus,
) -> Error {
    match get_payment_by_id(db, payment_id).await {
        Ok(Some(current)) => Error::InvalidState {
            expected: expected.as_str(),
            actual: current.status,
        },
        Ok(None) => Error::PaymentNotFound { id: payment_id },
        Err(e) => e,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_reject_reason_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = reject_payment(&db, 1, "").await;
        assert!(matches!(
            result.unwrap_err(),
            Error::Validation { message: _ }
        ));

        let result = reject_payment(&db, 1, "   ").await;
        assert!(matches!(
            result.unwrap_err(),
            Error::Validation { message: _ }
        ));

        let long_reason = "x".repeat(MAX_NOTE_LEN + 1);
        let result = reject_payment(&db, 1, &long_reason).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::Validation { message: _ }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_admin_override_requires_changes() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = admin_override(&db, 1, None, None).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::Validation { message: _ }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_submit_digital_payment() -> Result<()> {
        let (db, flat, month) = setup_with_month().await?;

        let payment = submit_payment(&db, flat.id, month.id, PaymentMode::Gpay, None).await?;

        assert_eq!(payment.flat_id, flat.id);
        assert_eq!(payment.month_id, month.id);
        assert_eq!(payment.amount, flat.maintenance_amount);
        assert_eq!(payment.payment_mode, "gpay");
        assert_eq!(payment.status, "pending_verification");
        assert!(payment.verified_at.is_none());
        assert!(payment.paid_on.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_submit_cash_payment() -> Result<()> {
        let (db, flat, month) = setup_with_month().await?;

        let payment = submit_payment(&db, flat.id, month.id, PaymentMode::Cash, None).await?;
        assert_eq!(payment.status, "pending_security");
        assert!(payment.security_confirmed_at.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_submit_records_paid_on_date() -> Result<()> {
        let (db, flat, month) = setup_with_month().await?;

        let date = Date::from_ymd_opt(2025, 3, 5).unwrap();
        let payment =
            submit_payment(&db, flat.id, month.id, PaymentMode::Phonepe, Some(date)).await?;
        assert_eq!(payment.paid_on, Some(date));

        Ok(())
    }

    #[tokio::test]
    async fn test_submit_duplicate_rejected() -> Result<()> {
        let (db, flat, month) = setup_with_month().await?;

        submit_payment(&db, flat.id, month.id, PaymentMode::Gpay, None).await?;
        let result = submit_payment(&db, flat.id, month.id, PaymentMode::Cash, None).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::PaymentAlreadyExists { .. }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_submit_on_closed_month_fails() -> Result<()> {
        let (db, flat, month) = setup_with_month().await?;

        let p = submit_payment(&db, flat.id, month.id, PaymentMode::Gpay, None).await?;
        approve_payment(&db, p.id).await?;
        crate::core::month::close_month(&db, month.id).await?;

        let flat2 = create_test_flat(&db, "902").await?;
        let result = submit_payment(&db, flat2.id, month.id, PaymentMode::Gpay, None).await;
        match result.unwrap_err() {
            Error::InvalidState { expected, actual } => {
                assert_eq!(expected, "open");
                assert_eq!(actual, "closed");
            }
            other => panic!("Expected InvalidState, got {other:?}"),
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_submit_unknown_month_and_flat() -> Result<()> {
        let (db, flat, month) = setup_with_month().await?;

        let result = submit_payment(&db, flat.id, 999, PaymentMode::Gpay, None).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::MonthNotFound { id: 999 }
        ));

        let result = submit_payment(&db, 999, month.id, PaymentMode::Gpay, None).await;
        assert!(matches!(result.unwrap_err(), Error::FlatNotFound { id: 999 }));

        Ok(())
    }

    #[tokio::test]
    async fn test_resubmit_after_rejection_replaces_row() -> Result<()> {
        let (db, flat, month) = setup_with_month().await?;

        let first = submit_payment(&db, flat.id, month.id, PaymentMode::Gpay, None).await?;
        reject_payment(&db, first.id, "Blurry screenshot").await?;

        // Resubmission with a different mode deletes the rejected row
        let second = submit_payment(&db, flat.id, month.id, PaymentMode::Cash, None).await?;
        assert_ne!(second.id, first.id);
        assert_eq!(second.status, "pending_security");
        assert_eq!(second.payment_mode, "cash");
        assert!(second.admin_note.is_none());

        assert!(get_payment_by_id(&db, first.id).await?.is_none());

        // Only one payment remains for the pair
        let all = find_payments(&db, Some(flat.id), Some(month.id), None).await?;
        assert_eq!(all.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_resubmit_digital_restarts_verification() -> Result<()> {
        let (db, flat, month) = setup_with_month().await?;

        let first = submit_payment(&db, flat.id, month.id, PaymentMode::Gpay, None).await?;
        reject_payment(&db, first.id, "Wrong UPI reference").await?;

        let second = submit_payment(&db, flat.id, month.id, PaymentMode::Phonepe, None).await?;
        assert_ne!(second.id, first.id);
        assert_eq!(second.status, "pending_verification");
        assert_eq!(second.payment_mode, "phonepe");

        Ok(())
    }

    #[tokio::test]
    async fn test_approve_payment() -> Result<()> {
        let (db, flat, month) = setup_with_month().await?;

        let payment = submit_payment(&db, flat.id, month.id, PaymentMode::Gpay, None).await?;
        let approved = approve_payment(&db, payment.id).await?;

        assert_eq!(approved.status, "paid");
        assert!(approved.verified_at.is_some());
        assert!(approved.collected_at.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_approve_twice_reports_actual_status() -> Result<()> {
        let (db, flat, month) = setup_with_month().await?;

        let payment = submit_payment(&db, flat.id, month.id, PaymentMode::Gpay, None).await?;
        let approved = approve_payment(&db, payment.id).await?;

        let result = approve_payment(&db, payment.id).await;
        match result.unwrap_err() {
            Error::InvalidState { expected, actual } => {
                assert_eq!(expected, "pending_verification");
                assert_eq!(actual, "paid");
            }
            other => panic!("Expected InvalidState, got {other:?}"),
        }

        // Row untouched by the failed attempt
        let current = get_payment_by_id(&db, payment.id).await?.unwrap();
        assert_eq!(current.verified_at, approved.verified_at);

        Ok(())
    }

    #[tokio::test]
    async fn test_approve_cash_payment_fails() -> Result<()> {
        let (db, flat, month) = setup_with_month().await?;

        let payment = submit_payment(&db, flat.id, month.id, PaymentMode::Cash, None).await?;
        let result = approve_payment(&db, payment.id).await;
        match result.unwrap_err() {
            Error::InvalidState { actual, .. } => assert_eq!(actual, "pending_security"),
            other => panic!("Expected InvalidState, got {other:?}"),
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_approve_missing_payment() -> Result<()> {
        let db = setup_test_db().await?;

        let result = approve_payment(&db, 42).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::PaymentNotFound { id: 42 }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_reject_payment_stores_reason() -> Result<()> {
        let (db, flat, month) = setup_with_month().await?;

        let payment = submit_payment(&db, flat.id, month.id, PaymentMode::Phonepe, None).await?;
        let rejected = reject_payment(&db, payment.id, "  Amount mismatch  ").await?;

        assert_eq!(rejected.status, "rejected");
        assert_eq!(rejected.admin_note.as_deref(), Some("Amount mismatch"));
        assert!(rejected.verified_at.is_some());

        Ok(())
    }

    #[tokio::test]
    async fn test_cash_flow_ordering() -> Result<()> {
        let (db, flat, month) = setup_with_month().await?;

        let payment = submit_payment(&db, flat.id, month.id, PaymentMode::Cash, None).await?;

        // Collect before security confirmation fails
        let result = collect_cash(&db, payment.id).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidState { .. }));

        let confirmed = security_confirm(&db, payment.id).await?;
        assert_eq!(confirmed.status, "pending_collection");
        assert!(confirmed.security_confirmed_at.is_some());

        // Confirming twice fails
        let result = security_confirm(&db, payment.id).await;
        match result.unwrap_err() {
            Error::InvalidState { actual, .. } => assert_eq!(actual, "pending_collection"),
            other => panic!("Expected InvalidState, got {other:?}"),
        }

        let collected = collect_cash(&db, payment.id).await?;
        assert_eq!(collected.status, "paid");
        assert!(collected.collected_at.is_some());
        assert!(collected.verified_at.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_security_confirm_digital_payment_fails() -> Result<()> {
        let (db, flat, month) = setup_with_month().await?;

        let payment = submit_payment(&db, flat.id, month.id, PaymentMode::Gpay, None).await?;
        let result = security_confirm(&db, payment.id).await;
        match result.unwrap_err() {
            Error::InvalidState { expected, actual } => {
                assert_eq!(expected, "pending_security");
                assert_eq!(actual, "pending_verification");
            }
            other => panic!("Expected InvalidState, got {other:?}"),
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_admin_override_to_paid_backfills_timestamps() -> Result<()> {
        let (db, flat, month) = setup_with_month().await?;

        let payment = submit_payment(&db, flat.id, month.id, PaymentMode::Cash, None).await?;
        let updated = admin_override(
            &db,
            payment.id,
            Some(PaymentStatus::Paid),
            Some("Collected directly".to_string()),
        )
        .await?;

        assert_eq!(updated.status, "paid");
        assert!(updated.verified_at.is_some());
        assert!(updated.collected_at.is_some());
        assert_eq!(updated.admin_note.as_deref(), Some("Collected directly"));

        Ok(())
    }

    #[tokio::test]
    async fn test_admin_override_note_only() -> Result<()> {
        let (db, flat, month) = setup_with_month().await?;

        let payment = submit_payment(&db, flat.id, month.id, PaymentMode::Gpay, None).await?;
        let updated = admin_override(&db, payment.id, None, Some("Checking".to_string())).await?;

        assert_eq!(updated.status, "pending_verification");
        assert_eq!(updated.admin_note.as_deref(), Some("Checking"));

        Ok(())
    }

    #[tokio::test]
    async fn test_admin_override_on_closed_month_fails() -> Result<()> {
        let (db, flat, month) = setup_with_month().await?;

        let payment = submit_payment(&db, flat.id, month.id, PaymentMode::Gpay, None).await?;
        approve_payment(&db, payment.id).await?;
        crate::core::month::close_month(&db, month.id).await?;

        let result = admin_override(
            &db,
            payment.id,
            Some(PaymentStatus::PendingVerification),
            None,
        )
        .await;
        match result.unwrap_err() {
            Error::InvalidState { expected, actual } => {
                assert_eq!(expected, "open");
                assert_eq!(actual, "closed");
            }
            other => panic!("Expected InvalidState, got {other:?}"),
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_admin_create_payment_defaults() -> Result<()> {
        let (db, flat, month) = setup_with_month().await?;

        let payment = admin_create_payment(
            &db,
            AdminCreatePayment {
                flat_id: flat.id,
                month_id: month.id,
                ..Default::default()
            },
        )
        .await?;

        assert_eq!(payment.status, "paid");
        assert_eq!(payment.payment_mode, "cash");
        assert_eq!(payment.amount, flat.maintenance_amount);
        assert_eq!(payment.admin_note.as_deref(), Some("Recorded by admin"));
        assert!(payment.verified_at.is_some());
        assert!(payment.collected_at.is_some());
        assert!(payment.security_confirmed_at.is_some());

        Ok(())
    }

    #[tokio::test]
    async fn test_admin_create_payment_digital() -> Result<()> {
        let (db, flat, month) = setup_with_month().await?;

        let payment = admin_create_payment(
            &db,
            AdminCreatePayment {
                flat_id: flat.id,
                month_id: month.id,
                mode: Some(PaymentMode::Gpay),
                amount: Some(1800.0),
                ..Default::default()
            },
        )
        .await?;

        assert_eq!(payment.payment_mode, "gpay");
        assert_eq!(payment.amount, 1800.0);
        assert!(payment.verified_at.is_some());
        assert!(payment.collected_at.is_none());
        assert!(payment.security_confirmed_at.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_admin_create_conflicts_with_any_existing() -> Result<()> {
        let (db, flat, month) = setup_with_month().await?;

        // Even a rejected payment blocks admin creation
        let submitted = submit_payment(&db, flat.id, month.id, PaymentMode::Gpay, None).await?;
        reject_payment(&db, submitted.id, "No screenshot").await?;

        let result = admin_create_payment(
            &db,
            AdminCreatePayment {
                flat_id: flat.id,
                month_id: month.id,
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::PaymentAlreadyExists { .. }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_attach_screenshot() -> Result<()> {
        let (db, flat, month) = setup_with_month().await?;

        let payment = submit_payment(&db, flat.id, month.id, PaymentMode::Gpay, None).await?;
        let updated = attach_screenshot(&db, payment.id, "blob/abc123".to_string()).await?;
        assert_eq!(updated.screenshot_ref.as_deref(), Some("blob/abc123"));

        Ok(())
    }

    #[tokio::test]
    async fn test_attach_screenshot_cash_fails() -> Result<()> {
        let (db, flat, month) = setup_with_month().await?;

        let payment = submit_payment(&db, flat.id, month.id, PaymentMode::Cash, None).await?;
        let result = attach_screenshot(&db, payment.id, "blob/abc".to_string()).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::Validation { message: _ }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_attach_screenshot_after_approval_fails() -> Result<()> {
        let (db, flat, month) = setup_with_month().await?;

        let payment = submit_payment(&db, flat.id, month.id, PaymentMode::Gpay, None).await?;
        approve_payment(&db, payment.id).await?;

        let result = attach_screenshot(&db, payment.id, "blob/late".to_string()).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidState { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_find_payments_filters() -> Result<()> {
        let (db, flats, month) = setup_building(3).await?;

        submit_test_payment(&db, flats[0].id, month.id, "gpay").await?;
        submit_test_payment(&db, flats[1].id, month.id, "cash").await?;
        let p3 = submit_test_payment(&db, flats[2].id, month.id, "gpay").await?;
        approve_payment(&db, p3.id).await?;

        let all = find_payments(&db, None, Some(month.id), None).await?;
        assert_eq!(all.len(), 3);

        let pending = find_payments(
            &db,
            None,
            Some(month.id),
            Some(PaymentStatus::PendingVerification),
        )
        .await?;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].flat_id, flats[0].id);

        let for_flat = find_payments(&db, Some(flats[1].id), None, None).await?;
        assert_eq!(for_flat.len(), 1);
        assert_eq!(for_flat[0].payment_mode, "cash");

        Ok(())
    }
}
