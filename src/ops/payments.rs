//! Payment operations behind role guards.
//!
//! Thin layer over `core::payment`: each function checks the session, calls
//! the state machine, then fires any best-effort notifications. List results
//! are joined views carrying the flat number and calendar month so callers
//! never need a second lookup.

use crate::{
    core::{month, payment, summary},
    entities::{PaymentMode, PaymentStatus, payment as payment_entity},
    errors::{Error, Result},
    notify::{
        gateway::{self, Notice, NotificationGateway},
        message,
    },
    ops::{Role, Session, require_admin, require_resident_flat, require_security},
};
use sea_orm::prelude::*;
use std::collections::{HashMap, HashSet};

/// One payment row joined with its flat and month.
#[derive(Debug, Clone)]
pub struct PaymentView {
    /// Payment id
    pub id: i64,
    /// Flat the payment belongs to
    pub flat_id: i64,
    /// Flat number
    pub flat_number: String,
    /// Month record id
    pub month_id: i64,
    /// Calendar month (1-12)
    pub month: i32,
    /// Calendar year
    pub year: i32,
    /// Amount in rupees
    pub amount: f64,
    /// Payment mode string
    pub payment_mode: String,
    /// Status string
    pub status: String,
    /// When the payment was submitted
    pub submitted_at: DateTimeUtc,
    /// Caller-declared payment date, if any
    pub paid_on: Option<Date>,
    /// When security confirmed the cash handover
    pub security_confirmed_at: Option<DateTimeUtc>,
    /// When the admin verified or rejected
    pub verified_at: Option<DateTimeUtc>,
    /// When the admin collected the cash
    pub collected_at: Option<DateTimeUtc>,
    /// Admin note or rejection reason
    pub admin_note: Option<String>,
    /// Whether a screenshot reference is attached
    pub has_screenshot: bool,
}

/// Optional filters for [`list_payments`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PaymentFilter {
    /// Restrict to one month
    pub month_id: Option<i64>,
    /// Restrict to one status
    pub status: Option<PaymentStatus>,
}

/// Lists payments visible to the session.
///
/// Residents see only their own flat's payments; security sees only payments
/// in open months; the admin sees everything. Rows come back most recent
/// first.
pub async fn list_payments(
    db: &DatabaseConnection,
    session: &Session,
    filter: PaymentFilter,
) -> Result<Vec<PaymentView>> {
    let flat_scope = match session.role {
        Role::Resident => Some(require_resident_flat(session)?.0),
        Role::Security | Role::Admin => None,
    };

    let mut rows = payment::find_payments(db, flat_scope, filter.month_id, filter.status).await?;

    let months = month::get_all_months(db).await?;
    if session.role == Role::Security {
        let open_ids: HashSet<i64> = months.iter().filter(|m| m.is_open()).map(|m| m.id).collect();
        rows.retain(|p| open_ids.contains(&p.month_id));
    }

    let flat_numbers: HashMap<i64, String> = crate::core::flat::get_all_flats(db)
        .await?
        .into_iter()
        .map(|f| (f.id, f.flat_number))
        .collect();
    let calendar: HashMap<i64, (i32, i32)> =
        months.into_iter().map(|m| (m.id, (m.month, m.year))).collect();

    Ok(rows
        .into_iter()
        .map(|p| view_payment(p, &flat_numbers, &calendar))
        .collect())
}

fn view_payment(
    p: payment_entity::Model,
    flat_numbers: &HashMap<i64, String>,
    calendar: &HashMap<i64, (i32, i32)>,
) -> PaymentView {
    let (month, year) = calendar.get(&p.month_id).copied().unwrap_or_default();
    PaymentView {
        id: p.id,
        flat_id: p.flat_id,
        flat_number: flat_numbers.get(&p.flat_id).cloned().unwrap_or_default(),
        month_id: p.month_id,
        month,
        year,
        amount: p.amount,
        payment_mode: p.payment_mode,
        status: p.status,
        submitted_at: p.submitted_at,
        paid_on: p.paid_on,
        security_confirmed_at: p.security_confirmed_at,
        verified_at: p.verified_at,
        collected_at: p.collected_at,
        admin_note: p.admin_note,
        has_screenshot: p.screenshot_ref.is_some(),
    }
}

/// Submits the session's payment for a month and notifies the admin.
pub async fn submit_payment(
    db: &DatabaseConnection,
    gateway: &dyn NotificationGateway,
    session: &Session,
    month_id: i64,
    mode: PaymentMode,
    paid_on: Option<Date>,
) -> Result<payment_entity::Model> {
    let (flat_id, flat_number) = require_resident_flat(session)?;
    let created = payment::submit_payment(db, flat_id, month_id, mode, paid_on).await?;

    if let Some(month) = month::get_month_by_id(db, month_id).await? {
        let text =
            message::new_submission_notice(&flat_number, mode, created.amount, &month.label());
        gateway::dispatch(gateway, vec![Notice::admin(text)]).await;
    }

    Ok(created)
}

/// Attaches a screenshot reference to the session's own payment.
pub async fn attach_screenshot(
    db: &DatabaseConnection,
    session: &Session,
    payment_id: i64,
    screenshot_ref: String,
) -> Result<payment_entity::Model> {
    let (flat_id, _) = require_resident_flat(session)?;

    let existing = payment::get_payment_by_id(db, payment_id)
        .await?
        .ok_or(Error::PaymentNotFound { id: payment_id })?;
    if existing.flat_id != flat_id {
        return Err(Error::Forbidden {
            required: "owning resident",
        });
    }

    payment::attach_screenshot(db, payment_id, screenshot_ref).await
}

/// Approves a pending digital payment, then re-evaluates the collection
/// trigger.
pub async fn approve_payment(
    db: &DatabaseConnection,
    gateway: &dyn NotificationGateway,
    session: &Session,
    payment_id: i64,
) -> Result<payment_entity::Model> {
    require_admin(session)?;
    let approved = payment::approve_payment(db, payment_id).await?;
    notify_collection_progress(db, gateway, approved.month_id).await;
    Ok(approved)
}

/// Rejects a pending digital payment with a reason.
pub async fn reject_payment(
    db: &DatabaseConnection,
    session: &Session,
    payment_id: i64,
    reason: &str,
) -> Result<payment_entity::Model> {
    require_admin(session)?;
    payment::reject_payment(db, payment_id, reason).await
}

/// Records security's confirmation of a cash handover, notifies the admin,
/// then re-evaluates the collection trigger.
pub async fn security_confirm(
    db: &DatabaseConnection,
    gateway: &dyn NotificationGateway,
    session: &Session,
    payment_id: i64,
) -> Result<payment_entity::Model> {
    require_security(session)?;
    let confirmed = payment::security_confirm(db, payment_id).await?;

    gateway::dispatch(
        gateway,
        vec![Notice::admin(message::cash_confirmed_notice(
            confirmed.amount,
        ))],
    )
    .await;
    notify_collection_progress(db, gateway, confirmed.month_id).await;

    Ok(confirmed)
}

/// Marks confirmed cash as collected by the admin.
pub async fn collect_cash(
    db: &DatabaseConnection,
    session: &Session,
    payment_id: i64,
) -> Result<payment_entity::Model> {
    require_admin(session)?;
    payment::collect_cash(db, payment_id).await
}

/// Force-sets a payment's status and/or note.
pub async fn admin_override(
    db: &DatabaseConnection,
    session: &Session,
    payment_id: i64,
    new_status: Option<PaymentStatus>,
    note: Option<String>,
) -> Result<payment_entity::Model> {
    require_admin(session)?;
    payment::admin_override(db, payment_id, new_status, note).await
}

/// Records a payment on a flat's behalf.
pub async fn admin_create_payment(
    db: &DatabaseConnection,
    session: &Session,
    input: payment::AdminCreatePayment,
) -> Result<payment_entity::Model> {
    require_admin(session)?;
    payment::admin_create_payment(db, input).await
}

/// Evaluates the collection trigger for a month and fires any resulting
/// notice. Failures are logged and swallowed so they cannot affect the
/// transition that has already committed.
async fn notify_collection_progress(
    db: &DatabaseConnection,
    gateway: &dyn NotificationGateway,
    month_id: i64,
) {
    match evaluate_collection_trigger(db, month_id).await {
        Ok(Some(notice)) => {
            gateway::dispatch(gateway, vec![notice]).await;
        }
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(month_id, "collection trigger evaluation failed: {e}");
        }
    }
}

async fn evaluate_collection_trigger(
    db: &DatabaseConnection,
    month_id: i64,
) -> Result<Option<Notice>> {
    let Some(month) = month::get_month_by_id(db, month_id).await? else {
        return Ok(None);
    };
    let status = summary::collection_status(db, month_id).await?;
    Ok(message::collection_trigger(&status, &month.label()))
}
