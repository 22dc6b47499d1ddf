//! Collection status, defaulter, and per-flat status computation.
//!
//! Everything here is recomputed from the flats and payments tables on every
//! call; no counters are cached anywhere, so two calls with the same data
//! always agree. These results feed the admin dashboard, the notification
//! triggers, and the daily reminder rules.

use crate::{
    entities::{PaymentStatus, payment},
    errors::{Error, Result},
};
use chrono::{Datelike, NaiveDate};
use sea_orm::prelude::*;
use std::collections::HashMap;
use std::str::FromStr;

/// A flat whose cash is confirmed by security but not yet collected.
#[derive(Debug, Clone)]
pub struct CashPendingFlat {
    /// Flat number, e.g. `"101"`
    pub flat_number: String,
    /// Amount waiting with the security guard
    pub amount: f64,
}

/// Snapshot of how far a month's collection has progressed.
#[derive(Debug, Clone)]
pub struct CollectionStatus {
    /// Month the snapshot describes
    pub month_id: i64,
    /// Number of flats in the building
    pub total_flats: u64,
    /// Flats with a non-rejected payment
    pub submitted_count: u64,
    /// Flats whose payment reached `paid`
    pub paid_count: u64,
    /// Digital payments awaiting admin verification
    pub pending_verification_count: u64,
    /// Cash payments awaiting the security guard
    pub pending_security_count: u64,
    /// Cash confirmed by security, awaiting admin collection
    pub pending_collection_count: u64,
    /// Sum of amounts in `paid` status
    pub total_collected: f64,
    /// Sum of amounts in `pending_collection` status
    pub cash_pending: f64,
    /// Per-flat breakdown of the cash still with security
    pub cash_pending_flats: Vec<CashPendingFlat>,
}

impl CollectionStatus {
    /// Whether every flat has a non-rejected payment.
    #[must_use]
    pub const fn is_all_submitted(&self) -> bool {
        self.submitted_count == self.total_flats
    }

    /// Whether every flat has actually paid (verified or collected).
    #[must_use]
    pub const fn is_fully_collected(&self) -> bool {
        self.paid_count == self.total_flats
    }
}

/// A flat that still owes for a month: no payment, or only a rejected one.
#[derive(Debug, Clone)]
pub struct DefaulterFlat {
    /// Flat identifier
    pub flat_id: i64,
    /// Flat number, e.g. `"203"`
    pub flat_number: String,
    /// Maintenance amount the flat owes
    pub amount_due: f64,
    /// Phone number for reminder links, if on file
    pub phone: Option<String>,
}

/// Displayed payment state of a flat for a month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DerivedStatus {
    /// A payment exists; shows its actual status (including `rejected`)
    Payment(PaymentStatus),
    /// No payment and the due date has not passed (or the month is closed)
    NotPaid,
    /// No payment, the month is open, and the due date has passed
    Overdue,
}

impl DerivedStatus {
    /// Status string for display grids.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Payment(status) => status.as_str(),
            Self::NotPaid => "not_paid",
            Self::Overdue => "overdue",
        }
    }
}

/// One row of the per-flat status grid.
#[derive(Debug, Clone)]
pub struct FlatStatusRow {
    /// Flat identifier
    pub flat_id: i64,
    /// Flat number
    pub flat_number: String,
    /// Maintenance amount for the flat
    pub maintenance_amount: f64,
    /// Derived display status
    pub status: DerivedStatus,
    /// The underlying payment when one exists
    pub payment: Option<payment::Model>,
    /// When the flat was last reminded this month
    pub last_reminded_at: Option<DateTimeUtc>,
}

/// Computes the collection snapshot for a month.
pub async fn collection_status(
    db: &DatabaseConnection,
    month_id: i64,
) -> Result<CollectionStatus> {
    crate::core::month::get_month_by_id(db, month_id)
        .await?
        .ok_or(Error::MonthNotFound { id: month_id })?;

    let flats = crate::core::flat::get_all_flats(db).await?;
    let payments = crate::core::payment::find_payments(db, None, Some(month_id), None).await?;
    let by_flat: HashMap<i64, &payment::Model> =
        payments.iter().map(|p| (p.flat_id, p)).collect();

    let mut status = CollectionStatus {
        month_id,
        total_flats: u64::try_from(flats.len())?,
        submitted_count: 0,
        paid_count: 0,
        pending_verification_count: 0,
        pending_security_count: 0,
        pending_collection_count: 0,
        total_collected: 0.0,
        cash_pending: 0.0,
        cash_pending_flats: Vec::new(),
    };

    for flat in &flats {
        let Some(payment) = by_flat.get(&flat.id) else {
            continue;
        };
        match PaymentStatus::from_str(&payment.status)? {
            PaymentStatus::Paid => {
                status.submitted_count += 1;
                status.paid_count += 1;
                status.total_collected += payment.amount;
            }
            PaymentStatus::PendingVerification => {
                status.submitted_count += 1;
                status.pending_verification_count += 1;
            }
            PaymentStatus::PendingSecurity => {
                status.submitted_count += 1;
                status.pending_security_count += 1;
            }
            PaymentStatus::PendingCollection => {
                status.submitted_count += 1;
                status.pending_collection_count += 1;
                status.cash_pending += payment.amount;
                status.cash_pending_flats.push(CashPendingFlat {
                    flat_number: flat.flat_number.clone(),
                    amount: payment.amount,
                });
            }
            PaymentStatus::Rejected => {}
        }
    }

    Ok(status)
}

/// Lists the flats with no non-rejected payment for a month, in flat number
/// order. A rejected payment still counts as defaulting.
pub async fn defaulters(db: &DatabaseConnection, month_id: i64) -> Result<Vec<DefaulterFlat>> {
    crate::core::month::get_month_by_id(db, month_id)
        .await?
        .ok_or(Error::MonthNotFound { id: month_id })?;

    let flats = crate::core::flat::get_all_flats(db).await?;
    let payments = crate::core::payment::find_payments(db, None, Some(month_id), None).await?;
    let submitted: HashMap<i64, &str> = payments
        .iter()
        .filter(|p| p.status != PaymentStatus::Rejected.as_str())
        .map(|p| (p.flat_id, p.status.as_str()))
        .collect();

    Ok(flats
        .into_iter()
        .filter(|flat| !submitted.contains_key(&flat.id))
        .map(|flat| DefaulterFlat {
            flat_id: flat.id,
            flat_number: flat.flat_number,
            amount_due: flat.maintenance_amount,
            phone: flat.phone,
        })
        .collect())
}

/// Builds the per-flat status grid for a month.
///
/// Flats without a payment show `not_paid`, or `overdue` once `today` is
/// past the month's due date day while the month is still open. Flats with a
/// payment show its actual status, rejected included.
pub async fn flat_statuses(
    db: &DatabaseConnection,
    month_id: i64,
    today: NaiveDate,
) -> Result<Vec<FlatStatusRow>> {
    let month = crate::core::month::get_month_by_id(db, month_id)
        .await?
        .ok_or(Error::MonthNotFound { id: month_id })?;

    let flats = crate::core::flat::get_all_flats(db).await?;
    let payments = crate::core::payment::find_payments(db, None, Some(month_id), None).await?;
    let mut by_flat: HashMap<i64, payment::Model> =
        payments.into_iter().map(|p| (p.flat_id, p)).collect();
    let reminded = crate::core::reminder::last_reminded_map(db, month_id).await?;

    let today_day = i32::try_from(today.day()).unwrap_or(i32::MAX);
    let past_due = month.is_open() && today_day > month.due_date_day;

    let mut rows = Vec::with_capacity(flats.len());
    for flat in flats {
        let payment = by_flat.remove(&flat.id);
        let status = match &payment {
            Some(p) => DerivedStatus::Payment(PaymentStatus::from_str(&p.status)?),
            None if past_due => DerivedStatus::Overdue,
            None => DerivedStatus::NotPaid,
        };
        rows.push(FlatStatusRow {
            flat_id: flat.id,
            flat_number: flat.flat_number,
            maintenance_amount: flat.maintenance_amount,
            status,
            payment,
            last_reminded_at: reminded.get(&flat.id).copied(),
        });
    }
    Ok(rows)
}
