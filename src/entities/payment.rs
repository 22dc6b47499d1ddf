//! Payment entity - Represents one flat's maintenance payment for one month.
//!
//! At most one payment exists per (`flat_id`, `month_id`) pair; a rejected
//! payment is deleted when the flat resubmits, which is the only deletion in
//! the system. The `status` column drives the verification state machine and
//! the timestamp columns record when each transition happened.

use crate::errors::Error;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    /// Unique identifier for the payment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Flat this payment belongs to
    pub flat_id: i64,
    /// Month this payment belongs to
    pub month_id: i64,
    /// Amount in rupees, copied from the flat's maintenance amount at submission
    pub amount: f64,
    /// How the payment was made: `"gpay"`, `"phonepe"`, or `"cash"`
    pub payment_mode: String,
    /// Verification status, see [`PaymentStatus`]
    pub status: String,
    /// Reference to an uploaded screenshot blob, digital modes only
    pub screenshot_ref: Option<String>,
    /// When the resident submitted the payment
    pub submitted_at: DateTimeUtc,
    /// Date the resident says the payment was made, if declared
    pub paid_on: Option<Date>,
    /// When security confirmed receiving the cash
    pub security_confirmed_at: Option<DateTimeUtc>,
    /// When the admin approved or rejected the payment
    pub verified_at: Option<DateTimeUtc>,
    /// When the admin collected the cash from security
    pub collected_at: Option<DateTimeUtc>,
    /// Free-form admin note (rejection reason, override remark)
    pub admin_note: Option<String>,
}

/// Defines relationships between Payment and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each payment belongs to one flat
    #[sea_orm(
        belongs_to = "super::flat::Entity",
        from = "Column::FlatId",
        to = "super::flat::Column::Id"
    )]
    Flat,
    /// Each payment belongs to one month
    #[sea_orm(
        belongs_to = "super::month::Entity",
        from = "Column::MonthId",
        to = "super::month::Column::Id"
    )]
    Month,
}

impl Related<super::flat::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Flat.def()
    }
}

impl Related<super::month::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Month.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Verification status of a payment.
///
/// Digital payments (gpay/phonepe) move `PendingVerification → Paid` or
/// `PendingVerification → Rejected`. Cash payments move
/// `PendingSecurity → PendingCollection → Paid`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// Digital payment awaiting admin verification of the screenshot
    PendingVerification,
    /// Cash handed over, awaiting the security guard's confirmation
    PendingSecurity,
    /// Security confirmed the cash; admin has yet to collect it
    PendingCollection,
    /// Payment verified (digital) or collected (cash)
    Paid,
    /// Admin rejected the submission; the flat may resubmit
    Rejected,
}

impl PaymentStatus {
    /// String stored in the `status` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingVerification => "pending_verification",
            Self::PendingSecurity => "pending_security",
            Self::PendingCollection => "pending_collection",
            Self::Paid => "paid",
            Self::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_verification" => Ok(Self::PendingVerification),
            "pending_security" => Ok(Self::PendingSecurity),
            "pending_collection" => Ok(Self::PendingCollection),
            "paid" => Ok(Self::Paid),
            "rejected" => Ok(Self::Rejected),
            other => Err(Error::Validation {
                message: format!("Unknown payment status: {other}"),
            }),
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a payment was made.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMode {
    /// Google Pay transfer, verified from a screenshot
    Gpay,
    /// PhonePe transfer, verified from a screenshot
    Phonepe,
    /// Cash handed to the security guard
    Cash,
}

impl PaymentMode {
    /// String stored in the `payment_mode` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gpay => "gpay",
            Self::Phonepe => "phonepe",
            Self::Cash => "cash",
        }
    }

    /// Whether this mode goes through the digital verification flow.
    #[must_use]
    pub const fn is_digital(self) -> bool {
        !matches!(self, Self::Cash)
    }

    /// Display label used in notices and reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Gpay => "GPay",
            Self::Phonepe => "PhonePe",
            Self::Cash => "Cash",
        }
    }
}

impl std::str::FromStr for PaymentMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gpay" => Ok(Self::Gpay),
            "phonepe" => Ok(Self::Phonepe),
            "cash" => Ok(Self::Cash),
            other => Err(Error::Validation {
                message: format!("Unknown payment mode: {other}"),
            }),
        }
    }
}

impl std::fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
