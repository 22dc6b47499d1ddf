//! Month entity - Represents one billing month in the collection cycle.
//!
//! A month is `open` while payments are being collected and `closed` once
//! every flat has paid. The (`month`, `year`) pair is unique; months are
//! created by the admin or auto-opened by the daily tick, and never deleted.

use crate::errors::Error;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Month database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "months")]
pub struct Model {
    /// Unique identifier for the month record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Calendar month (1-12)
    pub month: i32,
    /// Calendar year (e.g., 2025)
    pub year: i32,
    /// Lifecycle status: `"open"` or `"closed"`
    pub status: String,
    /// Day of the month after which unpaid flats count as overdue
    pub due_date_day: i32,
    /// When the month record was created
    pub created_at: DateTimeUtc,
    /// When the month was closed, None while open
    pub closed_at: Option<DateTimeUtc>,
}

/// Defines relationships between Month and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One month has many payments (at most one per flat)
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
    /// One month has many reminder log entries
    #[sea_orm(has_many = "super::reminder::Entity")]
    Reminders,
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl Related<super::reminder::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reminders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Lifecycle status of a month.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonthStatus {
    /// Payments may be submitted and processed
    Open,
    /// Every flat has paid; the month is settled
    Closed,
}

impl MonthStatus {
    /// String stored in the `status` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl std::str::FromStr for MonthStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            other => Err(Error::Validation {
                message: format!("Unknown month status: {other}"),
            }),
        }
    }
}

impl std::fmt::Display for MonthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Model {
    /// Whether this month is still open for payment activity.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == MonthStatus::Open.as_str()
    }

    /// Human-readable label like `"Mar 2025"`.
    #[must_use]
    pub fn label(&self) -> String {
        const MONTH_NAMES: [&str; 12] = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];
        let index = usize::try_from(self.month - 1).unwrap_or(0).min(11);
        format!("{} {}", MONTH_NAMES[index], self.year)
    }
}
