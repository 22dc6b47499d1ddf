//! Reminder entity - Append-only log of payment reminders sent to flats.
//!
//! Each row records who reminded which flat for which month and when.
//! Rows are never updated or deleted; the most recent entry per flat feeds
//! the "last reminded" display and the resend cooldown hint.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Reminder database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reminders")]
pub struct Model {
    /// Unique identifier for the reminder entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Flat that was reminded
    pub flat_id: i64,
    /// Month the reminder was about
    pub month_id: i64,
    /// Role that sent the reminder: `"admin"` or `"security"`
    pub sent_by: String,
    /// When the reminder was sent
    pub sent_at: DateTimeUtc,
}

/// Defines relationships between Reminder and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each reminder targets one flat
    #[sea_orm(
        belongs_to = "super::flat::Entity",
        from = "Column::FlatId",
        to = "super::flat::Column::Id"
    )]
    Flat,
    /// Each reminder concerns one month
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
