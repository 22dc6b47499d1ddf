//! Flat entity - Represents one residential unit in the building.
//!
//! Each flat has a unique flat number, a monthly maintenance amount, a hashed
//! login PIN, and an optional phone number for reminder links. Flats are
//! seeded from config.toml and never deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Flat database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "flats")]
pub struct Model {
    /// Unique identifier for the flat
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-readable flat number (e.g., "101", "302")
    #[sea_orm(unique)]
    pub flat_number: String,
    /// Monthly maintenance amount in rupees
    pub maintenance_amount: f64,
    /// Argon2 hash of the flat's login PIN
    pub pin_hash: String,
    /// Phone number for reminder links, if one is on file
    pub phone: Option<String>,
    /// When the flat record was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Flat and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One flat has many payments (at most one per month)
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
    /// One flat has many reminder log entries
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
