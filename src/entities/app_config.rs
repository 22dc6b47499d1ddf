//! App config entity - Stores key-value pairs for runtime settings.
//! Used for admin-editable settings (due date day, Telegram credentials,
//! display names) and for the daily notification markers.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// App config database model - stores key-value setting pairs
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "app_config")]
pub struct Model {
    /// Setting key (e.g., `"due_date_day"`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    /// Setting value stored as string
    pub value: String,
    /// When this setting was last modified
    pub updated_at: DateTime,
}

/// `AppConfig` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
