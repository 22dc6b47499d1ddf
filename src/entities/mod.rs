//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod app_config;
pub mod flat;
pub mod month;
pub mod payment;
pub mod reminder;

// Re-export specific types to avoid conflicts
pub use app_config::{Column as AppConfigColumn, Entity as AppConfig, Model as AppConfigModel};
pub use flat::{Column as FlatColumn, Entity as Flat, Model as FlatModel};
pub use month::{Column as MonthColumn, Entity as Month, Model as MonthModel, MonthStatus};
pub use payment::{
    Column as PaymentColumn, Entity as Payment, Model as PaymentModel, PaymentMode, PaymentStatus,
};
pub use reminder::{Column as ReminderColumn, Entity as Reminder, Model as ReminderModel};
