//! Flat roster configuration loading from config.toml.
//!
//! The building's flats are defined in a TOML file and seeded into the
//! database on startup. Seeding is additive only: existing flats, changed
//! PINs, and admin-edited settings are never overwritten, so the file acts
//! as the initial roster rather than a source of truth after first run.

use crate::{
    core::{
        credentials, flat, month,
        settings::{self, SettingKey},
    },
    errors::{Error, Result},
};
use chrono::{Datelike, Utc};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use std::path::Path;

/// Login PIN every flat starts with until the admin changes it.
const DEFAULT_RESIDENT_PIN: &str = "0000";
/// Admin password seeded on first run.
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
/// Security guard PIN seeded on first run.
const DEFAULT_SECURITY_PIN: &str = "1234";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize)]
pub struct Config {
    /// List of flats to seed
    pub flats: Vec<FlatConfig>,
}

/// Configuration for a single flat
#[derive(Debug, Deserialize, Clone)]
pub struct FlatConfig {
    /// Flat number (e.g., "101")
    pub flat_number: String,
    /// Monthly maintenance amount in rupees
    pub maintenance_amount: f64,
}

/// Loads the flat roster from a TOML file.
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads the flat roster from the default location (./config.toml).
pub fn load_default_config() -> Result<Config> {
    load_config("config.toml")
}

/// Seeds missing flats, default credentials, and the current month.
///
/// Safe to run on every startup. Flats already in the database are skipped,
/// and credentials are only written when the key has never been set, so an
/// admin's changes survive restarts.
pub async fn seed_database(db: &DatabaseConnection, config: &Config) -> Result<()> {
    // Every seeded flat starts with the same default PIN, so hash it once
    let pin_hash = credentials::hash_secret(DEFAULT_RESIDENT_PIN)?;

    let mut created = 0_usize;
    for entry in &config.flats {
        if flat::get_flat_by_number(db, &entry.flat_number)
            .await?
            .is_none()
        {
            flat::create_flat(
                db,
                entry.flat_number.clone(),
                entry.maintenance_amount,
                pin_hash.clone(),
                None,
            )
            .await?;
            created += 1;
        }
    }
    if created > 0 {
        tracing::info!(created, "Seeded flats from config.toml");
    }

    let admin_hash = credentials::hash_secret(DEFAULT_ADMIN_PASSWORD)?;
    if settings::set_setting_if_absent(db, SettingKey::AdminPasswordHash, admin_hash).await? {
        tracing::warn!("Seeded default admin password; change it from the settings screen");
    }
    let security_hash = credentials::hash_secret(DEFAULT_SECURITY_PIN)?;
    if settings::set_setting_if_absent(db, SettingKey::SecurityPinHash, security_hash).await? {
        tracing::warn!("Seeded default security PIN; change it from the settings screen");
    }
    settings::set_setting_if_absent(
        db,
        SettingKey::DueDateDay,
        settings::DEFAULT_DUE_DATE_DAY.to_string(),
    )
    .await?;

    // Ensure the current month exists so payments can come in right away
    let today = Utc::now().date_naive();
    let due_date_day = settings::get_due_date_day(db).await?;
    month::get_or_open_month(db, i32::try_from(today.month())?, today.year(), due_date_day)
        .await?;

    Ok(())
}
