//! Shared test utilities for `MaintenanceBuddy`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults, plus in-memory gateway
//! doubles for notification tests.

#![allow(clippy::unwrap_used)]

use crate::{
    core::{flat, month, payment},
    entities,
    errors::{Error, Result},
    notify::gateway::{Audience, NotificationGateway},
};
use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use std::str::FromStr;
use std::sync::Mutex;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test flat with sensible defaults.
///
/// # Arguments
/// * `db` - Database connection
/// * `flat_number` - Flat number
///
/// # Defaults
/// * `maintenance_amount`: 2000.0
/// * `pin_hash`: fixed placeholder (tests never verify it)
/// * `phone`: None
pub async fn create_test_flat(
    db: &DatabaseConnection,
    flat_number: &str,
) -> Result<entities::flat::Model> {
    flat::create_flat(
        db,
        flat_number.to_string(),
        2000.0,
        "test-pin-hash".to_string(),
        None,
    )
    .await
}

/// Creates a test flat with custom amount and phone.
/// Use this when a test needs a non-default maintenance amount or a
/// reminder-capable phone number.
pub async fn create_custom_flat(
    db: &DatabaseConnection,
    flat_number: &str,
    maintenance_amount: f64,
    phone: Option<&str>,
) -> Result<entities::flat::Model> {
    flat::create_flat(
        db,
        flat_number.to_string(),
        maintenance_amount,
        "test-pin-hash".to_string(),
        phone.map(ToString::to_string),
    )
    .await
}

/// Opens a test month with the default due date day (10).
pub async fn open_test_month(
    db: &DatabaseConnection,
    calendar_month: i32,
    year: i32,
) -> Result<entities::month::Model> {
    month::open_month(db, calendar_month, year, 10).await
}

/// Submits a payment from its string mode, the way the request layer would.
pub async fn submit_test_payment(
    db: &DatabaseConnection,
    flat_id: i64,
    month_id: i64,
    mode: &str,
) -> Result<entities::payment::Model> {
    let mode = entities::PaymentMode::from_str(mode)?;
    payment::submit_payment(db, flat_id, month_id, mode, None).await
}

/// Sets up a complete test environment with one flat and an open month.
/// Returns (db, flat "101", March 2025) for common test scenarios.
pub async fn setup_with_month()
-> Result<(DatabaseConnection, entities::flat::Model, entities::month::Model)> {
    let db = setup_test_db().await?;
    let flat = create_test_flat(&db, "101").await?;
    let month = open_test_month(&db, 3, 2025).await?;
    Ok((db, flat, month))
}

/// Sets up a building with `count` flats and an open March 2025 month.
///
/// Flat numbers follow the three-per-floor scheme of the real building:
/// "101", "102", "103", "201", "202", ...
pub async fn setup_building(
    count: usize,
) -> Result<(
    DatabaseConnection,
    Vec<entities::flat::Model>,
    entities::month::Model,
)> {
    let db = setup_test_db().await?;
    let mut flats = Vec::with_capacity(count);
    for i in 0..count {
        let number = format!("{}0{}", i / 3 + 1, i % 3 + 1);
        flats.push(create_test_flat(&db, &number).await?);
    }
    let month = open_test_month(&db, 3, 2025).await?;
    Ok((db, flats, month))
}

/// Gateway double that records every notice instead of delivering it.
#[derive(Debug, Default)]
pub struct RecordingGateway {
    sent: Mutex<Vec<(Audience, String)>>,
}

impl RecordingGateway {
    /// Creates an empty recording gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far, in send order.
    #[must_use]
    pub fn sent(&self) -> Vec<(Audience, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationGateway for RecordingGateway {
    async fn send(&self, audience: Audience, text: &str) -> Result<bool> {
        self.sent.lock().unwrap().push((audience, text.to_string()));
        Ok(true)
    }
}

/// Gateway double whose sends always fail, for delivery-failure paths.
#[derive(Clone, Copy, Debug)]
pub struct FailingGateway;

#[async_trait]
impl NotificationGateway for FailingGateway {
    async fn send(&self, _audience: Audience, _text: &str) -> Result<bool> {
        Err(Error::Notification {
            message: "gateway deliberately failing".to_string(),
        })
    }
}
