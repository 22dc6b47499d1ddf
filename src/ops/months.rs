//! Month lifecycle operations behind role guards.

use crate::{
    core::{month, report, settings},
    entities::month as month_entity,
    errors::Result,
    notify::gateway::{self, Notice, NotificationGateway},
    ops::{Role, Session, require_admin},
};
use sea_orm::DatabaseConnection;

/// Lists months, newest first.
///
/// Security only ever works against open months, so closed ones are hidden
/// from that role; residents and the admin see the full history.
pub async fn list_months(
    db: &DatabaseConnection,
    session: &Session,
) -> Result<Vec<month_entity::Model>> {
    match session.role {
        Role::Security => month::get_open_months(db).await,
        Role::Resident | Role::Admin => month::get_all_months(db).await,
    }
}

/// Opens a billing month using the configured due-date day.
pub async fn open_month(
    db: &DatabaseConnection,
    session: &Session,
    month_value: i32,
    year: i32,
) -> Result<month_entity::Model> {
    require_admin(session)?;
    let due_date_day = settings::get_due_date_day(db).await?;
    month::open_month(db, month_value, year, due_date_day).await
}

/// Closes a month and sends the report to the admin chat.
///
/// The close itself is the guarded operation; report generation and delivery
/// afterwards are best effort and cannot roll it back.
pub async fn close_month(
    db: &DatabaseConnection,
    gateway: &dyn NotificationGateway,
    session: &Session,
    month_id: i64,
) -> Result<month_entity::Model> {
    require_admin(session)?;
    let closed = month::close_month(db, month_id).await?;
    distribute_report(db, gateway, month_id).await;
    Ok(closed)
}

/// Reopens a closed month.
pub async fn reopen_month(
    db: &DatabaseConnection,
    session: &Session,
    month_id: i64,
) -> Result<month_entity::Model> {
    require_admin(session)?;
    month::reopen_month(db, month_id).await
}

/// Builds the report data for a month, for rendering or export.
pub async fn month_report(
    db: &DatabaseConnection,
    session: &Session,
    month_id: i64,
) -> Result<report::MonthReport> {
    require_admin(session)?;
    report::generate_month_report(db, month_id).await
}

async fn distribute_report(
    db: &DatabaseConnection,
    gateway: &dyn NotificationGateway,
    month_id: i64,
) {
    match report::generate_month_report(db, month_id).await {
        Ok(data) => {
            let text = report::format_month_report(&data);
            gateway::dispatch(gateway, vec![Notice::admin(text)]).await;
        }
        Err(e) => {
            tracing::warn!(month_id, "month report generation failed: {e}");
        }
    }
}
