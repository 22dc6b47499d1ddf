//! Month report generation.
//!
//! Produces structured per-flat report data for a month plus a plain-text
//! rendering. The text goes out with the month-closed notice; the structured
//! data is what an external PDF renderer consumes.

use crate::{
    entities::{PaymentMode, PaymentStatus},
    errors::{Error, Result},
};
use sea_orm::prelude::*;
use std::str::FromStr;

/// One flat's line in the month report.
#[derive(Debug, Clone)]
pub struct ReportRow {
    /// Flat number
    pub flat_number: String,
    /// Amount paid, or owed when unpaid
    pub amount: f64,
    /// Payment mode when a payment exists
    pub mode: Option<PaymentMode>,
    /// When the payment was submitted
    pub submitted_at: Option<DateTimeUtc>,
    /// Human-readable settlement description
    pub description: String,
}

/// Full report data for one month.
#[derive(Debug, Clone)]
pub struct MonthReport {
    /// Human-readable month label, e.g. `"Mar 2025"`
    pub month_label: String,
    /// When the report was generated
    pub generated_at: DateTimeUtc,
    /// One row per flat, in flat number order
    pub rows: Vec<ReportRow>,
    /// Sum of amounts that reached `paid`
    pub total_collected: f64,
    /// Flats that reached `paid`
    pub paid_count: u64,
    /// Flats in the building
    pub total_flats: u64,
}

/// Builds the report for a month from the current flats and payments.
pub async fn generate_month_report(
    db: &DatabaseConnection,
    month_id: i64,
) -> Result<MonthReport> {
    let month = crate::core::month::get_month_by_id(db, month_id)
        .await?
        .ok_or(Error::MonthNotFound { id: month_id })?;

    let security_name = crate::core::settings::get_security_name(db).await?;
    let flats = crate::core::flat::get_all_flats(db).await?;
    let payments = crate::core::payment::find_payments(db, None, Some(month_id), None).await?;
    let by_flat: std::collections::HashMap<i64, &crate::entities::payment::Model> =
        payments.iter().map(|p| (p.flat_id, p)).collect();

    let mut rows = Vec::with_capacity(flats.len());
    let mut total_collected = 0.0;
    let mut paid_count = 0u64;

    for flat in &flats {
        let payment = by_flat.get(&flat.id);
        let row = match payment {
            Some(p) => {
                let mode = PaymentMode::from_str(&p.payment_mode)?;
                let status = PaymentStatus::from_str(&p.status)?;
                if status == PaymentStatus::Paid {
                    total_collected += p.amount;
                    paid_count += 1;
                }
                ReportRow {
                    flat_number: flat.flat_number.clone(),
                    amount: p.amount,
                    mode: Some(mode),
                    submitted_at: Some(p.submitted_at),
                    description: describe_settlement(status, mode, &security_name),
                }
            }
            None => ReportRow {
                flat_number: flat.flat_number.clone(),
                amount: flat.maintenance_amount,
                mode: None,
                submitted_at: None,
                description: "Not paid".to_string(),
            },
        };
        rows.push(row);
    }

    Ok(MonthReport {
        month_label: month.label(),
        generated_at: chrono::Utc::now(),
        rows,
        total_collected,
        paid_count,
        total_flats: u64::try_from(flats.len())?,
    })
}

/// Settlement description for a payment's report row.
fn describe_settlement(status: PaymentStatus, mode: PaymentMode, security_name: &str) -> String {
    match status {
        PaymentStatus::Paid if mode == PaymentMode::Cash => {
            format!("Cash — collected from {security_name}")
        }
        PaymentStatus::Paid => format!("Verified ({})", mode.label()),
        PaymentStatus::PendingVerification => "Awaiting verification".to_string(),
        PaymentStatus::PendingSecurity => "Awaiting security confirmation".to_string(),
        PaymentStatus::PendingCollection => "With security, awaiting collection".to_string(),
        PaymentStatus::Rejected => "Rejected".to_string(),
    }
}

/// Formats a rupee amount with Indian digit grouping, e.g. `12,34,567`.
///
/// Whole-rupee amounts drop the fraction; anything else keeps two digits.
#[must_use]
pub fn format_inr(amount: f64) -> String {
    let raw = if amount.fract().abs() < f64::EPSILON {
        format!("{amount:.0}")
    } else {
        format!("{amount:.2}")
    };
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (raw.as_str(), None),
    };
    let (sign, digits) = int_part
        .strip_prefix('-')
        .map_or(("", int_part), |rest| ("-", rest));

    let grouped = group_indian(digits);
    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Indian grouping: the last three digits, then pairs.
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut pairs = Vec::new();
    let mut end = head.len();
    while end > 2 {
        pairs.push(&head[end - 2..end]);
        end -= 2;
    }
    pairs.push(&head[..end]);
    pairs.reverse();
    format!("{},{}", pairs.join(","), tail)
}

/// Renders the report as plain text for notices and logs.
#[must_use]
pub fn format_month_report(report: &MonthReport) -> String {
    use std::fmt::Write;

    let mut text = format!("Maintenance Report — {}\n\n", report.month_label);

    for row in &report.rows {
        let mode = row.mode.map_or("-", PaymentMode::label);
        // write! into a String is infallible
        writeln!(
            text,
            "  Flat {} | ₹{} | {} | {}",
            row.flat_number,
            format_inr(row.amount),
            mode,
            row.description
        )
        .unwrap();
    }

    write!(
        text,
        "\nCollected: ₹{} from {} of {} flats",
        format_inr(report.total_collected),
        report.paid_count,
        report.total_flats
    )
    .unwrap();

    text
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::payment::{approve_payment, security_confirm, submit_payment};
    use crate::core::settings::{SettingKey, set_setting};
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_generate_month_report() -> Result<()> {
        let (db, flats, month) = setup_building(3).await?;
        set_setting(&db, SettingKey::SecurityName, "Bahadur".to_string()).await?;

        let p0 = submit_payment(&db, flats[0].id, month.id, PaymentMode::Gpay, None).await?;
        approve_payment(&db, p0.id).await?;
        let p1 = submit_payment(&db, flats[1].id, month.id, PaymentMode::Cash, None).await?;
        security_confirm(&db, p1.id).await?;
        crate::core::payment::collect_cash(&db, p1.id).await?;

        let report = generate_month_report(&db, month.id).await?;
        assert_eq!(report.month_label, "Mar 2025");
        assert_eq!(report.rows.len(), 3);
        assert_eq!(report.paid_count, 2);
        assert_eq!(report.total_flats, 3);
        assert_eq!(report.total_collected, 4000.0);

        assert_eq!(report.rows[0].description, "Verified (GPay)");
        assert_eq!(report.rows[1].description, "Cash — collected from Bahadur");
        assert_eq!(report.rows[2].description, "Not paid");
        assert!(report.rows[2].mode.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_generate_month_report_unknown_month() -> Result<()> {
        let db = setup_test_db().await?;

        let result = generate_month_report(&db, 999).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::MonthNotFound { id: 999 }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_report_pending_descriptions() -> Result<()> {
        let (db, flats, month) = setup_building(2).await?;

        submit_payment(&db, flats[0].id, month.id, PaymentMode::Phonepe, None).await?;
        submit_payment(&db, flats[1].id, month.id, PaymentMode::Cash, None).await?;

        let report = generate_month_report(&db, month.id).await?;
        assert_eq!(report.rows[0].description, "Awaiting verification");
        assert_eq!(report.rows[1].description, "Awaiting security confirmation");
        assert_eq!(report.total_collected, 0.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_format_month_report() -> Result<()> {
        let (db, flats, month) = setup_building(2).await?;

        let p0 = submit_payment(&db, flats[0].id, month.id, PaymentMode::Gpay, None).await?;
        approve_payment(&db, p0.id).await?;

        let report = generate_month_report(&db, month.id).await?;
        let text = format_month_report(&report);

        assert!(text.contains("Maintenance Report — Mar 2025"));
        assert!(text.contains("Flat 101"));
        assert!(text.contains("Verified (GPay)"));
        assert!(text.contains("Not paid"));
        assert!(text.contains("Collected: ₹2,000 from 1 of 2 flats"));

        Ok(())
    }

    #[test]
    fn test_format_inr_grouping() {
        assert_eq!(format_inr(0.0), "0");
        assert_eq!(format_inr(500.0), "500");
        assert_eq!(format_inr(2000.0), "2,000");
        assert_eq!(format_inr(24000.0), "24,000");
        assert_eq!(format_inr(100_000.0), "1,00,000");
        assert_eq!(format_inr(1_234_567.0), "12,34,567");
        assert_eq!(format_inr(2500.5), "2,500.50");
    }
}
