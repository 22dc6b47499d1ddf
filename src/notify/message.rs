//! Notice text construction.
//!
//! Pure builders for every outbound message, plus the collection trigger
//! rule shared by the approval, security-confirmation and daily-tick paths.
//! Bodies are Telegram HTML; amounts use Indian digit grouping.

use crate::{
    core::report::format_inr,
    core::summary::{CollectionStatus, DefaulterFlat},
    entities::PaymentMode,
    notify::gateway::Notice,
};
use std::fmt::Write;

/// Numbered defaulter list, or an all-clear line when nobody is pending.
#[must_use]
pub fn format_defaulter_list(defaulters: &[DefaulterFlat], month_label: &str) -> String {
    if defaulters.is_empty() {
        return format!("All flats have paid for {month_label}!");
    }

    let mut text = format!("<b>Defaulters for {month_label}</b>\n");
    for (i, flat) in defaulters.iter().enumerate() {
        // write! is infallible when writing to String, so unwrap is safe
        write!(
            text,
            "\n{}. Flat {} — ₹{}",
            i + 1,
            flat.flat_number,
            format_inr(flat.amount_due)
        )
        .unwrap();
    }
    write!(text, "\n\nTotal pending: {} flat(s)", defaulters.len()).unwrap();
    text
}

/// Copy-paste WhatsApp reminder text for one overdue flat.
#[must_use]
pub fn whatsapp_reminder(flat_number: &str, amount: f64, month_label: &str) -> String {
    format!(
        "Hi, this is a reminder that Flat {flat_number}'s maintenance of ₹{} for {month_label} is overdue. Please pay at the earliest. Thank you.",
        format_inr(amount)
    )
}

/// Day-11 security notice: the defaulter list with a nudge to chase them.
#[must_use]
pub fn security_defaulter_notice(defaulters: &[DefaulterFlat], month_label: &str) -> String {
    format!(
        "{}\n\nPlease remind them to pay.",
        format_defaulter_list(defaulters, month_label)
    )
}

/// Day-20 admin notice: the defaulter list plus per-flat copy-paste
/// reminder texts, with a `wa.me` link when a phone number is on file.
#[must_use]
pub fn admin_defaulter_notice(defaulters: &[DefaulterFlat], month_label: &str) -> String {
    let mut text = format_defaulter_list(defaulters, month_label);
    text.push_str("\n\n<b>Copy-paste messages:</b>\n");

    for flat in defaulters {
        let reminder = whatsapp_reminder(&flat.flat_number, flat.amount_due, month_label);
        let phone_info = flat
            .phone
            .as_deref()
            .map_or_else(String::new, |phone| format!(" (wa.me/{phone})"));
        write!(text, "\nFlat {}{}:\n{}\n", flat.flat_number, phone_info, reminder).unwrap();
    }

    text
}

/// Admin notice sent when a resident submits a payment.
#[must_use]
pub fn new_submission_notice(
    flat_number: &str,
    mode: PaymentMode,
    amount: f64,
    month_label: &str,
) -> String {
    let (mode_label, status_label) = if mode == PaymentMode::Cash {
        ("Cash to Security", "Pending Security Confirmation")
    } else {
        (mode.label(), "Pending Screenshot Verification")
    };
    format!(
        "New payment from <b>Flat {flat_number}</b>\nMode: {mode_label}\nAmount: ₹{}\nMonth: {month_label}\nStatus: {status_label}",
        format_inr(amount)
    )
}

/// Admin notice sent when security confirms a cash handover.
#[must_use]
pub fn cash_confirmed_notice(amount: f64) -> String {
    format!(
        "Security confirmed cash receipt: ₹{} — pending your collection.",
        format_inr(amount)
    )
}

/// Collection trigger rule, evaluated after an approval, a security
/// confirmation and the daily tick.
///
/// Fires an admin notice once every flat has a live submission: a breakdown
/// while cash is still with security, a final total once everything is
/// collected. Pure read over [`CollectionStatus`], safe to re-run.
#[must_use]
pub fn collection_trigger(status: &CollectionStatus, month_label: &str) -> Option<Notice> {
    if status.total_flats == 0 || !status.is_all_submitted() {
        return None;
    }

    if status.is_fully_collected() {
        return Some(Notice::admin(format!(
            "All flats paid for <b>{month_label}</b>! Total: ₹{}",
            format_inr(status.total_collected)
        )));
    }

    if status.cash_pending > 0.0 {
        return Some(Notice::admin(format!(
            "All flats have submitted for <b>{month_label}</b>!\n\nCollected digitally: ₹{}\nCash to collect from security: ₹{}",
            format_inr(status.total_collected),
            format_inr(status.cash_pending)
        )));
    }

    None
}
