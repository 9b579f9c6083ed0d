//! Asset maintenance scheduling.

use chrono::{Days, Months};

use crate::types::Date;
use crate::validation::{transition_error, validate_one_of};

pub const ASSET_ACTIVE: &str = "ACTIVE";
pub const ASSET_MAINTENANCE: &str = "MAINTENANCE";
pub const ASSET_RETIRED: &str = "RETIRED";
pub const VALID_ASSET_STATUSES: &[&str] = &[ASSET_ACTIVE, ASSET_MAINTENANCE, ASSET_RETIRED];

pub const VALID_MAINTENANCE_TYPES: &[&str] = &["PREVENTIVE", "CORRECTIVE", "INSPECTION"];

pub const FREQ_DAILY: &str = "DAILY";
pub const FREQ_WEEKLY: &str = "WEEKLY";
pub const FREQ_MONTHLY: &str = "MONTHLY";
pub const FREQ_QUARTERLY: &str = "QUARTERLY";
pub const FREQ_YEARLY: &str = "YEARLY";
pub const VALID_FREQUENCY_TYPES: &[&str] =
    &[FREQ_DAILY, FREQ_WEEKLY, FREQ_MONTHLY, FREQ_QUARTERLY, FREQ_YEARLY];

pub const PRIORITY_MEDIUM: &str = "MEDIUM";
pub const VALID_PRIORITIES: &[&str] = &["LOW", PRIORITY_MEDIUM, "HIGH", "CRITICAL"];

pub const DUE_OVERDUE: &str = "OVERDUE";
pub const DUE_SOON: &str = "DUE_SOON";
pub const DUE_SCHEDULED: &str = "SCHEDULED";
pub const DUE_SOON_DAYS: i64 = 7;

pub const WO_OPEN: &str = "OPEN";
pub const WO_IN_PROGRESS: &str = "IN_PROGRESS";
pub const WO_COMPLETED: &str = "COMPLETED";
pub const WO_CANCELLED: &str = "CANCELLED";
pub const VALID_WORK_ORDER_STATUSES: &[&str] = &[WO_OPEN, WO_IN_PROGRESS, WO_COMPLETED, WO_CANCELLED];

pub fn validate_asset_status(value: &str) -> Result<(), String> {
    validate_one_of("asset status", value, VALID_ASSET_STATUSES)
}

pub fn validate_maintenance_type(value: &str) -> Result<(), String> {
    validate_one_of("maintenance_type", value, VALID_MAINTENANCE_TYPES)
}

pub fn validate_frequency(frequency_type: &str, value: i32) -> Result<(), String> {
    validate_one_of("frequency_type", frequency_type, VALID_FREQUENCY_TYPES)?;
    if value < 1 {
        return Err("frequency_value must be at least 1".to_string());
    }
    Ok(())
}

pub fn validate_priority(value: &str) -> Result<(), String> {
    validate_one_of("priority", value, VALID_PRIORITIES)
}

/// Advance a date by `value` units of the frequency. Month arithmetic
/// clamps to the end of shorter months (Jan 31 + 1 month = Feb 28/29).
pub fn advance(from: Date, frequency_type: &str, value: i32) -> Option<Date> {
    let n = u32::try_from(value).ok()?;
    match frequency_type {
        FREQ_DAILY => from.checked_add_days(Days::new(u64::from(n))),
        FREQ_WEEKLY => from.checked_add_days(Days::new(u64::from(n) * 7)),
        FREQ_MONTHLY => from.checked_add_months(Months::new(n)),
        FREQ_QUARTERLY => from.checked_add_months(Months::new(n.checked_mul(3)?)),
        FREQ_YEARLY => from.checked_add_months(Months::new(n.checked_mul(12)?)),
        _ => None,
    }
}

pub fn days_until_due(next_due: Date, today: Date) -> i64 {
    (next_due - today).num_days()
}

pub fn due_status(days_until_due: i64) -> &'static str {
    if days_until_due < 0 {
        DUE_OVERDUE
    } else if days_until_due <= DUE_SOON_DAYS {
        DUE_SOON
    } else {
        DUE_SCHEDULED
    }
}

/// `WO-2026-0012`
pub fn format_work_order_number(year: i32, sequence: i64) -> String {
    format!("WO-{year}-{sequence:04}")
}

pub mod state_machine {
    use super::*;

    pub fn valid_transitions(from: &str) -> &'static [&'static str] {
        match from {
            WO_OPEN => &[WO_IN_PROGRESS, WO_COMPLETED, WO_CANCELLED],
            WO_IN_PROGRESS => &[WO_COMPLETED, WO_CANCELLED, WO_OPEN],
            _ => &[],
        }
    }

    pub fn validate_transition(from: &str, to: &str) -> Result<(), String> {
        validate_one_of("work order status", to, VALID_WORK_ORDER_STATUSES)?;
        if valid_transitions(from).contains(&to) {
            Ok(())
        } else {
            Err(transition_error("work order", from, to))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> Date {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn advance_by_each_frequency() {
        let start = d(2026, 1, 31);
        assert_eq!(advance(start, FREQ_DAILY, 3), Some(d(2026, 2, 3)));
        assert_eq!(advance(start, FREQ_WEEKLY, 2), Some(d(2026, 2, 14)));
        assert_eq!(advance(start, FREQ_MONTHLY, 1), Some(d(2026, 2, 28)));
        assert_eq!(advance(start, FREQ_QUARTERLY, 1), Some(d(2026, 4, 30)));
        assert_eq!(advance(d(2028, 2, 29), FREQ_YEARLY, 1), Some(d(2029, 2, 28)));
        assert_eq!(advance(start, "HOURLY", 1), None);
    }

    #[test]
    fn due_status_thresholds() {
        let today = d(2026, 6, 10);
        assert_eq!(due_status(days_until_due(d(2026, 6, 9), today)), DUE_OVERDUE);
        assert_eq!(due_status(days_until_due(d(2026, 6, 17), today)), DUE_SOON);
        assert_eq!(due_status(days_until_due(d(2026, 6, 18), today)), DUE_SCHEDULED);
    }

    #[test]
    fn frequency_value_must_be_positive() {
        assert!(validate_frequency(FREQ_MONTHLY, 0).is_err());
        assert!(validate_frequency("FORTNIGHTLY", 1).is_err());
        assert!(validate_frequency(FREQ_WEEKLY, 2).is_ok());
    }

    #[test]
    fn work_order_number() {
        assert_eq!(format_work_order_number(2026, 12), "WO-2026-0012");
    }

    #[test]
    fn completed_work_orders_are_final() {
        use state_machine::validate_transition;
        assert!(validate_transition(WO_OPEN, WO_IN_PROGRESS).is_ok());
        assert!(validate_transition(WO_IN_PROGRESS, WO_COMPLETED).is_ok());
        assert!(validate_transition(WO_COMPLETED, WO_OPEN).is_err());
    }
}
