//! Employee and attendance rules.

use crate::money::percentage;
use crate::validation::validate_one_of;

pub const SALARY_MONTHLY: &str = "MONTHLY";
pub const SALARY_DAILY: &str = "DAILY";
pub const SALARY_PIECE_RATE: &str = "PIECE_RATE";

pub const VALID_SALARY_TYPES: &[&str] = &[SALARY_MONTHLY, SALARY_DAILY, SALARY_PIECE_RATE];

pub const ATTENDANCE_PRESENT: &str = "PRESENT";
pub const ATTENDANCE_ABSENT: &str = "ABSENT";
pub const ATTENDANCE_LATE: &str = "LATE";
pub const ATTENDANCE_HALF_DAY: &str = "HALF_DAY";

pub const VALID_ATTENDANCE_STATUSES: &[&str] = &[
    ATTENDANCE_PRESENT,
    ATTENDANCE_ABSENT,
    ATTENDANCE_LATE,
    ATTENDANCE_HALF_DAY,
];

pub fn validate_salary_type(value: &str) -> Result<(), String> {
    validate_one_of("salary_type", value, VALID_SALARY_TYPES)
}

pub fn validate_attendance_status(value: &str) -> Result<(), String> {
    validate_one_of("attendance status", value, VALID_ATTENDANCE_STATUSES)
}

/// Employee number: `EMP-{seq:03}`.
pub fn format_employee_number(sequence: i64) -> String {
    format!("EMP-{sequence:03}")
}

/// Attendance rate: days present or late over all recorded days, in percent.
pub fn attendance_rate(present: i64, late: i64, total: i64) -> f64 {
    percentage((present + late) as f64, total as f64)
}

/// Ensure a clock-out follows its clock-in.
pub fn validate_time_range(
    time_in: Option<chrono::NaiveTime>,
    time_out: Option<chrono::NaiveTime>,
) -> Result<(), String> {
    match (time_in, time_out) {
        (Some(i), Some(o)) if o <= i => Err("time_out must be after time_in".to_string()),
        (None, Some(_)) => Err("time_out requires time_in".to_string()),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn employee_number_is_zero_padded() {
        assert_eq!(format_employee_number(7), "EMP-007");
        assert_eq!(format_employee_number(1234), "EMP-1234");
    }

    #[test]
    fn attendance_rate_counts_late_as_attended() {
        assert_eq!(attendance_rate(15, 3, 20), 90.0);
        assert_eq!(attendance_rate(0, 0, 0), 0.0);
    }

    #[test]
    fn time_range_rules() {
        assert!(validate_time_range(Some(t(8, 0)), Some(t(17, 0))).is_ok());
        assert!(validate_time_range(Some(t(8, 0)), None).is_ok());
        assert!(validate_time_range(Some(t(17, 0)), Some(t(8, 0))).is_err());
        assert!(validate_time_range(None, Some(t(17, 0))).is_err());
    }

    #[test]
    fn enumerations_validate() {
        assert!(validate_salary_type(SALARY_PIECE_RATE).is_ok());
        assert!(validate_salary_type("HOURLY").is_err());
        assert!(validate_attendance_status(ATTENDANCE_HALF_DAY).is_ok());
    }
}
