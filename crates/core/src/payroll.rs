//! Semi-monthly payroll computation, statutory deductions and CSV export.

use chrono::{Datelike, NaiveTime};
use serde::Serialize;

use crate::hr::{
    ATTENDANCE_ABSENT, ATTENDANCE_HALF_DAY, SALARY_DAILY, SALARY_MONTHLY,
};
use crate::money::round2;
use crate::types::Date;
use crate::validation::{transition_error, validate_one_of};

pub const CUTOFF_FIRST_HALF: &str = "1-15";
pub const CUTOFF_SECOND_HALF: &str = "16-EOM";
pub const VALID_CUTOFF_TYPES: &[&str] = &[CUTOFF_FIRST_HALF, CUTOFF_SECOND_HALF];

pub const STATUS_DRAFT: &str = "DRAFT";
pub const STATUS_APPROVED: &str = "APPROVED";
pub const STATUS_PAID: &str = "PAID";
pub const STATUS_CANCELLED: &str = "CANCELLED";
pub const VALID_STATUSES: &[&str] = &[STATUS_DRAFT, STATUS_APPROVED, STATUS_PAID, STATUS_CANCELLED];

/// Regular hours per day; anything beyond is overtime.
pub const REGULAR_HOURS_PER_DAY: f64 = 8.0;
pub const OVERTIME_MULTIPLIER: f64 = 1.25;

pub const SSS_RATE: f64 = 0.045;
pub const SSS_CAP: f64 = 1800.0;
pub const PHILHEALTH_RATE: f64 = 0.0275;
pub const PHILHEALTH_CAP: f64 = 1800.0;
pub const PAGIBIG_RATE: f64 = 0.02;
pub const PAGIBIG_CAP: f64 = 100.0;
pub const TAX_THRESHOLD: f64 = 20833.0;
pub const TAX_RATE: f64 = 0.20;

/// Days used to derive a daily rate from a monthly salary.
pub const MONTHLY_RATE_DIVISOR: f64 = 30.0;

pub fn validate_cutoff_type(value: &str) -> Result<(), String> {
    validate_one_of("cutoff_type", value, VALID_CUTOFF_TYPES)
}

pub fn validate_status(value: &str) -> Result<(), String> {
    validate_one_of("payroll status", value, VALID_STATUSES)
}

pub fn validate_period(start: Date, end: Date) -> Result<(), String> {
    if start > end {
        Err("period_start must not be after period_end".to_string())
    } else {
        Ok(())
    }
}

/// The cutoff a period falls into, judged by its start day.
pub fn cutoff_for(start: Date) -> &'static str {
    if start.day() <= 15 {
        CUTOFF_FIRST_HALF
    } else {
        CUTOFF_SECOND_HALF
    }
}

pub mod state_machine {
    use super::*;

    pub fn valid_transitions(from: &str) -> &'static [&'static str] {
        match from {
            STATUS_DRAFT => &[STATUS_APPROVED, STATUS_CANCELLED],
            STATUS_APPROVED => &[STATUS_PAID],
            _ => &[],
        }
    }

    pub fn validate_transition(from: &str, to: &str) -> Result<(), String> {
        if valid_transitions(from).contains(&to) {
            Ok(())
        } else {
            Err(transition_error("payroll", from, to))
        }
    }
}

// ---------------------------------------------------------------------------
// Hours
// ---------------------------------------------------------------------------

/// One attendance record as seen by payroll.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceDay {
    pub status: String,
    pub time_in: Option<NaiveTime>,
    pub time_out: Option<NaiveTime>,
}

/// Hours for a single day.
///
/// With both punches the span is used. Without punches a present day
/// counts as a full regular day and a half day as half of one.
pub fn day_hours(day: &AttendanceDay) -> f64 {
    if day.status == ATTENDANCE_ABSENT {
        return 0.0;
    }
    match (day.time_in, day.time_out) {
        (Some(i), Some(o)) if o > i => (o - i).num_minutes() as f64 / 60.0,
        _ if day.status == ATTENDANCE_HALF_DAY => REGULAR_HOURS_PER_DAY / 2.0,
        _ => REGULAR_HOURS_PER_DAY,
    }
}

/// Days worked: half days count as 0.5, absences as 0.
pub fn day_credit(day: &AttendanceDay) -> f64 {
    match day.status.as_str() {
        ATTENDANCE_ABSENT => 0.0,
        ATTENDANCE_HALF_DAY => 0.5,
        _ => 1.0,
    }
}

/// Split daily hours into `(regular, overtime)` totals.
pub fn split_hours(days: &[AttendanceDay]) -> (f64, f64) {
    days.iter().map(day_hours).fold((0.0, 0.0), |(reg, ot), h| {
        (
            reg + h.min(REGULAR_HOURS_PER_DAY),
            ot + (h - REGULAR_HOURS_PER_DAY).max(0.0),
        )
    })
}

// ---------------------------------------------------------------------------
// Pay
// ---------------------------------------------------------------------------

/// Statutory deductions on a gross amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Deductions {
    pub sss: f64,
    pub philhealth: f64,
    pub pagibig: f64,
    pub withholding_tax: f64,
    pub total: f64,
}

pub fn deductions(gross: f64) -> Deductions {
    let sss = round2((gross * SSS_RATE).min(SSS_CAP));
    let philhealth = round2((gross * PHILHEALTH_RATE).min(PHILHEALTH_CAP));
    let pagibig = round2((gross * PAGIBIG_RATE).min(PAGIBIG_CAP));
    let withholding_tax = if gross > TAX_THRESHOLD {
        round2((gross - TAX_THRESHOLD) * TAX_RATE)
    } else {
        0.0
    };
    Deductions {
        sss,
        philhealth,
        pagibig,
        withholding_tax,
        total: round2(sss + philhealth + pagibig + withholding_tax),
    }
}

/// Daily rate used for overtime.
pub fn daily_rate(salary_type: &str, base_salary: f64) -> f64 {
    match salary_type {
        SALARY_DAILY => base_salary,
        SALARY_MONTHLY => base_salary / MONTHLY_RATE_DIVISOR,
        _ => 0.0,
    }
}

/// Everything payroll needs to know about one employee for one period.
#[derive(Debug, Clone)]
pub struct PayrollInput<'a> {
    pub salary_type: &'a str,
    pub base_salary: f64,
    pub attendance: &'a [AttendanceDay],
    pub piece_count: i64,
    pub piece_earnings: f64,
}

/// Computed payroll item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayrollCalc {
    pub days_worked: f64,
    pub regular_hours: f64,
    pub overtime_hours: f64,
    pub piece_count: i64,
    pub base_pay: f64,
    pub piece_pay: f64,
    pub overtime_pay: f64,
    pub gross_pay: f64,
    pub deductions: Deductions,
    pub net_pay: f64,
}

/// Compute one employee's payroll item for a semi-monthly cutoff.
pub fn compute_item(input: &PayrollInput<'_>) -> PayrollCalc {
    let days_worked: f64 = input.attendance.iter().map(day_credit).sum();
    let (regular, overtime) = split_hours(input.attendance);

    let base_pay = match input.salary_type {
        SALARY_DAILY => input.base_salary * days_worked,
        SALARY_MONTHLY => input.base_salary / 2.0,
        _ => 0.0,
    };
    let hourly = daily_rate(input.salary_type, input.base_salary) / REGULAR_HOURS_PER_DAY;
    let overtime_pay = round2(overtime * hourly * OVERTIME_MULTIPLIER);
    let base_pay = round2(base_pay);
    let piece_pay = round2(input.piece_earnings);
    let gross = round2(base_pay + piece_pay + overtime_pay);
    let deductions = deductions(gross);

    PayrollCalc {
        days_worked,
        regular_hours: round2(regular),
        overtime_hours: round2(overtime),
        piece_count: input.piece_count,
        base_pay,
        piece_pay,
        overtime_pay,
        gross_pay: gross,
        net_pay: round2(gross - deductions.total),
        deductions,
    }
}

// ---------------------------------------------------------------------------
// CSV export
// ---------------------------------------------------------------------------

pub const CSV_HEADERS: &[&str] = &[
    "Employee Name",
    "Position",
    "Department",
    "Regular Hours",
    "Overtime Hours",
    "Piece Count",
    "Gross Pay",
    "Deductions",
    "Net Pay",
];

/// One exported payroll line.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvRow {
    pub employee_name: String,
    pub position: String,
    pub department: String,
    pub regular_hours: f64,
    pub overtime_hours: f64,
    pub piece_count: i64,
    pub gross_pay: f64,
    pub deductions: f64,
    pub net_pay: f64,
}

/// Quote a CSV field when it contains a delimiter, quote or newline.
pub fn escape_csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render payroll rows as CSV: header, rows, a blank line and a total row.
pub fn export_csv(rows: &[CsvRow]) -> String {
    let mut out = String::new();
    out.push_str(&CSV_HEADERS.join(","));
    out.push('\n');

    for r in rows {
        let fields = [
            escape_csv_field(&r.employee_name),
            escape_csv_field(&r.position),
            escape_csv_field(&r.department),
            format!("{:.2}", r.regular_hours),
            format!("{:.2}", r.overtime_hours),
            r.piece_count.to_string(),
            format!("{:.2}", r.gross_pay),
            format!("{:.2}", r.deductions),
            format!("{:.2}", r.net_pay),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }

    let total: f64 = rows.iter().map(|r| r.net_pay).sum();
    out.push('\n');
    out.push_str(&format!("Total,,,,,,,,{total:.2}\n"));
    out
}

/// Download file name for a payroll export.
pub fn export_file_name(start: Date, end: Date) -> String {
    format!("payroll_{}_{}.csv", start.format("%Y-%m-%d"), end.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hr::{ATTENDANCE_PRESENT, SALARY_PIECE_RATE};
    use chrono::NaiveDate;

    fn day(status: &str, inn: Option<(u32, u32)>, out: Option<(u32, u32)>) -> AttendanceDay {
        let t = |(h, m): (u32, u32)| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        AttendanceDay {
            status: status.to_string(),
            time_in: inn.map(t),
            time_out: out.map(t),
        }
    }

    #[test]
    fn hours_split_into_regular_and_overtime() {
        let days = [
            day(ATTENDANCE_PRESENT, Some((8, 0)), Some((19, 0))),
            day(ATTENDANCE_PRESENT, Some((8, 0)), Some((15, 0))),
            day(ATTENDANCE_ABSENT, None, None),
            day(ATTENDANCE_HALF_DAY, None, None),
        ];
        assert_eq!(split_hours(&days), (19.0, 3.0));
    }

    #[test]
    fn deductions_below_threshold() {
        let d = deductions(10000.0);
        assert_eq!(d.sss, 450.0);
        assert_eq!(d.philhealth, 275.0);
        assert_eq!(d.pagibig, 100.0);
        assert_eq!(d.withholding_tax, 0.0);
        assert_eq!(d.total, 825.0);
    }

    #[test]
    fn deductions_are_capped_and_taxed() {
        let d = deductions(50000.0);
        assert_eq!(d.sss, 1800.0);
        assert_eq!(d.philhealth, 1375.0);
        assert_eq!(d.pagibig, 100.0);
        assert_eq!(d.withholding_tax, 5833.4);
    }

    #[test]
    fn daily_employee_with_overtime() {
        let days = [
            day(ATTENDANCE_PRESENT, Some((8, 0)), Some((18, 0))),
            day(ATTENDANCE_PRESENT, Some((8, 0)), Some((16, 0))),
        ];
        let calc = compute_item(&PayrollInput {
            salary_type: SALARY_DAILY,
            base_salary: 640.0,
            attendance: &days,
            piece_count: 0,
            piece_earnings: 0.0,
        });
        assert_eq!(calc.days_worked, 2.0);
        assert_eq!(calc.base_pay, 1280.0);
        // 2h OT at 80/h * 1.25
        assert_eq!(calc.overtime_pay, 200.0);
        assert_eq!(calc.gross_pay, 1480.0);
        assert_eq!(calc.net_pay, round2(1480.0 - calc.deductions.total));
    }

    #[test]
    fn monthly_employee_gets_half_salary_per_cutoff() {
        let calc = compute_item(&PayrollInput {
            salary_type: SALARY_MONTHLY,
            base_salary: 18000.0,
            attendance: &[],
            piece_count: 0,
            piece_earnings: 0.0,
        });
        assert_eq!(calc.base_pay, 9000.0);
    }

    #[test]
    fn piece_rate_employee_paid_by_pieces() {
        let calc = compute_item(&PayrollInput {
            salary_type: SALARY_PIECE_RATE,
            base_salary: 0.0,
            attendance: &[day(ATTENDANCE_PRESENT, Some((7, 0)), Some((17, 0)))],
            piece_count: 420,
            piece_earnings: 1050.0,
        });
        assert_eq!(calc.base_pay, 0.0);
        assert_eq!(calc.overtime_pay, 0.0);
        assert_eq!(calc.gross_pay, 1050.0);
        assert_eq!(calc.piece_count, 420);
    }

    #[test]
    fn csv_has_headers_rows_and_total() {
        let rows = [
            CsvRow {
                employee_name: "Ana Cruz".into(),
                position: "Sewer".into(),
                department: "Sewing".into(),
                regular_hours: 88.0,
                overtime_hours: 4.5,
                piece_count: 1200,
                gross_pay: 9000.0,
                deductions: 825.0,
                net_pay: 8175.0,
            },
            CsvRow {
                employee_name: "Reyes, Jun".into(),
                position: "Cutter".into(),
                department: "Cutting".into(),
                regular_hours: 80.0,
                overtime_hours: 0.0,
                piece_count: 0,
                gross_pay: 7000.0,
                deductions: 600.5,
                net_pay: 6399.5,
            },
        ];
        let csv = export_csv(&rows);
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], CSV_HEADERS.join(","));
        assert_eq!(lines[1], "Ana Cruz,Sewer,Sewing,88.00,4.50,1200,9000.00,825.00,8175.00");
        assert!(lines[2].starts_with("\"Reyes, Jun\",Cutter"));
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "Total,,,,,,,,14574.50");
    }

    #[test]
    fn csv_escapes_quotes() {
        assert_eq!(escape_csv_field("5\" hoop"), "\"5\"\" hoop\"");
        assert_eq!(escape_csv_field("plain"), "plain");
    }

    #[test]
    fn period_rules() {
        let a = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(2026, 5, 16).unwrap();
        assert!(validate_period(a, b).is_ok());
        assert!(validate_period(b, a).is_err());
        assert_eq!(cutoff_for(a), CUTOFF_FIRST_HALF);
        assert_eq!(cutoff_for(b), CUTOFF_SECOND_HALF);
        assert_eq!(export_file_name(a, b), "payroll_2026-05-01_2026-05-16.csv");
    }

    #[test]
    fn status_flow() {
        use state_machine::validate_transition;
        assert!(validate_transition(STATUS_DRAFT, STATUS_APPROVED).is_ok());
        assert!(validate_transition(STATUS_APPROVED, STATUS_PAID).is_ok());
        assert!(validate_transition(STATUS_PAID, STATUS_DRAFT).is_err());
        assert!(validate_transition(STATUS_DRAFT, STATUS_PAID).is_err());
    }
}
