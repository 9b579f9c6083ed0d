//! Sewing floor rules: run lifecycle, piece-rate resolution, run metrics,
//! efficiency analysis and operator pay.

use serde::Serialize;

use crate::hr::{SALARY_DAILY, SALARY_MONTHLY};
use crate::money::{percentage, round2};
use crate::types::{Date, DbId, Timestamp};
use crate::validation::transition_error;

pub const STATUS_CREATED: &str = "CREATED";
pub const STATUS_IN_PROGRESS: &str = "IN_PROGRESS";
pub const STATUS_PAUSED: &str = "PAUSED";
pub const STATUS_DONE: &str = "DONE";

pub const VALID_STATUSES: &[&str] = &[STATUS_CREATED, STATUS_IN_PROGRESS, STATUS_PAUSED, STATUS_DONE];

/// Smallest accepted SMV.
pub const MIN_STANDARD_MINUTES: f64 = 0.01;

/// Default and maximum windows (days) for operator reports.
pub const DEFAULT_EFFICIENCY_WINDOW_DAYS: i64 = 7;
pub const DEFAULT_PERFORMANCE_WINDOW_DAYS: i64 = 30;
pub const MAX_REPORT_WINDOW_DAYS: i64 = 90;

/// Days in a payroll month for pro-rating monthly salaries.
pub const DAYS_PER_MONTH: i64 = 30;

pub mod state_machine {
    use super::*;

    pub fn valid_transitions(from: &str) -> &'static [&'static str] {
        match from {
            STATUS_CREATED => &[STATUS_IN_PROGRESS],
            STATUS_IN_PROGRESS => &[STATUS_PAUSED, STATUS_DONE],
            STATUS_PAUSED => &[STATUS_IN_PROGRESS],
            _ => &[],
        }
    }

    pub fn can_transition(from: &str, to: &str) -> bool {
        valid_transitions(from).contains(&to)
    }

    pub fn validate_transition(from: &str, to: &str) -> Result<(), String> {
        if can_transition(from, to) {
            Ok(())
        } else {
            Err(transition_error("sewing run", from, to))
        }
    }
}

pub fn validate_standard_minutes(smv: f64) -> Result<(), String> {
    if smv.is_finite() && smv >= MIN_STANDARD_MINUTES {
        Ok(())
    } else {
        Err(format!("standard_minutes must be at least {MIN_STANDARD_MINUTES}"))
    }
}

pub fn validate_rate_window(effective_from: Date, effective_to: Option<Date>) -> Result<(), String> {
    match effective_to {
        Some(to) if to <= effective_from => {
            Err("effective_to must be after effective_from".to_string())
        }
        _ => Ok(()),
    }
}

/// Clamp a report window to `1..=MAX_REPORT_WINDOW_DAYS`.
pub fn clamp_window(days: Option<i64>, default: i64) -> i64 {
    days.unwrap_or(default).clamp(1, MAX_REPORT_WINDOW_DAYS)
}

// ---------------------------------------------------------------------------
// Piece rates
// ---------------------------------------------------------------------------

/// A stored piece rate eligible for lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct RateCandidate {
    pub brand_id: Option<DbId>,
    pub rate: f64,
    pub effective_from: Date,
    pub effective_to: Option<Date>,
}

impl RateCandidate {
    /// Active when started on or before `on` and not yet ended.
    fn is_active(&self, on: Date) -> bool {
        self.effective_from <= on && self.effective_to.map_or(true, |to| to > on)
    }
}

/// Resolve the piece rate for an operation on a given brand.
///
/// Lookup order: the operation's own rate, then the most recent active
/// brand-specific rate, then the most recent active rate with no brand.
pub fn resolve_piece_rate(
    operation_rate: Option<f64>,
    brand_id: Option<DbId>,
    candidates: &[RateCandidate],
    on: Date,
) -> Option<f64> {
    if let Some(rate) = operation_rate.filter(|r| *r > 0.0) {
        return Some(rate);
    }

    let latest = |want: Option<DbId>| {
        candidates
            .iter()
            .filter(|c| c.brand_id == want && c.is_active(on))
            .max_by_key(|c| c.effective_from)
            .map(|c| c.rate)
    };

    brand_id.and_then(|b| latest(Some(b))).or_else(|| latest(None))
}

// ---------------------------------------------------------------------------
// Run metrics
// ---------------------------------------------------------------------------

/// Fractional minutes between two instants (never negative).
pub fn minutes_between(start: Timestamp, end: Timestamp) -> f64 {
    let ms = (end - start).num_milliseconds().max(0);
    ms as f64 / 60_000.0
}

/// Figures computed when a run is completed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunCompletion {
    pub actual_minutes: Option<f64>,
    pub earned_minutes: Option<f64>,
    pub efficiency_pct: Option<f64>,
    pub piece_rate_pay: Option<f64>,
}

/// Compute completion metrics for a run.
///
/// `actual_minutes` is wall time from start to end minus paused time.
/// Efficiency needs both a known SMV and positive actual time.
pub fn complete_run(
    started_at: Option<Timestamp>,
    ended_at: Timestamp,
    paused_minutes: f64,
    qty_good: i32,
    standard_minutes: Option<f64>,
    piece_rate: Option<f64>,
) -> RunCompletion {
    let actual_minutes = started_at
        .map(|s| round2((minutes_between(s, ended_at) - paused_minutes).max(0.0)));
    let earned_minutes = standard_minutes.map(|smv| round2(f64::from(qty_good) * smv));
    let efficiency_pct = match (earned_minutes, actual_minutes) {
        (Some(earned), Some(actual)) if actual > 0.0 => Some(round2(earned / actual * 100.0)),
        _ => None,
    };
    let piece_rate_pay = piece_rate.map(|rate| round2(f64::from(qty_good) * rate));

    RunCompletion {
        actual_minutes,
        earned_minutes,
        efficiency_pct,
        piece_rate_pay,
    }
}

// ---------------------------------------------------------------------------
// Efficiency analysis
// ---------------------------------------------------------------------------

/// Lifetime figures for the operator of an analysed run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OperatorInsights {
    pub total_runs: i64,
    pub total_pieces: i64,
    pub total_rejects: i64,
    pub total_earned: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EfficiencyAnalysis {
    pub run_efficiency: f64,
    pub operator_avg_efficiency: f64,
    pub performance_rating: &'static str,
    pub quality_score: f64,
    pub recommendations: Vec<&'static str>,
    pub operator_insights: OperatorInsights,
}

/// Analyse a completed run against the operator's average.
pub fn analyse_run(
    run_efficiency: Option<f64>,
    qty_good: i32,
    qty_reject: i32,
    operator_avg_efficiency: f64,
    insights: OperatorInsights,
) -> EfficiencyAnalysis {
    let eff = run_efficiency.unwrap_or(0.0);
    let quality_score = if qty_good > 0 {
        percentage(f64::from(qty_good), f64::from(qty_good + qty_reject))
    } else {
        0.0
    };

    let mut recommendations = Vec::new();
    if run_efficiency.is_some() && eff < 80.0 {
        recommendations.push("Consider reviewing work method for this operation");
        recommendations.push("Check if operator needs additional training");
    }
    if qty_reject > 0 {
        recommendations.push("Review quality control procedures");
        recommendations.push("Analyze reject reasons for pattern improvement");
    }
    if eff > 120.0 {
        recommendations.push("Excellent performance - consider cross-training other operators");
        recommendations.push("Review standard minutes - may need adjustment");
    }
    if recommendations.is_empty() {
        recommendations.push("Performance within acceptable range - maintain current standards");
    }

    EfficiencyAnalysis {
        run_efficiency: eff,
        operator_avg_efficiency: round2(operator_avg_efficiency),
        performance_rating: if run_efficiency.is_some() && eff > operator_avg_efficiency {
            "ABOVE_AVERAGE"
        } else {
            "BELOW_AVERAGE"
        },
        quality_score,
        recommendations,
        operator_insights: insights,
    }
}

// ---------------------------------------------------------------------------
// Operator pay
// ---------------------------------------------------------------------------

/// Base pay for an operator over `days_worked` days.
///
/// Monthly salaries are pro-rated over 30 days and capped at one month.
/// Piece-rate operators have no base pay.
pub fn base_pay(salary_type: &str, base_salary: f64, days_worked: i64) -> f64 {
    let pay = match salary_type {
        SALARY_MONTHLY => base_salary / DAYS_PER_MONTH as f64 * days_worked.min(DAYS_PER_MONTH) as f64,
        SALARY_DAILY => base_salary * days_worked as f64,
        _ => 0.0,
    };
    round2(pay)
}

/// Payroll line for one operator over a period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperatorPay {
    pub piece_earnings: f64,
    pub base_pay: f64,
    pub gross_pay: f64,
    pub total_hours: f64,
    pub avg_hourly_rate: f64,
}

pub fn operator_pay(
    salary_type: &str,
    base_salary: f64,
    days_worked: i64,
    piece_earnings: f64,
    total_minutes: f64,
) -> OperatorPay {
    let base = base_pay(salary_type, base_salary, days_worked);
    let gross = round2(piece_earnings + base);
    let hours = round2(total_minutes / 60.0);
    let avg_hourly_rate = if hours > 0.0 { round2(gross / hours) } else { 0.0 };
    OperatorPay {
        piece_earnings: round2(piece_earnings),
        base_pay: base,
        gross_pay: gross,
        total_hours: hours,
        avg_hourly_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::state_machine::*;
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    fn d(y: i32, m: u32, day: u32) -> Date {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn rate(brand: Option<DbId>, rate: f64, from: Date, to: Option<Date>) -> RateCandidate {
        RateCandidate {
            brand_id: brand,
            rate,
            effective_from: from,
            effective_to: to,
        }
    }

    #[test]
    fn lifecycle_transitions() {
        assert!(can_transition(STATUS_CREATED, STATUS_IN_PROGRESS));
        assert!(can_transition(STATUS_IN_PROGRESS, STATUS_PAUSED));
        assert!(can_transition(STATUS_PAUSED, STATUS_IN_PROGRESS));
        assert!(can_transition(STATUS_IN_PROGRESS, STATUS_DONE));
        assert!(validate_transition(STATUS_CREATED, STATUS_DONE).is_err());
        assert!(validate_transition(STATUS_PAUSED, STATUS_DONE).is_err());
        assert!(valid_transitions(STATUS_DONE).is_empty());
    }

    #[test]
    fn smv_minimum() {
        assert!(validate_standard_minutes(0.01).is_ok());
        assert!(validate_standard_minutes(0.0).is_err());
    }

    #[test]
    fn operation_rate_wins() {
        let today = d(2026, 5, 1);
        let cands = [rate(Some(1), 3.0, d(2026, 1, 1), None)];
        assert_eq!(resolve_piece_rate(Some(2.5), Some(1), &cands, today), Some(2.5));
    }

    #[test]
    fn brand_rate_preferred_over_generic() {
        let today = d(2026, 5, 1);
        let cands = [
            rate(None, 1.0, d(2026, 1, 1), None),
            rate(Some(9), 1.8, d(2026, 1, 1), None),
            rate(Some(9), 2.2, d(2026, 3, 1), None),
        ];
        assert_eq!(resolve_piece_rate(None, Some(9), &cands, today), Some(2.2));
    }

    #[test]
    fn falls_back_to_generic_rate_and_ignores_expired() {
        let today = d(2026, 5, 1);
        let cands = [
            rate(Some(9), 5.0, d(2026, 1, 1), Some(d(2026, 4, 30))),
            rate(None, 1.2, d(2026, 2, 1), None),
            rate(None, 0.9, d(2026, 6, 1), None),
        ];
        assert_eq!(resolve_piece_rate(None, Some(9), &cands, today), Some(1.2));
        assert_eq!(resolve_piece_rate(None, None, &[], today), None);
    }

    #[test]
    fn completion_metrics() {
        let start = Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap();
        let end = start + Duration::minutes(70);
        let done = complete_run(Some(start), end, 10.0, 50, Some(1.5), Some(2.0));
        assert_eq!(done.actual_minutes, Some(60.0));
        assert_eq!(done.earned_minutes, Some(75.0));
        assert_eq!(done.efficiency_pct, Some(125.0));
        assert_eq!(done.piece_rate_pay, Some(100.0));
    }

    #[test]
    fn completion_without_start_or_smv() {
        let end = Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap();
        let done = complete_run(None, end, 0.0, 10, None, None);
        assert_eq!(done.actual_minutes, None);
        assert_eq!(done.efficiency_pct, None);
        assert_eq!(done.piece_rate_pay, None);
    }

    #[test]
    fn low_efficiency_with_rejects() {
        let a = analyse_run(Some(70.0), 90, 10, 85.0, OperatorInsights::default());
        assert_eq!(a.performance_rating, "BELOW_AVERAGE");
        assert_eq!(a.quality_score, 90.0);
        assert_eq!(a.recommendations.len(), 4);
    }

    #[test]
    fn high_efficiency_suggests_smv_review() {
        let a = analyse_run(Some(130.0), 100, 0, 100.0, OperatorInsights::default());
        assert_eq!(a.performance_rating, "ABOVE_AVERAGE");
        assert!(a.recommendations.iter().any(|r| r.contains("standard minutes")));
    }

    #[test]
    fn normal_run_is_within_range() {
        let a = analyse_run(Some(100.0), 100, 0, 100.0, OperatorInsights::default());
        assert_eq!(a.recommendations, ["Performance within acceptable range - maintain current standards"]);
    }

    #[test]
    fn base_pay_by_salary_type() {
        assert_eq!(base_pay(SALARY_MONTHLY, 15000.0, 15), 7500.0);
        assert_eq!(base_pay(SALARY_MONTHLY, 15000.0, 45), 15000.0);
        assert_eq!(base_pay(SALARY_DAILY, 610.0, 10), 6100.0);
        assert_eq!(base_pay("PIECE_RATE", 610.0, 10), 0.0);
    }

    #[test]
    fn operator_pay_hourly_rate() {
        let pay = operator_pay(SALARY_DAILY, 500.0, 2, 300.0, 960.0);
        assert_eq!(pay.gross_pay, 1300.0);
        assert_eq!(pay.total_hours, 16.0);
        assert_eq!(pay.avg_hourly_rate, 81.25);
        assert_eq!(operator_pay(SALARY_DAILY, 500.0, 0, 0.0, 0.0).avg_hourly_rate, 0.0);
    }

    #[test]
    fn window_is_clamped() {
        assert_eq!(clamp_window(None, 7), 7);
        assert_eq!(clamp_window(Some(365), 7), 90);
        assert_eq!(clamp_window(Some(0), 30), 1);
    }
}
