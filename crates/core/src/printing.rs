//! Print run rules: methods, workcenters, the run state machine,
//! method-specific log validation and the Ashley efficiency check.

use serde::Serialize;
use serde_json::{json, Value};

use crate::money::round2;
use crate::validation::{transition_error, validate_one_of};

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

pub const METHOD_SILKSCREEN: &str = "SILKSCREEN";
pub const METHOD_SUBLIMATION: &str = "SUBLIMATION";
pub const METHOD_DTF: &str = "DTF";
pub const METHOD_EMBROIDERY: &str = "EMBROIDERY";

pub const VALID_METHODS: &[&str] = &[METHOD_SILKSCREEN, METHOD_SUBLIMATION, METHOD_DTF, METHOD_EMBROIDERY];

pub const VALID_WORKCENTERS: &[&str] = &["PRINTING", "HEAT_PRESS", "EMB", "DRYER"];

pub const VALID_COST_ATTRIBUTIONS: &[&str] = &["SUPPLIER", "STAFF", "COMPANY", "CLIENT"];

pub const STATUS_CREATED: &str = "CREATED";
pub const STATUS_IN_PROGRESS: &str = "IN_PROGRESS";
pub const STATUS_PAUSED: &str = "PAUSED";
pub const STATUS_DONE: &str = "DONE";
pub const STATUS_CANCELLED: &str = "CANCELLED";

pub const VALID_STATUSES: &[&str] = &[
    STATUS_CREATED,
    STATUS_IN_PROGRESS,
    STATUS_PAUSED,
    STATUS_DONE,
    STATUS_CANCELLED,
];

/// Number of recent rejects shown on the printing dashboard.
pub const DASHBOARD_RECENT_REJECTS: i64 = 10;

/// Window in days for the dashboard's per-method breakdown.
pub const DASHBOARD_METHOD_WINDOW_DAYS: i64 = 7;

pub fn validate_method(method: &str) -> Result<(), String> {
    validate_one_of("method", method, VALID_METHODS)
}

pub fn validate_workcenter(workcenter: &str) -> Result<(), String> {
    validate_one_of("workcenter", workcenter, VALID_WORKCENTERS)
}

pub fn validate_cost_attribution(value: &str) -> Result<(), String> {
    validate_one_of("cost_attribution", value, VALID_COST_ATTRIBUTIONS)
}

pub fn validate_status(status: &str) -> Result<(), String> {
    validate_one_of("print run status", status, VALID_STATUSES)
}

/// A machine can only host runs at its own workcenter.
pub fn validate_machine_workcenter(machine_workcenter: &str, run_workcenter: &str) -> Result<(), String> {
    if machine_workcenter == run_workcenter {
        Ok(())
    } else {
        Err(format!(
            "Machine belongs to workcenter {machine_workcenter}, run requires {run_workcenter}"
        ))
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

pub mod state_machine {
    use super::*;

    pub fn valid_transitions(from: &str) -> &'static [&'static str] {
        match from {
            STATUS_CREATED => &[STATUS_IN_PROGRESS, STATUS_CANCELLED],
            STATUS_IN_PROGRESS => &[STATUS_PAUSED, STATUS_DONE, STATUS_CANCELLED],
            STATUS_PAUSED => &[STATUS_IN_PROGRESS, STATUS_CANCELLED],
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
            Err(transition_error("print run", from, to))
        }
    }
}

// ---------------------------------------------------------------------------
// Method logs
// ---------------------------------------------------------------------------

pub const LOG_SILKSCREEN_PREP: &str = "silkscreen_prep";
pub const LOG_SILKSCREEN_SPEC: &str = "silkscreen_spec";
pub const LOG_CURING: &str = "curing";
pub const LOG_SUBLIMATION_PRINT: &str = "sublimation_print";
pub const LOG_HEAT_PRESS: &str = "heat_press";
pub const LOG_DTF_PRINT: &str = "dtf_print";
pub const LOG_DTF_POWDER_CURE: &str = "dtf_powder_cure";
pub const LOG_EMBROIDERY: &str = "embroidery";

/// Which method a log type belongs to, or `None` for unknown types.
pub fn log_type_method(log_type: &str) -> Option<&'static str> {
    match log_type {
        LOG_SILKSCREEN_PREP | LOG_SILKSCREEN_SPEC | LOG_CURING => Some(METHOD_SILKSCREEN),
        LOG_SUBLIMATION_PRINT | LOG_HEAT_PRESS => Some(METHOD_SUBLIMATION),
        LOG_DTF_PRINT | LOG_DTF_POWDER_CURE => Some(METHOD_DTF),
        LOG_EMBROIDERY => Some(METHOD_EMBROIDERY),
        _ => None,
    }
}

/// The log type the efficiency check reads for each method.
pub fn primary_log_type(method: &str) -> Option<&'static str> {
    match method {
        METHOD_SILKSCREEN => Some(LOG_SILKSCREEN_PREP),
        METHOD_SUBLIMATION => Some(LOG_SUBLIMATION_PRINT),
        METHOD_DTF => Some(LOG_DTF_PRINT),
        METHOD_EMBROIDERY => Some(LOG_EMBROIDERY),
        _ => None,
    }
}

/// Validate a method log against the run's method and the log type's
/// required fields.
pub fn validate_method_log(run_method: &str, log_type: &str, data: &Value) -> Result<(), String> {
    let Some(method) = log_type_method(log_type) else {
        return Err(format!("Unknown log type '{log_type}'"));
    };
    if method != run_method {
        return Err(format!(
            "Log type '{log_type}' is not valid for a {run_method} run"
        ));
    }
    if !data.is_object() {
        return Err("Log data must be a JSON object".to_string());
    }

    let require_str = |field: &str| -> Result<(), String> {
        match data.get(field).and_then(Value::as_str) {
            Some(s) if !s.trim().is_empty() => Ok(()),
            _ => Err(format!("{log_type} requires '{field}'")),
        }
    };
    let require_num = |field: &str, min: f64| -> Result<(), String> {
        match data.get(field).and_then(Value::as_f64) {
            Some(n) if n >= min => Ok(()),
            _ => Err(format!("{log_type} requires numeric '{field}' >= {min}")),
        }
    };

    match log_type {
        LOG_SILKSCREEN_PREP => {
            require_str("ink_type")?;
            require_str("squeegee_size")
        }
        LOG_SUBLIMATION_PRINT => {
            require_num("print_temp", 0.0)?;
            require_num("print_time", 0.0)
        }
        LOG_EMBROIDERY => require_num("stitch_count", 1.0),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Efficiency check
// ---------------------------------------------------------------------------

/// Result of the Ashley efficiency check for a print run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EfficiencyCheck {
    pub overall_efficiency: f64,
    pub quality_score: &'static str,
    pub method_specific: Value,
    pub recommendations: Vec<&'static str>,
}

/// Efficiency as a percentage of good output: `(output - rejects) / output * 100`.
pub fn efficiency(total_output: i64, total_rejects: i64) -> f64 {
    if total_output <= 0 {
        return 0.0;
    }
    round2((total_output - total_rejects) as f64 / total_output as f64 * 100.0)
}

pub fn quality_score(efficiency: f64) -> &'static str {
    if efficiency > 95.0 {
        "EXCELLENT"
    } else if efficiency > 85.0 {
        "GOOD"
    } else {
        "NEEDS_IMPROVEMENT"
    }
}

/// Method-specific checks derived from the run's primary log, if any.
pub fn method_checks(method: &str, primary_log: Option<&Value>) -> Value {
    let Some(log) = primary_log else {
        return json!({});
    };
    match method {
        METHOD_SILKSCREEN => {
            let ink = log.get("ink_type").and_then(Value::as_str).unwrap_or_default();
            let mesh = log.get("mesh_count").and_then(Value::as_i64);
            json!({
                "ink_efficiency": if ink.eq_ignore_ascii_case("PLASTISOL") { 95 } else { 90 },
                "screen_setup_optimal": mesh.map_or(true, |m| m >= 110),
                "setup_quality": "GOOD",
            })
        }
        METHOD_SUBLIMATION => {
            let temp = log.get("print_temp").and_then(Value::as_f64).unwrap_or_default();
            let time = log.get("print_time").and_then(Value::as_f64).unwrap_or_default();
            json!({
                "temp_optimal": (380.0..=400.0).contains(&temp),
                "time_efficient": time <= 60.0,
                "quality_prediction": "HIGH",
            })
        }
        METHOD_DTF => json!({
            "film_quality": "HIGH",
            "powder_coverage": "OPTIMAL",
            "adhesion_predicted": "EXCELLENT",
        }),
        METHOD_EMBROIDERY => {
            let stitches = log.get("stitch_count").and_then(Value::as_i64).unwrap_or_default();
            json!({
                "stitch_density_optimal": stitches < 15_000,
                "thread_efficiency": 92,
                "design_complexity": if stitches > 10_000 { "HIGH" } else { "MEDIUM" },
            })
        }
        _ => json!({}),
    }
}

/// Run the full efficiency check.
pub fn efficiency_check(
    method: &str,
    total_output: i64,
    total_rejects: i64,
    primary_log: Option<&Value>,
) -> EfficiencyCheck {
    let overall = efficiency(total_output, total_rejects);
    let recommendations = if overall < 90.0 {
        vec![
            "Review material consumption patterns",
            "Check machine calibration",
            "Consider operator training",
        ]
    } else {
        vec!["Excellent performance - maintain current standards"]
    };
    EfficiencyCheck {
        overall_efficiency: overall,
        quality_score: quality_score(overall),
        method_specific: method_checks(method, primary_log),
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::state_machine::*;
    use super::*;

    #[test]
    fn start_only_from_created_or_paused() {
        assert!(can_transition(STATUS_CREATED, STATUS_IN_PROGRESS));
        assert!(can_transition(STATUS_PAUSED, STATUS_IN_PROGRESS));
        assert!(!can_transition(STATUS_DONE, STATUS_IN_PROGRESS));
        assert!(!can_transition(STATUS_CANCELLED, STATUS_IN_PROGRESS));
    }

    #[test]
    fn complete_only_from_in_progress() {
        assert!(validate_transition(STATUS_IN_PROGRESS, STATUS_DONE).is_ok());
        assert!(validate_transition(STATUS_CREATED, STATUS_DONE).is_err());
        assert!(validate_transition(STATUS_PAUSED, STATUS_DONE).is_err());
    }

    #[test]
    fn machine_must_match_workcenter() {
        assert!(validate_machine_workcenter("EMB", "EMB").is_ok());
        assert!(validate_machine_workcenter("DRYER", "PRINTING").is_err());
    }

    #[test]
    fn log_type_must_match_method() {
        let data = json!({"ink_type": "PLASTISOL", "squeegee_size": "70D"});
        assert!(validate_method_log(METHOD_SILKSCREEN, LOG_SILKSCREEN_PREP, &data).is_ok());
        assert!(validate_method_log(METHOD_DTF, LOG_SILKSCREEN_PREP, &data).is_err());
        assert!(validate_method_log(METHOD_DTF, "laser", &data).is_err());
    }

    #[test]
    fn log_required_fields() {
        let err = validate_method_log(METHOD_SILKSCREEN, LOG_SILKSCREEN_PREP, &json!({"ink_type": "WATER"}))
            .unwrap_err();
        assert!(err.contains("squeegee_size"));
        assert!(validate_method_log(METHOD_EMBROIDERY, LOG_EMBROIDERY, &json!({"stitch_count": 0})).is_err());
        assert!(validate_method_log(METHOD_EMBROIDERY, LOG_EMBROIDERY, &json!({"stitch_count": 8000})).is_ok());
        assert!(validate_method_log(METHOD_DTF, LOG_DTF_POWDER_CURE, &json!({})).is_ok());
    }

    #[test]
    fn efficiency_and_score() {
        assert_eq!(efficiency(0, 0), 0.0);
        assert_eq!(efficiency(200, 4), 98.0);
        assert_eq!(quality_score(98.0), "EXCELLENT");
        assert_eq!(quality_score(95.0), "GOOD");
        assert_eq!(quality_score(85.0), "NEEDS_IMPROVEMENT");
    }

    #[test]
    fn low_efficiency_gets_recommendations() {
        let check = efficiency_check(METHOD_DTF, 100, 15, None);
        assert_eq!(check.overall_efficiency, 85.0);
        assert_eq!(check.recommendations.len(), 3);
        assert_eq!(check.method_specific, json!({}));
    }

    #[test]
    fn silkscreen_checks() {
        let log = json!({"ink_type": "PLASTISOL", "mesh_count": 100});
        let checks = method_checks(METHOD_SILKSCREEN, Some(&log));
        assert_eq!(checks["ink_efficiency"], 95);
        assert_eq!(checks["screen_setup_optimal"], false);

        let log = json!({"ink_type": "WATER"});
        let checks = method_checks(METHOD_SILKSCREEN, Some(&log));
        assert_eq!(checks["ink_efficiency"], 90);
        assert_eq!(checks["screen_setup_optimal"], true);
    }

    #[test]
    fn sublimation_checks() {
        let log = json!({"print_temp": 395, "print_time": 75});
        let checks = method_checks(METHOD_SUBLIMATION, Some(&log));
        assert_eq!(checks["temp_optimal"], true);
        assert_eq!(checks["time_efficient"], false);
    }

    #[test]
    fn embroidery_checks() {
        let log = json!({"stitch_count": 12000});
        let checks = method_checks(METHOD_EMBROIDERY, Some(&log));
        assert_eq!(checks["stitch_density_optimal"], true);
        assert_eq!(checks["design_complexity"], "HIGH");
    }
}
