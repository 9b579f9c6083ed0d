//! AQL (Acceptable Quality Limit) sampling per ISO 2859-1, general
//! inspection level II, single sampling, normal inspection.
//!
//! Two lookups are combined: the lot-size table gives a sample size, and
//! the per-severity AQL value gives acceptance (`ac`) and rejection (`re`)
//! numbers, adjusted for large samples.

use serde::Serialize;

use crate::money::round2;

/// Default AQL values by severity.
pub const DEFAULT_AQL_CRITICAL: f64 = 0.0;
pub const DEFAULT_AQL_MAJOR: f64 = 2.5;
pub const DEFAULT_AQL_MINOR: f64 = 4.0;

pub const RESULT_ACCEPT: &str = "ACCEPT";
pub const RESULT_REJECT: &str = "REJECT";

/// `(lot_min, lot_max, sample_size, ac, re)`
const SAMPLE_TABLE: &[(i64, i64, i32, i32, i32)] = &[
    (2, 8, 2, 0, 1),
    (9, 15, 3, 0, 1),
    (16, 25, 5, 0, 1),
    (26, 50, 8, 0, 1),
    (51, 90, 13, 0, 1),
    (91, 150, 20, 0, 1),
    (151, 280, 32, 0, 1),
    (281, 500, 50, 0, 1),
    (501, 1200, 80, 0, 1),
    (1201, 3200, 125, 1, 2),
    (3201, 10000, 200, 1, 2),
    (10001, 35000, 315, 2, 3),
    (35001, 150000, 500, 3, 4),
    (150001, 500000, 800, 5, 6),
];

/// `(aql_upper_bound, ac, re)`, searched in order.
const ACCEPTANCE_TABLE: &[(f64, i32, i32)] = &[
    (1.0, 0, 1),
    (1.5, 1, 2),
    (2.5, 2, 3),
    (4.0, 3, 4),
    (6.5, 5, 6),
    (10.0, 7, 8),
];

/// Sample plan for a lot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SamplePlan {
    pub lot_size: i64,
    pub sample_size: i32,
    pub acceptance_number: i32,
    pub rejection_number: i32,
    pub sampling_percentage: f64,
}

/// Look up the sample size for a lot.
///
/// Lots outside the table sample 10% of the lot, bounded to `2..=800`.
pub fn sample_plan(lot_size: i64) -> SamplePlan {
    let (sample_size, ac, re) = SAMPLE_TABLE
        .iter()
        .find(|(min, max, ..)| (*min..=*max).contains(&lot_size))
        .map(|&(_, _, n, ac, re)| (n, ac, re))
        .unwrap_or_else(|| {
            let n = ((lot_size as f64 * 0.1).floor() as i64).clamp(2, 800) as i32;
            (n, 0, 1)
        });

    let sampling_percentage = if lot_size > 0 {
        round2(f64::from(sample_size) / lot_size as f64 * 100.0)
    } else {
        0.0
    };

    SamplePlan {
        lot_size,
        sample_size,
        acceptance_number: ac,
        rejection_number: re,
        sampling_percentage,
    }
}

/// Acceptance and rejection numbers for an AQL value at a sample size.
///
/// AQL values between table rows round up to the next row; values above
/// the table use the last row.
pub fn acceptance_numbers(aql: f64, sample_size: i32) -> (i32, i32) {
    let (mut ac, mut re) = ACCEPTANCE_TABLE
        .iter()
        .find(|(bound, ..)| aql <= *bound + f64::EPSILON)
        .map(|&(_, ac, re)| (ac, re))
        .unwrap_or((7, 8));

    if sample_size >= 200 {
        ac += 1;
        re += 1;
    } else if sample_size >= 80 {
        ac = ac.max(1);
        re = re.max(2);
    }
    (ac, re)
}

/// Validate an AQL value.
pub fn validate_aql(aql: f64) -> Result<(), String> {
    if aql.is_finite() && (0.0..=10.0).contains(&aql) {
        Ok(())
    } else {
        Err("AQL values must be between 0.0 and 10.0".to_string())
    }
}

/// Per-severity acceptance limits for an inspection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeverityLimits {
    pub critical: (i32, i32),
    pub major: (i32, i32),
    pub minor: (i32, i32),
}

impl SeverityLimits {
    pub fn new(sample_size: i32, aql_critical: f64, aql_major: f64, aql_minor: f64) -> Self {
        Self {
            critical: acceptance_numbers(aql_critical, sample_size),
            major: acceptance_numbers(aql_major, sample_size),
            minor: acceptance_numbers(aql_minor, sample_size),
        }
    }
}

/// One severity's outcome in an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeverityOutcome {
    pub found: i32,
    pub acceptance_number: i32,
    pub rejection_number: i32,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub result: &'static str,
    pub critical: SeverityOutcome,
    pub major: SeverityOutcome,
    pub minor: SeverityOutcome,
}

/// Evaluate found defect counts against the limits.
///
/// The lot is rejected if any severity exceeds its acceptance number.
pub fn evaluate(limits: &SeverityLimits, critical: i32, major: i32, minor: i32) -> Evaluation {
    let outcome = |found: i32, (ac, re): (i32, i32)| SeverityOutcome {
        found,
        acceptance_number: ac,
        rejection_number: re,
        passed: found <= ac,
    };
    let critical = outcome(critical, limits.critical);
    let major = outcome(major, limits.major);
    let minor = outcome(minor, limits.minor);
    let accepted = critical.passed && major.passed && minor.passed;

    Evaluation {
        result: if accepted { RESULT_ACCEPT } else { RESULT_REJECT },
        critical,
        major,
        minor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_sizes_from_table() {
        assert_eq!(sample_plan(8).sample_size, 2);
        assert_eq!(sample_plan(9).sample_size, 3);
        assert_eq!(sample_plan(500).sample_size, 50);
        assert_eq!(sample_plan(1200).sample_size, 80);
        let p = sample_plan(3000);
        assert_eq!((p.sample_size, p.acceptance_number, p.rejection_number), (125, 1, 2));
        assert_eq!(sample_plan(500_000).sample_size, 800);
    }

    #[test]
    fn lots_outside_table_sample_ten_percent() {
        let p = sample_plan(1);
        assert_eq!((p.sample_size, p.acceptance_number, p.rejection_number), (2, 0, 1));
        assert_eq!(sample_plan(600_000).sample_size, 800);
    }

    #[test]
    fn sampling_percentage() {
        assert_eq!(sample_plan(100).sampling_percentage, 20.0);
        assert_eq!(sample_plan(0).sampling_percentage, 0.0);
    }

    #[test]
    fn acceptance_numbers_by_aql() {
        assert_eq!(acceptance_numbers(0.0, 50), (0, 1));
        assert_eq!(acceptance_numbers(0.65, 50), (0, 1));
        assert_eq!(acceptance_numbers(2.5, 50), (2, 3));
        assert_eq!(acceptance_numbers(4.0, 50), (3, 4));
        assert_eq!(acceptance_numbers(10.0, 50), (7, 8));
        assert_eq!(acceptance_numbers(15.0, 50), (7, 8));
    }

    #[test]
    fn large_samples_adjust_numbers() {
        assert_eq!(acceptance_numbers(0.0, 80), (1, 2));
        assert_eq!(acceptance_numbers(2.5, 125), (2, 3));
        assert_eq!(acceptance_numbers(2.5, 200), (3, 4));
    }

    #[test]
    fn evaluation_rejects_on_any_severity() {
        let limits = SeverityLimits::new(50, DEFAULT_AQL_CRITICAL, DEFAULT_AQL_MAJOR, DEFAULT_AQL_MINOR);
        assert_eq!(evaluate(&limits, 0, 2, 3).result, RESULT_ACCEPT);
        let e = evaluate(&limits, 0, 3, 0);
        assert_eq!(e.result, RESULT_REJECT);
        assert!(!e.major.passed);
        assert_eq!(evaluate(&limits, 1, 0, 0).result, RESULT_REJECT);
    }

    #[test]
    fn aql_bounds() {
        assert!(validate_aql(0.0).is_ok());
        assert!(validate_aql(10.5).is_err());
        assert!(validate_aql(-1.0).is_err());
    }
}
