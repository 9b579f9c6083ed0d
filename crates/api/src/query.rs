//! Query parameter types shared by several handler modules.

use ashley_core::reporting::Period;
use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// `?period=today|week|month|quarter|year` for the summary endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PeriodParams {
    pub period: Option<String>,
}

impl PeriodParams {
    /// Missing falls back to `default`; an unknown value is a 400.
    pub fn resolve(&self, default: Period) -> AppResult<Period> {
        match self.period.as_deref() {
            None => Ok(default),
            Some(value) => Period::parse(value).map_err(AppError::BadRequest),
        }
    }
}
