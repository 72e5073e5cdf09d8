//! Error types.
//!
//! - `AnalyticsError`: typed failures of the core pipeline (schema, region policy).
//! - `AppError`: what the binary reports, carrying a process exit code.
//!
//! Undefined ratios (0/0, x/0) are never errors; they surface as `None`.

use thiserror::Error;

/// Failures raised by the analytics core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalyticsError {
    /// A required column is absent from the input table.
    #[error("Missing required column: `{column}`")]
    Schema { column: String },

    /// A requested region has no state-level rows (only under `RegionPolicy::Fail`).
    #[error("Unknown region `{region}`: no state-level rows match")]
    UnknownRegion { region: String },

    #[error("Rolling window must be > 0 (got {0})")]
    InvalidWindow(usize),

    /// The table could not be tokenized at all (bad header row, broken encoding).
    #[error("Malformed CSV: {0}")]
    Csv(String),
}

impl AnalyticsError {
    pub fn schema(column: impl Into<String>) -> Self {
        AnalyticsError::Schema {
            column: column.into(),
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<AnalyticsError> for AppError {
    fn from(err: AnalyticsError) -> Self {
        let code = match err {
            AnalyticsError::Schema { .. } | AnalyticsError::Csv(_) | AnalyticsError::InvalidWindow(_) => 2,
            AnalyticsError::UnknownRegion { .. } => 3,
        };
        AppError::new(code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_errors_map_to_usage_exit_code() {
        let err: AppError = AnalyticsError::schema("place_type").into();
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.message(), "Missing required column: `place_type`");
    }

    #[test]
    fn unknown_region_maps_to_empty_data_exit_code() {
        let err: AppError = AnalyticsError::UnknownRegion {
            region: "XX".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("XX"));
    }
}
