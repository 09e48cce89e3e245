//! Unified error hierarchy for liftrs
//!
//! Analysis errors are raised synchronously by the pure metric functions and
//! always propagate to the caller. Import errors come from the ingestion layer.
//! Not having enough history for a statistic is *not* an error: the overload
//! detector reports it as a normal classification.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all liftrs operations
#[derive(Debug, Error)]
pub enum LiftRsError {
    /// Metric, overload or trend computation errors
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// Ingestion errors
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Errors raised by the analytics core
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Malformed argument to a pure function
    #[error("Invalid {parameter}={value}: {reason}")]
    InvalidInput {
        parameter: String,
        value: String,
        reason: String,
    },

    /// No records match a required filter
    #[error("No data found for {exercise}{}", .date.map(|d| format!(" on {}", d)).unwrap_or_default())]
    NotFound {
        exercise: String,
        date: Option<NaiveDate>,
    },

    /// Statistical distribution could not be constructed
    #[error("Statistics error: {0}")]
    Statistics(String),
}

impl AnalysisError {
    pub fn invalid_input(
        parameter: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        AnalysisError::InvalidInput {
            parameter: parameter.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn not_found(exercise: impl Into<String>, date: Option<NaiveDate>) -> Self {
        AnalysisError::NotFound {
            exercise: exercise.into(),
            date,
        }
    }
}

/// Ingestion errors
#[derive(Debug, Error)]
pub enum ImportError {
    /// File could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV reader failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON parse failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Required columns absent from the header
    #[error("Missing required columns: {}", .columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    /// No importer handles this file
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// Structured log failed validation
    #[error("Validation failed: {}", .errors.join("; "))]
    Validation { errors: Vec<String> },
}

/// Result type alias for analytics operations
pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;

/// Result type alias for liftrs operations
pub type Result<T> = std::result::Result<T, LiftRsError>;

impl LiftRsError {
    /// Caused by bad user input rather than a fault in the tool
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            LiftRsError::Analysis(AnalysisError::InvalidInput { .. })
                | LiftRsError::Analysis(AnalysisError::NotFound { .. })
                | LiftRsError::Import(ImportError::MissingColumns { .. })
                | LiftRsError::Import(ImportError::UnsupportedFormat { .. })
                | LiftRsError::Import(ImportError::Validation { .. })
        )
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            LiftRsError::Analysis(AnalysisError::NotFound { .. }) => ErrorSeverity::Warning,
            LiftRsError::Import(ImportError::Validation { .. }) => ErrorSeverity::Warning,
            LiftRsError::Analysis(AnalysisError::Statistics(_)) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            LiftRsError::Analysis(AnalysisError::NotFound { exercise, date: None }) => {
                format!("No workouts logged for '{}'. Check the exercise name.", exercise)
            }
            LiftRsError::Analysis(AnalysisError::NotFound {
                exercise,
                date: Some(date),
            }) => {
                format!("No '{}' session found on {}.", exercise, date)
            }
            LiftRsError::Import(ImportError::MissingColumns { columns }) => {
                format!(
                    "Workout file is missing columns: {}. Expected date, exercise, sets, reps, weight.",
                    columns.join(", ")
                )
            }
            LiftRsError::Import(ImportError::Io { path, .. }) => {
                format!("Could not read workout file: {}", path.display())
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Internal fault requiring attention
    Critical,
    /// Error that prevents the operation
    Error,
    /// Recoverable "no data" style condition
    Warning,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}
