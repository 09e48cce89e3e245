// Library interface for liftrs modules
// This allows integration tests and benches to access the core functionality

pub mod config;
pub mod error;
pub mod import;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod overload;
pub mod store;
pub mod trend;
pub mod zones;

// Re-export commonly used types for convenience
pub use models::*;
pub use config::AppConfig;
pub use error::{AnalysisError, AnalysisResult, ImportError, LiftRsError, Result};
pub use import::ImportManager;
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use metrics::{estimate_one_rep_max, OneRepMaxFormula, SeriesSummary};
pub use overload::{detect_progressive_overload, OverloadAssessment, OverloadDetector, OverloadKind, OverloadThresholds};
pub use store::{RecordStore, StoreSummary};
pub use trend::{linear_trend, moving_average, LinearTrend};
pub use zones::{RepZone, ZoneAnalyzer, ZoneCalculator};
