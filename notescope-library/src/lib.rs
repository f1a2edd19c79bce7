//! Loading, configuration and analysis sessions for notescope

mod config;
mod loader;
mod session;

pub use config::{AnalysisConfig, ConfigError};
pub use loader::{AudioLoader, LoadError};
pub use session::{AnalysisProgress, AnalysisReport, AnalysisSession, SessionError};
