//! Drift analysis: pure detection rules plus the engine that records them

pub mod engine;
pub mod rules;

pub use engine::{analyze_all_users, analyze_recent_sessions, analyze_session, AnalysisReport};
