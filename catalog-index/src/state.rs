//! Initialization state
//!
//! Process-wide lifecycle record of the index build. Only the builder
//! mutates it, always under its mutex; readers get a [`StatusSnapshot`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Build lifecycle
///
/// `NotStarted → InProgress → {Completed | Failed}`. `Failed` may re-enter
/// `InProgress`; `Completed` is final for the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitStatus {
    NotStarted,
    InProgress,
    Completed,
    Failed,
}

impl InitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for InitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable build state
#[derive(Debug, Clone)]
pub struct InitializationState {
    status: InitStatus,
    progress: u8,
    message: String,
    error: Option<String>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    model_loaded: bool,
    index_loaded: bool,
}

impl Default for InitializationState {
    fn default() -> Self {
        Self::new()
    }
}

impl InitializationState {
    pub fn new() -> Self {
        Self {
            status: InitStatus::NotStarted,
            progress: 0,
            message: String::new(),
            error: None,
            started_at: None,
            ended_at: None,
            model_loaded: false,
            index_loaded: false,
        }
    }

    pub fn status(&self) -> InitStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// Enter `InProgress` for a fresh run
    pub(crate) fn begin(&mut self) {
        self.status = InitStatus::InProgress;
        self.progress = 0;
        self.message = "Starting initialization...".to_string();
        self.error = None;
        self.started_at = Some(Utc::now());
        self.ended_at = None;
    }

    /// Record a checkpoint; progress never moves backwards within a run
    pub(crate) fn advance(&mut self, progress: u8, message: impl Into<String>) {
        self.progress = self.progress.max(progress.min(100));
        self.message = message.into();
    }

    pub(crate) fn mark_model_loaded(&mut self) {
        self.model_loaded = true;
    }

    pub(crate) fn complete(&mut self) {
        self.status = InitStatus::Completed;
        self.progress = 100;
        self.message = "Initialization completed successfully".to_string();
        self.error = None;
        self.index_loaded = true;
        self.ended_at = Some(Utc::now());
    }

    pub(crate) fn fail(&mut self, error: impl Into<String>) {
        let error = error.into();
        self.status = InitStatus::Failed;
        self.message = error.clone();
        self.error = Some(error);
        self.ended_at = Some(Utc::now());
    }

    /// Elapsed seconds: total once ended, running time while in progress
    pub fn duration_secs(&self, now: DateTime<Utc>) -> Option<f64> {
        let started = self.started_at?;
        let end = self.ended_at.unwrap_or(now);
        Some((end - started).num_milliseconds() as f64 / 1000.0)
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            status: self.status,
            progress: self.progress,
            message: self.message.clone(),
            error: self.error.clone(),
            started_at: self.started_at,
            ended_at: self.ended_at,
            duration: self.duration_secs(Utc::now()),
            model_loaded: self.model_loaded,
            index_loaded: self.index_loaded,
        }
    }
}

/// Read-only copy of [`InitializationState`] with derived fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub status: InitStatus,
    pub progress: u8,
    pub message: String,
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Seconds
    pub duration: Option<f64>,
    pub model_loaded: bool,
    pub index_loaded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_state_not_started() {
        let snapshot = InitializationState::new().snapshot();
        assert_eq!(snapshot.status, InitStatus::NotStarted);
        assert_eq!(snapshot.progress, 0);
        assert!(snapshot.started_at.is_none());
        assert!(snapshot.duration.is_none());
        assert!(!snapshot.model_loaded);
        assert!(!snapshot.index_loaded);
    }

    #[test]
    fn test_progress_is_monotonic() {
        let mut state = InitializationState::new();
        state.begin();
        state.advance(50, "model");
        state.advance(20, "late checkpoint");
        assert_eq!(state.progress(), 50);
        assert_eq!(state.snapshot().message, "late checkpoint");

        state.advance(250, "clamped");
        assert_eq!(state.progress(), 100);
    }

    #[test]
    fn test_fail_sets_error_and_end() {
        let mut state = InitializationState::new();
        state.begin();
        state.fail("Initialization failed: boom");

        let snapshot = state.snapshot();
        assert_eq!(snapshot.status, InitStatus::Failed);
        assert_eq!(snapshot.error.as_deref(), Some("Initialization failed: boom"));
        assert!(snapshot.ended_at.is_some());
    }

    #[test]
    fn test_begin_after_failure_clears_error() {
        let mut state = InitializationState::new();
        state.begin();
        state.advance(60, "catalog");
        state.fail("boom");
        state.begin();

        let snapshot = state.snapshot();
        assert_eq!(snapshot.status, InitStatus::InProgress);
        assert_eq!(snapshot.progress, 0);
        assert!(snapshot.error.is_none());
        assert!(snapshot.ended_at.is_none());
    }

    #[test]
    fn test_complete() {
        let mut state = InitializationState::new();
        state.begin();
        state.mark_model_loaded();
        state.complete();

        let snapshot = state.snapshot();
        assert_eq!(snapshot.status, InitStatus::Completed);
        assert_eq!(snapshot.progress, 100);
        assert!(snapshot.model_loaded);
        assert!(snapshot.index_loaded);
    }

    #[test]
    fn test_duration_running_and_ended() {
        let mut state = InitializationState::new();
        let start = Utc::now();
        state.started_at = Some(start);

        let running = state.duration_secs(start + Duration::seconds(3)).unwrap();
        assert!((running - 3.0).abs() < 1e-9);

        state.ended_at = Some(start + Duration::milliseconds(1500));
        let total = state.duration_secs(start + Duration::seconds(60)).unwrap();
        assert!((total - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&InitStatus::NotStarted).unwrap();
        assert_eq!(json, "\"not_started\"");
        assert_eq!(InitStatus::InProgress.to_string(), "in_progress");
    }
}
