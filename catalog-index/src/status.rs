//! Readiness and liveness derived from the build status
//!
//! Pure functions over a [`StatusSnapshot`]; nothing here holds state.

use serde::Serialize;

use crate::state::{InitStatus, StatusSnapshot};

/// Readiness probe result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Readiness {
    Ready,
    NotReady { progress: u8, message: String },
}

/// Liveness report: the process is up, with its current readiness
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub alive: bool,
    pub ready: bool,
    pub initialization_status: StatusSnapshot,
}

pub fn is_ready(snapshot: &StatusSnapshot) -> bool {
    snapshot.status == InitStatus::Completed
}

pub fn readiness(snapshot: &StatusSnapshot) -> Readiness {
    if is_ready(snapshot) {
        Readiness::Ready
    } else {
        Readiness::NotReady {
            progress: snapshot.progress,
            message: snapshot.message.clone(),
        }
    }
}

pub fn health(snapshot: &StatusSnapshot) -> HealthReport {
    HealthReport {
        alive: true,
        ready: is_ready(snapshot),
        initialization_status: snapshot.clone(),
    }
}
