//! Dispatch state and phase tracking.
//!
//! One [`DispatchState`] lives for a single invocation of the builder. The
//! dispatcher walks it through the phases below; anything else is rejected.
//!
//! ```text
//! Pending -> (Registering) -> Preparing -> Running -> Completed
//!     \            \              \           \
//!      '------------'--------------'-----------'--> Failed
//! ```

use std::time::{Duration, Instant};

use crate::error::{AppError, DispatchError};
use crate::models::{Architecture, TaskKind, TaskOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskPhase {
    /// Options parsed, nothing done yet
    Pending,

    /// Writing the one-time home registration
    Registering,

    /// Locating the project and loading settings
    Preparing,

    /// Task body executing
    Running,

    Completed,

    Failed,
}

impl TaskPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPhase::Pending => "pending",
            TaskPhase::Registering => "registering",
            TaskPhase::Preparing => "preparing",
            TaskPhase::Running => "running",
            TaskPhase::Completed => "completed",
            TaskPhase::Failed => "failed",
        }
    }

    /// Get all valid phase transitions FROM this phase.
    pub fn valid_next_phases(&self) -> &'static [TaskPhase] {
        match self {
            TaskPhase::Pending => &[TaskPhase::Registering, TaskPhase::Preparing, TaskPhase::Failed],
            TaskPhase::Registering => &[TaskPhase::Preparing, TaskPhase::Completed, TaskPhase::Failed],
            TaskPhase::Preparing => &[TaskPhase::Running, TaskPhase::Failed],
            TaskPhase::Running => &[TaskPhase::Completed, TaskPhase::Failed],
            TaskPhase::Completed => &[],
            TaskPhase::Failed => &[],
        }
    }

    pub fn can_transition_to(&self, next: TaskPhase) -> bool {
        self.valid_next_phases().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskPhase::Completed | TaskPhase::Failed)
    }
}

/// Progress of one dispatch.
#[derive(Debug, Clone)]
pub struct DispatchState {
    pub task: TaskKind,
    pub arch: Architecture,
    phase: TaskPhase,
    history: Vec<TaskPhase>,
    started: Instant,
    error: Option<AppError>,
}

impl DispatchState {
    pub fn new(task: TaskKind, arch: Architecture) -> Self {
        DispatchState {
            task,
            arch,
            phase: TaskPhase::Pending,
            history: vec![TaskPhase::Pending],
            started: Instant::now(),
            error: None,
        }
    }

    pub fn phase(&self) -> TaskPhase {
        self.phase
    }

    /// Phases visited so far, in order.
    pub fn history(&self) -> &[TaskPhase] {
        &self.history
    }

    pub fn error(&self) -> Option<&AppError> {
        self.error.as_ref()
    }

    /// Attempt to transition to the next phase.
    pub fn transition_to(&mut self, next: TaskPhase) -> Result<(), DispatchError> {
        if !self.phase.can_transition_to(next) {
            return Err(DispatchError::InvalidTransition {
                from: self.phase.as_str().to_string(),
                to: next.as_str().to_string(),
            });
        }
        log::debug!("[Dispatch] {} -> {}", self.phase.as_str(), next.as_str());
        self.phase = next;
        self.history.push(next);
        Ok(())
    }

    /// Record an error and mark the dispatch as failed. Always legal from a
    /// non-terminal phase; the first error wins.
    pub fn record_error(&mut self, error: AppError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
        if !self.phase.is_terminal() {
            self.phase = TaskPhase::Failed;
            self.history.push(TaskPhase::Failed);
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn outcome(&self, warnings: usize, errors: usize) -> TaskOutcome {
        TaskOutcome {
            task: self.task,
            arch: self.arch,
            success: self.phase == TaskPhase::Completed,
            warnings,
            errors,
            elapsed_secs: self.elapsed().as_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut state = DispatchState::new(TaskKind::Build, Architecture::Web);
        state.transition_to(TaskPhase::Registering).unwrap();
        state.transition_to(TaskPhase::Preparing).unwrap();
        state.transition_to(TaskPhase::Running).unwrap();
        state.transition_to(TaskPhase::Completed).unwrap();

        assert_eq!(
            state.history(),
            &[
                TaskPhase::Pending,
                TaskPhase::Registering,
                TaskPhase::Preparing,
                TaskPhase::Running,
                TaskPhase::Completed
            ]
        );
        assert!(state.outcome(0, 0).success);
    }

    #[test]
    fn test_register_task_completes_from_registering() {
        let mut state = DispatchState::new(TaskKind::Register, Architecture::Desktop);
        state.transition_to(TaskPhase::Registering).unwrap();
        assert!(state.transition_to(TaskPhase::Completed).is_ok());
    }

    #[test]
    fn test_cannot_skip_preparing() {
        let mut state = DispatchState::new(TaskKind::Clean, Architecture::Android);
        let err = state.transition_to(TaskPhase::Running).unwrap_err();
        assert_eq!(
            err,
            DispatchError::InvalidTransition {
                from: "pending".to_string(),
                to: "running".to_string()
            }
        );
        assert_eq!(state.phase(), TaskPhase::Pending);
    }

    #[test]
    fn test_terminal_phases_are_final() {
        assert!(TaskPhase::Completed.valid_next_phases().is_empty());
        assert!(!TaskPhase::Failed.can_transition_to(TaskPhase::Pending));
    }

    #[test]
    fn test_record_error_keeps_first() {
        let mut state = DispatchState::new(TaskKind::Build, Architecture::Ios);
        state.transition_to(TaskPhase::Preparing).unwrap();
        state.record_error(AppError::Environment("not macOS".to_string()));
        state.record_error(AppError::Cancelled);

        assert_eq!(state.phase(), TaskPhase::Failed);
        assert!(matches!(state.error(), Some(AppError::Environment(_))));
        assert!(!state.outcome(0, 1).success);
        assert_eq!(state.outcome(0, 1).exit_code(), 1);
    }
}
