//! Export job domain model
//!
//! An [`ExportJob`] tracks one export attempt through
//! `NotStarted → Submitting → Polling → {Succeeded, Failed}`. Transitions only move
//! forward and the service-assigned export id can be recorded exactly once.

use crate::domain::ids::{ExportId, ReportId, WorkspaceId};
use crate::domain::parameters::FileFormat;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of an export job
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum JobState {
    NotStarted,
    Submitting,
    Polling,
    Succeeded,
    Failed,
}

impl JobState {
    /// Terminal states cannot be left
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }

    /// Coarse status (`Submitting` and `Polling` are both `Running`)
    pub fn status(&self) -> ExportStatus {
        match self {
            JobState::NotStarted => ExportStatus::NotStarted,
            JobState::Submitting | JobState::Polling => ExportStatus::Running,
            JobState::Succeeded => ExportStatus::Succeeded,
            JobState::Failed => ExportStatus::Failed,
        }
    }

    fn can_advance_to(&self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (NotStarted, Submitting)
                | (NotStarted, Failed)
                | (Submitting, Polling)
                | (Submitting, Failed)
                | (Polling, Succeeded)
                | (Polling, Failed)
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Export status as reported by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportStatus {
    NotStarted,
    Running,
    Succeeded,
    Failed,
}

/// One export attempt, owned by the worker executing it
#[derive(Debug, Clone)]
pub struct ExportJob {
    /// Dispatcher-assigned position in the run (0-based)
    pub sequence: usize,

    pub workspace_id: WorkspaceId,

    pub report_id: ReportId,

    state: JobState,

    export_id: Option<ExportId>,

    result_location: Option<String>,

    /// Status queries issued so far
    pub attempt_count: u32,
}

impl ExportJob {
    /// Creates a job in `NotStarted` state
    pub fn new(sequence: usize, workspace_id: WorkspaceId, report_id: ReportId) -> Self {
        Self {
            sequence,
            workspace_id,
            report_id,
            state: JobState::NotStarted,
            export_id: None,
            result_location: None,
            attempt_count: 0,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn export_id(&self) -> Option<&ExportId> {
        self.export_id.as_ref()
    }

    pub fn result_location(&self) -> Option<&str> {
        self.result_location.as_deref()
    }

    /// Moves the job forward
    ///
    /// # Errors
    ///
    /// Returns an error for any backwards or skipping transition
    pub fn advance(&mut self, next: JobState) -> Result<(), String> {
        if !self.state.can_advance_to(next) {
            return Err(format!(
                "invalid job transition {} -> {} (sequence {})",
                self.state, next, self.sequence
            ));
        }
        self.state = next;
        Ok(())
    }

    /// Records the service-assigned id and enters `Polling`
    pub fn mark_submitted(&mut self, export_id: ExportId) -> Result<(), String> {
        if self.export_id.is_some() {
            return Err(format!(
                "export id already recorded for sequence {}",
                self.sequence
            ));
        }
        self.advance(JobState::Polling)?;
        self.export_id = Some(export_id);
        Ok(())
    }

    /// Captures the artifact location and enters `Succeeded`
    pub fn mark_succeeded(&mut self, result_location: String) -> Result<(), String> {
        self.advance(JobState::Succeeded)?;
        self.result_location = Some(result_location);
        Ok(())
    }

    /// Enters `Failed`; no-op once the job is terminal
    pub fn mark_failed(&mut self) {
        if !self.state.is_terminal() {
            self.state = JobState::Failed;
        }
    }

    /// Unique artifact file name derived from the job identity
    ///
    /// `export_{report}_{export id prefix}_{timestamp}_{sequence}.{ext}`. The sequence is
    /// unique within a run, which keeps concurrent jobs from colliding even when they
    /// finish in the same second.
    pub fn artifact_file_name(&self, format: FileFormat, now: DateTime<Utc>) -> String {
        let export_part = self
            .export_id
            .as_ref()
            .map(|id| id.short(20))
            .unwrap_or_else(|| "pending".to_string());
        format!(
            "export_{}_{}_{}_{:04}.{}",
            self.report_id,
            export_part,
            now.format("%Y%m%d_%H%M%S"),
            self.sequence,
            format.extension()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn job() -> ExportJob {
        ExportJob::new(
            3,
            WorkspaceId::new("W1").unwrap(),
            ReportId::new("R1").unwrap(),
        )
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut job = job();
        assert_eq!(job.state().status(), ExportStatus::NotStarted);

        job.advance(JobState::Submitting).unwrap();
        assert_eq!(job.state().status(), ExportStatus::Running);

        job.mark_submitted(ExportId::new("abc").unwrap()).unwrap();
        assert_eq!(job.state(), JobState::Polling);
        assert_eq!(job.export_id().unwrap().as_str(), "abc");

        job.mark_succeeded("https://example/file".to_string()).unwrap();
        assert_eq!(job.state().status(), ExportStatus::Succeeded);
        assert_eq!(job.result_location(), Some("https://example/file"));
    }

    #[test]
    fn test_status_never_reverts() {
        let mut job = job();
        job.advance(JobState::Submitting).unwrap();
        job.mark_submitted(ExportId::new("abc").unwrap()).unwrap();

        assert!(job.advance(JobState::Submitting).is_err());
        assert!(job.advance(JobState::NotStarted).is_err());

        job.mark_failed();
        assert_eq!(job.state(), JobState::Failed);
        assert!(job.advance(JobState::Polling).is_err());
        assert!(job.mark_succeeded("x".to_string()).is_err());
    }

    #[test]
    fn test_export_id_set_once() {
        let mut job = job();
        job.advance(JobState::Submitting).unwrap();
        job.mark_submitted(ExportId::new("first").unwrap()).unwrap();

        assert!(job.mark_submitted(ExportId::new("second").unwrap()).is_err());
        assert_eq!(job.export_id().unwrap().as_str(), "first");
    }

    #[test]
    fn test_succeeded_is_not_overwritten_by_failure() {
        let mut job = job();
        job.advance(JobState::Submitting).unwrap();
        job.mark_submitted(ExportId::new("abc").unwrap()).unwrap();
        job.mark_succeeded("loc".to_string()).unwrap();

        job.mark_failed();
        assert_eq!(job.state(), JobState::Succeeded);
    }

    #[test]
    fn test_artifact_file_name() {
        let mut job = job();
        job.advance(JobState::Submitting).unwrap();
        job.mark_submitted(ExportId::new("Mi9C7zYxMjM0NTY3ODkwYWJjZGVmZ2g=").unwrap())
            .unwrap();

        let now = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
        assert_eq!(
            job.artifact_file_name(FileFormat::Pdf, now),
            "export_R1_Mi9C7zYxMjM0NTY3ODkw_20250314_092653_0003.pdf"
        );
    }
}
