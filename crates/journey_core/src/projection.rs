//! crates/journey_core/src/projection.rs
//!
//! Turns one application record into the display-ready view model used by the
//! dashboard: step tracker, headline progress, timeline, document ratio and chart
//! segments. Everything here is pure; the view model is recomputed on every call.

use crate::catalog::{JourneyStep, JOURNEY_STEPS, TOTAL_STEPS};
use crate::domain::{Application, Document, Milestone, MilestoneStatus, OverallStatus, StepNumber};

//=========================================================================================
// View Model Types
//=========================================================================================

/// Position of a catalog step relative to the application's current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Completed,
    Active,
    Pending,
}

impl StepStatus {
    /// The milestone wording used when a timeline entry has no recorded milestone.
    pub fn default_label(self) -> &'static str {
        match self {
            Self::Completed => "Completed",
            Self::Active => "In Progress",
            Self::Pending => "Pending",
        }
    }
}

/// One entry of the step tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepState {
    pub number: u8,
    pub name: &'static str,
    pub icon: &'static str,
    pub status: StepStatus,
    /// Date of the first milestone recorded for this step.
    pub date: Option<String>,
}

/// One catalog step merged with its best-matching milestone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEntry {
    pub step_number: u8,
    pub name: &'static str,
    pub icon: &'static str,
    pub status_label: String,
    pub state: StepStatus,
    pub date: Option<String>,
    pub notes: String,
    pub from_milestone: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DocumentSummary {
    pub completed: usize,
    pub total: usize,
}

/// Segment sizes for the progress donut chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressBreakdown {
    pub completed: u8,
    pub in_progress: u8,
    pub remaining: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationViewModel {
    pub application_id: String,
    pub current_step: StepNumber,
    pub progress_percent: u8,
    pub overall_status: OverallStatus,
    pub steps: Vec<StepState>,
    pub timeline: Vec<TimelineEntry>,
    pub documents: DocumentSummary,
    pub breakdown: ProgressBreakdown,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("Application index {index} is out of range for {len} application(s)")]
    OutOfRange { index: usize, len: usize },
}

//=========================================================================================
// Projection Operations
//=========================================================================================

fn status_for(step_number: u8, current: StepNumber) -> StepStatus {
    let current = current.get();
    if step_number < current {
        StepStatus::Completed
    } else if step_number == current {
        StepStatus::Active
    } else {
        StepStatus::Pending
    }
}

/// Per-step status for every catalog entry, in catalog order.
pub fn derive_status(current: StepNumber) -> Vec<(JourneyStep, StepStatus)> {
    JOURNEY_STEPS
        .iter()
        .map(|step| (*step, status_for(step.number, current)))
        .collect()
}

/// Headline percentage, driven by the step index alone.
pub fn compute_progress(current: StepNumber) -> u8 {
    let numerator = u32::from(current.get()) * 100;
    let total = u32::from(TOTAL_STEPS);
    // Half-up rounding of numerator / total.
    ((numerator * 2 + total) / (total * 2)) as u8
}

pub fn compute_breakdown(current: StepNumber) -> ProgressBreakdown {
    let current = current.get();
    ProgressBreakdown {
        completed: current - 1,
        in_progress: 1,
        remaining: TOTAL_STEPS - current,
    }
}

/// First milestone recorded for `step_number`. Duplicates after it are ignored.
fn first_milestone(milestones: &[Milestone], step_number: u8) -> Option<&Milestone> {
    milestones
        .iter()
        .find(|m| m.step_number == u32::from(step_number))
}

/// Merges the catalog with recorded milestones. Output follows catalog order and
/// always has one entry per catalog step.
pub fn merge_timeline(
    catalog: &[JourneyStep],
    milestones: &[Milestone],
    current: StepNumber,
) -> Vec<TimelineEntry> {
    catalog
        .iter()
        .map(|step| {
            let positional = status_for(step.number, current);
            match first_milestone(milestones, step.number) {
                Some(milestone) => {
                    let state = match milestone.status {
                        MilestoneStatus::Completed => StepStatus::Completed,
                        MilestoneStatus::InProgress => StepStatus::Active,
                        MilestoneStatus::Pending | MilestoneStatus::Other(_) => positional,
                    };
                    TimelineEntry {
                        step_number: step.number,
                        name: step.name,
                        icon: step.icon,
                        status_label: milestone.status.label().to_string(),
                        state,
                        date: milestone.date.clone(),
                        notes: milestone.notes.clone(),
                        from_milestone: true,
                    }
                }
                None => TimelineEntry {
                    step_number: step.number,
                    name: step.name,
                    icon: step.icon,
                    status_label: positional.default_label().to_string(),
                    state: positional,
                    date: None,
                    notes: String::new(),
                    from_milestone: false,
                },
            }
        })
        .collect()
}

pub fn compute_document_summary(documents: &[Document]) -> DocumentSummary {
    DocumentSummary {
        completed: documents.iter().filter(|d| d.status.is_complete()).count(),
        total: documents.len(),
    }
}

pub fn select_application(
    applications: &[Application],
    index: usize,
) -> Result<&Application, SelectionError> {
    applications.get(index).ok_or(SelectionError::OutOfRange {
        index,
        len: applications.len(),
    })
}

/// Builds the full view model for one application.
pub fn project(application: &Application) -> ApplicationViewModel {
    let current = application.current_step;

    let steps = derive_status(current)
        .into_iter()
        .map(|(step, status)| StepState {
            number: step.number,
            name: step.name,
            icon: step.icon,
            status,
            date: first_milestone(&application.milestones, step.number)
                .and_then(|m| m.date.clone()),
        })
        .collect();

    ApplicationViewModel {
        application_id: application.application_id.clone(),
        current_step: current,
        progress_percent: compute_progress(current),
        overall_status: application.overall_status.clone(),
        steps,
        timeline: merge_timeline(&JOURNEY_STEPS, &application.milestones, current),
        documents: compute_document_summary(&application.documents),
        breakdown: compute_breakdown(current),
    }
}

/// Selects and projects in one go. Nothing is computed for an invalid index.
pub fn project_selected(
    applications: &[Application],
    index: usize,
) -> Result<ApplicationViewModel, SelectionError> {
    select_application(applications, index).map(project)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DocumentStatus;

    fn application(current_step: i64) -> Application {
        Application {
            application_id: "APP-001".into(),
            country: "Germany".into(),
            university: "TU Munich".into(),
            course: "MSc Informatics".into(),
            intake: "Winter 2025".into(),
            current_step: StepNumber::clamp(Some(current_step)),
            overall_status: OverallStatus::Active,
            start_date: None,
            last_updated: None,
            notes: String::new(),
            milestones: Vec::new(),
            documents: Vec::new(),
        }
    }

    fn milestone(step_number: u32, status: &str, date: Option<&str>) -> Milestone {
        Milestone {
            step_number,
            step_name: format!("Step {}", step_number),
            status: MilestoneStatus::parse(status),
            date: date.map(str::to_string),
            notes: String::new(),
        }
    }

    fn document(status: &str) -> Document {
        Document {
            name: "Passport".into(),
            status: DocumentStatus::parse(status),
            submitted_date: None,
            notes: String::new(),
        }
    }

    #[test]
    fn exactly_one_step_is_active() {
        for current in 1..=6 {
            let statuses = derive_status(StepNumber::clamp(Some(current)));
            assert_eq!(statuses.len(), 6);
            let active = statuses
                .iter()
                .filter(|(_, s)| *s == StepStatus::Active)
                .count();
            assert_eq!(active, 1);
            for (step, status) in &statuses {
                assert_eq!(
                    *status == StepStatus::Completed,
                    i64::from(step.number) < current
                );
            }
        }
    }

    #[test]
    fn progress_rounds_half_up() {
        let progress = |n| compute_progress(StepNumber::clamp(Some(n)));
        assert_eq!(progress(1), 17);
        assert_eq!(progress(2), 33);
        assert_eq!(progress(3), 50);
        assert_eq!(progress(4), 67);
        assert_eq!(progress(5), 83);
        assert_eq!(progress(6), 100);
    }

    #[test]
    fn timeline_is_synthesized_without_milestones() {
        let timeline = merge_timeline(&JOURNEY_STEPS, &[], StepNumber::clamp(Some(3)));
        let labels: Vec<&str> = timeline.iter().map(|e| e.status_label.as_str()).collect();
        assert_eq!(
            labels,
            ["Completed", "Completed", "In Progress", "Pending", "Pending", "Pending"]
        );
        assert!(timeline.iter().all(|e| e.date.is_none() && !e.from_milestone));
    }

    #[test]
    fn milestone_overrides_synthesized_entry() {
        let milestones = vec![milestone(2, "Completed", Some("10-01-2024"))];
        let timeline = merge_timeline(&JOURNEY_STEPS, &milestones, StepNumber::clamp(Some(4)));
        let entry = &timeline[1];
        assert_eq!(entry.step_number, 2);
        assert_eq!(entry.status_label, "Completed");
        assert_eq!(entry.date.as_deref(), Some("10-01-2024"));
        assert!(entry.from_milestone);
        assert_eq!(timeline[0].status_label, "Completed");
        assert!(!timeline[0].from_milestone);
    }

    #[test]
    fn first_matching_milestone_wins_and_catalog_order_is_kept() {
        let milestones = vec![
            milestone(5, "Pending", None),
            milestone(3, "In Progress", Some("2024-03-01")),
            milestone(3, "Completed", Some("2024-04-01")),
            milestone(9, "Completed", Some("2024-05-01")),
        ];
        let timeline = merge_timeline(&JOURNEY_STEPS, &milestones, StepNumber::clamp(Some(3)));
        assert_eq!(timeline.len(), 6);
        let numbers: Vec<u8> = timeline.iter().map(|e| e.step_number).collect();
        assert_eq!(numbers, [1, 2, 3, 4, 5, 6]);
        assert_eq!(timeline[2].date.as_deref(), Some("2024-03-01"));
        assert_eq!(timeline[2].state, StepStatus::Active);
    }

    #[test]
    fn unknown_milestone_status_keeps_label_but_uses_position() {
        let milestones = vec![milestone(1, "Awaiting call", None)];
        let timeline = merge_timeline(&JOURNEY_STEPS, &milestones, StepNumber::clamp(Some(2)));
        assert_eq!(timeline[0].status_label, "Awaiting call");
        assert_eq!(timeline[0].state, StepStatus::Completed);
    }

    #[test]
    fn document_summary_counts_approved_and_submitted() {
        let docs = vec![document("Approved"), document("pending"), document("Submitted")];
        assert_eq!(
            compute_document_summary(&docs),
            DocumentSummary { completed: 2, total: 3 }
        );
        assert_eq!(compute_document_summary(&[]), DocumentSummary::default());
    }

    #[test]
    fn breakdown_splits_the_catalog() {
        let b = compute_breakdown(StepNumber::clamp(Some(4)));
        assert_eq!((b.completed, b.in_progress, b.remaining), (3, 1, 2));
        let last = compute_breakdown(StepNumber::LAST);
        assert_eq!((last.completed, last.in_progress, last.remaining), (5, 1, 0));
    }

    #[test]
    fn out_of_range_selection_is_rejected() {
        let apps = vec![application(2)];
        assert!(select_application(&apps, 0).is_ok());
        assert_eq!(
            project_selected(&apps, 1),
            Err(SelectionError::OutOfRange { index: 1, len: 1 })
        );
        assert_eq!(
            select_application(&[], 0).unwrap_err(),
            SelectionError::OutOfRange { index: 0, len: 0 }
        );
    }

    #[test]
    fn step_tracker_carries_milestone_dates() {
        let mut app = application(3);
        app.milestones = vec![milestone(1, "Completed", Some("2024-01-05"))];
        let view = project(&app);
        assert_eq!(view.steps[0].date.as_deref(), Some("2024-01-05"));
        assert_eq!(view.steps[1].date, None);
        assert_eq!(view.steps[2].status, StepStatus::Active);
    }

    #[test]
    fn projection_is_idempotent() {
        let mut app = application(4);
        app.milestones = vec![milestone(2, "Completed", Some("10-01-2024"))];
        app.documents = vec![document("Approved"), document("Under Review")];
        let first = project(&app);
        let second = project(&app);
        assert_eq!(first, second);
        assert_eq!(first.progress_percent, 67);
        assert_eq!(first.documents, DocumentSummary { completed: 1, total: 2 });
    }
}
