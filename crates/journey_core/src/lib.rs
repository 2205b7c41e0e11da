pub mod catalog;
pub mod domain;
pub mod ports;
pub mod projection;

pub use catalog::{JourneyStep, JOURNEY_STEPS, TOTAL_STEPS};
pub use domain::{
    Application, Counselor, Document, DocumentStatus, IdentityClaim, Lead, LeadError, LeadForm,
    Milestone, MilestoneStatus, OverallStatus, StepNumber, StudentBundle, StudentProfile,
};
pub use ports::{LeadSink, PortError, PortResult, StudentDataSource};
pub use projection::{
    project, project_selected, select_application, ApplicationViewModel, DocumentSummary,
    ProgressBreakdown, SelectionError, StepState, StepStatus, TimelineEntry,
};
