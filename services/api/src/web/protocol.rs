//! services/api/src/web/protocol.rs
//!
//! Defines the JSON wire protocol shared by the HTTP surface and the remote
//! spreadsheet backend. Payloads use camelCase keys to match the sheet script.
//!
//! Inbound payloads come from a loosely-typed store, so cells that should be
//! numbers or text are decoded leniently and normalized into domain records here.

use chrono::{DateTime, Utc};
use journey_core::{
    domain::{non_blank, parse_sheet_date},
    projection::compute_progress,
    Application, ApplicationViewModel, Counselor, Document, DocumentStatus, Milestone,
    MilestoneStatus, OverallStatus, PortError, PortResult, StepNumber, StepStatus,
    StudentBundle, StudentProfile, TOTAL_STEPS,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::adapters::cells::{cell_text, milestone_step};

//=========================================================================================
// Lenient Cell Decoding
//=========================================================================================

fn loose_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(cell_text).unwrap_or_default())
}

fn loose_opt_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    loose_text(deserializer).map(|s| non_blank(Some(s)))
}

fn loose_step<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    loose_text(deserializer).map(|s| StepNumber::parse(&s).get())
}

fn loose_milestone_step<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    loose_text(deserializer).map(|s| milestone_step(&s))
}

fn default_step() -> u8 {
    StepNumber::FIRST.get()
}

//=========================================================================================
// Record Payloads
//=========================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentPayload {
    #[serde(default, deserialize_with = "loose_text")]
    pub email: String,
    #[serde(default, deserialize_with = "loose_text")]
    pub name: String,
    #[serde(default, deserialize_with = "loose_opt_text")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "loose_opt_text")]
    pub counselor_name: Option<String>,
    #[serde(default, deserialize_with = "loose_opt_text")]
    pub counselor_email: Option<String>,
    #[serde(default, deserialize_with = "loose_opt_text")]
    pub counselor_phone: Option<String>,
    #[serde(default, deserialize_with = "loose_opt_text")]
    pub registration_date: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub notes: String,
}

impl From<&StudentProfile> for StudentPayload {
    fn from(student: &StudentProfile) -> Self {
        Self {
            email: student.email.clone(),
            name: student.name.clone(),
            phone: student.phone.clone(),
            counselor_name: student.counselor.name.clone(),
            counselor_email: student.counselor.email.clone(),
            counselor_phone: student.counselor.phone.clone(),
            registration_date: student.registration_date.map(|d| d.to_string()),
            notes: student.notes.clone(),
        }
    }
}

impl StudentPayload {
    pub fn into_domain(self) -> StudentProfile {
        StudentProfile {
            registration_date: self.registration_date.as_deref().and_then(parse_sheet_date),
            email: self.email,
            name: self.name,
            phone: self.phone,
            counselor: Counselor {
                name: self.counselor_name,
                email: self.counselor_email,
                phone: self.counselor_phone,
            },
            notes: self.notes,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MilestonePayload {
    #[serde(default, deserialize_with = "loose_milestone_step")]
    pub step_number: u32,
    #[serde(default, deserialize_with = "loose_text")]
    pub step_name: String,
    #[serde(default, deserialize_with = "loose_text")]
    pub status: String,
    #[serde(default, deserialize_with = "loose_opt_text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub notes: String,
}

impl From<&Milestone> for MilestonePayload {
    fn from(m: &Milestone) -> Self {
        Self {
            step_number: m.step_number,
            step_name: m.step_name.clone(),
            status: m.status.label().to_string(),
            date: m.date.clone(),
            notes: m.notes.clone(),
        }
    }
}

impl MilestonePayload {
    pub fn into_domain(self) -> Milestone {
        Milestone {
            step_number: self.step_number,
            step_name: self.step_name,
            status: MilestoneStatus::parse(&self.status),
            date: self.date,
            notes: self.notes,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPayload {
    #[serde(default, deserialize_with = "loose_text")]
    pub name: String,
    #[serde(default, deserialize_with = "loose_text")]
    pub status: String,
    #[serde(default, deserialize_with = "loose_opt_text")]
    pub submitted_date: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub notes: String,
}

impl From<&Document> for DocumentPayload {
    fn from(d: &Document) -> Self {
        Self {
            name: d.name.clone(),
            status: d.status.label().to_string(),
            submitted_date: d.submitted_date.clone(),
            notes: d.notes.clone(),
        }
    }
}

impl DocumentPayload {
    pub fn into_domain(self) -> Document {
        Document {
            name: self.name,
            status: DocumentStatus::parse(&self.status),
            submitted_date: self.submitted_date,
            notes: self.notes,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationPayload {
    #[serde(default, deserialize_with = "loose_text")]
    pub application_id: String,
    #[serde(default, deserialize_with = "loose_text")]
    pub country: String,
    #[serde(default, deserialize_with = "loose_text")]
    pub university: String,
    #[serde(default, deserialize_with = "loose_text")]
    pub course: String,
    #[serde(default, deserialize_with = "loose_text")]
    pub intake: String,
    #[serde(default = "default_step", deserialize_with = "loose_step")]
    pub current_step: u8,
    #[serde(default, deserialize_with = "loose_text")]
    pub overall_status: String,
    #[serde(default, deserialize_with = "loose_opt_text")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "loose_opt_text")]
    pub last_updated: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub notes: String,
    /// Headline percentage from the step index. Ignored on input.
    #[serde(default)]
    pub progress_percentage: u8,
    #[serde(default)]
    pub milestones: Vec<MilestonePayload>,
    #[serde(default)]
    pub documents: Vec<DocumentPayload>,
}

impl From<&Application> for ApplicationPayload {
    fn from(app: &Application) -> Self {
        Self {
            application_id: app.application_id.clone(),
            country: app.country.clone(),
            university: app.university.clone(),
            course: app.course.clone(),
            intake: app.intake.clone(),
            current_step: app.current_step.get(),
            overall_status: app.overall_status.label().to_string(),
            start_date: app.start_date.map(|d| d.to_string()),
            last_updated: app.last_updated.map(|d| d.to_string()),
            notes: app.notes.clone(),
            progress_percentage: compute_progress(app.current_step),
            milestones: app.milestones.iter().map(MilestonePayload::from).collect(),
            documents: app.documents.iter().map(DocumentPayload::from).collect(),
        }
    }
}

impl ApplicationPayload {
    pub fn into_domain(self) -> Application {
        Application {
            current_step: StepNumber::clamp(Some(i64::from(self.current_step))),
            overall_status: OverallStatus::parse(&self.overall_status),
            start_date: self.start_date.as_deref().and_then(parse_sheet_date),
            last_updated: self.last_updated.as_deref().and_then(parse_sheet_date),
            application_id: self.application_id,
            country: self.country,
            university: self.university,
            course: self.course,
            intake: self.intake,
            notes: self.notes,
            milestones: self
                .milestones
                .into_iter()
                .map(MilestonePayload::into_domain)
                .collect(),
            documents: self
                .documents
                .into_iter()
                .map(DocumentPayload::into_domain)
                .collect(),
        }
    }
}

//=========================================================================================
// Backend Query Responses
//=========================================================================================

/// The error taxonomy carried in every failure body.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    NoApplications,
    Unavailable,
    OutOfRange,
    BadRequest,
    Forbidden,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
pub struct ErrorBody {
    /// Short human-readable title, e.g. "Account Not Found".
    pub error: String,
    /// Older script deployments omit this; the title is used instead.
    #[serde(default)]
    pub kind: Option<ErrorKind>,
    #[serde(default, deserialize_with = "loose_text")]
    pub message: String,
}

impl ErrorBody {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let error = match kind {
            ErrorKind::NotFound => "Account Not Found",
            ErrorKind::NoApplications => "No Applications Found",
            ErrorKind::Unavailable => "Server Error",
            ErrorKind::OutOfRange => "Invalid Selection",
            ErrorKind::BadRequest => "Bad Request",
            ErrorKind::Forbidden => "Access Denied",
        };
        Self {
            error: error.to_string(),
            kind: Some(kind),
            message: message.into(),
        }
    }

    /// The taxonomy kind, inferred from the title when the body has none.
    pub fn resolved_kind(&self) -> ErrorKind {
        self.kind.unwrap_or(match self.error.as_str() {
            "Account Not Found" => ErrorKind::NotFound,
            "No Applications Found" => ErrorKind::NoApplications,
            _ => ErrorKind::Unavailable,
        })
    }
}

impl From<&PortError> for ErrorBody {
    fn from(err: &PortError) -> Self {
        match err {
            PortError::NotFound(email) => Self::new(
                ErrorKind::NotFound,
                format!(
                    "No account found for {}. Please contact your counselor.",
                    email
                ),
            ),
            PortError::NoApplications(_) => Self::new(
                ErrorKind::NoApplications,
                "You don't have any university applications yet. Please contact your counselor.",
            ),
            PortError::Unavailable(_) => Self::new(
                ErrorKind::Unavailable,
                "Unable to load student records right now. Please try again.",
            ),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BundlePayload {
    pub success: bool,
    pub student: StudentPayload,
    pub applications: Vec<ApplicationPayload>,
    #[serde(default)]
    pub total_applications: usize,
}

impl From<&StudentBundle> for BundlePayload {
    fn from(bundle: &StudentBundle) -> Self {
        Self {
            success: true,
            student: StudentPayload::from(&bundle.student),
            applications: bundle
                .applications
                .iter()
                .map(ApplicationPayload::from)
                .collect(),
            total_applications: bundle.applications.len(),
        }
    }
}

/// Either half of the backend query contract.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum BackendResponse {
    Success(BundlePayload),
    Failure(ErrorBody),
}

impl BackendResponse {
    /// Normalizes a decoded response into a bundle or a port error.
    pub fn into_bundle(self, email: &str) -> PortResult<StudentBundle> {
        match self {
            BackendResponse::Success(payload) if payload.success => {
                let applications: Vec<Application> = payload
                    .applications
                    .into_iter()
                    .map(ApplicationPayload::into_domain)
                    .collect();
                if applications.is_empty() {
                    return Err(PortError::NoApplications(email.to_string()));
                }
                Ok(StudentBundle {
                    student: payload.student.into_domain(),
                    applications,
                })
            }
            BackendResponse::Success(_) => Err(PortError::Unavailable(
                "backend reported an unsuccessful response".to_string(),
            )),
            BackendResponse::Failure(body) => Err(match body.resolved_kind() {
                ErrorKind::NotFound => PortError::NotFound(email.to_string()),
                ErrorKind::NoApplications => PortError::NoApplications(email.to_string()),
                _ => PortError::Unavailable(format!("{}: {}", body.error, body.message)),
            }),
        }
    }
}

//=========================================================================================
// Dashboard View Payloads
//=========================================================================================

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StepStatusPayload {
    Completed,
    Active,
    Pending,
}

impl From<StepStatus> for StepStatusPayload {
    fn from(status: StepStatus) -> Self {
        match status {
            StepStatus::Completed => Self::Completed,
            StepStatus::Active => Self::Active,
            StepStatus::Pending => Self::Pending,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepStatePayload {
    pub number: u8,
    pub name: String,
    pub icon: String,
    pub status: StepStatusPayload,
    pub date: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntryPayload {
    pub step_number: u8,
    pub name: String,
    pub icon: String,
    pub status_label: String,
    pub state: StepStatusPayload,
    pub date: Option<String>,
    pub notes: String,
    pub from_milestone: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationViewPayload {
    pub application_id: String,
    pub current_step: u8,
    pub total_steps: u8,
    pub progress_percent: u8,
    pub overall_status: String,
    pub steps: Vec<StepStatePayload>,
    pub timeline: Vec<TimelineEntryPayload>,
    pub documents_completed: usize,
    pub documents_total: usize,
    /// Donut chart segments: completed, in progress, remaining.
    pub chart: Vec<u8>,
}

impl From<&ApplicationViewModel> for ApplicationViewPayload {
    fn from(view: &ApplicationViewModel) -> Self {
        Self {
            application_id: view.application_id.clone(),
            current_step: view.current_step.get(),
            total_steps: TOTAL_STEPS,
            progress_percent: view.progress_percent,
            overall_status: view.overall_status.label().to_string(),
            steps: view
                .steps
                .iter()
                .map(|s| StepStatePayload {
                    number: s.number,
                    name: s.name.to_string(),
                    icon: s.icon.to_string(),
                    status: s.status.into(),
                    date: s.date.clone(),
                })
                .collect(),
            timeline: view
                .timeline
                .iter()
                .map(|e| TimelineEntryPayload {
                    step_number: e.step_number,
                    name: e.name.to_string(),
                    icon: e.icon.to_string(),
                    status_label: e.status_label.clone(),
                    state: e.state.into(),
                    date: e.date.clone(),
                    notes: e.notes.clone(),
                    from_milestone: e.from_milestone,
                })
                .collect(),
            documents_completed: view.documents.completed,
            documents_total: view.documents.total,
            chart: vec![
                view.breakdown.completed,
                view.breakdown.in_progress,
                view.breakdown.remaining,
            ],
        }
    }
}

/// One entry of the application selector.
#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationOption {
    pub index: usize,
    pub application_id: String,
    pub university: String,
    pub country: String,
    pub intake: String,
    pub overall_status: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub welcome_name: String,
    pub avatar_url: Option<String>,
    pub student: StudentPayload,
    pub applications: Vec<ApplicationOption>,
    pub selected_index: usize,
    pub selected: ApplicationPayload,
    pub view: ApplicationViewPayload,
}

//=========================================================================================
// Contact Leads
//=========================================================================================

/// Missing name or email decode as empty and are rejected by lead validation.
#[derive(Deserialize, Debug, Clone, ToSchema)]
pub struct LeadRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    pub destination: Option<String>,
    pub course: Option<String>,
    pub message: Option<String>,
}

#[derive(Serialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadResponse {
    pub id: Uuid,
    pub submitted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_loosely_typed_success_payload() {
        let body = json!({
            "success": true,
            "student": { "email": "asha@example.com", "name": "Asha", "phone": 919876543210u64 },
            "applications": [{
                "applicationId": "APP-7",
                "university": "TU Munich",
                "currentStep": "9",
                "overallStatus": "on hold",
                "startDate": "10-01-2024",
                "milestones": [
                    { "stepNumber": "2", "stepName": "Shortlist", "status": "Completed", "date": "10-01-2024" },
                    { "stepNumber": "x", "status": "weird" }
                ],
                "documents": [{ "name": "Passport", "status": "Approved" }]
            }],
            "totalApplications": 1
        });
        let response: BackendResponse = serde_json::from_value(body).unwrap();
        let bundle = response.into_bundle("asha@example.com").unwrap();

        assert_eq!(bundle.student.phone.as_deref(), Some("919876543210"));
        let app = &bundle.applications[0];
        assert_eq!(app.current_step.get(), 6);
        assert_eq!(app.overall_status, OverallStatus::OnHold);
        assert_eq!(app.start_date, parse_sheet_date("2024-01-10"));
        assert_eq!(app.milestones[0].step_number, 2);
        assert_eq!(app.milestones[0].date.as_deref(), Some("10-01-2024"));
        assert_eq!(app.milestones[1].step_number, 0);
        assert!(app.documents[0].status.is_complete());
    }

    #[test]
    fn missing_current_step_defaults_to_first() {
        let body = json!({ "applicationId": "APP-1" });
        let payload: ApplicationPayload = serde_json::from_value(body).unwrap();
        assert_eq!(payload.current_step, 1);
        let body = json!({ "applicationId": "APP-1", "currentStep": null });
        let payload: ApplicationPayload = serde_json::from_value(body).unwrap();
        assert_eq!(payload.current_step, 1);
    }

    #[test]
    fn maps_error_kinds_and_legacy_titles() {
        let legacy: BackendResponse = serde_json::from_value(json!({
            "error": "Account Not Found",
            "message": "No account found for x@example.com."
        }))
        .unwrap();
        assert_eq!(
            legacy.into_bundle("x@example.com"),
            Err(PortError::NotFound("x@example.com".into()))
        );

        let tagged: BackendResponse = serde_json::from_value(json!({
            "error": "Whatever",
            "kind": "no_applications",
            "message": "none yet",
            "student": { "email": "x@example.com" }
        }))
        .unwrap();
        assert_eq!(
            tagged.into_bundle("x@example.com"),
            Err(PortError::NoApplications("x@example.com".into()))
        );

        let config: BackendResponse = serde_json::from_value(json!({
            "error": "Configuration Error",
            "message": "Students tab not found in Google Sheet"
        }))
        .unwrap();
        assert!(matches!(
            config.into_bundle("x@example.com"),
            Err(PortError::Unavailable(_))
        ));
    }

    #[test]
    fn empty_success_is_no_applications() {
        let response: BackendResponse = serde_json::from_value(json!({
            "success": true,
            "student": { "email": "x@example.com" },
            "applications": []
        }))
        .unwrap();
        assert_eq!(
            response.into_bundle("x@example.com"),
            Err(PortError::NoApplications("x@example.com".into()))
        );
    }
}
