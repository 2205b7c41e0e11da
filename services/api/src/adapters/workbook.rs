//! services/api/src/adapters/workbook.rs
//!
//! This module contains the spreadsheet adapter, which is the concrete implementation
//! of the `StudentDataSource` and `LeadSink` ports backed by a multi-sheet workbook
//! stored as JSON on local disk.
//!
//! Each sheet is a list of rows, the first row being a header. Columns are positional:
//!
//! - `Students`: email, name, phone, counselorName, counselorEmail, counselorPhone,
//!   registrationDate, notes
//! - `Applications`: studentEmail, applicationId, country, university, course, intake,
//!   currentStep, overallStatus, startDate, lastUpdated, notes
//! - `Milestones`: applicationId, stepNumber, stepName, status, date, notes
//! - `Documents`: applicationId, name, status, submittedDate, notes
//! - `Leads`: submittedAt, name, email, phone, destination, course, message, id

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use journey_core::domain::{non_blank, parse_sheet_date};
use journey_core::ports::{LeadSink, PortError, PortResult, StudentDataSource};
use journey_core::{
    Application, Counselor, Document, DocumentStatus, Lead, Milestone, MilestoneStatus,
    OverallStatus, StepNumber, StudentBundle, StudentProfile,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::adapters::cells::{cell_text, milestone_step};

pub const STUDENTS_SHEET: &str = "Students";
pub const APPLICATIONS_SHEET: &str = "Applications";
pub const MILESTONES_SHEET: &str = "Milestones";
pub const DOCUMENTS_SHEET: &str = "Documents";
pub const LEADS_SHEET: &str = "Leads";

const LEADS_HEADER: [&str; 8] = [
    "Submitted At",
    "Name",
    "Email",
    "Phone",
    "Destination",
    "Course",
    "Message",
    "Lead ID",
];

//=========================================================================================
// Workbook Representation
//=========================================================================================

/// The raw, untyped workbook as exported from the spreadsheet.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    pub sheets: BTreeMap<String, Vec<Vec<Value>>>,
}

impl Workbook {
    /// Data rows of a sheet, header excluded. `None` when the sheet does not exist.
    pub fn data_rows(&self, sheet: &str) -> Option<&[Vec<Value>]> {
        self.sheets
            .get(sheet)
            .map(|rows| rows.get(1..).unwrap_or_default())
    }

    fn append_row(&mut self, sheet: &str, header: &[&str], row: Vec<Value>) {
        let rows = self.sheets.entry(sheet.to_string()).or_default();
        if rows.is_empty() {
            rows.push(header.iter().map(|h| Value::from(*h)).collect());
        }
        rows.push(row);
    }
}

fn cell(row: &[Value], index: usize) -> String {
    row.get(index).map(cell_text).unwrap_or_default()
}

fn opt_cell(row: &[Value], index: usize) -> Option<String> {
    non_blank(Some(cell(row, index)))
}

fn same_email(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

//=========================================================================================
// Row Normalization
//=========================================================================================

fn student_from_row(row: &[Value]) -> StudentProfile {
    StudentProfile {
        email: cell(row, 0),
        name: cell(row, 1),
        phone: opt_cell(row, 2),
        counselor: Counselor {
            name: opt_cell(row, 3),
            email: opt_cell(row, 4),
            phone: opt_cell(row, 5),
        },
        registration_date: parse_sheet_date(&cell(row, 6)),
        notes: cell(row, 7),
    }
}

fn application_from_row(row: &[Value]) -> Application {
    Application {
        application_id: cell(row, 1),
        country: cell(row, 2),
        university: cell(row, 3),
        course: cell(row, 4),
        intake: cell(row, 5),
        current_step: StepNumber::parse(&cell(row, 6)),
        overall_status: OverallStatus::parse(&cell(row, 7)),
        start_date: parse_sheet_date(&cell(row, 8)),
        last_updated: parse_sheet_date(&cell(row, 9)),
        notes: cell(row, 10),
        milestones: Vec::new(),
        documents: Vec::new(),
    }
}

fn milestone_from_row(row: &[Value]) -> Milestone {
    Milestone {
        step_number: milestone_step(&cell(row, 1)),
        step_name: cell(row, 2),
        status: MilestoneStatus::parse(&cell(row, 3)),
        date: opt_cell(row, 4),
        notes: cell(row, 5),
    }
}

fn document_from_row(row: &[Value]) -> Document {
    Document {
        name: cell(row, 1),
        status: DocumentStatus::parse(&cell(row, 2)),
        submitted_date: opt_cell(row, 3),
        notes: cell(row, 4),
    }
}

/// Projects one student and their applications out of the workbook.
pub fn bundle_from_workbook(workbook: &Workbook, email: &str) -> PortResult<StudentBundle> {
    let students = workbook.data_rows(STUDENTS_SHEET).ok_or_else(|| {
        PortError::Unavailable(format!("{} tab not found in workbook", STUDENTS_SHEET))
    })?;

    let student = students
        .iter()
        .find(|row| same_email(&cell(row, 0), email))
        .map(|row| student_from_row(row))
        .ok_or_else(|| PortError::NotFound(email.to_string()))?;

    let applications = workbook.data_rows(APPLICATIONS_SHEET).ok_or_else(|| {
        PortError::Unavailable(format!("{} tab not found in workbook", APPLICATIONS_SHEET))
    })?;

    let mut applications: Vec<Application> = applications
        .iter()
        .filter(|row| same_email(&cell(row, 0), email))
        .map(|row| application_from_row(row))
        .collect();

    if applications.is_empty() {
        return Err(PortError::NoApplications(email.to_string()));
    }

    let milestones = workbook.data_rows(MILESTONES_SHEET).unwrap_or_default();
    let documents = workbook.data_rows(DOCUMENTS_SHEET).unwrap_or_default();

    for app in &mut applications {
        app.milestones = milestones
            .iter()
            .filter(|row| cell(row, 0) == app.application_id)
            .map(|row| milestone_from_row(row))
            .collect();
        // Stable, so duplicates for one step keep their row order.
        app.milestones.sort_by_key(|m| m.step_number);

        app.documents = documents
            .iter()
            .filter(|row| cell(row, 0) == app.application_id)
            .map(|row| document_from_row(row))
            .collect();
    }

    Ok(StudentBundle {
        student,
        applications,
    })
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A workbook-backed adapter that implements the `StudentDataSource` and `LeadSink` ports.
pub struct WorkbookAdapter {
    path: PathBuf,
    workbook: RwLock<Workbook>,
}

impl WorkbookAdapter {
    /// Creates an adapter over an already-loaded workbook. Leads are written back to `path`.
    pub fn new(path: impl Into<PathBuf>, workbook: Workbook) -> Self {
        Self {
            path: path.into(),
            workbook: RwLock::new(workbook),
        }
    }

    /// Reads and parses the workbook file at startup.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let workbook: Workbook = serde_json::from_slice(&bytes)?;
        info!(
            "Loaded workbook from {} with {} sheet(s)",
            path.display(),
            workbook.sheets.len()
        );
        Ok(Self::new(path, workbook))
    }

    async fn persist(&self, workbook: &Workbook) -> PortResult<()> {
        let json = serde_json::to_vec_pretty(workbook)
            .map_err(|e| PortError::Unavailable(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| PortError::Unavailable(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| PortError::Unavailable(e.to_string()))?;
        Ok(())
    }
}

//=========================================================================================
// Port Implementations
//=========================================================================================

#[async_trait]
impl StudentDataSource for WorkbookAdapter {
    async fn fetch_student_bundle(&self, email: &str) -> PortResult<StudentBundle> {
        let workbook = self.workbook.read().await;
        bundle_from_workbook(&workbook, email)
    }
}

#[async_trait]
impl LeadSink for WorkbookAdapter {
    async fn submit_lead(&self, lead: &Lead) -> PortResult<()> {
        let text = |v: &Option<String>| Value::from(v.clone().unwrap_or_default());
        let row = vec![
            Value::from(lead.submitted_at.to_rfc3339()),
            Value::from(lead.name.clone()),
            Value::from(lead.email.clone()),
            Value::from(lead.phone.clone()),
            text(&lead.destination),
            text(&lead.course),
            text(&lead.message),
            Value::from(lead.id.to_string()),
        ];

        // The in-memory sheet only changes once the file write has succeeded.
        let mut workbook = self.workbook.write().await;
        let mut updated = workbook.clone();
        updated.append_row(LEADS_SHEET, &LEADS_HEADER, row);
        if let Err(e) = self.persist(&updated).await {
            warn!("Lead {} not recorded: {}", lead.id, e);
            return Err(e);
        }
        *workbook = updated;
        info!("Recorded lead {} in {} sheet", lead.id, LEADS_SHEET);
        Ok(())
    }
}
