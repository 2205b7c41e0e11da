//! crates/journey_core/src/domain.rs
//!
//! Defines the pure, core data structures for the student dashboard.
//! These structs are independent of any spreadsheet layout or serialization format.
//! Adapters normalize loosely-typed rows into these records exactly once.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use uuid::Uuid;

use crate::catalog::TOTAL_STEPS;

//=========================================================================================
// Step Numbers
//=========================================================================================

/// A journey step index, always within `1..=TOTAL_STEPS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StepNumber(u8);

impl StepNumber {
    pub const FIRST: StepNumber = StepNumber(1);
    pub const LAST: StepNumber = StepNumber(TOTAL_STEPS);

    /// Clamps a raw value into the catalog range. Missing values default to the first step.
    pub fn clamp(raw: Option<i64>) -> Self {
        match raw {
            Some(n) if n >= i64::from(TOTAL_STEPS) => Self::LAST,
            Some(n) if n >= 1 => StepNumber(n as u8),
            _ => Self::FIRST,
        }
    }

    /// Reads a step from free text the way the sheet backend does: leading integer, else step 1.
    pub fn parse(text: &str) -> Self {
        Self::clamp(parse_leading_int(text))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for StepNumber {
    fn default() -> Self {
        Self::FIRST
    }
}

impl fmt::Display for StepNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lenient integer reading: optional sign followed by digits, anything after is ignored.
/// Returns `None` when the text does not start with a number; oversized values saturate.
pub fn parse_leading_int(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
    Some(sign * magnitude)
}

/// Parses a sheet date written as `yyyy-mm-dd` or `dd-mm-yyyy`.
pub fn parse_sheet_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    // Sheets export timestamps as `2024-01-10T00:00:00.000Z`; only the date part matters.
    let date_part = trimmed.split('T').next().unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%d-%m-%Y"))
        .ok()
}

//=========================================================================================
// Status Variants
//=========================================================================================

/// The overall lifecycle state of one application.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OverallStatus {
    #[default]
    Active,
    Completed,
    OnHold,
    Cancelled,
    Other(String),
}

impl OverallStatus {
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        match trimmed.to_lowercase().as_str() {
            "" | "active" => Self::Active,
            "completed" => Self::Completed,
            "on hold" | "on-hold" | "onhold" => Self::OnHold,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Active => "Active",
            Self::Completed => "Completed",
            Self::OnHold => "On Hold",
            Self::Cancelled => "Cancelled",
            Self::Other(text) => text,
        }
    }
}

/// The recorded state of a milestone row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MilestoneStatus {
    Completed,
    InProgress,
    #[default]
    Pending,
    /// Unrecognized text. Treated as pending, but keeps its label for display.
    Other(String),
}

impl MilestoneStatus {
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        match trimmed.to_lowercase().as_str() {
            "completed" => Self::Completed,
            "in progress" | "in-progress" => Self::InProgress,
            "" | "pending" => Self::Pending,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Completed => "Completed",
            Self::InProgress => "In Progress",
            Self::Pending => "Pending",
            Self::Other(text) => text,
        }
    }
}

/// The submission state of one required document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DocumentStatus {
    Submitted,
    Approved,
    #[default]
    Pending,
    UnderReview,
    Other(String),
}

impl DocumentStatus {
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        match trimmed.to_lowercase().as_str() {
            "submitted" => Self::Submitted,
            "approved" => Self::Approved,
            "" | "pending" => Self::Pending,
            "under review" | "under-review" => Self::UnderReview,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Submitted => "Submitted",
            Self::Approved => "Approved",
            Self::Pending => "Pending",
            Self::UnderReview => "Under Review",
            Self::Other(text) => text,
        }
    }

    /// Submitted and approved documents count towards the completion ratio.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Submitted | Self::Approved)
    }
}

//=========================================================================================
// Records
//=========================================================================================

/// The counselor assigned to a student. Any field may be blank in the sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counselor {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Identifying and contact data for one applicant, keyed by email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentProfile {
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub counselor: Counselor,
    pub registration_date: Option<NaiveDate>,
    pub notes: String,
}

/// A recorded journey event for one application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Milestone {
    /// May not correspond to a catalog step; `0` when the sheet value was unreadable.
    pub step_number: u32,
    pub step_name: String,
    pub status: MilestoneStatus,
    /// Kept verbatim; localization is a presentation concern.
    pub date: Option<String>,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    pub status: DocumentStatus,
    pub submitted_date: Option<String>,
    pub notes: String,
}

/// One university application, with its milestones and documents attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    pub application_id: String,
    pub country: String,
    pub university: String,
    pub course: String,
    pub intake: String,
    pub current_step: StepNumber,
    pub overall_status: OverallStatus,
    pub start_date: Option<NaiveDate>,
    pub last_updated: Option<NaiveDate>,
    pub notes: String,
    pub milestones: Vec<Milestone>,
    pub documents: Vec<Document>,
}

/// Everything the dashboard needs for one signed-in student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentBundle {
    pub student: StudentProfile,
    pub applications: Vec<Application>,
}

/// The opaque identity handed over by the upstream identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaim {
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

//=========================================================================================
// Contact Leads
//=========================================================================================

const MIN_NAME_LEN: usize = 2;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

// Checked with whitespace removed.
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d\-+()]{10,}$").expect("phone pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LeadError {
    #[error("Name is required")]
    MissingName,
    #[error("Name must be at least 2 characters")]
    InvalidName,
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),
}

/// An enquiry submitted through the public contact form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub destination: Option<String>,
    pub course: Option<String>,
    pub message: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// Raw contact-form fields before validation.
#[derive(Debug, Clone, Default)]
pub struct LeadForm {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub destination: Option<String>,
    pub course: Option<String>,
    pub message: Option<String>,
}

impl Lead {
    /// Validates a contact form and stamps it with an id and submission time.
    pub fn new(form: LeadForm, submitted_at: DateTime<Utc>) -> Result<Self, LeadError> {
        let name = form.name.trim().to_string();
        if name.is_empty() {
            return Err(LeadError::MissingName);
        }
        if name.chars().count() < MIN_NAME_LEN {
            return Err(LeadError::InvalidName);
        }
        let email = form.email.trim().to_string();
        if !EMAIL_PATTERN.is_match(&email) {
            return Err(LeadError::InvalidEmail(email));
        }
        let phone = form.phone.unwrap_or_default().trim().to_string();
        let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
        if !PHONE_PATTERN.is_match(&compact) {
            return Err(LeadError::InvalidPhone(phone));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            email,
            phone,
            destination: non_blank(form.destination),
            course: non_blank(form.course),
            message: non_blank(form.message),
            submitted_at,
        })
    }
}

/// Collapses empty or whitespace-only optional text into `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_number_clamps_into_catalog_range() {
        assert_eq!(StepNumber::clamp(None).get(), 1);
        assert_eq!(StepNumber::clamp(Some(0)).get(), 1);
        assert_eq!(StepNumber::clamp(Some(-4)).get(), 1);
        assert_eq!(StepNumber::clamp(Some(4)).get(), 4);
        assert_eq!(StepNumber::clamp(Some(42)).get(), 6);
    }

    #[test]
    fn step_number_reads_leading_integer() {
        assert_eq!(StepNumber::parse("3").get(), 3);
        assert_eq!(StepNumber::parse(" 5.0 ").get(), 5);
        assert_eq!(StepNumber::parse("2nd").get(), 2);
        assert_eq!(StepNumber::parse("step 4").get(), 1);
        assert_eq!(StepNumber::parse("").get(), 1);
        assert_eq!(StepNumber::parse("99999999999999999999").get(), 6);
        assert_eq!(StepNumber::parse("-99999999999999999999").get(), 1);
    }

    #[test]
    fn leading_int_handles_signs() {
        assert_eq!(parse_leading_int("-2"), Some(-2));
        assert_eq!(parse_leading_int("+7x"), Some(7));
        assert_eq!(parse_leading_int("x7"), None);
        assert_eq!(parse_leading_int("123456789012345678901234"), Some(i64::MAX));
    }

    #[test]
    fn sheet_dates_accept_both_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 10);
        assert_eq!(parse_sheet_date("2024-01-10"), expected);
        assert_eq!(parse_sheet_date("10-01-2024"), expected);
        assert_eq!(parse_sheet_date("2024-01-10T00:00:00.000Z"), expected);
        assert_eq!(parse_sheet_date("January 10"), None);
    }

    #[test]
    fn overall_status_falls_back_to_other() {
        assert_eq!(OverallStatus::parse(""), OverallStatus::Active);
        assert_eq!(OverallStatus::parse("ON HOLD"), OverallStatus::OnHold);
        assert_eq!(OverallStatus::parse("cancelled"), OverallStatus::Cancelled);
        assert_eq!(
            OverallStatus::parse(" Deferred "),
            OverallStatus::Other("Deferred".to_string())
        );
        assert_eq!(OverallStatus::Other("Deferred".into()).label(), "Deferred");
    }

    #[test]
    fn document_completion_counts_submitted_and_approved() {
        assert!(DocumentStatus::parse("Approved").is_complete());
        assert!(DocumentStatus::parse("SUBMITTED").is_complete());
        assert!(!DocumentStatus::parse("under review").is_complete());
        assert!(!DocumentStatus::parse("rejected").is_complete());
    }

    #[test]
    fn milestone_status_keeps_unknown_labels() {
        assert_eq!(MilestoneStatus::parse("in progress"), MilestoneStatus::InProgress);
        let other = MilestoneStatus::parse("Waiting on bank");
        assert_eq!(other.label(), "Waiting on bank");
    }

    #[test]
    fn lead_requires_name_email_and_phone() {
        let now = Utc::now();
        let valid = || LeadForm {
            name: "  Asha  ".into(),
            email: "asha@example.com".into(),
            phone: Some(" +91 98765 43210 ".into()),
            destination: Some("Germany".into()),
            course: Some("  ".into()),
            ..Default::default()
        };
        let lead = Lead::new(valid(), now).unwrap();
        assert_eq!(lead.name, "Asha");
        assert_eq!(lead.phone, "+91 98765 43210");
        assert_eq!(lead.destination.as_deref(), Some("Germany"));
        assert_eq!(lead.course, None);

        let missing_name = LeadForm {
            name: " ".into(),
            ..valid()
        };
        assert_eq!(Lead::new(missing_name, now), Err(LeadError::MissingName));

        let short_name = LeadForm {
            name: " R ".into(),
            ..valid()
        };
        assert_eq!(Lead::new(short_name, now), Err(LeadError::InvalidName));

        let bad_email = LeadForm {
            email: "asha-at-example".into(),
            ..valid()
        };
        assert!(matches!(
            Lead::new(bad_email, now),
            Err(LeadError::InvalidEmail(_))
        ));

        for phone in [None, Some("abc"), Some("98765 432"), Some("98765x43210")] {
            let form = LeadForm {
                phone: phone.map(String::from),
                ..valid()
            };
            assert!(
                matches!(Lead::new(form, now), Err(LeadError::InvalidPhone(_))),
                "{phone:?} should be rejected"
            );
        }

        let formatted = LeadForm {
            phone: Some("(022) 555-0199".into()),
            ..valid()
        };
        assert!(Lead::new(formatted, now).is_ok());
    }
}
