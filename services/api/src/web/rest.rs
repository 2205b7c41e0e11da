//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::protocol::{
    ApplicationOption, ApplicationPayload, ApplicationViewPayload, BundlePayload,
    DashboardResponse, ErrorBody, ErrorKind, LeadRequest, LeadResponse, StudentPayload,
};
use crate::web::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::Utc;
use journey_core::domain::non_blank;
use journey_core::{project, select_application, IdentityClaim, Lead, LeadForm, PortError};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::{IntoParams, OpenApi};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        get_student_handler,
        dashboard_handler,
        submit_lead_handler,
    ),
    components(
        schemas(BundlePayload, DashboardResponse, ErrorBody, LeadRequest, LeadResponse)
    ),
    tags(
        (name = "Student Dashboard API", description = "Application status for study-abroad applicants.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Query Parameters and Failures
//=========================================================================================

#[derive(Deserialize, IntoParams)]
pub struct StudentQuery {
    /// The student's email address.
    pub email: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct DashboardQuery {
    /// Zero-based index of the application to display.
    pub application: Option<usize>,
}

type Failure = (StatusCode, Json<ErrorBody>);

fn failure(status: StatusCode, kind: ErrorKind, message: impl Into<String>) -> Failure {
    (status, Json(ErrorBody::new(kind, message)))
}

fn port_failure(err: &PortError) -> Failure {
    let status = match err {
        PortError::NotFound(_) | PortError::NoApplications(_) => StatusCode::NOT_FOUND,
        PortError::Unavailable(_) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(ErrorBody::from(err)))
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Fetch a student profile with all applications, milestones and documents.
///
/// Only the signed-in student's own record can be queried.
#[utoipa::path(
    get,
    path = "/api/student",
    params(
        StudentQuery,
        ("x-identity-email" = String, Header, description = "Email of the signed-in user.")
    ),
    responses(
        (status = 200, description = "Student found", body = BundlePayload),
        (status = 400, description = "Missing email parameter", body = ErrorBody),
        (status = 401, description = "No identity claim"),
        (status = 403, description = "Email does not match the signed-in user", body = ErrorBody),
        (status = 404, description = "Unknown student or no applications", body = ErrorBody),
        (status = 502, description = "Data source unavailable", body = ErrorBody)
    )
)]
pub async fn get_student_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<IdentityClaim>,
    Query(query): Query<StudentQuery>,
) -> Result<impl IntoResponse, Failure> {
    let email = non_blank(query.email).ok_or_else(|| {
        failure(
            StatusCode::BAD_REQUEST,
            ErrorKind::BadRequest,
            "Email parameter is required",
        )
    })?;
    if !email.eq_ignore_ascii_case(identity.email.trim()) {
        warn!("Rejected student lookup for an email other than the signed-in user's");
        return Err(failure(
            StatusCode::FORBIDDEN,
            ErrorKind::Forbidden,
            "You can only view your own applications.",
        ));
    }

    let bundle = app_state
        .data_source
        .fetch_student_bundle(&email)
        .await
        .map_err(|e| {
            warn!("Student lookup failed: {}", e);
            port_failure(&e)
        })?;

    info!(
        "Served {} application(s) for one student",
        bundle.applications.len()
    );
    Ok(Json(BundlePayload::from(&bundle)))
}

/// Dashboard for the signed-in student, projected for one selected application.
///
/// The identity provider forwards the signed-in user in `x-identity-*` headers.
#[utoipa::path(
    get,
    path = "/dashboard",
    params(
        DashboardQuery,
        ("x-identity-email" = String, Header, description = "Email of the signed-in user."),
        ("x-identity-name" = Option<String>, Header, description = "Display name of the signed-in user."),
        ("x-identity-avatar" = Option<String>, Header, description = "Avatar URL of the signed-in user.")
    ),
    responses(
        (status = 200, description = "Dashboard view", body = DashboardResponse),
        (status = 400, description = "Application index out of range", body = ErrorBody),
        (status = 401, description = "No identity claim"),
        (status = 404, description = "Unknown student or no applications", body = ErrorBody),
        (status = 502, description = "Data source unavailable", body = ErrorBody)
    )
)]
pub async fn dashboard_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<IdentityClaim>,
    Query(query): Query<DashboardQuery>,
) -> Result<impl IntoResponse, Failure> {
    let bundle = app_state
        .data_source
        .fetch_student_bundle(&identity.email)
        .await
        .map_err(|e| {
            warn!("Dashboard load failed: {}", e);
            port_failure(&e)
        })?;

    let index = query.application.unwrap_or(0);
    let application = select_application(&bundle.applications, index).map_err(|e| {
        error!("Rejected dashboard selection: {}", e);
        failure(StatusCode::BAD_REQUEST, ErrorKind::OutOfRange, e.to_string())
    })?;

    let view = project(application);

    let welcome_name = non_blank(Some(bundle.student.name.clone()))
        .or_else(|| identity.display_name.clone())
        .unwrap_or_else(|| "Student".to_string());

    let applications = bundle
        .applications
        .iter()
        .enumerate()
        .map(|(index, app)| ApplicationOption {
            index,
            application_id: app.application_id.clone(),
            university: app.university.clone(),
            country: app.country.clone(),
            intake: app.intake.clone(),
            overall_status: app.overall_status.label().to_string(),
        })
        .collect();

    Ok(Json(DashboardResponse {
        welcome_name,
        avatar_url: identity.avatar_url,
        student: StudentPayload::from(&bundle.student),
        applications,
        selected_index: index,
        selected: ApplicationPayload::from(application),
        view: ApplicationViewPayload::from(&view),
    }))
}

/// Submit a contact-form enquiry.
#[utoipa::path(
    post,
    path = "/leads",
    request_body = LeadRequest,
    responses(
        (status = 201, description = "Lead recorded", body = LeadResponse),
        (status = 400, description = "Malformed body, or invalid name, email or phone", body = ErrorBody),
        (status = 502, description = "Lead could not be recorded", body = ErrorBody)
    )
)]
pub async fn submit_lead_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<LeadRequest>, JsonRejection>,
) -> Result<impl IntoResponse, Failure> {
    let Json(req) = payload.map_err(|rejection| {
        warn!("Rejected lead body: {}", rejection.body_text());
        failure(
            StatusCode::BAD_REQUEST,
            ErrorKind::BadRequest,
            rejection.body_text(),
        )
    })?;
    let form = LeadForm {
        name: req.name,
        email: req.email,
        phone: req.phone,
        destination: req.destination,
        course: req.course,
        message: req.message,
    };
    let lead = Lead::new(form, Utc::now())
        .map_err(|e| failure(StatusCode::BAD_REQUEST, ErrorKind::BadRequest, e.to_string()))?;

    app_state.leads.submit_lead(&lead).await.map_err(|e| {
        error!("Failed to record lead: {}", e);
        failure(
            StatusCode::BAD_GATEWAY,
            ErrorKind::Unavailable,
            "Sorry, there was an error submitting your form. Please try again.",
        )
    })?;

    Ok((
        StatusCode::CREATED,
        Json(LeadResponse {
            id: lead.id,
            submitted_at: lead.submitted_at,
        }),
    ))
}
