//! services/api/src/adapters/remote.rs
//!
//! Adapter for a remotely hosted spreadsheet script that answers the backend query
//! contract (`GET ?email=`). It implements the `StudentDataSource` port, and the
//! `LeadSink` port when a leads endpoint is configured.

use std::time::Duration;

use async_trait::async_trait;
use journey_core::ports::{LeadSink, PortError, PortResult, StudentDataSource};
use journey_core::{Lead, StudentBundle};
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info};

use crate::web::protocol::BackendResponse;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct RemoteAdapter {
    client: Client,
    backend_url: String,
    leads_url: Option<String>,
}

impl RemoteAdapter {
    /// Creates a new `RemoteAdapter` with a per-request timeout.
    pub fn new(
        backend_url: String,
        leads_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            backend_url,
            leads_url,
        })
    }
}

/// The body posted to the leads endpoint, matching the contact form fields.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LeadBody<'a> {
    id: String,
    name: &'a str,
    email: &'a str,
    phone: &'a str,
    destination: &'a str,
    course: &'a str,
    message: &'a str,
    submitted_at: String,
}

impl<'a> From<&'a Lead> for LeadBody<'a> {
    fn from(lead: &'a Lead) -> Self {
        Self {
            id: lead.id.to_string(),
            name: &lead.name,
            email: &lead.email,
            phone: &lead.phone,
            destination: lead.destination.as_deref().unwrap_or_default(),
            course: lead.course.as_deref().unwrap_or_default(),
            message: lead.message.as_deref().unwrap_or_default(),
            submitted_at: lead.submitted_at.to_rfc3339(),
        }
    }
}

fn unavailable(context: &str, e: reqwest::Error) -> PortError {
    error!("{}: {}", context, e);
    PortError::Unavailable(format!("{}: {}", context, e))
}

//=========================================================================================
// Port Implementations
//=========================================================================================

#[async_trait]
impl StudentDataSource for RemoteAdapter {
    async fn fetch_student_bundle(&self, email: &str) -> PortResult<StudentBundle> {
        info!("Fetching student bundle from remote backend");
        let response = self
            .client
            .get(&self.backend_url)
            .query(&[("email", email)])
            .send()
            .await
            .map_err(|e| unavailable("Backend request failed", e))?
            .error_for_status()
            .map_err(|e| unavailable("Backend returned an error status", e))?;

        let body: BackendResponse = response
            .json()
            .await
            .map_err(|e| unavailable("Backend response was not readable", e))?;

        body.into_bundle(email)
    }
}

#[async_trait]
impl LeadSink for RemoteAdapter {
    async fn submit_lead(&self, lead: &Lead) -> PortResult<()> {
        let url = self
            .leads_url
            .as_deref()
            .ok_or_else(|| PortError::Unavailable("no leads endpoint configured".to_string()))?;

        self.client
            .post(url)
            .json(&LeadBody::from(lead))
            .send()
            .await
            .map_err(|e| unavailable("Lead submission failed", e))?
            .error_for_status()
            .map_err(|e| unavailable("Leads endpoint returned an error status", e))?;

        info!("Forwarded lead {} to remote endpoint", lead.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
    use chrono::Utc;
    use journey_core::LeadForm;
    use serde_json::json;
    use std::collections::HashMap;

    fn ravi() -> Lead {
        Lead::new(
            LeadForm {
                name: "Ravi".into(),
                email: "ravi@example.com".into(),
                phone: Some("+91 98765 43210".into()),
                course: Some("MBA".into()),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap()
    }

    async fn echo_student(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
        let email = params.get("email").cloned().unwrap_or_default();
        Json(json!({
            "success": true,
            "student": { "email": email, "name": "Ravi Kumar" },
            "applications": [
                { "applicationId": "APP-7", "university": "TCD", "currentStep": "3" }
            ]
        }))
    }

    async fn account_not_found() -> impl IntoResponse {
        Json(json!({
            "error": "Account Not Found",
            "message": "No account found for this email."
        }))
    }

    /// Serves a stand-in sheet script on an ephemeral port and returns its base URL.
    async fn spawn_backend() -> String {
        let app = Router::new()
            .route("/exec", get(echo_student))
            .route("/missing", get(account_not_found))
            .route("/broken", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
            .route("/garbled", get(|| async { "<html>Service error</html>" }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn adapter_for(url: String) -> RemoteAdapter {
        RemoteAdapter::new(url, None, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn fetches_bundle_with_encoded_email() {
        let base = spawn_backend().await;
        let adapter = adapter_for(format!("{}/exec", base));

        let bundle = adapter
            .fetch_student_bundle("ravi+intake@example.com")
            .await
            .unwrap();
        assert_eq!(bundle.student.email, "ravi+intake@example.com");
        assert_eq!(bundle.student.name, "Ravi Kumar");
        assert_eq!(bundle.applications.len(), 1);
        assert_eq!(bundle.applications[0].current_step.get(), 3);
    }

    #[tokio::test]
    async fn backend_error_body_maps_to_port_error() {
        let base = spawn_backend().await;
        let adapter = adapter_for(format!("{}/missing", base));
        assert_eq!(
            adapter.fetch_student_bundle("ghost@example.com").await,
            Err(PortError::NotFound("ghost@example.com".into()))
        );
    }

    #[tokio::test]
    async fn failing_or_unreadable_backend_is_unavailable() {
        let base = spawn_backend().await;
        for path in ["broken", "garbled", "nowhere"] {
            let adapter = adapter_for(format!("{}/{}", base, path));
            assert!(
                matches!(
                    adapter.fetch_student_bundle("ravi@example.com").await,
                    Err(PortError::Unavailable(_))
                ),
                "/{path} should be unavailable"
            );
        }
    }

    #[tokio::test]
    async fn lead_without_endpoint_is_unavailable() {
        let adapter = adapter_for("http://127.0.0.1:9/exec".to_string());
        assert!(matches!(
            adapter.submit_lead(&ravi()).await,
            Err(PortError::Unavailable(_))
        ));
    }

    #[test]
    fn lead_body_uses_form_field_names() {
        let lead = ravi();
        let json = serde_json::to_value(LeadBody::from(&lead)).unwrap();
        assert_eq!(json["name"], "Ravi");
        assert_eq!(json["course"], "MBA");
        assert_eq!(json["phone"], "+91 98765 43210");
        assert_eq!(json["destination"], "");
        assert!(json["submittedAt"].is_string());
    }
}
