//! services/api/src/web/middleware.rs
//!
//! Identity middleware for protecting student routes.
//!
//! The identity provider sits upstream of this service and forwards the verified
//! claim in request headers.

use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use journey_core::domain::non_blank;
use journey_core::IdentityClaim;
use tracing::warn;

pub const IDENTITY_EMAIL_HEADER: &str = "x-identity-email";
pub const IDENTITY_NAME_HEADER: &str = "x-identity-name";
pub const IDENTITY_AVATAR_HEADER: &str = "x-identity-avatar";

fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    let value = headers.get(name).and_then(|v| v.to_str().ok());
    non_blank(value.map(str::to_string))
}

/// Reads the identity claim from forwarded headers. `None` without an email.
pub fn identity_from_headers(headers: &HeaderMap) -> Option<IdentityClaim> {
    let email = header_text(headers, IDENTITY_EMAIL_HEADER)?;
    Some(IdentityClaim {
        email,
        display_name: header_text(headers, IDENTITY_NAME_HEADER),
        avatar_url: header_text(headers, IDENTITY_AVATAR_HEADER),
    })
}

/// Middleware that extracts the identity claim.
///
/// If present, inserts the `IdentityClaim` into request extensions for handlers to use.
/// If missing, returns 401 Unauthorized.
pub async fn require_identity(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let claim = identity_from_headers(req.headers()).ok_or_else(|| {
        warn!("Rejected request without an identity claim");
        StatusCode::UNAUTHORIZED
    })?;

    req.extensions_mut().insert(claim);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn requires_an_email_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(identity_from_headers(&headers), None);

        headers.insert(IDENTITY_EMAIL_HEADER, HeaderValue::from_static("  "));
        assert_eq!(identity_from_headers(&headers), None);

        headers.insert(IDENTITY_EMAIL_HEADER, HeaderValue::from_static("asha@example.com"));
        headers.insert(IDENTITY_NAME_HEADER, HeaderValue::from_static("Asha"));
        let claim = identity_from_headers(&headers).unwrap();
        assert_eq!(claim.email, "asha@example.com");
        assert_eq!(claim.display_name.as_deref(), Some("Asha"));
        assert_eq!(claim.avatar_url, None);
    }
}
