//! Custom Axum extractors.
//!
//! - [`CorrelationId`]: the request's correlation id
//! - [`Caller`]: the identity asserted by the authenticating front proxy
//!
//! # Examples
//!
//! ```ignore
//! use conference_web::extractors::{Caller, CorrelationId};
//!
//! async fn handler(
//!     State(app): State<AppState>,
//!     correlation_id: CorrelationId,
//!     caller: Caller,
//! ) -> Result<Json<Profile>, AppError> {
//!     tracing::info!(correlation_id = %correlation_id.0, "Saving profile");
//!     Ok(Json(app.service.save_profile(caller.identity(), form).await?))
//! }
//! ```

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use conference_core::types::Identity;
use uuid::Uuid;

use crate::middleware::CORRELATION_ID_HEADER;

/// Header carrying the authenticated user id
pub const USER_ID_HEADER: &str = "X-Authenticated-User-Id";

/// Header carrying the authenticated user's email
pub const USER_EMAIL_HEADER: &str = "X-Authenticated-User-Email";

/// Correlation ID for request tracing.
///
/// Uses the id stored by the correlation middleware when installed,
/// otherwise the `X-Correlation-ID` header, otherwise a fresh UUID v4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Self>()
            .copied()
            .unwrap_or_else(|| Self::from_headers(&parts.headers)))
    }
}

impl CorrelationId {
    /// Reads `X-Correlation-ID`; a missing or non-UUID value yields a new id
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let supplied = headers
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s.trim()).ok());
        Self(supplied.unwrap_or_else(Uuid::new_v4))
    }
}

/// The caller of an endpoint, if authenticated.
///
/// Authentication happens in front of this service; the proxy forwards the
/// verified user id and email as trusted headers. Both must be present and
/// non-blank, otherwise the request is anonymous. Endpoints that need an
/// identity reject anonymous callers themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller(pub Option<Identity>);

impl Caller {
    /// The authenticated identity, if any
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        self.0.as_ref()
    }

    /// Reads the caller from request headers
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        Self(
            header(USER_ID_HEADER)
                .zip(header(USER_EMAIL_HEADER))
                .map(|(user_id, email)| Identity::new(user_id, email)),
        )
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}
