//! Caller identity extractors
//!
//! The caller's role comes from the `Role` header (`community` when absent)
//! and the quest user from `X-User-Id` (`anonymous` when absent). Neither
//! is authenticated; the role only gates what the dashboards offer.
//!
//! [`role_middleware`] rejects an unknown role on every `/api` route;
//! the `Require*` extractors then gate individual handlers.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use nmon_common::models::Role;

use crate::error::ApiError;

pub const ROLE_HEADER: &str = "role";
pub const USER_ID_HEADER: &str = "x-user-id";
pub const DEFAULT_USER_ID: &str = "anonymous";

fn header_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Role of the caller; an unknown role is rejected with 403
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerRole(pub Role);

#[async_trait]
impl<S> FromRequestParts<S> for CallerRole
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match header_value(parts, ROLE_HEADER) {
            None => Ok(CallerRole(Role::Community)),
            Some(raw) => raw
                .parse::<Role>()
                .map(CallerRole)
                .map_err(|_| ApiError::Forbidden(format!("Unknown role {:?}", raw))),
        }
    }
}

/// Role check for routes open to every role
///
/// Applied as a route layer so a request with an unknown `Role` header
/// gets 403 before its handler runs.
pub async fn role_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    let (mut parts, body) = request.into_parts();
    CallerRole::from_request_parts(&mut parts, &()).await?;
    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// Caller holding the planner role
#[derive(Debug, Clone, Copy)]
pub struct RequirePlanner;

#[async_trait]
impl<S> FromRequestParts<S> for RequirePlanner
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CallerRole(role) = CallerRole::from_request_parts(parts, state).await?;
        if role.can_plan() {
            Ok(RequirePlanner)
        } else {
            Err(ApiError::Forbidden(format!(
                "Role {} may not perform this action; planner required",
                role
            )))
        }
    }
}

/// Caller allowed to read service metrics (maintainer or planner)
#[derive(Debug, Clone, Copy)]
pub struct RequireMetricsViewer;

#[async_trait]
impl<S> FromRequestParts<S> for RequireMetricsViewer
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CallerRole(role) = CallerRole::from_request_parts(parts, state).await?;
        if role.can_view_metrics() {
            Ok(RequireMetricsViewer)
        } else {
            Err(ApiError::Forbidden(format!(
                "Role {} may not view success measures",
                role
            )))
        }
    }
}

/// Quest user id from `X-User-Id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = header_value(parts, USER_ID_HEADER).unwrap_or(DEFAULT_USER_ID);
        Ok(UserId(id.to_string()))
    }
}
