use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use super::auth::SESSION_USER_ID;

/// Page paths reachable without a session.
pub const PUBLIC_PATHS: &[&str] = &["/login", "/register", "/auth/callback"];

/// Where a page request should go, given the path and session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Serve the requested page.
    Allow,
    /// No session on a protected page: bounce to login, remembering the
    /// requested path so login can return there.
    ToLogin { redirect: String },
    /// Already signed in on an auth page: nothing to do there, go home.
    ToHome,
}

/// Pure routing decision, kept free of session plumbing so it can be tested
/// exhaustively. Unknown paths count as protected.
#[must_use]
pub fn decide(path: &str, has_session: bool) -> GuardDecision {
    let public = PUBLIC_PATHS
        .iter()
        .any(|p| path == *p || path.strip_prefix(p).is_some_and(|rest| rest.starts_with('/')));

    match (public, has_session) {
        (true, true) => GuardDecision::ToHome,
        (true, false) => GuardDecision::Allow,
        (false, true) => GuardDecision::Allow,
        (false, false) => GuardDecision::ToLogin {
            redirect: path.to_string(),
        },
    }
}

/// Middleware applied to the page fallback. API routes are guarded
/// separately; this only shapes browser navigation.
///
/// A session read failure counts as "no session": a broken cookie must
/// never grant access to a protected page.
pub async fn page_guard(session: Session, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();

    let has_session = matches!(session.get::<i32>(SESSION_USER_ID).await, Ok(Some(_)));

    match decide(&path, has_session) {
        GuardDecision::Allow => next.run(request).await,
        GuardDecision::ToLogin { redirect } => {
            let target = format!("/login?redirect={}", urlencoding::encode(&redirect));
            Redirect::to(&target).into_response()
        }
        GuardDecision::ToHome => Redirect::to("/").into_response(),
    }
}
