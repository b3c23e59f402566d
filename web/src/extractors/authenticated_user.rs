use crate::extractors::RejectionType;
use crate::AppState;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use axum_extra::extract::CookieJar;
use domain::{users, Id};
use log::*;

pub(crate) struct AuthenticatedUser(pub users::Model);

// Resolves the session cookie into a full user model. A missing, malformed,
// expired or tampered token all reject with the same 401; the distinction is
// logged but never reported to the client. The server-side session row is
// both touched and required: a verified token whose row was deleted by logout
// or revocation no longer authenticates.
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = RejectionType;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let unauthorized = || (StatusCode::UNAUTHORIZED, "Unauthorized".to_string());

        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(&state.config.session_cookie_name)
            .map(|cookie| cookie.value().to_string())
            .ok_or_else(unauthorized)?;

        let claims =
            domain::session::verify_session(&state.config, &token).ok_or_else(unauthorized)?;

        let user_id: Id = claims.sub.parse().map_err(|_| {
            warn!("Verified session token carried an unparseable subject");
            unauthorized()
        })?;

        let user = domain::user::find_by_id(state.db_conn_ref(), user_id)
            .await
            .map_err(|_| unauthorized())?;

        let live = domain::session::touch(state.db_conn_ref(), &token)
            .await
            .map_err(|e| {
                warn!("Failed to touch session row: {e:?}");
                unauthorized()
            })?;
        if !live {
            debug!("Verified token presented for a revoked or expired session");
            return Err(unauthorized());
        }

        Ok(AuthenticatedUser(user))
    }
}
