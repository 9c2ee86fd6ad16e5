use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::{async_trait, RequestPartsExt};
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::auth::error::AuthError;
use crate::server::state::AppState;

/// Extractor gate for the admin endpoints: a bearer key matched against the
/// configured value in constant time.
pub struct AdminKey;

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminKey {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|e| {
                debug!("missing or malformed admin auth header: {e}");
                AuthError::MissingKey
            })?;
        let supplied = bearer.token().as_bytes();
        let expected = state.config.server.admin_key.as_bytes();
        if bool::from(supplied.ct_eq(expected)) {
            Ok(AdminKey)
        } else {
            debug!("admin key mismatch");
            Err(AuthError::BadKey)
        }
    }
}
