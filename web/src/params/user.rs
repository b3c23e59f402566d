use domain::users::Role;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

/// Self-service registration payload.
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct CreateParams {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

/// Mutable profile fields. Omitted fields are cleared, not preserved.
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct UpdateProfileParams {
    pub display_name: Option<String>,
    pub nickname: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct UpdateRoleParams {
    pub role: Role,
}
