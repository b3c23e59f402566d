use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct CreateParams {
    pub body: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct IndexParams {
    #[serde(default)]
    pub page: u64,
    #[serde(default = "crate::params::chat::default_per_page")]
    pub per_page: u64,
}
