use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct IndexParams {
    /// Include unpublished chapters; honored only for moderators and admins.
    #[serde(default)]
    pub include_unpublished: bool,
}
