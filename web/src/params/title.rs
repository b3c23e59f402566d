use serde::Deserialize;
use utoipa::IntoParams;

/// Catalog listing filter.
#[derive(Debug, Deserialize, IntoParams)]
pub struct IndexParams {
    /// Case-insensitive substring match on the title name.
    pub search: Option<String>,
}
