use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Claims read from identity-provider session tokens. `sub` is the
/// provider's user id.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}
