use axum::Extension;

use crate::auth::Identity;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /auth/whoami - the identity carried by the caller's token
///
/// Authorization required: logged in
pub async fn whoami(Extension(identity): Extension<Identity>) -> ApiResult<Identity> {
    Ok(ApiResponse::success(identity))
}
