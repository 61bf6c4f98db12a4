pub mod auth;
pub mod response;

pub use auth::{authenticate, ensure_group_admin, ensure_logged_in, ensure_site_admin, GroupPath};
pub use response::{ApiResponse, ApiResult};
