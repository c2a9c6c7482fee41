pub mod auth;
pub mod response;
pub mod sanitize;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use response::{ApiResponse, ApiResult, Pagination};
pub use sanitize::{sanitize_middleware, sanitize_string, sanitize_value};
