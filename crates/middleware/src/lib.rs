pub mod api_middleware;
pub mod security;
pub mod validation;

pub use api_middleware::{AuthUser, BearerToken};
pub use security::{Claims, JwtService};
