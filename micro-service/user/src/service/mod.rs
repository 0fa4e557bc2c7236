pub mod auth;
pub mod contacts;

pub use auth::{AuthService, AuthServiceTrait};
pub use contacts::ContactService;
