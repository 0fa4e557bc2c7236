pub mod contact;
pub mod user_account;

pub use contact::validate_contact;
pub use user_account::{normalize_email, normalize_username, sanitize_string, validate_password};
