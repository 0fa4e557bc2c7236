//! User-facing response texts.

pub const ALREADY_EXISTS: &str = "Account already exists";
pub const SUCCESS_CREATE_USER: &str = "User successfully created. Check your email for confirmation.";
pub const INVALID_EMAIL: &str = "Invalid email";
pub const INVALID_PASSWORD: &str = "Invalid password";
pub const EMAIL_NOT_CONFIRMED: &str = "Email not confirmed";
pub const INVALID_TOKEN: &str = "Invalid refresh token";
pub const INVALID_EMAIL_TOKEN: &str = "Invalid token for email verification";
pub const VERIFICATION_ERROR: &str = "Verification error";
pub const EMAIL_CONFIRMED: &str = "Email confirmed";
pub const EMAIL_ALREADY_CONFIRMED: &str = "Your email is already confirmed";
pub const CHECK_EMAIL: &str = "Check your email for confirmation.";
pub const LOGGED_OUT: &str = "Logged out";
