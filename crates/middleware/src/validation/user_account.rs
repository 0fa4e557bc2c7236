use app_config::PasswordConfig;
use app_error::{AppResult, validation_error};
use lazy_static::lazy_static;
use regex::Regex;

pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MAX_USERNAME_LENGTH: usize = 50;

lazy_static! {
    // Lower-case local part and dotted domain with an alphabetic TLD
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-z0-9_+\-]([a-z0-9_+.\-]*[a-z0-9_+\-])?@[a-z0-9]+([\-.][a-z0-9]+)*\.[a-z]{2,}$"
    ).unwrap();
}

/// Trim and lower-case an email, then check its shape
pub fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();

    if email.is_empty() {
        return validation_error!("email", "Email cannot be empty");
    }

    if email.chars().count() > MAX_EMAIL_LENGTH {
        return validation_error!(
            "email",
            format!("Email cannot exceed {} characters", MAX_EMAIL_LENGTH)
        );
    }

    if !EMAIL_REGEX.is_match(&email) {
        return validation_error!("email", "Invalid email format");
    }

    Ok(email)
}

/// Trimmed username, 1 to 50 characters
pub fn normalize_username(username: &str) -> AppResult<String> {
    let username = sanitize_string(username);

    if username.is_empty() {
        return validation_error!("username", "Username cannot be empty");
    }

    if username.chars().count() > MAX_USERNAME_LENGTH {
        return validation_error!(
            "username",
            format!("Username cannot exceed {} characters", MAX_USERNAME_LENGTH)
        );
    }

    Ok(username)
}

/// Checks length bounds and whichever character classes `rules` require.
/// The password itself is never trimmed.
pub fn validate_password(password: &str, rules: &PasswordConfig) -> AppResult<()> {
    let length = password.chars().count();

    if password.trim().is_empty() {
        return validation_error!("password", "Password cannot be empty");
    }

    if length < rules.min_length {
        return validation_error!(
            "password",
            format!("Password must be at least {} characters long", rules.min_length)
        );
    }

    if length > rules.max_length {
        return validation_error!(
            "password",
            format!("Password cannot exceed {} characters", rules.max_length)
        );
    }

    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace());

    let mut missing = Vec::new();

    if rules.require_lowercase && !has_lowercase {
        missing.push("lowercase letter");
    }

    if rules.require_uppercase && !has_uppercase {
        missing.push("uppercase letter");
    }

    if rules.require_number && !has_digit {
        missing.push("number");
    }

    if rules.require_special && !has_special {
        missing.push("special character");
    }

    if !missing.is_empty() {
        return validation_error!(
            "password",
            format!("Password must contain at least one {}", missing.join(", one "))
        );
    }

    Ok(())
}

pub fn sanitize_string(input: &str) -> String {
    input.trim().to_string()
}
