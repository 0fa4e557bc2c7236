use app_error::{AppResult, validation_error};
use app_models::ContactInput;

use super::user_account::sanitize_string;

pub const MAX_CONTACT_FIELD_LENGTH: usize = 50;
pub const MAX_ADDITIONAL_DATA_LENGTH: usize = 250;

fn bounded(field: &str, value: &str, max: usize, required: bool) -> AppResult<String> {
    let value = sanitize_string(value);

    if required && value.is_empty() {
        return validation_error!(field, "cannot be empty");
    }

    if value.chars().count() > max {
        return validation_error!(field, format!("cannot exceed {} characters", max));
    }

    Ok(value)
}

/// Trimmed copy of `input`, or the first field that breaks its length limit
pub fn validate_contact(input: ContactInput) -> AppResult<ContactInput> {
    let additional_data = match input.additional_data {
        Some(data) => Some(bounded(
            "additional_data",
            &data,
            MAX_ADDITIONAL_DATA_LENGTH,
            false,
        )?),
        None => None,
    }
    .filter(|data| !data.is_empty());

    Ok(ContactInput {
        first_name: bounded("first_name", &input.first_name, MAX_CONTACT_FIELD_LENGTH, true)?,
        last_name: bounded("last_name", &input.last_name, MAX_CONTACT_FIELD_LENGTH, true)?,
        email: bounded("email", &input.email, MAX_CONTACT_FIELD_LENGTH, true)?,
        phone: bounded("phone", &input.phone, MAX_CONTACT_FIELD_LENGTH, true)?,
        birthday: input.birthday,
        additional_data,
    })
}
