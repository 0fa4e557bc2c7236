/// Adds context to a failed database call and logs it
///
/// # Example
/// ```ignore
/// with_context!(db_operation, "Failed to fetch user data")
/// ```
#[macro_export]
macro_rules! with_context {
    ($result:expr, $context:expr) => {
        $result.map_err(|e| {
            tracing::error!("{}: {}", $context, e);
            $crate::AppError::DatabaseError(anyhow::anyhow!("{}: {}", $context, e))
        })
    };

    ($result:expr, $error_type:ident, $context:expr) => {
        $result.map_err(|e| {
            tracing::error!("{}: {}", $context, e);
            $crate::AppError::$error_type(anyhow::anyhow!("{}: {}", $context, e))
        })
    };
}

/// Simplifies creating validation errors
///
/// # Example
/// ```ignore
/// validation_error!("username", "Username cannot be empty")
/// ```
#[macro_export]
macro_rules! validation_error {
    ($field:expr, $message:expr) => {
        Err($crate::AppError::ValidationError(format!(
            "Validation failed for '{}': {}",
            $field, $message
        )))
    };
}

/// Simplifies creating authentication errors
///
/// # Example
/// ```ignore
/// auth_error!("Invalid email")
/// ```
#[macro_export]
macro_rules! auth_error {
    ($message:expr) => {
        Err($crate::AppError::AuthenticationError($message.to_string()))
    };
}
