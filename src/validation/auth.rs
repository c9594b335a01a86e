use crate::error::{AppError, Result};

/// Validates a username before it is sent upstream.
///
/// # Arguments
///
/// * `username` - The username to validate.
///
/// # Returns
///
/// A `Result<()>` indicating whether the username is valid.
pub fn validate_username(username: &str) -> Result<()> {
    if username.trim().is_empty() {
        return Err(AppError::Validation("Username is required".to_string()));
    }

    if username.len() > 255 {
        return Err(AppError::Validation(
            "Username must be at most 255 characters".to_string(),
        ));
    }

    if username.chars().any(char::is_control) {
        return Err(AppError::Validation(
            "Username contains invalid characters".to_string(),
        ));
    }

    Ok(())
}

/// Validates a password before it is sent upstream.
///
/// # Arguments
///
/// * `password` - The password to validate.
///
/// # Returns
///
/// A `Result<()>` indicating whether the password is valid.
pub fn validate_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(AppError::Validation("Password is required".to_string()));
    }

    if password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be at most 128 characters".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames() {
        assert!(validate_username("dispatcher_01").is_ok());
        assert!(validate_username("  ").is_err());
        assert!(validate_username(&"x".repeat(256)).is_err());
        assert!(validate_username("bad\nname").is_err());
    }

    #[test]
    fn passwords() {
        assert!(validate_password("s3cret").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password(&"p".repeat(129)).is_err());
    }
}
