pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::user::PublicUser;

// Re-export necessary items
pub use extractors::AuthenticatedUser;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{extract_from_header, Claims, TokenError, TokenService};

lazy_static! {
    static ref HAS_LOWERCASE: regex::Regex = regex::Regex::new(r"[a-z]").unwrap();
    static ref HAS_UPPERCASE: regex::Regex = regex::Regex::new(r"[A-Z]").unwrap();
    static ref HAS_DIGIT: regex::Regex = regex::Regex::new(r"\d").unwrap();
}

/// Passwords must carry at least one lowercase letter, one uppercase letter
/// and one digit. Length is checked separately by the `length` rule.
fn password_strength(password: &str) -> Result<(), ValidationError> {
    if !HAS_LOWERCASE.is_match(password)
        || !HAS_UPPERCASE.is_match(password)
        || !HAS_DIGIT.is_match(password)
    {
        return Err(ValidationError::new(
            "password must contain a lowercase letter, an uppercase letter and a digit",
        ));
    }
    Ok(())
}

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// User's email address.
    #[validate(email)]
    pub email: String,
    /// User's password. Only presence is validated here; the stored hash
    /// decides.
    #[validate(length(min = 1))]
    pub password: String,
}

/// Represents the payload for a new user registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name for the new account, 2 to 100 characters.
    #[validate(length(min = 2, max = 100))]
    pub name: String,
    /// Email address for the new account.
    #[validate(email)]
    pub email: String,
    /// Password for the new account. At least 8 characters with a lowercase
    /// letter, an uppercase letter and a digit.
    #[validate(length(min = 8), custom = "password_strength")]
    pub password: String,
}

/// Response structure after successful authentication (login or registration).
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Public projection of the authenticated user.
    pub user: PublicUser,
    /// The JWT (JSON Web Token) for session authentication.
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_login_request_validation() {
        let valid_login = LoginRequest {
            email: "test@example.com".to_string(),
            password: "Password123".to_string(),
        };
        assert!(valid_login.validate().is_ok());

        let invalid_email_login = LoginRequest {
            email: "testexample.com".to_string(),
            password: "Password123".to_string(),
        };
        assert!(invalid_email_login.validate().is_err());

        let empty_password_login = LoginRequest {
            email: "test@example.com".to_string(),
            password: "".to_string(),
        };
        assert!(empty_password_login.validate().is_err());
    }

    #[test]
    fn test_register_request_validation() {
        let valid_register = RegisterRequest {
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            password: "Password123".to_string(),
        };
        assert!(valid_register.validate().is_ok());

        let short_name = RegisterRequest {
            name: "T".to_string(),
            email: "test@example.com".to_string(),
            password: "Password123".to_string(),
        };
        assert!(short_name.validate().is_err());

        let short_password = RegisterRequest {
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            password: "Pw1".to_string(),
        };
        assert!(short_password.validate().is_err());
    }

    #[test]
    fn test_password_strength_rules() {
        // Long enough but missing a character class each.
        for weak in ["alllowercase1", "ALLUPPERCASE1", "NoDigitsHere"] {
            let request = RegisterRequest {
                name: "Test User".to_string(),
                email: "test@example.com".to_string(),
                password: weak.to_string(),
            };
            assert!(
                request.validate().is_err(),
                "password {:?} should be rejected",
                weak
            );
        }

        assert!(password_strength("Sufficient1").is_ok());
    }
}
