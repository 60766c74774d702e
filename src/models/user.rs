// src/models/user.rs

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{6}$").expect("code pattern is valid"));

/// Represents the 'user_list' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    /// UUID assigned on first login.
    pub id: String,

    pub email: String,

    /// 0 = learner.
    pub role_id: i32,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for requesting a login code.
#[derive(Debug, Deserialize, Validate)]
pub struct SendCodeRequest {
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
}

/// DTO for logging in with an emailed code.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address."))]
    pub email: String,

    #[validate(regex(path = *CODE_RE, message = "Code must be 6 digits."))]
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_request_validation() {
        let ok = LoginRequest {
            email: "learner@example.com".to_string(),
            code: "012345".to_string(),
        };
        assert!(ok.validate().is_ok());

        let bad_code = LoginRequest {
            email: "learner@example.com".to_string(),
            code: "12ab56".to_string(),
        };
        assert!(bad_code.validate().is_err());

        let bad_email = SendCodeRequest {
            email: "not-an-email".to_string(),
        };
        assert!(bad_email.validate().is_err());
    }
}
