//! Member account forms.

use serde::{Deserialize, Serialize};

use crate::constants::{MIN_PASSWORD_LEN, MIN_USERNAME_LEN};
use crate::error::ValidationError;
use crate::schema::{require_email, require_non_blank};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterForm {
    pub email: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank(&[
            ("email", &self.email),
            ("username", &self.username),
            ("password", &self.password),
            ("confirmPassword", &self.confirm_password),
        ])?;
        require_email("email", &self.email)?;
        if self.username.trim().chars().count() < MIN_USERNAME_LEN {
            return Err(ValidationError::invalid(
                "username",
                format!("must be at least {MIN_USERNAME_LEN} characters"),
            ));
        }
        // Logins containing '@' are looked up by email.
        if self.username.contains('@') {
            return Err(ValidationError::invalid("username", "must not contain '@'"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::invalid(
                "password",
                format!("must be at least {MIN_PASSWORD_LEN} characters"),
            ));
        }
        if self.password != self.confirm_password {
            return Err(ValidationError::invalid(
                "confirmPassword",
                "passwords do not match",
            ));
        }
        Ok(())
    }
}

/// Log in with either the email address or the username.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub login: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank(&[("login", &self.login), ("password", &self.password)])
    }
}

/// Public view of a member account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub created_at: String,
}
