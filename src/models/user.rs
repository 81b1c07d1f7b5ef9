use serde::{Deserialize, Serialize};

use crate::error::{ClientError, FieldError};
use crate::session::CredentialPair;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub currency: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// Registration form state. Password confirmation belongs here only; it is
/// checked locally and never sent.
#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub first_name: String,
    pub last_name: String,
    pub currency: Option<String>,
}

pub const MIN_PASSWORD_LEN: usize = 6;

impl RegisterForm {
    pub fn validate(self) -> Result<RegisterInput, ClientError> {
        let mut errors = Vec::new();

        if !looks_like_email(&self.email) {
            errors.push(field("email", "Invalid email address"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(field("password", "Password must be at least 6 characters"));
        }
        if self.password != self.confirm_password {
            errors.push(field("confirmPassword", "Passwords do not match"));
        }
        if self.first_name.trim().is_empty() {
            errors.push(field("first_name", "First name is required"));
        }
        if self.last_name.trim().is_empty() {
            errors.push(field("last_name", "Last name is required"));
        }

        if !errors.is_empty() {
            return Err(ClientError::validation("Please fix the highlighted fields", errors));
        }

        Ok(RegisterInput {
            email: self.email.trim().to_string(),
            password: self.password,
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            currency: self.currency.filter(|c| !c.trim().is_empty()),
        })
    }
}

fn field(name: &str, message: &str) -> FieldError {
    FieldError {
        field: name.to_string(),
        message: message.to_string(),
    }
}

pub(crate) fn looks_like_email(value: &str) -> bool {
    let value = value.trim();
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// `data` of a successful login or registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: User,
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

impl AuthSession {
    pub fn credentials(&self) -> CredentialPair {
        CredentialPair::new(self.access_token.clone(), self.refresh_token.clone())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}
