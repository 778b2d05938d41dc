//! Request schemas and the explicit validation functions that check them.
//!
//! Every payload field is optional at the serde layer so that a missing field is
//! reported as a field error instead of a deserialization failure. Each
//! `validate` returns either the checked values or a [`FieldErrors`] map keyed by
//! field name, with `non_field_errors` for failures not tied to one field.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const NON_FIELD_ERRORS: &str = "non_field_errors";

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";
const INVALID_EMAIL: &str = "Enter a valid email address.";
pub const EMAIL_TAKEN: &str = "user with this email already exists.";

pub const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_EMAIL_LENGTH: usize = 254;
const MAX_NAME_LENGTH: usize = 150;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("email regex is valid")
});

const COMMON_PASSWORDS: &[&str] = &[
    "password",
    "password1",
    "password123",
    "password123!",
    "12345678",
    "123456789",
    "1234567890",
    "qwertyuiop",
    "qwerty123",
    "iloveyou",
    "sunshine",
    "princess",
    "football",
    "baseball",
    "welcome1",
    "admin123",
    "letmein1",
    "passw0rd",
    "trustno1",
    "abc12345",
];

/// Field-keyed validation errors, serialized as `{"field": ["message", ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn non_field(message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(NON_FIELD_ERRORS, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// `Ok(value)` when no errors were collected.
    pub fn finish<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            first = false;
            write!(f, "{field}: {}", messages.join(" "))?;
        }
        Ok(())
    }
}

/// Lowercase the domain part; the local part is case-sensitive and left alone.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= MAX_EMAIL_LENGTH && EMAIL_RE.is_match(email)
}

/// Password strength rules. Returns every rule the password breaks.
pub fn password_problems(password: &str, email: Option<&str>) -> Vec<String> {
    let mut problems = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        problems.push(format!(
            "This password is too short. It must contain at least {MIN_PASSWORD_LENGTH} characters."
        ));
    }

    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        problems.push("This password is entirely numeric.".to_string());
    }

    let lowered = password.to_lowercase();
    if COMMON_PASSWORDS.contains(&lowered.as_str()) {
        problems.push("This password is too common.".to_string());
    }

    if let Some(email) = email {
        let email = email.to_lowercase();
        let local = email.split('@').next().unwrap_or_default();
        if lowered == email || (local.len() >= 3 && lowered == local) {
            problems.push("The password is too similar to the email address.".to_string());
        }
    }

    problems
}

fn required(errors: &mut FieldErrors, field: &str, value: Option<String>) -> Option<String> {
    match value {
        None => {
            errors.add(field, REQUIRED);
            None
        }
        Some(v) if v.trim().is_empty() => {
            errors.add(field, BLANK);
            None
        }
        Some(v) => Some(v),
    }
}

fn email_field(errors: &mut FieldErrors, field: &str, value: Option<String>) -> Option<String> {
    let email = normalize_email(&required(errors, field, value)?);
    if !is_valid_email(&email) {
        errors.add(field, INVALID_EMAIL);
        return None;
    }
    Some(email)
}

fn name_field(errors: &mut FieldErrors, field: &str, value: Option<String>) -> Option<String> {
    let name = required(errors, field, value)?.trim().to_string();
    if name.chars().count() > MAX_NAME_LENGTH {
        errors.add(
            field,
            format!("Ensure this field has no more than {MAX_NAME_LENGTH} characters."),
        );
        return None;
    }
    Some(name)
}

fn password_field(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
    email: Option<&str>,
) -> Option<String> {
    let password = required(errors, field, value)?;
    let problems = password_problems(&password, email);
    if problems.is_empty() {
        Some(password)
    } else {
        for problem in problems {
            errors.add(field, problem);
        }
        None
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RegisterPayload {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub password: Option<String>,
    pub password_confirm: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub password_confirm: String,
}

impl RegisterPayload {
    pub fn validate(self) -> Result<Registration, FieldErrors> {
        let mut errors = FieldErrors::new();
        let email = email_field(&mut errors, "email", self.email);
        let full_name = match self.full_name {
            Some(raw) => name_field(&mut errors, "full_name", Some(raw)),
            None => Some(String::new()),
        };
        let password = password_field(&mut errors, "password", self.password, email.as_deref());
        let password_confirm = required(&mut errors, "password_confirm", self.password_confirm);

        match (email, full_name, password, password_confirm) {
            (Some(email), Some(full_name), Some(password), Some(password_confirm)) => {
                errors.finish(Registration {
                    email,
                    full_name,
                    password,
                    password_confirm,
                })
            }
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginPayload {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Login {
    pub email: String,
    pub password: String,
}

impl LoginPayload {
    pub fn validate(self) -> Result<Login, FieldErrors> {
        let mut errors = FieldErrors::new();
        let email = email_field(&mut errors, "email", self.email);
        let password = required(&mut errors, "password", self.password);

        match (email, password) {
            (Some(email), Some(password)) => errors.finish(Login { email, password }),
            _ => Err(errors),
        }
    }
}

/// Body of `/logout/` and `/refresh/`.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshPayload {
    pub refresh: Option<String>,
}

impl RefreshPayload {
    pub fn token(self) -> Option<String> {
        self.refresh.filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdatePayload {
    pub email: Option<String>,
    pub full_name: Option<String>,
}

/// Partial profile update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileChanges {
    pub email: Option<String>,
    pub full_name: Option<String>,
}

impl ProfileUpdatePayload {
    pub fn validate(self) -> Result<ProfileChanges, FieldErrors> {
        let mut errors = FieldErrors::new();
        let email = match self.email {
            Some(raw) => email_field(&mut errors, "email", Some(raw)),
            None => None,
        };
        let full_name = match self.full_name {
            Some(raw) => name_field(&mut errors, "full_name", Some(raw)),
            None => None,
        };
        errors.finish(ProfileChanges { email, full_name })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ForgotPasswordPayload {
    pub email: Option<String>,
}

impl ForgotPasswordPayload {
    pub fn validate(self) -> Result<String, FieldErrors> {
        let mut errors = FieldErrors::new();
        match email_field(&mut errors, "email", self.email) {
            Some(email) => errors.finish(email),
            None => Err(errors),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ResetPasswordPayload {
    pub token: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PasswordReset {
    pub token: String,
    pub password: String,
}

impl ResetPasswordPayload {
    pub fn validate(self) -> Result<PasswordReset, FieldErrors> {
        let mut errors = FieldErrors::new();
        let token = required(&mut errors, "token", self.token).map(|t| t.trim().to_string());
        let password = password_field(&mut errors, "password", self.password, None);

        match (token, password) {
            (Some(token), Some(password)) => errors.finish(PasswordReset { token, password }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ChangePasswordPayload {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub new_password_confirm: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
    pub new_password_confirm: String,
}

impl ChangePasswordPayload {
    /// `email` is the account's address, used by the similarity rule.
    pub fn validate(self, email: &str) -> Result<PasswordChange, FieldErrors> {
        let mut errors = FieldErrors::new();
        let current_password = required(&mut errors, "current_password", self.current_password);
        let new_password =
            password_field(&mut errors, "new_password", self.new_password, Some(email));
        let new_password_confirm =
            required(&mut errors, "new_password_confirm", self.new_password_confirm);

        match (current_password, new_password, new_password_confirm) {
            (Some(current_password), Some(new_password), Some(new_password_confirm)) => errors
                .finish(PasswordChange {
                    current_password,
                    new_password,
                    new_password_confirm,
                }),
            _ => Err(errors),
        }
    }
}
