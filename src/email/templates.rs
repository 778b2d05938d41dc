use askama::Template;

use super::Email;

#[derive(Template)]
#[template(path = "emails/password_reset.html")]
struct PasswordResetHtml<'a> {
    full_name: &'a str,
    reset_url: &'a str,
    timeout_minutes: u64,
}

#[derive(Template)]
#[template(path = "emails/password_reset.txt")]
struct PasswordResetText<'a> {
    full_name: &'a str,
    reset_url: &'a str,
    timeout_minutes: u64,
}

pub fn password_reset(
    to: &str,
    full_name: &str,
    reset_url: &str,
    timeout_minutes: u64,
) -> Result<Email, String> {
    let html = PasswordResetHtml {
        full_name,
        reset_url,
        timeout_minutes,
    }
    .render()
    .map_err(|e| format!("Failed to render password reset email: {e}"))?;

    let text = PasswordResetText {
        full_name,
        reset_url,
        timeout_minutes,
    }
    .render()
    .map_err(|e| format!("Failed to render password reset email: {e}"))?;

    Ok(Email {
        to: to.to_string(),
        subject: "Password Reset Request".to_string(),
        text,
        html,
    })
}
