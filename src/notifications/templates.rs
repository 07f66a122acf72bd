use handlebars::Handlebars;
use serde_json::json;

use crate::error::{Error, Result};

const LAYOUT_OPEN: &str = r#"<!DOCTYPE html>
<html>
<head>
    <style>
        body { font-family: 'Helvetica Neue', Helvetica, Arial, sans-serif; line-height: 1.6; color: #333; }
        .container { max-width: 600px; margin: 0 auto; padding: 20px; border: 1px solid #ddd; border-radius: 8px; }
        .header { background-color: #dff9fb; padding: 15px; border-radius: 8px 8px 0 0; text-align: center; }
        .button { display: inline-block; background-color: #0984e3; color: white; padding: 10px 20px; text-decoration: none; border-radius: 5px; font-weight: bold; }
        .footer { margin-top: 30px; font-size: 12px; color: #b2bec3; text-align: center; }
    </style>
</head>
<body>
    <div class="container">"#;

const LAYOUT_CLOSE: &str = r#"
        <div class="footer">You are receiving this because you have a PawTrack account.</div>
    </div>
</body>
</html>"#;

const VERIFY_EMAIL: &str = r#"
        <div class="header"><h1>Welcome to PawTrack</h1></div>
        <p>Confirm <strong>{{email}}</strong> to finish setting up your account.</p>
        <p style="text-align: center;"><a href="{{{link}}}" class="button">Verify email</a></p>"#;

const PASSWORD_RESET: &str = r#"
        <div class="header"><h1>Reset your password</h1></div>
        <p>Someone asked to reset the password for <strong>{{email}}</strong>.
        If it was you, use the link below within the next hour.</p>
        <p style="text-align: center;"><a href="{{{link}}}" class="button">Choose a new password</a></p>
        <p><small>If you did not ask for this you can ignore this email.</small></p>"#;

const REMINDER: &str = r#"
        <div class="header"><h1>{{title}}</h1></div>
        <p>{{body}}</p>
        <p><strong>Scheduled for:</strong> {{at}}</p>"#;

/// Handlebars registry for every email the service sends.
pub struct NotificationTemplates {
    registry: Handlebars<'static>,
}

impl NotificationTemplates {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        for (name, content) in [
            ("verify_email", VERIFY_EMAIL),
            ("password_reset", PASSWORD_RESET),
            ("reminder", REMINDER),
        ] {
            registry
                .register_template_string(name, format!("{LAYOUT_OPEN}{content}{LAYOUT_CLOSE}"))
                .map_err(|e| Error::Internal {
                    operation: format!("register {name} template: {e}"),
                })?;
        }
        Ok(Self { registry })
    }

    pub fn verify_email(&self, email: &str, link: &str) -> Result<String> {
        self.render("verify_email", &json!({"email": email, "link": link}))
    }

    pub fn password_reset(&self, email: &str, link: &str) -> Result<String> {
        self.render("password_reset", &json!({"email": email, "link": link}))
    }

    pub fn reminder(&self, title: &str, body: &str, at: &str) -> Result<String> {
        self.render("reminder", &json!({"title": title, "body": body, "at": at}))
    }

    fn render(&self, name: &str, data: &serde_json::Value) -> Result<String> {
        self.registry.render(name, data).map_err(|e| Error::Internal {
            operation: format!("render {name} email: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reminder_escapes_user_text() {
        let templates = NotificationTemplates::new().unwrap();
        let html = templates
            .reminder("Rabies booster due", "<b>Biscuit</b> needs a shot", "2025-11-28 09:00 UTC")
            .unwrap();
        assert!(html.contains("Rabies booster due"));
        assert!(html.contains("&lt;b&gt;Biscuit&lt;/b&gt;"));
    }

    #[test]
    fn reset_email_carries_link() {
        let templates = NotificationTemplates::new().unwrap();
        let html = templates
            .password_reset("kim@example.com", "https://pawtrack.app/reset?token=abc")
            .unwrap();
        assert!(html.contains("https://pawtrack.app/reset?token=abc"));
    }
}
