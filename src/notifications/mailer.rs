use std::sync::{Arc, Mutex, PoisonError};

use sendgrid::SGClient;
use sendgrid::{Destination, Mail};
use tracing::{error, info, warn};

use super::NotificationTemplates;
use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

type Outbox = Arc<Mutex<Vec<SentMail>>>;

/// Sends account and reminder emails through SendGrid. Without an API key
/// it runs in mock mode and only logs. `Mailer::mock` also keeps the mails
/// in an outbox for inspection.
#[derive(Clone)]
pub struct Mailer {
    sendgrid_client: Option<SGClient>,
    email_from: String,
    templates: Arc<NotificationTemplates>,
    outbox: Option<Outbox>,
}

impl Mailer {
    pub fn new(sendgrid_api_key: Option<String>, email_from: String) -> Result<Self> {
        let sendgrid_client = sendgrid_api_key.map(SGClient::new);
        if sendgrid_client.is_none() {
            warn!("SendGrid API key not found. Email notifications will be mocked.");
        }

        Ok(Self {
            sendgrid_client,
            email_from,
            templates: Arc::new(NotificationTemplates::new()?),
            outbox: None,
        })
    }

    pub fn mock() -> Result<Self> {
        let mut mailer = Self::new(None, "test@pawtrack.app".into())?;
        mailer.outbox = Some(Outbox::default());
        Ok(mailer)
    }

    /// Mails captured by a `Mailer::mock`. Empty for any other mailer.
    pub fn outbox(&self) -> Vec<SentMail> {
        self.outbox
            .as_ref()
            .map(|outbox| outbox.lock().unwrap_or_else(PoisonError::into_inner).clone())
            .unwrap_or_default()
    }

    pub async fn send_verification(&self, to: &str, link: &str) -> Result<()> {
        let html = self.templates.verify_email(to, link)?;
        self.send(to, "Verify your PawTrack email", &html).await
    }

    pub async fn send_password_reset(&self, to: &str, link: &str) -> Result<()> {
        let html = self.templates.password_reset(to, link)?;
        self.send(to, "Reset your PawTrack password", &html).await
    }

    pub async fn send_reminder(&self, to: &str, title: &str, body: &str, at: &str) -> Result<()> {
        let html = self.templates.reminder(title, body, at)?;
        self.send(to, &format!("Reminder: {title}"), &html).await
    }

    pub async fn send(&self, to_email: &str, subject: &str, body: &str) -> Result<()> {
        let Some(client) = &self.sendgrid_client else {
            info!("(Mock) Would send email to: {}", to_email);
            info!("(Mock) Subject: {}", subject);
            if let Some(outbox) = &self.outbox {
                outbox
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(SentMail {
                        to: to_email.to_string(),
                        subject: subject.to_string(),
                        html: body.to_string(),
                    });
            }
            crate::metrics::increment_emails_sent();
            return Ok(());
        };

        // The SendGrid client blocks, so the send runs off the async workers
        let to_email = to_email.to_string();
        let subject = subject.to_string();
        let body = body.to_string();
        let email_from = self.email_from.clone();
        let client = client.clone();
        let to_email_log = to_email.clone();

        let result = tokio::task::spawn_blocking(move || {
            let mail_info = Mail::new()
                .add_to(Destination {
                    address: &to_email,
                    name: "Pet Owner",
                })
                .add_from(&email_from)
                .add_subject(&subject)
                .add_html(&body);

            client.send(mail_info)
        })
        .await
        .map_err(|e| Error::Mail(format!("send task failed: {e}")))?;

        match result {
            Ok(_) => {
                info!("Email sent to {}", to_email_log);
                crate::metrics::increment_emails_sent();
                Ok(())
            }
            Err(e) => {
                error!("Failed to send email: {}", e);
                crate::metrics::increment_emails_failed();
                Err(Error::Mail(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_mode_collects_mail() {
        let mailer = Mailer::mock().unwrap();
        mailer
            .send_verification("lee@example.com", "http://localhost/verify?token=t")
            .await
            .unwrap();

        let sent = mailer.outbox();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "lee@example.com");
        assert!(sent[0].html.contains("verify?token=t"));
    }

    #[tokio::test]
    async fn keyless_mailer_logs_without_keeping_mail() {
        let mailer = Mailer::new(None, "reminders@pawtrack.app".into()).unwrap();
        for _ in 0..500 {
            mailer
                .send("lee@example.com", "Reminder: Walk", "<p>Walk</p>")
                .await
                .unwrap();
        }
        assert!(mailer.outbox().is_empty());
    }
}
