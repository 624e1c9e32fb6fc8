//! Outbound notification for new contact messages.

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::MailConfig;
use crate::contact::Contact;
use crate::{FolioError, Result};

pub const CONTACT_SUBJECT: &str = "Contact Form Submission";

/// Sends contact form submissions to the site owner over SMTP.
#[derive(Debug, Clone)]
pub struct ContactMailer {
    host: String,
    port: u16,
    credentials: Option<(String, String)>,
    from: String,
    to: String,
}

impl ContactMailer {
    /// Returns None when SMTP is not configured.
    pub fn from_config(config: &MailConfig) -> Option<Self> {
        if !config.is_configured() {
            return None;
        }
        let credentials = if config.smtp_user.is_empty() {
            None
        } else {
            Some((config.smtp_user.clone(), config.smtp_password.clone()))
        };
        Some(Self {
            host: config.smtp_host.clone(),
            port: config.smtp_port,
            credentials,
            from: config.from_address.clone(),
            to: config.notification_address().to_string(),
        })
    }

    pub fn recipient(&self) -> &str {
        &self.to
    }

    /// Build the notification message without sending it.
    pub fn compose(&self, contact: &Contact) -> Result<Message> {
        let from = self
            .from
            .parse()
            .map_err(|e| FolioError::Mail(format!("invalid sender address: {e}")))?;
        let to = self
            .to
            .parse()
            .map_err(|e| FolioError::Mail(format!("invalid recipient address: {e}")))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(CONTACT_SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(notification_body(contact))
            .map_err(|e| FolioError::Mail(e.to_string()))
    }

    pub async fn notify(&self, contact: &Contact) -> Result<()> {
        let message = self.compose(contact)?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)
            .map_err(|e| FolioError::Mail(e.to_string()))?
            .port(self.port);
        if let Some((ref user, ref password)) = self.credentials {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        builder
            .build()
            .send(message)
            .await
            .map_err(|e| FolioError::Mail(e.to_string()))?;

        tracing::info!(contact_id = contact.id, to = %self.to, "Contact notification sent");
        Ok(())
    }
}

fn notification_body(contact: &Contact) -> String {
    format!(
        "Name: {}\nEmail: {}\n\n{}\n",
        contact.name, contact.email, contact.message
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MailConfig {
        MailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_user: "owner@example.com".to_string(),
            smtp_password: "secret".to_string(),
            ..Default::default()
        }
    }

    fn contact() -> Contact {
        Contact {
            id: 1,
            name: "Ann".to_string(),
            email: "ann@example.com".to_string(),
            message: "Nice blog".to_string(),
            created_at: "2024-01-01T00:00:00.000Z".to_string(),
            updated_at: "2024-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn test_unconfigured_mailer_is_disabled() {
        assert!(ContactMailer::from_config(&MailConfig::default()).is_none());
    }

    #[test]
    fn test_recipient_falls_back_to_smtp_user() {
        let mailer = ContactMailer::from_config(&config()).unwrap();
        assert_eq!(mailer.recipient(), "owner@example.com");

        let mut with_admin = config();
        with_admin.admin_address = "admin@example.com".to_string();
        let mailer = ContactMailer::from_config(&with_admin).unwrap();
        assert_eq!(mailer.recipient(), "admin@example.com");
    }

    #[test]
    fn test_compose() {
        let mailer = ContactMailer::from_config(&config()).unwrap();
        let message = mailer.compose(&contact()).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Contact Form Submission"));
        assert!(raw.contains("Nice blog"));
        assert!(raw.contains("ann@example.com"));
    }

    #[test]
    fn test_compose_rejects_bad_sender() {
        let mut bad = config();
        bad.from_address = "not an address".to_string();
        let mailer = ContactMailer::from_config(&bad).unwrap();
        assert!(matches!(mailer.compose(&contact()), Err(FolioError::Mail(_))));
    }
}
