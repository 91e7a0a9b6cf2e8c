//! Outbound email — SMTP via lettre with a single file attachment.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::ExposeSecret;

use crate::config::SmtpConfig;
use crate::error::EmailError;

/// Sends a message with one binary attachment.
#[async_trait]
pub trait EmailDispatcher: Send + Sync {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        filename: &str,
        file_bytes: Vec<u8>,
    ) -> Result<(), EmailError>;
}

/// SMTP dispatcher over implicit TLS.
pub struct SmtpDispatcher {
    config: SmtpConfig,
}

impl SmtpDispatcher {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    /// Build the MIME message: plain-text body plus an octet-stream attachment.
    fn build_message(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        filename: &str,
        file_bytes: Vec<u8>,
    ) -> Result<Message, EmailError> {
        let from = self
            .config
            .from_address
            .as_deref()
            .ok_or(EmailError::MissingCredentials)?;

        let octet_stream = ContentType::parse("application/octet-stream")
            .map_err(|e| EmailError::Build(format!("Invalid content type: {e}")))?;
        let attachment = Attachment::new(filename.to_string()).body(file_bytes, octet_stream);

        Message::builder()
            .from(
                from.parse()
                    .map_err(|e| EmailError::Build(format!("Invalid from address: {e}")))?,
            )
            .to(to
                .parse()
                .map_err(|e| EmailError::Build(format!("Invalid to address: {e}")))?)
            .subject(subject)
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(body.to_string()))
                    .singlepart(attachment),
            )
            .map_err(|e| EmailError::Build(e.to_string()))
    }

    fn transport(&self) -> Result<SmtpTransport, EmailError> {
        let (Some(username), Some(password)) = (&self.config.username, &self.config.password)
        else {
            return Err(EmailError::MissingCredentials);
        };
        let creds = Credentials::new(username.clone(), password.expose_secret().to_string());

        Ok(SmtpTransport::relay(&self.config.host)
            .map_err(|e| EmailError::Transport(format!("SMTP relay error: {e}")))?
            .port(self.config.port)
            .credentials(creds)
            .build())
    }
}

#[async_trait]
impl EmailDispatcher for SmtpDispatcher {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        filename: &str,
        file_bytes: Vec<u8>,
    ) -> Result<(), EmailError> {
        if !self.config.has_credentials() {
            return Err(EmailError::MissingCredentials);
        }

        let email = self.build_message(to, subject, body, filename, file_bytes)?;
        let transport = self.transport()?;

        tokio::task::spawn_blocking(move || transport.send(&email))
            .await
            .map_err(|e| EmailError::Transport(format!("SMTP task panicked: {e}")))?
            .map_err(|e| EmailError::Transport(e.to_string()))?;

        tracing::info!(to = %to, attachment = %filename, "Email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn configured() -> SmtpConfig {
        SmtpConfig {
            username: Some("ward7@hospital.kr".into()),
            password: Some(SecretString::from("app-password")),
            from_address: Some("ward7@hospital.kr".into()),
            ..SmtpConfig::default()
        }
    }

    #[tokio::test]
    async fn missing_credentials_fails_before_connecting() {
        let dispatcher = SmtpDispatcher::new(SmtpConfig::default());
        let err = dispatcher
            .send("a@b.kr", "퇴원 요약", "본문", "summary.pdf", vec![1, 2, 3])
            .await
            .unwrap_err();
        assert!(matches!(err, EmailError::MissingCredentials));
    }

    #[tokio::test]
    async fn password_without_user_is_missing_credentials() {
        let config = SmtpConfig {
            password: Some(SecretString::from("secret")),
            ..SmtpConfig::default()
        };
        let err = SmtpDispatcher::new(config)
            .send("a@b.kr", "s", "b", "f.docx", vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, EmailError::MissingCredentials));
    }

    #[tokio::test]
    async fn invalid_recipient_is_a_build_error() {
        let err = SmtpDispatcher::new(configured())
            .send("not an address", "s", "b", "f.docx", vec![0])
            .await
            .unwrap_err();
        assert!(matches!(err, EmailError::Build(_)));
    }

    #[test]
    fn message_carries_octet_stream_attachment() {
        let dispatcher = SmtpDispatcher::new(configured());
        let message = dispatcher
            .build_message(
                "doctor@hospital.kr",
                "퇴원 요약 및 지침서",
                "첨부된 퇴원 요약/지침서를 확인해 주세요.",
                "discharge_summary_email.pdf",
                b"%PDF-1.5".to_vec(),
            )
            .unwrap();
        let raw = String::from_utf8_lossy(&message.formatted()).to_string();
        assert!(raw.contains("multipart/mixed"));
        assert!(raw.contains("application/octet-stream"));
        assert!(raw.contains("discharge_summary_email.pdf"));
    }
}
