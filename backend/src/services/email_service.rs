//! Outbound email delivery over SMTP.
//!
//! Sends password-reset links and temporary-password notices. Content is
//! plain text plus a simple HTML alternative; anything fancier belongs in
//! the frontend.

use crate::config::EmailConfig;
use crate::errors::{ServiceError, ServiceResult};
use lettre::message::{Mailbox, MultiPart, SinglePart, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::str::FromStr;

pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    config: EmailConfig,
}

impl EmailService {
    /// Creates a new EmailService instance
    pub fn new(config: EmailConfig) -> ServiceResult<Self> {
        let creds = Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| ServiceError::validation(format!("Invalid SMTP host: {e}")))?
            .port(config.smtp_port)
            .credentials(creds)
            .build();

        Ok(Self { mailer, config })
    }

    /// Sends a password-reset link built from the frontend base URL.
    pub async fn send_password_reset_email(
        &self,
        recipient_email: &str,
        recipient_name: &str,
        reset_token: &str,
    ) -> ServiceResult<()> {
        let reset_url = format!(
            "{}/reset-password?token={}",
            self.config.base_url, reset_token
        );

        let text = format!(
            "Hi {recipient_name},\n\n\
             A password reset was requested for your account. The link below \
             is valid for 15 minutes and can be used once:\n\n{reset_url}\n\n\
             If you did not request this, you can ignore this message."
        );
        let html = format!(
            "<p>Hi {recipient_name},</p>\
             <p>A password reset was requested for your account. The link below \
             is valid for 15 minutes and can be used once:</p>\
             <p><a href=\"{reset_url}\">Reset your password</a></p>\
             <p>If you did not request this, you can ignore this message.</p>"
        );

        self.send_email(recipient_email, "Reset your password", &html, &text)
            .await
    }

    /// Sends the temporary password issued when an admin creates a user.
    pub async fn send_temp_password_email(
        &self,
        recipient_email: &str,
        recipient_name: &str,
        temp_password: &str,
    ) -> ServiceResult<()> {
        let login_url = format!("{}/login", self.config.base_url);

        let text = format!(
            "Hi {recipient_name},\n\n\
             An account was created for you. Sign in at {login_url} with this \
             temporary password and choose a new one:\n\n{temp_password}\n\n\
             The temporary password expires; sign in soon."
        );
        let html = format!(
            "<p>Hi {recipient_name},</p>\
             <p>An account was created for you. <a href=\"{login_url}\">Sign in</a> \
             with this temporary password and choose a new one:</p>\
             <p><code>{temp_password}</code></p>\
             <p>The temporary password expires; sign in soon.</p>"
        );

        self.send_email(recipient_email, "Your new account", &html, &text)
            .await
    }

    /// Sends a generic email
    pub async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        html_content: &str,
        text_content: &str,
    ) -> ServiceResult<()> {
        let from_mailbox = Mailbox::from_str(&format!(
            "{} <{}>",
            self.config.from_name, self.config.from_email
        ))
        .map_err(|e| ServiceError::validation(format!("Invalid from email: {e}")))?;

        let to_mailbox = Mailbox::from_str(to_email)
            .map_err(|e| ServiceError::validation(format!("Invalid recipient email: {e}")))?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_content.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_content.to_string()),
                    ),
            )
            .map_err(|e| ServiceError::internal_error(format!("Failed to build email: {e}")))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| ServiceError::external_service(format!("Failed to send email: {e}")))?;

        Ok(())
    }
}
