use app_config::{MailConfig, SmtpConfig};
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    address::AddressError,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid mail address '{address}': {source}")]
    Address {
        address: String,
        #[source]
        source: AddressError,
    },

    #[error("Failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Delivers account mails. Implementations must not block the caller on retries.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_confirmation(
        &self,
        email: &str,
        username: &str,
        confirmation_url: &str,
    ) -> Result<(), MailError>;
}

/// Link the confirmation route answers on
pub fn confirmation_url(base_url: &str, token: &str) -> String {
    format!(
        "{}/api/auth/confirmed_email/{}",
        base_url.trim_end_matches('/'),
        token
    )
}

/// Escape text for use in HTML element content and quoted attributes
fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Usernames are user supplied, so both values are escaped before formatting
pub fn render_confirmation(username: &str, confirmation_url: &str) -> String {
    let username = escape_html(username);
    let url = escape_html(confirmation_url);
    format!(
        r#"<!DOCTYPE html>
<html>
  <body>
    <p>Hi {username},</p>
    <p>Thanks for signing up. Please confirm your email address by following the link below:</p>
    <p><a href="{url}">{url}</a></p>
    <p>If you did not create an account you can ignore this message.</p>
  </body>
</html>
"#,
        username = username,
        url = url
    )
}

fn mailbox(name: &str, address: &str) -> Result<Mailbox, MailError> {
    let parsed = address.parse().map_err(|source| MailError::Address {
        address: address.to_string(),
        source,
    })?;
    let name = (!name.is_empty()).then(|| name.to_string());
    Ok(Mailbox::new(name, parsed))
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(smtp: &SmtpConfig, from: Mailbox) -> Result<Self, MailError> {
        let builder = match smtp.port {
            465 => AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)?,
            587 => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)?,
            // plain local relays such as a dev mail catcher
            _ => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp.host),
        }
        .port(smtp.port);

        let builder = if smtp.username.is_empty() {
            builder
        } else {
            builder.credentials(Credentials::new(
                smtp.username.clone(),
                smtp.password.clone(),
            ))
        };

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_confirmation(
        &self,
        email: &str,
        username: &str,
        confirmation_url: &str,
    ) -> Result<(), MailError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(mailbox(username, email)?)
            .subject("Confirm your email")
            .header(ContentType::TEXT_HTML)
            .body(render_confirmation(username, confirmation_url))?;

        self.transport.send(message).await?;
        info!("Confirmation mail sent to {}", email);
        Ok(())
    }
}

/// Writes the confirmation link to the log instead of sending it
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_confirmation(
        &self,
        email: &str,
        _username: &str,
        confirmation_url: &str,
    ) -> Result<(), MailError> {
        info!(to = %email, url = %confirmation_url, "SMTP not configured, confirmation mail not sent");
        Ok(())
    }
}

/// SMTP when configured, otherwise `LogMailer`
pub fn mailer_from_config(config: &MailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    match &config.smtp {
        Some(smtp) => {
            let from = mailbox(&config.from_name, &config.from_address)?;
            info!("Sending mail through {}:{}", smtp.host, smtp.port);
            Ok(Arc::new(SmtpMailer::new(smtp, from)?))
        }
        None => Ok(Arc::new(LogMailer)),
    }
}

/// Send the confirmation mail on a detached task. Failures are logged, never retried.
pub fn dispatch_confirmation(
    mailer: Arc<dyn Mailer>,
    email: String,
    username: String,
    confirmation_url: String,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = mailer
            .send_confirmation(&email, &username, &confirmation_url)
            .await
        {
            error!("Failed to send confirmation mail to {}: {}", email, e);
        }
    })
}
