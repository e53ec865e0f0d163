use std::time::Duration;

use async_trait::async_trait;
use intakechat_common::{Error, Profile, Result};
use intakechat_config::MailConfig;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, instrument};

use crate::traits::Notifier;

const SUBJECT: &str = "New User Profile Submission";
const SMTP_TIMEOUT: Duration = Duration::from_secs(20);

/// Sends each submitted profile as a plain-text e-mail over authenticated
/// STARTTLS submission.
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
    recipient: Mailbox,
}

impl EmailNotifier {
    pub fn new(config: &MailConfig) -> Result<Self> {
        let sender = parse_mailbox("SENDER_EMAIL", &config.sender_email)?;
        let recipient = parse_mailbox("RECEIVER_EMAIL", &config.recipient_email)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| Error::Channel(format!("invalid SMTP relay {}: {e}", config.smtp_host)))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.sender_email.clone(),
                config.sender_password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        Ok(Self {
            transport,
            sender,
            recipient,
        })
    }

    fn build_message(&self, profile: &Profile) -> Result<Message> {
        Message::builder()
            .from(self.sender.clone())
            .to(self.recipient.clone())
            .subject(SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(render_profile_email(profile))
            .map_err(|e| Error::Channel(format!("failed to build notification e-mail: {e}")))
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn channel_type(&self) -> &str {
        "email"
    }

    #[instrument(skip_all, fields(recipient = %self.recipient))]
    async fn notify(&self, profile: &Profile) -> Result<()> {
        let message = self.build_message(profile)?;
        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| Error::Channel(format!("error sending email: {e}")))?;
        info!(code = %response.code(), "profile notification delivered");
        Ok(())
    }
}

/// Render the notification body listing every profile field.
pub fn render_profile_email(profile: &Profile) -> String {
    let mut body = String::from("New Student Profile Submitted:\n\n");
    body.push_str(&format!("Name: {}\n", profile.name.trim()));
    body.push_str(&format!("Email: {}\n", profile.email.trim()));
    body.push_str(&format!("Contact No.: {}\n", profile.phone.trim()));
    for (key, value) in &profile.fields {
        body.push_str(&format!("{}: {}\n", field_label(key), value.trim()));
    }
    body
}

/// `area_of_interest` -> `Area of Interest`
fn field_label(key: &str) -> String {
    key.split(['_', '-', ' '])
        .filter(|w| !w.is_empty())
        .enumerate()
        .map(|(i, word)| {
            let lower = word.to_ascii_lowercase();
            if i > 0 && matches!(lower.as_str(), "of" | "and" | "to" | "for" | "in" | "or") {
                return lower;
            }
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_mailbox(key: &str, value: &str) -> Result<Mailbox> {
    value
        .parse::<Mailbox>()
        .map_err(|e| Error::Config(format!("invalid value for {key}: {e}")))
}
