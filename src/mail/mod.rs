pub mod log;
pub mod mailtrap;
pub mod templates;

use async_trait::async_trait;
use thiserror::Error;

pub use log::LogMailer;
pub use mailtrap::MailtrapMailer;
pub use templates::MailTemplate;

/// Display name used on outgoing mail.
pub const FROM_NAME: &str = "FinTracker";

/// Delivery attempts before a send is reported as failed.
pub const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail api key is required")]
    MissingApiKey,

    #[error("mail request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("mail provider responded with {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("failed to send email after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },
}

/// Outgoing mail. `is_sandbox` reports success without delivering.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(
        &self,
        template: &MailTemplate,
        username: &str,
        email: &str,
        is_sandbox: bool,
    ) -> Result<u16, MailError>;
}
