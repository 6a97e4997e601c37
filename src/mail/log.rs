use async_trait::async_trait;
use tracing::info;

use super::{MailError, MailTemplate, Mailer};

/// Mailer used when no provider key is configured; logs instead of sending.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(
        &self,
        template: &MailTemplate,
        username: &str,
        email: &str,
        is_sandbox: bool,
    ) -> Result<u16, MailError> {
        info!(
            template = template.name(),
            username,
            email,
            is_sandbox,
            subject = %template.subject(),
            "mail delivery skipped, no provider configured"
        );
        Ok(200)
    }
}
