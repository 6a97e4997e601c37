use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use super::{MailError, MailTemplate, Mailer, FROM_NAME, MAX_RETRIES};

const SEND_URL: &str = "https://send.api.mailtrap.io/api/send";

#[derive(Serialize)]
struct Address<'a> {
    email: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: Address<'a>,
    to: Vec<Address<'a>>,
    subject: String,
    html: String,
    category: &'static str,
}

/// Mailtrap send API client.
pub struct MailtrapMailer {
    client: Client,
    api_key: String,
    from_email: String,
    send_url: String,
    backoff: Duration,
}

impl MailtrapMailer {
    pub fn new(api_key: impl Into<String>, from_email: impl Into<String>) -> Result<Self, MailError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(MailError::MissingApiKey);
        }
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            client,
            api_key,
            from_email: from_email.into(),
            send_url: SEND_URL.to_string(),
            backoff: Duration::from_secs(1),
        })
    }

    /// Points the client at another endpoint, e.g. a local stub.
    pub fn with_send_url(mut self, url: impl Into<String>) -> Self {
        self.send_url = url.into();
        self
    }

    async fn send_once(&self, request: &SendRequest<'_>) -> Result<u16, MailError> {
        let response = self
            .client
            .post(&self.send_url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(status.as_u16());
        }
        let body = response.text().await.unwrap_or_default();
        Err(MailError::Provider { status: status.as_u16(), body })
    }
}

#[async_trait]
impl Mailer for MailtrapMailer {
    async fn send(
        &self,
        template: &MailTemplate,
        username: &str,
        email: &str,
        is_sandbox: bool,
    ) -> Result<u16, MailError> {
        if is_sandbox {
            debug!(template = template.name(), email, "sandboxed mail, not delivered");
            return Ok(200);
        }

        let request = SendRequest {
            from: Address { email: &self.from_email, name: FROM_NAME },
            to: vec![Address { email, name: username }],
            subject: template.subject(),
            html: template.html_body(),
            category: template.name(),
        };

        let mut last_error = String::new();
        for attempt in 1..=MAX_RETRIES {
            match self.send_once(&request).await {
                Ok(status) => return Ok(status),
                Err(e) => {
                    warn!(attempt, error = %e, "mail delivery attempt failed");
                    last_error = e.to_string();
                    if attempt < MAX_RETRIES {
                        tokio::time::sleep(self.backoff * attempt).await;
                    }
                }
            }
        }

        Err(MailError::Exhausted { attempts: MAX_RETRIES, last: last_error })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_api_key_is_rejected() {
        assert!(matches!(MailtrapMailer::new("", "from@example.com"), Err(MailError::MissingApiKey)));
    }

    #[tokio::test]
    async fn sandbox_sends_succeed_without_network() {
        let mailer = MailtrapMailer::new("key", "from@example.com")
            .unwrap()
            .with_send_url("http://127.0.0.1:9/unreachable");
        let template = MailTemplate::UserInvitation {
            username: "alice".to_string(),
            activation_url: "http://localhost/users/activate/t".to_string(),
        };

        let status = mailer.send(&template, "alice", "alice@example.com", true).await.unwrap();
        assert_eq!(status, 200);
    }

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn invitation() -> MailTemplate {
        MailTemplate::UserInvitation {
            username: "bob".to_string(),
            activation_url: "http://localhost/users/activate/t".to_string(),
        }
    }

    /// Reads one HTTP request off `stream`, headers and body.
    async fn read_request(stream: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let length = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                while buf.len() < end + 4 + length {
                    let n = stream.read(&mut chunk).await.unwrap();
                    if n == 0 {
                        return;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                }
                return;
            }
        }
    }

    /// Serves `statuses` in order (the last one repeats) and counts hits.
    async fn stub_provider(statuses: Vec<u16>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/api/send", listener.local_addr().unwrap());
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else { return };
                read_request(&mut stream).await;
                let hit = counter.fetch_add(1, Ordering::SeqCst);
                let status = statuses[hit.min(statuses.len() - 1)];
                let body = if status == 200 { "{\"success\":true}" } else { "boom" };
                let response = format!(
                    "HTTP/1.1 {} Stub\r\ncontent-type: text/plain\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        (url, hits)
    }

    fn mailer_for(url: &str) -> MailtrapMailer {
        let mut mailer = MailtrapMailer::new("key", "from@example.com").unwrap().with_send_url(url);
        mailer.backoff = Duration::from_millis(10);
        mailer
    }

    #[tokio::test]
    async fn gives_up_after_three_failed_attempts() {
        let (url, hits) = stub_provider(vec![500]).await;
        let mailer = mailer_for(&url);

        let err = mailer.send(&invitation(), "bob", "bob@example.com", false).await.unwrap_err();

        match err {
            MailError::Exhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(last.contains("500"), "{last}");
                assert!(last.contains("boom"), "{last}");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn recovers_when_a_retry_succeeds() {
        let (url, hits) = stub_provider(vec![503, 200]).await;
        let mailer = mailer_for(&url);

        let status = mailer.send(&invitation(), "bob", "bob@example.com", false).await.unwrap();

        assert_eq!(status, 200);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}

