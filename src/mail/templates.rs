/// Rendered mail templates. Each renders a subject line and an HTML body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailTemplate {
    UserInvitation { username: String, activation_url: String },
    ResetPassword { username: String, reset_url: String },
}

impl MailTemplate {
    pub fn name(&self) -> &'static str {
        match self {
            MailTemplate::UserInvitation { .. } => "user_invitation",
            MailTemplate::ResetPassword { .. } => "reset_password",
        }
    }

    pub fn subject(&self) -> String {
        match self {
            MailTemplate::UserInvitation { .. } => "Finish registration with FinTracker".to_string(),
            MailTemplate::ResetPassword { .. } => "Reset your FinTracker password".to_string(),
        }
    }

    pub fn html_body(&self) -> String {
        match self {
            MailTemplate::UserInvitation { username, activation_url } => format!(
                r#"<!doctype html>
<html>
  <body>
    <p>Hi {username},</p>
    <p>Thanks for signing up for FinTracker. Confirm your email to activate your account:</p>
    <p><a href="{url}">{url}</a></p>
    <p>If you did not sign up, you can safely ignore this email.</p>
    <p>The FinTracker Team</p>
  </body>
</html>"#,
                username = escape_html(username),
                url = escape_html(activation_url),
            ),
            MailTemplate::ResetPassword { username, reset_url } => format!(
                r#"<!doctype html>
<html>
  <body>
    <p>Hi {username},</p>
    <p>We received a request to reset your password. The link below is valid for 15 minutes:</p>
    <p><a href="{url}">{url}</a></p>
    <p>If you did not ask for a reset, no action is needed.</p>
    <p>The FinTracker Team</p>
  </body>
</html>"#,
                username = escape_html(username),
                url = escape_html(reset_url),
            ),
        }
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
