//! # Notification — Outbound Email
//!
//! Email leaves the bank through a delivery collaborator: an HTTP endpoint
//! accepting `{to, subject, html}` and answering `{ok, message|error}`.
//! Delivery is strictly fire-and-forget — a failed send is logged and
//! forgotten, never surfaced to the customer and never retried. Nothing in
//! the bank's state depends on an email having landed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config;
use crate::model::Account;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("email request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The collaborator answered but refused the message.
    #[error("email rejected by delivery endpoint: {0}")]
    Rejected(String),
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// One outbound email, exactly as the delivery endpoint expects it.
#[derive(Clone, Debug, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// The delivery endpoint's response envelope.
#[derive(Debug, Deserialize)]
struct DeliveryResponse {
    ok: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

// ---------------------------------------------------------------------------
// Mailer
// ---------------------------------------------------------------------------

/// Abstraction over the delivery collaborator so that handlers, tests, and
/// unconfigured deployments all share one call shape.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), NotifyError>;
}

/// Production mailer: POSTs the message to the configured endpoint.
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpMailer {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), NotifyError> {
        let response: DeliveryResponse = self
            .client
            .post(&self.endpoint)
            .json(&message)
            .send()
            .await?
            .json()
            .await?;

        if !response.ok {
            return Err(NotifyError::Rejected(
                response
                    .error
                    .or(response.message)
                    .unwrap_or_else(|| "no detail".to_string()),
            ));
        }
        Ok(())
    }
}

/// Mailer for tests and deployments with no delivery endpoint configured.
/// Logs the would-be send and reports success.
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), NotifyError> {
        tracing::debug!(to = %message.to, subject = %message.subject, "email suppressed (no mailer configured)");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// Welcome email sent after signup.
pub fn welcome_email(account: &Account) -> EmailMessage {
    let html = format!(
        "<h1>Welcome to {bank}</h1>\
         <p>Hi <b>{name}</b>, your new account is ready.</p>\
         <table>\
           <tr><td><b>Account Number</b></td><td>{number}</td></tr>\
           <tr><td><b>Account Type</b></td><td>{kind}</td></tr>\
           <tr><td><b>Country</b></td><td>{country}</td></tr>\
           <tr><td><b>Currency</b></td><td>{currency}</td></tr>\
           <tr><td><b>Status</b></td><td>{status}</td></tr>\
         </table>\
         <p>You can now log in to view your balance, transfer funds, and \
         manage your account.</p>\
         <p>If you did not create this account, contact our support team \
         immediately.</p>",
        bank = config::BANK_NAME,
        name = account.name,
        number = account.account_number,
        kind = account.account_type,
        country = account.country,
        currency = account.currency,
        status = account.status,
    );
    EmailMessage {
        to: account.email.clone(),
        subject: format!("Welcome to {}", config::BANK_NAME),
        html,
    }
}

/// Security alert sent on every successful login.
pub fn login_alert(email: &str) -> EmailMessage {
    let html = format!(
        "<h1>Login Alert</h1>\
         <p>We detected a login to your {bank} account <b>{email}</b> \
         at {time}.</p>\
         <p>If this was not you, reset your password immediately.</p>",
        bank = config::BANK_NAME,
        email = email,
        time = chrono::Utc::now().to_rfc2822(),
    );
    EmailMessage {
        to: email.to_string(),
        subject: format!("Login Alert - {}", config::BANK_NAME),
        html,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AccountType;

    fn sample_account() -> Account {
        Account::open(
            "1000200030".into(),
            "alice@example.com".into(),
            "Alice Martin".into(),
            "+1 555 0100".into(),
            "1990-04-02".into(),
            "12 Main St".into(),
            "US".into(),
            AccountType::Checking,
        )
    }

    #[test]
    fn welcome_email_names_the_account() {
        let msg = welcome_email(&sample_account());
        assert_eq!(msg.to, "alice@example.com");
        assert!(msg.subject.contains(config::BANK_NAME));
        assert!(msg.html.contains("Alice Martin"));
        assert!(msg.html.contains("1000200030"));
        assert!(msg.html.contains("Checking"));
    }

    #[test]
    fn login_alert_targets_the_login_email() {
        let msg = login_alert("alice@example.com");
        assert_eq!(msg.to, "alice@example.com");
        assert!(msg.subject.starts_with("Login Alert"));
        assert!(msg.html.contains("alice@example.com"));
    }

    #[tokio::test]
    async fn noop_mailer_always_succeeds() {
        let msg = login_alert("alice@example.com");
        NoopMailer.send(msg).await.expect("noop send");
    }
}
