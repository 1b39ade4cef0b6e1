//! Support chat messages.
//!
//! Each account has one append-only thread with the support desk. Messages
//! are never edited or deleted; the thread dies with the account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::account::AccountId;

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatSender {
    Customer,
    Support,
}

/// One message in an account's support thread.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub account_id: AccountId,
    pub sender: ChatSender,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(account_id: AccountId, sender: ChatSender, body: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            sender,
            body,
            sent_at: Utc::now(),
        }
    }
}
