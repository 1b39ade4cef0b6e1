//! # Support Desk
//!
//! Append-only chat threads between customers and the support team.
//! One thread per account; messages are never edited.

use crate::model::{AccountId, ChatMessage, ChatSender};
use crate::store::{BankDb, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum SupportError {
    #[error("account not found")]
    AccountNotFound,

    #[error("message body is empty")]
    EmptyMessage,

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct SupportDesk {
    db: BankDb,
}

impl SupportDesk {
    pub fn new(db: BankDb) -> Self {
        Self { db }
    }

    /// Appends a message to the account's thread.
    pub fn post(
        &self,
        account_id: AccountId,
        sender: ChatSender,
        body: &str,
    ) -> Result<ChatMessage, SupportError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(SupportError::EmptyMessage);
        }
        if self.db.get_account(&account_id)?.is_none() {
            return Err(SupportError::AccountNotFound);
        }

        let message = ChatMessage::new(account_id, sender, body.to_string());
        self.db.put_chat_message(&message)?;
        Ok(message)
    }

    /// The full thread, oldest first.
    pub fn thread(&self, account_id: &AccountId) -> Result<Vec<ChatMessage>, SupportError> {
        Ok(self.db.chat_thread(account_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Account, AccountType};

    fn setup() -> (SupportDesk, Account) {
        let db = BankDb::open_temporary().expect("temp db");
        let desk = SupportDesk::new(db.clone());
        let account = Account::open(
            "1000000001".into(),
            "chat@example.com".into(),
            "Alice".into(),
            "+1 555 0100".into(),
            "1990-01-01".into(),
            "1 Test Way".into(),
            "US".into(),
            AccountType::Checking,
        );
        db.put_account(&account).unwrap();
        (desk, account)
    }

    #[test]
    fn conversation_roundtrip() {
        let (desk, account) = setup();

        desk.post(account.id, ChatSender::Customer, "my card is frozen")
            .unwrap();
        desk.post(account.id, ChatSender::Support, "unfreezing it now")
            .unwrap();

        let thread = desk.thread(&account.id).unwrap();
        assert_eq!(thread.len(), 2);
        assert_eq!(thread[0].sender, ChatSender::Customer);
        assert_eq!(thread[1].sender, ChatSender::Support);
    }

    #[test]
    fn empty_and_whitespace_messages_rejected() {
        let (desk, account) = setup();
        assert!(matches!(
            desk.post(account.id, ChatSender::Customer, "   ").unwrap_err(),
            SupportError::EmptyMessage
        ));
    }

    #[test]
    fn post_to_unknown_account_rejected() {
        let (desk, _) = setup();
        let err = desk
            .post(uuid::Uuid::new_v4(), ChatSender::Customer, "hello")
            .unwrap_err();
        assert!(matches!(err, SupportError::AccountNotFound));
    }
}
