//! # BankDb — Persistent Storage Engine
//!
//! Wraps a sled `Db` and exposes typed accessors for every record the bank
//! keeps. Each collection is a named sled tree with its own keyspace:
//!
//! | Tree              | Key                                   | Value                        |
//! |-------------------|---------------------------------------|------------------------------|
//! | `accounts`        | account id (16B uuid)                 | `bincode(Account)`           |
//! | `account_numbers` | account number (UTF-8)                | account id (16B)             |
//! | `emails`          | lowercased email (UTF-8)              | account id (16B)             |
//! | `transactions`    | transaction id (16B uuid)             | `bincode(TransactionRecord)` |
//! | `account_txs`     | account id ∥ micros BE ∥ tx id        | transaction id (16B)         |
//! | `cards`           | card id (16B uuid)                    | `bincode(Card)`              |
//! | `account_cards`   | account id (16B)                      | card id (16B)                |
//! | `kyc`             | account id (16B)                      | `bincode(KycRecord)`         |
//! | `credentials`     | account id (16B)                      | `bincode(CredentialRecord)`  |
//! | `chats`           | account id ∥ micros BE ∥ msg id       | `bincode(ChatMessage)`       |
//!
//! Timestamps in composite keys are big-endian so sled's lexicographic
//! ordering matches chronological ordering — statement and chat listings
//! are straight prefix scans.
//!
//! # Thread Safety
//!
//! sled trees support lock-free concurrent reads and serialized writes.
//! `BankDb` is `Clone` and can be shared across threads via `Arc<BankDb>`
//! without external synchronization; cross-record consistency is the
//! ledger's job (see [`crate::ledger`]).

use sled::{Db, Tree};
use std::path::Path;
use uuid::Uuid;

use crate::config::tree;
use crate::model::{Account, AccountId, Card, ChatMessage, KycRecord, TransactionRecord};

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Encoding helpers
// ---------------------------------------------------------------------------

/// Bincode-encode a record for storage.
pub(crate) fn enc<T: serde::Serialize>(value: &T) -> StoreResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Decode a record read from storage.
pub(crate) fn dec<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> StoreResult<T> {
    bincode::deserialize(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Storage key for a uuid-keyed record.
pub(crate) fn id_key(id: &Uuid) -> [u8; 16] {
    *id.as_bytes()
}

/// Composite key `account id ∥ micros BE ∥ entry id` for time-ordered
/// per-account listings (statements, chat threads).
pub(crate) fn timeline_key(account_id: &AccountId, micros: i64, entry_id: &Uuid) -> Vec<u8> {
    let mut key = Vec::with_capacity(40);
    key.extend_from_slice(account_id.as_bytes());
    key.extend_from_slice(&(micros as u64).to_be_bytes());
    key.extend_from_slice(entry_id.as_bytes());
    key
}

// ---------------------------------------------------------------------------
// BankDb
// ---------------------------------------------------------------------------

/// Persistent storage engine for the bank.
#[derive(Debug, Clone)]
pub struct BankDb {
    db: Db,
    accounts: Tree,
    account_numbers: Tree,
    emails: Tree,
    transactions: Tree,
    account_txs: Tree,
    cards: Tree,
    account_cards: Tree,
    kyc: Tree,
    credentials: Tree,
    chats: Tree,
}

impl BankDb {
    /// Open or create a database at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Create a temporary database that lives in memory and is cleaned up
    /// automatically on drop. Ideal for unit tests.
    pub fn open_temporary() -> StoreResult<Self> {
        let config = sled::Config::new().temporary(true);
        let db = config.open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> StoreResult<Self> {
        Ok(Self {
            accounts: db.open_tree(tree::ACCOUNTS)?,
            account_numbers: db.open_tree(tree::ACCOUNT_NUMBERS)?,
            emails: db.open_tree(tree::EMAILS)?,
            transactions: db.open_tree(tree::TRANSACTIONS)?,
            account_txs: db.open_tree(tree::ACCOUNT_TXS)?,
            cards: db.open_tree(tree::CARDS)?,
            account_cards: db.open_tree(tree::ACCOUNT_CARDS)?,
            kyc: db.open_tree(tree::KYC)?,
            credentials: db.open_tree(tree::CREDENTIALS)?,
            chats: db.open_tree(tree::CHATS)?,
            db,
        })
    }

    /// The trees participating in the money-movement atomic section, in the
    /// order the ledger's transaction closure destructures them.
    pub(crate) fn money_trees(&self) -> (&Tree, &Tree, &Tree) {
        (&self.accounts, &self.transactions, &self.account_txs)
    }

    // -- Account operations -------------------------------------------------

    /// Persist an account record and its lookup index entries.
    ///
    /// Safe to call for both creation and update — index keys are stable
    /// after creation (email and account number never change).
    pub fn put_account(&self, account: &Account) -> StoreResult<()> {
        let key = id_key(&account.id);
        self.accounts.insert(key, enc(account)?)?;
        self.account_numbers
            .insert(account.account_number.as_bytes(), &key)?;
        self.emails.insert(account.email.as_bytes(), &key)?;
        Ok(())
    }

    pub fn get_account(&self, id: &AccountId) -> StoreResult<Option<Account>> {
        match self.accounts.get(id_key(id))? {
            Some(bytes) => Ok(Some(dec(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Resolve an account by its displayed 10-digit number. Exact match on
    /// the index tree — never a scan.
    pub fn get_account_by_number(&self, account_number: &str) -> StoreResult<Option<Account>> {
        self.resolve_index(&self.account_numbers, account_number.as_bytes())
    }

    /// Resolve an account by login email (case-insensitive).
    pub fn get_account_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        self.resolve_index(&self.emails, email.to_lowercase().as_bytes())
    }

    fn resolve_index(&self, index: &Tree, key: &[u8]) -> StoreResult<Option<Account>> {
        match index.get(key)? {
            Some(id_bytes) => match self.accounts.get(&id_bytes)? {
                Some(bytes) => Ok(Some(dec(&bytes)?)),
                // Dangling index entry: the account was removed out from
                // under the index. Treat as absent.
                None => Ok(None),
            },
            None => Ok(None),
        }
    }

    /// Remove an account record and its index entries. Does not cascade —
    /// the directory removes cards, KYC, credentials, and chats explicitly.
    pub fn remove_account(&self, account: &Account) -> StoreResult<()> {
        self.accounts.remove(id_key(&account.id))?;
        self.account_numbers
            .remove(account.account_number.as_bytes())?;
        self.emails.remove(account.email.as_bytes())?;
        Ok(())
    }

    /// All accounts, unordered. The admin console's user listing.
    pub fn all_accounts(&self) -> StoreResult<Vec<Account>> {
        let mut out = Vec::new();
        for entry in self.accounts.iter() {
            let (_, bytes) = entry?;
            out.push(dec(&bytes)?);
        }
        Ok(out)
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    // -- Transaction operations ---------------------------------------------

    pub fn get_transaction(&self, id: &Uuid) -> StoreResult<Option<TransactionRecord>> {
        match self.transactions.get(id_key(id))? {
            Some(bytes) => Ok(Some(dec(&bytes)?)),
            None => Ok(None),
        }
    }

    /// An account's statement, newest first, up to `limit` entries.
    pub fn account_transactions(
        &self,
        account_id: &AccountId,
        limit: usize,
    ) -> StoreResult<Vec<TransactionRecord>> {
        let mut out = Vec::new();
        for entry in self.account_txs.scan_prefix(account_id.as_bytes()).rev() {
            if out.len() == limit {
                break;
            }
            let (_, tx_id) = entry?;
            if let Some(bytes) = self.transactions.get(&tx_id)? {
                out.push(dec(&bytes)?);
            }
        }
        Ok(out)
    }

    /// Every transaction in the store, newest first, up to `limit`.
    /// Admin console only — customers see their own statement.
    pub fn all_transactions(&self, limit: usize) -> StoreResult<Vec<TransactionRecord>> {
        let mut out: Vec<TransactionRecord> = Vec::new();
        for entry in self.transactions.iter() {
            let (_, bytes) = entry?;
            out.push(dec(&bytes)?);
        }
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        out.truncate(limit);
        Ok(out)
    }

    /// Hard-delete a log entry (admin console). Removes the statement index
    /// entry alongside the record.
    pub fn remove_transaction(&self, record: &TransactionRecord) -> StoreResult<()> {
        self.transactions.remove(id_key(&record.id))?;
        self.account_txs.remove(timeline_key(
            &record.account_id,
            record.timestamp.timestamp_micros(),
            &record.id,
        ))?;
        Ok(())
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    // -- Card operations ----------------------------------------------------

    pub fn put_card(&self, card: &Card) -> StoreResult<()> {
        let key = id_key(&card.id);
        self.cards.insert(key, enc(card)?)?;
        self.account_cards
            .insert(card.account_id.as_bytes(), &key)?;
        Ok(())
    }

    /// The account's card, if one has been issued.
    pub fn card_for_account(&self, account_id: &AccountId) -> StoreResult<Option<Card>> {
        match self.account_cards.get(account_id.as_bytes())? {
            Some(card_id) => match self.cards.get(&card_id)? {
                Some(bytes) => Ok(Some(dec(&bytes)?)),
                None => Ok(None),
            },
            None => Ok(None),
        }
    }

    pub fn remove_card_for_account(&self, account_id: &AccountId) -> StoreResult<()> {
        if let Some(card_id) = self.account_cards.remove(account_id.as_bytes())? {
            self.cards.remove(&card_id)?;
        }
        Ok(())
    }

    // -- KYC operations -----------------------------------------------------

    pub fn put_kyc(&self, record: &KycRecord) -> StoreResult<()> {
        self.kyc
            .insert(record.account_id.as_bytes(), enc(record)?)?;
        Ok(())
    }

    pub fn get_kyc(&self, account_id: &AccountId) -> StoreResult<Option<KycRecord>> {
        match (self.kyc.get(account_id.as_bytes()))? {
            Some(bytes) => Ok(Some(dec(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Every KYC submission — the admin review queue.
    pub fn all_kyc(&self) -> StoreResult<Vec<KycRecord>> {
        let mut out = Vec::new();
        for entry in self.kyc.iter() {
            let (_, bytes) = entry?;
            out.push(dec(&bytes)?);
        }
        Ok(out)
    }

    pub fn remove_kyc(&self, account_id: &AccountId) -> StoreResult<()> {
        self.kyc.remove(account_id.as_bytes())?;
        Ok(())
    }

    // -- Credential operations ----------------------------------------------

    pub fn put_credential_bytes(&self, account_id: &AccountId, bytes: Vec<u8>) -> StoreResult<()> {
        self.credentials.insert(account_id.as_bytes(), bytes)?;
        Ok(())
    }

    pub fn get_credential_bytes(&self, account_id: &AccountId) -> StoreResult<Option<Vec<u8>>> {
        Ok(self
            .credentials
            .get(account_id.as_bytes())?
            .map(|ivec| ivec.to_vec()))
    }

    pub fn remove_credentials(&self, account_id: &AccountId) -> StoreResult<()> {
        self.credentials.remove(account_id.as_bytes())?;
        Ok(())
    }

    // -- Chat operations ----------------------------------------------------

    pub fn put_chat_message(&self, message: &ChatMessage) -> StoreResult<()> {
        let key = timeline_key(
            &message.account_id,
            message.sent_at.timestamp_micros(),
            &message.id,
        );
        self.chats.insert(key, enc(message)?)?;
        Ok(())
    }

    /// An account's support thread, oldest first.
    pub fn chat_thread(&self, account_id: &AccountId) -> StoreResult<Vec<ChatMessage>> {
        let mut out = Vec::new();
        for entry in self.chats.scan_prefix(account_id.as_bytes()) {
            let (_, bytes) = entry?;
            out.push(dec(&bytes)?);
        }
        Ok(out)
    }

    pub fn remove_chat_thread(&self, account_id: &AccountId) -> StoreResult<()> {
        let keys: Vec<_> = self
            .chats
            .scan_prefix(account_id.as_bytes())
            .keys()
            .collect::<Result<_, _>>()?;
        for key in keys {
            self.chats.remove(key)?;
        }
        Ok(())
    }

    // -- Utility ------------------------------------------------------------

    /// Block until all pending writes are durable on disk.
    pub fn flush(&self) -> StoreResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AccountType, CardType, ChatSender, KycStatus, TransactionKind,
    };
    use rust_decimal::Decimal;

    fn sample_account(number: &str, email: &str) -> Account {
        Account::open(
            number.into(),
            email.into(),
            "Test User".into(),
            "+1 555 0100".into(),
            "1990-01-01".into(),
            "1 Test Way".into(),
            "US".into(),
            AccountType::Savings,
        )
    }

    #[test]
    fn open_temporary_database() {
        let db = BankDb::open_temporary().expect("temp db");
        assert_eq!(db.account_count(), 0);
        assert_eq!(db.transaction_count(), 0);
    }

    #[test]
    fn open_persistent_database_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let account = sample_account("1000200030", "persist@example.com");
        {
            let db = BankDb::open(dir.path()).expect("open");
            db.put_account(&account).unwrap();
            db.flush().unwrap();
        }
        let db = BankDb::open(dir.path()).expect("reopen");
        let found = db.get_account(&account.id).unwrap().expect("account");
        assert_eq!(found.email, "persist@example.com");
    }

    #[test]
    fn account_index_lookups() {
        let db = BankDb::open_temporary().unwrap();
        let account = sample_account("1000200030", "Alice@Example.com");
        db.put_account(&account).unwrap();

        let by_number = db
            .get_account_by_number("1000200030")
            .unwrap()
            .expect("by number");
        assert_eq!(by_number.id, account.id);

        // Email lookup is case-insensitive.
        let by_email = db
            .get_account_by_email("ALICE@example.COM")
            .unwrap()
            .expect("by email");
        assert_eq!(by_email.id, account.id);

        // Exact match only — a prefix of the number resolves nothing.
        assert!(db.get_account_by_number("10002000").unwrap().is_none());
    }

    #[test]
    fn remove_account_clears_indexes() {
        let db = BankDb::open_temporary().unwrap();
        let account = sample_account("1000200030", "gone@example.com");
        db.put_account(&account).unwrap();
        db.remove_account(&account).unwrap();

        assert!(db.get_account(&account.id).unwrap().is_none());
        assert!(db.get_account_by_number("1000200030").unwrap().is_none());
        assert!(db.get_account_by_email("gone@example.com").unwrap().is_none());
    }

    #[test]
    fn statement_listing_is_newest_first_and_limited() {
        let db = BankDb::open_temporary().unwrap();
        let account = sample_account("1000200030", "txs@example.com");
        db.put_account(&account).unwrap();

        // Write entries directly with strictly increasing timestamps.
        for i in 0..5i64 {
            let mut rec = TransactionRecord::new(
                account.id,
                TransactionKind::Deposit,
                Decimal::from(i + 1),
            );
            rec.timestamp = chrono::Utc::now() + chrono::Duration::milliseconds(i);
            let key = timeline_key(&account.id, rec.timestamp.timestamp_micros(), &rec.id);
            db.transactions.insert(id_key(&rec.id), enc(&rec).unwrap()).unwrap();
            db.account_txs.insert(key, &id_key(&rec.id)).unwrap();
        }

        let listing = db.account_transactions(&account.id, 3).unwrap();
        assert_eq!(listing.len(), 3);
        assert_eq!(listing[0].amount, Decimal::from(5));
        assert_eq!(listing[2].amount, Decimal::from(3));
    }

    #[test]
    fn remove_transaction_clears_statement_index() {
        let db = BankDb::open_temporary().unwrap();
        let account = sample_account("1000200030", "del@example.com");
        db.put_account(&account).unwrap();

        let rec = TransactionRecord::new(account.id, TransactionKind::Deposit, Decimal::ONE);
        let key = timeline_key(&account.id, rec.timestamp.timestamp_micros(), &rec.id);
        db.transactions.insert(id_key(&rec.id), enc(&rec).unwrap()).unwrap();
        db.account_txs.insert(key, &id_key(&rec.id)).unwrap();

        db.remove_transaction(&rec).unwrap();
        assert!(db.get_transaction(&rec.id).unwrap().is_none());
        assert!(db.account_transactions(&account.id, 10).unwrap().is_empty());
    }

    #[test]
    fn card_index_roundtrip() {
        let db = BankDb::open_temporary().unwrap();
        let account = sample_account("1000200030", "card@example.com");
        db.put_account(&account).unwrap();

        assert!(db.card_for_account(&account.id).unwrap().is_none());

        let card = Card::issue(account.id, CardType::Virtual);
        db.put_card(&card).unwrap();
        let found = db.card_for_account(&account.id).unwrap().expect("card");
        assert_eq!(found.id, card.id);

        db.remove_card_for_account(&account.id).unwrap();
        assert!(db.card_for_account(&account.id).unwrap().is_none());
    }

    #[test]
    fn kyc_roundtrip() {
        let db = BankDb::open_temporary().unwrap();
        let account = sample_account("1000200030", "kyc@example.com");
        let rec = KycRecord::submitted(
            account.id,
            "https://img/f.jpg".into(),
            "https://img/b.jpg".into(),
            "https://img/s.jpg".into(),
        );
        db.put_kyc(&rec).unwrap();

        let found = db.get_kyc(&account.id).unwrap().expect("kyc");
        assert_eq!(found.status, KycStatus::UnderReview);
        assert_eq!(db.all_kyc().unwrap().len(), 1);
    }

    #[test]
    fn chat_thread_ordering() {
        let db = BankDb::open_temporary().unwrap();
        let account = sample_account("1000200030", "chat@example.com");

        for (i, body) in ["hello", "anyone there?", "hi, how can we help?"]
            .iter()
            .enumerate()
        {
            let mut msg = ChatMessage::new(
                account.id,
                if i == 2 {
                    ChatSender::Support
                } else {
                    ChatSender::Customer
                },
                body.to_string(),
            );
            msg.sent_at = chrono::Utc::now() + chrono::Duration::milliseconds(i as i64);
            db.put_chat_message(&msg).unwrap();
        }

        let thread = db.chat_thread(&account.id).unwrap();
        assert_eq!(thread.len(), 3);
        assert_eq!(thread[0].body, "hello");
        assert_eq!(thread[2].sender, ChatSender::Support);

        db.remove_chat_thread(&account.id).unwrap();
        assert!(db.chat_thread(&account.id).unwrap().is_empty());
    }
}
