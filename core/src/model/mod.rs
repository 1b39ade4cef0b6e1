//! # Data Model
//!
//! Record types for everything the bank persists. These are the vocabulary
//! of the whole system — the store serializes them, the ledger mutates them,
//! the API serves them.
//!
//! ```text
//! account.rs     — Account record, status, and type enums
//! transaction.rs — Append-only transaction log entries
//! card.rs        — Issued virtual cards
//! kyc.rs         — KYC document submissions and review status
//! chat.rs        — Support chat messages
//! ```
//!
//! One rule governs this module: every field has exactly one canonical name
//! and one canonical type. The loosely-shaped documents of earlier systems
//! (`balance` here, `accountBalance` there, strings standing in for enums)
//! stop at this boundary.

pub mod account;
pub mod card;
pub mod chat;
pub mod kyc;
pub mod transaction;

pub use account::{Account, AccountId, AccountStatus, AccountType};
pub use card::{Card, CardStatus, CardType};
pub use chat::{ChatMessage, ChatSender};
pub use kyc::{KycRecord, KycStatus};
pub use transaction::{
    Counterparty, TransactionId, TransactionKind, TransactionRecord, TransactionStatus,
    WireDetails,
};
