//! Transaction log entries.
//!
//! A [`TransactionRecord`] describes one money-movement event and is
//! append-only: written in the same atomic section as the balance change it
//! documents, and never mutated afterwards (an admin may hard-delete one,
//! nothing may edit one).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::account::AccountId;

/// Identifier of a single log entry.
pub type TransactionId = Uuid;

// ---------------------------------------------------------------------------
// TransactionKind
// ---------------------------------------------------------------------------

/// Discriminant for the operation a log entry describes.
///
/// The `Display` impl produces the customer-facing tag shown on statements
/// and in the admin console; the wire/API layer uses these strings verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Funds credited to the account by an administrator or an on-ramp.
    Deposit,
    /// Sender leg of a peer transfer.
    #[serde(rename = "Transfer - Outgoing")]
    TransferOutgoing,
    /// Recipient leg of a peer transfer.
    #[serde(rename = "Transfer - Incoming")]
    TransferIncoming,
    /// Debit toward a named biller.
    #[serde(rename = "Bill Payment")]
    BillPayment,
    /// Flat-price virtual card issuance debit.
    #[serde(rename = "Card Purchase")]
    CardPurchase,
    /// Administrative debit (fee, correction), possibly overridden past zero.
    #[serde(rename = "Admin Debit")]
    AdminDebit,
    /// Outbound wire held for manual review.
    #[serde(rename = "International Transfer")]
    InternationalTransfer,
}

impl TransactionKind {
    /// Whether this kind reduces the owning account's balance.
    pub fn is_debit(self) -> bool {
        !matches!(self, Self::Deposit | Self::TransferIncoming)
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deposit => write!(f, "Deposit"),
            Self::TransferOutgoing => write!(f, "Transfer - Outgoing"),
            Self::TransferIncoming => write!(f, "Transfer - Incoming"),
            Self::BillPayment => write!(f, "Bill Payment"),
            Self::CardPurchase => write!(f, "Card Purchase"),
            Self::AdminDebit => write!(f, "Admin Debit"),
            Self::InternationalTransfer => write!(f, "International Transfer"),
        }
    }
}

// ---------------------------------------------------------------------------
// TransactionStatus
// ---------------------------------------------------------------------------

/// Settlement state of a log entry.
///
/// Most entries are born `Successful` — the balance already moved by the
/// time the entry exists. `PendingReview` marks international transfers
/// awaiting manual release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    Pending,
    Successful,
    #[serde(rename = "Pending Review")]
    PendingReview,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Successful => write!(f, "Successful"),
            Self::PendingReview => write!(f, "Pending Review"),
        }
    }
}

// ---------------------------------------------------------------------------
// Counterparty / WireDetails
// ---------------------------------------------------------------------------

/// The other side of a movement, direction-dependent: the recipient on an
/// outgoing leg, the sender on an incoming leg, the biller on a payment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterparty {
    pub name: String,
    /// Account number for peer transfers; a biller reference otherwise.
    pub account_number: String,
}

/// Routing detail carried only by international transfers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireDetails {
    pub bank: String,
    pub iban: String,
    pub swift: String,
    pub country: String,
}

// ---------------------------------------------------------------------------
// TransactionRecord
// ---------------------------------------------------------------------------

/// One append-only money-movement log entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: TransactionId,

    /// The account whose statement this entry belongs to. A peer transfer
    /// produces two records, one per account.
    pub account_id: AccountId,

    pub kind: TransactionKind,

    /// Always positive; `kind` carries the direction.
    pub amount: Decimal,

    pub counterparty: Option<Counterparty>,

    pub wire: Option<WireDetails>,

    pub note: String,

    pub status: TransactionStatus,

    /// Balance immediately after this entry applied, when the writing
    /// operation recorded it.
    pub balance_after: Option<Decimal>,

    /// Shared across the two legs of one peer transfer; `None` elsewhere.
    pub transfer_id: Option<Uuid>,

    pub timestamp: DateTime<Utc>,
}

impl TransactionRecord {
    /// Creates an entry with status `Successful` and no counterparty.
    /// Callers fill in the direction-specific fields before persisting.
    pub fn new(account_id: AccountId, kind: TransactionKind, amount: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            kind,
            amount,
            counterparty: None,
            wire: None,
            note: String::new(),
            status: TransactionStatus::Successful,
            balance_after: None,
            transfer_id: None,
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_display_tags_match_statement_wording() {
        assert_eq!(TransactionKind::Deposit.to_string(), "Deposit");
        assert_eq!(
            TransactionKind::TransferOutgoing.to_string(),
            "Transfer - Outgoing"
        );
        assert_eq!(
            TransactionKind::TransferIncoming.to_string(),
            "Transfer - Incoming"
        );
        assert_eq!(TransactionKind::AdminDebit.to_string(), "Admin Debit");
        assert_eq!(
            TransactionKind::InternationalTransfer.to_string(),
            "International Transfer"
        );
    }

    #[test]
    fn status_display_tags() {
        assert_eq!(TransactionStatus::Successful.to_string(), "Successful");
        assert_eq!(TransactionStatus::PendingReview.to_string(), "Pending Review");
    }

    #[test]
    fn debit_direction() {
        assert!(TransactionKind::AdminDebit.is_debit());
        assert!(TransactionKind::TransferOutgoing.is_debit());
        assert!(TransactionKind::BillPayment.is_debit());
        assert!(!TransactionKind::Deposit.is_debit());
        assert!(!TransactionKind::TransferIncoming.is_debit());
    }

    #[test]
    fn kind_json_uses_statement_tags() {
        assert_eq!(
            serde_json::to_string(&TransactionKind::TransferOutgoing).unwrap(),
            "\"Transfer - Outgoing\""
        );
        let parsed: TransactionKind = serde_json::from_str("\"Admin Debit\"").unwrap();
        assert_eq!(parsed, TransactionKind::AdminDebit);
        assert_eq!(
            serde_json::to_string(&TransactionStatus::PendingReview).unwrap(),
            "\"Pending Review\""
        );
    }

    #[test]
    fn record_bincode_roundtrip() {
        let mut rec = TransactionRecord::new(
            Uuid::new_v4(),
            TransactionKind::TransferOutgoing,
            Decimal::new(4000, 2),
        );
        rec.counterparty = Some(Counterparty {
            name: "Bob".into(),
            account_number: "2000300040".into(),
        });
        rec.transfer_id = Some(Uuid::new_v4());
        let bytes = bincode::serialize(&rec).expect("serialize");
        let back: TransactionRecord = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(rec, back);
        assert_eq!(back.amount, Decimal::new(4000, 2));
    }
}
