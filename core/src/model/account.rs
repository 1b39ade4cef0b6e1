//! Account records — one per customer.
//!
//! The `balance` field is the single canonical source of truth for a
//! customer's funds. There is deliberately no secondary or legacy balance
//! field anywhere in the system; every read and write path goes through
//! this one attribute, and only the ledger is allowed to change it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::kyc::KycStatus;
use crate::config;

/// Opaque, stable identifier for an account. Never displayed to customers —
/// the `account_number` is the human-facing handle.
pub type AccountId = Uuid;

// ---------------------------------------------------------------------------
// AccountType
// ---------------------------------------------------------------------------

/// Product category chosen at signup. Display-only today; no product logic
/// branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    Savings,
    Checking,
    Business,
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Savings => write!(f, "Savings"),
            Self::Checking => write!(f, "Checking"),
            Self::Business => write!(f, "Business"),
        }
    }
}

// ---------------------------------------------------------------------------
// AccountStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of an account.
///
/// Anything other than `Active` blocks login and all money movement —
/// enforced at the authorization boundary, not just in UI gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountStatus {
    /// Normal operation.
    Active,
    /// Administratively suspended. Reversible.
    Suspended,
    /// Frozen by a compliance or support action. Reversible.
    Frozen,
    /// Closed for good. The record survives until an admin hard-deletes it.
    Closed,
}

impl AccountStatus {
    /// Whether this status permits login and money movement.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Suspended => write!(f, "Suspended"),
            Self::Frozen => write!(f, "Frozen"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// One customer's bank account.
///
/// Created at signup with a zero balance and `Active` status. The profile
/// fields are customer-editable; `status`, `balance`, and `kyc_status` are
/// only touched by the ledger, the directory, and the KYC desk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Stable internal identifier (storage key).
    pub id: AccountId,

    /// 10-digit displayed account number, used for transfer lookups.
    /// Unique via the store's account-number index.
    pub account_number: String,

    /// Login identity. Stored lowercased; unique via the email index.
    pub email: String,

    /// Legal name as entered at signup.
    pub name: String,

    pub phone: String,

    /// Kept as the raw form string; nothing computes on it.
    pub date_of_birth: String,

    pub address: String,

    pub country: String,

    pub account_type: AccountType,

    /// ISO currency code. Always [`config::DEFAULT_CURRENCY`] today.
    pub currency: String,

    /// Available funds. The one and only balance field.
    pub balance: Decimal,

    pub status: AccountStatus,

    pub kyc_status: KycStatus,

    /// Profile image URL on the external image host, if uploaded.
    pub avatar_url: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Creates a fresh `Active` account with a zero balance.
    ///
    /// The caller (the directory) is responsible for generating a unique
    /// account number and maintaining the lookup indexes.
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        account_number: String,
        email: String,
        name: String,
        phone: String,
        date_of_birth: String,
        address: String,
        country: String,
        account_type: AccountType,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_number,
            email: email.to_lowercase(),
            name,
            phone,
            date_of_birth,
            address,
            country,
            account_type,
            currency: config::DEFAULT_CURRENCY.to_string(),
            balance: Decimal::ZERO,
            status: AccountStatus::Active,
            kyc_status: KycStatus::Pending,
            avatar_url: None,
            created_at: Utc::now(),
        }
    }

    /// Whether the account may log in and move money.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Account {
        Account::open(
            "1000200030".into(),
            "Alice@Example.com".into(),
            "Alice Martin".into(),
            "+1 555 0100".into(),
            "1990-04-02".into(),
            "12 Main St".into(),
            "US".into(),
            AccountType::Checking,
        )
    }

    #[test]
    fn open_starts_active_with_zero_balance() {
        let acc = sample();
        assert_eq!(acc.balance, Decimal::ZERO);
        assert_eq!(acc.status, AccountStatus::Active);
        assert_eq!(acc.kyc_status, KycStatus::Pending);
        assert_eq!(acc.currency, "USD");
        assert!(acc.is_active());
    }

    #[test]
    fn open_lowercases_email() {
        assert_eq!(sample().email, "alice@example.com");
    }

    #[test]
    fn only_active_status_is_active() {
        assert!(AccountStatus::Active.is_active());
        assert!(!AccountStatus::Suspended.is_active());
        assert!(!AccountStatus::Frozen.is_active());
        assert!(!AccountStatus::Closed.is_active());
    }

    #[test]
    fn status_display_tags() {
        assert_eq!(AccountStatus::Active.to_string(), "Active");
        assert_eq!(AccountStatus::Suspended.to_string(), "Suspended");
        assert_eq!(AccountStatus::Closed.to_string(), "Closed");
    }

    #[test]
    fn account_bincode_roundtrip() {
        let acc = sample();
        let bytes = bincode::serialize(&acc).expect("serialize");
        let back: Account = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(acc, back);
    }
}
