//! Issued virtual cards.
//!
//! A card carries its own float balance, separate from the account balance;
//! it exists for the card view only and is never touched by transfer logic.

use chrono::{DateTime, Datelike, Months, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::account::AccountId;
use crate::config;

// ---------------------------------------------------------------------------
// CardType / CardStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardType {
    Virtual,
    Physical,
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Virtual => write!(f, "Virtual"),
            Self::Physical => write!(f, "Physical"),
        }
    }
}

/// Holders can freeze and unfreeze their own card at will.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardStatus {
    Active,
    Frozen,
}

impl CardStatus {
    /// The opposite state, for the freeze/unfreeze toggle.
    pub fn toggled(self) -> Self {
        match self {
            Self::Active => Self::Frozen,
            Self::Frozen => Self::Active,
        }
    }
}

impl fmt::Display for CardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Frozen => write!(f, "Frozen"),
        }
    }
}

// ---------------------------------------------------------------------------
// Card
// ---------------------------------------------------------------------------

/// One issued card. Created by the card-purchase operation after the
/// issuance price has been debited from the account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: Uuid,
    pub account_id: AccountId,
    /// 16 digits in spaced groups of four, e.g. `5123 4829 0071 5536`.
    pub card_number: String,
    /// `MM/YY`.
    pub expiry: String,
    pub cvv: String,
    pub card_type: CardType,
    pub status: CardStatus,
    /// Display-only float balance; starts at zero.
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Card {
    /// Issues a fresh `Active` card with generated number, CVV, and expiry.
    pub fn issue(account_id: AccountId, card_type: CardType) -> Self {
        let mut rng = rand::thread_rng();
        let card_number = format!(
            "{} {:04} {:04} {:04}",
            config::CARD_BIN,
            rng.gen_range(0..=9999u16),
            rng.gen_range(0..=9999u16),
            rng.gen_range(0..=9999u16),
        );
        let cvv = format!("{}", rng.gen_range(100..=999u16));

        let valid_until = Utc::now()
            .checked_add_months(Months::new(12 * config::CARD_VALIDITY_YEARS as u32))
            .unwrap_or_else(Utc::now);
        let expiry = format!("{:02}/{:02}", valid_until.month(), valid_until.year() % 100);

        Self {
            id: Uuid::new_v4(),
            account_id,
            card_number,
            expiry,
            cvv,
            card_type,
            status: CardStatus::Active,
            balance: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
