//! # Configuration & Constants
//!
//! Every magic number in Centra lives here. If you're hardcoding a constant
//! somewhere else, you're doing it wrong and you owe the team coffee.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Branding
// ---------------------------------------------------------------------------

/// Display name used in customer-facing email.
pub const BANK_NAME: &str = "Centra Bank";

/// Default denomination for new accounts. Multi-currency is a someday
/// problem; today every balance is USD.
pub const DEFAULT_CURRENCY: &str = "USD";

// ---------------------------------------------------------------------------
// Account Numbers
// ---------------------------------------------------------------------------

/// Account numbers are 10 decimal digits with a non-zero leading digit,
/// i.e. drawn uniformly from this range.
pub const ACCOUNT_NUMBER_MIN: u64 = 1_000_000_000;
pub const ACCOUNT_NUMBER_MAX: u64 = 9_999_999_999;

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

/// Flat issuance price for a virtual card, in whole USD. Debited from the
/// account balance at purchase time.
pub const CARD_PRICE_USD: i64 = 50;

/// Issuer BIN prefix for generated card numbers.
pub const CARD_BIN: &str = "5123";

/// Issued cards are valid for this many years from purchase.
pub const CARD_VALIDITY_YEARS: i32 = 4;

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// Session token length in raw bytes (hex-encoded on the wire, so the
/// presented token is twice this many characters).
pub const SESSION_TOKEN_BYTES: usize = 32;

/// Sessions expire this long after login. There is no sliding renewal —
/// a day of banking is enough, log in again.
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// sled tree names. Shared between the store and anything that needs to
/// reason about the on-disk layout (nothing else should).
pub mod tree {
    pub const ACCOUNTS: &str = "accounts";
    pub const ACCOUNT_NUMBERS: &str = "account_numbers";
    pub const EMAILS: &str = "emails";
    pub const TRANSACTIONS: &str = "transactions";
    pub const ACCOUNT_TXS: &str = "account_txs";
    pub const CARDS: &str = "cards";
    pub const ACCOUNT_CARDS: &str = "account_cards";
    pub const KYC: &str = "kyc";
    pub const CREDENTIALS: &str = "credentials";
    pub const CHATS: &str = "chats";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_number_range_is_ten_digits() {
        assert_eq!(ACCOUNT_NUMBER_MIN.to_string().len(), 10);
        assert_eq!(ACCOUNT_NUMBER_MAX.to_string().len(), 10);
        assert!(ACCOUNT_NUMBER_MIN < ACCOUNT_NUMBER_MAX);
    }

    #[test]
    fn card_price_is_positive() {
        assert!(CARD_PRICE_USD > 0);
    }
}
