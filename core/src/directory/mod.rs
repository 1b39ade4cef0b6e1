//! # Account Directory
//!
//! Provisioning, lookup, and administration of accounts. The directory owns
//! everything about an account except its balance — balance changes belong
//! to the ledger, and the directory refuses to touch them.

use rand::Rng;

use crate::config;
use crate::model::{Account, AccountId, AccountStatus, AccountType};
use crate::store::{BankDb, StoreError};

/// How many random draws we attempt before conceding the account-number
/// space is unusable. Ten digits give nine billion numbers; hitting this
/// limit means something is very wrong with the store, not with luck.
const ACCOUNT_NUMBER_ATTEMPTS: usize = 32;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// Signup with an email that already has an account.
    #[error("an account already exists for this email")]
    EmailTaken,

    #[error("account not found")]
    AccountNotFound,

    /// Could not draw an unused account number. See
    /// [`ACCOUNT_NUMBER_ATTEMPTS`].
    #[error("unable to allocate an account number")]
    AccountNumberExhausted,

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Profile data collected at signup. Credentials are registered separately
/// with the auth service.
#[derive(Clone, Debug)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: String,
    pub address: String,
    pub country: String,
    pub account_type: AccountType,
}

/// Customer-editable profile fields. `None` leaves a field unchanged.
#[derive(Clone, Debug, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub avatar_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Directory
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct Directory {
    db: BankDb,
}

impl Directory {
    pub fn new(db: BankDb) -> Self {
        Self { db }
    }

    /// Opens a new account: unique email, generated 10-digit account
    /// number, zero balance, `Active` status.
    pub fn open_account(&self, form: SignupForm) -> Result<Account, DirectoryError> {
        if self.db.get_account_by_email(&form.email)?.is_some() {
            return Err(DirectoryError::EmailTaken);
        }

        let account_number = self.allocate_account_number()?;
        let account = Account::open(
            account_number,
            form.email,
            form.name,
            form.phone,
            form.date_of_birth,
            form.address,
            form.country,
            form.account_type,
        );
        self.db.put_account(&account)?;
        Ok(account)
    }

    pub fn get(&self, id: &AccountId) -> Result<Account, DirectoryError> {
        self.db
            .get_account(id)?
            .ok_or(DirectoryError::AccountNotFound)
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<Account>, DirectoryError> {
        Ok(self.db.get_account_by_email(email)?)
    }

    pub fn find_by_number(&self, account_number: &str) -> Result<Option<Account>, DirectoryError> {
        Ok(self.db.get_account_by_number(account_number)?)
    }

    /// The admin console's user listing.
    pub fn list(&self) -> Result<Vec<Account>, DirectoryError> {
        Ok(self.db.all_accounts()?)
    }

    /// Applies customer-editable profile changes.
    pub fn update_profile(
        &self,
        id: &AccountId,
        update: ProfileUpdate,
    ) -> Result<Account, DirectoryError> {
        let mut account = self.get(id)?;
        if let Some(name) = update.name {
            account.name = name;
        }
        if let Some(phone) = update.phone {
            account.phone = phone;
        }
        if let Some(address) = update.address {
            account.address = address;
        }
        if let Some(avatar_url) = update.avatar_url {
            account.avatar_url = Some(avatar_url);
        }
        self.db.put_account(&account)?;
        Ok(account)
    }

    /// Administrative status change (suspend, reinstate, freeze, close).
    pub fn set_status(
        &self,
        id: &AccountId,
        status: AccountStatus,
    ) -> Result<Account, DirectoryError> {
        let mut account = self.get(id)?;
        account.status = status;
        self.db.put_account(&account)?;
        Ok(account)
    }

    /// Administrative rename.
    pub fn rename(&self, id: &AccountId, name: String) -> Result<Account, DirectoryError> {
        let mut account = self.get(id)?;
        account.name = name;
        self.db.put_account(&account)?;
        Ok(account)
    }

    /// Hard removal: the account and everything hanging off it — card, KYC
    /// record, chat thread, credentials — is gone. Transaction log entries
    /// survive; the audit trail outlives the customer.
    pub fn delete_account(&self, id: &AccountId) -> Result<(), DirectoryError> {
        let account = self.get(id)?;
        self.db.remove_card_for_account(id)?;
        self.db.remove_kyc(id)?;
        self.db.remove_chat_thread(id)?;
        self.db.remove_credentials(id)?;
        self.db.remove_account(&account)?;
        Ok(())
    }

    fn allocate_account_number(&self) -> Result<String, DirectoryError> {
        let mut rng = rand::thread_rng();
        for _ in 0..ACCOUNT_NUMBER_ATTEMPTS {
            let candidate = rng
                .gen_range(config::ACCOUNT_NUMBER_MIN..=config::ACCOUNT_NUMBER_MAX)
                .to_string();
            if self.db.get_account_by_number(&candidate)?.is_none() {
                return Ok(candidate);
            }
        }
        Err(DirectoryError::AccountNumberExhausted)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn setup() -> Directory {
        Directory::new(BankDb::open_temporary().expect("temp db"))
    }

    fn form(email: &str) -> SignupForm {
        SignupForm {
            name: "Alice Martin".into(),
            email: email.into(),
            phone: "+1 555 0100".into(),
            date_of_birth: "1990-04-02".into(),
            address: "12 Main St".into(),
            country: "US".into(),
            account_type: AccountType::Savings,
        }
    }

    #[test]
    fn open_account_allocates_ten_digit_number() {
        let dir = setup();
        let account = dir.open_account(form("alice@example.com")).unwrap();

        assert_eq!(account.account_number.len(), 10);
        assert_ne!(account.account_number.as_bytes()[0], b'0');
        assert_eq!(account.balance, Decimal::ZERO);
        assert_eq!(account.status, AccountStatus::Active);

        let found = dir.find_by_number(&account.account_number).unwrap().unwrap();
        assert_eq!(found.id, account.id);
    }

    #[test]
    fn duplicate_email_rejected() {
        let dir = setup();
        dir.open_account(form("alice@example.com")).unwrap();
        let err = dir.open_account(form("Alice@Example.com")).unwrap_err();
        assert!(matches!(err, DirectoryError::EmailTaken));
    }

    #[test]
    fn update_profile_leaves_unset_fields_alone() {
        let dir = setup();
        let account = dir.open_account(form("alice@example.com")).unwrap();

        let updated = dir
            .update_profile(
                &account.id,
                ProfileUpdate {
                    phone: Some("+44 20 7946 0000".into()),
                    avatar_url: Some("https://img.example/a.png".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.phone, "+44 20 7946 0000");
        assert_eq!(updated.avatar_url.as_deref(), Some("https://img.example/a.png"));
        assert_eq!(updated.name, "Alice Martin");
    }

    #[test]
    fn set_status_toggles_suspension() {
        let dir = setup();
        let account = dir.open_account(form("alice@example.com")).unwrap();

        let suspended = dir.set_status(&account.id, AccountStatus::Suspended).unwrap();
        assert_eq!(suspended.status, AccountStatus::Suspended);

        let reinstated = dir.set_status(&account.id, AccountStatus::Active).unwrap();
        assert!(reinstated.is_active());
    }

    #[test]
    fn delete_account_is_hard_removal() {
        let dir = setup();
        let account = dir.open_account(form("alice@example.com")).unwrap();
        let number = account.account_number.clone();

        dir.delete_account(&account.id).unwrap();

        assert!(matches!(
            dir.get(&account.id).unwrap_err(),
            DirectoryError::AccountNotFound
        ));
        assert!(dir.find_by_number(&number).unwrap().is_none());
        assert!(dir.find_by_email("alice@example.com").unwrap().is_none());
    }

    #[test]
    fn delete_unknown_account_errors() {
        let dir = setup();
        let err = dir.delete_account(&uuid::Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, DirectoryError::AccountNotFound));
    }
}
