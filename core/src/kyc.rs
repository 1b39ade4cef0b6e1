//! # KYC Desk
//!
//! Submission and review workflow for identity documents. The review status
//! lives on the [`KycRecord`] and is mirrored onto the owning account's
//! `kyc_status` on every change, so dashboards read one record, not two.

use crate::model::{AccountId, KycRecord, KycStatus};
use crate::store::{BankDb, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum KycError {
    #[error("account not found")]
    AccountNotFound,

    #[error("no KYC submission for this account")]
    NotSubmitted,

    /// Review decisions are Approved or Rejected; nothing else.
    #[error("{0} is not a review decision")]
    InvalidDecision(KycStatus),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct KycDesk {
    db: BankDb,
}

impl KycDesk {
    pub fn new(db: BankDb) -> Self {
        Self { db }
    }

    /// Records a document submission and moves the account to
    /// `Under Review`. Resubmission replaces the previous documents and
    /// restarts the review.
    pub fn submit(
        &self,
        account_id: AccountId,
        id_front: String,
        id_back: String,
        selfie: String,
    ) -> Result<KycRecord, KycError> {
        let mut account = self
            .db
            .get_account(&account_id)?
            .ok_or(KycError::AccountNotFound)?;

        let record = KycRecord::submitted(account_id, id_front, id_back, selfie);
        self.db.put_kyc(&record)?;

        account.kyc_status = record.status;
        self.db.put_account(&account)?;

        Ok(record)
    }

    pub fn get(&self, account_id: &AccountId) -> Result<Option<KycRecord>, KycError> {
        Ok(self.db.get_kyc(account_id)?)
    }

    /// The admin review queue: every submission on file.
    pub fn pending_reviews(&self) -> Result<Vec<KycRecord>, KycError> {
        Ok(self.db.all_kyc()?)
    }

    /// Applies an admin decision and mirrors it onto the account.
    pub fn review(
        &self,
        account_id: &AccountId,
        decision: KycStatus,
    ) -> Result<KycRecord, KycError> {
        if !matches!(decision, KycStatus::Approved | KycStatus::Rejected) {
            return Err(KycError::InvalidDecision(decision));
        }

        let mut record = self
            .db
            .get_kyc(account_id)?
            .ok_or(KycError::NotSubmitted)?;
        record.status = decision;
        self.db.put_kyc(&record)?;

        if let Some(mut account) = self.db.get_account(account_id)? {
            account.kyc_status = decision;
            self.db.put_account(&account)?;
        }

        Ok(record)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
