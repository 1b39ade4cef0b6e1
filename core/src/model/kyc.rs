//! KYC document submissions.
//!
//! The images themselves live on the external image host; we store only
//! their URLs. Review status is mirrored onto the owning account so the
//! dashboard can read one record instead of two.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::account::AccountId;

// ---------------------------------------------------------------------------
// KycStatus
// ---------------------------------------------------------------------------

/// Review workflow state. `Pending` means nothing has been submitted yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KycStatus {
    Pending,
    #[serde(rename = "Under Review")]
    UnderReview,
    Approved,
    Rejected,
}

impl fmt::Display for KycStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::UnderReview => write!(f, "Under Review"),
            Self::Approved => write!(f, "Approved"),
            Self::Rejected => write!(f, "Rejected"),
        }
    }
}

// ---------------------------------------------------------------------------
// KycRecord
// ---------------------------------------------------------------------------

/// One submission per account: three document image URLs plus the review
/// status. Resubmission overwrites the previous record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KycRecord {
    pub account_id: AccountId,
    pub id_front: String,
    pub id_back: String,
    pub selfie: String,
    pub status: KycStatus,
    pub submitted_at: DateTime<Utc>,
}

impl KycRecord {
    /// A fresh submission, entering the review queue.
    pub fn submitted(account_id: AccountId, id_front: String, id_back: String, selfie: String) -> Self {
        Self {
            account_id,
            id_front,
            id_back,
            selfie,
            status: KycStatus::UnderReview,
            submitted_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn submission_enters_review() {
        let rec = KycRecord::submitted(
            Uuid::new_v4(),
            "https://img.example/front.jpg".into(),
            "https://img.example/back.jpg".into(),
            "https://img.example/selfie.jpg".into(),
        );
        assert_eq!(rec.status, KycStatus::UnderReview);
    }

    #[test]
    fn status_display_tags() {
        assert_eq!(KycStatus::UnderReview.to_string(), "Under Review");
        assert_eq!(KycStatus::Approved.to_string(), "Approved");
    }
}
