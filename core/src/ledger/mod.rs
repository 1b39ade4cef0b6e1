//! # Ledger — Money Movement
//!
//! Every balance mutation in the bank goes through this module. There is no
//! second path: deposits, administrative debits, peer transfers, bill
//! payments, card purchases, international transfers, and administrative
//! balance edits all run inside the same atomic section over the accounts,
//! transactions, and statement-index trees.
//!
//! ## The atomic section
//!
//! An operation reads the freshest committed balance(s), validates, writes
//! the new balance(s), and appends the audit record(s) — all inside one sled
//! multi-tree transaction. The store retries the section when a concurrent
//! transaction touched the same records, so a sufficiency check can never
//! pass against a stale balance. A validation failure aborts the whole
//! section: no partial writes, no moved-but-unlogged money.
//!
//! ## Invariants
//!
//! - Conservation: a peer transfer of `a` moves exactly `a` from sender to
//!   recipient; the sum of the two balances is unchanged.
//! - A transfer appends exactly two records — Outgoing on the sender,
//!   Incoming on the recipient — with equal amounts, each naming the other
//!   side, sharing one `transfer_id`.
//! - A non-override debit of more than the available balance aborts with
//!   [`LedgerError::InsufficientFunds`] and changes nothing.
//! - An override debit may drive the balance negative. That is deliberate
//!   passthrough for administrative corrections, not a bug; there is no
//!   clamp at zero.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sled::transaction::{
    ConflictableTransactionError, TransactionError, TransactionalTree, Transactional,
};
use uuid::Uuid;

use crate::config;
use crate::model::{
    Account, AccountId, Card, CardType, Counterparty, TransactionId, TransactionKind,
    TransactionRecord, TransactionStatus, WireDetails,
};
use crate::store::db::{dec, enc, id_key, timeline_key};
use crate::store::{BankDb, StoreError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced by money-movement operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The amount failed validation (zero, negative).
    #[error("invalid amount: {0}")]
    InvalidAmount(Decimal),

    /// The operating account does not exist.
    #[error("account not found")]
    AccountNotFound,

    /// The transfer recipient's account number resolved to nothing.
    #[error("recipient account not found")]
    RecipientNotFound,

    /// The recipient account number is the sender's own.
    #[error("cannot transfer to your own account")]
    SelfTransfer,

    /// The balance cannot cover the requested debit. Callers use this
    /// sentinel to surface a retry-with-override path for admin debits.
    #[error("insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds {
        available: Decimal,
        requested: Decimal,
    },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

type TxTree<'a> = &'a TransactionalTree;
type Abortable<T> = Result<T, ConflictableTransactionError<LedgerError>>;

fn abort<T>(err: LedgerError) -> Abortable<T> {
    Err(ConflictableTransactionError::Abort(err))
}

// ---------------------------------------------------------------------------
// Receipts
// ---------------------------------------------------------------------------

/// Outcome of a single-sided movement (deposit, debit, payment).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Receipt {
    pub transaction_id: TransactionId,
    pub account_id: AccountId,
    pub amount: Decimal,
    pub new_balance: Decimal,
}

/// Outcome of a peer transfer, carrying the display values for the
/// confirmation view.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub transfer_id: Uuid,
    pub amount: Decimal,
    pub sender_new_balance: Decimal,
    pub recipient_name: String,
    pub recipient_account_number: String,
    pub outgoing_transaction_id: TransactionId,
    pub incoming_transaction_id: TransactionId,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// The money-movement engine. Cheap to clone — tree handles are shared.
#[derive(Clone)]
pub struct Ledger {
    db: BankDb,
}

impl Ledger {
    pub fn new(db: BankDb) -> Self {
        Self { db }
    }

    // -- Operations ---------------------------------------------------------

    /// Credits `amount` to the account and appends a `Deposit` record.
    pub fn deposit(
        &self,
        account_id: AccountId,
        amount: Decimal,
        note: &str,
    ) -> Result<Receipt, LedgerError> {
        validate_amount(amount)?;

        self.run(|accounts, txs, index| {
            let mut account = read_account(accounts, &account_id)?;
            account.balance += amount;
            write_account(accounts, &account)?;

            let mut record = TransactionRecord::new(account_id, TransactionKind::Deposit, amount);
            record.note = note.to_string();
            record.balance_after = Some(account.balance);
            append_record(txs, index, &record)?;

            Ok(Receipt {
                transaction_id: record.id,
                account_id,
                amount,
                new_balance: account.balance,
            })
        })
    }

    /// Debits `amount` from the account and appends an `Admin Debit` record.
    ///
    /// With `override_insufficient` unset, a debit past the available
    /// balance aborts with [`LedgerError::InsufficientFunds`]. With it set,
    /// the debit proceeds and the balance goes negative.
    pub fn admin_debit(
        &self,
        account_id: AccountId,
        amount: Decimal,
        note: &str,
        override_insufficient: bool,
    ) -> Result<Receipt, LedgerError> {
        validate_amount(amount)?;

        self.run(|accounts, txs, index| {
            let mut account = read_account(accounts, &account_id)?;
            if account.balance < amount && !override_insufficient {
                return abort(LedgerError::InsufficientFunds {
                    available: account.balance,
                    requested: amount,
                });
            }
            account.balance -= amount;
            write_account(accounts, &account)?;

            let mut record =
                TransactionRecord::new(account_id, TransactionKind::AdminDebit, amount);
            record.note = note.to_string();
            record.balance_after = Some(account.balance);
            append_record(txs, index, &record)?;

            Ok(Receipt {
                transaction_id: record.id,
                account_id,
                amount,
                new_balance: account.balance,
            })
        })
    }

    /// Moves `amount` from the sender to the holder of
    /// `recipient_account_number`, atomically, and appends both legs of the
    /// audit trail in the same section.
    pub fn transfer(
        &self,
        sender_id: AccountId,
        recipient_account_number: &str,
        amount: Decimal,
        note: &str,
    ) -> Result<TransferReceipt, LedgerError> {
        validate_amount(amount)?;

        // Resolution happens outside the atomic section — it's a lookup,
        // not a mutation. Balances are re-read fresh inside.
        let sender = self
            .db
            .get_account(&sender_id)?
            .ok_or(LedgerError::AccountNotFound)?;
        if sender.account_number == recipient_account_number {
            return Err(LedgerError::SelfTransfer);
        }
        let recipient = self
            .db
            .get_account_by_number(recipient_account_number)?
            .ok_or(LedgerError::RecipientNotFound)?;
        let recipient_id = recipient.id;

        self.run(|accounts, txs, index| {
            let mut sender = read_account(accounts, &sender_id)?;
            let mut recipient = read_account(accounts, &recipient_id)?;

            // Sufficiency is checked against the freshest committed value,
            // not the balance observed at form-submit time.
            if sender.balance < amount {
                return abort(LedgerError::InsufficientFunds {
                    available: sender.balance,
                    requested: amount,
                });
            }

            sender.balance -= amount;
            recipient.balance += amount;
            write_account(accounts, &sender)?;
            write_account(accounts, &recipient)?;

            let transfer_id = Uuid::new_v4();

            let mut outgoing =
                TransactionRecord::new(sender.id, TransactionKind::TransferOutgoing, amount);
            outgoing.counterparty = Some(Counterparty {
                name: recipient.name.clone(),
                account_number: recipient.account_number.clone(),
            });
            outgoing.note = note.to_string();
            outgoing.balance_after = Some(sender.balance);
            outgoing.transfer_id = Some(transfer_id);

            let mut incoming =
                TransactionRecord::new(recipient.id, TransactionKind::TransferIncoming, amount);
            incoming.counterparty = Some(Counterparty {
                name: sender.name.clone(),
                account_number: sender.account_number.clone(),
            });
            incoming.note = note.to_string();
            incoming.balance_after = Some(recipient.balance);
            incoming.transfer_id = Some(transfer_id);

            append_record(txs, index, &outgoing)?;
            append_record(txs, index, &incoming)?;

            Ok(TransferReceipt {
                transfer_id,
                amount,
                sender_new_balance: sender.balance,
                recipient_name: recipient.name.clone(),
                recipient_account_number: recipient.account_number.clone(),
                outgoing_transaction_id: outgoing.id,
                incoming_transaction_id: incoming.id,
            })
        })
    }

    /// Debits a user-entered amount toward a named biller.
    pub fn pay_bill(
        &self,
        account_id: AccountId,
        biller: &str,
        biller_reference: &str,
        amount: Decimal,
    ) -> Result<Receipt, LedgerError> {
        validate_amount(amount)?;

        self.run(|accounts, txs, index| {
            let mut account = read_account(accounts, &account_id)?;
            if account.balance < amount {
                return abort(LedgerError::InsufficientFunds {
                    available: account.balance,
                    requested: amount,
                });
            }
            account.balance -= amount;
            write_account(accounts, &account)?;

            let mut record =
                TransactionRecord::new(account_id, TransactionKind::BillPayment, amount);
            record.counterparty = Some(Counterparty {
                name: biller.to_string(),
                account_number: biller_reference.to_string(),
            });
            record.balance_after = Some(account.balance);
            append_record(txs, index, &record)?;

            Ok(Receipt {
                transaction_id: record.id,
                account_id,
                amount,
                new_balance: account.balance,
            })
        })
    }

    /// Debits the flat card price and, on success, issues a card.
    ///
    /// The card record itself is created after the section commits: card
    /// issuance is a side effect of the successful debit, not part of the
    /// balance invariant.
    pub fn purchase_card(
        &self,
        account_id: AccountId,
        card_type: CardType,
    ) -> Result<(Receipt, Card), LedgerError> {
        let price = Decimal::from(config::CARD_PRICE_USD);

        let receipt = self.run(|accounts, txs, index| {
            let mut account = read_account(accounts, &account_id)?;
            if account.balance < price {
                return abort(LedgerError::InsufficientFunds {
                    available: account.balance,
                    requested: price,
                });
            }
            account.balance -= price;
            write_account(accounts, &account)?;

            let mut record =
                TransactionRecord::new(account_id, TransactionKind::CardPurchase, price);
            record.note = format!("{card_type} card issuance");
            record.balance_after = Some(account.balance);
            append_record(txs, index, &record)?;

            Ok(Receipt {
                transaction_id: record.id,
                account_id,
                amount: price,
                new_balance: account.balance,
            })
        })?;

        let card = Card::issue(account_id, card_type);
        self.db.put_card(&card)?;
        Ok((receipt, card))
    }

    /// Debits the full amount for an outbound wire and appends an
    /// `International Transfer` record held in `Pending Review`.
    #[allow(clippy::too_many_arguments)]
    pub fn international_transfer(
        &self,
        account_id: AccountId,
        recipient_name: &str,
        wire: WireDetails,
        amount: Decimal,
        note: &str,
    ) -> Result<Receipt, LedgerError> {
        validate_amount(amount)?;

        self.run(|accounts, txs, index| {
            let mut account = read_account(accounts, &account_id)?;
            if account.balance < amount {
                return abort(LedgerError::InsufficientFunds {
                    available: account.balance,
                    requested: amount,
                });
            }
            account.balance -= amount;
            write_account(accounts, &account)?;

            let mut record = TransactionRecord::new(
                account_id,
                TransactionKind::InternationalTransfer,
                amount,
            );
            record.counterparty = Some(Counterparty {
                name: recipient_name.to_string(),
                account_number: wire.iban.clone(),
            });
            record.wire = Some(wire.clone());
            record.note = note.to_string();
            record.status = TransactionStatus::PendingReview;
            record.balance_after = Some(account.balance);
            append_record(txs, index, &record)?;

            Ok(Receipt {
                transaction_id: record.id,
                account_id,
                amount,
                new_balance: account.balance,
            })
        })
    }

    /// Administrative absolute balance edit. Atomic, but appends no record —
    /// edits are corrections, not movements.
    pub fn set_balance(
        &self,
        account_id: AccountId,
        new_balance: Decimal,
    ) -> Result<Account, LedgerError> {
        self.run(|accounts, _txs, _index| {
            let mut account = read_account(accounts, &account_id)?;
            account.balance = new_balance;
            write_account(accounts, &account)?;
            Ok(account)
        })
    }

    // -- The atomic section -------------------------------------------------

    /// Runs `op` inside one transaction over the accounts, transactions,
    /// and statement-index trees. sled retries on conflict; an `Abort`
    /// surfaces as the contained [`LedgerError`] with nothing written.
    fn run<A>(
        &self,
        op: impl Fn(TxTree<'_>, TxTree<'_>, TxTree<'_>) -> Abortable<A>,
    ) -> Result<A, LedgerError> {
        let (accounts, transactions, account_txs) = self.db.money_trees();
        (accounts, transactions, account_txs)
            .transaction(|(accounts, txs, index)| op(accounts, txs, index))
            .map_err(|err| match err {
                TransactionError::Abort(ledger_err) => ledger_err,
                TransactionError::Storage(sled_err) => {
                    LedgerError::Store(StoreError::Sled(sled_err))
                }
            })
    }
}

// ---------------------------------------------------------------------------
// Transactional helpers
// ---------------------------------------------------------------------------

fn validate_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(amount));
    }
    Ok(())
}

fn read_account(accounts: TxTree<'_>, id: &AccountId) -> Abortable<Account> {
    match accounts.get(&id_key(id)[..])? {
        Some(bytes) => dec(&bytes).map_err(|e| ConflictableTransactionError::Abort(e.into())),
        None => abort(LedgerError::AccountNotFound),
    }
}

fn write_account(accounts: TxTree<'_>, account: &Account) -> Abortable<()> {
    let bytes = enc(account).map_err(|e| ConflictableTransactionError::Abort(e.into()))?;
    accounts.insert(&id_key(&account.id)[..], bytes)?;
    Ok(())
}

fn append_record(
    txs: TxTree<'_>,
    index: TxTree<'_>,
    record: &TransactionRecord,
) -> Abortable<()> {
    let bytes = enc(record).map_err(|e| ConflictableTransactionError::Abort(e.into()))?;
    txs.insert(&id_key(&record.id)[..], bytes)?;
    index.insert(
        timeline_key(
            &record.account_id,
            record.timestamp.timestamp_micros(),
            &record.id,
        ),
        id_key(&record.id).to_vec(),
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AccountType;
    use std::str::FromStr;

    fn dec_str(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn setup() -> (BankDb, Ledger) {
        let db = BankDb::open_temporary().expect("temp db");
        let ledger = Ledger::new(db.clone());
        (db, ledger)
    }

    fn seeded_account(db: &BankDb, number: &str, email: &str, balance: &str) -> Account {
        let mut account = Account::open(
            number.into(),
            email.into(),
            format!("Holder {number}"),
            "+1 555 0100".into(),
            "1990-01-01".into(),
            "1 Test Way".into(),
            "US".into(),
            AccountType::Checking,
        );
        account.balance = dec_str(balance);
        db.put_account(&account).unwrap();
        account
    }

    // -- Deposit ------------------------------------------------------------

    #[test]
    fn deposit_credits_exactly_amount_and_logs() {
        let (db, ledger) = setup();
        let acc = seeded_account(&db, "1000000001", "a@x.com", "10.00");

        let receipt = ledger.deposit(acc.id, dec_str("25.50"), "top up").unwrap();
        assert_eq!(receipt.new_balance, dec_str("35.50"));

        let stored = db.get_account(&acc.id).unwrap().unwrap();
        assert_eq!(stored.balance, dec_str("35.50"));

        let statement = db.account_transactions(&acc.id, 10).unwrap();
        assert_eq!(statement.len(), 1);
        assert_eq!(statement[0].kind, TransactionKind::Deposit);
        assert_eq!(statement[0].amount, dec_str("25.50"));
        assert_eq!(statement[0].status, TransactionStatus::Successful);
        assert_eq!(statement[0].balance_after, Some(dec_str("35.50")));
        assert_eq!(statement[0].note, "top up");
    }

    #[test]
    fn deposit_rejects_non_positive_amounts() {
        let (db, ledger) = setup();
        let acc = seeded_account(&db, "1000000001", "a@x.com", "10.00");

        for bad in ["0", "-5.00"] {
            let err = ledger.deposit(acc.id, dec_str(bad), "").unwrap_err();
            assert!(matches!(err, LedgerError::InvalidAmount(_)));
        }
        // Nothing moved, nothing logged.
        assert_eq!(db.get_account(&acc.id).unwrap().unwrap().balance, dec_str("10.00"));
        assert!(db.account_transactions(&acc.id, 10).unwrap().is_empty());
    }

    #[test]
    fn deposit_to_unknown_account_fails() {
        let (_db, ledger) = setup();
        let err = ledger
            .deposit(Uuid::new_v4(), dec_str("5.00"), "")
            .unwrap_err();
        assert!(matches!(err, LedgerError::AccountNotFound));
    }

    // -- Admin debit --------------------------------------------------------

    #[test]
    fn debit_without_override_requires_sufficient_funds() {
        // Spec scenario: debit 500.00 against 200.00 without override.
        let (db, ledger) = setup();
        let acc = seeded_account(&db, "1000000001", "a@x.com", "200.00");

        let err = ledger
            .admin_debit(acc.id, dec_str("500.00"), "fee", false)
            .unwrap_err();
        match err {
            LedgerError::InsufficientFunds {
                available,
                requested,
            } => {
                assert_eq!(available, dec_str("200.00"));
                assert_eq!(requested, dec_str("500.00"));
            }
            other => panic!("expected InsufficientFunds, got {other:?}"),
        }

        // The section aborted entirely: balance unchanged, no record.
        assert_eq!(db.get_account(&acc.id).unwrap().unwrap().balance, dec_str("200.00"));
        assert!(db.account_transactions(&acc.id, 10).unwrap().is_empty());
    }

    #[test]
    fn override_debit_drives_balance_negative() {
        let (db, ledger) = setup();
        let acc = seeded_account(&db, "1000000001", "a@x.com", "200.00");

        let receipt = ledger
            .admin_debit(acc.id, dec_str("500.00"), "correction", true)
            .unwrap();
        // Deliberate passthrough: no clamp at zero.
        assert_eq!(receipt.new_balance, dec_str("-300.00"));
        assert_eq!(
            db.get_account(&acc.id).unwrap().unwrap().balance,
            dec_str("-300.00")
        );

        let statement = db.account_transactions(&acc.id, 10).unwrap();
        assert_eq!(statement.len(), 1);
        assert_eq!(statement[0].kind, TransactionKind::AdminDebit);
    }

    #[test]
    fn debit_within_balance_succeeds() {
        let (db, ledger) = setup();
        let acc = seeded_account(&db, "1000000001", "a@x.com", "200.00");

        let receipt = ledger
            .admin_debit(acc.id, dec_str("50.00"), "monthly fee", false)
            .unwrap();
        assert_eq!(receipt.new_balance, dec_str("150.00"));
    }

    // -- Peer transfer ------------------------------------------------------

    #[test]
    fn transfer_conserves_total_and_logs_both_legs() {
        // Spec scenario: 100.00, transfer 40.00 to a recipient at 10.00.
        let (db, ledger) = setup();
        let sender = seeded_account(&db, "1000000001", "s@x.com", "100.00");
        let recipient = seeded_account(&db, "2000000002", "r@x.com", "10.00");

        let receipt = ledger
            .transfer(sender.id, "2000000002", dec_str("40.00"), "rent")
            .unwrap();

        assert_eq!(receipt.amount, dec_str("40.00"));
        assert_eq!(receipt.sender_new_balance, dec_str("60.00"));
        assert_eq!(receipt.recipient_account_number, "2000000002");

        let s = db.get_account(&sender.id).unwrap().unwrap();
        let r = db.get_account(&recipient.id).unwrap().unwrap();
        assert_eq!(s.balance, dec_str("60.00"));
        assert_eq!(r.balance, dec_str("50.00"));
        // Conservation: the sum is unchanged.
        assert_eq!(s.balance + r.balance, dec_str("110.00"));

        // Exactly one Outgoing on the sender, tagged with the recipient.
        let sender_stmt = db.account_transactions(&sender.id, 10).unwrap();
        assert_eq!(sender_stmt.len(), 1);
        let outgoing = &sender_stmt[0];
        assert_eq!(outgoing.kind, TransactionKind::TransferOutgoing);
        assert_eq!(outgoing.amount, dec_str("40.00"));
        assert_eq!(
            outgoing.counterparty.as_ref().unwrap().account_number,
            "2000000002"
        );

        // Exactly one Incoming on the recipient, tagged with the sender.
        let recipient_stmt = db.account_transactions(&recipient.id, 10).unwrap();
        assert_eq!(recipient_stmt.len(), 1);
        let incoming = &recipient_stmt[0];
        assert_eq!(incoming.kind, TransactionKind::TransferIncoming);
        assert_eq!(incoming.amount, dec_str("40.00"));
        assert_eq!(
            incoming.counterparty.as_ref().unwrap().account_number,
            "1000000001"
        );

        // Both legs identify the same logical transfer.
        assert_eq!(outgoing.transfer_id, incoming.transfer_id);
        assert!(outgoing.transfer_id.is_some());
    }

    #[test]
    fn transfer_insufficient_funds_leaves_both_untouched() {
        let (db, ledger) = setup();
        let sender = seeded_account(&db, "1000000001", "s@x.com", "30.00");
        let recipient = seeded_account(&db, "2000000002", "r@x.com", "10.00");

        let err = ledger
            .transfer(sender.id, "2000000002", dec_str("40.00"), "")
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));

        assert_eq!(db.get_account(&sender.id).unwrap().unwrap().balance, dec_str("30.00"));
        assert_eq!(db.get_account(&recipient.id).unwrap().unwrap().balance, dec_str("10.00"));
        assert!(db.account_transactions(&sender.id, 10).unwrap().is_empty());
        assert!(db.account_transactions(&recipient.id, 10).unwrap().is_empty());
    }

    #[test]
    fn self_transfer_rejected() {
        let (db, ledger) = setup();
        let sender = seeded_account(&db, "1000000001", "s@x.com", "100.00");

        let err = ledger
            .transfer(sender.id, "1000000001", dec_str("10.00"), "")
            .unwrap_err();
        assert!(matches!(err, LedgerError::SelfTransfer));
        assert_eq!(db.get_account(&sender.id).unwrap().unwrap().balance, dec_str("100.00"));
    }

    #[test]
    fn transfer_to_unknown_account_number_rejected() {
        let (db, ledger) = setup();
        let sender = seeded_account(&db, "1000000001", "s@x.com", "100.00");

        let err = ledger
            .transfer(sender.id, "9999999999", dec_str("10.00"), "")
            .unwrap_err();
        assert!(matches!(err, LedgerError::RecipientNotFound));
        assert_eq!(db.get_account(&sender.id).unwrap().unwrap().balance, dec_str("100.00"));
    }

    #[test]
    fn racing_transfers_cannot_overdraw() {
        use std::sync::Arc;
        use std::thread;

        let (db, ledger) = setup();
        let sender = seeded_account(&db, "1000000001", "s@x.com", "100.00");
        seeded_account(&db, "2000000002", "r@x.com", "0.00");

        // Two concurrent transfers of 60.00 from a 100.00 balance: the
        // store serializes the sections, so exactly one can pass the
        // sufficiency check.
        let ledger = Arc::new(ledger);
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                let sender_id = sender.id;
                thread::spawn(move || {
                    ledger.transfer(sender_id, "2000000002", Decimal::from(60), "race")
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let ok = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(ok, 1, "exactly one racing transfer must win");

        let s = db.get_account(&sender.id).unwrap().unwrap();
        assert_eq!(s.balance, Decimal::from(40));
        assert!(s.balance >= Decimal::ZERO);
    }

    // -- Bill payment -------------------------------------------------------

    #[test]
    fn bill_payment_checks_funds_inside_the_section() {
        let (db, ledger) = setup();
        let acc = seeded_account(&db, "1000000001", "a@x.com", "80.00");

        let receipt = ledger
            .pay_bill(acc.id, "City Power & Light", "CPL-4471", dec_str("45.00"))
            .unwrap();
        assert_eq!(receipt.new_balance, dec_str("35.00"));

        let err = ledger
            .pay_bill(acc.id, "City Power & Light", "CPL-4471", dec_str("45.00"))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));

        let stmt = db.account_transactions(&acc.id, 10).unwrap();
        assert_eq!(stmt.len(), 1);
        assert_eq!(stmt[0].kind, TransactionKind::BillPayment);
        assert_eq!(stmt[0].counterparty.as_ref().unwrap().name, "City Power & Light");
    }

    // -- Card purchase ------------------------------------------------------

    #[test]
    fn card_purchase_debits_flat_price_and_issues_card() {
        let (db, ledger) = setup();
        let acc = seeded_account(&db, "1000000001", "a@x.com", "75.00");

        let (receipt, card) = ledger.purchase_card(acc.id, CardType::Virtual).unwrap();
        assert_eq!(receipt.amount, Decimal::from(config::CARD_PRICE_USD));
        assert_eq!(receipt.new_balance, dec_str("25.00"));
        assert_eq!(card.account_id, acc.id);

        let stored = db.card_for_account(&acc.id).unwrap().expect("card stored");
        assert_eq!(stored.id, card.id);

        let stmt = db.account_transactions(&acc.id, 10).unwrap();
        assert_eq!(stmt[0].kind, TransactionKind::CardPurchase);
    }

    #[test]
    fn card_purchase_below_price_rejected_with_no_card() {
        let (db, ledger) = setup();
        let acc = seeded_account(&db, "1000000001", "a@x.com", "49.99");

        let err = ledger.purchase_card(acc.id, CardType::Virtual).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
        assert!(db.card_for_account(&acc.id).unwrap().is_none());
        assert_eq!(db.get_account(&acc.id).unwrap().unwrap().balance, dec_str("49.99"));
    }

    // -- International transfer ---------------------------------------------

    #[test]
    fn international_transfer_debits_and_holds_for_review() {
        let (db, ledger) = setup();
        let acc = seeded_account(&db, "1000000001", "a@x.com", "500.00");

        let wire = WireDetails {
            bank: "Banque Centrale".into(),
            iban: "FR7630006000011234567890189".into(),
            swift: "BNPAFRPP".into(),
            country: "FR".into(),
        };
        let receipt = ledger
            .international_transfer(acc.id, "Jean Dupont", wire, dec_str("120.00"), "invoice 7")
            .unwrap();
        assert_eq!(receipt.new_balance, dec_str("380.00"));

        let stmt = db.account_transactions(&acc.id, 10).unwrap();
        assert_eq!(stmt[0].kind, TransactionKind::InternationalTransfer);
        assert_eq!(stmt[0].status, TransactionStatus::PendingReview);
        assert_eq!(stmt[0].wire.as_ref().unwrap().swift, "BNPAFRPP");
    }

    // -- Administrative balance edit ----------------------------------------

    #[test]
    fn set_balance_writes_absolute_value_without_logging() {
        let (db, ledger) = setup();
        let acc = seeded_account(&db, "1000000001", "a@x.com", "100.00");

        let updated = ledger.set_balance(acc.id, dec_str("999.99")).unwrap();
        assert_eq!(updated.balance, dec_str("999.99"));
        assert_eq!(db.get_account(&acc.id).unwrap().unwrap().balance, dec_str("999.99"));
        // Edits are corrections, not movements — no record appended.
        assert!(db.account_transactions(&acc.id, 10).unwrap().is_empty());
    }
}
