//! # Storage Module
//!
//! Persistence for the bank, built on sled's embedded key-value store.
//! All on-disk data flows through [`BankDb`].
//!
//! ## Design Decisions
//!
//! 1. **Exact-match indexes, no scans.** Account-number and email lookups
//!    hit dedicated index trees with the search term as the key. Resolving
//!    a transfer recipient is an equality lookup, never a prefix or range
//!    match.
//!
//! 2. **Bincode for on-disk serialization.** Compact, fast, deterministic.
//!    JSON is for APIs and debugging; bincode is for storage. `Decimal`
//!    fields encode as exact decimal strings (`serde-str`), so no precision
//!    is lost round-tripping money.
//!
//! 3. **The atomic section is sled's multi-tree transaction.** The ledger
//!    runs every balance mutation inside one transaction over the accounts,
//!    transactions, and statement-index trees. sled retries the section on
//!    conflicting concurrent writes; an abort leaves no partial state.

pub mod db;

pub use db::{BankDb, StoreError, StoreResult};
