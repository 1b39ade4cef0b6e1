// Copyright (c) 2026 Centra Financial Technology. MIT License.
// See LICENSE for details.

//! # Centra — Core Banking Library
//!
//! This is the part of the bank that actually moves money. Everything else —
//! the HTTP surface, the dashboards, the email templates — is decoration
//! around the ledger in this crate.
//!
//! ## Architecture
//!
//! The library is split into modules that mirror the concerns of a small
//! retail bank:
//!
//! - **model** — Account, transaction, card, KYC, and chat record types.
//! - **store** — Persistent storage over sled with typed tree accessors.
//! - **ledger** — Money movement: deposits, debits, transfers, payments.
//!   Every balance mutation in the entire system goes through here.
//! - **auth** — Credential storage, session tokens, and the login-time
//!   account status gate.
//! - **directory** — Account provisioning, lookup, and administration.
//! - **kyc** — Document submission and review workflow.
//! - **support** — Per-account chat threads with the support desk.
//! - **notify** — Outbound email through the delivery collaborator.
//! - **config** — Constants. All of them. In one place.
//!
//! ## Design Philosophy
//!
//! 1. One balance field, one mutation path. If it changes a balance and it
//!    isn't in `ledger`, it's a bug.
//! 2. The balance write and its audit record commit in the same atomic
//!    section. Money never moves unlogged.
//! 3. No floating point anywhere near money. `Decimal` or nothing.
//! 4. If it touches money, it has tests. Plural.

pub mod auth;
pub mod config;
pub mod directory;
pub mod kyc;
pub mod ledger;
pub mod model;
pub mod notify;
pub mod store;
pub mod support;
