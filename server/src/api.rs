//! # HTTP API
//!
//! Builds the axum router for the customer and admin surfaces. All handlers
//! share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                              | Auth    | Description                    |
//! |--------|-----------------------------------|---------|--------------------------------|
//! | GET    | `/health`                         | —       | Liveness probe                 |
//! | GET    | `/status`                         | —       | Service status summary         |
//! | GET    | `/ws`                             | —       | WebSocket for live events      |
//! | POST   | `/signup`                         | —       | Open an account                |
//! | POST   | `/login`                          | —       | Issue a session token          |
//! | POST   | `/logout`                         | bearer  | Drop the session               |
//! | GET    | `/me`                             | bearer  | Current account                |
//! | PATCH  | `/me/profile`                     | bearer  | Edit profile fields            |
//! | POST   | `/me/password`                    | bearer  | Change password                |
//! | GET    | `/me/transactions`                | bearer  | Statement, newest first        |
//! | GET    | `/me/card`                        | bearer  | Issued card, if any            |
//! | POST   | `/me/card`                        | bearer  | Purchase a card                |
//! | PATCH  | `/me/card`                        | bearer  | Freeze / unfreeze              |
//! | POST   | `/transfers`                      | bearer  | Peer transfer                  |
//! | POST   | `/transfers/international`        | bearer  | Outbound wire (held)           |
//! | POST   | `/bills`                          | bearer  | Bill payment                   |
//! | GET    | `/kyc`                            | bearer  | Own KYC record                 |
//! | POST   | `/kyc`                            | bearer  | Submit KYC documents           |
//! | GET    | `/support/messages`               | bearer  | Support thread                 |
//! | POST   | `/support/messages`               | bearer  | Message support                |
//! | GET    | `/admin/accounts`                 | admin   | List / search accounts         |
//! | GET    | `/admin/accounts/:id`             | admin   | Account detail                 |
//! | PATCH  | `/admin/accounts/:id`             | admin   | Edit name / status / balance   |
//! | DELETE | `/admin/accounts/:id`             | admin   | Hard delete                    |
//! | POST   | `/admin/deposits`                 | admin   | Credit an account              |
//! | POST   | `/admin/debits`                   | admin   | Debit (with override flag)     |
//! | GET    | `/admin/transactions`             | admin   | Global transaction listing     |
//! | DELETE | `/admin/transactions/:id`         | admin   | Hard-delete a log entry        |
//! | GET    | `/admin/kyc`                      | admin   | KYC review queue               |
//! | POST   | `/admin/kyc/:account_id/review`   | admin   | Approve / reject               |
//! | GET    | `/admin/support/:account_id`      | admin   | Customer's support thread      |
//! | POST   | `/admin/support/:account_id`      | admin   | Reply as support               |
//!
//! Monetary amounts travel as decimal strings (`"40.00"`), never floats.
//! Money-movement rejections come back as structured JSON errors; an
//! insufficient-funds rejection is `409 {"error": "insufficient_funds"}`
//! so the admin console can surface the override path.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::{header, HeaderMap, Method, StatusCode},
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use centra_core::auth::{AuthError, AuthService};
use centra_core::directory::{Directory, DirectoryError, ProfileUpdate, SignupForm};
use centra_core::kyc::{KycDesk, KycError};
use centra_core::ledger::{Ledger, LedgerError};
use centra_core::model::{
    Account, AccountStatus, AccountType, CardStatus, CardType, ChatSender, KycStatus, WireDetails,
};
use centra_core::notify::{self, EmailMessage, Mailer};
use centra_core::store::BankDb;
use centra_core::support::{SupportDesk, SupportError};

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone — everything is a handle.
#[derive(Clone)]
pub struct AppState {
    /// Reported version string.
    pub version: String,
    /// Process start time, for the status endpoint's uptime.
    pub started_at: DateTime<Utc>,
    /// Storage handle for read paths (statements, counts).
    pub db: BankDb,
    pub directory: Directory,
    pub auth: Arc<AuthService>,
    pub ledger: Ledger,
    pub kyc: KycDesk,
    pub support: SupportDesk,
    /// Outbound email collaborator. Fire-and-forget.
    pub mailer: Arc<dyn Mailer>,
    /// Shared secret for the admin surface, generated by `init`.
    pub admin_token: String,
    /// Broadcast channel for live event notifications.
    pub event_tx: broadcast::Sender<BankEvent>,
    pub metrics: SharedMetrics,
}

/// Events pushed to WebSocket subscribers — the realtime feed dashboards
/// subscribe to instead of polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BankEvent {
    /// A transaction record was appended.
    #[serde(rename = "transaction_posted")]
    TransactionPosted {
        account_id: Uuid,
        kind: String,
        amount: Decimal,
        status: String,
    },
    /// An account's profile, status, or balance changed outside the ledger.
    #[serde(rename = "account_updated")]
    AccountUpdated { account_id: Uuid },
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/ws", get(ws_handler))
        .route("/signup", post(signup_handler))
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/me", get(me_handler))
        .route("/me/profile", patch(update_profile_handler))
        .route("/me/password", post(change_password_handler))
        .route("/me/transactions", get(my_transactions_handler))
        .route(
            "/me/card",
            get(my_card_handler)
                .post(purchase_card_handler)
                .patch(update_card_handler),
        )
        .route("/transfers", post(transfer_handler))
        .route("/transfers/international", post(international_handler))
        .route("/bills", post(bill_payment_handler))
        .route("/kyc", get(my_kyc_handler).post(submit_kyc_handler))
        .route(
            "/support/messages",
            get(support_thread_handler).post(support_post_handler),
        )
        .route("/admin/accounts", get(admin_list_accounts_handler))
        .route(
            "/admin/accounts/:id",
            get(admin_get_account_handler)
                .patch(admin_update_account_handler)
                .delete(admin_delete_account_handler),
        )
        .route("/admin/deposits", post(admin_deposit_handler))
        .route("/admin/debits", post(admin_debit_handler))
        .route("/admin/transactions", get(admin_transactions_handler))
        .route(
            "/admin/transactions/:id",
            delete(admin_delete_transaction_handler),
        )
        .route("/admin/kyc", get(admin_kyc_queue_handler))
        .route("/admin/kyc/:account_id/review", post(admin_kyc_review_handler))
        .route(
            "/admin/support/:account_id",
            get(admin_support_thread_handler).post(admin_support_reply_handler),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Structured error body: `{"error": <code>, "message": <detail>}`.
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    fn unauthorized(message: &str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", message)
    }

    fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.code, "message": self.message });
        (self.status, Json(body)).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match &err {
            LedgerError::InvalidAmount(_) => {
                Self::new(StatusCode::BAD_REQUEST, "invalid_amount", err.to_string())
            }
            LedgerError::AccountNotFound => {
                Self::new(StatusCode::NOT_FOUND, "account_not_found", err.to_string())
            }
            LedgerError::RecipientNotFound => Self::new(
                StatusCode::NOT_FOUND,
                "recipient_not_found",
                err.to_string(),
            ),
            LedgerError::SelfTransfer => {
                Self::new(StatusCode::BAD_REQUEST, "self_transfer", err.to_string())
            }
            LedgerError::InsufficientFunds { .. } => Self::new(
                StatusCode::CONFLICT,
                "insufficient_funds",
                err.to_string(),
            ),
            LedgerError::Store(_) => Self::internal(err.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match &err {
            AuthError::InvalidCredentials => Self::new(
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                err.to_string(),
            ),
            AuthError::AccountRestricted { .. } => Self::new(
                StatusCode::FORBIDDEN,
                "account_restricted",
                err.to_string(),
            ),
            AuthError::InvalidSession | AuthError::SessionExpired => {
                Self::unauthorized(&err.to_string())
            }
            AuthError::Hash(_) | AuthError::Store(_) => Self::internal(err.to_string()),
        }
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        match &err {
            DirectoryError::EmailTaken => {
                Self::new(StatusCode::CONFLICT, "email_taken", err.to_string())
            }
            DirectoryError::AccountNotFound => {
                Self::new(StatusCode::NOT_FOUND, "account_not_found", err.to_string())
            }
            DirectoryError::AccountNumberExhausted | DirectoryError::Store(_) => {
                Self::internal(err.to_string())
            }
        }
    }
}

impl From<KycError> for ApiError {
    fn from(err: KycError) -> Self {
        match &err {
            KycError::AccountNotFound => {
                Self::new(StatusCode::NOT_FOUND, "account_not_found", err.to_string())
            }
            KycError::NotSubmitted => {
                Self::new(StatusCode::NOT_FOUND, "kyc_not_submitted", err.to_string())
            }
            KycError::InvalidDecision(_) => {
                Self::new(StatusCode::BAD_REQUEST, "invalid_decision", err.to_string())
            }
            KycError::Store(_) => Self::internal(err.to_string()),
        }
    }
}

impl From<SupportError> for ApiError {
    fn from(err: SupportError) -> Self {
        match &err {
            SupportError::AccountNotFound => {
                Self::new(StatusCode::NOT_FOUND, "account_not_found", err.to_string())
            }
            SupportError::EmptyMessage => {
                Self::new(StatusCode::BAD_REQUEST, "empty_message", err.to_string())
            }
            SupportError::Store(_) => Self::internal(err.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Auth helpers
// ---------------------------------------------------------------------------

fn bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
        .ok_or_else(|| ApiError::unauthorized("missing bearer token"))
}

/// Resolves the session token to an account, enforcing expiry and the
/// status gate.
fn require_session(state: &AppState, headers: &HeaderMap) -> Result<Account, ApiError> {
    let token = bearer_token(headers)?;
    Ok(state.auth.authenticate(&token)?)
}

fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    match headers.get("x-admin-token").and_then(|v| v.to_str().ok()) {
        Some(token) if token == state.admin_token => Ok(()),
        _ => Err(ApiError::unauthorized("missing or invalid admin token")),
    }
}

/// Counts a ledger rejection before converting it into a response.
fn reject(state: &AppState, err: LedgerError) -> ApiError {
    state.metrics.rejected_operations_total.inc();
    err.into()
}

/// Fire-and-forget email delivery: failures are logged, never surfaced.
fn send_detached(mailer: Arc<dyn Mailer>, message: EmailMessage) {
    tokio::spawn(async move {
        if let Err(err) = mailer.send(message).await {
            tracing::warn!("email delivery failed: {err}");
        }
    });
}

fn publish_transaction(state: &AppState, account_id: Uuid, kind: &str, amount: Decimal, status: &str) {
    state.metrics.transactions_posted_total.inc();
    let _ = state.event_tx.send(BankEvent::TransactionPosted {
        account_id,
        kind: kind.to_string(),
        amount,
        status: status.to_string(),
    });
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub date_of_birth: String,
    pub address: String,
    pub country: String,
    pub account_type: AccountType,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub account: Account,
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdateRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub recipient_account_number: String,
    /// Decimal string, e.g. `"40.00"`.
    pub amount: Decimal,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Deserialize)]
pub struct InternationalTransferRequest {
    pub recipient_name: String,
    pub bank: String,
    pub iban: String,
    pub swift: String,
    pub country: String,
    pub amount: Decimal,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Deserialize)]
pub struct BillPaymentRequest {
    pub biller: String,
    #[serde(default)]
    pub reference: String,
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseCardRequest {
    #[serde(default = "default_card_type")]
    pub card_type: CardType,
}

fn default_card_type() -> CardType {
    CardType::Virtual
}

#[derive(Debug, Deserialize)]
pub struct UpdateCardRequest {
    pub status: CardStatus,
}

#[derive(Debug, Deserialize)]
pub struct KycSubmission {
    pub id_front: String,
    pub id_back: String,
    pub selfie: String,
}

#[derive(Debug, Deserialize)]
pub struct SupportPostRequest {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct AdminAccountUpdate {
    pub name: Option<String>,
    pub status: Option<AccountStatus>,
    /// Absolute balance edit. Routed through the ledger's atomic section.
    pub balance: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct AdminDepositRequest {
    pub account_id: Uuid,
    pub amount: Decimal,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdminDebitRequest {
    pub account_id: Uuid,
    pub amount: Decimal,
    #[serde(default)]
    pub note: String,
    /// Permit the debit even when it exceeds the balance.
    #[serde(default)]
    pub r#override: bool,
}

#[derive(Debug, Deserialize)]
pub struct KycReviewRequest {
    /// `Approved` or `Rejected`.
    pub decision: KycStatus,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
    /// Admin account search: exact email or account number.
    pub q: Option<String>,
}

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub version: String,
    pub uptime_seconds: i64,
    pub accounts: usize,
    pub transactions: usize,
    pub active_sessions: usize,
    pub timestamp: String,
}

// ---------------------------------------------------------------------------
// Infra handlers
// ---------------------------------------------------------------------------

/// `GET /health` — liveness probe for orchestrators. Intentionally does not
/// check subsystem health; that belongs in `/status`.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status` — service status summary.
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let resp = StatusResponse {
        version: state.version.clone(),
        uptime_seconds: (Utc::now() - state.started_at).num_seconds(),
        accounts: state.db.account_count(),
        transactions: state.db.transaction_count(),
        active_sessions: state.auth.session_count(),
        timestamp: Utc::now().to_rfc3339(),
    };
    Json(resp)
}

/// `GET /ws` — WebSocket upgrade for live event streaming. Push-only;
/// client messages are ignored.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

/// Drives a single WebSocket connection, forwarding broadcast events until
/// the client disconnects or the channel closes.
async fn handle_ws_connection(mut socket: WebSocket, state: AppState) {
    let mut rx = state.event_tx.subscribe();

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Ok(ev) => {
                        let payload = match serde_json::to_string(&ev) {
                            Ok(s) => s,
                            Err(e) => {
                                tracing::warn!("failed to serialize ws event: {}", e);
                                continue;
                            }
                        };
                        if socket.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("ws subscriber lagged by {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(_)) => {}
                    _ => break,
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Auth handlers
// ---------------------------------------------------------------------------

/// `POST /signup` — opens an account and registers credentials, then sends
/// the welcome email fire-and-forget.
async fn signup_handler(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state.directory.open_account(SignupForm {
        name: req.name,
        email: req.email.clone(),
        phone: req.phone,
        date_of_birth: req.date_of_birth,
        address: req.address,
        country: req.country,
        account_type: req.account_type,
    })?;
    state.auth.register(account.id, &req.email, &req.password)?;

    state.metrics.accounts_created_total.inc();
    state.metrics.accounts_total.set(state.db.account_count() as i64);
    send_detached(Arc::clone(&state.mailer), notify::welcome_email(&account));

    tracing::info!(account_id = %account.id, "account opened");
    Ok((StatusCode::CREATED, Json(account)))
}

/// `POST /login` — verifies credentials, applies the status gate, issues a
/// session, and sends the login alert fire-and-forget.
async fn login_handler(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (token, account) = state.auth.login(&req.email, &req.password)?;
    state
        .metrics
        .active_sessions
        .set(state.auth.session_count() as i64);
    send_detached(Arc::clone(&state.mailer), notify::login_alert(&account.email));
    Ok(Json(LoginResponse { token, account }))
}

/// `POST /logout` — drops the presented session.
async fn logout_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = bearer_token(&headers)?;
    state.auth.logout(&token);
    state
        .metrics
        .active_sessions
        .set(state.auth.session_count() as i64);
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Customer handlers
// ---------------------------------------------------------------------------

/// `GET /me` — the session's account.
async fn me_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Account>, ApiError> {
    Ok(Json(require_session(&state, &headers)?))
}

/// `PATCH /me/profile` — customer-editable profile fields.
async fn update_profile_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ProfileUpdateRequest>,
) -> Result<Json<Account>, ApiError> {
    let account = require_session(&state, &headers)?;
    let updated = state.directory.update_profile(
        &account.id,
        ProfileUpdate {
            name: req.name,
            phone: req.phone,
            address: req.address,
            avatar_url: req.avatar_url,
        },
    )?;
    let _ = state.event_tx.send(BankEvent::AccountUpdated {
        account_id: updated.id,
    });
    Ok(Json(updated))
}

/// `POST /me/password` — re-hash after verifying the current password.
async fn change_password_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = require_session(&state, &headers)?;
    state
        .auth
        .change_password(account.id, &req.current_password, &req.new_password)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /me/transactions` — the statement, newest first.
async fn my_transactions_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let account = require_session(&state, &headers)?;
    let listing = state
        .db
        .account_transactions(&account.id, params.limit.unwrap_or(50))
        .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(Json(listing))
}

/// `GET /me/card` — the issued card, or 404.
async fn my_card_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let account = require_session(&state, &headers)?;
    match state
        .db
        .card_for_account(&account.id)
        .map_err(|e| ApiError::internal(e.to_string()))?
    {
        Some(card) => Ok(Json(card)),
        None => Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "no_card",
            "no card issued for this account",
        )),
    }
}

/// `POST /me/card` — purchase a card at the flat price.
///
/// One card per account: a second purchase is refused here, at the surface
/// that owns the convention.
async fn purchase_card_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PurchaseCardRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = require_session(&state, &headers)?;
    if state
        .db
        .card_for_account(&account.id)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .is_some()
    {
        return Err(ApiError::new(
            StatusCode::CONFLICT,
            "card_already_issued",
            "this account already has a card",
        ));
    }

    let timer = state.metrics.operation_latency_seconds.start_timer();
    let (receipt, card) = state
        .ledger
        .purchase_card(account.id, req.card_type)
        .map_err(|e| reject(&state, e))?;
    timer.observe_duration();

    publish_transaction(&state, account.id, "Card Purchase", receipt.amount, "Successful");
    Ok((StatusCode::CREATED, Json(card)))
}

/// `PATCH /me/card` — freeze or unfreeze.
async fn update_card_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<UpdateCardRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = require_session(&state, &headers)?;
    let mut card = state
        .db
        .card_for_account(&account.id)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| {
            ApiError::new(StatusCode::NOT_FOUND, "no_card", "no card issued for this account")
        })?;
    card.status = req.status;
    state
        .db
        .put_card(&card)
        .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(Json(card))
}

/// `POST /transfers` — peer transfer to another account number.
async fn transfer_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<TransferRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = require_session(&state, &headers)?;

    let timer = state.metrics.operation_latency_seconds.start_timer();
    let receipt = state
        .ledger
        .transfer(account.id, &req.recipient_account_number, req.amount, &req.note)
        .map_err(|e| reject(&state, e))?;
    timer.observe_duration();

    state.metrics.transfers_total.inc();
    publish_transaction(&state, account.id, "Transfer - Outgoing", receipt.amount, "Successful");
    tracing::info!(
        sender = %account.id,
        recipient = %receipt.recipient_account_number,
        amount = %receipt.amount,
        "transfer committed"
    );
    Ok(Json(receipt))
}

/// `POST /transfers/international` — outbound wire, debited now and held
/// in `Pending Review`.
async fn international_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<InternationalTransferRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = require_session(&state, &headers)?;

    let receipt = state
        .ledger
        .international_transfer(
            account.id,
            &req.recipient_name,
            WireDetails {
                bank: req.bank,
                iban: req.iban,
                swift: req.swift,
                country: req.country,
            },
            req.amount,
            &req.note,
        )
        .map_err(|e| reject(&state, e))?;

    publish_transaction(
        &state,
        account.id,
        "International Transfer",
        receipt.amount,
        "Pending Review",
    );
    Ok(Json(receipt))
}

/// `POST /bills` — debit toward a named biller.
async fn bill_payment_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<BillPaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = require_session(&state, &headers)?;

    let receipt = state
        .ledger
        .pay_bill(account.id, &req.biller, &req.reference, req.amount)
        .map_err(|e| reject(&state, e))?;

    publish_transaction(&state, account.id, "Bill Payment", receipt.amount, "Successful");
    Ok(Json(receipt))
}

/// `GET /kyc` — the session's KYC record, or 404 before first submission.
async fn my_kyc_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let account = require_session(&state, &headers)?;
    match state.kyc.get(&account.id)? {
        Some(record) => Ok(Json(record)),
        None => Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "kyc_not_submitted",
            "no KYC submission on file",
        )),
    }
}

/// `POST /kyc` — submit document URLs; the images themselves live on the
/// external image host.
async fn submit_kyc_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<KycSubmission>,
) -> Result<impl IntoResponse, ApiError> {
    let account = require_session(&state, &headers)?;
    let record = state
        .kyc
        .submit(account.id, req.id_front, req.id_back, req.selfie)?;
    let _ = state.event_tx.send(BankEvent::AccountUpdated {
        account_id: account.id,
    });
    Ok((StatusCode::CREATED, Json(record)))
}

/// `GET /support/messages` — the session's support thread.
async fn support_thread_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let account = require_session(&state, &headers)?;
    Ok(Json(state.support.thread(&account.id)?))
}

/// `POST /support/messages` — message the support desk.
async fn support_post_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SupportPostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = require_session(&state, &headers)?;
    let message = state
        .support
        .post(account.id, ChatSender::Customer, &req.body)?;
    Ok((StatusCode::CREATED, Json(message)))
}

// ---------------------------------------------------------------------------
// Admin handlers
// ---------------------------------------------------------------------------

/// `GET /admin/accounts` — all accounts, or an exact email/account-number
/// search via `?q=`.
async fn admin_list_accounts_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &headers)?;

    let accounts = match params.q.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => {
            let hit = if q.contains('@') {
                state.directory.find_by_email(q)?
            } else {
                state.directory.find_by_number(q)?
            };
            hit.into_iter().collect()
        }
        _ => state.directory.list()?,
    };
    Ok(Json(accounts))
}

/// `GET /admin/accounts/:id`.
async fn admin_get_account_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Account>, ApiError> {
    require_admin(&state, &headers)?;
    Ok(Json(state.directory.get(&id)?))
}

/// `PATCH /admin/accounts/:id` — name, status, and absolute balance edits.
/// The balance edit routes through the ledger's atomic section.
async fn admin_update_account_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<AdminAccountUpdate>,
) -> Result<Json<Account>, ApiError> {
    require_admin(&state, &headers)?;

    if let Some(name) = req.name {
        state.directory.rename(&id, name)?;
    }
    if let Some(status) = req.status {
        state.directory.set_status(&id, status)?;
        tracing::info!(account_id = %id, status = %status, "account status changed");
    }
    if let Some(balance) = req.balance {
        state.ledger.set_balance(id, balance).map_err(|e| reject(&state, e))?;
    }

    let account = state.directory.get(&id)?;
    let _ = state.event_tx.send(BankEvent::AccountUpdated { account_id: id });
    Ok(Json(account))
}

/// `DELETE /admin/accounts/:id` — hard removal, bypassing any archival.
/// Transaction log entries survive.
async fn admin_delete_account_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &headers)?;

    state.directory.delete_account(&id)?;
    state.auth.purge_account(&id)?;
    state.metrics.accounts_total.set(state.db.account_count() as i64);
    tracing::warn!(account_id = %id, "account hard-deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /admin/deposits` — credit an account.
async fn admin_deposit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AdminDepositRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &headers)?;

    let note = req.note.unwrap_or_else(|| "Admin Deposit".to_string());
    let timer = state.metrics.operation_latency_seconds.start_timer();
    let receipt = state
        .ledger
        .deposit(req.account_id, req.amount, &note)
        .map_err(|e| reject(&state, e))?;
    timer.observe_duration();

    state.metrics.deposits_total.inc();
    publish_transaction(&state, req.account_id, "Deposit", receipt.amount, "Successful");
    Ok(Json(receipt))
}

/// `POST /admin/debits` — debit an account. Responds `409
/// insufficient_funds` when the balance cannot cover it and `override` is
/// unset; the retry path sets `override` and may drive the balance negative.
async fn admin_debit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AdminDebitRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &headers)?;

    let receipt = state
        .ledger
        .admin_debit(req.account_id, req.amount, &req.note, req.r#override)
        .map_err(|e| reject(&state, e))?;

    publish_transaction(&state, req.account_id, "Admin Debit", receipt.amount, "Successful");
    Ok(Json(receipt))
}

/// `GET /admin/transactions` — global listing, newest first.
async fn admin_transactions_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &headers)?;
    let listing = state
        .db
        .all_transactions(params.limit.unwrap_or(100))
        .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(Json(listing))
}

/// `DELETE /admin/transactions/:id` — hard-delete a log entry.
async fn admin_delete_transaction_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &headers)?;

    let record = state
        .db
        .get_transaction(&id)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| {
            ApiError::new(StatusCode::NOT_FOUND, "transaction_not_found", "no such transaction")
        })?;
    state
        .db
        .remove_transaction(&record)
        .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /admin/kyc` — the review queue.
async fn admin_kyc_queue_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &headers)?;
    Ok(Json(state.kyc.pending_reviews()?))
}

/// `POST /admin/kyc/:account_id/review` — approve or reject; the decision
/// is mirrored onto the account.
async fn admin_kyc_review_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(account_id): Path<Uuid>,
    Json(req): Json<KycReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &headers)?;
    let record = state.kyc.review(&account_id, req.decision)?;
    let _ = state.event_tx.send(BankEvent::AccountUpdated { account_id });
    Ok(Json(record))
}

/// `GET /admin/support/:account_id` — a customer's thread.
async fn admin_support_thread_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(account_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &headers)?;
    Ok(Json(state.support.thread(&account_id)?))
}

/// `POST /admin/support/:account_id` — reply as the support desk.
async fn admin_support_reply_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(account_id): Path<Uuid>,
    Json(req): Json<SupportPostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &headers)?;
    let message = state
        .support
        .post(account_id, ChatSender::Support, &req.body)?;
    Ok((StatusCode::CREATED, Json(message)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
