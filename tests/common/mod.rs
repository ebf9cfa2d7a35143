#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::{Duration, NaiveDateTime};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use uuid::Uuid;

use banking_cli_rust::cache::QueryCache;
use banking_cli_rust::client::ApiClient;
use banking_cli_rust::services::{AccountService, AuthService, TransactionService};
use banking_cli_rust::session::{MemorySessionStorage, SessionStore};

pub const TOKEN: &str = "test-token-1";
pub const USERNAME: &str = "demo";
pub const PASSWORD: &str = "password1";

/// Bearer value the mock always rejects with 403 instead of 401.
pub const FORBIDDEN_TOKEN: &str = "forbidden-token";

#[derive(Clone)]
pub struct UserRow {
    pub id: Uuid,
    pub password: String,
    pub email: String,
}

#[derive(Clone)]
pub struct AccountRow {
    pub id: Uuid,
    pub number: String,
    pub name: String,
    pub balance: Decimal,
    pub created_at: NaiveDateTime,
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
}

/// Shared state of the in-process mock banking backend.
pub struct BankState {
    pub users: HashMap<String, UserRow>,
    pub accounts: Vec<AccountRow>,
    pub transactions: Vec<Value>,
    pub next_tx_id: i64,
    pub next_account_number: u64,
    pub clock: NaiveDateTime,
    /// Authorization header of the most recent request, if any.
    pub last_authorization: Option<String>,
    /// One label per request served, for call-count assertions.
    pub hits: Vec<String>,
}

type Shared = Arc<Mutex<BankState>>;

impl BankState {
    fn new() -> Self {
        let user_id: Uuid = "00000000-0000-4000-8000-0000000000aa".parse().unwrap();
        let created: NaiveDateTime = "2024-05-01T09:00:00".parse().unwrap();

        let mut users = HashMap::new();
        users.insert(
            USERNAME.to_string(),
            UserRow {
                id: user_id,
                password: PASSWORD.to_string(),
                email: "demo@example.com".to_string(),
            },
        );

        let account = |id: &str, number: &str, name: &str, balance: &str| AccountRow {
            id: id.parse().unwrap(),
            number: number.to_string(),
            name: name.to_string(),
            balance: balance.parse().unwrap(),
            created_at: created,
            user_id,
            username: USERNAME.to_string(),
            email: "demo@example.com".to_string(),
        };

        Self {
            users,
            accounts: vec![
                account(
                    "00000000-0000-4000-8000-000000000001",
                    "1001",
                    "Main",
                    "100.00",
                ),
                account(
                    "00000000-0000-4000-8000-000000000002",
                    "1002",
                    "Savings",
                    "50.00",
                ),
            ],
            transactions: Vec::new(),
            next_tx_id: 1,
            next_account_number: 1003,
            clock: "2024-06-01T12:00:00".parse().unwrap(),
            last_authorization: None,
            hits: Vec::new(),
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.users[USERNAME].id
    }

    pub fn account_by_number(&self, number: &str) -> AccountRow {
        self.accounts
            .iter()
            .find(|a| a.number == number)
            .cloned()
            .expect("account by number")
    }

    fn tick(&mut self) -> NaiveDateTime {
        self.clock += Duration::seconds(60);
        self.clock
    }

    fn push_tx(
        &mut self,
        amount: Decimal,
        kind: &str,
        date: NaiveDateTime,
        source: &str,
        target: &str,
    ) -> Value {
        let tx = json!({
            "id": self.next_tx_id,
            "amount": amount,
            "type": kind,
            "status": "SUCCESS",
            "transactionDate": date.format("%Y-%m-%dT%H:%M:%S").to_string(),
            "sourceAccountNumber": source,
            "targetAccountNumber": target,
        });
        self.next_tx_id += 1;
        self.transactions.push(tx.clone());
        tx
    }

    /// Seed a history row directly, for tests that need fixed dates.
    pub fn seed_tx(&mut self, number: &str, kind: &str, date: &str, amount: &str) {
        let date: NaiveDateTime = date.parse().unwrap();
        let amount: Decimal = amount.parse().unwrap();
        self.push_tx(amount, kind, date, number, number);
    }
}

pub struct MockBank {
    pub base_url: String,
    pub state: Shared,
}

/// Spawn the mock backend on an unused port and return its `/api` base URL.
pub async fn spawn_bank() -> Result<MockBank> {
    let state: Shared = Arc::new(Mutex::new(BankState::new()));
    let app = router(state.clone());

    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    Ok(MockBank {
        base_url: format!("http://127.0.0.1:{port}/api"),
        state,
    })
}

/// The full client service graph wired against a mock backend, with an
/// in-memory session store.
pub struct TestClient {
    pub session: Arc<SessionStore>,
    pub cache: Arc<QueryCache>,
    pub auth: AuthService,
    pub accounts: AccountService,
    pub transactions: TransactionService,
}

pub fn client_for(bank: &MockBank) -> TestClient {
    let session = Arc::new(SessionStore::open(MemorySessionStorage::new()));
    let client =
        Arc::new(ApiClient::with_base_url(&bank.base_url, 5, session.clone()).expect("client"));
    let cache = Arc::new(QueryCache::new());

    TestClient {
        session: session.clone(),
        cache: cache.clone(),
        auth: AuthService::new(client.clone()),
        accounts: AccountService::new(client.clone(), cache.clone()),
        transactions: TransactionService::new(client, cache),
    }
}

pub async fn login(client: &TestClient) -> Result<()> {
    client.auth.login(USERNAME, PASSWORD).await?;
    Ok(())
}

/// How many requests the mock has served for a given endpoint label.
pub fn hits(bank: &MockBank, label: &str) -> usize {
    bank.state
        .lock()
        .unwrap()
        .hits
        .iter()
        .filter(|h| h.as_str() == label)
        .count()
}

fn router(state: Shared) -> Router {
    let api = Router::new()
        .route("/users/login", post(users_login))
        .route("/users/register", post(users_register))
        .route("/accounts/user/:user_id", get(accounts_by_user))
        .route(
            "/accounts/:id",
            get(account_get).put(account_put).delete(account_delete),
        )
        .route("/accounts", post(account_create))
        .route("/transactions/transfer", post(tx_transfer))
        .route("/transactions/deposit", post(tx_deposit))
        .route("/transactions/withdraw", post(tx_withdraw))
        .route("/transactions/account/:id", get(tx_history))
        .with_state(state);

    Router::new().nest("/api", api)
}

fn record(state: &mut BankState, label: &str, headers: &HeaderMap) {
    state.last_authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    state.hits.push(label.to_string());
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({
            "message": message,
            "status": status.as_u16(),
            "timestamp": "2024-06-01T12:00:00",
        })),
    )
        .into_response()
}

/// 401 for a missing/unknown bearer, 403 for the dedicated forbidden one.
fn check_auth(state: &BankState, headers: &HeaderMap) -> Option<Response> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match bearer {
        Some(value) if value == format!("Bearer {TOKEN}") => None,
        Some(value) if value == format!("Bearer {FORBIDDEN_TOKEN}") => {
            Some(error_body(StatusCode::FORBIDDEN, "Access Denied"))
        }
        _ => Some(error_body(
            StatusCode::UNAUTHORIZED,
            "Full authentication is required",
        )),
    }
}

fn account_json(row: &AccountRow) -> Value {
    json!({
        "id": row.id,
        "number": row.number,
        "name": row.name,
        "balance": row.balance,
        "createdAt": row.created_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
        "userId": row.user_id,
        "username": row.username,
        "email": row.email,
    })
}

async fn users_login(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    record(&mut state, "login", &headers);

    let username = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    match state.users.get(username) {
        Some(user) if user.password == password => {
            Json(json!({ "token": TOKEN, "userId": user.id })).into_response()
        }
        _ => error_body(StatusCode::UNAUTHORIZED, "Invalid username or password"),
    }
}

async fn users_register(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    record(&mut state, "register", &headers);

    let username = body["username"].as_str().unwrap_or_default().to_string();
    if state.users.contains_key(&username) {
        return error_body(StatusCode::BAD_REQUEST, "Username already exists");
    }

    let user = UserRow {
        id: Uuid::new_v4(),
        password: body["password"].as_str().unwrap_or_default().to_string(),
        email: body["email"].as_str().unwrap_or_default().to_string(),
    };
    let response = json!({
        "id": user.id,
        "username": username,
        "email": user.email,
        "createdAt": "2024-06-01T12:00:00",
        "updatedAt": "2024-06-01T12:00:00",
    });
    state.users.insert(username, user);

    Json(response).into_response()
}

async fn accounts_by_user(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(user_id): Path<Uuid>,
) -> Response {
    let mut state = state.lock().unwrap();
    record(&mut state, "accounts_by_user", &headers);
    if let Some(denied) = check_auth(&state, &headers) {
        return denied;
    }

    let rows: Vec<Value> = state
        .accounts
        .iter()
        .filter(|a| a.user_id == user_id)
        .map(account_json)
        .collect();
    Json(Value::Array(rows)).into_response()
}

async fn account_get(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Response {
    let mut state = state.lock().unwrap();
    record(&mut state, "account_get", &headers);
    if let Some(denied) = check_auth(&state, &headers) {
        return denied;
    }

    match state.accounts.iter().find(|a| a.id == id) {
        Some(row) => Json(account_json(row)).into_response(),
        None => error_body(StatusCode::NOT_FOUND, "Account not found"),
    }
}

async fn account_create(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    record(&mut state, "account_create", &headers);
    if let Some(denied) = check_auth(&state, &headers) {
        return denied;
    }

    let user_id: Uuid = match body["userId"].as_str().and_then(|s| s.parse().ok()) {
        Some(id) => id,
        None => return error_body(StatusCode::BAD_REQUEST, "userId is required"),
    };
    let (username, user) = state
        .users
        .iter()
        .find(|(_, u)| u.id == user_id)
        .map(|(name, user)| (name.clone(), user.clone()))
        .expect("known user");

    let number = state.next_account_number.to_string();
    state.next_account_number += 1;
    let created_at = state.tick();

    let row = AccountRow {
        id: Uuid::new_v4(),
        number,
        name: body["name"].as_str().unwrap_or_default().to_string(),
        balance: serde_json::from_value(body["balance"].clone()).unwrap_or(Decimal::ZERO),
        created_at,
        user_id,
        username,
        email: user.email,
    };
    let response = account_json(&row);
    state.accounts.push(row);

    Json(response).into_response()
}

async fn account_put(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    record(&mut state, "account_put", &headers);
    if let Some(denied) = check_auth(&state, &headers) {
        return denied;
    }

    let name = body["name"].as_str().unwrap_or_default().to_string();
    match state.accounts.iter_mut().find(|a| a.id == id) {
        Some(row) => {
            row.name = name;
            let response = account_json(row);
            Json(response).into_response()
        }
        None => error_body(StatusCode::NOT_FOUND, "Account not found"),
    }
}

async fn account_delete(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Response {
    let mut state = state.lock().unwrap();
    record(&mut state, "account_delete", &headers);
    if let Some(denied) = check_auth(&state, &headers) {
        return denied;
    }

    let before = state.accounts.len();
    state.accounts.retain(|a| a.id != id);
    if state.accounts.len() == before {
        return error_body(StatusCode::NOT_FOUND, "Account not found");
    }

    StatusCode::NO_CONTENT.into_response()
}

async fn tx_transfer(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    record(&mut state, "tx_transfer", &headers);
    if let Some(denied) = check_auth(&state, &headers) {
        return denied;
    }

    let source_id: Option<Uuid> = body["sourceAccountId"].as_str().and_then(|s| s.parse().ok());
    let target_id: Option<Uuid> = body["targetAccountId"].as_str().and_then(|s| s.parse().ok());
    let target_number = body["targetAccountNumber"].as_str().map(|s| s.to_string());
    let amount: Decimal = match serde_json::from_value(body["amount"].clone()) {
        Ok(amount) => amount,
        Err(_) => return error_body(StatusCode::BAD_REQUEST, "Amount is mandatory"),
    };

    let source = match source_id.and_then(|id| state.accounts.iter().find(|a| a.id == id)) {
        Some(row) => row.clone(),
        None => return error_body(StatusCode::NOT_FOUND, "Source account not found"),
    };
    let target = state
        .accounts
        .iter()
        .find(|a| Some(a.id) == target_id || Some(&a.number) == target_number.as_ref())
        .cloned();
    let target = match target {
        Some(row) => row,
        None => return error_body(StatusCode::NOT_FOUND, "Target account not found"),
    };

    if source.balance < amount {
        return error_body(StatusCode::BAD_REQUEST, "Insufficient funds");
    }

    for row in state.accounts.iter_mut() {
        if row.id == source.id {
            row.balance -= amount;
        } else if row.id == target.id {
            row.balance += amount;
        }
    }

    let date = state.tick();
    let tx = state.push_tx(amount, "TRANSFER", date, &source.number, &target.number);
    Json(tx).into_response()
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceOpQuery {
    account_id: Uuid,
    amount: Decimal,
}

async fn tx_deposit(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<BalanceOpQuery>,
) -> Response {
    balance_op(state, headers, query, true).await
}

async fn tx_withdraw(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<BalanceOpQuery>,
) -> Response {
    balance_op(state, headers, query, false).await
}

async fn balance_op(
    state: Shared,
    headers: HeaderMap,
    query: BalanceOpQuery,
    credit: bool,
) -> Response {
    let mut state = state.lock().unwrap();
    record(
        &mut state,
        if credit { "tx_deposit" } else { "tx_withdraw" },
        &headers,
    );
    if let Some(denied) = check_auth(&state, &headers) {
        return denied;
    }

    let number = match state.accounts.iter().find(|a| a.id == query.account_id) {
        Some(row) => row.number.clone(),
        None => return error_body(StatusCode::NOT_FOUND, "Account not found"),
    };

    if !credit {
        let row = state.account_by_number(&number);
        if row.balance < query.amount {
            return error_body(StatusCode::BAD_REQUEST, "Insufficient funds");
        }
    }

    for row in state.accounts.iter_mut() {
        if row.id == query.account_id {
            if credit {
                row.balance += query.amount;
            } else {
                row.balance -= query.amount;
            }
        }
    }

    let date = state.tick();
    let kind = if credit { "DEPOSIT" } else { "WITHDRAWAL" };
    let tx = state.push_tx(query.amount, kind, date, &number, &number);
    Json(tx).into_response()
}

async fn tx_history(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Response {
    let mut state = state.lock().unwrap();
    record(&mut state, "tx_history", &headers);
    if let Some(denied) = check_auth(&state, &headers) {
        return denied;
    }

    let number = match state.accounts.iter().find(|a| a.id == id) {
        Some(row) => row.number.clone(),
        None => return error_body(StatusCode::NOT_FOUND, "Account not found"),
    };

    let rows: Vec<Value> = state
        .transactions
        .iter()
        .filter(|tx| {
            tx["sourceAccountNumber"] == number.as_str() || tx["targetAccountNumber"] == number.as_str()
        })
        .cloned()
        .collect();
    Json(Value::Array(rows)).into_response()
}
