pub mod account;
pub mod auth;
pub mod transaction;

pub use account::{Account, AccountRecord, AccountType};
pub use auth::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
pub use transaction::{
    AccountTransaction, Direction, Transaction, TransactionStatus, TransactionType,
};
