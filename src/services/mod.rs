pub mod account_service;
pub mod auth_service;
pub mod transaction_service;

pub use account_service::AccountService;
pub use auth_service::AuthService;
pub use transaction_service::{TransactionService, TransferRequest, TransferTarget};
