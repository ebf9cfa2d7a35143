use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Transfer,
    Deposit,
    Withdrawal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Success,
    Failed,
}

/// Immutable transaction record, created only by the backend. The client
/// renders these; it never constructs or mutates one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub status: TransactionStatus,
    pub transaction_date: NaiveDateTime,
    pub source_account_number: String,
    pub target_account_number: String,
}

impl Transaction {
    /// Direction of this transaction as seen from `viewing_account_number`.
    pub fn direction_for(&self, viewing_account_number: &str) -> Direction {
        Direction::resolve(
            self.kind,
            &self.source_account_number,
            &self.target_account_number,
            viewing_account_number,
        )
    }
}

/// Inflow/outflow of a transaction relative to a viewing account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inflow,
    Outflow,
}

impl Direction {
    /// Pure resolution of direction from `(type, source, target, viewpoint)`.
    ///
    /// For transfers the transaction flows out of the viewing account exactly
    /// when that account is the source; deposits are always inflows and
    /// withdrawals always outflows regardless of viewpoint.
    pub fn resolve(
        kind: TransactionType,
        source_account_number: &str,
        _target_account_number: &str,
        viewing_account_number: &str,
    ) -> Direction {
        match kind {
            TransactionType::Transfer => {
                if source_account_number == viewing_account_number {
                    Direction::Outflow
                } else {
                    Direction::Inflow
                }
            }
            TransactionType::Deposit => Direction::Inflow,
            TransactionType::Withdrawal => Direction::Outflow,
        }
    }

    pub fn sign(&self) -> char {
        match self {
            Direction::Inflow => '+',
            Direction::Outflow => '-',
        }
    }
}

/// A transaction tagged with the account it was fetched for, used by the
/// aggregate all-accounts history view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountTransaction {
    pub account_id: Uuid,
    pub account_name: String,
    pub account_number: String,
    #[serde(flatten)]
    pub transaction: Transaction,
}

impl AccountTransaction {
    pub fn direction(&self) -> Direction {
        self.transaction.direction_for(&self.account_number)
    }
}
