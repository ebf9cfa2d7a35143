use std::sync::Arc;

use futures::future::try_join_all;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::cache::{QueryCache, QueryKey};
use crate::client::ApiClient;
use crate::error::ClientError;
use crate::models::{Account, AccountTransaction, Transaction};

/// Upper bound the balance dialogs enforce on a single deposit/withdrawal.
const MAX_OPERATION_AMOUNT: u32 = 1_000_000;

/// Target of a transfer: another account of the same user by internal id,
/// or any account by public account number.
#[derive(Debug, Clone)]
pub enum TransferTarget {
    Internal(Uuid),
    External(String),
}

/// Wire shape of POST /transactions/transfer. Exactly one of the two target
/// fields must be set; `validate` enforces that before dispatch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub source_account_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_account_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_account_number: Option<String>,
    pub amount: Decimal,
}

impl TransferRequest {
    pub fn new(source_account_id: Uuid, target: TransferTarget, amount: Decimal) -> Self {
        let (target_account_id, target_account_number) = match target {
            TransferTarget::Internal(id) => (Some(id), None),
            TransferTarget::External(number) => (None, Some(number)),
        };

        Self {
            source_account_id,
            target_account_id,
            target_account_number,
            amount,
        }
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        match (&self.target_account_id, &self.target_account_number) {
            (Some(_), Some(_)) => {
                return Err(ClientError::field_error(
                    "target",
                    "Provide either a target account or an account number, not both",
                ));
            }
            (None, None) => {
                return Err(ClientError::field_error(
                    "target",
                    "A transfer target is required",
                ));
            }
            _ => {}
        }

        if self.target_account_id == Some(self.source_account_id) {
            return Err(ClientError::field_error(
                "targetAccountId",
                "Source and target accounts cannot be the same",
            ));
        }

        validate_amount(self.amount)?;
        Ok(())
    }
}

/// Adapter for the transaction endpoints, plus the aggregate all-accounts
/// history merge.
pub struct TransactionService {
    client: Arc<ApiClient>,
    cache: Arc<QueryCache>,
}

impl TransactionService {
    pub fn new(client: Arc<ApiClient>, cache: Arc<QueryCache>) -> Self {
        Self { client, cache }
    }

    /// POST /transactions/transfer. Invalidates the account list; per-account
    /// history entries refresh lazily on their next read.
    pub async fn transfer(&self, request: &TransferRequest) -> Result<Transaction, ClientError> {
        request.validate()?;

        let transaction: Transaction = self.client.post("/transactions/transfer", request).await?;

        self.cache.invalidate_user_accounts().await;
        Ok(transaction)
    }

    /// POST /transactions/deposit?accountId=..&amount=..
    pub async fn deposit(
        &self,
        account_id: Uuid,
        amount: Decimal,
    ) -> Result<Transaction, ClientError> {
        self.balance_operation("/transactions/deposit", account_id, amount)
            .await
    }

    /// POST /transactions/withdraw?accountId=..&amount=..
    pub async fn withdraw(
        &self,
        account_id: Uuid,
        amount: Decimal,
    ) -> Result<Transaction, ClientError> {
        self.balance_operation("/transactions/withdraw", account_id, amount)
            .await
    }

    async fn balance_operation(
        &self,
        path: &str,
        account_id: Uuid,
        amount: Decimal,
    ) -> Result<Transaction, ClientError> {
        validate_amount(amount)?;
        if amount > Decimal::from(MAX_OPERATION_AMOUNT) {
            return Err(ClientError::field_error(
                "amount",
                "Amount cannot exceed 1,000,000",
            ));
        }

        let transaction: Transaction = self
            .client
            .post_query(
                path,
                &[
                    ("accountId", account_id.to_string()),
                    ("amount", amount.to_string()),
                ],
            )
            .await?;

        self.cache.invalidate_user_accounts().await;
        self.cache
            .invalidate(&QueryKey::AccountHistory(account_id))
            .await;
        Ok(transaction)
    }

    /// GET /transactions/account/{accountId}, cached under
    /// `AccountHistory(account_id)`.
    pub async fn history(&self, account_id: Uuid) -> Result<Vec<Transaction>, ClientError> {
        self.cache
            .get_or_fetch(QueryKey::AccountHistory(account_id), || async {
                self.fetch_history(account_id).await
            })
            .await
    }

    /// History across all of the user's accounts: one fetch per account, run
    /// in parallel, merged and sorted by transaction date descending. The
    /// merged set is recomputed on every call, never cached, and nothing is
    /// returned until every per-account fetch has completed.
    pub async fn all_history(
        &self,
        accounts: &[Account],
    ) -> Result<Vec<AccountTransaction>, ClientError> {
        let fetches = accounts
            .iter()
            .map(|account| async move {
                let transactions = self.fetch_history(account.id).await?;
                Ok::<_, ClientError>((account, transactions))
            })
            .collect::<Vec<_>>();

        let legs = try_join_all(fetches).await?;
        Ok(merge_descending(legs))
    }

    async fn fetch_history(&self, account_id: Uuid) -> Result<Vec<Transaction>, ClientError> {
        self.client
            .get(&format!("/transactions/account/{account_id}"))
            .await
    }
}

fn validate_amount(amount: Decimal) -> Result<(), ClientError> {
    // 0.01 minimum, mirroring the backend's own constraint
    if amount < Decimal::new(1, 2) {
        return Err(ClientError::field_error(
            "amount",
            "Amount must be at least 0.01",
        ));
    }
    Ok(())
}

fn merge_descending(legs: Vec<(&Account, Vec<Transaction>)>) -> Vec<AccountTransaction> {
    let mut merged: Vec<AccountTransaction> = legs
        .into_iter()
        .flat_map(|(account, transactions)| {
            transactions
                .into_iter()
                .map(|transaction| AccountTransaction {
                    account_id: account.id,
                    account_name: account.account_name.clone(),
                    account_number: account.account_number.clone(),
                    transaction,
                })
                .collect::<Vec<_>>()
        })
        .collect();

    merged.sort_by(|a, b| {
        b.transaction
            .transaction_date
            .cmp(&a.transaction.transaction_date)
    });
    merged
}
