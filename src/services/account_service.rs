use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use crate::cache::{QueryCache, QueryKey};
use crate::client::ApiClient;
use crate::error::ClientError;
use crate::models::{Account, AccountRecord};

/// Adapter for the account endpoints. Reads go through the query cache;
/// every mutation invalidates the keys it can have changed before returning.
pub struct AccountService {
    client: Arc<ApiClient>,
    cache: Arc<QueryCache>,
}

impl AccountService {
    pub fn new(client: Arc<ApiClient>, cache: Arc<QueryCache>) -> Self {
        Self { client, cache }
    }

    /// GET /accounts/user/{userId}, cached under `UserAccounts(user_id)`.
    pub async fn user_accounts(&self, user_id: Uuid) -> Result<Vec<Account>, ClientError> {
        self.cache
            .get_or_fetch(QueryKey::UserAccounts(user_id), || async {
                let records: Vec<AccountRecord> = self
                    .client
                    .get(&format!("/accounts/user/{user_id}"))
                    .await?;
                Ok(records.into_iter().map(Account::from).collect::<Vec<_>>())
            })
            .await
    }

    /// GET /accounts/{id}, cached under `Account(id)`.
    pub async fn account(&self, id: Uuid) -> Result<Account, ClientError> {
        self.cache
            .get_or_fetch(QueryKey::Account(id), || async {
                let record: AccountRecord = self.client.get(&format!("/accounts/{id}")).await?;
                Ok(Account::from(record))
            })
            .await
    }

    /// POST /accounts. Invalidates the account list.
    pub async fn create(
        &self,
        user_id: Uuid,
        name: &str,
        initial_balance: Decimal,
    ) -> Result<Account, ClientError> {
        validate_name(name)?;
        if initial_balance < Decimal::ZERO {
            return Err(ClientError::field_error(
                "balance",
                "Initial balance cannot be negative",
            ));
        }

        let record: AccountRecord = self
            .client
            .post(
                "/accounts",
                &json!({
                    "userId": user_id,
                    "name": name,
                    "balance": initial_balance,
                }),
            )
            .await?;

        self.cache.invalidate_user_accounts().await;
        Ok(Account::from(record))
    }

    /// PUT /accounts/{id}. Invalidates the account list and the detail entry.
    pub async fn rename(&self, id: Uuid, name: &str) -> Result<Account, ClientError> {
        validate_name(name)?;

        let record: AccountRecord = self
            .client
            .put(&format!("/accounts/{id}"), &json!({ "name": name }))
            .await?;

        self.cache.invalidate(&QueryKey::Account(id)).await;
        self.cache.invalidate_user_accounts().await;
        Ok(Account::from(record))
    }

    /// DELETE /accounts/{id}. Invalidates the account list and the detail entry.
    pub async fn delete(&self, id: Uuid) -> Result<(), ClientError> {
        self.client.delete(&format!("/accounts/{id}")).await?;

        self.cache.invalidate(&QueryKey::Account(id)).await;
        self.cache.invalidate_user_accounts().await;
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), ClientError> {
    if name.trim().is_empty() {
        return Err(ClientError::field_error("name", "Account name is required"));
    }
    Ok(())
}
