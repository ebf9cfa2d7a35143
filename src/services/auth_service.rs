use std::sync::Arc;

use crate::client::ApiClient;
use crate::error::ClientError;
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

/// Adapter for the public user endpoints. Login and register are the only
/// calls dispatched without a bearer token.
pub struct AuthService {
    client: Arc<ApiClient>,
}

impl AuthService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// POST /users/login. On success the session store is overwritten with
    /// the new token and persisted before this returns.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ClientError> {
        validate_credentials(username, password)?;

        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self.client.post("/users/login", &request).await?;

        self.client
            .session()
            .login(&response.token, username, response.user_id)?;

        Ok(response)
    }

    /// POST /users/register. Does not log the new user in.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<RegisterResponse, ClientError> {
        validate_credentials(username, password)?;
        if !email.contains('@') {
            return Err(ClientError::field_error(
                "email",
                "Enter a valid email address",
            ));
        }

        let request = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        self.client.post("/users/register", &request).await
    }

    pub fn logout(&self) -> Result<(), ClientError> {
        self.client.session().logout()
    }
}

fn validate_credentials(username: &str, password: &str) -> Result<(), ClientError> {
    if username.len() < 3 {
        return Err(ClientError::field_error(
            "username",
            "Username must be at least 3 characters",
        ));
    }
    if password.len() < 6 {
        return Err(ClientError::field_error(
            "password",
            "Password must be at least 6 characters",
        ));
    }
    Ok(())
}
