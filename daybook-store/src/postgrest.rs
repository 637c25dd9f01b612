//! HTTP implementation of the remote row store.
//!
//! Speaks the backend's password-grant token endpoint plus PostgREST-style
//! row access: `apikey` header on everything, bearer token after sign-in,
//! `eq.` filters, and upsert via `on_conflict` + `Prefer:
//! resolution=merge-duplicates`.

use crate::config::RemoteConfig;
use crate::error::{StoreError, StoreResult};
use crate::remote::RemoteStore;
use crate::types::{AuthUser, EncryptedRow, SaltInsert};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Auth state retained after sign-in.
struct AuthState {
    access_token: String,
    user_id: String,
}

/// Remote row store backed by the production REST API.
pub struct PostgrestRemote {
    client: Client,
    config: RemoteConfig,
    auth: Arc<RwLock<Option<AuthState>>>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: TokenUser,
}

#[derive(Deserialize)]
struct TokenUser {
    id: String,
    email: String,
}

#[derive(Deserialize)]
struct ProfileRow {
    encryption_salt: Option<String>,
}

impl PostgrestRemote {
    pub fn new(config: RemoteConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            config,
            auth: Arc::new(RwLock::new(None)),
        }
    }

    /// Sets the auth state directly (for restoring a saved session).
    pub async fn set_tokens(&self, access_token: String, user_id: String) {
        let mut auth = self.auth.write().await;
        *auth = Some(AuthState {
            access_token,
            user_id,
        });
    }

    pub async fn is_authenticated(&self) -> bool {
        self.auth.read().await.is_some()
    }

    pub async fn user_id(&self) -> Option<String> {
        self.auth.read().await.as_ref().map(|a| a.user_id.clone())
    }

    async fn token(&self) -> StoreResult<String> {
        self.auth
            .read()
            .await
            .as_ref()
            .map(|a| a.access_token.clone())
            .ok_or(StoreError::AuthRequired)
    }

    /// Makes an authenticated GET request against the rows API.
    async fn rest_get(&self, path_and_query: &str) -> StoreResult<reqwest::Response> {
        let url = format!("{}/rest/v1{}", self.config.base_url, path_and_query);
        let token = self.token().await?;

        Ok(self
            .client
            .get(&url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&token)
            .send()
            .await?)
    }

    /// Makes an authenticated POST request against the rows API.
    async fn rest_post(
        &self,
        path_and_query: &str,
        prefer: &str,
        body: &impl serde::Serialize,
    ) -> StoreResult<reqwest::Response> {
        let url = format!("{}/rest/v1{}", self.config.base_url, path_and_query);
        let token = self.token().await?;

        Ok(self
            .client
            .post(&url)
            .header("apikey", &self.config.anon_key)
            .header("Prefer", prefer)
            .bearer_auth(&token)
            .json(body)
            .send()
            .await?)
    }

    /// Makes an authenticated DELETE request against the rows API.
    async fn rest_delete(&self, path_and_query: &str) -> StoreResult<reqwest::Response> {
        let url = format!("{}/rest/v1{}", self.config.base_url, path_and_query);
        let token = self.token().await?;

        Ok(self
            .client
            .delete(&url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&token)
            .send()
            .await?)
    }
}

#[async_trait]
impl RemoteStore for PostgrestRemote {
    async fn sign_in(&self, email: &str, password: &str) -> StoreResult<AuthUser> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.config.base_url);
        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.config.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        if resp.status() == StatusCode::BAD_REQUEST || resp.status() == StatusCode::UNAUTHORIZED {
            return Err(StoreError::AuthFailed(
                "invalid email or password".to_string(),
            ));
        }

        let resp: TokenResponse = resp
            .error_for_status()
            .map_err(|e| StoreError::AuthFailed(e.to_string()))?
            .json()
            .await?;

        let user = AuthUser {
            user_id: resp.user.id.clone(),
            email: resp.user.email,
        };

        self.set_tokens(resp.access_token, resp.user.id).await;
        Ok(user)
    }

    async fn sign_out(&self) -> StoreResult<()> {
        let mut auth = self.auth.write().await;
        *auth = None;
        Ok(())
    }

    async fn fetch_salt(&self, user_id: &str) -> StoreResult<Option<String>> {
        let rows: Vec<ProfileRow> = self
            .rest_get(&format!(
                "/user_profiles?id=eq.{user_id}&select=encryption_salt"
            ))
            .await?
            .error_for_status()
            .map_err(|e| StoreError::Remote(e.to_string()))?
            .json()
            .await?;

        Ok(rows.into_iter().next().and_then(|r| r.encryption_salt))
    }

    async fn store_salt(&self, user_id: &str, salt: &str) -> StoreResult<SaltInsert> {
        let resp = self
            .rest_post(
                "/user_profiles",
                "return=minimal",
                &serde_json::json!({ "id": user_id, "encryption_salt": salt }),
            )
            .await?;

        // 409 = another first-login won the insert race; caller re-reads.
        if resp.status() == StatusCode::CONFLICT {
            debug!(user_id, "profile already exists, salt insert lost the race");
            return Ok(SaltInsert::Conflict);
        }

        resp.error_for_status()
            .map_err(|e| StoreError::Remote(e.to_string()))?;
        Ok(SaltInsert::Created)
    }

    async fn list_rows(&self, user_id: &str) -> StoreResult<Vec<EncryptedRow>> {
        let rows: Vec<EncryptedRow> = self
            .rest_get(&format!(
                "/entries?user_id=eq.{user_id}\
                 &select=user_id,date_key,encrypted_data,iv,updated_at\
                 &order=date_key.desc"
            ))
            .await?
            .error_for_status()
            .map_err(|e| StoreError::Remote(e.to_string()))?
            .json()
            .await?;

        debug!(user_id, rows = rows.len(), "fetched entry rows");
        Ok(rows)
    }

    async fn upsert_row(&self, row: &EncryptedRow) -> StoreResult<()> {
        self.rest_post(
            "/entries?on_conflict=user_id,date_key",
            "resolution=merge-duplicates,return=minimal",
            row,
        )
        .await?
        .error_for_status()
        .map_err(|e| StoreError::Remote(e.to_string()))?;
        Ok(())
    }

    async fn delete_rows(&self, user_id: &str) -> StoreResult<()> {
        self.rest_delete(&format!("/entries?user_id=eq.{user_id}"))
            .await?
            .error_for_status()
            .map_err(|e| StoreError::Remote(e.to_string()))?;
        Ok(())
    }
}
