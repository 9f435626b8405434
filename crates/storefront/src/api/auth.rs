//! Authentication endpoints.

use cardshop_core::Email;
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use super::types::{LoginRequest, LoginResponse, User};
use super::{ApiClient, ApiError, AuthApi};

impl AuthApi for ApiClient {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn login(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<LoginResponse, ApiError> {
        let body = serde_json::to_value(LoginRequest {
            email: email.as_str(),
            password: password.expose_secret(),
        })?;
        self.fetch(Method::POST, "/auth/login", Some(body)).await
    }

    #[instrument(skip(self))]
    async fn current_user(&self) -> Result<User, ApiError> {
        self.fetch(Method::GET, "/auth/me", None).await
    }

    #[instrument(skip(self))]
    async fn logout(&self) -> Result<(), ApiError> {
        self.execute(Method::POST, "/auth/logout", None).await
    }
}
