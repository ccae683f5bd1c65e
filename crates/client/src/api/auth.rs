//! Account endpoints.

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::{info, instrument, warn};

use super::{ApiClient, RequestOptions};
use crate::error::Result;
use crate::session::{AuthResponse, User};

impl ApiClient {
    /// Create an account and sign in as it.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` if the backend rejects the registration.
    /// A 401 here is never treated as an expired session.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<Option<User>> {
        let body = json!({
            "name": name,
            "email": email,
            "password": password.expose_secret(),
        });
        let data = self
            .request("/auth/register", &RequestOptions::post(body), false)
            .await?;

        let user = self.establish_session(data)?;
        info!("Registered and signed in");
        Ok(user)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` with status 401 for bad credentials.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<Option<User>> {
        let body = json!({
            "email": email,
            "password": password.expose_secret(),
        });
        let data = self
            .request("/auth/login", &RequestOptions::post(body), false)
            .await?;

        let user = self.establish_session(data)?;
        info!("Signed in");
        Ok(user)
    }

    /// Sign out.
    ///
    /// The server call is best-effort; local credentials and the cached user
    /// are cleared regardless of its outcome.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        let refresh_token = self.session().refresh_token();
        let body = json!({
            "refreshToken": refresh_token.as_ref().map(|t| t.expose_secret()),
        });

        if let Err(e) = self
            .request("/auth/logout", &RequestOptions::post(body), false)
            .await
        {
            warn!(error = %e, "Server-side logout failed");
        }

        self.session().clear();
        info!("Signed out");
    }

    fn establish_session(&self, data: Option<Value>) -> Result<Option<User>> {
        let response: AuthResponse = serde_json::from_value(data.unwrap_or(Value::Null))?;

        self.session().save_tokens(&response.tokens)?;
        if let Some(user) = &response.user {
            self.session().save_user(user)?;
        }

        Ok(response.user)
    }
}
