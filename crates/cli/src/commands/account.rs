//! Session commands.

use std::error::Error;

use secrecy::SecretString;
use serde_json::json;
use tracing::info;

use super::{Context, print_json};

/// Create an account and sign in.
///
/// # Errors
///
/// Returns an error if the backend rejects the registration.
pub async fn register(
    ctx: &Context,
    name: &str,
    email: &str,
    password: SecretString,
) -> Result<(), Box<dyn Error>> {
    let user = ctx.api.register(name, email, &password).await?;
    info!(email = %email, "Account created");
    print_json(&user)
}

/// Sign in.
///
/// # Errors
///
/// Returns an error if the credentials are rejected.
pub async fn login(ctx: &Context, email: &str, password: SecretString) -> Result<(), Box<dyn Error>> {
    let user = ctx.api.login(email, &password).await?;
    print_json(&user)
}

/// Sign out. Local credentials are always cleared.
pub async fn logout(ctx: &Context) {
    ctx.api.logout().await;
}

/// Print the cached user and whether a credential is stored.
///
/// # Errors
///
/// Returns an error if the output cannot be encoded.
pub fn whoami(ctx: &Context) -> Result<(), Box<dyn Error>> {
    print_json(&json!({
        "authenticated": ctx.api.is_authenticated(),
        "user": ctx.api.current_user(),
    }))
}
