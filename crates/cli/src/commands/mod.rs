//! Subcommand implementations.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod reviews;

use std::error::Error;
use std::sync::Arc;

use serde::Serialize;
use storefront_client::{ApiClient, CartStore, ClientConfig, FileStorage};

/// Everything a subcommand needs: the API client and the local cart, both
/// backed by the state file.
pub struct Context {
    pub api: ApiClient,
    pub cart: CartStore,
}

impl Context {
    /// Build from environment configuration, optionally overriding the
    /// backend origin.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid, the state file cannot be
    /// read, or the HTTP client cannot be built.
    pub fn from_env(api_url: Option<&str>) -> Result<Self, Box<dyn Error>> {
        let mut config = ClientConfig::from_env()?;
        if let Some(api_url) = api_url {
            config.api_url = ClientConfig::new(api_url)?.api_url;
        }

        tracing::debug!(
            api_url = %config.api_url,
            state_file = %config.state_file.display(),
            "Loaded configuration"
        );

        let storage = Arc::new(FileStorage::open(&config.state_file)?);
        let api = ApiClient::new(&config, storage.clone())?;
        let cart = CartStore::load(storage);

        Ok(Self { api, cart })
    }
}

/// Parse repeated `key=value` arguments.
///
/// # Errors
///
/// Returns an error naming the first argument without an `=`.
pub fn parse_params(raw: &[String]) -> Result<Vec<(&str, &str)>, String> {
    raw.iter()
        .map(|pair| {
            pair.split_once('=')
                .ok_or_else(|| format!("Expected KEY=VALUE, got '{pair}'"))
        })
        .collect()
}

/// Write a value to stdout as pretty JSON.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
#[allow(clippy::print_stdout)]
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
