//! Storefront client library.
//!
//! Mediates every call to the storefront backend and owns the client-side
//! cart.
//!
//! # Architecture
//!
//! - [`ApiClient`] attaches the stored bearer credential to each request and,
//!   on a 401, renews the session once before retrying. Concurrent 401s share
//!   a single renewal.
//! - [`CartStore`] wraps the pure cart reducer from `storefront-core`, seeding
//!   from and persisting to a [`Storage`](storefront_core::Storage) slot.
//! - The two share nothing but storage; reconcile a server cart into the local
//!   one with [`CartStore::sync_cart`].
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use storefront_client::{ApiClient, CartStore, ClientConfig, FileStorage};
//!
//! let config = ClientConfig::from_env()?;
//! let storage = Arc::new(FileStorage::open(&config.state_file)?);
//! let api = ApiClient::new(&config, storage.clone())?;
//! let cart = CartStore::load(storage);
//!
//! if let Some(product) = api.get_product("65f1").await? {
//!     cart.add_to_cart(&product, 2);
//! }
//! println!("{} items, {}", cart.cart_count(), cart.cart_total());
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart_store;
pub mod config;
pub mod error;
pub mod file_storage;
pub mod session;

pub use api::{ApiClient, RequestOptions};
pub use cart_store::{CartHandle, CartStore};
pub use config::{ClientConfig, ConfigError};
pub use error::{ClientError, RenewalError, Result};
pub use file_storage::FileStorage;
pub use session::{AuthResponse, SessionStore, TokenPair, User};
