//! Storefront Core - Shared types library.
//!
//! This crate provides the pure half of the storefront client:
//! - `storefront-client` - HTTP request pipeline and the persisted cart store
//! - `storefront-cli` - Command-line front end
//!
//! # Architecture
//!
//! The core crate contains only types, pure functions, and traits - no network
//! I/O and no HTTP clients. The cart reducer lives here so it can be tested
//! without any storage or runtime.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for string IDs and prices
//! - [`catalog`] - Product and category normalization
//! - [`cart`] - Cart line items, actions, and the reducer
//! - [`storage`] - Key/value storage abstraction for durable client state

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod storage;
pub mod types;

pub use cart::{Cart, CartAction, CartProduct, LineItem, ServerCartItem, apply};
pub use catalog::{Category, Product, Rating};
pub use storage::{MemoryStorage, Storage, StorageError};
pub use types::*;
