//! The persisted client-side cart.
//!
//! [`CartStore`] owns one [`Cart`], applies actions through the pure reducer,
//! and writes a snapshot to storage after every change. It is seeded from the
//! same slot on load; a missing or unreadable snapshot yields an empty cart.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use storefront_core::storage::keys;
use storefront_core::{
    Cart, CartAction, CartProduct, LineItem, Price, ProductId, ServerCartItem, Storage, apply,
};
use tracing::{debug, warn};

use crate::error::{ClientError, Result};

/// Client-side cart with durable persistence.
///
/// Cheap to clone; clones share the same cart.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    storage: Arc<dyn Storage>,
    cart: Mutex<Cart>,
}

/// A non-owning reference to a [`CartStore`].
///
/// Long-lived components hold a handle instead of the store itself. Using a
/// handle after every store clone has been dropped fails with
/// [`ClientError::MissingContext`].
#[derive(Clone)]
pub struct CartHandle {
    inner: Weak<CartStoreInner>,
}

impl CartHandle {
    /// The store this handle refers to.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::MissingContext` if the store has been dropped.
    pub fn store(&self) -> Result<CartStore> {
        self.inner
            .upgrade()
            .map(|inner| CartStore { inner })
            .ok_or(ClientError::MissingContext("CartHandle"))
    }
}

impl CartStore {
    /// Load the cart persisted in `storage`.
    #[must_use]
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let cart = match storage.get(keys::CART) {
            None => Cart::new(),
            Some(snapshot) => Cart::from_json(&snapshot).unwrap_or_else(|e| {
                warn!(error = %e, "Stored cart is unreadable, starting empty");
                Cart::new()
            }),
        };
        debug!(items = cart.len(), "Cart loaded");

        Self {
            inner: Arc::new(CartStoreInner {
                storage,
                cart: Mutex::new(cart),
            }),
        }
    }

    /// A non-owning handle to this store.
    #[must_use]
    pub fn handle(&self) -> CartHandle {
        CartHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Apply an action and persist the result.
    ///
    /// Persistence failures are logged; the in-memory cart still changes.
    pub fn dispatch(&self, action: CartAction) {
        let mut cart = self.lock();
        let next = apply(std::mem::take(&mut *cart), action);

        match next.to_json() {
            Ok(snapshot) => {
                if let Err(e) = self.inner.storage.set(keys::CART, &snapshot) {
                    warn!(error = %e, "Failed to persist cart");
                }
            }
            Err(e) => warn!(error = %e, "Failed to encode cart"),
        }

        *cart = next;
    }

    /// Add `qty` units of a product. Quantities below 1 count as 1.
    pub fn add_to_cart(&self, product: impl Into<CartProduct>, qty: i64) {
        self.dispatch(CartAction::Add {
            item: product.into(),
            qty,
        });
    }

    /// Remove the `(id, size)` row.
    pub fn remove_from_cart(&self, id: impl Into<ProductId>, size: Option<&str>) {
        self.dispatch(CartAction::Remove {
            id: id.into(),
            size: size.map(str::to_owned),
        });
    }

    /// Set the quantity of the `(id, size)` row. Quantities below 1 count as 1.
    pub fn set_qty(&self, id: impl Into<ProductId>, qty: i64, size: Option<&str>) {
        self.dispatch(CartAction::SetQuantity {
            id: id.into(),
            qty,
            size: size.map(str::to_owned),
        });
    }

    /// Set the variant selector on every row of a product.
    pub fn set_size(&self, id: impl Into<ProductId>, size: Option<&str>) {
        self.dispatch(CartAction::SetVariant {
            id: id.into(),
            size: size.map(str::to_owned),
        });
    }

    /// Remove every row.
    pub fn clear_cart(&self) {
        self.dispatch(CartAction::Clear);
    }

    /// Replace the local cart with the server's.
    pub fn sync_cart(&self, server_items: &[ServerCartItem]) {
        let items: Vec<LineItem> = server_items
            .iter()
            .map(ServerCartItem::to_line_item)
            .collect();
        self.dispatch(CartAction::ReplaceAll(items));
    }

    /// Total units across all rows.
    #[must_use]
    pub fn cart_count(&self) -> u64 {
        self.lock().count()
    }

    /// Sum of `price × qty` across all rows.
    #[must_use]
    pub fn cart_total(&self) -> Price {
        self.lock().total()
    }

    /// The current rows, in display order.
    #[must_use]
    pub fn items(&self) -> Vec<LineItem> {
        self.lock().items().to_vec()
    }

    /// A copy of the current cart.
    #[must_use]
    pub fn snapshot(&self) -> Cart {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Cart> {
        self.inner.cart.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
