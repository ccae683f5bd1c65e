//! The cart reducer.

use super::line_item::{Cart, CartProduct, LineItem, clamp_quantity, normalize_size};
use crate::types::ProductId;

/// Everything that can happen to a cart.
///
/// Every action is total: out-of-range quantities are clamped and actions
/// on rows that do not exist are no-ops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    /// Add `qty` units of a product. Merges into an existing `(id, size)` row.
    Add {
        /// Product snapshot, including its variant selector.
        item: CartProduct,
        /// Units to add (clamped to at least 1).
        qty: i64,
    },
    /// Delete the `(id, size)` row.
    Remove {
        /// Product identifier.
        id: ProductId,
        /// Variant selector.
        size: Option<String>,
    },
    /// Set the quantity of the `(id, size)` row.
    SetQuantity {
        /// Product identifier.
        id: ProductId,
        /// New quantity (clamped to at least 1).
        qty: i64,
        /// Variant selector.
        size: Option<String>,
    },
    /// Set the variant selector on every row of a product.
    ///
    /// Rows are renamed, not merged: two rows may end up sharing a key.
    SetVariant {
        /// Product identifier.
        id: ProductId,
        /// New variant selector.
        size: Option<String>,
    },
    /// Remove every row.
    Clear,
    /// Replace the cart wholesale (server reconciliation).
    ReplaceAll(Vec<LineItem>),
}

/// Apply an action to a cart, producing the next cart.
#[must_use]
pub fn apply(mut cart: Cart, action: CartAction) -> Cart {
    match action {
        CartAction::Add { item, qty } => {
            let qty = clamp_quantity(qty);
            let size = normalize_size(item.size.clone());
            let items = cart.items_mut();
            if let Some(existing) = items
                .iter_mut()
                .find(|row| row.matches(&item.id, size.as_deref()))
            {
                existing.qty = existing.qty.saturating_add(qty);
            } else {
                items.push(LineItem::new(item, qty));
            }
            cart
        }
        CartAction::Remove { id, size } => {
            let size = normalize_size(size);
            cart.items_mut()
                .retain(|row| !row.matches(&id, size.as_deref()));
            cart
        }
        CartAction::SetQuantity { id, qty, size } => {
            let qty = clamp_quantity(qty);
            let size = normalize_size(size);
            cart.items_mut()
                .iter_mut()
                .filter(|row| row.matches(&id, size.as_deref()))
                .for_each(|row| row.qty = qty);
            cart
        }
        CartAction::SetVariant { id, size } => {
            let size = normalize_size(size);
            cart.items_mut()
                .iter_mut()
                .filter(|row| row.id == id)
                .for_each(|row| row.size.clone_from(&size));
            cart
        }
        CartAction::Clear => Cart::new(),
        CartAction::ReplaceAll(items) => Cart::from_items(items),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Price;

    fn product(id: &str, price: i64) -> CartProduct {
        CartProduct {
            id: ProductId::from(id),
            title: format!("Product {id}"),
            price: Price::from(price),
            image: format!("{id}.png"),
            size: None,
        }
    }

    fn add(cart: Cart, item: CartProduct, qty: i64) -> Cart {
        apply(cart, CartAction::Add { item, qty })
    }

    fn seeded() -> Cart {
        let cart = add(Cart::new(), product("p1", 10), 2);
        let cart = add(cart, product("p1", 10).with_size("M"), 1);
        add(cart, product("p2", 5), 3)
    }

    #[test]
    fn test_add_merges_same_key() {
        let cart = add(Cart::new(), product("p1", 10), 2);
        let cart = add(cart, product("p1", 10), 3);

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].qty, 5);

        let cart = add(cart, product("p1", 10).with_size("M"), 1);
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.items()[0].qty, 5);
        assert_eq!(cart.items()[1].size.as_deref(), Some("M"));
        assert_eq!(cart.items()[1].qty, 1);
    }

    #[test]
    fn test_add_appends_in_order() {
        let cart = seeded();
        let ids: Vec<_> = cart.items().iter().map(|row| row.id.as_str()).collect();
        assert_eq!(ids, ["p1", "p1", "p2"]);
    }

    #[test]
    fn test_add_clamps_quantity() {
        let cart = add(Cart::new(), product("p1", 10), 0);
        assert_eq!(cart.items()[0].qty, 1);
        let cart = add(cart, product("p1", 10), -4);
        assert_eq!(cart.items()[0].qty, 2);
    }

    #[test]
    fn test_add_keeps_first_snapshot() {
        let cart = add(Cart::new(), product("p1", 10), 1);
        let cart = add(cart, product("p1", 99), 1);
        assert_eq!(cart.items()[0].price, Price::from(10));
    }

    #[test]
    fn test_remove_by_key() {
        let cart = apply(
            seeded(),
            CartAction::Remove {
                id: ProductId::from("p1"),
                size: None,
            },
        );

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.items()[0].size.as_deref(), Some("M"));
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let before = seeded();
        let after = apply(
            before.clone(),
            CartAction::Remove {
                id: ProductId::from("ghost"),
                size: None,
            },
        );
        assert_eq!(after, before);
    }

    #[test]
    fn test_set_quantity_clamps() {
        for raw in [0, -5] {
            let cart = apply(
                seeded(),
                CartAction::SetQuantity {
                    id: ProductId::from("p1"),
                    qty: raw,
                    size: None,
                },
            );
            assert_eq!(cart.items()[0].qty, 1);
            // The sized row is untouched.
            assert_eq!(cart.items()[1].qty, 1);
            assert_eq!(cart.items()[2].qty, 3);
        }
    }

    #[test]
    fn test_set_quantity_targets_variant() {
        let cart = apply(
            seeded(),
            CartAction::SetQuantity {
                id: ProductId::from("p1"),
                qty: 9,
                size: Some("M".to_string()),
            },
        );
        assert_eq!(cart.items()[0].qty, 2);
        assert_eq!(cart.items()[1].qty, 9);
    }

    #[test]
    fn test_set_quantity_missing_is_noop() {
        let before = seeded();
        let after = apply(
            before.clone(),
            CartAction::SetQuantity {
                id: ProductId::from("p2"),
                qty: 4,
                size: Some("XL".to_string()),
            },
        );
        assert_eq!(after, before);
    }

    #[test]
    fn test_set_variant_renames_every_row_without_merging() {
        let cart = apply(
            seeded(),
            CartAction::SetVariant {
                id: ProductId::from("p1"),
                size: Some("L".to_string()),
            },
        );

        assert_eq!(cart.len(), 3);
        assert_eq!(cart.items()[0].size.as_deref(), Some("L"));
        assert_eq!(cart.items()[1].size.as_deref(), Some("L"));
        assert_eq!(cart.items()[0].qty, 2);
        assert_eq!(cart.items()[1].qty, 1);
        assert_eq!(cart.items()[2].size, None);
        assert_eq!(cart.count(), 6);
    }

    #[test]
    fn test_clear() {
        let cart = apply(seeded(), CartAction::Clear);
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Price::ZERO);
    }

    #[test]
    fn test_replace_all() {
        let replacement = vec![LineItem::new(product("p9", 7), 2)];
        let cart = apply(seeded(), CartAction::ReplaceAll(replacement.clone()));
        assert_eq!(cart.items(), replacement.as_slice());
        assert_eq!(cart.total(), Price::from(14));
    }
}
