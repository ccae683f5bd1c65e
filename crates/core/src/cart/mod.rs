//! Cart state: line items, actions, and the reducer.
//!
//! The reducer ([`apply`]) is a pure function from a cart and an action to
//! a new cart. Persistence and dispatch live in `storefront-client`.

mod line_item;
mod reducer;
mod server_item;

pub use line_item::{Cart, CartProduct, LineItem, clamp_quantity, parse_quantity};
pub use reducer::{CartAction, apply};
pub use server_item::ServerCartItem;
