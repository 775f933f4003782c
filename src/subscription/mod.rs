//! Followed-feeds state with optimistic follow/unfollow.
//!
//! [`SubscriptionList`] owns the set of followed feed ids and the rows shown
//! for them. Mutations are applied locally right away; the matching server
//! call runs on a background task and its [`SubscriptionEvent`] either
//! confirms the change or reverts it.

mod list;
mod pending;

pub use list::{SubscriptionEvent, SubscriptionList};
