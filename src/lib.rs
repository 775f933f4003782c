//! Zeeguu feed subscriptions and press-to-speak.
//!
//! - [`subscription`]: followed feeds with optimistic follow/unfollow
//! - [`articles`]: the article list the subscriptions drive
//! - [`speech`]: long-press gesture filter and speech synthesis
//! - [`api`]: the Zeeguu HTTP transport behind the [`api::FeedApi`] seam

pub mod api;
pub mod articles;
pub mod config;
pub mod speech;
pub mod subscription;
pub mod util;
