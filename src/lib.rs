//! # Elegance Store
//!
//! Backend of a small stainless-steel jewelry store: a SQLite catalog and
//! order store, a Telegram bot for browsing and ordering, an HTTP JSON API for
//! the web storefront and back office, and a storefront client that keeps
//! working from a local copy when the server is unreachable.

pub mod api;
pub mod bot;
pub mod client;
pub mod config;
pub mod db;
pub mod dialogue;
pub mod errors;
pub mod localization;
pub mod models;
pub mod notification;
pub mod order_intake;
pub mod seed;
