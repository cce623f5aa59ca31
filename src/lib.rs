//! Portfolio: a small catalog of projects grouped into categories.
//!
//! [`db::Database`] is the storage handle every operation runs against,
//! [`api`] exposes it over HTTP.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
