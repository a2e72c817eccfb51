//! Devfeed - a content-sharing backend with theme subscriptions
//!
//! This library provides the core functionality for the Devfeed service.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
