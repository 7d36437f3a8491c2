#![warn(missing_docs)]
//! Sentinel collects error reports from services, stores them, and alerts a
//! chat channel at most once per cooldown window for each service and
//! operation.

pub mod config;
pub mod engine;
pub mod http_client;
pub mod http_server;
pub mod models;
pub mod notification;
pub mod persistence;
pub mod supervisor;
pub mod test_helpers;
