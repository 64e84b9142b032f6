//! # ddt-common
//!
//! Shared code for the Digital Drift Tracker service and its job runner:
//! - Error type and configuration resolution
//! - Database schema, migrations and row models
//! - Domain vocabulary (categories, event types, drift labels)
//! - Password hashing and bearer token signing

pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod time;
pub mod vocab;

pub use error::{Error, Result};
pub use vocab::{Category, DriftType, EventType, Severity};
