//! CenterDesk Core - Shared types library.
//!
//! This crate provides common types used across all CenterDesk components:
//! - `server` - Multi-tenant shop-management backend
//! - `cli` - Command-line tools for bootstrap and request review
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no remote
//! datastore access. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, usernames, roles, and
//!   request statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
