//! Marigold Core - Shared types library.
//!
//! This crate provides the domain types shared by the Marigold components:
//! - `admin` - Admin console and trial/demo pages
//! - `cli` - Operator tooling (migrations, admin and trial provisioning)
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. The optional `postgres` feature adds sqlx codecs.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for emails, roles, opaque tokens and ids

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
