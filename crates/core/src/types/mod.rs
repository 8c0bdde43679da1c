//! Core types for Marigold.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod role;
pub mod token;

pub use email::{Email, EmailError};
pub use id::*;
pub use role::{AdminRole, ParseRoleError};
pub use token::{SessionToken, TokenError, TrialToken};
