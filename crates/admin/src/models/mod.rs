//! Domain models for the admin console.
//!
//! - [`admin_user`] - allow-list rows and their role
//! - [`session`] - admin session rows and client-side session keys
//! - [`trial`] - trial users and trial sessions

pub mod admin_user;
pub mod session;
pub mod trial;

pub use admin_user::{AdminRole, AdminUser, NewAdminUser};
pub use session::{AdminSession, CurrentAdmin, NewAdminSession, SessionLookup, keys as session_keys};
pub use trial::{NewTrialUser, TrialSession, TrialUser};
