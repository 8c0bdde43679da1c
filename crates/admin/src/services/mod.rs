//! Business logic services for admin.
//!
//! # Services
//!
//! - `admins` - Admin allow-list management
//! - `auth` - Admin sessions, allow-list authorization and password login
//! - `trial` - Trial token validation and trial sessions
//! - `notify` - Fire-and-forget email/SMS notifications
//! - `janitor` - Periodic expired-session cleanup

pub mod admins;
pub mod auth;
pub mod janitor;
pub mod notify;
pub mod trial;

pub use admins::{AdminError, AdminManager};
pub use auth::{AuthError, PasswordAuthenticator, SessionManager};
pub use janitor::spawn_session_janitor;
pub use notify::{EmailNotification, NotificationDispatcher, NotifyError, SmsNotification};
pub use trial::{TrialError, TrialManager};
