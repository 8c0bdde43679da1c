//! HTTP middleware for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Session layer (tower-sessions cookie session)
//! 4. Route guard on protected routes ([`require_admin`]) or the trial gate
//!    on trial pages ([`require_trial_token`])

pub mod auth;
pub mod guard;
pub mod session;
pub mod trial_gate;

pub use auth::{RequireAdmin, RequireSuperAdmin};
pub use guard::{GuardState, require_admin};
pub use session::{SESSION_COOKIE_NAME, create_session_layer, postgres_session_store};
pub use trial_gate::{TrialPresence, require_trial_token};
