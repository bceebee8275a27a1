//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span with a `request_id` field)
//! 3. Request ID (fills the span field, Sentry tag, response header)
//! 4. Session layer (tower-sessions, signed cookie)
//! 5. Rate limiting on `/auth` (governor), when enabled

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use auth::{OptionalAuth, RequireAdmin, RequireAuth, clear_current_user, set_current_user};
pub use rate_limit::{auth_rate_limiter, rate_limited_as_json};
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
