//! Request layers of the authenticated area.
//!
//! Applied in this order: session check, idle timeout, menu guard.

mod auth;
mod guard;
mod idle;

pub use auth::require_session;
pub use guard::{GuardedMenu, guard_routes};
pub use idle::enforce_idle;
pub(crate) use idle::log_off_idle;
