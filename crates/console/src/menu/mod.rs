//! Menu-driven authorization.
//!
//! The upstream API returns a permission-scoped menu graph per session. It
//! provides:
//! - The set of paths the user may navigate to (route guard)
//! - Per-page capability flags (view/edit/delete/create)
//! - The navigation structure rendered by [`crate::nav`]

mod graph;
mod guard;
mod routes;

pub(crate) use graph::normalize_path;
pub use graph::{
    Capabilities, Capability, CapabilityDefault, MenuGraph, MenuGroup, MenuItem, UnknownPolicy,
};
pub use guard::{DenyReason, GuardDecision, GuardPolicy, authorize, requires_menu};
pub use routes::{RouteDefinition, RouteMatch, RouteTable};
