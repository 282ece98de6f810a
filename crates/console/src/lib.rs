//! Identity Console Library
//!
//! Administrative web front end for the identity API. The `identity-console`
//! binary serves it; the modules are public for integration testing.

pub mod api;
pub mod config;
pub mod error;
pub mod form;
pub mod i18n;
pub mod idle;
pub mod menu;
pub mod middleware;
pub mod nav;
pub mod notify;
pub mod routes;
pub mod session;
pub mod state;
pub mod theme;

pub use config::Config;
pub use state::AppState;
