//! HTTP API handlers for callsign-lookup

pub mod auth;
pub mod health;
pub mod lookup;
pub mod ui;
pub mod update;

pub use auth::{AuthError, Authenticator, DisabledAuthenticator, HeaderAuthenticator};
pub use health::health_routes;
pub use lookup::lookup;
pub use ui::serve_index;
pub use update::update;
