pub mod auth;
pub mod body;
pub mod consent;
pub mod contacts;
pub mod error;
pub mod jobs;
pub mod messages;
pub mod middleware;
pub mod routes;
pub mod safeguarding;
pub mod sponsor;
pub mod topics;
pub mod users;

pub use auth::{AppState, AppStateInner};
pub use routes::router;
