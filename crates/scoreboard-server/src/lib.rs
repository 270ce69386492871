//! HTTP API server for the scoreboard leaderboard.
//!
//! Wraps a [`scoreboard::ScoreService`] over the configured aggregate store
//! and exposes it as a small JSON API: list, add and clear scores.

mod config;
mod cors;
mod error;
mod logging;
mod routes;
mod state;

pub use config::{
    Config, ConfigError, CorsConfig, LogFormat, LoggingConfig, ServerConfig, StoreBackend,
    StoreConfig,
};
pub use cors::build_cors_layer;
pub use error::{ApiError, ErrorBody, ErrorResponse};
pub use logging::{LoggingError, init as init_logging};
pub use routes::{AddScoreRequest, MutationResponse, router};
pub use state::{AppState, StateError};
