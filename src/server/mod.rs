//! HTTP upload boundary
//!
//! Validates uploads synchronously, stores them and hands the rest of the
//! work to the background pipeline.

pub mod handlers;
pub mod routes;

pub use handlers::{
    extract_token, ApiError, AUDIO_FIELD, DATABASE_FIELD, SUCCESS_PATH, TOKEN_COOKIE,
};
pub use routes::{build_router, serve, AppContext};
