pub mod config;
pub mod core;
pub mod handlers;
pub mod notify;
pub mod registry;
pub mod routes;
pub mod state;
pub mod summarize;
pub mod telephony;

// Re-export commonly used items for convenience
pub use config::ServerConfig;
pub use core::*;
pub use registry::{SessionRegistry, SessionSettings};
pub use state::AppState;
