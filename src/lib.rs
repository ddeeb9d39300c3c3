// src/lib.rs

pub mod api;
pub mod audio;
pub mod config;
pub mod generation;
pub mod llm;
pub mod metrics;
pub mod safety;
pub mod session;
pub mod speech;
pub mod state;

// Export commonly used items
pub use config::CONFIG;
pub use state::AppState;
