pub mod actions;
pub mod classifier;
pub mod config;
pub mod error;
pub mod gate;
pub mod reducer;
pub mod sequencer;
pub mod state;

pub use actions::*;
pub use reducer::*;
pub use state::*;

pub use config::Config;
pub use error::ConfigError;
