//! Configuration for the lattice demo and meshing services.
//!
//! Settings persist to disk as `config.ron` and can be overridden from the
//! command line. Missing sections and fields fall back to defaults, so older
//! files keep loading.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{ChunkConfig, Config, DebugConfig, DemoConfig, DemoScene, MeshingConfig};
pub use error::ConfigError;
