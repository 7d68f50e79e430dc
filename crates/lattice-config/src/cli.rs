//! Command-line arguments. Every flag is optional and overrides `config.ron`.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;
use crate::config::DemoScene;

/// Mesh sample voxel chunks and report quad counts.
#[derive(Parser, Debug, Default)]
#[command(name = "lattice", about = "Voxel chunk palette storage and greedy meshing demo")]
pub struct CliArgs {
    /// Bits per voxel index for chunk storage (1 or 8).
    #[arg(long)]
    pub packing_bits: Option<u8>,

    /// Meshing worker threads (0 = one per spare core).
    #[arg(long)]
    pub workers: Option<usize>,

    /// Sample scene to mesh.
    #[arg(long, value_enum)]
    pub scene: Option<DemoScene>,

    /// Seed for scene generation.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(bits) = args.packing_bits {
            self.chunk.packing_bits = bits;
        }
        if let Some(workers) = args.workers {
            self.meshing.worker_count = workers;
        }
        if let Some(scene) = args.scene {
            self.demo.scene = scene;
        }
        if let Some(seed) = args.seed {
            self.demo.seed = seed;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
