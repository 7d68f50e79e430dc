//! Lattice demo: builds sample chunks, meshes them on the background
//! pipeline, edits one and remeshes it, logging quad counts throughout.

mod scenes;

use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use lattice_config::{CliArgs, Config, MeshingConfig};
use lattice_mesh::{
    ChunkMesh, ChunkMeshState, FaceDirection, MeshOptions, MeshingPipeline, MeshingTask,
};
use lattice_voxel::{Chunk, ChunkError, MESH_DIRTY, Packing, RegistryError, VoxelTypeRegistry};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// How long to wait for the pipeline before giving up.
const MESH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
enum DemoError {
    #[error("failed to build block registry: {0}")]
    Registry(#[from] RegistryError),
    #[error("failed to build chunk: {0}")]
    Chunk(#[from] ChunkError),
    #[error("timed out with {0} chunks still waiting for a mesh")]
    MeshTimeout(usize),
}

/// A chunk together with its mesh cache state.
struct DemoChunk {
    id: u64,
    chunk: Chunk,
    state: ChunkMeshState,
    mesh: Option<ChunkMesh>,
}

impl DemoChunk {
    fn is_settled(&self) -> bool {
        !self.state.remesh_pending && !self.state.is_stale(self.chunk.version())
    }
}

fn main() {
    let args = CliArgs::parse();

    // Resolve config directory
    let config_dir = args.config.clone().unwrap_or_else(Config::default_dir);

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    lattice_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    info!(
        "Lattice demo: scene {:?}, seed {}, {} chunks, {}-bit packing",
        config.demo.scene, config.demo.seed, config.demo.chunk_count, config.chunk.packing_bits
    );

    if let Err(e) = run(&config) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(config: &Config) -> Result<(), DemoError> {
    let packing = Packing::from_bits(config.chunk.packing_bits)?;
    let (registry, blocks) = scenes::build_registry()?;
    info!("Registry: {} block types", registry.len());

    let mut chunks = Vec::new();
    for index in 0..config.demo.chunk_count {
        match scenes::build_chunk(config.demo.scene, config.demo.seed, index, packing, &blocks) {
            Ok(chunk) => {
                info!(
                    "Built chunk {}: {} resident types, version {}",
                    index,
                    chunk.store().palette_len(),
                    chunk.version()
                );
                chunks.push(DemoChunk {
                    id: u64::from(index),
                    chunk,
                    state: ChunkMeshState::new(),
                    mesh: None,
                });
            }
            Err(ChunkError::PaletteFull { capacity }) => warn!(
                "Chunk {} needs more than {} block types with {:?} packing, skipped",
                index, capacity, packing
            ),
            Err(e) => return Err(e.into()),
        }
    }

    let registry = Arc::new(registry);
    let mut pipeline = build_pipeline(&config.meshing, registry);
    info!(
        "Meshing pipeline: {} workers, budget {}",
        pipeline.worker_count(),
        pipeline.budget()
    );

    let start = Instant::now();
    remesh_until_settled(&pipeline, &mut chunks)?;
    info!("Meshed {} chunks in {:?}", chunks.len(), start.elapsed());
    for chunk in &chunks {
        report(chunk);
    }

    // Drop a block on top of the first chunk and pick up the change.
    if let Some(first) = chunks.first_mut() {
        match first.chunk.set(16, 31, 16, blocks.stone) {
            Ok(_) => {
                info!(
                    "Edited chunk {}: version {}, mesh dirty = {}",
                    first.id,
                    first.chunk.version(),
                    first.chunk.is_dirty(MESH_DIRTY)
                );
                remesh_until_settled(&pipeline, &mut chunks)?;
            }
            Err(e) => warn!("Edit of chunk {} rejected: {}", first.id, e),
        }
    }
    if let Some(first) = chunks.first() {
        report(first);
    }

    pipeline.shutdown();
    Ok(())
}

/// Pipeline for `meshing`. A worker count of 0 is sized from the CPU count.
fn build_pipeline(meshing: &MeshingConfig, registry: Arc<VoxelTypeRegistry>) -> MeshingPipeline {
    let workers = match meshing.worker_count {
        0 => MeshingPipeline::default_worker_count(),
        n => n,
    };
    let options = MeshOptions {
        cull_against_opaque: meshing.cull_against_opaque,
    };
    MeshingPipeline::new(workers, meshing.task_budget, registry, options)
}

/// Submits every stale chunk and applies results until all meshes are current.
fn remesh_until_settled(
    pipeline: &MeshingPipeline,
    chunks: &mut [DemoChunk],
) -> Result<(), DemoError> {
    let start = Instant::now();
    loop {
        for entry in chunks.iter_mut() {
            let version = entry.chunk.version();
            if !entry.state.needs_remesh(version) {
                continue;
            }
            let task = MeshingTask {
                chunk_id: entry.id,
                store: entry.chunk.store().clone(),
                data_version: version,
            };
            // A rejected task is retried on the next pass.
            if pipeline.submit(task) {
                entry.state.mark_pending();
            }
        }

        for result in pipeline.drain_results() {
            let Some(entry) = chunks.iter_mut().find(|c| c.id == result.chunk_id) else {
                continue;
            };
            if !entry.state.complete(result.data_version) {
                debug!(
                    "Discarded out-of-date mesh for chunk {} (v{})",
                    result.chunk_id, result.data_version
                );
                continue;
            }
            if !entry.state.is_stale(entry.chunk.version()) {
                entry.chunk.clear_dirty(MESH_DIRTY);
            }
            entry.mesh = Some(result.mesh);
        }

        let waiting = chunks.iter().filter(|c| !c.is_settled()).count();
        if waiting == 0 {
            return Ok(());
        }
        if start.elapsed() > MESH_TIMEOUT {
            return Err(DemoError::MeshTimeout(waiting));
        }
        std::thread::sleep(Duration::from_millis(1));
    }
}

fn report(entry: &DemoChunk) {
    let Some(mesh) = &entry.mesh else {
        info!("Chunk {}: nothing to mesh", entry.id);
        return;
    };
    let counts = FaceDirection::ALL.map(|face| mesh.count_quads_for_direction(face));
    info!(
        "Chunk {} v{}: {} quads in {} batches (+X {}, -X {}, +Y {}, -Y {}, +Z {}, -Z {})",
        entry.id,
        entry.state.meshed_version,
        mesh.quad_count(),
        mesh.batches().len(),
        counts[0],
        counts[1],
        counts[2],
        counts[3],
        counts[4],
        counts[5]
    );

    let bytes: usize = mesh.batches().iter().map(|b| b.quad_bytes().len()).sum();
    debug!("Chunk {}: {} bytes of quad data", entry.id, bytes);
    if let Some(batch) = mesh.batches().first()
        && let Some(quad) = batch.quads.first()
    {
        let (origin, size) = quad.voxel_rect(batch.axis_order);
        debug!(
            "  first quad: {:?} {:?} at {:?}, size {:?}",
            batch.voxel_type, batch.face, origin, size
        );
    }
}
