//! Background meshing pipeline: chunk store snapshots go to a pool of worker
//! threads over channels and meshes come back the same way.
//!
//! Each task owns its snapshot, so workers share nothing mutable. The only
//! shared state is the immutable registry and an in-flight counter.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use lattice_voxel::{ChunkStore, VoxelTypeRegistry};

use crate::chunk_mesh::{ChunkMesh, MeshOptions, mesh_chunk};

/// One chunk to mesh. Owns everything the worker needs.
pub struct MeshingTask {
    /// Caller-chosen key used to match results to chunks.
    pub chunk_id: u64,
    /// Snapshot of the chunk's voxels.
    pub store: ChunkStore,
    /// [`Chunk::version`](lattice_voxel::Chunk::version) when the snapshot was taken.
    pub data_version: u64,
}

/// A finished mesh, tagged with the task it came from.
pub struct MeshingResult {
    /// Key of the chunk this mesh is for.
    pub chunk_id: u64,
    /// The generated mesh.
    pub mesh: ChunkMesh,
    /// Copied from the task.
    pub data_version: u64,
}

/// Meshing pipeline backed by a thread pool.
///
/// The owner submits [`MeshingTask`]s with [`submit`](Self::submit) and
/// collects [`MeshingResult`]s with [`drain_results`](Self::drain_results).
/// Neither call blocks.
pub struct MeshingPipeline {
    /// `None` once shut down.
    tasks: Option<Sender<MeshingTask>>,
    /// Keeps the queue open when no worker could be spawned.
    _queue: Receiver<MeshingTask>,
    results: Receiver<MeshingResult>,
    workers: Vec<JoinHandle<()>>,
    /// Maximum number of tasks queued or running at once.
    budget: usize,
    pending: Arc<AtomicUsize>,
}

impl MeshingPipeline {
    /// Creates a pipeline with `worker_count` threads and room for `budget`
    /// in-flight tasks.
    pub fn new(
        worker_count: usize,
        budget: usize,
        registry: Arc<VoxelTypeRegistry>,
        options: MeshOptions,
    ) -> Self {
        let budget = budget.max(1);
        let (task_tx, task_rx) = crossbeam_channel::bounded::<MeshingTask>(budget);
        let (done_tx, done_rx) = crossbeam_channel::unbounded();
        let pending = Arc::new(AtomicUsize::new(0));

        let mut workers = Vec::with_capacity(worker_count);
        for worker in 0..worker_count {
            let inbox = task_rx.clone();
            let outbox = done_tx.clone();
            let registry = Arc::clone(&registry);
            let pending = Arc::clone(&pending);

            let spawned = thread::Builder::new()
                .name(format!("mesh-worker-{worker}"))
                .spawn(move || {
                    for task in inbox.iter() {
                        let mesh = mesh_chunk(&task.store, &registry, options);
                        tracing::trace!(
                            "meshed chunk {} v{}: {} quads",
                            task.chunk_id,
                            task.data_version,
                            mesh.quad_count()
                        );
                        // The receiver only disappears with the pipeline itself.
                        let _ = outbox.send(MeshingResult {
                            chunk_id: task.chunk_id,
                            data_version: task.data_version,
                            mesh,
                        });
                        pending.fetch_sub(1, Ordering::Relaxed);
                    }
                });
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(err) => tracing::warn!("failed to spawn meshing worker {}: {}", worker, err),
            }
        }

        if workers.is_empty() {
            tracing::warn!("meshing pipeline has no workers, tasks will queue until shutdown");
        }

        Self {
            tasks: Some(task_tx),
            _queue: task_rx,
            results: done_rx,
            workers,
            budget,
            pending,
        }
    }

    /// Worker count that leaves two cores free, at least one.
    pub fn default_worker_count() -> usize {
        num_cpus::get().saturating_sub(2).max(1)
    }

    /// Creates a pipeline with [`default_worker_count`](Self::default_worker_count)
    /// workers and a budget of 64.
    pub fn with_defaults(registry: Arc<VoxelTypeRegistry>, options: MeshOptions) -> Self {
        Self::new(Self::default_worker_count(), 64, registry, options)
    }

    /// Submits a task. Returns `false` if the budget is exhausted or the
    /// pipeline has been shut down.
    pub fn submit(&self, task: MeshingTask) -> bool {
        let Some(tasks) = &self.tasks else {
            return false;
        };
        if self.pending.load(Ordering::Relaxed) >= self.budget {
            tracing::warn!(
                "meshing budget exhausted ({} in flight), chunk {} rejected",
                self.budget,
                task.chunk_id
            );
            return false;
        }
        self.pending.fetch_add(1, Ordering::Relaxed);
        let accepted = tasks.try_send(task).is_ok();
        if !accepted {
            self.pending.fetch_sub(1, Ordering::Relaxed);
        }
        accepted
    }

    /// Collects every finished result without blocking.
    pub fn drain_results(&self) -> Vec<MeshingResult> {
        self.results.try_iter().collect()
    }

    /// Number of tasks currently queued or being processed.
    pub fn in_flight_count(&self) -> usize {
        self.pending.load(Ordering::Relaxed)
    }

    /// Maximum number of tasks queued or running at once.
    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Number of worker threads still attached.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Shuts down all worker threads.
    ///
    /// Drops the task sender so workers exit after finishing queued tasks,
    /// then joins them. Results already produced stay drainable.
    pub fn shutdown(&mut self) {
        drop(self.tasks.take());
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                tracing::warn!("meshing worker panicked");
            }
        }
    }
}

impl Drop for MeshingPipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}
