use criterion::{Criterion, black_box, criterion_group, criterion_main};
use lattice_mesh::*;
use lattice_voxel::{ChunkStore, Transparency, VoxelTypeDef, VoxelTypeId, VoxelTypeRegistry};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn registry() -> VoxelTypeRegistry {
    let mut registry = VoxelTypeRegistry::new();
    for i in 1..8 {
        let _ = registry.register(VoxelTypeDef {
            name: format!("type_{i}"),
            solid: true,
            transparency: Transparency::Opaque,
            material_index: i,
        });
    }
    registry
}

/// Solid lower half with a few random types, like a flat terrain chunk.
fn layered_store() -> ChunkStore {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let mut store = ChunkStore::new_air();
    for x in 0..32 {
        for y in 0..16 {
            for z in 0..32 {
                let voxel = VoxelTypeId(1 + (y as u16 / 4));
                let _ = store.set_block(x, y, z, voxel);
            }
        }
    }
    for _ in 0..200 {
        let _ = store.set_block(
            rng.random_range(0..32),
            rng.random_range(0..16),
            rng.random_range(0..32),
            VoxelTypeId(rng.random_range(5..8)),
        );
    }
    store
}

/// Checkerboard of one type: worst case for merging.
fn checkerboard_store() -> ChunkStore {
    let mut store = ChunkStore::new_air();
    for x in 0..32 {
        for y in 0..32 {
            for z in 0..32 {
                if (x + y + z) % 2 == 0 {
                    let _ = store.set_block(x, y, z, VoxelTypeId(1));
                }
            }
        }
    }
    store
}

fn bench_greedy_full(c: &mut Criterion) {
    let mut bitmap = lattice_voxel::VoxelBitmap::full();
    bitmap.cull_front_bits();
    bitmap.swap_outer_inner_axes();
    c.bench_function("greedy_mesh_boundary_layer", |bencher| {
        bencher.iter(|| black_box(greedy_mesh(black_box(&bitmap))))
    });
}

fn bench_mesh_chunk(c: &mut Criterion) {
    let registry = registry();
    let layered = layered_store();
    let checkerboard = checkerboard_store();
    c.bench_function("mesh_chunk_layered", |bencher| {
        bencher.iter(|| black_box(mesh_chunk(&layered, &registry, MeshOptions::default())))
    });
    c.bench_function("mesh_chunk_checkerboard", |bencher| {
        bencher.iter(|| black_box(mesh_chunk(&checkerboard, &registry, MeshOptions::default())))
    });
}

criterion_group!(benches, bench_greedy_full, bench_mesh_chunk);
criterion_main!(benches);
