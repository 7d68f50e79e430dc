//! Sample block types and chunk contents for the demo.

use lattice_config::DemoScene;
use lattice_voxel::{
    CHUNK_SIZE, Chunk, ChunkError, Packing, RegistryError, Transparency, VoxelTypeDef,
    VoxelTypeId, VoxelTypeRegistry,
};
use noise::{NoiseFn, Simplex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Columns at or below this height are flooded with water.
const SEA_LEVEL: u8 = 12;
/// Ore voxels scattered through the stone of each terrain chunk.
const ORE_COUNT: usize = 24;

/// Ids of the block types registered by [`build_registry`].
#[derive(Clone, Copy, Debug)]
pub struct DemoBlocks {
    pub stone: VoxelTypeId,
    pub dirt: VoxelTypeId,
    pub grass: VoxelTypeId,
    pub granite: VoxelTypeId,
    pub coal_ore: VoxelTypeId,
    pub iron_ore: VoxelTypeId,
    pub water: VoxelTypeId,
}

fn register(
    registry: &mut VoxelTypeRegistry,
    name: &str,
    transparency: Transparency,
    material_index: u16,
) -> Result<VoxelTypeId, RegistryError> {
    registry.register(VoxelTypeDef {
        name: name.to_string(),
        solid: transparency == Transparency::Opaque,
        transparency,
        material_index,
    })
}

/// Registers the demo's block types. Everything is opaque except water.
pub fn build_registry() -> Result<(VoxelTypeRegistry, DemoBlocks), RegistryError> {
    let mut registry = VoxelTypeRegistry::new();
    let blocks = DemoBlocks {
        stone: register(&mut registry, "stone", Transparency::Opaque, 1)?,
        dirt: register(&mut registry, "dirt", Transparency::Opaque, 2)?,
        grass: register(&mut registry, "grass", Transparency::Opaque, 3)?,
        granite: register(&mut registry, "granite", Transparency::Opaque, 4)?,
        coal_ore: register(&mut registry, "coal_ore", Transparency::Opaque, 5)?,
        iron_ore: register(&mut registry, "iron_ore", Transparency::Opaque, 6)?,
        water: register(&mut registry, "water", Transparency::SemiTransparent, 7)?,
    };
    Ok((registry, blocks))
}

/// Builds chunk number `chunk_index` of `scene`.
///
/// Terrain chunks sit side by side along +X, so neighbouring indices share
/// continuous heights. Fails with [`ChunkError::PaletteFull`] when the scene
/// needs more block types than `packing` can hold.
pub fn build_chunk(
    scene: DemoScene,
    seed: u64,
    chunk_index: u32,
    packing: Packing,
    blocks: &DemoBlocks,
) -> Result<Chunk, ChunkError> {
    let mut chunk = Chunk::new_filled(packing, VoxelTypeId::AIR);
    match scene {
        DemoScene::Single => {
            chunk.set(0, 0, 0, blocks.stone)?;
        }
        DemoScene::Slab => fill_box(&mut chunk, [3, 0, 0], [32, 16, 32], blocks.granite)?,
        DemoScene::Terrain => build_terrain(&mut chunk, seed, chunk_index, blocks)?,
    }
    Ok(chunk)
}

/// Sets every voxel in `min..max` (exclusive) to `voxel`.
fn fill_box(
    chunk: &mut Chunk,
    min: [u8; 3],
    max: [u8; 3],
    voxel: VoxelTypeId,
) -> Result<(), ChunkError> {
    for x in min[0]..max[0] {
        for y in min[1]..max[1] {
            for z in min[2]..max[2] {
                chunk.set(x, y, z, voxel)?;
            }
        }
    }
    Ok(())
}

/// Column height from four octaves of simplex fBm, in `1..=30`.
fn column_height(noise: &Simplex, x: f64, z: f64) -> u8 {
    let mut total = 0.0;
    let mut frequency = 1.0 / 48.0;
    let mut amplitude = 1.0;
    for _ in 0..4 {
        total += noise.get([x * frequency, z * frequency]) * amplitude;
        frequency *= 2.0;
        amplitude *= 0.5;
    }
    (14.0 + total * 8.0).round().clamp(1.0, 30.0) as u8
}

fn build_terrain(
    chunk: &mut Chunk,
    seed: u64,
    chunk_index: u32,
    blocks: &DemoBlocks,
) -> Result<(), ChunkError> {
    let noise = Simplex::new(seed as u32);
    let origin_x = f64::from(chunk_index) * CHUNK_SIZE as f64;

    let mut heights = [[0u8; CHUNK_SIZE]; CHUNK_SIZE];
    for x in 0..CHUNK_SIZE {
        for z in 0..CHUNK_SIZE {
            let height = column_height(&noise, origin_x + x as f64, z as f64);
            heights[x][z] = height;
            for y in 0..height.max(SEA_LEVEL) {
                let voxel = if y >= height {
                    blocks.water
                } else if y + 1 == height && height > SEA_LEVEL {
                    blocks.grass
                } else if y + 4 >= height {
                    blocks.dirt
                } else {
                    blocks.stone
                };
                chunk.set(x as u8, y, z as u8, voxel)?;
            }
        }
    }

    let chunk_seed = seed ^ u64::from(chunk_index).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let mut rng = ChaCha8Rng::seed_from_u64(chunk_seed);
    for _ in 0..ORE_COUNT {
        let x = rng.random_range(0..CHUNK_SIZE);
        let z = rng.random_range(0..CHUNK_SIZE);
        // Only replace stone, which lies below the four dirt layers.
        let stone_top = heights[x][z].saturating_sub(4);
        if stone_top == 0 {
            continue;
        }
        let y = rng.random_range(0..stone_top);
        let ore = if rng.random_bool(0.3) {
            blocks.iron_ore
        } else {
            blocks.coal_ore
        };
        chunk.set(x as u8, y, z as u8, ore)?;
    }
    Ok(())
}
