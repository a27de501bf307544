//! Per-frame world orchestration.

use std::sync::Arc;

use farshore_config::{Config, IslandMaskMode};
use farshore_field::{ScalarField, TintField};
use farshore_place::{AssetRef, PlacementHandle, Placer};
use farshore_render::{CameraPose, FrameStats, InstanceTransform, InstancedRenderer, MaterialRef, MeshRef};
use farshore_spawn::{
    BlanketConfig, BlanketTickResult, ChunkBlanketSpawner, ChunkStreamingSpawner, DiscreteConfig,
    DiscreteSpawner, SpawnObjectType, SpawnProgress, StreamTickResult, StreamingConfig,
};
use farshore_terrain::{
    Heightfield, HeightfieldParams, HeightfieldTerrain, IslandMask,
};
use farshore_water::{WaterBodyDetector, WaterCluster, WaterDetectConfig};
use glam::{Quat, Vec3};
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

/// Engine-side handles the world places and draws with.
#[derive(Clone, Debug)]
pub struct WorldAssets {
    pub cover_mesh: MeshRef,
    pub cover_material: MaterialRef,
    /// Water surface plane, one placement per enclosed cell.
    pub water_asset: AssetRef,
    pub blanket_asset: AssetRef,
    /// Asset for each discrete spawn type, keyed by type name.
    pub objects: FxHashMap<String, AssetRef>,
}

/// What one [`FarshoreWorld::tick`] call did.
#[derive(Clone, Copy, Debug, Default)]
pub struct WorldTickResult {
    pub stream: StreamTickResult,
    /// Present while the discrete spawn run is still placing.
    pub spawn: Option<SpawnProgress>,
    pub blanket: BlanketTickResult,
}

/// The generated world: heightfield, detected water, and the three
/// population layers, advanced together once per frame.
pub struct FarshoreWorld {
    config: Config,
    assets: WorldAssets,
    noise_mask: Option<Arc<ScalarField>>,
    field: Arc<Heightfield>,
    terrain: Arc<HeightfieldTerrain>,
    clusters: Vec<WaterCluster>,
    water_planes: Vec<Vec3>,
    water_handles: Vec<PlacementHandle>,
    streamer: ChunkStreamingSpawner,
    discrete: DiscreteSpawner,
    blanket: Option<ChunkBlanketSpawner>,
}

impl FarshoreWorld {
    pub fn new(
        config: Config,
        assets: WorldAssets,
        noise_mask: Option<Arc<ScalarField>>,
        placer: &mut dyn Placer,
    ) -> Self {
        let seed = config.terrain.seed;
        let field = Arc::new(Heightfield::generate(&heightfield_params(&config, seed)));
        let terrain = Arc::new(HeightfieldTerrain::new(Arc::clone(&field)));

        let detector = WaterBodyDetector::new(water_config(&config));
        let clusters = detector.process(&field);
        let water_planes = detector.water_plane_positions(&field, &clusters);
        let water_handles = place_water_planes(&config, &assets, &water_planes, placer);
        info!(
            seed,
            clusters = clusters.len(),
            water_planes = water_planes.len(),
            "world generated"
        );

        let streamer = build_streamer(&config, &assets, seed, &terrain, noise_mask.as_ref());
        let discrete = build_discrete(&config, &assets, seed);
        let blanket = config.blanket.enabled.then(|| {
            ChunkBlanketSpawner::new(BlanketConfig {
                asset: assets.blanket_asset,
                chunk_size: config.streaming.chunk_size,
                radius_chunks: config.blanket.radius_chunks,
                height_offset: config.blanket.height_offset,
                scale: config.blanket.scale,
                update_interval: config.blanket.update_interval,
            })
        });

        Self {
            config,
            assets,
            noise_mask,
            field,
            terrain,
            clusters,
            water_planes,
            water_handles,
            streamer,
            discrete,
            blanket,
        }
    }

    pub fn heightfield(&self) -> &Arc<Heightfield> {
        &self.field
    }

    pub fn terrain(&self) -> &Arc<HeightfieldTerrain> {
        &self.terrain
    }

    pub fn water_clusters(&self) -> &[WaterCluster] {
        &self.clusters
    }

    pub fn water_plane_positions(&self) -> &[Vec3] {
        &self.water_planes
    }

    pub fn water_handles(&self) -> &[PlacementHandle] {
        &self.water_handles
    }

    pub fn spawn_complete(&self) -> bool {
        self.discrete.is_complete()
    }

    /// Advances every population layer for one frame.
    pub fn tick(
        &mut self,
        dt: f32,
        anchor: Vec3,
        camera: &CameraPose,
        placer: &mut dyn Placer,
    ) -> WorldTickResult {
        let stream = self.streamer.update(anchor, camera);
        let spawn = if self.discrete.is_complete() {
            None
        } else {
            Some(self.discrete.tick(self.terrain.as_ref(), placer))
        };
        let blanket = match &mut self.blanket {
            Some(b) => b.update(dt, anchor, self.terrain.as_ref(), placer),
            None => BlanketTickResult::default(),
        };

        if self.config.debug.log_stream_stats && stream.anchor_moved {
            debug!(
                generated = stream.generated,
                activated = stream.activated,
                deactivated = stream.deactivated,
                "stream tick"
            );
        }
        WorldTickResult {
            stream,
            spawn,
            blanket,
        }
    }

    /// Submits instanced draws for the streamed ground cover. Water planes
    /// and discrete objects live in the scene through the placer.
    pub fn render(&self, renderer: &mut dyn InstancedRenderer) -> FrameStats {
        self.streamer.render(renderer)
    }

    /// Rebuilds the world from a new seed. Streamed chunks regenerate
    /// lazily; water planes and discrete placements are destroyed and
    /// respawned.
    pub fn regenerate(&mut self, seed: u64, placer: &mut dyn Placer) {
        info!(seed, "regenerating world");
        self.config.terrain.seed = seed;
        self.field = Arc::new(Heightfield::generate(&heightfield_params(&self.config, seed)));
        self.terrain = Arc::new(HeightfieldTerrain::new(Arc::clone(&self.field)));

        let detector = WaterBodyDetector::new(water_config(&self.config));
        self.clusters = detector.process(&self.field);
        self.water_planes = detector.water_plane_positions(&self.field, &self.clusters);
        for handle in self.water_handles.drain(..) {
            placer.destroy(handle);
        }
        self.water_handles =
            place_water_planes(&self.config, &self.assets, &self.water_planes, placer);

        self.streamer = build_streamer(
            &self.config,
            &self.assets,
            seed,
            &self.terrain,
            self.noise_mask.as_ref(),
        );
        self.discrete.abort(placer);
        self.discrete = build_discrete(&self.config, &self.assets, seed);
        if let Some(blanket) = &mut self.blanket {
            blanket.clear(placer);
        }
    }
}

fn heightfield_params(config: &Config, seed: u64) -> HeightfieldParams {
    let t = &config.terrain;
    HeightfieldParams {
        seed,
        x_range: t.x_range,
        z_range: t.z_range,
        y_range: t.y_range,
        noise_scale: t.noise_scale,
        octaves: t.octaves,
        redistribution: t.redistribution,
        island_mask: match t.island_mask {
            IslandMaskMode::None => IslandMask::None,
            IslandMaskMode::RealCenter { inner_edge } => IslandMask::RealCenter { inner_edge },
            IslandMaskMode::MultiCenter { centers, inner_edge } => IslandMask::MultiCenter {
                centers,
                inner_edge,
            },
        },
    }
}

fn water_config(config: &Config) -> WaterDetectConfig {
    let w = &config.water;
    WaterDetectConfig {
        grid_x: w.grid_x,
        grid_z: w.grid_z,
        skip_low: w.skip_low,
        skip_high: w.skip_high,
        water_low: w.water_low,
        water_high: w.water_high,
        water_height: w.water_height,
    }
}

fn water_plane_scale(config: &Config) -> f32 {
    let cell_x = config.terrain.x_range as f32 / config.water.grid_x as f32;
    let cell_z = config.terrain.z_range as f32 / config.water.grid_z as f32;
    cell_x.max(cell_z)
}

fn place_water_planes(
    config: &Config,
    assets: &WorldAssets,
    positions: &[Vec3],
    placer: &mut dyn Placer,
) -> Vec<PlacementHandle> {
    let scale = water_plane_scale(config);
    positions
        .iter()
        .map(|p| {
            placer.place(
                assets.water_asset,
                InstanceTransform::new(*p, Quat::IDENTITY, scale),
            )
        })
        .collect()
}

fn build_streamer(
    config: &Config,
    assets: &WorldAssets,
    seed: u64,
    terrain: &Arc<HeightfieldTerrain>,
    noise_mask: Option<&Arc<ScalarField>>,
) -> ChunkStreamingSpawner {
    let s = &config.streaming;
    let streaming = StreamingConfig {
        world_seed: seed,
        chunk_size: s.chunk_size,
        candidates_per_chunk: s.candidates_per_chunk,
        max_per_chunk: s.max_per_chunk,
        culling_distance: s.culling_distance,
        fov_degrees: s.fov_degrees,
        fov_enabled: s.fov_enabled,
        noise_threshold: s.noise_threshold,
        noise_scale: s.noise_scale,
        min_height: s.min_height,
        max_height: s.max_height,
        max_slope_degrees: s.max_slope_degrees,
        y_offset: s.y_offset,
        scale_min: s.scale_min,
        scale_max: s.scale_max,
        tilt_degrees: s.tilt_degrees,
        mesh: assets.cover_mesh,
        material: assets.cover_material,
    };
    let mut streamer = ChunkStreamingSpawner::new(
        streaming,
        Arc::clone(terrain) as Arc<dyn farshore_terrain::TerrainQuery + Send + Sync>,
    )
    .with_tint_field(TintField::new(seed as u32));
    if let Some(mask) = noise_mask {
        streamer = streamer.with_noise_mask(Arc::clone(mask));
    }
    streamer
}

fn build_discrete(config: &Config, assets: &WorldAssets, seed: u64) -> DiscreteSpawner {
    let types = config
        .discrete
        .types
        .iter()
        .map(|t| {
            let asset = assets.objects.get(&t.name).copied();
            if asset.is_none() && t.enabled {
                warn!(name = %t.name, "no asset bound for spawn type, disabling");
            }
            SpawnObjectType {
                name: t.name.clone(),
                asset: asset.unwrap_or(AssetRef(0)),
                target_count: t.target_count,
                min_spacing: t.min_spacing,
                min_height: t.min_height,
                max_height: t.max_height,
                enabled: t.enabled && asset.is_some(),
            }
        })
        .collect();
    DiscreteSpawner::new(
        DiscreteConfig {
            seed,
            attempt_multiplier: config.discrete.attempt_multiplier,
            attempts_per_tick: config.discrete.attempts_per_tick,
            ..DiscreteConfig::default()
        },
        types,
    )
}
