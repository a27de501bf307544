//! Exact-count placement of discrete objects with minimum spacing.
//!
//! Runs as a resumable job: each tick consumes a bounded number of
//! attempts, so a large population spreads over many frames. A type that
//! exhausts its attempt budget before reaching its target count is logged
//! and skipped rather than stalling the run.

use std::sync::Arc;

use farshore_field::ScalarField;
use farshore_place::{AssetRef, PlacementHandle, Placer};
use farshore_render::InstanceTransform;
use farshore_terrain::TerrainQuery;
use glam::{Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

#[derive(Clone, Debug)]
pub struct SpawnObjectType {
    pub name: String,
    pub asset: AssetRef,
    pub target_count: usize,
    /// Minimum distance to every other placement of the same type.
    pub min_spacing: f32,
    /// Accepted surface height band, as fractions of the vertical scale.
    pub min_height: f32,
    pub max_height: f32,
    pub enabled: bool,
}

#[derive(Clone, Debug)]
pub struct DiscreteConfig {
    pub seed: u64,
    /// Attempt budget per type is `target_count * attempt_multiplier`.
    pub attempt_multiplier: usize,
    /// Attempts consumed per tick, across all types.
    pub attempts_per_tick: usize,
    /// World-to-UV scale for the optional blue-noise mask.
    pub noise_scale: f32,
    /// Acceptance threshold when a mask is installed.
    pub noise_threshold: f32,
}

impl Default for DiscreteConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            attempt_multiplier: 10,
            attempts_per_tick: 50,
            noise_scale: 0.01,
            noise_threshold: 0.3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpawnStatus {
    InProgress,
    Complete,
}

/// Cumulative run state reported after each tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnProgress {
    pub status: SpawnStatus,
    pub attempts: usize,
    pub placed: usize,
    /// Types that hit their attempt cap short of their target.
    pub failed_types: usize,
}

struct TypeState {
    positions: Vec<Vec3>,
    handles: Vec<PlacementHandle>,
    attempts: usize,
    done: bool,
}

pub struct DiscreteSpawner {
    config: DiscreteConfig,
    types: Vec<SpawnObjectType>,
    states: Vec<TypeState>,
    rng: ChaCha8Rng,
    noise_mask: Option<Arc<ScalarField>>,
    current: usize,
    failed_types: usize,
}

impl DiscreteSpawner {
    pub fn new(config: DiscreteConfig, types: Vec<SpawnObjectType>) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        let states = types
            .iter()
            .map(|t| TypeState {
                positions: Vec::new(),
                handles: Vec::new(),
                attempts: 0,
                done: !t.enabled || t.target_count == 0,
            })
            .collect();
        Self {
            config,
            types,
            states,
            rng,
            noise_mask: None,
            current: 0,
            failed_types: 0,
        }
    }

    /// Installs a blue-noise acceptance mask applied to every attempt.
    pub fn with_noise_mask(mut self, mask: Arc<ScalarField>) -> Self {
        self.noise_mask = Some(mask);
        self
    }

    pub fn placed_count(&self, type_index: usize) -> usize {
        self.states[type_index].positions.len()
    }

    pub fn positions(&self, type_index: usize) -> &[Vec3] {
        &self.states[type_index].positions
    }

    pub fn is_complete(&self) -> bool {
        self.states.iter().all(|s| s.done)
    }

    /// Consumes up to `attempts_per_tick` placement attempts.
    pub fn tick(
        &mut self,
        terrain: &dyn TerrainQuery,
        placer: &mut dyn Placer,
    ) -> SpawnProgress {
        let mut budget = self.config.attempts_per_tick;
        while budget > 0 {
            let Some(index) = self.advance_to_pending() else {
                break;
            };
            budget -= 1;
            self.attempt_one(index, terrain, placer);
        }
        self.progress()
    }

    /// Performs a single placement attempt and reports the run state after
    /// it, for callers stepping the job finer than a tick.
    pub fn step(&mut self, terrain: &dyn TerrainQuery, placer: &mut dyn Placer) -> SpawnProgress {
        if let Some(index) = self.advance_to_pending() {
            self.attempt_one(index, terrain, placer);
        }
        self.progress()
    }

    /// Destroys every placement made so far and marks the run complete.
    pub fn abort(&mut self, placer: &mut dyn Placer) {
        for state in &mut self.states {
            for handle in state.handles.drain(..) {
                placer.destroy(handle);
            }
            state.positions.clear();
            state.done = true;
        }
        debug!("discrete spawn run aborted");
    }

    fn progress(&self) -> SpawnProgress {
        SpawnProgress {
            status: if self.is_complete() {
                SpawnStatus::Complete
            } else {
                SpawnStatus::InProgress
            },
            attempts: self.states.iter().map(|s| s.attempts).sum(),
            placed: self.states.iter().map(|s| s.positions.len()).sum(),
            failed_types: self.failed_types,
        }
    }

    /// Index of the first type that still needs placements, advancing past
    /// finished ones.
    fn advance_to_pending(&mut self) -> Option<usize> {
        while self.current < self.types.len() {
            if !self.states[self.current].done {
                return Some(self.current);
            }
            self.current += 1;
        }
        None
    }

    fn attempt_one(&mut self, index: usize, terrain: &dyn TerrainQuery, placer: &mut dyn Placer) {
        let ty = &self.types[index];
        let state = &mut self.states[index];
        let cap = ty.target_count * self.config.attempt_multiplier;
        state.attempts += 1;

        // Uniform-random raster cell: one cell spans one world unit.
        let extent = terrain.extent();
        let x = self.rng.random_range(0..extent.x_range as u32) as f32;
        let z = self.rng.random_range(0..extent.z_range as u32) as f32;
        let h = terrain.height_at(x, z);
        let h_fraction = h / extent.y_range;

        let noise_ok = match &self.noise_mask {
            Some(mask) => {
                let u = (x * self.config.noise_scale).rem_euclid(1.0);
                let v = (z * self.config.noise_scale).rem_euclid(1.0);
                mask.sample_bilinear(u, v) > self.config.noise_threshold
            }
            None => true,
        };
        let accepted = noise_ok && h_fraction >= ty.min_height && h_fraction <= ty.max_height && {
            let candidate = Vec3::new(x, h, z);
            state
                .positions
                .iter()
                .all(|p| p.distance(candidate) >= ty.min_spacing)
        };

        if accepted {
            let position = Vec3::new(x, h, z);
            let yaw = self.rng.random_range(0.0..360.0f32).to_radians();
            let handle = placer.place(
                ty.asset,
                InstanceTransform::new(position, Quat::from_rotation_y(yaw), 1.0),
            );
            state.positions.push(position);
            state.handles.push(handle);
            if state.positions.len() >= ty.target_count {
                state.done = true;
                debug!(
                    name = %ty.name,
                    placed = state.positions.len(),
                    attempts = state.attempts,
                    "spawn type complete"
                );
            }
        }
        if !state.done && state.attempts >= cap {
            // Soft failure: keep what was placed and move on.
            state.done = true;
            self.failed_types += 1;
            warn!(
                name = %ty.name,
                placed = state.positions.len(),
                target = ty.target_count,
                attempts = state.attempts,
                "spawn type hit attempt cap short of target"
            );
        }
    }
}
