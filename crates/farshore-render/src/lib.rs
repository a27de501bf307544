//! Batched instanced draw submission and camera-relative culling.

mod fov;
mod instancing;

pub use fov::{CameraPose, FovCuller};
pub use instancing::{
    submit_batched, DrawCall, FrameStats, InstanceTransform, InstancedRenderer, MaterialRef,
    MeshRef, RecordingRenderer, MAX_INSTANCES_PER_DRAW,
};
