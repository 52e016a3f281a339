// Modules under core, split into files for convenience
mod cell;
mod data;
mod material;
mod particle;
mod surface;
mod tally;
mod transform;

// Re-exports of the key public data structures
pub use cell::{
    Cell, CellParams, Density, Fill, FillArray, FillEntry, Region, Sense, SurfaceRef,
};
pub use data::{DataCard, KeywordGroups, Payload};
pub use material::{Component, FractionKind, Material, Thermal, Zaid};
pub use particle::Particle;
pub use surface::{Boundary, Surface, SurfaceKind};
pub use tally::{Entity, Modifier, Tally, TallyKind, TallyRef};
pub use transform::{Transform, TransformSpec};
