pub mod bounds;
pub mod broad_phase;
pub mod detection;
pub mod manifold;
pub mod tile_projection;

// Re-export key types
pub use bounds::Bounds;
pub use broad_phase::{naive_pairs, sort_and_sweep_pairs};
pub use detection::collide;
pub use manifold::{Contact, Manifold};
pub use tile_projection::{collide_vs_tile, Probe, TileCollision};
