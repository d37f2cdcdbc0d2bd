pub mod collision;
pub mod common;
pub mod error;
pub mod integration;
pub mod math;
pub mod objects;
pub mod shapes;
pub mod world;

// Re-export key types for easier use
pub use collision::{Bounds, Contact, Manifold, TileCollision};
pub use common::Material;
pub use error::{PhysicsError, Result};
pub use math::{Transform, Vec2};
pub use objects::{BodyHandle, BodyType, RigidBody};
pub use shapes::{Circle, Collider, Polygon, Segment, Shape, ShapeType, TileCell, TileKind};
pub use world::{CollisionEvent, DeferredRemovals, PhysicsWorld, SceneDesc, StepPhase, StepStats, WorldConfig};
