pub mod config;
pub mod contact_solver;
pub mod physics_world;
pub mod scene;

pub use config::WorldConfig;
pub use contact_solver::ContactSolver;
pub use physics_world::{CollisionEvent, DeferredRemovals, PhysicsWorld, StepPhase, StepStats};
pub use scene::{BodyDesc, SceneDesc, ShapeDesc};
