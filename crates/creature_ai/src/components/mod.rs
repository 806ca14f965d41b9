//! ECS Components для сущностей мира
//!
//! Организация по доменам:
//! - actor: идентичность и здоровье (EntityId, AiTarget, Health)
//! - limb: конечности и attack descriptors (Limbs, LimbAttack, AttackType)
//! - movement: steering intents и скорость (SteeringIntents, MovementSpeed)
//! - world: конструкции и их секции (Structure, WallSection)

pub mod actor;
pub mod limb;
pub mod movement;
pub mod world;

// Re-exports для удобного импорта
pub use actor::*;
pub use limb::*;
pub use movement::*;
pub use world::*;
