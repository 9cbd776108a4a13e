pub mod agent;
pub mod boundary;
pub mod errors;
pub mod export;
pub mod field;
pub mod settings;
pub mod swapper;
pub mod vector2;
pub mod world;

pub use agent::Agent;
pub use swapper::Swapper;
pub use vector2::Vector2;
