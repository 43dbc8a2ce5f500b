pub mod attempts;
pub mod engine;
pub mod error;
pub mod normalize;
pub mod sighting;

pub use attempts::AttemptSet;
pub use engine::{EngineConfig, Resolution, ResolutionEngine};
pub use error::ResolveError;
pub use sighting::{GeoMatch, Sighting, SightingFields, SourceRow};
