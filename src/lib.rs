//! Storylet Engine: seed-driven storylet selection for narrative generation.
//!
//! A session holds a catalog of storylets, a world state, and a narrative
//! context. Each round the catalog filters storylets by cooldown, recency,
//! trigger and world flags, weights the survivors by pacing, tension, goals
//! and recent use, and draws one at random.

pub mod core;
pub mod schema;

pub use crate::core::catalog::{CatalogConfig, CatalogError, StoryletCatalog};
pub use crate::core::clock::{Clock, ManualClock, SystemClock};
pub use crate::core::context::{NarrativeContext, Pacing};
pub use crate::core::pipeline::{Beat, ContentDelta, ContentSource, EngineError, StoryletEngine};
pub use crate::schema::seed::SeedConfig;
pub use crate::schema::storylet::{Storylet, StoryletContent};
pub use crate::schema::world::WorldState;
