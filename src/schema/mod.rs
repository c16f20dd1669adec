//! Plain data: storylets, world state, and the seed format.

pub mod seed;
pub mod storylet;
pub mod world;
