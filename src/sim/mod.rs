//! Balloon field simulation
//!
//! All physics lives here and stays free of rendering/platform code:
//! - Seeded RNG only
//! - Stable iteration order (balloon id == index)
//! - One explicit `tick` per governed frame

pub mod collision;
pub mod fragments;
pub mod grid;
pub mod integrate;
pub mod state;
pub mod tick;

pub use collision::{resolve_collisions, separate_pair};
pub use fragments::{spawn_fragments, trim_to_cap, update_fragments};
pub use grid::{CellKey, SpatialGrid};
pub use integrate::{advance_animations, integrate_balloon, integrate_batch};
pub use state::{
    Balloon, BalloonAnimation, BalloonId, Field, FieldConfig, Fragment, Oscillator,
};
pub use tick::{TickReport, tick};
