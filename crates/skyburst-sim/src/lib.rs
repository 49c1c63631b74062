//! Firework simulation for one viewer.
//!
//! [`engine::Engine`] owns every projectile and burst and advances them once
//! per display frame. [`viewer::Viewer`] sits between the engine and the
//! shared channel: it launches local fireworks, drops self-echoes and scales
//! remote ones by how far away they were launched.

pub mod audio;
pub mod config;
pub mod engine;
pub mod entity;
pub mod trail;
pub mod viewer;

pub use audio::AudioSettings;
pub use config::EngineConfig;
pub use engine::{Engine, SimEvent, SpawnOptions};
pub use viewer::{Applied, Viewer};
