//! Core engine configuration
//!
//! Exposes the unified configuration types consumed at startup.

pub mod config;

pub use config::{
    ApplicationConfig, AssetConfig, CameraConfig, EngineConfig, ParaboloidConfig, WindowConfig,
};
