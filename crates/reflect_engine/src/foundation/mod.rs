//! Foundation module
//!
//! Shared building blocks with no rendering knowledge:
//! - `math`: nalgebra aliases, angle helpers and the [`math::Mat4Ext`] transforms
//! - `time`: frame stepping
//! - `logging`: `env_logger` setup

pub mod logging;
pub mod math;
pub mod time;
