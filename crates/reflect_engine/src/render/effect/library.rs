//! Built-in effect catalogue
//!
//! | Asset name              | Techniques                  |
//! |-------------------------|-----------------------------|
//! | `Shaders/Phong`         | `Phong`, `BuildDP`          |
//! | `Shaders/Texture`       | `Texture`, `BuildDP`        |
//! | `Shaders/EnvironmentMap`| `EnvironmentMap`, `BuildDP` |
//! | `Shaders/DPMReflect`    | `Reflect`                   |
//!
//! The fixed-function fallback is not an asset; see [`basic_effect`].

use crate::render::effect::{basic, environment, phong, reflect, textured, Effect};
use crate::render::{RenderError, RenderResult};

/// Per-pixel lit, textured
pub const PHONG: &str = "Shaders/Phong";
/// Unlit, textured
pub const TEXTURE: &str = "Shaders/Texture";
/// Cube-mapped sky
pub const ENVIRONMENT_MAP: &str = "Shaders/EnvironmentMap";
/// Dual-paraboloid reflection
pub const DPM_REFLECT: &str = "Shaders/DPMReflect";

/// Every built-in effect asset name
pub const NAMES: [&str; 4] = [PHONG, TEXTURE, ENVIRONMENT_MAP, DPM_REFLECT];

/// Whether `name` is a built-in effect
pub fn is_builtin(name: &str) -> bool {
    NAMES.contains(&name)
}

/// Instantiate a built-in effect by asset name
pub fn create(name: &str) -> RenderResult<Effect> {
    match name {
        PHONG => phong::effect(name),
        TEXTURE => textured::effect(name),
        ENVIRONMENT_MAP => environment::effect(name),
        DPM_REFLECT => reflect::effect(name),
        _ => Err(RenderError::UnknownEffect(name.to_string())),
    }
}

/// The fixed-function fallback used by drawables without a program
pub fn basic_effect() -> RenderResult<Effect> {
    basic::effect()
}
