//! Asset management system
//!
//! [`ContentManager`] resolves asset paths such as `Models/SphereHighPoly` or
//! `Textures/wood`. Files under the content root win:
//!
//! | Kind         | File                                   |
//! |--------------|----------------------------------------|
//! | Mesh         | `<root>/<path>.obj`                    |
//! | Texture      | `<root>/<path>.png`                    |
//! | Cube texture | `<root>/<path>/{px,nx,py,ny,pz,nz}.png` |
//!
//! Anything not on disk falls back to the built-in catalogue in [`procedural`].
//! Effects always come from [`crate::render::effect::library`]. Meshes and
//! textures are cached per path for the session; every effect load returns a
//! fresh instance so drawables keep independent parameter state.

pub mod image_loader;
pub mod obj_loader;
pub mod procedural;

pub use image_loader::ImageData;
pub use obj_loader::{ObjError, ObjLoader};

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::core::AssetConfig;
use crate::render::effect::{library, Effect};
use crate::render::primitives::Model;
use crate::render::texture::{CubeFace, CubeTexture, Texture2D};

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// Asset not found on disk or in the built-in catalogue
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// A file exists but could not be decoded
    #[error("Failed to load asset: {0}")]
    LoadFailed(String),

    /// Decoded data is unusable
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Mesh file parse failure
    #[error("Mesh error: {0}")]
    Obj(#[from] ObjError),

    /// IO error during asset loading
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Loads and caches meshes, textures and effects by asset path
#[derive(Debug, Default)]
pub struct ContentManager {
    root: PathBuf,
    models: HashMap<String, Arc<Model>>,
    textures: HashMap<String, Arc<Texture2D>>,
    cubes: HashMap<String, Arc<CubeTexture>>,
}

impl ContentManager {
    /// Create a content manager rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Create from configuration
    pub fn from_config(config: &AssetConfig) -> Self {
        Self::new(&config.content_root)
    }

    /// Content root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file(&self, path: &str, extension: &str) -> Option<PathBuf> {
        let candidate = self.root.join(path).with_extension(extension);
        candidate.is_file().then_some(candidate)
    }

    /// Load a mesh
    pub fn load_model(&mut self, path: &str) -> Result<Arc<Model>, AssetError> {
        if let Some(model) = self.models.get(path) {
            return Ok(Arc::clone(model));
        }

        let mesh = if let Some(file) = self.file(path, "obj") {
            log::debug!("Loading mesh '{}' from {:?}", path, file);
            ObjLoader::load_obj(&file)?
        } else {
            procedural::mesh(path).ok_or_else(|| AssetError::NotFound(path.to_string()))?
        };

        let model = Arc::new(Model::from_mesh(path, mesh));
        log::info!("Loaded mesh '{}' ({} triangles)", path, model.primitive_count());
        self.models.insert(path.to_string(), Arc::clone(&model));
        Ok(model)
    }

    /// Load a 2D texture
    pub fn load_texture(&mut self, path: &str) -> Result<Arc<Texture2D>, AssetError> {
        if let Some(texture) = self.textures.get(path) {
            return Ok(Arc::clone(texture));
        }

        let texture = if let Some(file) = self.file(path, "png") {
            ImageData::from_file(&file)?.into_texture()?
        } else {
            procedural::texture(path).ok_or_else(|| AssetError::NotFound(path.to_string()))?
        };

        let texture = Arc::new(texture);
        log::debug!("Loaded texture '{}' ({}x{})", path, texture.width(), texture.height());
        self.textures.insert(path.to_string(), Arc::clone(&texture));
        Ok(texture)
    }

    /// Load a cube texture
    pub fn load_cube_texture(&mut self, path: &str) -> Result<Arc<CubeTexture>, AssetError> {
        if let Some(cube) = self.cubes.get(path) {
            return Ok(Arc::clone(cube));
        }

        let dir = self.root.join(path);
        let cube = if dir.is_dir() {
            let mut faces = Vec::with_capacity(6);
            for face in CubeFace::ALL {
                let file = dir.join(face.suffix()).with_extension("png");
                if !file.is_file() {
                    return Err(AssetError::NotFound(format!("{path}/{}", face.suffix())));
                }
                faces.push(ImageData::from_file(&file)?.into_texture()?);
            }
            let faces: [Texture2D; 6] = faces
                .try_into()
                .map_err(|_| AssetError::InvalidData(format!("{path}: expected six faces")))?;
            CubeTexture::new(faces)
        } else {
            procedural::cube_texture(path).ok_or_else(|| AssetError::NotFound(path.to_string()))?
        };

        let cube = Arc::new(cube);
        log::debug!("Loaded cube texture '{}'", path);
        self.cubes.insert(path.to_string(), Arc::clone(&cube));
        Ok(cube)
    }

    /// Instantiate an effect
    pub fn load_effect(&mut self, path: &str) -> Result<Effect, AssetError> {
        if !library::is_builtin(path) {
            return Err(AssetError::NotFound(path.to_string()));
        }
        library::create(path).map_err(|e| AssetError::InvalidData(e.to_string()))
    }

    /// Number of cached meshes, textures and cube textures
    pub fn cached_count(&self) -> usize {
        self.models.len() + self.textures.len() + self.cubes.len()
    }
}
