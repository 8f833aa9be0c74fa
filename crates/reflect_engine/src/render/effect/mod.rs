//! # Effects (shader programs)
//!
//! An [`Effect`] is a shader program with named parameter slots and named
//! techniques, each technique an ordered list of passes. Drawables push values
//! into the slots before drawing; the device reads them when a pass is applied.
//!
//! ## Parameter lookup
//! Looking a parameter up is fallible and returns `Option<ParameterHandle>`.
//! Setting through `None` does nothing, so drawables can push every value they
//! know about and programs simply ignore the ones they do not declare.
//!
//! ## Sharing
//! Techniques and parameter declarations are shared behind `Arc`s; each clone
//! of an effect carries its own parameter values and current technique. The
//! content manager hands every drawable its own clone.

pub mod kernel;
pub mod library;
pub mod paraboloid;

mod basic;
mod environment;
mod phong;
mod reflect;
mod textured;

use std::fmt;
use std::sync::Arc;

pub use kernel::{PreparedShader, ShaderKernel, TextureSampler, Varyings, VertexOutput};

use crate::foundation::math::{Mat4, Vec3, Vec4};
use crate::render::device::{CullMode, DepthStencilState};
use crate::render::texture::{CubeTexture, TextureRef};
use crate::render::{RenderError, RenderResult};

/// Type of a parameter slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// Scalar
    Float,
    /// Three-component vector
    Vector3,
    /// Four-component vector or RGBA color
    Vector4,
    /// 4x4 matrix
    Matrix,
    /// 2D texture or render target
    Texture,
    /// Cube texture
    TextureCube,
}

/// Value stored in a parameter slot
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    /// Scalar
    Float(f32),
    /// Three-component vector
    Vector3(Vec3),
    /// Four-component vector
    Vector4(Vec4),
    /// 4x4 matrix
    Matrix(Mat4),
    /// 2D texture or render target
    Texture(TextureRef),
    /// Cube texture
    TextureCube(Arc<CubeTexture>),
}

impl ParameterValue {
    /// Slot type this value fits
    pub fn kind(&self) -> ParameterKind {
        match self {
            Self::Float(_) => ParameterKind::Float,
            Self::Vector3(_) => ParameterKind::Vector3,
            Self::Vector4(_) => ParameterKind::Vector4,
            Self::Matrix(_) => ParameterKind::Matrix,
            Self::Texture(_) => ParameterKind::Texture,
            Self::TextureCube(_) => ParameterKind::TextureCube,
        }
    }
}

impl From<f32> for ParameterValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<Vec3> for ParameterValue {
    fn from(value: Vec3) -> Self {
        Self::Vector3(value)
    }
}

impl From<Vec4> for ParameterValue {
    fn from(value: Vec4) -> Self {
        Self::Vector4(value)
    }
}

impl From<Mat4> for ParameterValue {
    fn from(value: Mat4) -> Self {
        Self::Matrix(value)
    }
}

impl From<TextureRef> for ParameterValue {
    fn from(value: TextureRef) -> Self {
        Self::Texture(value)
    }
}

impl From<Arc<CubeTexture>> for ParameterValue {
    fn from(value: Arc<CubeTexture>) -> Self {
        Self::TextureCube(value)
    }
}

/// Declaration of a parameter slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDecl {
    /// Slot name
    pub name: String,
    /// Slot type
    pub kind: ParameterKind,
}

/// Handle to a declared parameter of a particular effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParameterHandle(usize);

/// Parameter declarations plus their current values
#[derive(Debug, Clone)]
pub struct ParameterBlock {
    decls: Arc<[ParameterDecl]>,
    values: Vec<Option<ParameterValue>>,
}

impl ParameterBlock {
    fn new(decls: Arc<[ParameterDecl]>) -> Self {
        let values = vec![None; decls.len()];
        Self { decls, values }
    }

    /// Look a parameter up by name
    pub fn handle(&self, name: &str) -> Option<ParameterHandle> {
        self.decls.iter().position(|decl| decl.name == name).map(ParameterHandle)
    }

    /// Declared slots
    pub fn decls(&self) -> &[ParameterDecl] {
        &self.decls
    }

    /// Value behind a handle, if one was set
    pub fn get(&self, handle: ParameterHandle) -> Option<&ParameterValue> {
        self.values.get(handle.0).and_then(Option::as_ref)
    }

    /// Value of a named parameter, if declared and set
    pub fn value(&self, name: &str) -> Option<&ParameterValue> {
        self.handle(name).and_then(|handle| self.get(handle))
    }

    /// Scalar parameter
    pub fn float(&self, name: &str) -> Option<f32> {
        match self.value(name)? {
            ParameterValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Vector3 parameter
    pub fn vector3(&self, name: &str) -> Option<Vec3> {
        match self.value(name)? {
            ParameterValue::Vector3(v) => Some(*v),
            _ => None,
        }
    }

    /// Vector4 parameter
    pub fn vector4(&self, name: &str) -> Option<Vec4> {
        match self.value(name)? {
            ParameterValue::Vector4(v) => Some(*v),
            _ => None,
        }
    }

    /// Matrix parameter
    pub fn matrix(&self, name: &str) -> Option<Mat4> {
        match self.value(name)? {
            ParameterValue::Matrix(m) => Some(*m),
            _ => None,
        }
    }

    /// 2D texture parameter
    pub fn texture(&self, name: &str) -> Option<TextureRef> {
        match self.value(name)? {
            ParameterValue::Texture(t) => Some(t.clone()),
            _ => None,
        }
    }

    /// Cube texture parameter
    pub fn texture_cube(&self, name: &str) -> Option<Arc<CubeTexture>> {
        match self.value(name)? {
            ParameterValue::TextureCube(t) => Some(Arc::clone(t)),
            _ => None,
        }
    }

    fn set(&mut self, handle: ParameterHandle, value: ParameterValue) -> bool {
        let Some(decl) = self.decls.get(handle.0) else {
            return false;
        };
        if decl.kind != value.kind() {
            log::warn!(
                "Parameter '{}' expects {:?}, ignoring {:?} value",
                decl.name,
                decl.kind,
                value.kind()
            );
            return false;
        }
        self.values[handle.0] = Some(value);
        true
    }
}

/// Pipeline state a pass imposes on its draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassState {
    /// Cull mode override
    pub cull: Option<CullMode>,
    /// Depth state override
    pub depth: Option<DepthStencilState>,
}

/// One pass of a technique
#[derive(Clone)]
pub struct EffectPass {
    name: String,
    state: PassState,
    kernel: Arc<dyn ShaderKernel>,
}

impl EffectPass {
    /// Create a pass without state overrides
    pub fn new(name: impl Into<String>, kernel: Arc<dyn ShaderKernel>) -> Self {
        Self {
            name: name.into(),
            state: PassState::default(),
            kernel,
        }
    }

    /// Set the state overrides
    pub fn with_state(mut self, state: PassState) -> Self {
        self.state = state;
        self
    }

    /// Pass name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// State overrides
    pub fn state(&self) -> PassState {
        self.state
    }

    /// Compiled program
    pub fn kernel(&self) -> &Arc<dyn ShaderKernel> {
        &self.kernel
    }
}

impl fmt::Debug for EffectPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectPass")
            .field("name", &self.name)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// A named, ordered list of passes
#[derive(Debug, Clone)]
pub struct Technique {
    name: String,
    passes: Vec<EffectPass>,
}

impl Technique {
    /// Create a technique
    pub fn new(name: impl Into<String>, passes: Vec<EffectPass>) -> Self {
        Self { name: name.into(), passes }
    }

    /// Technique name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Passes in application order
    pub fn passes(&self) -> &[EffectPass] {
        &self.passes
    }
}

/// Index of a technique within an effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TechniqueId(usize);

/// A shader program instance
#[derive(Debug, Clone)]
pub struct Effect {
    name: String,
    parameters: ParameterBlock,
    techniques: Arc<[Technique]>,
    current: TechniqueId,
}

impl Effect {
    /// Start building an effect
    pub fn builder(name: impl Into<String>) -> EffectBuilder {
        EffectBuilder {
            name: name.into(),
            decls: Vec::new(),
            techniques: Vec::new(),
        }
    }

    /// Effect (asset) name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look a parameter up by name
    pub fn parameter(&self, name: &str) -> Option<ParameterHandle> {
        self.parameters.handle(name)
    }

    /// Store a value through an optional handle
    ///
    /// `None` is a no-op; a value of the wrong type is logged and dropped.
    /// Returns whether the value was stored.
    pub fn set_parameter(&mut self, handle: Option<ParameterHandle>, value: impl Into<ParameterValue>) -> bool {
        handle.is_some_and(|handle| self.parameters.set(handle, value.into()))
    }

    /// Look up and store in one step; undeclared names are ignored
    pub fn set(&mut self, name: &str, value: impl Into<ParameterValue>) -> bool {
        let handle = self.parameter(name);
        self.set_parameter(handle, value)
    }

    /// Current parameter values
    pub fn parameters(&self) -> &ParameterBlock {
        &self.parameters
    }

    /// All techniques
    pub fn techniques(&self) -> &[Technique] {
        &self.techniques
    }

    /// Find a technique by name
    pub fn technique(&self, name: &str) -> Option<TechniqueId> {
        self.techniques.iter().position(|t| t.name == name).map(TechniqueId)
    }

    /// Whether a technique with this name exists
    pub fn has_technique(&self, name: &str) -> bool {
        self.technique(name).is_some()
    }

    /// Active technique
    pub fn current_technique(&self) -> TechniqueId {
        self.current
    }

    /// Name of the active technique
    pub fn current_technique_name(&self) -> &str {
        &self.techniques[self.current.0].name
    }

    /// Passes of the active technique
    pub fn passes(&self) -> &[EffectPass] {
        &self.techniques[self.current.0].passes
    }

    /// Activate a technique
    pub fn set_current_technique(&mut self, technique: TechniqueId) -> RenderResult<()> {
        if technique.0 >= self.techniques.len() {
            return Err(RenderError::UnknownTechnique {
                effect: self.name.clone(),
                technique: format!("#{}", technique.0),
            });
        }
        self.current = technique;
        Ok(())
    }

    /// Activate a technique by name
    pub fn set_current_technique_by_name(&mut self, name: &str) -> RenderResult<TechniqueId> {
        let technique = self.technique(name).ok_or_else(|| RenderError::UnknownTechnique {
            effect: self.name.clone(),
            technique: name.to_string(),
        })?;
        self.current = technique;
        Ok(technique)
    }
}

/// Builder for [`Effect`]
#[derive(Debug)]
pub struct EffectBuilder {
    name: String,
    decls: Vec<ParameterDecl>,
    techniques: Vec<Technique>,
}

impl EffectBuilder {
    /// Declare a parameter slot
    pub fn parameter(mut self, name: impl Into<String>, kind: ParameterKind) -> Self {
        self.decls.push(ParameterDecl { name: name.into(), kind });
        self
    }

    /// Add a technique; the first one added is active initially
    pub fn technique(mut self, technique: Technique) -> Self {
        self.techniques.push(technique);
        self
    }

    /// Finish the effect
    pub fn build(self) -> RenderResult<Effect> {
        if self.techniques.is_empty() {
            return Err(RenderError::InvalidEffect(format!("effect '{}' has no techniques", self.name)));
        }
        if let Some(empty) = self.techniques.iter().find(|t| t.passes.is_empty()) {
            return Err(RenderError::InvalidEffect(format!(
                "technique '{}' of effect '{}' has no passes",
                empty.name, self.name
            )));
        }

        Ok(Effect {
            parameters: ParameterBlock::new(self.decls.into()),
            techniques: self.techniques.into(),
            current: TechniqueId(0),
            name: self.name,
        })
    }
}
