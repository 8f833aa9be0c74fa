//! Rendering primitives: the camera and mesh geometry

pub mod camera;
pub mod mesh;

pub use camera::Camera;
pub use mesh::{IndexBuffer, Mesh, MeshPart, Model, ModelMesh, Vertex, VertexBuffer};
