//! Mesh representation for 3D models
//!
//! Geometry is organized the way draw calls consume it: a [`Model`] holds one or
//! more [`ModelMesh`]es, each with a bone transform and a list of [`MeshPart`]s.
//! A part names a range of a shared vertex/index buffer pair and is drawn with a
//! single indexed call per effect pass.
//!
//! ## Winding
//!
//! All generators emit counter-clockwise triangles when viewed from the outside
//! (right-handed, normals pointing away from the surface). Standard drawables
//! cull back faces; the environment sphere culls front faces to show its inside.

use std::sync::Arc;

use crate::foundation::math::{constants, Mat4, Vec2, Vec3};

/// 3D vertex data structure for rendering
///
/// Position, normal and texture coordinate; the layout every built-in shader
/// program consumes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    /// Position in object space
    pub position: [f32; 3],

    /// Normal vector
    pub normal: [f32; 3],

    /// Texture coordinates
    pub tex_coord: [f32; 2],
}

impl Vertex {
    /// Create a new vertex
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self { position, normal, tex_coord }
    }

    /// Position as a vector
    pub fn position(&self) -> Vec3 {
        Vec3::from(self.position)
    }

    /// Normal as a vector
    pub fn normal(&self) -> Vec3 {
        Vec3::from(self.normal)
    }

    /// Texture coordinate as a vector
    pub fn tex_coord(&self) -> Vec2 {
        Vec2::from(self.tex_coord)
    }
}

/// Vertex storage shared by the parts of a model
#[derive(Debug, Clone, Default)]
pub struct VertexBuffer {
    vertices: Vec<Vertex>,
}

impl VertexBuffer {
    /// Wrap vertex data
    pub fn new(vertices: Vec<Vertex>) -> Self {
        Self { vertices }
    }

    /// All vertices
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Vertex count
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the buffer holds no vertices
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Triangle-list index storage
#[derive(Debug, Clone, Default)]
pub struct IndexBuffer {
    indices: Vec<u32>,
}

impl IndexBuffer {
    /// Wrap index data
    pub fn new(indices: Vec<u32>) -> Self {
        Self { indices }
    }

    /// All indices
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Index count
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether the buffer holds no indices
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// A draw-primitive batch: one range of a vertex/index buffer pair
#[derive(Debug, Clone)]
pub struct MeshPart {
    /// Vertex buffer the part reads from
    pub vertex_buffer: Arc<VertexBuffer>,
    /// Index buffer the part reads from
    pub index_buffer: Arc<IndexBuffer>,
    /// Added to every index before the vertex fetch
    pub vertex_offset: usize,
    /// Number of vertices the part references
    pub num_vertices: usize,
    /// First index of the part
    pub start_index: usize,
    /// Number of triangles
    pub primitive_count: usize,
}

/// A named group of parts sharing one bone transform
#[derive(Debug, Clone)]
pub struct ModelMesh {
    /// Mesh name, for diagnostics
    pub name: String,
    /// Absolute transform of the mesh's parent bone
    pub bone_transform: Mat4,
    /// Draw batches
    pub parts: Vec<MeshPart>,
}

/// A renderable model made of one or more meshes
#[derive(Debug, Clone)]
pub struct Model {
    /// Meshes in draw order
    pub meshes: Vec<ModelMesh>,
}

impl Model {
    /// Wrap raw geometry as a single-mesh, single-part model
    pub fn from_mesh(name: impl Into<String>, mesh: Mesh) -> Self {
        let num_vertices = mesh.vertices.len();
        let primitive_count = mesh.indices.len() / 3;
        let part = MeshPart {
            vertex_buffer: Arc::new(VertexBuffer::new(mesh.vertices)),
            index_buffer: Arc::new(IndexBuffer::new(mesh.indices)),
            vertex_offset: 0,
            num_vertices,
            start_index: 0,
            primitive_count,
        };

        Self {
            meshes: vec![ModelMesh {
                name: name.into(),
                bone_transform: Mat4::identity(),
                parts: vec![part],
            }],
        }
    }

    /// Total triangles over every part
    pub fn primitive_count(&self) -> usize {
        self.meshes
            .iter()
            .flat_map(|mesh| mesh.parts.iter())
            .map(|part| part.primitive_count)
            .sum()
    }

    /// Total parts over every mesh; each is one draw call per pass
    pub fn part_count(&self) -> usize {
        self.meshes.iter().map(|mesh| mesh.parts.len()).sum()
    }
}

/// Raw geometry containing vertices and triangle-list indices
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Vertex data
    pub vertices: Vec<Vertex>,

    /// Index data for triangles
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a new mesh
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Unit-radius UV sphere centered at the origin
    ///
    /// `rings` runs from the north pole (`v = 0`) to the south pole (`v = 1`);
    /// `segments` wraps around +Y. Normals equal positions.
    pub fn uv_sphere(rings: u32, segments: u32) -> Self {
        let rings = rings.max(2);
        let segments = segments.max(3);

        let mut vertices = Vec::with_capacity(((rings + 1) * (segments + 1)) as usize);
        for r in 0..=rings {
            let v = r as f32 / rings as f32;
            let theta = v * constants::PI;
            for s in 0..=segments {
                let u = s as f32 / segments as f32;
                let phi = u * constants::TAU;
                let p = [theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin()];
                vertices.push(Vertex::new(p, p, [u, v]));
            }
        }

        let stride = segments + 1;
        let mut indices = Vec::with_capacity((rings * segments * 6) as usize);
        for r in 0..rings {
            for s in 0..segments {
                let a = r * stride + s;
                let b = (r + 1) * stride + s;
                let c = a + 1;
                let d = b + 1;
                indices.extend_from_slice(&[a, c, b, c, d, b]);
            }
        }

        Self::new(vertices, indices)
    }

    /// Flat triangle grid on the XZ plane, centered on `center`
    ///
    /// Rows advance toward −Z and columns toward +X. Texture coordinates count
    /// cells, so a texture repeats once per cell under wrap addressing.
    pub fn tri_grid(vert_rows: u32, vert_cols: u32, dx: f32, dz: f32, center: Vec3) -> Self {
        let vert_rows = vert_rows.max(2);
        let vert_cols = vert_cols.max(2);
        let cell_rows = vert_rows - 1;
        let cell_cols = vert_cols - 1;

        let x_offset = -(cell_cols as f32 * dx) * 0.5;
        let z_offset = (cell_rows as f32 * dz) * 0.5;

        let mut vertices = Vec::with_capacity((vert_rows * vert_cols) as usize);
        for i in 0..vert_rows {
            for j in 0..vert_cols {
                let position = [
                    j as f32 * dx + x_offset + center.x,
                    center.y,
                    -(i as f32) * dz + z_offset + center.z,
                ];
                vertices.push(Vertex::new(position, [0.0, 1.0, 0.0], [j as f32, i as f32]));
            }
        }

        let mut indices = Vec::with_capacity((cell_rows * cell_cols * 6) as usize);
        for i in 0..cell_rows {
            for j in 0..cell_cols {
                let a = i * vert_cols + j;
                let b = a + 1;
                let c = (i + 1) * vert_cols + j;
                let d = c + 1;
                indices.extend_from_slice(&[a, b, c, c, b, d]);
            }
        }

        Self::new(vertices, indices)
    }

    /// Geometric normal of each triangle, unnormalized
    pub fn face_normals(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            let a = self.vertices[tri[0] as usize].position();
            let b = self.vertices[tri[1] as usize].position();
            let c = self.vertices[tri[2] as usize].position();
            (b - a).cross(&(c - a))
        })
    }
}
