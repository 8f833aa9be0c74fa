//! OBJ file loader for 3D models

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

use crate::render::primitives::{Mesh, Vertex};

/// OBJ parsing failures
#[derive(Error, Debug)]
pub enum ObjError {
    /// Reading the file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A number or index did not parse
    #[error("Parse error on line {line}: {message}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// What was wrong
        message: String,
    },
    /// Structurally unusable data
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Wavefront OBJ reader producing triangle-list meshes
pub struct ObjLoader;

impl ObjLoader {
    /// Load an OBJ file and return a mesh
    pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<Mesh, ObjError> {
        let file = File::open(path)?;
        Self::parse(BufReader::new(file))
    }

    /// Parse OBJ text
    ///
    /// Polygons are fan-triangulated. Faces without normals get the face normal.
    pub fn parse<R: BufRead>(reader: R) -> Result<Mesh, ObjError> {
        let mut positions: Vec<[f32; 3]> = Vec::new();
        let mut normals: Vec<[f32; 3]> = Vec::new();
        let mut tex_coords: Vec<[f32; 2]> = Vec::new();
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = number + 1;
            let mut parts = line.split_whitespace();
            let Some(keyword) = parts.next() else {
                continue;
            };
            let parts: Vec<&str> = parts.collect();

            match keyword {
                "v" => positions.push(parse_floats::<3>(&parts, line_no, "vertex")?),
                "vn" => normals.push(parse_floats::<3>(&parts, line_no, "normal")?),
                "vt" => {
                    let [u, v] = parse_floats::<2>(&parts, line_no, "tex coord")?;
                    // OBJ puts v = 0 at the bottom of the image.
                    tex_coords.push([u, 1.0 - v]);
                }
                "f" => {
                    if parts.len() < 3 {
                        return Err(ObjError::Parse { line: line_no, message: "face needs three vertices".to_string() });
                    }

                    let mut face = Vec::with_capacity(parts.len());
                    let mut has_normals = true;
                    for corner in &parts {
                        let (vertex, explicit_normal) =
                            build_vertex(corner, &positions, &tex_coords, &normals, line_no)?;
                        has_normals &= explicit_normal;
                        face.push(vertex);
                    }

                    if !has_normals {
                        let a = face[0].position();
                        let normal = (face[1].position() - a).cross(&(face[2].position() - a));
                        let normal = normal.try_normalize(f32::EPSILON).unwrap_or_else(crate::foundation::math::Vec3::y);
                        for vertex in &mut face {
                            vertex.normal = normal.into();
                        }
                    }

                    let base = vertices.len() as u32;
                    vertices.extend(face.iter().copied());
                    for i in 1..(face.len() as u32 - 1) {
                        indices.extend_from_slice(&[base, base + i, base + i + 1]);
                    }
                }
                _ => {}
            }
        }

        if vertices.is_empty() {
            return Err(ObjError::InvalidFormat("No faces found in OBJ data".to_string()));
        }

        log::debug!("Parsed OBJ: {} vertices, {} triangles", vertices.len(), indices.len() / 3);
        Ok(Mesh::new(vertices, indices))
    }
}

fn parse_floats<const N: usize>(parts: &[&str], line: usize, what: &str) -> Result<[f32; N], ObjError> {
    let mut out = [0.0; N];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = parts
            .get(i)
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| ObjError::Parse { line, message: format!("invalid {what}") })?;
    }
    Ok(out)
}

/// Resolve one `v/vt/vn` corner; negative indices count from the end
fn build_vertex(
    corner: &str,
    positions: &[[f32; 3]],
    tex_coords: &[[f32; 2]],
    normals: &[[f32; 3]],
    line: usize,
) -> Result<(Vertex, bool), ObjError> {
    let mut fields = corner.split('/');
    let resolve = |field: Option<&str>, len: usize| -> Result<Option<usize>, ObjError> {
        match field {
            None | Some("") => Ok(None),
            Some(text) => {
                let index: i64 = text
                    .parse()
                    .map_err(|_| ObjError::Parse { line, message: format!("invalid index '{text}'") })?;
                let resolved = if index < 0 { len as i64 + index } else { index - 1 };
                if resolved < 0 || resolved >= len as i64 {
                    return Err(ObjError::InvalidFormat(format!("index {index} out of bounds on line {line}")));
                }
                Ok(Some(resolved as usize))
            }
        }
    };

    let position = resolve(fields.next(), positions.len())?
        .ok_or_else(|| ObjError::Parse { line, message: "face corner without position".to_string() })?;
    let tex = resolve(fields.next(), tex_coords.len())?;
    let normal = resolve(fields.next(), normals.len())?;

    let vertex = Vertex::new(
        positions[position],
        normal.map_or([0.0, 1.0, 0.0], |i| normals[i]),
        tex.map_or([0.0, 0.0], |i| tex_coords[i]),
    );
    Ok((vertex, normal.is_some()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
# unit quad facing +Z
v -1 -1 0
v 1 -1 0
v 1 1 0
v -1 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
f 1/1 2/2 3/3 4/4
";

    #[test]
    fn test_quad_is_fan_triangulated() {
        let mesh = ObjLoader::parse(QUAD.as_bytes()).unwrap();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.vertices[0].normal, [0.0, 0.0, 1.0]);
        assert_eq!(mesh.vertices[0].tex_coord, [0.0, 1.0]);
    }

    #[test]
    fn test_negative_indices_and_normals() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 -1\nf -3//1 -2//1 -1//1\n";
        let mesh = ObjLoader::parse(text.as_bytes()).unwrap();
        assert_eq!(mesh.vertices[2].position, [0.0, 1.0, 0.0]);
        assert_eq!(mesh.vertices[0].normal, [0.0, 0.0, -1.0]);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(ObjLoader::parse("v 0 0 0\n".as_bytes()), Err(ObjError::InvalidFormat(_))));
        assert!(matches!(ObjLoader::parse("v 0 x 0\n".as_bytes()), Err(ObjError::Parse { line: 1, .. })));
        assert!(matches!(ObjLoader::parse("v 0 0 0\nf 1 2 3\n".as_bytes()), Err(ObjError::InvalidFormat(_))));
    }
}
