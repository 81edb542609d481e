//! OBJ file loader for scene meshes

use crate::scene::mesh::{MeshData, MeshOptions, Vertex};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

/// OBJ loading errors
#[derive(Error, Debug)]
pub enum ObjError {
    /// The file could not be opened or read
    #[error("IO error reading {path}: {source}")]
    Io {
        /// File being read
        path: String,
        /// Underlying error
        source: std::io::Error,
    },
    /// A line could not be parsed
    #[error("Parse error at line {line}: {message}")]
    ParseError {
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },
    /// Structurally invalid content
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Key identifying one unique face corner: position, texcoord and normal indices
type CornerKey = (usize, Option<usize>, Option<usize>);

/// Wavefront OBJ loader
pub struct ObjLoader;

impl ObjLoader {
    /// Load an OBJ file and return triangulated mesh data
    pub fn load_obj<P: AsRef<Path>>(path: P, options: &MeshOptions) -> Result<MeshData, ObjError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ObjError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(BufReader::new(file), options).map_err(|err| match err {
            ObjError::Io { source, .. } => ObjError::Io {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })
    }

    /// Parse OBJ text from any buffered reader
    pub fn parse<R: BufRead>(reader: R, options: &MeshOptions) -> Result<MeshData, ObjError> {
        let mut positions: Vec<[f32; 3]> = Vec::new();
        let mut normals: Vec<[f32; 3]> = Vec::new();
        let mut tex_coords: Vec<[f32; 2]> = Vec::new();

        let mut vertices = Vec::new();
        let mut vertex_positions = Vec::new();
        let mut indices = Vec::new();
        let mut corner_lookup: HashMap<CornerKey, u32> = HashMap::new();
        let mut missing_normal = false;

        for (line_no, line) in reader.lines().enumerate() {
            let line_no = line_no + 1;
            let line = line.map_err(|source| ObjError::Io {
                path: String::new(),
                source,
            })?;
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            match parts[0] {
                "v" => positions.push(parse_floats::<3>(&parts, line_no, "vertex")?),
                "vn" => normals.push(parse_floats::<3>(&parts, line_no, "normal")?),
                "vt" => tex_coords.push(parse_tex_coord(&parts, line_no)?),
                "f" => {
                    if parts.len() < 4 {
                        return Err(ObjError::ParseError {
                            line: line_no,
                            message: "face needs at least three corners".to_string(),
                        });
                    }

                    let mut face = Vec::with_capacity(parts.len() - 1);
                    for corner in &parts[1..] {
                        let key = parse_corner(corner, positions.len(), tex_coords.len(), normals.len(), line_no)?;
                        missing_normal |= key.2.is_none();
                        let idx = *corner_lookup.entry(key).or_insert_with(|| {
                            let (pos_idx, tex_idx, normal_idx) = key;
                            vertices.push(Vertex {
                                position: positions[pos_idx],
                                normal: normal_idx.map_or([0.0, 1.0, 0.0], |i| normals[i]),
                                tex_coord: tex_idx.map_or([0.0, 0.0], |i| tex_coords[i]),
                            });
                            vertex_positions.push(pos_idx);
                            (vertices.len() - 1) as u32
                        });
                        face.push(idx);
                    }

                    // Fan triangulation
                    for i in 1..(face.len() - 1) {
                        indices.extend_from_slice(&[face[0], face[i], face[i + 1]]);
                    }
                }
                _ => {
                    // Groups, materials and smoothing groups are not used by the scene
                }
            }
        }

        if vertices.is_empty() {
            return Err(ObjError::InvalidFormat("No vertices found in OBJ file".to_string()));
        }

        if options.recompute_normal || missing_normal {
            recompute_normals(&mut vertices, &vertex_positions, positions.len(), &indices);
        }

        if options.uv_scale != [1.0, 1.0] {
            for vertex in &mut vertices {
                vertex.tex_coord[0] *= options.uv_scale[0];
                vertex.tex_coord[1] *= options.uv_scale[1];
            }
        }

        Ok(MeshData::new(vertices, indices))
    }
}

fn parse_floats<const N: usize>(parts: &[&str], line: usize, what: &str) -> Result<[f32; N], ObjError> {
    if parts.len() < N + 1 {
        return Err(ObjError::ParseError {
            line,
            message: format!("{} needs {} components", what, N),
        });
    }

    let mut out = [0.0; N];
    for (slot, text) in out.iter_mut().zip(&parts[1..=N]) {
        *slot = text.parse().map_err(|_| ObjError::ParseError {
            line,
            message: format!("invalid {} component '{}'", what, text),
        })?;
    }
    Ok(out)
}

/// `vt u [v [w]]`; a missing `v` is 0 and `w` is ignored
fn parse_tex_coord(parts: &[&str], line: usize) -> Result<[f32; 2], ObjError> {
    if !(2..=4).contains(&parts.len()) {
        return Err(ObjError::ParseError {
            line,
            message: "tex coord needs 1 to 3 components".to_string(),
        });
    }

    let mut out = [0.0; 2];
    for (slot, text) in out.iter_mut().zip(&parts[1..]) {
        *slot = text.parse().map_err(|_| ObjError::ParseError {
            line,
            message: format!("invalid tex coord component '{}'", text),
        })?;
    }
    Ok(out)
}

/// Resolve a 1-based (or negative, relative) OBJ index against `len` elements
fn resolve_index(text: &str, len: usize, line: usize, what: &str) -> Result<usize, ObjError> {
    let raw: i64 = text.parse().map_err(|_| ObjError::ParseError {
        line,
        message: format!("invalid {} index '{}'", what, text),
    })?;

    let resolved = match raw {
        0 => None,
        r if r > 0 => Some(r as usize - 1),
        r => (len as i64 + r).try_into().ok(),
    };

    resolved.filter(|idx| *idx < len).ok_or_else(|| ObjError::InvalidFormat(format!(
        "{} index {} out of bounds at line {}",
        what, raw, line
    )))
}

fn parse_corner(
    corner: &str,
    position_count: usize,
    tex_count: usize,
    normal_count: usize,
    line: usize,
) -> Result<CornerKey, ObjError> {
    let mut fields = corner.split('/');
    let pos = resolve_index(fields.next().unwrap_or(""), position_count, line, "position")?;

    let tex = match fields.next() {
        Some(t) if !t.is_empty() => Some(resolve_index(t, tex_count, line, "tex coord")?),
        _ => None,
    };
    let normal = match fields.next() {
        Some(n) if !n.is_empty() => Some(resolve_index(n, normal_count, line, "normal")?),
        _ => None,
    };

    Ok((pos, tex, normal))
}

/// Smooth per-position normals from area-weighted face normals
fn recompute_normals(vertices: &mut [Vertex], vertex_positions: &[usize], position_count: usize, indices: &[u32]) {
    let mut accum = vec![[0.0f32; 3]; position_count];

    for tri in indices.chunks_exact(3) {
        let p0 = vertices[tri[0] as usize].position;
        let p1 = vertices[tri[1] as usize].position;
        let p2 = vertices[tri[2] as usize].position;

        let e1 = [p1[0] - p0[0], p1[1] - p0[1], p1[2] - p0[2]];
        let e2 = [p2[0] - p0[0], p2[1] - p0[1], p2[2] - p0[2]];
        let n = [
            e1[1] * e2[2] - e1[2] * e2[1],
            e1[2] * e2[0] - e1[0] * e2[2],
            e1[0] * e2[1] - e1[1] * e2[0],
        ];

        for &v in tri {
            let acc = &mut accum[vertex_positions[v as usize]];
            acc[0] += n[0];
            acc[1] += n[1];
            acc[2] += n[2];
        }
    }

    for (vertex, &pos_idx) in vertices.iter_mut().zip(vertex_positions) {
        let n = accum[pos_idx];
        let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        vertex.normal = if len > 0.0 {
            [n[0] / len, n[1] / len, n[2] / len]
        } else {
            [0.0, 1.0, 0.0]
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const QUAD: &str = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
f 1/1 2/2 3/3 4/4
";

    #[test]
    fn test_quad_is_fan_triangulated() {
        let mesh = ObjLoader::parse(Cursor::new(QUAD), &MeshOptions::default()).unwrap();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_missing_normals_are_generated() {
        let mesh = ObjLoader::parse(Cursor::new(QUAD), &MeshOptions::default()).unwrap();
        for v in &mesh.vertices {
            assert_eq!(v.normal, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn test_recompute_overrides_file_normals() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 1 0 0\nf 1//1 2//1 3//1\n";
        let kept = ObjLoader::parse(Cursor::new(src), &MeshOptions::default()).unwrap();
        assert_eq!(kept.vertices[0].normal, [1.0, 0.0, 0.0]);

        let options = MeshOptions {
            recompute_normal: true,
            ..MeshOptions::default()
        };
        let recomputed = ObjLoader::parse(Cursor::new(src), &options).unwrap();
        assert_eq!(recomputed.vertices[0].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_corners_without_normal_index_get_generated_normals() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1 2 3\n";
        let mesh = ObjLoader::parse(Cursor::new(src), &MeshOptions::default()).unwrap();
        for v in &mesh.vertices {
            assert_eq!(v.normal, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn test_tex_coord_component_counts() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0.5\nvt 0.25 0.75 1\nf 1/1 2/2 3/1\n";
        let mesh = ObjLoader::parse(Cursor::new(src), &MeshOptions::default()).unwrap();
        assert_eq!(mesh.vertices[0].tex_coord, [0.5, 0.0]);
        assert_eq!(mesh.vertices[1].tex_coord, [0.25, 0.75]);

        let bare = "v 0 0 0\nvt\n";
        assert!(matches!(
            ObjLoader::parse(Cursor::new(bare), &MeshOptions::default()),
            Err(ObjError::ParseError { line: 2, .. })
        ));
    }

    #[test]
    fn test_uv_scale_applied() {
        let options = MeshOptions {
            recompute_normal: false,
            uv_scale: [2.0, 3.0],
        };
        let mesh = ObjLoader::parse(Cursor::new(QUAD), &options).unwrap();
        assert_eq!(mesh.vertices[2].tex_coord, [2.0, 3.0]);
    }

    #[test]
    fn test_shared_corners_are_deduplicated() {
        let src = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3\nf 1 3 4\n";
        let mesh = ObjLoader::parse(Cursor::new(src), &MeshOptions::default()).unwrap();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices.len(), 6);
    }

    #[test]
    fn test_negative_indices() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let mesh = ObjLoader::parse(Cursor::new(src), &MeshOptions::default()).unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_out_of_range_index_is_rejected() {
        let src = "v 0 0 0\nf 1 2 3\n";
        assert!(matches!(
            ObjLoader::parse(Cursor::new(src), &MeshOptions::default()),
            Err(ObjError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_empty_file_is_invalid() {
        assert!(ObjLoader::parse(Cursor::new("# nothing\n"), &MeshOptions::default()).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = ObjLoader::load_obj("/definitely/not/here.obj", &MeshOptions::default()).unwrap_err();
        assert!(matches!(err, ObjError::Io { .. }));
    }
}
