//! Wavefront OBJ import.
//!
//! Supports `v`, `vt`, `vn` and `f` records. Polygons are fan-triangulated,
//! negative (relative) indices are resolved, and each distinct
//! `(v, vt, vn)` triple becomes one output vertex. Texture V is flipped so
//! images uploaded top-row-first sample the right way up.

use std::collections::HashMap;
use std::path::Path;

use crate::{AssetError, MeshData};

const DEFAULT_NORMAL: [f32; 3] = [0.0, 1.0, 0.0];

/// Read and parse an OBJ file from disk.
pub fn load_obj(path: impl AsRef<Path>) -> Result<MeshData, AssetError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mesh = parse_obj(&source)?;
    tracing::debug!(
        path = %path.display(),
        vertices = mesh.vertex_count(),
        indices = mesh.index_count(),
        "loaded OBJ"
    );
    Ok(mesh)
}

type Corner = (usize, Option<usize>, Option<usize>);

/// Parse OBJ text into an indexed mesh.
pub fn parse_obj(source: &str) -> Result<MeshData, AssetError> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut tex_coords: Vec<[f32; 2]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();

    let mut mesh = MeshData::default();
    let mut seen: HashMap<Corner, u32> = HashMap::new();

    for (line_no, raw) in source.lines().enumerate() {
        let line_no = line_no + 1;
        let line = raw.split('#').next().unwrap_or("").trim();
        let mut parts = line.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };
        match tag {
            "v" => positions.push(parse_floats::<3>(parts, line_no)?),
            "vt" => {
                let [u, v] = parse_floats::<2>(parts, line_no)?;
                tex_coords.push([u, 1.0 - v]);
            }
            "vn" => normals.push(parse_floats::<3>(parts, line_no)?),
            "f" => {
                let corners = parts
                    .map(|c| {
                        parse_corner(
                            c,
                            positions.len(),
                            tex_coords.len(),
                            normals.len(),
                            line_no,
                        )
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                if corners.len() < 3 {
                    return Err(AssetError::ObjParse {
                        line: line_no,
                        message: format!("face has {} corners", corners.len()),
                    });
                }
                let mut resolved = Vec::with_capacity(corners.len());
                for corner in corners {
                    let index = *seen.entry(corner).or_insert_with(|| {
                        let (v, vt, vn) = corner;
                        mesh.positions.push(positions[v]);
                        mesh.tex_coords
                            .push(vt.map(|i| tex_coords[i]).unwrap_or([0.0, 0.0]));
                        mesh.normals
                            .push(vn.map(|i| normals[i]).unwrap_or(DEFAULT_NORMAL));
                        (mesh.positions.len() - 1) as u32
                    });
                    resolved.push(index);
                }
                for k in 1..resolved.len() - 1 {
                    mesh.indices
                        .extend_from_slice(&[resolved[0], resolved[k], resolved[k + 1]]);
                }
            }
            // groups, objects, materials and smoothing are ignored
            _ => {}
        }
    }

    mesh.validate()?;
    Ok(mesh)
}

fn parse_floats<'a, const N: usize>(
    mut parts: impl Iterator<Item = &'a str>,
    line: usize,
) -> Result<[f32; N], AssetError> {
    let mut out = [0.0; N];
    for slot in out.iter_mut() {
        let token = parts.next().ok_or_else(|| AssetError::ObjParse {
            line,
            message: format!("expected {N} components"),
        })?;
        *slot = token.parse().map_err(|_| AssetError::ObjParse {
            line,
            message: format!("bad number {token:?}"),
        })?;
    }
    Ok(out)
}

fn parse_corner(
    token: &str,
    v_len: usize,
    vt_len: usize,
    vn_len: usize,
    line: usize,
) -> Result<Corner, AssetError> {
    let mut fields = token.split('/');
    let v = fields
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AssetError::ObjParse {
            line,
            message: format!("face corner {token:?} has no position"),
        })?;
    let v = resolve_index(v, v_len, line)?;
    let vt = match fields.next() {
        Some(s) if !s.is_empty() => Some(resolve_index(s, vt_len, line)?),
        _ => None,
    };
    let vn = match fields.next() {
        Some(s) if !s.is_empty() => Some(resolve_index(s, vn_len, line)?),
        _ => None,
    };
    Ok((v, vt, vn))
}

/// OBJ indices are 1-based; negative values count back from the end.
fn resolve_index(token: &str, len: usize, line: usize) -> Result<usize, AssetError> {
    let raw: i64 = token.parse().map_err(|_| AssetError::ObjParse {
        line,
        message: format!("bad index {token:?}"),
    })?;
    let resolved = if raw > 0 {
        raw - 1
    } else {
        len as i64 + raw
    };
    if raw == 0 || resolved < 0 || resolved >= len as i64 {
        return Err(AssetError::ObjParse {
            line,
            message: format!("index {raw} out of range ({len} available)"),
        });
    }
    Ok(resolved as usize)
}
