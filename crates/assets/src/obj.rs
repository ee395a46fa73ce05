use std::path::Path;

use easel_ecs::Mesh;
use glam::Vec3;

use crate::error::AssetError;

/// Wavefront OBJ reader. Only positions and faces are used; normals, texture
/// coordinates, groups and materials are skipped.
pub struct ObjLoader;

impl ObjLoader {
    pub fn load(path: impl AsRef<Path>) -> Result<Mesh, AssetError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parse OBJ text. Polygons are triangulated as fans around their first vertex.
    pub fn parse(text: &str) -> Result<Mesh, AssetError> {
        let mut positions: Vec<Vec3> = Vec::new();
        let mut indices: Vec<u32> = Vec::new();

        for (number, raw) in text.lines().enumerate() {
            let line = number + 1;
            let mut tokens = raw.split_whitespace();
            match tokens.next() {
                Some("v") => {
                    let coords = tokens
                        .take(3)
                        .map(|t| t.parse::<f32>())
                        .collect::<Result<Vec<_>, _>>()
                        .map_err(|e| parse_error(line, e.to_string()))?;
                    let &[x, y, z] = coords.as_slice() else {
                        return Err(parse_error(line, "vertex needs three coordinates"));
                    };
                    positions.push(Vec3::new(x, y, z));
                }
                Some("f") => {
                    let corners = tokens
                        .map(|t| resolve_index(t, positions.len(), line))
                        .collect::<Result<Vec<_>, _>>()?;
                    if corners.len() < 3 {
                        return Err(parse_error(line, "face needs at least three vertices"));
                    }
                    for i in 1..corners.len() - 1 {
                        indices.extend([corners[0], corners[i], corners[i + 1]]);
                    }
                }
                _ => {}
            }
        }

        if indices.is_empty() {
            return Err(AssetError::Empty);
        }
        tracing::debug!(
            vertices = positions.len(),
            triangles = indices.len() / 3,
            "parsed OBJ"
        );
        Ok(Mesh::new(positions, indices))
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> AssetError {
    AssetError::ObjParse {
        line,
        message: message.into(),
    }
}

/// Resolve one face corner (`v`, `v/t`, `v//n` or `v/t/n`) to a zero-based index.
/// Negative indices count back from the most recent vertex.
fn resolve_index(token: &str, vertex_count: usize, line: usize) -> Result<u32, AssetError> {
    let head = token.split('/').next().unwrap_or(token);
    let value: i64 = head
        .parse()
        .map_err(|_| parse_error(line, format!("bad face index `{token}`")))?;
    let resolved = match value {
        0 => None,
        v if v > 0 => Some(v - 1),
        v => Some(vertex_count as i64 + v),
    };
    resolved
        .filter(|&i| i >= 0 && (i as usize) < vertex_count)
        .map(|i| i as u32)
        .ok_or_else(|| parse_error(line, format!("face index `{token}` out of range")))
}
