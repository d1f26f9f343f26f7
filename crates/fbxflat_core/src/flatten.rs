//! Mesh flattening.
//!
//! Turns a control-point mesh into one vertex per triangle corner:
//!
//! 1. walk polygons in order, resolving each corner's control point;
//! 2. resolve every layer for each corner through [`LayerElement::resolve`];
//! 3. fan-triangulate from the polygon's first corner, copying the resolved
//!    corner vertices into the output and counting up the index buffer.
//!
//! Fan triangulation assumes convex, planar polygons. Concave n-gons come
//! out with overlapping triangles; nothing here detects that.

use thiserror::Error;

use crate::document::MeshSource;
use crate::layer::{Channel, Corner, LayerElement, LayerError};
use crate::mesh::{ParsedMesh, ParsedVertex};

/// Why a mesh could not be flattened.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    #[error("polygon {polygon} has {corners} corners (at least 3 required)")]
    DegeneratePolygon { polygon: usize, corners: usize },

    #[error("polygon {polygon} corner {corner} references control point {index} (mesh has {count})")]
    ControlPointOutOfRange {
        polygon: usize,
        corner: usize,
        index: i32,
        count: usize,
    },

    #[error("{channel} layer at polygon {polygon} corner {corner}: {source}")]
    Layer {
        channel: Channel,
        polygon: usize,
        corner: usize,
        #[source]
        source: LayerError,
    },

    #[error("mesh needs {0} vertices, more than a 32-bit index buffer can address")]
    TooManyVertices(usize),
}

/// Result type for flattening.
pub type MeshResult<T> = Result<T, MeshError>;

/// Flatten one mesh into a triangle list.
///
/// The returned mesh is unnamed and has an identity transform; the scene
/// walker fills both in from the owning node.
pub fn flatten_mesh<M: MeshSource>(mesh: &M) -> MeshResult<ParsedMesh> {
    let control_points = mesh.control_points();
    let normals = mesh.normal_layer();
    let uvs = mesh.uv_layer();
    let colors = mesh.color_layer();
    let tangents = mesh.tangent_layer();

    let polygon_count = mesh.polygon_count();

    // Size check up front so a bad polygon fails before any allocation.
    let mut vertex_total = 0usize;
    for polygon in 0..polygon_count {
        let corners = mesh.polygon_size(polygon);
        if corners < 3 {
            return Err(MeshError::DegeneratePolygon { polygon, corners });
        }
        vertex_total += 3 * (corners - 2);
    }
    if u32::try_from(vertex_total).is_err() {
        return Err(MeshError::TooManyVertices(vertex_total));
    }

    let mut vertices = Vec::with_capacity(vertex_total);
    let mut corner_vertices: Vec<ParsedVertex> = Vec::new();
    let mut counter = 0usize;

    for polygon in 0..polygon_count {
        let corners = mesh.polygon_size(polygon);

        corner_vertices.clear();
        for corner in 0..corners {
            let raw = mesh.polygon_vertex(polygon, corner);
            let control_point = usize::try_from(raw)
                .ok()
                .filter(|&cp| cp < control_points.len())
                .ok_or(MeshError::ControlPointOutOfRange {
                    polygon,
                    corner,
                    index: raw,
                    count: control_points.len(),
                })?;

            let at = Corner {
                control_point,
                polygon,
                counter,
            };
            let sample = Sampler { at, corner };

            corner_vertices.push(ParsedVertex {
                position: control_points[control_point].to_array(),
                normal: sample
                    .read(normals.as_deref(), Channel::Normal)?
                    .map_or([0.0; 3], |normal| normal.to_array()),
                uv: sample
                    .read(uvs.as_deref(), Channel::Uv)?
                    .map_or([0.0; 2], |uv| uv.to_array()),
                color: sample
                    .read(colors.as_deref(), Channel::Color)?
                    .map_or([0.0; 4], |color| color.to_array()),
                tangent: sample
                    .read(tangents.as_deref(), Channel::Tangent)?
                    .map_or([0.0; 4], |tangent| tangent.to_array()),
            });

            counter += 1;
        }

        // Fan: (0, i, i + 1) for i in 1..n-1
        for i in 1..corners - 1 {
            vertices.push(corner_vertices[0]);
            vertices.push(corner_vertices[i]);
            vertices.push(corner_vertices[i + 1]);
        }
    }

    // Checked against u32::MAX above.
    let indices = (0..vertices.len() as u32).collect();

    Ok(ParsedMesh::new(vertices, indices))
}

/// Layer reads for a single corner, tagging failures with their location.
struct Sampler {
    at: Corner,
    corner: usize,
}

impl Sampler {
    fn read<T: Copy>(
        &self,
        layer: Option<&LayerElement<T>>,
        channel: Channel,
    ) -> MeshResult<Option<T>> {
        let Some(layer) = layer else {
            return Ok(None);
        };

        layer
            .resolve(self.at)
            .map(Some)
            .map_err(|source| MeshError::Layer {
                channel,
                polygon: self.at.polygon,
                corner: self.corner,
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::MappingMode;
    use crate::memory::MemoryMesh;
    use glam::{Vec2, Vec3, Vec4};

    fn unit_square() -> MemoryMesh {
        MemoryMesh::new(vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ])
    }

    #[test]
    fn test_triangle_keeps_corner_order() {
        let mesh = unit_square().with_polygon(&[0, 1, 2]).with_polygon(&[2, 3, 0]);

        let flat = flatten_mesh(&mesh).unwrap();

        assert_eq!(flat.vertex_count(), 6);
        assert_eq!(flat.indices, vec![0, 1, 2, 3, 4, 5]);

        let positions: Vec<[f32; 3]> = flat.vertices.iter().map(|v| v.position).collect();
        assert_eq!(
            positions,
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0],
            ]
        );
    }

    #[test]
    fn test_quad_with_control_point_normals() {
        let normals = vec![
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0),
        ];
        let mesh = unit_square()
            .with_polygon(&[0, 1, 2, 3])
            .with_normals(LayerElement::direct(MappingMode::ByControlPoint, normals.clone()));

        let flat = flatten_mesh(&mesh).unwrap();

        // Quad (0,1,2,3) -> triangles (0,1,2) and (0,2,3)
        assert_eq!(flat.vertex_count(), 6);
        assert_eq!(flat.triangle_count(), 2);

        let control_points = mesh.control_points.clone();
        for vertex in &flat.vertices {
            let cp = control_points
                .iter()
                .position(|p| p.to_array() == vertex.position)
                .unwrap();
            assert_eq!(vertex.normal, normals[cp].to_array());
        }
        assert_eq!(flat.vertices[3].position, [0.0, 0.0, 0.0]);
        assert_eq!(flat.vertices[5].position, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_ngon_vertex_count() {
        let mesh = MemoryMesh::new(vec![Vec3::ZERO; 6])
            .with_polygon(&[0, 1, 2, 3, 4]) // 3 triangles
            .with_polygon(&[0, 1, 2]) // 1 triangle
            .with_polygon(&[0, 1, 2, 3, 4, 5]); // 4 triangles

        let flat = flatten_mesh(&mesh).unwrap();

        assert_eq!(flat.vertex_count(), 3 * (3 + 1 + 4));
        assert_eq!(flat.index_count(), flat.vertex_count());
        assert!(flat.indices.iter().all(|&i| (i as usize) < flat.vertex_count()));
        assert_eq!(flat.triangles().count(), flat.triangle_count());
    }

    #[test]
    fn test_missing_layers_default_to_zero() {
        let mesh = unit_square().with_polygon(&[0, 1, 2]);

        let flat = flatten_mesh(&mesh).unwrap();

        for vertex in &flat.vertices {
            assert_eq!(vertex.normal, [0.0; 3]);
            assert_eq!(vertex.uv, [0.0; 2]);
            assert_eq!(vertex.color, [0.0; 4]);
            assert_eq!(vertex.tangent, [0.0; 4]);
        }
    }

    #[test]
    fn test_polygon_vertex_uvs_follow_running_counter() {
        // Two quads, 8 corners; UVs indexed per corner
        let uvs = vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0)];
        let index = vec![0, 1, 2, 0, 2, 2, 1, 0];
        let mesh = MemoryMesh::new(vec![Vec3::ZERO; 4])
            .with_polygon(&[0, 1, 2, 3])
            .with_polygon(&[3, 2, 1, 0])
            .with_uvs(LayerElement::indexed(MappingMode::ByPolygonVertex, uvs, index));

        let flat = flatten_mesh(&mesh).unwrap();
        assert_eq!(flat.vertex_count(), 12);

        // Second quad reads index entries 4..8 = [2, 2, 1, 0]
        let second: Vec<[f32; 2]> = flat.vertices[6..].iter().map(|v| v.uv).collect();
        assert_eq!(
            second,
            vec![
                [1.0, 1.0],
                [1.0, 1.0],
                [1.0, 0.0],
                [1.0, 1.0],
                [1.0, 0.0],
                [0.0, 0.0],
            ]
        );
    }

    #[test]
    fn test_by_polygon_and_all_same_layers() {
        let mesh = unit_square()
            .with_polygon(&[0, 1, 2])
            .with_polygon(&[2, 3, 0])
            .with_normals(LayerElement::direct(
                MappingMode::ByPolygon,
                vec![Vec3::Z, Vec3::NEG_Z],
            ))
            .with_colors(LayerElement::direct(
                MappingMode::AllSame,
                vec![Vec4::new(1.0, 0.5, 0.25, 1.0)],
            ));

        let flat = flatten_mesh(&mesh).unwrap();

        assert!(flat.vertices[..3].iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
        assert!(flat.vertices[3..].iter().all(|v| v.normal == [0.0, 0.0, -1.0]));
        assert!(flat.vertices.iter().all(|v| v.color == [1.0, 0.5, 0.25, 1.0]));
    }

    #[test]
    fn test_tangent_handedness_is_kept() {
        let mesh = unit_square()
            .with_polygon(&[0, 1, 2])
            .with_tangents(LayerElement::direct(
                MappingMode::AllSame,
                vec![Vec4::new(1.0, 0.0, 0.0, -1.0)],
            ));

        let flat = flatten_mesh(&mesh).unwrap();
        assert!(flat.vertices.iter().all(|v| v.tangent == [1.0, 0.0, 0.0, -1.0]));
    }

    #[test]
    fn test_out_of_bounds_layer_index_fails() {
        let mesh = unit_square()
            .with_polygon(&[0, 1, 2])
            .with_uvs(LayerElement::indexed(
                MappingMode::ByPolygonVertex,
                vec![Vec2::ZERO, Vec2::ONE],
                vec![0, 1, 5],
            ));

        let err = flatten_mesh(&mesh).unwrap_err();
        assert_eq!(
            err,
            MeshError::Layer {
                channel: Channel::Uv,
                polygon: 0,
                corner: 2,
                source: LayerError::OutOfBounds { index: 5, len: 2 },
            }
        );
    }

    #[test]
    fn test_degenerate_polygon_fails() {
        let mesh = unit_square().with_polygon(&[0, 1, 2]).with_polygon(&[2, 3]);

        let err = flatten_mesh(&mesh).unwrap_err();
        assert_eq!(err, MeshError::DegeneratePolygon { polygon: 1, corners: 2 });
    }

    #[test]
    fn test_control_point_out_of_range_fails() {
        let negative = unit_square().with_polygon(&[0, -1, 2]);
        assert!(matches!(
            flatten_mesh(&negative),
            Err(MeshError::ControlPointOutOfRange { index: -1, .. })
        ));

        let past_end = unit_square().with_polygon(&[0, 1, 4]);
        assert!(matches!(
            flatten_mesh(&past_end),
            Err(MeshError::ControlPointOutOfRange { index: 4, count: 4, .. })
        ));
    }

    #[test]
    fn test_mesh_without_polygons_is_empty() {
        let flat = flatten_mesh(&unit_square()).unwrap();
        assert!(flat.is_empty());
        assert!(flat.indices.is_empty());
    }
}
