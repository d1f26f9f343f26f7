//! Flattened, renderer-ready mesh buffers.
//!
//! A [`ParsedMesh`] holds one [`ParsedVertex`] per triangle corner and an
//! index buffer that simply counts through them. Vertices are never shared
//! between polygons, so the index buffer doubles as draw order.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// One emitted vertex.
///
/// Every channel is always present; channels the source mesh lacks are
/// zero. The layout is `#[repr(C)]` without padding so a vertex slice can
/// be handed to a GPU buffer as bytes.
#[repr(C)]
#[derive(
    Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Serialize, Deserialize,
)]
pub struct ParsedVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 4],

    /// xyz tangent, w handedness sign
    pub tangent: [f32; 4],
}

/// Axis-aligned bounds of a mesh's positions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    /// Bounds enclosing `points`, or `None` when there are none.
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    /// Center of the box.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Diagonal length of the box.
    pub fn size(&self) -> f32 {
        (self.max - self.min).length()
    }
}

/// One flattened mesh.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParsedMesh {
    /// Name of the node carrying the mesh
    pub name: String,

    /// World transform of that node; vertices stay in mesh-local space
    pub transform: Mat4,

    pub vertices: Vec<ParsedVertex>,

    /// Triangle list (every 3 indices form a triangle)
    pub indices: Vec<u32>,
}

impl Default for ParsedMesh {
    fn default() -> Self {
        Self {
            name: String::new(),
            transform: Mat4::IDENTITY,
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }
}

impl ParsedMesh {
    /// Create an unnamed mesh with an identity transform.
    pub fn new(vertices: Vec<ParsedVertex>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            ..Default::default()
        }
    }

    /// Set the owning node's name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the owning node's world transform.
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Bounds of the vertex positions in mesh-local space.
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(self.vertices.iter().map(|v| Vec3::from_array(v.position)))
    }

    /// Vertex buffer as raw bytes.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index buffer as raw bytes.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Iterate triangles as vertex triplets.
    ///
    /// Every index of a flattened mesh is below `vertex_count()`. Triangles
    /// of a hand-assembled mesh that break this are not yielded.
    pub fn triangles(&self) -> impl Iterator<Item = [ParsedVertex; 3]> + '_ {
        let fetch = move |i: u32| self.vertices.get(i as usize).copied();
        self.indices
            .chunks_exact(3)
            .filter_map(move |tri| Some([fetch(tri[0])?, fetch(tri[1])?, fetch(tri[2])?]))
    }
}
