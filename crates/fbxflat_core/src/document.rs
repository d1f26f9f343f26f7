//! Read-only access to an imported scene graph.
//!
//! The walker and flattener are written against [`SceneNode`] and
//! [`MeshSource`] so the same code runs over live SDK handles
//! (`sdk::NodeRef`, behind the `fbx-sdk` feature) and over in-memory
//! scenes built with [`crate::memory`].

use std::borrow::Cow;

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::layer::LayerElement;
use crate::memory::MemoryMesh;

/// A typed payload attached to a node.
///
/// Only meshes carry geometry. The other kinds are listed so that callers
/// match on them explicitly; `Other` holds the raw SDK type code of
/// anything not modelled here (NURBS, patches, LOD groups, ...).
#[derive(Clone, Debug, PartialEq)]
pub enum NodeAttribute<M> {
    Mesh(M),
    Light,
    Camera,
    Skeleton,
    Null,
    Marker,
    Other(i32),
}

impl<M> NodeAttribute<M> {
    /// Borrow the payload.
    pub fn as_ref(&self) -> NodeAttribute<&M> {
        match self {
            NodeAttribute::Mesh(mesh) => NodeAttribute::Mesh(mesh),
            NodeAttribute::Light => NodeAttribute::Light,
            NodeAttribute::Camera => NodeAttribute::Camera,
            NodeAttribute::Skeleton => NodeAttribute::Skeleton,
            NodeAttribute::Null => NodeAttribute::Null,
            NodeAttribute::Marker => NodeAttribute::Marker,
            NodeAttribute::Other(code) => NodeAttribute::Other(*code),
        }
    }

    /// Attribute kind without the payload.
    pub fn kind(&self) -> AttributeKind {
        match self {
            NodeAttribute::Mesh(_) => AttributeKind::Mesh,
            NodeAttribute::Light => AttributeKind::Light,
            NodeAttribute::Camera => AttributeKind::Camera,
            NodeAttribute::Skeleton => AttributeKind::Skeleton,
            NodeAttribute::Null => AttributeKind::Null,
            NodeAttribute::Marker => AttributeKind::Marker,
            NodeAttribute::Other(code) => AttributeKind::Other(*code),
        }
    }
}

/// Attribute kind as reported by the SDK, before any payload is fetched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Mesh,
    Light,
    Camera,
    Skeleton,
    Null,
    Marker,
    Other(i32),
}

impl AttributeKind {
    /// Classify an `FbxNodeAttribute::EType` value.
    pub fn from_sdk_type(code: i32) -> Self {
        match code {
            1 => AttributeKind::Null,
            2 => AttributeKind::Marker,
            3 => AttributeKind::Skeleton,
            4 => AttributeKind::Mesh,
            // eCamera, eCameraStereo, eCameraSwitcher
            7..=9 => AttributeKind::Camera,
            10 => AttributeKind::Light,
            other => AttributeKind::Other(other),
        }
    }
}

/// One node of the scene hierarchy.
///
/// Implementors are cheap handles (references or SDK pointers), so
/// children are returned by value.
pub trait SceneNode: Sized {
    type Mesh: MeshSource;

    /// Node name
    fn name(&self) -> Cow<'_, str>;

    /// Transform relative to the parent node
    fn local_transform(&self) -> Mat4;

    fn child_count(&self) -> usize;

    fn child(&self, index: usize) -> Option<Self>;

    fn attribute_count(&self) -> usize;

    fn attribute(&self, index: usize) -> Option<NodeAttribute<Self::Mesh>>;
}

/// Control-point based mesh geometry as stored in the document.
pub trait MeshSource {
    /// Shared corner positions
    fn control_points(&self) -> Cow<'_, [Vec3]>;

    fn polygon_count(&self) -> usize;

    /// Number of corners of `polygon`
    fn polygon_size(&self, polygon: usize) -> usize;

    /// Control point referenced by `corner` of `polygon`.
    ///
    /// Raw SDK value: negative or out-of-range results are possible in
    /// broken documents and are rejected by the flattener.
    fn polygon_vertex(&self, polygon: usize, corner: usize) -> i32;

    fn normal_layer(&self) -> Option<Cow<'_, LayerElement<Vec3>>>;

    fn uv_layer(&self) -> Option<Cow<'_, LayerElement<Vec2>>>;

    fn color_layer(&self) -> Option<Cow<'_, LayerElement<Vec4>>>;

    /// Tangents: xyz plus handedness in w
    fn tangent_layer(&self) -> Option<Cow<'_, LayerElement<Vec4>>>;

    /// Thread-shareable view of the mesh.
    ///
    /// Copies everything into a [`MemoryMesh`] unless the source already
    /// is one.
    fn snapshot(&self) -> Cow<'_, MemoryMesh>
    where
        Self: Sized,
    {
        Cow::Owned(MemoryMesh::capture(self))
    }
}

impl<M: MeshSource> MeshSource for &M {
    fn control_points(&self) -> Cow<'_, [Vec3]> {
        (**self).control_points()
    }

    fn polygon_count(&self) -> usize {
        (**self).polygon_count()
    }

    fn polygon_size(&self, polygon: usize) -> usize {
        (**self).polygon_size(polygon)
    }

    fn polygon_vertex(&self, polygon: usize, corner: usize) -> i32 {
        (**self).polygon_vertex(polygon, corner)
    }

    fn normal_layer(&self) -> Option<Cow<'_, LayerElement<Vec3>>> {
        (**self).normal_layer()
    }

    fn uv_layer(&self) -> Option<Cow<'_, LayerElement<Vec2>>> {
        (**self).uv_layer()
    }

    fn color_layer(&self) -> Option<Cow<'_, LayerElement<Vec4>>> {
        (**self).color_layer()
    }

    fn tangent_layer(&self) -> Option<Cow<'_, LayerElement<Vec4>>> {
        (**self).tangent_layer()
    }

    fn snapshot(&self) -> Cow<'_, MemoryMesh> {
        (**self).snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sdk_type_classification() {
        assert_eq!(AttributeKind::from_sdk_type(4), AttributeKind::Mesh);
        assert_eq!(AttributeKind::from_sdk_type(10), AttributeKind::Light);
        assert_eq!(AttributeKind::from_sdk_type(8), AttributeKind::Camera);
        assert_eq!(AttributeKind::from_sdk_type(3), AttributeKind::Skeleton);
        assert_eq!(AttributeKind::from_sdk_type(1), AttributeKind::Null);
        assert_eq!(AttributeKind::from_sdk_type(2), AttributeKind::Marker);
        // eNurbs and anything newer than the SDK we built against
        assert_eq!(AttributeKind::from_sdk_type(5), AttributeKind::Other(5));
        assert_eq!(AttributeKind::from_sdk_type(99), AttributeKind::Other(99));
    }

    #[test]
    fn test_attribute_as_ref_keeps_kind() {
        let attribute: NodeAttribute<u32> = NodeAttribute::Mesh(7);
        assert_eq!(attribute.as_ref(), NodeAttribute::Mesh(&7));
        assert_eq!(attribute.kind(), AttributeKind::Mesh);
        assert_eq!(NodeAttribute::<u32>::Other(21).kind(), AttributeKind::Other(21));
    }
}
