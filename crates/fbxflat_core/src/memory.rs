//! In-memory scene graph.
//!
//! Mirrors the shape of an imported FBX scene (control points, polygon
//! lists, attribute layers, node hierarchy) without any SDK handle. Used to
//! build scenes by hand and to snapshot SDK meshes before flattening them
//! on worker threads.

use std::borrow::Cow;

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::document::{MeshSource, NodeAttribute, SceneNode};
use crate::layer::LayerElement;

/// Mesh geometry held in plain vectors.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryMesh {
    pub control_points: Vec<Vec3>,

    /// Control-point indices, one list per polygon
    pub polygons: Vec<Vec<i32>>,

    pub normals: Option<LayerElement<Vec3>>,
    pub uvs: Option<LayerElement<Vec2>>,
    pub colors: Option<LayerElement<Vec4>>,
    pub tangents: Option<LayerElement<Vec4>>,
}

impl MemoryMesh {
    /// Create a mesh from control points, with no polygons yet.
    pub fn new(control_points: Vec<Vec3>) -> Self {
        Self {
            control_points,
            ..Default::default()
        }
    }

    /// Append a polygon referencing control points by index.
    pub fn with_polygon(mut self, corners: &[i32]) -> Self {
        self.polygons.push(corners.to_vec());
        self
    }

    pub fn with_normals(mut self, layer: LayerElement<Vec3>) -> Self {
        self.normals = Some(layer);
        self
    }

    pub fn with_uvs(mut self, layer: LayerElement<Vec2>) -> Self {
        self.uvs = Some(layer);
        self
    }

    pub fn with_colors(mut self, layer: LayerElement<Vec4>) -> Self {
        self.colors = Some(layer);
        self
    }

    pub fn with_tangents(mut self, layer: LayerElement<Vec4>) -> Self {
        self.tangents = Some(layer);
        self
    }

    /// Copy any mesh source into owned storage.
    pub fn capture<M: MeshSource>(source: &M) -> Self {
        let polygons = (0..source.polygon_count())
            .map(|polygon| {
                (0..source.polygon_size(polygon))
                    .map(|corner| source.polygon_vertex(polygon, corner))
                    .collect()
            })
            .collect();

        Self {
            control_points: source.control_points().into_owned(),
            polygons,
            normals: source.normal_layer().map(Cow::into_owned),
            uvs: source.uv_layer().map(Cow::into_owned),
            colors: source.color_layer().map(Cow::into_owned),
            tangents: source.tangent_layer().map(Cow::into_owned),
        }
    }
}

impl MeshSource for MemoryMesh {
    fn control_points(&self) -> Cow<'_, [Vec3]> {
        Cow::Borrowed(&self.control_points)
    }

    fn polygon_count(&self) -> usize {
        self.polygons.len()
    }

    fn polygon_size(&self, polygon: usize) -> usize {
        self.polygons.get(polygon).map_or(0, Vec::len)
    }

    fn polygon_vertex(&self, polygon: usize, corner: usize) -> i32 {
        self.polygons
            .get(polygon)
            .and_then(|corners| corners.get(corner))
            .copied()
            .unwrap_or(-1)
    }

    fn normal_layer(&self) -> Option<Cow<'_, LayerElement<Vec3>>> {
        self.normals.as_ref().map(Cow::Borrowed)
    }

    fn uv_layer(&self) -> Option<Cow<'_, LayerElement<Vec2>>> {
        self.uvs.as_ref().map(Cow::Borrowed)
    }

    fn color_layer(&self) -> Option<Cow<'_, LayerElement<Vec4>>> {
        self.colors.as_ref().map(Cow::Borrowed)
    }

    fn tangent_layer(&self) -> Option<Cow<'_, LayerElement<Vec4>>> {
        self.tangents.as_ref().map(Cow::Borrowed)
    }

    fn snapshot(&self) -> Cow<'_, MemoryMesh> {
        Cow::Borrowed(self)
    }
}

/// A scene node with owned children and attributes.
#[derive(Clone, Debug, PartialEq)]
pub struct MemoryNode {
    pub name: String,

    /// Transform relative to the parent
    pub transform: Mat4,

    pub attributes: Vec<NodeAttribute<MemoryMesh>>,
    pub children: Vec<MemoryNode>,
}

impl MemoryNode {
    /// Create an empty node with an identity transform.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Mat4::IDENTITY,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_attribute(mut self, attribute: NodeAttribute<MemoryMesh>) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_mesh(self, mesh: MemoryMesh) -> Self {
        self.with_attribute(NodeAttribute::Mesh(mesh))
    }

    pub fn with_child(mut self, child: MemoryNode) -> Self {
        self.children.push(child);
        self
    }
}

impl Drop for MemoryNode {
    /// Tear down descendants iteratively; the derived drop would recurse
    /// once per level.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

impl<'a> SceneNode for &'a MemoryNode {
    type Mesh = &'a MemoryMesh;

    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn local_transform(&self) -> Mat4 {
        self.transform
    }

    fn child_count(&self) -> usize {
        self.children.len()
    }

    fn child(&self, index: usize) -> Option<Self> {
        let node: &'a MemoryNode = *self;
        node.children.get(index)
    }

    fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    fn attribute(&self, index: usize) -> Option<NodeAttribute<Self::Mesh>> {
        let node: &'a MemoryNode = *self;
        node.attributes.get(index).map(NodeAttribute::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::MappingMode;

    #[test]
    fn test_capture_copies_geometry_and_layers() {
        let mesh = MemoryMesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y])
            .with_polygon(&[0, 1, 2])
            .with_uvs(LayerElement::direct(
                MappingMode::ByPolygonVertex,
                vec![Vec2::ZERO, Vec2::X, Vec2::Y],
            ));

        let captured = MemoryMesh::capture(&mesh);
        assert_eq!(captured, mesh);
    }

    #[test]
    fn test_snapshot_borrows_memory_meshes() {
        let mesh = MemoryMesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y]).with_polygon(&[0, 1, 2]);

        assert!(matches!(mesh.snapshot(), Cow::Borrowed(_)));
        assert!(matches!((&mesh).snapshot(), Cow::Borrowed(_)));
        assert_eq!(*mesh.snapshot(), mesh);
    }

    #[test]
    fn test_polygon_vertex_out_of_range_is_negative() {
        let mesh = MemoryMesh::new(vec![Vec3::ZERO]).with_polygon(&[0]);
        assert_eq!(mesh.polygon_vertex(0, 0), 0);
        assert_eq!(mesh.polygon_vertex(0, 1), -1);
        assert_eq!(mesh.polygon_vertex(3, 0), -1);
        assert_eq!(mesh.polygon_size(3), 0);
    }

    #[test]
    fn test_dropping_deep_chain_does_not_overflow() {
        let mut node = MemoryNode::new("leaf");
        for i in 0..100_000 {
            node = MemoryNode::new(format!("n{i}")).with_child(node);
        }
        drop(node);
    }

    #[test]
    fn test_clone_survives_original_drop() {
        let root = MemoryNode::new("root")
            .with_child(MemoryNode::new("a").with_child(MemoryNode::new("a0")));
        let copy = root.clone();
        drop(root);

        let a = (&copy).child(0).unwrap();
        assert_eq!(a.name(), "a");
        assert_eq!(a.child(0).unwrap().name(), "a0");
    }

    #[test]
    fn test_node_children_and_attributes() {
        let root = MemoryNode::new("root")
            .with_child(MemoryNode::new("a").with_attribute(NodeAttribute::Light))
            .with_child(MemoryNode::new("b"));

        let node = &root;
        assert_eq!(node.child_count(), 2);
        let a = node.child(0).unwrap();
        assert_eq!(a.name(), "a");
        assert_eq!(a.attribute_count(), 1);
        assert_eq!(a.attribute(0), Some(NodeAttribute::Light));
        assert!(node.child(2).is_none());
    }
}
