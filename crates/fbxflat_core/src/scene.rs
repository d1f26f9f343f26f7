//! Scene flattening.
//!
//! [`parse_scene`] walks a node hierarchy depth-first, picks out every mesh
//! attribute, flattens each one and gathers the results into a
//! [`ParsedScene`] in visitation order.
//!
//! Meshes that fail to flatten are logged and left out; the rest of the
//! scene is still returned.

use std::borrow::Cow;

use glam::Mat4;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::document::{MeshSource, NodeAttribute, SceneNode};
use crate::flatten::flatten_mesh;
use crate::memory::MemoryMesh;
use crate::mesh::ParsedMesh;

/// Knobs for [`parse_scene`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlattenOptions {
    /// Flatten meshes on the rayon thread pool.
    ///
    /// Meshes that are not already in memory (SDK handles) are copied into
    /// a [`MemoryMesh`] first, which costs one extra pass over their data.
    pub parallel: bool,

    /// Minimum number of meshes before going parallel
    pub parallel_threshold: usize,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            parallel_threshold: 4,
        }
    }
}

impl FlattenOptions {
    /// Options that keep all work on the calling thread.
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Default::default()
        }
    }
}

/// All flattened meshes of a scene, in depth-first visitation order.
///
/// A snapshot: nothing in it refers back to the document it came from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedScene {
    /// Scene name (usually from filename)
    pub name: String,

    pub meshes: Vec<ParsedMesh>,
}

impl ParsedScene {
    /// Create an empty scene.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            meshes: Vec::new(),
        }
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Total vertex count across all meshes.
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(ParsedMesh::vertex_count).sum()
    }

    /// Total triangle count across all meshes.
    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(ParsedMesh::triangle_count).sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ParsedMesh> {
        self.meshes.iter()
    }
}

impl<'a> IntoIterator for &'a ParsedScene {
    type Item = &'a ParsedMesh;
    type IntoIter = std::slice::Iter<'a, ParsedMesh>;

    fn into_iter(self) -> Self::IntoIter {
        self.meshes.iter()
    }
}

/// A mesh found during the walk, waiting to be flattened.
struct MeshJob<M> {
    node: String,
    transform: Mat4,
    mesh: M,
}

/// Flatten every mesh reachable from `root`.
///
/// The root's own attributes are not inspected; the walk starts at its
/// children. Missing roots, childless roots and nodes without meshes all
/// just contribute nothing.
pub fn parse_scene<N: SceneNode>(root: Option<N>, options: &FlattenOptions) -> ParsedScene {
    let mut scene = ParsedScene::default();

    let Some(root) = root else {
        log::debug!("Scene has no root node");
        return scene;
    };

    let jobs = collect_meshes(&root);
    let found = jobs.len();

    scene.meshes = flatten_all(jobs, options);

    log::info!(
        "Flattened {} of {} meshes ({} vertices, {} triangles)",
        scene.mesh_count(),
        found,
        scene.vertex_count(),
        scene.triangle_count()
    );

    scene
}

/// Depth-first walk below `root`, children in increasing index order.
///
/// Uses an explicit stack so deep hierarchies cannot exhaust the call stack.
fn collect_meshes<N: SceneNode>(root: &N) -> Vec<MeshJob<N::Mesh>> {
    let mut jobs = Vec::new();
    let mut stack: Vec<(N, Mat4)> = Vec::new();
    let mut visited = 0usize;

    push_children(&mut stack, root, root.local_transform());

    while let Some((node, parent_transform)) = stack.pop() {
        visited += 1;
        let world_transform = parent_transform * node.local_transform();

        dispatch_attributes(&node, world_transform, &mut jobs);
        push_children(&mut stack, &node, world_transform);
    }

    log::debug!("Visited {} nodes, found {} meshes", visited, jobs.len());
    jobs
}

/// Push children in reverse so they pop in index order.
fn push_children<N: SceneNode>(stack: &mut Vec<(N, Mat4)>, node: &N, world_transform: Mat4) {
    for index in (0..node.child_count()).rev() {
        match node.child(index) {
            Some(child) => stack.push((child, world_transform)),
            None => log::warn!("Node '{}' has no child at index {}", node.name(), index),
        }
    }
}

/// Queue the node's mesh attributes; everything else is inert here.
fn dispatch_attributes<N: SceneNode>(
    node: &N,
    world_transform: Mat4,
    jobs: &mut Vec<MeshJob<N::Mesh>>,
) {
    for index in 0..node.attribute_count() {
        let Some(attribute) = node.attribute(index) else {
            log::warn!("Node '{}' has no attribute at index {}", node.name(), index);
            continue;
        };

        match attribute {
            NodeAttribute::Mesh(mesh) => jobs.push(MeshJob {
                node: node.name().into_owned(),
                transform: world_transform,
                mesh,
            }),
            NodeAttribute::Light
            | NodeAttribute::Camera
            | NodeAttribute::Skeleton
            | NodeAttribute::Null
            | NodeAttribute::Marker => {}
            NodeAttribute::Other(code) => {
                log::trace!("Skipping attribute type {} on node '{}'", code, node.name());
            }
        }
    }
}

/// Flatten queued meshes, keeping queue order.
fn flatten_all<M: MeshSource>(jobs: Vec<MeshJob<M>>, options: &FlattenOptions) -> Vec<ParsedMesh> {
    let results: Vec<Option<ParsedMesh>> =
        if options.parallel && jobs.len() >= options.parallel_threshold.max(1) {
            // SDK handles are not Sync; workers only see snapshots.
            let snapshots: Vec<(&str, Mat4, Cow<'_, MemoryMesh>)> = jobs
                .iter()
                .map(|job| (job.node.as_str(), job.transform, job.mesh.snapshot()))
                .collect();
            snapshots
                .par_iter()
                .map(|(node, transform, mesh)| flatten_job(node, *transform, &**mesh))
                .collect()
        } else {
            jobs.iter()
                .map(|job| flatten_job(&job.node, job.transform, &job.mesh))
                .collect()
        };

    results.into_iter().flatten().collect()
}

fn flatten_job<M: MeshSource>(node: &str, transform: Mat4, mesh: &M) -> Option<ParsedMesh> {
    match flatten_mesh(mesh) {
        Ok(mesh) => Some(mesh.named(node).with_transform(transform)),
        Err(err) => {
            log::warn!("Skipping mesh on node '{}': {}", node, err);
            None
        }
    }
}
