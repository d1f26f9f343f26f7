//! fbxflat core - FBX scene flattening for real-time renderers.
//!
//! This crate provides:
//!
//! - **Flattening**: walks a scene hierarchy and turns every mesh into a
//!   triangle list of fixed-layout vertices (`ParsedScene`, `ParsedMesh`,
//!   `ParsedVertex`)
//! - **Layer resolution**: the mapping/reference mode lookups FBX uses for
//!   normals, UVs, colors and tangents
//! - **FBX SDK bridge**: document loading through the Autodesk SDK
//!   (`fbx-sdk` feature)
//!
//! # Example
//!
//! ```ignore
//! use fbxflat_core::{load_fbx, FlattenOptions};
//!
//! let scene = load_fbx("scene.fbx", &FlattenOptions::default())?;
//! for mesh in &scene {
//!     println!("{}: {} triangles", mesh.name, mesh.triangle_count());
//! }
//! ```

pub mod document;
pub mod flatten;
pub mod layer;
pub mod memory;
pub mod mesh;
pub mod scene;
pub mod sdk;

// Re-export commonly used types
pub use document::{AttributeKind, MeshSource, NodeAttribute, SceneNode};
pub use flatten::{flatten_mesh, MeshError};
pub use layer::{Channel, LayerElement, LayerError, MappingMode, ReferenceMode};
pub use memory::{MemoryMesh, MemoryNode};
pub use mesh::{Bounds, ParsedMesh, ParsedVertex};
pub use scene::{parse_scene, FlattenOptions, ParsedScene};
pub use sdk::{load_fbx, SdkError, SdkResult};

pub use glam;
