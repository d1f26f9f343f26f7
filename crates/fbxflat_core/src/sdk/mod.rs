//! FBX document loading.
//!
//! Opening and importing documents is delegated to the Autodesk FBX SDK
//! through a thin C shim (`cpp/fbx_bridge`). The SDK is proprietary, so the
//! bridge is only compiled with the `fbx-sdk` feature; without it
//! [`load_fbx`] still validates the path and then reports
//! [`SdkError::Unavailable`].
//!
//! ## Supported
//!
//! - Node hierarchy with local transforms
//! - Mesh attributes: control points, n-gon polygons, and the first
//!   normal, UV, color and tangent layer
//!
//! ## Not Supported
//!
//! - Animation curves
//! - Skinning and blend shapes
//! - Materials and textures
//! - Writing documents
//!
//! # Example
//!
//! ```ignore
//! use fbxflat_core::{load_fbx, FlattenOptions};
//!
//! let scene = load_fbx("character.fbx", &FlattenOptions::default())?;
//! println!("Loaded {} meshes, {} triangles",
//!     scene.mesh_count(),
//!     scene.triangle_count());
//! ```

mod error;
mod loader;

#[cfg(feature = "fbx-sdk")]
mod bridge;

pub use error::{SdkError, SdkResult};
pub use loader::load_fbx;

#[cfg(feature = "fbx-sdk")]
pub use bridge::{Importer, Manager, MeshRef, NodeRef, Scene};
