//! FBX SDK bridge - Rust FFI wrapper.
//!
//! Safe bindings to the Autodesk FBX SDK through the `fbx_bridge` C shim
//! (`cpp/fbx_bridge`). Every SDK object is wrapped in an owner that
//! destroys it on drop, and borrowed handles carry the lifetime of the
//! object they were fetched from:
//!
//! - [`Manager`] owns the SDK memory arena and its IO settings;
//! - [`Importer`] and [`Scene`] borrow the manager that created them;
//! - [`NodeRef`] and [`MeshRef`] borrow the scene they live in.
//!
//! # Example
//!
//! ```ignore
//! use fbxflat_core::sdk::Manager;
//! use fbxflat_core::FlattenOptions;
//!
//! let manager = Manager::new()?;
//! let mut importer = manager.create_importer()?;
//! importer.initialize("model.fbx")?;
//! let mut scene = manager.create_scene("model")?;
//! importer.import(&mut scene)?;
//! let parsed = scene.parse(&FlattenOptions::default());
//! ```

use std::borrow::Cow;
use std::ffi::{c_char, c_int, CStr, CString};
use std::marker::PhantomData;
use std::ptr::NonNull;

use glam::{DMat4, Mat4, Vec2, Vec3, Vec4};

use crate::document::{AttributeKind, MeshSource, NodeAttribute, SceneNode};
use crate::layer::{Channel, LayerElement, MappingMode, ReferenceMode};
use crate::scene::{parse_scene, FlattenOptions, ParsedScene};

use super::error::{status_message, SdkError, SdkResult};

// ============================================================================
// FFI Declarations
// ============================================================================

/// Opaque `FbxManager`
#[repr(C)]
struct FbxManagerRaw {
    _private: [u8; 0],
}

/// Opaque `FbxImporter`
#[repr(C)]
struct FbxImporterRaw {
    _private: [u8; 0],
}

/// Opaque `FbxScene`
#[repr(C)]
struct FbxSceneRaw {
    _private: [u8; 0],
}

/// Opaque `FbxNode`
#[repr(C)]
struct FbxNodeRaw {
    _private: [u8; 0],
}

/// Opaque `FbxNodeAttribute`
#[repr(C)]
struct FbxAttributeRaw {
    _private: [u8; 0],
}

/// Opaque `FbxMesh`
#[repr(C)]
struct FbxMeshRaw {
    _private: [u8; 0],
}

/// Layer element description (matches `FbxBridgeLayerInfo`)
#[repr(C)]
#[derive(Default)]
struct FbxBridgeLayerInfoRaw {
    mapping: c_int,
    reference: c_int,
    direct_count: c_int,
    index_count: c_int,
}

#[link(name = "fbx_bridge")]
extern "C" {
    fn fbx_bridge_manager_create() -> *mut FbxManagerRaw;
    fn fbx_bridge_manager_create_io_settings(manager: *mut FbxManagerRaw);
    fn fbx_bridge_manager_destroy(manager: *mut FbxManagerRaw);

    fn fbx_bridge_importer_create(manager: *mut FbxManagerRaw) -> *mut FbxImporterRaw;
    fn fbx_bridge_importer_initialize(
        importer: *mut FbxImporterRaw,
        filename: *const c_char,
        manager: *mut FbxManagerRaw,
    ) -> bool;
    fn fbx_bridge_importer_error_string(importer: *const FbxImporterRaw) -> *const c_char;
    fn fbx_bridge_importer_import(importer: *mut FbxImporterRaw, scene: *mut FbxSceneRaw) -> bool;
    fn fbx_bridge_importer_destroy(importer: *mut FbxImporterRaw);

    fn fbx_bridge_scene_create(
        manager: *mut FbxManagerRaw,
        name: *const c_char,
    ) -> *mut FbxSceneRaw;
    fn fbx_bridge_scene_destroy(scene: *mut FbxSceneRaw);
    fn fbx_bridge_scene_root_node(scene: *const FbxSceneRaw) -> *mut FbxNodeRaw;

    fn fbx_bridge_node_name(node: *const FbxNodeRaw) -> *const c_char;
    fn fbx_bridge_node_local_transform(node: *const FbxNodeRaw, out_matrix: *mut f64);
    fn fbx_bridge_node_child_count(node: *const FbxNodeRaw) -> c_int;
    fn fbx_bridge_node_child(node: *const FbxNodeRaw, index: c_int) -> *mut FbxNodeRaw;
    fn fbx_bridge_node_attribute_count(node: *const FbxNodeRaw) -> c_int;
    fn fbx_bridge_node_attribute(node: *const FbxNodeRaw, index: c_int) -> *mut FbxAttributeRaw;

    fn fbx_bridge_attribute_type(attribute: *const FbxAttributeRaw) -> c_int;
    fn fbx_bridge_attribute_as_mesh(attribute: *mut FbxAttributeRaw) -> *mut FbxMeshRaw;

    fn fbx_bridge_mesh_control_point_count(mesh: *const FbxMeshRaw) -> c_int;
    fn fbx_bridge_mesh_control_points(mesh: *const FbxMeshRaw, out_points: *mut f32);
    fn fbx_bridge_mesh_polygon_count(mesh: *const FbxMeshRaw) -> c_int;
    fn fbx_bridge_mesh_polygon_size(mesh: *const FbxMeshRaw, polygon: c_int) -> c_int;
    fn fbx_bridge_mesh_polygon_vertex(
        mesh: *const FbxMeshRaw,
        polygon: c_int,
        corner: c_int,
    ) -> c_int;
    fn fbx_bridge_mesh_layer_info(
        mesh: *const FbxMeshRaw,
        channel: c_int,
        out_info: *mut FbxBridgeLayerInfoRaw,
    ) -> bool;
    fn fbx_bridge_mesh_layer_data(
        mesh: *const FbxMeshRaw,
        channel: c_int,
        out_direct: *mut f32,
        out_index: *mut c_int,
    );
}

/// Channel ids understood by the shim (`FBX_BRIDGE_CHANNEL_*`).
fn channel_id(channel: Channel) -> c_int {
    match channel {
        Channel::Normal => 0,
        Channel::Uv => 1,
        Channel::Color => 2,
        Channel::Tangent => 3,
    }
}

/// SDK counts are `int`; treat negatives as zero.
fn count(value: c_int) -> usize {
    usize::try_from(value).unwrap_or(0)
}

/// Convert a Rust index to the SDK's `int`, clamping past `c_int::MAX`.
fn sdk_index(index: usize) -> c_int {
    c_int::try_from(index).unwrap_or(c_int::MAX)
}

// ============================================================================
// Manager
// ============================================================================

/// The SDK's memory manager. Everything else is created through it.
///
/// Destroying the manager destroys every object it still owns, so the
/// borrowed types below cannot outlive it.
pub struct Manager {
    raw: NonNull<FbxManagerRaw>,
}

impl Manager {
    /// Create a manager with default IO settings.
    pub fn new() -> SdkResult<Self> {
        let raw = NonNull::new(unsafe { fbx_bridge_manager_create() })
            .ok_or(SdkError::ManagerCreation)?;

        unsafe { fbx_bridge_manager_create_io_settings(raw.as_ptr()) };

        Ok(Self { raw })
    }

    /// Create an importer bound to this manager.
    pub fn create_importer(&self) -> SdkResult<Importer<'_>> {
        let raw = NonNull::new(unsafe { fbx_bridge_importer_create(self.raw.as_ptr()) })
            .ok_or(SdkError::ImporterCreation)?;

        Ok(Importer { raw, manager: self })
    }

    /// Create an empty scene to import into.
    pub fn create_scene(&self, name: &str) -> SdkResult<Scene<'_>> {
        let c_name = CString::new(name).map_err(|_| SdkError::SceneCreation(name.to_string()))?;

        let raw = NonNull::new(unsafe { fbx_bridge_scene_create(self.raw.as_ptr(), c_name.as_ptr()) })
            .ok_or_else(|| SdkError::SceneCreation(name.to_string()))?;

        Ok(Scene {
            raw,
            _manager: PhantomData,
        })
    }
}

impl Drop for Manager {
    fn drop(&mut self) {
        unsafe { fbx_bridge_manager_destroy(self.raw.as_ptr()) };
    }
}

// ============================================================================
// Importer
// ============================================================================

/// Reads a document from disk into a [`Scene`].
pub struct Importer<'m> {
    raw: NonNull<FbxImporterRaw>,
    manager: &'m Manager,
}

impl Importer<'_> {
    /// Open `path` and read its header.
    ///
    /// On failure the SDK's status text is returned in the error.
    pub fn initialize(&mut self, path: &str) -> SdkResult<()> {
        let c_path = CString::new(path).map_err(|_| SdkError::InvalidPath)?;

        let ok = unsafe {
            fbx_bridge_importer_initialize(
                self.raw.as_ptr(),
                c_path.as_ptr(),
                self.manager.raw.as_ptr(),
            )
        };

        if !ok {
            return Err(SdkError::Initialize(status_message(self.error_string())));
        }

        Ok(())
    }

    /// Last status text reported by the SDK.
    pub fn error_string(&self) -> String {
        unsafe {
            let ptr = fbx_bridge_importer_error_string(self.raw.as_ptr());
            if ptr.is_null() {
                String::new()
            } else {
                CStr::from_ptr(ptr).to_string_lossy().into_owned()
            }
        }
    }

    /// Populate `scene` from the initialized document.
    pub fn import(&mut self, scene: &mut Scene<'_>) -> SdkResult<()> {
        let ok = unsafe { fbx_bridge_importer_import(self.raw.as_ptr(), scene.raw.as_ptr()) };

        if !ok {
            return Err(SdkError::Import(status_message(self.error_string())));
        }

        Ok(())
    }
}

impl Drop for Importer<'_> {
    fn drop(&mut self) {
        unsafe { fbx_bridge_importer_destroy(self.raw.as_ptr()) };
    }
}

// ============================================================================
// Scene
// ============================================================================

/// An imported scene.
pub struct Scene<'m> {
    raw: NonNull<FbxSceneRaw>,
    _manager: PhantomData<&'m Manager>,
}

impl Scene<'_> {
    /// Root of the node hierarchy, if the scene has one.
    pub fn root_node(&self) -> Option<NodeRef<'_>> {
        let raw = NonNull::new(unsafe { fbx_bridge_scene_root_node(self.raw.as_ptr()) })?;
        Some(NodeRef {
            raw,
            _scene: PhantomData,
        })
    }

    /// Flatten every mesh in the scene.
    pub fn parse(&self, options: &FlattenOptions) -> ParsedScene {
        parse_scene(self.root_node(), options)
    }
}

impl Drop for Scene<'_> {
    fn drop(&mut self) {
        unsafe { fbx_bridge_scene_destroy(self.raw.as_ptr()) };
    }
}

// ============================================================================
// Nodes
// ============================================================================

/// A node inside a [`Scene`].
#[derive(Clone, Copy)]
pub struct NodeRef<'s> {
    raw: NonNull<FbxNodeRaw>,
    _scene: PhantomData<&'s FbxSceneRaw>,
}

impl<'s> SceneNode for NodeRef<'s> {
    type Mesh = MeshRef<'s>;

    fn name(&self) -> Cow<'_, str> {
        unsafe {
            let ptr = fbx_bridge_node_name(self.raw.as_ptr());
            if ptr.is_null() {
                Cow::Borrowed("")
            } else {
                CStr::from_ptr(ptr).to_string_lossy()
            }
        }
    }

    fn local_transform(&self) -> Mat4 {
        // FbxAMatrix rows are glam columns (translation in the last four).
        let mut matrix = [0.0f64; 16];
        unsafe { fbx_bridge_node_local_transform(self.raw.as_ptr(), matrix.as_mut_ptr()) };
        DMat4::from_cols_array(&matrix).as_mat4()
    }

    fn child_count(&self) -> usize {
        count(unsafe { fbx_bridge_node_child_count(self.raw.as_ptr()) })
    }

    fn child(&self, index: usize) -> Option<Self> {
        let raw = NonNull::new(unsafe {
            fbx_bridge_node_child(self.raw.as_ptr(), sdk_index(index))
        })?;
        Some(NodeRef {
            raw,
            _scene: PhantomData,
        })
    }

    fn attribute_count(&self) -> usize {
        count(unsafe { fbx_bridge_node_attribute_count(self.raw.as_ptr()) })
    }

    fn attribute(&self, index: usize) -> Option<NodeAttribute<Self::Mesh>> {
        let raw = unsafe { fbx_bridge_node_attribute(self.raw.as_ptr(), sdk_index(index)) };
        if raw.is_null() {
            return None;
        }

        let kind = AttributeKind::from_sdk_type(unsafe { fbx_bridge_attribute_type(raw) });
        let attribute = match kind {
            AttributeKind::Mesh => {
                let mesh = NonNull::new(unsafe { fbx_bridge_attribute_as_mesh(raw) })?;
                NodeAttribute::Mesh(MeshRef {
                    raw: mesh,
                    _scene: PhantomData,
                })
            }
            AttributeKind::Light => NodeAttribute::Light,
            AttributeKind::Camera => NodeAttribute::Camera,
            AttributeKind::Skeleton => NodeAttribute::Skeleton,
            AttributeKind::Null => NodeAttribute::Null,
            AttributeKind::Marker => NodeAttribute::Marker,
            AttributeKind::Other(code) => NodeAttribute::Other(code),
        };

        Some(attribute)
    }
}

// ============================================================================
// Meshes
// ============================================================================

/// A mesh attribute inside a [`Scene`].
#[derive(Clone, Copy)]
pub struct MeshRef<'s> {
    raw: NonNull<FbxMeshRaw>,
    _scene: PhantomData<&'s FbxSceneRaw>,
}

impl MeshRef<'_> {
    /// Copy one layer element out of the SDK.
    ///
    /// Layers whose mapping or reference mode cannot be expressed per
    /// corner are dropped with a warning.
    fn read_layer<T>(&self, channel: Channel, convert: impl Fn(&[f32]) -> T) -> Option<LayerElement<T>> {
        let id = channel_id(channel);
        let mut info = FbxBridgeLayerInfoRaw::default();

        let present = unsafe { fbx_bridge_mesh_layer_info(self.raw.as_ptr(), id, &mut info) };
        if !present {
            return None;
        }

        let Some(mapping) = MappingMode::from_sdk(info.mapping) else {
            log::warn!("Ignoring {} layer with unsupported mapping mode {}", channel, info.mapping);
            return None;
        };
        let Some(reference) = ReferenceMode::from_sdk(info.reference) else {
            log::warn!("Ignoring {} layer with unsupported reference mode {}", channel, info.reference);
            return None;
        };

        let components = channel.components();
        let mut direct = vec![0.0f32; count(info.direct_count) * components];
        let mut index = vec![0 as c_int; count(info.index_count)];

        unsafe {
            fbx_bridge_mesh_layer_data(self.raw.as_ptr(), id, direct.as_mut_ptr(), index.as_mut_ptr())
        };

        Some(LayerElement {
            mapping,
            reference,
            direct: direct.chunks_exact(components).map(convert).collect(),
            index,
        })
    }
}

impl MeshSource for MeshRef<'_> {
    fn control_points(&self) -> Cow<'_, [Vec3]> {
        let point_count = count(unsafe { fbx_bridge_mesh_control_point_count(self.raw.as_ptr()) });
        let mut flat = vec![0.0f32; point_count * 3];

        unsafe { fbx_bridge_mesh_control_points(self.raw.as_ptr(), flat.as_mut_ptr()) };

        Cow::Owned(flat.chunks_exact(3).map(Vec3::from_slice).collect())
    }

    fn polygon_count(&self) -> usize {
        count(unsafe { fbx_bridge_mesh_polygon_count(self.raw.as_ptr()) })
    }

    fn polygon_size(&self, polygon: usize) -> usize {
        count(unsafe { fbx_bridge_mesh_polygon_size(self.raw.as_ptr(), sdk_index(polygon)) })
    }

    fn polygon_vertex(&self, polygon: usize, corner: usize) -> i32 {
        unsafe {
            fbx_bridge_mesh_polygon_vertex(self.raw.as_ptr(), sdk_index(polygon), sdk_index(corner))
        }
    }

    fn normal_layer(&self) -> Option<Cow<'_, LayerElement<Vec3>>> {
        self.read_layer(Channel::Normal, Vec3::from_slice).map(Cow::Owned)
    }

    fn uv_layer(&self) -> Option<Cow<'_, LayerElement<Vec2>>> {
        self.read_layer(Channel::Uv, Vec2::from_slice).map(Cow::Owned)
    }

    fn color_layer(&self) -> Option<Cow<'_, LayerElement<Vec4>>> {
        self.read_layer(Channel::Color, Vec4::from_slice).map(Cow::Owned)
    }

    fn tangent_layer(&self) -> Option<Cow<'_, LayerElement<Vec4>>> {
        self.read_layer(Channel::Tangent, Vec4::from_slice).map(Cow::Owned)
    }
}

// ============================================================================
// Tests
// ============================================================================
