//! Attribute layers and index resolution.
//!
//! FBX stores per-vertex attributes (normals, UVs, colors, tangents) in layer
//! elements that sit beside the polygon list rather than inside it. Every
//! element is configured with two independent switches:
//!
//! - a **mapping mode** choosing what a value is keyed by (control point,
//!   polygon corner, polygon, or the whole mesh), and
//! - a **reference mode** choosing whether that key reads the value array
//!   directly or goes through an extra index array first.
//!
//! [`resolve_index`] folds both switches into a single position in the
//! value array. It knows nothing about traversal, so it can be tested on
//! synthetic layers alone.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What a layer value is keyed by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MappingMode {
    /// One value per control point, shared by every polygon touching it
    ByControlPoint,

    /// One value per polygon corner (running corner counter over the mesh)
    ByPolygonVertex,

    /// One value per polygon
    ByPolygon,

    /// A single value for the whole mesh
    AllSame,
}

impl MappingMode {
    /// Map the SDK's `FbxLayerElement::EMappingMode` value.
    ///
    /// Returns `None` for modes that cannot be flattened per corner
    /// (`eNone`, `eByEdge`) and for values outside the enum.
    pub fn from_sdk(value: i32) -> Option<Self> {
        match value {
            1 => Some(Self::ByControlPoint),
            2 => Some(Self::ByPolygonVertex),
            3 => Some(Self::ByPolygon),
            5 => Some(Self::AllSame),
            _ => None,
        }
    }
}

/// How the layer key reaches the value array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceMode {
    /// `values[key]`
    Direct,

    /// `values[index[key]]`
    IndexToDirect,
}

impl ReferenceMode {
    /// Map the SDK's `FbxLayerElement::EReferenceMode` value.
    ///
    /// The legacy `eIndex` mode carries the same data as `eIndexToDirect`.
    pub fn from_sdk(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Direct),
            1 | 2 => Some(Self::IndexToDirect),
            _ => None,
        }
    }
}

/// The attribute channel a layer feeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Normal,
    Uv,
    Color,
    Tangent,
}

impl Channel {
    /// All channels, in vertex record order.
    pub const ALL: [Channel; 4] = [Channel::Normal, Channel::Uv, Channel::Color, Channel::Tangent];

    /// Number of floats per value in this channel.
    pub fn components(self) -> usize {
        match self {
            Channel::Normal => 3,
            Channel::Uv => 2,
            Channel::Color | Channel::Tangent => 4,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::Normal => "normal",
            Channel::Uv => "uv",
            Channel::Color => "color",
            Channel::Tangent => "tangent",
        };
        f.write_str(name)
    }
}

/// Errors raised while resolving a layer lookup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayerError {
    #[error("index array has no entry {key} (length {len})")]
    MissingIndex { key: usize, len: usize },

    #[error("index array entry {key} is negative ({value})")]
    NegativeIndex { key: usize, value: i32 },

    #[error("value {index} out of bounds (value array length {len})")]
    OutOfBounds { index: usize, len: usize },
}

/// Position of one polygon corner within its mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Corner {
    /// Control point referenced by the corner
    pub control_point: usize,

    /// Polygon the corner belongs to
    pub polygon: usize,

    /// Running corner counter across all polygons of the mesh
    pub counter: usize,
}

/// Resolve the value-array position a layer reads for `corner`.
///
/// `index` is only consulted for [`ReferenceMode::IndexToDirect`];
/// `value_count` is the length of the value array and bounds the result.
pub fn resolve_index(
    mapping: MappingMode,
    reference: ReferenceMode,
    index: &[i32],
    value_count: usize,
    corner: Corner,
) -> Result<usize, LayerError> {
    let key = match mapping {
        MappingMode::ByControlPoint => corner.control_point,
        MappingMode::ByPolygonVertex => corner.counter,
        MappingMode::ByPolygon => corner.polygon,
        MappingMode::AllSame => 0,
    };

    let resolved = match reference {
        ReferenceMode::Direct => key,
        ReferenceMode::IndexToDirect => {
            let value = *index.get(key).ok_or(LayerError::MissingIndex {
                key,
                len: index.len(),
            })?;
            usize::try_from(value).map_err(|_| LayerError::NegativeIndex { key, value })?
        }
    };

    if resolved >= value_count {
        return Err(LayerError::OutOfBounds {
            index: resolved,
            len: value_count,
        });
    }

    Ok(resolved)
}

/// One attribute layer of a mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerElement<T> {
    pub mapping: MappingMode,
    pub reference: ReferenceMode,

    /// Value array
    pub direct: Vec<T>,

    /// Index array (empty unless `reference` is `IndexToDirect`)
    pub index: Vec<i32>,
}

impl<T: Copy> LayerElement<T> {
    /// Layer read straight from its value array.
    pub fn direct(mapping: MappingMode, direct: Vec<T>) -> Self {
        Self {
            mapping,
            reference: ReferenceMode::Direct,
            direct,
            index: Vec::new(),
        }
    }

    /// Layer read through an index array.
    pub fn indexed(mapping: MappingMode, direct: Vec<T>, index: Vec<i32>) -> Self {
        Self {
            mapping,
            reference: ReferenceMode::IndexToDirect,
            direct,
            index,
        }
    }

    /// Read the value for `corner`.
    pub fn resolve(&self, corner: Corner) -> Result<T, LayerError> {
        let at = resolve_index(
            self.mapping,
            self.reference,
            &self.index,
            self.direct.len(),
            corner,
        )?;
        Ok(self.direct[at])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corner(control_point: usize, polygon: usize, counter: usize) -> Corner {
        Corner {
            control_point,
            polygon,
            counter,
        }
    }

    #[test]
    fn test_by_control_point_direct() {
        let at = resolve_index(
            MappingMode::ByControlPoint,
            ReferenceMode::Direct,
            &[],
            4,
            corner(2, 0, 7),
        );
        assert_eq!(at, Ok(2));
    }

    #[test]
    fn test_by_control_point_index_to_direct() {
        let index = [3, 2, 1, 0];
        let at = resolve_index(
            MappingMode::ByControlPoint,
            ReferenceMode::IndexToDirect,
            &index,
            4,
            corner(1, 0, 9),
        );
        assert_eq!(at, Ok(2));
    }

    #[test]
    fn test_by_polygon_vertex_direct() {
        let at = resolve_index(
            MappingMode::ByPolygonVertex,
            ReferenceMode::Direct,
            &[],
            8,
            corner(0, 1, 5),
        );
        assert_eq!(at, Ok(5));
    }

    #[test]
    fn test_by_polygon_vertex_index_to_direct() {
        let index = [0, 0, 1, 1, 2, 2];
        let at = resolve_index(
            MappingMode::ByPolygonVertex,
            ReferenceMode::IndexToDirect,
            &index,
            3,
            corner(9, 1, 4),
        );
        assert_eq!(at, Ok(2));
    }

    #[test]
    fn test_by_polygon_and_all_same() {
        let by_polygon = resolve_index(
            MappingMode::ByPolygon,
            ReferenceMode::Direct,
            &[],
            3,
            corner(5, 2, 11),
        );
        assert_eq!(by_polygon, Ok(2));

        let all_same = resolve_index(
            MappingMode::AllSame,
            ReferenceMode::Direct,
            &[],
            1,
            corner(5, 2, 11),
        );
        assert_eq!(all_same, Ok(0));
    }

    #[test]
    fn test_index_out_of_bounds() {
        let err = resolve_index(
            MappingMode::ByPolygonVertex,
            ReferenceMode::IndexToDirect,
            &[0, 7],
            3,
            corner(0, 0, 1),
        );
        assert_eq!(err, Err(LayerError::OutOfBounds { index: 7, len: 3 }));
    }

    #[test]
    fn test_missing_and_negative_index() {
        let missing = resolve_index(
            MappingMode::ByPolygonVertex,
            ReferenceMode::IndexToDirect,
            &[0],
            3,
            corner(0, 0, 4),
        );
        assert_eq!(missing, Err(LayerError::MissingIndex { key: 4, len: 1 }));

        let negative = resolve_index(
            MappingMode::ByControlPoint,
            ReferenceMode::IndexToDirect,
            &[-1],
            3,
            corner(0, 0, 0),
        );
        assert_eq!(negative, Err(LayerError::NegativeIndex { key: 0, value: -1 }));
    }

    #[test]
    fn test_direct_out_of_bounds() {
        let err = resolve_index(
            MappingMode::ByControlPoint,
            ReferenceMode::Direct,
            &[],
            2,
            corner(2, 0, 0),
        );
        assert_eq!(err, Err(LayerError::OutOfBounds { index: 2, len: 2 }));
    }

    #[test]
    fn test_layer_element_resolve() {
        let layer = LayerElement::indexed(MappingMode::ByPolygonVertex, vec![10.0f32, 20.0], vec![1, 0, 1]);
        assert_eq!(layer.resolve(corner(0, 0, 0)), Ok(20.0));
        assert_eq!(layer.resolve(corner(0, 0, 1)), Ok(10.0));
        assert!(layer.resolve(corner(0, 0, 3)).is_err());
    }

    #[test]
    fn test_sdk_mode_mapping() {
        assert_eq!(MappingMode::from_sdk(1), Some(MappingMode::ByControlPoint));
        assert_eq!(MappingMode::from_sdk(2), Some(MappingMode::ByPolygonVertex));
        assert_eq!(MappingMode::from_sdk(4), None); // eByEdge
        assert_eq!(ReferenceMode::from_sdk(1), Some(ReferenceMode::IndexToDirect));
        assert_eq!(ReferenceMode::from_sdk(2), Some(ReferenceMode::IndexToDirect));
        assert_eq!(ReferenceMode::from_sdk(9), None);
    }
}
