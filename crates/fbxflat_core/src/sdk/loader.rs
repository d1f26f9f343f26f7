//! High-level FBX loading.

use std::path::Path;

use crate::scene::{FlattenOptions, ParsedScene};

use super::error::{SdkError, SdkResult};

/// Load an FBX file and flatten all of its meshes.
///
/// Document-level failures (missing file, importer initialization or import
/// errors) abort the load; malformed meshes are skipped and logged.
///
/// # Example
///
/// ```ignore
/// use fbxflat_core::{load_fbx, FlattenOptions};
///
/// let scene = load_fbx("scene.fbx", &FlattenOptions::default())?;
/// println!("Loaded {} meshes", scene.mesh_count());
/// ```
pub fn load_fbx<P: AsRef<Path>>(path: P, options: &FlattenOptions) -> SdkResult<ParsedScene> {
    let path = path.as_ref();

    // The SDK resolves relative paths against its own working directory
    let abs_path = std::fs::canonicalize(path)
        .map_err(|_| SdkError::FileNotFound(path.display().to_string()))?;
    if !abs_path.is_file() {
        return Err(SdkError::FileNotFound(path.display().to_string()));
    }

    let path_str = abs_path.to_str().ok_or(SdkError::InvalidPath)?;
    // Remove Windows extended path prefix if present (\\?\)
    let path_str = path_str.strip_prefix(r"\\?\").unwrap_or(path_str);

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed");

    log::info!("Loading FBX file: {}", path_str);
    import_scene(path_str, name, options)
}

#[cfg(feature = "fbx-sdk")]
fn import_scene(path: &str, name: &str, options: &FlattenOptions) -> SdkResult<ParsedScene> {
    use super::bridge::Manager;

    let manager = Manager::new()?;
    let mut importer = manager.create_importer()?;
    importer.initialize(path)?;

    let mut scene = manager.create_scene(name)?;
    importer.import(&mut scene)?;
    drop(importer);

    let mut parsed = scene.parse(options);
    parsed.name = name.to_string();
    Ok(parsed)
}

#[cfg(not(feature = "fbx-sdk"))]
fn import_scene(_path: &str, _name: &str, _options: &FlattenOptions) -> SdkResult<ParsedScene> {
    Err(SdkError::Unavailable)
}
