//! Build script for fbxflat_core.
//!
//! With the `fbx-sdk` feature, compiles the FBX C shim via CMake and links
//! it together with the Autodesk FBX SDK. Without the feature nothing is
//! built and the crate links no native code.
//! Uses caching to avoid rebuilding when source files haven't changed.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=FBX_SDK_DIR");

    if env::var_os("CARGO_FEATURE_FBX_SDK").is_none() {
        return;
    }

    // Paths
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let workspace_root = Path::new(&manifest_dir).parent().unwrap().parent().unwrap();
    let cpp_dir = workspace_root.join("cpp").join("fbx_bridge");
    let out_dir = env::var("OUT_DIR").unwrap();
    let build_dir = Path::new(&out_dir).join("fbx_bridge_build");

    let sdk_dir = env::var("FBX_SDK_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| panic!("FBX_SDK_DIR must point at the FBX SDK install when `fbx-sdk` is enabled"));

    // Output library path
    let lib_dir = if cfg!(windows) {
        build_dir.join("Release")
    } else {
        build_dir.clone()
    };
    let lib_path = if cfg!(windows) {
        lib_dir.join("fbx_bridge.lib")
    } else {
        lib_dir.join("libfbx_bridge.a")
    };

    // Source files to track for changes
    let source_files = vec![
        cpp_dir.join("fbx_bridge.cpp"),
        cpp_dir.join("fbx_bridge.h"),
        cpp_dir.join("CMakeLists.txt"),
    ];

    for src in &source_files {
        println!("cargo:rerun-if-changed={}", src.display());
    }

    if needs_cmake_rebuild(&lib_path, &source_files) {
        println!("cargo:warning=Building FBX bridge via CMake...");
        build_fbx_bridge(&cpp_dir, &build_dir, &sdk_dir);
    }

    // Link the FBX bridge library
    println!("cargo:rustc-link-search=native={}", lib_dir.display());
    println!("cargo:rustc-link-lib=static=fbx_bridge");

    // Link the SDK itself (release libraries, x64)
    let sdk_lib_dir = if cfg!(windows) {
        sdk_dir.join("lib").join("x64").join("release")
    } else if cfg!(target_os = "macos") {
        sdk_dir.join("lib").join("clang").join("release")
    } else {
        sdk_dir.join("lib").join("release")
    };
    println!("cargo:rustc-link-search=native={}", sdk_lib_dir.display());

    if cfg!(windows) {
        println!("cargo:rustc-link-lib=libfbxsdk-md");
        println!("cargo:rustc-link-lib=libxml2-md");
        println!("cargo:rustc-link-lib=zlib-md");
        println!("cargo:rustc-link-lib=advapi32");
    } else {
        println!("cargo:rustc-link-lib=fbxsdk");
        println!("cargo:rustc-link-lib=xml2");
        println!("cargo:rustc-link-lib=z");
        if cfg!(target_os = "macos") {
            println!("cargo:rustc-link-lib=c++");
            println!("cargo:rustc-link-lib=framework=CoreFoundation");
        } else {
            println!("cargo:rustc-link-lib=stdc++");
        }
    }
}

/// Check if CMake rebuild is needed by comparing timestamps.
fn needs_cmake_rebuild(lib_path: &Path, source_files: &[PathBuf]) -> bool {
    // If library doesn't exist, need to build
    let lib_mtime = match fs::metadata(lib_path).and_then(|meta| meta.modified()) {
        Ok(time) => time,
        Err(_) => return true,
    };

    // Check if any source file is newer than the library
    source_files.iter().any(|src| {
        fs::metadata(src)
            .and_then(|meta| meta.modified())
            .map(|src_mtime| src_mtime > lib_mtime)
            .unwrap_or(false)
    })
}

/// Build the FBX bridge using CMake.
fn build_fbx_bridge(cpp_dir: &Path, build_dir: &Path, sdk_dir: &Path) {
    fs::create_dir_all(build_dir).expect("Failed to create build directory");

    let mut configure = Command::new("cmake");
    configure.current_dir(build_dir).args([
        "-S",
        cpp_dir.to_str().unwrap(),
        "-B",
        ".",
        &format!("-DFBX_SDK_DIR={}", sdk_dir.display()),
        "-DCMAKE_BUILD_TYPE=Release",
    ]);
    if cfg!(windows) {
        configure.args(["-G", "Visual Studio 17 2022", "-A", "x64"]);
    }

    let configure_status = configure.status().expect("Failed to run cmake configure");
    if !configure_status.success() {
        panic!("CMake configure failed");
    }

    let build_status = Command::new("cmake")
        .current_dir(build_dir)
        .args(["--build", ".", "--config", "Release", "--parallel"])
        .status()
        .expect("Failed to run cmake build");

    if !build_status.success() {
        panic!("CMake build failed");
    }
}
