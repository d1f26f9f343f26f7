//! Example: flatten a hand-built scene without the FBX SDK.
//!
//! Run with: RUST_LOG=debug cargo run --example build_scene

use fbxflat_core::glam::{Mat4, Vec2, Vec3};
use fbxflat_core::{parse_scene, FlattenOptions, LayerElement, MappingMode, MemoryMesh, MemoryNode};

fn main() {
    env_logger::init();

    // A unit quad with per-corner UVs
    let quad = MemoryMesh::new(vec![
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
    ])
    .with_polygon(&[0, 1, 2, 3])
    .with_normals(LayerElement::direct(MappingMode::AllSame, vec![Vec3::Z]))
    .with_uvs(LayerElement::indexed(
        MappingMode::ByPolygonVertex,
        vec![Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y],
        vec![0, 1, 2, 3],
    ));

    let root = MemoryNode::new("root").with_child(
        MemoryNode::new("group")
            .with_transform(Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0)))
            .with_child(MemoryNode::new("floor").with_mesh(quad.clone()))
            .with_child(
                MemoryNode::new("wall")
                    .with_transform(Mat4::from_rotation_x(std::f32::consts::FRAC_PI_2))
                    .with_mesh(quad),
            ),
    );

    let scene = parse_scene(Some(&root), &FlattenOptions::sequential());

    println!("=== Scene ===");
    println!("Meshes: {}", scene.mesh_count());
    println!("Total triangles: {}", scene.triangle_count());

    for mesh in &scene {
        let pos = mesh.transform.transform_point3(Vec3::ZERO);
        println!(
            "  {} - {} vertices, {} triangles, origin at ({:.2}, {:.2}, {:.2})",
            mesh.name,
            mesh.vertex_count(),
            mesh.triangle_count(),
            pos.x,
            pos.y,
            pos.z
        );
        for [a, b, c] in mesh.triangles() {
            println!("       uv {:?} {:?} {:?}", a.uv, b.uv, c.uv);
        }
    }
}
