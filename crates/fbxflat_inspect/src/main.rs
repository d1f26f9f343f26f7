// Summarize the meshes an FBX file flattens into.
// Run with: cargo run --release --features fbx-sdk --bin fbxflat_inspect -- <file.fbx>

use anyhow::{bail, Context, Result};
use fbxflat_core::{load_fbx, FlattenOptions, ParsedScene};
use std::env;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Parsed command line
#[derive(Debug, PartialEq)]
struct Args {
    input: PathBuf,
    json: Option<PathBuf>,
    sequential: bool,
    verbose: bool,
}

fn usage(program: &str) -> String {
    format!(
        "Usage: {} <file.fbx> [--json <out.json>] [--sequential] [--verbose]",
        program
    )
}

fn parse_args(args: &[String]) -> Result<Args> {
    let program = args.first().map(String::as_str).unwrap_or("fbxflat_inspect");

    let mut input = None;
    let mut json = None;
    let mut sequential = false;
    let mut verbose = false;

    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--json" => {
                let path = rest
                    .next()
                    .with_context(|| format!("--json needs a path\n{}", usage(program)))?;
                json = Some(PathBuf::from(path));
            }
            "--sequential" => sequential = true,
            "--verbose" | "-v" => verbose = true,
            flag if flag.starts_with('-') => bail!("Unknown flag {}\n{}", flag, usage(program)),
            path => {
                if input.is_some() {
                    bail!("Only one input file is supported\n{}", usage(program));
                }
                input = Some(PathBuf::from(path));
            }
        }
    }

    let Some(input) = input else {
        bail!("{}", usage(program));
    };

    Ok(Args {
        input,
        json,
        sequential,
        verbose,
    })
}

fn print_summary(scene: &ParsedScene) {
    println!("\nFound {} mesh(es) in '{}'", scene.mesh_count(), scene.name);

    for (i, mesh) in scene.iter().enumerate() {
        println!("\n=== Mesh {} ===", i);
        println!("Name: {}", mesh.name);
        println!("Vertices: {}", mesh.vertex_count());
        println!("Triangles: {}", mesh.triangle_count());

        let translation = mesh.transform.w_axis;
        println!(
            "Translation: ({:.3}, {:.3}, {:.3})",
            translation.x, translation.y, translation.z
        );

        match mesh.bounds() {
            Some(bounds) => {
                println!("Bounds:");
                println!("  X: [{:.3}, {:.3}]", bounds.min.x, bounds.max.x);
                println!("  Y: [{:.3}, {:.3}]", bounds.min.y, bounds.max.y);
                println!("  Z: [{:.3}, {:.3}]", bounds.min.z, bounds.max.z);
                println!("  Diagonal: {:.3}", bounds.size());
            }
            None => println!("Bounds: empty"),
        }
    }

    println!(
        "\nTotal: {} vertices, {} triangles",
        scene.vertex_count(),
        scene.triangle_count()
    );
}

fn write_json(scene: &ParsedScene, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), scene)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    log::info!("Wrote {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    let raw: Vec<String> = env::args().collect();
    let args = match parse_args(&raw) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(1);
        }
    };

    let level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let options = if args.sequential {
        FlattenOptions::sequential()
    } else {
        FlattenOptions::default()
    };

    println!("Loading FBX: {}", args.input.display());
    let scene = load_fbx(&args.input, &options)
        .with_context(|| format!("Failed to load {}", args.input.display()))?;

    print_summary(&scene);

    if let Some(path) = &args.json {
        write_json(&scene, path)?;
    }

    Ok(())
}
