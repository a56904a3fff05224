//! levelmesh CLI - build level submeshes and inspect the result.

use std::env;
use std::path::Path;
use std::time::Instant;

use anyhow::{bail, Context};
use glam::Vec2;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use levelmesh::prelude::*;

/// Output verbosity selected on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Verbosity {
    Quiet,
    Info,
    Debug,
    Trace,
}

impl Verbosity {
    fn directive(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// `RUST_LOG` wins over the verbosity flags.
fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut verbosity = Verbosity::Info;
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => verbosity = Verbosity::Debug,
            "-vv" | "--trace" => verbosity = Verbosity::Trace,
            "-q" | "--quiet" => verbosity = Verbosity::Quiet,
            "-V" | "--version" => {
                println!(
                    "levelmesh-cli {} (built {})",
                    env!("CARGO_PKG_VERSION"),
                    env!("LEVELMESH_BUILD_DATE")
                );
                return Ok(());
            }
            _ => filtered_args.push(arg),
        }
    }
    init_tracing(verbosity);

    let Some((&command, rest)) = filtered_args.split_first() else {
        print_help();
        return Ok(());
    };

    match command {
        "b" | "build" => cmd_build(rest),
        "d" | "demo" => cmd_demo(rest),
        "h" | "help" | "-h" | "--help" => {
            print_help();
            Ok(())
        }
        other => {
            print_help();
            bail!("unknown command: {other}")
        }
    }
}

fn print_help() {
    println!("levelmesh-cli - level submesh builder");
    println!();
    println!("USAGE:");
    println!("    levelmesh-cli [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    b, build <level.json>         Build the static submesh and print statistics");
    println!("        --config <cfg.json>       Build settings (see MeshConfig)");
    println!("        --start-index <n>         First lightmap page index (default 0)");
    println!("        --json                    Print statistics as JSON");
    println!("    d, demo  [rooms]              Build a generated corridor of rooms (default 8)");
    println!("        --save <level.json>       Also write the generated level");
    println!("    h, help                       Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Show debug output");
    println!("    -vv, --trace     Show trace output (very verbose)");
    println!("    -q, --quiet      Only show errors");
    println!("    -V, --version    Show version and build date");
    println!();
    println!("RUST_LOG overrides the verbosity flags.");
}

/// Value following `flag`, if the flag is present.
fn flag_value<'a>(args: &[&'a str], flag: &str) -> anyhow::Result<Option<&'a str>> {
    match args.iter().position(|a| *a == flag) {
        Some(i) => match args.get(i + 1) {
            Some(value) => Ok(Some(value)),
            None => bail!("{flag} needs a value"),
        },
        None => Ok(None),
    }
}

/// Arguments that are neither flags nor flag values.
fn positional<'a>(args: &[&'a str], value_flags: &[&str]) -> Vec<&'a str> {
    let mut out = Vec::new();
    let mut skip = false;
    for &arg in args {
        if skip {
            skip = false;
        } else if value_flags.contains(&arg) {
            skip = true;
        } else if !arg.starts_with("--") {
            out.push(arg);
        }
    }
    out
}

fn cmd_build(args: &[&str]) -> anyhow::Result<()> {
    let positional = positional(args, &["--config", "--start-index"]);
    let Some(path) = positional.first() else {
        bail!("usage: levelmesh-cli build <level.json> [--config cfg.json] [--start-index n] [--json]");
    };

    let config = match flag_value(args, "--config")? {
        Some(cfg) => MeshConfig::load(cfg).with_context(|| format!("loading config {cfg}"))?,
        None => MeshConfig::default(),
    };
    let start_index = match flag_value(args, "--start-index")? {
        Some(n) => n.parse::<u32>().with_context(|| format!("invalid start index {n}"))?,
        None => 0,
    };

    let level = Level::load(path).with_context(|| format!("loading level {path}"))?;
    debug!("Level loaded: {} sectors, {} sides", level.sectors.len(), level.sides.len());

    let mesh = build(&level, &config, start_index)?;
    report(&mesh, args.contains(&"--json"))
}

fn cmd_demo(args: &[&str]) -> anyhow::Result<()> {
    let positional = positional(args, &["--save"]);
    let rooms = match positional.first() {
        Some(n) => n.parse::<usize>().with_context(|| format!("invalid room count {n}"))?,
        None => 8,
    };
    if rooms == 0 {
        bail!("room count must be at least 1");
    }

    let level = corridor(rooms);
    if let Some(out) = flag_value(args, "--save")? {
        let json = serde_json::to_string_pretty(&level)?;
        std::fs::write(Path::new(out), json).with_context(|| format!("writing {out}"))?;
        info!("Level written to {out}");
    }

    let mesh = build(&level, &MeshConfig::default(), 0)?;
    report(&mesh, args.contains(&"--json"))
}

fn build(level: &Level, config: &MeshConfig, start_index: u32) -> anyhow::Result<LevelSubmesh> {
    let mut pipelines = PipelineCache::new();
    let mut ctx = BuildContext::new(level, &BasicWallProcessor, &BasicFlatProcessor, &mut pipelines, config);

    let start = Instant::now();
    let mesh = LevelSubmesh::new_static(&mut ctx, start_index).context("building static submesh")?;
    info!("Built submesh in {:.2?} ({} pipelines)", start.elapsed(), pipelines.len());
    Ok(mesh)
}

fn report(mesh: &LevelSubmesh, json: bool) -> anyhow::Result<()> {
    let stats = mesh.stats();
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Surfaces:        {}", stats.surfaces);
    println!("Vertices:        {}", stats.vertices);
    println!("Triangles:       {}", stats.triangles);
    println!("Uniform blocks:  {}", stats.uniforms);
    println!("Wall portals:    {}", stats.wall_portals);
    println!("Draw ranges:     {} (+{} sky)", stats.draw_ranges, stats.portal_ranges);
    println!("Lightmap pages:  {} x {}px", stats.lightmap_pages, mesh.page_size());

    let mut by_type = [0usize; 5];
    for s in mesh.surfaces() {
        let slot = match s.ty {
            SurfaceType::Floor => 0,
            SurfaceType::Ceiling => 1,
            SurfaceType::UpperSide => 2,
            SurfaceType::MiddleSide => 3,
            SurfaceType::LowerSide => 4,
        };
        by_type[slot] += 1;
    }
    println!(
        "By type:         floor {} / ceiling {} / upper {} / middle {} / lower {}",
        by_type[0], by_type[1], by_type[2], by_type[3], by_type[4]
    );
    Ok(())
}

/// A row of 128x128 rooms with stepped floors and ceilings; every third room
/// is open to the sky.
fn corridor(rooms: usize) -> Level {
    let mut b = LevelBuilder::new();
    for i in 0..rooms {
        let step = (i % 4) as f32 * 16.0;
        let mut def = SectorDef::new(step, 128.0 + step).light_level(128 + (i % 8) as u8 * 16);
        if i % 3 == 2 {
            def = def.sky_ceiling();
        }
        let sector = b.add_sector(def);
        let x = i as f32 * 128.0;
        b.add_rect(sector, Vec2::new(x, 0.0), Vec2::new(x + 128.0, 128.0));
    }
    b.lightmaps(true);
    b.build()
}
