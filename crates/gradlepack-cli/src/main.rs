#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use gradlepack_config::bindings::{bindings_root, discover};
use gradlepack_config::resolver::default_configurations;
use gradlepack_config::{Buildpack, ConfigurationResolver};
use gradlepack_engine::{BuildContext, BuildpackDependencyResolver, DownloadCache, Layers};
use tracing::info;
use tracing_subscriber::EnvFilter;

type CliResult = Result<(), Box<dyn Error>>;

/// Exit code the lifecycle reads as "does not apply".
const DETECT_FAIL: i32 = 100;

#[derive(Debug, Parser)]
#[command(name = "gradlepack", about = "Detect and prepare Gradle builds in a layered build environment")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Decide whether the application is a Gradle project
    Detect {
        /// Application directory
        #[arg(long, default_value = ".")]
        app: PathBuf,
        /// Path to buildpack.toml (built-in defaults if omitted)
        #[arg(long)]
        buildpack: Option<PathBuf>,
        /// Write the build plan to this file
        #[arg(long)]
        plan: Option<PathBuf>,
    },
    /// Contribute the Gradle layers and print the Gradle invocation
    Build {
        /// Application directory
        #[arg(long, default_value = ".")]
        app: PathBuf,
        /// Layers directory
        #[arg(long)]
        layers: PathBuf,
        /// Path to buildpack.toml (built-in defaults if omitted)
        #[arg(long)]
        buildpack: Option<PathBuf>,
        /// Platform directory holding `bindings/`
        #[arg(long, default_value = "/platform")]
        platform: PathBuf,
        /// Stack id used to filter dependencies (defaults to $CNB_STACK_ID)
        #[arg(long)]
        stack: Option<String>,
        /// Home directory of the build user (defaults to $HOME)
        #[arg(long)]
        home: Option<PathBuf>,
        /// Directory for downloaded dependencies
        #[arg(long)]
        dependency_cache: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Detect {
            app,
            buildpack,
            plan,
        } => match cmd_detect(&app, buildpack.as_deref(), plan.as_deref()) {
            Ok(true) => Ok(()),
            Ok(false) => process::exit(DETECT_FAIL),
            Err(e) => Err(e),
        },
        Command::Build {
            app,
            layers,
            buildpack,
            platform,
            stack,
            home,
            dependency_cache,
        } => cmd_build(&BuildArgs {
            app,
            layers,
            buildpack,
            platform,
            stack,
            home,
            dependency_cache,
        }),
    };

    if let Err(msg) = result {
        eprintln!("error: {msg}");
        process::exit(1);
    }
}

/// Load `buildpack.toml`, falling back to the built-in option defaults.
fn load_buildpack(path: Option<&Path>) -> Result<Buildpack, Box<dyn Error>> {
    let mut buildpack = match path {
        Some(p) => Buildpack::from_path(p)?,
        None => Buildpack::default(),
    };
    if buildpack.metadata.configurations.is_empty() {
        buildpack.metadata.configurations = default_configurations();
    }
    Ok(buildpack)
}

fn environment() -> HashMap<String, String> {
    std::env::vars().collect()
}

/// Run detection; `Ok(false)` means the buildpack does not apply.
fn cmd_detect(app: &Path, buildpack: Option<&Path>, plan: Option<&Path>) -> Result<bool, Box<dyn Error>> {
    let buildpack = load_buildpack(buildpack)?;
    let config = ConfigurationResolver::from_buildpack(&buildpack, environment());

    let result = gradlepack_engine::detect(app, &config)?;
    if !result.pass {
        info!(app = %app.display(), "no gradle build found");
        return Ok(false);
    }

    let rendered = result.plan_toml()?;
    match plan {
        Some(path) => gradlepack_util::fs::write_replacing(path, rendered.as_bytes())?,
        None => print!("{rendered}"),
    }
    Ok(true)
}

#[derive(Debug)]
struct BuildArgs {
    app: PathBuf,
    layers: PathBuf,
    buildpack: Option<PathBuf>,
    platform: PathBuf,
    stack: Option<String>,
    home: Option<PathBuf>,
    dependency_cache: Option<PathBuf>,
}

fn cmd_build(args: &BuildArgs) -> CliResult {
    let buildpack = load_buildpack(args.buildpack.as_deref())?;
    let env = environment();

    let stack_id = args
        .stack
        .clone()
        .or_else(|| env.get("CNB_STACK_ID").cloned())
        .unwrap_or_default();
    let home_dir = match &args.home {
        Some(home) => home.clone(),
        None => gradlepack_util::fs::home_dir()?,
    };
    let cache_root = args
        .dependency_cache
        .clone()
        .unwrap_or_else(|| home_dir.join(".gradlepack").join("dependencies"));
    let bindings = discover(&bindings_root(&args.platform, &env))?;

    info!(
        buildpack = %buildpack.info.id,
        version = %buildpack.info.version,
        stack = %stack_id,
        bindings = bindings.len(),
        "building"
    );

    let resolver = BuildpackDependencyResolver::from_buildpack(&buildpack, &stack_id);
    let config = ConfigurationResolver::from_buildpack(&buildpack, env);
    let ctx = BuildContext {
        application_path: args.app.clone(),
        layers_path: args.layers.clone(),
        home_dir,
        bindings,
    };

    let result = gradlepack_engine::build(&ctx, &config, &resolver)?;
    let contributed = gradlepack_engine::contribute_all(
        &Layers::new(&args.layers),
        &result,
        &DownloadCache::new(&cache_root),
    )?;
    gradlepack_engine::bom::write_build_toml(&args.layers, &result.bom)?;

    for layer in &contributed {
        eprintln!("    Contributed layer `{}`", layer.name);
    }
    for entry in &result.bom {
        eprintln!("    BOM entry `{}` (build-only)", entry.name);
    }
    println!("{}", command_line(&result.command, &result.arguments));
    Ok(())
}

fn command_line(command: &Path, arguments: &[String]) -> String {
    std::iter::once(command.display().to_string())
        .chain(arguments.iter().cloned())
        .collect::<Vec<_>>()
        .join(" ")
}
