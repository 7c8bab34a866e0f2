//! Articulate command line entry point

mod script;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use articulate_core::{
    BuildContext, ExportConfig, ImportOptions, KinematicGraph, LinkKind, read_description,
};
use clap::{Parser, Subcommand};

use crate::script::BuildScript;

#[derive(Parser)]
#[command(name = "articulate")]
#[command(about = "Export articulated assets as URDF", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a RON build script and write the build's files
    Replay {
        /// Build script
        script: PathBuf,

        /// Export configuration (RON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Build id, overriding the script's
        #[arg(short, long)]
        build_id: Option<String>,

        /// Output root, overriding the configuration's
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check an exported description and print its tree
    Inspect {
        /// Description file (scene.urdf)
        description: PathBuf,

        /// Fail if a referenced mesh file is missing
        #[arg(long)]
        require_meshes: bool,
    },
}

fn main() -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "articulate=info,articulate_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            script,
            config,
            build_id,
            output,
        } => replay(&script, config.as_deref(), build_id, output),
        Commands::Inspect {
            description,
            require_meshes,
        } => inspect(&description, require_meshes),
    }
}

fn replay(
    script_path: &Path,
    config_path: Option<&Path>,
    build_id: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => ExportConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ExportConfig::default(),
    };
    if let Some(output) = output {
        config.output_root = output;
    }

    let script = BuildScript::load(script_path)?;
    let build_id = build_id.or_else(|| script.build_id.clone());
    let mut ctx = BuildContext::create(config, build_id.as_deref())?;
    if let Some(obj_name) = &script.obj_name {
        ctx = ctx.with_object_name(obj_name)?;
    }

    let base_dir = script_path.parent().unwrap_or(Path::new("."));
    let outcome = script
        .replay(&mut ctx, base_dir)
        .and_then(|whole| ctx.finalize(&whole).context("Failed to finalize build"));
    let report = match outcome {
        Ok(report) => report,
        Err(e) => {
            ctx.abort().context("Failed to clean up aborted build")?;
            return Err(e);
        }
    };

    println!(
        "Build {}: {} links, {} joints",
        report.build_id,
        report.graph.link_count(),
        report.graph.joint_count()
    );
    println!("  description: {}", report.description_path.display());
    println!("  whole mesh:  {}", report.whole_path.display());
    Ok(())
}

fn inspect(path: &Path, require_meshes: bool) -> Result<()> {
    let options = ImportOptions {
        require_meshes,
        ..Default::default()
    };
    let graph = read_description(path, &options)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    if let Err(errors) = graph.validate() {
        for error in &errors {
            tracing::error!("{}", error);
        }
        anyhow::bail!("{} is not a valid tree ({} errors)", path.display(), errors.len());
    }

    println!("{}: {} links, {} joints", graph.name, graph.link_count(), graph.joint_count());
    print_tree(&graph);
    Ok(())
}

fn print_tree(graph: &KinematicGraph) {
    for name in graph.links_depth_first() {
        let depth = graph.link_depth(name);
        let link = graph.link(name);
        let marker = match link.map(|l| l.kind) {
            Some(LinkKind::Abstract) => " (abstract)",
            Some(LinkKind::Part(_)) if !link.is_some_and(|l| l.has_geometry()) => " (no geometry)",
            _ => "",
        };
        let joint = graph
            .parent_joint(name)
            .map(|j| format!(" <- {} [{}]", j.name, j.joint_type.urdf_name()))
            .unwrap_or_default();
        println!("{}{}{}{}", "  ".repeat(depth), name, marker, joint);
        for extra in graph.joints().iter().filter(|j| j.secondary && j.child_link == name) {
            println!(
                "{}  also {} from {} [{}]",
                "  ".repeat(depth),
                extra.name,
                extra.parent_link,
                extra.joint_type.urdf_name()
            );
        }
    }
}
