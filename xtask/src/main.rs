use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use cargo_metadata::MetadataCommand;
use clap::{Parser, Subcommand};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(author, version, about = "Project automation commands", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run cargo nextest with default configuration
    Nextest {
        #[arg(long)]
        profile: Option<String>,
        #[arg(long)]
        release: bool,
    },
    /// Run the tests, accepting changed insta snapshots, and list what changed
    Snapshots {
        /// Only report pending `.snap.new` files, do not run tests
        #[arg(long)]
        check: bool,
    },
    /// Replay the demo script against the demo scene
    Demo,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let root = workspace_root()?;
    match cli.command {
        Commands::Nextest { profile, release } => run_nextest(&root, profile, release)?,
        Commands::Snapshots { check } => run_snapshots(&root, check)?,
        Commands::Demo => run_demo(&root)?,
    }
    Ok(())
}

fn workspace_root() -> Result<PathBuf> {
    let metadata = MetadataCommand::new()
        .no_deps()
        .exec()
        .context("failed to read cargo metadata")?;
    Ok(metadata.workspace_root.into_std_path_buf())
}

fn run_nextest(root: &Path, profile: Option<String>, release: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.current_dir(root).arg("nextest").arg("run");
    if let Some(profile) = profile {
        cmd.arg("--profile").arg(profile);
    }
    if release {
        cmd.arg("--release");
    }
    let status = cmd.status()?;
    if !status.success() {
        bail!("cargo nextest run failed");
    }
    Ok(())
}

fn run_snapshots(root: &Path, check: bool) -> Result<()> {
    if !check {
        let status = Command::new("cargo")
            .current_dir(root)
            .args(["test", "-p", "selnav"])
            .env("INSTA_UPDATE", "always")
            .status()?;
        if !status.success() {
            bail!("cargo test failed while updating snapshots");
        }
    }

    let pending = pending_snapshots(&root.join("crates"));
    for path in &pending {
        println!("{}", path.display());
    }
    if check && !pending.is_empty() {
        bail!("{} snapshot(s) awaiting review", pending.len());
    }
    Ok(())
}

fn pending_snapshots(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".snap.new"))
        .map(|entry| entry.into_path())
        .collect()
}

fn run_demo(root: &Path) -> Result<()> {
    let demos = root.join("crates/selnav/demos");
    let status = Command::new("cargo")
        .current_dir(root)
        .args(["run", "-p", "selnav", "--", "--no-persist", "replay", "--scene"])
        .arg(demos.join("level.json"))
        .arg("--script")
        .arg(demos.join("tour.selnav"))
        .status()?;
    if !status.success() {
        bail!("demo replay failed");
    }
    Ok(())
}
