//! Command-line interface.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell as CompletionShell;

use crate::app::history::HistoryOptions;
use crate::app::session::{HistorySnapshot, SnapshotStore};
use crate::app::store::HistoryStore;
use crate::app::view::HistoryView;
use crate::infra::config::{Config, workspace_root};
use crate::infra::scene::{EntityId, SceneHost};
use crate::ui::shell::Shell;

#[derive(Debug, Parser)]
#[command(
    name = "selnav",
    author,
    version,
    about = "Back/forward navigation through editor selections"
)]
pub struct Cli {
    /// Do not load or save the persisted history.
    #[arg(long, global = true)]
    pub no_persist: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Open an interactive shell over a scene file
    Shell {
        #[arg(long)]
        scene: PathBuf,
    },
    /// Run shell commands from a script file, or stdin when no script is given
    Replay {
        #[arg(long)]
        scene: PathBuf,
        #[arg(long)]
        script: Option<PathBuf>,
    },
    /// Print a persisted history
    Show {
        /// Snapshot file; defaults to the configured session file
        snapshot: Option<PathBuf>,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

impl Cli {
    pub fn run(self, config: &Config) -> Result<()> {
        let options = HistoryOptions::from_config(config);
        match self.command {
            Command::Shell { ref scene } => {
                let host = SceneHost::load(scene)?;
                let snapshots = self.snapshot_store(config)?;
                Shell::open(host, &options, snapshots)?.run_interactive()
            }
            Command::Replay {
                ref scene,
                ref script,
            } => {
                let host = SceneHost::load(scene)?;
                let snapshots = self.snapshot_store(config)?;
                let mut shell = Shell::open(host, &options, snapshots)?;
                let mut stdout = io::stdout().lock();
                match script {
                    Some(path) => {
                        let file = File::open(path).with_context(|| {
                            format!("failed to open script {}", path.display())
                        })?;
                        shell.run_script(BufReader::new(file), &mut stdout)
                    }
                    None => shell.run_script(io::stdin().lock(), &mut stdout),
                }
            }
            Command::Show { ref snapshot } => {
                let store = match snapshot {
                    Some(path) => SnapshotStore::new(path),
                    None => default_store(config)?,
                };
                show(&store, config)
            }
            Command::Completions { shell } => {
                clap_complete::generate(shell, &mut Cli::command(), "selnav", &mut io::stdout());
                Ok(())
            }
        }
    }

    fn snapshot_store(&self, config: &Config) -> Result<Option<SnapshotStore>> {
        if self.no_persist || !config.session.persist() {
            return Ok(None);
        }
        default_store(config).map(Some)
    }
}

fn default_store(config: &Config) -> Result<SnapshotStore> {
    Ok(SnapshotStore::under(&workspace_root()?, config.session.file()))
}

fn show(store: &SnapshotStore, config: &Config) -> Result<()> {
    let Some(snapshot) = store.load::<EntityId, String>()? else {
        println!("no history at {}", store.path().display());
        return Ok(());
    };

    let HistorySnapshot {
        saved_at,
        current,
        previous,
        next,
        ..
    } = snapshot;
    let history =
        HistoryStore::from_parts(current, previous, next, config.history.max_depth());

    if let Some(saved_at) = saved_at {
        println!("saved at {saved_at}");
    }
    print!("{}", HistoryView::from_store(&history));
    Ok(())
}
