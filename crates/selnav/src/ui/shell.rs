//! Command shell driving a selection history over a [`SceneHost`].

use std::io::{BufRead, Write};
use std::str::FromStr;

use anyhow::{Context, Result};
use reedline::{DefaultPrompt, DefaultPromptSegment, Reedline, Signal};
use thiserror::Error;

use crate::app::history::{HistoryOptions, SelectionHistory};
use crate::app::host::{ContextHost, SelectionHost};
use crate::app::session::SnapshotStore;
use crate::infra::scene::SceneHost;

const HELP: &str = "\
commands:
  select <path>    select the entity at <path> in the active context
  clear            clear the selection
  open <document>  open a document as a nested context
  close            close the innermost context
  reload           close and reopen the innermost context
  back             go back to the previous selection
  forward          go forward to the next selection
  history          show the selection history
  reset            forget back and forward entries
  status           show the selection and open contexts
  save             persist the history
  help             show this message
  quit             leave the shell";

/// One parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Select(String),
    Clear,
    Open(String),
    Close,
    Reload,
    Back,
    Forward,
    History,
    Reset,
    Status,
    Save,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandParseError {
    #[error("empty command")]
    Empty,
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    #[error("unknown command `{0}` (try `help`)")]
    Unknown(String),
}

impl FromStr for ShellCommand {
    type Err = CommandParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map(|(word, rest)| (word, rest.trim()))
            .unwrap_or((line, ""));

        let argument = |name: &'static str| {
            if rest.is_empty() {
                Err(CommandParseError::MissingArgument(name))
            } else {
                Ok(rest.to_owned())
            }
        };

        match word.to_ascii_lowercase().as_str() {
            "" => Err(CommandParseError::Empty),
            "select" | "sel" => argument("select").map(ShellCommand::Select),
            "clear" => Ok(ShellCommand::Clear),
            "open" => argument("open").map(ShellCommand::Open),
            "close" => Ok(ShellCommand::Close),
            "reload" => Ok(ShellCommand::Reload),
            "back" | "b" => Ok(ShellCommand::Back),
            "forward" | "f" => Ok(ShellCommand::Forward),
            "history" => Ok(ShellCommand::History),
            "reset" => Ok(ShellCommand::Reset),
            "status" => Ok(ShellCommand::Status),
            "save" => Ok(ShellCommand::Save),
            "help" | "?" => Ok(ShellCommand::Help),
            "quit" | "exit" => Ok(ShellCommand::Quit),
            other => Err(CommandParseError::Unknown(other.to_owned())),
        }
    }
}

/// What the shell should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue(String),
    Quit,
}

/// Editing session: a scene host, its selection history, and optional persistence.
pub struct Shell {
    host: SceneHost,
    history: SelectionHistory<SceneHost>,
    snapshots: Option<SnapshotStore>,
}

impl Shell {
    /// Attach a history to `host`, continuing the snapshot in `snapshots` if one exists.
    pub fn open(
        mut host: SceneHost,
        options: &HistoryOptions,
        snapshots: Option<SnapshotStore>,
    ) -> Result<Self> {
        let snapshot = match &snapshots {
            Some(store) => store.load()?,
            None => None,
        };
        let history = match snapshot {
            Some(snapshot) => {
                tracing::info!(saved_at = ?snapshot.saved_at, "continuing persisted history");
                SelectionHistory::from_snapshot(&mut host, snapshot, options)
            }
            None => SelectionHistory::attach(&mut host, options),
        };

        Ok(Self {
            host,
            history,
            snapshots,
        })
    }

    pub fn host(&self) -> &SceneHost {
        &self.host
    }

    pub fn history(&self) -> &SelectionHistory<SceneHost> {
        &self.history
    }

    /// Parse and execute one input line. Blank lines and `#` comments do nothing.
    pub fn run_line(&mut self, line: &str) -> Result<Flow> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(Flow::Continue(String::new()));
        }
        let command = line.parse::<ShellCommand>()?;
        self.execute(command)
    }

    pub fn execute(&mut self, command: ShellCommand) -> Result<Flow> {
        let output = match command {
            ShellCommand::Select(path) => match self.host.find(&path) {
                Some(entity) => {
                    self.host.set_current_selection(Some(entity));
                    self.history.pump();
                    format!("selected {}", self.selection_label())
                }
                None => format!("no entity at `{path}`"),
            },
            ShellCommand::Clear => {
                self.host.set_current_selection(None);
                self.history.pump();
                "selection cleared".to_owned()
            }
            ShellCommand::Open(document) => match self.host.open_context(&document) {
                Ok(_) => {
                    self.history.pump();
                    format!("opened {document}")
                }
                Err(err) => err.to_string(),
            },
            ShellCommand::Close => {
                let closed = self.host.close_context();
                self.history.pump();
                if closed {
                    "context closed".to_owned()
                } else {
                    "no context open".to_owned()
                }
            }
            ShellCommand::Reload => {
                let reloaded = self.host.reload_context();
                self.history.pump();
                match reloaded {
                    Ok(true) => "context reloaded".to_owned(),
                    Ok(false) => "no context open".to_owned(),
                    Err(err) => err.to_string(),
                }
            }
            ShellCommand::Back => {
                let moved = self.history.back(&mut self.host);
                self.history.pump();
                self.navigation_reply(moved, "nothing to go back to")
            }
            ShellCommand::Forward => {
                let moved = self.history.forward(&mut self.host);
                self.history.pump();
                self.navigation_reply(moved, "nothing to go forward to")
            }
            ShellCommand::History => {
                let view = self.history.view_history(&mut self.host);
                self.history.pump();
                view.to_string().trim_end().to_owned()
            }
            ShellCommand::Reset => {
                self.history.pump();
                self.history.clear();
                "history reset".to_owned()
            }
            ShellCommand::Status => self.status(),
            ShellCommand::Save => match self.save()? {
                Some(path) => format!("history saved to {path}"),
                None => "persistence disabled".to_owned(),
            },
            ShellCommand::Help => HELP.to_owned(),
            ShellCommand::Quit => return Ok(Flow::Quit),
        };
        Ok(Flow::Continue(output))
    }

    /// Read commands from the terminal until `quit` or end of input.
    pub fn run_interactive(&mut self) -> Result<()> {
        let mut line_editor = Reedline::create();
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic("selnav".into()),
            DefaultPromptSegment::Empty,
        );

        loop {
            let signal = line_editor
                .read_line(&prompt)
                .context("failed to read input")?;
            let Signal::Success(line) = signal else {
                break;
            };
            match self.run_line(&line) {
                Ok(Flow::Continue(output)) if !output.is_empty() => println!("{output}"),
                Ok(Flow::Continue(_)) => {}
                Ok(Flow::Quit) => break,
                Err(err) => eprintln!("error: {err:#}"),
            }
        }

        self.finish()
    }

    /// Run every line of `input`, writing command output to `out`.
    pub fn run_script<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<()> {
        for line in input.lines() {
            let line = line.context("failed to read script line")?;
            match self.run_line(&line) {
                Ok(Flow::Continue(output)) if !output.is_empty() => writeln!(out, "{output}")?,
                Ok(Flow::Continue(_)) => {}
                Ok(Flow::Quit) => break,
                Err(err) => writeln!(out, "error: {err:#}")?,
            }
        }

        self.finish()
    }

    /// Persist the history if a snapshot store is configured.
    pub fn finish(&mut self) -> Result<()> {
        self.history.pump();
        self.save().map(|_| ())
    }

    fn save(&self) -> Result<Option<String>> {
        let Some(store) = &self.snapshots else {
            return Ok(None);
        };
        store.save(&self.history.snapshot())?;
        tracing::debug!(path = %store.path().display(), "history saved");
        Ok(Some(store.path().display().to_string()))
    }

    fn navigation_reply(&self, moved: bool, idle: &str) -> String {
        if moved {
            format!("now at {}", self.selection_label())
        } else {
            idle.to_owned()
        }
    }

    fn selection_label(&self) -> String {
        match self.host.current_selection() {
            Some(entity) => match self.host.context_of(&entity) {
                Some(source) => format!("{} [{source}]", self.host.path_to(entity)),
                None => self.host.path_to(entity).to_string(),
            },
            None => "(nothing)".to_owned(),
        }
    }

    fn status(&self) -> String {
        let contexts: Vec<&str> = self.host.open_contexts().collect();
        let contexts = if contexts.is_empty() {
            "(top level)".to_owned()
        } else {
            contexts.join(" > ")
        };
        let flag = |enabled: bool| if enabled { "yes" } else { "no" };
        format!(
            "selection: {}\ncontexts: {contexts}\nback: {}\nforward: {}",
            self.selection_label(),
            flag(self.history.can_go_back()),
            flag(self.history.can_go_forward()),
        )
    }
}
