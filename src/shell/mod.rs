//! Interactive shell over a [`Session`]
//!
//! Lines are split into words, the first word picks a command from the
//! table in [`commands`], arity is checked, and the handler runs. A failing
//! command is reported and the session carries on.

pub mod commands;
pub mod format;
pub mod split;

use crate::config::{xdg, ShellConfig};
use crate::error::ApiError;
use crate::session::Session;
use commands::{lookup, CommandSpec};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use split::split_line;
use std::path::{Path, PathBuf};

/// What the caller should do after a line ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Print the output (possibly empty) and read the next line.
    Continue(String),
    Exit,
}

pub struct Shell {
    session: Session,
    /// Prompts (overwrite confirmation) are only shown when set.
    interactive: bool,
    /// Relative local paths given to `put`, `get` and `hash` start here.
    local_dir: PathBuf,
}

impl Shell {
    pub fn new(session: Session, interactive: bool, local_dir: impl Into<PathBuf>) -> Self {
        Self {
            session,
            interactive,
            local_dir: local_dir.into(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub(crate) fn local_path(&self, arg: &str) -> PathBuf {
        self.local_dir.join(arg)
    }

    pub fn local_dir(&self) -> &Path {
        &self.local_dir
    }

    pub fn prompt(&self) -> String {
        format!("{}> ", self.session.cwd_path())
    }

    /// Split and run one line.
    pub fn run_line(&mut self, line: &str) -> Result<Outcome, ApiError> {
        let words = split_line(line)?;
        let Some((name, args)) = words.split_first() else {
            return Ok(Outcome::Continue(String::new()));
        };
        self.run(name, args)
    }

    /// Run command `name` with already split `args`.
    pub fn run(&mut self, name: &str, args: &[String]) -> Result<Outcome, ApiError> {
        let spec = lookup(name)
            .ok_or_else(|| ApiError::Usage(format!("Unknown command: {}", name)))?;
        check_arity(spec, args)?;
        if spec.name == "exit" {
            return Ok(Outcome::Exit);
        }
        tracing::debug!(command = spec.name, args = args.len(), "running command");
        (spec.handler)(self, args)
            .map(Outcome::Continue)
            .map_err(|e| ApiError::Command {
                command: spec.name.to_string(),
                source: Box::new(e),
            })
    }

    /// Read-eval-print loop until `exit` or end of input.
    pub fn run_repl(&mut self, config: &ShellConfig) -> Result<(), ApiError> {
        if config.banner {
            println!("{}", banner());
        }

        let mut rl: Editor<(), DefaultHistory> = Editor::new()
            .map_err(|e| ApiError::ConfigError(format!("Failed to create line editor: {}", e)))?;

        let history_path = if config.history {
            xdg::history_path().ok()
        } else {
            None
        };
        if let Some(ref path) = history_path {
            let _ = rl.load_history(path);
        }

        loop {
            match rl.readline(&self.prompt()) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = rl.add_history_entry(line.as_str());
                    }
                    match self.run_line(&line) {
                        Ok(Outcome::Continue(output)) => {
                            if !output.is_empty() {
                                println!("{}", output.trim_end());
                            }
                        }
                        Ok(Outcome::Exit) => break,
                        Err(e) => eprintln!("Error: {}", e),
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    eprintln!("Error: {}", err);
                    break;
                }
            }
        }

        if let Some(ref path) = history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            if let Err(e) = rl.save_history(path) {
                tracing::warn!(path = %path.display(), error = %e, "could not save history");
            }
        }
        Ok(())
    }
}

fn check_arity(spec: &CommandSpec, args: &[String]) -> Result<(), ApiError> {
    if args.len() < spec.min_args {
        return Err(ApiError::Usage(format!(
            "Too few arguments (expected {}): {}",
            spec.min_args, spec.usage
        )));
    }
    if let Some(max) = spec.max_args {
        if args.len() > max {
            return Err(ApiError::Usage(format!(
                "Too many arguments (expected {}): {}",
                max, spec.usage
            )));
        }
    }
    Ok(())
}

fn banner() -> String {
    format!(
        "{}\nType help for the list of commands, exit to leave.\n",
        format::format_section_heading(&format!("Virtual HD {}", env!("CARGO_PKG_VERSION")))
    )
}
