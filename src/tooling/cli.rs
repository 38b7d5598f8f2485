//! CLI Tooling
//!
//! Command-line entry point: run one shell command and exit, or start the
//! interactive shell when no command is given.

use crate::config::{ConfigLoader, VhdConfig};
use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::session::Session;
use crate::shell::{Outcome, Shell};
use clap::Parser;
use std::path::{Path, PathBuf};

/// Virtual hard drive shell
#[derive(Parser, Debug)]
#[command(name = "vhd", version)]
#[command(about = "Browse and manage files kept in remote object storage as one virtual hard drive")]
pub struct Cli {
    /// Configuration file path (layered over the global config)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write a starter configuration to the --config path (or the global path) and exit
    #[arg(long)]
    pub init_config: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Shell command to run once, e.g. `ls /photos`; omit for the interactive shell
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl Cli {
    /// Layer the logging flags over the configured logging section.
    pub fn apply_log_overrides(&self, logging: &mut LoggingConfig) {
        if let Some(level) = &self.log_level {
            logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            logging.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            logging.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            logging.file = Some(file.clone());
        }
    }

    /// Load configuration from the standard sources plus `--config`.
    pub fn load_config(&self) -> Result<VhdConfig, ApiError> {
        let mut config = ConfigLoader::load(self.config.as_deref())?;
        self.apply_log_overrides(&mut config.logging);
        Ok(config)
    }

    /// Directory relative catalog paths are resolved against.
    pub fn config_base(&self) -> Option<&Path> {
        self.config.as_deref().and_then(Path::parent)
    }

    pub fn is_interactive(&self) -> bool {
        self.command.is_empty()
    }
}

/// Session plus shell, built once per process.
pub struct CliContext {
    config: VhdConfig,
    shell: Shell,
}

impl CliContext {
    /// Open the catalog and drives named by `config`.
    pub fn new(config: VhdConfig, base: Option<&Path>, interactive: bool) -> Result<Self, ApiError> {
        let session = Session::open(&config, base)?;
        let local_dir = std::env::current_dir()?;
        Ok(Self {
            config,
            shell: Shell::new(session, interactive, local_dir),
        })
    }

    /// Wrap an already opened session.
    pub fn with_session(config: VhdConfig, session: Session, local_dir: PathBuf) -> Self {
        Self {
            config,
            shell: Shell::new(session, false, local_dir),
        }
    }

    pub fn config(&self) -> &VhdConfig {
        &self.config
    }

    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    /// Run one command, e.g. `["ls", "/photos"]`.
    pub fn execute(&mut self, command: &[String]) -> Result<String, ApiError> {
        let Some((name, args)) = command.split_first() else {
            return Err(ApiError::Usage("no command given".to_string()));
        };
        match self.shell.run(name, args)? {
            Outcome::Continue(output) => Ok(output),
            Outcome::Exit => Ok(String::new()),
        }
    }

    /// Interactive shell until `exit` or end of input.
    pub fn run_interactive(&mut self) -> Result<(), ApiError> {
        let shell_config = self.config.shell.clone();
        self.shell.run_repl(&shell_config)
    }
}
