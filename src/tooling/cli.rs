//! CLI Tooling
//!
//! Command-line inspector for flattened tree files. Every command loads the
//! file, applies one operation and writes the file back when the operation
//! changed the tree.

use crate::config::{ConfigLoader, PathTreeConfig};
use crate::error::{Result, TreeError};
use crate::logging::LoggingConfig;
use crate::tree::{PathTree, TreeCursor};
use crate::types::{NodeCounts, NodeKind, ROOT_PATH, SEPARATOR};
use clap::{Parser, Subcommand};
use comfy_table::Table;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::info;

/// Pathtree CLI - inspect and edit flattened path trees
#[derive(Parser)]
#[command(name = "pathtree")]
#[command(about = "Inspect and edit hierarchical path trees stored in framed binary files")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Tree file to operate on
    #[arg(long, default_value = "tree.ptree")]
    pub file: PathBuf,

    /// Configuration file path (layered over the global config)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Logging settings from config with command-line overrides applied
    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut logging = base.clone();
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
        logging
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an empty tree file using the configured policy
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Create every missing scope along a path
    Mkdir {
        path: String,
        /// Description for the deepest scope created
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Add a value node under a scope
    Set {
        parent: String,
        name: String,
        value: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Replace the payload of an existing value node
    Update {
        path: String,
        value: String,
        /// Replacement description (kept when omitted)
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Print the payload of a value node
    Get { path: String },
    /// Remove a node and its subtree
    Rm { path: String },
    /// List the direct children of a scope
    Ls {
        #[arg(default_value = "/")]
        path: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print every node in pre-order, indented by depth
    Tree,
    /// Show node counts, serial number and policy
    Stat {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

/// Short command name used in log events
fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Init { .. } => "init",
        Commands::Mkdir { .. } => "mkdir",
        Commands::Set { .. } => "set",
        Commands::Update { .. } => "update",
        Commands::Get { .. } => "get",
        Commands::Rm { .. } => "rm",
        Commands::Ls { .. } => "ls",
        Commands::Tree => "tree",
        Commands::Stat { .. } => "stat",
    }
}

/// CLI context bound to one tree file
pub struct CliContext {
    tree_file: PathBuf,
    config: PathTreeConfig,
}

impl CliContext {
    /// Create a new CLI context
    pub fn new(tree_file: PathBuf, config_path: Option<PathBuf>) -> Result<Self> {
        let config = match &config_path {
            Some(path) => ConfigLoader::load_with_file(path)?,
            None => ConfigLoader::load()?,
        };
        Ok(Self::with_config(tree_file, config))
    }

    /// Create a context from an already loaded configuration
    pub fn with_config(tree_file: PathBuf, config: PathTreeConfig) -> Self {
        Self { tree_file, config }
    }

    pub fn config(&self) -> &PathTreeConfig {
        &self.config
    }

    pub fn tree_file(&self) -> &Path {
        &self.tree_file
    }

    /// Execute a CLI command and return its printable output
    pub fn execute(&self, command: &Commands) -> Result<String> {
        let output = self.execute_inner(command)?;
        info!(
            command = command_name(command),
            file = %self.tree_file.display(),
            "Command completed"
        );
        Ok(output)
    }

    fn execute_inner(&self, command: &Commands) -> Result<String> {
        match command {
            Commands::Init { force } => self.handle_init(*force),
            Commands::Mkdir { path, description } => {
                let tree = self.load()?;
                let id = tree.create_scope_path(path, description.as_deref())?;
                self.save(&tree)?;
                Ok(format!("Scope ready: {}", tree.full_path(id)?))
            }
            Commands::Set {
                parent,
                name,
                value,
                description,
            } => {
                let tree = self.load()?;
                let id = tree.add_value(parent, name, value.clone(), description.as_deref())?;
                self.save(&tree)?;
                Ok(format!("Value added: {}", tree.full_path(id)?))
            }
            Commands::Update {
                path,
                value,
                description,
            } => {
                let tree = self.load()?;
                tree.refresh_value(path, value.clone(), description.as_deref())?;
                self.save(&tree)?;
                Ok(format!("Value updated: {}", path))
            }
            Commands::Get { path } => self.load()?.get(path),
            Commands::Rm { path } => {
                let tree = self.load()?;
                let removed = tree.remove_node(path)?;
                self.save(&tree)?;
                Ok(format!(
                    "Removed {}: {} scope(s), {} value(s)",
                    path, removed.scopes, removed.values
                ))
            }
            Commands::Ls { path, format } => self.handle_ls(path, format),
            Commands::Tree => self.handle_tree(),
            Commands::Stat { format } => self.handle_stat(format),
        }
    }

    fn load(&self) -> Result<PathTree<String>> {
        PathTree::open(&self.tree_file)
    }

    fn save(&self, tree: &PathTree<String>) -> Result<()> {
        tree.save_to_file(&self.tree_file)
    }

    fn handle_init(&self, force: bool) -> Result<String> {
        if self.tree_file.exists() && !force {
            return Err(TreeError::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!(
                    "{} already exists (use --force to overwrite)",
                    self.tree_file.display()
                ),
            )));
        }
        if let Some(parent) = self.tree_file.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tree = PathTree::<String>::from_config(&self.config.tree);
        self.save(&tree)?;
        Ok(format!("Initialized empty tree at {}", self.tree_file.display()))
    }

    fn handle_ls(&self, path: &str, format: &str) -> Result<String> {
        let tree = self.load()?;
        let mut cursor = tree.scoped_cursor(path)?;
        let mut rows = Vec::new();
        if cursor.position().is_some() {
            loop {
                let kind = cursor.kind()?;
                let value = match kind {
                    NodeKind::Value => Some(cursor.value()?),
                    NodeKind::Scope => None,
                };
                rows.push(ListRow {
                    name: cursor.name()?,
                    kind,
                    description: cursor.description()?,
                    value,
                });
                if !cursor.advance()? {
                    break;
                }
            }
        }

        match format {
            "json" => {
                let entries: Vec<_> = rows
                    .iter()
                    .map(|row| {
                        json!({
                            "name": row.name,
                            "kind": row.kind.to_string(),
                            "description": row.description,
                            "value": row.value,
                        })
                    })
                    .collect();
                let body = json!({ "path": path, "children": entries });
                Ok(serde_json::to_string_pretty(&body)?)
            }
            "text" => {
                if rows.is_empty() {
                    return Ok(format!("{} is empty", path));
                }
                let mut table = Table::new();
                table.load_preset(comfy_table::presets::UTF8_FULL);
                table.set_header(vec!["Name", "Kind", "Value", "Description"]);
                for row in &rows {
                    table.add_row(vec![
                        row.name.clone(),
                        row.kind.to_string(),
                        row.value.clone().unwrap_or_else(|| "-".to_string()),
                        row.description.clone().unwrap_or_default(),
                    ]);
                }
                Ok(table.to_string())
            }
            other => Err(TreeError::Config(format!(
                "Invalid format: {} (must be 'text' or 'json')",
                other
            ))),
        }
    }

    fn handle_tree(&self) -> Result<String> {
        let tree = self.load()?;
        let mut lines = vec![ROOT_PATH.to_string()];
        let mut cursor = tree.cursor();
        if cursor.position().is_some() {
            loop {
                let indent = "  ".repeat(cursor.depth()? + 1);
                let line = match cursor.kind()? {
                    NodeKind::Scope => format!("{}{}{}", indent, cursor.name()?, SEPARATOR),
                    NodeKind::Value => format!("{}{} = {}", indent, cursor.name()?, cursor.value()?),
                };
                lines.push(line);
                if !cursor.advance()? {
                    break;
                }
            }
        }
        Ok(lines.join("\n"))
    }

    fn handle_stat(&self, format: &str) -> Result<String> {
        let tree = self.load()?;
        let NodeCounts { scopes, values } = tree.counts();
        let policy = tree.policy();
        match format {
            "json" => {
                let body = json!({
                    "file": self.tree_file.display().to_string(),
                    "scopes": scopes,
                    "values": values,
                    "serial": tree.serial_number(),
                    "case_sensitive_paths": policy.case_sensitive_paths,
                    "sorted": policy.sorted,
                });
                Ok(serde_json::to_string_pretty(&body)?)
            }
            "text" => Ok(format!(
                "File: {}\nScopes: {}\nValues: {}\nSerial: {}\nCase-sensitive paths: {}\nSorted: {}",
                self.tree_file.display(),
                scopes,
                values,
                tree.serial_number(),
                policy.case_sensitive_paths,
                policy.sorted
            )),
            other => Err(TreeError::Config(format!(
                "Invalid format: {} (must be 'text' or 'json')",
                other
            ))),
        }
    }
}

struct ListRow {
    name: String,
    kind: NodeKind,
    description: Option<String>,
    value: Option<String>,
}
