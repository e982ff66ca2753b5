//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Hierarchical document-graph canvas: layout, pan/zoom, subtree dragging, persisted view
#[derive(Parser, Debug)]
#[command(name = "doccanvas")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Explicit config file (applied after the global one)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// User the view state belongs to
    #[arg(short, long, global = true, env = "DOCCANVAS_USER")]
    pub user: Option<String>,

    /// Directory of the persisted view state
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    pub state_dir: Option<PathBuf>,

    /// Container width in pixels
    #[arg(long, global = true)]
    pub width: Option<f64>,

    /// Container height in pixels
    #[arg(long, global = true)]
    pub height: Option<f64>,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the document hierarchy as a tree
    Tree {
        /// JSON file with the document list
        #[arg(value_hint = ValueHint::FilePath)]
        documents: PathBuf,
    },

    /// Show visible nodes with their positions
    Layout {
        /// JSON file with the document list
        #[arg(value_hint = ValueHint::FilePath)]
        documents: PathBuf,
    },

    /// Expand or collapse a node and its descendants
    Toggle {
        /// JSON file with the document list
        #[arg(value_hint = ValueHint::FilePath)]
        documents: PathBuf,
        /// Document id
        id: String,
    },

    /// Move a node and its descendants by a world-space delta
    Drag {
        /// JSON file with the document list
        #[arg(value_hint = ValueHint::FilePath)]
        documents: PathBuf,
        /// Document id
        id: String,
        /// Horizontal delta
        #[arg(long, allow_hyphen_values = true, default_value_t = 0.0)]
        dx: f64,
        /// Vertical delta
        #[arg(long, allow_hyphen_values = true, default_value_t = 0.0)]
        dy: f64,
    },

    /// Compute the viewport that fits the whole tree
    Fit {
        /// JSON file with the document list
        #[arg(value_hint = ValueHint::FilePath)]
        documents: PathBuf,
    },

    /// Show connector curves as SVG path data
    Connections {
        /// JSON file with the document list
        #[arg(value_hint = ValueHint::FilePath)]
        documents: PathBuf,
    },

    /// Discard all dragged positions
    ResetLayout {
        /// JSON file with the document list
        #[arg(value_hint = ValueHint::FilePath)]
        documents: PathBuf,
    },

    /// Inspect or remove persisted view state
    State {
        #[command(subcommand)]
        command: StateCommands,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum StateCommands {
    /// Show persisted positions and expanded nodes
    Show,
    /// Remove persisted state for the user
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Print a commented config template
    Template,
    /// Show config file location
    Path,
}
