//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand, ValueEnum, ValueHint};

use crate::domain::DropPosition;

/// Edit ordered, labeled trees stored as XML files or in a remote document service
#[derive(Parser, Debug)]
#[command(name = "arbor")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short = 'd', long = "debug", action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Directory holding a local .arbor.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    /// Document to operate on: file path, `remote:ID` or `Id: N Name: X`
    /// (default: `document` setting)
    #[arg(short, long, global = true)]
    pub source: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the document as a tree
    Show {
        /// Prefix every node with its path
        #[arg(long)]
        paths: bool,
    },

    /// Add a node
    Add {
        /// Label of the new node
        label: String,
        /// Parent path (default: top level)
        #[arg(short, long)]
        parent: Option<String>,
        /// Position among siblings (default: append)
        #[arg(short, long)]
        index: Option<usize>,
    },

    /// Change a node's label
    Rename {
        /// Node path, e.g. `0/2`
        path: String,
        /// New label
        label: String,
    },

    /// Delete a node and its subtree
    Delete {
        /// Node path
        path: String,
    },

    /// Remove all nodes
    Clear,

    /// Relocate a subtree relative to a target node
    Move {
        /// Path of the subtree to move
        node: String,
        /// Path of the drop target
        target: String,
        /// Where to place the subtree relative to the target
        #[arg(short, long, value_enum, default_value_t = PositionArg::Child)]
        position: PositionArg,
    },

    /// Save the document under a new location
    #[command(group(ArgGroup::new("destination").required(true).args(["file", "remote"])))]
    SaveAs {
        /// Target XML file
        #[arg(long, value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
        /// Name of a new remote document
        #[arg(long)]
        remote: Option<String>,
    },

    /// Manage documents on the remote service
    Remote {
        #[command(subcommand)]
        command: RemoteCommands,
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
pub enum RemoteCommands {
    /// List documents
    List,
    /// Print a document as a tree
    Fetch {
        /// Document id
        id: String,
    },
    /// Pick a document interactively (fzf) and print its handle
    Select,
    /// Rename a document
    Rename {
        /// Document id
        id: String,
        /// New name
        name: String,
    },
    /// Delete a document
    Delete {
        /// Document id
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,
    /// Show config paths
    Path,
    /// Write a template config file
    Init {
        /// Write the global config instead of the local one
        #[arg(short, long)]
        global: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PositionArg {
    Before,
    After,
    Child,
}

impl From<PositionArg> for DropPosition {
    fn from(arg: PositionArg) -> Self {
        match arg {
            PositionArg::Before => DropPosition::Before,
            PositionArg::After => DropPosition::After,
            PositionArg::Child => DropPosition::Child,
        }
    }
}
