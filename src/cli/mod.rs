//! CLI module - Command-line interface for casedesk
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

pub use commands::*;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

/// casedesk - court case tracking for business searches
#[derive(Parser)]
#[command(name = "casedesk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the default search path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the web server (default)
    Serve,

    /// Create the default config file and database
    #[command(alias = "--init")]
    Init,

    /// List submitted queries
    #[command(alias = "q")]
    Queries {
        /// Only queries still waiting on the workflow
        #[arg(long)]
        active: bool,
    },

    /// List cases, optionally filtered
    #[command(alias = "ls")]
    Cases {
        #[arg(long)]
        business: Option<String>,
        #[arg(long)]
        county: Option<String>,
        #[arg(long)]
        case_status: Option<String>,
        /// sent, response, contract, or none for untagged cases
        #[arg(long)]
        user_status: Option<String>,
    },

    /// Set the user status of one or more cases
    Mark {
        /// sent, response or contract
        status: String,
        #[arg(required = true)]
        case_ids: Vec<String>,
    },

    /// Load a JSON array of workflow cases for a query
    ImportCases {
        query_id: String,
        file: PathBuf,
    },

    /// Move a query forward to a new status
    Advance {
        query_id: String,
        /// processing, completed or failed
        status: String,
    },

    /// Extract text and metadata from a PDF
    Extract {
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        url: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

impl Cli {
    /// Loads the config named by `--config`, or searches the default paths.
    pub fn load_config(&self) -> anyhow::Result<Config> {
        match &self.config {
            Some(path) => Config::load_from_path(path),
            None => Config::load(),
        }
    }

    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_config_path)
    }
}
