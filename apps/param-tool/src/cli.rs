use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Data directory, overrides the config file
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log in as this user before running the command
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    /// Password for --user
    #[arg(short, long, global = true)]
    pub password: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory and seed the default administrator
    Init,

    /// Store the current user
    Login {
        username: String,
        password: String,
    },

    /// Clear the current user
    Logout,

    /// Manage user accounts
    #[command(subcommand)]
    User(UserCommand),

    /// Manage pages
    #[command(subcommand)]
    Page(PageCommand),

    /// Edit a page's columns
    #[command(subcommand)]
    Columns(ColumnsCommand),

    /// Inspect and edit records
    #[command(subcommand)]
    Records(RecordsCommand),

    /// Import a .csv or .json file into a page
    Import {
        /// Target page id
        page: String,
        /// Source file
        file: PathBuf,
    },

    /// Export a page's records
    Export {
        /// Page id
        page: String,
        #[arg(short, long, value_enum, default_value_t = Format::Csv)]
        format: Format,
        /// Only these record ids (comma-separated)
        #[arg(long, value_delimiter = ',')]
        ids: Vec<String>,
        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// Write a backup of all state
    Backup {
        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// Replace all state from a backup file
    Restore {
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Add an account
    Add {
        username: String,
        password: String,
        /// Grant the admin role
        #[arg(long)]
        admin: bool,
    },
    /// List accounts
    List,
}

#[derive(Subcommand, Debug)]
pub enum PageCommand {
    /// Create an empty page
    Create { name: String },
    /// List pages
    List,
    /// Rename a page
    Rename { page: String, name: String },
    /// Delete a page and its records
    Delete { page: String },
}

#[derive(Subcommand, Debug)]
pub enum ColumnsCommand {
    /// Print a page's columns
    Show { page: String },
    /// Replace the columns from a JSON array file
    Set { page: String, file: PathBuf },
    /// Append a default text column
    Add { page: String },
    /// Move a column one step
    Move {
        page: String,
        index: usize,
        #[arg(value_enum)]
        direction: Move,
    },
    /// Remove a column
    Remove { page: String, index: usize },
}

#[derive(Subcommand, Debug)]
pub enum RecordsCommand {
    /// List records as a table
    List {
        page: String,
        /// Column filter as key=text, repeatable
        #[arg(short, long)]
        filter: Vec<String>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        offset: Option<usize>,
    },
    /// Add a record; fields given as key=value
    Add { page: String, fields: Vec<String> },
    /// Update fields of an existing record
    Set {
        page: String,
        id: String,
        fields: Vec<String>,
    },
    /// Delete a record
    Delete { page: String, id: String },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Csv,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Move {
    Up,
    Down,
}
