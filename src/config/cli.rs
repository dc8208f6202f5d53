use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the notebook binary.
#[derive(Debug, Parser)]
#[command(
    name = "notebook",
    version,
    about = "Markdown notebook loader and server"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "NOTEBOOK_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Load the content tree, then serve the reload and style sheet endpoints.
    Serve(Box<ServeArgs>),
    /// Run one load-and-upsert cycle and exit.
    Load(LoadArgs),
    /// Print the colorization style sheet for the configured theme.
    Stylesheet(StylesheetArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct LoadArgs {
    #[command(flatten)]
    pub content: ContentOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct StylesheetArgs {
    /// Override the colorization theme.
    #[arg(long = "render-theme", value_name = "THEME")]
    pub theme: Option<String>,
}

/// Overrides shared by every command that walks the content tree.
#[derive(Debug, Args, Default, Clone)]
pub struct ContentOverrides {
    /// Override the content root directory.
    #[arg(long = "content-directory", value_name = "PATH")]
    pub content_directory: Option<PathBuf>,

    /// Override the SQLite database file.
    #[arg(long = "database-path", value_name = "PATH")]
    pub database_path: Option<PathBuf>,

    /// Override the site base URL used to classify links.
    #[arg(long = "site-base-url", value_name = "URL")]
    pub site_base_url: Option<String>,

    /// Override the colorization theme.
    #[arg(long = "render-theme", value_name = "THEME")]
    pub render_theme: Option<String>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub content: ContentOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,
}
