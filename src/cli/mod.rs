pub mod call;
pub mod errors;
pub mod render;
pub mod tracing_init;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Output as JSON (default)
    Json,
    /// Output as YAML
    Yaml,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "restwire: call HTTP APIs through declared, typed operations",
    long_about = "restwire declares an HTTP operation from the command line and calls it.\n\
                  Arguments are placed the way a declared operation would place them:\n\
                  names matching a {placeholder} fill the path, JSON objects become the\n\
                  body, everything else goes to the query string.\n\n\
                  Examples:\n  \
                  restwire call GET https://httpbin.org/anything/{id} --arg id=42\n  \
                  restwire call POST /items --arg item='{\"name\":\"lamp\"}' --dry-run\n  \
                  restwire config set-base-url https://api.example.com"
)]
pub struct Cli {
    /// Output all errors as structured JSON to stderr
    #[arg(long, global = true, help = "Output errors in JSON format")]
    pub json_errors: bool,

    /// Increase logging verbosity
    #[arg(
        short = 'v',
        global = true,
        action = ArgAction::Count,
        help = "Increase logging verbosity (-v for debug, -vv for trace)"
    )]
    pub verbosity: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Declare an operation on the fly and call it
    Call {
        /// HTTP method (GET, POST, ...)
        method: String,
        /// URL, absolute or relative to the configured base URL; may contain {placeholders}
        url: String,
        /// Argument as NAME=VALUE; VALUE is read as JSON when it parses, otherwise as text
        #[arg(long = "arg", short = 'a', value_name = "NAME=VALUE")]
        args: Vec<String>,
        /// Header as NAME:VALUE
        #[arg(long = "header", short = 'H', value_name = "NAME:VALUE")]
        headers: Vec<String>,
        /// Print the composed request instead of sending it
        #[arg(long)]
        dry_run: bool,
        /// Output format for the result
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
    /// Manage the client configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration, environment overrides applied
    Show {},
    /// Store the base URL relative call URLs are joined onto
    SetBaseUrl {
        /// Base URL, such as https://api.example.com/v1
        url: String,
    },
}
