use clap::Parser;
use restwire::cli::errors::print_error_with_json;
use restwire::cli::tracing_init::init_tracing;
use restwire::cli::{call, render, Cli, Commands, ConfigCommands};
use restwire::config::manager::ConfigManager;
use restwire::engine::Client;
use restwire::error::Error;
use restwire::fs::OsFileSystem;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_errors = cli.json_errors;
    init_tracing(cli.verbosity);

    let manager = match ConfigManager::new() {
        Ok(manager) => manager,
        Err(e) => {
            print_error_with_json(&e, json_errors);
            std::process::exit(1);
        }
    };

    if let Err(e) = run_command(cli, &manager).await {
        print_error_with_json(&e, json_errors);
        std::process::exit(1);
    }
}

async fn run_command(cli: Cli, manager: &ConfigManager<OsFileSystem>) -> Result<(), Error> {
    match cli.command {
        Commands::Call {
            method,
            url,
            args,
            headers,
            dry_run,
            format,
        } => {
            let config = manager.load_effective_config()?;
            let client = Client::from_config(&config)?;
            let (operation, arguments) = call::declare(&method, &url, &args, &headers, dry_run)?;
            let output = client.call(&operation, arguments).await?;
            println!("{}", render::render(&output, format)?);
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show {} => {
                let config = manager.load_effective_config()?;
                let rendered = toml::to_string_pretty(&config)
                    .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;
                println!("# {}", manager.config_dir().display());
                print!("{rendered}");
            }
            ConfigCommands::SetBaseUrl { url } => {
                let mut config = manager.load_config()?;
                config.base_url = Some(url.clone());
                manager.save_config(&config)?;
                println!("Set base URL: {url}");
            }
        },
    }

    Ok(())
}
