use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use folio::seed::{self, AdminOutcome};
use folio::web::WebServer;
use folio::{Config, Database};

#[derive(Parser)]
#[command(name = "folio")]
#[command(version, about = "Folio - a personal blog REST API")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "FOLIO_CONFIG", default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Create the administrator account from the [admin] section
    CreateAdmin,
    /// Insert the sample categories
    SeedCategories,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load_with_env(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", cli.config.display());
            eprintln!("Using default configuration with environment overrides.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    if let Err(e) = folio::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        folio::logging::init_console_only(&config.logging.level);
    }

    match run(cli.command.unwrap_or(Command::Serve), config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: Config) -> folio::Result<()> {
    config.validate()?;
    let db = Database::open(&config.database.path, config.database.max_connections).await?;

    match command {
        Command::Serve => {
            info!("Folio - personal blog API");
            info!(
                environment = %config.server.environment,
                "Server configured on {}:{}",
                config.server.host,
                config.server.port
            );
            WebServer::new(config, db)?.run().await?;
        }
        Command::CreateAdmin => match seed::create_admin(&db, &config.admin).await? {
            AdminOutcome::Created(user) => {
                info!(username = %user.username, email = %user.email, "Admin account created")
            }
            AdminOutcome::AlreadyExists(user) => {
                info!(username = %user.username, "An admin account already exists")
            }
        },
        Command::SeedCategories => {
            let created = seed::seed_categories(&db).await?;
            info!(created, "Categories seeded");
        }
    }

    Ok(())
}
