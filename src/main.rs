use clap::{Parser, Subcommand};
use std::sync::Arc;

use quiz_admin::auth::AdminAuth;
use quiz_admin::catalog::CatalogManager;
use quiz_admin::config::Config;
use quiz_admin::logging;
use quiz_admin::server::start_server;
use quiz_admin::storage::CatalogStore;

#[derive(Parser)]
#[command(name = "quiz_admin")]
#[command(about = "Admin backend for quiz catalog management")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP admin API
    Serve {
        /// Port override (defaults to the configured port)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Delete every theme and question from the store
    ClearDb,
}

#[cfg(feature = "db")]
async fn open_store(config: &Config) -> Result<Arc<dyn CatalogStore>, Box<dyn std::error::Error>> {
    use quiz_admin::db::DatabaseManager;
    use quiz_admin::storage::DatabaseStore;

    let manager = DatabaseManager::connect(&config.database).await?;
    Ok(Arc::new(DatabaseStore::open(manager).await?))
}

#[cfg(not(feature = "db"))]
async fn open_store(_config: &Config) -> Result<Arc<dyn CatalogStore>, Box<dyn std::error::Error>> {
    use quiz_admin::storage::InMemoryStore;

    tracing::warn!("Built without the `db` feature; catalog data will not survive a restart");
    Ok(Arc::new(InMemoryStore::new()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load()?;

    let store = open_store(&config).await?;

    match cli.command {
        Commands::Serve { port } => {
            let auth = Arc::new(AdminAuth::from_env()?);
            let catalog = Arc::new(CatalogManager::new(store));
            let port = port.unwrap_or(config.server.port);

            start_server(catalog, auth, &config.server.host, port).await?;
        }
        Commands::ClearDb => {
            store.clear_all().await?;
            println!("✅ Cleared all themes and questions");
        }
    }

    Ok(())
}
