//! `carewatch` CLI entry-point.
//!
//! Available sub-commands:
//! - `serve`: start the HTTP server.
//! - `migrate`: run pending database migrations.
//! - `validate-policy`: check an alert policy TOML file.
//! - `create-admin`: add a back-office account for reviewing borrows.

use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use api::{AppState, LiffUrls, ServerConfig};
use monitor::{account::UserRole, AlertPolicy, Assessor};
use notify::{line::DEFAULT_API_BASE, LineClient, RetryConfig};

#[derive(Parser)]
#[command(
    name = "carewatch",
    about = "Elderly-care monitoring backend: wearable telemetry, safe zones and LINE alerts",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server.
    Serve(ServeArgs),
    /// Run pending database migrations.
    Migrate {
        #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
        database_url: String,
    },
    /// Parse and validate an alert policy file.
    ValidatePolicy {
        /// Path to the policy TOML file.
        path: PathBuf,
    },
    /// Create an admin account; its id is what `?reviewer=` expects.
    CreateAdmin {
        #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
        database_url: String,
        /// Name recorded on reviewed borrows.
        #[arg(long)]
        name: String,
        /// Link a LINE account so the admin can also use the chat commands.
        #[arg(long)]
        line_user_id: Option<String>,
    },
}

#[derive(Args)]
struct ServeArgs {
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    bind: SocketAddr,

    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 10)]
    max_connections: u32,

    /// Apply migrations before accepting traffic.
    #[arg(long)]
    migrate: bool,

    #[arg(long, env = "LINE_CHANNEL_SECRET", hide_env_values = true)]
    line_channel_secret: String,

    #[arg(long, env = "LINE_CHANNEL_ACCESS_TOKEN", hide_env_values = true)]
    line_channel_access_token: String,

    #[arg(long, env = "LINE_API_BASE", default_value = DEFAULT_API_BASE)]
    line_api_base: String,

    /// Bearer token for `/api/admin/*`.
    #[arg(long, env = "ADMIN_TOKEN", hide_env_values = true)]
    admin_token: String,

    #[arg(long, env = "LIFF_REGISTER_URL", default_value = "")]
    liff_register_url: String,

    #[arg(long, env = "LIFF_BORROW_URL", default_value = "")]
    liff_borrow_url: String,

    #[arg(long, env = "LIFF_SETTINGS_URL", default_value = "")]
    liff_settings_url: String,

    /// Alert policy TOML; built-in defaults when omitted.
    #[arg(long, env = "ALERT_POLICY")]
    policy: Option<PathBuf>,

    /// Retries for a failed push notification.
    #[arg(long, env = "NOTIFY_MAX_RETRIES", default_value_t = 3)]
    notify_max_retries: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loaded before the subscriber so RUST_LOG can come from the file.
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=info")),
        )
        .init();

    match dotenv {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) => debug!("No .env file loaded: {e}"),
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Migrate { database_url } => {
            let pool = db::pool::create_pool(&database_url, 2)
                .await
                .context("failed to connect to database")?;
            db::pool::run_migrations(&pool).await.context("migration failed")?;
            info!("Migrations applied successfully");
            Ok(())
        }
        Command::ValidatePolicy { path } => {
            let policy = AlertPolicy::load(&path)?;
            println!("Policy is valid: {policy:#?}");
            Ok(())
        }
        Command::CreateAdmin {
            database_url,
            name,
            line_user_id,
        } => create_admin(&database_url, &name, line_user_id.as_deref()).await,
    }
}

async fn create_admin(database_url: &str, name: &str, line_user_id: Option<&str>) -> anyhow::Result<()> {
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("--name must not be empty");
    }

    let pool = db::pool::create_pool(database_url, 2)
        .await
        .context("failed to connect to database")?;
    let user = db::repository::users::create_user(&pool, line_user_id, name, &UserRole::Admin.to_string())
        .await
        .context("failed to create admin")?;

    info!(user_id = %user.id, "Admin account created");
    println!("Created admin {} with id {}", user.display_name, user.id);
    Ok(())
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    if args.admin_token.trim().is_empty() {
        anyhow::bail!("ADMIN_TOKEN must not be empty");
    }

    let policy = match &args.policy {
        Some(path) => AlertPolicy::load(path)?,
        None => AlertPolicy::default(),
    };

    let pool = db::pool::create_pool(&args.database_url, args.max_connections)
        .await
        .context("failed to connect to database")?;
    if args.migrate {
        db::pool::run_migrations(&pool).await.context("migration failed")?;
    }

    let notifier = LineClient::with_base(&args.line_api_base, &args.line_channel_access_token)?;

    let config = ServerConfig {
        line_channel_secret: args.line_channel_secret,
        admin_token: args.admin_token,
        liff: LiffUrls {
            register: args.liff_register_url,
            borrow: args.liff_borrow_url,
            settings: args.liff_settings_url,
        },
        retry: RetryConfig {
            max_retries: args.notify_max_retries,
            base_delay: Duration::from_millis(200),
        },
    };
    info!(?config, "Starting carewatch");

    let state = AppState::new(pool, Arc::new(notifier), Assessor::new(policy), config);
    api::serve(args.bind, state).await.context("server error")?;
    Ok(())
}
