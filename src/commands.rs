//! CLI command definitions and dispatch.

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use filehub_core::config::AppConfig;
use filehub_core::error::AppError;
use filehub_database::DatabasePool;
use filehub_service::user::CreateAccountRequest;
use filehub_service::{RequestContext, Services, TracingActivityLogger};
use filehub_storage::StorageManager;

/// FileHub: multi-tenant file storage administration
#[derive(Debug, Parser)]
#[command(name = "filehub", version, about, long_about = None)]
pub struct Cli {
    /// Configuration overlay to load (`config/{env}.toml`)
    #[arg(short, long, env = "FILEHUB_ENV", default_value = "development")]
    pub env: String,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run pending database migrations
    Migrate,
    /// Check database and storage connectivity
    Check,
    /// User management
    User(UserArgs),
    /// Trash management
    Trash(TrashArgs),
}

/// Arguments for user commands
#[derive(Debug, Args)]
pub struct UserArgs {
    /// User subcommand
    #[command(subcommand)]
    pub command: UserCommand,
}

/// User subcommands
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Create an account with its root folder
    Create {
        /// Login email
        #[arg(long)]
        email: String,
        /// Byte quota (configured default when omitted)
        #[arg(long)]
        quota: Option<i64>,
    },
    /// Show used bytes against quota
    Usage {
        /// Login email
        #[arg(long)]
        email: String,
    },
}

/// Arguments for trash commands
#[derive(Debug, Args)]
pub struct TrashArgs {
    /// Trash subcommand
    #[command(subcommand)]
    pub command: TrashCommand,
}

/// Trash subcommands
#[derive(Debug, Subcommand)]
pub enum TrashCommand {
    /// List a user's trashed items
    List {
        /// Login email
        #[arg(long)]
        email: String,
    },
    /// Permanently delete everything in a user's trash
    Empty {
        /// Login email
        #[arg(long)]
        email: String,
    },
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        let pool = DatabasePool::connect(&config.database).await?;
        let result = self.dispatch(&pool, &config).await;
        pool.close().await;
        result
    }

    async fn dispatch(&self, pool: &DatabasePool, config: &AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate => {
                filehub_database::migration::run_migrations(pool.pool()).await?;
                info!("Database migrations complete");
                print_success("Migrations applied");
                Ok(())
            }
            Commands::Check => {
                let storage = StorageManager::from_config(&config.storage).await?;
                let report = serde_json::json!({
                    "database": pool.health_check().await?,
                    "storage": storage.health_check().await?,
                    "storage_provider": storage.provider_type(),
                });
                print_json(&report)
            }
            Commands::User(args) => {
                let services = build_services(pool, config).await?;
                match &args.command {
                    UserCommand::Create { email, quota } => {
                        let user = services
                            .users
                            .create_account(CreateAccountRequest {
                                email: email.clone(),
                                storage_quota_bytes: *quota,
                            })
                            .await?;
                        print_json(&user)
                    }
                    UserCommand::Usage { email } => {
                        let user = services.users.find_by_email(email).await?;
                        print_json(&services.users.usage(user.id).await?)
                    }
                }
            }
            Commands::Trash(args) => {
                let services = build_services(pool, config).await?;
                match &args.command {
                    TrashCommand::List { email } => {
                        let user = services.users.find_by_email(email).await?;
                        let ctx = RequestContext::new(user.id);
                        print_json(&services.trash.list(&ctx).await?)
                    }
                    TrashCommand::Empty { email } => {
                        let user = services.users.find_by_email(email).await?;
                        let ctx = RequestContext::new(user.id);
                        let report = services.trash.empty(&ctx).await?;
                        if !report.is_clean() {
                            print_warning(&format!(
                                "{} storage objects could not be deleted",
                                report.failed_objects.len()
                            ));
                        }
                        print_json(&report)
                    }
                }
            }
        }
    }
}

/// Helper: wire services over PostgreSQL and the configured storage
async fn build_services(pool: &DatabasePool, config: &AppConfig) -> Result<Services, AppError> {
    let storage = StorageManager::from_config(&config.storage).await?;
    Ok(Services::new(
        pool.repositories(),
        Arc::new(storage),
        Arc::new(TracingActivityLogger),
        config.quota.clone(),
    ))
}

/// Print a value as pretty JSON
fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
fn print_success(msg: &str) {
    println!("✓ {msg}");
}

/// Print a warning message
fn print_warning(msg: &str) {
    eprintln!("⚠ {msg}");
}
