mod auth;
mod config;
mod http;
mod routes;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Duration;
use clap::{Args, Parser, Subcommand};
use migration::{Migrator, MigratorTrait};
use platform_authn::{AuthMethod, AuthenticatedPrincipal, GoogleOidc};
use platform_db::{DatabaseSettings, DbPool, connect};
use platform_notify::{CalendarService, DisabledCalendar, GoogleCalendar, SmtpMailer};
use platform_obs::{ObsConfig, init_tracing};
use platform_storage::S3Storage;
use products_taskboard::{Collaborators, Taskboard, TaskboardError, TaskboardSettings};
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    http::{AppState, ServeConfig},
};

#[derive(Parser, Debug)]
#[command(name = "taskboard-server", version, about = "Taskboard REST backend")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server.
    Serve(ServeCommand),
    /// Run database migrations.
    #[command(subcommand)]
    Migrate(MigrateCommand),
    /// Create a demo user, board and task when they are absent.
    Seed(SeedCommand),
}

#[derive(Subcommand, Debug)]
enum MigrateCommand {
    /// Apply pending migrations.
    Up,
    /// Rollback the most recent migration.
    Down,
}

#[derive(Args, Debug)]
struct ServeCommand {
    #[arg(long, default_value = "0.0.0.0")]
    host: std::net::IpAddr,
    #[arg(long, default_value_t = 8080)]
    port: u16,
    #[arg(long, help = "Allow starting even when migrations are pending")]
    allow_dirty: bool,
}

#[derive(Args, Debug)]
struct SeedCommand {
    #[arg(long, default_value = "demo@taskboard.local")]
    email: String,
    #[arg(long, env = "SEED_USER_PASSWORD")]
    password: String,
}

impl From<&ServeCommand> for ServeConfig {
    fn from(value: &ServeCommand) -> Self {
        ServeConfig::new(value.host, value.port)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(ObsConfig::from_env())?;
    let cli = Cli::parse();
    match cli.command {
        Command::Serve(cmd) => run_server(cmd).await,
        Command::Migrate(action) => match action {
            MigrateCommand::Up => migrate_up().await,
            MigrateCommand::Down => migrate_down().await,
        },
        Command::Seed(cmd) => run_seed(cmd).await,
    }
}

async fn setup_pool() -> Result<DbPool> {
    let settings = DatabaseSettings::from_env();
    connect(&settings).await.map_err(Into::into)
}

async fn build_taskboard(pool: DbPool, config: &AppConfig) -> Result<Taskboard> {
    let mailer = SmtpMailer::new(&config.smtp).context("invalid SMTP settings")?;
    let calendar: Arc<dyn CalendarService> = match &config.calendar {
        Some(calendar) => Arc::new(GoogleCalendar::new(calendar.clone())),
        None => {
            warn!("google calendar not configured; due-date updates will fail");
            Arc::new(DisabledCalendar)
        }
    };
    let storage = S3Storage::connect(config.s3.clone()).await;
    Ok(Taskboard::new(
        pool,
        Collaborators {
            mailer: Arc::new(mailer),
            calendar,
            storage: Arc::new(storage),
        },
        TaskboardSettings {
            calendar_sender: config.calendar_sender.clone(),
            reset_code_ttl: Duration::minutes(config.reset_code_ttl_minutes),
        },
    ))
}

async fn run_server(cmd: ServeCommand) -> Result<()> {
    let config = AppConfig::load()?;
    let pool = setup_pool().await?;
    ensure_migrations(&pool, cmd.allow_dirty).await?;
    let oidc = match &config.google {
        Some(provider) => Some(Arc::new(
            GoogleOidc::discover(provider)
                .await
                .context("google oidc discovery failed")?,
        )),
        None => None,
    };
    let taskboard = build_taskboard(pool, &config).await?;
    let state = AppState {
        taskboard,
        auth: Arc::new(config.auth.clone()),
        oidc,
        cookie_key: config.cookie_key.clone(),
        cors_allowed_origins: config.cors_allowed_origins.clone().into(),
    };
    http::serve((&cmd).into(), state).await
}

async fn ensure_migrations(pool: &DbPool, allow_dirty: bool) -> Result<()> {
    let pending = Migrator::get_pending_migrations(pool).await?;
    if !pending.is_empty() && !allow_dirty {
        anyhow::bail!(
            "pending migrations detected; run `cargo run -p server -- migrate up` or pass --allow-dirty"
        );
    }
    Ok(())
}

async fn migrate_up() -> Result<()> {
    let pool = setup_pool().await?;
    Migrator::up(&pool, None).await?;
    info!("database migrations applied");
    Ok(())
}

async fn migrate_down() -> Result<()> {
    let pool = setup_pool().await?;
    Migrator::down(&pool, Some(1)).await?;
    info!("most recent migration rolled back");
    Ok(())
}

async fn run_seed(cmd: SeedCommand) -> Result<()> {
    let config = AppConfig::load()?;
    let pool = setup_pool().await?;
    ensure_migrations(&pool, false).await?;
    let taskboard = build_taskboard(pool, &config).await?;

    let user = match taskboard.login(&cmd.email, &cmd.password).await {
        Ok(user) => user,
        Err(TaskboardError::NotFound(_)) => taskboard.signup(&cmd.email, &cmd.password).await?,
        Err(err) => return Err(err).context("seed user exists with another password"),
    };
    let principal = AuthenticatedPrincipal::new(user.id, user.email.clone(), AuthMethod::Password);
    let boards = taskboard.list_boards().await?;
    if boards.iter().any(|board| board.board_created_by.user_id == user.id) {
        info!(user_id = user.id, "seed data already present");
        return Ok(());
    }
    let board = taskboard.create_board(&principal, "Sprint 1").await?;
    let task = taskboard.create_task(&principal, board.id, "Design").await?;
    info!(user_id = user.id, board_id = board.id, task_id = task.task_id, "seed data created");
    Ok(())
}
