//! musicstream-web - music and podcast sharing site
//!
//! `serve` (the default) runs the HTTP server. `create-admin` creates a
//! staff account, or promotes and resets the password of an existing one.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use musicstream_common::config::{
    clamp_session_ttl_hours, CompiledDefaults, RootFolderInitializer, RootFolderResolver,
    TomlConfig,
};
use musicstream_common::db::{get_setting_i64, init_database};
use musicstream_web::db::users::NewUser;
use musicstream_web::forms::users::{is_valid_username, password_problems, USERNAME_MAX};
use musicstream_web::media::MediaStore;
use musicstream_web::pagination::MAX_PAGE_SIZE;
use musicstream_web::{build_router, db, AppSettings, AppState};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

/// How often expired sessions are deleted
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(3600);

#[derive(Debug, Parser)]
#[command(name = "musicstream-web", version, about = "Music and podcast sharing site")]
struct Cli {
    /// Root folder holding the database and media (overrides env and config)
    #[arg(long, global = true)]
    root_folder: Option<PathBuf>,

    /// Config file (default: <config dir>/musicstream/config.toml)
    #[arg(long, global = true, env = "MUSICSTREAM_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:8000 (overrides config)
    #[arg(long, global = true)]
    bind: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the web server (default)
    Serve,
    /// Create a staff account
    CreateAdmin {
        #[arg(long)]
        username: String,
        #[arg(long, env = "MUSICSTREAM_ADMIN_PASSWORD")]
        password: String,
        #[arg(long, default_value = "")]
        email: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = TomlConfig::load_or_default(cli.config.as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!(
        "Starting MusicStream (musicstream-web) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = RootFolderResolver::new()
        .with_cli_arg(cli.root_folder.clone())
        .with_toml(&config)
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer.ensure_directory_exists()?;
    info!("Root folder: {}", initializer.root_folder().display());

    let db_path = initializer.database_path();
    let pool = match init_database(&db_path).await {
        Ok(pool) => {
            info!("✓ Database ready at {}", db_path.display());
            pool
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };

    match cli.command {
        Some(Command::CreateAdmin {
            username,
            password,
            email,
        }) => create_admin(&pool, &username, &password, &email).await,
        Some(Command::Serve) | None => serve(pool, &config, &initializer, cli.bind).await,
    }
}

async fn serve(
    pool: SqlitePool,
    config: &TomlConfig,
    initializer: &RootFolderInitializer,
    bind: Option<String>,
) -> Result<()> {
    let defaults = AppSettings::default();
    let suggested_users_count = get_setting_i64(
        &pool,
        "suggested_users_count",
        defaults.suggested_users_count as i64,
    )
    .await?;
    let admin_list_per_page =
        get_setting_i64(&pool, "admin_list_per_page", defaults.admin_list_per_page).await?;

    let settings = AppSettings {
        session_ttl_hours: clamp_session_ttl_hours(config.session.ttl_hours),
        cookie_secure: config.session.cookie_secure,
        max_upload_bytes: config.uploads.max_upload_bytes(),
        suggested_users_count: usize::try_from(suggested_users_count.max(0)).unwrap_or(0),
        admin_list_per_page: admin_list_per_page.clamp(1, MAX_PAGE_SIZE),
    };
    info!(
        "Session lifetime {}h, upload limit {} bytes",
        settings.session_ttl_hours, settings.max_upload_bytes
    );

    let purge_pool = pool.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            match db::sessions::purge_expired(&purge_pool).await {
                Ok(0) => {}
                Ok(n) => info!("Purged {} expired sessions", n),
                Err(e) => warn!("Session purge failed: {}", e),
            }
        }
    });

    let state = AppState::new(pool, MediaStore::new(initializer.media_path()), settings);
    let app = build_router(state, initializer.static_path());

    let bind_addr = bind
        .or_else(|| config.bind_addr.clone())
        .unwrap_or_else(|| CompiledDefaults::for_current_platform().bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!("musicstream-web listening on http://{}", bind_addr);
    info!("Health check: http://{}/health", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn create_admin(pool: &SqlitePool, username: &str, password: &str, email: &str) -> Result<()> {
    if username.is_empty() || username.chars().count() > USERNAME_MAX || !is_valid_username(username) {
        bail!("Invalid username '{}'", username);
    }
    let problems = password_problems(password, username);
    if !problems.is_empty() {
        bail!("Password rejected: {}", problems.join(" "));
    }

    match db::users::get_user_by_username(pool, username).await? {
        Some(user) => {
            db::users::set_password(pool, user.id, password).await?;
            db::users::set_staff(pool, user.id, true).await?;
            info!("Updated existing user {} as staff", username);
        }
        None => {
            let id = db::users::create_user(
                pool,
                &NewUser {
                    username,
                    email,
                    password,
                    is_staff: true,
                    ..Default::default()
                },
            )
            .await?;
            info!("Created staff user {} ({})", username, id);
        }
    }
    Ok(())
}
