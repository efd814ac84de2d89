use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use vidboard::api::ApiClient;
use vidboard::app::{App, AppEvent};
use vidboard::config::Config;
use vidboard::dashboard::Dashboard;
use vidboard::keybindings::KeybindingRegistry;
use vidboard::model::DurationSetting;
use vidboard::theme::ThemeVariant;
use vidboard::ui;
use vidboard::view::NO_CATEGORIES;

/// Get the config directory path (~/.config/vidboard/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let config_dir = PathBuf::from(home).join(".config").join("vidboard");
    Ok(config_dir)
}

#[derive(Parser, Debug)]
#[command(
    name = "vidboard",
    version,
    about = "Terminal dashboard for a categorized video feed backend"
)]
struct Args {
    /// Backend root URL (overrides the config file)
    #[arg(long, env = "VIDBOARD_SERVER", value_name = "URL", global = true)]
    server: Option<String>,

    /// Config file (default: ~/.config/vidboard/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the categorized feed as text
    Print,
    /// Ask the backend to collect new videos, then print the feed
    Refresh,
    /// Print categories and their channels
    Prefs,
    /// Create a category
    AddCategory { name: String },
    /// Delete a category and its channel assignments
    DeleteCategory { name: String },
    /// Assign a channel to a category
    AddChannel { channel: String, category: String },
    /// Unassign a channel, from one category or from all of them
    RemoveChannel {
        channel: String,
        #[arg(long)]
        category: Option<String>,
    },
    /// Show the retention window, or set it with --days/--months
    Duration {
        #[arg(long)]
        days: Option<u32>,
        #[arg(long)]
        months: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_dir = get_config_dir()?;
    ensure_config_dir(&config_dir)?;

    // The dashboard owns the terminal, so its logs go to a file
    if args.command.is_none() {
        let log_path = config_dir.join("vidboard.log");
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("Failed to open log file {}", log_path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::sync::Mutex::new(log_file))
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    if let Some(server) = &args.server {
        config.server_url = server.clone();
    }

    let client = ApiClient::new(&config.api_settings()).context("Failed to create API client")?;
    let mut dashboard = Dashboard::new(client);

    match args.command {
        None => run_dashboard(dashboard, &config).await,
        Some(command) => run_command(&mut dashboard, command).await,
    }
}

fn ensure_config_dir(config_dir: &Path) -> Result<()> {
    if !config_dir.exists() {
        std::fs::create_dir_all(config_dir).context("Failed to create config directory")?;
    }

    // Set directory permissions on Unix (user-only access)
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(config_dir) {
            Ok(metadata) => {
                let mut perms = metadata.permissions();
                perms.set_mode(0o700);
                if let Err(e) = std::fs::set_permissions(config_dir, perms) {
                    eprintln!(
                        "Warning: failed to set {} permissions to 0700: {}",
                        config_dir.display(),
                        e
                    );
                }
            }
            Err(e) => {
                eprintln!(
                    "Warning: failed to read {} metadata: {}",
                    config_dir.display(),
                    e
                );
            }
        }
    }

    Ok(())
}

async fn run_dashboard(dashboard: Dashboard, config: &Config) -> Result<()> {
    let mut keybindings = KeybindingRegistry::new();
    for warning in keybindings.apply_overrides(&config.keybindings) {
        tracing::warn!(%warning, "Keybinding override skipped");
    }

    let theme = ThemeVariant::from_str_name(&config.theme).unwrap_or_else(|| {
        tracing::warn!(theme = %config.theme, "Unknown theme, using dark");
        ThemeVariant::default()
    });

    let mut app = App::new(dashboard, keybindings, theme);
    app.refresh_interval = config.refresh_interval();

    // Create event channel for background tasks
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);

    ui::run(&mut app, event_tx, event_rx).await
}

async fn run_command(dashboard: &mut Dashboard, command: Command) -> Result<()> {
    match command {
        Command::Print => {
            dashboard.load_feed().await?;
            print_feed(dashboard)?;
        }
        Command::Refresh => {
            dashboard.refresh_feed().await?;
            print_feed(dashboard)?;
        }
        Command::Prefs => {
            dashboard.load_preferences().await?;
            let mut out = String::new();
            match dashboard.manager_view() {
                Some(view) => view.write_text(&mut out)?,
                None => out.push_str(NO_CATEGORIES),
            }
            print!("{}", out);
        }
        Command::AddCategory { name } => {
            println!("{}", dashboard.add_category(&name).await?);
        }
        Command::DeleteCategory { name } => {
            println!("{}", dashboard.delete_category(&name).await?);
        }
        Command::AddChannel { channel, category } => {
            println!("{}", dashboard.add_channel(&channel, &category).await?);
        }
        Command::RemoveChannel { channel, category } => {
            let message = dashboard
                .remove_channel(&channel, category.as_deref())
                .await?;
            println!("{}", message);
        }
        Command::Duration { days, months } => {
            if days.is_none() && months.is_none() {
                let setting = dashboard.load_duration_setting().await?;
                println!("{}", setting);
            } else {
                let setting = DurationSetting {
                    days: days.unwrap_or(DurationSetting::DEFAULT_DAYS),
                    months: months.unwrap_or(DurationSetting::DEFAULT_MONTHS),
                };
                dashboard.save_duration_setting(setting).await?;
                println!("Duration set to {}", setting);
            }
        }
    }
    Ok(())
}

fn print_feed(dashboard: &Dashboard) -> Result<()> {
    let view = dashboard
        .view(Utc::now())
        .context("Backend returned no feed")?;
    let mut out = String::new();
    view.write_text(&mut out)?;
    print!("{}", out);
    Ok(())
}
