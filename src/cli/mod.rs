mod commands;
pub mod error;
pub mod utils;


use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::error::{CliError, CliResult};
use crate::db::{AnyStorage, BackendKind, StorageConfig, default_db_path};

#[derive(Parser)]
#[command(name = "feedstore")]
#[command(author, version, about = "Feed reader storage administration", long_about = None)]
pub struct Cli {
    /// Storage backend: relational or embedded
    #[arg(long, global = true, env = "FEEDSTORE_BACKEND", default_value = "embedded")]
    pub backend: BackendKind,

    /// Connection URI for the relational backend (e.g. sqlite://feeds.db)
    #[arg(long, global = true, env = "FEEDSTORE_URI")]
    pub uri: Option<String>,

    /// Database file for the embedded backend (defaults to XDG data directory)
    #[arg(long, global = true, env = "FEEDSTORE_PATH")]
    pub path: Option<PathBuf>,

    /// Output format (table or json)
    #[arg(long, global = true, default_value = "table")]
    pub format: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// User management commands
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Feed subscription commands
    Feed {
        #[command(subcommand)]
        command: FeedCommands,
    },
    /// Story commands
    Story {
        #[command(subcommand)]
        command: StoryCommands,
    },
    /// Setting commands
    Setting {
        #[command(subcommand)]
        command: SettingCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a user
    Add {
        username: String,
        /// Password hash, stored as given
        password: String,
    },
    /// List usernames
    List,
    /// Remove a user
    Remove { username: String },
    /// Replace a user's password hash
    Passwd { username: String, password: String },
}

#[derive(Subcommand)]
enum FeedCommands {
    /// Subscribe to a feed
    Add {
        title: String,
        url: String,
        /// Last update time (RFC 3339)
        #[arg(long)]
        last_update: Option<String>,
    },
    /// List feeds
    List,
    /// Show a feed by id or title
    Show {
        id: Option<String>,
        /// Look the feed up by exact title instead
        #[arg(long, conflicts_with = "id")]
        title: Option<String>,
    },
    /// Remove a feed and all of its stories
    Remove { id: String },
}

#[derive(Subcommand)]
enum StoryCommands {
    /// Add a story to a feed
    Add {
        feed_id: String,
        title: String,
        url: String,
        #[arg(long)]
        description: Option<String>,
        /// Publication time (RFC 3339)
        #[arg(long)]
        published: Option<String>,
    },
    /// List the stories of a feed
    List { feed_id: String },
    /// List the unread stories of a feed
    Unread { feed_id: String },
    /// Show a story
    Show { id: String },
    /// Mark a story as read
    MarkRead {
        id: String,
        /// Mark as unread instead
        #[arg(long)]
        unread: bool,
    },
    /// Remove a story
    Remove { id: String },
}

#[derive(Subcommand)]
enum SettingCommands {
    /// Print a setting as JSON
    Get { key: String },
    /// Set a setting; the value is parsed as JSON, or stored as a string
    Set { key: String, value: String },
    /// List all settings
    List,
}

/// Initialize tracing subscriber with env filter
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feedstore=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn storage_config(cli: &Cli) -> CliResult<StorageConfig> {
    let path = match (cli.backend, &cli.path) {
        (BackendKind::Embedded, None) => {
            let path = default_db_path().ok_or_else(|| CliError::InvalidInput {
                message: "no --path given and no XDG_DATA_HOME or HOME to default to".to_string(),
            })?;
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            Some(path)
        }
        (_, path) => path.clone(),
    };

    Ok(StorageConfig::from_options(cli.backend, cli.uri.clone(), path)?)
}

async fn dispatch(storage: &AnyStorage, command: Commands, format: &str) -> CliResult<String> {
    match command {
        Commands::User { command } => match command {
            UserCommands::Add { username, password } => {
                commands::user::add_user(storage, &username, &password).await
            }
            UserCommands::List => commands::user::list_users(storage, format).await,
            UserCommands::Remove { username } => {
                commands::user::remove_user(storage, &username).await
            }
            UserCommands::Passwd { username, password } => {
                commands::user::set_password(storage, &username, &password).await
            }
        },
        Commands::Feed { command } => match command {
            FeedCommands::Add {
                title,
                url,
                last_update,
            } => commands::feed::add_feed(storage, &title, &url, last_update.as_deref()).await,
            FeedCommands::List => commands::feed::list_feeds(storage, format).await,
            FeedCommands::Show { id, title } => {
                commands::feed::show_feed(storage, id.as_deref(), title.as_deref(), format).await
            }
            FeedCommands::Remove { id } => commands::feed::remove_feed(storage, &id).await,
        },
        Commands::Story { command } => match command {
            StoryCommands::Add {
                feed_id,
                title,
                url,
                description,
                published,
            } => {
                let story = commands::story::NewStory {
                    feed_id: &feed_id,
                    title: &title,
                    url: &url,
                    description: description.as_deref(),
                    published: published.as_deref(),
                };
                commands::story::add_story(storage, story).await
            }
            StoryCommands::List { feed_id } => {
                commands::story::list_stories(storage, &feed_id, format).await
            }
            StoryCommands::Unread { feed_id } => {
                commands::story::list_unread(storage, &feed_id, format).await
            }
            StoryCommands::Show { id } => commands::story::show_story(storage, &id, format).await,
            StoryCommands::MarkRead { id, unread } => {
                commands::story::mark_read(storage, &id, !unread).await
            }
            StoryCommands::Remove { id } => commands::story::remove_story(storage, &id).await,
        },
        Commands::Setting { command } => match command {
            SettingCommands::Get { key } => commands::setting::get_setting(storage, &key).await,
            SettingCommands::Set { key, value } => {
                commands::setting::set_setting(storage, &key, &value).await
            }
            SettingCommands::List => commands::setting::list_settings(storage, format).await,
        },
    }
}

pub async fn run() -> miette::Result<()> {
    let mut cli = Cli::parse();
    init_tracing();

    let Some(command) = cli.command.take() else {
        // Show help when no command provided
        let _ = Cli::parse_from(["feedstore", "--help"]);
        return Ok(());
    };

    let config = storage_config(&cli)?;
    let storage = AnyStorage::open(&config).await.map_err(CliError::from)?;
    let output = dispatch(&storage, command, &cli.format).await?;
    println!("{}", output);
    Ok(())
}
