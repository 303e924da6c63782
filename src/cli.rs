//! Command-line interface definitions for HighLight Sport.
//!
//! All arguments can be provided via command-line flags or environment variables.
//! Values given here override the YAML settings file.

use clap::Parser;

/// Command-line arguments for the HighLight Sport bot.
///
/// # Examples
///
/// ```sh
/// # Run the bot with defaults (token from the environment)
/// BOT_TOKEN=123:abc highlight_sport
///
/// # Use a settings file and a different channel
/// highlight_sport -c settings.yaml --channel-id @my_channel
///
/// # Publish one cycle and exit
/// highlight_sport --run-once
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Telegram bot token
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    pub bot_token: String,

    /// Optional path to a YAML settings file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Channel to publish to (`@username` or numeric id)
    #[arg(long, env = "CHANNEL_ID")]
    pub channel_id: Option<String>,

    /// Telegram user ids allowed to run admin commands, comma separated
    #[arg(long, env = "ADMIN_IDS", value_delimiter = ',')]
    pub admin_ids: Vec<i64>,

    /// Path of the posted-titles JSON file
    #[arg(long, env = "POSTED_FILE")]
    pub posted_file: Option<String>,

    /// Path of the log file
    #[arg(long, env = "LOG_FILE")]
    pub log_file: Option<String>,

    /// Run a single publishing cycle and exit instead of starting the bot
    #[arg(long)]
    pub run_once: bool,
}
