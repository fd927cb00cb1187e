//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod history;
pub mod provider_list;
pub mod say;
pub mod settings;
pub mod theme;


use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::history::{delete_conversation, list_history, show_conversation};
use crate::cli::provider_list::list_providers;
use crate::cli::say::run_say;
use crate::cli::settings::{apply_set, apply_unset};
use crate::cli::theme::set_theme;
use crate::core::config::Config;
use crate::core::store::{FileKeyValueStore, PersistentState};
use crate::logging::{self, LogTarget};
use crate::ui::chat_loop::run_chat;

#[derive(Parser)]
#[command(name = "deepchat")]
#[command(version)]
#[command(about = "A terminal chat client for hosted LLM APIs")]
#[command(
    long_about = "DeepChat is a full-screen terminal chat client for hosted LLM APIs. \
Replies are split into prose and code blocks; code blocks are syntax highlighted \
and explained line by line by the model.\n\n\
Environment Variables:\n\
  OPENROUTER_API_KEY  API key for the DeepSeek provider (via OpenRouter)\n\
  GROQ_API_KEY        API key for the Groq provider\n\
  DEEPCHAT_CONFIG     Alternate path for config.toml\n\
  DEEPCHAT_LOG        Log filter, e.g. debug or deepchat=trace (default: warn)\n\n\
Without an API key the selected provider answers with a simulated response.\n\n\
Controls:\n\
  Enter             Send the message\n\
  Alt+Enter         Insert a new line\n\
  Ctrl+O            Attach the file whose path is typed in the input\n\
  Ctrl+X            Clear attachments\n\
  Ctrl+N            Start a new conversation\n\
  Ctrl+P            Switch to the next provider\n\
  Ctrl+T            Toggle dark/light theme\n\
  Ctrl+B            Show or hide the history sidebar\n\
  Tab               Move focus between input and history\n\
  Ctrl+E            Show or hide code explanations\n\
  Ctrl+Y            Copy the last code block\n\
  PgUp/PgDn         Scroll the conversation\n\
  Ctrl+C / Esc      Quit"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Provider to use (see `deepchat providers`)
    #[arg(short = 'p', long, global = true, value_name = "PROVIDER")]
    pub provider: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Send one message and print the reply
    Say {
        /// File to attach; may be repeated
        #[arg(short = 'f', long = "file", value_name = "FILE")]
        files: Vec<PathBuf>,
        /// Message text
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// Inspect or delete stored conversations
    History {
        #[command(subcommand)]
        command: Option<HistoryCommands>,
    },
    /// List available providers and whether an API key is set
    Providers,
    /// Show or change the color theme
    Theme {
        #[arg(value_enum)]
        mode: Option<ThemeArg>,
    },
    /// Set configuration values
    Set {
        /// Configuration key to set (default-provider, temperature, explain-code)
        key: String,
        /// Value to set for the key
        value: Option<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

#[derive(Subcommand)]
pub enum HistoryCommands {
    /// List stored conversations, newest first (default)
    List,
    /// Print a stored conversation
    Show { id: i64 },
    /// Delete a stored conversation
    Delete { id: i64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ThemeArg {
    Dark,
    Light,
    Toggle,
}

pub(crate) fn open_state(config: &Config) -> Result<PersistentState, Box<dyn Error>> {
    let data_dir = config.resolve_data_dir()?;
    Ok(PersistentState::new(Box::new(FileKeyValueStore::new(
        data_dir,
    ))))
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let config = Config::load()?;

    let interactive = matches!(args.command, None | Some(Commands::Chat));
    if interactive {
        logging::init(LogTarget::in_data_dir(&config.resolve_data_dir()?))?;
    } else {
        logging::init(LogTarget::Stderr)?;
    }

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_chat(config, args.provider).await,
        Commands::Say { files, prompt } => run_say(&config, prompt, files, args.provider).await,
        Commands::History { command } => {
            let state = open_state(&config)?;
            match command.unwrap_or(HistoryCommands::List) {
                HistoryCommands::List => list_history(&state),
                HistoryCommands::Show { id } => show_conversation(&state, id),
                HistoryCommands::Delete { id } => delete_conversation(&state, id),
            }
        }
        Commands::Providers => list_providers(&config),
        Commands::Theme { mode } => set_theme(&open_state(&config)?, mode),
        Commands::Set { key, value } => {
            let mut config = config;
            match value {
                Some(value) => {
                    let message = apply_set(&mut config, &key, &value)?;
                    config.save()?;
                    println!("✅ {message}");
                }
                None => config.print_all(),
            }
            Ok(())
        }
        Commands::Unset { key } => {
            let mut config = config;
            let message = apply_unset(&mut config, &key)?;
            config.save()?;
            println!("✅ {message}");
            Ok(())
        }
    }
}
