use crate::models::Profile;
use crate::remote::ClientConfig;
use clap::{Parser, Subcommand};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "repo-likes")]
#[command(about = "Repo Likes - Lists your repositories and lets you like them")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Repository service base URL
    #[arg(long, env = "API_URL", default_value = crate::remote::DEFAULT_API_URL)]
    pub api_url: String,

    /// Bearer token sent with every request
    #[arg(long, env = "API_TOKEN")]
    pub api_token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "API_TIMEOUT", default_value_t = 30)]
    pub timeout: u64,

    /// Name shown in the profile header
    #[arg(long, env = "PROFILE_NAME", default_value = "Repository Owner")]
    pub profile_name: String,

    /// Nickname shown in the profile header
    #[arg(long, env = "PROFILE_NICK", default_value = "owner")]
    pub profile_nick: String,

    /// Print the list as JSON instead of drawing the screen
    #[arg(long)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Load the repositories and draw the screen
    List,
    /// Like one or more repositories by id
    Like {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Redraw whenever the list changes, reloading periodically
    Watch {
        /// Seconds between reloads
        #[arg(long, default_value_t = 30)]
        refresh: u64,
    },
}

impl Cli {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_url.clone(),
            token: self.api_token.clone(),
            timeout: Duration::from_secs(self.timeout),
        }
    }

    pub fn profile(&self) -> Profile {
        Profile {
            name: self.profile_name.clone(),
            nick: self.profile_nick.clone(),
        }
    }

    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::List)
    }
}
