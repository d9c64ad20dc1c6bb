//! CLI argument parsing

use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quantarax")]
#[command(author, version, about = "Point-to-point encrypted file transfer engine", long_about = None)]
pub struct Cli {
    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send a file to a listening peer
    Send(SendArgs),

    /// Listen for and receive one inbound transfer
    Receive(ReceiveArgs),

    /// Manage the local identity keypair
    Identity(IdentityArgs),

    /// Manage configuration
    Config(ConfigArgs),

    /// Run diagnostic checks
    Doctor,

    /// Generate shell completions
    Completions(CompletionsArgs),

    /// Show version and build info
    Version,
}

#[derive(Args)]
pub struct SendArgs {
    /// File to send
    pub file: PathBuf,

    /// Address of the listening peer (host:port)
    pub peer: SocketAddr,

    /// Domain profile to apply (media, medical, engineering, telemetry, disaster, rural)
    #[arg(long)]
    pub domain: Option<String>,

    /// Chunk size in bytes (0 selects the domain profile's default)
    #[arg(long, default_value_t = 0)]
    pub chunk_size: u32,
}

#[derive(Args)]
pub struct ReceiveArgs {
    /// Address to listen on (host:port)
    #[arg(long, default_value = "0.0.0.0:4433")]
    pub listen: SocketAddr,

    /// Directory to write the received file into
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct IdentityArgs {
    #[command(subcommand)]
    pub command: Option<IdentityCommands>,
}

#[derive(Subcommand)]
pub enum IdentityCommands {
    /// Generate the identity keypair, if one does not already exist
    Generate,
    /// Show the identity's public key and fingerprint
    Show,
    /// Show the identity fingerprint
    Fingerprint {
        /// Use emoji format
        #[arg(short, long)]
        emoji: bool,
    },
}

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: Option<ConfigCommands>,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Config key (e.g., transfer.chunk_size, storage.cas_max_age_secs)
        key: String,
        /// Config value
        value: String,
    },
    /// Get a configuration value
    Get {
        /// Config key
        key: String,
    },
    /// Reset to defaults
    Reset {
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell type
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
