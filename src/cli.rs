use std::path::PathBuf;
use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "mcserver", version, about, long_about = None)]
pub struct Args {
    /// Print debug logs, RUST_LOG overrides this
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub subcommand: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install a server pack into a folder, or update the server already in it
    #[command(alias = "i")]
    Install(InstallArgs),

    /// Same as install, optionally only check for a newer server pack
    #[command(alias = "up")]
    Update(UpdateArgs),

    /// Show the saved pack/version for a folder
    Status(StatusArgs),

    /// CurseForge helper commands
    Cf(CfArgs),

    /// Persist and inspect the local mcserver config
    Config(ConfigArgs),

    /// Print shell completions for specified shell
    Completion {
        #[clap(value_enum)]
        shell: Shell
    }
}

#[derive(clap::Args)]
pub struct InstallArgs {
    /// Modpack id (digits) or CurseForge modpack url, defaults to the saved pack
    pub source: Option<String>,

    /// The server folder
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Install this file (or the server pack linked from it) instead of the latest one
    #[arg(long)]
    pub file_id: Option<i32>,

    /// Write eula.txt accepting the Minecraft EULA
    #[arg(long)]
    pub accept_eula: bool,

    /// Use the saved pack when SOURCE points to a different one
    #[arg(long)]
    pub use_saved: bool,

    /// Use SOURCE when the folder is configured for a different pack
    #[arg(long)]
    pub use_arg: bool,

    /// Never ask, fail when the saved pack and SOURCE disagree
    #[arg(long)]
    pub no_prompt: bool,
}

#[derive(clap::Args)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub install: InstallArgs,

    /// Only report whether a newer server pack is available
    #[arg(long)]
    pub check_only: bool,
}

#[derive(clap::Args)]
pub struct StatusArgs {
    /// The server folder
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
}

#[derive(clap::Args)]
pub struct CfArgs {
    #[command(subcommand)]
    pub subcommand: CfCommands
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub subcommand: ConfigCommands
}

#[derive(Subcommand)]
pub enum CfCommands {
    /// Resolve a modpack url to its pack id
    Resolve {
        url: String
    },

    /// Search modpacks
    Search {
        query: String,

        /// Only packs for this minecraft version
        #[arg(long)]
        game_version: Option<String>,

        #[arg(long, default_value_t = 10)]
        limit: u32
    },

    /// List the files of a modpack
    Files {
        pack_id: i32,

        /// Only files that are or link to a server pack
        #[arg(long)]
        server_only: bool,

        #[arg(long, default_value_t = 20)]
        limit: usize
    },

    /// Resolve the direct download url of a server pack
    DownloadUrl {
        pack_id: i32,

        #[arg(long)]
        file_id: Option<i32>,

        /// Also print the server pack file id and name
        #[arg(long, short = 'v')]
        verbose: bool
    }
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Save the CurseForge api key to the config file
    SetApiKey {
        /// Prompted for when omitted
        api_key: Option<String>
    },

    /// Print the config file path
    Path,

    /// Print the config file path and the masked api key
    Show
}
