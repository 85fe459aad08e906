pub mod cf;
pub mod config;
pub mod install;
pub mod status;

use std::io;

use clap::CommandFactory;

use crate::{
    api::curseforge::CurseAPI,
    cli::{Args, Commands},
    error::{Error, Result},
    structs::config::AppConfig,
};

pub async fn run(args: Args) -> Result<()> {
    match args.subcommand {
        Commands::Install(args) => install::install(args).await,
        Commands::Update(args) => install::update(args).await,
        Commands::Status(args) => status::status(args),
        Commands::Cf(args) => cf::cf(args).await,
        Commands::Config(args) => config::config(args),
        Commands::Completion { shell } => {
            clap_complete::generate(shell, &mut Args::command(), "mcserver", &mut io::stdout());
            Ok(())
        }
    }
}

/// Client for the configured api key, fails before any request when none is set
pub fn curse_api() -> Result<CurseAPI> {
    let api_key = AppConfig::load()?.api_key().ok_or(Error::MissingCredential)?;
    CurseAPI::new(&api_key)
}
