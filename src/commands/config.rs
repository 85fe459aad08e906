use console::style;
use dialoguer::Password;

use crate::{
    cli::{ConfigArgs, ConfigCommands},
    error::{Error, Result},
    structs::config::AppConfig,
    util::config::mask_secret,
};

pub fn config(args: ConfigArgs) -> Result<()> {
    match args.subcommand {
        ConfigCommands::SetApiKey { api_key } => set_api_key(api_key),
        ConfigCommands::Path => {
            println!("{}", AppConfig::path()?.display());
            Ok(())
        }
        ConfigCommands::Show => {
            let config = AppConfig::load()?;
            println!("path={}", AppConfig::path()?.display());
            println!("curseforgeApiKey={}", mask_secret(config.curseforge_api_key.as_deref()));
            Ok(())
        }
    }
}

fn set_api_key(api_key: Option<String>) -> Result<()> {
    let api_key = match api_key {
        Some(key) => key,
        None if console::user_attended() => Password::new()
            .with_prompt("CurseForge API key")
            .allow_empty_password(true)
            .interact()?,
        None => {
            return Err(Error::Other(
                "No API key provided. Pass it as an argument or run interactively".into(),
            ))
        }
    };

    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(Error::Other("API key cannot be empty".into()));
    }

    let mut config = AppConfig::load()?;
    config.curseforge_api_key = Some(api_key.to_owned());
    let path = config.save()?;
    println!("Saved CurseForge API key to {}", style(path.display()).dim());
    Ok(())
}
