use std::io::{self, IsTerminal};

use dialoguer::Input;
use log::debug;

use crate::{
    api::curseforge::CurseAPI,
    error::{Error, Result},
    structs::state::ServerState,
};

/// What the user passed as SOURCE
#[derive(Debug, Clone, PartialEq)]
pub enum PackSource {
    Url(String),
    Id(i32),
}

impl PackSource {
    pub fn parse(source: &str) -> Result<Self> {
        let source = source.trim();
        if source.starts_with("http://") || source.starts_with("https://") {
            return Ok(PackSource::Url(source.to_owned()));
        }

        if !source.is_empty() && source.chars().all(|c| c.is_ascii_digit()) {
            return source
                .parse::<i32>()
                .map(PackSource::Id)
                .map_err(|_| Error::InvalidSource(source.to_owned()));
        }

        Err(Error::InvalidSource(source.to_owned()))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ResolveOptions {
    pub use_saved: bool,
    pub use_arg: bool,
    pub no_prompt: bool,
    pub interactive: bool,
}

/// Asked at most once, when the saved pack id and the argument disagree
pub trait SourceChooser {
    fn choose(&mut self, saved: i32, arg: i32) -> Result<String>;
}

impl<F> SourceChooser for F
where
    F: FnMut(i32, i32) -> Result<String>,
{
    fn choose(&mut self, saved: i32, arg: i32) -> Result<String> {
        self(saved, arg)
    }
}

/// Answers come from stdin and dialoguer draws on stderr, stdout may well be a pty
/// on an unattended run (`docker run -t`, CI runners)
pub fn can_prompt() -> bool {
    io::stdin().is_terminal() && console::user_attended_stderr()
}

pub struct TerminalChooser;

impl SourceChooser for TerminalChooser {
    fn choose(&mut self, saved: i32, arg: i32) -> Result<String> {
        println!("This folder is configured for packId={saved} but you provided {arg}.");
        let answer: String = Input::new()
            .with_prompt("Use [s]aved or [a]rg? (s/a)")
            .allow_empty(true)
            .interact_text()?;

        Ok(answer)
    }
}

/// Decides between the saved pack id and the one given on the command line
pub fn choose_pack_id(
    saved: Option<i32>,
    arg: Option<i32>,
    options: &ResolveOptions,
    chooser: &mut impl SourceChooser,
) -> Result<i32> {
    match (saved, arg) {
        (Some(saved), Some(arg)) if saved != arg => {
            match (options.use_saved, options.use_arg) {
                (true, true) => Err(Error::ConflictingFlags),
                (true, false) => Ok(saved),
                (false, true) => Ok(arg),
                (false, false) if options.no_prompt || !options.interactive => {
                    Err(Error::AmbiguousSource { saved, arg })
                }
                (false, false) => {
                    let answer = chooser.choose(saved, arg)?;
                    match answer.trim().to_lowercase().chars().next() {
                        Some('s') => Ok(saved),
                        Some('a') => Ok(arg),
                        _ => Err(Error::InvalidChoice(answer.trim().to_owned())),
                    }
                }
            }
        }
        (_, Some(arg)) => Ok(arg),
        (Some(saved), None) => Ok(saved),
        (None, None) => Err(Error::NoSourceAvailable),
    }
}

/// Turns SOURCE and the saved state into the pack id to work on,
/// urls are looked up on curseforge
pub async fn resolve_pack_id(
    api: &CurseAPI,
    source: Option<&str>,
    saved: Option<&ServerState>,
    options: &ResolveOptions,
    chooser: &mut impl SourceChooser,
) -> Result<i32> {
    let arg = match source.filter(|s| !s.trim().is_empty()).map(PackSource::parse).transpose()? {
        Some(PackSource::Url(url)) => Some(api.resolve_pack_id_from_url(&url).await?),
        Some(PackSource::Id(id)) => Some(id),
        None => None,
    };

    let saved = saved.and_then(|s| s.pack_id);
    debug!("saved packId={saved:?}, argument packId={arg:?}");
    choose_pack_id(saved, arg, options, chooser)
}
