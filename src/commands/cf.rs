use std::fmt::Write;

use console::style;

use crate::{
    api::curseforge::{Mod, ModFile},
    cli::{CfArgs, CfCommands},
    error::Result,
    util::to_hyperlink,
};

use super::curse_api;

pub async fn cf(args: CfArgs) -> Result<()> {
    let api = curse_api()?;

    match args.subcommand {
        CfCommands::Resolve { url } => {
            println!("{}", api.resolve_pack_id_from_url(&url).await?);
        }
        CfCommands::Search { query, game_version, limit } => {
            let packs = api.search(&query, game_version.as_deref(), limit).await?;
            if packs.is_empty() {
                println!("{}", style(format!("Searching for {query} returned no results")).color256(166));
            }
            for pack in packs {
                println!("{}\t{}", pack.id, to_hyperlink(&pack_url(&pack), &pack.name));
            }
        }
        CfCommands::Files { pack_id, server_only, limit } => {
            let files = api.get_mod_files(pack_id).await?;
            print!("{}", format_files(&files, server_only, limit));
        }
        CfCommands::DownloadUrl { pack_id, file_id, verbose } => {
            let download = api.resolve_server_pack_download(pack_id, file_id).await?;
            if verbose {
                println!("serverPackFileId={}\tdisplayName={}", download.file_id, download.display_name);
            }
            println!("{}", download.url);
        }
    }

    Ok(())
}

fn pack_url(pack: &Mod) -> String {
    pack.links
        .as_ref()
        .and_then(|l| l.website_url.clone())
        .unwrap_or_else(|| format!("https://www.curseforge.com/minecraft/modpacks/{}", pack.slug))
}

// the limit is applied to the listing first, then the server filter
fn format_files(files: &[ModFile], server_only: bool, limit: usize) -> String {
    let mut out = String::new();
    for f in files.iter().take(limit) {
        if server_only && !(f.is_server_pack || f.server_pack_file_id.is_some()) {
            continue;
        }

        let _ = writeln!(
            &mut out,
            "{}\t{}\t{}\tserverPack={}\tserverPackFileId={}",
            f.id,
            f.file_date,
            f.display_name,
            f.is_server_pack,
            f.server_pack_file_id.map_or("None".into(), |id| id.to_string())
        );
    }
    out
}
