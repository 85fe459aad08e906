use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use console::style;
use indicatif::ProgressBar;
use log::debug;
use tempfile::TempDir;

use crate::{
    api::curseforge::{CurseAPI, ServerPackDownload},
    cli::{InstallArgs, UpdateArgs},
    error::Result,
    structs::state::ServerState,
    util::{
        files::{download_file, extract_zip},
        merge::{copy_tree_contents, detect_pack_root, is_server_dir, update_from_pack_root},
        resolve::{can_prompt, resolve_pack_id, ResolveOptions, TerminalChooser},
    },
};

use super::curse_api;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InstallMode {
    Fresh,
    Update,
}

#[derive(Debug, PartialEq)]
pub enum UpdateCheck {
    UpToDate,
    Available { installed: Option<i32>, latest: i32 },
}

pub fn check_for_update(installed: Option<i32>, latest: i32) -> UpdateCheck {
    match installed {
        Some(installed) if installed == latest => UpdateCheck::UpToDate,
        _ => UpdateCheck::Available { installed, latest },
    }
}

pub async fn install(args: InstallArgs) -> Result<()> {
    install_or_update(args, false).await
}

pub async fn update(args: UpdateArgs) -> Result<()> {
    install_or_update(args.install, args.check_only).await
}

async fn install_or_update(args: InstallArgs, check_only: bool) -> Result<()> {
    let api = curse_api()?;
    install_with(&api, args, check_only, can_prompt()).await
}

/// The install/update flow against an already configured client
async fn install_with(api: &CurseAPI, args: InstallArgs, check_only: bool, interactive: bool) -> Result<()> {
    let server_dir = absolute(&args.dir)?;
    let saved = ServerState::load(&server_dir)?;

    let options = ResolveOptions {
        use_saved: args.use_saved,
        use_arg: args.use_arg,
        no_prompt: args.no_prompt,
        interactive,
    };
    let pack_id = resolve_pack_id(api, args.source.as_deref(), saved.as_ref(), &options, &mut TerminalChooser).await?;

    let mode = if is_server_dir(&server_dir) { InstallMode::Update } else { InstallMode::Fresh };
    debug!("using packId={pack_id} in {} ({mode:?})", server_dir.display());

    let download = api.resolve_server_pack_download(pack_id, args.file_id).await?;

    if check_only && mode == InstallMode::Update {
        let installed = saved.as_ref().and_then(|s| s.installed_file_id);
        match check_for_update(installed, download.file_id) {
            UpdateCheck::UpToDate => println!("{}", style("Up to date.").green()),
            UpdateCheck::Available { installed, latest } => println!(
                "Update available: installed={} latest={latest} {}",
                installed.map_or("None".into(), |id| id.to_string()),
                style(&download.display_name).dim()
            ),
        }
        return Ok(());
    }

    let work_dir = new_work_dir()?;
    let archive = work_dir.path().join("serverpack.zip");

    println!("Downloading server pack: {}", style(&download.display_name).bold());
    let progress = ProgressBar::new(0).with_message("Downloading");
    download_file(&download.url, &archive, &progress).await?;
    progress.finish_and_clear();

    let spinner = ProgressBar::new_spinner().with_message(match mode {
        InstallMode::Fresh => "Installing",
        InstallMode::Update => "Updating",
    });
    spinner.enable_steady_tick(Duration::from_millis(100));

    // the file system work runs on the blocking pool so ctrl-c is still noticed
    let target = server_dir.clone();
    let work_dir = tokio::task::spawn_blocking(move || -> Result<TempDir> {
        apply_server_pack(&archive, &work_dir.path().join("extracted"), &target, mode)?;
        Ok(work_dir)
    })
    .await??;
    spinner.finish_and_clear();
    drop(work_dir);

    if args.accept_eula {
        fs::write(server_dir.join("eula.txt"), "eula=true\n")?;
    }

    record_install(&server_dir, saved, pack_id, &download)?;

    match mode {
        InstallMode::Fresh => println!("{}", style("Install complete.").green()),
        InstallMode::Update => println!("{}", style("Update complete.").green()),
    }
    Ok(())
}

/// Unpack a downloaded server pack and merge it into `server_dir`
pub fn apply_server_pack(archive: &Path, extract_dir: &Path, server_dir: &Path, mode: InstallMode) -> Result<()> {
    extract_zip(archive, extract_dir)?;
    let pack_root = detect_pack_root(extract_dir)?;

    match mode {
        InstallMode::Fresh => copy_tree_contents(&pack_root, server_dir),
        InstallMode::Update => update_from_pack_root(&pack_root, server_dir),
    }
}

/// Only called after the merge went through, a failed install keeps the old state
pub fn record_install(
    server_dir: &Path,
    saved: Option<ServerState>,
    pack_id: i32,
    download: &ServerPackDownload,
) -> Result<ServerState> {
    let mut state = ServerState {
        pack_id: Some(pack_id),
        installed_file_id: Some(download.file_id),
        installed_display_name: Some(download.display_name.clone()),
        last_updated_at: None,
        ..saved.unwrap_or_default()
    };
    state.save(server_dir)?;
    Ok(state)
}

const WORK_DIR_PREFIX: &str = "mcserver_";

fn new_work_dir() -> Result<TempDir> {
    let dir = tempfile::Builder::new().prefix(WORK_DIR_PREFIX).tempdir()?;
    debug!("working in {}", dir.path().display());
    Ok(dir)
}

/// Where interrupted installs leave their work folders
pub fn work_dir_pattern() -> PathBuf {
    env::temp_dir().join(format!("{WORK_DIR_PREFIX}*"))
}

fn absolute(dir: &Path) -> Result<PathBuf> {
    if dir.is_absolute() {
        Ok(dir.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(dir))
    }
}
