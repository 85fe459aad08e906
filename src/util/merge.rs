use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, trace};
use walkdir::WalkDir;

use crate::error::Result;

/// Directories owned by the modpack, replaced as a whole on update
pub const MANAGED_DIRS: [&str; 6] = ["mods", "config", "scripts", "kubejs", "libraries", "defaultconfigs"];

const LAUNCHER_EXTENSIONS: [&str; 3] = [".jar", ".sh", ".bat"];

// operators tune memory flags in here, never overwrite it
const USER_JVM_ARGS: &str = "user_jvm_args.txt";

/// A folder with a `server.properties` is an existing server and gets updated instead of installed over
pub fn is_server_dir(dir: &Path) -> bool {
    dir.join("server.properties").exists()
}

/// Server packs are sometimes wrapped in one or two folders,
/// find the first folder (breadth first, max 2 deep) holding a `mods` folder
pub fn detect_pack_root(extracted_dir: &Path) -> Result<PathBuf> {
    let mut dirs = WalkDir::new(extracted_dir)
        .max_depth(2)
        .sort_by_file_name()
        .into_iter()
        .filter(|e| e.as_ref().map_or(true, |e| e.file_type().is_dir()))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    // stable sort keeps name order inside each level
    dirs.sort_by_key(|e| e.depth());

    match dirs.into_iter().find(|e| e.path().join("mods").is_dir()) {
        Some(entry) => {
            debug!("pack root is {}", entry.path().display());
            Ok(entry.into_path())
        }
        None => {
            debug!("no mods folder found, using {} as pack root", extracted_dir.display());
            Ok(extracted_dir.to_path_buf())
        }
    }
}

/// Fresh install, copy everything in `pack_root` into `server_dir`
pub fn copy_tree_contents(pack_root: &Path, server_dir: &Path) -> Result<()> {
    fs::create_dir_all(server_dir)?;

    for entry in sorted_children(pack_root)? {
        let src = entry.path();
        let dest = server_dir.join(entry.file_name());

        if src.is_dir() {
            remove_path(&dest)?;
            copy_dir(&src, &dest)?;
        } else {
            if dest.is_dir() {
                remove_path(&dest)?;
            }
            trace!("copy {} -> {}", src.display(), dest.display());
            fs::copy(&src, &dest)?;
        }
    }

    Ok(())
}

/// Update an existing server. Only the managed folders present in the pack
/// and top level launcher files are replaced, worlds, logs, server.properties
/// and anything else in `server_dir` is left alone.
///
/// There is no rollback, an io error midway leaves `server_dir` partially updated.
pub fn update_from_pack_root(pack_root: &Path, server_dir: &Path) -> Result<()> {
    for name in MANAGED_DIRS {
        let src = pack_root.join(name);
        // folders the new pack doesn't ship are kept as they are
        if !src.is_dir() {
            continue;
        }

        let dest = server_dir.join(name);
        debug!("replacing {}", dest.display());
        remove_path(&dest)?;
        copy_dir(&src, &dest)?;
    }

    for entry in sorted_children(pack_root)? {
        let src = entry.path();
        if !src.is_file() || !is_launcher_file(&entry.file_name().to_string_lossy()) {
            continue;
        }

        let dest = server_dir.join(entry.file_name());
        debug!("updating launcher file {}", dest.display());
        fs::copy(&src, &dest)?;
    }

    Ok(())
}

fn is_launcher_file(name: &str) -> bool {
    name != USER_JVM_ARGS && LAUNCHER_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

fn sorted_children(dir: &Path) -> Result<Vec<fs::DirEntry>> {
    let mut children = fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
    children.sort_by_key(|e| e.file_name());
    Ok(children)
}

// removes a file, symlink or whole folder, missing paths are fine
fn remove_path(path: &Path) -> Result<()> {
    let Ok(meta) = fs::symlink_metadata(path) else {
        return Ok(());
    };

    if meta.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    Ok(())
}

fn copy_dir(src: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry?;
        let target = dest.join(entry.path().strip_prefix(src)?);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            trace!("copy {} -> {}", entry.path().display(), target.display());
            fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}
