use std::{
    fs::{self, File},
    io::{self, Write},
    path::Path,
};

use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, trace, warn};
use zip::ZipArchive;

use crate::error::{Error, Result};

/// Stream `url` into `path` chunk by chunk.
/// The bar shows a percentage when the server sends a content length
/// and a running byte count when it doesn't.
pub async fn download_file(url: &str, path: &Path, progress: &ProgressBar) -> Result<u64> {
    let res = reqwest::get(url)
        .await?
        .error_for_status()
        .map_err(|err| Error::TransportError(format!("download failed: {err}")))?;

    match res.content_length() {
        Some(len) => {
            progress.set_length(len);
            progress.set_style(
                ProgressStyle::with_template("{msg} [{bar:30}] {percent:>3}% ({bytes}/{total_bytes})")?
                    .progress_chars("=> "),
            );
        }
        None => progress.set_style(ProgressStyle::with_template("{spinner} {msg} {bytes}")?),
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = File::create(path)?;
    let mut downloaded: u64 = 0;
    let mut stream = res.bytes_stream();
    debug!("starting download from {url}");
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
        progress.set_position(downloaded);
    }
    file.flush()?;

    debug!("downloaded {downloaded} bytes to {}", path.display());
    Ok(downloaded)
}

/// Extract every entry of a zip archive below `dest_dir`.
/// Entries that would land outside of `dest_dir` (absolute paths, `..`) are skipped.
pub fn extract_zip(zip_path: &Path, dest_dir: &Path) -> Result<usize> {
    let mut archive = ZipArchive::new(File::open(zip_path)?)?;
    fs::create_dir_all(dest_dir)?;

    let mut extracted = 0;
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let Some(name) = file.enclosed_name() else {
            warn!("skipping archive entry outside of the extraction folder: '{}'", file.name());
            continue;
        };
        let out = dest_dir.join(name);

        if file.is_dir() {
            trace!("create dir {}", out.display());
            fs::create_dir_all(&out)?;
            continue;
        }

        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent)?;
        }
        trace!("extract {}", out.display());
        let mut outfile = File::create(&out)?;
        io::copy(&mut file, &mut outfile)?;

        // keep launch scripts executable, but always owner writable so later updates can overwrite them
        #[cfg(unix)]
        if let Some(mode) = file.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&out, fs::Permissions::from_mode((mode & 0o777) | 0o200))?;
        }

        extracted += 1;
    }

    debug!("extracted {extracted} files to {}", dest_dir.display());
    Ok(extracted)
}
