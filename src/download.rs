//! Dump download with a byte progress bar and `.part` temp file.

use crate::progress::make_progress_bar_labeled;
use crate::util::replace_file_atomic_backoff;
use anyhow::{Context, Result};
use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

/// Download `url` to `dest`. Skips if `dest` already exists and is non-empty.
/// Returns the number of bytes downloaded (0 when skipped).
pub fn download_dump(url: &str, dest: &Path, show_progress: bool) -> Result<u64> {
    if fs::metadata(dest).map(|m| m.len() > 0).unwrap_or(false) {
        tracing::info!("Already downloaded: {}", dest.display());
        return Ok(0);
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    tracing::info!("Downloading {} -> {}", url, dest.display());
    let agent = ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(86400))) // monthly dumps run to tens of GB
        .build()
        .new_agent();
    let resp = agent.get(url).call().with_context(|| format!("GET {url}"))?;

    let total: u64 = resp
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    let name = dest.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let pb = show_progress.then(|| make_progress_bar_labeled(total, Some(&name)));

    let mut tmp_name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".part");
    let tmp = dest.with_file_name(tmp_name);

    let mut file = fs::File::create(&tmp).with_context(|| format!("create {}", tmp.display()))?;
    let mut reader = resp.into_body().into_reader();
    let mut buffer = vec![0u8; 64 * 1024];
    let mut downloaded = 0u64;
    loop {
        let n = reader.read(&mut buffer).context("network read error")?;
        if n == 0 {
            break;
        }
        file.write_all(&buffer[..n])?;
        downloaded += n as u64;
        if let Some(pb) = &pb {
            pb.inc(n as u64);
        }
    }
    file.flush()?;
    drop(file);

    replace_file_atomic_backoff(&tmp, dest)?;
    if let Some(pb) = pb {
        pb.finish_with_message(format!("{name} done"));
    }
    tracing::info!("Downloaded {} bytes to {}", downloaded, dest.display());
    Ok(downloaded)
}
