use anyhow::{Context, Result};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use url::Url;

use super::urls;

/// Download one year's detail archive into `dest_dir`, skipping the network
/// round trip when the archive is already cached. Returns the local path.
pub async fn download_detail_zip(
    client: &Client,
    year: i32,
    dest_dir: impl AsRef<Path>,
) -> Result<PathBuf> {
    let dest_dir = dest_dir.as_ref();
    let dest_path = dest_dir.join(urls::detail_zip_name(year));
    if fs::try_exists(&dest_path).await? {
        debug!(path = %dest_path.display(), "archive already cached");
        return Ok(dest_path);
    }

    let url = Url::parse(&urls::detail_zip_url(year))?;
    fs::create_dir_all(dest_dir).await?;

    info!(%url, "downloading detail archive");
    let resp = client
        .get(url.as_str())
        .send()
        .await?
        .error_for_status()
        .with_context(|| format!("fetching detail archive for {}", year))?;
    let bytes = resp.bytes().await?;
    fs::write(&dest_path, &bytes)
        .await
        .with_context(|| format!("writing {:?}", dest_path))?;

    Ok(dest_path)
}
