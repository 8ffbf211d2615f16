use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use reqwest::Client;
use std::{env, fs, path::PathBuf, sync::Arc, time::Instant};
use tokio::sync::Semaphore;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use zbpetl::{config, fetch, ingest, normalize, output};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env_filter).init();

    // ─── 2) parse targets ────────────────────────────────────────────
    let targets: Vec<String> = env::args().skip(1).collect();
    if targets.is_empty() {
        bail!("usage: zbpetl <data|clean|all> [...]");
    }
    for target in &targets {
        if !matches!(target.as_str(), "data" | "clean" | "all") {
            bail!("unknown target `{}`; valid targets: data, clean, all", target);
        }
    }
    let run_all = targets.iter().any(|t| t == "all");

    // ─── 3) load config ──────────────────────────────────────────────
    let config_path = env::var("ZBP_CONFIG").unwrap_or_else(|_| "config/config.json".into());
    let cfg = config::load_config(&config_path)?;
    info!(
        years = ?cfg.years(),
        zip_codes = cfg.zip_codes.len(),
        "config loaded"
    );

    if run_all || targets.iter().any(|t| t == "data") {
        run_data(&cfg).await?;
    }
    if targets.iter().any(|t| t == "clean") {
        run_clean(&cfg)?;
    }

    info!("all done");
    Ok(())
}

/// The `data` target: cache the detail archives, normalize every vintage,
/// and write the cross-year concatenation to parquet.
async fn run_data(cfg: &config::Config) -> Result<()> {
    let start = Instant::now();
    fs::create_dir_all(&cfg.zips_dir)?;
    fs::create_dir_all(&cfg.out_dir)?;

    let cached = glob::glob(&format!("{}/zbp*detail.zip", cfg.zips_dir.display()))?
        .filter_map(Result::ok)
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .and_then(fetch::year_from_zip_name)
                .is_some()
        })
        .count();
    info!(cached, "detail archives already on disk");

    // ─── download whatever is missing, a few years at a time ─────────
    let client = Client::new();
    let sem = Arc::new(Semaphore::new(3));
    let mut handles = Vec::new();
    for year in cfg.years() {
        let client = client.clone();
        let sem = Arc::clone(&sem);
        let zips_dir = cfg.zips_dir.clone();
        handles.push(tokio::spawn(async move {
            let _permit = sem.acquire().await?;
            let path = fetch::download_detail_zip(&client, year, &zips_dir).await?;
            anyhow::Ok((year, path))
        }));
    }
    let mut zips: Vec<(i32, PathBuf)> = Vec::with_capacity(handles.len());
    for handle in handles {
        zips.push(handle.await??);
    }

    // ─── normalize every year in parallel, accumulate in year order ──
    let zip_codes = cfg.zip_codes.clone();
    let mut results: Vec<(i32, Vec<normalize::DetailRow>)> =
        tokio::task::spawn_blocking(move || {
            zips.into_par_iter()
                .map(|(year, path)| {
                    let table = ingest::load_detail_zip(&path)?;
                    let rows = normalize::normalize(&table, year, &zip_codes)
                        .with_context(|| format!("normalizing detail data for {}", year))?;
                    Ok((year, rows))
                })
                .collect::<Result<Vec<_>>>()
        })
        .await??;
    results.sort_by_key(|(year, _)| *year);

    let mut all_rows = Vec::new();
    for (year, rows) in results {
        info!(year, rows = rows.len(), "year normalized");
        all_rows.extend(rows);
    }

    let out_path = cfg.out_dir.join("zbp_detail.parquet");
    output::write_parquet(&all_rows, &out_path)?;
    info!(elapsed = ?start.elapsed(), rows = all_rows.len(), "data target complete");
    Ok(())
}

/// The `clean` target: drop the archive cache and derived outputs.
fn run_clean(cfg: &config::Config) -> Result<()> {
    for dir in [&cfg.zips_dir, &cfg.out_dir] {
        if dir.exists() {
            fs::remove_dir_all(dir).with_context(|| format!("removing {:?}", dir))?;
            info!(dir = %dir.display(), "removed");
        }
    }
    Ok(())
}
