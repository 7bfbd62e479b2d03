use anyhow::{Context, Result};
use chrono::Utc;
use std::{fs, path::Path};

use crate::browser::WebDriverSession;

pub fn artifacts_dir(base: &str, browser: &str, seed: Option<u64>) -> String {
    let ts = Utc::now().format("%Y%m%dT%H%M%S");
    let seed = seed.map_or_else(|| "seed-random".to_string(), |s| format!("seed-{s}"));
    format!("{base}/{browser}/{seed}/{ts}")
}

/// Save what the browser showed when a submission failed.
///
/// # Errors
///
/// Returns an error if the artifacts directory cannot be created.
pub async fn capture_artifacts(
    session: &WebDriverSession,
    dir: &str,
    err: &anyhow::Error,
) -> Result<()> {
    let screenshot = session.driver().screenshot_as_png().await.ok();
    let source = session.driver().source().await.ok();
    let chain = format!("{err:#}");

    write_artifact_files(
        Path::new(dir),
        screenshot.as_deref(),
        source.as_deref(),
        &chain,
    )
}

fn write_artifact_files(
    dir: &Path,
    screenshot: Option<&[u8]>,
    source: Option<&str>,
    error_chain: &str,
) -> Result<()> {
    fs::create_dir_all(dir).context("creating artifacts dir")?;

    if let Some(png) = screenshot {
        let _ = fs::write(dir.join("screenshot.png"), png);
    }

    if let Some(src) = source {
        let _ = fs::write(dir.join("dom.html"), src);
    }

    let _ = fs::write(dir.join("error.txt"), error_chain);

    Ok(())
}
