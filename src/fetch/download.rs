use anyhow::{Context, Result};
use reqwest::Client;
use std::path::Path;
use tokio::fs;
use tracing::debug;
use url::Url;

/// GET `url` and write the body verbatim to `dest`, replacing any existing
/// file. Returns the number of bytes written.
///
/// Non-success statuses are errors; nothing is retried.
pub async fn download_to(client: &Client, url: &Url, dest: impl AsRef<Path>) -> Result<u64> {
    let dest = dest.as_ref();
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let resp = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("GET {}", url))?
        .error_for_status()
        .with_context(|| format!("Non-success status {}", url))?;
    let bytes = resp
        .bytes()
        .await
        .with_context(|| format!("reading body from {}", url))?;
    fs::write(dest, &bytes)
        .await
        .with_context(|| format!("writing {}", dest.display()))?;

    debug!(%url, dest = %dest.display(), bytes = bytes.len(), "downloaded");
    Ok(bytes.len() as u64)
}

/// Extension of the last path segment of `url`, if any.
pub fn url_extension(url: &Url) -> Option<&str> {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_extension() {
        let u = Url::parse("https://example.com/2015/delineation-files/list1.xls").unwrap();
        assert_eq!(url_extension(&u), Some("xls"));
        let u = Url::parse("https://example.com/files/").unwrap();
        assert_eq!(url_extension(&u), None);
    }
}
