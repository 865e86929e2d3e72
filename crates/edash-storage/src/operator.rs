//! OpenDAL Operator factory for bundle locations

use anyhow::{Context, Result};
use edash_core::config::BundleConfig;
use edash_core::{EdashError, EdashResult};
use opendal::Operator;
use std::path::PathBuf;

/// Where a bundle (or plain workbook) lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleLocation {
    Url(String),
    Path(PathBuf),
}

impl BundleLocation {
    /// Pick the location from config; a URL wins over a local path.
    pub fn from_config(cfg: &BundleConfig) -> EdashResult<Self> {
        if let Some(url) = cfg.url.as_deref().filter(|u| !u.trim().is_empty()) {
            return Ok(BundleLocation::Url(url.trim().to_string()));
        }
        if let Some(path) = &cfg.path {
            return Ok(BundleLocation::Path(path.clone()));
        }
        Err(EdashError::Config(
            "no bundle location: set bundle.url or bundle.path".into(),
        ))
    }
}

impl std::fmt::Display for BundleLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BundleLocation::Url(url) => f.write_str(url),
            BundleLocation::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Split `https://host[:port]/a/b.json` into (`https://host[:port]`, `a/b.json`).
pub fn split_url(url: &str) -> Result<(String, String)> {
    let scheme_end = url
        .find("://")
        .map(|i| i + 3)
        .with_context(|| format!("URL has no scheme: {url}"))?;

    let rest = &url[scheme_end..];
    let slash = rest
        .find('/')
        .with_context(|| format!("URL has no path: {url}"))?;

    let endpoint = &url[..scheme_end + slash];
    let path = &rest[slash + 1..];
    if path.is_empty() {
        anyhow::bail!("URL has no path: {url}");
    }

    Ok((endpoint.to_string(), path.to_string()))
}

/// Build an Operator for a location and return it with the object path to read.
pub fn build_operator(location: &BundleLocation) -> Result<(Operator, String)> {
    match location {
        BundleLocation::Url(url) => {
            if url.starts_with("http://") {
                tracing::warn!(url = %url, "bundle is fetched over plaintext HTTP");
            }
            let (endpoint, path) = split_url(url)?;
            let builder = opendal::services::Http::default().endpoint(&endpoint);
            let op = Operator::new(builder)
                .context("creating OpenDAL HTTP operator")?
                .layer(opendal::layers::LoggingLayer::default())
                .layer(
                    opendal::layers::RetryLayer::new()
                        .with_max_times(3)
                        .with_jitter(),
                )
                .finish();
            Ok((op, path))
        }
        BundleLocation::Path(path) => {
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .with_context(|| format!("bundle path has no file name: {}", path.display()))?
                .to_string();
            let root = match path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
                _ => PathBuf::from("."),
            };
            let builder = opendal::services::Fs::default().root(&root.to_string_lossy());
            let op = Operator::new(builder)
                .context("creating OpenDAL filesystem operator")?
                .layer(opendal::layers::LoggingLayer::default())
                .finish();
            Ok((op, file_name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_url() {
        let (endpoint, path) =
            split_url("https://dashboards.example.org/kgg/data/bundle.json").unwrap();
        assert_eq!(endpoint, "https://dashboards.example.org");
        assert_eq!(path, "kgg/data/bundle.json");
    }

    #[test]
    fn test_split_url_with_port() {
        let (endpoint, path) = split_url("http://localhost:8080/bundle.json").unwrap();
        assert_eq!(endpoint, "http://localhost:8080");
        assert_eq!(path, "bundle.json");
    }

    #[test]
    fn test_split_url_rejects_missing_parts() {
        assert!(split_url("dashboards.example.org/bundle.json").is_err());
        assert!(split_url("https://dashboards.example.org").is_err());
        assert!(split_url("https://dashboards.example.org/").is_err());
    }

    #[test]
    fn test_location_prefers_url() {
        let cfg = BundleConfig {
            url: Some("https://example.org/b.json".into()),
            path: Some(PathBuf::from("/tmp/b.json")),
            ..Default::default()
        };
        assert_eq!(
            BundleLocation::from_config(&cfg).unwrap(),
            BundleLocation::Url("https://example.org/b.json".into())
        );
    }

    #[test]
    fn test_location_missing_is_config_error() {
        let err = BundleLocation::from_config(&BundleConfig::default()).unwrap_err();
        assert!(matches!(err, EdashError::Config(_)));
    }

    #[test]
    fn test_build_http_operator() {
        let location = BundleLocation::Url("https://example.org/data/bundle.json".into());
        let (_op, path) = build_operator(&location).unwrap();
        assert_eq!(path, "data/bundle.json");
    }

    #[test]
    fn test_build_fs_operator() {
        let location = BundleLocation::Path(PathBuf::from("/srv/dashboards/bundle.json"));
        let (_op, path) = build_operator(&location).unwrap();
        assert_eq!(path, "bundle.json");
    }

    #[test]
    fn test_fs_operator_reads_written_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("bundle.json");
        std::fs::write(&file, br#"{"kdf":{}}"#).unwrap();

        let (op, path) = build_operator(&BundleLocation::Path(file)).unwrap();
        let bytes = tokio_test::block_on(op.read(&path)).unwrap().to_vec();
        assert_eq!(bytes, br#"{"kdf":{}}"#);
    }
}
