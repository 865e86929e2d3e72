//! Bundle loading pipeline
//!
//! ```text
//! fetch ─▶ shape check ─▶ KEK ─▶ unwrap DEK ─▶ decrypt ─▶ extract ─▶ assemble
//! ```
//!
//! Steps run strictly in order. Everything after the fetch is CPU-bound and
//! runs on the blocking pool. `load` borrows the loader mutably, so one
//! loader never runs two pipelines at once.

use anyhow::anyhow;
use edash_core::types::DataSourceMode;
use edash_core::{EdashConfig, EdashError, EdashResult};
use edash_crypto::{bundle_fingerprint, resolve_bytes};
use edash_dataset::{build_sheet_library, Assembler, AssemblyConfig, AssemblyReport};
use edash_ingest::archive::base_name;
use edash_ingest::delimited::delimiter_for;
use edash_ingest::{
    delimited_to_rows, extract, parse_capacity_csv, workbook_to_tables, ArchiveOptions,
    ExtractionIssue, IngestOptions, Workbook,
};
use edash_storage::{BundleLocation, BundleSource};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{map_crypto_error, map_ingest_error};
use crate::outcome::{ArchiveReport, LoadOutcome};
use crate::status::StatusLine;

/// Raw bundle bytes kept between passphrase attempts.
#[derive(Debug, Clone)]
struct CachedBundle {
    raw: Arc<Vec<u8>>,
    fingerprint: String,
}

pub struct BundleLoader {
    config: EdashConfig,
    source: BundleSource,
    cached: Option<CachedBundle>,
    status: StatusLine,
}

impl BundleLoader {
    /// Loader for the bundle location named in the config.
    pub fn new(config: EdashConfig) -> EdashResult<Self> {
        let location = BundleLocation::from_config(&config.bundle)?;
        let source = BundleSource::from_location(&location)?;
        Ok(Self::with_source(config, source))
    }

    pub fn with_source(config: EdashConfig, source: BundleSource) -> Self {
        let status = StatusLine::new(config.bundle.locale);
        Self {
            config,
            source,
            cached: None,
            status,
        }
    }

    pub fn config(&self) -> &EdashConfig {
        &self.config
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    pub fn has_cached_bundle(&self) -> bool {
        self.cached.is_some()
    }

    /// Fetch the bundle, or reuse the one kept from an earlier attempt.
    pub async fn fetch(&mut self) -> EdashResult<Arc<Vec<u8>>> {
        if let Some(cached) = &self.cached {
            debug!(fingerprint = %short(&cached.fingerprint), "reusing fetched bundle");
            return Ok(Arc::clone(&cached.raw));
        }

        let raw = Arc::new(self.source.fetch().await?);
        let fingerprint = bundle_fingerprint(&raw);
        info!(
            source = %self.source.display(),
            fingerprint = %short(&fingerprint),
            bytes = raw.len(),
            "bundle fetched"
        );

        if self.config.bundle.keep_bundle {
            self.cached = Some(CachedBundle {
                raw: Arc::clone(&raw),
                fingerprint,
            });
        }
        Ok(raw)
    }

    /// Decrypt and assemble the bundle with `passphrase`.
    ///
    /// On failure the fetched bundle is kept (if configured) so the caller can
    /// retry with another passphrase; on success it is dropped.
    pub async fn load(&mut self, passphrase: &SecretString) -> EdashResult<LoadOutcome> {
        if self.config.bundle.mode == DataSourceMode::Url {
            return Err(EdashError::Config(
                "bundle.mode is \"url\": use load_workbook for plain workbooks".into(),
            ));
        }

        self.status.set_loading();
        let result = self.run_bundle(passphrase).await;
        self.finish(&result);
        if result.is_ok() {
            self.cached = None;
        }
        result
    }

    /// Load a plain (unencrypted) workbook from the configured location.
    pub async fn load_workbook(&mut self) -> EdashResult<LoadOutcome> {
        self.status.set_loading();
        let result = self.run_workbook().await;
        self.finish(&result);
        result
    }

    async fn run_bundle(&mut self, passphrase: &SecretString) -> EdashResult<LoadOutcome> {
        let raw = self.fetch().await?;
        let passphrase = SecretString::from(passphrase.expose_secret().to_owned());
        let config = self.config.clone();

        tokio::task::spawn_blocking(move || {
            let archive = resolve_bytes(&raw, &passphrase).map_err(map_crypto_error)?;
            info!(bytes = archive.len(), "bundle decrypted");
            process_archive(&archive, &config)
        })
        .await
        .map_err(|e| EdashError::Other(anyhow!("load task failed: {e}")))?
    }

    async fn run_workbook(&mut self) -> EdashResult<LoadOutcome> {
        let bytes = self.source.fetch().await?;
        let source_name = base_name(self.source.display());
        let config = self.config.clone();

        tokio::task::spawn_blocking(move || process_workbook(&bytes, &source_name, &config))
            .await
            .map_err(|e| EdashError::Other(anyhow!("load task failed: {e}")))?
    }

    fn finish(&mut self, result: &EdashResult<LoadOutcome>) {
        match result {
            Ok(outcome) => match outcome.blocking_error() {
                Some(err) => self.status.set_error(&err),
                None => self.status.set_success(outcome.diagram_count()),
            },
            Err(err) => {
                warn!(error = %err, "load failed");
                self.status.set_error(err);
            }
        }
    }
}

fn short(fingerprint: &str) -> &str {
    &fingerprint[..fingerprint.len().min(16)]
}

fn ingest_options(config: &EdashConfig) -> IngestOptions {
    IngestOptions::from_config(config.ingest.empty_cell)
}

fn wants_source(config: &EdashConfig, key: &str) -> bool {
    config.sheets.sources.is_empty() || config.sheets.sources.iter().any(|s| s == key)
}

fn assemble_workbooks<'w>(
    workbooks: impl Iterator<Item = (&'w str, &'w Workbook)>,
    config: &EdashConfig,
) -> AssemblyReport {
    let assembly = AssemblyConfig::from_config(config);
    let mut assembler = Assembler::new(&assembly);
    let mut report = AssemblyReport::default();

    for (key, workbook) in workbooks {
        if !wants_source(config, key) {
            debug!(source = key, "workbook not listed in sheets.sources");
            continue;
        }
        let library = build_sheet_library(workbook, &assembly.convention);
        if !library.skipped.is_empty() {
            debug!(source = key, skipped = library.skipped.len(), "sparse sheets skipped");
        }
        report.merge(assembler.assemble(&library, key));
    }
    report
}

/// Decrypted archive bytes → load outcome.
pub fn process_archive(bytes: &[u8], config: &EdashConfig) -> EdashResult<LoadOutcome> {
    let opts = ArchiveOptions {
        ingest: ingest_options(config),
        reject_collisions: config.ingest.reject_collisions,
    };
    let archive = extract(bytes, &opts).map_err(map_ingest_error)?;

    for wanted in &config.sheets.sources {
        if !archive.workbooks().any(|(key, _)| key == wanted.as_str()) {
            warn!(source = %wanted, "configured source workbook not in archive");
        }
    }

    let assembly = assemble_workbooks(archive.workbooks(), config);
    let mut outcome = LoadOutcome {
        archive: ArchiveReport::from_archive(&archive),
        ..Default::default()
    };

    let capacity_prefix = config.ingest.capacity_prefix.as_str();
    for (key, extension, text) in archive.delimited() {
        if !capacity_prefix.is_empty() && key.starts_with(capacity_prefix) {
            match parse_capacity_csv(text) {
                Ok(table) => {
                    outcome.capacity.insert(key.to_string(), table);
                }
                Err(e) => record_issue(&mut outcome.archive, key, extension, e.to_string()),
            }
            continue;
        }

        match delimited_to_rows(text, delimiter_for(extension, text), &opts.ingest) {
            Ok(rows) => {
                outcome.tables.insert(key.to_string(), rows);
            }
            Err(e) => record_issue(&mut outcome.archive, key, extension, e.to_string()),
        }
    }

    for (key, document) in archive.documents() {
        outcome.documents.insert(key.to_string(), document.clone());
    }

    outcome.registry.extend_from_report(&assembly);
    outcome.assembly = assembly;

    info!(
        files = %outcome.archive.summary(),
        diagrams = outcome.registry.len(),
        rejected = outcome.assembly.rejected.len(),
        "bundle loaded"
    );
    Ok(outcome)
}

fn record_issue(report: &mut ArchiveReport, key: &str, extension: &str, reason: String) {
    warn!(entry = key, %reason, "skipping table that failed to parse");
    report.issues.push(ExtractionIssue {
        path: format!("{key}.{extension}"),
        reason,
    });
}

/// Plain workbook bytes → load outcome, with the same empty-cell default as
/// the archive path.
pub fn process_workbook(bytes: &[u8], source: &str, config: &EdashConfig) -> EdashResult<LoadOutcome> {
    let workbook = workbook_to_tables(bytes, &ingest_options(config)).map_err(map_ingest_error)?;
    let assembly_config = AssemblyConfig::from_config(config);
    let library = build_sheet_library(&workbook, &assembly_config.convention);
    let assembly = Assembler::new(&assembly_config).assemble(&library, source);

    let mut outcome = LoadOutcome {
        archive: ArchiveReport {
            recognized: 1,
            ..Default::default()
        },
        ..Default::default()
    };
    outcome.registry.extend_from_report(&assembly);
    outcome.assembly = assembly;
    Ok(outcome)
}
