//! Conversion pipeline
//!
//! Both entry points run the same stages, each returning early on failure:
//!
//! 1. decide the input format (filename extension for uploads, the three-tier
//!    classifier for URLs)
//! 2. validate the sheet name
//! 3. stage the input in the upload directory
//! 4. load and encode on the blocking thread pool
//! 5. store the workbook and record the conversion
//!
//! Recording runs in the background and is best effort: the converted file is
//! returned without waiting for it, and a stats failure is only logged.

use crate::classify;
use crate::config::DEFAULT_SHEET_NAME;
use crate::error::{Error, Result};
use crate::fetch::RemoteFetcher;
use crate::spreadsheet;
use crate::stats::StatsStore;
use crate::table;
use crate::types::{ConversionEvent, ConversionType, ConvertedFile, FileFormat};
use crate::workspace::{Workspace, random_token, sanitize_stem};
use std::path::Path;
use std::sync::Arc;

/// Runs uploads and URL downloads through the conversion pipeline
pub struct Converter {
    workspace: Workspace,
    fetcher: RemoteFetcher,
    stats: Arc<dyn StatsStore>,
}

/// Where a conversion's input came from and how to name its output
struct Job {
    conversion_type: ConversionType,
    format: FileFormat,
    output_stem: String,
    download_name: String,
}

impl Converter {
    /// Create a converter writing into `workspace` and recording to `stats`
    pub fn new(workspace: Workspace, fetcher: RemoteFetcher, stats: Arc<dyn StatsStore>) -> Self {
        Self {
            workspace,
            fetcher,
            stats,
        }
    }

    /// The directories this converter writes to
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Convert an uploaded file
    ///
    /// The format comes from the filename extension and is checked before the
    /// content is looked at.
    pub async fn convert_upload(
        &self,
        filename: Option<&str>,
        content: Vec<u8>,
        sheet_name: Option<&str>,
    ) -> Result<ConvertedFile> {
        let filename = filename
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(Error::InvalidFilename)?;

        let format = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(FileFormat::from_extension)
            .ok_or_else(|| Error::UnsupportedExtension {
                filename: filename.to_string(),
            })?;

        if content.is_empty() {
            return Err(Error::EmptyContent(format!("uploaded file '{}' is empty", filename)));
        }

        tracing::info!(filename, format = %format, bytes = content.len(), "converting uploaded file");

        let output_stem = format!("{}_converted", sanitize_stem(filename));
        let job = Job {
            conversion_type: ConversionType::FileUpload,
            format,
            download_name: format!("{}.xlsx", output_stem),
            output_stem,
        };
        self.run(job, content, sheet_name).await
    }

    /// Download `url`, classify its content and convert it
    pub async fn convert_url(&self, url: &str, sheet_name: Option<&str>) -> Result<ConvertedFile> {
        let sheet_name = resolve_sheet_name(sheet_name);
        spreadsheet::validate_sheet_name(sheet_name)?;

        let fetched = self.fetcher.fetch(url).await?;
        let classification = classify::classify(
            &fetched.url,
            fetched.content_type.as_deref(),
            &fetched.body,
        )?;

        tracing::info!(
            url,
            format = %classification.format,
            tier = ?classification.tier,
            "converting downloaded file"
        );

        let token = random_token();
        let job = Job {
            conversion_type: ConversionType::UrlConversion,
            format: classification.format,
            output_stem: "url_converted".to_string(),
            download_name: format!("url_converted_{}.xlsx", &token[..8]),
        };
        self.run(job, fetched.body, Some(sheet_name)).await
    }

    async fn run(&self, job: Job, content: Vec<u8>, sheet_name: Option<&str>) -> Result<ConvertedFile> {
        let sheet_name = resolve_sheet_name(sheet_name).to_string();
        spreadsheet::validate_sheet_name(&sheet_name)?;

        let staged = self.workspace.stage_input(content, job.format).await?;
        let input_path = staged.path().to_path_buf();
        let format = job.format;

        let (rows, columns, bytes) = tokio::task::spawn_blocking(move || {
            let content = std::fs::read(&input_path)?;
            let table = table::load(&content, format)?;
            let bytes = spreadsheet::encode(&table, &sheet_name)?;
            Ok::<_, Error>((table.row_count(), table.column_count(), bytes))
        })
        .await
        .map_err(|e| Error::Other(format!("conversion task failed: {}", e)))??;
        drop(staged);

        let path = self.workspace.store_output(&job.output_stem, &bytes).await?;

        self.record_in_background(ConversionEvent::success(job.conversion_type, job.format));

        tracing::info!(
            conversion_type = job.conversion_type.as_str(),
            format = %job.format,
            rows,
            columns,
            output = %path.display(),
            "conversion complete"
        );

        Ok(ConvertedFile {
            download_name: job.download_name,
            path,
            format: job.format,
            rows,
            columns,
            bytes,
        })
    }

    /// Record `event` without holding up the response
    fn record_in_background(&self, event: ConversionEvent) {
        let stats = Arc::clone(&self.stats);
        tokio::spawn(async move {
            if let Err(e) = stats.record(&event).await {
                tracing::error!(error = %e, "failed to record conversion stats");
            }
        });
    }
}

/// Blank or missing sheet names fall back to the default
fn resolve_sheet_name(sheet_name: Option<&str>) -> &str {
    match sheet_name {
        Some(name) if !name.trim().is_empty() => name,
        _ => DEFAULT_SHEET_NAME,
    }
}
