use crate::error::LoadError;
use crate::models::{Config, DataSourceMode, RawTable};
use crate::schema::normalize_header;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub struct DatasetLoader {
    client: reqwest::Client,
}

impl DatasetLoader {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Reads the dataset from whichever source the configuration selects.
    pub async fn load(&self, config: &Config) -> Result<RawTable, LoadError> {
        match config.data_source_mode {
            DataSourceMode::Local => self.load_file(Path::new(&config.dataset_path)),
            DataSourceMode::Internet => {
                let url = config.dataset_url.as_deref().ok_or(LoadError::MissingUrl)?;
                self.load_url(url).await
            }
        }
    }

    pub fn load_file(&self, path: &Path) -> Result<RawTable, LoadError> {
        if !path.exists() {
            return Err(LoadError::NotFound(path.display().to_string()));
        }
        info!("📂 Reading dataset from: {}", path.display());

        let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let table = read_table(file)?;
        info!("   ✅ Loaded {} rows, {} columns", table.rows.len(), table.headers.len());
        Ok(table)
    }

    pub async fn load_url(&self, url: &str) -> Result<RawTable, LoadError> {
        info!("🌐 Fetching dataset from: {}", url);

        let http_error = |reason: String| LoadError::Http {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| http_error(e.to_string()))?;

        if !response.status().is_success() {
            return Err(http_error(format!("HTTP request failed with status: {}", response.status())));
        }

        let body = response.bytes().await.map_err(|e| http_error(e.to_string()))?;
        let table = read_table(body.as_ref())?;
        if table.rows.is_empty() {
            warn!("   ⚠️  Dataset at {} has a header but no rows", url);
        }
        info!("   ✅ Loaded {} rows, {} columns", table.rows.len(), table.headers.len());
        Ok(table)
    }
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Comma-delimited with a header row. Every row must parse, otherwise the
/// whole table is rejected.
pub fn read_table<R: Read>(input: R) -> Result<RawTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(input);

    let headers = reader.headers()?.iter().map(normalize_header).collect();
    let rows = reader.records().collect::<Result<Vec<_>, _>>()?;

    Ok(RawTable { headers, rows })
}
