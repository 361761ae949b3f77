use crate::error::{DatasetError, LoadError};
use crate::parse;
use crate::schema;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

pub const DEFAULT_DATASET_PATH: &str = "THE World University Rankings 2016-2025.csv";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dataset_path: String,
    // Data source configuration
    pub data_source_mode: DataSourceMode,
    pub dataset_url: Option<String>,
    pub output_directory: Option<String>,
    pub preview_rows: usize,
    pub top_n: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSourceMode {
    #[serde(rename = "local")]
    Local,
    #[serde(rename = "internet")]
    Internet,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset_path: DEFAULT_DATASET_PATH.to_string(),
            data_source_mode: DataSourceMode::Local,
            dataset_url: None,
            output_directory: Some("output".to_string()),
            preview_rows: 5,
            top_n: 10,
        }
    }
}

impl Config {
    pub fn load_from_file(file_path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(file_path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Row counts must be positive, otherwise a view would render nothing.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.top_n == 0 {
            anyhow::bail!("top_n must be at least 1");
        }
        if self.preview_rows == 0 {
            anyhow::bail!("preview_rows must be at least 1");
        }
        Ok(())
    }

    pub fn save_to_file(&self, file_path: &str) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(file_path, content)?;
        Ok(())
    }
}

/// The table exactly as read: trimmed header names and untyped rows.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<csv::StringRecord>,
}

/// One row of the rankings table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniversityRecord {
    pub name: String,
    pub year: u16,
    pub rank: u32,
    pub country: String,
    pub teaching: Option<f64>,
    pub research_environment: Option<f64>,
    pub research_quality: Option<f64>,
    pub industry_impact: Option<f64>,
    pub international_outlook: Option<f64>,
    pub overall_score: Option<f64>,
    pub student_population: u64,
    pub students_to_staff_ratio: Option<f64>,
    pub international_students: Option<f64>,
    pub female_to_male_ratio: Option<String>,
}

impl UniversityRecord {
    /// Minimal record for fixtures; optional attributes left empty.
    #[cfg(test)]
    pub fn new(name: &str, year: u16, rank: u32, country: &str, student_population: u64) -> Self {
        Self {
            name: name.to_string(),
            year,
            rank,
            country: country.to_string(),
            teaching: None,
            research_environment: None,
            research_quality: None,
            industry_impact: None,
            international_outlook: None,
            overall_score: None,
            student_population,
            students_to_staff_ratio: None,
            international_students: None,
            female_to_male_ratio: None,
        }
    }
}

/// Immutable snapshot of the loaded dataset. Built once per session and
/// shared by reference with every view.
#[derive(Debug, Clone)]
pub struct Rankings {
    columns: Vec<String>,
    raw_rows: Vec<csv::StringRecord>,
    records: Vec<UniversityRecord>,
}

struct Columns<'a> {
    index: HashMap<&'a str, usize>,
}

impl<'a> Columns<'a> {
    fn new(headers: &'a [String]) -> Self {
        // a repeated header resolves to its first column
        let mut index = HashMap::new();
        for (i, name) in headers.iter().enumerate() {
            index.entry(name.as_str()).or_insert(i);
        }
        Self { index }
    }

    fn cell<'r>(&self, row: &'r csv::StringRecord, column: &str) -> Option<&'r str> {
        self.index.get(column).and_then(|i| row.get(*i))
    }
}

fn required<T>(
    columns: &Columns,
    row: &csv::StringRecord,
    column: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, LoadError> {
    let raw = columns.cell(row, column).unwrap_or("");
    parse(raw).ok_or_else(|| LoadError::InvalidValue {
        line: row.position().map(|p| p.line()).unwrap_or(0),
        column: column.to_string(),
        value: raw.to_string(),
    })
}

fn optional<T>(
    columns: &Columns,
    row: &csv::StringRecord,
    column: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    columns.cell(row, column).and_then(parse)
}

impl Rankings {
    /// Validates the schema, then types every row. A schema failure means no
    /// snapshot exists and therefore no view can be computed.
    pub fn from_table(table: RawTable) -> Result<Self, DatasetError> {
        schema::validate(&table.headers)?;

        let columns = Columns::new(&table.headers);
        let mut records = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            let name = required(&columns, row, "Name", parse::non_empty)?;
            let country = required(&columns, row, "Country", parse::non_empty)?;
            records.push(UniversityRecord {
                name,
                year: required(&columns, row, "Year", parse::parse_year)?,
                rank: required(&columns, row, "Rank", parse::parse_rank)?,
                country,
                teaching: optional(&columns, row, "Teaching", parse::parse_score),
                research_environment: optional(&columns, row, "Research Environment", parse::parse_score),
                research_quality: optional(&columns, row, "Research Quality", parse::parse_score),
                industry_impact: optional(&columns, row, "Industry Impact", parse::parse_score),
                international_outlook: optional(&columns, row, "International Outlook", parse::parse_score),
                overall_score: optional(&columns, row, "Overall Score", parse::parse_score),
                student_population: required(&columns, row, "Student Population", parse::parse_count)?,
                students_to_staff_ratio: optional(&columns, row, "Students to Staff Ratio", parse::parse_score),
                international_students: optional(&columns, row, "International Students", parse::parse_score),
                female_to_male_ratio: optional(&columns, row, "Female to Male Ratio", parse::non_empty),
            });
        }
        debug!("typed {} records across {} columns", records.len(), table.headers.len());

        Ok(Self {
            columns: table.headers,
            raw_rows: table.rows,
            records,
        })
    }

    /// Snapshot built directly from typed records, with the canonical header.
    #[cfg(test)]
    pub fn from_records(records: Vec<UniversityRecord>) -> Self {
        Self {
            columns: schema::REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            raw_rows: Vec::new(),
            records,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[UniversityRecord] {
        &self.records
    }

    pub fn raw_rows(&self) -> &[csv::StringRecord] {
        &self.raw_rows
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct years, ascending.
    pub fn years(&self) -> Vec<u16> {
        let mut years: Vec<u16> = self
            .records
            .iter()
            .map(|r| r.year)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        years.sort_unstable();
        years
    }

    /// Distinct university names in order of first appearance.
    pub fn universities(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter(|r| seen.insert(r.name.as_str()))
            .map(|r| r.name.as_str())
            .collect()
    }

    /// A university's history: every record with that name, in file order.
    pub fn history(&self, name: &str) -> Vec<&UniversityRecord> {
        self.records.iter().filter(|r| r.name == name).collect()
    }

    /// First record with that name, whatever its year.
    pub fn first_record(&self, name: &str) -> Option<&UniversityRecord> {
        self.records.iter().find(|r| r.name == name)
    }
}
