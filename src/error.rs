use thiserror::Error;

/// Failures while reading the dataset. Any of these means no data is handed
/// to the rest of the program.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("dataset file not found: {0}")]
    NotFound(String),
    #[error("failed to read dataset '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid value '{value}' in column '{column}' at line {line}")]
    InvalidValue {
        line: u64,
        column: String,
        value: String,
    },
    #[error("failed to fetch dataset from {url}: {reason}")]
    Http { url: String, reason: String },
    #[error("data_source_mode is 'internet' but no dataset_url is configured")]
    MissingUrl,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SchemaError {
    #[error("the following required columns are missing from the dataset: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

/// Anything that prevents a usable snapshot from being built.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Per-view failures. These are shown as a warning for the current view only.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ViewError {
    #[error("No data available for the year {0}.")]
    NoDataForYear(u16),
    #[error("No data available for the selected university: {0}.")]
    NoDataForUniversity(String),
    #[error("The dataset has no rows.")]
    EmptyDataset,
    #[error("unknown view '{0}'")]
    UnknownView(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_message_lists_every_column() {
        let err = SchemaError::MissingColumns(vec!["Rank".to_string(), "Country".to_string()]);
        assert_eq!(
            err.to_string(),
            "the following required columns are missing from the dataset: Rank, Country"
        );
    }

    #[test]
    fn no_data_messages() {
        assert_eq!(
            ViewError::NoDataForYear(2031).to_string(),
            "No data available for the year 2031."
        );
        assert!(ViewError::NoDataForUniversity("Nowhere U".into())
            .to_string()
            .contains("Nowhere U"));
    }
}
