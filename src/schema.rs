use crate::error::SchemaError;
use tracing::{debug, error};

pub const REQUIRED_COLUMNS: [&str; 7] = [
    "Name",
    "Year",
    "Rank",
    "Country",
    "Teaching",
    "Research Environment",
    "Student Population",
];

/// Column descriptions shown alongside the dataset preview.
pub const COLUMN_GLOSSARY: [(&str, &str); 14] = [
    ("Rank", "Global ranking of the university."),
    ("Name", "Name of the university."),
    ("Country", "Country where the university is located."),
    ("Student Population", "Total number of students at the university."),
    ("Students to Staff Ratio", "Number of students per staff member."),
    ("International Students", "Percentage of international students."),
    ("Female to Male Ratio", "Ratio of female to male students."),
    (
        "Overall Score",
        "Score out of 100 combining teaching, research environment, research quality, industry impact and international outlook.",
    ),
    ("Teaching", "Score out of 100 measuring teaching quality."),
    (
        "Research Environment",
        "Score out of 100 measuring how well the university supports research.",
    ),
    (
        "Research Quality",
        "Score out of 100 measuring the quality of research output, including publications, citations and impact.",
    ),
    (
        "Industry Impact",
        "Score out of 100 measuring contribution to industry through collaboration and applied research.",
    ),
    (
        "International Outlook",
        "Score out of 100 measuring international students, staff and research collaboration.",
    ),
    ("Year", "Ranking year, 2016 to 2025."),
];

/// Header cells are compared after trimming whitespace and a UTF-8 BOM.
pub fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_string()
}

/// `REQUIRED_COLUMNS − present`, in required-list order.
pub fn missing_columns<S: AsRef<str>>(present: &[S]) -> Vec<String> {
    REQUIRED_COLUMNS
        .iter()
        .filter(|required| !present.iter().any(|p| normalize_header(p.as_ref()) == **required))
        .map(|required| required.to_string())
        .collect()
}

pub fn validate<S: AsRef<str>>(present: &[S]) -> Result<(), SchemaError> {
    let missing = missing_columns(present);
    if missing.is_empty() {
        debug!("schema ok: all {} required columns present", REQUIRED_COLUMNS.len());
        Ok(())
    } else {
        error!(?missing, "required columns missing");
        Err(SchemaError::MissingColumns(missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_header_passes() {
        let mut header: Vec<&str> = REQUIRED_COLUMNS.to_vec();
        header.push("Overall Score");
        assert!(missing_columns(&header).is_empty());
        assert!(validate(&header).is_ok());
    }

    #[test]
    fn reports_exactly_the_missing_columns() {
        let header = ["Name", "Year", "Country", "Teaching", "Student Population"];
        assert_eq!(
            missing_columns(&header),
            vec!["Rank".to_string(), "Research Environment".to_string()]
        );
        assert_eq!(
            validate(&header),
            Err(SchemaError::MissingColumns(vec![
                "Rank".to_string(),
                "Research Environment".to_string()
            ]))
        );
    }

    #[test]
    fn bom_and_padding_are_ignored() {
        let header = [
            "\u{feff}Name",
            " Year ",
            "Rank",
            "Country",
            "Teaching",
            "Research Environment",
            "Student Population",
        ];
        assert!(missing_columns(&header).is_empty());
    }

    #[test]
    fn glossary_covers_required_columns() {
        for column in REQUIRED_COLUMNS {
            assert!(COLUMN_GLOSSARY.iter().any(|(name, _)| *name == column));
        }
    }
}
