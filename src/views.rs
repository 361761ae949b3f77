use crate::analyzer::{self, Table};
use crate::charts::{self, Figure};
use crate::error::ViewError;
use crate::models::{Config, Rankings};
use crate::schema::COLUMN_GLOSSARY;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// The six destinations of the navigation menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum View {
    DatasetPreview,
    TopUniversities,
    UniversityPerformance,
    CountryDistribution,
    PopulationGrowth,
    Comparison,
}

impl View {
    pub const ALL: [View; 6] = [
        View::DatasetPreview,
        View::TopUniversities,
        View::UniversityPerformance,
        View::CountryDistribution,
        View::PopulationGrowth,
        View::Comparison,
    ];

    /// Menu label, verbatim.
    pub fn label(&self) -> &'static str {
        match self {
            View::DatasetPreview => "Dataset Preview",
            View::TopUniversities => "Top 10 Universities",
            View::UniversityPerformance => "University Performance",
            View::CountryDistribution => "Distribution of Universities by Country",
            View::PopulationGrowth => "Student Population Growth",
            View::Comparison => "Comparison Between University",
        }
    }

    /// Short name used on the command line and for output file names.
    pub fn slug(&self) -> &'static str {
        match self {
            View::DatasetPreview => "preview",
            View::TopUniversities => "top10",
            View::UniversityPerformance => "performance",
            View::CountryDistribution => "distribution",
            View::PopulationGrowth => "population",
            View::Comparison => "comparison",
        }
    }

    pub fn heading(&self) -> &'static str {
        match self {
            View::DatasetPreview => "📊 Dataset Preview",
            View::TopUniversities => "🏆 Top 10 Universities by Year",
            View::UniversityPerformance => "📈 University Performance Over Time",
            View::CountryDistribution => "🌍 Distribution of Universities by Country",
            View::PopulationGrowth => "👩‍🎓📈 Student Population Growth Over Time",
            View::Comparison => "🏫 Comparison Between Universities",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            View::DatasetPreview => {
                "The first rows of THE World University Rankings (2016-2025), to check that the data loaded correctly."
            }
            View::TopUniversities => "The best-ranked universities for the selected year.",
            View::UniversityPerformance => "How the selected university's global rank has moved from 2016 to 2025.",
            View::CountryDistribution => {
                "Number of ranked universities from each country, year by year, over 2016-2025."
            }
            View::PopulationGrowth => "How the student population of the selected university has changed over the years.",
            View::Comparison => {
                "Teaching, Research Environment and Research Quality of two universities side by side."
            }
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for View {
    type Err = ViewError;

    /// Accepts a slug or a menu label, case-insensitively.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let wanted = input.trim();
        View::ALL
            .into_iter()
            .find(|view| view.slug().eq_ignore_ascii_case(wanted) || view.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ViewError::UnknownView(wanted.to_string()))
    }
}

/// The user's control choices. Anything left unset falls back to the first
/// available option.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub year: Option<u16>,
    pub university: Option<String>,
    pub second_university: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewSettings {
    pub preview_rows: usize,
    pub top_n: usize,
}

impl From<&Config> for ViewSettings {
    fn from(config: &Config) -> Self {
        Self {
            preview_rows: config.preview_rows,
            top_n: config.top_n,
        }
    }
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Everything one view produces for display.
#[derive(Debug, Clone, Serialize)]
pub struct ViewOutput {
    pub view: View,
    pub heading: String,
    pub description: String,
    pub figure: Option<Figure>,
    pub insights: Vec<String>,
    pub table: Option<Table>,
}

impl ViewOutput {
    fn new(view: View) -> Self {
        Self {
            view,
            heading: view.heading().to_string(),
            description: view.description().to_string(),
            figure: None,
            insights: Vec::new(),
            table: None,
        }
    }
}

fn default_year(rankings: &Rankings, selection: &Selection) -> Result<u16, ViewError> {
    match selection.year {
        Some(year) => Ok(year),
        None => rankings.years().first().copied().ok_or(ViewError::EmptyDataset),
    }
}

fn default_university(rankings: &Rankings, chosen: Option<&String>) -> Result<String, ViewError> {
    match chosen {
        Some(name) => Ok(name.clone()),
        None => rankings
            .universities()
            .first()
            .map(|name| name.to_string())
            .ok_or(ViewError::EmptyDataset),
    }
}

/// Computes one view from the snapshot. Each call recomputes from scratch.
pub fn render(
    view: View,
    rankings: &Rankings,
    selection: &Selection,
    settings: &ViewSettings,
) -> Result<ViewOutput, ViewError> {
    info!("rendering view: {}", view.label());
    let output = match view {
        View::DatasetPreview => dataset_preview(rankings, settings),
        View::TopUniversities => top_universities(rankings, default_year(rankings, selection)?, settings),
        View::UniversityPerformance => {
            university_performance(rankings, &default_university(rankings, selection.university.as_ref())?)
        }
        View::CountryDistribution => Ok(country_distribution(rankings)),
        View::PopulationGrowth => {
            population_growth(rankings, &default_university(rankings, selection.university.as_ref())?)
        }
        View::Comparison => {
            let first = default_university(rankings, selection.university.as_ref())?;
            let second = default_university(rankings, selection.second_university.as_ref())?;
            comparison(rankings, &first, &second)
        }
    }?;
    debug!(
        "{}: figure={} insights={}",
        view.slug(),
        output.figure.is_some(),
        output.insights.len()
    );
    Ok(output)
}

fn dataset_preview(rankings: &Rankings, settings: &ViewSettings) -> Result<ViewOutput, ViewError> {
    let mut output = ViewOutput::new(View::DatasetPreview);
    output.table = Some(analyzer::preview(rankings, settings.preview_rows));
    output.insights = COLUMN_GLOSSARY
        .iter()
        .map(|(column, meaning)| format!("{column}: {meaning}"))
        .collect();
    Ok(output)
}

fn top_universities(rankings: &Rankings, year: u16, settings: &ViewSettings) -> Result<ViewOutput, ViewError> {
    let rows = analyzer::top_n_by_year(rankings, year, settings.top_n)?;

    let mut output = ViewOutput::new(View::TopUniversities);
    output.figure = Some(charts::top_universities_bar(year, settings.top_n, &rows));
    output.insights = rows
        .iter()
        .map(|r| format!("#{} {} ({})", r.rank, r.name, r.country))
        .collect();
    output.table = Some(Table {
        columns: vec!["Rank".into(), "Name".into(), "Country".into()],
        rows: rows
            .iter()
            .map(|r| vec![r.rank.to_string(), r.name.clone(), r.country.clone()])
            .collect(),
    });
    Ok(output)
}

fn university_performance(rankings: &Rankings, university: &str) -> Result<ViewOutput, ViewError> {
    let history = analyzer::university_trend(rankings, university)?;
    let insights = &history.insights;

    let mut output = ViewOutput::new(View::UniversityPerformance);
    output.insights = vec![
        format!("Key insights for {university}:"),
        format!("Best Rank Achieved: {} in {}", insights.best_rank, insights.best_rank_year),
        format!("Current Rank: {} in {}", insights.current_rank, insights.current_year),
        format!("Overall Trend: {}", insights.trend.label()),
    ];
    output.figure = Some(charts::rank_trend_line(&history));
    Ok(output)
}

fn country_distribution(rankings: &Rankings) -> ViewOutput {
    let counts = analyzer::country_distribution(rankings);

    let mut output = ViewOutput::new(View::CountryDistribution);
    output.insights = rankings
        .years()
        .into_iter()
        .filter_map(|year| {
            let countries = counts.iter().filter(|c| c.year == year).count();
            analyzer::leading_country(&counts, year).map(|leader| {
                format!(
                    "{year}: {countries} countries ranked; most universities in {} ({})",
                    leader.country, leader.count
                )
            })
        })
        .collect();
    output.table = Some(Table {
        columns: vec!["Year".into(), "Country".into(), "Count".into()],
        rows: counts
            .iter()
            .map(|c| vec![c.year.to_string(), c.country.clone(), c.count.to_string()])
            .collect(),
    });
    output.figure = Some(charts::country_choropleth(&counts));
    output
}

fn population_growth(rankings: &Rankings, university: &str) -> Result<ViewOutput, ViewError> {
    let history = analyzer::population_growth(rankings, university)?;
    let insights = &history.insights;

    let mut output = ViewOutput::new(View::PopulationGrowth);
    output.insights = vec![
        format!("Key insights for {university}:"),
        format!(
            "Current Student Population: {} in {}",
            insights.current_population, insights.current_year
        ),
        format!(
            "Highest Student Population: {} in {}",
            insights.max_population, insights.max_population_year
        ),
        format!("Overall Trend: {}", insights.trend.label()),
    ];
    output.figure = Some(charts::population_area(&history));
    Ok(output)
}

fn format_score(score: Option<f64>) -> String {
    score.map(|s| format!("{s:.1}")).unwrap_or_else(|| "n/a".to_string())
}

fn comparison(rankings: &Rankings, first: &str, second: &str) -> Result<ViewOutput, ViewError> {
    let rows = analyzer::compare(rankings, first, second)?;

    let mut output = ViewOutput::new(View::Comparison);
    let (left, right) = rows.split_at(rows.len() / 2);
    output.insights = left
        .iter()
        .zip(right)
        .map(|(a, b)| {
            format!(
                "{}: {} {} vs {} {}",
                a.metric.label(),
                a.university,
                format_score(a.score),
                b.university,
                format_score(b.score)
            )
        })
        .collect();
    output.table = Some(Table {
        columns: vec!["University".into(), "Metrics".into(), "Score".into()],
        rows: rows
            .iter()
            .map(|r| {
                vec![
                    r.university.clone(),
                    r.metric.label().to_string(),
                    r.score.map(|s| s.to_string()).unwrap_or_default(),
                ]
            })
            .collect(),
    });
    output.figure = Some(charts::comparison_bars(first, second, &rows));
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UniversityRecord;

    fn rankings() -> Rankings {
        let mut a20 = UniversityRecord::new("A", 2020, 5, "Japan", 1000);
        a20.teaching = Some(80.0);
        a20.research_environment = Some(70.0);
        a20.research_quality = Some(60.0);
        let a21 = UniversityRecord::new("A", 2021, 3, "Japan", 1200);
        let mut b20 = UniversityRecord::new("B", 2020, 1, "Chile", 900);
        b20.teaching = Some(50.0);
        Rankings::from_records(vec![a20, a21, b20])
    }

    #[test]
    fn labels_are_verbatim_and_parse_back() {
        let labels: Vec<&str> = View::ALL.iter().map(|v| v.label()).collect();
        assert_eq!(
            labels,
            vec![
                "Dataset Preview",
                "Top 10 Universities",
                "University Performance",
                "Distribution of Universities by Country",
                "Student Population Growth",
                "Comparison Between University",
            ]
        );
        for view in View::ALL {
            assert_eq!(view.label().parse::<View>(), Ok(view));
            assert_eq!(view.slug().parse::<View>(), Ok(view));
        }
        assert_eq!("top10".parse::<View>(), Ok(View::TopUniversities));
        assert_eq!(
            "Leaderboard".parse::<View>(),
            Err(ViewError::UnknownView("Leaderboard".into()))
        );
    }

    #[test]
    fn top_universities_defaults_to_first_year() {
        let output = render(View::TopUniversities, &rankings(), &Selection::default(), &ViewSettings::default()).unwrap();
        assert!(output.figure.is_some());
        assert_eq!(output.insights, vec!["#1 B (Chile)".to_string(), "#5 A (Japan)".to_string()]);
    }

    #[test]
    fn empty_year_produces_no_figure() {
        let selection = Selection {
            year: Some(2019),
            ..Selection::default()
        };
        let result = render(View::TopUniversities, &rankings(), &selection, &ViewSettings::default());
        assert_eq!(result.unwrap_err(), ViewError::NoDataForYear(2019));
    }

    #[test]
    fn performance_insights_text() {
        let selection = Selection {
            university: Some("A".into()),
            ..Selection::default()
        };
        let output = render(View::UniversityPerformance, &rankings(), &selection, &ViewSettings::default()).unwrap();
        assert_eq!(output.insights[1], "Best Rank Achieved: 3 in 2021");
        assert_eq!(output.insights[2], "Current Rank: 3 in 2021");
        assert_eq!(output.insights[3], "Overall Trend: 📈 Improving");
    }

    #[test]
    fn population_insights_text() {
        let selection = Selection {
            university: Some("A".into()),
            ..Selection::default()
        };
        let output = render(View::PopulationGrowth, &rankings(), &selection, &ViewSettings::default()).unwrap();
        assert_eq!(output.insights[1], "Current Student Population: 1200 in 2021");
        assert_eq!(output.insights[2], "Highest Student Population: 1200 in 2021");
        assert_eq!(output.insights[3], "Overall Trend: 📈 Increasing");
        assert_eq!(output.figure.unwrap().data.len(), 2);
    }

    #[test]
    fn distribution_table_and_summary() {
        let output = render(View::CountryDistribution, &rankings(), &Selection::default(), &ViewSettings::default()).unwrap();
        let table = output.table.unwrap();
        assert_eq!(table.rows[0], vec!["2020", "Chile", "1"]);
        assert_eq!(table.rows.len(), 3);
        assert_eq!(
            output.insights[0],
            "2020: 2 countries ranked; most universities in Chile (1)"
        );
    }

    #[test]
    fn comparison_defaults_both_sides_to_first_university() {
        let output = render(View::Comparison, &rankings(), &Selection::default(), &ViewSettings::default()).unwrap();
        assert_eq!(output.insights[0], "Teaching: A 80.0 vs A 80.0");
        assert_eq!(output.table.unwrap().rows.len(), 6);
    }

    #[test]
    fn comparison_reports_missing_scores() {
        let selection = Selection {
            university: Some("A".into()),
            second_university: Some("B".into()),
            ..Selection::default()
        };
        let output = render(View::Comparison, &rankings(), &selection, &ViewSettings::default()).unwrap();
        assert_eq!(output.insights[2], "Research Quality: A 60.0 vs B n/a");
    }

    #[test]
    fn empty_dataset_has_no_default_selection() {
        let empty = Rankings::from_records(Vec::new());
        let result = render(View::UniversityPerformance, &empty, &Selection::default(), &ViewSettings::default());
        assert_eq!(result.unwrap_err(), ViewError::EmptyDataset);
    }
}
