use crate::error::ViewError;
use crate::models::{Rankings, UniversityRecord};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RankTrend {
    Improving,
    Declining,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PopulationTrend {
    Increasing,
    Decreasing,
}

impl RankTrend {
    /// First-vs-last only. A higher final rank number is a decline; an equal
    /// one counts as improving.
    pub fn from_endpoints(first: u32, last: u32) -> Self {
        if last > first {
            RankTrend::Declining
        } else {
            RankTrend::Improving
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RankTrend::Improving => "📈 Improving",
            RankTrend::Declining => "📉 Declining",
        }
    }
}

impl PopulationTrend {
    /// First-vs-last only. Only a strictly larger final population counts as
    /// increasing.
    pub fn from_endpoints(first: u64, last: u64) -> Self {
        if last > first {
            PopulationTrend::Increasing
        } else {
            PopulationTrend::Decreasing
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PopulationTrend::Increasing => "📈 Increasing",
            PopulationTrend::Decreasing => "📉 Decreasing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankInsights {
    pub best_rank: u32,
    pub best_rank_year: u16,
    pub current_rank: u32,
    pub current_year: u16,
    pub trend: RankTrend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopulationInsights {
    pub current_population: u64,
    pub current_year: u16,
    pub max_population: u64,
    pub max_population_year: u16,
    pub trend: PopulationTrend,
}

/// A university's rows in file order together with the derived insights.
#[derive(Debug, Clone)]
pub struct History<'a, I> {
    pub university: String,
    pub series: Vec<&'a UniversityRecord>,
    pub insights: I,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryCount {
    pub year: u16,
    pub country: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Metric {
    Teaching,
    ResearchEnvironment,
    ResearchQuality,
}

impl Metric {
    pub const ALL: [Metric; 3] = [
        Metric::Teaching,
        Metric::ResearchEnvironment,
        Metric::ResearchQuality,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Teaching => "Teaching",
            Metric::ResearchEnvironment => "Research Environment",
            Metric::ResearchQuality => "Research Quality",
        }
    }

    fn score(&self, record: &UniversityRecord) -> Option<f64> {
        match self {
            Metric::Teaching => record.teaching,
            Metric::ResearchEnvironment => record.research_environment,
            Metric::ResearchQuality => record.research_quality,
        }
    }
}

/// One (University, Metric, Score) triple of the long-format comparison table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub university: String,
    pub metric: Metric,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// First `n` rows of the table as read, every column verbatim.
pub fn preview(rankings: &Rankings, n: usize) -> Table {
    Table {
        columns: rankings.columns().to_vec(),
        rows: rankings
            .raw_rows()
            .iter()
            .take(n)
            .map(|row| row.iter().map(str::to_string).collect())
            .collect(),
    }
}

/// The `n` best-ranked rows of `year`, ascending by rank. Ties keep file order.
pub fn top_n_by_year(rankings: &Rankings, year: u16, n: usize) -> Result<Vec<&UniversityRecord>, ViewError> {
    let mut rows: Vec<&UniversityRecord> = rankings.records().iter().filter(|r| r.year == year).collect();
    if rows.is_empty() {
        return Err(ViewError::NoDataForYear(year));
    }

    rows.sort_by_key(|r| r.rank);
    rows.truncate(n);
    if rows.is_empty() {
        return Err(ViewError::NoDataForYear(year));
    }
    debug!("top {} for {}: {} rows", n, year, rows.len());
    Ok(rows)
}

fn history_of<'a>(rankings: &'a Rankings, university: &str) -> Result<Vec<&'a UniversityRecord>, ViewError> {
    let series = rankings.history(university);
    if series.is_empty() {
        return Err(ViewError::NoDataForUniversity(university.to_string()));
    }
    Ok(series)
}

/// Rank history of one university. The series is not re-sorted by year.
pub fn university_trend<'a>(
    rankings: &'a Rankings,
    university: &str,
) -> Result<History<'a, RankInsights>, ViewError> {
    let series = history_of(rankings, university)?;
    let first = series[0];
    let last = series[series.len() - 1];

    let mut best = first;
    for &record in &series[1..] {
        if record.rank < best.rank {
            best = record;
        }
    }

    let insights = RankInsights {
        best_rank: best.rank,
        best_rank_year: best.year,
        current_rank: last.rank,
        current_year: last.year,
        trend: RankTrend::from_endpoints(first.rank, last.rank),
    };

    Ok(History {
        university: university.to_string(),
        series,
        insights,
    })
}

/// Rows per (year, country), ordered by year then country.
pub fn country_distribution(rankings: &Rankings) -> Vec<CountryCount> {
    let mut counts: BTreeMap<(u16, &str), usize> = BTreeMap::new();
    for record in rankings.records() {
        *counts.entry((record.year, record.country.as_str())).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|((year, country), count)| CountryCount {
            year,
            country: country.to_string(),
            count,
        })
        .collect()
}

/// Country with the most rows in `year`; the alphabetically first wins a tie.
pub fn leading_country(counts: &[CountryCount], year: u16) -> Option<&CountryCount> {
    counts
        .iter()
        .filter(|c| c.year == year)
        .fold(None, |best: Option<&CountryCount>, c| match best {
            Some(b) if b.count >= c.count => Some(b),
            _ => Some(c),
        })
}

/// Student population history of one university, in file order.
pub fn population_growth<'a>(
    rankings: &'a Rankings,
    university: &str,
) -> Result<History<'a, PopulationInsights>, ViewError> {
    let series = history_of(rankings, university)?;
    let first = series[0];
    let last = series[series.len() - 1];

    let mut max = first;
    for &record in &series[1..] {
        if record.student_population > max.student_population {
            max = record;
        }
    }

    let insights = PopulationInsights {
        current_population: last.student_population,
        current_year: last.year,
        max_population: max.student_population,
        max_population_year: max.year,
        trend: PopulationTrend::from_endpoints(first.student_population, last.student_population),
    };

    Ok(History {
        university: university.to_string(),
        series,
        insights,
    })
}

/// Long-format comparison of two universities on the three research and
/// teaching metrics. Each side uses the first record found for that name,
/// whatever its year.
pub fn compare(rankings: &Rankings, first: &str, second: &str) -> Result<Vec<ComparisonRow>, ViewError> {
    let pick = |name: &str| {
        rankings
            .first_record(name)
            .ok_or_else(|| ViewError::NoDataForUniversity(name.to_string()))
    };
    let sides = [(first, pick(first)?), (second, pick(second)?)];

    Ok(sides
        .iter()
        .flat_map(|(name, record)| {
            Metric::ALL.into_iter().map(move |metric| ComparisonRow {
                university: name.to_string(),
                metric,
                score: metric.score(record),
            })
        })
        .collect())
}
