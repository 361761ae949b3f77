use crate::analyzer::{ComparisonRow, CountryCount, History, Metric, PopulationInsights, RankInsights};
use crate::models::UniversityRecord;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";

const PLASMA: [&str; 10] = [
    "#0d0887", "#46039f", "#7201a8", "#9c179e", "#bd3786", "#d8576b", "#ed7953", "#fb9f3a", "#fdca26",
    "#f0f921",
];

const SET2: [&str; 8] = [
    "rgb(102,194,165)",
    "rgb(252,141,98)",
    "rgb(141,160,203)",
    "rgb(231,138,195)",
    "rgb(166,216,84)",
    "rgb(255,217,47)",
    "rgb(229,196,148)",
    "rgb(179,179,179)",
];

const POPULATION_FILL: &str = "rgba(0, 100, 200, 0.2)";

/// A Plotly figure: traces, layout and (for animated charts) frames.
#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    pub data: Vec<Value>,
    pub layout: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub frames: Vec<Value>,
}

fn continuous_scale(colors: &[&str]) -> Value {
    let last = (colors.len() - 1) as f64;
    Value::Array(
        colors
            .iter()
            .enumerate()
            .map(|(i, color)| json!([i as f64 / last, color]))
            .collect(),
    )
}

fn left_title(text: &str, size: u32) -> Value {
    json!({ "text": text, "x": 0, "xanchor": "left", "font": { "size": size } })
}

/// Horizontal bars of rank per university, best rank on top.
pub fn top_universities_bar(year: u16, top_n: usize, rows: &[&UniversityRecord]) -> Figure {
    let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
    let ranks: Vec<u32> = rows.iter().map(|r| r.rank).collect();

    let trace = json!({
        "type": "bar",
        "orientation": "h",
        "x": ranks,
        "y": names,
        "text": ranks,
        "texttemplate": "%{text}",
        "textposition": "outside",
        "marker": {
            "color": ranks,
            "colorscale": "Viridis",
            "showscale": true,
            "colorbar": { "title": { "text": "Rank" } }
        },
        "hovertemplate": "University=%{y}<br>Rank=%{x}<extra></extra>"
    });

    Figure {
        data: vec![trace],
        layout: json!({
            "title": { "text": format!("Top {top_n} Universities in {year}") },
            "xaxis": { "title": { "text": "Rank (1 is best)" }, "autorange": "reversed" },
            "yaxis": { "title": { "text": "University" }, "autorange": "reversed" }
        }),
        frames: Vec::new(),
    }
}

/// Year → Rank line, rank axis reversed.
pub fn rank_trend_line(history: &History<RankInsights>) -> Figure {
    let years: Vec<u16> = history.series.iter().map(|r| r.year).collect();
    let ranks: Vec<u32> = history.series.iter().map(|r| r.rank).collect();

    Figure {
        data: vec![json!({
            "type": "scatter",
            "mode": "lines+markers",
            "x": years,
            "y": ranks,
            "name": history.university,
            "hovertemplate": "Year=%{x}<br>Rank=%{y}<extra></extra>"
        })],
        layout: json!({
            "title": { "text": format!("📊 Ranking Trend of {} Over Time", history.university) },
            "xaxis": { "title": { "text": "Year" } },
            "yaxis": { "title": { "text": "Rank" }, "autorange": "reversed" }
        }),
        frames: Vec::new(),
    }
}

/// University counts per country, one animation frame per year.
pub fn country_choropleth(counts: &[CountryCount]) -> Figure {
    let mut by_year: BTreeMap<u16, (Vec<&str>, Vec<usize>)> = BTreeMap::new();
    for count in counts {
        let entry = by_year.entry(count.year).or_default();
        entry.0.push(count.country.as_str());
        entry.1.push(count.count);
    }

    let max_count = counts.iter().map(|c| c.count).max().unwrap_or(0);
    let trace = |countries: &[&str], values: &[usize]| {
        json!({
            "type": "choropleth",
            "locations": countries,
            "locationmode": "country names",
            "z": values,
            "coloraxis": "coloraxis",
            "hovertemplate": "Country=%{location}<br>Number of Universities=%{z}<extra></extra>"
        })
    };

    let frames: Vec<Value> = by_year
        .iter()
        .map(|(year, (countries, values))| {
            json!({ "name": year.to_string(), "data": [trace(countries, values)] })
        })
        .collect();

    let data = by_year
        .values()
        .next()
        .map(|(countries, values)| vec![trace(countries, values)])
        .unwrap_or_default();

    let steps: Vec<Value> = by_year
        .keys()
        .map(|year| {
            json!({
                "method": "animate",
                "label": year.to_string(),
                "args": [[year.to_string()], {
                    "mode": "immediate",
                    "frame": { "duration": 0, "redraw": true },
                    "transition": { "duration": 0 }
                }]
            })
        })
        .collect();

    Figure {
        data,
        layout: json!({
            "title": left_title("📊 Number of Universities per Country by Year", 24),
            "coloraxis": {
                "colorscale": continuous_scale(&PLASMA),
                "cmin": 0,
                "cmax": max_count,
                "colorbar": { "title": { "text": "Number of Universities" } }
            },
            "geo": {
                "projection": { "type": "natural earth" },
                "showcoastlines": true,
                "coastlinecolor": "Black",
                "showland": true,
                "landcolor": "lightgray",
                "subunitcolor": "Black",
                "countrycolor": "Black"
            },
            "margin": { "l": 0, "r": 0, "t": 40, "b": 0 },
            "sliders": [{
                "active": 0,
                "currentvalue": { "prefix": "Year=" },
                "steps": steps
            }],
            "updatemenus": [{
                "type": "buttons",
                "showactive": false,
                "buttons": [
                    {
                        "label": "▶",
                        "method": "animate",
                        "args": [null, { "frame": { "duration": 500, "redraw": true }, "fromcurrent": true }]
                    },
                    {
                        "label": "◼",
                        "method": "animate",
                        "args": [[null], { "mode": "immediate", "frame": { "duration": 0, "redraw": true } }]
                    }
                ]
            }]
        }),
        frames,
    }
}

/// Year → Student Population line with the area under it filled.
pub fn population_area(history: &History<PopulationInsights>) -> Figure {
    let years: Vec<u16> = history.series.iter().map(|r| r.year).collect();
    let population: Vec<u64> = history.series.iter().map(|r| r.student_population).collect();

    Figure {
        data: vec![
            json!({
                "type": "scatter",
                "mode": "lines+markers",
                "x": years,
                "y": population,
                "name": history.university,
                "hovertemplate": "Year=%{x}<br>Students=%{y}<extra></extra>"
            }),
            json!({
                "type": "scatter",
                "mode": "none",
                "x": years,
                "y": population,
                "fill": "tozeroy",
                "fillcolor": POPULATION_FILL,
                "showlegend": false,
                "hoverinfo": "skip"
            }),
        ],
        layout: json!({
            "title": left_title(&format!("📊 Student Population Growth for {}", history.university), 20),
            "xaxis": { "title": { "text": "Year" } },
            "yaxis": { "title": { "text": "Number of Students" } },
            "margin": { "l": 40, "r": 40, "t": 40, "b": 40 },
            "hovermode": "x unified"
        }),
        frames: Vec::new(),
    }
}

/// Grouped bars: one trace per metric, grouped by university.
pub fn comparison_bars(first: &str, second: &str, rows: &[ComparisonRow]) -> Figure {
    let data = Metric::ALL
        .iter()
        .enumerate()
        .map(|(i, metric)| {
            let (universities, scores): (Vec<&str>, Vec<Option<f64>>) = rows
                .iter()
                .filter(|row| row.metric == *metric)
                .map(|row| (row.university.as_str(), row.score))
                .unzip();
            json!({
                "type": "bar",
                "name": metric.label(),
                "x": universities,
                "y": scores,
                "marker": { "color": SET2[i % SET2.len()] },
                "hovertemplate": format!("Metrics={}<br>University=%{{x}}<br>Score=%{{y}}<extra></extra>", metric.label())
            })
        })
        .collect();

    Figure {
        data,
        layout: json!({
            "title": left_title(&format!("📊 Comparison: {first} VS {second}"), 16),
            "barmode": "group",
            "legend": { "title": { "text": "Metrics" } },
            "xaxis": { "title": { "text": "Universities" } },
            "yaxis": { "title": { "text": "Score" } },
            "margin": { "l": 40, "r": 40, "t": 40, "b": 40 }
        }),
        frames: Vec::new(),
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Standalone page that draws the figure with plotly.js.
pub fn to_html(title: &str, figure: &Figure) -> Result<String, serde_json::Error> {
    // keep "</script>" in labels from closing the script element
    let spec = serde_json::to_string(figure)?.replace("</", "<\\/");
    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{title}</title>
    <script src="{cdn}"></script>
</head>
<body>
    <div id="chart" style="width:100%;height:90vh;"></div>
    <script>
        const figure = {spec};
        Plotly.newPlot("chart", figure.data, figure.layout, {{ responsive: true }})
            .then(() => {{ if (figure.frames) {{ Plotly.addFrames("chart", figure.frames); }} }});
    </script>
</body>
</html>
"#,
        title = escape_html(title),
        cdn = PLOTLY_CDN,
        spec = spec,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{self, RankTrend};
    use crate::models::Rankings;

    fn rec(name: &str, year: u16, rank: u32, country: &str) -> UniversityRecord {
        UniversityRecord::new(name, year, rank, country, 1000)
    }

    #[test]
    fn top_bar_reverses_both_axes() {
        let a = rec("A", 2020, 1, "X");
        let b = rec("B", 2020, 2, "X");
        let figure = top_universities_bar(2020, 10, &[&a, &b]);

        assert_eq!(figure.layout["xaxis"]["autorange"], "reversed");
        assert_eq!(figure.layout["yaxis"]["autorange"], "reversed");
        assert_eq!(figure.layout["title"]["text"], "Top 10 Universities in 2020");
        assert_eq!(figure.data[0]["orientation"], "h");
        assert_eq!(figure.data[0]["y"], json!(["A", "B"]));
        assert_eq!(figure.data[0]["marker"]["color"], json!([1, 2]));
    }

    #[test]
    fn trend_line_reverses_rank_axis() {
        let history = History {
            university: "A".to_string(),
            series: vec![],
            insights: RankInsights {
                best_rank: 1,
                best_rank_year: 2020,
                current_rank: 1,
                current_year: 2020,
                trend: RankTrend::Improving,
            },
        };
        let figure = rank_trend_line(&history);
        assert_eq!(figure.layout["yaxis"]["autorange"], "reversed");
        assert_eq!(figure.data[0]["mode"], "lines+markers");
    }

    #[test]
    fn choropleth_has_one_frame_per_year() {
        let rankings = Rankings::from_records(vec![
            rec("A", 2020, 1, "Japan"),
            rec("B", 2020, 2, "Japan"),
            rec("C", 2021, 1, "Chile"),
        ]);
        let figure = country_choropleth(&analyzer::country_distribution(&rankings));

        assert_eq!(figure.frames.len(), 2);
        assert_eq!(figure.frames[0]["name"], "2020");
        assert_eq!(figure.frames[0]["data"][0]["z"], json!([2]));
        assert_eq!(figure.data[0]["locationmode"], "country names");
        assert_eq!(figure.layout["coloraxis"]["cmax"], 2);
        assert_eq!(figure.layout["sliders"][0]["steps"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn empty_distribution_has_no_traces() {
        let figure = country_choropleth(&[]);
        assert!(figure.data.is_empty());
        assert!(figure.frames.is_empty());
    }

    #[test]
    fn comparison_groups_by_university_and_colours_by_metric() {
        let rows: Vec<ComparisonRow> = ["A", "B"]
            .iter()
            .flat_map(|u| {
                Metric::ALL.into_iter().map(move |metric| ComparisonRow {
                    university: u.to_string(),
                    metric,
                    score: Some(50.0),
                })
            })
            .collect();
        let figure = comparison_bars("A", "B", &rows);

        assert_eq!(figure.layout["barmode"], "group");
        assert_eq!(figure.data.len(), 3);
        assert_eq!(figure.data[1]["name"], "Research Environment");
        assert_eq!(figure.data[1]["x"], json!(["A", "B"]));
    }

    #[test]
    fn html_embeds_escaped_spec() {
        let a = rec("</script>", 2020, 1, "X");
        let figure = top_universities_bar(2020, 10, &[&a]);
        let html = to_html("Top <10>", &figure).unwrap();

        assert!(html.contains(PLOTLY_CDN));
        assert!(html.contains("<title>Top &lt;10&gt;</title>"));
        assert_eq!(html.matches("</script>").count(), 2);
    }

    #[test]
    fn frames_are_omitted_when_empty() {
        let a = rec("A", 2020, 1, "X");
        let json = serde_json::to_value(top_universities_bar(2020, 10, &[&a])).unwrap();
        assert!(json.get("frames").is_none());
    }
}
