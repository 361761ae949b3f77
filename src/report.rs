use crate::analyzer::Table;
use crate::charts;
use crate::views::ViewOutput;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const ARTEFACT_EXTENSIONS: [&str; 4] = ["json", "html", "txt", "csv"];

/// Prints a view the way the terminal shows it: heading, description,
/// table, insights, and where the chart was written.
pub fn print_output<W: Write>(out: &mut W, output: &ViewOutput) -> Result<()> {
    writeln!(out, "\n{}", output.heading)?;
    writeln!(out, "{}", "=".repeat(output.heading.chars().count()))?;
    writeln!(out, "{}\n", output.description)?;

    if let Some(table) = &output.table {
        write_text_table(out, table)?;
        writeln!(out)?;
    }

    if !output.insights.is_empty() {
        writeln!(out, "🔑 Insights:")?;
        for line in &output.insights {
            writeln!(out, "   - {}", line)?;
        }
    }
    Ok(())
}

fn write_text_table<W: Write>(out: &mut W, table: &Table) -> Result<()> {
    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.chars().count()).collect();
    for row in &table.rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join(" | ")
    };

    writeln!(out, "{}", line(&table.columns))?;
    writeln!(
        out,
        "{}",
        widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-")
    )?;
    for row in &table.rows {
        writeln!(out, "{}", line(row))?;
    }
    Ok(())
}

/// Writes `<slug>.json` (figure), `<slug>.html`, `<slug>.txt` (insights) and
/// `<slug>.csv` (table) for whichever parts the view produced.
pub fn save_output(output: &ViewOutput, output_dir: &str) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir).with_context(|| format!("Failed to create output directory: {}", output_dir))?;
    clean_view_outputs(output_dir, output.view.slug())?;

    let dir = Path::new(output_dir);
    let slug = output.view.slug();
    let mut written = Vec::new();

    if let Some(figure) = &output.figure {
        let json_path = dir.join(format!("{slug}.json"));
        fs::write(&json_path, serde_json::to_string_pretty(figure)?)?;
        written.push(json_path);

        let html_path = dir.join(format!("{slug}.html"));
        fs::write(&html_path, charts::to_html(output.view.label(), figure)?)?;
        written.push(html_path);
    }

    let txt_path = dir.join(format!("{slug}.txt"));
    fs::write(&txt_path, insights_report(output))?;
    written.push(txt_path);

    if let Some(table) = &output.table {
        let csv_path = dir.join(format!("{slug}.csv"));
        write_csv(table, &csv_path)?;
        written.push(csv_path);
    }

    for path in &written {
        debug!("wrote {}", path.display());
    }
    info!("💾 Saved {} file(s) for '{}' to {}", written.len(), output.view.label(), output_dir);
    Ok(written)
}

fn insights_report(output: &ViewOutput) -> String {
    let mut content = String::new();
    content.push_str(&format!("{}\n", output.heading));
    content.push_str(&format!("{}\n\n", "=".repeat(output.heading.chars().count())));
    content.push_str(&format!("{}\n\n", output.description));
    for line in &output.insights {
        content.push_str(&format!("- {}\n", line));
    }
    content
}

fn write_csv(table: &Table, path: &Path) -> Result<()> {
    use csv::Writer;

    let mut writer = Writer::from_path(path)?;
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Removes the artefacts a previous run left for this view.
fn clean_view_outputs(output_dir: &str, slug: &str) -> Result<()> {
    let output_path = Path::new(output_dir);

    for extension in ARTEFACT_EXTENSIONS {
        let item_path = output_path.join(format!("{slug}.{extension}"));
        if item_path.is_file() {
            fs::remove_file(&item_path)?;
            debug!("🗑️  Removed file: {}", item_path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Rankings, UniversityRecord};
    use crate::views::{render, Selection, View, ViewSettings};

    fn rankings() -> Rankings {
        Rankings::from_records(vec![
            UniversityRecord::new("Alpha", 2020, 1, "Japan", 1000),
            UniversityRecord::new("Beta", 2020, 2, "Chile", 2000),
        ])
    }

    fn rendered(view: View) -> ViewOutput {
        render(view, &rankings(), &Selection::default(), &ViewSettings::default()).unwrap()
    }

    #[test]
    fn saves_every_part_of_a_view() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().to_str().unwrap();

        let written = save_output(&rendered(View::TopUniversities), output_dir).unwrap();
        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["top10.json", "top10.html", "top10.txt", "top10.csv"]);

        let csv = fs::read_to_string(dir.path().join("top10.csv")).unwrap();
        assert_eq!(csv, "Rank,Name,Country\n1,Alpha,Japan\n2,Beta,Chile\n");

        let figure: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("top10.json")).unwrap()).unwrap();
        assert_eq!(figure["layout"]["yaxis"]["autorange"], "reversed");
    }

    #[test]
    fn stale_artefacts_are_removed() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().to_str().unwrap();
        let stale = dir.path().join("performance.csv");
        fs::write(&stale, "old").unwrap();
        let other = dir.path().join("top10.csv");
        fs::write(&other, "keep").unwrap();

        save_output(&rendered(View::UniversityPerformance), output_dir).unwrap();
        assert!(!stale.exists());
        assert!(other.exists());
        assert!(dir.path().join("performance.html").exists());
    }

    #[test]
    fn terminal_output_has_table_and_insights() {
        let mut out = Vec::new();
        print_output(&mut out, &rendered(View::TopUniversities)).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("🏆 Top 10 Universities by Year"));
        assert!(text.contains("Rank | Name  | Country"));
        assert!(text.contains("   - #1 Alpha (Japan)"));
    }
}
