mod analyzer;
mod charts;
mod error;
mod loader;
mod models;
mod parse;
mod report;
mod schema;
mod session;
mod views;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use loader::DatasetLoader;
use models::{Config, DataSourceMode, Rankings};
use session::{Session, UniversityMatch};
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};
use views::{Selection, View, ViewOutput, ViewSettings};

const TITLE: &str = "World University Rankings Explorer (2016-2025)";

fn cli() -> Command {
    Command::new("rankings-explorer")
        .version("1.0")
        .about("Explores THE World University Rankings 2016-2025")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .arg(
            Arg::new("data")
                .short('d')
                .long("data")
                .value_name("FILE")
                .help("Dataset CSV path (overrides the configuration and forces local mode)"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .help("Output directory for charts and reports"),
        )
        .arg(
            Arg::new("view")
                .short('v')
                .long("view")
                .value_name("VIEW")
                .help("View slug or menu label; starts the interactive menu when omitted"),
        )
        .arg(
            Arg::new("year")
                .short('y')
                .long("year")
                .value_name("YEAR")
                .value_parser(clap::value_parser!(u16))
                .help("Year for the Top 10 Universities view"),
        )
        .arg(
            Arg::new("university")
                .short('u')
                .long("university")
                .value_name("NAME")
                .help("University for the performance, population and comparison views"),
        )
        .arg(
            Arg::new("second-university")
                .short('s')
                .long("second-university")
                .value_name("NAME")
                .help("Second university for the comparison view"),
        )
        .arg(
            Arg::new("list-views")
                .long("list-views")
                .action(ArgAction::SetTrue)
                .help("Print the menu labels and exit"),
        )
        .arg(
            Arg::new("list-universities")
                .long("list-universities")
                .action(ArgAction::SetTrue)
                .help("Print the numbered university list of the dataset and exit"),
        )
}

fn init_logging() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();
}

/// Loads the configuration file, or writes the defaults to it when absent.
fn resolve_config(matches: &ArgMatches) -> Result<Config> {
    let config_file = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("config.toml");

    let mut config = if Path::new(config_file).exists() {
        info!("📋 Loading configuration from: {}", config_file);
        Config::load_from_file(config_file)
            .with_context(|| format!("Failed to load configuration from {}", config_file))?
    } else {
        info!("📝 Creating default configuration file: {}", config_file);
        let default_config = Config::default();
        default_config.save_to_file(config_file)?;
        default_config
    };

    if let Some(data) = matches.get_one::<String>("data") {
        config.dataset_path = data.clone();
        config.data_source_mode = DataSourceMode::Local;
    }
    if let Some(output) = matches.get_one::<String>("output") {
        config.output_directory = Some(output.clone());
    }
    Ok(config)
}

/// Builds the selection from the flags. University flags take the same
/// answers as the interactive prompt; one that matches nothing is kept as
/// typed so the view reports it.
fn selection_from(matches: &ArgMatches, rankings: &Rankings) -> Selection {
    let universities = rankings.universities();
    let university = |id: &str| {
        matches.get_one::<String>(id).map(|answer| match session::resolve_university(&universities, answer) {
            UniversityMatch::Chosen(name) => name.to_string(),
            UniversityMatch::Candidates(_) | UniversityMatch::NoMatch => answer.clone(),
        })
    };
    Selection {
        year: matches.get_one::<u16>("year").copied(),
        university: university("university"),
        second_university: university("second-university"),
    }
}

fn show(output: &ViewOutput, output_dir: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    report::print_output(&mut out, output)?;

    let written = report::save_output(output, output_dir)?;
    if let Some(html) = written.iter().find(|p| p.extension().is_some_and(|e| e == "html")) {
        writeln!(out, "\n📄 Chart: {}", html.display())?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_logging();
    let matches = cli().get_matches();

    if matches.get_flag("list-views") {
        for view in View::ALL {
            println!("{:<14}{}", view.slug(), view.label());
        }
        return Ok(ExitCode::SUCCESS);
    }

    let config = resolve_config(&matches)?;
    let output_dir = config.output_directory.clone().unwrap_or_else(|| "output".to_string());

    println!("🎓 {}", TITLE);

    // Load failure and schema failure both stop here: nothing is rendered.
    let table = match DatasetLoader::new().load(&config).await {
        Ok(table) => table,
        Err(e) => {
            error!("Error loading file: {}", e);
            eprintln!("❌ Error loading file: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };
    let rankings = match Rankings::from_table(table) {
        Ok(rankings) => rankings,
        Err(e) => {
            error!("{}", e);
            eprintln!("❌ {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let session = Session::new(Arc::new(rankings), ViewSettings::from(&config));
    info!(
        "📊 {} rows, {} universities, {} years",
        session.rankings().len(),
        session.rankings().universities().len(),
        session.rankings().years().len()
    );
    if session.rankings().is_empty() {
        warn!("⚠️  Dataset has a header but no rows");
    }

    if matches.get_flag("list-universities") {
        let stdout = io::stdout();
        session::write_numbered(&mut stdout.lock(), session.rankings().universities().into_iter().enumerate())?;
        return Ok(ExitCode::SUCCESS);
    }

    match matches.get_one::<String>("view") {
        Some(requested) => {
            let view: View = requested.parse()?;
            match session.render(view, &selection_from(&matches, session.rankings())) {
                Ok(output) => show(&output, &output_dir)?,
                Err(e) => {
                    warn!("{}: {}", view.slug(), e);
                    println!("⚠️  {}", e);
                }
            }
        }
        None => {
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            session.run_interactive(stdin.lock(), &mut stdout, |output| show(output, &output_dir))?;
        }
    }

    println!("\n✅ Done!");
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rankings() -> Rankings {
        Rankings::from_records(vec![
            models::UniversityRecord::new("University of Oxford", 2021, 1, "United Kingdom", 20000),
            models::UniversityRecord::new("ETH Zurich", 2021, 14, "Switzerland", 19000),
        ])
    }

    #[test]
    fn cli_parses_view_and_selection() {
        let matches = cli()
            .try_get_matches_from([
                "rankings-explorer",
                "--view",
                "top10",
                "--year",
                "2021",
                "-u",
                "University of Oxford",
            ])
            .unwrap();
        let selection = selection_from(&matches, &rankings());
        assert_eq!(selection.year, Some(2021));
        assert_eq!(selection.university.as_deref(), Some("University of Oxford"));
        assert_eq!(selection.second_university, None);
        assert_eq!(matches.get_one::<String>("view").map(String::as_str), Some("top10"));
    }

    #[test]
    fn university_flags_accept_list_numbers_and_fragments() {
        let matches = cli()
            .try_get_matches_from(["rankings-explorer", "-u", "2", "-s", "oxford", "--list-universities"])
            .unwrap();
        assert!(matches.get_flag("list-universities"));

        let selection = selection_from(&matches, &rankings());
        assert_eq!(selection.university.as_deref(), Some("ETH Zurich"));
        assert_eq!(selection.second_university.as_deref(), Some("University of Oxford"));
    }

    #[test]
    fn unmatched_university_flag_is_kept_as_typed() {
        let matches = cli().try_get_matches_from(["rankings-explorer", "-u", "Sorbonne"]).unwrap();
        let selection = selection_from(&matches, &rankings());
        assert_eq!(selection.university.as_deref(), Some("Sorbonne"));
    }

    #[test]
    fn cli_rejects_non_numeric_year() {
        assert!(cli()
            .try_get_matches_from(["rankings-explorer", "--year", "latest"])
            .is_err());
    }

    #[test]
    fn missing_config_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let path_str = path.to_str().unwrap();
        let matches = cli()
            .try_get_matches_from(["rankings-explorer", "-c", path_str, "-d", "data.csv"])
            .unwrap();

        let config = resolve_config(&matches).unwrap();
        assert!(path.exists());
        assert_eq!(config.dataset_path, "data.csv");
        assert_eq!(config.data_source_mode, DataSourceMode::Local);

        let saved = Config::load_from_file(path_str).unwrap();
        assert_eq!(saved.dataset_path, models::DEFAULT_DATASET_PATH);
    }
}
