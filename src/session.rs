use crate::error::ViewError;
use crate::models::Rankings;
use crate::views::{self, Selection, View, ViewOutput, ViewSettings};
use anyhow::Result;
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::warn;

/// One user's session: the dataset snapshot loaded at start-up plus the view
/// settings. Every interaction renders from the same snapshot.
#[derive(Debug, Clone)]
pub struct Session {
    rankings: Arc<Rankings>,
    settings: ViewSettings,
}

impl Session {
    pub fn new(rankings: Arc<Rankings>, settings: ViewSettings) -> Self {
        Self { rankings, settings }
    }

    pub fn rankings(&self) -> &Rankings {
        &self.rankings
    }

    pub fn render(&self, view: View, selection: &Selection) -> Result<ViewOutput, ViewError> {
        views::render(view, &self.rankings, selection, &self.settings)
    }

    /// Menu loop over `input`. Each completed choice is rendered and handed to
    /// `on_output`; a view with no data prints a warning and the menu carries
    /// on. Ends on `q` or end of input.
    pub fn run_interactive<R, W, F>(&self, mut input: R, out: &mut W, mut on_output: F) -> Result<()>
    where
        R: BufRead,
        W: Write,
        F: FnMut(&ViewOutput) -> Result<()>,
    {
        loop {
            writeln!(out, "\n📋 Menu - Navigate to:")?;
            for (i, view) in View::ALL.iter().enumerate() {
                writeln!(out, "   {}. {}", i + 1, view.label())?;
            }
            write!(out, "Choose [1-{}, q to quit]: ", View::ALL.len())?;
            out.flush()?;

            let Some(choice) = read_answer(&mut input)? else {
                break;
            };
            if choice.eq_ignore_ascii_case("q") {
                break;
            }

            let view = match parse_choice(&choice) {
                Ok(view) => view,
                Err(e) => {
                    writeln!(out, "❌ {e}")?;
                    continue;
                }
            };

            let Some(selection) = self.prompt_selection(view, &mut input, out)? else {
                break;
            };

            match self.render(view, &selection) {
                Ok(output) => on_output(&output)?,
                Err(e) => {
                    warn!("{}: {}", view.slug(), e);
                    writeln!(out, "⚠️  {e}")?;
                }
            }
        }
        Ok(())
    }

    /// Asks for the controls `view` needs. `None` means the input ended.
    fn prompt_selection<R: BufRead, W: Write>(
        &self,
        view: View,
        input: &mut R,
        out: &mut W,
    ) -> Result<Option<Selection>> {
        let mut selection = Selection::default();
        match view {
            View::DatasetPreview | View::CountryDistribution => {}
            View::TopUniversities => {
                let years = self.rankings.years();
                let (first, last) = match (years.first(), years.last()) {
                    (Some(first), Some(last)) => (*first, *last),
                    _ => return Ok(Some(selection)),
                };
                write!(out, "Select a Year [{first}-{last}] (default {first}): ")?;
                out.flush()?;
                let Some(answer) = read_answer(input)? else {
                    return Ok(None);
                };
                if !answer.is_empty() {
                    match answer.parse::<u16>() {
                        Ok(year) => selection.year = Some(year),
                        Err(_) => writeln!(out, "❌ '{answer}' is not a year, using {first}")?,
                    }
                }
            }
            View::UniversityPerformance | View::PopulationGrowth => {
                let Some(university) = self.prompt_university("Select a University", input, out)? else {
                    return Ok(None);
                };
                selection.university = university;
            }
            View::Comparison => {
                let Some(first) = self.prompt_university("Select the First University", input, out)? else {
                    return Ok(None);
                };
                let Some(second) = self.prompt_university("Select the Second University", input, out)? else {
                    return Ok(None);
                };
                selection.university = first;
                selection.second_university = second;
            }
        }
        Ok(Some(selection))
    }

    /// Accepts a list number, an exact name or part of a name. `?` lists
    /// every university; an ambiguous fragment lists the matching ones and
    /// asks again.
    fn prompt_university<R: BufRead, W: Write>(
        &self,
        prompt: &str,
        input: &mut R,
        out: &mut W,
    ) -> Result<Option<Option<String>>> {
        let universities = self.rankings.universities();
        let default = universities.first().copied().unwrap_or("-");
        loop {
            write!(out, "{prompt} [number, name or part of a name, ? to list] (default {default}): ")?;
            out.flush()?;
            let Some(answer) = read_answer(input)? else {
                return Ok(None);
            };
            if answer.is_empty() {
                return Ok(Some(None));
            }
            if answer == "?" {
                write_numbered(out, universities.iter().copied().enumerate())?;
                continue;
            }
            match resolve_university(&universities, &answer) {
                UniversityMatch::Chosen(name) => return Ok(Some(Some(name.to_string()))),
                UniversityMatch::Candidates(candidates) => {
                    writeln!(out, "🔎 {} universities match '{answer}':", candidates.len())?;
                    write_numbered(out, candidates.into_iter())?;
                }
                UniversityMatch::NoMatch => writeln!(out, "❌ No university matches '{answer}'")?,
            }
        }
    }
}

/// Outcome of matching a typed answer against the university list.
#[derive(Debug, PartialEq, Eq)]
pub enum UniversityMatch<'a> {
    Chosen(&'a str),
    /// Several names contain the fragment; each with its index in the list.
    Candidates(Vec<(usize, &'a str)>),
    NoMatch,
}

/// Resolves `answer` as a 1-based list number, then an exact name (ignoring
/// case), then a case-insensitive fragment that must match exactly one name.
pub fn resolve_university<'a>(universities: &[&'a str], answer: &str) -> UniversityMatch<'a> {
    let answer = answer.trim();
    if let Ok(n) = answer.parse::<usize>() {
        return match n.checked_sub(1).and_then(|i| universities.get(i).copied()) {
            Some(name) => UniversityMatch::Chosen(name),
            None => UniversityMatch::NoMatch,
        };
    }
    if let Some(name) = universities.iter().copied().find(|name| name.eq_ignore_ascii_case(answer)) {
        return UniversityMatch::Chosen(name);
    }

    let needle = answer.to_lowercase();
    let mut candidates: Vec<(usize, &'a str)> = universities
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, name)| name.to_lowercase().contains(&needle))
        .collect();
    match candidates.len() {
        0 => UniversityMatch::NoMatch,
        1 => UniversityMatch::Chosen(candidates.remove(0).1),
        _ => UniversityMatch::Candidates(candidates),
    }
}

/// One `  <n>. <name>` line per entry, numbered from 1.
pub fn write_numbered<'a, W: Write>(out: &mut W, names: impl Iterator<Item = (usize, &'a str)>) -> Result<()> {
    for (i, name) in names {
        writeln!(out, "   {}. {}", i + 1, name)?;
    }
    Ok(())
}

fn read_answer<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Menu number (1-based) or anything `View::from_str` accepts.
fn parse_choice(choice: &str) -> Result<View, ViewError> {
    if let Ok(n) = choice.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(|i| View::ALL.get(i).copied())
            .ok_or_else(|| ViewError::UnknownView(choice.to_string()));
    }
    choice.parse()
}
