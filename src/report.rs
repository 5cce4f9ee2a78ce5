//! Terminal rendering. Nothing here affects control flow.

use colored::Colorize;
use tabled::{Table, Tabled, builder::Builder, settings::Style};

use crate::candidate::{CandidateKind, MediaCandidate};
use crate::instruction::FileMoveInstruction;
use crate::tmdb::{EpisodeDetail, SearchResult};

const SHORT_HELP: &str = "[c]ontinue [C]force [s]kip [r]emove [e]dit [l]ist [m]ode [D]one [Q]uit [?]help";

const LONG_HELP: &str = "c: accept the selected match. \
C: accept the parsed values without using the match. \
s: skip this file. \
r/R: delete the file or its whole directory. \
e: edit the parsed values. \
l: list all search results and pick another one. \
m: switch between episode and movie lookup, discarding edits. \
D: skip every remaining file and write what has been accepted. \
Q: quit immediately without writing anything. \
?/h: show this help.";

pub fn help_text(expanded: bool) -> String {
    if expanded {
        textwrap::fill(LONG_HELP, textwrap::termwidth())
    } else {
        SHORT_HELP.to_string()
    }
}

pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

pub fn print_progress(index: usize, total: usize, candidate: &MediaCandidate) {
    println!(
        "\n{} {}",
        format!("[{} of {}]", index, total).bold(),
        candidate.file.path.display()
    );
}

pub fn print_error(message: &str) {
    println!("{} {}", "ERROR".red().bold(), message);
}

pub fn print_notice(message: &str) {
    println!("{}", message.yellow());
}

fn parsed_summary(candidate: &MediaCandidate) -> String {
    match &candidate.kind {
        CandidateKind::Episode(episode) => {
            format!("{} {}", candidate.label(), episode.episode_id())
        }
        CandidateKind::Movie(_) => candidate.label(),
    }
}

/// Rows of the lookup summary. Size is always shown, verbose output adds the dates.
fn lookup_rows(
    candidate: &MediaCandidate,
    selected: Option<&SearchResult>,
    detail: Option<&EpisodeDetail>,
    verbose: bool,
) -> Vec<[String; 2]> {
    let mut rows = vec![
        ["File".to_string(), candidate.file.path.display().to_string()],
        ["Size".to_string(), format_size(candidate.file.size)],
        [format!("Parsed ({})", candidate.mode()), parsed_summary(candidate)],
    ];
    if let Some(result) = selected {
        rows.push(["Match".to_string(), format!("{} [{}]", result.title(), result.id())]);
        if verbose {
            rows.push(["Date".to_string(), result.date().unwrap_or("-").to_string()]);
        }
    }
    if let Some(detail) = detail {
        rows.push([
            "Episode".to_string(),
            format!(
                "s{:02}e{:02} {} [{}]",
                detail.season_number, detail.episode_number, detail.name, detail.id
            ),
        ]);
        if verbose {
            rows.push([
                "Aired".to_string(),
                detail.air_date.clone().unwrap_or_else(|| "-".to_string()),
            ]);
        }
    }
    rows
}

/// Summary of one lookup, marked OK when a usable match was found.
pub fn print_lookup(
    candidate: &MediaCandidate,
    selected: Option<&SearchResult>,
    detail: Option<&EpisodeDetail>,
    verbose: bool,
) {
    let found = selected.is_some() && (detail.is_some() || candidate.episode().is_none());
    let marker = if found {
        "OK".green().bold()
    } else {
        "FAIL".red().bold()
    };

    let mut builder = Builder::default();
    for row in lookup_rows(candidate, selected, detail, verbose) {
        builder.push_record(row);
    }
    println!("{}", builder.build().with(Style::rounded()));
    println!("{marker}");
}

#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "ID")]
    id: i32,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Country")]
    country: String,
}

impl ResultRow {
    fn new(index: usize, result: &SearchResult) -> Self {
        match result {
            SearchResult::Show(show) => Self {
                index,
                id: show.id,
                title: show.name.clone(),
                date: show.first_air_date.clone().unwrap_or_default(),
                country: show.origin_country.join(", "),
            },
            SearchResult::Movie(movie) => Self {
                index,
                id: movie.id,
                title: movie.title.clone(),
                date: movie.release_date.clone().unwrap_or_default(),
                country: String::new(),
            },
        }
    }
}

/// All search results with 1-based indices.
pub fn print_results(results: &[SearchResult]) {
    let rows = results
        .iter()
        .enumerate()
        .map(|(index, result)| ResultRow::new(index + 1, result));
    println!("{}", Table::new(rows).with(Style::rounded()));
}

#[derive(Tabled)]
pub struct FieldRow {
    #[tabled(rename = "#")]
    pub key: String,
    #[tabled(rename = "Field")]
    pub field: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

pub fn print_fields(rows: Vec<FieldRow>) {
    println!("{}", Table::new(rows).with(Style::rounded()));
}

#[derive(Tabled)]
struct InstructionRow {
    #[tabled(rename = "From")]
    origin: String,
    #[tabled(rename = "To")]
    output: String,
}

pub fn print_instructions(instructions: &[FileMoveInstruction]) {
    let rows = instructions
        .iter()
        .flat_map(|instruction| std::iter::once(instruction).chain(instruction.subtitle.as_deref()))
        .map(|instruction| InstructionRow {
            origin: instruction.origin.display().to_string(),
            output: instruction.output.display().to_string(),
        });
    println!("{}", Table::new(rows).with(Style::rounded()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{MediaFile, MovieCandidate};
    use crate::tmdb::MovieResult;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(10 * 1024 * 1024), "10.0 MB");
    }

    fn labels(rows: &[[String; 2]]) -> Vec<&str> {
        rows.iter().map(|row| row[0].as_str()).collect()
    }

    #[test]
    fn test_lookup_rows_always_show_size() {
        let candidate = MediaCandidate::new(
            MediaFile::new("/tv/Heat.1995.mkv", 2048),
            "Heat".to_string(),
            Some(1995),
            CandidateKind::Movie(MovieCandidate::default()),
        );
        let result = SearchResult::Movie(MovieResult {
            id: 949,
            title: "Heat".to_string(),
            release_date: Some("1995-12-15".to_string()),
        });

        let failed = lookup_rows(&candidate, None, None, false);
        assert_eq!(labels(&failed), vec!["File", "Size", "Parsed (Movie)"]);
        assert_eq!(failed[1][1], "2.0 KB");

        let found = lookup_rows(&candidate, Some(&result), None, false);
        assert_eq!(labels(&found), vec!["File", "Size", "Parsed (Movie)", "Match"]);

        let verbose = lookup_rows(&candidate, Some(&result), None, true);
        assert_eq!(labels(&verbose), vec!["File", "Size", "Parsed (Movie)", "Match", "Date"]);
        assert_eq!(verbose[4][1], "1995-12-15");
    }

    #[test]
    fn test_help_text() {
        assert_eq!(help_text(false), SHORT_HELP);
        assert!(help_text(true).contains("quit"));
    }
}
