use regex::Regex;
use std::{path::Path, sync::LazyLock};

use crate::candidate::{
    CandidateKind, EpisodeCandidate, LookupMode, MediaCandidate, MediaFile, MovieCandidate,
};

/// Release tags that never belong to a title.
static RE_NOISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:480p|576p|720p|1080[pi]|2160p|4k|uhd|x26[45]|h\.?26[45]|hevc|xvid|divx|aac(?:2\.0)?|ac3|dts|hdtv|hdrip|bdrip|brrip|bluray|web-?dl|webrip|dvdrip)\b|\btt\d{7,8}\b|[\[\](){}]",
    )
    .expect("Failed to create regex pattern for release tags")
});

static RE_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Failed to create regex pattern for whitespace"));

/// Shows are assumed to be from this millennium.
static RE_EPISODE_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\D)(20\d{2})(?:\D|$)")
        .expect("Failed to create regex pattern for episode year")
});

static RE_MOVIE_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\D)((?:19|20)\d{2})(?:\D|$)")
        .expect("Failed to create regex pattern for movie year")
});

/// Episode number patterns in priority order: `s01e02-03`, `1x02`, `102`.
static RE_EPISODE_NUMBERS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(
            r"(?i)(?P<core>s(?P<season>\d{1,2})\s?e(?P<start>\d{1,3})(?:-e?(?P<end>\d{1,3}))?)",
        )
        .expect("Failed to create regex pattern for s01e02"),
        Regex::new(r"(?i)(?:^|[^0-9a-z])(?P<core>(?P<season>\d{1,2})x(?P<start>\d{2,3}))(?:\D|$)")
            .expect("Failed to create regex pattern for 1x02"),
        Regex::new(r"(?i)(?:^|[^0-9a-z])(?P<core>(?P<season>\d{1,2})(?P<start>\d{2}))(?:\D|$)")
            .expect("Failed to create regex pattern for 102"),
    ]
});

static RE_CAMEL_CASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([a-z])([A-Z])").expect("Failed to create regex pattern for camel case")
});

static RE_REGION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:\((?:us|uk)\)\s*)+|(?:\s*\((?:us|uk)\))+$")
        .expect("Failed to create regex pattern for region marker")
});

/// Season and episode numbers found in a filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeNumbers {
    pub season: i32,
    pub start: i32,
    pub end: Option<i32>,
    /// Text preceding the matched numbers, used as the title source.
    pub before: String,
}

/// Remove release tags and brackets, collapsing whitespace.
pub fn strip_noise(input: &str) -> String {
    let stripped = RE_NOISE.replace_all(input, "");
    RE_WHITESPACE
        .replace_all(&stripped, " ")
        .trim()
        .to_string()
}

/// Find the first year and remove it from the working string.
fn extract_year(input: &str, pattern: &Regex) -> (Option<i32>, String) {
    let Some(year) = pattern.captures(input).and_then(|captures| captures.get(1)) else {
        return (None, input.to_string());
    };
    let remaining = format!("{}{}", &input[..year.start()], &input[year.end()..]);
    (year.as_str().parse().ok(), remaining)
}

/// A bare `1995` is a year rather than season 19 episode 95.
fn looks_like_year(core: &str) -> bool {
    core.len() == 4 && (core.starts_with("19") || core.starts_with("20"))
}

/// Try each episode number pattern in priority order, first match wins.
pub fn extract_episode_numbers(input: &str) -> Option<EpisodeNumbers> {
    RE_EPISODE_NUMBERS.iter().find_map(|pattern| {
        let captures = pattern
            .captures_iter(input)
            .find(|captures| {
                captures
                    .name("core")
                    .is_some_and(|core| !looks_like_year(core.as_str()))
            })?;
        let core = captures.name("core")?;
        let number = |name: &str| {
            captures
                .name(name)
                .and_then(|value| value.as_str().parse::<i32>().ok())
        };
        Some(EpisodeNumbers {
            season: number("season").unwrap_or(0),
            start: number("start").unwrap_or(0),
            end: number("end"),
            before: input[..core.start()].to_string(),
        })
    })
}

/// Upper-case the first letter of every word and lower-case the rest.
pub fn title_case(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn tidy(input: &str) -> String {
    title_case(input.trim())
}

/// Turn a raw title segment like `the.office.(us).` into `The Office`.
///
/// Every step is followed by trim and title case, so applying this twice
/// gives the same result as applying it once.
pub fn normalize_title(input: &str) -> String {
    // Camel case has to be split before the first title case lowers it.
    let title = tidy(&RE_CAMEL_CASE.replace_all(input, "$1 $2"));
    let title = tidy(&title.replace(['.', '-', '_', '[', ']'], " "));
    let title = tidy(&RE_WHITESPACE.replace_all(&title, " "));
    // Separators are gone, so a marker like `.(US).` now sits at the edge.
    tidy(&RE_REGION.replace_all(&title, ""))
}

/// Title fallback for files named only by their numbers, e.g. `Show Name/S01E02.mkv`.
fn directory_title(file: &MediaFile) -> String {
    file.directory()
        .and_then(|dir| dir.file_name())
        .and_then(|name| name.to_str())
        .map(|name| normalize_title(&strip_noise(name)))
        .unwrap_or_default()
}

fn title_or_directory(segment: &str, file: &MediaFile) -> String {
    let title = normalize_title(segment);
    if title.is_empty() {
        directory_title(file)
    } else {
        title
    }
}

fn episode_candidate(
    file: MediaFile,
    numbers: Option<EpisodeNumbers>,
    working: &str,
    year: Option<i32>,
) -> MediaCandidate {
    let (name, episode) = match numbers {
        Some(numbers) => (
            title_or_directory(&numbers.before, &file),
            EpisodeCandidate {
                title: None,
                season_number: numbers.season,
                episode_number_start: numbers.start,
                episode_number_end: numbers.end,
            },
        ),
        None => (title_or_directory(working, &file), EpisodeCandidate::default()),
    };
    MediaCandidate::new(file, name, year, CandidateKind::Episode(episode))
}

/// Parse a file as a movie: strip noise, pull out the year, the rest is the title.
pub fn parse_movie(file: MediaFile) -> MediaCandidate {
    let working = strip_noise(file.stem());
    let (year, working) = extract_year(&working, &RE_MOVIE_YEAR);
    let name = title_or_directory(&working, &file);
    MediaCandidate::new(file, name, year, CandidateKind::Movie(MovieCandidate::default()))
}

/// Parse a file as an episode even when no episode numbers are found.
pub fn parse_episode(file: MediaFile) -> MediaCandidate {
    let working = strip_noise(file.stem());
    let (year, working) = extract_year(&working, &RE_EPISODE_YEAR);
    let numbers = extract_episode_numbers(&working);
    episode_candidate(file, numbers, &working, year)
}

/// Episode when season and episode numbers are found, movie otherwise.
pub fn parse(file: MediaFile) -> MediaCandidate {
    let working = strip_noise(file.stem());
    let (year, working) = extract_year(&working, &RE_EPISODE_YEAR);
    match extract_episode_numbers(&working) {
        Some(numbers) => episode_candidate(file, Some(numbers), &working, year),
        None => parse_movie(file),
    }
}

/// Parse in a forced lookup mode, or detect it when `None`.
pub fn parse_as(file: MediaFile, mode: Option<LookupMode>) -> MediaCandidate {
    match mode {
        Some(LookupMode::Episode) => parse_episode(file),
        Some(LookupMode::Movie) => parse_movie(file),
        None => parse(file),
    }
}

pub fn parse_extension(path: &Path, allowed: &[String]) -> Option<String> {
    if path.is_dir() {
        return None;
    }

    let ext = path.extension()?.to_str()?.to_lowercase();
    if !allowed.iter().any(|allowed| allowed.eq_ignore_ascii_case(&ext)) {
        return None;
    }

    Some(ext)
}
