use anyhow::{Context, Result};
use core::fmt;
use serde_json::{Value, json};
use std::{
    fs,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use crate::subtitle::Language;

/// Which kind of metadata a candidate is looked up as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMode {
    Episode,
    Movie,
}

impl LookupMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupMode::Episode => "TV Episode",
            LookupMode::Movie => "Movie",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            LookupMode::Episode => LookupMode::Movie,
            LookupMode::Movie => LookupMode::Episode,
        }
    }
}

impl fmt::Display for LookupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A file discovered on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaFile {
    pub path: PathBuf,
    pub size: u64,
    pub accessed: Option<SystemTime>,
}

impl MediaFile {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
            accessed: None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = fs::metadata(path)
            .with_context(|| format!("Failed to read metadata for {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            size: metadata.len(),
            accessed: metadata.accessed().ok(),
        })
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
    }

    /// Lower-cased extension without the leading dot.
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_lowercase()
    }

    pub fn directory(&self) -> Option<&Path> {
        self.path.parent()
    }

    pub fn to_json(&self) -> Value {
        let accessed = self
            .accessed
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .map(|elapsed| elapsed.as_secs());
        json!({
            "path": self.path.display().to_string(),
            "size": self.size,
            "accessed": accessed,
        })
    }
}

/// Episode specific fields of a candidate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EpisodeCandidate {
    pub title: Option<String>,
    pub season_number: i32,
    pub episode_number_start: i32,
    pub episode_number_end: Option<i32>,
}

impl EpisodeCandidate {
    /// Compact identifier like `s02e01` or `s02e01-02`.
    pub fn episode_id(&self) -> String {
        match self.episode_number_end {
            Some(end) => format!(
                "s{:02}e{:02}-{:02}",
                self.season_number, self.episode_number_start, end
            ),
            None => format!(
                "s{:02}e{:02}",
                self.season_number, self.episode_number_start
            ),
        }
    }
}

/// Movie specific fields of a candidate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieCandidate {
    pub imdb_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CandidateKind {
    Episode(EpisodeCandidate),
    Movie(MovieCandidate),
}

/// A subtitle file found next to a video.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleCandidate {
    pub file: MediaFile,
    pub language: Option<&'static Language>,
    pub similarity: f64,
    pub enabled: bool,
}

/// A structured guess about what a media file is.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaCandidate {
    pub file: MediaFile,
    pub name: String,
    pub year: Option<i32>,
    pub enabled: bool,
    pub id: Option<i32>,
    pub kind: CandidateKind,
    pub subtitles: Vec<SubtitleCandidate>,
    pub active_subtitle: Option<usize>,
}

impl MediaCandidate {
    pub fn new(file: MediaFile, name: String, year: Option<i32>, kind: CandidateKind) -> Self {
        Self {
            file,
            name,
            year,
            enabled: false,
            id: None,
            kind,
            subtitles: Vec::new(),
            active_subtitle: None,
        }
    }

    pub fn mode(&self) -> LookupMode {
        match self.kind {
            CandidateKind::Episode(_) => LookupMode::Episode,
            CandidateKind::Movie(_) => LookupMode::Movie,
        }
    }

    pub fn episode(&self) -> Option<&EpisodeCandidate> {
        match &self.kind {
            CandidateKind::Episode(episode) => Some(episode),
            CandidateKind::Movie(_) => None,
        }
    }

    pub fn episode_mut(&mut self) -> Option<&mut EpisodeCandidate> {
        match &mut self.kind {
            CandidateKind::Episode(episode) => Some(episode),
            CandidateKind::Movie(_) => None,
        }
    }

    pub fn movie_mut(&mut self) -> Option<&mut MovieCandidate> {
        match &mut self.kind {
            CandidateKind::Episode(_) => None,
            CandidateKind::Movie(movie) => Some(movie),
        }
    }

    pub fn active_subtitle(&self) -> Option<&SubtitleCandidate> {
        self.active_subtitle
            .and_then(|index| self.subtitles.get(index))
    }

    /// Name plus the year when known, e.g. `Heat (1995)`.
    pub fn label(&self) -> String {
        match self.year {
            Some(year) => format!("{} ({})", self.name, year),
            None => self.name.clone(),
        }
    }

    pub fn to_json(&self) -> Value {
        let mut value = json!({
            "type": self.mode().as_str(),
            "file": self.file.to_json(),
            "name": self.name,
            "year": self.year,
            "enabled": self.enabled,
            "id": self.id,
        });
        match &self.kind {
            CandidateKind::Episode(episode) => {
                value["title"] = json!(episode.title);
                value["seasonNumber"] = json!(episode.season_number);
                value["episodeNumberStart"] = json!(episode.episode_number_start);
                value["episodeNumberEnd"] = json!(episode.episode_number_end);
            }
            CandidateKind::Movie(movie) => {
                value["imdbId"] = json!(movie.imdb_id);
            }
        }
        if !self.subtitles.is_empty() {
            value["subtitles"] = Value::Array(
                self.subtitles
                    .iter()
                    .map(|subtitle| {
                        json!({
                            "file": subtitle.file.to_json(),
                            "language": subtitle.language.map(|language| language.iso639_2b),
                            "similarity": subtitle.similarity,
                            "enabled": subtitle.enabled,
                        })
                    })
                    .collect(),
            );
            value["activeSubtitle"] = json!(self.active_subtitle);
        }
        value
    }
}
