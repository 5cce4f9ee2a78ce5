use anyhow::{Result, bail};
use regex::Regex;
use sanitize_filename::sanitize;
use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

use crate::candidate::{CandidateKind, MediaCandidate};
use crate::template::{Params, render};

/// Leftovers of placeholders that rendered empty, like `Movie ().mkv` or `Show - s01e01 - .mkv`.
static RE_EMPTY_PARTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*(?:\(\s*\)|\[\s*\])|\s+-\s*$|\s+-\s*(\.[^.\s]+)$")
        .expect("Failed to create regex pattern for empty template parts")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Templates {
    pub episode_path: String,
    pub episode_file: String,
    pub movie_path: String,
    pub movie_file: String,
}

impl Default for Templates {
    fn default() -> Self {
        Self {
            episode_path: "{{ name }}/Season {{ season }}".to_string(),
            episode_file: "{{ name }} - s{{ season }}e{{ start }} - {{ title }}.{{ ext }}"
                .to_string(),
            movie_path: "{{ name }} ({{ year }})".to_string(),
            movie_file: "{{ name }} ({{ year }}).{{ ext }}".to_string(),
        }
    }
}

/// A planned origin to destination file operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMoveInstruction {
    pub origin: PathBuf,
    pub output: PathBuf,
    pub subtitle: Option<Box<FileMoveInstruction>>,
}

/// Titles from the API may contain slashes and HTML entities.
/// Entities are decoded first so an encoded slash is replaced as well.
pub fn sanitize_name(name: &str) -> String {
    html_escape::decode_html_entities(name).replace(['/', '\\'], "-")
}

fn template_params(candidate: &MediaCandidate, ext: &str) -> Params {
    let mut params = Params::from([
        ("name", sanitize_name(&candidate.name)),
        ("year", candidate.year.map(|year| year.to_string()).unwrap_or_default()),
        ("id", candidate.id.map(|id| id.to_string()).unwrap_or_default()),
        ("ext", ext.to_lowercase()),
    ]);
    match &candidate.kind {
        CandidateKind::Episode(episode) => {
            params.insert("season", format!("{:02}", episode.season_number));
            params.insert("start", format!("{:02}", episode.episode_number_start));
            params.insert(
                "end",
                episode
                    .episode_number_end
                    .map(|end| format!("{:02}", end))
                    .unwrap_or_default(),
            );
            params.insert(
                "title",
                episode.title.as_deref().map(sanitize_name).unwrap_or_default(),
            );
        }
        CandidateKind::Movie(movie) => {
            params.insert("imdb", movie.imdb_id.clone().unwrap_or_default());
        }
    }
    params
}

fn tidy_component(component: &str) -> String {
    sanitize(RE_EMPTY_PARTS.replace_all(component, "$1").trim())
}

/// Destination of `candidate` under `root`, using `ext` for the file extension.
pub fn output_path(
    root: &Path,
    candidate: &MediaCandidate,
    templates: &Templates,
    ext: &str,
) -> PathBuf {
    let (path_template, file_template) = match candidate.kind {
        CandidateKind::Episode(_) => (&templates.episode_path, &templates.episode_file),
        CandidateKind::Movie(_) => (&templates.movie_path, &templates.movie_file),
    };
    let params = template_params(candidate, ext);
    let relative = format!("{}/{}", render(path_template, &params), render(file_template, &params));

    relative
        .split(['/', '\\'])
        .map(tidy_component)
        .filter(|component| !component.is_empty())
        .fold(root.to_path_buf(), |path, component| path.join(component))
}

pub fn build_instruction(
    root: &Path,
    candidate: &MediaCandidate,
    templates: &Templates,
) -> FileMoveInstruction {
    let subtitle = candidate.active_subtitle().map(|subtitle| {
        Box::new(FileMoveInstruction {
            origin: subtitle.file.path.clone(),
            output: output_path(root, candidate, templates, &subtitle.file.extension()),
            subtitle: None,
        })
    });
    FileMoveInstruction {
        origin: candidate.file.path.clone(),
        output: output_path(root, candidate, templates, &candidate.file.extension()),
        subtitle,
    }
}

/// One instruction per enabled candidate. An empty batch is an error.
pub fn build(
    candidates: &[MediaCandidate],
    root: &Path,
    templates: &Templates,
) -> Result<Vec<FileMoveInstruction>> {
    if candidates.is_empty() {
        bail!("No files were accepted, nothing to organize");
    }
    Ok(candidates
        .iter()
        .map(|candidate| build_instruction(root, candidate, templates))
        .collect())
}
