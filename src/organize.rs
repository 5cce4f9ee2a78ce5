//! The whole run: clean, scan, parse, resolve, pair subtitles, build and place.

use anyhow::{Result, bail};
use colored::Colorize;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::candidate::{MediaCandidate, MediaFile};
use crate::config::Settings;
use crate::console::Console;
use crate::engine::{BatchOutcome, ResolutionEngine};
use crate::instruction::{self, FileMoveInstruction};
use crate::placer::{self, Placement};
use crate::tmdb::MetadataApi;
use crate::{report, scanner, subtitle, video};

#[derive(Debug)]
pub enum RunOutcome {
    Completed(Vec<Placement>),
    DryRun(Vec<FileMoveInstruction>),
    Aborted,
}

/// Pair every accepted candidate with the subtitles next to it.
/// Directory listings are shared between candidates in the same directory.
fn attach_subtitles(candidates: Vec<MediaCandidate>, settings: &Settings) -> Vec<MediaCandidate> {
    let mut listings: HashMap<PathBuf, Vec<MediaFile>> = HashMap::new();
    candidates
        .into_iter()
        .map(|candidate| {
            let Some(directory) = candidate.file.directory().map(Path::to_path_buf) else {
                return candidate;
            };
            let listing = listings
                .entry(directory)
                .or_insert_with_key(|directory| scanner::list_directory(directory));
            let candidate = subtitle::associate(
                candidate,
                listing,
                &settings.subtitle_extensions,
                &settings.preferred_language,
            );
            if let Some(active) = candidate.active_subtitle() {
                debug!(
                    "Subtitle for {}: {}",
                    candidate.file.path.display(),
                    active.file.path.display()
                );
            }
            candidate
        })
        .collect()
}

pub async fn organize<A: MetadataApi, C: Console>(
    settings: &Settings,
    api: &A,
    console: &mut C,
) -> Result<RunOutcome> {
    scanner::clean(&settings.search_paths, &settings.pre_clean);

    let files = scanner::scan(&settings.search_paths, &settings.media_extensions);
    if files.is_empty() {
        bail!("No media files found");
    }
    println!("Found {} media file(s)", files.len().to_string().bold());

    let candidates: Vec<MediaCandidate> = files
        .into_iter()
        .map(|file| video::parse_as(file, settings.forced_mode))
        .collect();

    let accepted = match ResolutionEngine::new(api, console, settings.engine.clone())
        .resolve_all(candidates)
        .await?
    {
        BatchOutcome::Completed(accepted) => accepted,
        BatchOutcome::Aborted => {
            info!("Aborted by user");
            return Ok(RunOutcome::Aborted);
        }
    };

    let accepted = if settings.subtitles {
        attach_subtitles(accepted, settings)
    } else {
        accepted
    };

    let instructions = instruction::build(&accepted, &settings.output, &settings.templates)?;
    report::print_instructions(&instructions);
    if settings.dry_run {
        println!("{}", "Dry run, nothing was changed".yellow());
        return Ok(RunOutcome::DryRun(instructions));
    }

    let placements = placer::place_all(&instructions, settings.mode, settings.overwrite, console)?;
    scanner::clean(&settings.search_paths, &settings.post_clean);
    Ok(RunOutcome::Completed(placements))
}
