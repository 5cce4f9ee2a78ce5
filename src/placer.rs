use anyhow::{Context, Result};
use colored::Colorize;
use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

use crate::console::Console;
use crate::instruction::FileMoveInstruction;
use crate::report::print_error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    Move,
    Copy,
}

/// What to do when the destination already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverwritePolicy {
    /// Always replace the destination.
    pub blind: bool,
    /// Replace only with a strictly larger source, otherwise drop the source.
    pub smart: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementOutcome {
    Placed,
    Skipped,
    SourceDiscarded,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub origin: PathBuf,
    pub output: PathBuf,
    pub outcome: PlacementOutcome,
}

enum Conflict {
    Overwrite,
    Skip,
    DiscardSource,
}

fn file_size(path: &Path) -> Result<u64> {
    Ok(fs::metadata(path)
        .with_context(|| format!("Failed to read metadata for {}", path.display()))?
        .len())
}

fn ask_conflict<C: Console>(output: &Path, console: &mut C) -> Result<Conflict> {
    loop {
        let answer = console.ask(
            &format!(
                "{} already exists: [o]verwrite, [s]kip, [R] delete source",
                output.display()
            ),
            "o",
        )?;
        match answer.as_str() {
            "o" => return Ok(Conflict::Overwrite),
            "s" => return Ok(Conflict::Skip),
            "R" => return Ok(Conflict::DiscardSource),
            other => print_error(&format!("Invalid choice '{other}'")),
        }
    }
}

fn resolve_conflict<C: Console>(
    origin: &Path,
    output: &Path,
    policy: OverwritePolicy,
    console: &mut C,
) -> Result<Conflict> {
    if policy.blind {
        return Ok(Conflict::Overwrite);
    }
    if policy.smart {
        return Ok(if file_size(origin)? > file_size(output)? {
            Conflict::Overwrite
        } else {
            Conflict::DiscardSource
        });
    }
    ask_conflict(output, console)
}

/// Hidden sibling that receives the copy before it is renamed into place.
fn partial_path(output: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(output.file_name().unwrap_or_default());
    name.push(".part");
    output.with_file_name(name)
}

/// Copy to a temporary sibling and rename it over the destination,
/// then remove the source when moving.
fn transfer(origin: &Path, output: &Path, mode: TransferMode) -> Result<()> {
    let parent = output.parent().context("Failed to get parent")?;
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create directory {}", parent.display()))?;

    let partial = partial_path(output);
    let copied = fs::copy(origin, &partial)
        .with_context(|| format!("Failed to copy {}", origin.display()))
        .and_then(|_| {
            fs::rename(&partial, output)
                .with_context(|| format!("Failed to rename into {}", output.display()))
        });
    if let Err(error) = copied {
        let _ = fs::remove_file(&partial);
        return Err(error);
    }

    if mode == TransferMode::Move {
        if let Err(error) = fs::remove_file(origin) {
            warn!("Copied but could not remove {}: {error}", origin.display());
        }
    }
    Ok(())
}

fn place_one<C: Console>(
    origin: &Path,
    output: &Path,
    mode: TransferMode,
    policy: OverwritePolicy,
    console: &mut C,
) -> Result<PlacementOutcome> {
    if !origin.is_file() {
        return Ok(PlacementOutcome::Failed("source no longer exists".to_string()));
    }
    if origin == output {
        return Ok(PlacementOutcome::Skipped);
    }

    if output.exists() {
        let conflict = match resolve_conflict(origin, output, policy, console) {
            Ok(conflict) => conflict,
            Err(error) => return Ok(PlacementOutcome::Failed(format!("{error:#}"))),
        };
        match conflict {
            Conflict::Overwrite => {}
            Conflict::Skip => return Ok(PlacementOutcome::Skipped),
            Conflict::DiscardSource => {
                return Ok(match fs::remove_file(origin) {
                    Ok(()) => PlacementOutcome::SourceDiscarded,
                    Err(error) => PlacementOutcome::Failed(format!(
                        "Failed to delete {}: {error}",
                        origin.display()
                    )),
                });
            }
        }
    }

    Ok(match transfer(origin, output, mode) {
        Ok(()) => PlacementOutcome::Placed,
        Err(error) => PlacementOutcome::Failed(format!("{error:#}")),
    })
}

fn print_placement(placement: &Placement) {
    let label = match &placement.outcome {
        PlacementOutcome::Placed => "DONE".green(),
        PlacementOutcome::Skipped => "SKIP".yellow(),
        PlacementOutcome::SourceDiscarded => "DROP".yellow(),
        PlacementOutcome::Failed(_) => "FAIL".red(),
    };
    println!(
        "{} {} -> {}",
        label.bold(),
        placement.origin.display(),
        placement.output.display()
    );
    if let PlacementOutcome::Failed(reason) = &placement.outcome {
        print_error(reason);
    }
}

/// Execute every instruction. Subtitles are placed independently of their video,
/// and a failure only affects its own file.
pub fn place_all<C: Console>(
    instructions: &[FileMoveInstruction],
    mode: TransferMode,
    policy: OverwritePolicy,
    console: &mut C,
) -> Result<Vec<Placement>> {
    let mut placements = Vec::new();
    for instruction in instructions {
        for step in std::iter::once(instruction).chain(instruction.subtitle.as_deref()) {
            let outcome = place_one(&step.origin, &step.output, mode, policy, console)?;
            info!("{} -> {}: {outcome:?}", step.origin.display(), step.output.display());
            let placement = Placement {
                origin: step.origin.clone(),
                output: step.output.clone(),
                outcome,
            };
            print_placement(&placement);
            placements.push(placement);
        }
    }
    Ok(placements)
}
