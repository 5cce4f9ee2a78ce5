use std::{fs, path::Path};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::candidate::MediaFile;
use crate::report::print_error;
use crate::video::parse_extension;

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

/// Walk `path` in file name order, yielding regular files with one of `extensions`.
fn walk<'a>(path: &'a Path, extensions: &'a [String]) -> impl Iterator<Item = DirEntry> + 'a {
    WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(error) => {
                warn!("Skipping unreadable entry: {error}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(move |entry| parse_extension(entry.path(), extensions).is_some())
}

/// A file that vanished after it was listed is skipped.
fn media_file(path: &Path) -> Option<MediaFile> {
    match MediaFile::from_path(path) {
        Ok(file) => Some(file),
        Err(error) => {
            warn!("Skipping {}: {error:#}", path.display());
            None
        }
    }
}

/// All files under the search paths with one of `extensions`.
pub fn scan(paths: &[impl AsRef<Path>], extensions: &[String]) -> Vec<MediaFile> {
    let files: Vec<MediaFile> = paths
        .iter()
        .flat_map(|path| walk(path.as_ref(), extensions))
        .filter_map(|entry| media_file(entry.path()))
        .collect();
    info!("Found {} file(s)", files.len());
    files
}

/// Files directly inside `dir`, sorted by name.
pub fn list_directory(dir: &Path) -> Vec<MediaFile> {
    let mut files: Vec<MediaFile> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .flatten()
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| media_file(&entry.path()))
            .collect(),
        Err(error) => {
            warn!("Failed to list {}: {error}", dir.display());
            Vec::new()
        }
    };
    files.sort_by(|a, b| a.path.cmp(&b.path));
    files
}

/// Delete every file with one of `extensions` under the search paths.
/// Returns the number of deleted files; failures are reported and skipped.
pub fn clean(paths: &[impl AsRef<Path>], extensions: &[String]) -> usize {
    if extensions.is_empty() {
        return 0;
    }
    let mut deleted = 0;
    for path in paths {
        for entry in walk(path.as_ref(), extensions) {
            match fs::remove_file(entry.path()) {
                Ok(()) => {
                    debug!("Deleted {}", entry.path().display());
                    deleted += 1;
                }
                Err(error) => {
                    print_error(&format!("Failed to delete {}: {error}", entry.path().display()))
                }
            }
        }
    }
    info!("Cleaned up {deleted} file(s)");
    deleted
}
