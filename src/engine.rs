//! Interactive resolution of parsed candidates against the metadata API.
//!
//! Every candidate loops through search, report and prompt until one of the
//! terminal actions is chosen. Accepted candidates come out enabled, everything
//! else comes out disabled and is dropped from the batch.

use anyhow::{Context, Result, bail};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::candidate::{CandidateKind, LookupMode, MediaCandidate};
use crate::console::Console;
use crate::report::{self, FieldRow, print_error, print_notice};
use crate::resolver::{EpisodeResolver, MovieResolver};
use crate::tmdb::{EpisodeDetail, MetadataApi, SearchResult};
use crate::video;

/// A single-character command typed at the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    ForceContinue,
    Skip,
    RemoveFile,
    RemoveDirectory,
    Edit,
    List,
    Mode,
    Help,
    Done,
    Quit,
    Invalid,
}

impl Action {
    pub fn parse(input: &str) -> Self {
        match input.trim() {
            "c" => Action::Continue,
            "C" => Action::ForceContinue,
            "s" => Action::Skip,
            "r" => Action::RemoveFile,
            "R" => Action::RemoveDirectory,
            "e" => Action::Edit,
            "l" => Action::List,
            "m" => Action::Mode,
            "?" | "h" => Action::Help,
            "D" => Action::Done,
            "Q" => Action::Quit,
            _ => Action::Invalid,
        }
    }

    pub fn shortcut(&self) -> &'static str {
        match self {
            Action::Continue => "c",
            Action::ForceContinue => "C",
            Action::Skip => "s",
            Action::RemoveFile => "r",
            Action::RemoveDirectory => "R",
            Action::Edit => "e",
            Action::List => "l",
            Action::Mode => "m",
            Action::Help => "?",
            Action::Done => "D",
            Action::Quit => "Q",
            Action::Invalid => "",
        }
    }
}

/// Result of deleting a file or a directory tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    FullyRemoved,
    PartiallyRemoved,
    Failed,
}

/// Delete a file, or a directory tree bottom-up, counting what could not be removed.
pub fn remove_path(path: &Path) -> RemovalOutcome {
    if path.is_file() {
        return match fs::remove_file(path) {
            Ok(()) => RemovalOutcome::FullyRemoved,
            Err(error) => {
                warn!("Failed to delete {}: {error}", path.display());
                RemovalOutcome::Failed
            }
        };
    }

    let mut removed = 0;
    let mut failed = 0;
    for entry in WalkDir::new(path).contents_first(true) {
        let result = entry.map_err(anyhow::Error::from).and_then(|entry| {
            let removal = if entry.file_type().is_dir() {
                fs::remove_dir(entry.path())
            } else {
                fs::remove_file(entry.path())
            };
            removal.with_context(|| format!("Failed to delete {}", entry.path().display()))
        });
        match result {
            Ok(()) => removed += 1,
            Err(error) => {
                warn!("{error:#}");
                failed += 1;
            }
        }
    }

    match (removed, failed) {
        (_, 0) => RemovalOutcome::FullyRemoved,
        (0, _) => RemovalOutcome::Failed,
        _ => RemovalOutcome::PartiallyRemoved,
    }
}

#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Disable candidates without a match instead of asking.
    pub skip_lookup_failures: bool,
    /// Files smaller than this default to removal.
    pub small_file_threshold: u64,
    pub verbose: bool,
    /// Delay after an unknown command.
    pub invalid_pause: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            skip_lookup_failures: false,
            small_file_threshold: 50 * 1024 * 1024,
            verbose: false,
            invalid_pause: Duration::from_millis(750),
        }
    }
}

/// State shared by all candidates of one run.
#[derive(Debug, Default)]
pub struct Session {
    pub processed: usize,
    pub total: usize,
    /// Once set, every following candidate is disabled without prompting.
    pub skip_remaining: bool,
}

#[derive(Debug)]
pub enum BatchOutcome {
    /// The enabled candidates, in input order.
    Completed(Vec<MediaCandidate>),
    Aborted,
}

enum Step {
    Resolved(MediaCandidate),
    Abort,
}

/// Search results and, for episodes, the detail of the selected show.
struct Lookup {
    results: Vec<SearchResult>,
    detail: Option<EpisodeDetail>,
}

impl Lookup {
    fn found(&self, candidate: &MediaCandidate, selected: usize) -> bool {
        self.results.get(selected).is_some()
            && (candidate.mode() == LookupMode::Movie || self.detail.is_some())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Year,
    Enabled,
    Title,
    Season,
    EpisodeStart,
    EpisodeEnd,
    ImdbId,
}

impl Field {
    fn for_mode(mode: LookupMode) -> &'static [Field] {
        match mode {
            LookupMode::Episode => &[
                Field::Name,
                Field::Year,
                Field::Enabled,
                Field::Title,
                Field::Season,
                Field::EpisodeStart,
                Field::EpisodeEnd,
            ],
            LookupMode::Movie => &[Field::Name, Field::Year, Field::Enabled, Field::ImdbId],
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Year => "year",
            Field::Enabled => "enabled",
            Field::Title => "title",
            Field::Season => "season",
            Field::EpisodeStart => "episode",
            Field::EpisodeEnd => "episode end",
            Field::ImdbId => "imdb id",
        }
    }

    /// By 1-based number or by label.
    fn select(input: &str, mode: LookupMode) -> Option<Field> {
        let fields = Field::for_mode(mode);
        match input.parse::<usize>() {
            Ok(number) => number.checked_sub(1).and_then(|index| fields.get(index)).copied(),
            Err(_) => fields
                .iter()
                .find(|field| field.label().eq_ignore_ascii_case(input))
                .copied(),
        }
    }

    fn current(&self, candidate: &MediaCandidate) -> String {
        let optional = |value: Option<i32>| value.map(|v| v.to_string()).unwrap_or_default();
        match (self, &candidate.kind) {
            (Field::Name, _) => candidate.name.clone(),
            (Field::Year, _) => optional(candidate.year),
            (Field::Enabled, _) => candidate.enabled.to_string(),
            (Field::Title, CandidateKind::Episode(episode)) => {
                episode.title.clone().unwrap_or_default()
            }
            (Field::Season, CandidateKind::Episode(episode)) => episode.season_number.to_string(),
            (Field::EpisodeStart, CandidateKind::Episode(episode)) => {
                episode.episode_number_start.to_string()
            }
            (Field::EpisodeEnd, CandidateKind::Episode(episode)) => {
                optional(episode.episode_number_end)
            }
            (Field::ImdbId, CandidateKind::Movie(movie)) => {
                movie.imdb_id.clone().unwrap_or_default()
            }
            _ => String::new(),
        }
    }

    /// Set the field from user input. `-` clears optional fields.
    fn apply(&self, candidate: &mut MediaCandidate, value: &str) -> Result<()> {
        let value = value.trim();
        let number = |value: &str| -> Result<i32> {
            value
                .parse::<i32>()
                .with_context(|| format!("'{value}' is not a number"))
        };
        let optional_number = |value: &str| -> Result<Option<i32>> {
            if value.is_empty() || value == "-" {
                Ok(None)
            } else {
                number(value).map(Some)
            }
        };
        let optional_text = |value: &str| {
            if value.is_empty() || value == "-" {
                None
            } else {
                Some(value.to_string())
            }
        };

        match self {
            Field::Name => {
                if value.is_empty() {
                    bail!("The name cannot be empty");
                }
                candidate.name = value.to_string();
            }
            Field::Year => candidate.year = optional_number(value)?,
            Field::Enabled => {
                candidate.enabled = match value.to_lowercase().as_str() {
                    "true" | "yes" | "y" | "1" => true,
                    "false" | "no" | "n" | "0" => false,
                    other => bail!("'{other}' is not a boolean"),
                }
            }
            Field::ImdbId => {
                if let Some(movie) = candidate.movie_mut() {
                    movie.imdb_id = optional_text(value);
                }
            }
            Field::Title | Field::Season | Field::EpisodeStart | Field::EpisodeEnd => {
                let Some(episode) = candidate.episode_mut() else {
                    bail!("Not an episode");
                };
                match self {
                    Field::Title => episode.title = optional_text(value),
                    Field::Season => episode.season_number = number(value)?,
                    Field::EpisodeStart => episode.episode_number_start = number(value)?,
                    _ => episode.episode_number_end = optional_number(value)?,
                }
            }
        }
        Ok(())
    }
}

fn field_rows(candidate: &MediaCandidate) -> Vec<FieldRow> {
    let mut rows = vec![FieldRow {
        key: "-".to_string(),
        field: "file".to_string(),
        value: candidate.file.path.display().to_string(),
    }];
    rows.extend(
        Field::for_mode(candidate.mode())
            .iter()
            .enumerate()
            .map(|(index, field)| FieldRow {
                key: (index + 1).to_string(),
                field: field.label().to_string(),
                value: field.current(candidate),
            }),
    );
    rows
}

pub struct ResolutionEngine<'a, A, C> {
    api: &'a A,
    console: &'a mut C,
    options: EngineOptions,
    remover: fn(&Path) -> RemovalOutcome,
}

impl<'a, A: MetadataApi, C: Console> ResolutionEngine<'a, A, C> {
    pub fn new(api: &'a A, console: &'a mut C, options: EngineOptions) -> Self {
        Self {
            api,
            console,
            options,
            remover: remove_path,
        }
    }

    /// Replace how confirmed removals are carried out.
    pub fn with_remover(mut self, remover: fn(&Path) -> RemovalOutcome) -> Self {
        self.remover = remover;
        self
    }

    /// Resolve every candidate in order and keep the enabled ones.
    pub async fn resolve_all(&mut self, candidates: Vec<MediaCandidate>) -> Result<BatchOutcome> {
        let mut session = Session {
            total: candidates.len(),
            ..Default::default()
        };
        let mut resolved = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            match self.resolve(candidate, &mut session).await? {
                Step::Resolved(candidate) => resolved.push(candidate),
                Step::Abort => return Ok(BatchOutcome::Aborted),
            }
        }
        Ok(BatchOutcome::Completed(
            resolved.into_iter().filter(|candidate| candidate.enabled).collect(),
        ))
    }

    async fn lookup(&self, candidate: &MediaCandidate, selected: usize) -> Lookup {
        match candidate.mode() {
            LookupMode::Episode => {
                let resolver = EpisodeResolver::new(self.api);
                let results = resolver.search(candidate).await;
                let detail = match results.get(selected) {
                    Some(result) => resolver.resolve_single(candidate, result).await,
                    None => None,
                };
                Lookup { results, detail }
            }
            LookupMode::Movie => Lookup {
                results: MovieResolver::new(self.api).search(candidate).await,
                detail: None,
            },
        }
    }

    /// Copy the selected match into the candidate.
    async fn hydrate(
        &self,
        candidate: &mut MediaCandidate,
        result: &SearchResult,
        detail: Option<&EpisodeDetail>,
    ) {
        candidate.id = Some(result.id());
        candidate.name = result.title().to_string();
        candidate.year = result.year();
        match &mut candidate.kind {
            CandidateKind::Episode(episode) => {
                if let Some(detail) = detail {
                    episode.title = Some(detail.name.clone());
                    episode.season_number = detail.season_number;
                    episode.episode_number_start = detail.episode_number;
                }
            }
            CandidateKind::Movie(movie) => {
                if let Some(detail) = MovieResolver::new(self.api).detail(result).await {
                    movie.imdb_id = detail.imdb_id;
                }
            }
        }
    }

    fn default_action(&self, candidate: &MediaCandidate, found: bool) -> Action {
        if candidate.file.size < self.options.small_file_threshold {
            Action::RemoveFile
        } else if found {
            Action::Continue
        } else {
            Action::Skip
        }
    }

    async fn resolve(
        &mut self,
        mut candidate: MediaCandidate,
        session: &mut Session,
    ) -> Result<Step> {
        session.processed += 1;
        if session.skip_remaining {
            debug!("Skipping {}", candidate.file.path.display());
            candidate.enabled = false;
            return Ok(Step::Resolved(candidate));
        }

        report::print_progress(session.processed, session.total, &candidate);
        if !candidate.file.exists() {
            print_error(&format!(
                "{} no longer exists",
                candidate.file.path.display()
            ));
            candidate.enabled = false;
            return Ok(Step::Resolved(candidate));
        }

        let mut mode = candidate.mode();
        let mut selected = 0;
        let mut expanded_help = false;

        loop {
            if candidate.mode() != mode {
                // Re-parsing discards anything edited so far.
                candidate = video::parse_as(candidate.file.clone(), Some(mode));
                selected = 0;
            }

            let lookup = self.lookup(&candidate, selected).await;
            let found = lookup.found(&candidate, selected);
            report::print_lookup(
                &candidate,
                lookup.results.get(selected),
                lookup.detail.as_ref(),
                self.options.verbose,
            );

            if !found && self.options.skip_lookup_failures {
                candidate.enabled = false;
                return Ok(Step::Resolved(candidate));
            }

            let default = self.default_action(&candidate, found);
            let answer = self
                .console
                .ask(&report::help_text(expanded_help), default.shortcut())?;

            match Action::parse(&answer) {
                Action::Continue => match lookup.results.get(selected) {
                    Some(result) if found => {
                        self.hydrate(&mut candidate, result, lookup.detail.as_ref()).await;
                        candidate.enabled = true;
                        return Ok(Step::Resolved(candidate));
                    }
                    _ => print_notice("Nothing to accept, use C to keep the parsed values"),
                },
                Action::ForceContinue => {
                    candidate.enabled = true;
                    return Ok(Step::Resolved(candidate));
                }
                Action::Skip => {
                    candidate.enabled = false;
                    return Ok(Step::Resolved(candidate));
                }
                action @ (Action::RemoveFile | Action::RemoveDirectory) => {
                    match self.remove(&candidate, action == Action::RemoveDirectory)? {
                        Some(RemovalOutcome::FullyRemoved) => {
                            candidate.enabled = false;
                            return Ok(Step::Resolved(candidate));
                        }
                        Some(outcome) => {
                            candidate.enabled = false;
                            print_error(&format!("Removal incomplete: {outcome:?}"));
                        }
                        None => {}
                    }
                }
                Action::Edit => self.edit(&mut candidate)?,
                Action::List => {
                    if let Some(index) = self.choose_result(&lookup.results, selected)? {
                        selected = index;
                    }
                }
                Action::Mode => mode = mode.toggled(),
                Action::Help => expanded_help = true,
                Action::Done => {
                    session.skip_remaining = true;
                    candidate.enabled = false;
                    return Ok(Step::Resolved(candidate));
                }
                Action::Quit => return Ok(Step::Abort),
                Action::Invalid => {
                    print_error(&format!("Invalid command shortcut '{answer}'"));
                    tokio::time::sleep(self.options.invalid_pause).await;
                }
            }
        }
    }

    /// Ask what to delete and confirm. `None` when nothing was attempted.
    fn remove(
        &mut self,
        candidate: &MediaCandidate,
        directory: bool,
    ) -> Result<Option<RemovalOutcome>> {
        let default = if directory { "d" } else { "f" };
        let target: PathBuf = match self
            .console
            .ask("Remove the [f]ile or its whole [d]irectory?", default)?
            .as_str()
        {
            "f" => candidate.file.path.clone(),
            "d" => match candidate.file.directory() {
                Some(directory) => directory.to_path_buf(),
                None => {
                    print_error("The file has no parent directory");
                    return Ok(None);
                }
            },
            other => {
                print_error(&format!("Invalid choice '{other}'"));
                return Ok(None);
            }
        };

        if !self
            .console
            .confirm(&format!("Delete {}?", target.display()), false)?
        {
            return Ok(None);
        }
        Ok(Some((self.remover)(&target)))
    }

    fn edit(&mut self, candidate: &mut MediaCandidate) -> Result<()> {
        loop {
            report::print_fields(field_rows(candidate));
            let choice = self.console.ask("Field to edit (empty when done)", "")?;
            if choice.is_empty() || choice == "done" {
                return Ok(());
            }
            let Some(field) = Field::select(&choice, candidate.mode()) else {
                print_error(&format!("Unknown field '{choice}'"));
                continue;
            };
            let value = self
                .console
                .ask(&format!("New {}", field.label()), &field.current(candidate))?;
            if let Err(error) = field.apply(candidate, &value) {
                print_error(&format!("{error:#}"));
            }
        }
    }

    /// Show all results and return the newly chosen 0-based index.
    fn choose_result(
        &mut self,
        results: &[SearchResult],
        selected: usize,
    ) -> Result<Option<usize>> {
        if results.is_empty() {
            print_notice("No search results to choose from");
            return Ok(None);
        }
        report::print_results(results);
        let answer = self
            .console
            .ask("Result number", &(selected + 1).to_string())?;
        match answer.parse::<usize>() {
            Ok(number) if (1..=results.len()).contains(&number) => Ok(Some(number - 1)),
            _ => {
                print_error(&format!("Invalid result number '{answer}'"));
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::MediaFile;
    use crate::console::ScriptedConsole;
    use crate::tmdb::testing::StaticApi;
    use tempfile::TempDir;

    fn options() -> EngineOptions {
        EngineOptions {
            small_file_threshold: 0,
            invalid_pause: Duration::ZERO,
            ..Default::default()
        }
    }

    fn office_api() -> StaticApi {
        StaticApi {
            shows: vec![
                StaticApi::show(2316, "The Office", "2005-03-24"),
                StaticApi::show(2996, "The Office", "2001-07-09"),
            ],
            movies: vec![StaticApi::movie(1, "The Office Movie", "2020-01-01")],
            episode: Some(EpisodeDetail {
                id: 397733,
                season_number: 2,
                episode_number: 1,
                name: "The Dundies".to_string(),
                air_date: Some("2005-09-20".to_string()),
            }),
            imdb_id: Some("tt0000001".to_string()),
            ..Default::default()
        }
    }

    /// Files on disk parsed into candidates.
    fn candidates(dir: &TempDir, names: &[&str]) -> Vec<MediaCandidate> {
        names
            .iter()
            .map(|name| {
                let path = dir.path().join(name);
                fs::write(&path, "0123456789").unwrap();
                video::parse(MediaFile::from_path(&path).unwrap())
            })
            .collect()
    }

    async fn run(
        api: &StaticApi,
        console: &mut ScriptedConsole,
        options: EngineOptions,
        candidates: Vec<MediaCandidate>,
    ) -> BatchOutcome {
        ResolutionEngine::new(api, console, options)
            .resolve_all(candidates)
            .await
            .unwrap()
    }

    fn completed(outcome: BatchOutcome) -> Vec<MediaCandidate> {
        match outcome {
            BatchOutcome::Completed(candidates) => candidates,
            BatchOutcome::Aborted => panic!("Batch should not be aborted"),
        }
    }

    #[test]
    fn test_action_parse() {
        for (input, action) in [
            ("c", Action::Continue),
            ("C", Action::ForceContinue),
            ("s", Action::Skip),
            ("r", Action::RemoveFile),
            ("R", Action::RemoveDirectory),
            ("e", Action::Edit),
            ("l", Action::List),
            ("m", Action::Mode),
            ("?", Action::Help),
            ("h", Action::Help),
            ("D", Action::Done),
            ("Q", Action::Quit),
            ("q", Action::Invalid),
            ("", Action::Invalid),
        ] {
            assert_eq!(Action::parse(input), action, "{input:?}");
        }
    }

    #[test]
    fn test_remove_path() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("sample.mkv");
        fs::write(&file, "x").unwrap();
        assert_eq!(remove_path(&file), RemovalOutcome::FullyRemoved);
        assert!(!file.exists());

        let tree = dir.path().join("release");
        fs::create_dir_all(tree.join("Sample")).unwrap();
        fs::write(tree.join("Sample").join("sample.mkv"), "x").unwrap();
        fs::write(tree.join("info.nfo"), "x").unwrap();
        assert_eq!(remove_path(&tree), RemovalOutcome::FullyRemoved);
        assert!(!tree.exists());

        assert_eq!(remove_path(&dir.path().join("missing")), RemovalOutcome::Failed);
    }

    #[tokio::test]
    async fn test_continue_hydrates_episode() {
        let dir = TempDir::new().unwrap();
        let api = office_api();
        let mut console = ScriptedConsole::new(&["c"]);
        let batch = candidates(&dir, &["The.Office.US.S02E01.720p.mkv"]);
        let resolved = completed(run(&api, &mut console, options(), batch).await);

        assert_eq!(resolved.len(), 1);
        let candidate = &resolved[0];
        assert!(candidate.enabled);
        assert_eq!(candidate.id, Some(2316));
        assert_eq!(candidate.name, "The Office");
        assert_eq!(candidate.year, Some(2005));
        let episode = candidate.episode().unwrap();
        assert_eq!(episode.title.as_deref(), Some("The Dundies"));
        assert_eq!((episode.season_number, episode.episode_number_start), (2, 1));
    }

    #[tokio::test]
    async fn test_default_action_accepts_found_match() {
        let dir = TempDir::new().unwrap();
        let api = office_api();
        let mut console = ScriptedConsole::new(&[""]);
        let batch = candidates(&dir, &["The.Office.S02E01.mkv"]);
        let resolved = completed(run(&api, &mut console, options(), batch).await);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].id, Some(2316));
    }

    #[tokio::test]
    async fn test_default_action_skips_without_results() {
        let dir = TempDir::new().unwrap();
        let api = StaticApi::default();
        let mut console = ScriptedConsole::new(&[""]);
        let batch = candidates(&dir, &["Unknown.S01E01.mkv"]);
        let resolved = completed(run(&api, &mut console, options(), batch).await);
        assert!(resolved.is_empty());
        assert!(console.is_exhausted());
    }

    #[tokio::test]
    async fn test_small_file_defaults_to_removal() {
        let dir = TempDir::new().unwrap();
        let api = office_api();
        let mut console = ScriptedConsole::new(&["", ""]).with_confirmations(&[true]);
        let options = EngineOptions {
            small_file_threshold: 1024,
            ..options()
        };
        let batch = candidates(&dir, &["The.Office.S02E01.sample.mkv"]);
        let resolved = completed(run(&api, &mut console, options, batch).await);
        assert!(resolved.is_empty());
        assert!(!dir.path().join("The.Office.S02E01.sample.mkv").exists());
        assert!(console.is_exhausted());
    }

    /// Directories cannot be removed, files report success without touching the disk.
    fn locked_directories(path: &Path) -> RemovalOutcome {
        if path.is_dir() {
            RemovalOutcome::Failed
        } else {
            RemovalOutcome::FullyRemoved
        }
    }

    fn partial_removal(_path: &Path) -> RemovalOutcome {
        RemovalOutcome::PartiallyRemoved
    }

    #[tokio::test]
    async fn test_failed_directory_removal_stays_in_loop() {
        let dir = TempDir::new().unwrap();
        let api = office_api();
        let mut console = ScriptedConsole::new(&["R", "", "s"]).with_confirmations(&[true]);
        let outcome = ResolutionEngine::new(&api, &mut console, options())
            .with_remover(locked_directories)
            .resolve_all(candidates(&dir, &["The.Office.S02E01.mkv"]))
            .await
            .unwrap();

        assert!(completed(outcome).is_empty());
        assert!(console.is_exhausted(), "Should ask again after the failed removal");
        assert_eq!(console.questions.len(), 4);
        assert_eq!(console.questions[3], report::help_text(false));
        assert_eq!(api.searches.get(), 2);
        assert!(dir.path().join("The.Office.S02E01.mkv").exists());
    }

    #[tokio::test]
    async fn test_partial_removal_disables_candidate() {
        let dir = TempDir::new().unwrap();
        let api = office_api();
        let mut console = ScriptedConsole::new(&["r", "f", "s"]).with_confirmations(&[true]);
        let outcome = ResolutionEngine::new(&api, &mut console, options())
            .with_remover(partial_removal)
            .resolve_all(candidates(&dir, &["The.Office.S02E01.mkv"]))
            .await
            .unwrap();

        assert!(completed(outcome).is_empty());
        assert!(console.is_exhausted());
        assert_eq!(api.searches.get(), 2);
    }

    #[tokio::test]
    async fn test_declined_removal_stays_in_loop() {
        let dir = TempDir::new().unwrap();
        let api = office_api();
        let mut console = ScriptedConsole::new(&["r", "f", "s"]).with_confirmations(&[false]);
        let batch = candidates(&dir, &["The.Office.S02E01.mkv"]);
        let resolved = completed(run(&api, &mut console, options(), batch).await);
        assert!(resolved.is_empty());
        assert!(dir.path().join("The.Office.S02E01.mkv").exists());
        assert!(console.is_exhausted());
        assert_eq!(api.searches.get(), 2);
    }

    #[tokio::test]
    async fn test_skip_lookup_failures_does_not_prompt() {
        let dir = TempDir::new().unwrap();
        let api = StaticApi::default();
        let mut console = ScriptedConsole::default();
        let options = EngineOptions {
            skip_lookup_failures: true,
            ..options()
        };
        let batch = candidates(&dir, &["Unknown.S01E01.mkv", "Other.2001.mkv"]);
        let resolved = completed(run(&api, &mut console, options, batch).await);
        assert!(resolved.is_empty());
        assert!(console.questions.is_empty());
        assert_eq!(api.searches.get(), 2);
    }

    #[tokio::test]
    async fn test_force_continue_keeps_parsed_values() {
        let dir = TempDir::new().unwrap();
        let api = StaticApi::default();
        let mut console = ScriptedConsole::new(&["c", "C"]);
        let batch = candidates(&dir, &["Unknown.Show.S01E03.mkv"]);
        let resolved = completed(run(&api, &mut console, options(), batch).await);
        assert_eq!(resolved.len(), 1);
        assert!(resolved[0].enabled);
        assert_eq!(resolved[0].id, None);
        assert_eq!(resolved[0].name, "Unknown Show");
    }

    #[tokio::test]
    async fn test_done_latches_skip_remaining() {
        let dir = TempDir::new().unwrap();
        let api = office_api();
        let mut console = ScriptedConsole::new(&["D"]);
        let batch = candidates(&dir, &["A.S01E01.mkv", "B.S01E01.mkv", "C.S01E01.mkv"]);
        let resolved = completed(run(&api, &mut console, options(), batch).await);
        assert!(resolved.is_empty());
        assert_eq!(api.searches.get(), 1, "Only the first candidate should be searched");
        assert_eq!(console.questions.len(), 1);
    }

    #[tokio::test]
    async fn test_done_keeps_earlier_accepted_candidates() {
        let dir = TempDir::new().unwrap();
        let api = office_api();
        let mut console = ScriptedConsole::new(&["C", "D"]);
        let batch = candidates(&dir, &["A.S01E01.mkv", "B.S01E01.mkv", "C.S01E01.mkv"]);
        let resolved = completed(run(&api, &mut console, options(), batch).await);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].name, "A");
    }

    #[tokio::test]
    async fn test_quit_aborts_batch() {
        let dir = TempDir::new().unwrap();
        let api = office_api();
        let mut console = ScriptedConsole::new(&["C", "Q"]);
        let batch = candidates(&dir, &["A.S01E01.mkv", "B.S01E01.mkv", "C.S01E01.mkv"]);
        let outcome = run(&api, &mut console, options(), batch).await;
        assert!(matches!(outcome, BatchOutcome::Aborted));
        assert_eq!(api.searches.get(), 2);
    }

    #[tokio::test]
    async fn test_missing_file_is_disabled_without_search() {
        let dir = TempDir::new().unwrap();
        let api = office_api();
        let mut console = ScriptedConsole::default();
        let mut batch = candidates(&dir, &["The.Office.S02E01.mkv"]);
        fs::remove_file(&batch[0].file.path).unwrap();
        batch[0].enabled = true;
        let resolved = completed(run(&api, &mut console, options(), batch).await);
        assert!(resolved.is_empty());
        assert_eq!(api.searches.get(), 0);
    }

    #[tokio::test]
    async fn test_mode_switch_reparses_as_movie() {
        let dir = TempDir::new().unwrap();
        let api = office_api();
        let mut console = ScriptedConsole::new(&["e", "1", "Edited", "", "m", "c"]);
        let batch = candidates(&dir, &["The.Office.S02E01.mkv"]);
        let resolved = completed(run(&api, &mut console, options(), batch).await);
        assert_eq!(resolved.len(), 1);
        let candidate = &resolved[0];
        assert_eq!(candidate.mode(), LookupMode::Movie);
        assert_eq!(candidate.id, Some(1));
        assert_eq!(candidate.name, "The Office Movie");
        assert_eq!(candidate.year, Some(2020));
        match &candidate.kind {
            CandidateKind::Movie(movie) => assert_eq!(movie.imdb_id.as_deref(), Some("tt0000001")),
            CandidateKind::Episode(_) => panic!("Should be a movie"),
        }
    }

    #[tokio::test]
    async fn test_list_selects_another_result() {
        let dir = TempDir::new().unwrap();
        let api = office_api();
        let mut console = ScriptedConsole::new(&["l", "2", "c"]);
        let batch = candidates(&dir, &["The.Office.S02E01.mkv"]);
        let resolved = completed(run(&api, &mut console, options(), batch).await);
        assert_eq!(resolved[0].id, Some(2996));
        assert_eq!(resolved[0].year, Some(2001));
    }

    #[tokio::test]
    async fn test_list_rejects_out_of_range_selection() {
        let dir = TempDir::new().unwrap();
        let api = office_api();
        let mut console = ScriptedConsole::new(&["l", "3", "c"]);
        let batch = candidates(&dir, &["The.Office.S02E01.mkv"]);
        let resolved = completed(run(&api, &mut console, options(), batch).await);
        assert_eq!(resolved[0].id, Some(2316));
    }

    #[tokio::test]
    async fn test_invalid_and_help_reprompt() {
        let dir = TempDir::new().unwrap();
        let api = office_api();
        let mut console = ScriptedConsole::new(&["x", "?", "s"]);
        let batch = candidates(&dir, &["The.Office.S02E01.mkv"]);
        let resolved = completed(run(&api, &mut console, options(), batch).await);
        assert!(resolved.is_empty());
        assert_eq!(console.questions.len(), 3);
        assert_eq!(console.questions[2], report::help_text(true));
        assert_eq!(api.searches.get(), 3);
    }

    #[tokio::test]
    async fn test_edit_fields_then_force() {
        let dir = TempDir::new().unwrap();
        let api = StaticApi::default();
        let mut console = ScriptedConsole::new(&[
            "e",
            "name",
            "Better Name",
            "5",
            "3",
            "6",
            "x",
            "year",
            "abc",
            "year",
            "2010",
            "done",
            "C",
        ]);
        let batch = candidates(&dir, &["Show.S01E02.mkv"]);
        let resolved = completed(run(&api, &mut console, options(), batch).await);
        let candidate = &resolved[0];
        assert_eq!(candidate.name, "Better Name");
        assert_eq!(candidate.year, Some(2010));
        let episode = candidate.episode().unwrap();
        assert_eq!(episode.season_number, 3);
        assert_eq!(episode.episode_number_start, 2);
        assert!(console.is_exhausted());
    }

    #[test]
    fn test_field_apply_rejects_bad_values() {
        let mut candidate = video::parse(MediaFile::new("/tv/Show.S01E02.mkv", 0));
        assert!(Field::Season.apply(&mut candidate, "two").is_err());
        assert!(Field::Name.apply(&mut candidate, "  ").is_err());
        assert!(Field::Enabled.apply(&mut candidate, "maybe").is_err());
        Field::EpisodeEnd.apply(&mut candidate, "3").unwrap();
        assert_eq!(candidate.episode().unwrap().episode_number_end, Some(3));
        Field::EpisodeEnd.apply(&mut candidate, "-").unwrap();
        assert_eq!(candidate.episode().unwrap().episode_number_end, None);
    }

    #[test]
    fn test_field_select() {
        assert_eq!(Field::select("1", LookupMode::Episode), Some(Field::Name));
        assert_eq!(Field::select("7", LookupMode::Episode), Some(Field::EpisodeEnd));
        assert_eq!(Field::select("5", LookupMode::Movie), None);
        assert_eq!(Field::select("IMDB ID", LookupMode::Movie), Some(Field::ImdbId));
        assert_eq!(Field::select("0", LookupMode::Movie), None);
    }
}
