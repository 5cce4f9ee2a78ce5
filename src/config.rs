//! User config file and command line options, merged into the final run settings.

use anyhow::{Context, Result, bail};
use clap::Args;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use crate::candidate::LookupMode;
use crate::engine::EngineOptions;
use crate::instruction::Templates;
use crate::placer::{OverwritePolicy, TransferMode};

const PROJECT_NAME: &str = env!("CARGO_PKG_NAME");

const MEDIA_EXTENSIONS: [&str; 11] = [
    "mkv", "mp4", "avi", "mov", "m4v", "wmv", "flv", "webm", "mpg", "mpeg", "ts",
];

const SUBTITLE_EXTENSIONS: [&str; 6] = ["srt", "sub", "ass", "ssa", "vtt", "idx"];

/// Path to the user config file: `$HOME/.config/mediasort.toml`
///
/// `None` if the home directory cannot be determined.
pub static CONFIG_PATH: LazyLock<Option<PathBuf>> = LazyLock::new(|| {
    let home_dir = dirs::home_dir()?;
    Some(home_dir.join(".config").join(format!("{PROJECT_NAME}.toml")))
});

/// The `[organize]` section of the user config file.
#[derive(Debug, Default, Deserialize)]
pub struct OrganizeConfig {
    #[serde(default)]
    pub media_extensions: Vec<String>,
    #[serde(default)]
    pub subtitle_extensions: Vec<String>,
    #[serde(default)]
    pub pre_clean_extensions: Vec<String>,
    #[serde(default)]
    pub post_clean_extensions: Vec<String>,
    pub episode_path_template: Option<String>,
    pub episode_file_template: Option<String>,
    pub movie_path_template: Option<String>,
    pub movie_file_template: Option<String>,
    pub preferred_language: Option<String>,
    pub small_file_threshold_mb: Option<u64>,
}

/// Wrapper needed for parsing the config section.
#[derive(Debug, Default, Deserialize)]
struct UserConfig {
    #[serde(default)]
    organize: OrganizeConfig,
}

impl OrganizeConfig {
    /// Read the user config file if it exists, defaults otherwise.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn get_user_config() -> Result<Self> {
        match CONFIG_PATH.as_deref() {
            Some(path) => Self::from_path(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content)
                .with_context(|| format!("Failed to parse config file {}", path.display())),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => {
                Err(error).with_context(|| format!("Failed to read config file {}", path.display()))
            }
        }
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        toml::from_str::<UserConfig>(toml_str)
            .map(|config| config.organize)
            .context("Failed to parse config TOML")
    }
}

#[derive(Args, Debug, Default)]
pub struct OrganizeArgs {
    /// Directories to scan for media files
    #[arg(required = true, value_name = "SEARCH_PATH")]
    pub search_paths: Vec<PathBuf>,

    /// Root directory of the organized library
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,

    /// Media file extension to scan for
    #[arg(long = "media-ext", value_name = "EXT")]
    pub media_extensions: Vec<String>,

    /// Subtitle file extension to pair with media files
    #[arg(long = "subtitle-ext", value_name = "EXT")]
    pub subtitle_extensions: Vec<String>,

    /// Delete files with this extension before scanning
    #[arg(long, value_name = "EXT")]
    pub pre_clean: Vec<String>,

    /// Delete files with this extension after placing
    #[arg(long, value_name = "EXT")]
    pub post_clean: Vec<String>,

    /// Treat every file as a TV episode
    #[arg(long, conflicts_with = "movie")]
    pub episode: bool,

    /// Treat every file as a movie
    #[arg(long)]
    pub movie: bool,

    /// Skip files without a match instead of asking
    #[arg(long)]
    pub skip_failures: bool,

    /// Always overwrite existing files
    #[arg(long)]
    pub overwrite: bool,

    /// Overwrite existing files only with larger ones
    #[arg(long)]
    pub smart_overwrite: bool,

    /// Copy instead of move
    #[arg(long)]
    pub copy: bool,

    /// Do not pair subtitles with media files
    #[arg(long)]
    pub no_subtitles: bool,

    /// Only print what would be done
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Print debug information
    #[arg(short, long)]
    pub verbose: bool,
}

/// Final settings created from CLI arguments and the user config file.
#[derive(Debug, Clone)]
pub struct Settings {
    pub search_paths: Vec<PathBuf>,
    pub output: PathBuf,
    pub media_extensions: Vec<String>,
    pub subtitle_extensions: Vec<String>,
    pub pre_clean: Vec<String>,
    pub post_clean: Vec<String>,
    pub templates: Templates,
    pub preferred_language: String,
    pub forced_mode: Option<LookupMode>,
    pub engine: EngineOptions,
    pub overwrite: OverwritePolicy,
    pub mode: TransferMode,
    pub subtitles: bool,
    pub dry_run: bool,
    pub verbose: bool,
}

/// Lowercase without leading dots, CLI values win when given.
fn extensions(cli: Vec<String>, config: Vec<String>, defaults: &[&str]) -> Vec<String> {
    let chosen = if !cli.is_empty() {
        cli
    } else if !config.is_empty() {
        config
    } else {
        defaults.iter().map(|ext| ext.to_string()).collect()
    };
    chosen
        .iter()
        .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}

impl Settings {
    /// Merge CLI arguments over the user config. Paths are validated here,
    /// before anything touches the filesystem.
    pub fn from_args(args: OrganizeArgs, config: OrganizeConfig) -> Result<Self> {
        for path in &args.search_paths {
            if !path.is_dir() {
                bail!("Search path is not a directory: {}", path.display());
            }
        }
        if args.output.exists() && !args.output.is_dir() {
            bail!("Output path is not a directory: {}", args.output.display());
        }
        if args.episode && args.movie {
            bail!("--episode and --movie cannot be used together");
        }

        let defaults = Templates::default();
        let templates = Templates {
            episode_path: config.episode_path_template.unwrap_or(defaults.episode_path),
            episode_file: config.episode_file_template.unwrap_or(defaults.episode_file),
            movie_path: config.movie_path_template.unwrap_or(defaults.movie_path),
            movie_file: config.movie_file_template.unwrap_or(defaults.movie_file),
        };

        let forced_mode = match (args.episode, args.movie) {
            (true, _) => Some(LookupMode::Episode),
            (_, true) => Some(LookupMode::Movie),
            _ => None,
        };

        let engine = EngineOptions {
            skip_lookup_failures: args.skip_failures,
            small_file_threshold: config
                .small_file_threshold_mb
                .map_or(EngineOptions::default().small_file_threshold, |mb| mb * 1024 * 1024),
            verbose: args.verbose,
            ..Default::default()
        };

        Ok(Self {
            media_extensions: extensions(
                args.media_extensions,
                config.media_extensions,
                &MEDIA_EXTENSIONS,
            ),
            subtitle_extensions: extensions(
                args.subtitle_extensions,
                config.subtitle_extensions,
                &SUBTITLE_EXTENSIONS,
            ),
            pre_clean: extensions(args.pre_clean, config.pre_clean_extensions, &[]),
            post_clean: extensions(args.post_clean, config.post_clean_extensions, &[]),
            templates,
            preferred_language: config.preferred_language.unwrap_or_else(|| "eng".to_string()),
            forced_mode,
            engine,
            overwrite: OverwritePolicy {
                blind: args.overwrite,
                smart: args.smart_overwrite,
            },
            mode: if args.copy {
                TransferMode::Copy
            } else {
                TransferMode::Move
            },
            subtitles: !args.no_subtitles,
            dry_run: args.dry_run,
            verbose: args.verbose,
            search_paths: args.search_paths,
            output: args.output,
        })
    }
}
