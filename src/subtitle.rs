//! Sidecar subtitle discovery for a matched video.
//!
//! Subtitles in the video's directory are ranked by how similar their name is
//! to the video's name. The language is read from a trailing code:
//! - `Movie.en.srt`  → English (ISO 639-1)
//! - `Movie.eng.srt` → English (ISO 639-2/B)
//! - `Movie.fre.srt` → French (ISO 639-2/B), `Movie.fra.srt` → French (ISO 639-2/T)
//! - `Movie.srt`     → unknown

use std::path::PathBuf;

use tracing::debug;

use crate::candidate::{MediaCandidate, MediaFile, SubtitleCandidate};
use crate::video::parse_extension;

/// An ISO 639 language with its two and three letter codes.
#[derive(Debug, PartialEq, Eq)]
pub struct Language {
    pub name: &'static str,
    pub iso639_1: &'static str,
    pub iso639_2b: &'static str,
    pub iso639_2t: &'static str,
}

impl Language {
    pub fn codes(&self) -> [&'static str; 3] {
        [self.iso639_1, self.iso639_2b, self.iso639_2t]
    }

    pub fn matches_code(&self, code: &str) -> bool {
        self.codes().iter().any(|own| own.eq_ignore_ascii_case(code))
    }
}

macro_rules! language {
    ($name:literal, $one:literal, $two_b:literal, $two_t:literal) => {
        Language {
            name: $name,
            iso639_1: $one,
            iso639_2b: $two_b,
            iso639_2t: $two_t,
        }
    };
}

pub static LANGUAGES: &[Language] = &[
    language!("English", "en", "eng", "eng"),
    language!("French", "fr", "fre", "fra"),
    language!("German", "de", "ger", "deu"),
    language!("Spanish", "es", "spa", "spa"),
    language!("Italian", "it", "ita", "ita"),
    language!("Portuguese", "pt", "por", "por"),
    language!("Dutch", "nl", "dut", "nld"),
    language!("Swedish", "sv", "swe", "swe"),
    language!("Norwegian", "no", "nor", "nor"),
    language!("Danish", "da", "dan", "dan"),
    language!("Finnish", "fi", "fin", "fin"),
    language!("Polish", "pl", "pol", "pol"),
    language!("Czech", "cs", "cze", "ces"),
    language!("Hungarian", "hu", "hun", "hun"),
    language!("Romanian", "ro", "rum", "ron"),
    language!("Greek", "el", "gre", "ell"),
    language!("Turkish", "tr", "tur", "tur"),
    language!("Russian", "ru", "rus", "rus"),
    language!("Ukrainian", "uk", "ukr", "ukr"),
    language!("Arabic", "ar", "ara", "ara"),
    language!("Hebrew", "he", "heb", "heb"),
    language!("Hindi", "hi", "hin", "hin"),
    language!("Chinese", "zh", "chi", "zho"),
    language!("Japanese", "ja", "jpn", "jpn"),
    language!("Korean", "ko", "kor", "kor"),
    language!("Vietnamese", "vi", "vie", "vie"),
    language!("Thai", "th", "tha", "tha"),
    language!("Indonesian", "id", "ind", "ind"),
    language!("Persian", "fa", "per", "fas"),
    language!("Icelandic", "is", "ice", "isl"),
];

/// Longest common substring of two char slices as `(start_a, start_b, length)`.
/// The first occurrence wins on ties.
fn longest_common_substring(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    for i in 0..a.len() {
        for j in 0..b.len() {
            let mut length = 0;
            while i + length < a.len() && j + length < b.len() && a[i + length] == b[j + length] {
                length += 1;
            }
            if length > best.2 {
                best = (i, j, length);
            }
        }
    }
    best
}

/// Number of matching characters: the longest common substring plus,
/// recursively, the matches to its left and to its right.
fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (start_a, start_b, length) = longest_common_substring(a, b);
    if length == 0 {
        return 0;
    }
    length
        + matching_chars(&a[..start_a], &b[..start_b])
        + matching_chars(&a[start_a + length..], &b[start_b + length..])
}

/// Case-sensitive similarity of two strings as a percentage in `0..=100`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    // Tie-breaking in the substring search depends on argument order.
    let matches = matching_chars(&a, &b).max(matching_chars(&b, &a));
    (matches * 2) as f64 * 100.0 / total as f64
}

/// Language from a trailing `.{code}` before the final extension.
pub fn detect_language(file: &MediaFile) -> Option<&'static Language> {
    let stem = file.stem().to_lowercase();
    LANGUAGES.iter().find(|language| {
        language
            .codes()
            .iter()
            .any(|code| stem.ends_with(&format!(".{code}")))
    })
}

/// Attach the subtitles found in `listing` to the candidate.
///
/// Only files in the candidate's own directory with a subtitle extension are
/// considered. The list is ranked by similarity, the best one is enabled, and
/// the active one is the first in the preferred language, falling back to the best.
pub fn associate(
    mut candidate: MediaCandidate,
    listing: &[MediaFile],
    extensions: &[String],
    preferred_language: &str,
) -> MediaCandidate {
    let directory = candidate.file.directory().map(PathBuf::from);
    let video_stem = candidate.file.stem().to_string();

    let mut subtitles: Vec<SubtitleCandidate> = listing
        .iter()
        .filter(|file| file.directory().map(PathBuf::from) == directory)
        .filter(|file| parse_extension(&file.path, extensions).is_some())
        .map(|file| SubtitleCandidate {
            file: file.clone(),
            language: detect_language(file),
            similarity: similarity(file.stem(), &video_stem),
            enabled: false,
        })
        .collect();

    // Stable sort keeps discovery order for equal scores.
    subtitles.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));

    if let Some(best) = subtitles.first_mut() {
        best.enabled = true;
    }

    candidate.active_subtitle = if subtitles.is_empty() {
        None
    } else {
        subtitles
            .iter()
            .position(|subtitle| {
                subtitle
                    .language
                    .is_some_and(|language| language.matches_code(preferred_language))
            })
            .or(Some(0))
    };

    debug!(
        "Found {} subtitle(s) for {}",
        subtitles.len(),
        candidate.file.path.display()
    );
    candidate.subtitles = subtitles;
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{CandidateKind, MovieCandidate};

    fn subtitle_extensions() -> Vec<String> {
        vec!["srt".to_string(), "sub".to_string()]
    }

    fn movie(path: &str) -> MediaCandidate {
        MediaCandidate::new(
            MediaFile::new(path, 0),
            "Movie".to_string(),
            None,
            CandidateKind::Movie(MovieCandidate::default()),
        )
    }

    fn listing(names: &[&str]) -> Vec<MediaFile> {
        names.iter().map(|name| MediaFile::new(*name, 0)).collect()
    }

    fn subtitle_names(candidate: &MediaCandidate) -> Vec<String> {
        candidate
            .subtitles
            .iter()
            .map(|subtitle| subtitle.file.path.display().to_string())
            .collect()
    }

    #[test]
    fn test_similarity_equal_strings() {
        assert_eq!(similarity("movie", "movie"), 100.0);
        assert_eq!(similarity("", ""), 100.0);
    }

    #[test]
    fn test_similarity_disjoint_strings() {
        assert_eq!(similarity("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_similarity_is_symmetric() {
        for (a, b) in [("movie.eng", "movie"), ("World", "Word"), ("abcabc", "cba")] {
            assert_eq!(similarity(a, b), similarity(b, a), "{a} / {b}");
        }
    }

    #[test]
    fn test_similarity_is_case_sensitive() {
        assert!(similarity("Movie", "movie") < 100.0);
    }

    #[test]
    fn test_similarity_counts_split_matches() {
        // "ab" is the longest common run, "d" matches to its right.
        assert_eq!(similarity("abcd", "abxd"), 75.0);
    }

    #[test]
    fn test_detect_language() {
        let detected = |name: &str| detect_language(&MediaFile::new(name, 0)).map(|l| l.name);
        assert_eq!(detected("movie.eng.srt"), Some("English"));
        assert_eq!(detected("movie.EN.srt"), Some("English"));
        assert_eq!(detected("movie.fre.srt"), Some("French"));
        assert_eq!(detected("movie.fra.srt"), Some("French"));
        assert_eq!(detected("moviex.srt"), None);
        assert_eq!(detected("frenglish.srt"), None);
    }

    #[test]
    fn test_associate_ranks_by_similarity_and_prefers_language() {
        let candidate = associate(
            movie("/movies/movie.mkv"),
            &listing(&[
                "/movies/movie.eng.srt",
                "/movies/movie.fre.srt",
                "/movies/moviex.srt",
            ]),
            &subtitle_extensions(),
            "eng",
        );

        assert_eq!(
            subtitle_names(&candidate),
            vec!["/movies/moviex.srt", "/movies/movie.eng.srt", "/movies/movie.fre.srt"]
        );
        let scores: Vec<f64> = candidate.subtitles.iter().map(|s| s.similarity).collect();
        assert!(scores.windows(2).all(|pair| pair[0] >= pair[1]));
        assert!(candidate.subtitles[0].enabled);
        assert!(!candidate.subtitles[1].enabled);

        let active = candidate.active_subtitle().expect("should have active subtitle");
        assert_eq!(active.file.path, PathBuf::from("/movies/movie.eng.srt"));
    }

    #[test]
    fn test_associate_falls_back_to_best_match() {
        let candidate = associate(
            movie("/movies/movie.mkv"),
            &listing(&["/movies/movie.fre.srt", "/movies/moviex.srt"]),
            &subtitle_extensions(),
            "eng",
        );
        assert_eq!(candidate.active_subtitle, Some(0));
        assert_eq!(
            candidate.active_subtitle().map(|s| s.file.path.clone()),
            Some(PathBuf::from("/movies/moviex.srt"))
        );
    }

    #[test]
    fn test_associate_ignores_other_directories_and_extensions() {
        let candidate = associate(
            movie("/movies/movie.mkv"),
            &listing(&[
                "/other/movie.eng.srt",
                "/movies/movie.nfo",
                "/movies/movie.mkv",
                "/movies/movie.sub",
            ]),
            &subtitle_extensions(),
            "eng",
        );
        assert_eq!(subtitle_names(&candidate), vec!["/movies/movie.sub"]);
    }

    #[test]
    fn test_associate_without_subtitles() {
        let candidate = associate(movie("/movies/movie.mkv"), &[], &subtitle_extensions(), "eng");
        assert!(candidate.subtitles.is_empty());
        assert_eq!(candidate.active_subtitle, None);
        assert!(candidate.active_subtitle().is_none());
    }
}
