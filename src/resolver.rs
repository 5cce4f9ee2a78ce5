//! Lookup wrappers that turn every remote failure into "no result".

use tracing::{info, warn};

use crate::candidate::MediaCandidate;
use crate::tmdb::{EpisodeDetail, MetadataApi, MovieDetail, SearchResult};

pub struct EpisodeResolver<'a, A> {
    api: &'a A,
}

impl<'a, A: MetadataApi> EpisodeResolver<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// Search shows by the candidate's name, in API order.
    pub async fn search(&self, candidate: &MediaCandidate) -> Vec<SearchResult> {
        match self.api.search_shows(&candidate.name).await {
            Ok(shows) => {
                info!("Found {} show(s) for '{}'", shows.len(), candidate.name);
                shows.into_iter().map(SearchResult::Show).collect()
            }
            Err(error) => {
                warn!("Show search for '{}' failed: {error:#}", candidate.name);
                Vec::new()
            }
        }
    }

    /// Load the candidate's season and episode from the selected show.
    pub async fn resolve_single(
        &self,
        candidate: &MediaCandidate,
        selected: &SearchResult,
    ) -> Option<EpisodeDetail> {
        let episode = candidate.episode()?;
        let SearchResult::Show(show) = selected else {
            return None;
        };
        match self
            .api
            .episode(show.id, episode.season_number, episode.episode_number_start)
            .await
        {
            Ok(detail) => Some(detail),
            Err(error) => {
                warn!(
                    "Episode {} of show {} could not be loaded: {error:#}",
                    episode.episode_id(),
                    show.id
                );
                None
            }
        }
    }
}

pub struct MovieResolver<'a, A> {
    api: &'a A,
}

impl<'a, A: MetadataApi> MovieResolver<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// Search movies by the candidate's name, in API order.
    pub async fn search(&self, candidate: &MediaCandidate) -> Vec<SearchResult> {
        match self.api.search_movies(&candidate.name).await {
            Ok(movies) => {
                info!("Found {} movie(s) for '{}'", movies.len(), candidate.name);
                movies.into_iter().map(SearchResult::Movie).collect()
            }
            Err(error) => {
                warn!("Movie search for '{}' failed: {error:#}", candidate.name);
                Vec::new()
            }
        }
    }

    pub async fn detail(&self, selected: &SearchResult) -> Option<MovieDetail> {
        let SearchResult::Movie(movie) = selected else {
            return None;
        };
        match self.api.movie(movie.id).await {
            Ok(detail) => Some(detail),
            Err(error) => {
                warn!("Movie {} could not be loaded: {error:#}", movie.id);
                None
            }
        }
    }
}
