use anyhow::{Context, Result};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;

const BASE_URL: &str = "https://api.themoviedb.org/3";

/// A TV show returned by a search.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ShowResult {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub origin_country: Vec<String>,
}

/// A movie returned by a search.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MovieResult {
    pub id: i32,
    pub title: String,
    #[serde(default)]
    pub release_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EpisodeDetail {
    pub id: i32,
    pub season_number: i32,
    pub episode_number: i32,
    pub name: String,
    #[serde(default)]
    pub air_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MovieDetail {
    pub id: i32,
    #[serde(default)]
    pub imdb_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchPage<T> {
    results: Vec<T>,
}

/// One search hit, show or movie.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchResult {
    Show(ShowResult),
    Movie(MovieResult),
}

impl SearchResult {
    pub fn id(&self) -> i32 {
        match self {
            SearchResult::Show(show) => show.id,
            SearchResult::Movie(movie) => movie.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            SearchResult::Show(show) => &show.name,
            SearchResult::Movie(movie) => &movie.title,
        }
    }

    pub fn date(&self) -> Option<&str> {
        match self {
            SearchResult::Show(show) => show.first_air_date.as_deref(),
            SearchResult::Movie(movie) => movie.release_date.as_deref(),
        }
        .filter(|date| !date.is_empty())
    }

    pub fn year(&self) -> Option<i32> {
        parse_year(self.date())
    }
}

/// Year from a `YYYY-MM-DD` date.
pub fn parse_year(date: Option<&str>) -> Option<i32> {
    date?.split('-').next().and_then(|year| year.parse().ok())
}

/// Remote metadata lookups.
#[allow(async_fn_in_trait)]
pub trait MetadataApi {
    async fn search_shows(&self, query: &str) -> Result<Vec<ShowResult>>;

    async fn search_movies(&self, query: &str) -> Result<Vec<MovieResult>>;

    async fn episode(&self, show_id: i32, season: i32, episode: i32) -> Result<EpisodeDetail>;

    async fn movie(&self, movie_id: i32) -> Result<MovieDetail>;
}

pub struct TmdbClient {
    client: reqwest::Client,
    token: String,
}

impl TmdbClient {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            token: std::env::var("TMDB_API_TOKEN").context("TMDB_API_TOKEN is not set")?,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}/{}", BASE_URL, path);
        debug!("TMDB request {url} {query:?}");
        Ok(self
            .client
            .get(&url)
            .query(query)
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }
}

impl MetadataApi for TmdbClient {
    async fn search_shows(&self, query: &str) -> Result<Vec<ShowResult>> {
        let page: SearchPage<ShowResult> = self.get("search/tv", &[("query", query)]).await?;
        Ok(page.results)
    }

    async fn search_movies(&self, query: &str) -> Result<Vec<MovieResult>> {
        let page: SearchPage<MovieResult> = self.get("search/movie", &[("query", query)]).await?;
        Ok(page.results)
    }

    async fn episode(&self, show_id: i32, season: i32, episode: i32) -> Result<EpisodeDetail> {
        self.get(
            &format!("tv/{}/season/{}/episode/{}", show_id, season, episode),
            &[],
        )
        .await
    }

    async fn movie(&self, movie_id: i32) -> Result<MovieDetail> {
        self.get(&format!("movie/{}", movie_id), &[]).await
    }
}
