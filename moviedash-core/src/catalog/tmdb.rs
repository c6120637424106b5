use std::{collections::HashMap, fmt::Display, sync::Arc};

use rand::Rng;
use serde::{de::DeserializeOwned, Deserialize};
use ureq::Agent;
use url::Url;

use crate::{
    catalog::{
        Catalog, DEFAULT_CERTIFICATION, MAX_BACKDROPS, MAX_TOP_CAST, PAGE_SIZE, POPULAR_PAGES,
    },
    config::Config,
    data::{
        utils::deserialize_null_vec, CastMember, Genre, MovieDetail, MovieId, MovieImages,
        MovieSummary, StreamingProvider,
    },
    error::Error,
    util::default_ureq_agent_builder,
};

/// Blocking client for the TMDB v3 API.
pub struct TmdbCatalog {
    agent: Agent,
    api_base: String,
    api_key: String,
    language: String,
    region: String,
}

impl TmdbCatalog {
    pub fn new(config: &Config, proxy_url: Option<&str>) -> Result<Self, Error> {
        let api_key = config.api_key().ok_or_else(|| {
            Error::ConfigError(
                "missing TMDB API key, set TMDB_API_KEY or `api_key` in config.json".to_string(),
            )
        })?;
        // Fail early on a base URL we would never be able to join onto.
        Url::parse(&config.api_base)?;

        let agent = default_ureq_agent_builder(config.timeout(), proxy_url);
        Ok(Self {
            agent: agent.build().into(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            language: config.language.clone(),
            region: config.region.clone(),
        })
    }

    /// Send a GET request and return the deserialized JSON body.
    fn load<T: DeserializeOwned>(&self, request: &RequestBuilder) -> Result<T, Error> {
        let url = request.build(&self.api_base, &self.api_key, &self.language)?;
        log::debug!("catalog request: {}", request);
        let mut response = self
            .agent
            .get(url.as_str())
            .header("Accept", "application/json")
            .call()?;
        Ok(response.body_mut().read_json()?)
    }

    fn load_page(&self, request: &RequestBuilder) -> Result<Vec<MovieSummary>, Error> {
        let page: Page = self.load(request)?;
        Ok(page.into_movies())
    }

    fn try_certification(&self, id: MovieId) -> Result<Option<Arc<str>>, Error> {
        let request = RequestBuilder::new(format!("movie/{}/release_dates", id));
        let result: ReleaseDates = self.load(&request)?;
        Ok(first_certification(&result.results, &self.region))
    }
}

impl Catalog for TmdbCatalog {
    // https://developer.themoviedb.org/reference/movie-popular-list
    fn popular(&self) -> Result<Vec<MovieSummary>, Error> {
        let page = rand::rng().random_range(POPULAR_PAGES);
        let request = RequestBuilder::new("movie/popular").query("page", page);
        self.load_page(&request)
    }

    // https://developer.themoviedb.org/reference/search-movie
    fn search_titles(&self, query: &str) -> Result<Vec<MovieSummary>, Error> {
        let request = RequestBuilder::new("search/movie")
            .query("query", query)
            .query("page", 1);
        self.load_page(&request)
    }

    // https://developer.themoviedb.org/reference/movie-details
    fn movie(&self, id: MovieId) -> Result<MovieSummary, Error> {
        self.load(&RequestBuilder::new(format!("movie/{}", id)))
    }

    fn details(&self, id: MovieId) -> Result<MovieDetail, Error> {
        let request = RequestBuilder::new(format!("movie/{}", id))
            .query("append_to_response", "credits,watch/providers");
        let result: ApiMovieDetail = self.load(&request)?;
        Ok(result.into_detail(&self.region))
    }

    // https://developer.themoviedb.org/reference/movie-images
    fn images(&self, id: MovieId) -> Result<MovieImages, Error> {
        // Backdrops mostly carry no language, so they would be filtered out
        // by the language preference alone.
        let language = self.language.split('-').next().unwrap_or("en");
        let request = RequestBuilder::new(format!("movie/{}", id))
            .query("append_to_response", "images")
            .query("include_image_language", format!("{},null", language));
        let result: ApiMovieImages = self.load(&request)?;
        Ok(result.into_images())
    }

    // https://developer.themoviedb.org/reference/movie-release-dates
    fn certification(&self, id: MovieId) -> Arc<str> {
        match self.try_certification(id) {
            Ok(Some(certification)) => certification,
            Ok(None) => DEFAULT_CERTIFICATION.into(),
            Err(err) => {
                log::error!("failed to load certification for movie {}: {}", id, err);
                DEFAULT_CERTIFICATION.into()
            }
        }
    }

    // https://developer.themoviedb.org/reference/genre-movie-list
    fn genres(&self) -> Result<Vec<Genre>, Error> {
        #[derive(Deserialize)]
        struct Genres {
            genres: Vec<Genre>,
        }

        let result: Genres = self.load(&RequestBuilder::new("genre/movie/list"))?;
        Ok(result.genres)
    }
}

#[derive(Deserialize)]
struct Page {
    #[serde(default)]
    results: Vec<MovieSummary>,
}

impl Page {
    fn into_movies(self) -> Vec<MovieSummary> {
        let mut movies = self.results;
        movies.truncate(PAGE_SIZE);
        movies
    }
}

#[derive(Deserialize)]
struct ApiMovieDetail {
    #[serde(flatten)]
    summary: MovieSummary,
    runtime: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_null_vec")]
    genres: Vec<Genre>,
    credits: Option<ApiCredits>,
    #[serde(rename = "watch/providers")]
    watch_providers: Option<ApiWatchProviders>,
}

#[derive(Deserialize)]
struct ApiCredits {
    #[serde(default, deserialize_with = "deserialize_null_vec")]
    cast: Vec<CastMember>,
}

#[derive(Deserialize)]
struct ApiWatchProviders {
    #[serde(default)]
    results: HashMap<String, ApiRegionProviders>,
}

#[derive(Deserialize)]
struct ApiRegionProviders {
    link: Option<Arc<str>>,
    #[serde(default, deserialize_with = "deserialize_null_vec")]
    flatrate: Vec<StreamingProvider>,
}

impl ApiMovieDetail {
    fn into_detail(self, region: &str) -> MovieDetail {
        let mut top_cast = self.credits.map(|credits| credits.cast).unwrap_or_default();
        top_cast.truncate(MAX_TOP_CAST);

        let (streaming_providers, watch_link) = self
            .watch_providers
            .and_then(|mut providers| providers.results.remove(region))
            .map(|region| (region.flatrate, region.link))
            .unwrap_or_default();

        MovieDetail {
            summary: self.summary,
            runtime: self.runtime.filter(|&minutes| minutes > 0),
            genres: self.genres,
            top_cast,
            streaming_providers,
            watch_link,
        }
    }
}

#[derive(Deserialize)]
struct ApiMovieImages {
    #[serde(default)]
    poster_path: Option<Arc<str>>,
    #[serde(default)]
    images: Option<ApiImages>,
}

#[derive(Default, Deserialize)]
struct ApiImages {
    #[serde(default, deserialize_with = "deserialize_null_vec")]
    posters: Vec<ApiImage>,
    #[serde(default, deserialize_with = "deserialize_null_vec")]
    backdrops: Vec<ApiImage>,
}

#[derive(Deserialize)]
struct ApiImage {
    file_path: Arc<str>,
}

impl ApiMovieImages {
    fn into_images(self) -> MovieImages {
        let images = self.images.unwrap_or_default();
        // Posters are usually tagged with another language and filtered out,
        // the movie's own poster comes first regardless.
        let poster = self
            .poster_path
            .filter(|path| !path.is_empty())
            .or_else(|| images.posters.into_iter().next().map(|image| image.file_path));
        let backdrops = images
            .backdrops
            .into_iter()
            .take(MAX_BACKDROPS)
            .map(|image| image.file_path)
            .collect();
        MovieImages { poster, backdrops }
    }
}

#[derive(Deserialize)]
struct ReleaseDates {
    #[serde(default)]
    results: Vec<RegionReleases>,
}

#[derive(Deserialize)]
struct RegionReleases {
    iso_3166_1: String,
    #[serde(default)]
    release_dates: Vec<Release>,
}

#[derive(Deserialize)]
struct Release {
    #[serde(default)]
    certification: Option<Arc<str>>,
}

fn first_certification(results: &[RegionReleases], region: &str) -> Option<Arc<str>> {
    results
        .iter()
        .find(|result| result.iso_3166_1 == region)?
        .release_dates
        .iter()
        .filter_map(|release| release.certification.clone())
        .find(|certification| !certification.trim().is_empty())
}

/// Relative catalog path plus query parameters.  The API key and language
/// are attached when the URL is built.
#[derive(Debug, Clone)]
struct RequestBuilder {
    path: String,
    queries: Vec<(String, String)>,
}

impl RequestBuilder {
    fn new(path: impl Display) -> Self {
        Self {
            path: path.to_string(),
            queries: Vec::new(),
        }
    }

    fn query(mut self, key: impl Display, value: impl Display) -> Self {
        self.queries.push((key.to_string(), value.to_string()));
        self
    }

    fn build(&self, base: &str, api_key: &str, language: &str) -> Result<Url, Error> {
        let params = [("api_key", api_key), ("language", language)]
            .into_iter()
            .chain(self.queries.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        Ok(Url::parse_with_params(
            &format!("{}/{}", base, self.path),
            params,
        )?)
    }
}

impl Display for RequestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)?;
        for (i, (key, value)) in self.queries.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{key}={value}")?;
        }
        Ok(())
    }
}
