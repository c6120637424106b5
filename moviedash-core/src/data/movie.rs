use std::{fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::data::utils::{
    self, default_str, deserialize_null_arc_str, deserialize_null_f64, NOT_AVAILABLE,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct MovieId(pub u64);

impl fmt::Display for MovieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for MovieId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<u64> for MovieId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct MovieSummary {
    pub id: MovieId,
    #[serde(default = "default_str")]
    #[serde(deserialize_with = "deserialize_null_arc_str")]
    pub title: Arc<str>,
    #[serde(default)]
    pub poster_path: Option<Arc<str>>,
    #[serde(default = "default_str")]
    #[serde(deserialize_with = "deserialize_null_arc_str")]
    pub release_date: Arc<str>,
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_null_f64")]
    pub vote_average: f64,
    #[serde(default = "default_str")]
    #[serde(deserialize_with = "deserialize_null_arc_str")]
    pub overview: Arc<str>,
}

impl MovieSummary {
    pub fn release_year(&self) -> Option<&str> {
        self.release_date
            .get(..4)
            .filter(|year| year.chars().all(|c| c.is_ascii_digit()))
    }

    pub fn release_date_display(&self) -> String {
        utils::format_date(&self.release_date)
    }

    pub fn rating_display(&self) -> String {
        format!("{:.1}", self.vote_average)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct Genre {
    pub id: u64,
    pub name: Arc<str>,
}

#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct CastMember {
    pub id: u64,
    pub name: Arc<str>,
    #[serde(default = "default_str")]
    #[serde(deserialize_with = "deserialize_null_arc_str")]
    pub character: Arc<str>,
}

#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct StreamingProvider {
    #[serde(rename = "provider_id")]
    pub id: u64,
    #[serde(rename = "provider_name")]
    pub name: Arc<str>,
    #[serde(default)]
    pub logo_path: Option<Arc<str>>,
}

const PROVIDER_SEARCH_LINKS: &[(&str, &str)] = &[
    ("Netflix", "https://www.netflix.com/search?q="),
    (
        "Amazon Prime Video",
        "https://www.primevideo.com/search/ref=atv_nb_sr?phrase=",
    ),
    ("Disney Plus", "https://www.disneyplus.com/search?q="),
    ("Max", "https://play.max.com/search?q="),
    ("Star Plus", "https://www.starplus.com/search?q="),
    ("Apple TV Plus", "https://tv.apple.com/br/search?term="),
    ("Globoplay", "https://globoplay.globo.com/busca/?q="),
];

impl StreamingProvider {
    /// Deep link into the provider's own search, for the providers we know.
    pub fn search_url(&self, title: &str) -> Option<String> {
        PROVIDER_SEARCH_LINKS
            .iter()
            .find(|(name, _)| *name == &*self.name)
            .map(|(_, base)| {
                let encoded: String = url::form_urlencoded::byte_serialize(title.as_bytes()).collect();
                format!("{base}{encoded}")
            })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MovieDetail {
    pub summary: MovieSummary,
    pub runtime: Option<u32>,
    pub genres: Vec<Genre>,
    pub top_cast: Vec<CastMember>,
    pub streaming_providers: Vec<StreamingProvider>,
    pub watch_link: Option<Arc<str>>,
}

impl MovieDetail {
    pub fn runtime_display(&self) -> String {
        utils::format_runtime(self.runtime)
    }

    pub fn genre_names(&self) -> String {
        utils::join_names(self.genres.iter().map(|genre| &*genre.name))
    }

    pub fn cast_names(&self) -> String {
        utils::join_names(self.top_cast.iter().map(|member| &*member.name))
    }

    pub fn is_streamable(&self) -> bool {
        !self.streaming_providers.is_empty() && self.watch_link.is_some()
    }
}

/// Gallery of one movie: its own poster, then a few backdrops.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MovieImages {
    pub poster: Option<Arc<str>>,
    pub backdrops: Vec<Arc<str>>,
}

impl MovieImages {
    /// Image paths in display order.
    pub fn paths(&self) -> Vec<Arc<str>> {
        self.poster.iter().chain(&self.backdrops).cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.poster.is_none() && self.backdrops.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MovieOverlay {
    pub details: Option<MovieDetail>,
    pub images: MovieImages,
    pub certification: Arc<str>,
}

impl MovieOverlay {
    pub fn info_line(&self) -> String {
        match &self.details {
            Some(details) => format!(
                "{} | {} | {}",
                details.summary.release_date_display(),
                details.runtime_display(),
                details.genre_names()
            ),
            None => NOT_AVAILABLE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_tolerates_nulls_and_missing_fields() {
        let movie: MovieSummary = serde_json::from_str(
            r#"{"id": 42, "title": "Alien", "poster_path": null, "overview": null, "adult": false}"#,
        )
        .unwrap();
        assert_eq!(movie.id, MovieId(42));
        assert_eq!(&*movie.title, "Alien");
        assert_eq!(movie.poster_path, None);
        assert_eq!(&*movie.release_date, "");
        assert_eq!(&*movie.overview, "");
        assert_eq!(movie.vote_average, 0.0);
        assert_eq!(movie.release_year(), None);
    }

    #[test]
    fn summary_derived_fields() {
        let movie: MovieSummary = serde_json::from_str(
            r#"{"id": 1, "title": "Heat", "release_date": "1995-12-15", "vote_average": 7.94}"#,
        )
        .unwrap();
        assert_eq!(movie.release_year(), Some("1995"));
        assert_eq!(movie.release_date_display(), "15/12/1995");
        assert_eq!(movie.rating_display(), "7.9");
    }

    #[test]
    fn movie_id_encodes_as_bare_integer() {
        let ids = vec![MovieId(3), MovieId(1)];
        assert_eq!(serde_json::to_string(&ids).unwrap(), "[3,1]");
        assert_eq!(" 17 ".parse::<MovieId>().unwrap(), MovieId(17));
    }

    #[test]
    fn known_providers_get_search_links() {
        let netflix = StreamingProvider {
            id: 8,
            name: "Netflix".into(),
            logo_path: None,
        };
        assert_eq!(
            netflix.search_url("Cidade de Deus").as_deref(),
            Some("https://www.netflix.com/search?q=Cidade+de+Deus")
        );

        let other = StreamingProvider {
            id: 99,
            name: "Somewhere".into(),
            logo_path: None,
        };
        assert_eq!(other.search_url("Heat"), None);
    }
}
