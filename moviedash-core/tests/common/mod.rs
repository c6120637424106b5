//! Shared catalog stub and store helpers.

#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use moviedash_core::{
    catalog::{Catalog, DEFAULT_CERTIFICATION},
    data::{Genre, MovieDetail, MovieId, MovieImages, MovieSummary},
    error::Error,
    storage::{MemoryStorage, Storage},
    store::ViewStore,
};
use parking_lot::Mutex;

pub fn movie(id: u64, title: &str) -> MovieSummary {
    MovieSummary {
        id: MovieId(id),
        title: title.into(),
        poster_path: Some(format!("/poster{id}.jpg").into()),
        release_date: "2001-01-01".into(),
        vote_average: 7.5,
        overview: format!("About {title}").into(),
    }
}

pub fn ids(ids: &[u64]) -> Vec<MovieId> {
    ids.iter().copied().map(MovieId).collect()
}

pub fn titles(movies: &[MovieSummary]) -> Vec<String> {
    movies.iter().map(|movie| movie.title.to_string()).collect()
}

/// In-memory catalog.  Ids marked broken fail with a network error, ids not
/// in `movies` are reported as not found.
#[derive(Default)]
pub struct StubCatalog {
    pub movies: HashMap<MovieId, MovieSummary>,
    pub popular: Vec<MovieSummary>,
    pub search_results: HashMap<String, Vec<MovieSummary>>,
    pub broken: Mutex<HashSet<MovieId>>,
    pub offline: Mutex<bool>,
    pub lookups: Mutex<Vec<MovieId>>,
    pub searches: Mutex<Vec<String>>,
}

impl StubCatalog {
    pub fn with_movies(movies: &[(u64, &str)]) -> Self {
        let movies: Vec<MovieSummary> = movies.iter().map(|(id, title)| movie(*id, title)).collect();
        Self {
            popular: movies.clone(),
            movies: movies.into_iter().map(|movie| (movie.id, movie)).collect(),
            ..Self::default()
        }
    }

    pub fn search_result(mut self, query: &str, result: &[u64]) -> Self {
        let found = result
            .iter()
            .filter_map(|id| self.movies.get(&MovieId(*id)).cloned())
            .collect();
        self.search_results.insert(query.to_string(), found);
        self
    }

    pub fn break_movie(&self, id: u64) {
        self.broken.lock().insert(MovieId(id));
    }

    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock() = offline;
    }

    fn check_online(&self) -> Result<(), Error> {
        if *self.offline.lock() {
            Err(Error::NetworkError("catalog unreachable".into()))
        } else {
            Ok(())
        }
    }
}

impl Catalog for StubCatalog {
    fn popular(&self) -> Result<Vec<MovieSummary>, Error> {
        self.check_online()?;
        Ok(self.popular.clone())
    }

    fn search_titles(&self, query: &str) -> Result<Vec<MovieSummary>, Error> {
        self.check_online()?;
        self.searches.lock().push(query.to_string());
        Ok(self.search_results.get(query).cloned().unwrap_or_default())
    }

    fn movie(&self, id: MovieId) -> Result<MovieSummary, Error> {
        self.lookups.lock().push(id);
        self.check_online()?;
        if self.broken.lock().contains(&id) {
            return Err(Error::NetworkError(format!("lookup of {id} timed out").into()));
        }
        self.movies.get(&id).cloned().ok_or(Error::NotFound)
    }

    fn details(&self, id: MovieId) -> Result<MovieDetail, Error> {
        let summary = self.movie(id)?;
        Ok(MovieDetail {
            summary,
            runtime: Some(101),
            genres: vec![Genre {
                id: 18,
                name: "Drama".into(),
            }],
            top_cast: Vec::new(),
            streaming_providers: Vec::new(),
            watch_link: None,
        })
    }

    fn images(&self, id: MovieId) -> Result<MovieImages, Error> {
        let summary = self.movie(id)?;
        Ok(MovieImages {
            poster: summary.poster_path,
            backdrops: vec![format!("/backdrop{id}.jpg").into()],
        })
    }

    fn certification(&self, id: MovieId) -> Arc<str> {
        match self.movie(id) {
            Ok(_) => "14".into(),
            Err(_) => DEFAULT_CERTIFICATION.into(),
        }
    }

    fn genres(&self) -> Result<Vec<Genre>, Error> {
        self.check_online()?;
        Ok(Vec::new())
    }
}

pub fn library() -> StubCatalog {
    StubCatalog::with_movies(&[
        (1, "Cidade de Deus"),
        (2, "Central do Brasil"),
        (3, "Tropa de Elite"),
        (4, "O Auto da Compadecida"),
        (5, "Bacurau"),
    ])
}

pub fn store_with(catalog: Arc<StubCatalog>, storage: Arc<MemoryStorage>) -> ViewStore {
    ViewStore::with_lookup_threads(catalog, storage, 4)
}

pub fn fresh_store() -> (ViewStore, Arc<StubCatalog>, Arc<MemoryStorage>) {
    let catalog = Arc::new(library());
    let storage = Arc::new(MemoryStorage::new());
    (store_with(catalog.clone(), storage.clone()), catalog, storage)
}

pub fn stored(storage: &dyn Storage, key: &str) -> Option<String> {
    storage.get(key).unwrap()
}
