mod tmdb;

use std::{ops::RangeInclusive, sync::Arc};

pub use tmdb::TmdbCatalog;

use crate::{
    data::{Genre, MovieDetail, MovieId, MovieImages, MovieOverlay, MovieSummary},
    error::Error,
};

/// Number of movies a list view shows.
pub const PAGE_SIZE: usize = 18;

/// Popular titles are drawn from a random page in this range.
pub const POPULAR_PAGES: RangeInclusive<u32> = 1..=50;

/// Rating reported when the catalog has none for the region ("livre").
pub const DEFAULT_CERTIFICATION: &str = "L";

pub const MAX_BACKDROPS: usize = 5;

pub const MAX_TOP_CAST: usize = 5;

/// Read-only access to the movie catalog.
pub trait Catalog: Send + Sync {
    /// A pseudo-random page of popular titles, at most `PAGE_SIZE` long.
    /// Two calls are not expected to return the same movies.
    fn popular(&self) -> Result<Vec<MovieSummary>, Error>;

    /// Free-text title search with a non-empty, trimmed query.
    fn search_titles(&self, query: &str) -> Result<Vec<MovieSummary>, Error>;

    fn movie(&self, id: MovieId) -> Result<MovieSummary, Error>;

    fn details(&self, id: MovieId) -> Result<MovieDetail, Error>;

    /// The movie's poster and up to `MAX_BACKDROPS` backdrops, in catalog
    /// order.
    fn images(&self, id: MovieId) -> Result<MovieImages, Error>;

    /// Regional content rating.  Never fails: falls back to
    /// `DEFAULT_CERTIFICATION`.
    fn certification(&self, id: MovieId) -> Arc<str>;

    fn genres(&self) -> Result<Vec<Genre>, Error>;

    /// Title search; a blank query shows the popular titles instead.
    fn search(&self, query: &str) -> Result<Vec<MovieSummary>, Error> {
        let query = query.trim();
        if query.is_empty() {
            self.popular()
        } else {
            self.search_titles(query)
        }
    }
}

/// Everything the detail overlay shows for one movie.  Parts that fail to
/// load are left empty.
pub fn load_overlay(catalog: &dyn Catalog, id: MovieId) -> MovieOverlay {
    let images = catalog.images(id).unwrap_or_else(|err| {
        log::error!("failed to load images for movie {}: {}", id, err);
        MovieImages::default()
    });
    let certification = catalog.certification(id);
    let details = match catalog.details(id) {
        Ok(details) => Some(details),
        Err(err) => {
            log::error!("failed to load details for movie {}: {}", id, err);
            None
        }
    };
    MovieOverlay {
        details,
        images,
        certification,
    }
}
