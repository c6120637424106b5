use std::{fmt, str::FromStr, sync::Arc};

use crate::data::{MovieId, MovieSummary, Promise};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum View {
    #[default]
    Popular,
    Favorites,
    Seen,
    Search,
}

impl View {
    pub const ALL: [View; 4] = [View::Popular, View::Favorites, View::Seen, View::Search];

    pub fn as_str(self) -> &'static str {
        match self {
            View::Popular => "popular",
            View::Favorites => "favorites",
            View::Seen => "seen",
            View::Search => "search",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        View::ALL
            .into_iter()
            .find(|view| view.as_str() == s.trim())
            .ok_or_else(|| format!("unknown view: {s:?}"))
    }
}

/// Identifies one load of the movie list.  A result is only committed while
/// the list is still deferred on the same ticket.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LoadTicket {
    pub generation: u64,
    pub view: View,
    pub query: Arc<str>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LoadStatus {
    Idle,
    Loading,
    Ready,
    Failed(Arc<str>),
}

impl LoadStatus {
    pub fn of(movies: &Promise<Vec<MovieSummary>, LoadTicket>) -> Self {
        match movies {
            Promise::Empty => LoadStatus::Idle,
            Promise::Deferred(_) => LoadStatus::Loading,
            Promise::Resolved(_) => LoadStatus::Ready,
            Promise::Rejected(err) => LoadStatus::Failed(err.to_string().into()),
        }
    }
}

/// Owned copy of the store state, handed out to the presentation side.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub view: View,
    pub query: Arc<str>,
    pub favorites: Vec<MovieId>,
    pub seen: Vec<MovieId>,
    pub movies: Vec<MovieSummary>,
    pub status: LoadStatus,
}

impl Snapshot {
    pub fn is_favorite(&self, id: MovieId) -> bool {
        self.favorites.contains(&id)
    }

    pub fn is_seen(&self, id: MovieId) -> bool {
        self.seen.contains(&id)
    }
}
