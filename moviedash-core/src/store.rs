use std::{collections::HashMap, sync::Arc, thread};

use crossbeam_channel::{unbounded, Receiver, Sender};
use itertools::Itertools;
use threadpool::ThreadPool;

use crate::{
    catalog::{load_overlay, Catalog},
    data::{
        LoadStatus, LoadTicket, MovieId, MovieOverlay, MovieSummary, Promise, Snapshot, View,
    },
    error::Error,
    storage::{Storage, FAVORITES_KEY, SEEN_KEY, VIEW_KEY},
    util::Sequence,
};

const MAX_LOOKUP_THREADS: usize = 8;

/// Owner of the favorites, the seen list, the active view and the movies
/// shown for it.  Every mutation is written through to `Storage` before the
/// call returns, and pushed to subscribers as a `Snapshot`.
pub struct ViewStore {
    catalog: Arc<dyn Catalog>,
    storage: Arc<dyn Storage>,
    lookup_pool: ThreadPool,
    generation: Sequence<u64>,
    view: View,
    query: Arc<str>,
    favorites: Vec<MovieId>,
    seen: Vec<MovieId>,
    movies: Promise<Vec<MovieSummary>, LoadTicket>,
    subscribers: Vec<Sender<Snapshot>>,
    response_sender: Sender<ViewResponse>,
    response_receiver: Receiver<ViewResponse>,
}

impl ViewStore {
    pub fn new(catalog: Arc<dyn Catalog>, storage: Arc<dyn Storage>) -> Self {
        Self::with_lookup_threads(catalog, storage, MAX_LOOKUP_THREADS)
    }

    pub fn with_lookup_threads(
        catalog: Arc<dyn Catalog>,
        storage: Arc<dyn Storage>,
        lookup_threads: usize,
    ) -> Self {
        let view = load_view(storage.as_ref());
        let stored_seen = load_ids(storage.as_ref(), SEEN_KEY);
        let stored_favorites = load_ids(storage.as_ref(), FAVORITES_KEY);
        let seen = stored_seen.iter().copied().unique().collect_vec();
        // A movie already watched is not a favorite anymore.
        let favorites = stored_favorites
            .iter()
            .copied()
            .unique()
            .filter(|id| !seen.contains(id))
            .collect_vec();
        log::info!(
            "restored {} view, {} favorites, {} seen",
            view,
            favorites.len(),
            seen.len()
        );

        let (response_sender, response_receiver) = unbounded();
        let store = Self {
            catalog,
            storage,
            lookup_pool: ThreadPool::with_name("catalog_lookup".into(), lookup_threads.max(1)),
            generation: Sequence::new(0),
            view,
            query: "".into(),
            favorites,
            seen,
            movies: Promise::Empty,
            subscribers: Vec::new(),
            response_sender,
            response_receiver,
        };
        if store.seen != stored_seen {
            log::info!("rewriting cleaned up seen list");
            store.persist_ids(SEEN_KEY, &store.seen);
        }
        if store.favorites != stored_favorites {
            log::info!("rewriting cleaned up favorites");
            store.persist_ids(FAVORITES_KEY, &store.favorites);
        }
        store
    }
}

// Read access.
impl ViewStore {
    pub fn view(&self) -> View {
        self.view
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn favorites(&self) -> &[MovieId] {
        &self.favorites
    }

    pub fn seen(&self) -> &[MovieId] {
        &self.seen
    }

    /// Movies of the active view.  Empty while loading and after a failure.
    pub fn movies(&self) -> &[MovieSummary] {
        self.movies
            .resolved()
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn status(&self) -> LoadStatus {
        LoadStatus::of(&self.movies)
    }

    pub fn is_favorite(&self, id: MovieId) -> bool {
        self.favorites.contains(&id)
    }

    pub fn is_seen(&self, id: MovieId) -> bool {
        self.seen.contains(&id)
    }

    pub fn catalog(&self) -> &dyn Catalog {
        self.catalog.as_ref()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            view: self.view,
            query: self.query.clone(),
            favorites: self.favorites.clone(),
            seen: self.seen.clone(),
            movies: self.movies().to_vec(),
            status: self.status(),
        }
    }

    /// Receive a snapshot after every change.  Dropping the receiver
    /// unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<Snapshot> {
        let (sender, receiver) = unbounded();
        self.subscribers.push(sender);
        receiver
    }

    /// Everything the detail overlay needs.  Never fails, missing parts are
    /// left empty.
    pub fn overlay(&self, id: MovieId) -> MovieOverlay {
        load_overlay(self.catalog.as_ref(), id)
    }
}

// View loading.
impl ViewStore {
    /// Switch to `view` and load its movies, blocking until they arrive.
    pub fn select_view(&mut self, view: View) {
        let request = self.request_view(view);
        let response = request.run();
        self.apply(response);
    }

    pub fn search(&mut self, query: &str) {
        self.query = query.trim().into();
        self.select_view(View::Search);
    }

    /// Switch to `view` and load its movies on a worker thread.  The result
    /// arrives on `responses()` and has to be handed back through `apply()`.
    pub fn select_view_async(&mut self, view: View) -> LoadTicket {
        let request = self.request_view(view);
        let ticket = request.ticket().clone();
        let sender = self.response_sender.clone();
        thread::spawn(move || {
            if sender.send(request.run()).is_err() {
                log::warn!("view store is gone, dropping load result");
            }
        });
        ticket
    }

    pub fn search_async(&mut self, query: &str) -> LoadTicket {
        self.query = query.trim().into();
        self.select_view_async(View::Search)
    }

    pub fn responses(&self) -> Receiver<ViewResponse> {
        self.response_receiver.clone()
    }

    /// Switch the active view and hand out the load that fills it.  Only the
    /// most recently requested load can be applied.
    pub fn request_view(&mut self, view: View) -> ViewRequest {
        self.view = view;
        self.persist(VIEW_KEY, view.as_str());

        let ticket = LoadTicket {
            generation: self.generation.advance(),
            view,
            query: self.query.clone(),
        };
        let source = match view {
            View::Popular => Source::Popular,
            View::Search => Source::Search(self.query.clone()),
            View::Favorites => Source::Ids(self.favorites.clone()),
            View::Seen => Source::Ids(self.seen.clone()),
        };
        self.movies.defer(ticket.clone());
        self.notify();

        ViewRequest {
            ticket,
            source,
            catalog: self.catalog.clone(),
            lookup_pool: self.lookup_pool.clone(),
        }
    }

    /// Commit a load result.  Returns `false` if a newer load was requested
    /// in the meantime, in which case the result is dropped.
    pub fn apply(&mut self, response: ViewResponse) -> bool {
        let ViewResponse { ticket, result } = response;
        if !self.movies.is_deferred(&ticket) {
            log::info!(
                "dropping stale {} result (load #{})",
                ticket.view,
                ticket.generation
            );
            return false;
        }
        let result = match result {
            Ok(movies) => Ok(self.still_listed(ticket.view, movies)),
            Err(err) => {
                log::error!("failed to load {} view: {}", ticket.view, err);
                Err(err)
            }
        };
        self.movies.update((ticket, result));
        self.notify();
        true
    }

    /// Favorites and seen movies may have changed while their lookups were
    /// running, the lists themselves decide what is shown and in which order.
    fn still_listed(&self, view: View, movies: Vec<MovieSummary>) -> Vec<MovieSummary> {
        let ids = match view {
            View::Favorites => &self.favorites,
            View::Seen => &self.seen,
            View::Popular | View::Search => return movies,
        };
        let mut by_id: HashMap<MovieId, MovieSummary> =
            movies.into_iter().map(|movie| (movie.id, movie)).collect();
        ids.iter().filter_map(|id| by_id.remove(id)).collect()
    }
}

// Mutations.
impl ViewStore {
    pub fn toggle_favorite(&mut self, id: MovieId) {
        if remove_id(&mut self.favorites, id) {
            if self.view == View::Favorites {
                self.prune(id);
            }
        } else {
            self.favorites.push(id);
            if remove_id(&mut self.seen, id) {
                if self.view == View::Seen {
                    self.prune(id);
                }
                self.persist_ids(SEEN_KEY, &self.seen);
            }
        }
        self.persist_ids(FAVORITES_KEY, &self.favorites);
        self.notify();
    }

    pub fn mark_as_seen(&mut self, id: MovieId) {
        remove_id(&mut self.favorites, id);
        if !self.seen.contains(&id) {
            self.seen.push(id);
        }
        if self.view != View::Seen {
            self.prune(id);
        }
        self.persist_ids(FAVORITES_KEY, &self.favorites);
        self.persist_ids(SEEN_KEY, &self.seen);
        self.notify();
    }

    pub fn remove_from_favorites(&mut self, id: MovieId) {
        if !remove_id(&mut self.favorites, id) {
            return;
        }
        if self.view == View::Favorites {
            self.prune(id);
        }
        self.persist_ids(FAVORITES_KEY, &self.favorites);
        self.notify();
    }

    /// Move the favorite at `from` to `to`.  With the favorites view showing,
    /// the indices refer to the shown list and the favorites take its order.
    /// Returns `false` for out-of-range indices, which change nothing.
    pub fn reorder_favorites(&mut self, from: usize, to: usize) -> bool {
        let shown = match self.movies.resolved_mut() {
            Some(movies) if self.view == View::Favorites => Some(movies),
            _ => None,
        };
        match shown {
            Some(movies) => {
                if !move_item(movies, from, to) {
                    return false;
                }
                let shown_ids = movies.iter().map(|movie| movie.id).collect_vec();
                let not_shown = self
                    .favorites
                    .iter()
                    .filter(|id| !shown_ids.contains(id))
                    .copied()
                    .collect_vec();
                self.favorites = shown_ids
                    .into_iter()
                    .filter(|id| self.favorites.contains(id))
                    .chain(not_shown)
                    .collect();
            }
            None => {
                if !move_item(&mut self.favorites, from, to) {
                    return false;
                }
            }
        }
        self.persist_ids(FAVORITES_KEY, &self.favorites);
        self.notify();
        true
    }

    fn prune(&mut self, id: MovieId) {
        if let Some(movies) = self.movies.resolved_mut() {
            movies.retain(|movie| movie.id != id);
        }
    }

    fn persist_ids(&self, key: &str, ids: &[MovieId]) {
        match serde_json::to_string(ids) {
            Ok(json) => self.persist(key, &json),
            Err(err) => log::error!("failed to encode {}: {}", key, err),
        }
    }

    /// Storage failures never undo the in-memory change.
    fn persist(&self, key: &str, value: &str) {
        if let Err(err) = self.storage.set(key, value) {
            log::error!("failed to persist {}: {}", key, err);
        }
    }

    fn notify(&mut self) {
        if self.subscribers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        self.subscribers
            .retain(|subscriber| subscriber.send(snapshot.clone()).is_ok());
    }
}

enum Source {
    Popular,
    Search(Arc<str>),
    Ids(Vec<MovieId>),
}

/// A pending load of the movie list, detached from the store so it can run
/// on any thread.
pub struct ViewRequest {
    ticket: LoadTicket,
    source: Source,
    catalog: Arc<dyn Catalog>,
    lookup_pool: ThreadPool,
}

impl ViewRequest {
    pub fn ticket(&self) -> &LoadTicket {
        &self.ticket
    }

    pub fn run(self) -> ViewResponse {
        let result = match &self.source {
            Source::Popular => self.catalog.popular(),
            Source::Search(query) => self.catalog.search(query),
            Source::Ids(ids) => resolve_ids(&self.catalog, &self.lookup_pool, ids),
        };
        ViewResponse {
            ticket: self.ticket,
            result,
        }
    }
}

pub struct ViewResponse {
    ticket: LoadTicket,
    result: Result<Vec<MovieSummary>, Error>,
}

impl ViewResponse {
    pub fn ticket(&self) -> &LoadTicket {
        &self.ticket
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Look all `ids` up concurrently, keeping their order.  Ids the catalog no
/// longer knows are skipped, any other failure fails the whole list.
fn resolve_ids(
    catalog: &Arc<dyn Catalog>,
    pool: &ThreadPool,
    ids: &[MovieId],
) -> Result<Vec<MovieSummary>, Error> {
    let (sender, receiver) = unbounded();
    for (index, &id) in ids.iter().enumerate() {
        let catalog = catalog.clone();
        let sender = sender.clone();
        pool.execute(move || {
            let _ = sender.send((index, id, catalog.movie(id)));
        });
    }
    drop(sender);

    let mut resolved = Vec::with_capacity(ids.len());
    for (index, id, result) in receiver {
        match result {
            Ok(movie) => resolved.push((index, movie)),
            Err(err) if err.is_not_found() => {
                log::warn!("movie {} is not in the catalog anymore, skipping", id);
            }
            Err(err) => return Err(err),
        }
    }
    resolved.sort_by_key(|(index, _)| *index);
    Ok(resolved.into_iter().map(|(_, movie)| movie).collect())
}

fn load_view(storage: &dyn Storage) -> View {
    match storage.get(VIEW_KEY) {
        Ok(Some(name)) => name.parse().unwrap_or_else(|err| {
            log::warn!("ignoring stored view: {}", err);
            View::default()
        }),
        Ok(None) => View::default(),
        Err(err) => {
            log::warn!("failed to read stored view: {}", err);
            View::default()
        }
    }
}

fn load_ids(storage: &dyn Storage, key: &str) -> Vec<MovieId> {
    let json = match storage.get(key) {
        Ok(Some(json)) => json,
        Ok(None) => return Vec::new(),
        Err(err) => {
            log::warn!("failed to read stored {}: {}", key, err);
            return Vec::new();
        }
    };
    match serde_json::from_str::<Vec<MovieId>>(&json) {
        Ok(ids) => ids,
        Err(err) => {
            log::warn!("ignoring malformed stored {}: {}", key, err);
            Vec::new()
        }
    }
}

fn remove_id(ids: &mut Vec<MovieId>, id: MovieId) -> bool {
    let len = ids.len();
    ids.retain(|other| *other != id);
    ids.len() != len
}

fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= items.len() || to >= items.len() {
        return false;
    }
    let item = items.remove(from);
    items.insert(to, item);
    true
}
