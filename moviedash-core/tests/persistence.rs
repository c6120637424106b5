mod common;

use std::{fs, sync::Arc};

use common::*;
use moviedash_core::{
    data::{MovieId, View},
    error::Error,
    storage::{FileStorage, MemoryStorage, Storage, FAVORITES_KEY, SEEN_KEY, VIEW_KEY},
    store::ViewStore,
};
use parking_lot::Mutex;

fn file_store(storage: &Arc<FileStorage>) -> ViewStore {
    ViewStore::with_lookup_threads(Arc::new(library()), storage.clone(), 2)
}

#[test]
fn favorites_survive_a_restart_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FileStorage::new(dir.path().join("state")));

    let mut store = file_store(&storage);
    for id in [5, 2, 4] {
        store.toggle_favorite(MovieId(id));
    }
    store.reorder_favorites(2, 0);
    store.mark_as_seen(MovieId(1));
    drop(store);

    let store = file_store(&storage);
    assert_eq!(store.favorites(), ids(&[4, 5, 2]));
    assert_eq!(store.seen(), ids(&[1]));
    assert_eq!(
        fs::read_to_string(dir.path().join("state").join(FAVORITES_KEY)).unwrap(),
        "[4,5,2]"
    );
}

#[test]
fn active_view_is_restored() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FileStorage::new(dir.path()));

    let mut store = file_store(&storage);
    store.select_view(View::Favorites);
    drop(store);

    let store = file_store(&storage);
    assert_eq!(store.view(), View::Favorites);
}

#[test]
fn fresh_install_starts_on_popular_with_empty_lists() {
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(&Arc::new(FileStorage::new(dir.path())));

    assert_eq!(store.view(), View::Popular);
    assert!(store.favorites().is_empty());
    assert!(store.seen().is_empty());
}

#[test]
fn malformed_values_fall_back_to_defaults() {
    let storage = Arc::new(MemoryStorage::with_entries([
        (VIEW_KEY, "trending"),
        (FAVORITES_KEY, "{not json"),
        (SEEN_KEY, "[3, 7]"),
    ]));

    let store = store_with(Arc::new(library()), storage);

    assert_eq!(store.view(), View::Popular);
    assert!(store.favorites().is_empty());
    assert_eq!(store.seen(), ids(&[3, 7]));
}

#[test]
fn stored_lists_are_made_disjoint_on_load() {
    let storage = Arc::new(MemoryStorage::with_entries([
        (FAVORITES_KEY, "[1,2,2,3]"),
        (SEEN_KEY, "[2,4,2]"),
    ]));

    let store = store_with(Arc::new(library()), storage.clone());

    assert_eq!(store.favorites(), ids(&[1, 3]));
    assert_eq!(store.seen(), ids(&[2, 4]));
    assert_eq!(stored(storage.as_ref(), FAVORITES_KEY).as_deref(), Some("[1,3]"));
    assert_eq!(stored(storage.as_ref(), SEEN_KEY).as_deref(), Some("[2,4]"));
}

#[test]
fn clean_lists_are_left_as_stored() {
    let storage = Arc::new(MemoryStorage::with_entries([
        (FAVORITES_KEY, "[5, 1]"),
        (SEEN_KEY, "[2]"),
    ]));

    let store = store_with(Arc::new(library()), storage.clone());

    assert_eq!(store.favorites(), ids(&[5, 1]));
    assert_eq!(stored(storage.as_ref(), FAVORITES_KEY).as_deref(), Some("[5, 1]"));
    assert_eq!(stored(storage.as_ref(), SEEN_KEY).as_deref(), Some("[2]"));
}

#[test]
fn search_view_without_query_shows_popular_after_restart() {
    let storage = Arc::new(MemoryStorage::with_entries([(VIEW_KEY, "search")]));
    let mut store = store_with(Arc::new(library()), storage);
    assert_eq!(store.view(), View::Search);
    assert_eq!(store.query(), "");

    store.select_view(View::Search);
    assert_eq!(store.movies().len(), 5);
}

/// Storage that rejects every write.
#[derive(Default)]
struct ReadOnlyStorage {
    attempts: Mutex<Vec<String>>,
}

impl Storage for ReadOnlyStorage {
    fn get(&self, _key: &str) -> Result<Option<String>, Error> {
        Ok(None)
    }

    fn set(&self, key: &str, _value: &str) -> Result<(), Error> {
        self.attempts.lock().push(key.to_string());
        Err(Error::StorageError("read-only file system".into()))
    }
}

#[test]
fn failed_writes_keep_the_change_in_memory() {
    let storage = Arc::new(ReadOnlyStorage::default());
    let mut store = ViewStore::with_lookup_threads(Arc::new(library()), storage.clone(), 2);

    store.toggle_favorite(MovieId(1));
    store.toggle_favorite(MovieId(2));
    store.mark_as_seen(MovieId(2));
    store.select_view(View::Favorites);

    assert_eq!(store.favorites(), ids(&[1]));
    assert_eq!(store.seen(), ids(&[2]));
    assert_eq!(titles(store.movies()), ["Cidade de Deus"]);
    assert!(storage.attempts.lock().contains(&FAVORITES_KEY.to_string()));
}

#[test]
fn every_mutation_is_written_before_returning() {
    let storage = Arc::new(MemoryStorage::new());
    let mut store = store_with(Arc::new(library()), storage.clone());

    store.toggle_favorite(MovieId(3));
    assert_eq!(stored(storage.as_ref(), FAVORITES_KEY).as_deref(), Some("[3]"));

    store.remove_from_favorites(MovieId(3));
    assert_eq!(stored(storage.as_ref(), FAVORITES_KEY).as_deref(), Some("[]"));

    store.mark_as_seen(MovieId(4));
    assert_eq!(stored(storage.as_ref(), SEEN_KEY).as_deref(), Some("[4]"));
}
