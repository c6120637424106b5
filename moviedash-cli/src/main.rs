use std::{io, io::BufRead, process, sync::Arc, thread};

use crossbeam_channel::{select, unbounded, Receiver};
use env_logger::{Builder, Env};
use moviedash_core::{
    catalog::{Catalog, TmdbCatalog},
    config::{Config, BACKDROP_SIZE, LOGO_SIZE, POSTER_SIZE},
    data::{LoadStatus, MovieId, MovieOverlay, Snapshot, View},
    error::Error,
    storage::FileStorage,
    store::ViewStore,
};

const ENV_LOG: &str = "MOVIEDASH_LOG";
const ENV_LOG_STYLE: &str = "MOVIEDASH_LOG_STYLE";

const HELP: &str = "\
commands:
  popular | favorites | seen   switch view
  search [query]               search titles, blank shows popular
  fav <id>                     toggle favorite
  watched <id>                 mark as seen
  rm <id>                      remove from favorites
  move <from> <to>             reorder favorites by list position
  info <id>                    show details
  genres                       list genres
  list                         print the current view again
  quit";

fn main() {
    // Setup logging from the env variables, with defaults.
    Builder::from_env(
        Env::new()
            .filter_or(ENV_LOG, "info")
            .write_style(ENV_LOG_STYLE),
    )
    .init();

    let config = Config::load().unwrap_or_default();
    if let Err(err) = start(config) {
        log::error!("{}", err);
        process::exit(1);
    }
}

fn start(config: Config) -> Result<(), Error> {
    let catalog = TmdbCatalog::new(&config, Config::proxy().as_deref())?;
    let data_dir = Config::data_dir()
        .ok_or_else(|| Error::ConfigError("no data directory".to_string()))?;
    log::info!("keeping lists in {:?}", data_dir);

    let mut store = ViewStore::with_lookup_threads(
        Arc::new(catalog),
        Arc::new(FileStorage::new(data_dir)),
        config.lookup_threads,
    );
    let updates = store.subscribe();
    let responses = store.responses();
    let lines = read_lines();

    store.select_view_async(store.view());

    loop {
        select! {
            recv(lines) -> line => match line {
                Ok(line) => match line.parse::<Command>() {
                    Ok(Command::Quit) => break,
                    Ok(command) => run(&mut store, &config, command),
                    Err(err) => println!("{err}"),
                },
                Err(_) => break,
            },
            recv(responses) -> response => {
                if let Ok(response) = response {
                    store.apply(response);
                }
            },
            recv(updates) -> snapshot => {
                if let Ok(snapshot) = snapshot {
                    print_snapshot(&snapshot);
                }
            },
        }
    }
    Ok(())
}

fn read_lines() -> Receiver<String> {
    let (sender, receiver) = unbounded();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if sender.send(line).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    log::error!("failed to read input: {}", err);
                    break;
                }
            }
        }
    });
    receiver
}

enum Command {
    Show(View),
    Search(String),
    Favorite(MovieId),
    Watched(MovieId),
    Remove(MovieId),
    Move(usize, usize),
    Info(MovieId),
    Genres,
    List,
    Help,
    Quit,
}

impl std::str::FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        let id = || {
            rest.parse::<MovieId>()
                .map_err(|_| format!("expected a movie id, got {rest:?}"))
        };
        // Positions are shown starting at 1.
        let position = |arg: Option<&str>| {
            arg.and_then(|arg| arg.parse::<usize>().ok())
                .and_then(|pos| pos.checked_sub(1))
                .ok_or_else(|| "usage: move <from> <to>".to_string())
        };

        match name {
            "popular" => Ok(Self::Show(View::Popular)),
            "favorites" => Ok(Self::Show(View::Favorites)),
            "seen" => Ok(Self::Show(View::Seen)),
            "search" => Ok(Self::Search(rest.to_string())),
            "fav" => id().map(Self::Favorite),
            "watched" => id().map(Self::Watched),
            "rm" => id().map(Self::Remove),
            "info" => id().map(Self::Info),
            "move" => {
                let mut args = rest.split_whitespace();
                Ok(Self::Move(position(args.next())?, position(args.next())?))
            }
            "genres" => Ok(Self::Genres),
            "list" | "" => Ok(Self::List),
            "help" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(format!("unknown command {other:?}, try help")),
        }
    }
}

fn run(store: &mut ViewStore, config: &Config, command: Command) {
    match command {
        Command::Show(view) => {
            store.select_view_async(view);
        }
        Command::Search(query) => {
            store.search_async(&query);
        }
        Command::Favorite(id) => store.toggle_favorite(id),
        Command::Watched(id) => store.mark_as_seen(id),
        Command::Remove(id) => store.remove_from_favorites(id),
        Command::Move(from, to) => {
            if !store.reorder_favorites(from, to) {
                println!("no such position");
            }
        }
        Command::Info(id) => print_overlay(config, &store.overlay(id)),
        Command::Genres => match store.catalog().genres() {
            Ok(genres) => {
                for genre in genres {
                    println!("{:>6}  {}", genre.id, genre.name);
                }
            }
            Err(err) => println!("failed to load genres: {err}"),
        },
        Command::List => print_snapshot(&store.snapshot()),
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
}

fn print_snapshot(snapshot: &Snapshot) {
    let title = match snapshot.view {
        View::Search if !snapshot.query.is_empty() => format!("search: {}", snapshot.query),
        view => view.to_string(),
    };
    match &snapshot.status {
        LoadStatus::Idle => {}
        LoadStatus::Loading => println!("[{title}] loading..."),
        LoadStatus::Failed(err) => println!("[{title}] failed: {err}"),
        LoadStatus::Ready if snapshot.movies.is_empty() => println!("[{title}] nothing here"),
        LoadStatus::Ready => {
            println!("[{title}]");
            for (position, movie) in snapshot.movies.iter().enumerate() {
                let mark = if snapshot.is_favorite(movie.id) {
                    '*'
                } else if snapshot.is_seen(movie.id) {
                    'v'
                } else {
                    ' '
                };
                println!(
                    "{:>3}. {} {} ({}) {}  #{}",
                    position + 1,
                    mark,
                    movie.title,
                    movie.release_year().unwrap_or("?"),
                    movie.rating_display(),
                    movie.id
                );
            }
        }
    }
}

fn print_overlay(config: &Config, overlay: &MovieOverlay) {
    let Some(details) = &overlay.details else {
        println!("details not available");
        return;
    };
    let title = &details.summary.title;
    println!("{} [{}]", title, overlay.certification);
    println!("{}", overlay.info_line());
    println!("rating: {}", details.summary.rating_display());
    println!("cast: {}", details.cast_names());
    println!("{}", details.summary.overview);
    if let Some(poster) = &overlay.images.poster {
        println!("  poster: {}", config.image_url(POSTER_SIZE, poster));
    }
    for backdrop in &overlay.images.backdrops {
        println!("  backdrop: {}", config.image_url(BACKDROP_SIZE, backdrop));
    }
    if !details.is_streamable() {
        println!("not streaming in {}", config.region);
        return;
    }
    for provider in &details.streaming_providers {
        let link = provider
            .search_url(title)
            .or_else(|| details.watch_link.as_deref().map(str::to_string))
            .unwrap_or_default();
        let logo = provider
            .logo_path
            .as_deref()
            .map(|path| config.image_url(LOGO_SIZE, path))
            .unwrap_or_default();
        println!("  {}: {} {}", provider.name, link, logo);
    }
}
