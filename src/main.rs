use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use tokio::sync::watch;

use stagedoor::api::{Event, HttpMarketplaceApi, MarketplaceApi};
use stagedoor::config;
use stagedoor::features::{AppAction, AppState, SearchAction, app_reducer};
use stagedoor::runtime::{Combined, Store};
use stagedoor::storage::{FavoritesStore, JsonFavoritesStore, JsonSessionStore, SessionStore};

const RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "stagedoor", about = "Ticket marketplace client")]
struct Args {
    /// Search the marketplace instead of showing the featured feed
    query: Option<String>,

    /// Override the marketplace API base URL
    #[arg(long)]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to stagedoor.log in current directory
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();

    if let Ok(log_file) = File::create("stagedoor.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    log::info!("Stagedoor starting up");

    let file_config = config::load_config().unwrap_or_else(|e| {
        eprintln!("Ignoring unreadable config: {e}");
        config::StagedoorConfig::default()
    });
    let resolved = config::resolve(&file_config, args.base_url.as_deref());

    let api: Arc<dyn MarketplaceApi> = Arc::new(HttpMarketplaceApi::new(
        Some(resolved.api_base_url.clone()),
        resolved.api_key.clone(),
    ));
    let (favorites, sessions) = build_stores(resolved.data_dir.as_deref())?;

    let store = Store::new(
        AppState::default(),
        app_reducer(api, favorites, sessions, resolved.search_debounce),
    );
    let mut states = store.subscribe();

    store.dispatch(AppAction::Start);

    match args.query {
        Some(query) => run_search(&store, &mut states, query).await,
        None => run_featured(&mut states).await,
    }
}

fn build_stores(
    data_dir: Option<&Path>,
) -> io::Result<(Arc<dyn FavoritesStore>, Arc<dyn SessionStore>)> {
    match data_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            Ok((
                Arc::new(JsonFavoritesStore::new(dir.join("favorites.json"))),
                Arc::new(JsonSessionStore::new(dir.join("session.json"))),
            ))
        }
        None => Ok((
            Arc::new(JsonFavoritesStore::in_data_dir()?),
            Arc::new(JsonSessionStore::in_data_dir()?),
        )),
    }
}

async fn run_search(
    store: &Store<Combined<AppState, AppAction>>,
    states: &mut watch::Receiver<AppState>,
    query: String,
) -> io::Result<()> {
    println!("Searching for '{query}'...");
    store.dispatch(AppAction::Search(SearchAction::QueryChanged(query.clone())));

    // The query and the in-flight flag are published together, so the idle
    // pre-search state cannot satisfy this predicate.
    let state = wait_until(states, |s| s.search.query == query && !s.search.searching).await?;
    if let Some(kind) = &state.search.error {
        return Err(io::Error::other(format!("search failed: {kind}")));
    }
    print_events(&state.search.results);
    Ok(())
}

async fn run_featured(states: &mut watch::Receiver<AppState>) -> io::Result<()> {
    println!("Featured events:");

    let state = wait_until(states, |s| !s.events.loading).await?;
    if let Some(kind) = &state.events.error {
        return Err(io::Error::other(format!("featured feed failed: {kind}")));
    }
    print_events(&state.events.featured);
    if let Some(session) = &state.auth.session {
        println!("Signed in as {}", session.email);
    }
    Ok(())
}

async fn wait_until(
    states: &mut watch::Receiver<AppState>,
    done: impl FnMut(&AppState) -> bool,
) -> io::Result<AppState> {
    match tokio::time::timeout(RESPONSE_TIMEOUT, states.wait_for(done)).await {
        Ok(Ok(state)) => Ok(state.clone()),
        Ok(Err(_)) => Err(io::Error::other("state stream closed")),
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            "no response from the marketplace",
        )),
    }
}

fn print_events(events: &[Event]) {
    if events.is_empty() {
        println!("No events found.");
        return;
    }
    for event in events {
        let venue = event.venue.as_deref().unwrap_or("venue TBA");
        let when = event.starts_at.format("%Y-%m-%d %H:%M");
        match &event.min_price {
            Some(price) => println!(
                "  {} | {} | {} | from {:.2} {}",
                when, event.title, venue, price.amount, price.currency
            ),
            None => println!("  {} | {} | {}", when, event.title, venue),
        }
    }
}
