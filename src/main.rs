use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use arxiv_getter::app::{App, AppEvent};
use arxiv_getter::config::Config;
use arxiv_getter::feed::{ArticleSource, ArxivClient};
use arxiv_getter::note::NoteWriter;
use arxiv_getter::suggest::{query_for_input, SuggestionEngine, SuggestionEvent};
use arxiv_getter::ui;
use arxiv_getter::util::strip_control_chars;

/// Get the config directory path (~/.config/arxiv-getter/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("arxiv-getter"))
}

#[derive(Parser, Debug)]
#[command(
    name = "arxiv-getter",
    about = "Look up arXiv papers by ID, URL or keywords and create notes for them"
)]
struct Args {
    /// Config file (default: ~/.config/arxiv-getter/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory to write notes to (overrides notes_dir)
    #[arg(long, value_name = "DIR")]
    notes_dir: Option<PathBuf>,

    /// Run a single lookup, print the results and exit
    #[arg(long, value_name = "QUERY")]
    lookup: Option<String>,
}

fn build_http_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("arxiv-getter/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .pool_max_idle_per_host(2)
        .pool_idle_timeout(std::time::Duration::from_secs(30))
        .build()
        .context("Failed to build HTTP client")?;
    Ok(client)
}

async fn run_lookup(client: &ArxivClient, input: &str, free_text: bool) -> Result<()> {
    if input.is_empty() {
        anyhow::bail!("Lookup query is empty");
    }
    let query = query_for_input(input, free_text);

    let articles = ArticleSource::search(client, query)
        .await
        .with_context(|| format!("Lookup failed for {:?}", input))?;

    if articles.is_empty() {
        println!("No results for {:?}", input);
        return Ok(());
    }
    for article in &articles {
        println!("{}", strip_control_chars(&article.title));
        println!("  {}", strip_control_chars(&article.authors.join(", ")));
        println!("  {}  published {}", article.id, article.published.format("%Y-%m-%d"));
        if let Some(pdf) = &article.pdf {
            println!("  {}", pdf);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => get_config_dir()?.join("config.toml"),
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    if let Some(dir) = args.notes_dir {
        config.notes_dir = dir;
    }

    let client = ArxivClient::new(build_http_client()?)
        .with_endpoint(config.endpoint.clone())
        .with_max_results(config.max_results)
        .with_sort(config.sort_by, config.sort_order);

    if let Some(input) = &args.lookup {
        return run_lookup(&client, input, config.free_text_search).await;
    }

    if !config.notes_dir.is_dir() {
        anyhow::bail!(
            "Notes directory {} does not exist",
            config.notes_dir.display()
        );
    }

    let (suggestion_tx, suggestion_rx) = mpsc::channel::<SuggestionEvent>(32);
    let handle = SuggestionEngine::spawn(Arc::new(client), config.suggest_config(), suggestion_tx);

    let mut app = App::new(NoteWriter::from_config(&config), config.open_after_create);
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);

    ui::run(&mut app, handle, suggestion_rx, event_tx, event_rx).await?;
    Ok(())
}
