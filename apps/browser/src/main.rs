use anyhow::Result;
use catalog::{CatalogStore, FilterAction, FilterField};
use clap::Parser;
use client_core::{CatalogSource, CatalogView, HttpCatalogSource};
use shared::domain::CatalogItem;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod commands;

const NO_RESULTS: &str = "No tutorials match your filters.";

use commands::{parse_command, BrowserCommand, HELP};

/// Browse the academy tutorial catalog.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, env = "ACADEMY_SERVER_URL", default_value = "http://127.0.0.1:8080")]
    server_url: String,
    /// Case-insensitive text matched against title and description.
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    topic: Vec<String>,
    #[arg(long)]
    difficulty: Vec<String>,
    #[arg(long)]
    length: Vec<String>,
    /// Keep a prompt open to change filters after the first listing.
    #[arg(long, short)]
    interactive: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let source = HttpCatalogSource::new(&args.server_url)?;
    let mut view = CatalogView::new(source);
    view.mount().await;

    for action in initial_actions(&args) {
        view.dispatch(action);
    }
    render(&view);

    if args.interactive {
        run_prompt(&mut view).await?;
    }
    Ok(())
}

fn initial_actions(args: &Args) -> Vec<FilterAction> {
    let mut actions = Vec::new();
    if let Some(search) = &args.search {
        actions.push(FilterAction::SetSearchTerm(search.clone()));
    }
    let categories = [
        (FilterField::Topic, &args.topic),
        (FilterField::Difficulty, &args.difficulty),
        (FilterField::Length, &args.length),
    ];
    for (field, values) in categories {
        let mut seen = Vec::new();
        for value in values {
            if !seen.contains(value) {
                seen.push(value.clone());
                actions.push(FilterAction::Toggle {
                    field,
                    value: value.clone(),
                });
            }
        }
    }
    actions
}

async fn run_prompt<S: CatalogSource>(view: &mut CatalogView<S>) -> Result<()> {
    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            Ok(BrowserCommand::Filter(action)) => {
                view.dispatch(action);
                render(view);
            }
            Ok(BrowserCommand::List) => render(view),
            Ok(BrowserCommand::Options) => render_options(view),
            Ok(BrowserCommand::Help) => println!("{HELP}"),
            Ok(BrowserCommand::Quit) => break,
            Err(error) => eprintln!("{error}"),
        }
    }
    Ok(())
}

fn render<S: CatalogSource>(view: &CatalogView<S>) {
    print!("{}", render_listing(view.store()));
}

/// The active filters line (when any) followed by one row per visible
/// tutorial, or the no-results message.
fn render_listing(store: &CatalogStore) -> String {
    let mut out = String::new();
    let state = store.state();
    if !state.is_empty() {
        let mut active = Vec::new();
        if !state.search_term.is_empty() {
            active.push(format!("search=\"{}\"", state.search_term));
        }
        for field in FilterField::ALL {
            let selected = state.selections(field);
            if !selected.is_empty() {
                let values: Vec<&str> = selected.iter().map(String::as_str).collect();
                active.push(format!("{field}={}", values.join("|")));
            }
        }
        out.push_str(&format!("filters: {}\n", active.join(" ")));
    }

    if store.is_empty_result() {
        out.push_str(NO_RESULTS);
        out.push('\n');
        return out;
    }
    for item in store.visible() {
        out.push_str(&format_row(item));
        out.push('\n');
    }
    out
}

fn render_options<S: CatalogSource>(view: &CatalogView<S>) {
    println!("topic: {}", view.store().topic_options().join(", "));
    for field in [FilterField::Difficulty, FilterField::Length] {
        if let Some(options) = field.fixed_options() {
            println!("{field}: {}", options.join(", "));
        }
    }
}

fn format_row(item: &CatalogItem) -> String {
    let label = |value: Option<&str>| value.unwrap_or("-").to_string();
    format!(
        "{:<28} {:<14} {:<13} {:<7} {}",
        item.title,
        label(item.topic.as_deref()),
        label(item.difficulty.map(|d| d.as_str())),
        label(item.length_category.map(|l| l.as_str())),
        item.id,
    )
}
