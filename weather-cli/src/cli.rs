use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{InquireError, Password, Text};
use tokio::task::JoinSet;
use tracing::{debug, error, warn};
use weather_core::Config;

use crate::api::BackendClient;
use crate::render;
use crate::session::{SearchFailure, SearchSession};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather lookup client")]
pub struct Cli {
    /// Backend base URL; overrides the configured one.
    #[arg(long, global = true)]
    pub backend: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the provider API key and backend URL.
    Configure,

    /// Show current weather for one or more cities.
    ///
    /// All searches are sent at once; only the last one given is displayed.
    Search {
        /// City names.
        #[arg(required = true)]
        cities: Vec<String>,

        /// Show temperatures in Fahrenheit.
        #[arg(long)]
        fahrenheit: bool,
    },

    /// List previous searches.
    History,

    /// Delete all previous searches.
    Clear,

    /// Prompt for cities until interrupted.
    Interactive,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;
        let backend_url = self.backend.unwrap_or_else(|| config.client.backend_url.clone());
        let connect = || BackendClient::new(&backend_url);
        let mut session = SearchSession::new();

        match self.command {
            Command::Configure => configure().await?,
            Command::Search { cities, fahrenheit } => {
                let client = connect()?;
                if fahrenheit {
                    session.toggle_unit();
                }
                search_all(&client, &mut session, cities).await?;
                print!("{}", render::render_session(&session));
            }
            Command::History => {
                let history = connect()?.get_history().await.context("Failed to fetch history")?;
                print!("{}", render::render_history(&history));
            }
            Command::Clear => {
                let client = connect()?;
                refresh_history(&client, &mut session).await;
                clear_history(&client, &mut session).await;
                print!("{}", render::render_session(&session));
            }
            Command::Interactive => interactive(&connect()?, &mut session).await?,
        }

        Ok(())
    }
}

/// Fire one search per city concurrently and apply results as they resolve.
async fn search_all(
    client: &BackendClient,
    session: &mut SearchSession,
    cities: Vec<String>,
) -> anyhow::Result<()> {
    let mut tasks = JoinSet::new();

    for city in cities {
        session.set_query(city);
        let ticket = session.begin_search();
        let client = client.clone();
        tasks.spawn(async move {
            let outcome = client.get_weather(ticket.query()).await;
            (ticket, outcome)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (ticket, outcome) = joined.context("search task panicked")?;
        debug!(seq = ticket.seq(), query = %ticket.query(), "search resolved");
        let outcome = outcome.map(|current| current.snapshot).map_err(|err| {
            error!(error = %err, query = %ticket.query(), "weather search failed");
            SearchFailure::from(&err)
        });
        let succeeded = outcome.is_ok();
        if session.finish_search(ticket, outcome) && succeeded {
            refresh_history(client, session).await;
        }
    }

    Ok(())
}

/// Mirror backend history into the session; failures only reach the log.
async fn refresh_history(client: &BackendClient, session: &mut SearchSession) {
    match client.get_history().await {
        Ok(records) => session.replace_history(records),
        Err(err) => warn!(error = %err, "Error fetching history"),
    }
}

async fn clear_history(client: &BackendClient, session: &mut SearchSession) {
    let pending = session.begin_clear();
    let result = client.clear_history().await;
    match &result {
        Ok(message) => debug!(%message, "history cleared"),
        Err(err) => error!(error = %err, "Failed to clear history"),
    }
    session.finish_clear(pending, result.map(|_| ()).map_err(|err| err.to_string()));
}

/// Commands typed at the prompt instead of a city name.
#[derive(Debug, PartialEq, Eq)]
enum PromptInput {
    Search(String),
    ToggleUnit,
    History,
    Clear,
    Quit,
}

impl PromptInput {
    fn parse(line: &str) -> Self {
        match line.trim() {
            ":u" | ":unit" => PromptInput::ToggleUnit,
            ":h" | ":history" => PromptInput::History,
            ":c" | ":clear" => PromptInput::Clear,
            ":q" | ":quit" => PromptInput::Quit,
            _ => PromptInput::Search(line.to_string()),
        }
    }
}

async fn interactive(client: &BackendClient, session: &mut SearchSession) -> anyhow::Result<()> {
    refresh_history(client, session).await;
    print!("{}", render::render_history(session.history()));

    loop {
        let line = match prompt("Search City", ":u unit, :h history, :c clear, :q quit").await? {
            Some(line) => line,
            None => break,
        };

        match PromptInput::parse(&line) {
            PromptInput::Quit => break,
            PromptInput::ToggleUnit => session.toggle_unit(),
            PromptInput::History => refresh_history(client, session).await,
            PromptInput::Clear => clear_history(client, session).await,
            PromptInput::Search(city) => search_all(client, session, vec![city]).await?,
        }

        print!("{}", render::render_session(session));
    }

    Ok(())
}

/// Ask for one line of input. `None` when the user cancels.
async fn prompt(message: &'static str, help: &'static str) -> anyhow::Result<Option<String>> {
    let answer = tokio::task::spawn_blocking(move || Text::new(message).with_help_message(help).prompt())
        .await
        .context("prompt task panicked")?;

    match answer {
        Ok(line) => Ok(Some(line)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Prompt for settings and write them to the config file. Environment overrides are not persisted.
async fn configure() -> anyhow::Result<()> {
    let path = Config::config_file_path()?;
    let mut config = Config::load_from(&path)?;
    let current_backend = config.client.backend_url.clone();

    let (api_key, backend_url) = tokio::task::spawn_blocking(move || -> Result<_, InquireError> {
        let api_key = Password::new("OpenWeather API key (leave blank to keep current):")
            .without_confirmation()
            .prompt()?;
        let backend_url = Text::new("Backend URL:").with_default(&current_backend).prompt()?;
        Ok((api_key, backend_url))
    })
    .await
    .context("prompt task panicked")??;

    if !api_key.trim().is_empty() {
        config.set_api_key(api_key.trim().to_string());
    }
    config.client.backend_url = backend_url;
    config.save_to(&path)?;

    println!("Saved configuration to {}", path.display());
    Ok(())
}
