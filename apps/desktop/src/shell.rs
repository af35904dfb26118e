//! Interactive browsing loop: one command per input line.

use std::io::Write;

use anyhow::Result;
use client_core::{CatalogSession, FetchOutcome};
use shared::domain::{FavoriteToggle, ProductId};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use crate::render::{render_categories, render_favorites, render_view, ViewModel};

pub const HELP: &str = "\
commands:
  next | n              next page
  prev | p              previous page
  search [text]         search products (no text restores the listing)
  category [slug]       filter by category (no slug restores the listing)
  categories            list category slugs
  fav <id>              toggle a product as favorite
  favorites             show favorites
  theme                 switch light/dark mode
  reload                re-fetch the current page
  help                  show this help
  quit | q              exit
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Next,
    Previous,
    Search(String),
    Category(String),
    Categories,
    Favorite(ProductId),
    Favorites,
    Theme,
    Reload,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShellParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),
    #[error("'fav' needs a product id")]
    MissingId,
    #[error("'{0}' is not a product id")]
    InvalidId(String),
}

impl ShellCommand {
    pub fn parse(line: &str) -> Result<Self, ShellParseError> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        match verb.to_ascii_lowercase().as_str() {
            "" => Err(ShellParseError::Empty),
            "next" | "n" => Ok(Self::Next),
            "prev" | "previous" | "p" => Ok(Self::Previous),
            "search" | "s" => Ok(Self::Search(rest.to_string())),
            "category" | "c" => Ok(Self::Category(rest.to_string())),
            "categories" => Ok(Self::Categories),
            "fav" | "favorite" => {
                if rest.is_empty() {
                    return Err(ShellParseError::MissingId);
                }
                rest.parse::<i64>()
                    .map(|id| Self::Favorite(ProductId(id)))
                    .map_err(|_| ShellParseError::InvalidId(rest.to_string()))
            }
            "favorites" | "favs" => Ok(Self::Favorites),
            "theme" => Ok(Self::Theme),
            "reload" | "r" => Ok(Self::Reload),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            other => Err(ShellParseError::Unknown(other.to_string())),
        }
    }
}

pub async fn render_session(session: &CatalogSession) -> String {
    let listing = session.list().snapshot().await;
    let favorites = session.favorites().favorites().await;
    let filters = session.filters().filter_state().await;
    render_view(&ViewModel {
        listing: &listing,
        favorites: &favorites,
        filters: &filters,
        theme: session.theme(),
    })
}

/// Reads commands until `quit` or end of input.
pub async fn run<R, W>(session: &mut CatalogSession, input: R, output: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    write!(output, "{}", render_session(session).await)?;
    let mut lines = input.lines();
    loop {
        write!(output, "> ")?;
        output.flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match ShellCommand::parse(&line) {
            Ok(command) => command,
            Err(ShellParseError::Empty) => continue,
            Err(err) => {
                writeln!(output, "{err}")?;
                continue;
            }
        };
        debug!(?command, "shell command");

        if !execute(session, command, output).await? {
            break;
        }
    }
    Ok(())
}

/// Returns `false` once the session should end.
pub async fn execute<W: Write>(
    session: &mut CatalogSession,
    command: ShellCommand,
    output: &mut W,
) -> Result<bool> {
    match command {
        ShellCommand::Quit => return Ok(false),
        ShellCommand::Help => write!(output, "{HELP}")?,
        ShellCommand::Next => {
            session.list().next_page().await;
            write!(output, "{}", render_session(session).await)?;
        }
        ShellCommand::Previous => {
            if session.list().previous_page().await == FetchOutcome::Unchanged {
                writeln!(output, "Already on the first page.")?;
            } else {
                write!(output, "{}", render_session(session).await)?;
            }
        }
        ShellCommand::Reload => {
            session.list().reload().await;
            write!(output, "{}", render_session(session).await)?;
        }
        ShellCommand::Search(query) => {
            // Failures keep the previous list on screen; they are only logged.
            if let Err(err) = session.filters().search(&query).await {
                warn!(error = %err, "search failed");
            }
            write!(output, "{}", render_session(session).await)?;
        }
        ShellCommand::Category(slug) => {
            if let Err(err) = session.filters().filter_by_category(&slug).await {
                warn!(error = %err, "category filter failed");
            }
            write!(output, "{}", render_session(session).await)?;
        }
        ShellCommand::Categories => match session.filters().categories().await {
            Ok(categories) => write!(output, "{}", render_categories(&categories))?,
            Err(err) => warn!(error = %err, "failed to load categories"),
        },
        ShellCommand::Favorite(id) => match session.toggle_favorite_by_id(id).await {
            Ok((product, FavoriteToggle::Added)) => {
                writeln!(output, "Added #{} {} to favorites.", product.id, product.title)?
            }
            Ok((product, FavoriteToggle::Removed)) => writeln!(
                output,
                "Removed #{} {} from favorites.",
                product.id, product.title
            )?,
            Err(err) => writeln!(output, "Could not toggle favorite: {err:#}")?,
        },
        ShellCommand::Favorites => {
            let favorites = session.favorites().favorites().await;
            write!(output, "{}", render_favorites(&favorites, session.theme()))?;
        }
        ShellCommand::Theme => {
            let theme = session.toggle_theme();
            writeln!(output, "Switched to {} mode.", theme.label())?;
            write!(output, "{}", render_session(session).await)?;
        }
    }
    Ok(true)
}

#[cfg(test)]
#[path = "tests/shell_tests.rs"]
mod tests;
