//! Interactive shell.
//!
//! Reads one command per line from stdin and drives a list session, detail
//! views and the cart. Screens are kept on a history stack; `back` pops it.

use std::io::{self, Write};

use pocketshop_core::{ProductId, Quantity, QuantityError, ViewMode};
use pocketshop_storefront::cart::CartChange;
use pocketshop_storefront::detail::ProductDetailView;
use pocketshop_storefront::listing::{ListCommand, ListHandle, ListSnapshot, SessionClosed};
use pocketshop_storefront::navigation::Intent;
use pocketshop_storefront::state::AppState;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::debug;

use super::render;

const HELP: &str = "\
Commands:
  search <text>   search the catalog (empty shows everything)
  grid | list     switch view mode
  page <n>        go to a page (grid view)
  more            load the next page (list view)
  retry           repeat the last request
  open <id>       show a product
  qty <n>         choose a quantity (1-10)
  add             add the product to the cart
  remove <id>     remove a product from the cart
  cart            show the cart
  clear           empty the cart
  back            previous screen
  home            product list
  help            this text
  quit            leave";

/// Fatal shell errors.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Session(#[from] SessionClosed),
}

/// A line the user typed that could not be understood.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
enum ParseError {
    #[error("unknown command '{0}', type 'help' for a list")]
    Unknown(String),
    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),
    #[error("invalid product ID '{0}'")]
    InvalidId(String),
    #[error("invalid page '{0}'")]
    InvalidPage(String),
    #[error(transparent)]
    Quantity(#[from] QuantityError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Search(String),
    View(ViewMode),
    Page(u32),
    More,
    Retry,
    Open(ProductId),
    Qty(Quantity),
    Add,
    Remove(ProductId),
    Cart,
    Clear,
    Back,
    Home,
    Help,
    Quit,
}

fn parse(line: &str) -> Result<Option<Command>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(word, rest)| (word, rest.trim()));

    let required = |name: &'static str| {
        if rest.is_empty() {
            Err(ParseError::MissingArgument(name))
        } else {
            Ok(rest)
        }
    };
    let product_id = |name: &'static str| -> Result<ProductId, ParseError> {
        required(name)?
            .parse()
            .map_err(|_| ParseError::InvalidId(rest.to_string()))
    };

    let command = match word {
        "search" => Command::Search(rest.to_string()),
        "grid" => Command::View(ViewMode::Grid),
        "list" => Command::View(ViewMode::List),
        "page" => Command::Page(
            required("page")?
                .parse()
                .map_err(|_| ParseError::InvalidPage(rest.to_string()))?,
        ),
        "more" => Command::More,
        "retry" => Command::Retry,
        "open" => Command::Open(product_id("open")?),
        "qty" => Command::Qty(required("qty")?.parse()?),
        "add" => Command::Add,
        "remove" => Command::Remove(product_id("remove")?),
        "cart" => Command::Cart,
        "clear" => Command::Clear,
        "back" => Command::Back,
        "home" => Command::Home,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(ParseError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

enum Screen {
    Catalog,
    Product(Box<ProductDetailView>),
    Cart,
}

struct Shell<W> {
    state: AppState,
    list: ListHandle,
    /// Never empty; the bottom entry is always the catalog.
    history: Vec<Screen>,
    out: W,
}

/// Run the shell on stdin and stdout until `quit` or end of input.
///
/// # Errors
///
/// Returns an error if stdout cannot be written or the list session dies.
pub async fn run(state: AppState) -> Result<(), ShellError> {
    let list = state.list_session();
    let shell = Shell {
        state,
        list,
        history: vec![Screen::Catalog],
        out: io::stdout(),
    };
    shell.run(BufReader::new(tokio::io::stdin())).await
}

impl<W: Write> Shell<W> {
    async fn run(mut self, input: impl AsyncBufRead + Unpin) -> Result<(), ShellError> {
        let mut lines = input.lines();

        self.list.settled().await?;
        self.render()?;
        self.prompt()?;

        while let Some(line) = lines.next_line().await? {
            match parse(&line) {
                Ok(None) => {}
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => self.execute(command).await?,
                Err(e) => writeln!(self.out, "{e}")?,
            }
            self.prompt()?;
        }

        let Self { list, .. } = self;
        list.shutdown().await;
        Ok(())
    }

    async fn execute(&mut self, command: Command) -> Result<(), ShellError> {
        match command {
            Command::Search(text) => {
                self.list_command(ListCommand::SearchInput(text.clone()), |s| {
                    s.search_term == text && !s.loading
                })
                .await?;
                self.show_catalog()
            }
            Command::View(mode) => {
                self.list_command(ListCommand::SetViewMode(mode), |s| {
                    s.view_mode == mode && !s.loading
                })
                .await?;
                self.show_catalog()
            }
            Command::Page(page) => {
                let snapshot = self.list.snapshot();
                if snapshot.view_mode != ViewMode::Grid {
                    writeln!(self.out, "Page navigation is only available in grid view")?;
                    return Ok(());
                }
                let pages = snapshot.page_count();
                if page == 0 || page > pages {
                    writeln!(self.out, "Page must be between 1 and {pages}")?;
                    return Ok(());
                }
                self.list_command(ListCommand::GoToPage(page), |s| {
                    s.page == page && !s.loading
                })
                .await?;
                self.show_catalog()
            }
            Command::More => {
                let snapshot = self.list.snapshot();
                if snapshot.view_mode != ViewMode::List {
                    writeln!(self.out, "'more' only applies to list view")?;
                    return Ok(());
                }
                if snapshot.loading || snapshot.total.is_none() {
                    writeln!(self.out, "Nothing to load")?;
                    return Ok(());
                }
                let page = snapshot.page;
                self.list_command(ListCommand::NearEnd, |s| {
                    !s.loading && (s.page > page || s.notice.is_some())
                })
                .await?;
                self.show_catalog()
            }
            Command::Retry => {
                self.list_command(ListCommand::Retry, |s| !s.loading).await?;
                self.show_catalog()
            }
            Command::Open(id) => {
                let intent = self.list.snapshot().open(id);
                self.navigate(intent).await
            }
            Command::Qty(quantity) => {
                let Some(Screen::Product(view)) = self.history.last_mut() else {
                    writeln!(self.out, "Open a product first")?;
                    return Ok(());
                };
                view.select_quantity(quantity);
                self.render()
            }
            Command::Add => {
                let Some(Screen::Product(view)) = self.history.last_mut() else {
                    writeln!(self.out, "Open a product first")?;
                    return Ok(());
                };
                let message = match view.add_to_cart() {
                    Ok(CartChange::Added) => "Added to cart".to_string(),
                    Ok(CartChange::Updated) => "Cart updated".to_string(),
                    Ok(CartChange::Unchanged) => "Already in cart".to_string(),
                    Err(e) => e.to_string(),
                };
                writeln!(self.out, "{message}")?;
                self.render()
            }
            Command::Remove(id) => {
                if self.state.cart().remove_from_cart(id) {
                    writeln!(self.out, "Removed product {id}")?;
                } else {
                    writeln!(self.out, "Product {id} is not in the cart")?;
                }
                self.render()
            }
            Command::Cart => {
                let intent = match self.history.last() {
                    Some(Screen::Product(view)) => view.open_cart(),
                    _ => Intent::Cart,
                };
                self.navigate(intent).await
            }
            Command::Clear => {
                self.state.cart().clear_cart();
                writeln!(self.out, "Cart cleared")?;
                self.render()
            }
            Command::Back => {
                let intent = match self.history.last() {
                    Some(Screen::Product(view)) => view.back(),
                    _ => Intent::Back,
                };
                self.navigate(intent).await
            }
            Command::Home => self.navigate(Intent::Catalog).await,
            Command::Help => Ok(writeln!(self.out, "{HELP}")?),
            Command::Quit => Ok(()),
        }
    }

    /// Send `command` and wait until the session has handled it and the
    /// published state satisfies `done`.
    async fn list_command(
        &mut self,
        command: ListCommand,
        mut done: impl FnMut(&ListSnapshot) -> bool,
    ) -> Result<(), ShellError> {
        let mut rx = self.list.subscribe();
        rx.mark_unchanged();
        self.list.send(command).await?;
        rx.changed().await.map_err(|_| SessionClosed)?;
        rx.wait_for(|s| done(s)).await.map_err(|_| SessionClosed)?;
        Ok(())
    }

    async fn navigate(&mut self, intent: Intent) -> Result<(), ShellError> {
        match intent {
            Intent::Catalog => self.history.truncate(1),
            Intent::Product(id) => {
                let view = self.state.product_detail(id).await;
                self.history.push(Screen::Product(Box::new(view)));
            }
            Intent::Cart => self.history.push(Screen::Cart),
            Intent::Back => {
                if self.history.len() > 1 {
                    self.history.pop();
                }
            }
        }
        debug!(path = ?intent.path(), depth = self.history.len(), "Navigated");
        self.render()
    }

    fn show_catalog(&mut self) -> Result<(), ShellError> {
        self.history.truncate(1);
        self.render()
    }

    fn render(&mut self) -> Result<(), ShellError> {
        let cart = self.state.cart().snapshot();
        writeln!(self.out)?;
        match self.history.last() {
            Some(Screen::Product(view)) => render::detail(&mut self.out, view)?,
            Some(Screen::Cart) => render::cart(&mut self.out, &cart)?,
            Some(Screen::Catalog) | None => render::list(&mut self.out, &self.list.snapshot())?,
        }
        writeln!(self.out, "[cart: {}]", cart.badge_count())?;
        Ok(())
    }

    fn prompt(&mut self) -> Result<(), ShellError> {
        write!(self.out, "> ")?;
        self.out.flush()?;
        Ok(())
    }
}
