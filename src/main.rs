//! libris command line entry point.

use clap::Parser;
use libris_client::{
    LibraryClient, SessionEvent,
    config::{BookCommand, Cli, Command, Config},
    guard::{self, Decision, Route},
    model::{Book, BookForm, BookPage, BookPatch, BookQuery, LoginForm, RegisterForm, Role, SortDir},
    notify::{Notification, Notifier},
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Prints notifications to stderr.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        eprintln!("{}", notification);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "libris_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    // Find or load config
    let config_path = cli.config.clone().or_else(Config::find_config_file);

    let mut config = if let Some(ref path) = config_path {
        Config::load(path)?
    } else {
        Config::default()
    };

    if let Some(base_url) = cli.base_url {
        config.server.base_url = base_url;
    }

    if let Command::Init { force } = cli.command {
        return cmd_init(force);
    }

    let client = LibraryClient::open(config, Arc::new(ConsoleNotifier))?;
    let mut events = client.session.subscribe();
    client.auth.restore_auth();

    let result = match cli.command {
        Command::Init { .. } => Ok(()),
        Command::Login {
            username,
            password,
            role,
        } => cmd_login(&client, username, password, role).await,
        Command::Logout => {
            client.auth.sign_out().await;
            Ok(())
        }
        Command::Register {
            username,
            password,
            email,
        } => cmd_register(&client, username, password, email).await,
        Command::Whoami => cmd_whoami(&client).await,
        Command::Refresh => {
            require(&client, Route::Dashboard)?;
            client.auth.refresh().await.map_err(Into::into)
        }
        Command::Books { action } => cmd_books(&client, action).await,
    };

    report_session_events(&mut events);
    result
}

/// Write a default config file.
fn cmd_init(force: bool) -> anyhow::Result<()> {
    let config_path = PathBuf::from("libris.toml");

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, Config::generate_default())?;
    println!("Created config file: {}", config_path.display());
    println!("\nEdit base_url to point at your library server, then run: libris login <username>");

    Ok(())
}

async fn cmd_login(
    client: &LibraryClient,
    username: String,
    password: Option<String>,
    role: Option<String>,
) -> anyhow::Result<()> {
    let role = role
        .map(|r| r.parse::<Role>())
        .transpose()
        .map_err(anyhow::Error::msg)?;
    let password = match password {
        Some(p) => p,
        None => prompt_password("Password: ")?,
    };

    let user = client
        .auth
        .login(&LoginForm {
            username,
            password,
            role,
        })
        .await?;

    println!("Logged in as {} ({})", user.username, user.role);
    Ok(())
}

async fn cmd_register(
    client: &LibraryClient,
    username: String,
    password: Option<String>,
    email: Option<String>,
) -> anyhow::Result<()> {
    let password = match password {
        Some(p) => p,
        None => prompt_password("Password: ")?,
    };

    let created = client
        .auth
        .register(&RegisterForm {
            username,
            password,
            email,
            role: None,
        })
        .await?;

    println!(
        "Created user: {} (role: {}, id: {})",
        created.username, created.role, created.id
    );
    Ok(())
}

async fn cmd_whoami(client: &LibraryClient) -> anyhow::Result<()> {
    require(client, Route::Dashboard)?;

    let user = client.auth.fetch_current_user().await?;
    println!("{}", serde_json::to_string_pretty(&user)?);
    Ok(())
}

async fn cmd_books(client: &LibraryClient, action: BookCommand) -> anyhow::Result<()> {
    require(client, Route::Books)?;
    let books = &client.books;

    match action {
        BookCommand::List {
            page,
            size,
            sort_by,
            desc,
        } => {
            let query = BookQuery {
                page,
                size,
                sort_by,
                sort_dir: desc.then_some(SortDir::Desc),
                ..BookQuery::default()
            };
            let page = books.list(&query).await?;
            print_page(&page);
        }

        BookCommand::Get { id } => {
            let book = books.get_by_id(id).await?;
            println!("{}", serde_json::to_string_pretty(&book)?);
        }

        BookCommand::Isbn { isbn } => {
            let book = books.get_by_isbn(&isbn).await?;
            println!("{}", serde_json::to_string_pretty(&book)?);
        }

        BookCommand::Create { data } => {
            let form: BookForm = serde_json::from_str(&data)?;
            let book = books.create(&form).await?;
            println!("Created book {}: {}", book.id, book.title);
        }

        BookCommand::Update { id, data } => {
            let patch: BookPatch = serde_json::from_str(&data)?;
            let book = books.update(id, &patch).await?;
            println!("{}", serde_json::to_string_pretty(&book)?);
        }

        BookCommand::Delete { id } => {
            books.delete(id).await?;
            println!("Deleted book {}", id);
        }

        BookCommand::Search {
            title,
            author,
            publisher,
            isbn,
            page,
            size,
        } => {
            let query = BookQuery {
                page,
                size,
                title,
                author,
                publisher,
                isbn,
                ..BookQuery::default()
            };
            let page = books.search(&query).await?;
            print_page(&page);
        }

        BookCommand::Count => {
            println!("{}", books.count().await?);
        }
    }

    Ok(())
}

/// Refuse to run a command the session may not open.
fn require(client: &LibraryClient, route: Route) -> anyhow::Result<()> {
    match guard::check(route, &client.session) {
        Decision::Proceed => Ok(()),
        Decision::RedirectToLogin { redirect } => {
            anyhow::bail!("Not logged in ({} requires a session). Run: libris login <username>", redirect)
        }
        Decision::Redirect(_) => {
            anyhow::bail!("{} requires an administrator account", route.title())
        }
    }
}

fn print_page(page: &BookPage) {
    if page.items.is_empty() {
        println!("No books found.");
        return;
    }

    println!(
        "{:<6} {:<18} {:<36} {:<24} {:>8}",
        "ID", "ISBN", "TITLE", "AUTHOR", "PRICE"
    );
    println!("{}", "-".repeat(96));
    for book in &page.items {
        print_row(book);
    }
    println!(
        "\nPage {} of {} ({} books total)",
        page.page_index + 1,
        page.total_pages.max(1),
        page.total_count
    );
}

fn print_row(book: &Book) {
    println!(
        "{:<6} {:<18} {:<36} {:<24} {:>8.2}",
        book.id,
        truncate(&book.isbn, 18),
        truncate(&book.title, 36),
        truncate(&book.author, 24),
        book.price
    );
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

fn report_session_events(events: &mut broadcast::Receiver<SessionEvent>) {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }

    if session_expired(&seen) {
        eprintln!("Session expired or was rejected. Run: libris login <username>");
    }
}

/// Whether the session ended because the server rejected it.
///
/// A rejection followed by a logout (e.g. `libris logout` with a stale
/// token) is an ordinary logout.
fn session_expired(events: &[SessionEvent]) -> bool {
    events
        .iter()
        .rev()
        .find_map(|event| match event {
            SessionEvent::Invalidated => Some(true),
            SessionEvent::LoggedOut | SessionEvent::LoggedIn(_) => Some(false),
            SessionEvent::Restored(_) => None,
        })
        .unwrap_or(false)
}

/// Prompt for password input.
fn prompt_password(prompt: &str) -> anyhow::Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut password = String::new();
    io::stdin().read_line(&mut password)?;

    Ok(password.trim().to_string())
}
