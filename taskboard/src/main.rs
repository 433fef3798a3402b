//! `Taskboard`: a terminal task board with optimistic updates.
//!
//! Launches the TUI against a REST backend, or against a seeded in-memory
//! store with `--demo`. Configuration via CLI flags, environment variables,
//! or config file (`~/.config/taskboard/config.toml`).
//!
//! ```bash
//! # Offline demo
//! cargo run --bin taskboard -- --demo
//!
//! # Against a backend
//! cargo run --bin taskboard -- --api-url http://127.0.0.1:3001
//!
//! # Or via environment variables
//! TASKBOARD_API_URL=http://127.0.0.1:3001 cargo run --bin taskboard
//! ```

use std::io;
use std::path::Path;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

use taskboard::app::App;
use taskboard::board::Board;
use taskboard::config::{CliArgs, ClientConfig};
use taskboard::notify::{Notice, Notifier};
use taskboard::repository::TaskRepository;
use taskboard::repository::http::HttpRepository;
use taskboard::repository::memory::MemoryRepository;
use taskboard::tasks::TaskEngine;
use taskboard::ui;

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = CliArgs::parse();

    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            ClientConfig {
                demo: cli.demo,
                ..ClientConfig::default()
            }
        }
    };

    // Logs go to a file; ratatui owns stdout.
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!(demo = config.demo, base_url = %config.base_url, "taskboard starting");

    // Build the repository before touching the terminal so errors print cleanly.
    let http = if config.demo {
        None
    } else {
        Some(HttpRepository::new(&config.http()).map_err(io::Error::other)?)
    };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = match http {
        Some(repo) => run_app(&mut terminal, repo, &config).await,
        None => run_app(&mut terminal, MemoryRepository::demo(), &config).await,
    };

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    tracing::info!("taskboard exiting");
    result
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown so buffered
/// entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("taskboard.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Main application loop.
async fn run_app<R: TaskRepository + 'static>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    repo: R,
    config: &ClientConfig,
) -> io::Result<()> {
    let (notifier, mut notices) = Notifier::channel(config.notice_buffer, config.notice_durations());
    let board = Board::new(TaskEngine::new(repo), notifier, config.board());
    let mut app = App::new(board, config.date_format.clone());

    tokio::spawn(app.start());

    loop {
        // Step 1: Draw the UI frame.
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Step 2: Drain notices posted by settled mutations.
        drain_notices(&mut app, &mut notices);

        // Step 3: Poll for terminal input events.
        if event::poll(config.poll_timeout)?
            && let Event::Key(key) = event::read()?
        {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Some(job) = app.handle_key_event(key) {
                tokio::spawn(job);
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn drain_notices<R: TaskRepository + 'static>(
    app: &mut App<R>,
    rx: &mut mpsc::Receiver<Notice>,
) {
    while let Ok(notice) = rx.try_recv() {
        tracing::debug!(kind = ?notice.kind, text = %notice.text, "notice");
        app.push_notice(notice);
    }
}
