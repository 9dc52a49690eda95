use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use status_board::{
    BoardConfig, BoardState, HttpStatusSource, Poller, widget::render_board,
};
use std::{
    error::Error,
    fs::File,
    io,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};
use tokio::sync::watch;
use tracing::info;

const DEFAULT_LOG_FILE: &str = "status-board.log";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = BoardConfig::from_env()?;
    init_logging()?;

    let source = HttpStatusSource::from_config(&config.poller)?;
    let endpoint = source.url().to_string();
    info!(
        %endpoint,
        universe = ?config.universe,
        identity_scheme = ?config.identity_scheme,
        "starting status board"
    );

    let poller = Poller::new(Arc::new(source), config.validator(), config.poller.interval);
    let (handle, updates) = poller.start(BoardState::new(config.table()));

    // Setup panic hook to restore terminal on crash
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, updates, &endpoint).await;

    handle.cancel();

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    let board = handle.join().await?;
    info!(stats = ?board.stats, "status board stopped");

    res.map_err(Into::into)
}

/// Log to a file; stdout belongs to the terminal UI.
fn init_logging() -> Result<(), Box<dyn Error>> {
    let path = std::env::var("STATUS_BOARD_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
    let file = File::create(path)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    updates: watch::Receiver<Arc<BoardState>>,
    endpoint: &str,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        let snapshot = Arc::clone(&updates.borrow());

        terminal.draw(|f| render_board(f, &snapshot, endpoint))?;

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.code == KeyCode::Char('q') || key.code == KeyCode::Esc {
                    return Ok(());
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }
}
