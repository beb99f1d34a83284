use std::io;
use std::time::Duration;

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

use aim_studio::config::AppConfig;
use aim_studio::tui::app::AppState;
use aim_studio::tui::services::Services;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load();

    // Logs go to a file; stdout belongs to the terminal UI
    let _log_guard = aim_studio::core::logging::init_tui(&config.log_dir());
    log::info!("{} v{} starting", aim_studio::NAME, aim_studio::VERSION);

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let services = Services::init(&config, event_tx.clone())?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    if config.tui.mouse_enabled {
        execute!(stdout, EnableMouseCapture)?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let mut app = AppState::new(event_rx, event_tx, services);
    let result = app
        .run(&mut terminal, Duration::from_millis(config.tui.tick_rate_ms))
        .await;

    // Restore terminal
    disable_raw_mode()?;
    if config.tui.mouse_enabled {
        execute!(terminal.backend_mut(), DisableMouseCapture)?;
    }
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        log::error!("Event loop failed: {e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    log::info!("Shutting down");
    Ok(())
}
