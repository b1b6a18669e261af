// Composition root: wires the repository, coordinator, service and TUI together

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use gitpane_core::domain::{SelectedItem, TaskEvent};
use gitpane_core::ports::{AppConfig, ConfigStore, RepositoryPort};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::adapters::{git::Git2Repository, persistence::FileConfigStore};
use crate::services::{
    app_service::AppService,
    errors_manager::ErrorsManager,
    tab_state::{OperationState, TabState},
};
use crate::tui::{Theme, TuiMessage, TuiModel, TuiUpdate, TuiView};

/// Startup options collected by the binary
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Repository to open; falls back to the most recent one, then the current directory
    pub repo: Option<PathBuf>,
    /// Config file overriding the platform default location
    pub config_path: Option<PathBuf>,
}

/// Repository to open: explicit path, else most recently opened, else `cwd`
pub fn resolve_repository_path(requested: Option<&Path>, config: &AppConfig, cwd: &Path) -> PathBuf {
    requested
        .map(Path::to_path_buf)
        .or_else(|| config.recent_repositories.first().cloned())
        .unwrap_or_else(|| cwd.to_path_buf())
}

/// Load the config, open the repository and record it as most recent
pub fn open_repository(store: &dyn ConfigStore, options: &Options) -> Result<(AppConfig, Git2Repository)> {
    let mut config = store.load()?;
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let path = resolve_repository_path(options.repo.as_deref(), &config, &cwd);

    let repository = Git2Repository::open(&path)?;
    info!("Opened repository {}", repository.meta());

    config.remember_repository(repository.meta().path.clone());
    if let Err(e) = store.save(&config) {
        // Not fatal; the session works without persisting the history
        warn!("Failed to save config: {:#}", e);
    }

    Ok((config, repository))
}

/// The running application
pub struct GitpaneApp {
    service: AppService,
    errors: Arc<ErrorsManager>,
    tui_model: TuiModel,
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    event_rx: mpsc::UnboundedReceiver<gitpane_core::domain::Event>,
    task_rx: broadcast::Receiver<TaskEvent>,
    state_rx: watch::Receiver<OperationState>,
    selection_rx: watch::Receiver<SelectedItem>,
}

impl GitpaneApp {
    /// Build every component. Must be called inside a tokio runtime.
    pub fn new(options: Options) -> Result<Self> {
        info!("Initializing gitpane");

        let store = match &options.config_path {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new()?,
        };
        debug!("Using config file {}", store.path().display());

        let (config, repository) = open_repository(&store, &options)?;
        let meta = repository.meta();

        let errors = Arc::new(ErrorsManager::new());
        let tab = TabState::new(errors.clone(), config.coordinator);
        tab.attach(Arc::new(repository));

        let task_rx = tab.subscribe_task_events();
        let state_rx = tab.operation_state();
        let selection_rx = tab.selected_item();

        let (service, event_rx) = AppService::new(tab, config.ui.clone());

        let mut tui_model = TuiModel::new(Theme::from_name(config.ui.theme));
        tui_model.repo = Some(meta);

        let terminal = setup_terminal()?;

        Ok(Self {
            service,
            errors,
            tui_model,
            terminal,
            event_rx,
            task_rx,
            state_rx,
            selection_rx,
        })
    }

    pub async fn run(mut self) -> Result<()> {
        info!("Starting gitpane");
        self.service.start();

        let result = self.run_main_loop().await;

        self.service.tab().close();
        shutdown(&mut self.terminal)?;

        result
    }

    async fn run_main_loop(&mut self) -> Result<()> {
        let mut needs_redraw = true;

        loop {
            needs_redraw |= self.drain_background();

            if event::poll(Duration::from_millis(10))? {
                match event::read()? {
                    Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                        let message = TuiUpdate::handle_key(&mut self.tui_model, key_event.code, key_event.modifiers)?;
                        if let TuiMessage::Command(cmd) = message {
                            // Operations report through the error sink; handles are not awaited
                            let _ = self.service.handle_command(cmd);
                        }
                        needs_redraw = true;
                    }
                    Event::Resize(width, height) => {
                        TuiUpdate::handle_resize(&mut self.tui_model, width, height)?;
                        needs_redraw = true;
                    }
                    _ => {}
                }
            }

            if self.tui_model.should_quit {
                info!("Quit requested, exiting main loop");
                break;
            }

            if needs_redraw {
                let model = &self.tui_model;
                self.terminal.draw(|frame| TuiView::render(model, frame))?;
                needs_redraw = false;
            }

            // Small sleep to prevent busy waiting
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        Ok(())
    }

    /// Pull everything the background tasks produced into the model.
    /// Returns whether anything changed.
    fn drain_background(&mut self) -> bool {
        let mut changed = false;
        let model = &mut self.tui_model;

        while let Ok(event) = self.event_rx.try_recv() {
            debug!("Received event: {:?}", event);
            model.apply_event(&event);
            changed = true;
        }

        loop {
            match self.task_rx.try_recv() {
                Ok(task) => {
                    model.handle_task_event(&task);
                    changed = true;
                }
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "UI lagged behind task events");
                }
                Err(_) => break,
            }
        }

        if self.state_rx.has_changed().unwrap_or(false) {
            model.operation = *self.state_rx.borrow_and_update();
            changed = true;
        }

        if self.selection_rx.has_changed().unwrap_or(false) {
            model.selection = self.selection_rx.borrow_and_update().clone();
            changed = true;
        }

        let errors = self.errors.drain();
        if !errors.is_empty() {
            model.add_errors(errors);
            changed = true;
        }

        changed
    }
}

/// Raw mode plus alternate screen. Raw mode is undone if the rest fails.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    undo_on_error(
        || {
            let mut stdout = io::stdout();
            execute!(stdout, EnterAlternateScreen)?;
            Ok(Terminal::new(CrosstermBackend::new(stdout))?)
        },
        disable_raw_mode,
    )
}

fn undo_on_error<T>(setup: impl FnOnce() -> Result<T>, undo: impl FnOnce() -> io::Result<()>) -> Result<T> {
    let result = setup();
    if result.is_err() {
        if let Err(e) = undo() {
            warn!("Failed to undo terminal setup: {}", e);
        }
    }
    result
}

/// Restore the terminal
fn shutdown(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    info!("Shutting down gitpane");

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(())
}

/// Entry point used by the binary
pub async fn run(options: Options) -> Result<()> {
    let app = GitpaneApp::new(options)?;
    if let Err(e) = app.run().await {
        error!("Application error: {:#}", e);
        return Err(e);
    }

    info!("gitpane shut down cleanly");
    Ok(())
}
