//! Monitor runtime: owns the terminal, runs the event loop, executes effects.
//!
//! This is the Elm-runtime boundary. All side effects happen here; the
//! reducer stays pure and only describes them.
//!
//! ## Inbox Pattern
//!
//! - Handlers send `UiEvent`s to `inbox_tx`
//! - The runtime drains `inbox_rx` every loop iteration
//! - The refresh ticker posts `RefreshTick` into the same inbox
//!
//! Structure:
//! - `mod.rs`: `MonitorRuntime`, event loop, effect dispatch
//! - `inbox.rs`: inbox channel types
//! - `handlers/`: effect implementations (database, clipboard, editor)

pub mod handlers;
pub mod inbox;

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use inbox::{UiEventReceiver, UiEventSender};
use td_core::{ConfigStore, Database};
use tokio_util::sync::CancellationToken;

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::AppState;
use crate::terminal::{self, MonitorTerminal};
use crate::{render, update};

/// Frame cadence while the user is interacting.
pub const FRAME_DURATION: Duration = Duration::from_millis(16);

/// Poll timeout when nothing is happening.
pub const IDLE_POLL_DURATION: Duration = Duration::from_millis(100);

/// Collaborators effects run against.
#[derive(Clone)]
pub struct Services {
    pub db: Arc<dyn Database>,
    pub config: Arc<dyn ConfigStore>,
}

pub struct MonitorRuntime {
    /// Present while the monitor owns the screen.
    terminal: Option<MonitorTerminal>,
    pub state: AppState,
    services: Services,
    inbox_tx: UiEventSender,
    inbox_rx: UiEventReceiver,
    /// Stops the refresh ticker.
    ticker: CancellationToken,
    last_tick: Instant,
    last_terminal_event: Instant,
}

impl MonitorRuntime {
    pub fn new(state: AppState, services: Services) -> Self {
        let (inbox_tx, inbox_rx) = inbox::channel();
        let now = Instant::now();
        Self {
            terminal: None,
            state,
            services,
            inbox_tx,
            inbox_rx,
            ticker: CancellationToken::new(),
            last_tick: now,
            last_terminal_event: now,
        }
    }

    /// Sender for events posted from outside the loop.
    pub fn inbox(&self) -> UiEventSender {
        self.inbox_tx.clone()
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Takes over the terminal and runs until the user quits.
    ///
    /// Must be called inside a tokio runtime.
    ///
    /// # Errors
    /// Returns an error if the terminal cannot be set up or drawn to.
    pub fn run(&mut self) -> Result<()> {
        terminal::install_panic_hook();
        self.terminal = Some(terminal::setup_terminal().context("Failed to setup terminal")?);
        terminal::enable_input_features()?;
        self.start_ticker();

        let effects = self.state.init();
        self.execute_effects(effects);
        let result = self.event_loop();

        self.ticker.cancel();
        let _ = terminal::disable_input_features();
        if self.terminal.take().is_some() {
            terminal::restore_terminal()?;
        }
        result
    }

    /// Stops the ticker. In-flight effects finish but nobody reads them.
    pub fn stop(&self) {
        self.ticker.cancel();
    }

    fn start_ticker(&self) {
        let tx = self.inbox_tx.clone();
        let token = self.ticker.clone();
        let period = self.state.tui.options.refresh_interval.max(Duration::from_millis(100));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately; init already fetched.
            interval.tick().await;
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = interval.tick() => {
                        if tx.send(UiEvent::RefreshTick).is_err() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("ticker_stopped");
        });
    }

    fn event_loop(&mut self) -> Result<()> {
        let mut dirty = true;

        while !self.state.tui.should_quit {
            let mut events = self.collect_events()?;

            // Layout updates happen before anything else in the batch.
            let size = self.terminal_mut()?.size().context("Failed to read terminal size")?;
            events.insert(
                0,
                UiEvent::Frame {
                    width: size.width,
                    height: size.height,
                },
            );

            for event in events {
                if matches!(&event, UiEvent::Terminal(_)) {
                    self.last_terminal_event = Instant::now();
                }
                // Only Tick triggers a render, capping the frame rate.
                if matches!(&event, UiEvent::Tick) {
                    dirty = true;
                }
                let effects = update::update(&mut self.state, event);
                self.execute_effects(effects);
            }

            if dirty {
                let state = &self.state;
                let terminal = self
                    .terminal
                    .as_mut()
                    .context("Terminal is not initialised")?;
                terminal
                    .draw(|frame| render::render(state, frame))
                    .context("Failed to draw frame")?;
                dirty = false;
            }
        }
        Ok(())
    }

    fn terminal_mut(&mut self) -> Result<&mut MonitorTerminal> {
        self.terminal.as_mut().context("Terminal is not initialised")
    }

    // ========================================================================
    // Event Collection
    // ========================================================================

    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();

        let recent_input = self.last_terminal_event.elapsed() < IDLE_POLL_DURATION;
        let tick_interval = if recent_input || self.state.tui.fetch.in_flight {
            FRAME_DURATION
        } else {
            IDLE_POLL_DURATION
        };

        self.collect_inbox_events(&mut events);

        // Block until the next tick only when there is nothing to process.
        let poll_duration = if events.is_empty() {
            tick_interval.saturating_sub(self.last_tick.elapsed())
        } else {
            Duration::ZERO
        };
        if event::poll(poll_duration).context("Failed to poll terminal")? {
            events.push(UiEvent::Terminal(event::read().context("Failed to read terminal event")?));
            while event::poll(Duration::ZERO).context("Failed to poll terminal")? {
                events.push(UiEvent::Terminal(event::read().context("Failed to read terminal event")?));
            }
        }

        if self.last_tick.elapsed() >= tick_interval {
            events.push(UiEvent::Tick);
            self.last_tick = Instant::now();
        }
        Ok(events)
    }

    fn collect_inbox_events(&mut self, events: &mut Vec<UiEvent>) {
        while let Ok(ev) = self.inbox_rx.try_recv() {
            events.push(ev);
        }
    }

    // ========================================================================
    // Effect Dispatch
    // ========================================================================

    fn execute_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    fn dispatch_event(&mut self, event: UiEvent) {
        let effects = update::update(&mut self.state, event);
        if !effects.is_empty() {
            self.execute_effects(effects);
        }
    }

    /// Spawns a handler and posts its result event to the inbox.
    fn spawn_effect<F, Fut>(&self, f: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = UiEvent> + Send + 'static,
    {
        let tx = self.inbox_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(f().await);
        });
    }

    fn execute_effect(&mut self, effect: UiEffect) {
        let db = Arc::clone(&self.services.db);
        match effect {
            UiEffect::Quit => {
                self.state.tui.should_quit = true;
            }

            // Reads
            UiEffect::FetchData(request) => {
                let config = Arc::clone(&self.services.config);
                tracing::debug!(seq = request.seq, query = %request.query, "refresh_started");
                self.spawn_effect(move || handlers::fetch_data(db, config, request));
            }
            UiEffect::FetchIssueDetails { issue_id } => {
                self.spawn_effect(move || handlers::fetch_issue_details(db, issue_id));
            }
            UiEffect::RenderMarkdown {
                issue_id,
                description,
                acceptance,
                width,
            } => {
                self.spawn_effect(move || {
                    handlers::render_issue_markdown(issue_id, description, acceptance, width)
                });
            }
            UiEffect::FetchStats => self.spawn_effect(move || handlers::fetch_stats(db)),
            UiEffect::FetchHandoffs => self.spawn_effect(move || handlers::fetch_handoffs(db)),

            // Writes
            UiEffect::Workflow { action, issue_id } => {
                let session_id = self.state.tui.session_id.clone();
                self.spawn_effect(move || handlers::run_workflow(db, action, issue_id, session_id));
            }
            UiEffect::SubmitForm(submission) => {
                let session_id = self.state.tui.session_id.clone();
                self.spawn_effect(move || handlers::submit_issue_form(db, session_id, submission));
            }
            UiEffect::SetPaneHeights { heights } => {
                let config = Arc::clone(&self.services.config);
                self.spawn_effect(move || handlers::save_pane_heights(config, heights));
            }

            // UI
            UiEffect::CopyToClipboard { text, label } => {
                self.spawn_effect(move || handlers::copy_to_clipboard(text, label));
            }
            UiEffect::ScheduleClearStatus { generation, after } => {
                self.spawn_effect(move || handlers::clear_status_after(generation, after));
            }
            UiEffect::OpenEditor { field, content } => {
                let result = self.run_editor(&content);
                self.dispatch_event(UiEvent::EditorFinished {
                    field,
                    result: result.map_err(|e| handlers::error_text(&e)),
                });
            }
        }
    }

    /// Runs the editor in the foreground with the terminal handed over.
    fn run_editor(&mut self, content: &str) -> Result<String> {
        let command = handlers::editor_command();
        let Some(terminal) = self.terminal.as_mut() else {
            return handlers::edit_in_editor(&command, content);
        };
        terminal::suspend()?;
        let result = handlers::edit_in_editor(&command, content);
        terminal::resume(terminal)?;
        result
    }
}

impl Drop for MonitorRuntime {
    fn drop(&mut self) {
        self.ticker.cancel();
        if self.terminal.is_some() {
            let _ = terminal::restore_terminal();
        }
    }
}
