//! TUI runtime: owns the terminal, runs the event loop, executes effects.
//!
//! All side effects happen here. The reducer produces effects; this module
//! executes them and feeds results back as `UiEvent`s.
//!
//! Async work (responder calls) is spawned on tokio and reports through the
//! inbox channel, which the loop drains every iteration.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use parley_core::responder::{Responder, respond_within};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::AppState;
use crate::terminal::{self, Tui};
use crate::{clipboard, render, update};

/// Tick cadence while something animates (~60fps).
pub const FRAME_DURATION: Duration = Duration::from_millis(16);

/// Tick cadence when nothing is happening.
pub const IDLE_POLL_DURATION: Duration = Duration::from_millis(100);

pub struct TuiRuntime {
    terminal: Tui,
    pub state: AppState,
    responder: Arc<dyn Responder>,
    inbox_tx: mpsc::UnboundedSender<UiEvent>,
    inbox_rx: mpsc::UnboundedReceiver<UiEvent>,
    last_tick: Instant,
    last_terminal_event: Instant,
}

impl TuiRuntime {
    pub fn new(state: AppState, responder: Arc<dyn Responder>) -> Result<Self> {
        terminal::install_panic_hook();
        let terminal = terminal::enter().context("Failed to setup terminal")?;
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();

        let now = Instant::now();
        Ok(Self {
            terminal,
            state,
            responder,
            inbox_tx,
            inbox_rx,
            last_tick: now,
            last_terminal_event: now,
        })
    }

    /// Runs until the user quits.
    pub fn run(&mut self) -> Result<()> {
        let mut dirty = true;

        while !self.state.should_quit {
            let mut events = self.collect_events()?;

            let size = self.terminal.size()?;
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
                // Renders are batched to the tick cadence.
                if matches!(&event, UiEvent::Tick) {
                    dirty = true;
                }
                self.dispatch_event(event);
            }

            if dirty && !self.state.should_quit {
                self.terminal.draw(|frame| render::render(&self.state, frame))?;
                dirty = false;
            }
        }

        info!(
            turns = self.state.session.transcript().len(),
            "chat session ended"
        );
        Ok(())
    }

    // ========================================================================
    // Event Collection
    // ========================================================================

    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();

        let recent_terminal_activity = self.last_terminal_event.elapsed() < IDLE_POLL_DURATION;
        let needs_fast_poll = self.state.session.is_pending()
            || self.state.copies.has_pending()
            || recent_terminal_activity;
        let tick_interval = if needs_fast_poll {
            FRAME_DURATION
        } else {
            IDLE_POLL_DURATION
        };

        while let Ok(event) = self.inbox_rx.try_recv() {
            events.push(event);
        }

        let poll_duration = if events.is_empty() {
            tick_interval.saturating_sub(self.last_tick.elapsed())
        } else {
            Duration::ZERO
        };
        if event::poll(poll_duration)? {
            events.push(UiEvent::Terminal(event::read()?));
            while event::poll(Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
        }

        if self.last_tick.elapsed() >= tick_interval {
            events.push(UiEvent::Tick);
            self.last_tick = Instant::now();
        }

        Ok(events)
    }

    // ========================================================================
    // Effect Dispatch
    // ========================================================================

    fn dispatch_event(&mut self, event: UiEvent) {
        let effects = update::update(&mut self.state, event);
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    /// Spawns async work whose result comes back through the inbox.
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
        match effect {
            UiEffect::Quit => {
                self.state.should_quit = true;
            }
            UiEffect::SendMessage { exchange } => {
                let responder = Arc::clone(&self.responder);
                let timeout = self.state.session.timeout();
                debug!(exchange_id = %exchange.id, "dispatching exchange");
                self.spawn_effect(move || async move {
                    let result = respond_within(responder.as_ref(), exchange.request, timeout).await;
                    UiEvent::ReplyReceived {
                        id: exchange.id,
                        result,
                    }
                });
            }
            UiEffect::CopyToClipboard { block, text } => {
                // Inline: OSC 52 shares stdout with the terminal backend.
                let result = clipboard::copy(&text);
                self.dispatch_event(UiEvent::CopyFinished { block, result });
            }
        }
    }
}

impl Drop for TuiRuntime {
    fn drop(&mut self) {
        let _ = terminal::leave();
    }
}
