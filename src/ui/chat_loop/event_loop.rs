//! Event polling, dispatching, and the redraw loop.
//!
//! Terminal input is read on a background task and forwarded over a
//! channel. Sends run as Tokio tasks and report back over a second channel,
//! tagged with their send id, so all state changes happen here.

use std::{
    error::Error,
    time::{Duration, Instant},
};

use ratatui::crossterm::event::{self, Event, KeyEventKind};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::core::config::Config;
use crate::core::controller::{ConversationController, PendingSend};
use crate::core::providers::{EnvCredentials, ProviderRegistry};
use crate::core::service::ChatService;
use crate::core::store::{FileKeyValueStore, PersistentState};
use crate::ui::renderer::ui;

use super::keybindings::{resolve_key, KeyAction};
use super::lifecycle::{restore_terminal, setup_terminal, ChatTerminal};
use super::state::{ChatApp, SendOutcome};

const SCROLL_STEP: u16 = 10;
const ANIMATION_INTERVAL: Duration = Duration::from_millis(80);

#[derive(Debug)]
pub enum UiEvent {
    Crossterm(Event),
}

fn spawn_event_reader(event_tx: mpsc::UnboundedSender<UiEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Ok(true) = event::poll(Duration::from_millis(10)) {
                match event::read() {
                    Ok(ev) => {
                        if event_tx.send(UiEvent::Crossterm(ev)).is_err() {
                            break;
                        }
                    }
                    Err(_) => continue,
                }
            } else {
                tokio::task::yield_now().await;
            }
        }
    })
}

fn spawn_send(
    service: &ChatService,
    app: &ChatApp,
    pending: PendingSend,
    outcome_tx: &mpsc::UnboundedSender<SendOutcome>,
) {
    let service = service.clone();
    let provider = app.provider.clone();
    let outcome_tx = outcome_tx.clone();
    debug!(send_id = pending.send_id, provider = %provider.id(), "spawning send");
    tokio::spawn(async move {
        let result = service
            .send(&pending.history, &provider)
            .await
            .map_err(|err| err.to_string());
        let _ = outcome_tx.send(SendOutcome {
            send_id: pending.send_id,
            result,
        });
    });
}

/// Apply one key press. Returns a send to spawn, if any.
fn handle_key(app: &mut ChatApp, key: event::KeyEvent) -> Option<PendingSend> {
    match resolve_key(key, app.focus) {
        KeyAction::Quit => app.quit(),
        KeyAction::Send => return app.submit(),
        KeyAction::InsertNewline => app.textarea.insert_newline(),
        KeyAction::NewConversation => app.new_conversation(),
        KeyAction::ToggleTheme => app.toggle_theme(),
        KeyAction::ToggleSidebar => app.toggle_sidebar(),
        KeyAction::CycleProvider => app.cycle_provider(&EnvCredentials),
        KeyAction::AttachFromInput => app.attach_from_input(),
        KeyAction::ClearAttachments => app.clear_attachments(),
        KeyAction::ToggleExplanations => app.toggle_explanations(),
        KeyAction::CopyLastCodeBlock => app.copy_last_code_block(),
        KeyAction::ToggleFocus => app.toggle_focus(),
        KeyAction::ScrollUp => app.scroll_up(SCROLL_STEP),
        KeyAction::ScrollDown => app.scroll_down(SCROLL_STEP),
        KeyAction::SidebarUp => app.sidebar_up(),
        KeyAction::SidebarDown => app.sidebar_down(),
        KeyAction::SidebarLoad => app.load_selected(),
        KeyAction::SidebarDelete => app.delete_selected(),
        KeyAction::Edit => {
            app.textarea.input(tui_textarea::Input::from(key));
        }
        KeyAction::Ignore => {}
    }
    None
}

fn bootstrap_app(config: &Config, provider: Option<&str>) -> Result<ChatApp, Box<dyn Error>> {
    let data_dir = config.resolve_data_dir()?;
    let state = PersistentState::new(Box::new(FileKeyValueStore::new(&data_dir)));
    let controller = ConversationController::load(&state);

    let registry = ProviderRegistry::from_config(config);
    let resolved = registry.resolve(&EnvCredentials, provider);
    info!(
        provider = %resolved.id(),
        has_key = resolved.has_credential(),
        "starting chat"
    );

    let mut app = ChatApp::new(controller, state, registry, resolved, config.explain_code());
    if !app.provider.has_credential() {
        app.status = Some(format!(
            "No API key for {} (set {}); replies will be simulated",
            app.provider.display_name(),
            app.provider.descriptor.api_key_env
        ));
    }
    Ok(app)
}

async fn run_loop(
    terminal: &mut ChatTerminal,
    app: &mut ChatApp,
    service: &ChatService,
) -> Result<(), Box<dyn Error>> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UiEvent>();
    let event_reader = spawn_event_reader(event_tx);
    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel::<SendOutcome>();

    let mut request_redraw = true;
    let mut last_tick = Instant::now();

    let result = loop {
        if app.exit_requested {
            break Ok(());
        }

        if request_redraw {
            if let Err(err) = terminal.draw(|f| ui(f, app)) {
                break Err(err.into());
            }
            request_redraw = false;
        }

        let mut processed = false;
        while let Ok(UiEvent::Crossterm(ev)) = event_rx.try_recv() {
            processed = true;
            match ev {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if let Some(pending) = handle_key(app, key) {
                        spawn_send(service, app, pending, &outcome_tx);
                    }
                }
                Event::Paste(text) => {
                    app.textarea.insert_str(text);
                }
                _ => {}
            }
        }

        while let Ok(outcome) = outcome_rx.try_recv() {
            processed = true;
            app.apply_outcome(outcome);
        }

        if app.controller.is_awaiting_response() && last_tick.elapsed() >= ANIMATION_INTERVAL {
            app.tick = app.tick.wrapping_add(1);
            last_tick = Instant::now();
            processed = true;
        }

        if processed {
            request_redraw = true;
        } else {
            tokio::time::sleep(Duration::from_millis(16)).await;
        }
    };

    event_reader.abort();
    result
}

pub async fn run_chat(config: Config, provider: Option<String>) -> Result<(), Box<dyn Error>> {
    let mut app = bootstrap_app(&config, provider.as_deref())?;
    let service = ChatService::new(reqwest::Client::new(), config.temperature(), config.explain_code());

    let mut terminal = setup_terminal()?;
    let result = run_loop(&mut terminal, &mut app, &service).await;
    restore_terminal(&mut terminal)?;
    result
}
