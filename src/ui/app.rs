use anyhow::Result;
use tokio::sync::mpsc;
use tracing::info;

use super::{view, EventHandler, Screen};
use crate::app::{self, AppState, EffectRunner, Message, Settings};
use crate::config::Config;
use crate::session::Credentials;
use crate::spotify::{Refresher, SpotifyClient};
use crate::store::CredentialStore;

/// The interactive session. Owns the terminal, the queue and the runner; the
/// reducer is the only thing that changes `state`.
pub struct App {
    screen: Screen,
    state: AppState,
    runner: EffectRunner,
    rx: mpsc::UnboundedReceiver<Message>,
    _events: EventHandler,
}

impl App {
    pub fn new(
        config: &Config,
        credentials: Credentials,
        client: SpotifyClient,
        refresher: Refresher,
        store: CredentialStore,
    ) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let screen = Screen::enter()?;

        let mut state = AppState::new(credentials, Settings::from(config));
        state.viewport = screen.size()?;

        let events = EventHandler::spawn(tx.clone());
        let runner = EffectRunner::new(client, refresher, store, tx);

        Ok(Self {
            screen,
            state,
            runner,
            rx,
            _events: events,
        })
    }

    pub async fn run(mut self) -> Result<()> {
        info!("interactive session started");
        for effect in app::init(&mut self.state) {
            self.runner.run(effect);
        }

        while !self.state.should_quit {
            let state = &self.state;
            self.screen.draw(|f| view::render(f, state))?;

            let Some(msg) = self.rx.recv().await else {
                break;
            };
            self.dispatch(msg);
            // whatever else already arrived goes in before the next frame
            while let Ok(msg) = self.rx.try_recv() {
                self.dispatch(msg);
                if self.state.should_quit {
                    break;
                }
            }
        }

        info!("interactive session ended");
        Ok(())
    }

    fn dispatch(&mut self, msg: Message) {
        for effect in app::update(&mut self.state, msg) {
            self.runner.run(effect);
        }
    }
}
