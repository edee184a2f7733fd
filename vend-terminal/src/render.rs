//! Renders the client state to stdout.
//!
//! [`render`] is the single render step: it turns a [`ClientState`] into
//! the text the user sees. [`Renderer`] calls it whenever the store
//! changes.

use std::fmt::Write as _;
use std::io::Write as _;

use tokio::sync::watch;
use vend_core::state::{BannerKind, ClientState, StateStore};

pub fn render(state: &ClientState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Status:  {}", state.status_text);
    if !state.credit_text.is_empty() {
        let _ = writeln!(out, "Credit:  {}", state.credit_text);
    }

    let marker = if state.address.selected { "*" } else { "" };
    let _ = writeln!(out, "Address: [{}]{}", state.address.value, marker);
    let _ = writeln!(out, "Price:   {}", state.price_text());

    for kind in BannerKind::ALL {
        if let Some(text) = state.banners.text(kind) {
            let _ = writeln!(out, "[{kind}] {text}");
        }
    }
    out
}

pub struct Renderer {
    store: StateStore<ClientState>,
}

impl Renderer {
    pub fn new(store: StateStore<ClientState>) -> Self {
        Self { store }
    }

    /// Print the state once, then again after every change that alters
    /// the rendered text.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        let mut watcher = self.store.subscribe();
        let mut last = String::new();

        loop {
            let frame = render(&*self.store.read().await);
            if frame != last {
                print_frame(&frame);
                last = frame;
            }

            tokio::select! {
                biased;

                _ = shutdown_rx.wait_for(|stop| *stop) => break,
                changed = watcher.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::debug!("Renderer stopped");
    }
}

fn print_frame(frame: &str) {
    let mut stdout = std::io::stdout().lock();
    let _ = writeln!(stdout, "{frame}");
    let _ = stdout.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use vend_core::config::BannerDurations;
    use vend_core::state::{Banners, ConnectionState};

    #[test]
    fn test_render_initial_state() {
        let state = ClientState::default();
        assert_eq!(
            render(&state),
            "Status:  Connecting\nAddress: []\nPrice:   \n"
        );
    }

    #[tokio::test]
    async fn test_render_address_and_banners() {
        let store = StateStore::new(ClientState::default());
        let banners = Banners::new(store.clone(), BannerDurations::default());
        store
            .modify(|state| {
                state.set_connection(ConnectionState::Connected);
                state.credit_text = "$2.00".to_string();
                state.edit_address("A1");
                state.select_address();
            })
            .await;
        banners.error("Insufficient credit").await;
        banners.success("Vend Completed").await;

        let frame = render(&*store.read().await);
        assert_eq!(
            frame,
            "Status:  Connected\n\
             Credit:  $2.00\n\
             Address: [A1]*\n\
             Price:   \n\
             [error] Insufficient credit\n\
             [success] Vend Completed\n"
        );
        banners.cancel_timers();
    }
}
