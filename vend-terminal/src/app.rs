//! Wires the client together and runs it until shutdown.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use vend_core::events::{PushEventBus, driver_command_channel};
use vend_core::processors::{ConnectionDriver, EventListener};
use vend_core::request::RequestClient;
use vend_core::state::{Banners, ClientState, StateStore};
use vend_sdk::client::{PushClient, VendClient};

use crate::config::LoadedConfig;
use crate::input::{Command, HELP};
use crate::render::Renderer;

pub struct App {
    store: StateStore<ClientState>,
    banners: Banners,
    http: Arc<VendClient>,
    request: RequestClient<VendClient>,
    shutdown_tx: Arc<watch::Sender<bool>>,
    tasks: Vec<JoinHandle<()>>,
}

impl App {
    /// Build every component and start the background tasks.
    pub fn start(config: LoadedConfig, shutdown_tx: Arc<watch::Sender<bool>>) -> anyhow::Result<Self> {
        let client_config = config.client;

        let http_client = reqwest::Client::builder()
            .timeout(client_config.request_timeout)
            .build()?;
        let mut vend_client =
            VendClient::new(config.server.base_url.clone()).with_http_client(http_client);
        if let Some(api_key) = config.server.api_key {
            vend_client = vend_client.with_api_key(api_key);
        }
        let http = Arc::new(vend_client);

        let store = StateStore::new(ClientState::default());
        let banners = Banners::new(store.clone(), client_config.banners);
        let request = RequestClient::new(
            Arc::clone(&http),
            store.clone(),
            banners.clone(),
            client_config.reselect_delay,
        )
        .with_form_fields(config.form_fields);

        let bus = PushEventBus::new();
        let (command_tx, command_rx) = driver_command_channel();

        let listener = EventListener::new(store.clone(), banners.clone(), command_tx);
        let driver = ConnectionDriver::new(
            PushClient::new(config.server.push_url, client_config.connect_timeout),
            bus.clone(),
            client_config.reconnect_delay,
        );
        let renderer = Renderer::new(store.clone());

        // The listener must be subscribed before the driver publishes.
        let tasks = vec![
            tokio::spawn(listener.run(shutdown_tx.subscribe(), bus.subscribe())),
            tokio::spawn(driver.run(shutdown_tx.subscribe(), command_rx)),
            tokio::spawn(renderer.run(shutdown_tx.subscribe())),
        ];

        Ok(Self {
            store,
            banners,
            http,
            request,
            shutdown_tx,
            tasks,
        })
    }

    /// Feed user commands to the client until the user quits, input ends,
    /// or shutdown is signaled. Then stop every task.
    pub async fn run(self, mut commands: mpsc::Receiver<Command>) {
        self.request.select_address().await;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            let command = tokio::select! {
                biased;

                _ = shutdown_rx.wait_for(|stop| *stop) => break,
                command = commands.recv() => match command {
                    Some(command) => command,
                    None => {
                        tracing::info!("Input closed");
                        break;
                    }
                },
            };

            if !self.handle(command).await {
                break;
            }
        }

        self.shutdown().await;
    }

    /// Returns `false` when the user asked to quit.
    ///
    /// Typed text keeps the input deselected so the next line appends;
    /// every other command re-selects it after the configured delay.
    async fn handle(&self, command: Command) -> bool {
        tracing::debug!(?command, "Handling input");
        match command {
            Command::Type(text) => {
                self.request.type_address(&text).await;
                return true;
            }
            Command::Vend => {
                self.request.submit_vend().await;
            }
            Command::Clear => {
                self.request.address_changed("").await;
            }
            Command::Status => {
                self.fetch_status();
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => return false,
            Command::Unknown(name) => {
                self.banners.info(format!("Unknown command :{name}")).await;
            }
        }
        self.request.reselect_address();
        true
    }

    fn fetch_status(&self) -> JoinHandle<()> {
        let http = Arc::clone(&self.http);
        let store = self.store.clone();
        let banners = self.banners.clone();
        tokio::spawn(async move {
            match http.get_status().await {
                Ok(snapshot) => {
                    store.modify(|state| state.set_status(&snapshot.status)).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Status request failed");
                    banners.error(format!("Error getting status: {e}")).await;
                }
            }
        })
    }

    async fn shutdown(self) {
        tracing::info!("Shutting down");
        self.shutdown_tx.send_replace(true);
        self.banners.cancel_timers();
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::error!("Task failed during shutdown: {}", e);
            }
        }
    }
}
