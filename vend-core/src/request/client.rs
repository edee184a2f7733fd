//! Request Client.
//!
//! Turns user actions into HTTP calls and their failures into banners.
//! Calls are spawned, so callers never wait on the network; the returned
//! `JoinHandle`s exist for callers that want to (tests, mostly).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use vend_sdk::client::{ClientError, VendClient};
use vend_sdk::objects::{ChannelAddress, PriceQuote, VendForm};

use super::table::{PRICE_FAILURES, VEND_FAILURES};
use crate::state::{AddressDecision, Banners, ClientState, LookupToken, StateStore};

/// The HTTP operations the Request Client needs.
#[async_trait]
pub trait VendApi: Send + Sync + 'static {
    async fn submit_vend(&self, form: &VendForm) -> Result<(), ClientError>;

    async fn fetch_price(&self, address: &ChannelAddress) -> Result<PriceQuote, ClientError>;
}

#[async_trait]
impl VendApi for VendClient {
    async fn submit_vend(&self, form: &VendForm) -> Result<(), ClientError> {
        let body = VendClient::submit_vend(self, form).await?;
        debug!(%body, "vend request accepted");
        Ok(())
    }

    async fn fetch_price(&self, address: &ChannelAddress) -> Result<PriceQuote, ClientError> {
        VendClient::fetch_price(self, address).await
    }
}

pub struct RequestClient<A> {
    api: Arc<A>,
    store: StateStore<ClientState>,
    banners: Banners,
    form_fields: Arc<Vec<(String, String)>>,
    reselect_delay: Duration,
}

impl<A> Clone for RequestClient<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            store: self.store.clone(),
            banners: self.banners.clone(),
            form_fields: Arc::clone(&self.form_fields),
            reselect_delay: self.reselect_delay,
        }
    }
}

impl<A: VendApi> RequestClient<A> {
    pub fn new(
        api: Arc<A>,
        store: StateStore<ClientState>,
        banners: Banners,
        reselect_delay: Duration,
    ) -> Self {
        Self {
            api,
            store,
            banners,
            form_fields: Arc::new(Vec::new()),
            reselect_delay,
        }
    }

    /// Extra fields sent with every vend request, after the address.
    pub fn with_form_fields(mut self, fields: impl IntoIterator<Item = (String, String)>) -> Self {
        self.form_fields = Arc::new(fields.into_iter().collect());
        self
    }

    /// Type `input` into the address input.
    ///
    /// Replaces the current value while it is selected, appends otherwise.
    pub async fn type_address(&self, input: &str) -> Option<JoinHandle<()>> {
        let value = self
            .store
            .modify(|state| {
                let value = state.typed_address(input);
                state.deselect_address();
                value
            })
            .await;
        self.address_changed(&value).await
    }

    /// React to a new address input value.
    ///
    /// Looks the price up only for a complete address that differs from
    /// the previous value. Returns the lookup task, if one was started.
    pub async fn address_changed(&self, value: &str) -> Option<JoinHandle<()>> {
        let decision = self.store.modify(|state| state.edit_address(value)).await;
        match decision {
            AddressDecision::Lookup { address, token } => {
                debug!(%address, "looking up price");
                let this = self.clone();
                Some(tokio::spawn(async move {
                    let result = this.api.fetch_price(&address).await;
                    this.apply_price(&address, token, result).await;
                }))
            }
            AddressDecision::Unchanged => {
                debug!(value, "address unchanged, skipping price lookup");
                None
            }
            AddressDecision::Rejected => {
                debug!(value, "address too long, cleared");
                None
            }
            AddressDecision::Incomplete => None,
        }
    }

    async fn apply_price(
        &self,
        address: &ChannelAddress,
        token: LookupToken,
        result: Result<PriceQuote, ClientError>,
    ) {
        match result {
            Ok(quote) => {
                debug!(%address, price = %quote.price, "price received");
                let applied = self
                    .store
                    .modify(|state| {
                        if !state.price_lookup.is_current(token) {
                            return false;
                        }
                        state.set_price(quote);
                        true
                    })
                    .await;
                if !applied {
                    debug!(%address, "discarding stale price");
                }
            }
            Err(e) => {
                let feedback = PRICE_FAILURES.resolve(&e.failure());
                let applied = self
                    .store
                    .modify(|state| {
                        if !state.price_lookup.is_current(token) {
                            return false;
                        }
                        state.clear_price();
                        if feedback.clear_address {
                            state.clear_address();
                        }
                        true
                    })
                    .await;
                if !applied {
                    debug!(%address, error = %e, "discarding stale price failure");
                    return;
                }
                error!(%address, error = %e, "price lookup failed");
                if let Some(text) = feedback.banner {
                    self.banners.error(text).await;
                }
            }
        }
    }

    /// Submit the vend form for the current address.
    ///
    /// Success is only logged: the vend outcome arrives on the push
    /// channel.
    pub async fn submit_vend(&self) -> JoinHandle<()> {
        let address = self.store.read().await.address.value.clone();
        let form = self
            .form_fields
            .iter()
            .fold(VendForm::new(address), |form, (name, value)| {
                form.with_field(name.clone(), value.clone())
            });
        info!(address = form.address(), "submitting vend");

        let this = self.clone();
        tokio::spawn(async move {
            if let Err(e) = this.api.submit_vend(&form).await {
                this.vend_failed(&e).await;
            }
        })
    }

    async fn vend_failed(&self, e: &ClientError) {
        let feedback = VEND_FAILURES.resolve(&e.failure());
        error!(error = %e, "vend request failed");
        if let Some(text) = feedback.banner {
            self.banners.error(text).await;
        }
    }

    /// Select the address input now.
    pub async fn select_address(&self) {
        self.store.modify(ClientState::select_address).await;
    }

    /// Re-select the address input after the configured delay.
    pub fn reselect_address(&self) -> JoinHandle<()> {
        let store = self.store.clone();
        let delay = self.reselect_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            store.modify(ClientState::select_address).await;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BannerDurations;
    use crate::state::BannerKind;
    use rust_decimal::Decimal;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::sync::oneshot;
    use vend_sdk::client::StatusCode;

    type PriceResult = Result<PriceQuote, ClientError>;

    #[derive(Default)]
    struct FakeApi {
        price_calls: Mutex<Vec<String>>,
        prices: Mutex<HashMap<String, oneshot::Receiver<PriceResult>>>,
        vend_calls: Mutex<Vec<VendForm>>,
        vend_failure: Mutex<Option<ClientError>>,
    }

    impl FakeApi {
        fn respond(&self, address: &str, result: PriceResult) {
            let _ = self.respond_later(address).send(result);
        }

        fn respond_later(&self, address: &str) -> oneshot::Sender<PriceResult> {
            let (tx, rx) = oneshot::channel();
            self.prices.lock().unwrap().insert(address.to_string(), rx);
            tx
        }

        fn fail_vend(&self, status: StatusCode, body: &str) {
            *self.vend_failure.lock().unwrap() = Some(api_error(status, body));
        }

        fn price_calls(&self) -> Vec<String> {
            self.price_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VendApi for FakeApi {
        async fn submit_vend(&self, form: &VendForm) -> Result<(), ClientError> {
            self.vend_calls.lock().unwrap().push(form.clone());
            match self.vend_failure.lock().unwrap().take() {
                Some(e) => Err(e),
                None => Ok(()),
            }
        }

        async fn fetch_price(&self, address: &ChannelAddress) -> PriceResult {
            self.price_calls.lock().unwrap().push(address.to_string());
            let rx = self.prices.lock().unwrap().remove(address.as_str());
            match rx {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, ""))),
                None => Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, "unscripted")),
            }
        }
    }

    fn api_error(status: StatusCode, body: &str) -> ClientError {
        ClientError::Api {
            status,
            body: body.to_string(),
        }
    }

    fn quote(price: i64, text: &str) -> PriceQuote {
        PriceQuote {
            price: Decimal::from(price),
            text: text.to_string(),
        }
    }

    fn setup() -> (Arc<FakeApi>, StateStore<ClientState>, RequestClient<FakeApi>) {
        let api = Arc::new(FakeApi::default());
        let store = StateStore::new(ClientState::default());
        let banners = Banners::new(store.clone(), BannerDurations::default());
        let client = RequestClient::new(
            Arc::clone(&api),
            store.clone(),
            banners,
            Duration::from_millis(500),
        );
        (api, store, client)
    }

    async fn error_banner(store: &StateStore<ClientState>) -> Option<String> {
        store
            .read()
            .await
            .banners
            .text(BannerKind::Error)
            .map(str::to_owned)
    }

    #[tokio::test]
    async fn test_price_lookup_success() {
        let (api, store, client) = setup();
        api.respond("12", Ok(quote(150, "$1.50")));

        client.address_changed("12").await.unwrap().await.unwrap();

        assert_eq!(api.price_calls(), vec!["12"]);
        let state = store.read().await;
        assert_eq!(state.price_text(), "$1.50");
        assert_eq!(state.price.as_ref().map(|q| q.price), Some(Decimal::from(150)));
    }

    #[tokio::test]
    async fn test_no_lookup_for_incomplete_or_repeated_input() {
        let (api, store, client) = setup();
        api.respond("12", Ok(quote(150, "$1.50")));
        client.address_changed("12").await.unwrap().await.unwrap();

        // Key events for an unchanged value.
        assert!(client.address_changed("12").await.is_none());
        assert!(client.address_changed("12").await.is_none());
        assert_eq!(api.price_calls().len(), 1);
        assert_eq!(store.read().await.price_text(), "$1.50");

        assert!(client.address_changed("1").await.is_none());
        assert_eq!(store.read().await.price, None);
        assert!(client.address_changed("").await.is_none());
        assert_eq!(api.price_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_overlong_input_is_cleared_without_lookup() {
        let (api, store, client) = setup();
        assert!(client.address_changed("123").await.is_none());
        assert!(api.price_calls().is_empty());
        let state = store.read().await;
        assert_eq!(state.address.value, "");
        assert_eq!(state.price, None);
    }

    #[tokio::test]
    async fn test_unknown_address_clears_input() {
        for status in [StatusCode::NOT_FOUND, StatusCode::BAD_REQUEST] {
            let (api, store, client) = setup();
            api.respond("ZZ", Err(api_error(status, r#"{"error":"Item does not exist"}"#)));

            client.address_changed("ZZ").await.unwrap().await.unwrap();

            let state = store.read().await;
            assert_eq!(state.address.value, "", "{status}");
            assert_eq!(state.price, None);
            assert_eq!(state.banners.text(BannerKind::Error), None);
        }
    }

    #[tokio::test]
    async fn test_price_server_unavailable() {
        let (api, store, client) = setup();
        api.respond("12", Ok(quote(150, "$1.50")));
        client.address_changed("12").await.unwrap().await.unwrap();

        api.respond("13", Err(api_error(StatusCode::SERVICE_UNAVAILABLE, "")));
        client.address_changed("13").await.unwrap().await.unwrap();

        assert_eq!(error_banner(&store).await.as_deref(), Some("Server unavailable"));
        let state = store.read().await;
        assert_eq!(state.price, None);
        assert_eq!(state.address.value, "13");
    }

    #[tokio::test]
    async fn test_stale_price_never_overwrites_newer() {
        let (api, store, client) = setup();
        let old = api.respond_later("12");
        let new = api.respond_later("34");

        let first = client.address_changed("12").await.unwrap();
        let second = client.address_changed("34").await.unwrap();

        let _ = new.send(Ok(quote(200, "$2.00")));
        second.await.unwrap();
        let _ = old.send(Ok(quote(150, "$1.50")));
        first.await.unwrap();

        let state = store.read().await;
        assert_eq!(state.address.value, "34");
        assert_eq!(state.price_text(), "$2.00");
    }

    #[tokio::test]
    async fn test_vend_insufficient_credit() {
        let (api, store, client) = setup();
        api.fail_vend(StatusCode::PAYMENT_REQUIRED, r#"{"error":"Insufficient credit"}"#);

        client.submit_vend().await.await.unwrap();

        assert_eq!(error_banner(&store).await.as_deref(), Some("Insufficient credit"));
    }

    #[tokio::test]
    async fn test_vend_conflict_only_touches_banner() {
        let (api, store, client) = setup();
        api.respond("12", Ok(quote(150, "$1.50")));
        client.address_changed("12").await.unwrap().await.unwrap();
        let before = store.snapshot().await;

        api.fail_vend(StatusCode::CONFLICT, "");
        client.submit_vend().await.await.unwrap();

        let mut after = store.snapshot().await;
        assert_eq!(after.banners.text(BannerKind::Error), Some("Vending in progress"));
        after.banners = before.banners.clone();
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn test_vend_success_shows_nothing() {
        let (api, store, client) = setup();
        let client = client.with_form_fields([("apikey".to_string(), "k".to_string())]);
        api.respond("A1", Ok(quote(125, "$1.25")));
        client.address_changed("A1").await.unwrap().await.unwrap();

        client.submit_vend().await.await.unwrap();

        let forms = api.vend_calls.lock().unwrap().clone();
        assert_eq!(forms.len(), 1);
        assert_eq!(forms[0].address(), "A1");
        assert_eq!(forms[0].fields()[1], ("apikey".to_string(), "k".to_string()));
        assert_eq!(error_banner(&store).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_and_reselect() {
        let (api, store, client) = setup();
        api.respond("12", Ok(quote(150, "$1.50")));
        client.select_address().await;

        assert!(client.type_address("1").await.is_none());
        client.type_address("2").await.unwrap().await.unwrap();
        assert_eq!(store.read().await.address.value, "12");

        let reselect = client.reselect_address();
        tokio::time::sleep(Duration::from_millis(499)).await;
        assert!(!store.read().await.address.selected);
        reselect.await.unwrap();
        assert!(store.read().await.address.selected);

        // Typing now replaces the selected value.
        api.respond("34", Ok(quote(200, "$2.00")));
        client.type_address("34").await.unwrap().await.unwrap();
        assert_eq!(store.read().await.price_text(), "$2.00");
    }
}
