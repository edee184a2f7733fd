use vend_sdk::objects::{
    ADDRESS_LEN, AddressError, ChannelAddress, MachineStatus, MachineStatusCode, PriceQuote,
};

use super::banner::BannerSlots;

/// Push-channel connection state, as driven by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Connected,
    Error,
    Timeout,
    Disconnected,
}

impl ConnectionState {
    /// Text shown in the status line when entering this state.
    pub fn status_text(self) -> &'static str {
        match self {
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Connected => "Connected",
            ConnectionState::Error => "Error connecting",
            ConnectionState::Timeout => "Connection timeout",
            ConnectionState::Disconnected => "Disconnected",
        }
    }
}

/// The address input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressField {
    pub value: String,
    /// While selected, the next typed text replaces the value.
    pub selected: bool,
}

/// Identifies one issued price lookup. Only the newest token may update
/// the displayed price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LookupToken(u64);

/// What an edit to the address input calls for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressDecision {
    /// A new complete address: look its price up.
    Lookup {
        address: ChannelAddress,
        token: LookupToken,
    },
    /// Same complete address as the last lookup.
    Unchanged,
    /// Too long. The input is cleared.
    Rejected,
    /// Not a complete address yet.
    Incomplete,
}

/// Price lookup bookkeeping for the address input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceLookup {
    last_value: Option<String>,
    generation: u64,
}

impl PriceLookup {
    /// Classify a new input value.
    ///
    /// Every edit except an unchanged one invalidates in-flight lookups.
    pub fn decide(&mut self, value: &str) -> AddressDecision {
        match ChannelAddress::parse(value) {
            Ok(_) if self.last_value.as_deref() == Some(value) => AddressDecision::Unchanged,
            Ok(address) => {
                self.generation += 1;
                self.last_value = Some(value.to_owned());
                AddressDecision::Lookup {
                    address,
                    token: LookupToken(self.generation),
                }
            }
            Err(AddressError::Length(len)) if len > ADDRESS_LEN => {
                self.generation += 1;
                self.last_value = Some(String::new());
                AddressDecision::Rejected
            }
            Err(_) => {
                self.generation += 1;
                self.last_value = Some(value.to_owned());
                AddressDecision::Incomplete
            }
        }
    }

    pub fn is_current(&self, token: LookupToken) -> bool {
        token.0 == self.generation
    }

    /// Forget the last looked-up value so entering it again triggers a
    /// fresh lookup.
    pub fn forget(&mut self) {
        self.last_value = None;
    }

    /// Forget everything and invalidate in-flight lookups. The generation
    /// keeps counting so tokens issued before the reset stay stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.last_value = None;
    }
}

/// Everything the user sees, plus the bookkeeping needed to keep it
/// consistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientState {
    pub connection: ConnectionState,
    pub status_text: String,
    /// Last reported machine state; `None` while unknown.
    pub status_code: Option<MachineStatusCode>,
    pub credit_text: String,
    pub address: AddressField,
    /// Quote for the current address, if one has arrived.
    pub price: Option<PriceQuote>,
    pub price_lookup: PriceLookup,
    pub banners: BannerSlots,
}

impl Default for ClientState {
    fn default() -> Self {
        let connection = ConnectionState::default();
        Self {
            connection,
            status_text: connection.status_text().to_owned(),
            status_code: None,
            credit_text: String::new(),
            address: AddressField::default(),
            price: None,
            price_lookup: PriceLookup::default(),
            banners: BannerSlots::default(),
        }
    }
}

impl ClientState {
    /// Back to the initial state with the address input selected.
    pub fn reset(&mut self) {
        let mut price_lookup = std::mem::take(&mut self.price_lookup);
        price_lookup.reset();
        *self = ClientState {
            price_lookup,
            ..ClientState::default()
        };
        self.select_address();
    }

    pub fn set_connection(&mut self, connection: ConnectionState) {
        self.connection = connection;
        self.status_text = connection.status_text().to_owned();
        if connection == ConnectionState::Disconnected {
            self.status_code = None;
        }
    }

    pub fn set_status(&mut self, status: &MachineStatus) {
        self.status_code = Some(status.code);
        self.status_text.clone_from(&status.text);
        self.credit_text.clone_from(&status.credit_text);
    }

    pub fn set_price(&mut self, quote: PriceQuote) {
        self.price = Some(quote);
    }

    pub fn clear_price(&mut self) {
        self.price = None;
    }

    /// Displayed price text, empty while no quote is held.
    pub fn price_text(&self) -> &str {
        self.price.as_ref().map(|q| q.text.as_str()).unwrap_or_default()
    }

    /// Apply a new address input value.
    ///
    /// The price is cleared right away for every real change; a lookup, if
    /// any, is up to the caller.
    pub fn edit_address(&mut self, value: &str) -> AddressDecision {
        let decision = self.price_lookup.decide(value);
        match decision {
            AddressDecision::Unchanged => {}
            AddressDecision::Rejected => {
                self.address.value.clear();
                self.clear_price();
            }
            AddressDecision::Lookup { .. } | AddressDecision::Incomplete => {
                value.clone_into(&mut self.address.value);
                self.clear_price();
            }
        }
        decision
    }

    /// Value the address input would hold after typing `input` into it.
    pub fn typed_address(&self, input: &str) -> String {
        if self.address.selected {
            input.to_owned()
        } else {
            format!("{}{}", self.address.value, input)
        }
    }

    /// Clear the address input after the server rejected it.
    pub fn clear_address(&mut self) {
        self.address.value.clear();
        self.price_lookup.forget();
        self.clear_price();
    }

    pub fn select_address(&mut self) {
        self.address.selected = true;
    }

    pub fn deselect_address(&mut self) {
        self.address.selected = false;
    }
}
