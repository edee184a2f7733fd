//! Failure → user feedback tables.
//!
//! Each request kind has one [`FailureTable`]. Transport outcomes are
//! looked up first, then the HTTP status, then the fallback.

use vend_sdk::client::Failure;
use vend_sdk::objects::ApiErrorBody;

/// What to do about one kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Nothing user-visible.
    Silent,
    /// Show this error banner.
    Banner(&'static str),
    /// Show the server's `error` field, or this text if it has none.
    ServerErrorOr(&'static str),
    /// The address does not name a channel: clear the address input.
    ClearAddress,
}

/// Resolved feedback for one failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Feedback {
    pub banner: Option<String>,
    pub clear_address: bool,
}

pub struct FailureTable {
    pub timeout: Rule,
    pub parse: Rule,
    pub abort: Rule,
    pub statuses: &'static [(u16, Rule)],
    /// Prefix of the banner for statuses not in `statuses`.
    pub fallback: &'static str,
}

/// Feedback for `POST /api/vend`.
///
/// Timeouts and aborts stay silent: the push channel reports connection
/// problems and the vend outcome itself.
pub const VEND_FAILURES: FailureTable = FailureTable {
    timeout: Rule::Silent,
    parse: Rule::Banner("Vend address does not exist"),
    abort: Rule::Silent,
    statuses: &[
        (404, Rule::Banner("api not found")),
        (400, Rule::ServerErrorOr("Vend address does not exist")),
        (402, Rule::Banner("Insufficient credit")),
        (409, Rule::Banner("Vending in progress")),
        (503, Rule::Banner("Server unavailable")),
    ],
    fallback: "Error requesting vend",
};

/// Feedback for `GET /api/channels/{addr}/price`.
pub const PRICE_FAILURES: FailureTable = FailureTable {
    timeout: Rule::Silent,
    parse: Rule::Banner("Invalid price received"),
    abort: Rule::Silent,
    statuses: &[
        (404, Rule::ClearAddress),
        (400, Rule::ClearAddress),
        (503, Rule::Banner("Server unavailable")),
    ],
    fallback: "Error getting price",
};

impl FailureTable {
    pub fn resolve(&self, failure: &Failure) -> Feedback {
        let (rule, body) = match failure {
            Failure::Timeout => (self.timeout, ""),
            Failure::Parse => (self.parse, ""),
            Failure::Abort => (self.abort, ""),
            Failure::Status { code, body } => match self.status_rule(*code) {
                Some(rule) => (rule, body.as_str()),
                None => return self.fallback(*code, body),
            },
            Failure::Network(detail) => return self.fallback(0, detail),
        };

        match rule {
            Rule::Silent => Feedback::default(),
            Rule::Banner(text) => Feedback {
                banner: Some(text.to_owned()),
                clear_address: false,
            },
            Rule::ServerErrorOr(text) => Feedback {
                banner: Some(ApiErrorBody::message_from(body).unwrap_or_else(|| text.to_owned())),
                clear_address: false,
            },
            Rule::ClearAddress => Feedback {
                banner: None,
                clear_address: true,
            },
        }
    }

    fn status_rule(&self, code: u16) -> Option<Rule> {
        self.statuses
            .iter()
            .find(|(status, _)| *status == code)
            .map(|(_, rule)| *rule)
    }

    fn fallback(&self, code: u16, detail: &str) -> Feedback {
        let detail = detail.trim();
        let text = if detail.is_empty() {
            format!("{}: {}", self.fallback, code)
        } else {
            format!("{}: {} {}", self.fallback, code, detail)
        };
        Feedback {
            banner: Some(text),
            clear_address: false,
        }
    }
}
