//! Machine status as reported by the server.
//!
//! The same snapshot shape is returned by `GET /api/status` and carried by
//! the `status` push event:
//!
//! ```json
//! {"status":{"code":0,"text":"Ready","credit":1.0,"creditText":"$1.00"}}
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Operating state of the machine.
///
/// Codes the server is known to send are named; anything else is kept as
/// [`MachineStatusCode::Other`] so newer servers do not break older clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum MachineStatusCode {
    Ready,
    Vending,
    NotReady,
    Other(i64),
}

impl From<i64> for MachineStatusCode {
    fn from(value: i64) -> Self {
        match value {
            0 => Self::Ready,
            1 => Self::Vending,
            2 => Self::NotReady,
            other => Self::Other(other),
        }
    }
}

impl From<MachineStatusCode> for i64 {
    fn from(value: MachineStatusCode) -> Self {
        match value {
            MachineStatusCode::Ready => 0,
            MachineStatusCode::Vending => 1,
            MachineStatusCode::NotReady => 2,
            MachineStatusCode::Other(other) => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineStatus {
    pub code: MachineStatusCode,
    /// Display text for `code`, e.g. `"Ready"`.
    pub text: String,
    /// Raw credit balance. Older servers omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit: Option<Decimal>,
    /// Preformatted credit balance, e.g. `"$1.00"`.
    #[serde(rename = "creditText")]
    pub credit_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub status: MachineStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_snapshot_parsing() {
        let json = r#"{"status":{"code":1,"text":"Vending","credit":2.5,"creditText":"$2.50"}}"#;
        let snapshot: StatusSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.status.code, MachineStatusCode::Vending);
        assert_eq!(snapshot.status.text, "Vending");
        assert_eq!(snapshot.status.credit, Some(Decimal::new(25, 1)));
        assert_eq!(snapshot.status.credit_text, "$2.50");
    }

    #[test]
    fn test_unknown_status_code_is_preserved() {
        let json = r#"{"code":7,"text":"Maintenance","creditText":"$0.00"}"#;
        let status: MachineStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.code, MachineStatusCode::Other(7));
        assert_eq!(status.credit, None);
        assert_eq!(i64::from(status.code), 7);
    }
}
