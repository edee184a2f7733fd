use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Response of `GET /api/channels/{addr}/price`.
///
/// `text` is preformatted by the server (e.g. `"$1.50"`) and displayed
/// verbatim; `price` is kept as the quoted value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub price: Decimal,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_from_json_number() {
        let quote: PriceQuote = serde_json::from_str(r#"{"price":150,"text":"$1.50"}"#)
            .unwrap();
        assert_eq!(quote.price, Decimal::from(150));
        assert_eq!(quote.text, "$1.50");

        let quote: PriceQuote = serde_json::from_str(r#"{"price":1.25,"text":"$1.25"}"#)
            .unwrap();
        assert_eq!(quote.price, Decimal::new(125, 2));
    }

    #[test]
    fn test_price_missing_text_is_rejected() {
        let res: Result<PriceQuote, _> = serde_json::from_str(r#"{"price":1}"#);
        assert!(res.is_err());
    }
}
