//! Currency and amount types

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Smallest amount the gateway accepts for a card check, in minor units.
pub const MIN_AMOUNT: u64 = 100;

/// Amount used when a web payment amount cannot be parsed.
pub const DEFAULT_WEB_PAYMENT_AMOUNT: u64 = 100;

/// Currency table, alphabetic code to ISO 4217 numeric code.
pub const CURRENCIES: [(&str, u16); 3] = [("EUR", 978), ("USD", 840), ("GBP", 826)];

/// Currencies accepted by the gateway.
///
/// Serialized as the ISO 4217 numeric code, which is what the gateway
/// expects in `payment.currency` and `order.currency`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Currency {
    #[default]
    EUR,
    USD,
    GBP,
}

impl Currency {
    /// Get the ISO 4217 numeric code
    pub fn numeric(&self) -> u16 {
        match self {
            Self::EUR => 978,
            Self::USD => 840,
            Self::GBP => 826,
        }
    }

    /// Get the alphabetic code
    pub fn code(&self) -> &'static str {
        match self {
            Self::EUR => "EUR",
            Self::USD => "USD",
            Self::GBP => "GBP",
        }
    }

    /// Parse from alphabetic code
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_uppercase().as_str() {
            "EUR" => Some(Self::EUR),
            "USD" => Some(Self::USD),
            "GBP" => Some(Self::GBP),
            _ => None,
        }
    }

    /// Parse from numeric code
    pub fn from_numeric(numeric: u16) -> Option<Self> {
        match numeric {
            978 => Some(Self::EUR),
            840 => Some(Self::USD),
            826 => Some(Self::GBP),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl Serialize for Currency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.numeric())
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Responses carry every leaf as text.
        let raw = String::deserialize(deserializer)?;
        raw.parse::<u16>()
            .ok()
            .and_then(Self::from_numeric)
            .or_else(|| Self::from_code(&raw))
            .ok_or_else(|| serde::de::Error::custom(format!("unknown currency: {raw}")))
    }
}

/// Parse a caller supplied amount in minor units.
///
/// Surrounding whitespace is ignored. Anything that is not a non-negative
/// integer falls back to [`DEFAULT_WEB_PAYMENT_AMOUNT`], so an empty
/// string, a fraction such as `"12.5"`, a negative number and
/// non-numeric text all give 100.
///
/// ```
/// use payline::money::parse_amount;
///
/// assert_eq!(parse_amount(" 2500 "), 2500);
/// assert_eq!(parse_amount(""), 100);
/// assert_eq!(parse_amount("12.5"), 100);
/// ```
pub fn parse_amount(text: &str) -> u64 {
    text.trim().parse().unwrap_or(DEFAULT_WEB_PAYMENT_AMOUNT)
}

/// Raise an amount to the card check floor.
pub fn clamp_to_minimum(amount: u64) -> u64 {
    amount.max(MIN_AMOUNT)
}
