use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MAX_TICKER_LEN: usize = 10;

/// Exchange ticker of the issuer whose equity backs a grant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Parse a ticker, trimming whitespace and upper-casing it.
    ///
    /// Share-class suffixes such as `BRK.B` or `BF-B` are accepted.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let ticker = input.trim().to_ascii_uppercase();
        let Some(first) = ticker.chars().next() else {
            return Err(ValidationError::EmptySymbol);
        };

        let len = ticker.chars().count();
        if len > MAX_TICKER_LEN {
            return Err(ValidationError::SymbolTooLong {
                len,
                max: MAX_TICKER_LEN,
            });
        }

        if !first.is_ascii_alphabetic() {
            return Err(ValidationError::SymbolInvalidStart { ch: first });
        }

        if let Some((index, ch)) = ticker
            .chars()
            .enumerate()
            .find(|(_, ch)| !(ch.is_ascii_alphanumeric() || *ch == '.' || *ch == '-'))
        {
            return Err(ValidationError::SymbolInvalidChar { ch, index });
        }

        Ok(Self(ticker))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Ticker encoded for use inside a URL path or query value.
    pub fn url_encoded(&self) -> String {
        urlencoding::encode(&self.0).into_owned()
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for Symbol {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_lowercase_ticker() {
        let symbol = Symbol::parse(" meta ").expect("ticker should parse");
        assert_eq!(symbol.as_str(), "META");
    }

    #[test]
    fn keeps_share_class_suffix() {
        let symbol = Symbol::parse("brk.b").expect("ticker should parse");
        assert_eq!(symbol.as_str(), "BRK.B");
        assert_eq!(symbol.url_encoded(), "BRK.B");
    }

    #[test]
    fn rejects_blank_and_numeric_start() {
        assert_eq!(Symbol::parse("   "), Err(ValidationError::EmptySymbol));
        assert!(matches!(
            Symbol::parse("1GOOG"),
            Err(ValidationError::SymbolInvalidStart { ch: '1' })
        ));
    }

    #[test]
    fn rejects_symbol_with_query_characters() {
        let err = Symbol::parse("AMZN&apikey").expect_err("must fail");
        assert_eq!(err, ValidationError::SymbolInvalidChar { ch: '&', index: 4 });
    }
}
