use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Price providers vestval can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Yahoo,
    Alphavantage,
}

impl ProviderId {
    pub const ALL: [Self; 2] = [Self::Yahoo, Self::Alphavantage];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yahoo => "yahoo",
            Self::Alphavantage => "alphavantage",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "yahoo" => Ok(Self::Yahoo),
            "alphavantage" | "alpha_vantage" => Ok(Self::Alphavantage),
            other => Err(ValidationError::InvalidSource {
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_aliases() {
        assert_eq!("Yahoo".parse::<ProviderId>(), Ok(ProviderId::Yahoo));
        assert_eq!(
            "alpha_vantage".parse::<ProviderId>(),
            Ok(ProviderId::Alphavantage)
        );
        assert!(matches!(
            "polygon".parse::<ProviderId>(),
            Err(ValidationError::InvalidSource { .. })
        ));
    }
}
