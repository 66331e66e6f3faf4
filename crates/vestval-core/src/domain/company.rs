use serde::Serialize;

use crate::{Symbol, ValidationError};

/// Display attributes used when presenting an offer from a given employer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Theme {
    pub primary: &'static str,
    pub secondary: &'static str,
    pub text: &'static str,
    pub monogram: char,
}

/// Employer whose stock backs the grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Company {
    pub id: &'static str,
    pub name: &'static str,
    pub ticker: &'static str,
    pub theme: Theme,
}

pub const COMPANIES: [Company; 3] = [
    Company {
        id: "meta",
        name: "Meta",
        ticker: "META",
        theme: Theme {
            primary: "#2563eb",
            secondary: "#eff6ff",
            text: "#1e3a8a",
            monogram: 'M',
        },
    },
    Company {
        id: "google",
        name: "Google",
        ticker: "GOOGL",
        theme: Theme {
            primary: "#ef4444",
            secondary: "#fef2f2",
            text: "#7f1d1d",
            monogram: 'G',
        },
    },
    Company {
        id: "amazon",
        name: "Amazon",
        ticker: "AMZN",
        theme: Theme {
            primary: "#eab308",
            secondary: "#fefce8",
            text: "#713f12",
            monogram: 'A',
        },
    },
];

impl Company {
    /// Case-insensitive lookup by id (`meta`) or ticker (`GOOGL`).
    pub fn find(key: &str) -> Result<&'static Company, ValidationError> {
        let key = key.trim();
        COMPANIES
            .iter()
            .find(|company| {
                company.id.eq_ignore_ascii_case(key) || company.ticker.eq_ignore_ascii_case(key)
            })
            .ok_or_else(|| ValidationError::UnknownCompany {
                value: key.to_owned(),
            })
    }

    pub fn symbol(&self) -> Result<Symbol, ValidationError> {
        Symbol::parse(self.ticker)
    }
}
