//! Static currency metadata used to populate pickers and look up flags.

use serde::{Deserialize, Serialize};

/// Shown for codes the catalog does not know about.
pub const PLACEHOLDER_FLAG: &str = "💱";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct CurrencyInfo {
    pub code: String,
    pub name: String,
    #[serde(default = "default_flag")]
    pub flag: String,
}

fn default_flag() -> String {
    PLACEHOLDER_FLAG.to_string()
}

impl CurrencyInfo {
    pub fn new(code: &str, name: &str, flag: &str) -> Self {
        CurrencyInfo {
            code: code.to_string(),
            name: name.to_string(),
            flag: flag.to_string(),
        }
    }
}

/// An ordered, immutable list of known currencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CurrencyInfo>,
}

impl Catalog {
    pub fn new(entries: Vec<CurrencyInfo>) -> Self {
        Catalog { entries }
    }

    pub fn get(&self, code: &str) -> Option<&CurrencyInfo> {
        self.entries
            .iter()
            .find(|c| c.code.eq_ignore_ascii_case(code.trim()))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    /// Flag for `code`, or [`PLACEHOLDER_FLAG`] when the code is unknown.
    pub fn flag_for(&self, code: &str) -> &str {
        self.get(code).map_or(PLACEHOLDER_FLAG, |c| c.flag.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &CurrencyInfo> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::new(vec![
            CurrencyInfo::new("USD", "US Dollar", "🇺🇸"),
            CurrencyInfo::new("EUR", "Euro", "🇪🇺"),
            CurrencyInfo::new("GBP", "British Pound", "🇬🇧"),
            CurrencyInfo::new("RUB", "Russian Ruble", "🇷🇺"),
            CurrencyInfo::new("KGS", "Kyrgyz Som", "🇰🇬"),
            CurrencyInfo::new("KZT", "Kazakhstan Tenge", "🇰🇿"),
            CurrencyInfo::new("CNY", "Chinese Yuan", "🇨🇳"),
            CurrencyInfo::new("JPY", "Japanese Yen", "🇯🇵"),
            CurrencyInfo::new("TRY", "Turkish Lira", "🇹🇷"),
            CurrencyInfo::new("AED", "UAE Dirham", "🇦🇪"),
        ])
    }
}
