//! Named report presets. Each historical report format is one `Profile`
//! describing its column set, number style, fee policy and description mode.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnSet {
    /// The seven lexoffice import columns.
    Lexoffice,
    /// `id; type; source; amount; customer; accounting_date; value_date; description`
    Raw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NumberStyle {
    /// `1234.56`
    Canonical,
    /// `1234,56`
    Localized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeeScheme {
    /// Every fee into one bucket.
    Pooled,
    /// One bucket per calendar month of the accounting date.
    Monthly,
    /// Charge, payment and billing buckets.
    ByType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DescriptionMode {
    Templated,
    LegacySimple,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Profile {
    pub name: String,
    pub columns: ColumnSet,
    pub numbers: NumberStyle,
    /// Default for aggregation mode; configuration may override it.
    pub aggregate_fees: bool,
    pub fee_scheme: FeeScheme,
    pub descriptions: DescriptionMode,
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Unknown profile '{0}' (known: {known})", known = Profile::preset_names().join(", "))]
    Unknown(String),
    #[error("Failed to parse profile TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Profile {
    pub const DEFAULT: &'static str = "lexoffice";

    fn preset_table() -> [Profile; 5] {
        use ColumnSet::*;
        use DescriptionMode::*;
        use FeeScheme::*;
        use NumberStyle::*;

        let p = |name: &str, columns, numbers, aggregate_fees, fee_scheme, descriptions| Profile {
            name: name.to_string(),
            columns,
            numbers,
            aggregate_fees,
            fee_scheme,
            descriptions,
        };

        [
            p("raw", Raw, Canonical, false, ByType, LegacySimple),
            p("lexoffice-legacy", Lexoffice, Localized, false, ByType, LegacySimple),
            p("lexoffice-monthly", Lexoffice, Localized, true, Monthly, Templated),
            p("lexoffice-pooled", Lexoffice, Localized, true, Pooled, Templated),
            p(Self::DEFAULT, Lexoffice, Canonical, false, ByType, Templated),
        ]
    }

    pub fn presets() -> Vec<Profile> {
        Self::preset_table().into()
    }

    pub fn preset_names() -> Vec<String> {
        Self::preset_table().into_iter().map(|p| p.name).collect()
    }

    pub fn preset(name: &str) -> Result<Profile, ProfileError> {
        let wanted = name.trim().to_lowercase();
        Self::preset_table()
            .into_iter()
            .find(|p| p.name == wanted)
            .ok_or_else(|| ProfileError::Unknown(name.to_string()))
    }

    pub fn from_toml(content: &str) -> Result<Profile, ProfileError> {
        Ok(toml::from_str(content)?)
    }

    pub fn with_aggregation(mut self, aggregate: Option<bool>) -> Self {
        if let Some(aggregate) = aggregate {
            self.aggregate_fees = aggregate;
        }
        self
    }
}

impl Default for Profile {
    fn default() -> Self {
        // The current format is the last entry of the table.
        let [.., current] = Self::preset_table();
        current
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (columns={:?}, numbers={:?}, aggregate_fees={}, scheme={:?}, descriptions={:?})",
            self.name, self.columns, self.numbers, self.aggregate_fees, self.fee_scheme, self.descriptions
        )
    }
}
