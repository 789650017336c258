//! Facility records submitted to the create/match endpoint

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::row::{self, Row};
use crate::constants::{DEFAULT_SECTOR, REQUIRED_COLUMNS};
use crate::errors::{OshError, Result};

/// Sector assignment: a single name or an ordered list of names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Sector {
    Single(String),
    Multiple(Vec<String>),
}

impl Default for Sector {
    fn default() -> Self {
        Self::Single(DEFAULT_SECTOR.to_string())
    }
}

impl Sector {
    /// True when no usable sector name is present.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Single(name) => name.trim().is_empty(),
            Self::Multiple(names) => names.iter().all(|n| n.trim().is_empty()),
        }
    }

    fn trimmed(self) -> Self {
        match self {
            Self::Single(name) => Self::Single(name.trim().to_string()),
            Self::Multiple(names) => Self::Multiple(
                names
                    .into_iter()
                    .map(|n| n.trim().to_string())
                    .filter(|n| !n.is_empty())
                    .collect(),
            ),
        }
    }
}

/// Caller-supplied facility data.
///
/// A record has no identity until the remote system matches it or creates a
/// facility for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacilityRecord {
    pub name: String,
    pub address: String,
    /// Country name or ISO 3166-1 alpha-2 code
    pub country: String,
    #[serde(default)]
    pub sector: Sector,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_workers: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_language_name: Option<String>,
    /// Additional contributor fields sent alongside the named ones
    #[serde(default, skip_serializing_if = "Row::is_empty")]
    pub data: Row,
}

impl FacilityRecord {
    /// Create a record from the three required fields.
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into().trim().to_string(),
            address: address.into().trim().to_string(),
            country: country.into().trim().to_string(),
            ..Self::default()
        }
    }

    pub fn with_sector(mut self, sector: Sector) -> Self {
        self.sector = sector.trimmed();
        self
    }

    pub fn with_facility_type(mut self, value: impl Into<String>) -> Self {
        self.facility_type = trimmed(value.into());
        self
    }

    pub fn with_processing_type(mut self, value: impl Into<String>) -> Self {
        self.processing_type = trimmed(value.into());
        self
    }

    pub fn with_product_type(mut self, value: impl Into<String>) -> Self {
        self.product_type = trimmed(value.into());
        self
    }

    pub fn with_parent_company_name(mut self, value: impl Into<String>) -> Self {
        self.parent_company_name = trimmed(value.into());
        self
    }

    pub fn with_number_of_workers(mut self, value: impl Into<String>) -> Self {
        self.number_of_workers = trimmed(value.into());
        self
    }

    pub fn with_native_language_name(mut self, value: impl Into<String>) -> Self {
        self.native_language_name = trimmed(value.into());
        self
    }

    /// Build a record from a (mapped, cleansed) row.
    ///
    /// # Errors
    ///
    /// Returns the required columns that are missing or blank, in
    /// `REQUIRED_COLUMNS` order.
    pub fn from_row(row: &Row) -> std::result::Result<Self, Vec<&'static str>> {
        let missing = missing_columns(row);
        if !missing.is_empty() {
            return Err(missing);
        }

        let text = |column: &str| row::non_empty_text(row, column).unwrap_or_default();
        let optional = |column: &str| row::non_empty_text(row, column);

        let sector = match row.get("sector") {
            Some(Value::Array(items)) => Sector::Multiple(
                items.iter().map(row::cell_text).filter(|s| !s.trim().is_empty()).collect(),
            ),
            _ => optional("sector").map(Sector::Single).unwrap_or_default(),
        };

        let mut record = Self::new(text("name"), text("address"), text("country"));
        record.sector = if sector.is_blank() { Sector::default() } else { sector.trimmed() };
        record.facility_type = optional("facility_type");
        record.processing_type = optional("processing_type");
        record.product_type = optional("product_type");
        record.parent_company_name = optional("parent_company_name");
        record.number_of_workers = optional("number_of_workers");
        record.native_language_name = optional("native_language_name");
        Ok(record)
    }

    /// Check that the required fields are present.
    ///
    /// # Errors
    ///
    /// Returns `OshError::InvalidInput` naming the first blank field.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in
            [("name", &self.name), ("address", &self.address), ("country", &self.country)]
        {
            if value.trim().is_empty() {
                return Err(OshError::InvalidInput(format!(
                    "Empty facility {field} given, we need a {field}"
                )));
            }
        }
        Ok(())
    }

    /// JSON body for the create/match endpoint.
    ///
    /// Named fields win over identically named entries in `data`.
    pub fn to_payload(&self) -> Value {
        let mut payload = self.data.clone();
        let sector = if self.sector.is_blank() { Sector::default() } else { self.sector.clone() };

        payload.insert("name".into(), Value::String(self.name.clone()));
        payload.insert("address".into(), Value::String(self.address.clone()));
        payload.insert("country".into(), Value::String(self.country.clone()));
        payload.insert(
            "sector".into(),
            serde_json::to_value(sector).unwrap_or_else(|_| Value::String(DEFAULT_SECTOR.into())),
        );

        let optional = [
            ("facility_type", &self.facility_type),
            ("processing_type", &self.processing_type),
            ("product_type", &self.product_type),
            ("parent_company_name", &self.parent_company_name),
            ("number_of_workers", &self.number_of_workers),
            ("native_language_name", &self.native_language_name),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                payload.insert(key.into(), Value::String(value.clone()));
            }
        }

        Value::Object(payload)
    }
}

/// Required columns that are absent or blank in `row`.
pub fn missing_columns(row: &Row) -> Vec<&'static str> {
    REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| row::non_empty_text(row, column).is_none())
        .collect()
}

fn trimmed(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
