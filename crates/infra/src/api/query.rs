//! Search filters for `GET /api/facilities/`

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Facility search filters.
///
/// Empty filters are left out of the query string. `detail` is always sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacilityQuery {
    pub q: Option<String>,
    pub contributors: Vec<String>,
    pub lists: Option<u64>,
    pub contributor_types: Vec<String>,
    pub countries: Option<String>,
    /// GeoJSON geometry restricting results to an area
    pub boundary: Option<Value>,
    pub parent_company: Option<String>,
    pub facility_type: Option<String>,
    pub processing_type: Option<String>,
    pub product_type: Option<String>,
    pub number_of_workers: Option<String>,
    pub native_language_name: Option<String>,
    pub sectors: Option<String>,
    pub detail: bool,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

macro_rules! text_filter {
    ($($name:ident),+ $(,)?) => {
        $(
            pub fn $name(mut self, value: impl Into<String>) -> Self {
                self.$name = non_blank(value.into());
                self
            }
        )+
    };
}

impl FacilityQuery {
    pub fn new() -> Self {
        Self::default()
    }

    text_filter!(
        q,
        countries,
        parent_company,
        facility_type,
        processing_type,
        product_type,
        number_of_workers,
        native_language_name,
        sectors,
    );

    pub fn contributor(mut self, contributor: impl ToString) -> Self {
        self.contributors.push(contributor.to_string());
        self
    }

    pub fn contributor_type(mut self, contributor_type: impl Into<String>) -> Self {
        self.contributor_types.push(contributor_type.into());
        self
    }

    pub fn lists(mut self, list_id: u64) -> Self {
        self.lists = Some(list_id);
        self
    }

    pub fn boundary(mut self, geometry: Value) -> Self {
        self.boundary = Some(geometry).filter(|g| g.as_object().is_some_and(|o| !o.is_empty()));
        self
    }

    pub fn detail(mut self, detail: bool) -> Self {
        self.detail = detail;
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Query pairs in the order the API documents them.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = Vec::new();
        let mut push = |key: &str, value: String| pairs.push((key.to_string(), value));

        if let Some(page) = self.page {
            push("page", page.to_string());
        }
        if let Some(page_size) = self.page_size {
            push("pageSize", page_size.to_string());
        }
        if let Some(q) = &self.q {
            push("q", q.clone());
        }
        for contributor in &self.contributors {
            push("contributors", contributor.clone());
        }
        if let Some(lists) = self.lists {
            push("lists", lists.to_string());
        }
        for contributor_type in &self.contributor_types {
            push("contributor_types", contributor_type.clone());
        }
        if let Some(countries) = &self.countries {
            push("countries", countries.clone());
        }
        if let Some(boundary) = &self.boundary {
            // compact serialization, no whitespace
            push("boundary", boundary.to_string());
        }

        let named = [
            ("parent_company", &self.parent_company),
            ("facility_type", &self.facility_type),
            ("processing_type", &self.processing_type),
            ("product_type", &self.product_type),
            ("number_of_workers", &self.number_of_workers),
            ("native_language_name", &self.native_language_name),
        ];
        for (key, value) in named {
            if let Some(value) = value {
                push(key, value.clone());
            }
        }

        push("detail", self.detail.to_string());
        if let Some(sectors) = &self.sectors {
            push("sectors", sectors.clone());
        }
        pairs
    }
}

fn non_blank(value: String) -> Option<String> {
    (!value.trim().is_empty()).then_some(value)
}
