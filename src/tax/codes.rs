//! Tax code parsing and authority lookup
//!
//! Tax codes are colon-separated strings of the form `AUTHORITY:TYPE[:RATE]`,
//! e.g. `AU:GST:10` or `UK:VAT:20`. The authority segment keys into a static
//! registry mapping authority ids to human region names. Every valid code
//! resolves to exactly one authority; anything else is a data-integrity
//! error, never a silent skip.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{TaxReportError, TaxResult};

/// A tax jurisdiction the engine can aggregate under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxAuthority {
    /// Authority identifier, the first segment of a tax code (e.g. `AU`)
    pub id: String,
    /// Human region name used for display and division ordering
    pub region_name: String,
}

impl TaxAuthority {
    /// Create a new tax authority
    pub fn new(id: impl Into<String>, region_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            region_name: region_name.into(),
        }
    }
}

/// Classification derived from a tax code string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxCodeInfo {
    /// The full original code
    pub code: String,
    /// Authority id the code maps to
    pub authority: String,
    /// Region name of that authority
    pub region_name: String,
    /// Tax type segment (e.g. `GST`, `VAT`)
    pub tax_type: String,
    /// Rate segment, kept verbatim (e.g. `10`, `12.5`); absent for
    /// rate-less codes like exemptions
    pub rate: Option<String>,
}

/// Static registry of tax authorities, passed into the engine as explicit
/// configuration rather than consulted as ambient state.
#[derive(Debug, Clone, Default)]
pub struct TaxAuthorityRegistry {
    authorities: HashMap<String, TaxAuthority>,
}

impl TaxAuthorityRegistry {
    /// Create an empty registry
    pub fn new(authorities: impl IntoIterator<Item = TaxAuthority>) -> Self {
        Self {
            authorities: authorities
                .into_iter()
                .map(|a| (a.id.clone(), a))
                .collect(),
        }
    }

    /// Registry pre-loaded with the built-in authority set
    pub fn with_defaults() -> Self {
        Self::new([
            TaxAuthority::new("AU", "Australia"),
            TaxAuthority::new("CA", "Canada"),
            TaxAuthority::new("IE", "Ireland"),
            TaxAuthority::new("NZ", "New Zealand"),
            TaxAuthority::new("SG", "Singapore"),
            TaxAuthority::new("UK", "United Kingdom"),
        ])
    }

    /// Add an authority, replacing any existing entry with the same id
    pub fn insert(&mut self, authority: TaxAuthority) {
        self.authorities.insert(authority.id.clone(), authority);
    }

    /// Look up an authority by id
    pub fn get(&self, id: &str) -> Option<&TaxAuthority> {
        self.authorities.get(id)
    }

    /// Classify a tax code: parse it and resolve its authority.
    ///
    /// Malformed codes (fewer than two segments, empty segments) and codes
    /// whose authority is not registered both fail with
    /// [`TaxReportError::InvalidTaxCode`]. Empty codes are filtered out
    /// upstream and never reach this point.
    pub fn resolve(&self, code: &str) -> TaxResult<TaxCodeInfo> {
        let mut segments = code.split(':');
        let authority_id = segments.next().unwrap_or("");
        let tax_type = segments.next().unwrap_or("");

        if authority_id.is_empty() || tax_type.is_empty() {
            return Err(TaxReportError::InvalidTaxCode(code.to_string()));
        }

        let authority = self
            .authorities
            .get(authority_id)
            .ok_or_else(|| TaxReportError::InvalidTaxCode(code.to_string()))?;

        let rate = segments.next().filter(|r| !r.is_empty()).map(String::from);

        Ok(TaxCodeInfo {
            code: code.to_string(),
            authority: authority.id.clone(),
            region_name: authority.region_name.clone(),
            tax_type: tax_type.to_string(),
            rate,
        })
    }
}
