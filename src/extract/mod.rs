//! Detail-page extraction
//!
//! This module turns a loaded detail document into output records:
//! - resilient lookups that degrade to [`SENTINEL`] instead of failing
//! - the fixed field schema and its selectors
//! - fan-out of one organization into one row per affiliation section

mod expander;
mod fields;
mod lookup;

pub use expander::{
    expand_records, AffiliationFields, AffiliationSection, OrganizationRecord, HEADER,
};
pub use fields::{
    extract_affiliations, extract_base_fields, extract_detail, fill_slots,
    lookup_products_services, BaseFields, DetailExtraction, REPRESENTATIVE_SLOTS,
};
pub use lookup::{
    extract_attribute, extract_text, lookup_attribute, lookup_href, lookup_text,
    normalize_whitespace, Lookup,
};

/// Placeholder written for any field that could not be extracted
pub const SENTINEL: &str = "Not Available";

/// Extracts every record a detail page yields
pub fn extract_records(page: &crate::browser::PageSnapshot) -> Vec<OrganizationRecord> {
    let detail = extract_detail(page);
    expand_records(detail.base, detail.affiliations)
}
