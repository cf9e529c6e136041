//! Field selectors and detail-page extraction
//!
//! Every lookup here is total: the page either yields a value or the field
//! falls back to the sentinel when the record is assembled.

use super::expander::AffiliationSection;
use super::lookup::{element_text, lookup_href, lookup_text, selector, Lookup};
use super::SENTINEL;
use crate::browser::PageSnapshot;
use scraper::{ElementRef, Html};
use url::Url;

pub const NAME_SELECTOR: &str = "span#comp_person_name";
pub const ADDRESS_SELECTOR: &str = "span#comp_address";
pub const PHONE_SELECTOR: &str = "span#addr_telephone";
pub const FAX_SELECTOR: &str = "span#addr_fax";
pub const EMAIL_SELECTOR: &str = "span#addr_email a";
pub const WEBSITE_SELECTOR: &str = "td.auto-style9 a";
pub const PRODUCTS_SELECTOR: &str = "span#product_service";
pub const FACTORY_SELECTOR: &str = "span#factory_location";
pub const FTI_REPRESENTATIVES_SELECTOR: &str = "table#ContactFTI tr:nth-of-type(2) > td";
pub const AFFILIATION_SECTION_SELECTOR: &str = "table#ContactNonFTI td[style*=\"background-color\"]";
pub const CLUB_NAME_SELECTOR: &str = "b";
pub const SECTION_REPRESENTATIVES_SELECTOR: &str = "tr:nth-of-type(2) > td";

/// Representatives kept per body
pub const REPRESENTATIVE_SLOTS: usize = 3;

/// Fields shared by every row of one organization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseFields {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub fax: String,
    pub email: String,
    pub website: String,
    pub products_services: String,
    pub factory_location: String,
    pub fti_representatives: [String; REPRESENTATIVE_SLOTS],
}

/// Everything read from one detail page
#[derive(Debug, Clone)]
pub struct DetailExtraction {
    pub base: BaseFields,
    pub affiliations: Vec<AffiliationSection>,
}

/// Extracts base fields and affiliation sections from a detail page
pub fn extract_detail(page: &PageSnapshot) -> DetailExtraction {
    let document = page.document();
    DetailExtraction {
        base: extract_base_fields(&document, page.url()),
        affiliations: extract_affiliations(&document),
    }
}

/// Extracts the organization-level fields
///
/// `page_url` resolves a relative website link the way a browser would.
pub fn extract_base_fields(document: &Html, page_url: &Url) -> BaseFields {
    BaseFields {
        name: lookup_text(document, NAME_SELECTOR).or_sentinel(),
        address: lookup_text(document, ADDRESS_SELECTOR).or_sentinel(),
        phone: lookup_text(document, PHONE_SELECTOR).or_sentinel(),
        fax: lookup_text(document, FAX_SELECTOR).or_sentinel(),
        email: lookup_text(document, EMAIL_SELECTOR).or_sentinel(),
        website: lookup_href(document, WEBSITE_SELECTOR, page_url).or_sentinel(),
        products_services: lookup_products_services(document).or_sentinel(),
        factory_location: lookup_text(document, FACTORY_SELECTOR).or_sentinel(),
        fti_representatives: fill_slots(lookup_cells(document, FTI_REPRESENTATIVES_SELECTOR)),
    }
}

/// Products text joined with the table that follows it
///
/// Either part may be missing; only when both are does the field go absent.
pub fn lookup_products_services(document: &Html) -> Lookup {
    let Some(span_selector) = selector(PRODUCTS_SELECTOR) else {
        return Lookup::NotFound;
    };
    let Some(span) = document.select(&span_selector).next() else {
        return Lookup::NotFound;
    };

    let table = span
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|sibling| sibling.value().name() == "table")
        .map_or(Lookup::NotFound, element_text);

    element_text(span).join(table)
}

/// Affiliation sections in document order
pub fn extract_affiliations(document: &Html) -> Vec<AffiliationSection> {
    let (Some(sections), Some(club), Some(cells)) = (
        selector(AFFILIATION_SECTION_SELECTOR),
        selector(CLUB_NAME_SELECTOR),
        selector(SECTION_REPRESENTATIVES_SELECTOR),
    ) else {
        return Vec::new();
    };

    let found = document
        .select(&sections)
        .map(|section| AffiliationSection {
            club_name: section
                .select(&club)
                .next()
                .map_or(Lookup::NotFound, element_text),
            representatives: section.select(&cells).map(element_text).collect(),
        })
        .collect();
    found
}

/// Text of every element matching `css`, in document order
fn lookup_cells(document: &Html, css: &str) -> Vec<Lookup> {
    selector(css)
        .map(|s| document.select(&s).map(element_text).collect())
        .unwrap_or_default()
}

/// Maps looked-up values onto the fixed representative slots
///
/// Values past the last slot are dropped; missing slots get the sentinel.
pub fn fill_slots(values: Vec<Lookup>) -> [String; REPRESENTATIVE_SLOTS] {
    let mut values = values.into_iter();
    std::array::from_fn(|_| {
        values
            .next()
            .map_or_else(|| SENTINEL.to_string(), Lookup::or_sentinel)
    })
}
