//! Record expansion
//!
//! One organization fans out into one row per affiliation section, or a
//! single row with sentinel affiliation fields when it has none.

use super::fields::{fill_slots, BaseFields, REPRESENTATIVE_SLOTS};
use super::lookup::Lookup;
use super::SENTINEL;

/// Output columns, in order
pub const HEADER: [&str; 15] = [
    "Company Name",
    "Address",
    "Phone",
    "Fax",
    "Email",
    "Website",
    "Product(s) & Services",
    "Factory Location",
    "FTI Representative 1",
    "FTI Representative 2",
    "FTI Representative 3",
    "Industrial Club",
    "Industrial Rep 1",
    "Industrial Rep 2",
    "Industrial Rep 3",
];

/// One industrial-club block as found on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffiliationSection {
    pub club_name: Lookup,
    pub representatives: Vec<Lookup>,
}

/// Resolved affiliation columns of one row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffiliationFields {
    pub club_name: String,
    pub representatives: [String; REPRESENTATIVE_SLOTS],
}

impl AffiliationFields {
    /// All-sentinel affiliation, used when an organization has none
    pub fn absent() -> Self {
        Self {
            club_name: SENTINEL.to_string(),
            representatives: std::array::from_fn(|_| SENTINEL.to_string()),
        }
    }
}

impl From<AffiliationSection> for AffiliationFields {
    fn from(section: AffiliationSection) -> Self {
        Self {
            club_name: section.club_name.or_sentinel(),
            representatives: fill_slots(section.representatives),
        }
    }
}

/// One output row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationRecord {
    pub base: BaseFields,
    pub affiliation: AffiliationFields,
}

impl OrganizationRecord {
    /// Cells in [`HEADER`] order
    pub fn to_row(&self) -> Vec<String> {
        let base = &self.base;
        let mut row = Vec::with_capacity(HEADER.len());
        row.extend([
            base.name.clone(),
            base.address.clone(),
            base.phone.clone(),
            base.fax.clone(),
            base.email.clone(),
            base.website.clone(),
            base.products_services.clone(),
            base.factory_location.clone(),
        ]);
        row.extend(base.fti_representatives.iter().cloned());
        row.push(self.affiliation.club_name.clone());
        row.extend(self.affiliation.representatives.iter().cloned());
        row
    }
}

/// Fans base fields out over the affiliation sections
///
/// Always returns `max(sections.len(), 1)` records, in document order, all
/// carrying the same base fields.
pub fn expand_records(
    base: BaseFields,
    sections: Vec<AffiliationSection>,
) -> Vec<OrganizationRecord> {
    if sections.is_empty() {
        return vec![OrganizationRecord {
            base,
            affiliation: AffiliationFields::absent(),
        }];
    }

    sections
        .into_iter()
        .map(|section| OrganizationRecord {
            base: base.clone(),
            affiliation: section.into(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> BaseFields {
        BaseFields {
            name: "Thai Steel".to_string(),
            address: "1 Sukhumvit".to_string(),
            phone: "02-111".to_string(),
            fax: SENTINEL.to_string(),
            email: "a@b.th".to_string(),
            website: "https://thaisteel.th/".to_string(),
            products_services: "Steel".to_string(),
            factory_location: "Chonburi".to_string(),
            fti_representatives: [
                "Rep A".to_string(),
                SENTINEL.to_string(),
                SENTINEL.to_string(),
            ],
        }
    }

    fn section(club: Option<&str>, reps: &[&str]) -> AffiliationSection {
        AffiliationSection {
            club_name: club.map_or(Lookup::NotFound, Lookup::from_text),
            representatives: reps.iter().map(|r| Lookup::from_text(r)).collect(),
        }
    }

    #[test]
    fn test_no_sections_yields_one_sentinel_row() {
        let records = expand_records(base(), Vec::new());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].base, base());
        assert_eq!(records[0].affiliation, AffiliationFields::absent());

        let row = records[0].to_row();
        assert_eq!(row.len(), HEADER.len());
        assert!(row[11..].iter().all(|cell| cell == SENTINEL));
    }

    #[test]
    fn test_one_row_per_section_in_order() {
        let records = expand_records(
            base(),
            vec![
                section(Some("Club One"), &["A", "B", "C", "D"]),
                section(None, &["E"]),
                section(Some("Club Three"), &[]),
            ],
        );

        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.base == base()));

        assert_eq!(records[0].affiliation.club_name, "Club One");
        assert_eq!(records[0].affiliation.representatives, ["A", "B", "C"]);

        assert_eq!(records[1].affiliation.club_name, SENTINEL);
        assert_eq!(
            records[1].affiliation.representatives,
            ["E", SENTINEL, SENTINEL]
        );

        assert_eq!(records[2].affiliation.club_name, "Club Three");
        assert_eq!(records[2].affiliation.representatives, [SENTINEL; 3]);
    }

    #[test]
    fn test_row_order_matches_header() {
        let records = expand_records(base(), vec![section(Some("Club"), &["X", "Y"])]);
        let row = records[0].to_row();
        assert_eq!(row[0], "Thai Steel");
        assert_eq!(row[5], "https://thaisteel.th/");
        assert_eq!(row[8], "Rep A");
        assert_eq!(row[11], "Club");
        assert_eq!(row[12], "X");
        assert_eq!(row[14], SENTINEL);
    }

    #[test]
    fn test_every_cell_is_populated() {
        let records = expand_records(
            base(),
            vec![section(Some("  "), &["", " "]), section(None, &[])],
        );
        for record in &records {
            for cell in record.to_row() {
                assert!(!cell.is_empty());
            }
        }
    }
}
