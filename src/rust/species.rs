//! Species-code extraction from alignment hit headers.
//!
//! Database hits carry headers of the form
//! `<db-code>|<accession>|<mnemonic>_<species-code>`, e.g.
//! `sp|P0C2L1|A3X1_LOXLA` or `cb|A0A146SKV9|A0A146SKV9_FUNHE`. The species
//! code is the tail of the entry name and is what the downstream pairing
//! step keys on. Headers that do not follow the convention yield no code;
//! that is tolerated, not an error.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{DatabaseCode, SpeciesCode};

// db-code | accession (6-10 alnum, optional isoform suffix) | mnemonic _ species.
// The species group must end at the header tail, whitespace, or the `/`
// appended by the taxonomy rewrite.
static HIT_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(sp|tr|cb)\|([A-Za-z0-9]{6,10}(?:-\d+)?)\|([A-Za-z0-9]{1,10})_([A-Za-z0-9]{1,5})(?:[\s/]|$)",
    )
    .expect("hit header pattern must compile")
});

/// Structured form of a hit header that matched the naming convention
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitHeader {
    pub database: DatabaseCode,
    pub accession: String,
    pub mnemonic: String,
    pub species: SpeciesCode,
}

impl HitHeader {
    /// Parse a header line (without the leading `>`), returning `None` when
    /// it does not follow the database naming convention.
    pub fn parse(header: &str) -> Option<Self> {
        let caps = HIT_HEADER.captures(header)?;
        let database = DatabaseCode::new(&caps[1]).ok()?;
        let species = SpeciesCode::new(&caps[4]).ok()?;
        Some(HitHeader {
            database,
            accession: caps[2].to_string(),
            mnemonic: caps[3].to_string(),
            species,
        })
    }
}

/// Extract the species code from a hit header, if the header matches the
/// fixed pattern.
pub fn extract_species_code(header: &str) -> Option<SpeciesCode> {
    HitHeader::parse(header).map(|h| h.species)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swissprot_header() {
        let code = extract_species_code("sp|P0C2L1|A3X1_LOXLA").unwrap();
        assert_eq!(code.get(), "LOXLA");
    }

    #[test]
    fn test_colabfold_header() {
        let code = extract_species_code("cb|A0A146SKV9|A0A146SKV9_FUNHE").unwrap();
        assert_eq!(code.get(), "FUNHE");
    }

    #[test]
    fn test_trembl_header_with_description() {
        let code = extract_species_code("tr|A0A023FBW7|A0A023FBW7_9ACAR Uncharacterized protein")
            .unwrap();
        assert_eq!(code.get(), "9ACAR");
    }

    #[test]
    fn test_numeric_taxid_with_slash_tail() {
        // Headers rewritten by the taxonomy pass end in `/`
        let code = extract_species_code("cb|A0A146SKV9|A0A146SKV9_9606/").unwrap();
        assert_eq!(code.get(), "9606");
    }

    #[test]
    fn test_isoform_accession() {
        let header = HitHeader::parse("sp|P0C2L1-2|A3X1_LOXLA").unwrap();
        assert_eq!(header.accession, "P0C2L1-2");
        assert_eq!(header.species.get(), "LOXLA");
    }

    #[test]
    fn test_parsed_components() {
        let header = HitHeader::parse("sp|P0C2L1|A3X1_LOXLA").unwrap();
        assert_eq!(header.database, DatabaseCode::SwissProt);
        assert_eq!(header.accession, "P0C2L1");
        assert_eq!(header.mnemonic, "A3X1");
    }

    #[test]
    fn test_non_matching_headers() {
        // No pipe separators
        assert!(extract_species_code("UniRef100_A0A146SKV9").is_none());
        // Unknown database code
        assert!(extract_species_code("up|P0C2L1|A3X1_LOXLA").is_none());
        // Accession too short
        assert!(extract_species_code("sp|P0C2|A3X1_LOXLA").is_none());
        // No species tail
        assert!(extract_species_code("cb|A0A146SKV9|A0A146SKV9/").is_none());
        // Species tail too long (six-digit TaxID)
        assert!(extract_species_code("cb|A0A146SKV9|A0A146SKV9_123456").is_none());
    }
}
