use serde::{Deserialize, Serialize};
use std::fmt;

/// A type-safe wrapper for chain identifiers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainId(pub String);

impl ChainId {
    /// Create a new chain identifier with validation
    pub fn new(id: &str) -> Result<Self, String> {
        if id.is_empty() {
            Err("Chain identifier must not be empty".to_string())
        } else if !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            Err(format!("Invalid chain identifier: {}. Must be alphanumeric", id))
        } else {
            Ok(ChainId(id.to_string()))
        }
    }

    /// Get the raw value
    pub fn get(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A type-safe wrapper for species codes recovered from hit headers
///
/// The species code is the 1-5 character alphanumeric tail of the entry
/// name, e.g. `LOXLA` in `A3X1_LOXLA` or a numeric NCBI TaxID like `9606`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpeciesCode(pub String);

impl SpeciesCode {
    /// Create a new species code with validation
    pub fn new(code: &str) -> Result<Self, String> {
        if code.is_empty() || code.len() > 5 {
            Err(format!(
                "Invalid species code: {}. Must be 1-5 alphanumeric characters",
                code
            ))
        } else if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            Err(format!("Invalid species code: {}. Must be alphanumeric", code))
        } else {
            Ok(SpeciesCode(code.to_string()))
        }
    }

    /// Get the raw value
    pub fn get(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpeciesCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A type-safe wrapper for NCBI taxonomy identifiers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaxId(pub String);

impl TaxId {
    /// Create a new taxonomy identifier with validation
    pub fn new(id: &str) -> Result<Self, String> {
        if id.is_empty() {
            Err("TaxID must not be empty".to_string())
        } else if !id.chars().all(|c| c.is_ascii_digit()) {
            Err(format!("Invalid TaxID: {}. Must be numeric", id))
        } else {
            Ok(TaxId(id.to_string()))
        }
    }

    /// Get the raw value
    pub fn get(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Database source codes appearing in hit headers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatabaseCode {
    /// Reviewed UniProtKB entry (`sp`)
    SwissProt,
    /// Unreviewed UniProtKB entry (`tr`)
    Trembl,
    /// ColabFold UniRef-derived entry (`cb`)
    ColabFold,
}

impl DatabaseCode {
    /// Parse a database code with validation
    pub fn new(code: &str) -> Result<Self, String> {
        match code {
            "sp" => Ok(DatabaseCode::SwissProt),
            "tr" => Ok(DatabaseCode::Trembl),
            "cb" => Ok(DatabaseCode::ColabFold),
            _ => Err(format!(
                "Invalid database code: {}. Must be one of: sp, tr, cb",
                code
            )),
        }
    }

    /// Get the header form of the code
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseCode::SwissProt => "sp",
            DatabaseCode::Trembl => "tr",
            DatabaseCode::ColabFold => "cb",
        }
    }
}

impl fmt::Display for DatabaseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_id_validation() {
        assert!(ChainId::new("").is_err());
        assert!(ChainId::new("A").is_ok());
        assert!(ChainId::new("B1").is_ok());
        assert!(ChainId::new("A B").is_err());
        assert!(ChainId::new("A|B").is_err());
    }

    #[test]
    fn test_species_code_validation() {
        assert!(SpeciesCode::new("").is_err());
        assert!(SpeciesCode::new("LOXLA").is_ok());
        assert!(SpeciesCode::new("9606").is_ok());
        assert!(SpeciesCode::new("HUMAN1").is_err());
        assert!(SpeciesCode::new("HU_AN").is_err());
    }

    #[test]
    fn test_taxid_validation() {
        assert!(TaxId::new("").is_err());
        assert!(TaxId::new("9606").is_ok());
        assert!(TaxId::new("303").is_ok());
        assert!(TaxId::new("96a6").is_err());
    }

    #[test]
    fn test_database_code_validation() {
        assert!(DatabaseCode::new("sp").is_ok());
        assert!(DatabaseCode::new("tr").is_ok());
        assert!(DatabaseCode::new("cb").is_ok());
        assert!(DatabaseCode::new("up").is_err());
        assert_eq!(DatabaseCode::new("cb").unwrap().as_str(), "cb");
    }
}
