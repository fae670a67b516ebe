//! Value Objects for sales fact resolution

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MAX_SKU_LEN: usize = 128;

/// SKU (Stock Keeping Unit) value object.
///
/// Channel SKUs arrive in any case and with stray whitespace; every SKU the
/// engine compares is trimmed and upper-cased first.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Sku(String);

impl Sku {
    pub fn new(value: impl AsRef<str>) -> Result<Self, SkuError> {
        let value = value.as_ref().trim().to_uppercase();
        if value.is_empty() { return Err(SkuError::Empty); }
        if value.len() > MAX_SKU_LEN { return Err(SkuError::TooLong); }
        Ok(Self(value))
    }

    /// Lenient parse for raw line-item SKUs; anything unusable cannot be resolved.
    pub fn parse(value: Option<&str>) -> Option<Self> { value.and_then(|v| Self::new(v).ok()) }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone)] pub enum SkuError { Empty, TooLong }
impl std::error::Error for SkuError {}
impl fmt::Display for SkuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Empty => write!(f, "SKU empty"), Self::TooLong => write!(f, "SKU too long") }
    }
}

/// Resolution path that produced a sales fact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Direct,
    CajaMaster,
    SkuMapping,
    SkuMappingCajaMaster,
    Unmapped,
}

impl MatchType {
    pub const ALL: [MatchType; 5] = [
        MatchType::Direct,
        MatchType::CajaMaster,
        MatchType::SkuMapping,
        MatchType::SkuMappingCajaMaster,
        MatchType::Unmapped,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::CajaMaster => "caja_master",
            Self::SkuMapping => "sku_mapping",
            Self::SkuMappingCajaMaster => "sku_mapping_caja_master",
            Self::Unmapped => "unmapped",
        }
    }

    pub fn is_master_box(&self) -> bool { matches!(self, Self::CajaMaster | Self::SkuMappingCajaMaster) }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for MatchType {
    type Err = UnknownMatchType;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|m| m.as_str().eq_ignore_ascii_case(s.trim())).ok_or_else(|| UnknownMatchType(s.to_string()))
    }
}

#[derive(Debug, Clone)] pub struct UnknownMatchType(pub String);
impl std::error::Error for UnknownMatchType {}
impl fmt::Display for UnknownMatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "unknown match type: {}", self.0) }
}

/// Invoice statuses whose orders count as sales.
pub const ACCEPTED_INVOICE_STATUSES: [&str; 2] = ["accepted", "accepted_objection"];
pub const CANCELLED_STATUS: &str = "cancelled";

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_sku_normalizes_case_and_whitespace() { let sku = Sku::new("  bakc_u04010 ").unwrap(); assert_eq!(sku.as_str(), "BAKC_U04010"); }
    #[test]
    fn test_sku_rejects_blank() {
        assert!(Sku::new("   ").is_err());
        assert_eq!(Sku::parse(None), None);
        assert_eq!(Sku::parse(Some("")), None);
    }
    #[test]
    fn test_match_type_wire_names() {
        assert_eq!(serde_json::to_string(&MatchType::SkuMappingCajaMaster).unwrap(), "\"sku_mapping_caja_master\"");
        assert_eq!("CAJA_MASTER".parse::<MatchType>().unwrap(), MatchType::CajaMaster);
        assert!("fuzzy".parse::<MatchType>().is_err());
    }
    #[test]
    fn test_master_box_paths() {
        let master: Vec<_> = MatchType::ALL.into_iter().filter(MatchType::is_master_box).collect();
        assert_eq!(master, vec![MatchType::CajaMaster, MatchType::SkuMappingCajaMaster]);
    }
}
