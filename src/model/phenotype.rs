//! Canonical cell phenotypes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Error;

/// One label from the closed set of canonical phenotypes.
///
/// Marker-combination normalization happens upstream; by the time a cell
/// reaches this crate it carries exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phenotype {
    Tumor,
    /// Stroma and every unclassified cell.
    Other,
    HelperT,
    KillerT,
    BCell,
    TCell,
    Macrophage,
    RegulatoryT,
    /// CD4+CD8 double-positive T cells.
    DoublePositive,
}

impl Phenotype {
    /// Every phenotype, in declaration order.
    pub const ALL: [Phenotype; 9] = [
        Phenotype::Tumor,
        Phenotype::Other,
        Phenotype::HelperT,
        Phenotype::KillerT,
        Phenotype::BCell,
        Phenotype::TCell,
        Phenotype::Macrophage,
        Phenotype::RegulatoryT,
        Phenotype::DoublePositive,
    ];

    /// Phenotypes counted as immune for the mixing score.
    pub const IMMUNE: [Phenotype; 5] = [
        Phenotype::HelperT,
        Phenotype::KillerT,
        Phenotype::TCell,
        Phenotype::BCell,
        Phenotype::Macrophage,
    ];

    /// Phenotypes that get a stromal-barrier column, in report order.
    pub const TRACKED: [Phenotype; 6] = [
        Phenotype::BCell,
        Phenotype::TCell,
        Phenotype::Macrophage,
        Phenotype::KillerT,
        Phenotype::HelperT,
        Phenotype::RegulatoryT,
    ];

    /// The canonical label, exactly as it appears in graph files and tables.
    pub fn as_str(self) -> &'static str {
        match self {
            Phenotype::Tumor => "Tumor",
            Phenotype::Other => "Other",
            Phenotype::HelperT => "Helper T cell",
            Phenotype::KillerT => "Killer T cell",
            Phenotype::BCell => "B cell",
            Phenotype::TCell => "T cell",
            Phenotype::Macrophage => "Macrophage",
            Phenotype::RegulatoryT => "Regulatory T cell",
            Phenotype::DoublePositive => "CD4+CD8",
        }
    }

    /// Member of the mixing-score immune set. Regulatory T cells are not.
    pub fn is_immune(self) -> bool {
        matches!(
            self,
            Phenotype::HelperT
                | Phenotype::KillerT
                | Phenotype::TCell
                | Phenotype::BCell
                | Phenotype::Macrophage
        )
    }

    pub fn is_tumor(self) -> bool {
        self == Phenotype::Tumor
    }

    pub fn is_stromal(self) -> bool {
        self == Phenotype::Other
    }
}

impl fmt::Display for Phenotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phenotype {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        Phenotype::ALL
            .into_iter()
            .find(|p| p.as_str() == label)
            .ok_or_else(|| Error::UnknownPhenotype(label.to_string()))
    }
}

impl Serialize for Phenotype {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Phenotype {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip() {
        for p in Phenotype::ALL {
            assert_eq!(p.as_str().parse::<Phenotype>().unwrap(), p);
        }
    }

    #[test]
    fn test_unknown_label() {
        let err = "CD3+CD4".parse::<Phenotype>().unwrap_err();
        assert!(matches!(err, Error::UnknownPhenotype(ref l) if l == "CD3+CD4"));
    }

    #[test]
    fn test_membership() {
        assert_eq!(Phenotype::ALL.iter().filter(|p| p.is_immune()).count(), 5);
        assert!(!Phenotype::RegulatoryT.is_immune());
        assert!(!Phenotype::DoublePositive.is_immune());
        assert!(Phenotype::Tumor.is_tumor());
        assert!(Phenotype::Other.is_stromal());
        assert!(Phenotype::IMMUNE.iter().all(|p| p.is_immune()));
    }

    #[test]
    fn test_serde_uses_canonical_label() {
        let json = serde_json::to_string(&Phenotype::KillerT).unwrap();
        assert_eq!(json, "\"Killer T cell\"");
        let back: Phenotype = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Phenotype::KillerT);
    }
}
