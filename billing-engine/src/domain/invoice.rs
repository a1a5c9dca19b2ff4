use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// The four billable energy concepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Concept {
    /// EA: active energy, consumption at the tariff's CU rate.
    Ea,
    /// EC: commercialization of excess, injection at the tariff's C rate.
    Ec,
    /// EE1: injection offset by own consumption, credited at -CU.
    Ee1,
    /// EE2: injection beyond total consumption, priced at hourly market rates.
    Ee2,
}

impl fmt::Display for Concept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ea => write!(f, "EA"),
            Self::Ec => write!(f, "EC"),
            Self::Ee1 => write!(f, "EE1"),
            Self::Ee2 => write!(f, "EE2"),
        }
    }
}

impl FromStr for Concept {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ea" => Ok(Self::Ea),
            "ec" => Ok(Self::Ec),
            "ee1" => Ok(Self::Ee1),
            "ee2" => Ok(Self::Ee2),
            other => Err(format!("unknown billing concept '{other}'")),
        }
    }
}

/// One computed invoice line: quantity in kWh, rate in currency per
/// kWh, total = quantity * rate (except EE2, where rate is derived
/// from the total).
#[derive(Debug, Clone, Serialize)]
pub struct ConceptLine {
    pub concept: Concept,
    pub quantity: f64,
    pub rate: f64,
    pub total: f64,
}

/// A full customer-month invoice. Never persisted; recomputed per
/// request.
#[derive(Debug, Clone, Serialize)]
pub struct Invoice {
    pub service_id: i64,
    pub year: i32,
    pub month: u8,
    pub ea: ConceptLine,
    pub ec: ConceptLine,
    pub ee1: ConceptLine,
    pub ee2: ConceptLine,
    pub total: f64,
}
