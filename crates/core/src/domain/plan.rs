use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Service package a quotation is configured against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    Basic,
    Intermediate,
    Advanced,
}

impl PlanType {
    pub const ALL: [PlanType; 3] = [PlanType::Basic, PlanType::Intermediate, PlanType::Advanced];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanType {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            _ => Err(DomainError::UnknownPlan { plan: value.to_owned() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PlanType;
    use crate::errors::DomainError;

    #[test]
    fn parses_plan_keys_case_insensitively() {
        assert_eq!("basic".parse::<PlanType>(), Ok(PlanType::Basic));
        assert_eq!(" Advanced ".parse::<PlanType>(), Ok(PlanType::Advanced));
        assert_eq!(PlanType::Intermediate.to_string(), "intermediate");
    }

    #[test]
    fn rejects_unknown_plan_keys() {
        let error = "enterprise".parse::<PlanType>().expect_err("enterprise is not a plan");
        assert_eq!(error, DomainError::UnknownPlan { plan: "enterprise".to_owned() });
    }
}
