use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Difficulty tier of a puzzle.
///
/// The first three tiers keep the classic 3x3 box rule. `Expert` drops it and
/// instead requires every row and column to be a sentence from the pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    /// Get all tiers in id-range order
    pub fn all_levels() -> &'static [Difficulty] {
        &[
            Difficulty::Easy,
            Difficulty::Medium,
            Difficulty::Hard,
            Difficulty::Expert,
        ]
    }

    /// Stable lowercase key used in file names and RNG labels
    pub fn key(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        }
    }

    /// Whether 3x3 box uniqueness is enforced for this tier
    pub fn is_box_constrained(&self) -> bool {
        !self.is_box_free()
    }

    /// The box-free tier (rows and columns only, sentence hints)
    pub fn is_box_free(&self) -> bool {
        matches!(self, Difficulty::Expert)
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "Easy"),
            Difficulty::Medium => write!(f, "Medium"),
            Difficulty::Hard => write!(f, "Hard"),
            Difficulty::Expert => write!(f, "Expert"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            "expert" => Ok(Difficulty::Expert),
            other => Err(format!(
                "unknown difficulty '{}' (expected easy, medium, hard or expert)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_round_trips_through_from_str() {
        for &difficulty in Difficulty::all_levels() {
            assert_eq!(difficulty.key().parse::<Difficulty>(), Ok(difficulty));
        }
        assert_eq!("HARD".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert!("extreme".parse::<Difficulty>().is_err());
    }

    #[test]
    fn test_only_expert_is_box_free() {
        let box_free: Vec<_> = Difficulty::all_levels()
            .iter()
            .filter(|d| d.is_box_free())
            .collect();
        assert_eq!(box_free, vec![&Difficulty::Expert]);
    }

    #[test]
    fn test_serde_uses_lowercase_keys() {
        let json = serde_json::to_string(&Difficulty::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
        let back: Difficulty = serde_json::from_str("\"expert\"").unwrap();
        assert_eq!(back, Difficulty::Expert);
    }
}
