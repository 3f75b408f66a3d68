use std::collections::HashMap;

use mongodb::bson::Document;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Everything about an election except its ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionDetails {
    /// Running vote count for each candidate, keyed by candidate name.
    pub candidates: HashMap<String, u32>,
    /// Any other fields the client supplied, stored untouched.
    #[serde(flatten)]
    pub extra: Document,
}

impl ElectionDetails {
    /// Reject candidate names that cannot be used as a field path in the
    /// election document.
    pub fn validate(&self) -> Result<()> {
        match self
            .candidates
            .keys()
            .find(|name| !is_valid_candidate_name(name))
        {
            Some(name) => Err(Error::BadRequest(format!(
                "Illegal candidate name '{name}'"
            ))),
            None => Ok(()),
        }
    }

    /// How many votes the given candidate has, if they stand in this election.
    pub fn tally(&self, candidate: &str) -> Option<u32> {
        self.candidates.get(candidate).copied()
    }
}

/// Candidate names become part of a dotted field path when counting votes.
pub fn is_valid_candidate_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('.') && !name.starts_with('$')
}

/// The field path holding the given candidate's tally.
pub fn tally_field(candidate: &str) -> String {
    format!("candidates.{candidate}")
}

#[cfg(test)]
mod examples {
    use mongodb::bson::doc;

    use super::*;

    impl ElectionDetails {
        pub fn example() -> Self {
            Self {
                candidates: HashMap::from([("Alice".to_string(), 0), ("Bob".to_string(), 0)]),
                extra: doc! { "elec_name": "SRC President" },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_names() {
        assert!(is_valid_candidate_name("Alice"));
        assert!(is_valid_candidate_name("Kofi Mensah-Bonsu"));
        assert!(!is_valid_candidate_name(""));
        assert!(!is_valid_candidate_name("A. Smith"));
        assert!(!is_valid_candidate_name("$where"));
    }

    #[test]
    fn validate_rejects_dotted_names() {
        let mut details = ElectionDetails::example();
        assert!(details.validate().is_ok());

        details.candidates.insert("J.R.".to_string(), 0);
        assert!(matches!(details.validate(), Err(Error::BadRequest(_))));
    }

    #[test]
    fn tally_lookup() {
        let details = ElectionDetails::example();
        assert_eq!(details.tally("Alice"), Some(0));
        assert_eq!(details.tally("Carol"), None);
        assert_eq!(tally_field("Alice"), "candidates.Alice");
    }
}
