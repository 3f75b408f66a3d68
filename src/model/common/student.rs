use mongodb::bson::Document;
use serde::{Deserialize, Serialize};

/// Everything about a student except their ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentDetails {
    pub year: u32,
    pub major: String,
    /// Any other fields the client supplied, stored untouched.
    #[serde(flatten)]
    pub extra: Document,
}

/// The only fields of a student that may change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentUpdate {
    pub year: u32,
    pub major: String,
}

#[cfg(test)]
mod examples {
    use mongodb::bson::doc;

    use super::*;

    impl StudentDetails {
        pub fn example() -> Self {
            Self {
                year: 2,
                major: "Computer Science".to_string(),
                extra: doc! { "name": "Ama Owusu" },
            }
        }
    }

    impl StudentUpdate {
        pub fn example() -> Self {
            Self {
                year: 3,
                major: "Economics".to_string(),
            }
        }
    }
}
