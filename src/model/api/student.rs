use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::{common::student::StudentDetails, db::Student};

/// A student record as seen by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub stu_id: String,
    #[serde(flatten)]
    pub details: StudentDetails,
}

impl From<Student> for StudentRecord {
    fn from(student: Student) -> Self {
        Self {
            stu_id: student.id,
            details: student.details,
        }
    }
}

impl Deref for StudentRecord {
    type Target = StudentDetails;

    fn deref(&self) -> &Self::Target {
        &self.details
    }
}

impl DerefMut for StudentRecord {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.details
    }
}

#[cfg(test)]
mod examples {
    use super::*;

    impl StudentRecord {
        pub fn example() -> Self {
            Self {
                stu_id: "S1".to_string(),
                details: StudentDetails::example(),
            }
        }
    }
}
