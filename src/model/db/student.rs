use std::ops::{Deref, DerefMut};

use mongodb::{
    bson::doc,
    options::{FindOneAndUpdateOptions, ReturnDocument},
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    api::student::StudentRecord,
    common::student::{StudentDetails, StudentUpdate},
    mongodb::{is_duplicate_key_error, Coll},
};

/// A student from the database, keyed by their student ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub details: StudentDetails,
}

impl Student {
    /// Insert a new student, failing if the ID is already taken.
    pub async fn create(students: &Coll<Student>, student: Student) -> Result<Student> {
        match students.insert_one(&student, None).await {
            Ok(_) => Ok(student),
            Err(err) if is_duplicate_key_error(&err) => Err(Error::AlreadyExists(format!(
                "Student '{}'",
                student.id
            ))),
            Err(err) => Err(err.into()),
        }
    }

    /// Fetch the student with the given ID.
    pub async fn find(students: &Coll<Student>, stu_id: &str) -> Result<Student> {
        students
            .find_one(doc! { "_id": stu_id }, None)
            .await?
            .ok_or_else(|| Error::student_not_found(stu_id))
    }

    /// Overwrite the year and major of an existing student, returning the
    /// updated record.
    pub async fn update(
        students: &Coll<Student>,
        stu_id: &str,
        update: &StudentUpdate,
    ) -> Result<Student> {
        let set = doc! {
            "$set": {
                "year": i64::from(update.year),
                "major": &update.major,
            }
        };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        students
            .find_one_and_update(doc! { "_id": stu_id }, set, options)
            .await?
            .ok_or_else(|| Error::student_not_found(stu_id))
    }

    /// Delete the student with the given ID, returning the removed record.
    pub async fn delete(students: &Coll<Student>, stu_id: &str) -> Result<Student> {
        students
            .find_one_and_delete(doc! { "_id": stu_id }, None)
            .await?
            .ok_or_else(|| Error::student_not_found(stu_id))
    }
}

impl From<StudentRecord> for Student {
    fn from(mut record: StudentRecord) -> Self {
        // The natural key is the document ID; a client-supplied one is dropped.
        record.extra.remove("_id");
        Self {
            id: record.stu_id,
            details: record.details,
        }
    }
}

impl Deref for Student {
    type Target = StudentDetails;

    fn deref(&self) -> &Self::Target {
        &self.details
    }
}

impl DerefMut for Student {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.details
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl Student {
        pub fn example() -> Self {
            StudentRecord::example().into()
        }
    }
}

#[cfg(test)]
mod tests {
    use mongodb::Database;

    use super::*;

    #[test]
    fn client_id_is_dropped() {
        let mut record = StudentRecord::example();
        record.extra.insert("_id", "bogus");
        let student = Student::from(record);
        assert_eq!(student.id, "S1");
        assert!(student.extra.get("_id").is_none());
    }

    #[backend_test]
    async fn duplicate_create_leaves_original(students: Coll<Student>) {
        let original = Student::create(&students, Student::example())
            .await
            .unwrap();

        let mut imposter = Student::example();
        imposter.major = "History".to_string();
        let result = Student::create(&students, imposter).await;
        assert!(matches!(result, Err(Error::AlreadyExists(_))));

        let stored = Student::find(&students, "S1").await.unwrap();
        assert_eq!(stored, original);
    }

    #[backend_test]
    async fn update_touches_only_year_and_major(students: Coll<Student>) {
        Student::create(&students, Student::example()).await.unwrap();

        let updated = Student::update(&students, "S1", &StudentUpdate::example())
            .await
            .unwrap();
        assert_eq!(updated.year, 3);
        assert_eq!(updated.major, "Economics");
        assert_eq!(updated.extra, StudentDetails::example().extra);

        let missing = Student::update(&students, "S404", &StudentUpdate::example()).await;
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }

    #[backend_test]
    async fn delete_then_find(db: Database) {
        let students = Coll::<Student>::from_db(&db);
        Student::create(&students, Student::example()).await.unwrap();

        let removed = Student::delete(&students, "S1").await.unwrap();
        assert_eq!(removed, Student::example());

        let result = Student::find(&students, "S1").await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        let result = Student::delete(&students, "S1").await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
