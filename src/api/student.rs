use rocket::{
    response::status::Created,
    serde::json::{self, Json},
    Route,
};

use crate::error::Result;
use crate::model::{
    api::student::StudentRecord, common::student::StudentUpdate, db::Student, mongodb::Coll,
};

use super::body;

pub fn routes() -> Vec<Route> {
    routes![get_student, create_student, update_student, delete_student]
}

#[get("/students/<stu_id>")]
async fn get_student(stu_id: &str, students: Coll<Student>) -> Result<Json<StudentRecord>> {
    let student = Student::find(&students, stu_id).await?;
    Ok(Json(student.into()))
}

#[post("/students", data = "<record>")]
async fn create_student(
    record: std::result::Result<Json<StudentRecord>, json::Error<'_>>,
    students: Coll<Student>,
) -> Result<Created<Json<StudentRecord>>> {
    let student = Student::create(&students, body(record)?.into()).await?;
    let location = uri!(get_student(student.id.as_str())).to_string();
    Ok(Created::new(location).body(Json(student.into())))
}

#[put("/students/<stu_id>", data = "<update>")]
async fn update_student(
    stu_id: &str,
    update: std::result::Result<Json<StudentUpdate>, json::Error<'_>>,
    students: Coll<Student>,
) -> Result<Json<StudentRecord>> {
    let student = Student::update(&students, stu_id, &body(update)?).await?;
    Ok(Json(student.into()))
}

#[delete("/students/<stu_id>")]
async fn delete_student(stu_id: &str, students: Coll<Student>) -> Result<Json<StudentRecord>> {
    let student = Student::delete(&students, stu_id).await?;
    Ok(Json(student.into()))
}
