//! The single-endpoint API kept for existing clients. The operation is picked
//! by the HTTP method and by which keys are present in the query or JSON body.
//!
//! Body-based operations are triggered by `name` (students), `elec_name`
//! (elections) and `candidate` (votes), but read the record's key from
//! `stu_id` / `elec_id`. A request that triggers an operation but lacks the
//! key it reads is rejected as malformed.

use mongodb::Database;
use rocket::{
    http::{Method, Status},
    response::status::Custom,
    serde::json::{self, serde_json, Json, Value},
    Route, State,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::logging::RequestId;
use crate::model::{
    api::{election::ElectionRecord, student::StudentRecord, VoteRecord},
    common::student::StudentUpdate,
    db::{Election, Student},
    mongodb::Coll,
};
use crate::vote_service::VoteService;

use super::body;

pub fn routes() -> Vec<Route> {
    routes![legacy_get, legacy_post, legacy_put, legacy_delete]
}

/// A legacy request, resolved to the operation it triggers.
#[derive(Debug, Clone, PartialEq)]
pub enum LegacyRequest {
    QueryStudent(String),
    CreateStudent(StudentRecord),
    UpdateStudent(String, StudentUpdate),
    /// Carries the original body, which is echoed back on success.
    DeleteStudent(String, Value),
    QueryElection(String),
    CreateElection(ElectionRecord),
    /// Carries the original body, which is echoed back on success.
    DeleteElection(String, Value),
    CastVote(VoteRecord),
}

#[derive(Deserialize)]
struct StudentKey {
    stu_id: String,
}

#[derive(Deserialize)]
struct ElectionKey {
    elec_id: String,
}

#[derive(Deserialize)]
struct KeyedStudentUpdate {
    stu_id: String,
    #[serde(flatten)]
    update: StudentUpdate,
}

impl LegacyRequest {
    /// Resolve a GET request from its query parameters.
    pub fn from_query(stu_id: Option<String>, elec_id: Option<String>) -> Result<Self> {
        match (stu_id, elec_id) {
            (Some(stu_id), _) => Ok(Self::QueryStudent(stu_id)),
            (None, Some(elec_id)) => Ok(Self::QueryElection(elec_id)),
            (None, None) => Err(unmatched()),
        }
    }

    /// Resolve a request with a JSON body. Triggers are checked in a fixed
    /// order, so a body with both `name` and `candidate` is a student request.
    pub fn from_body(method: Method, body: Value) -> Result<Self> {
        let has = |key: &str| body.get(key).is_some();
        match method {
            Method::Post if has("name") => Ok(Self::CreateStudent(parse(&body)?)),
            Method::Put if has("name") => {
                let keyed: KeyedStudentUpdate = parse(&body)?;
                Ok(Self::UpdateStudent(keyed.stu_id, keyed.update))
            }
            Method::Delete if has("name") => {
                let key: StudentKey = parse(&body)?;
                Ok(Self::DeleteStudent(key.stu_id, body))
            }
            Method::Post if has("elec_name") => Ok(Self::CreateElection(parse(&body)?)),
            Method::Delete if has("elec_name") => {
                let key: ElectionKey = parse(&body)?;
                Ok(Self::DeleteElection(key.elec_id, body))
            }
            Method::Post if has("candidate") => Ok(Self::CastVote(parse(&body)?)),
            _ => Err(unmatched()),
        }
    }

    /// Run the operation, producing the status and JSON body to send back.
    pub async fn handle(
        self,
        db: &Database,
        vote_service: &VoteService,
    ) -> Result<Custom<Json<Value>>> {
        let students = Coll::<Student>::from_db(db);
        let elections = Coll::<Election>::from_db(db);
        match self {
            Self::QueryStudent(stu_id) => {
                let student = Student::find(&students, &stu_id).await?;
                respond(Status::Ok, StudentRecord::from(student))
            }
            Self::CreateStudent(record) => {
                let student = Student::create(&students, record.into()).await?;
                respond(Status::Created, StudentRecord::from(student))
            }
            Self::UpdateStudent(stu_id, update) => {
                let student = Student::update(&students, &stu_id, &update).await?;
                respond(Status::Ok, StudentRecord::from(student))
            }
            Self::DeleteStudent(stu_id, original) => {
                Student::delete(&students, &stu_id).await?;
                Ok(Custom(Status::Ok, Json(original)))
            }
            Self::QueryElection(elec_id) => {
                let election = Election::find(&elections, &elec_id).await?;
                respond(Status::Ok, ElectionRecord::from(election))
            }
            Self::CreateElection(record) => {
                let election = Election::create(&elections, record.into()).await?;
                respond(Status::Created, ElectionRecord::from(election))
            }
            Self::DeleteElection(elec_id, original) => {
                Election::delete(&elections, &elec_id).await?;
                Ok(Custom(Status::Ok, Json(original)))
            }
            Self::CastVote(vote) => {
                let vote = vote_service.cast(vote).await?;
                respond(Status::Ok, vote)
            }
        }
    }
}

fn unmatched() -> Error {
    Error::BadRequest("Request not successful".to_string())
}

fn parse<T: DeserializeOwned>(body: &Value) -> Result<T> {
    T::deserialize(body).map_err(|e| Error::BadRequest(e.to_string()))
}

fn respond<T: Serialize>(status: Status, record: T) -> Result<Custom<Json<Value>>> {
    Ok(Custom(status, Json(serde_json::to_value(record)?)))
}

async fn run(
    request: Result<LegacyRequest>,
    id: &RequestId,
    db: &Database,
    vote_service: &VoteService,
) -> Result<Custom<Json<Value>>> {
    let request = request?;
    debug!("req{id} resolved to {request:?}");
    request.handle(db, vote_service).await
}

#[get("/?<stu_id>&<elec_id>")]
async fn legacy_get(
    stu_id: Option<String>,
    elec_id: Option<String>,
    id: &RequestId,
    db: &State<Database>,
    vote_service: &State<VoteService>,
) -> Result<Custom<Json<Value>>> {
    run(LegacyRequest::from_query(stu_id, elec_id), id, db, vote_service).await
}

#[post("/", data = "<data>")]
async fn legacy_post(
    data: std::result::Result<Json<Value>, json::Error<'_>>,
    id: &RequestId,
    db: &State<Database>,
    vote_service: &State<VoteService>,
) -> Result<Custom<Json<Value>>> {
    let request = body(data).and_then(|data| LegacyRequest::from_body(Method::Post, data));
    run(request, id, db, vote_service).await
}

#[put("/", data = "<data>")]
async fn legacy_put(
    data: std::result::Result<Json<Value>, json::Error<'_>>,
    id: &RequestId,
    db: &State<Database>,
    vote_service: &State<VoteService>,
) -> Result<Custom<Json<Value>>> {
    let request = body(data).and_then(|data| LegacyRequest::from_body(Method::Put, data));
    run(request, id, db, vote_service).await
}

#[delete("/", data = "<data>")]
async fn legacy_delete(
    data: std::result::Result<Json<Value>, json::Error<'_>>,
    id: &RequestId,
    db: &State<Database>,
    vote_service: &State<VoteService>,
) -> Result<Custom<Json<Value>>> {
    let request = body(data).and_then(|data| LegacyRequest::from_body(Method::Delete, data));
    run(request, id, db, vote_service).await
}
