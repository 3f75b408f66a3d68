use rocket::{
    serde::json::{self, Json},
    Route, State,
};

use crate::error::Result;
use crate::model::api::VoteRecord;
use crate::vote_service::VoteService;

use super::body;

pub fn routes() -> Vec<Route> {
    routes![cast_vote]
}

#[post("/votes", data = "<vote>")]
async fn cast_vote(
    vote: std::result::Result<Json<VoteRecord>, json::Error<'_>>,
    vote_service: &State<VoteService>,
) -> Result<Json<VoteRecord>> {
    let vote = vote_service.cast(body(vote)?).await?;
    Ok(Json(vote))
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::Status,
        local::asynchronous::Client,
        serde::json::{json, Value},
    };

    use crate::model::{db::Election, mongodb::Coll};

    use super::*;

    #[backend_test(seeded)]
    async fn worked_example(client: Client, elections: Coll<Election>) {
        let response = client
            .post(uri!(cast_vote))
            .json(&VoteRecord::example())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let cast: VoteRecord = response.into_json().await.unwrap();
        assert_eq!(cast, VoteRecord::example());

        let election = Election::find(&elections, "E1").await.unwrap();
        assert_eq!(election.tally("Alice"), Some(1));
        assert_eq!(election.tally("Bob"), Some(0));

        let response = client
            .post(uri!(cast_vote))
            .json(&json!({ "stu_id": "S1", "elec_id": "E1", "candidate": "Bob" }))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Conflict);
        let error: Value = response.into_json().await.unwrap();
        assert_eq!(error, json!({ "error": "Student 'S1' has already voted" }));
    }

    #[backend_test(seeded)]
    async fn missing_student_is_not_found(client: Client) {
        let response = client
            .post(uri!(cast_vote))
            .json(&json!({ "stu_id": "S2", "elec_id": "E1", "candidate": "Bob" }))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);
        let error: Value = response.into_json().await.unwrap();
        assert_eq!(error, json!({ "error": "Student 'S2' not found" }));
    }

    #[backend_test(seeded)]
    async fn incomplete_vote_is_bad_request(client: Client) {
        let response = client
            .post(uri!(cast_vote))
            .json(&json!({ "stu_id": "S1", "candidate": "Bob" }))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
    }
}
