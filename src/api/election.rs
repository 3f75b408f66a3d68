use rocket::{
    response::status::Created,
    serde::json::{self, Json},
    Route,
};

use crate::error::Result;
use crate::model::{api::election::ElectionRecord, db::Election, mongodb::Coll};

use super::body;

pub fn routes() -> Vec<Route> {
    routes![get_election, create_election, delete_election]
}

#[get("/elections/<elec_id>")]
async fn get_election(elec_id: &str, elections: Coll<Election>) -> Result<Json<ElectionRecord>> {
    let election = Election::find(&elections, elec_id).await?;
    Ok(Json(election.into()))
}

#[post("/elections", data = "<record>")]
async fn create_election(
    record: std::result::Result<Json<ElectionRecord>, json::Error<'_>>,
    elections: Coll<Election>,
) -> Result<Created<Json<ElectionRecord>>> {
    let election = Election::create(&elections, body(record)?.into()).await?;
    let location = uri!(get_election(election.id.as_str())).to_string();
    Ok(Created::new(location).body(Json(election.into())))
}

#[delete("/elections/<elec_id>")]
async fn delete_election(
    elec_id: &str,
    elections: Coll<Election>,
) -> Result<Json<ElectionRecord>> {
    let election = Election::delete(&elections, elec_id).await?;
    Ok(Json(election.into()))
}
