use rocket::{
    http::Status,
    response::status::Custom,
    serde::json::{self, json, Json, Value},
    Catcher, Request, Route,
};

use crate::error::{Error, Result};

mod election;
mod legacy;
mod student;
mod vote;

pub use legacy::LegacyRequest;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(student::routes());
    routes.extend(election::routes());
    routes.extend(vote::routes());
    routes.extend(legacy::routes());
    routes
}

pub fn catchers() -> Vec<Catcher> {
    catchers![default_catcher]
}

/// Report failures that never reached a handler in the same shape as
/// handler errors.
#[catch(default)]
fn default_catcher(status: Status, req: &Request<'_>) -> Custom<Json<Value>> {
    let message = match status.code {
        404 => format!("No route for {} {}", req.method(), req.uri().path()),
        _ => status.reason_lossy().to_string(),
    };
    Custom(status, Json(json!({ "error": message })))
}

/// Unwrap a JSON body, turning parse failures into a 400.
fn body<T>(data: std::result::Result<Json<T>, json::Error<'_>>) -> Result<T> {
    data.map(Json::into_inner)
        .map_err(|e| Error::BadRequest(format!("Malformed body: {e}")))
}

#[cfg(test)]
mod tests {
    use rocket::{http::ContentType, local::asynchronous::Client};

    use super::*;

    #[backend_test]
    async fn unknown_route_gets_json_error(client: Client) {
        let response = client.get("/ballots/1").dispatch().await;
        assert_eq!(response.status(), Status::NotFound);
        let body: Value = response.into_json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("/ballots/1"));
    }

    #[backend_test]
    async fn garbage_body_is_bad_request(client: Client) {
        let response = client
            .post("/students")
            .header(ContentType::JSON)
            .body("{ not json")
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
        let body: Value = response.into_json().await.unwrap();
        assert!(body["error"].as_str().unwrap().starts_with("Malformed body"));
    }
}
