//! Request tracing. Every request gets a sequential ID, and the request line,
//! any error the handler reports and the response line all carry it, e.g.
//!
//! ```text
//! ->req7 POST /votes
//!   req7 rejected: Student 'S1' has already voted
//! <-rsp7 409 Conflict cast_vote (3ms)
//! ```

use std::fmt::{self, Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rocket::{
    fairing::{Fairing, Info, Kind},
    http::StatusClass,
    request::{FromRequest, Outcome},
    Data, Orbit, Request, Response, Rocket,
};

use crate::Config;

/// Identifies one request in the logs.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct RequestId(pub usize);

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl RequestId {
    /// The ID of the given request, assigned on first use.
    pub fn of(req: &Request<'_>) -> RequestId {
        RequestTrace::of(req).id
    }
}

/// Per-request state kept in the request-local cache.
struct RequestTrace {
    id: RequestId,
    started: Instant,
}

impl RequestTrace {
    fn of<'r>(req: &'r Request<'_>) -> &'r RequestTrace {
        static NEXT_ID: AtomicUsize = AtomicUsize::new(0);
        req.local_cache(|| RequestTrace {
            id: RequestId(NEXT_ID.fetch_add(1, Ordering::Relaxed)),
            started: Instant::now(),
        })
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for &'r RequestId {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        Outcome::Success(&RequestTrace::of(req).id)
    }
}

/// Logs server startup and shutdown, and a line for each request and response.
#[derive(Debug, Copy, Clone)]
pub struct LoggerFairing;

#[rocket::async_trait]
impl Fairing for LoggerFairing {
    fn info(&self) -> Info {
        Info {
            name: "Logger",
            kind: Kind::Liftoff | Kind::Request | Kind::Response | Kind::Shutdown,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        let config = rocket.config();
        let scheme = if config.tls_enabled() { "https" } else { "http" };
        let scope = rocket
            .state::<Config>()
            .map(|c| format!("{:?}", c.vote_scope()))
            .unwrap_or_else(|| "unknown".to_string());
        info!(
            "Election server listening on {scheme}://{}:{} (vote scope {scope})",
            config.address, config.port
        );
    }

    async fn on_request(&self, req: &mut Request<'_>, _data: &mut Data<'_>) {
        let trace = RequestTrace::of(req);
        info!("->req{} {} {}", trace.id, req.method(), req.uri());
    }

    async fn on_response<'r>(&self, req: &'r Request<'_>, res: &mut Response<'r>) {
        let trace = RequestTrace::of(req);
        let elapsed = trace.started.elapsed().as_millis();
        let status = res.status();
        let handler = req
            .route()
            .and_then(|r| r.name.as_deref())
            .unwrap_or("catcher");
        let line = format!("<-rsp{} {status} {handler} ({elapsed}ms)", trace.id);
        match status.class() {
            StatusClass::ServerError => error!("{line}"),
            StatusClass::ClientError => warn!("{line}"),
            _ => info!("{line}"),
        }
    }

    async fn on_shutdown(&self, _rocket: &Rocket<Orbit>) {
        warn!("Shutting down, no new votes will be accepted");
    }
}

#[cfg(test)]
mod tests {
    use rocket::local::blocking::Client;

    use super::*;

    #[get("/id")]
    fn echo_id(id: &RequestId) -> String {
        id.to_string()
    }

    #[get("/id/twice")]
    fn echo_id_twice(first: &RequestId, second: &RequestId) -> String {
        assert_eq!(first, second);
        first.to_string()
    }

    #[test]
    fn each_request_gets_its_own_id() {
        let rocket = rocket::build()
            .attach(LoggerFairing)
            .mount("/", routes![echo_id, echo_id_twice]);
        let client = Client::untracked(rocket).unwrap();

        let first: usize = client.get("/id").dispatch().into_string().unwrap().parse().unwrap();
        let second: usize = client
            .get("/id/twice")
            .dispatch()
            .into_string()
            .unwrap()
            .parse()
            .unwrap();
        assert!(second > first);
    }
}
