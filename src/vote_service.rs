use std::time::{Duration, Instant};

use mongodb::{
    bson::doc,
    error::{Error as DbError, TRANSIENT_TRANSACTION_ERROR, UNKNOWN_TRANSACTION_COMMIT_RESULT},
    Client, ClientSession, Database,
};
use rocket::tokio::time::sleep;

use crate::error::{Error, Result};
use crate::model::{
    common::{
        election::tally_field,
        vote::{VoteRecord, VoteScope},
    },
    db::{Election, Student, Vote},
    mongodb::{is_duplicate_key_error, Coll},
};
use crate::Config;

/// Delay before the first retry of a conflicting vote transaction. Later
/// retries wait proportionally longer, up to `MAX_RETRY_BACKOFF`.
const RETRY_BACKOFF: Duration = Duration::from_millis(10);
const MAX_RETRY_BACKOFF: Duration = Duration::from_millis(200);

/// Casts votes. Lives in managed state and is shared by every request.
///
/// Each vote is recorded in a single transaction that checks the student and
/// election exist, occupies the student's vote slot, and bumps the candidate's
/// tally. The slot is the vote document's `_id`, so two racing votes for the
/// same slot cannot both commit.
pub struct VoteService {
    client: Client,
    students: Coll<Student>,
    elections: Coll<Election>,
    votes: Coll<Vote>,
    scope: VoteScope,
    timeout: Duration,
}

impl VoteService {
    pub fn new(client: Client, db: &Database, config: &Config) -> Self {
        Self {
            client,
            students: Coll::from_db(db),
            elections: Coll::from_db(db),
            votes: Coll::from_db(db),
            scope: config.vote_scope(),
            timeout: config.transaction_timeout(),
        }
    }

    /// Record a vote and count it, returning the vote as submitted.
    ///
    /// Concurrent votes in one election all write its tallies, so conflicts
    /// are expected under load. They are retried until the configured timeout.
    pub async fn cast(&self, vote: VoteRecord) -> Result<VoteRecord> {
        let budget = RetryBudget::new(self.timeout);
        let mut session = self.client.start_session(None).await?;
        let mut attempt = 1;
        loop {
            session.start_transaction(None).await?;
            let result = match self.cast_in_transaction(&vote, &mut session).await {
                Ok(counted) => commit(&mut session, &budget)
                    .await
                    .map(|_| counted)
                    .map_err(Error::from),
                Err(err) => {
                    if let Err(abort_err) = session.abort_transaction().await {
                        debug!("Abort after failed vote transaction also failed: {abort_err}");
                    }
                    Err(err)
                }
            };

            let err = match result {
                Ok(counted) => {
                    if counted {
                        info!(
                            "Counted vote by '{}' in election '{}'",
                            vote.stu_id, vote.elec_id
                        );
                    } else {
                        warn!(
                            "Recorded vote by '{}' for unknown candidate '{}' in election '{}'",
                            vote.stu_id, vote.candidate, vote.elec_id
                        );
                    }
                    return Ok(vote);
                }
                Err(Error::Db(err)) if err.contains_label(TRANSIENT_TRANSACTION_ERROR) => err,
                Err(err) => return Err(err),
            };

            match budget.backoff(attempt) {
                Some(delay) => {
                    debug!(
                        "Vote transaction for '{}' conflicted (attempt {attempt}): {err}",
                        vote.stu_id
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                None => {
                    warn!(
                        "Vote by '{}' still conflicting after {attempt} attempts, giving up",
                        vote.stu_id
                    );
                    return Err(err.into());
                }
            }
        }
    }

    /// The body of the vote transaction. Returns whether a tally was
    /// incremented.
    async fn cast_in_transaction(
        &self,
        vote: &VoteRecord,
        session: &mut ClientSession,
    ) -> Result<bool> {
        self.students
            .find_one_with_session(doc! { "_id": &vote.stu_id }, None, session)
            .await?
            .ok_or_else(|| Error::student_not_found(&vote.stu_id))?;
        let election = self
            .elections
            .find_one_with_session(doc! { "_id": &vote.elec_id }, None, session)
            .await?
            .ok_or_else(|| Error::election_not_found(&vote.elec_id))?;

        let counted = election.tally(&vote.candidate).is_some();
        let record = Vote::new(vote.clone(), self.scope, counted);
        match self
            .votes
            .insert_one_with_session(&record, None, session)
            .await
        {
            Ok(_) => {}
            Err(err) if is_duplicate_key_error(&err) => {
                return Err(Error::AlreadyVoted(vote.stu_id.clone()))
            }
            Err(err) => return Err(err.into()),
        }

        if counted {
            let filter = doc! { "_id": &vote.elec_id };
            let field = tally_field(&vote.candidate);
            let update = doc! { "$inc": { &field: 1 } };
            self.elections
                .update_one_with_session(filter, update, None, session)
                .await?;
        }
        Ok(counted)
    }
}

/// Commit the current transaction, retrying while the outcome is unknown and
/// the budget allows.
async fn commit(
    session: &mut ClientSession,
    budget: &RetryBudget,
) -> std::result::Result<(), DbError> {
    loop {
        match session.commit_transaction().await {
            Err(err)
                if err.contains_label(UNKNOWN_TRANSACTION_COMMIT_RESULT) && !budget.expired() =>
            {
                debug!("Vote commit outcome unknown, retrying: {err}");
            }
            result => return result,
        }
    }
}

/// How long one vote may keep retrying.
#[derive(Debug, Clone, Copy)]
struct RetryBudget {
    deadline: Instant,
}

impl RetryBudget {
    fn new(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now() + timeout,
        }
    }

    fn expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// The delay before retrying after the given failed attempt, or `None` if
    /// the retry would start past the deadline.
    fn backoff(&self, attempt: u32) -> Option<Duration> {
        let delay = (RETRY_BACKOFF * attempt).min(MAX_RETRY_BACKOFF);
        (Instant::now() + delay < self.deadline).then_some(delay)
    }
}
