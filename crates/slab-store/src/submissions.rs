//! Submission intake and moderation.
//!
//! Submissions are append-only per kind; `position` is the index moderators
//! refer to and never changes.  [`Database::moderate`] flips the status and,
//! on approval, inserts the promoted record in the same transaction.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::Deserialize;
use serde_json::{Map, Value};
use slab_shared::submissions::{
    CardForm, CompanionForm, Promotion, StoryForm, Submission, SubmissionForm,
};
use slab_shared::types::{Decision, SubmissionKind, SubmissionStatus};
use slab_shared::{Collection, Entity, RecordId};

use crate::database::Database;
use crate::error::{not_found, Result, StoreError};
use crate::records::insert_new;

/// Result of a moderation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Moderation {
    Approved {
        submission: Submission,
        collection: Collection,
        id: RecordId,
    },
    Rejected {
        submission: Submission,
    },
    /// The submission was no longer pending; nothing changed.
    AlreadyDecided {
        submission: Submission,
    },
}

impl Moderation {
    pub fn submission(&self) -> &Submission {
        match self {
            Self::Approved { submission, .. }
            | Self::Rejected { submission }
            | Self::AlreadyDecided { submission } => submission,
        }
    }
}

impl Database {
    /// Validate a form and append it as a pending submission.  Returns the
    /// new submission's index.
    pub fn submit(&self, form: &SubmissionForm) -> Result<usize> {
        form.validate()?;
        let kind = form.kind();
        let body = serde_json::to_string(&form.to_body()?)?;
        let date = Utc::now();

        let index = append_submission(self.conn(), kind, date, SubmissionStatus::Pending, &body)?;
        tracing::info!(kind = %kind, index, title = form.title(), "submission received");
        Ok(index)
    }

    pub fn submit_story(&self, form: StoryForm) -> Result<usize> {
        self.submit(&SubmissionForm::Story(form))
    }

    pub fn submit_card(&self, form: CardForm) -> Result<usize> {
        self.submit(&SubmissionForm::Card(form))
    }

    pub fn submit_companion(&self, form: CompanionForm) -> Result<usize> {
        self.submit(&SubmissionForm::Companion(form))
    }

    /// Every submission of `kind`, in intake order.  Rows that fail to parse
    /// are skipped with a warning; the remaining indexes are unaffected.
    pub fn list_submissions(&self, kind: SubmissionKind) -> Result<Vec<Submission>> {
        let mut stmt = self.conn().prepare(
            "SELECT position, date, status, body FROM submissions
             WHERE kind = ?1 ORDER BY position ASC",
        )?;
        let rows = stmt.query_map(params![kind.as_str()], |row| {
            Ok(RawSubmission {
                position: row.get(0)?,
                date: row.get(1)?,
                status: row.get(2)?,
                body: row.get(3)?,
            })
        })?;

        let mut out = Vec::new();
        for raw in rows {
            let raw = raw?;
            let position = raw.position;
            match raw.parse(kind) {
                Ok(submission) => out.push(submission),
                Err(e) => {
                    tracing::warn!(kind = %kind, index = position, error = %e, "skipping malformed submission");
                }
            }
        }
        Ok(out)
    }

    pub fn pending_submissions(&self, kind: SubmissionKind) -> Result<Vec<Submission>> {
        Ok(self
            .list_submissions(kind)?
            .into_iter()
            .filter(Submission::is_pending)
            .collect())
    }

    pub fn get_submission(&self, kind: SubmissionKind, index: usize) -> Result<Submission> {
        load_submission(self.conn(), kind, index)
    }

    /// Approve or reject a pending submission.
    ///
    /// Approval inserts the promoted record and marks the submission
    /// approved in one transaction.  A submission that is no longer pending
    /// is left untouched.
    pub fn moderate(
        &mut self,
        kind: SubmissionKind,
        index: usize,
        decision: Decision,
    ) -> Result<Moderation> {
        let tx = self.conn_mut().transaction()?;
        let mut submission = load_submission(&tx, kind, index)?;

        if !submission.is_pending() {
            tracing::info!(
                kind = %kind,
                index,
                status = submission.status.as_str(),
                "submission already decided"
            );
            return Ok(Moderation::AlreadyDecided { submission });
        }

        let placed = match decision {
            Decision::Approve => Some(promote(&tx, submission.form.promote(submission.date))?),
            Decision::Reject => None,
        };

        let status = decision.resulting_status();
        tx.execute(
            "UPDATE submissions SET status = ?3 WHERE kind = ?1 AND position = ?2",
            params![kind.as_str(), index as i64, status.as_str()],
        )?;
        tx.commit()?;
        submission.status = status;

        tracing::info!(kind = %kind, index, status = status.as_str(), "submission moderated");
        Ok(match placed {
            Some((collection, id)) => Moderation::Approved {
                submission,
                collection,
                id,
            },
            None => Moderation::Rejected { submission },
        })
    }

    /// Submissions of one kind as backup entries (form fields plus `date`
    /// and `status`).
    pub(crate) fn submission_values(&self, kind: SubmissionKind) -> Result<Vec<Value>> {
        let mut out = Vec::new();
        for submission in self.list_submissions(kind)? {
            let mut value = submission.form.to_body()?;
            if let Some(obj) = value.as_object_mut() {
                obj.insert("date".into(), Value::String(submission.date.to_rfc3339()));
                obj.insert(
                    "status".into(),
                    Value::String(submission.status.as_str().into()),
                );
            }
            out.push(value);
        }
        Ok(out)
    }
}

fn promote(conn: &Connection, promotion: Promotion) -> Result<(Collection, RecordId)> {
    fn place<E: Entity>(conn: &Connection, record: E) -> Result<(Collection, RecordId)> {
        let record = insert_new(conn, record)?;
        Ok((record.collection(), record.id()))
    }

    match promotion {
        Promotion::Story(r) => place(conn, r),
        Promotion::Character(r) => place(conn, r),
        Promotion::Location(r) => place(conn, r),
        Promotion::Mission(r) => place(conn, r),
        Promotion::Companion(r) => place(conn, r),
        Promotion::Card(r) => place(conn, r),
    }
}

fn append_submission(
    conn: &Connection,
    kind: SubmissionKind,
    date: DateTime<Utc>,
    status: SubmissionStatus,
    body: &str,
) -> Result<usize> {
    let position: i64 = conn.query_row(
        "SELECT COALESCE(MAX(position), -1) + 1 FROM submissions WHERE kind = ?1",
        params![kind.as_str()],
        |row| row.get(0),
    )?;
    conn.execute(
        "INSERT INTO submissions (kind, position, date, status, body)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![kind.as_str(), position, date.to_rfc3339(), status.as_str(), body],
    )?;
    Ok(position as usize)
}

fn load_submission(conn: &Connection, kind: SubmissionKind, index: usize) -> Result<Submission> {
    let raw = conn
        .query_row(
            "SELECT position, date, status, body FROM submissions
             WHERE kind = ?1 AND position = ?2",
            params![kind.as_str(), index as i64],
            |row| {
                Ok(RawSubmission {
                    position: row.get(0)?,
                    date: row.get(1)?,
                    status: row.get(2)?,
                    body: row.get(3)?,
                })
            },
        )
        .map_err(not_found)?;
    raw.parse(kind)
}

struct RawSubmission {
    position: i64,
    date: String,
    status: String,
    body: String,
}

impl RawSubmission {
    fn parse(self, kind: SubmissionKind) -> Result<Submission> {
        let date = DateTime::parse_from_rfc3339(&self.date)
            .map_err(|e| StoreError::Corrupt(format!("bad submission date: {e}")))?
            .with_timezone(&Utc);
        let status = self
            .status
            .parse::<SubmissionStatus>()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let form = SubmissionForm::from_body(kind, serde_json::from_str(&self.body)?)?;
        Ok(Submission {
            index: self.position as usize,
            date,
            status,
            form,
        })
    }
}

/// Backup entry: form fields with `date` and `status` alongside.
#[derive(Deserialize)]
struct SubmissionEntry {
    date: DateTime<Utc>,
    #[serde(default = "pending")]
    status: SubmissionStatus,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

fn pending() -> SubmissionStatus {
    SubmissionStatus::Pending
}

pub(crate) fn replace_submissions(
    conn: &Connection,
    kind: SubmissionKind,
    values: &[Value],
) -> Result<usize> {
    conn.execute(
        "DELETE FROM submissions WHERE kind = ?1",
        params![kind.as_str()],
    )?;

    let mut written = 0;
    for value in values {
        let entry = match serde_json::from_value::<SubmissionEntry>(value.clone()) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(kind = %kind, error = %e, "skipping malformed submission entry");
                continue;
            }
        };
        let form = match SubmissionForm::from_body(kind, Value::Object(entry.fields)) {
            Ok(form) => form,
            Err(e) => {
                tracing::warn!(kind = %kind, error = %e, "skipping malformed submission entry");
                continue;
            }
        };
        let body = serde_json::to_string(&form.to_body()?)?;
        append_submission(conn, kind, entry.date, entry.status, &body)?;
        written += 1;
    }
    Ok(written)
}
