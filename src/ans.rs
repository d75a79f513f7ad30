#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::rest::{PageInfo, RestError, RestSession, collect_pages};

/// A course as returned by the Ans API. Only the fields the flagger needs.
#[derive(Debug, Clone, Deserialize)]
pub struct Course {
    /// Opaque course identifier.
    pub id:   u64,
    /// Human-readable course name, matched against `--course`.
    pub name: String,
}

/// An assignment within a course.
#[derive(Debug, Clone, Deserialize)]
pub struct Assignment {
    /// Opaque assignment identifier.
    pub id:   u64,
    /// Human-readable assignment name, matched against `--assignment`.
    pub name: String,
}

/// An exercise within an assignment; owns an ordered list of questions.
#[derive(Debug, Clone, Deserialize)]
pub struct Exercise {
    /// Opaque exercise identifier.
    pub id: u64,
}

/// A question within an exercise. Its 1-based position in the flattened
/// per-assignment question sequence is the key markers reference, not this
/// identifier.
#[derive(Debug, Clone, Deserialize)]
pub struct Question {
    /// Opaque question identifier.
    pub id: u64,
}

/// One of the students owning a result. The first user on a result is its
/// primary author; the rest are co-authors on group work.
#[derive(Debug, Clone, Deserialize)]
pub struct Student {
    /// Student email address; one of the two identities `--student` matches.
    pub email:       String,
    /// Given name.
    pub first_name:  String,
    /// Optional middle name ("tussenvoegsel"); empty string when absent.
    #[serde(default)]
    pub middle_name: Option<String>,
    /// Family name.
    pub last_name:   String,
}

impl Student {
    /// The student's full display name, "first [middle] last", the other
    /// identity `--student` matches.
    pub fn display_name(&self) -> String {
        match self.middle_name.as_deref() {
            Some(middle) if !middle.is_empty() => {
                format!("{} {} {}", self.first_name, middle, self.last_name)
            }
            _ => format!("{} {}", self.first_name, self.last_name),
        }
    }
}

/// One student's answer to one question within a result. Comments (flags)
/// attach to its `id`.
#[derive(Debug, Clone, Deserialize)]
pub struct Submission {
    /// Opaque submission identifier; the target of posted comments.
    pub id:          u64,
    /// The question this submission answers.
    pub question_id: u64,
    /// The answer text; `None` or empty when the student left it blank.
    #[serde(default)]
    pub response:    Option<String>,
}

impl Submission {
    /// The answer text, with a blank answer normalized to the empty string.
    pub fn response(&self) -> &str {
        self.response.as_deref().unwrap_or("")
    }
}

/// A student-uploaded attachment on a result, fetched by URL.
#[derive(Debug, Clone, Deserialize)]
pub struct Attachment {
    /// Original file name as uploaded.
    pub file_name: String,
    /// Download URL, outside the API base.
    pub url:       String,
}

/// One graded submission event for an assignment: one or more authors, one
/// submission per answered question, and any uploaded files.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultRecord {
    /// Opaque result identifier.
    pub id:           u64,
    /// Result status; only `submitted` results are gradable.
    pub status:       String,
    /// When the result was handed in.
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    /// Authors, primary first.
    #[serde(default)]
    pub users:        Vec<Student>,
    /// One submission per answered question.
    #[serde(default)]
    pub submissions:  Vec<Submission>,
    /// Uploaded attachments.
    #[serde(default)]
    pub files:        Vec<Attachment>,
}

/// A comment as returned by the comments listing. Flags are comments whose
/// `commentable_type` is `Submission`.
#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    /// Opaque comment identifier.
    pub id:               u64,
    /// Identifier of the entity the comment is attached to.
    pub commentable_id:   u64,
    /// Type of the entity the comment is attached to.
    pub commentable_type: String,
}

/// The slice of the Ans API the reconciliation workflows consume. The
/// workflows are written against this trait so the tests can drive them with
/// an in-memory fake instead of a live platform.
pub trait AnsApi {
    /// Lists an assignment's exercises, in platform order.
    fn exercises(&self, assignment_id: u64) -> Result<Vec<Exercise>, RestError>;

    /// Lists an exercise's questions, in platform order.
    fn questions(&self, exercise_id: u64) -> Result<Vec<Question>, RestError>;

    /// Lists an assignment's results with the given status, in platform
    /// order, each with its submissions, authors, and files resolved.
    fn results(&self, assignment_id: u64, status: &str) -> Result<Vec<ResultRecord>, RestError>;

    /// Lists every comment visible to the credential, in platform order.
    /// This endpoint is not scoped to an assignment; callers must filter.
    fn comments(&self) -> Result<Vec<Comment>, RestError>;

    /// Re-fetches a single submission. Fails with `RestError::Forbidden`
    /// when the platform denies access to it.
    fn submission(&self, submission_id: u64) -> Result<Submission, RestError>;

    /// Posts a comment on the given entity.
    fn post_comment(
        &self,
        content: &str,
        commentable_id: u64,
        commentable_type: &str,
    ) -> Result<(), RestError>;

    /// Deletes a comment.
    fn delete_comment(&self, comment_id: u64) -> Result<(), RestError>;

    /// Fetches a student-uploaded attachment and decodes it as text.
    fn file_text(&self, url: &str) -> Result<String, RestError>;
}

/// Number of records requested per listing page.
const ITEMS_PER_PAGE: u32 = 100;

/// Blocking client for the Ans REST API, built on [`RestSession`].
pub struct AnsClient {
    /// The rate-limited authenticated transport.
    session: RestSession,
}

impl AnsClient {
    /// Creates a client for the given API base and bearer credential.
    pub fn new(base_url: &str, api_token: &str, throttle: Duration) -> Result<Self, RestError> {
        Ok(Self {
            session: RestSession::new(base_url, api_token, throttle)?,
        })
    }

    /// Fetches every page of a listing endpoint and decodes the accumulated
    /// records, preserving platform order across pages.
    fn get_pages<T>(&self, path: &str) -> Result<Vec<T>, RestError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let raw: Vec<Value> = collect_pages(|page| {
            let params = [
                ("items", ITEMS_PER_PAGE.to_string()),
                ("page", page.to_string()),
            ];
            let (body, info) = self.session.get(path, &params)?;
            // Only listing endpoints carry the pagination headers; a
            // listing without them cannot be walked.
            let info: PageInfo = info.ok_or_else(|| RestError::Pagination {
                path: path.to_owned(),
            })?;
            let batch: Vec<Value> = serde_json::from_value(body).map_err(|source| {
                RestError::Decode {
                    path: path.to_owned(),
                    source,
                }
            })?;
            Ok::<_, RestError>((batch, info))
        })?;

        raw.into_iter()
            .map(|value| {
                serde_json::from_value(value).map_err(|source| RestError::Decode {
                    path: path.to_owned(),
                    source,
                })
            })
            .collect()
    }

    /// Fetches a single record endpoint (no pagination).
    fn get_one<T>(&self, path: &str) -> Result<T, RestError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let (body, _) = self.session.get(path, &[])?;
        serde_json::from_value(body).map_err(|source| RestError::Decode {
            path: path.to_owned(),
            source,
        })
    }

    /// Lists a school's courses whose name matches `name` exactly.
    pub fn courses(&self, school_id: u64, name: &str) -> Result<Vec<Course>, RestError> {
        let courses: Vec<Course> = self.get_pages(&format!("schools/{school_id}/courses"))?;
        Ok(courses.into_iter().filter(|c| c.name == name).collect())
    }

    /// Lists a course's assignments whose name matches `name` exactly.
    pub fn assignments(&self, course_id: u64, name: &str) -> Result<Vec<Assignment>, RestError> {
        let assignments: Vec<Assignment> =
            self.get_pages(&format!("courses/{course_id}/assignments"))?;
        Ok(assignments.into_iter().filter(|a| a.name == name).collect())
    }
}

impl AnsApi for AnsClient {
    fn exercises(&self, assignment_id: u64) -> Result<Vec<Exercise>, RestError> {
        self.get_pages(&format!("assignments/{assignment_id}/exercises"))
    }

    fn questions(&self, exercise_id: u64) -> Result<Vec<Question>, RestError> {
        self.get_pages(&format!("exercises/{exercise_id}/questions"))
    }

    fn results(&self, assignment_id: u64, status: &str) -> Result<Vec<ResultRecord>, RestError> {
        // The listing entries carry only id and status; the submissions,
        // authors, and files come from the per-result detail endpoint.
        let summaries: Vec<ResultRecord> =
            self.get_pages(&format!("assignments/{assignment_id}/results"))?;

        summaries
            .into_iter()
            .filter(|result| result.status == status)
            .map(|result| self.get_one(&format!("results/{}", result.id)))
            .collect()
    }

    fn comments(&self) -> Result<Vec<Comment>, RestError> {
        self.get_pages("comments")
    }

    fn submission(&self, submission_id: u64) -> Result<Submission, RestError> {
        self.get_one(&format!("submissions/{submission_id}"))
    }

    fn post_comment(
        &self,
        content: &str,
        commentable_id: u64,
        commentable_type: &str,
    ) -> Result<(), RestError> {
        self.session.post(
            "comments",
            &json!({
                "content": content,
                "commentable_id": commentable_id,
                "commentable_type": commentable_type,
            }),
        )
    }

    fn delete_comment(&self, comment_id: u64) -> Result<(), RestError> {
        self.session.delete(&format!("comments/{comment_id}"))
    }

    fn file_text(&self, url: &str) -> Result<String, RestError> {
        self.session.get_text(url)
    }
}
