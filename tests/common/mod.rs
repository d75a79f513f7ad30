#![allow(dead_code)]

use std::{collections::HashMap, sync::Mutex};

use ans_flagger::{
    ans::{AnsApi, Attachment, Comment, Exercise, Question, ResultRecord, Student, Submission},
    rest::RestError,
};

/// In-memory stand-in for the Ans platform. Serves fixed exercises,
/// questions, and results, records posted and deleted comments, and can be
/// told to deny access to specific submissions.
#[derive(Default)]
pub struct FakeAns {
    pub exercises: Vec<Exercise>,
    pub questions: HashMap<u64, Vec<Question>>,
    pub results: Vec<ResultRecord>,
    pub comments: Mutex<Vec<Comment>>,
    pub forbidden: Vec<u64>,
    pub files: HashMap<String, String>,
    pub posted: Mutex<Vec<(String, u64)>>,
    pub deleted: Mutex<Vec<u64>>,
}

impl FakeAns {
    /// A platform serving one assignment with the given flattened questions
    /// (one exercise per question) and results.
    pub fn with_assignment(question_ids: &[u64], results: Vec<ResultRecord>) -> Self {
        let mut fake = FakeAns::default();
        for (i, &question_id) in question_ids.iter().enumerate() {
            let exercise_id = 100 + i as u64;
            fake.exercises.push(Exercise { id: exercise_id });
            fake.questions
                .insert(exercise_id, vec![Question { id: question_id }]);
        }
        fake.results = results;
        fake
    }

    pub fn posted(&self) -> Vec<(String, u64)> {
        self.posted.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<u64> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn add_comment(&self, id: u64, commentable_id: u64, commentable_type: &str) {
        self.comments.lock().unwrap().push(Comment {
            id,
            commentable_id,
            commentable_type: commentable_type.to_owned(),
        });
    }
}

impl AnsApi for FakeAns {
    fn exercises(&self, _assignment_id: u64) -> Result<Vec<Exercise>, RestError> {
        Ok(self.exercises.clone())
    }

    fn questions(&self, exercise_id: u64) -> Result<Vec<Question>, RestError> {
        Ok(self.questions.get(&exercise_id).cloned().unwrap_or_default())
    }

    fn results(&self, _assignment_id: u64, status: &str) -> Result<Vec<ResultRecord>, RestError> {
        Ok(self
            .results
            .iter()
            .filter(|result| result.status == status)
            .cloned()
            .collect())
    }

    fn comments(&self) -> Result<Vec<Comment>, RestError> {
        Ok(self.comments.lock().unwrap().clone())
    }

    fn submission(&self, submission_id: u64) -> Result<Submission, RestError> {
        if self.forbidden.contains(&submission_id) {
            return Err(RestError::Forbidden {
                path: format!("submissions/{submission_id}"),
            });
        }
        let submission = self
            .results
            .iter()
            .flat_map(|result| &result.submissions)
            .find(|submission| submission.id == submission_id)
            .expect("fake asked for a submission it does not serve");
        Ok(submission.clone())
    }

    fn post_comment(
        &self,
        content: &str,
        commentable_id: u64,
        commentable_type: &str,
    ) -> Result<(), RestError> {
        self.posted
            .lock()
            .unwrap()
            .push((content.to_owned(), commentable_id));
        // Mirror the platform: the new comment shows up in later listings.
        let id = 9000 + self.comments.lock().unwrap().len() as u64;
        self.add_comment(id, commentable_id, commentable_type);
        Ok(())
    }

    fn delete_comment(&self, comment_id: u64) -> Result<(), RestError> {
        self.deleted.lock().unwrap().push(comment_id);
        Ok(())
    }

    fn file_text(&self, url: &str) -> Result<String, RestError> {
        Ok(self.files.get(url).cloned().unwrap_or_default())
    }
}

/// A student with no middle name.
pub fn student(email: &str, first: &str, last: &str) -> Student {
    Student {
        email: email.to_owned(),
        first_name: first.to_owned(),
        middle_name: None,
        last_name: last.to_owned(),
    }
}

/// A submission with the given response text.
pub fn submission(id: u64, question_id: u64, response: &str) -> Submission {
    Submission {
        id,
        question_id,
        response: Some(response.to_owned()),
    }
}

/// A `submitted` result owned by one student.
pub fn result(id: u64, author: Student, submissions: Vec<Submission>) -> ResultRecord {
    ResultRecord {
        id,
        status: "submitted".to_owned(),
        submitted_at: None,
        users: vec![author],
        submissions,
        files: Vec::<Attachment>::new(),
    }
}
