#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use colored::Colorize;
use itertools::Itertools;
use tracing::{debug, warn};

use crate::{
    ans::{AnsApi, Question, ResultRecord, Student, Submission},
    checker::CheckerContext,
    config::{DISCLAIMER, ModuleConfig},
    rest::RestError,
};

/// Options for the build workflow, straight from the CLI.
pub struct BuildOptions {
    /// Actually post comments. Off by default: a dry run prints the report
    /// without writing anything back to the platform.
    pub flag:      bool,
    /// Skip submissions that already carry at least one flag.
    pub unflagged: bool,
    /// Student identities to restrict the run to; empty means everyone.
    pub students:  Vec<String>,
    /// Only consider results submitted on or before this time.
    pub before:    Option<DateTime<Utc>>,
    /// Only consider results submitted at or after this time.
    pub after:     Option<DateTime<Utc>>,
}

/// Whether a student passes the `--student` filter: an empty filter matches
/// everyone, otherwise the student's exact email or exact display name must
/// appear in the filter list. Order and duplicates in the list are
/// irrelevant.
pub fn student_matches(student: &Student, filter: &[String]) -> bool {
    if filter.is_empty() {
        return true;
    }

    filter
        .iter()
        .any(|entry| *entry == student.email || *entry == student.display_name())
}

/// Display names of a result's authors, primary author first.
pub fn student_names(students: &[Student]) -> String {
    students.iter().map(Student::display_name).join(", ")
}

/// Fetches an assignment's exercises and flattens their questions, in
/// platform order, into the one ordered sequence whose 1-based positions
/// markers reference.
pub fn flattened_questions(
    client: &impl AnsApi,
    assignment_id: u64,
) -> Result<Vec<Question>, RestError> {
    let mut questions = Vec::new();
    for exercise in client.exercises(assignment_id)? {
        questions.extend(client.questions(exercise.id)?);
    }
    Ok(questions)
}

/// Joins a result's submissions onto the flattened question sequence,
/// keyed by 1-based question position.
///
/// A submission answering a question outside the sequence is absent from
/// the join. Should the platform ever return two submissions for the same
/// question within one result, the later one silently overwrites the
/// earlier; this is a documented quirk, not a policy.
pub fn join_submissions(
    questions: &[Question],
    submissions: &[Submission],
) -> BTreeMap<usize, Submission> {
    let positions: HashMap<u64, usize> = questions
        .iter()
        .enumerate()
        .map(|(i, question)| (question.id, i + 1))
        .collect();

    let mut joined = BTreeMap::new();
    for submission in submissions {
        if let Some(&position) = positions.get(&submission.question_id) {
            joined.insert(position, submission.clone());
        }
    }
    joined
}

/// Whether a result falls inside the configured submission-time bounds.
/// Results without a submission timestamp are kept.
fn within_bounds(result: &ResultRecord, opts: &BuildOptions) -> bool {
    let Some(submitted_at) = result.submitted_at else {
        return true;
    };
    if let Some(before) = opts.before
        && submitted_at > before
    {
        return false;
    }
    if let Some(after) = opts.after
        && submitted_at < after
    {
        return false;
    }
    true
}

/// Runs every configured marker against every gradable result of the
/// assignment, printing the per-student report and, when `opts.flag` is
/// set, posting each produced flag as a comment on the submission.
///
/// Results, markers, checkers, and flags are all processed strictly in
/// order, one at a time; comment posting is sequential by design.
pub fn build_flags(
    client: &impl AnsApi,
    module: &ModuleConfig,
    assignment_id: u64,
    opts: &BuildOptions,
) -> Result<()> {
    let questions = flattened_questions(client, assignment_id)
        .context("Could not fetch the assignment's questions")?;

    // One up-front snapshot of already-flagged submissions; not re-checked
    // per result.
    let mut flagged = HashSet::new();
    if opts.unflagged {
        for comment in client.comments().context("Could not fetch existing comments")? {
            if comment.commentable_type == "Submission" {
                flagged.insert(comment.commentable_id);
            }
        }
    }

    for result in client
        .results(assignment_id, "submitted")
        .context("Could not fetch the assignment's results")?
    {
        if !within_bounds(&result, opts) {
            continue;
        }

        let Some(primary) = result.users.first() else {
            debug!(result = result.id, "result has no authors, skipping");
            continue;
        };
        if !student_matches(primary, &opts.students) {
            continue;
        }

        let mut files = Vec::new();
        for attachment in &result.files {
            let text = client
                .file_text(&attachment.url)
                .with_context(|| format!("Could not fetch `{}`", attachment.file_name))?;
            files.push((attachment.file_name.clone(), text));
        }

        let submissions = join_submissions(&questions, &result.submissions);

        println!("{}", student_names(&result.users).bold());
        for marker in &module.markers {
            let submission = submissions.get(&marker.question).ok_or_else(|| {
                anyhow!(
                    "Marker `{}` references question {}, but result {} has no submission there; \
                     check the marker configuration against the assignment",
                    marker.name,
                    marker.question,
                    result.id
                )
            })?;

            if !marker.maybe_empty && submission.response().is_empty() {
                continue;
            }

            println!("- {}:", marker.name);

            if flagged.contains(&submission.id) {
                println!("{}", "  (skipping - already flagged)".dimmed());
                continue;
            }

            let ctx = CheckerContext {
                students:    &result.users,
                question:    marker.question,
                submissions: &submissions,
                files:       &files,
            };

            for factory in &marker.checkers {
                let checker = match factory(&ctx) {
                    Ok(checker) => checker,
                    Err(missing) => {
                        debug!(
                            marker = %marker.name,
                            question = missing.question,
                            "checker input missing, skipping checker"
                        );
                        continue;
                    }
                };

                for flag in checker.check() {
                    if opts.flag {
                        client
                            .post_comment(
                                &format!("{DISCLAIMER}\n\n{flag}"),
                                submission.id,
                                "Submission",
                            )
                            .with_context(|| {
                                format!("Could not post a flag on submission {}", submission.id)
                            })?;
                    }
                    println!("  + {flag}");
                }
            }
        }

        println!();
    }

    Ok(())
}

/// Deletes previously posted flags for the assignment, optionally
/// restricted to the given students.
///
/// The comments endpoint is not scoped to an assignment, and a submission
/// cannot be resolved to its parent result through the API, so the
/// workflow first builds a reverse index over the assignment's results.
/// Comments on other assignments' submissions are skipped silently;
/// submissions the platform refuses to serve are logged and skipped, and
/// never abort the run.
pub fn clear_flags(
    client: &impl AnsApi,
    assignment_id: u64,
    students: &[String],
) -> Result<()> {
    let results = client
        .results(assignment_id, "submitted")
        .context("Could not fetch the assignment's results")?;

    let mut submission_to_result: HashMap<u64, &ResultRecord> = HashMap::new();
    for result in &results {
        for submission in &result.submissions {
            submission_to_result.insert(submission.id, result);
        }
    }

    for comment in client.comments().context("Could not fetch comments")? {
        if comment.commentable_type != "Submission" {
            continue;
        }

        let Some(result) = submission_to_result.get(&comment.commentable_id) else {
            // The comment is on a submission belonging to another
            // assignment.
            continue;
        };

        match client.submission(comment.commentable_id) {
            Ok(_) => {}
            Err(RestError::Forbidden { .. }) => {
                warn!(
                    submission = comment.commentable_id,
                    result = result.id,
                    "could not access submission, leaving its flags in place"
                );
                continue;
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("Could not fetch submission {}", comment.commentable_id)
                });
            }
        }

        let Some(primary) = result.users.first() else {
            continue;
        };
        if !student_matches(primary, students) {
            continue;
        }

        client
            .delete_comment(comment.id)
            .with_context(|| format!("Could not delete comment {}", comment.id))?;
    }

    Ok(())
}
