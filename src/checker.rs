#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{collections::BTreeMap, fmt::Write, sync::Arc};

use thiserror::Error;

use crate::{
    ans::{Student, Submission},
    util::{filter_epigraph, split_lines},
};

/// Signals that a checker's required input is absent from the current
/// result's submission map. The build workflow treats this as "this checker
/// does not apply here" and moves on to the next checker; it is never fatal.
#[derive(Debug, Error)]
#[error("no submission for question {question}")]
pub struct SubmissionMissing {
    /// The 1-based question position the checker needed.
    pub question: usize,
}

/// Everything a checker may inspect while reviewing one result: the result's
/// authors, the marker's question position, the full position → submission
/// map, and the decoded uploaded files as `(file name, text)` pairs.
pub struct CheckerContext<'a> {
    /// Authors of the result under review, primary author first.
    pub students:    &'a [Student],
    /// 1-based position of the question the current marker targets.
    pub question:    usize,
    /// Join of the result's submissions onto flattened question positions.
    pub submissions: &'a BTreeMap<usize, Submission>,
    /// Decoded uploaded files for the result.
    pub files:       &'a [(String, String)],
}

impl CheckerContext<'_> {
    /// Looks up the submission at a question position, signalling
    /// [`SubmissionMissing`] when the student never answered it.
    pub fn submission(&self, question: usize) -> Result<&Submission, SubmissionMissing> {
        self.submissions
            .get(&question)
            .ok_or(SubmissionMissing { question })
    }

    /// The submission the current marker targets.
    pub fn own_submission(&self) -> Result<&Submission, SubmissionMissing> {
        self.submission(self.question)
    }
}

/// A constructed checker, ready to review the result it was built for.
pub trait Checker {
    /// Reviews the submission and produces zero or more flags, in order.
    /// Each flag is a complete, independently postable comment body.
    fn check(&self) -> Vec<String>;
}

/// A checker constructor bound to its configuration. Parametrized checker
/// families are plain functions returning one of these, closing over their
/// bound parameters; construction fails with [`SubmissionMissing`] when a
/// required sibling submission is absent.
pub type CheckerFactory =
    Arc<dyn Fn(&CheckerContext) -> Result<Box<dyn Checker>, SubmissionMissing> + Send + Sync>;

/// Number of mismatch rows shown in a rendered error table.
pub const SHOW_VALUES: usize = 10;

/// Renders a set of `(input, expected, actual)` mismatches as one flag body
/// with a bounded HTML table. At most `show` rows are rendered; anything
/// beyond that is dropped silently, with the total count stated in the
/// leading sentence so the reader knows the table is a sample.
pub fn error_table(errors: &[(String, String, String)], show: usize) -> String {
    let mut table = String::from("<table>\n");
    table.push_str("<tr><th>Input</th><th>Expected</th><th>Output</th></tr>\n");
    for (input, expected, actual) in errors.iter().take(show) {
        writeln!(
            table,
            "<tr><td>{input}</td><td>{expected}</td><td>{actual}</td></tr>"
        )
        .expect("writing to a String");
    }
    table.push_str("</table>");

    format!(
        "Got {} unexpected outcomes; here is a table of the first {}:\n{}",
        errors.len(),
        show.min(errors.len()),
        table
    )
}

/// Flags when the marker's own response, trimmed, differs from a bound
/// expected answer.
struct ResponseEquals {
    /// The answer the marker expects.
    expected: String,
    /// The answer the student gave.
    actual:   String,
}

impl Checker for ResponseEquals {
    fn check(&self) -> Vec<String> {
        if self.actual.trim() == self.expected {
            Vec::new()
        } else {
            vec![format!(
                "The answer <code>{}</code> does not match the expected answer.",
                self.actual.trim()
            )]
        }
    }
}

/// Family: exact-answer markers. Binds the expected answer at configuration
/// time; each marker using it gets its own bound instance.
pub fn response_equals(expected: &str) -> CheckerFactory {
    let expected = expected.to_owned();
    Arc::new(move |ctx| {
        Ok(Box::new(ResponseEquals {
            expected: expected.clone(),
            actual:   ctx.own_submission()?.response().to_owned(),
        }) as Box<dyn Checker>)
    })
}

/// Flags per-line mismatches between the response and a bound sequence of
/// expected lines, summarizing them in one bounded table flag.
struct LinesEqual {
    /// Expected lines, in order.
    expected: Vec<String>,
    /// Cleaned-up lines of the student's response.
    actual:   Vec<String>,
}

impl Checker for LinesEqual {
    fn check(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for (i, expected) in self.expected.iter().enumerate() {
            let actual = self.actual.get(i).map(String::as_str).unwrap_or("");
            if actual != expected {
                errors.push((format!("line {}", i + 1), expected.clone(), actual.to_owned()));
            }
        }

        if errors.is_empty() {
            Vec::new()
        } else {
            vec![error_table(&errors, SHOW_VALUES)]
        }
    }
}

/// Family: line-by-line answer markers. The response is split into trimmed
/// non-empty lines with any trailing epigraph removed before comparison.
pub fn lines_equal(expected: &[&str]) -> CheckerFactory {
    let expected: Vec<String> = expected.iter().map(|line| (*line).to_owned()).collect();
    Arc::new(move |ctx| {
        let lines = filter_epigraph(split_lines(ctx.own_submission()?.response()));
        Ok(Box::new(LinesEqual {
            expected: expected.clone(),
            actual:   lines,
        }) as Box<dyn Checker>)
    })
}

/// Flags when the marker's response differs from the response given to
/// another question of the same result.
struct MatchesQuestion {
    /// 1-based position of the question the answer must agree with.
    other:    usize,
    /// The other question's answer.
    expected: String,
    /// This question's answer.
    actual:   String,
}

impl Checker for MatchesQuestion {
    fn check(&self) -> Vec<String> {
        if self.actual.trim() == self.expected.trim() {
            Vec::new()
        } else {
            vec![format!(
                "This answer does not agree with the answer given for question {}.",
                self.other
            )]
        }
    }
}

/// Family: cross-question consistency markers. Construction fails with
/// [`SubmissionMissing`] when the other question was never answered, which
/// the build workflow turns into a per-checker skip.
pub fn matches_question(other: usize) -> CheckerFactory {
    Arc::new(move |ctx| {
        let expected = ctx.submission(other)?.response().to_owned();
        Ok(Box::new(MatchesQuestion {
            other,
            expected,
            actual: ctx.own_submission()?.response().to_owned(),
        }) as Box<dyn Checker>)
    })
}

/// Flags when no uploaded file carries a bound name suffix.
struct FilePresent {
    /// Required file name suffix, e.g. `.s`.
    suffix: String,
    /// Names of the files the student actually uploaded.
    names:  Vec<String>,
}

impl Checker for FilePresent {
    fn check(&self) -> Vec<String> {
        if self.names.iter().any(|name| name.ends_with(&self.suffix)) {
            Vec::new()
        } else {
            vec![format!(
                "No uploaded file ending in <code>{}</code> was found.",
                self.suffix
            )]
        }
    }
}

/// Family: required-upload markers.
pub fn file_present(suffix: &str) -> CheckerFactory {
    let suffix = suffix.to_owned();
    Arc::new(move |ctx| {
        Ok(Box::new(FilePresent {
            suffix: suffix.clone(),
            names:  ctx.files.iter().map(|(name, _)| name.clone()).collect(),
        }) as Box<dyn Checker>)
    })
}
