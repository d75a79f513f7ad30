mod common;

use ans_flagger::{
    ans::Attachment,
    checker::{file_present, matches_question, response_equals},
    config::{DISCLAIMER, Marker, ModuleConfig},
    flags::{BuildOptions, build_flags},
};
use common::{FakeAns, result, student, submission};

const ASSIGNMENT: u64 = 7;

fn module(markers: Vec<Marker>) -> ModuleConfig {
    ModuleConfig {
        name: "assembly".to_owned(),
        assignment_default: "Practicum 2: assembly".to_owned(),
        markers,
    }
}

fn options() -> BuildOptions {
    BuildOptions {
        flag:      true,
        unflagged: false,
        students:  Vec::new(),
        before:    None,
        after:     None,
    }
}

/// The reference scenario: two questions, one result with submissions at
/// both positions, one marker at position 1 whose checker expects "42".
fn scenario(response: &str) -> FakeAns {
    FakeAns::with_assignment(
        &[10, 20],
        vec![result(
            1,
            student("ada@uni.nl", "Ada", "Lovelace"),
            vec![submission(501, 10, response), submission(502, 20, "anything")],
        )],
    )
}

#[test]
fn wrong_answer_posts_exactly_one_flag() {
    let fake = scenario("41");
    let module = module(vec![Marker::new("Word size", 1, vec![response_equals("42")])]);

    build_flags(&fake, &module, ASSIGNMENT, &options()).unwrap();

    let posted = fake.posted();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].1, 501);
    assert!(posted[0].0.starts_with(DISCLAIMER));
}

#[test]
fn expected_answer_posts_nothing() {
    let fake = scenario("42");
    let module = module(vec![Marker::new("Word size", 1, vec![response_equals("42")])]);

    build_flags(&fake, &module, ASSIGNMENT, &options()).unwrap();

    assert!(fake.posted().is_empty());
}

#[test]
fn dry_run_is_the_default() {
    let fake = scenario("41");
    let module = module(vec![Marker::new("Word size", 1, vec![response_equals("42")])]);

    let opts = BuildOptions {
        flag: false,
        ..options()
    };
    build_flags(&fake, &module, ASSIGNMENT, &opts).unwrap();

    assert!(fake.posted().is_empty());
}

#[test]
fn marker_referencing_a_missing_position_fails_loudly() {
    let fake = scenario("41");
    let module = module(vec![Marker::new("Ghost", 5, vec![response_equals("42")])]);

    let err = build_flags(&fake, &module, ASSIGNMENT, &options()).unwrap_err();
    assert!(err.to_string().contains("question 5"));
    assert!(fake.posted().is_empty());
}

#[test]
fn empty_response_skips_the_marker_unless_maybe_empty() {
    let fake = scenario("");
    let strict = module(vec![Marker::new("Word size", 1, vec![response_equals("42")])]);
    build_flags(&fake, &strict, ASSIGNMENT, &options()).unwrap();
    assert!(fake.posted().is_empty());

    let relaxed = module(vec![
        Marker::new("Word size", 1, vec![response_equals("42")]).maybe_empty(),
    ]);
    build_flags(&fake, &relaxed, ASSIGNMENT, &options()).unwrap();
    assert_eq!(fake.posted().len(), 1);
}

#[test]
fn missing_checker_input_skips_that_checker_only() {
    let fake = scenario("41");
    // The first checker needs question 9, which nobody answered; the
    // second must still run.
    let module = module(vec![Marker::new(
        "Word size",
        1,
        vec![matches_question(9), response_equals("42")],
    )]);

    build_flags(&fake, &module, ASSIGNMENT, &options()).unwrap();

    assert_eq!(fake.posted().len(), 1);
}

#[test]
fn unflagged_mode_is_idempotent_across_runs() {
    let fake = scenario("41");
    let module = module(vec![Marker::new("Word size", 1, vec![response_equals("42")])]);

    // First run posts a flag; the fake serves it back through the
    // comments listing, like the platform would.
    build_flags(&fake, &module, ASSIGNMENT, &options()).unwrap();
    assert_eq!(fake.posted().len(), 1);

    let opts = BuildOptions {
        unflagged: true,
        ..options()
    };
    build_flags(&fake, &module, ASSIGNMENT, &opts).unwrap();

    assert_eq!(fake.posted().len(), 1, "second run must not post again");
}

#[test]
fn unflagged_mode_still_reviews_clean_submissions() {
    let fake = scenario("41");
    fake.add_comment(1, 999, "Submission"); // flag on some other submission
    let module = module(vec![Marker::new("Word size", 1, vec![response_equals("42")])]);

    let opts = BuildOptions {
        unflagged: true,
        ..options()
    };
    build_flags(&fake, &module, ASSIGNMENT, &opts).unwrap();

    assert_eq!(fake.posted().len(), 1);
}

#[test]
fn student_filter_restricts_the_run() {
    let fake = FakeAns::with_assignment(
        &[10],
        vec![
            result(
                1,
                student("ada@uni.nl", "Ada", "Lovelace"),
                vec![submission(501, 10, "41")],
            ),
            result(
                2,
                student("bob@uni.nl", "Bob", "Babbage"),
                vec![submission(601, 10, "41")],
            ),
        ],
    );
    let module = module(vec![Marker::new("Word size", 1, vec![response_equals("42")])]);

    let opts = BuildOptions {
        students: vec!["bob@uni.nl".to_owned()],
        ..options()
    };
    build_flags(&fake, &module, ASSIGNMENT, &opts).unwrap();

    let posted = fake.posted();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].1, 601);
}

#[test]
fn only_submitted_results_are_considered() {
    let mut graded = result(
        1,
        student("ada@uni.nl", "Ada", "Lovelace"),
        vec![submission(501, 10, "41")],
    );
    graded.status = "graded".to_owned();
    let fake = FakeAns::with_assignment(&[10], vec![graded]);
    let module = module(vec![Marker::new("Word size", 1, vec![response_equals("42")])]);

    build_flags(&fake, &module, ASSIGNMENT, &options()).unwrap();

    assert!(fake.posted().is_empty());
}

#[test]
fn uploaded_file_satisfies_a_file_marker() {
    let mut fake = scenario("41");
    fake.results[0].files.push(Attachment {
        file_name: "loop.s".to_owned(),
        url:       "https://files.example/loop.s".to_owned(),
    });
    fake.files.insert(
        "https://files.example/loop.s".to_owned(),
        "mov r0, #0\n".to_owned(),
    );
    let module = module(vec![
        Marker::new("Uploaded program", 1, vec![file_present(".s")]).maybe_empty(),
    ]);

    build_flags(&fake, &module, ASSIGNMENT, &options()).unwrap();

    assert!(fake.posted().is_empty());
}

#[test]
fn missing_upload_is_flagged() {
    let fake = scenario("41");
    let module = module(vec![
        Marker::new("Uploaded program", 1, vec![file_present(".s")]).maybe_empty(),
    ]);

    build_flags(&fake, &module, ASSIGNMENT, &options()).unwrap();

    let posted = fake.posted();
    assert_eq!(posted.len(), 1);
    assert!(posted[0].0.contains(".s"));
}

#[test]
fn timestamp_bounds_filter_results() {
    let mut early = result(
        1,
        student("ada@uni.nl", "Ada", "Lovelace"),
        vec![submission(501, 10, "41")],
    );
    early.submitted_at = Some("2026-03-01T10:00:00Z".parse().unwrap());
    let mut late = result(
        2,
        student("bob@uni.nl", "Bob", "Babbage"),
        vec![submission(601, 10, "41")],
    );
    late.submitted_at = Some("2026-03-09T10:00:00Z".parse().unwrap());
    let fake = FakeAns::with_assignment(&[10], vec![early, late]);
    let module = module(vec![Marker::new("Word size", 1, vec![response_equals("42")])]);

    let opts = BuildOptions {
        before: Some("2026-03-05T00:00:00Z".parse().unwrap()),
        ..options()
    };
    build_flags(&fake, &module, ASSIGNMENT, &opts).unwrap();

    let posted = fake.posted();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].1, 501);
}
