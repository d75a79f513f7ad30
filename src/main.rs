#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Command-line entry point for the Ans submission flagger.

use ans_flagger::{
    ans::AnsClient,
    config::Config,
    flags::{BuildOptions, build_flags, clear_flags},
    modules,
};
use anyhow::{Context, Result, bail};
use bpaf::*;
use chrono::{DateTime, Utc};
use dotenvy::dotenv;
use tracing::{Level, metadata::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// Subcommands of the flagger.
#[derive(Debug, Clone)]
enum Cmd {
    /// Review submissions and report (optionally post) flags.
    Build {
        /// Actually post the flags instead of a dry run.
        flag:      bool,
        /// Only consider submissions without any flags yet.
        unflagged: bool,
    },
    /// Delete previously posted flags.
    Clear,
}

/// Parsed command line.
#[derive(Debug, Clone)]
struct Args {
    /// Course name override.
    course:     Option<String>,
    /// Assignment name override; the module's default when absent.
    assignment: Option<String>,
    /// School ID override.
    school:     Option<u64>,
    /// Student identities (email or full name) to restrict the run to.
    student:    Vec<String>,
    /// Only consider results submitted on or before this time.
    before:     Option<DateTime<Utc>>,
    /// Only consider results submitted at or after this time.
    after:      Option<DateTime<Utc>>,
    /// Module whose markers to use.
    module:     String,
    /// Subcommand to run.
    cmd:        Cmd,
}

/// Parse the command line arguments and return an `Args`.
fn options() -> Args {
    let course = long("course")
        .short('c')
        .help("Course name in Ans")
        .argument::<String>("NAME")
        .optional();
    let assignment = long("assignment")
        .short('a')
        .help("Assignment name in Ans; inferred from the module if absent")
        .argument::<String>("NAME")
        .optional();
    let school = long("school")
        .help("School ID in Ans")
        .argument::<u64>("ID")
        .optional();
    let student = long("student")
        .short('s')
        .help("Filter these students (by email or full name)")
        .argument::<String>("STUDENT")
        .many();

    /// Parses a `--before`/`--after` bound as an RFC 3339 timestamp.
    fn bound(name: &'static str, help: &'static str) -> impl Parser<Option<DateTime<Utc>>> {
        long(name)
            .help(help)
            .argument::<String>("TIME")
            .parse(|value| value.parse::<DateTime<Utc>>())
            .optional()
    }

    let before = bound("before", "Only consider results submitted on or before the given time");
    let after = bound("after", "Only consider results submitted at or after the given time");

    let module = positional::<String>("MODULE").help("Module name");

    let flag = long("flag")
        .short('f')
        .help("Actually flag submissions in Ans")
        .switch();
    let unflagged = long("unflagged")
        .short('u')
        .help("Only consider submissions that do not have any flags yet")
        .switch();
    let build = construct!(Cmd::Build { flag, unflagged })
        .to_options()
        .command("build")
        .help("Build flags");
    let clear = pure(Cmd::Clear).to_options().command("clear").help("Clear flags");
    let cmd = construct!([build, clear]);

    construct!(Args {
        course,
        assignment,
        school,
        student,
        before,
        after,
        module,
        cmd
    })
    .to_options()
    .descr("Automatically flags submissions in Ans")
    .run()
}

fn main() -> Result<()> {
    dotenv().ok();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false);
    let filter_layer = LevelFilter::from_level(Level::INFO);
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    let args = options();
    let config = Config::from_env()?;

    let module = modules::resolve(&args.module)?;

    let course_name = args
        .course
        .or_else(|| std::env::var("ANS_COURSE").ok())
        .context("No course given; pass --course or set ANS_COURSE")?;
    let assignment_name = args
        .assignment
        .unwrap_or_else(|| module.assignment_default.clone());
    let school_id = args.school.unwrap_or(config.school_id);

    let client = AnsClient::new(&config.base_url, &config.api_token, config.throttle)
        .context("Could not set up the Ans API client")?;

    // Course and assignment names must resolve to exactly one match each;
    // anything else is a setup mistake.
    let course = match client.courses(school_id, &course_name)?.as_slice() {
        [course] => course.clone(),
        [] => bail!("Did not find course \"{course_name}\""),
        _ => bail!("Course name \"{course_name}\" is ambiguous"),
    };
    let assignment = match client.assignments(course.id, &assignment_name)?.as_slice() {
        [assignment] => assignment.clone(),
        [] => bail!("Did not find assignment \"{assignment_name}\""),
        _ => bail!("Assignment name \"{assignment_name}\" is ambiguous"),
    };

    match args.cmd {
        Cmd::Build { flag, unflagged } => {
            let opts = BuildOptions {
                flag,
                unflagged,
                students: args.student,
                before: args.before,
                after: args.after,
            };
            build_flags(&client, &module, assignment.id, &opts)
        }
        Cmd::Clear => clear_flags(&client, assignment.id, &args.student),
    }
}
