//! CLI command implementations
//!
//! `check` constructs one entity per input line and reports each outcome
//! on its own output line. Validation failures are data, not errors: the
//! command fails only when input cannot be read or output cannot be
//! written.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::str::FromStr;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::entities::{
    Course, CourseSetting, CourseUser, DbCourseSetting, Entity, GlobalSetting, MergedUser,
    ProblemSet, ProblemSetType, User,
};
use crate::model::{ModelResult, Record};
use crate::store::StoreConfig;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{parse_record, write_error, write_json, write_parse_error, write_response};

/// Entities the CLI can construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    CourseUser,
    MergedUser,
    Course,
    ProblemSet,
    GlobalSetting,
    CourseSetting,
    DbCourseSetting,
}

impl EntityKind {
    pub const ALL: [EntityKind; 8] = [
        EntityKind::User,
        EntityKind::CourseUser,
        EntityKind::MergedUser,
        EntityKind::Course,
        EntityKind::ProblemSet,
        EntityKind::GlobalSetting,
        EntityKind::CourseSetting,
        EntityKind::DbCourseSetting,
    ];

    /// Command line name
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::CourseUser => "course-user",
            EntityKind::MergedUser => "merged-user",
            EntityKind::Course => "course",
            EntityKind::ProblemSet => "problem-set",
            EntityKind::GlobalSetting => "global-setting",
            EntityKind::CourseSetting => "course-setting",
            EntityKind::DbCourseSetting => "db-course-setting",
        }
    }

    /// Entities that belong to a single course
    fn is_course_scoped(&self) -> bool {
        matches!(
            self,
            EntityKind::CourseUser
                | EntityKind::ProblemSet
                | EntityKind::CourseSetting
                | EntityKind::DbCourseSetting
        )
    }

    /// Constructs the entity from `record` and returns its plain form.
    pub fn normalize(&self, record: &Record) -> ModelResult<Value> {
        let object = match self {
            EntityKind::User => User::new(record)?.to_object(),
            EntityKind::CourseUser => CourseUser::new(record)?.to_object(),
            EntityKind::MergedUser => MergedUser::new(record)?.to_object(),
            EntityKind::Course => Course::new(record)?.to_object(),
            EntityKind::ProblemSet => ProblemSet::parse(record)?.to_object(),
            EntityKind::GlobalSetting => GlobalSetting::new(record)?.to_object(),
            EntityKind::CourseSetting => CourseSetting::new(record)?.to_object(),
            EntityKind::DbCourseSetting => DbCourseSetting::new(record)?.to_object(),
        };
        Ok(Value::Object(object))
    }

    /// JSON form of the entity's field schema. Problem sets list one
    /// schema per variant, keyed by tag.
    pub fn schema_json(&self) -> CliResult<Value> {
        let schema = match self {
            EntityKind::User => User::schema(),
            EntityKind::CourseUser => CourseUser::schema(),
            EntityKind::MergedUser => MergedUser::schema(),
            EntityKind::Course => Course::schema(),
            EntityKind::GlobalSetting => GlobalSetting::schema(),
            EntityKind::CourseSetting => CourseSetting::schema(),
            EntityKind::DbCourseSetting => DbCourseSetting::schema(),
            EntityKind::ProblemSet => {
                let mut variants = Map::new();
                for set_type in ProblemSetType::ALL {
                    variants.insert(
                        set_type.as_str().to_owned(),
                        serde_json::to_value(&*set_type.schema())?,
                    );
                }
                return Ok(Value::Object(variants));
            }
        };
        Ok(serde_json::to_value(&*schema)?)
    }
}

impl FromStr for EntityKind {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CliError::unknown_entity(s))
    }
}

/// Outcome counts of a `check` run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckSummary {
    pub valid: usize,
    pub invalid: usize,
}

/// Run the CLI
pub fn run(cli: Cli) -> CliResult<()> {
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => StoreConfig::default(),
    };
    run_command(cli.command, &config)
}

/// Run a command
pub fn run_command(cmd: Command, config: &StoreConfig) -> CliResult<()> {
    match cmd {
        Command::Check { entity } => {
            let kind: EntityKind = entity.parse()?;
            let stdin = io::stdin();
            let stdout = io::stdout();
            let summary = check(kind, config, stdin.lock(), &mut stdout.lock())?;
            info!(valid = summary.valid, invalid = summary.invalid, "check finished");
            Ok(())
        }
        Command::Schema { entity } => {
            let kind: EntityKind = entity.parse()?;
            let stdout = io::stdout();
            write_json(&mut stdout.lock(), &kind.schema_json()?)
        }
    }
}

/// Load store configuration from a JSON file
pub fn load_config(path: &Path) -> CliResult<StoreConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;
    let config = StoreConfig::from_json_str(&content)
        .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;
    debug!(path = %path.display(), ?config, "loaded config");
    Ok(config)
}

/// Validate each line of `input` as an entity of `kind`.
///
/// Course-scoped records without a `course_id` get the configured one.
/// In lenient mode invalid records are logged instead of reported.
pub fn check<R: BufRead, W: Write>(
    kind: EntityKind,
    config: &StoreConfig,
    input: R,
    out: &mut W,
) -> CliResult<CheckSummary> {
    let mut summary = CheckSummary::default();

    for (index, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let mut record = match parse_record(&line) {
            Ok(record) => record,
            Err(e) => {
                summary.invalid += 1;
                write_error(out, e.code_str(), e.message())?;
                continue;
            }
        };

        if kind.is_course_scoped() && config.course_id != 0 && !record.contains_key("course_id") {
            record.insert("course_id".into(), Value::from(config.course_id));
        }

        match kind.normalize(&record) {
            Ok(data) => {
                summary.valid += 1;
                write_response(out, data)?;
            }
            Err(e) if config.skip_invalid_records => {
                summary.invalid += 1;
                warn!(line = index + 1, error = %e, "skipping invalid record");
            }
            Err(e) => {
                summary.invalid += 1;
                write_parse_error(out, &e)?;
            }
        }
    }

    Ok(summary)
}
