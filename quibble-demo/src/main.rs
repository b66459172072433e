use std::any::Any;
use std::env;

use quibble::{FieldSpec, InvalidValue, Parser, Schema, ValueKind};

/// A retry backoff expressed as whole seconds plus a nanosecond remainder.
#[derive(Debug, Default, Clone, Copy)]
struct Backoff {
    seconds: i64,
    nanos: i32,
}

#[derive(Debug, Default)]
struct Tool {
    config: String,
    verbose: bool,
    jobs: i64,
    backoff: Backoff,
    build: Option<Build>,
    rename: Option<Rename>,
}

#[derive(Debug, Default)]
struct Build {
    debug_mode: bool,
    file: String,
}

#[derive(Debug, Default)]
struct Rename {
    current: String,
    target: String,
}

impl Schema for Tool {
    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::flag(
                "config",
                &["config"],
                "path to the configuration file",
                ValueKind::String,
            )
            .required(),
            FieldSpec::flag(
                "verbose",
                &["verbose"],
                "whether to log at debug level",
                ValueKind::Bool,
            ),
            FieldSpec::flag(
                "jobs",
                &["jobs"],
                "number of parallel jobs",
                ValueKind::Scalar,
            )
            .deprecated(&["parallelism"]),
            FieldSpec::flag(
                "backoff",
                &["backoff"],
                "retry backoff, e.g. '2s' or '1500000000ns'",
                ValueKind::message::<Backoff>(),
            ),
            FieldSpec::subcommand("build", &["build"], "build a file", Build::fields),
            FieldSpec::subcommand(
                "rename",
                &["rename"],
                "rename a file",
                Rename::fields,
            ),
        ]
    }

    fn assign(&mut self, field: &str, text: &str) -> Result<(), InvalidValue> {
        match field {
            "config" => self.config = text.to_owned(),
            "verbose" => self.verbose = parse_bool(text)?,
            "jobs" => {
                self.jobs = text
                    .parse()
                    .map_err(|err| InvalidValue::new(format!("expected an integer: {err}")))?;
            }
            _ => return Err(InvalidValue::new(format!("unknown field '{field}'"))),
        }
        Ok(())
    }

    fn nested(&mut self, field: &str) -> Option<&mut dyn Schema> {
        match field {
            "build" => Some(self.build.get_or_insert_with(Build::default)),
            "rename" => Some(self.rename.get_or_insert_with(Rename::default)),
            _ => None,
        }
    }

    fn field_any(&mut self, field: &str) -> Option<&mut dyn Any> {
        match field {
            "backoff" => Some(&mut self.backoff),
            _ => None,
        }
    }
}

impl Schema for Build {
    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::flag(
                "debug_mode",
                &["debug"],
                "whether to build with debug info",
                ValueKind::Bool,
            ),
            FieldSpec::positional("file", &["file", "file_name"], "the file to build", 1)
                .required(),
        ]
    }

    fn assign(&mut self, field: &str, text: &str) -> Result<(), InvalidValue> {
        match field {
            "debug_mode" => self.debug_mode = parse_bool(text)?,
            "file" => self.file = text.to_owned(),
            _ => return Err(InvalidValue::new(format!("unknown field '{field}'"))),
        }
        Ok(())
    }
}

impl Schema for Rename {
    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::positional("current", &["current_name"], "the file to rename", 1)
                .required(),
            FieldSpec::positional("target", &["new_name"], "the name to rename it to", 2)
                .required(),
        ]
    }

    fn assign(&mut self, field: &str, text: &str) -> Result<(), InvalidValue> {
        match field {
            "current" => self.current = text.to_owned(),
            "target" => self.target = text.to_owned(),
            _ => return Err(InvalidValue::new(format!("unknown field '{field}'"))),
        }
        Ok(())
    }
}

fn parse_bool(text: &str) -> Result<bool, InvalidValue> {
    match text {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(InvalidValue::new(format!("expected a boolean, got '{other}'"))),
    }
}

/// Accepts `<n>s` or `<n>ns`, normalizing a nanosecond count into seconds
/// plus a remainder with matching signs.
fn parse_backoff(text: &str, backoff: &mut Backoff) -> Result<(), String> {
    if let Some(seconds) = text.strip_suffix("ns") {
        let total: i64 = seconds
            .parse()
            .map_err(|err| format!("bad nanosecond count: {err}"))?;
        backoff.seconds = total / 1_000_000_000;
        backoff.nanos = (total % 1_000_000_000) as i32;
        Ok(())
    } else if let Some(seconds) = text.strip_suffix('s') {
        backoff.seconds = seconds
            .parse()
            .map_err(|err| format!("bad second count: {err}"))?;
        backoff.nanos = 0;
        Ok(())
    } else {
        Err(format!("expected 's' or 'ns' suffix in '{text}'"))
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let parser = match Parser::<Tool>::builder()
        .overload(parse_backoff)
        .validate("Flag 'jobs' must be non-negative", |tool: &Tool| {
            tool.jobs >= 0
        })
        .environment_variable_prefix("QUIBBLE")
        .build()
    {
        Ok(parser) => parser,
        Err(error) => {
            eprintln!("{error}");
            std::process::exit(1);
        }
    };

    let mut arguments: Vec<String> = env::args().collect();
    let mut tool = Tool::default();

    parser.parse_or_exit(&mut tool, &mut arguments);

    println!("{tool:#?}");
    println!("remaining arguments: {:?}", arguments.get(1..).unwrap_or(&[]));
}
