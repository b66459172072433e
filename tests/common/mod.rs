//! Shared configuration fixtures for the integration tests.
#![allow(dead_code)]

use std::any::Any;

use quibble::{FieldSpec, InvalidValue, Schema, ValueKind};

/// Seconds plus a nanosecond remainder, populated by an overload conversion.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub seconds: i64,
    pub nanos: i32,
}

/// Accepts `<n>ns`, truncating toward zero so the remainder keeps the sign
/// of the total.
pub fn parse_interval(text: &str, interval: &mut Interval) -> Result<(), String> {
    let total: i64 = text
        .strip_suffix("ns")
        .ok_or_else(|| format!("expected 'ns' suffix in '{text}'"))?
        .parse()
        .map_err(|err| format!("bad nanosecond count: {err}"))?;

    interval.seconds = total / 1_000_000_000;
    interval.nanos = (total % 1_000_000_000) as i32;
    Ok(())
}

pub fn parse_bool(text: &str) -> Result<bool, InvalidValue> {
    match text {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(InvalidValue::new(format!(
            "expected a boolean, got '{other}'"
        ))),
    }
}

/// A flat schema: one required string, a boolean, a scalar, and a
/// message-typed flag.
#[derive(Debug, Default)]
pub struct TestFlags {
    pub foo: String,
    pub bar: bool,
    pub baz: i64,
    pub duration: Interval,
}

impl Schema for TestFlags {
    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::flag("foo", &["foo"], "help", ValueKind::String).required(),
            FieldSpec::flag("bar", &["bar"], "help", ValueKind::Bool),
            FieldSpec::flag("baz", &["baz"], "help", ValueKind::Scalar)
                .deprecated(&["parallel"]),
            FieldSpec::flag(
                "duration",
                &["duration"],
                "help",
                ValueKind::message::<Interval>(),
            ),
        ]
    }

    fn assign(&mut self, field: &str, text: &str) -> Result<(), InvalidValue> {
        match field {
            "foo" => self.foo = text.to_owned(),
            "bar" => self.bar = parse_bool(text)?,
            "baz" => {
                self.baz = text
                    .parse()
                    .map_err(|err| InvalidValue::new(format!("expected an integer: {err}")))?;
            }
            _ => return Err(InvalidValue::new(format!("unknown field '{field}'"))),
        }
        Ok(())
    }

    fn field_any(&mut self, field: &str) -> Option<&mut dyn Any> {
        match field {
            "duration" => Some(&mut self.duration),
            _ => None,
        }
    }
}

/// A root with two subcommand branches.
#[derive(Debug, Default)]
pub struct ProcessFile {
    pub build: Option<BuildCmd>,
    pub rename: Option<RenameCmd>,
}

impl Schema for ProcessFile {
    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::subcommand("build", &["build"], "help", BuildCmd::fields),
            FieldSpec::subcommand("rename", &["rename"], "help", RenameCmd::fields),
        ]
    }

    fn assign(&mut self, field: &str, _text: &str) -> Result<(), InvalidValue> {
        Err(InvalidValue::new(format!("unknown field '{field}'")))
    }

    fn nested(&mut self, field: &str) -> Option<&mut dyn Schema> {
        match field {
            "build" => Some(self.build.get_or_insert_with(BuildCmd::default)),
            "rename" => Some(self.rename.get_or_insert_with(RenameCmd::default)),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct BuildCmd {
    pub debug_mode: bool,
    pub file: String,
}

impl Schema for BuildCmd {
    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::flag("debug_mode", &["debug"], "help", ValueKind::Bool),
            FieldSpec::positional("file", &["file", "file_name"], "help", 1).required(),
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

#[derive(Debug, Default)]
pub struct RenameCmd {
    pub cur_file_name: String,
    pub new_file_name: String,
}

impl Schema for RenameCmd {
    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::positional("cur_file_name", &["cur_file_name"], "help", 1).required(),
            FieldSpec::positional(
                "new_file_name",
                &["new_file_name", "new_file"],
                "help",
                2,
            )
            .required(),
        ]
    }

    fn assign(&mut self, field: &str, text: &str) -> Result<(), InvalidValue> {
        match field {
            "cur_file_name" => self.cur_file_name = text.to_owned(),
            "new_file_name" => self.new_file_name = text.to_owned(),
            _ => return Err(InvalidValue::new(format!("unknown field '{field}'"))),
        }
        Ok(())
    }
}

/// Build an owned argument vector from string literals.
pub fn arguments(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|&arg| arg.to_owned()).collect()
}
