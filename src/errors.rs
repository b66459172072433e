/*!
Error types for the resolution engine.

Two classes exist. [`SchemaError`] covers programming mistakes in the schema
itself (malformed metadata, duplicate names, misplaced subcommand fields);
these are fatal the moment they are detected and are reported individually.
[`Error`] is the terminal outcome of one resolution: a help request, a schema
fault discovered during a lazy subcommand registration, or one of the two
aggregated, deduplicated user-input error sets. The hosting layer decides how
to surface each variant; [`Error::report`] and [`Error::exit_code`] provide
the conventional stderr text and process status.
*/

use std::collections::BTreeSet;

use thiserror::Error;

/// A mistake in the declared schema. Always fatal; never aggregated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Missing at least one flag name in 'names' for field '{field}'")]
    MissingNames { field: String },

    #[error("Missing flag 'help' for field '{field}'")]
    MissingHelp { field: String },

    #[error("Encountered duplicate flag name '{name}' for field '{field}'")]
    DuplicateName { name: String, field: String },

    #[error("Field '{field}' with positional argument metadata must have string type")]
    NonStringPositional { field: String },

    #[error("Field '{field}' should have option 'position' greater or equal than 1")]
    InvalidPosition { field: String },

    #[error("'oneof' field must have 'subcommand' name. Other names are illegal (field '{field}')")]
    IllegalOneofName { field: String },

    #[error("Every field of the 'oneof subcommand' must have subcommand metadata (field '{field}')")]
    MissingSubcommandMetadata { field: String },

    #[error("Subcommand metadata should be inside only a 'oneof subcommand' field (field '{field}')")]
    MisplacedSubcommand { field: String },

    #[error("Missing nested configuration object for subcommand field '{field}'")]
    MissingNestedNode { field: String },

    #[error("Encountered more than one overload parsing for {type_name}")]
    DuplicateOverload { type_name: &'static str },
}

/// The terminal outcome of one resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The built-in `--help` flag resolved true. Carries the rendered help
    /// text; conventionally printed and followed by exit status 0, before
    /// any required/validation checks run.
    #[error("help requested")]
    Help { text: String },

    /// A schema fault, usually from the lazy registration of a subcommand's
    /// fields.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Aggregated flag, conversion, required-flag, and validation failures.
    #[error("{program}: failed while parsing and validating flags")]
    Input {
        program: String,
        errors: BTreeSet<String>,
    },

    /// Aggregated positional-argument failures, reported under their own
    /// banner.
    #[error("{program}: failed while parsing positional arguments")]
    Positional {
        program: String,
        errors: BTreeSet<String>,
    },
}

impl Error {
    /// The conventional process exit status for this outcome: 0 for a help
    /// request, 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Help { .. } => 0,
            _ => 1,
        }
    }

    /// The full stderr-ready report: the help text, a single schema
    /// diagnostic, or a banner followed by `* error` paragraphs.
    pub fn report(&self) -> String {
        match self {
            Self::Help { text } => text.clone(),
            Self::Schema(error) => format!("{error}\n"),
            Self::Input { program, errors } => {
                banner(program, "Failed while parsing and validating flags:", errors)
            }
            Self::Positional { program, errors } => {
                banner(program, "Failed while parsing positional arguments:", errors)
            }
        }
    }
}

fn banner(program: &str, headline: &str, errors: &BTreeSet<String>) -> String {
    let mut out = format!("{program}: {headline}\n\n");

    for error in errors {
        out.push_str("* ");
        out.push_str(error);
        out.push_str("\n\n");
    }

    out
}
