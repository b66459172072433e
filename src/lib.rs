/*!
quibble is a schema-driven command line resolution engine.

A configuration type implements [`Schema`] to describe its flags, positional
arguments, and nested subcommand branches; a [`Parser`] built for that type
resolves an argument vector (and optionally an environment overlay) into it,
aggregating every user-facing failure into one deduplicated report instead
of stopping at the first.

```no_run
use quibble::{FieldSpec, InvalidValue, Parser, Schema, ValueKind};

#[derive(Debug, Default)]
struct Flags {
    verbose: bool,
}

impl Schema for Flags {
    fn fields() -> Vec<FieldSpec> {
        vec![FieldSpec::flag(
            "verbose",
            &["verbose"],
            "whether to log more",
            ValueKind::Bool,
        )]
    }

    fn assign(&mut self, field: &str, text: &str) -> Result<(), InvalidValue> {
        match field {
            "verbose" => self.verbose = text == "true",
            _ => return Err(InvalidValue::new(format!("unknown field '{field}'"))),
        }
        Ok(())
    }
}

let parser = Parser::<Flags>::builder().build().unwrap();
let mut flags = Flags::default();
let mut arguments: Vec<String> = std::env::args().collect();
parser.parse_or_exit(&mut flags, &mut arguments);
```
*/

mod env;
mod help;
mod registry;
mod state;
mod text;

pub mod errors;
pub mod parse;
pub mod schema;
pub mod tokenizer;

pub use self::errors::{Error, SchemaError};
pub use self::parse::{Parser, ParserBuilder};
pub use self::schema::{
    FieldKind, FieldSpec, InvalidValue, SUBCOMMAND_ONEOF, Schema, ValueKind,
};
