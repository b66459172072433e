/*!
Per-invocation resolution state.

One [`ParseState`] is built fresh for every resolution, seeded with a clone
of the parser's base registry. Descending into a subcommand extends the clone
with the branch's fields; the parser's own registry never changes, so a
parser can be reused across invocations without accumulating branches.
*/

use std::collections::{BTreeMap, BTreeSet};

use crate::registry::{FieldId, NodeId, ROOT_NODE, Registry};
use crate::schema::{FieldSpec, InvalidValue, Schema, ValueKind};

/// Ledger entry for one already-resolved field: the name it was supplied
/// under and the normalized text it resolved to. Duplicate-detection
/// diagnostics quote both.
#[derive(Debug, Clone)]
pub(crate) struct Parsed {
    pub name: String,
    pub text: String,
}

/// The built-in flags every schema gets, hosted on their own node so they
/// never collide with nor leak into the caller's configuration type.
#[derive(Debug, Default)]
pub(crate) struct StandardFlags {
    pub help: bool,
}

impl Schema for StandardFlags {
    fn fields() -> Vec<FieldSpec> {
        vec![FieldSpec::flag(
            "help",
            &["help"],
            "whether or not to display this help message",
            ValueKind::Bool,
        )]
    }

    fn assign(&mut self, field: &str, text: &str) -> Result<(), InvalidValue> {
        match (field, text) {
            ("help", "true") => self.help = true,
            ("help", "false") => self.help = false,
            ("help", other) => {
                return Err(InvalidValue::new(format!("expected a boolean, got '{other}'")));
            }
            _ => return Err(InvalidValue::new(format!("unknown field '{field}'"))),
        }
        Ok(())
    }
}

pub(crate) struct ParseState {
    pub registry: Registry,

    /// The node the walk is currently positioned on.
    pub current: NodeId,

    /// The node we descended from, if any. The oneof-exclusivity check
    /// applies to sibling branches of this node.
    pub parent: Option<NodeId>,

    /// Subcommand tokens already taken on this walk.
    pub visited: BTreeSet<String>,

    /// Global positional counter across the whole chain. Starts at 1.
    pub next_position: u32,

    /// Fields that have resolved to a value so far.
    pub ledger: BTreeMap<FieldId, Parsed>,

    /// Positional bindings made during the walk: raw argument text paired
    /// with the field it landed on. Converted after flag resolution.
    pub bindings: Vec<(FieldId, String)>,

    /// Arguments that bound to nothing, preserved in order for compaction.
    pub leftovers: Vec<String>,

    /// Flag name/value pairs gathered from the command line and the
    /// environment overlay, awaiting resolution.
    pub values: Vec<(String, Option<String>)>,

    pub errors: BTreeSet<String>,

    pub standard: StandardFlags,
}

impl ParseState {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            current: ROOT_NODE,
            parent: None,
            visited: BTreeSet::new(),
            next_position: 1,
            ledger: BTreeMap::new(),
            bindings: Vec::new(),
            leftovers: Vec::new(),
            values: Vec::new(),
            errors: BTreeSet::new(),
            standard: StandardFlags::default(),
        }
    }

    /// The current node's positional field at the global cursor, if any.
    pub fn positional_slot(&self) -> Option<FieldId> {
        self.registry
            .positional_at(self.current, self.next_position)
    }
}
