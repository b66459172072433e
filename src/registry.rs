/*!
The schema index: an explicit, statically built table of every registered
field, plus the global name lookup used during value resolution.

Flags and positional arguments share one namespace: every declared name and
deprecated name maps to a [`FieldId`], and any collision — regardless of
field kind — is a fatal [`SchemaError`]. Subcommand fields are matched by
their field identifier on the current node and never enter the name table.

Fields are addressed by the chain of subcommand identifiers leading to their
owning node, never by stored references; the engine re-navigates the
configuration object from the root at assignment time.
*/

use std::collections::BTreeMap;

use crate::errors::SchemaError;
use crate::schema::{FieldSpec, SUBCOMMAND_ONEOF, ValueKind};

pub(crate) type FieldId = usize;
pub(crate) type NodeId = usize;

/// The node holding the built-in standard flags (`--help`).
pub(crate) const STANDARD_NODE: NodeId = 0;

/// The caller's top-level configuration object.
pub(crate) const ROOT_NODE: NodeId = 1;

#[derive(Debug, Clone)]
pub(crate) struct RegisteredField {
    pub spec: FieldSpec,
    pub node: NodeId,
}

#[derive(Debug, Clone)]
pub(crate) struct NodeInfo {
    /// Display name for diagnostics: the subcommand field identifier, or the
    /// root configuration type's name.
    pub name: String,

    /// Chain of subcommand field identifiers from the root configuration
    /// object down to this node. Empty for the root and the standard node.
    pub path: Vec<&'static str>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Registry {
    names: BTreeMap<String, FieldId>,
    fields: Vec<RegisteredField>,
    nodes: Vec<NodeInfo>,
}

impl Registry {
    pub fn add_node(&mut self, name: impl Into<String>, path: Vec<&'static str>) -> NodeId {
        self.nodes.push(NodeInfo {
            name: name.into(),
            path,
        });
        self.nodes.len() - 1
    }

    pub fn node(&self, node: NodeId) -> &NodeInfo {
        &self.nodes[node]
    }

    /// Validate and index every field of one schema node.
    pub fn register(&mut self, node: NodeId, specs: &[FieldSpec]) -> Result<(), SchemaError> {
        for spec in specs {
            let field = format!("{}.{}", self.nodes[node].name, spec.field);
            self.check(spec, &field)?;

            let id = self.fields.len();
            self.fields.push(RegisteredField {
                spec: spec.clone(),
                node,
            });

            if spec.is_subcommand() {
                // Matched by field identifier on the owning node, not by
                // name lookup.
                continue;
            }

            for name in spec.names() {
                self.insert(name, id, &field)?;
            }

            for name in spec.deprecated_names() {
                self.insert(name, id, &field)?;
            }
        }

        Ok(())
    }

    fn check(&self, spec: &FieldSpec, field: &str) -> Result<(), SchemaError> {
        match spec.oneof {
            Some(SUBCOMMAND_ONEOF) => {
                if !spec.is_subcommand() {
                    return Err(SchemaError::MissingSubcommandMetadata {
                        field: field.to_owned(),
                    });
                }
            }
            Some(_) => {
                return Err(SchemaError::IllegalOneofName {
                    field: field.to_owned(),
                });
            }
            None => {
                if spec.is_subcommand() {
                    return Err(SchemaError::MisplacedSubcommand {
                        field: field.to_owned(),
                    });
                }
            }
        }

        if spec.names().is_empty() {
            return Err(SchemaError::MissingNames {
                field: field.to_owned(),
            });
        }

        if spec.help().is_empty() {
            return Err(SchemaError::MissingHelp {
                field: field.to_owned(),
            });
        }

        if spec.is_positional() {
            if spec.value() != Some(ValueKind::String) {
                return Err(SchemaError::NonStringPositional {
                    field: field.to_owned(),
                });
            }

            if spec.position() == Some(0) {
                return Err(SchemaError::InvalidPosition {
                    field: field.to_owned(),
                });
            }
        }

        Ok(())
    }

    fn insert(&mut self, name: &str, id: FieldId, field: &str) -> Result<(), SchemaError> {
        match self.names.insert(name.to_owned(), id) {
            None => Ok(()),
            Some(_) => Err(SchemaError::DuplicateName {
                name: name.to_owned(),
                field: field.to_owned(),
            }),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<FieldId> {
        self.names.get(name).copied()
    }

    pub fn field(&self, id: FieldId) -> &RegisteredField {
        &self.fields[id]
    }

    pub fn fields(&self) -> impl Iterator<Item = (FieldId, &RegisteredField)> {
        self.fields.iter().enumerate()
    }

    /// The subcommand field of `node` whose identifier is `token`, if any.
    pub fn subcommand_on(&self, node: NodeId, token: &str) -> Option<FieldId> {
        self.fields().find_map(|(id, reg)| {
            (reg.node == node && reg.spec.is_subcommand() && reg.spec.field == token).then_some(id)
        })
    }

    /// Whether `node` declares any subcommand branches at all.
    pub fn has_subcommands(&self, node: NodeId) -> bool {
        self.fields()
            .any(|(_, reg)| reg.node == node && reg.spec.is_subcommand())
    }

    /// The positional field of `node` declared at `position`, if any.
    pub fn positional_at(&self, node: NodeId, position: u32) -> Option<FieldId> {
        self.fields().find_map(|(id, reg)| {
            (reg.node == node && reg.spec.position() == Some(position)).then_some(id)
        })
    }
}
