/*!
The schema boundary: metadata describing one configuration field, and the
[`Schema`] trait that a configuration type implements to expose that metadata
to the resolution engine.

The engine never inspects configuration types at runtime. Everything it needs
is carried by an explicit table of [`FieldSpec`] values per schema node, plus
a handful of narrow trait methods for assigning converted values and
instantiating nested subcommand nodes.
*/

use core::any::{Any, TypeId};

use thiserror::Error;

/// The reserved name of the mutually-exclusive subcommand group. Declaring a
/// subcommand field under any other group name is a fatal schema error.
pub const SUBCOMMAND_ONEOF: &str = "subcommand";

/// A value failed the default text-to-value conversion.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct InvalidValue {
    message: String,
}

impl InvalidValue {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The shape of the value a flag carries, which decides negation and
/// normalization rules during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Boolean flags accept `--name`, `--name=true`, and `--no-name`, and
    /// tolerate consistent duplicates.
    Bool,

    /// String values are unquoted and unescaped before conversion.
    String,

    /// Any other plain value (integers, floats, and so on). Handed to the
    /// default conversion verbatim.
    Scalar,

    /// A nested message-shaped value, eligible for an overload conversion
    /// registered under its [`TypeId`].
    Message {
        id: TypeId,
        name: &'static str,
    },
}

impl ValueKind {
    /// The message kind for `T`, usable as an overload-conversion target.
    pub fn message<T: Any>() -> Self {
        Self::Message {
            id: TypeId::of::<T>(),
            name: core::any::type_name::<T>(),
        }
    }

    pub const fn is_bool(&self) -> bool {
        matches!(self, Self::Bool)
    }

    pub const fn is_string(&self) -> bool {
        matches!(self, Self::String)
    }
}

/// The parse-relevant classification of one schema field.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Flag {
        names: &'static [&'static str],
        deprecated: &'static [&'static str],
        help: &'static str,
        required: bool,
        value: ValueKind,
    },
    Positional {
        names: &'static [&'static str],
        help: &'static str,
        required: bool,
        position: u32,
        value: ValueKind,
    },
    Subcommand {
        names: &'static [&'static str],
        help: &'static str,
        /// Metadata for the nested node, exposed without instantiating it.
        /// This is what lets the help tree cover every branch while the
        /// walker only ever builds the branch that was selected.
        fields: fn() -> Vec<FieldSpec>,
    },
}

/// One schema field's full parse-relevant metadata.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// The declaring field identifier. Subcommand tokens are matched against
    /// this, and diagnostics use it to name the offending field.
    pub field: &'static str,

    /// The mutually-exclusive group this field belongs to, if any. Only
    /// [`SUBCOMMAND_ONEOF`] is legal.
    pub oneof: Option<&'static str>,

    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn flag(
        field: &'static str,
        names: &'static [&'static str],
        help: &'static str,
        value: ValueKind,
    ) -> Self {
        Self {
            field,
            oneof: None,
            kind: FieldKind::Flag {
                names,
                deprecated: &[],
                help,
                required: false,
                value,
            },
        }
    }

    /// Positional arguments are always string-typed; registration rejects
    /// anything else.
    pub fn positional(
        field: &'static str,
        names: &'static [&'static str],
        help: &'static str,
        position: u32,
    ) -> Self {
        Self {
            field,
            oneof: None,
            kind: FieldKind::Positional {
                names,
                help,
                required: false,
                position,
                value: ValueKind::String,
            },
        }
    }

    pub fn subcommand(
        field: &'static str,
        names: &'static [&'static str],
        help: &'static str,
        fields: fn() -> Vec<FieldSpec>,
    ) -> Self {
        Self {
            field,
            oneof: Some(SUBCOMMAND_ONEOF),
            kind: FieldKind::Subcommand {
                names,
                help,
                fields,
            },
        }
    }

    /// Mark a flag or positional argument as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        match &mut self.kind {
            FieldKind::Flag { required, .. } | FieldKind::Positional { required, .. } => {
                *required = true;
            }
            FieldKind::Subcommand { .. } => {}
        }
        self
    }

    /// Attach deprecated aliases to a flag. Deprecated names resolve to the
    /// same field and occupy the same global namespace as current names.
    #[must_use]
    pub fn deprecated(mut self, names: &'static [&'static str]) -> Self {
        if let FieldKind::Flag { deprecated, .. } = &mut self.kind {
            *deprecated = names;
        }
        self
    }

    /// Override the group this field is declared under.
    #[must_use]
    pub fn in_oneof(mut self, name: &'static str) -> Self {
        self.oneof = Some(name);
        self
    }

    /// Override the value kind. Mostly useful for exercising schema
    /// validation; the constructors pick the right kind for normal use.
    #[must_use]
    pub fn with_value(mut self, kind: ValueKind) -> Self {
        match &mut self.kind {
            FieldKind::Flag { value, .. } | FieldKind::Positional { value, .. } => *value = kind,
            FieldKind::Subcommand { .. } => {}
        }
        self
    }

    pub fn names(&self) -> &'static [&'static str] {
        match self.kind {
            FieldKind::Flag { names, .. }
            | FieldKind::Positional { names, .. }
            | FieldKind::Subcommand { names, .. } => names,
        }
    }

    pub fn deprecated_names(&self) -> &'static [&'static str] {
        match self.kind {
            FieldKind::Flag { deprecated, .. } => deprecated,
            _ => &[],
        }
    }

    pub fn help(&self) -> &'static str {
        match self.kind {
            FieldKind::Flag { help, .. }
            | FieldKind::Positional { help, .. }
            | FieldKind::Subcommand { help, .. } => help,
        }
    }

    pub fn is_required(&self) -> bool {
        match self.kind {
            FieldKind::Flag { required, .. } | FieldKind::Positional { required, .. } => required,
            FieldKind::Subcommand { .. } => false,
        }
    }

    /// The value kind, for flags and positional arguments.
    pub fn value(&self) -> Option<ValueKind> {
        match self.kind {
            FieldKind::Flag { value, .. } | FieldKind::Positional { value, .. } => Some(value),
            FieldKind::Subcommand { .. } => None,
        }
    }

    pub fn position(&self) -> Option<u32> {
        match self.kind {
            FieldKind::Positional { position, .. } => Some(position),
            _ => None,
        }
    }

    pub fn is_subcommand(&self) -> bool {
        matches!(self.kind, FieldKind::Subcommand { .. })
    }

    pub fn is_flag(&self) -> bool {
        matches!(self.kind, FieldKind::Flag { .. })
    }

    pub fn is_positional(&self) -> bool {
        matches!(self.kind, FieldKind::Positional { .. })
    }

    /// The canonical display name: the first declared name, falling back to
    /// the field identifier.
    pub fn display_name(&self) -> &'static str {
        self.names().first().copied().unwrap_or(self.field)
    }
}

/**
A configuration type that the resolution engine can populate.

A `Schema` node describes its own fields via [`fields`][Schema::fields] and
accepts converted values via [`assign`][Schema::assign], which doubles as the
default text-to-value conversion: the engine hands over normalized text, and
the implementation parses it into the typed field however it sees fit.

Nodes with subcommands additionally implement [`nested`][Schema::nested] to
instantiate and expose the nested configuration object for a selected branch,
and nodes with message-typed flags implement [`field_any`][Schema::field_any]
so an overload conversion registered on the parser can reach the typed value
directly.
*/
pub trait Schema: 'static {
    /// Parse-relevant metadata for every field of this node.
    fn fields() -> Vec<FieldSpec>
    where
        Self: Sized;

    /// Assign normalized text to the named field, converting it to the
    /// field's type.
    fn assign(&mut self, field: &str, text: &str) -> Result<(), InvalidValue>;

    /// Instantiate (if necessary) and expose the nested configuration object
    /// for a subcommand field.
    fn nested(&mut self, field: &str) -> Option<&mut dyn Schema> {
        let _ = field;
        None
    }

    /// Mutable access to a message-typed field, for overload conversions.
    fn field_any(&mut self, field: &str) -> Option<&mut dyn Any> {
        let _ = field;
        None
    }
}
