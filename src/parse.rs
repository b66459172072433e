/*!
The resolution engine: [`ParserBuilder`] assembles a reusable [`Parser`] for
one configuration type, and [`Parser::parse`] runs the whole pipeline over
one argument vector.

The pipeline stages run in a fixed order: walk the arguments (collecting flag
tokens, descending into subcommands, binding positional arguments), fold in
the environment overlay, resolve the collected flag values against the full
name table, honor `--help`, check required flags and validators, convert the
positional bindings, and finally compact the argument vector down to the
program name plus whatever bound to nothing.

A parser borrows nothing from any single invocation: each parse clones the
base registry and extends the clone as subcommands are selected, so the same
parser can resolve any number of argument vectors.
*/

use std::any::{self, Any, TypeId};
use std::collections::{BTreeMap, BTreeSet};
use std::mem;
use std::path::Path;
use std::process;

use tracing::debug;

use crate::errors::{Error, SchemaError};
use crate::help::{self, HelpNode};
use crate::registry::{FieldId, ROOT_NODE, Registry, STANDARD_NODE};
use crate::schema::{FieldKind, Schema, ValueKind};
use crate::state::{Parsed, ParseState, StandardFlags};
use crate::{env, text, tokenizer};

type OverloadFn = Box<dyn Fn(&str, &mut dyn Any) -> Result<(), String>>;
type ValidateFn<F> = Box<dyn Fn(&F) -> bool>;

/// Builder for a [`Parser`]. Schema validation is deferred to
/// [`build`][ParserBuilder::build] so construction itself can't fail.
pub struct ParserBuilder<F: Schema> {
    overloads: BTreeMap<TypeId, OverloadFn>,
    duplicate_overload: Option<&'static str>,
    validators: Vec<(String, ValidateFn<F>)>,
    env_prefix: Option<String>,
}

impl<F: Schema> Default for ParserBuilder<F> {
    fn default() -> Self {
        Self {
            overloads: BTreeMap::new(),
            duplicate_overload: None,
            validators: Vec::new(),
            env_prefix: None,
        }
    }
}

impl<F: Schema> ParserBuilder<F> {
    /// Register a conversion override for every flag whose value kind is
    /// [`ValueKind::message`] of `T`. Registering two overloads for the same
    /// type is a schema error, reported by [`build`][Self::build].
    pub fn overload<T: Any>(
        mut self,
        convert: impl Fn(&str, &mut T) -> Result<(), String> + 'static,
    ) -> Self {
        let type_name = any::type_name::<T>();

        let wrapped: OverloadFn = Box::new(move |text, value| match value.downcast_mut::<T>() {
            Some(value) => convert(text, value),
            None => Err(format!("value is not a {type_name}")),
        });

        if self.overloads.insert(TypeId::of::<T>(), wrapped).is_some() {
            self.duplicate_overload.get_or_insert(type_name);
        }

        self
    }

    /// Add a predicate over the fully resolved configuration. A predicate
    /// returning false contributes `message` to the aggregated input errors.
    pub fn validate(
        mut self,
        message: impl Into<String>,
        predicate: impl Fn(&F) -> bool + 'static,
    ) -> Self {
        self.validators.push((message.into(), Box::new(predicate)));
        self
    }

    /// Fold environment variables named `{prefix}_*` into flag resolution.
    /// A flag supplied on the command line shadows its environment twin.
    pub fn environment_variable_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Validate the schema's top-level fields and assemble the parser.
    pub fn build(self) -> Result<Parser<F>, SchemaError> {
        if let Some(type_name) = self.duplicate_overload {
            return Err(SchemaError::DuplicateOverload { type_name });
        }

        let mut registry = Registry::default();
        registry.add_node("standard", Vec::new());
        registry.add_node(root_name::<F>(), Vec::new());

        registry.register(STANDARD_NODE, &StandardFlags::fields())?;

        let fields = F::fields();
        registry.register(ROOT_NODE, &fields)?;

        Ok(Parser {
            registry,
            tree: HelpNode::root(fields),
            overloads: self.overloads,
            validators: self.validators,
            env_prefix: self.env_prefix,
        })
    }
}

/// A reusable resolution engine for the configuration type `F`.
pub struct Parser<F: Schema> {
    registry: Registry,
    tree: HelpNode,
    overloads: BTreeMap<TypeId, OverloadFn>,
    validators: Vec<(String, ValidateFn<F>)>,
    env_prefix: Option<String>,
}

impl<F: Schema> std::fmt::Debug for Parser<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser").finish_non_exhaustive()
    }
}

impl<F: Schema> Parser<F> {
    pub fn builder() -> ParserBuilder<F> {
        ParserBuilder::default()
    }

    /// Resolve `arguments` into `flags`, reading the process environment if
    /// an environment variable prefix was configured.
    ///
    /// On success `arguments` is compacted in place: the program name stays
    /// at index 0, followed by the arguments that bound to nothing, in their
    /// original relative order.
    pub fn parse(&self, flags: &mut F, arguments: &mut Vec<String>) -> Result<(), Error> {
        let environment: Vec<(String, String)> = match self.env_prefix {
            Some(_) => std::env::vars_os()
                .filter_map(|(name, value)| {
                    Some((name.into_string().ok()?, value.into_string().ok()?))
                })
                .collect(),
            None => Vec::new(),
        };

        self.parse_with_env(flags, arguments, environment)
    }

    /// [`parse`][Self::parse] with an explicit environment instead of the
    /// process's own.
    pub fn parse_with_env(
        &self,
        flags: &mut F,
        arguments: &mut Vec<String>,
        environment: impl IntoIterator<Item = (String, String)>,
    ) -> Result<(), Error> {
        let program = program_name(arguments);
        let mut state = ParseState::new(self.registry.clone());

        self.walk(flags, &mut state, &program, arguments)?;
        self.fold_environment(&mut state, environment);
        self.resolve_values(flags, &mut state);

        if state.standard.help {
            return Err(Error::Help {
                text: self.render_help(&program),
            });
        }

        check_required_flags(&mut state);

        for (message, predicate) in &self.validators {
            if !predicate(flags) {
                state.errors.insert(message.clone());
            }
        }

        if !state.errors.is_empty() {
            return Err(Error::Input {
                program,
                errors: mem::take(&mut state.errors),
            });
        }

        bind_positionals(flags, &mut state);

        if !state.errors.is_empty() {
            return Err(Error::Positional {
                program,
                errors: mem::take(&mut state.errors),
            });
        }

        debug!(
            leftovers = state.leftovers.len(),
            "resolved; compacting arguments"
        );

        arguments.truncate(1);
        arguments.append(&mut state.leftovers);

        Ok(())
    }

    /// [`parse`][Self::parse], but report any failure to stderr and exit the
    /// process: status 0 for a help request, 1 for everything else.
    pub fn parse_or_exit(&self, flags: &mut F, arguments: &mut Vec<String>) {
        if let Err(error) = self.parse(flags, arguments) {
            eprint!("{}", error.report());
            process::exit(error.exit_code());
        }
    }

    /// The full help text, as shown for `--help`. Pure: rendering twice
    /// yields identical text.
    pub fn render_help(&self, program: &str) -> String {
        help::render(program, &self.tree, &StandardFlags::fields())
    }

    /// Scan the argument vector once: flag tokens are collected for later
    /// resolution, bare tokens descend into subcommands or bind to the
    /// positional cursor, and everything else is kept as a leftover.
    fn walk(
        &self,
        flags: &mut F,
        state: &mut ParseState,
        program: &str,
        arguments: &[String],
    ) -> Result<(), Error> {
        let mut rest = arguments.iter().skip(1);

        while let Some(raw) = rest.next() {
            match tokenizer::scan(raw) {
                tokenizer::Token::Terminator => {
                    state.leftovers.extend(rest.cloned());
                    break;
                }
                tokenizer::Token::Flag { name, value } => {
                    state
                        .values
                        .push((name.to_owned(), value.map(str::to_owned)));
                }
                tokenizer::Token::Bare(token) => self.bare(flags, state, program, raw, token)?,
            }
        }

        Ok(())
    }

    fn bare(
        &self,
        flags: &mut F,
        state: &mut ParseState,
        program: &str,
        raw: &str,
        token: &str,
    ) -> Result<(), Error> {
        if state.visited.contains(token) {
            return Err(terminal(
                program,
                format!("Encountered duplicate subcommand '{token}'."),
            ));
        }

        // A sibling branch of the node we already descended from means the
        // mutually-exclusive subcommand group was set twice.
        if let Some(parent) = state.parent
            && state.registry.subcommand_on(parent, token).is_some()
        {
            let node = state.registry.node(parent).name.clone();
            return Err(terminal(
                program,
                format!("You have already set oneof 'subcommand' field for '{node}'"),
            ));
        }

        if let Some(id) = state.registry.subcommand_on(state.current, token) {
            return self.descend(flags, state, id);
        }

        if let Some(slot) = state.positional_slot() {
            state.bindings.push((slot, token.to_owned()));
            state.next_position += 1;
            return Ok(());
        }

        state.leftovers.push(raw.to_owned());
        Ok(())
    }

    /// Instantiate the selected branch's configuration object and lazily
    /// register its fields into this invocation's registry.
    fn descend(&self, flags: &mut F, state: &mut ParseState, id: FieldId) -> Result<(), Error> {
        let reg = state.registry.field(id).clone();
        let FieldKind::Subcommand { fields, .. } = reg.spec.kind else {
            return Ok(());
        };

        let node = state.registry.node(state.current);
        let qualified = format!("{}.{}", node.name, reg.spec.field);
        let mut path = node.path.clone();

        let instantiated = locate(flags, &path)
            .and_then(|object| object.nested(reg.spec.field))
            .is_some();
        if !instantiated {
            return Err(SchemaError::MissingNestedNode { field: qualified }.into());
        }

        path.push(reg.spec.field);
        let child = state.registry.add_node(reg.spec.field, path);
        state.registry.register(child, &fields())?;

        state.visited.insert(reg.spec.field.to_owned());
        state.parent = Some(state.current);
        state.current = child;

        debug!(subcommand = reg.spec.field, "descending into subcommand");
        Ok(())
    }

    /// Append the environment overlay to the collected flag values, dropping
    /// any entry whose field was already named on the command line.
    fn fold_environment(
        &self,
        state: &mut ParseState,
        environment: impl IntoIterator<Item = (String, String)>,
    ) {
        let Some(prefix) = &self.env_prefix else {
            return;
        };

        let from_cli: BTreeSet<FieldId> = state
            .values
            .iter()
            .filter_map(|(name, _)| {
                let base = name.strip_prefix("no-").unwrap_or(name);
                state.registry.lookup(base)
            })
            .collect();

        for (name, value) in env::overlay(prefix, environment) {
            let base = name.strip_prefix("no-").unwrap_or(&name);

            if let Some(id) = state.registry.lookup(base)
                && from_cli.contains(&id)
            {
                debug!(flag = %name, "environment entry shadowed by command line");
                continue;
            }

            state.values.push((name, value));
        }
    }

    /// Resolve every collected flag name/value pair: negation, value-kind
    /// normalization, duplicate detection, and conversion into the
    /// configuration object. Failures aggregate; nothing short-circuits.
    fn resolve_values(&self, flags: &mut F, state: &mut ParseState) {
        let values = mem::take(&mut state.values);

        let ParseState {
            registry,
            ledger,
            errors,
            standard,
            ..
        } = state;

        for (name, value) in values {
            let negated = name.strip_prefix("no-");
            let base = negated.unwrap_or(&name);

            let Some(id) = registry.lookup(base) else {
                errors.insert(match negated {
                    Some(_) => format!("Encountered unknown flag '{base}' via '{name}'"),
                    None => format!("Encountered unknown flag '{base}'"),
                });
                continue;
            };

            let reg = registry.field(id).clone();
            let Some(kind) = reg.spec.value() else {
                continue;
            };

            // Normalize into plain conversion text. Negation and implicit
            // values only exist for booleans.
            let text = if kind.is_bool() {
                match (negated, value) {
                    (None, None) => "true".to_owned(),
                    (Some(_), None) => "false".to_owned(),
                    (None, Some(value)) => value,
                    (Some(_), Some(value)) => {
                        errors.insert(format!(
                            "Encountered negated boolean flag '{name}' \
                             with an unexpected value '{value}'"
                        ));
                        continue;
                    }
                }
            } else if negated.is_some() {
                errors.insert(format!(
                    "Failed to parse non-boolean flag '{base}' via '{name}'"
                ));
                continue;
            } else {
                match value {
                    Some(value) if !value.is_empty() => {
                        if kind.is_string() {
                            text::unquote(&value)
                        } else {
                            value
                        }
                    }
                    _ => {
                        errors.insert(format!(
                            "Failed to parse non-boolean flag '{base}': missing value"
                        ));
                        continue;
                    }
                }
            };

            if let Some(previous) = ledger.get(&id) {
                let aliased = previous.name != base;

                if kind.is_bool() {
                    if previous.text != text {
                        errors.insert(format!(
                            "Encountered duplicate boolean flag '{base}' {}that \
                             has a conflicting value",
                            if aliased {
                                format!("with flag aliased as '{}' ", previous.name)
                            } else {
                                String::new()
                            }
                        ));
                    }
                } else {
                    errors.insert(format!(
                        "Encountered duplicate flag '{base}'{}",
                        if aliased {
                            format!(" with flag aliased as '{}'", previous.name)
                        } else {
                            String::new()
                        }
                    ));
                }

                continue;
            }

            let path = registry.node(reg.node).path.clone();
            let target = match reg.node {
                STANDARD_NODE => Some(&mut *standard as &mut dyn Schema),
                _ => locate(&mut *flags, &path),
            };
            let Some(target) = target else {
                errors.insert(format!(
                    "Failed to parse flag '{base}' from normalized value '{text}' \
                     due to parse error(s): missing nested configuration object"
                ));
                continue;
            };

            let overload = match kind {
                ValueKind::Message { id, .. } => self.overloads.get(&id),
                _ => None,
            };

            let attempted = overload.and_then(|convert| {
                target
                    .field_any(reg.spec.field)
                    .map(|field| convert(&text, field))
            });

            let converted = match attempted {
                Some(result) => result.map_err(|error| {
                    format!(
                        "Failed to parse flag '{base}' from normalized value \
                         '{text}' due to overloaded parsing error: {error}"
                    )
                }),
                None => target.assign(reg.spec.field, &text).map_err(|error| {
                    format!(
                        "Failed to parse flag '{base}' from normalized value \
                         '{text}' due to parse error(s): {error}"
                    )
                }),
            };

            match converted {
                Ok(()) => {
                    ledger.insert(
                        id,
                        Parsed {
                            name: base.to_owned(),
                            text,
                        },
                    );
                }
                Err(error) => {
                    errors.insert(error);
                }
            }
        }
    }
}

fn terminal(program: &str, message: String) -> Error {
    Error::Input {
        program: program.to_owned(),
        errors: BTreeSet::from([message]),
    }
}

/// Follow a chain of subcommand field identifiers down from the root
/// configuration object.
fn locate<'a>(root: &'a mut dyn Schema, path: &[&'static str]) -> Option<&'a mut dyn Schema> {
    let mut node = root;
    for segment in path {
        node = node.nested(segment)?;
    }
    Some(node)
}

fn check_required_flags(state: &mut ParseState) {
    let mut missing = Vec::new();

    for (id, reg) in state.registry.fields() {
        if reg.spec.is_flag() && reg.spec.is_required() && !state.ledger.contains_key(&id) {
            missing.push(format!(
                "Flag {} not parsed but required",
                alias_list(reg.spec.names())
            ));
        }
    }

    state.errors.extend(missing);
}

/// Convert the positional bindings made during the walk, then check that
/// every required positional argument resolved. Conversion failures
/// aggregate alongside the required-argument diagnostics.
fn bind_positionals<F: Schema>(flags: &mut F, state: &mut ParseState) {
    let bindings = mem::take(&mut state.bindings);

    let ParseState {
        registry,
        ledger,
        errors,
        ..
    } = state;

    for (id, raw) in bindings {
        let reg = registry.field(id).clone();
        let text = text::unquote(&raw);

        let path = registry.node(reg.node).path.clone();
        let converted = match locate(&mut *flags, &path) {
            Some(target) => target.assign(reg.spec.field, &text).map_err(|error| error.to_string()),
            None => Err("missing nested configuration object".to_owned()),
        };

        match converted {
            Ok(()) => {
                ledger.insert(
                    id,
                    Parsed {
                        name: raw,
                        text,
                    },
                );
            }
            Err(error) => {
                errors.insert(format!(
                    "Failed to parse positional argument '{raw}' from normalized \
                     value '{text}' due to parse error(s): {error}"
                ));
            }
        }
    }

    let mut missing = Vec::new();

    for (id, reg) in registry.fields() {
        if reg.spec.is_positional() && reg.spec.is_required() && !ledger.contains_key(&id) {
            missing.push(format!(
                "Positional argument {} not parsed but required",
                alias_list(reg.spec.names())
            ));
        }
    }

    errors.extend(missing);
}

/// `'a'` alone, or `'a' (aka 'b', 'c')` when a field has extra names.
fn alias_list(names: &[&str]) -> String {
    use joinery::JoinableIterator;
    use lazy_format::lazy_format;

    match names {
        [] => String::new(),
        [only] => format!("'{only}'"),
        [first, rest @ ..] => {
            let aka = rest.iter().map(|name| lazy_format!("'{name}'")).join_with(", ");
            format!("'{first}' (aka {aka})")
        }
    }
}

/// The file name of `arguments[0]`, used to prefix error banners and the
/// usage line.
fn program_name(arguments: &[String]) -> String {
    arguments
        .first()
        .map(|first| {
            Path::new(first)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| first.clone())
        })
        .unwrap_or_default()
}

/// The last path segment of the configuration type's name, used to name the
/// root node in diagnostics.
fn root_name<F>() -> &'static str {
    let full = any::type_name::<F>();
    full.rsplit("::").next().unwrap_or(full)
}
