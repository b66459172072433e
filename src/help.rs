/*!
The help tree and its renderer.

The tree is built once, at parser construction, by walking subcommand
metadata recursively without ever instantiating a nested configuration
object. Rendering is a pure function of the tree: calling it twice yields
byte-identical text, and nothing here touches process state.
*/

use std::collections::BTreeSet;
use std::fmt::{self, Write};

use indent_write::fmt::IndentWriter;
use joinery::JoinableIterator;
use lazy_format::lazy_format;
use textwrap::Options;

use crate::schema::{FieldKind, FieldSpec};

/// Indentation step between nesting levels, and the minimum gap between the
/// name column and the help column.
const STEP: usize = 2;

/// Width help text is wrapped to, with a hanging indent at the help column.
const WRAP: usize = 96;

#[derive(Debug, Clone)]
pub(crate) struct HelpNode {
    /// The subcommand field identifier, absent for the root.
    name: Option<&'static str>,

    help: Option<&'static str>,

    fields: Vec<FieldSpec>,

    children: Vec<HelpNode>,
}

impl HelpNode {
    pub fn root(fields: Vec<FieldSpec>) -> Self {
        Self::build(None, None, fields)
    }

    fn build(
        name: Option<&'static str>,
        help: Option<&'static str>,
        fields: Vec<FieldSpec>,
    ) -> Self {
        let children = fields
            .iter()
            .filter_map(|spec| match spec.kind {
                FieldKind::Subcommand {
                    help,
                    fields: nested,
                    ..
                } => Some(Self::build(Some(spec.field), Some(help), nested())),
                _ => None,
            })
            .collect();

        Self {
            name,
            help,
            fields,
            children,
        }
    }
}

/// Subcommand identifiers grouped by nesting depth, breadth-first, with a
/// global first-seen dedupe: an identifier already emitted at a shallower
/// depth (or earlier at the same depth) never reappears.
fn usage_groups(root: &HelpNode) -> Vec<Vec<&'static str>> {
    let mut seen = BTreeSet::new();
    let mut level: Vec<&HelpNode> = vec![root];
    let mut groups = Vec::new();

    while !level.is_empty() {
        let next: Vec<&HelpNode> = level.iter().flat_map(|node| &node.children).collect();

        let names: Vec<&'static str> = next
            .iter()
            .filter_map(|child| child.name)
            .filter(|name| seen.insert(*name))
            .collect();

        if !names.is_empty() {
            groups.push(names);
        }

        level = next;
    }

    groups
}

/// The display form a field is listed under.
fn display(spec: &FieldSpec) -> String {
    match &spec.kind {
        FieldKind::Flag { value, .. } if value.is_bool() => {
            format!("--[no-]{}", spec.display_name())
        }
        FieldKind::Flag { .. } => format!("--{}=...", spec.display_name()),
        FieldKind::Positional { .. } => spec.display_name().to_owned(),
        FieldKind::Subcommand { .. } => spec.field.to_owned(),
    }
}

/// List one node's fields, then its subcommand branches, each branch
/// indented one step deeper. Help text is aligned into a per-level column
/// and wrapped with a hanging indent.
///
/// Takes `dyn Write` so the recursion through [`IndentWriter`] doesn't
/// instantiate a fresh copy of itself at every nesting depth.
fn list_level(
    out: &mut dyn Write,
    fields: &[FieldSpec],
    children: &[HelpNode],
) -> fmt::Result {
    let width = fields
        .iter()
        .map(|spec| display(spec).chars().count())
        .max()
        .unwrap_or(0)
        + STEP
        + STEP;

    let hanging = " ".repeat(width);
    let options = Options::new(WRAP).subsequent_indent(&hanging);

    for spec in fields.iter().filter(|spec| !spec.is_subcommand()) {
        let name = display(spec);
        let help = textwrap::fill(spec.help(), &options);
        writeln!(out, "{name:<width$}{help}")?;
    }

    for child in children {
        let name = child.name.unwrap_or_default();
        let help = textwrap::fill(child.help.unwrap_or_default(), &options);
        writeln!(out, "{name:<width$}{help}")?;

        let mut nested = IndentWriter::new("  ", &mut *out);
        list_level(&mut nested, &child.fields, &child.children)?;
    }

    Ok(())
}

/// Render the complete help text for `program`. Standard flags are listed
/// ahead of the root node's own fields.
pub(crate) fn render(program: &str, tree: &HelpNode, standard: &[FieldSpec]) -> String {
    let mut out = String::new();

    out.push_str("Usage:\n\n");

    out.push_str(program);
    out.push_str(" [...]");

    let groups = usage_groups(tree);

    for group in &groups {
        let usage = lazy_format!(" {{{}}} [...]", group.iter().join_with('|'));
        write!(out, "{usage}").expect("writing to a String never fails");
    }

    out.push_str("\n\n");
    out.push_str("[...] - flags or positional arguments\n\n");

    if !tree.children.is_empty() {
        out.push_str("{...|...} - subcommands\n\n");
        out.push_str(
            "NOTE: subcommands must follow in correct order.\n\
             REMEMBER, only one subcommand from the list {...}\n\
             can be set at a time!\n\
             Check more specific information about the\n\
             subcommands below.\n\n",
        );
    }

    let mut fields = standard.to_vec();
    fields.extend(tree.fields.iter().cloned());

    list_level(&mut out, &fields, &tree.children)
        .expect("writing to a String never fails");

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ValueKind;

    fn leaf() -> Vec<FieldSpec> {
        vec![FieldSpec::flag(
            "quiet",
            &["quiet"],
            "whether to suppress output",
            ValueKind::Bool,
        )]
    }

    fn branch() -> Vec<FieldSpec> {
        vec![
            FieldSpec::positional("file", &["file"], "the file to build", 1),
            FieldSpec::subcommand("publish", &["publish"], "publish the build", leaf),
        ]
    }

    fn root_fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::flag("verbose", &["verbose"], "log more", ValueKind::Bool),
            FieldSpec::subcommand("build", &["build"], "build the project", branch),
            FieldSpec::subcommand("check", &["check"], "check the project", branch),
        ]
    }

    fn standard() -> Vec<FieldSpec> {
        vec![FieldSpec::flag(
            "help",
            &["help"],
            "whether or not to display this help message",
            ValueKind::Bool,
        )]
    }

    #[test]
    fn usage_line_dedupes_across_depths() {
        let tree = HelpNode::root(root_fields());
        let groups = usage_groups(&tree);

        // 'publish' appears under both branches at depth two but is listed
        // once; nothing new remains at depth three.
        assert_eq!(groups, vec![vec!["build", "check"], vec!["publish"]]);
    }

    #[test]
    fn renders_full_tree() {
        let tree = HelpNode::root(root_fields());
        let text = render("program", &tree, &standard());

        assert!(text.starts_with(
            "Usage:\n\nprogram [...] {build|check} [...] {publish} [...]\n\n"
        ));
        assert!(text.contains("[...] - flags or positional arguments\n\n"));
        assert!(text.contains("{...|...} - subcommands\n\n"));
        assert!(text.contains("NOTE: subcommands must follow in correct order.\n"));

        // Standard flag listed before root fields, nested levels indented.
        let help_at = text.find("--[no-]help").unwrap();
        let verbose_at = text.find("--[no-]verbose").unwrap();
        assert!(help_at < verbose_at);
        assert!(text.contains("\n  file"));
        assert!(text.contains("\n  publish"));
        assert!(text.contains("\n    --[no-]quiet"));
    }

    #[test]
    fn no_subcommand_sections_without_subcommands() {
        let tree = HelpNode::root(vec![FieldSpec::flag(
            "foo",
            &["foo"],
            "a flag",
            ValueKind::String,
        )]);
        let text = render("program", &tree, &standard());

        assert!(text.starts_with("Usage:\n\nprogram [...]\n\n"));
        assert!(!text.contains("{...|...}"));
        assert!(!text.contains("NOTE:"));
        assert!(text.contains("--foo=..."));
    }

    #[test]
    fn rendering_is_repeatable() {
        let tree = HelpNode::root(root_fields());
        assert_eq!(
            render("program", &tree, &standard()),
            render("program", &tree, &standard()),
        );
    }
}
