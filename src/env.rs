//! Environment variable overlay: vars carrying the configured prefix are
//! rewritten into flag name/value pairs and appended after the command line,
//! so a flag given on the command line wins over its environment twin.

/// Select the variables named `{prefix}_*`, strip the header, and lowercase
/// what remains. Every surviving entry carries an explicit value, even an
/// empty one.
pub(crate) fn overlay(
    prefix: &str,
    variables: impl IntoIterator<Item = (String, String)>,
) -> Vec<(String, Option<String>)> {
    let header = format!("{prefix}_");

    variables
        .into_iter()
        .filter_map(|(name, value)| {
            let name = name.strip_prefix(&header)?;
            Some((name.to_ascii_lowercase(), Some(value)))
        })
        .collect()
}
