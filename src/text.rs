//! Normalization of string-typed values before conversion.

/// Strip one level of matching surrounding quotes (single or double) and
/// decode common escape sequences, so that `--foo='hello world'` binds the
/// string `hello world`. Unquoted values pass through untouched.
pub(crate) fn unquote(value: &str) -> String {
    let bytes = value.as_bytes();

    let quoted = bytes.len() >= 2
        && (bytes[0] == b'\'' || bytes[0] == b'"')
        && bytes[bytes.len() - 1] == bytes[0];

    if !quoted {
        return value.to_owned();
    }

    let inner = &value[1..value.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('0') => out.push('\0'),
            // `\'`, `\"`, `\\`, and anything unrecognized: keep the
            // escaped character itself.
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}
