/*!
Low-level classification of raw command line tokens. Takes care of the
distinction between flag-shaped tokens, the `--` terminator, and bare tokens
that might be subcommands, positional arguments, or leftovers. No name
resolution happens here.
*/

/// One classified command line token. Borrowed from the (trimmed) raw
/// argument text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'arg> {
    /// A literal `--`: everything after it is a leftover, verbatim.
    Terminator,

    /// `--name`, `--name=value`, or `--no-name`. The `no-` prefix is kept in
    /// the name here; negation is resolved during value resolution, once the
    /// field's value kind is known.
    Flag {
        name: &'arg str,
        value: Option<&'arg str>,
    },

    /// A candidate subcommand name, positional argument, or leftover, tried
    /// in that order by the walker.
    Bare(&'arg str),
}

/// Classify one raw argument. Surrounding ASCII whitespace is stripped
/// before classification; a `--name=value` token splits at the *first* `=`.
pub fn scan(raw: &str) -> Token<'_> {
    let arg = raw.trim_ascii();

    if arg == "--" {
        return Token::Terminator;
    }

    let Some(rest) = arg.strip_prefix("--") else {
        return Token::Bare(arg);
    };

    // `=` is ASCII, so the byte offset is a char boundary.
    match memchr::memchr(b'=', rest.as_bytes()) {
        Some(eq) => Token::Flag {
            name: &rest[..eq],
            value: Some(&rest[eq + 1..]),
        },
        None => Token::Flag {
            name: rest,
            value: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{Token, scan};

    #[test]
    fn bare_token() {
        assert_eq!(scan("build"), Token::Bare("build"));
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(scan("  build \t"), Token::Bare("build"));
        assert_eq!(
            scan(" --foo=1 "),
            Token::Flag {
                name: "foo",
                value: Some("1")
            }
        );
    }

    #[test]
    fn flag_without_value() {
        assert_eq!(
            scan("--verbose"),
            Token::Flag {
                name: "verbose",
                value: None
            }
        );
    }

    #[test]
    fn flag_with_value_splits_at_first_equals() {
        assert_eq!(
            scan("--key=a=b"),
            Token::Flag {
                name: "key",
                value: Some("a=b")
            }
        );
    }

    #[test]
    fn negated_flag_keeps_prefix() {
        assert_eq!(
            scan("--no-verbose"),
            Token::Flag {
                name: "no-verbose",
                value: None
            }
        );
    }

    #[test]
    fn terminator() {
        assert_eq!(scan("--"), Token::Terminator);
    }

    #[test]
    fn single_dash_is_bare() {
        // Short options are not part of this engine's surface.
        assert_eq!(scan("-v"), Token::Bare("-v"));
    }

    #[test]
    fn empty_value() {
        assert_eq!(
            scan("--foo="),
            Token::Flag {
                name: "foo",
                value: Some("")
            }
        );
    }
}
