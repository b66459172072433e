mod common;

use common::{Interval, TestFlags, arguments, parse_interval};
use quibble::{Parser, SchemaError};

#[test]
fn overload_converts_the_message_flag() {
    let parser: Parser<TestFlags> = Parser::builder()
        .overload(parse_interval)
        .build()
        .unwrap();

    let mut flags = TestFlags::default();
    let mut args = arguments(&[
        "/path/to/program",
        "--foo='hello world'",
        "--duration=-1000000001ns",
    ]);

    parser.parse(&mut flags, &mut args).unwrap();

    assert_eq!(
        flags.duration,
        Interval {
            seconds: -1,
            nanos: -1,
        }
    );
}

#[test]
fn overload_failure_is_reported() {
    let parser: Parser<TestFlags> = Parser::builder()
        .overload(|_text: &str, _interval: &mut Interval| {
            Err::<(), String>("unimplemented".to_owned())
        })
        .build()
        .unwrap();

    let mut flags = TestFlags::default();
    let mut args = arguments(&[
        "/path/to/program",
        "--foo='hello world'",
        "--duration=-1000000001ns",
    ]);

    let error = parser.parse(&mut flags, &mut args).unwrap_err();

    assert_eq!(
        error.report(),
        "program: Failed while parsing and validating flags:\n\n\
         * Failed to parse flag 'duration' from normalized value '-1000000001ns' \
         due to overloaded parsing error: unimplemented\n\n"
    );
}

#[test]
fn duplicate_overload_fails_at_build() {
    let error = Parser::<TestFlags>::builder()
        .overload(parse_interval)
        .overload(parse_interval)
        .build()
        .unwrap_err();

    assert!(matches!(error, SchemaError::DuplicateOverload { .. }));
    assert!(error.to_string().starts_with("Encountered more than one overload parsing for"));
}
