use cddl_stream::parser::ErrorKind;
use cddl_stream::{parse_cddl, Error, ValidateError};

#[test]
fn error_traits() {
    let bad_cddl = "!";
    let err = parse_cddl(bad_cddl).unwrap_err();

    // It would be unfriendly to not support Send + Sync + Unpin.
    // Error types should also support Error, Display, and Debug.
    fn has_traits1<T: Sized + Send + Sync + Unpin>(_: &T) {}
    fn has_traits2<T: std::error::Error + std::fmt::Display + std::fmt::Debug>(_: &T) {}

    has_traits1(&err);
    has_traits2(&err);

    assert_eq!(format!("{}", err), "Expected a rule id at line 1, column 1");
    assert_eq!(
        format!("{:?}", err),
        "ParseError { kind: ExpectedId, line: 1, column: 1 }"
    );

    let err = ValidateError::MissingEntry("x".into());
    has_traits1(&err);
    has_traits2(&err);

    let err = Error::from(err);
    has_traits1(&err);
    has_traits2(&err);
}

#[test]
fn error_locations() {
    let err = parse_cddl("foo == bar").unwrap_err();
    assert_eq!(err.kind, ErrorKind::ExpectedAssign);
    assert_eq!(err.to_string(), "Expected = at line 1, column 6");

    let cddl_input = "a = int\nb = [\n  x: tstr,\n  y: 1.e\n]\n";
    let err = parse_cddl(cddl_input).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidNumber);
    assert_eq!((err.line, err.column), (4, 7));

    // CR LF counts as one line break.
    let err = parse_cddl("a = int\r\nb = ]").unwrap_err();
    assert_eq!(err.kind, ErrorKind::ExpectedGroupent);
    assert_eq!(err.location().to_string(), "line 2, column 5");
}

#[test]
fn combined_errors() {
    let err: Error = parse_cddl("a = [").unwrap_err().into();
    assert_eq!(err.to_string(), "Unexpected end of file at line 1, column 6");
    assert!(err.as_validate().is_none());
    assert_eq!(err.as_parse().map(|e| e.kind), Some(ErrorKind::UnexpectedEof));

    let err: Error = ValidateError::ExpectedUint.into();
    assert_eq!(err.to_string(), "Expected uint");
    assert_eq!(err.as_validate(), Some(&ValidateError::ExpectedUint));
}
