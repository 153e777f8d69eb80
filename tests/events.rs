use cddl_stream::{parse_cddl, Event, EventCursor, EventList, ValidateError, ValidateOptions};
use Event::*;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

fn check(cddl: &str, events: Vec<Event>) -> Result<(), ValidateError> {
    init_logging();
    let spec = parse_cddl(cddl).unwrap();
    let mut list = EventList::new(events);
    spec.validate(&mut list)
}

fn name(s: &str) -> Event {
    Name(s.to_string())
}

#[test]
fn repeated_map_keys() {
    let cddl = "rooms = {* room: float}";
    check(cddl, vec![BeginObject, EndObject]).unwrap();
    check(cddl, vec![BeginObject, name("room"), Double(1.5), EndObject]).unwrap();
    check(
        cddl,
        vec![
            BeginObject,
            name("room"),
            Double(1.5),
            name("room"),
            Double(2.0),
            name("room"),
            Double(9.25),
            EndObject,
        ],
    )
    .unwrap();

    let cddl = "rooms = {? room: float}";
    let err = check(
        cddl,
        vec![BeginObject, name("room"), Double(1.5), name("room"), Double(2.0), EndObject],
    )
    .unwrap_err();
    assert_eq!(err, ValidateError::TooManyOccurrences("room".into()));

    let cddl = "rooms = {1*2 room: float}";
    let err = check(cddl, vec![BeginObject, EndObject]).unwrap_err();
    assert_eq!(err, ValidateError::MissingEntry("room".into()));
}

#[test]
fn unknown_keys_are_skipped() {
    let cddl = "point = {x: int, y: int}";
    let events = vec![
        BeginObject,
        name("label"),
        BeginArray,
        BeginObject,
        name("deep"),
        Null,
        EndObject,
        EndArray,
        name("x"),
        Int64(-1),
        name("z"),
        ByteString(vec![0]),
        name("y"),
        Uint64(7),
        EndObject,
    ];
    check(cddl, events).unwrap();
}

#[test]
fn trailing_array_elements() {
    let cddl = "pair = [int, int]";
    let events = vec![
        BeginArray,
        Uint64(1),
        Uint64(2),
        String("x".into()),
        BeginArray,
        EndArray,
        EndArray,
    ];
    check(cddl, events).unwrap();
}

#[test]
fn truncated_streams() {
    assert_eq!(check("thing = int", vec![]), Err(ValidateError::UnexpectedEnd));
    let cases = vec![
        ("thing = [int]", vec![BeginArray, Uint64(1)]),
        ("thing = [* int]", vec![BeginArray, Uint64(1)]),
        ("thing = {a: int}", vec![BeginObject, name("a")]),
        ("thing = any", vec![BeginArray, BeginObject]),
    ];
    for (cddl, events) in cases {
        assert_eq!(check(cddl, events), Err(ValidateError::UnexpectedEnd), "{}", cddl);
    }
}

#[test]
fn malformed_streams() {
    // More than one top-level value.
    assert_eq!(
        check("thing = int", vec![Uint64(1), Uint64(2)]),
        Err(ValidateError::UnexpectedEvent("uint64_value"))
    );
    // A value where a map key belongs.
    assert_eq!(
        check("thing = {a: int}", vec![BeginObject, Uint64(1), EndObject]),
        Err(ValidateError::UnexpectedEvent("uint64_value"))
    );
    // An array closed as a map.
    assert_eq!(
        check("thing = [* int]", vec![BeginArray, Uint64(1), EndObject]),
        Err(ValidateError::UnexpectedEvent("end_object"))
    );
    // `any` still needs a value.
    assert_eq!(check("thing = any", vec![EndArray]), Err(ValidateError::ExpectedValue));
}

#[test]
fn signed_and_unsigned_events() {
    check("thing = uint", vec![Int64(5)]).unwrap();
    check("thing = int", vec![Uint64(u64::MAX)]).unwrap();
    check("thing = -5..5", vec![Int64(-5)]).unwrap();
    check("thing = -5..5", vec![Uint64(5)]).unwrap();
    assert_eq!(
        check("thing = -5...5", vec![Uint64(5)]),
        Err(ValidateError::OutOfRange("-5...5".into()))
    );
    assert_eq!(check("thing = nint", vec![Int64(0)]), Err(ValidateError::ExpectedNint));
}

#[test]
fn optional_members_skip_without_consuming() {
    let cddl = "thing = [? tstr, ? bool, int]";
    check(cddl, vec![BeginArray, Uint64(1), EndArray]).unwrap();
    check(cddl, vec![BeginArray, Bool(true), Uint64(1), EndArray]).unwrap();
    check(cddl, vec![BeginArray, String("a".into()), Bool(true), Uint64(1), EndArray]).unwrap();
    assert_eq!(
        check(cddl, vec![BeginArray, Bool(true), String("a".into()), EndArray]),
        Err(ValidateError::ExpectedInt)
    );
}

/// A cursor whose source fails after a number of events.
struct FailingCursor {
    events: Vec<Event>,
    position: usize,
    fail_at: usize,
}

impl EventCursor for FailingCursor {
    fn current(&self) -> Option<&Event> {
        self.events.get(self.position)
    }

    fn next(&mut self) -> Result<(), ValidateError> {
        if self.position + 1 == self.fail_at {
            return Err(ValidateError::Cursor("decoder failed".into()));
        }
        self.position += 1;
        Ok(())
    }
}

#[test]
fn cursor_errors_propagate() {
    init_logging();
    let spec = parse_cddl("thing = [* int]").unwrap();
    let mut cursor = FailingCursor {
        events: vec![BeginArray, Uint64(1), Uint64(2), EndArray],
        position: 0,
        fail_at: 2,
    };
    let err = spec.validate(&mut cursor).unwrap_err();
    assert_eq!(err, ValidateError::Cursor("decoder failed".into()));
    assert_eq!(err.to_string(), "Event source error: decoder failed");
}

#[test]
fn validator_reuse() {
    init_logging();
    let spec = parse_cddl("thing = [+ tstr]").unwrap();
    let validator = spec.validator();
    assert_eq!(validator.options(), ValidateOptions::default());

    let mut first = EventList::new(vec![BeginArray, String("a".into()), EndArray]);
    let mut second = EventList::new(vec![BeginArray, EndArray]);
    let mut third =
        EventList::new(vec![BeginArray, String("b".into()), String("c".into()), EndArray]);
    validator.validate_id(spec.root(), &mut first).unwrap();
    assert_eq!(
        validator.validate_id(spec.root(), &mut second),
        Err(ValidateError::MissingEntry("tstr".into()))
    );
    validator.validate_id(spec.root(), &mut third).unwrap();
    assert!(first.done() && third.done());
    assert_eq!(second.remaining(), &[EndArray]);
}

#[test]
fn shared_across_threads() {
    let spec = std::sync::Arc::new(parse_cddl("thing = {id: uint, tags: [* tstr]}").unwrap());
    let handles: Vec<_> = (0..4u64)
        .map(|i| {
            let spec = spec.clone();
            std::thread::spawn(move || {
                let mut list = EventList::new(vec![
                    BeginObject,
                    Name("id".into()),
                    Uint64(i),
                    Name("tags".into()),
                    BeginArray,
                    String(format!("t{}", i)),
                    EndArray,
                    EndObject,
                ]);
                spec.validate(&mut list)
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }
}
