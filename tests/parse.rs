use cddl_stream::parser::ErrorKind;
use cddl_stream::rule::{Literal, Occur, PrimitiveType, Rule};
use cddl_stream::{parse_cddl, Event, EventList, Specification, ValidateError};

fn rule<'a>(spec: &'a Specification, name: &str) -> &'a Rule {
    let id = spec.lookup(name).unwrap();
    spec.rule(id).unwrap()
}

#[test]
fn parse_rfc_style_document() {
    let cddl_input = r#"
        ; A person, as seen by the address book.
        person = {
            name: tstr,     ; full name
            ? age: uint,
            * "nickname": tstr,
            addresses: [+ address]
        }

        address = [
            street: tstr,
            number: 0..99999,
            zip: zipcode
        ]
        zipcode = tstr / uint
    "#;
    let spec = parse_cddl(cddl_input).unwrap();
    assert_eq!(spec.root_name(), "person");

    let entries = match spec.root_rule() {
        Rule::Map(entries) => entries,
        other => panic!("unexpected root {:?}", other),
    };
    let keys: Vec<_> = entries.iter().map(|e| e.key.as_deref()).collect();
    assert_eq!(keys, vec![Some("name"), Some("age"), Some("nickname"), Some("addresses")]);
    assert_eq!(entries[0].occur, Occur::ONCE);
    assert_eq!(entries[1].occur, Occur::OPTIONAL);
    assert_eq!(entries[2].occur, Occur::ZERO_OR_MORE);
    assert_eq!(spec.rule(entries[1].rule), Some(&Rule::Reference("uint".into())));

    assert!(matches!(rule(&spec, "address"), Rule::Array(entries) if entries.len() == 3));
    match rule(&spec, "zipcode") {
        Rule::Choice(choices) => assert_eq!(choices.len(), 2),
        other => panic!("unexpected zipcode {:?}", other),
    }
}

#[test]
fn parse_literals() {
    let spec = parse_cddl(
        r#"
        a = 17
        b = -3
        c = 0x1F
        d = 1.5
        e = 2e3
        f = "say \"hi\"\n"
        "#,
    )
    .unwrap();
    assert_eq!(rule(&spec, "a"), &Rule::Literal(Literal::Int(17)));
    assert_eq!(rule(&spec, "b"), &Rule::Literal(Literal::Int(-3)));
    assert_eq!(rule(&spec, "c"), &Rule::Literal(Literal::Int(31)));
    assert_eq!(rule(&spec, "d"), &Rule::Literal(Literal::Float(1.5)));
    assert_eq!(rule(&spec, "e"), &Rule::Literal(Literal::Float(2000.0)));
    assert_eq!(rule(&spec, "f"), &Rule::Literal(Literal::Text("say \"hi\"\n".into())));
}

#[test]
fn parse_names() {
    let spec = parse_cddl("$a.b-c_1 = int\n@x = tstr\nend = [$a.b-c_1, @x]").unwrap();
    assert_eq!(spec.root_name(), "$a.b-c_1");
    assert!(spec.lookup("@x").is_some());
    assert!(spec.lookup("end").is_some());

    // The prelude is always present.
    assert_eq!(rule(&spec, "bstr"), &Rule::Primitive(PrimitiveType::Bstr));
    assert!(spec.dictionary().contains("float32-64"));
}

#[test]
fn first_definition_is_root() {
    let spec = parse_cddl("a = int\na = tstr\nb = [a]").unwrap();
    assert_eq!(spec.root_name(), "a");
    assert_eq!(spec.root_rule(), &Rule::Reference("int".into()));
    // Lookups by name see the later definition.
    assert_eq!(rule(&spec, "a"), &Rule::Reference("tstr".into()));

    spec.validate(&mut EventList::new(vec![Event::Uint64(1)])).unwrap();
    assert_eq!(
        spec.validate(&mut EventList::new(vec![Event::String("x".into())])),
        Err(ValidateError::ExpectedInt)
    );
    spec.validate_rule("a", &mut EventList::new(vec![Event::String("x".into())])).unwrap();
}

#[test]
fn parse_ranges() {
    let cddl_input = "low = 1\nhigh = 10\na = low..high\nb = 1 ... 10\nc = -1.5..1.5";
    let spec = parse_cddl(cddl_input).unwrap();
    match rule(&spec, "a") {
        Rule::Range(range) => {
            assert!(range.inclusive);
            assert_eq!(spec.rule(range.start), Some(&Rule::Reference("low".into())));
        }
        other => panic!("unexpected range {:?}", other),
    }
    assert!(matches!(rule(&spec, "b"), Rule::Range(range) if !range.inclusive));
    assert!(matches!(rule(&spec, "c"), Rule::Range(_)));
}

#[test]
fn parse_occurrences() {
    let spec = parse_cddl("a = [? int, * int, + int, 2* int, *3 int, 1*4 int, int]").unwrap();
    let entries = match spec.root_rule() {
        Rule::Array(entries) => entries,
        other => panic!("unexpected root {:?}", other),
    };
    let symbols: Vec<_> = entries.iter().map(|e| e.occur.symbol()).collect();
    assert_eq!(symbols, vec!["?", "*", "+", "2*", "0*3", "1*4", ""]);
}

#[test]
fn parse_empty_structures() {
    let spec = parse_cddl("a = []\nb = {}\nc = ()\nd = [ ; nothing\n]").unwrap();
    assert_eq!(rule(&spec, "a"), &Rule::Array(vec![]));
    assert_eq!(rule(&spec, "b"), &Rule::Map(vec![]));
    assert_eq!(rule(&spec, "c"), &Rule::Group(vec![]));
    assert_eq!(rule(&spec, "d"), &Rule::Array(vec![]));
}

#[test]
fn parse_failures() {
    let cases = [
        ("a = [int,, int]", ErrorKind::ExpectedCommaOrLeftParOrRightSqbracket),
        ("a = int / ", ErrorKind::UnexpectedEof),
        ("a = {x: }", ErrorKind::ExpectedGroupent),
        ("a = 1..2..3", ErrorKind::ExpectedRangeopOrSlashOrCommaOrRightBracket),
        ("a = \"open", ErrorKind::UnexpectedEof),
        ("a = 01", ErrorKind::InvalidNumber),
        ("7 = int", ErrorKind::ExpectedId),
        ("a = int\n7 = int", ErrorKind::ExpectedRangeopOrSlashOrCommaOrRightBracket),
    ];
    for (input, kind) in cases.iter() {
        let err = parse_cddl(input).unwrap_err();
        assert_eq!(err.kind, *kind, "input {:?}", input);
    }
}
