// End-to-end decoding through the public runtime API.

use ebmlgen::runtime::{ElementKind, Parser, Status, MAX_STACK_SIZE};

// EBML { EBMLVersion = 1, DocType = "matroska" }
const HEADER: [u8; 20] = [
    0x1A, 0x45, 0xDF, 0xA3, 0x8F, // EBML, 15 body bytes
    0x42, 0x86, 0x81, 0x01, // EBMLVersion = 1
    0x42, 0x82, 0x88, b'm', b'a', b't', b'r', b'o', b's', b'k', b'a', // DocType
];

#[derive(Debug, Clone, PartialEq)]
struct Ev {
    status: Status,
    name: &'static str,
    depth: usize,
}

fn drive(parser: &mut Parser, bytes: &[u8]) -> Vec<Ev> {
    let mut events = Vec::new();
    for &byte in bytes {
        match parser.parse(byte) {
            Status::Ok => {}
            Status::Error => panic!("unexpected decode error: {parser:?}"),
            status => events.push(Ev {
                status,
                name: parser.name,
                depth: parser.this_depth,
            }),
        }
    }
    for _ in 0..(4 * MAX_STACK_SIZE) {
        match parser.eof() {
            Status::Ok => return events,
            Status::Error => panic!("unterminated document: {parser:?}"),
            status => events.push(Ev {
                status,
                name: parser.name,
                depth: parser.this_depth,
            }),
        }
    }
    panic!("eof did not settle");
}

#[test]
fn header_produces_the_documented_event_sequence() {
    let mut parser = Parser::new();
    let mut values = Vec::new();
    let mut strings = Vec::new();
    let mut events = Vec::new();

    for &byte in &HEADER {
        match parser.parse(byte) {
            Status::Ok => {}
            Status::ElemStart => events.push(("start", parser.name)),
            Status::ElemEnd => {
                events.push(("end", parser.name));
                match parser.kind {
                    ElementKind::UnsignedInteger => values.push(parser.value),
                    ElementKind::String => {
                        strings.push(String::from_utf8_lossy(parser.string_bytes()).into_owned());
                    }
                    _ => {}
                }
            }
            Status::Error => panic!("decode error"),
        }
    }
    loop {
        match parser.eof() {
            Status::Ok => break,
            Status::ElemEnd => {
                events.push(("end", parser.name));
                match parser.kind {
                    ElementKind::UnsignedInteger => values.push(parser.value),
                    ElementKind::String => {
                        strings.push(String::from_utf8_lossy(parser.string_bytes()).into_owned());
                    }
                    _ => {}
                }
            }
            Status::ElemStart => events.push(("start", parser.name)),
            Status::Error => panic!("eof error"),
        }
    }

    assert_eq!(
        events,
        vec![
            ("start", "EBML"),
            ("start", "EBMLVersion"),
            ("end", "EBMLVersion"),
            ("start", "DocType"),
            ("end", "DocType"),
            ("end", "EBML"),
        ]
    );
    assert_eq!(values, vec![1]);
    assert_eq!(strings, vec!["matroska".to_string()]);
    assert_eq!(parser.depth, 0);
}

#[test]
fn events_balance_and_nest() {
    let mut parser = Parser::new();
    let events = drive(&mut parser, &HEADER);

    let mut stack: Vec<(&str, usize)> = Vec::new();
    for ev in &events {
        match ev.status {
            Status::ElemStart => {
                if let Some((_, parent_depth)) = stack.last() {
                    assert_eq!(parent_depth + 1, ev.depth);
                }
                stack.push((ev.name, ev.depth));
            }
            Status::ElemEnd => {
                let top = stack.pop().expect("end without start");
                assert_eq!(top, (ev.name, ev.depth));
            }
            _ => unreachable!(),
        }
    }
    assert!(stack.is_empty());
}

#[test]
fn two_instances_fed_the_same_bytes_agree() {
    let mut a = Parser::new();
    let mut b = Parser::new();
    let events_a = drive(&mut a, &HEADER);
    let events_b = drive(&mut b, &HEADER);
    assert_eq!(events_a, events_b);
    assert_eq!(a.depth, b.depth);
    assert_eq!(a.value, b.value);
    assert_eq!(a.string_bytes(), b.string_bytes());
}

#[test]
fn reset_allows_reuse() {
    let mut parser = Parser::new();
    let first = drive(&mut parser, &HEADER);
    parser.reset();
    let second = drive(&mut parser, &HEADER);
    assert_eq!(first, second);
}

#[test]
fn garbage_after_a_document_is_rejected() {
    let mut parser = Parser::new();
    for &byte in &HEADER {
        assert_ne!(parser.parse(byte), Status::Error);
    }
    // a sibling element with an undefined ID: its body byte cannot be typed
    assert_ne!(parser.parse(0x80), Status::Error); // taken as the next ID
    assert_ne!(parser.parse(0x81), Status::Error);
    assert_eq!(parser.parse(0x00), Status::Error);
}
