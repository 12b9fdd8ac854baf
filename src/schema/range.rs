use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{char as nom_char, multispace0};
use nom::combinator::{map, opt, value};
use nom::error::{Error, ErrorKind};
use nom::sequence::{delimited, pair, preceded, separated_pair};
use nom::IResult;

use crate::schema::model::{Range, RangeScalar};

/// Parse the textual `range` attribute of an EBML schema.
///
/// Accepted forms: `N` (exact), `not N`, `N-M` (inclusive), `>N`, `>=N`,
/// `<N`, `<=N`, and two comma-joined relational terms forming a two-sided
/// bound. Anything else (including trailing text) is a best-effort miss and
/// yields `Range::None` rather than an error.
pub fn parse_range(input: &str) -> Range {
    match range_expr(input) {
        Ok((rest, range)) if rest.trim().is_empty() => range,
        _ => Range::None,
    }
}

fn range_expr(input: &str) -> IResult<&str, Range> {
    alt((excluded, between, relationals, exact))(input)
}

// Surrounding-whitespace wrapper, applied to every token parser
fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn excluded(input: &str) -> IResult<&str, Range> {
    // "not 0" and "not0" are both accepted
    map(preceded(ws(tag("not")), number), Range::Excluded)(input)
}

fn between(input: &str) -> IResult<&str, Range> {
    map(
        separated_pair(ws(number), nom_char('-'), ws(number)),
        |(lo, hi)| Range::Between {
            lo,
            lo_inclusive: true,
            hi,
            hi_inclusive: true,
        },
    )(input)
}

fn exact(input: &str) -> IResult<&str, Range> {
    map(ws(number), Range::Exact)(input)
}

#[derive(Clone, Copy)]
enum RelOp {
    Lower { inclusive: bool },
    Upper { inclusive: bool },
}

fn rel_op(input: &str) -> IResult<&str, RelOp> {
    alt((
        value(RelOp::Lower { inclusive: true }, tag(">=")),
        value(RelOp::Lower { inclusive: false }, tag(">")),
        value(RelOp::Upper { inclusive: true }, tag("<=")),
        value(RelOp::Upper { inclusive: false }, tag("<")),
    ))(input)
}

fn relational(input: &str) -> IResult<&str, (RelOp, RangeScalar)> {
    pair(ws(rel_op), ws(number))(input)
}

fn relationals(input: &str) -> IResult<&str, Range> {
    let (rest, first) = relational(input)?;
    let (rest, second) = opt(preceded(nom_char(','), relational))(rest)?;
    let range = match second {
        None => match first.0 {
            RelOp::Lower { inclusive } => Range::Lower {
                bound: first.1,
                inclusive,
            },
            RelOp::Upper { inclusive } => Range::Upper {
                bound: first.1,
                inclusive,
            },
        },
        Some(second) => match (first.0, second.0) {
            (RelOp::Lower { inclusive: lo_inclusive }, RelOp::Upper { inclusive: hi_inclusive }) => {
                Range::Between {
                    lo: first.1,
                    lo_inclusive,
                    hi: second.1,
                    hi_inclusive,
                }
            }
            (RelOp::Upper { inclusive: hi_inclusive }, RelOp::Lower { inclusive: lo_inclusive }) => {
                Range::Between {
                    lo: second.1,
                    lo_inclusive,
                    hi: first.1,
                    hi_inclusive,
                }
            }
            // two bounds in the same direction are not a range
            _ => return Err(nom::Err::Error(Error::new(input, ErrorKind::Verify))),
        },
    };
    Ok((rest, range))
}

/// Number token. Both an unsigned and a float reading are attempted, the
/// one consuming more characters wins, and a tie is unsigned. This mirrors
/// the strtoul/strtod pairing EBML schema ranges were written against.
fn number(input: &str) -> IResult<&str, RangeScalar> {
    match scan_number(input) {
        Some((scalar, consumed)) => Ok((&input[consumed..], scalar)),
        None => Err(nom::Err::Error(Error::new(input, ErrorKind::Float))),
    }
}

fn scan_number(input: &str) -> Option<(RangeScalar, usize)> {
    match (scan_unsigned(input), scan_float(input)) {
        (Some((u, ul)), Some((_, fl))) if ul >= fl => Some((RangeScalar::Unsigned(u), ul)),
        (_, Some((f, fl))) => Some((RangeScalar::Float(f), fl)),
        (Some((u, ul)), None) => Some((RangeScalar::Unsigned(u), ul)),
        (None, None) => None,
    }
}

fn scan_unsigned(input: &str) -> Option<(u64, usize)> {
    let bytes = input.as_bytes();
    let mut i = 0;
    if bytes.first() == Some(&b'+') {
        i += 1;
    }
    let start = i;
    let mut magnitude: u64 = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        magnitude = magnitude
            .saturating_mul(10)
            .saturating_add(u64::from(bytes[i] - b'0'));
        i += 1;
    }
    (i > start).then_some((magnitude, i))
}

fn scan_float(input: &str) -> Option<(f64, usize)> {
    let bytes = input.as_bytes();
    let mut i = 0;
    let mut negative = false;
    match bytes.first() {
        Some(b'+') => i += 1,
        Some(b'-') => {
            negative = true;
            i += 1;
        }
        _ => {}
    }
    let rest = &input[i..];
    let (magnitude, consumed) = if rest.starts_with("0x") || rest.starts_with("0X") {
        scan_hex_float(rest)?
    } else {
        scan_dec_float(rest)?
    };
    Some((if negative { -magnitude } else { magnitude }, i + consumed))
}

/// C99 hex float: `0x` hex-digits [`.` hex-digits] [`p` [sign] digits].
/// The binary exponent is optional, as in strtod.
fn scan_hex_float(input: &str) -> Option<(f64, usize)> {
    let bytes = input.as_bytes();
    let mut i = 2;
    let mut digits = 0;
    let mut mantissa = 0.0f64;
    while i < bytes.len() && bytes[i].is_ascii_hexdigit() {
        mantissa = mantissa * 16.0 + f64::from(hex_digit(bytes[i]));
        digits += 1;
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let mut scale = 1.0 / 16.0;
        while i < bytes.len() && bytes[i].is_ascii_hexdigit() {
            mantissa += f64::from(hex_digit(bytes[i])) * scale;
            scale /= 16.0;
            digits += 1;
            i += 1;
        }
    }
    if digits == 0 {
        return None;
    }
    if i < bytes.len() && (bytes[i] == b'p' || bytes[i] == b'P') {
        let mut j = i + 1;
        let mut exp_negative = false;
        match bytes.get(j) {
            Some(b'+') => j += 1,
            Some(b'-') => {
                exp_negative = true;
                j += 1;
            }
            _ => {}
        }
        let exp_start = j;
        let mut exp: i32 = 0;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            exp = exp
                .saturating_mul(10)
                .saturating_add(i32::from(bytes[j] - b'0'));
            j += 1;
        }
        if j > exp_start {
            mantissa *= 2f64.powi(if exp_negative { -exp } else { exp });
            i = j;
        }
        // a bare 'p' with no digits is not part of the number
    }
    Some((mantissa, i))
}

fn scan_dec_float(input: &str) -> Option<(f64, usize)> {
    let bytes = input.as_bytes();
    let mut i = 0;
    let mut digits = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        digits += 1;
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            digits += 1;
            i += 1;
        }
    }
    if digits == 0 {
        return None;
    }
    let mut end = i;
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if let Some(b'+' | b'-') = bytes.get(j) {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            end = j;
        }
    }
    let magnitude: f64 = input[..end].parse().ok()?;
    Some((magnitude, end))
}

fn hex_digit(byte: u8) -> u8 {
    match byte {
        b'0'..=b'9' => byte - b'0',
        b'a'..=b'f' => byte - b'a' + 10,
        _ => byte - b'A' + 10,
    }
}
