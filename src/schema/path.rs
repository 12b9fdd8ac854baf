use nom::branch::alt;
use nom::bytes::complete::{tag, take_while1};
use nom::character::complete::char as nom_char;
use nom::combinator::{map, map_res, opt};
use nom::multi::many1;
use nom::sequence::{delimited, pair, preceded, separated_pair};
use nom::IResult;

use crate::error::{Result, SchemaError};
use crate::schema::model::{ElementPath, PathSegment, MAX_PATH_DEPTH};

/// Parse a backslash-delimited element path.
///
/// `+Name` marks a recursive segment. `(min-max\)` is a global placeholder;
/// either bound may be omitted, and a name may follow it within the same
/// backslash token (`\(1-\)CRC-32` has depth 2). `\` alone is the root.
pub fn parse_path(input: &str) -> Result<ElementPath> {
    if input == "\\" {
        return Ok(ElementPath::root());
    }
    match path_expr(input) {
        Ok(("", segments)) => {
            if segments.len() > MAX_PATH_DEPTH {
                return Err(SchemaError::PathTooDeep {
                    text: input.to_string(),
                });
            }
            ElementPath::new(segments)
        }
        _ => Err(SchemaError::PathSyntax {
            text: input.to_string(),
        }),
    }
}

fn path_expr(input: &str) -> IResult<&str, Vec<PathSegment>> {
    map(many1(preceded(nom_char('\\'), token)), |tokens| {
        tokens.into_iter().flatten().collect()
    })(input)
}

// One backslash token: a global placeholder optionally followed by a name
// (two segments), or a bare name (one segment).
fn token(input: &str) -> IResult<&str, Vec<PathSegment>> {
    alt((
        map(pair(global, opt(named)), |(placeholder, name)| {
            let mut segments = vec![placeholder];
            segments.extend(name);
            segments
        }),
        map(named, |segment| vec![segment]),
    ))(input)
}

fn named(input: &str) -> IResult<&str, PathSegment> {
    map(
        pair(opt(nom_char('+')), take_while1(is_name_char)),
        |(plus, name): (Option<char>, &str)| PathSegment::Named {
            name: name.to_string(),
            recursive: plus.is_some(),
        },
    )(input)
}

fn global(input: &str) -> IResult<&str, PathSegment> {
    map(
        delimited(
            nom_char('('),
            separated_pair(opt(uint), nom_char('-'), opt(uint)),
            tag("\\)"),
        ),
        |(min, max)| PathSegment::Global {
            min: min.unwrap_or(0),
            max: max.unwrap_or(u64::MAX),
        },
    )(input)
}

fn uint(input: &str) -> IResult<&str, u64> {
    map_res(take_while1(|c: char| c.is_ascii_digit()), str::parse)(input)
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '.'
}
