// Colour parser: #rgb, #rrggbb, rgb(r, g, b) and a handful of names

use super::lexer::{identifier, ws};
use crate::error::{ChartError, Result};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while_m_n},
    character::complete::{char, u8 as dec_u8},
    combinator::{all_consuming, map_opt, recognize},
    error::{Error, ErrorKind},
    multi::separated_list1,
    sequence::{delimited, preceded},
    IResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

const NAMED_COLORS: &[(&str, Rgb)] = &[
    ("black", Rgb::new(0, 0, 0)),
    ("white", Rgb::new(255, 255, 255)),
    ("red", Rgb::new(255, 0, 0)),
    ("green", Rgb::new(0, 128, 0)),
    ("blue", Rgb::new(0, 0, 255)),
    ("yellow", Rgb::new(255, 255, 0)),
    ("cyan", Rgb::new(0, 255, 255)),
    ("magenta", Rgb::new(255, 0, 255)),
    ("orange", Rgb::new(255, 165, 0)),
    ("purple", Rgb::new(128, 0, 128)),
    ("gray", Rgb::new(128, 128, 128)),
    ("grey", Rgb::new(128, 128, 128)),
    ("brown", Rgb::new(165, 42, 42)),
    ("pink", Rgb::new(255, 192, 203)),
    ("teal", Rgb::new(0, 128, 128)),
    ("navy", Rgb::new(0, 0, 128)),
    ("steelblue", Rgb::new(70, 130, 180)),
];

fn hex_pair(s: &str) -> Option<u8> {
    u8::from_str_radix(s, 16).ok()
}

/// Parse #rgb or #rrggbb
fn hex_color(input: &str) -> IResult<&str, Rgb> {
    let (rest, digits) = preceded(
        char('#'),
        take_while_m_n(3, 6, |c: char| c.is_ascii_hexdigit()),
    )(input)?;

    let rgb = match digits.len() {
        3 => {
            let expand = |i: usize| hex_pair(&digits[i..i + 1].repeat(2));
            expand(0)
                .zip(expand(1))
                .zip(expand(2))
                .map(|((r, g), b)| Rgb::new(r, g, b))
        }
        6 => hex_pair(&digits[0..2])
            .zip(hex_pair(&digits[2..4]))
            .zip(hex_pair(&digits[4..6]))
            .map(|((r, g), b)| Rgb::new(r, g, b)),
        _ => None,
    };

    match rgb {
        Some(c) => Ok((rest, c)),
        None => Err(nom::Err::Error(Error::new(input, ErrorKind::HexDigit))),
    }
}

/// Parse rgb(r, g, b)
fn rgb_function(input: &str) -> IResult<&str, Rgb> {
    let (input, _) = tag("rgb")(input)?;
    let (input, _) = ws(char('('))(input)?;
    let (input, r) = ws(dec_u8)(input)?;
    let (input, _) = ws(char(','))(input)?;
    let (input, g) = ws(dec_u8)(input)?;
    let (input, _) = ws(char(','))(input)?;
    let (input, b) = ws(dec_u8)(input)?;
    let (input, _) = char(')')(input)?;
    Ok((input, Rgb::new(r, g, b)))
}

fn named_color(input: &str) -> IResult<&str, Rgb> {
    map_opt(identifier, |name: &str| {
        let lower = name.to_ascii_lowercase();
        NAMED_COLORS
            .iter()
            .find(|(n, _)| *n == lower)
            .map(|(_, c)| *c)
    })(input)
}

/// Parse one colour value (no surrounding whitespace)
pub fn color_value(input: &str) -> IResult<&str, Rgb> {
    alt((hex_color, rgb_function, named_color))(input)
}

/// Parse a comma-separated list of colours, each optionally double-quoted.
/// Yields the colour text as written.
pub fn color_list(input: &str) -> IResult<&str, Vec<&str>> {
    separated_list1(
        ws(char(',')),
        ws(alt((
            delimited(char('"'), recognize(color_value), char('"')),
            recognize(color_value),
        ))),
    )(input)
}

/// Parse a complete colour string
pub fn parse_color(input: &str) -> Option<Rgb> {
    all_consuming(ws(color_value))(input)
        .ok()
        .map(|(_, c)| c)
}

/// Parse a complete colour list such as `#f00, "steelblue", rgb(0, 128, 0)`
pub fn parse_color_list(input: &str) -> Result<Vec<String>> {
    match all_consuming(color_list)(input) {
        Ok((_, colors)) => Ok(colors.into_iter().map(String::from).collect()),
        Err(e) => Err(ChartError::InvalidConfig(format!(
            "Invalid colour list '{}': {:?}",
            input, e
        ))),
    }
}
