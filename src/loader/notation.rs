//! Die-face notation parsing
//!
//! Unit catalogs list faces as compact strings like "Melee", "Missile:2",
//! "ID", or "SAI:Fly". This module parses them into `DieFace` values.

use crate::core::{DieFace, ResultType, SaiKind};
use crate::{EngineError, Result};
use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{char, digit1},
    combinator::{all_consuming, map, map_res, opt},
    sequence::preceded,
    IResult,
};

fn result_type(input: &str) -> IResult<&str, ResultType> {
    alt((
        map(tag_no_case("maneuver"), |_| ResultType::Maneuver),
        map(tag_no_case("melee"), |_| ResultType::Melee),
        map(tag_no_case("missile"), |_| ResultType::Missile),
        map(tag_no_case("magic"), |_| ResultType::Magic),
        map(tag_no_case("save"), |_| ResultType::Save),
    ))(input)
}

fn sai_kind(input: &str) -> IResult<&str, SaiKind> {
    alt((
        map(tag_no_case("bash"), |_| SaiKind::Bash),
        map(tag_no_case("bullseye"), |_| SaiKind::Bullseye),
        map(tag_no_case("cantrip"), |_| SaiKind::Cantrip),
        map(tag_no_case("counter"), |_| SaiKind::Counter),
        map(tag_no_case("fly"), |_| SaiKind::Fly),
        map(tag_no_case("smite"), |_| SaiKind::Smite),
    ))(input)
}

fn count_suffix(input: &str) -> IResult<&str, u8> {
    map(
        opt(preceded(char(':'), map_res(digit1, str::parse::<u8>))),
        |n| n.unwrap_or(1),
    )(input)
}

fn face(input: &str) -> IResult<&str, DieFace> {
    alt((
        map(tag_no_case("id"), |_| DieFace::Id),
        map(
            preceded(
                tag_no_case("sai:"),
                nom::sequence::pair(sai_kind, count_suffix),
            ),
            |(kind, count)| DieFace::sai(kind, count),
        ),
        map(
            nom::sequence::pair(result_type, count_suffix),
            |(result, count)| DieFace::icon(result, count),
        ),
    ))(input)
}

/// Parse a single face notation string
pub fn parse_face(input: &str) -> Result<DieFace> {
    let trimmed = input.trim();
    all_consuming(face)(trimmed)
        .map(|(_, f)| f)
        .map_err(|_| EngineError::ParseError(format!("invalid face notation: '{input}'")))
}

/// Parse a full face list
pub fn parse_faces(inputs: &[String]) -> Result<Vec<DieFace>> {
    inputs.iter().map(|s| parse_face(s)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_icons() {
        assert_eq!(parse_face("Melee").unwrap(), DieFace::icon(ResultType::Melee, 1));
        assert_eq!(parse_face("missile:2").unwrap(), DieFace::icon(ResultType::Missile, 2));
        assert_eq!(parse_face(" Save ").unwrap(), DieFace::icon(ResultType::Save, 1));
    }

    #[test]
    fn test_parse_id_and_sai() {
        assert_eq!(parse_face("ID").unwrap(), DieFace::Id);
        assert_eq!(parse_face("SAI:Fly").unwrap(), DieFace::sai(SaiKind::Fly, 1));
        assert_eq!(parse_face("sai:smite:2").unwrap(), DieFace::sai(SaiKind::Smite, 2));
    }

    #[test]
    fn test_reject_garbage() {
        assert!(parse_face("Melee:x").is_err());
        assert!(parse_face("Sword").is_err());
        assert!(parse_face("SAI:Unknown").is_err());
        assert!(parse_face("Melee:2 extra").is_err());
    }
}
