use nom::branch::alt;
use nom::bytes::complete::{is_not, tag};
use nom::character::complete::{char, digit1, one_of};
use nom::combinator::{all_consuming, map, map_res, opt, rest, value};
use nom::multi::many0;
use nom::number::complete::float;
use nom::sequence::{pair, preceded};
use nom::IResult;

use crate::types::GenotypeAllele;

pub(crate) const MISSING: &str = ".";

/// `##fileformat=<text>`, yielding the text.
pub(crate) fn fileformat(input: &str) -> IResult<&str, &str> {
    preceded(tag("##fileformat="), rest)(input)
}

/// `##key=value` or a bare `##text` line.
pub(crate) fn meta_line(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, key) = preceded(tag("##"), is_not("="))(input)?;
    let (input, value) = opt(preceded(char('='), rest))(input)?;
    Ok((input, (key, value.unwrap_or(""))))
}

fn parse_u32(input: &str) -> IResult<&str, u32> {
    map_res(digit1, str::parse::<u32>)(input)
}

/// A whole field holding an unsigned integer.
pub(crate) fn unsigned(input: &str) -> Option<u32> {
    all_consuming(parse_u32)(input).ok().map(|(_, n)| n)
}

fn parse_f32(input: &str) -> IResult<&str, f32> {
    float(input)
}

/// QUAL: `.` or a finite float.
pub(crate) fn quality(input: &str) -> Option<Option<f32>> {
    if input == MISSING {
        return Some(None);
    }
    match all_consuming(parse_f32)(input) {
        Ok((_, q)) if q.is_finite() => Some(Some(q)),
        _ => None,
    }
}

fn allele_index(input: &str) -> IResult<&str, Option<u32>> {
    alt((value(None, char('.')), map(parse_u32, Some)))(input)
}

/// GT subfield, e.g. `0/1`, `1|2`, `.`, `./.`.
///
/// An allele is phased when the separator in front of it is `|`; the first
/// allele follows the first separator.
pub(crate) fn genotype(input: &str) -> IResult<&str, Vec<GenotypeAllele>> {
    let (input, first) = allele_index(input)?;
    let (input, others) = all_consuming(many0(pair(one_of("/|"), allele_index)))(input)?;

    let first_phased = others.first().map_or(false, |&(sep, _)| sep == '|');
    let mut alleles = Vec::with_capacity(others.len() + 1);
    alleles.push(GenotypeAllele::new(first, first_phased));
    alleles.extend(
        others
            .into_iter()
            .map(|(sep, index)| GenotypeAllele::new(index, sep == '|')),
    );
    Ok((input, alleles))
}
