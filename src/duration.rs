//! Lithuanian free-text durations ("2 valandos 30 minučių") to whole minutes.
//!
//! Hours, minutes and seconds are matched in that order, each optional.
//! Decimal hours ("1,5 valandos") are converted. Seconds and fractional
//! minutes are recognised but not counted.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Returned by [`parse_minutes`] when no duration could be read.
pub const UNPARSEABLE: i64 = -1;

/// Fraction digits beyond this cannot change a whole-minute result.
const MAX_FRACTION_DIGITS: usize = 9;

static DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        (?: ([0-9]+(?:[.,][0-9]+)?) \s* val\p{L}*\.? )?
        [\s,]* (?: ir \s+ )?
        (?: ([0-9]+(?:[.,][0-9]+)?) \s* min\p{L}*\.? )?
        [\s,]* (?: ir \s+ )?
        (?: ([0-9]+(?:[.,][0-9]+)?) \s* sek\p{L}*\.? )?",
    )
    .expect("Invalid duration regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedDuration {
    Minutes(u32),
    Unparseable(String),
}

impl ParsedDuration {
    pub fn minutes(&self) -> Option<u32> {
        match self {
            ParsedDuration::Minutes(minutes) => Some(*minutes),
            ParsedDuration::Unparseable(_) => None,
        }
    }
}

pub fn parse_duration(text: &str) -> ParsedDuration {
    let found = DURATION
        .captures_iter(text)
        .find(|caps| (1..=3).any(|i| caps.get(i).is_some()));

    match found.and_then(|caps| to_minutes(text, &caps)) {
        Some(minutes) => ParsedDuration::Minutes(minutes),
        None => ParsedDuration::Unparseable(text.to_string()),
    }
}

/// Minutes in `text`, or [`UNPARSEABLE`].
pub fn parse_minutes(text: &str) -> i64 {
    parse_duration(text)
        .minutes()
        .map(i64::from)
        .unwrap_or(UNPARSEABLE)
}

/// A decimal amount split into whole units and a `numerator / denominator` fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Amount {
    whole: u32,
    numerator: u64,
    denominator: u64,
}

impl Amount {
    const ZERO: Amount = Amount {
        whole: 0,
        numerator: 0,
        denominator: 1,
    };

    fn parse(raw: &str) -> Option<Amount> {
        let (whole, fraction) = match raw.find(['.', ',']) {
            Some(at) => (&raw[..at], &raw[at + 1..]),
            None => (raw, ""),
        };
        let fraction = &fraction[..fraction.len().min(MAX_FRACTION_DIGITS)];
        let numerator = if fraction.is_empty() {
            0
        } else {
            fraction.parse().ok()?
        };
        Some(Amount {
            whole: whole.parse().ok()?,
            numerator,
            denominator: 10u64.pow(fraction.len() as u32),
        })
    }

    fn as_minutes_from_hours(&self) -> Option<u32> {
        let fraction = u32::try_from(self.numerator * 60 / self.denominator).ok()?;
        self.whole.checked_mul(60)?.checked_add(fraction)
    }
}

fn to_minutes(text: &str, caps: &Captures<'_>) -> Option<u32> {
    let first = (1..=3).find_map(|i| caps.get(i))?;
    // A number glued to an earlier digit or separator (".5 val") is a fragment.
    if text[..first.start()]
        .chars()
        .next_back()
        .is_some_and(|c| c.is_ascii_digit() || c == '.' || c == ',')
    {
        return None;
    }

    let amount = |i: usize| match caps.get(i) {
        Some(m) => Amount::parse(m.as_str()),
        None => Some(Amount::ZERO),
    };
    let hours = amount(1)?;
    let minutes = amount(2)?;
    amount(3)?;
    hours.as_minutes_from_hours()?.checked_add(minutes.whole)
}
