//! Course file reader, the inverse of [`crate::export::mrc`].
//!
//! Breakpoints are read in pairs: each pair becomes one interval. Pairs must
//! chain, i.e. each interval starts at the minute its predecessor ended, and
//! the first one starts at 0. Elapsed seconds are recovered by rounding
//! `minutes * 60`; two-decimal minutes are precise to 0.3s, so whole-second
//! durations survive the round trip exactly.

use crate::export::mrc::{
    CourseHeader, COLUMNS, DATA_END, DATA_START, HEADER_END, HEADER_START, UNITS, VERSION,
};
use crate::models::{Interval, ShapeLimits, Workout};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use std::str::FromStr;
use thiserror::Error;

/// Why a course file was rejected. Every variant names the 1-based line
/// number of the first offending line.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MrcParseError {
    #[error("line {line}: expected `{expected}`, found `{found}`")]
    UnexpectedLine {
        line: usize,
        expected: String,
        found: String,
    },

    #[error("line {line}: unexpected end of file, expected `{expected}`")]
    UnexpectedEof { line: usize, expected: String },

    #[error("line {line}: malformed breakpoint `{content}`: {reason}")]
    InvalidBreakpoint {
        line: usize,
        content: String,
        reason: String,
    },

    #[error("line {line}: breakpoint at {found} minutes does not continue from {expected} minutes")]
    Discontinuity {
        line: usize,
        expected: Decimal,
        found: Decimal,
    },

    #[error("line {line}: start breakpoint has no matching end breakpoint")]
    UnpairedBreakpoint { line: usize },

    #[error("line {line}: {reason}")]
    OutOfLimits { line: usize, reason: String },

    #[error("line {line}: unexpected content after `{}`", DATA_END)]
    TrailingContent { line: usize },
}

impl MrcParseError {
    /// Line number of the first offending line
    pub fn line(&self) -> usize {
        match self {
            MrcParseError::UnexpectedLine { line, .. }
            | MrcParseError::UnexpectedEof { line, .. }
            | MrcParseError::InvalidBreakpoint { line, .. }
            | MrcParseError::Discontinuity { line, .. }
            | MrcParseError::UnpairedBreakpoint { line }
            | MrcParseError::OutOfLimits { line, .. }
            | MrcParseError::TrailingContent { line } => *line,
        }
    }
}

/// A parsed course file
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCourse {
    pub header: CourseHeader,
    pub workout: Workout,
}

/// One `(minutes, power)` row of the data section
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    pub line: usize,
    pub minutes: Decimal,
    pub power: u16,
}

impl Breakpoint {
    /// Elapsed seconds, rounded to the nearest whole second
    pub fn elapsed_seconds(&self) -> Option<u64> {
        self.minutes
            .checked_mul(dec!(60))?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u64()
    }
}

/// Line cursor that tracks 1-based positions and ignores trailing whitespace
struct Cursor<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    line: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Cursor {
            lines: text.lines().enumerate(),
            line: 0,
        }
    }

    fn next(&mut self) -> Option<(usize, &'a str)> {
        let (index, content) = self.lines.next()?;
        self.line = index + 1;
        Some((self.line, content.trim_end()))
    }

    fn expect_next(&mut self, expected: &str) -> Result<(usize, &'a str), MrcParseError> {
        self.next().ok_or_else(|| MrcParseError::UnexpectedEof {
            line: self.line + 1,
            expected: expected.to_string(),
        })
    }

    fn expect_exact(&mut self, expected: &str) -> Result<(), MrcParseError> {
        let (line, content) = self.expect_next(expected)?;
        if content.trim_start() == expected {
            Ok(())
        } else {
            Err(unexpected(line, expected, content))
        }
    }

    /// Reads a `KEY = value` line and returns the trimmed value
    fn expect_field(&mut self, key: &str) -> Result<&'a str, MrcParseError> {
        let expected = format!("{} = ...", key);
        let (line, content) = self.expect_next(&expected)?;
        match content.split_once('=') {
            Some((name, value)) if name.trim() == key => Ok(value.trim()),
            _ => Err(unexpected(line, &expected, content)),
        }
    }
}

fn unexpected(line: usize, expected: &str, found: &str) -> MrcParseError {
    MrcParseError::UnexpectedLine {
        line,
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

/// Parse course file text into a workout whose intervals all satisfy `limits`
pub fn parse_mrc(text: &str, limits: &ShapeLimits) -> Result<ParsedCourse, MrcParseError> {
    let mut cursor = Cursor::new(text);

    // skip leading blank lines
    let (line, first) = loop {
        let (line, content) = cursor.expect_next(HEADER_START)?;
        if !content.trim().is_empty() {
            break (line, content.trim_start());
        }
    };
    if first != HEADER_START {
        return Err(unexpected(line, HEADER_START, first));
    }

    let header = parse_header(&mut cursor)?;
    let breakpoints = parse_data(&mut cursor)?;

    while let Some((line, content)) = cursor.next() {
        if !content.trim().is_empty() {
            return Err(MrcParseError::TrailingContent { line });
        }
    }

    let workout = build_workout(&breakpoints, limits)?;
    tracing::info!(
        file_name = %header.file_name,
        intervals = workout.len(),
        "course file parsed"
    );

    Ok(ParsedCourse { header, workout })
}

fn parse_header(cursor: &mut Cursor<'_>) -> Result<CourseHeader, MrcParseError> {
    let line = cursor.line + 1;
    let version = cursor.expect_field("VERSION")?;
    if version != VERSION {
        return Err(unexpected(line, &format!("VERSION = {}", VERSION), &format!("VERSION = {}", version)));
    }

    let line = cursor.line + 1;
    let units = cursor.expect_field("UNITS")?;
    if units != UNITS {
        return Err(unexpected(line, &format!("UNITS = {}", UNITS), &format!("UNITS = {}", units)));
    }

    let description = cursor.expect_field("DESCRIPTION")?.to_string();
    let file_name = cursor.expect_field("FILE NAME")?.to_string();

    let (line, columns) = cursor.expect_next(COLUMNS)?;
    if columns.split_whitespace().ne(COLUMNS.split_whitespace()) {
        return Err(unexpected(line, COLUMNS, columns));
    }

    cursor.expect_exact(HEADER_END)?;
    cursor.expect_exact(DATA_START)?;

    Ok(CourseHeader {
        description,
        file_name,
    })
}

fn parse_data(cursor: &mut Cursor<'_>) -> Result<Vec<Breakpoint>, MrcParseError> {
    let mut breakpoints = Vec::new();

    loop {
        let (line, content) = cursor.expect_next(DATA_END)?;
        let content = content.trim_start();

        if content.is_empty() {
            continue;
        }
        if content == DATA_END {
            return Ok(breakpoints);
        }

        breakpoints.push(parse_breakpoint(line, content)?);
    }
}

fn parse_breakpoint(line: usize, content: &str) -> Result<Breakpoint, MrcParseError> {
    let invalid = |reason: String| MrcParseError::InvalidBreakpoint {
        line,
        content: content.to_string(),
        reason,
    };

    let fields: Vec<&str> = content.split_whitespace().collect();
    let [minutes, power] = fields.as_slice() else {
        return Err(invalid(format!("expected 2 fields, found {}", fields.len())));
    };

    let minutes = Decimal::from_str(minutes)
        .map_err(|e| invalid(format!("minutes `{}`: {}", minutes, e)))?;
    if minutes.is_sign_negative() {
        return Err(invalid("minutes must not be negative".to_string()));
    }
    let power = power
        .parse::<u16>()
        .map_err(|e| invalid(format!("power `{}`: {}", power, e)))?;

    Ok(Breakpoint {
        line,
        minutes,
        power,
    })
}

fn build_workout(breakpoints: &[Breakpoint], limits: &ShapeLimits) -> Result<Workout, MrcParseError> {
    let mut workout = Workout::new();
    let mut previous_end = Decimal::ZERO;

    for pair in breakpoints.chunks(2) {
        let [start, end] = pair else {
            return Err(MrcParseError::UnpairedBreakpoint { line: pair[0].line });
        };

        if start.minutes != previous_end {
            return Err(MrcParseError::Discontinuity {
                line: start.line,
                expected: previous_end,
                found: start.minutes,
            });
        }

        let out_of_range = |line: usize, reason: String| MrcParseError::OutOfLimits { line, reason };
        let start_seconds = start
            .elapsed_seconds()
            .ok_or_else(|| out_of_range(start.line, format!("{} minutes is out of range", start.minutes)))?;
        let end_seconds = end
            .elapsed_seconds()
            .ok_or_else(|| out_of_range(end.line, format!("{} minutes is out of range", end.minutes)))?;

        if end_seconds < start_seconds {
            return Err(out_of_range(
                end.line,
                format!("interval ends at {} minutes before it starts at {}", end.minutes, start.minutes),
            ));
        }

        let duration = end_seconds - start_seconds;
        if duration < u64::from(limits.min_duration) {
            return Err(out_of_range(
                end.line,
                format!("interval lasts {}s, minimum is {}s", duration, limits.min_duration),
            ));
        }
        let duration = u32::try_from(duration).map_err(|_| {
            out_of_range(end.line, format!("interval lasts {}s, longer than a single interval can hold", duration))
        })?;

        for point in [start, end] {
            if point.power < limits.min_power || point.power > limits.max_power {
                return Err(out_of_range(
                    point.line,
                    format!(
                        "power {}% outside [{}, {}]",
                        point.power, limits.min_power, limits.max_power
                    ),
                ));
            }
        }

        workout = workout.append(Interval::with_shape(start.power, end.power, duration, limits));
        previous_end = end.minutes;
    }

    Ok(workout)
}
