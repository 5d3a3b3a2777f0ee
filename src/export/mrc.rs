//! Course file writer.
//!
//! The file is a breakpoint table of elapsed minutes against percent of
//! threshold power. Every interval contributes its start and end breakpoint,
//! even when a neighbour shares the boundary value; a trainer interpolates
//! linearly between consecutive lines.

use crate::models::Workout;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

pub const HEADER_START: &str = "[COURSE HEADER]";
pub const HEADER_END: &str = "[END COURSE HEADER]";
pub const DATA_START: &str = "[COURSE DATA]";
pub const DATA_END: &str = "[END COURSE DATA]";
pub const VERSION: &str = "2";
pub const UNITS: &str = "ENGLISH";
pub const COLUMNS: &str = "MINUTES PERCENT";

/// Free-text header fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseHeader {
    pub description: String,
    pub file_name: String,
}

impl CourseHeader {
    pub fn new(file_name: impl Into<String>) -> Self {
        CourseHeader {
            description: String::new(),
            file_name: file_name.into(),
        }
    }
}

impl Default for CourseHeader {
    fn default() -> Self {
        CourseHeader::new("intervals")
    }
}

/// Elapsed seconds as minutes with exactly two decimals
pub fn format_minutes(elapsed_seconds: u64) -> String {
    let mut minutes = (Decimal::from(elapsed_seconds) / dec!(60))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    minutes.rescale(2);
    minutes.to_string()
}

/// Header values must fit on one line: line breaks become single spaces
/// and surrounding whitespace is dropped, matching what the parser reads back
pub fn header_value(value: &str) -> String {
    value
        .lines()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Emits a `<label> = <value>` line, dropping the space when the value is empty
fn header_field(out: &mut String, label: &str, value: &str) {
    let value = header_value(value);
    if value.is_empty() {
        let _ = writeln!(out, "{} =", label);
    } else {
        let _ = writeln!(out, "{} = {}", label, value);
    }
}

/// Serialize the workout as a course file
pub fn export_mrc(workout: &Workout, header: &CourseHeader) -> String {
    let mut out = String::new();

    out.push_str(HEADER_START);
    out.push('\n');
    header_field(&mut out, "VERSION", VERSION);
    header_field(&mut out, "UNITS", UNITS);
    header_field(&mut out, "DESCRIPTION", &header.description);
    header_field(&mut out, "FILE NAME", &header.file_name);
    out.push_str(COLUMNS);
    out.push('\n');
    out.push_str(HEADER_END);
    out.push('\n');
    out.push_str(DATA_START);
    out.push('\n');

    let mut elapsed: u64 = 0;
    for interval in workout {
        let _ = writeln!(out, "{}\t{}", format_minutes(elapsed), interval.start_power);
        elapsed += u64::from(interval.duration);
        let _ = writeln!(out, "{}\t{}", format_minutes(elapsed), interval.end_power);
    }

    out.push_str(DATA_END);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Interval, ShapeLimits};

    fn data_lines(text: &str) -> Vec<&str> {
        text.lines()
            .skip_while(|line| *line != DATA_START)
            .skip(1)
            .take_while(|line| *line != DATA_END)
            .collect()
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(0), "0.00");
        assert_eq!(format_minutes(60), "1.00");
        assert_eq!(format_minutes(90), "1.50");
        // 1/60 min = 0.01666.. -> 0.02
        assert_eq!(format_minutes(1), "0.02");
        assert_eq!(format_minutes(301), "5.02");
        assert_eq!(format_minutes(7200), "120.00");
    }

    #[test]
    fn test_two_sequential_intervals() {
        let limits = ShapeLimits::default();
        let workout = Workout::new()
            .append(Interval::with_shape(100, 100, 60, &limits))
            .append(Interval::with_shape(150, 150, 60, &limits));

        let text = export_mrc(&workout, &CourseHeader::default());
        assert_eq!(
            data_lines(&text),
            vec!["0.00\t100", "1.00\t100", "1.00\t150", "2.00\t150"]
        );
    }

    #[test]
    fn test_full_document_layout() {
        let workout = Workout::new().append(Interval::with_shape(
            80,
            120,
            90,
            &ShapeLimits::default(),
        ));

        let text = export_mrc(&workout, &CourseHeader::new("teste"));
        let expected = "[COURSE HEADER]\n\
                        VERSION = 2\n\
                        UNITS = ENGLISH\n\
                        DESCRIPTION =\n\
                        FILE NAME = teste\n\
                        MINUTES PERCENT\n\
                        [END COURSE HEADER]\n\
                        [COURSE DATA]\n\
                        0.00\t80\n\
                        1.50\t120\n\
                        [END COURSE DATA]";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_description_is_written() {
        let header = CourseHeader {
            description: "Sweet spot blocks".to_string(),
            file_name: "ss".to_string(),
        };
        let text = export_mrc(&Workout::new(), &header);
        assert!(text.contains("DESCRIPTION = Sweet spot blocks\n"));
        assert!(data_lines(&text).is_empty());
    }

    #[test]
    fn test_header_line_breaks_are_collapsed() {
        assert_eq!(header_value("line one\nline two"), "line one line two");
        assert_eq!(header_value("a\r\n\r\nb\r"), "a b");
        assert_eq!(header_value("  \n "), "");

        let header = CourseHeader {
            description: "line one\nline two".to_string(),
            file_name: "over\r\nunders".to_string(),
        };
        let text = export_mrc(&Workout::new(), &header);
        assert!(text.contains("DESCRIPTION = line one line two\nFILE NAME = over unders\n"));
        assert_eq!(text.lines().count(), 9);
    }
}
