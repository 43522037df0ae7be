use anyhow::Result;
use chrono::NaiveTime;

/// Every way a time of day may be written when filtering.
pub const TIME_FORMATS: [&str; 8] = [
    "%H:%M",
    "%H%M",
    "%I:%M%p",
    "%I%M%p",
    "%H:%M:%S",
    "%H%M%S",
    "%I:%M:%S%p",
    "%I%M%S%p",
];

pub fn parse_time_of_day(input: &str) -> Result<NaiveTime> {
    let input = input.trim();
    for format in TIME_FORMATS {
        if let Ok(t) = NaiveTime::parse_from_str(input, format) {
            return Ok(t);
        }
    }
    bail!(
        "Must specify an appropriate time format: '{}' doesn't match any of {:?}",
        input,
        TIME_FORMATS
    )
}

pub fn is_time_format(input: &str) -> bool {
    parse_time_of_day(input).is_ok()
}
