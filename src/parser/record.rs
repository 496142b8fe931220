use std::str::FromStr;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::record::EarthquakeRecord;

// Accepts "Date: 1976/ 1/ 5" and "Date (y/m/d): 1976/1/5".
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Date(?:\s*\(y/m/d\))?:\s*(\d{4})\s*/\s*(\d{1,2})\s*/\s*(\d{1,2})").unwrap()
});
// Both "Centroid Time: 3:15:42.3 GMT" and "Centroid Time: 03:15:42.300".
static CENTROID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Centroid Time:\s*(\d{1,2})\s*:\s*(\d{1,2})\s*:\s*(\d{1,2}(?:\.\d+)?)").unwrap()
});
static LAT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Lat\s*=\s*(-?\d+(?:\.\d+)?)").unwrap());
static LON_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Lon\s*=\s*(-?\d+(?:\.\d+)?)").unwrap());
static DEPTH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Depth\s*=\s*(\d+(?:\.\d+)?)").unwrap());
static MW_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bMw\s*=\s*(\d+(?:\.\d+)?)").unwrap());
static MB_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bmb\s*=\s*(\d+(?:\.\d+)?)").unwrap());

/// Parse one preformatted event block.
///
/// Fields are located by their label on whichever line carries it, so the
/// usual layout (date/time on line 0, position on 1, depth on 2, magnitudes
/// on 5) parses the same as a reordered block. A field whose label is absent
/// stays `None`. Returns `None` only when the block has no text at all.
pub fn parse_record(raw: &str) -> Option<EarthquakeRecord> {
    let lines: Vec<&str> = raw.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines.is_empty() {
        return None;
    }

    let mut record = EarthquakeRecord::default();

    if let Some(caps) = first_captures(&lines, &DATE_RE) {
        record.year = group(&caps, 1);
        record.month = group(&caps, 2);
        record.day = group(&caps, 3);
    }
    if let Some(caps) = first_captures(&lines, &CENTROID_RE) {
        record.hour = group(&caps, 1);
        record.minutes = group(&caps, 2);
        record.seconds = group(&caps, 3);
    }

    record.latitude = first_value(&lines, &LAT_RE);
    record.longitude = first_value(&lines, &LON_RE);
    record.depth = first_value(&lines, &DEPTH_RE);
    record.mw_magnitude = first_value(&lines, &MW_RE);
    record.mb_magnitude = first_value(&lines, &MB_RE);

    Some(record)
}

fn first_captures<'a>(lines: &[&'a str], re: &Regex) -> Option<Captures<'a>> {
    lines.iter().find_map(|line| re.captures(line))
}

fn first_value<T: FromStr>(lines: &[&str], re: &Regex) -> Option<T> {
    first_captures(lines, re).and_then(|caps| group(&caps, 1))
}

fn group<T: FromStr>(caps: &Captures, idx: usize) -> Option<T> {
    caps.get(idx)?.as_str().parse().ok()
}

// ── Tests ──
