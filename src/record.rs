use serde::Serialize;

/// Column names in export order. Must stay in sync with the field order of
/// [`EarthquakeRecord`].
pub const FIELD_NAMES: [&str; 11] = [
    "year",
    "month",
    "day",
    "hour",
    "minutes",
    "seconds",
    "latitude",
    "longitude",
    "depth",
    "mwMagnitude",
    "mbMagnitude",
];

/// One event parsed from a catalog text block. `None` means the field was not
/// present in the block, which is distinct from a reported zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarthquakeRecord {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub hour: Option<u32>,
    pub minutes: Option<u32>,
    pub seconds: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub depth: Option<f64>,
    pub mw_magnitude: Option<f64>,
    pub mb_magnitude: Option<f64>,
}

impl EarthquakeRecord {
    /// Field values in [`FIELD_NAMES`] order, widened to `f64` for tabular output.
    pub fn values(&self) -> [Option<f64>; 11] {
        [
            self.year.map(f64::from),
            self.month.map(f64::from),
            self.day.map(f64::from),
            self.hour.map(f64::from),
            self.minutes.map(f64::from),
            self.seconds,
            self.latitude,
            self.longitude,
            self.depth,
            self.mw_magnitude,
            self.mb_magnitude,
        ]
    }

    /// Names of fields that did not parse.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        FIELD_NAMES
            .iter()
            .zip(self.values())
            .filter(|(_, v)| v.is_none())
            .map(|(name, _)| *name)
            .collect()
    }
}
