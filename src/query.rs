use chrono::{Datelike, NaiveDate};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CATALOG_FORM_URL: &str = "https://www.globalcmt.org/cgi-bin/globalcmt-cgi-bin/CMT5/form";

#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    #[error("start date {start} is after end date {end}")]
    DateOrder { start: NaiveDate, end: NaiveDate },
    #[error("{field}: lower bound {min} exceeds upper bound {max}")]
    Bounds { field: &'static str, min: f64, max: f64 },
    #[error("nday must be at least 1")]
    ZeroWindow,
    #[error("invalid catalog URL {0:?}")]
    BaseUrl(String),
}

/// Inclusive `[min, max]` range for one search parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// Search parameters for the catalog form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Query window increment in days (`nday`).
    pub nday: u32,
    pub mw: Bounds,
    pub ms: Bounds,
    pub mb: Bounds,
    pub latitude: Bounds,
    pub longitude: Bounds,
    /// Depth range in km.
    pub depth: Bounds,
    /// Centroid time minus hypocenter time, seconds.
    pub time_shift: Bounds,
    /// Plunge ranges of the first and second eigenvectors, degrees.
    pub plunge1: Bounds,
    pub plunge2: Bounds,
    /// Output listing style (`0` = full text listing).
    pub listing: u8,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(1976, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            nday: 1,
            mw: Bounds::new(0.0, 10.0),
            ms: Bounds::new(0.0, 10.0),
            mb: Bounds::new(0.0, 10.0),
            latitude: Bounds::new(-25.0, -21.0),
            longitude: Bounds::new(-74.0, -67.0),
            depth: Bounds::new(0.0, 1000.0),
            time_shift: Bounds::new(-9999.0, 9999.0),
            plunge1: Bounds::new(0.0, 90.0),
            plunge2: Bounds::new(0.0, 90.0),
            listing: 0,
        }
    }
}

impl CatalogQuery {
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.start > self.end {
            return Err(QueryError::DateOrder {
                start: self.start,
                end: self.end,
            });
        }
        if self.nday == 0 {
            return Err(QueryError::ZeroWindow);
        }
        for (field, b) in self.named_bounds() {
            if b.min > b.max {
                return Err(QueryError::Bounds {
                    field,
                    min: b.min,
                    max: b.max,
                });
            }
        }
        Ok(())
    }

    /// Full request URL, parameters in the order the form emits them.
    pub fn to_url(&self, base: &str) -> Result<Url, QueryError> {
        self.validate()?;
        let pairs = self.params();
        Url::parse_with_params(base, &pairs).map_err(|_| QueryError::BaseUrl(base.to_string()))
    }

    fn named_bounds(&self) -> [(&'static str, Bounds); 9] {
        [
            ("mw", self.mw),
            ("ms", self.ms),
            ("mb", self.mb),
            ("latitude", self.latitude),
            ("longitude", self.longitude),
            ("depth", self.depth),
            ("time_shift", self.time_shift),
            ("plunge1", self.plunge1),
            ("plunge2", self.plunge2),
        ]
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        let mut p: Vec<(&'static str, String)> = vec![
            ("itype", "ymd".into()),
            ("yr", self.start.year().to_string()),
            ("mo", self.start.month().to_string()),
            ("day", self.start.day().to_string()),
            ("otype", "ymd".into()),
            ("oyr", self.end.year().to_string()),
            ("omo", self.end.month().to_string()),
            ("oday", self.end.day().to_string()),
            ("jyr", self.start.year().to_string()),
            ("jday", self.start.ordinal().to_string()),
            ("ojyr", self.end.year().to_string()),
            ("ojday", self.end.ordinal().to_string()),
            ("nday", self.nday.to_string()),
        ];
        let ranges = [
            ("lmw", "umw", self.mw),
            ("lms", "ums", self.ms),
            ("lmb", "umb", self.mb),
            ("llat", "ulat", self.latitude),
            ("llon", "ulon", self.longitude),
            ("lhd", "uhd", self.depth),
            ("lts", "uts", self.time_shift),
            ("lpe1", "upe1", self.plunge1),
            ("lpe2", "upe2", self.plunge2),
        ];
        for (lo, hi, b) in ranges {
            p.push((lo, fmt_num(b.min)));
            p.push((hi, fmt_num(b.max)));
        }
        p.push(("list", self.listing.to_string()));
        p
    }
}

// Integral values print without a trailing ".0", matching the form's own links.
fn fmt_num(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        v.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_url_matches_observed_request() {
        let url = CatalogQuery::default().to_url(CATALOG_FORM_URL).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.globalcmt.org/cgi-bin/globalcmt-cgi-bin/CMT5/form?itype=ymd&yr=1976&mo=1&day=1\
             &otype=ymd&oyr=2024&omo=1&oday=1&jyr=1976&jday=1&ojyr=2024&ojday=1&nday=1\
             &lmw=0&umw=10&lms=0&ums=10&lmb=0&umb=10&llat=-25&ulat=-21&llon=-74&ulon=-67\
             &lhd=0&uhd=1000&lts=-9999&uts=9999&lpe1=0&upe1=90&lpe2=0&upe2=90&list=0"
        );
    }

    #[test]
    fn julian_day_follows_dates() {
        let q = CatalogQuery {
            start: NaiveDate::from_ymd_opt(2000, 3, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2000, 12, 31).unwrap(),
            ..Default::default()
        };
        let url = q.to_url(CATALOG_FORM_URL).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let get = |k: &str| pairs.iter().find(|(n, _)| n == k).map(|(_, v)| v.clone());
        assert_eq!(get("jday").as_deref(), Some("61"));
        assert_eq!(get("ojday").as_deref(), Some("366"));
    }

    #[test]
    fn fractional_bounds_kept() {
        let q = CatalogQuery {
            mw: Bounds::new(5.5, 9.5),
            ..Default::default()
        };
        let url = q.to_url(CATALOG_FORM_URL).unwrap();
        assert!(url.as_str().contains("lmw=5.5&umw=9.5"));
    }

    #[test]
    fn rejects_reversed_dates() {
        let q = CatalogQuery {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(1976, 1, 1).unwrap(),
            ..Default::default()
        };
        assert!(matches!(q.validate(), Err(QueryError::DateOrder { .. })));
    }

    #[test]
    fn rejects_reversed_bounds() {
        let q = CatalogQuery {
            depth: Bounds::new(700.0, 10.0),
            ..Default::default()
        };
        assert_eq!(
            q.validate(),
            Err(QueryError::Bounds {
                field: "depth",
                min: 700.0,
                max: 10.0
            })
        );
    }

    #[test]
    fn rejects_zero_window() {
        let q = CatalogQuery {
            nday: 0,
            ..Default::default()
        };
        assert_eq!(q.validate(), Err(QueryError::ZeroWindow));
    }

    #[test]
    fn rejects_bad_base() {
        let err = CatalogQuery::default().to_url("not a url").unwrap_err();
        assert!(matches!(err, QueryError::BaseUrl(_)));
    }
}
