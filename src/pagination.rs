use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Url;
use tracing::{info, warn};

use crate::parser;
use crate::record::EarthquakeRecord;
use crate::session::{Page, Session, SessionGuard};

pub struct ScrapeOptions {
    pub nav_timeout: Duration,
    pub more_link_text: String,
    pub max_pages: Option<usize>,
    pub show_progress: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    NoMoreLink,
    NavigationFailed(String),
    Timeout,
    MissingDataRegion,
    PageLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::NoMoreLink => write!(f, "no more pages"),
            StopReason::NavigationFailed(e) => write!(f, "navigation failed: {}", e),
            StopReason::Timeout => write!(f, "timed out waiting for next page"),
            StopReason::MissingDataRegion => write!(f, "next page had no results"),
            StopReason::PageLimit => write!(f, "page limit reached"),
        }
    }
}

/// Result set of one run, in page/document order.
pub struct ScrapeOutcome {
    pub records: Vec<EarthquakeRecord>,
    pub pages: usize,
    pub stop: StopReason,
}

enum State {
    Fetching(Page),
    Done(StopReason),
}

/// Load the query page and follow the "more solutions" link until it runs
/// out. The session is closed exactly once on every exit path.
///
/// Failing to load the first page is an error. Any failure while following
/// to a later page ends the loop and keeps what was collected so far.
pub async fn scrape_catalog<S: Session>(
    session: S,
    start: &Url,
    opts: &ScrapeOptions,
) -> Result<ScrapeOutcome> {
    let mut session = SessionGuard::new(session);

    info!("Loading catalog query: {}", start);
    let first = session
        .navigate(start)
        .await
        .with_context(|| format!("loading {}", start))?;
    if !parser::has_data_region(&first) {
        bail!("no result listing on {}", first.url);
    }

    let pb = if opts.show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut records = Vec::new();
    let mut pages = 0usize;
    let mut visited = HashSet::from([start.clone()]);
    let mut state = State::Fetching(first);

    let stop = loop {
        match state {
            State::Fetching(page) => {
                pages += 1;
                visited.insert(page.url.clone());
                let batch = parser::extract_records(&page);
                let count = batch.len();
                records.extend(batch);
                info!(
                    "Page {}: {} records extracted. Total records: {}",
                    pages,
                    count,
                    records.len()
                );
                pb.set_message(format!("page {} | {} records", pages, records.len()));

                state = if opts.max_pages.is_some_and(|max| pages >= max) {
                    State::Done(StopReason::PageLimit)
                } else {
                    next_page(&mut *session, &page, &mut visited, opts).await
                };
            }
            State::Done(reason) => break reason,
        }
    };

    pb.finish_and_clear();
    session.release();

    match &stop {
        StopReason::NoMoreLink | StopReason::PageLimit => info!("Extraction finished ({})", stop),
        _ => warn!("Extraction stopped early ({})", stop),
    }
    info!(
        "Data extraction completed. Total records: {} across {} pages",
        records.len(),
        pages
    );

    Ok(ScrapeOutcome {
        records,
        pages,
        stop,
    })
}

async fn next_page<S: Session>(
    session: &mut S,
    current: &Page,
    visited: &mut HashSet<Url>,
    opts: &ScrapeOptions,
) -> State {
    let Some(next) = parser::find_more_link(current, &opts.more_link_text) else {
        return State::Done(StopReason::NoMoreLink);
    };
    if !visited.insert(next.clone()) {
        warn!("More solutions link points back to {}, already visited", next);
        return State::Done(StopReason::NoMoreLink);
    }

    match tokio::time::timeout(opts.nav_timeout, session.navigate(&next)).await {
        Ok(Ok(page)) if parser::has_data_region(&page) => State::Fetching(page),
        Ok(Ok(page)) => {
            warn!("Error navigating: {} has no result listing", page.url);
            State::Done(StopReason::MissingDataRegion)
        }
        Ok(Err(e)) => {
            warn!("Error navigating: {}", e);
            State::Done(StopReason::NavigationFailed(e.to_string()))
        }
        Err(_) => {
            warn!(
                "Error navigating: no response from {} within {:?}",
                next, opts.nav_timeout
            );
            State::Done(StopReason::Timeout)
        }
    }
}

// ── Tests ──
