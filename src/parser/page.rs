use std::sync::LazyLock;

use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use super::record::parse_record;
use crate::record::EarthquakeRecord;
use crate::session::Page;

static PRE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("pre").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());

/// True once the page carries at least one `<pre>` element.
pub fn has_data_region(page: &Page) -> bool {
    Html::parse_document(&page.html).select(&PRE).next().is_some()
}

/// Parse every event block on the page in document order. The first `<pre>`
/// echoes the query and is skipped; blank blocks are dropped.
pub fn extract_records(page: &Page) -> Vec<EarthquakeRecord> {
    Html::parse_document(&page.html)
        .select(&PRE)
        .skip(1)
        .map(element_text)
        .filter_map(|text| parse_record(&text))
        .collect()
}

/// Resolve the target of the first link whose visible text contains `label`.
pub fn find_more_link(page: &Page, label: &str) -> Option<Url> {
    let doc = Html::parse_document(&page.html);
    let href = doc
        .select(&ANCHOR)
        .find(|a| element_text(*a).contains(label))
        .and_then(|a| a.value().attr("href").map(str::to_string))?;
    page.url.join(href.trim()).ok()
}

fn element_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

// ── Tests ──
