pub mod page;
pub mod record;

pub use page::{extract_records, find_more_link, has_data_region};
