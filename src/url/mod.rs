//! URL handling helpers
//!
//! Host extraction and comparison used by the crawl engine's same-host
//! filter, and resolution of raw `href` references into absolute URLs used
//! by the link extractor.

mod domain;
mod reference;

pub use domain::{extract_domain, same_host};
pub use reference::{is_well_formed_reference, resolve_reference};
