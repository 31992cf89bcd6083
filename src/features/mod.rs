//! URL feature extraction: splitting, network lookups and the extractor.

pub mod extractor;
pub mod lookup;
pub mod url_parts;

pub use extractor::{domain_age_days, ExtractionReport, FeatureExtractionDegraded, FeatureExtractor};
pub use lookup::{parse_rdap_registration, LookupError, NetworkLookup, SystemLookup};
pub use url_parts::{normalize_url, registrable_domain, split_url, UrlParts};
