//! Resource addressing and loading: URL classification, data-URL
//! decoding, the fetcher boundary, and the cached text loader.

pub mod data_url;
pub mod fetcher;
pub mod loader;
pub mod url;

pub use data_url::parse_data_text_url;
pub use fetcher::{FetchResponse, Fetcher, HttpFetcher};
pub use loader::{LoadResult, ResourceCache, format_duration_seconds, load_text_resource};
pub use self::url::{
    InputType, canonicalize_load_target_url, classify_input, resolve_resource_url,
};
