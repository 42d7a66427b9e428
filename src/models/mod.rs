//! Data models for facetsearch.
//!
//! Everything here is created per request and dropped once the response is
//! rendered.

mod filter;
mod request;
mod response;
mod search;

pub use filter::{FilterSet, FilterTerm, FilterValue, ValueSet, is_blank_str};
pub use request::{FacetDirective, GroupDirective, QueryParser, SearchRequest};
pub use response::{FacetField, FacetMap, PaginationState};
pub use search::{DEFAULT_PER_PAGE, SearchOptions};
