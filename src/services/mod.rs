//! Request building and result shaping.
//!
//! Everything here is pure: no I/O, no shared state. The client module
//! calls into these functions around a single engine round trip.

mod facets;
mod filter_state;
pub mod links;
mod pagination;
pub mod params;
pub mod presentation;
mod request_builder;

pub use facets::{facets_from_response, process_facets};
pub use filter_state::{Toggle, ToggleAction, is_active, toggle};
pub use links::BaseHref;
pub use pagination::compute_pagination;
pub use params::{NormalizedRequest, ParamValue, RawParams, ResponseFormat, normalize};
pub use presentation::{
    FacetGroup, FilterLink, PageLink, PageLinks, active_filters, facet_heading, facet_options,
    filter_link, render_pagination,
};
pub use request_builder::{
    MATCH_ALL, SearchRequestBuilder, build_filter_queries, query_fields_param,
};
