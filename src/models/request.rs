//! The structured request sent to the engine.

use serde::Serialize;

/// Query grammar used by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryParser {
    /// Boosted, multi-field grammar with minimum-match and phrase tuning.
    #[default]
    Extended,
    /// Verbatim standard grammar.
    Literal,
}

impl QueryParser {
    /// Returns the engine's `defType` name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Extended => "edismax",
            Self::Literal => "lucene",
        }
    }
}

/// Facet directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetDirective {
    /// Fields to count.
    pub fields: Vec<String>,
    /// Values per field; `-1` means no cap.
    pub limit: i64,
    /// Minimum count for a value to be listed.
    pub min_count: u32,
}

/// Result-grouping directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupDirective {
    /// Field to group on.
    pub field: String,
    /// Documents per group.
    pub limit: u32,
}

/// A fully built search request.
///
/// Extended-parser parameters stay `None` under the literal parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    /// Response writer (`wt`).
    pub response_format: String,
    /// Query grammar.
    pub parser: QueryParser,
    /// Query string (`q`).
    pub query: Option<String>,
    /// Fallback query when `q` is absent (`q.alt`).
    pub query_alt: Option<String>,
    /// Boosted query fields (`qf`).
    pub query_fields: Option<String>,
    /// Phrase fields (`pf`).
    pub phrase_fields: Option<Vec<String>>,
    /// Phrase slop (`ps`).
    pub phrase_slop: Option<u32>,
    /// Minimum-match spec (`mm`).
    pub minimum_match: Option<String>,
    /// Boost queries (`bq`).
    pub boost_queries: Option<Vec<String>>,
    /// Grouping directive.
    pub group: Option<GroupDirective>,
    /// Facet directive.
    pub facet: Option<FacetDirective>,
    /// Filter queries (`fq`), one entry per clause.
    pub filter_queries: Vec<String>,
    /// Offset of the first row.
    pub start: u64,
    /// Rows per page.
    pub rows: u32,
    /// Sort spec.
    pub sort: Option<String>,
}

impl SearchRequest {
    /// Flattens the request into ordered engine parameters.
    ///
    /// List-valued parameters other than `pf` repeat their key once per entry.
    #[must_use]
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = Vec::new();
        let mut push = |key: &str, value: String| params.push((key.to_string(), value));

        push("wt", self.response_format.clone());
        push("start", self.start.to_string());
        push("rows", self.rows.to_string());
        if let Some(sort) = &self.sort {
            push("sort", sort.clone());
        }
        push("defType", self.parser.as_str().to_string());
        if let Some(alt) = &self.query_alt {
            push("q.alt", alt.clone());
        }
        if let Some(q) = &self.query {
            push("q", q.clone());
        }
        if let Some(qf) = &self.query_fields {
            push("qf", qf.clone());
        }
        if let Some(pf) = &self.phrase_fields {
            push("pf", pf.join(" "));
        }
        if let Some(ps) = self.phrase_slop {
            push("ps", ps.to_string());
        }
        if let Some(mm) = &self.minimum_match {
            push("mm", mm.clone());
        }
        for bq in self.boost_queries.iter().flatten() {
            push("bq", bq.clone());
        }
        if let Some(group) = &self.group {
            push("group", "true".to_string());
            push("group.field", group.field.clone());
            push("group.limit", group.limit.to_string());
        }
        if let Some(facet) = &self.facet {
            push("facet", "true".to_string());
            for field in &facet.fields {
                push("facet.field", field.clone());
            }
            push("facet.limit", facet.limit.to_string());
            push("facet.mincount", facet.min_count.to_string());
        }
        for fq in &self.filter_queries {
            push("fq", fq.clone());
        }

        params
    }
}
