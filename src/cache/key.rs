//! Query digest generation using SHA-256 hashes

use sha2::{Digest, Sha256};

use crate::query::filter::encode_numeric;
use crate::query::{FieldType, FilterSpec, QuerySpec};

/// Bumped whenever the canonical form changes, so old digests never collide
const DIGEST_VERSION: &str = "v1";

/// Generate the deterministic cache key for a validated query spec.
///
/// Covers every field that affects the report: property, selection in
/// order, date range, paging, filters, ordering, and the extra request
/// options. Display metadata (name, description, timestamps) is excluded.
/// Filters are ANDed, so their order does not matter; in-list values and
/// metric aggregations are treated as sets.
pub fn query_digest(spec: &QuerySpec) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_form(spec));
    format!("{:x}", hasher.finalize())
}

/// The exact bytes hashed by [`query_digest`]
pub fn canonical_form(spec: &QuerySpec) -> Vec<u8> {
    let mut out = CanonicalWriter::default();

    out.field("version", DIGEST_VERSION);
    out.field(
        "property",
        spec.property_id
            .strip_prefix("properties/")
            .unwrap_or(&spec.property_id),
    );
    out.list("dimensions", &spec.dimensions);
    out.list("metrics", &spec.metrics);
    out.field("start_date", &spec.start_date);
    out.field("end_date", &spec.end_date);
    out.field("limit", &spec.limit.to_string());
    out.field("offset", &spec.offset.to_string());

    let mut filters: Vec<Vec<u8>> = spec.filters.iter().map(canonical_filter).collect();
    filters.sort();
    out.field("filters", &filters.len().to_string());
    for filter in &filters {
        out.raw("filter", filter);
    }

    out.field("order_by", &spec.order_by.len().to_string());
    for order in &spec.order_by {
        out.field("order.field", &order.field_name);
        out.field(
            "order.type",
            match order.field_type {
                Some(FieldType::Dimension) => "dimension",
                Some(FieldType::Metric) => "metric",
                None => "",
            },
        );
        out.field("order.desc", if order.descending { "1" } else { "0" });
        out.field("order.mode", order.order_type.as_deref().unwrap_or(""));
    }

    let mut aggregations = spec.metric_aggregations.clone();
    aggregations.sort();
    aggregations.dedup();
    out.list("metric_aggregations", &aggregations);
    out.field("currency_code", spec.currency_code.as_deref().unwrap_or(""));
    out.field("keep_empty_rows", if spec.keep_empty_rows { "1" } else { "0" });
    out.field(
        "return_property_quota",
        if spec.return_property_quota { "1" } else { "0" },
    );

    out.into_bytes()
}

fn canonical_filter(filter: &FilterSpec) -> Vec<u8> {
    let mut out = CanonicalWriter::default();
    out.field("field", &filter.field_name);
    out.field("kind", filter.kind.as_str());

    if let Some(ref s) = filter.string {
        out.field("match_type", s.match_type.as_deref().unwrap_or("EXACT"));
        out.field("value", &s.value);
        out.field("case_sensitive", if s.case_sensitive { "1" } else { "0" });
    }
    if let Some(ref n) = filter.numeric {
        out.field("operation", &n.operation);
        out.field("value", encode_numeric(n.value).token());
    }
    if let Some(ref b) = filter.between {
        out.field("from", encode_numeric(b.from).token());
        out.field("to", encode_numeric(b.to).token());
    }
    if let Some(ref l) = filter.in_list {
        let mut values = l.values.clone();
        values.sort();
        values.dedup();
        out.list("values", &values);
        out.field("case_sensitive", if l.case_sensitive { "1" } else { "0" });
    }

    out.into_bytes()
}

/// Length-prefixed `tag=value` encoding; no separator can be forged by
/// field content.
#[derive(Default)]
struct CanonicalWriter {
    buf: Vec<u8>,
}

impl CanonicalWriter {
    fn raw(&mut self, tag: &str, value: &[u8]) {
        self.buf.extend_from_slice(tag.as_bytes());
        self.buf.push(b'=');
        self.buf.extend_from_slice(&(value.len() as u64).to_le_bytes());
        self.buf.extend_from_slice(value);
        self.buf.push(b'|');
    }

    fn field(&mut self, tag: &str, value: &str) {
        self.raw(tag, value.as_bytes());
    }

    fn list(&mut self, tag: &str, values: &[String]) {
        self.field(tag, &values.len().to_string());
        for value in values {
            self.field(tag, value);
        }
    }

    fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
