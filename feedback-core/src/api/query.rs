// File: feedback-core/src/api/query.rs
//
// Builder for Strapi query strings:
//   filters[restaurant][id][$eq]=12&sort[0]=createdAt:desc&pagination[page]=1

use chrono::{DateTime, SecondsFormat, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Gte,
    Lt,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "$eq",
            FilterOp::Gte => "$gte",
            FilterOp::Lt => "$lt",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrapiQuery {
    params: Vec<(String, String)>,
    sorts: usize,
    populates: usize,
}

impl StrapiQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// `field` may be a dotted path into a relation (`restaurant.id`).
    pub fn filter(mut self, field: &str, op: FilterOp, value: impl ToString) -> Self {
        let mut key = String::from("filters");
        for part in field.split('.') {
            key.push('[');
            key.push_str(part);
            key.push(']');
        }
        key.push('[');
        key.push_str(op.as_str());
        key.push(']');
        self.params.push((key, value.to_string()));
        self
    }

    pub fn eq(self, field: &str, value: impl ToString) -> Self {
        self.filter(field, FilterOp::Eq, value)
    }

    /// Restricts `field` to `[from, to)`; open ends are skipped.
    pub fn time_range(mut self, field: &str, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        if let Some(from) = from {
            self = self.filter(field, FilterOp::Gte, from.to_rfc3339_opts(SecondsFormat::Millis, true));
        }
        if let Some(to) = to {
            self = self.filter(field, FilterOp::Lt, to.to_rfc3339_opts(SecondsFormat::Millis, true));
        }
        self
    }

    pub fn sort(mut self, order: &str) -> Self {
        self.params.push((format!("sort[{}]", self.sorts), order.to_string()));
        self.sorts += 1;
        self
    }

    pub fn page(mut self, page: u32, page_size: u32) -> Self {
        self.params.push(("pagination[page]".to_string(), page.to_string()));
        self.params.push(("pagination[pageSize]".to_string(), page_size.to_string()));
        self
    }

    pub fn populate(mut self, relation: &str) -> Self {
        self.params.push((format!("populate[{}]", self.populates), relation.to_string()));
        self.populates += 1;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Keys are emitted as-is (they are built from field names); values are
    /// percent-encoded.
    pub fn to_query_string(&self) -> String {
        self.params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}
