//! Reply rendering for search results
//!
//! All formats share one shape: summary pairs, then one entry per returned
//! document projecting its unsigned and string attributes by name.

use std::fmt::Write as _;
use std::time::Instant;

use serde_json::{Map, Value};

use super::searcher::SearchResponse;
use crate::error::Result;
use crate::index::{AttrKind, AttributeStore, DocOrdinal};

/// Output format chosen by the request's `dataformat`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResultFormat {
    #[default]
    Basic,
    Json,
    Xml,
}

impl ResultFormat {
    /// Case-insensitive lookup, unknown names fall back to `Basic`
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("json") {
            ResultFormat::Json
        } else if name.eq_ignore_ascii_case("xml") {
            ResultFormat::Xml
        } else {
            ResultFormat::Basic
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ResultFormat::Basic => "text/plain",
            ResultFormat::Json => "application/json",
            ResultFormat::Xml => "text/xml",
        }
    }

    pub fn render(self, response: &SearchResponse, attributes: &AttributeStore) -> Result<String> {
        let start = Instant::now();
        let summary = summary(response);
        let docs: Vec<Vec<(&str, FieldValue<'_>)>> = response
            .docs
            .iter()
            .map(|&ordinal| project(attributes, ordinal))
            .collect();

        let pack_cost = |start: Instant| format!("{}us", start.elapsed().as_micros());
        match self {
            ResultFormat::Basic => Ok(render_basic(&summary, &docs, pack_cost(start))),
            ResultFormat::Json => render_json(&summary, &docs, pack_cost(start)),
            ResultFormat::Xml => Ok(render_xml(&summary, &docs, pack_cost(start))),
        }
    }
}

/// One projected attribute value
#[derive(Clone, Copy, Debug, PartialEq)]
enum FieldValue<'a> {
    Uint(u32),
    Text(&'a str),
}

impl FieldValue<'_> {
    fn to_text(self) -> String {
        match self {
            FieldValue::Uint(v) => v.to_string(),
            FieldValue::Text(s) => s.to_string(),
        }
    }
}

fn summary(response: &SearchResponse) -> Vec<(&'static str, String)> {
    vec![
        ("query", response.query.clone()),
        ("doc_num", response.docs.len().to_string()),
        ("total_found", response.total_found.to_string()),
        ("parse_cost", format!("{}us", response.stats.parse_us)),
        ("segment_cost", format!("{}us", response.stats.segment_us)),
        ("search_cost", format!("{}us", response.stats.search_us)),
    ]
}

fn project(attributes: &AttributeStore, ordinal: DocOrdinal) -> Vec<(&str, FieldValue<'_>)> {
    let uint_names = attributes.catalogue(AttrKind::Uint);
    let string_names = attributes.catalogue(AttrKind::String);

    let uints = attributes
        .uint
        .get(ordinal)
        .iter()
        .enumerate()
        .filter_map(|(i, v)| Some((uint_names.name(i)?, FieldValue::Uint(*v))));
    let strings = attributes
        .string
        .get(ordinal)
        .iter()
        .enumerate()
        .filter_map(|(i, v)| Some((string_names.name(i)?, FieldValue::Text(v.as_str()))));

    uints.chain(strings).collect()
}

fn render_basic(
    summary: &[(&str, String)],
    docs: &[Vec<(&str, FieldValue<'_>)>],
    pack_cost: String,
) -> String {
    let mut out = String::new();
    for (key, value) in summary {
        let _ = writeln!(out, "{}={}", key, value);
    }
    let _ = writeln!(out, "pack_cost={}", pack_cost);
    for doc in docs {
        let line: Vec<String> = doc
            .iter()
            .map(|(name, value)| format!("{}={}", name, value.to_text()))
            .collect();
        let _ = writeln!(out, "{}", line.join("\t"));
    }
    out
}

fn render_json(
    summary: &[(&str, String)],
    docs: &[Vec<(&str, FieldValue<'_>)>],
    pack_cost: String,
) -> Result<String> {
    let mut root = Map::new();
    for (key, value) in summary {
        root.insert(key.to_string(), Value::String(value.clone()));
    }

    let items = docs
        .iter()
        .map(|doc| {
            let item: Map<String, Value> = doc
                .iter()
                .map(|(name, value)| {
                    let value = match value {
                        FieldValue::Uint(v) => Value::from(*v),
                        FieldValue::Text(s) => Value::from(*s),
                    };
                    (name.to_string(), value)
                })
                .collect();
            Value::Object(item)
        })
        .collect();
    root.insert("docs".to_string(), Value::Array(items));
    root.insert("pack_cost".to_string(), Value::String(pack_cost));

    Ok(serde_json::to_string_pretty(&Value::Object(root))?)
}

fn render_xml(
    summary: &[(&str, String)],
    docs: &[Vec<(&str, FieldValue<'_>)>],
    pack_cost: String,
) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<display>\n");
    for (key, value) in summary {
        let _ = writeln!(out, "  <{0}>{1}</{0}>", key, escape_xml(value));
    }
    let _ = writeln!(out, "  <pack_cost>{}</pack_cost>", pack_cost);

    out.push_str("  <docs>\n");
    for doc in docs {
        out.push_str("    <item>\n");
        for (name, value) in doc {
            let text = escape_xml(&value.to_text());
            if is_xml_name(name) {
                let _ = writeln!(out, "      <{0}>{1}</{0}>", name, text);
            } else {
                let _ = writeln!(
                    out,
                    "      <attr name=\"{}\">{}</attr>",
                    escape_xml(name),
                    text
                );
            }
        }
        out.push_str("    </item>\n");
    }
    out.push_str("  </docs>\n</display>\n");
    out
}

/// Whether an attribute name can be used as an element name as is
fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_');
    let reserved = name
        .get(..3)
        .is_some_and(|head| head.eq_ignore_ascii_case("xml"));
    starts_well
        && !reserved
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}
