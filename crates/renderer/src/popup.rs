//! Attribute-table popups.

use map_common::{AttributeRow, LatLng};
use serde::Serialize;
use serde_json::Value;

/// A popup anchored at a map position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Popup {
    pub at: LatLng,
    pub html: String,
}

impl Popup {
    pub fn new(at: LatLng, html: impl Into<String>) -> Self {
        Self {
            at,
            html: html.into(),
        }
    }

    /// Popup showing the attribute table of `row`.
    pub fn for_row(at: LatLng, row: &AttributeRow) -> Self {
        Self::new(at, render_properties_table(row))
    }
}

/// Render an attribute row as an HTML table, one `<tr>` per column in
/// natural order. Keys and values are escaped as text.
pub fn render_properties_table(row: &AttributeRow) -> String {
    let mut html = String::from("<table class=\"properties\">");
    for (key, value) in row.iter() {
        html.push_str("<tr><th>");
        push_escaped(&mut html, key);
        html.push_str("</th><td>");
        push_escaped(&mut html, &display_value(value));
        html.push_str("</td></tr>");
    }
    html.push_str("</table>");
    html
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> AttributeRow {
        match value {
            Value::Object(map) => AttributeRow::new(map),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_table_in_column_order() {
        let html = render_properties_table(&row(json!({"id": "1", "name": "Iasi", "value": 30})));
        assert_eq!(
            html,
            "<table class=\"properties\">\
             <tr><th>id</th><td>1</td></tr>\
             <tr><th>name</th><td>Iasi</td></tr>\
             <tr><th>value</th><td>30</td></tr>\
             </table>"
        );
    }

    #[test]
    fn test_empty_row_renders_empty_table() {
        let html = render_properties_table(&AttributeRow::default());
        assert_eq!(html, "<table class=\"properties\"></table>");
    }

    #[test]
    fn test_escapes_markup() {
        let html = render_properties_table(&row(json!({"<b>": "Tom & \"Jerry\" 'x'"})));
        assert!(html.contains("<th>&lt;b&gt;</th>"));
        assert!(html.contains("<td>Tom &amp; &quot;Jerry&quot; &#39;x&#39;</td>"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn test_non_string_values() {
        let html = render_properties_table(&row(json!({"a": null, "b": true, "c": [1, 2]})));
        assert!(html.contains("<th>a</th><td></td>"));
        assert!(html.contains("<th>b</th><td>true</td>"));
        assert!(html.contains("<th>c</th><td>[1,2]</td>"));
    }
}
