//! InfluxDB line protocol encoding
//!
//! `measurement[,tag=value...] field=value[,field=value...] timestamp`
//! with the timestamp in whole seconds.

use super::{FieldValue, MetricsError, Point};

/// Encode a single point as one line (no trailing newline)
pub fn encode(point: &Point) -> Result<String, MetricsError> {
    if point.fields.is_empty() {
        return Err(MetricsError::EmptyFields(point.measurement.clone()));
    }

    let mut line = escape(&point.measurement, &[',', ' ']);

    // Empty tag values are not representable
    for (key, value) in point.tags.iter().filter(|(_, v)| !v.is_empty()) {
        line.push(',');
        line.push_str(&escape_key(key));
        line.push('=');
        line.push_str(&escape_key(value));
    }

    line.push(' ');
    for (i, (key, value)) in point.fields.iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        line.push_str(&escape_key(key));
        line.push('=');
        line.push_str(&format_field(key, value)?);
    }

    line.push(' ');
    line.push_str(&point.timestamp.timestamp().to_string());

    Ok(line)
}

fn escape_key(s: &str) -> String {
    escape(s, &[',', '=', ' '])
}

fn escape(s: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn format_field(key: &str, value: &FieldValue) -> Result<String, MetricsError> {
    match value {
        FieldValue::Integer(v) => Ok(format!("{}i", v)),
        FieldValue::Float(v) if v.is_finite() => Ok(v.to_string()),
        FieldValue::Float(_) => Err(MetricsError::NonFiniteField(key.to_string())),
        FieldValue::Boolean(v) => Ok(v.to_string()),
        FieldValue::String(v) => Ok(format!("\"{}\"", escape(v, &['"', '\\']))),
    }
}
