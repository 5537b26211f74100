//! Deterministic sample literals.
//!
//! Values depend only on the type kind and the field name, so repeated builds of
//! the same type produce identical output.

use crate::model::{PrimitiveType, TypeKind};

pub const SAMPLE_STRING: &str = "sample";
pub const SAMPLE_DATE: &str = "2024-01-01";
pub const SAMPLE_DATE_TIME: &str = "2024-01-01 12:00:00";
pub const SAMPLE_TIME: &str = "12:00:00";
pub const SAMPLE_UUID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

/// Sample literal for a scalar kind; `None` for kinds that are not rendered as a literal
pub fn mock_value(kind: TypeKind, field_name: &str) -> Option<String> {
    let value = match kind {
        TypeKind::Primitive(prim) => primitive_value(prim),
        TypeKind::String => string_value(field_name),
        _ => return None,
    };
    Some(value.to_string())
}

fn primitive_value(prim: PrimitiveType) -> &'static str {
    match prim {
        PrimitiveType::Byte
        | PrimitiveType::Short
        | PrimitiveType::Int
        | PrimitiveType::Long
        | PrimitiveType::Float
        | PrimitiveType::Double
        | PrimitiveType::Decimal => "0",
        PrimitiveType::Boolean => "true",
        PrimitiveType::Char => "a",
        PrimitiveType::Date => SAMPLE_DATE,
        PrimitiveType::DateTime => SAMPLE_DATE_TIME,
        PrimitiveType::Time => SAMPLE_TIME,
        PrimitiveType::Uuid => SAMPLE_UUID,
        PrimitiveType::Binary => "(binary)",
    }
}

/// String sample guessed from the field name
fn string_value(field_name: &str) -> &'static str {
    let lower = field_name.to_ascii_lowercase();
    if lower.contains("email") || lower == "mail" {
        "user@example.com"
    } else if lower.ends_with("url") || lower.ends_with("uri") || lower.contains("website") {
        "https://example.com"
    } else if lower.contains("phone") || lower.contains("mobile") {
        "+1-555-0100"
    } else if lower == "ip"
        || lower.ends_with("_ip")
        || field_name.ends_with("Ip")
        || lower.contains("ipaddr")
        || lower.contains("ip_addr")
    {
        "192.168.0.1"
    } else if lower.ends_with("uuid") || lower.ends_with("guid") {
        SAMPLE_UUID
    } else {
        SAMPLE_STRING
    }
}
