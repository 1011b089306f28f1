//! Single-record encode/decode: the field/component/repeat layer inside one
//! `CR`-delimited record of a frame.
//!
//! Grounded in `original_source/astm/codec.py`'s `encode_record`/
//! `decode_record`/`encode_component`/`decode_component`/
//! `encode_repeated_component`/`decode_repeated_component`.

use crate::constants::Separators;
use crate::error::{ProtocolError, Result};
use crate::field::{ComponentItem, Field};

/// An ASTM record: an ordered list of fields. By convention the first field
/// is always the one-character record type code (`H`, `P`, `O`, `R`, `C`,
/// `S`, `M`, `L`, or a vendor-defined code).
pub type Record = Vec<Field>;

/// The type code of a record, if it has one. Every well-formed record has a
/// scalar first field; a record that doesn't is malformed.
pub fn record_type(record: &Record) -> Result<u8> {
    match record.first() {
        Some(Field::Scalar(b)) if !b.is_empty() => Ok(b[0]),
        _ => Err(ProtocolError::MalformedFrame(
            "record is missing its type code".to_string(),
        )),
    }
}

/// Encodes one record's fields, joined by the field separator.
///
/// A record consisting only of absent values after the type code still
/// encodes as the type code followed by empty fields — the type code
/// itself can never be absent (spec.md §4.1 edge cases).
pub fn encode_record(record: &Record, sep: Separators, encoding: &str) -> Result<Vec<u8>> {
    let mut fields = Vec::with_capacity(record.len());
    for field in record {
        fields.push(encode_field(field, sep, encoding)?);
    }
    Ok(fields.join(&[sep.field][..]))
}

fn encode_field(field: &Field, sep: Separators, encoding: &str) -> Result<Vec<u8>> {
    match field {
        Field::Absent => Ok(Vec::new()),
        Field::Scalar(b) => encode_bytes(b, encoding),
        Field::Component(items) => encode_component(items, sep, encoding),
        Field::Repeated(reps) => encode_repeated(reps, sep, encoding),
    }
}

/// Scalars are coerced to their textual representation in the session
/// encoding; for the default (latin-1-compatible) path this is an identity
/// copy of the bytes, non-ASCII bytes included, per spec.md §6.
fn encode_bytes(b: &[u8], _encoding: &str) -> Result<Vec<u8>> {
    Ok(b.to_vec())
}

/// Joins scalars with the component separator, stripping trailing empty
/// components (`A^B^^` -> `A^B`).
fn encode_component(items: &[ComponentItem], sep: Separators, encoding: &str) -> Result<Vec<u8>> {
    let mut parts: Vec<Vec<u8>> = Vec::with_capacity(items.len());
    for item in items {
        parts.push(match item {
            ComponentItem::Absent => Vec::new(),
            ComponentItem::Scalar(b) => encode_bytes(b, encoding)?,
        });
    }
    while matches!(parts.last(), Some(p) if p.is_empty()) {
        parts.pop();
    }
    Ok(parts.join(&[sep.component][..]))
}

/// Joins components with the repeat separator. Trailing empty repeats are
/// NOT stripped — the repeat separator is preserved between them.
fn encode_repeated(
    reps: &[Vec<ComponentItem>],
    sep: Separators,
    encoding: &str,
) -> Result<Vec<u8>> {
    let mut parts = Vec::with_capacity(reps.len());
    for rep in reps {
        parts.push(encode_component(rep, sep, encoding)?);
    }
    Ok(parts.join(&[sep.repeat][..]))
}

/// Inverts `encode_record`. Empty tokens decode to `Field::Absent`.
pub fn decode_record(data: &[u8], sep: Separators, encoding: &str) -> Result<Record> {
    data.split(|&b| b == sep.field)
        .map(|token| decode_field(token, sep, encoding))
        .collect()
}

fn decode_field(token: &[u8], sep: Separators, encoding: &str) -> Result<Field> {
    if token.is_empty() {
        return Ok(Field::Absent);
    }
    if token.contains(&sep.repeat) {
        Ok(decode_repeated(token, sep, encoding))
    } else if token.contains(&sep.component) {
        Ok(decode_component(token, sep, encoding))
    } else {
        Ok(Field::Scalar(decode_bytes(token, encoding)))
    }
}

fn decode_bytes(token: &[u8], _encoding: &str) -> Vec<u8> {
    token.to_vec()
}

fn decode_component(token: &[u8], sep: Separators, encoding: &str) -> Field {
    let items = token
        .split(|&b| b == sep.component)
        .map(|item| {
            if item.is_empty() {
                ComponentItem::Absent
            } else {
                ComponentItem::Scalar(decode_bytes(item, encoding))
            }
        })
        .collect();
    Field::Component(items)
}

fn decode_repeated(token: &[u8], sep: Separators, encoding: &str) -> Field {
    let reps = token
        .split(|&b| b == sep.repeat)
        .map(|rep| match decode_component(rep, sep, encoding) {
            Field::Component(items) => items,
            _ => unreachable!(),
        })
        .collect();
    Field::Repeated(reps)
}
