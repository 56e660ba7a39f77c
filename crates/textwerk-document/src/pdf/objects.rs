// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Small helpers over the lopdf object model: dereferencing, numbers, inherited
// page attributes, and page content streams.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use textwerk_core::error::{Result, TextwerkError};

static NULL_OBJECT: Object = Object::Null;

/// Follow a chain of indirect references to the underlying object.
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    let mut current = object;
    // Bounded to survive reference cycles in damaged files.
    for _ in 0..32 {
        match current {
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(target) => current = target,
                Err(_) => return &NULL_OBJECT,
            },
            _ => return current,
        }
    }
    &NULL_OBJECT
}

/// Look up `key` in `dict` and dereference the value.
pub(crate) fn get_resolved<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Object> {
    dict.get(key).ok().map(|obj| resolve(doc, obj))
}

pub(crate) fn get_dict<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Dictionary> {
    get_resolved(doc, dict, key).and_then(|obj| obj.as_dict().ok())
}

pub(crate) fn get_name<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a [u8]> {
    get_resolved(doc, dict, key).and_then(|obj| obj.as_name().ok())
}

pub(crate) fn get_number(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<f32> {
    get_resolved(doc, dict, key).and_then(number)
}

/// Numeric value of an Integer or Real object.
pub(crate) fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value),
        _ => None,
    }
}

/// Numeric operands of a content operation, or `None` if any is not a number.
pub(crate) fn numbers(operands: &[Object]) -> Option<Vec<f32>> {
    operands.iter().map(number).collect()
}

pub(crate) fn reals(values: &[f32]) -> Object {
    Object::Array(values.iter().copied().map(Object::Real).collect())
}

/// Find a page attribute, walking up `/Parent` for inheritable keys.
pub(crate) fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..64 {
        if let Ok(value) = node.get(key) {
            return Some(resolve(doc, value));
        }
        node = match node.get(b"Parent") {
            Ok(parent) => resolve(doc, parent).as_dict().ok()?,
            Err(_) => return None,
        };
    }
    None
}

/// Concatenated, decompressed content of a page. Pages without `/Contents`
/// yield an empty buffer.
pub(crate) fn page_content(doc: &Document, page_id: ObjectId) -> Result<Vec<u8>> {
    let page = doc
        .get_dictionary(page_id)
        .map_err(|err| TextwerkError::Pdf(format!("page object {page_id:?}: {err}")))?;

    let contents = match page.get(b"Contents") {
        Ok(obj) => resolve(doc, obj),
        Err(_) => return Ok(Vec::new()),
    };

    match contents {
        Object::Stream(stream) => stream_bytes(stream),
        Object::Array(parts) => {
            let mut content = Vec::new();
            for part in parts {
                let stream = resolve(doc, part).as_stream().map_err(|err| {
                    TextwerkError::Pdf(format!("/Contents entry is not a stream: {err}"))
                })?;
                if !content.is_empty() {
                    content.push(b'\n');
                }
                content.extend_from_slice(&stream_bytes(stream)?);
            }
            Ok(content)
        }
        Object::Null => Ok(Vec::new()),
        _ => Err(TextwerkError::Pdf(
            "/Contents is neither a stream nor an array".to_string(),
        )),
    }
}

/// Stream payload, decompressed when a filter is present.
pub(crate) fn stream_bytes(stream: &Stream) -> Result<Vec<u8>> {
    if stream.dict.get(b"Filter").is_ok() {
        stream
            .decompressed_content()
            .map_err(|err| TextwerkError::Pdf(format!("cannot decompress stream: {err}")))
    } else {
        Ok(stream.content.clone())
    }
}

/// Mutable page dictionary.
pub(crate) fn page_dict_mut(doc: &mut Document, page_id: ObjectId) -> Result<&mut Dictionary> {
    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|err| TextwerkError::Pdf(format!("page object {page_id:?}: {err}")))
}

/// Copy of the page's effective resource dictionary, with inheritance and
/// indirect references flattened one level so it can be edited in place.
pub(crate) fn page_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    let mut resources = match inherited(doc, page_id, b"Resources") {
        Some(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    };
    let keys: Vec<Vec<u8>> = resources.iter().map(|(key, _)| key.clone()).collect();
    for key in keys {
        let direct = resources
            .get(&key)
            .ok()
            .map(|value| resolve(doc, value).clone());
        if let Some(Object::Dictionary(inner)) = direct {
            resources.set(key, Object::Dictionary(inner));
        }
    }
    resources
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn number_accepts_integers_and_reals() {
        assert_eq!(number(&Object::Integer(3)), Some(3.0));
        assert_eq!(number(&Object::Real(1.5)), Some(1.5));
        assert_eq!(number(&Object::Null), None);
        assert_eq!(
            numbers(&[Object::Integer(1), Object::Real(2.0)]),
            Some(vec![1.0, 2.0])
        );
        assert_eq!(numbers(&[Object::Integer(1), Object::Null]), None);
    }

    #[test]
    fn inherited_walks_parent_chain() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::from(page_id)],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 200.into(), 100.into()],
            }),
        );

        let media_box = inherited(&doc, page_id, b"MediaBox").expect("inherited");
        assert_eq!(media_box.as_array().map(Vec::len).ok(), Some(4));
        assert!(inherited(&doc, page_id, b"CropBox").is_none());
    }

    #[test]
    fn resolve_follows_references() {
        let mut doc = Document::with_version("1.5");
        let target = doc.add_object(Object::Integer(7));
        let hop = doc.add_object(Object::Reference(target));
        assert_eq!(resolve(&doc, &Object::Reference(hop)), &Object::Integer(7));
    }
}
