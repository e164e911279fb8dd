//! Header normalization shared by request, response, and trailer
//! events: field names lowercased, surrounding whitespace stripped
//! from values.

use bytes::Bytes;

use crate::grammar::HeaderField;

/// An ordered, duplicate-tolerant sequence of header fields.
pub type HeaderList = Vec<(Bytes, Bytes)>;

/// Lowercase a field name in place, as ASCII (header field names are
/// restricted to `tchar`, which is ASCII-only).
pub fn normalize_name(name: &Bytes) -> Bytes {
    if name.iter().any(u8::is_ascii_uppercase) {
        Bytes::from(name.to_ascii_lowercase())
    } else {
        name.clone()
    }
}

/// Turn already-validated [`HeaderField`]s into a normalized header list.
pub fn normalize(fields: Vec<HeaderField>) -> HeaderList {
    fields
        .into_iter()
        .map(|f| (normalize_name(&f.name), f.value))
        .collect()
}

/// Look up the last value for a lowercase header name (later duplicates
/// win, matching how most servers resolve them for framing purposes).
pub fn get_last<'a>(headers: &'a HeaderList, name: &[u8]) -> Option<&'a Bytes> {
    headers
        .iter()
        .rev()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v)
}

/// Collect every value for a lowercase header name, in order.
pub fn get_all<'a>(headers: &'a HeaderList, name: &[u8]) -> Vec<&'a Bytes> {
    headers
        .iter()
        .filter(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::header_field;

    #[test]
    fn normalize_lowercases_names() {
        let field = header_field(&Bytes::from_static(b"Content-Type: text/plain"), 64).unwrap();
        let list = normalize(vec![field]);
        assert_eq!(&list[0].0[..], b"content-type");
        assert_eq!(&list[0].1[..], b"text/plain");
    }

    #[test]
    fn get_last_prefers_final_duplicate() {
        let list: HeaderList = vec![
            (Bytes::from_static(b"x"), Bytes::from_static(b"1")),
            (Bytes::from_static(b"x"), Bytes::from_static(b"2")),
        ];
        assert_eq!(get_last(&list, b"x"), Some(&Bytes::from_static(b"2")));
    }

    #[test]
    fn get_all_preserves_order() {
        let list: HeaderList = vec![
            (Bytes::from_static(b"x"), Bytes::from_static(b"1")),
            (Bytes::from_static(b"y"), Bytes::from_static(b"z")),
            (Bytes::from_static(b"x"), Bytes::from_static(b"2")),
        ];
        let xs = get_all(&list, b"x");
        assert_eq!(xs, vec![&Bytes::from_static(b"1"), &Bytes::from_static(b"2")]);
    }
}
