//! Classification of response chunks.
//!
//! The server may send JSON objects shaped like chat-completion deltas, plain
//! JSON objects with a `content` field, or raw text. Several JSON objects can
//! also arrive back to back in a single network chunk.

use serde_json::Value;

/// What one chunk (or one object inside a chunk) carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// A JSON object. Either field may be absent.
    Structured {
        id: Option<String>,
        delta: Option<String>,
    },
    /// Text that was not a JSON object; forwarded verbatim.
    Raw(String),
}

impl Fragment {
    /// Generation identifier carried by this fragment, if any.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Structured { id, .. } => id.as_deref(),
            Self::Raw(_) => None,
        }
    }

    /// Non-empty text delta carried by this fragment, if any.
    pub fn delta(&self) -> Option<&str> {
        let delta = match self {
            Self::Structured { delta, .. } => delta.as_deref(),
            Self::Raw(text) => Some(text.as_str()),
        };
        delta.filter(|d| !d.is_empty())
    }
}

/// Splits a decoded chunk into fragments.
///
/// A chunk that parses as a single JSON object yields one structured
/// fragment. A chunk made only of concatenated JSON objects yields one per
/// object. Anything else, including scalars, arrays and partial JSON, is a
/// single raw fragment.
pub fn classify_chunk(text: &str) -> Vec<Fragment> {
    match serde_json::from_str::<Value>(text) {
        Ok(value @ Value::Object(_)) => vec![structured(&value)],
        Ok(_) => vec![Fragment::Raw(text.to_string())],
        Err(_) => split_concatenated(text).unwrap_or_else(|| vec![Fragment::Raw(text.to_string())]),
    }
}

fn split_concatenated(text: &str) -> Option<Vec<Fragment>> {
    let mut fragments = Vec::new();
    for value in serde_json::Deserializer::from_str(text).into_iter::<Value>() {
        let value = value.ok()?;
        if !value.is_object() {
            return None;
        }
        fragments.push(structured(&value));
    }
    (fragments.len() > 1).then_some(fragments)
}

fn structured(value: &Value) -> Fragment {
    let id = value.get("id").and_then(scalar_text);

    let first_delta = value
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("delta"))
        .filter(|delta| delta.is_object());

    // A delta object wins even when it carries no content.
    let delta = match first_delta {
        Some(delta) => delta.get("content").and_then(Value::as_str),
        None => value.get("content").and_then(Value::as_str),
    };

    Fragment::Structured {
        id,
        delta: delta.filter(|d| !d.is_empty()).map(ToString::to_string),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn structured(id: Option<&str>, delta: Option<&str>) -> Fragment {
        Fragment::Structured {
            id: id.map(String::from),
            delta: delta.map(String::from),
        }
    }

    #[test]
    fn test_chat_completion_delta() {
        let chunk = r#"{"id":"prompt-7","choices":[{"delta":{"content":"Goal: "}}]}"#;
        assert_eq!(
            classify_chunk(chunk),
            vec![structured(Some("prompt-7"), Some("Goal: "))]
        );
    }

    #[test]
    fn test_plain_content_object() {
        assert_eq!(
            classify_chunk(r#"{"content":"hello"}"#),
            vec![structured(None, Some("hello"))]
        );
    }

    #[test]
    fn test_delta_takes_precedence_over_content() {
        let chunk = r#"{"choices":[{"delta":{}}],"content":"ignored"}"#;
        let fragments = classify_chunk(chunk);
        assert_eq!(fragments, vec![structured(None, None)]);
        assert_eq!(fragments[0].delta(), None);
    }

    #[test]
    fn test_empty_choices_falls_back_to_content() {
        let chunk = r#"{"choices":[],"content":"fallback"}"#;
        assert_eq!(classify_chunk(chunk), vec![structured(None, Some("fallback"))]);
    }

    #[test]
    fn test_numeric_id() {
        let fragments = classify_chunk(r#"{"id":42}"#);
        assert_eq!(fragments[0].id(), Some("42"));
        assert_eq!(fragments[0].delta(), None);

        assert_eq!(classify_chunk(r#"{"id":0}"#)[0].id(), None);
        assert_eq!(classify_chunk(r#"{"id":""}"#)[0].id(), None);
    }

    #[test]
    fn test_raw_text() {
        assert_eq!(
            classify_chunk("Goal: write"),
            vec![Fragment::Raw("Goal: write".into())]
        );
        assert_eq!(classify_chunk("\n")[0].delta(), Some("\n"));
        assert_eq!(classify_chunk("")[0].delta(), None);
    }

    #[test]
    fn test_scalars_and_arrays_are_raw() {
        assert_eq!(classify_chunk("123"), vec![Fragment::Raw("123".into())]);
        assert_eq!(classify_chunk("[1,2]"), vec![Fragment::Raw("[1,2]".into())]);
        assert_eq!(classify_chunk("\"hi\""), vec![Fragment::Raw("\"hi\"".into())]);
    }

    #[test]
    fn test_concatenated_objects() {
        let chunk = "{\"id\":\"a1\",\"content\":\"Hel\"}\n{\"content\":\"lo\"}";
        assert_eq!(
            classify_chunk(chunk),
            vec![structured(Some("a1"), Some("Hel")), structured(None, Some("lo"))]
        );
    }

    #[test]
    fn test_truncated_json_is_raw() {
        let chunk = "{\"content\":\"a\"}{\"content\":";
        assert_eq!(classify_chunk(chunk), vec![Fragment::Raw(chunk.into())]);
    }
}
