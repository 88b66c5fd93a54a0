use crate::constants;
use crate::error::Error;
use serde::Serialize;
use serde_json::{json, Value};

/// One part of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilePart {
    pub field: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    #[serde(skip)]
    pub content: Vec<u8>,
}

impl FilePart {
    pub fn new(field: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            field: field.into(),
            filename: None,
            content_type: None,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// The single active body representation of a request template.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Raw(Vec<u8>),
    Form(Vec<(String, String)>),
    Files(Vec<FilePart>),
    Json(Value),
}

/// Serialised body plus the content type it implies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBody {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl Body {
    /// Serialises the body for the wire.
    ///
    /// # Errors
    /// Returns an error if a JSON body cannot be serialised.
    pub fn render(&self) -> Result<RenderedBody, Error> {
        match self {
            Self::Raw(bytes) => Ok(RenderedBody {
                bytes: bytes.clone(),
                content_type: None,
            }),
            Self::Form(fields) => {
                let encoded = fields
                    .iter()
                    .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                    .collect::<Vec<_>>()
                    .join("&");
                Ok(RenderedBody {
                    bytes: encoded.into_bytes(),
                    content_type: Some(constants::CONTENT_TYPE_FORM.to_string()),
                })
            }
            Self::Files(parts) => Ok(render_multipart(parts, &new_boundary())),
            Self::Json(value) => Ok(RenderedBody {
                bytes: serde_json::to_vec(value)?,
                content_type: Some(constants::CONTENT_TYPE_JSON.to_string()),
            }),
        }
    }

    /// JSON summary used by dry runs; file contents are reported by size.
    #[must_use]
    pub fn describe(&self) -> Value {
        match self {
            Self::Raw(bytes) => json!({
                "raw": String::from_utf8_lossy(bytes),
            }),
            Self::Form(fields) => {
                let map: serde_json::Map<String, Value> = fields
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect();
                json!({ "form": map })
            }
            Self::Files(parts) => {
                let described: Vec<Value> = parts
                    .iter()
                    .map(|part| {
                        json!({
                            "field": part.field,
                            "filename": part.filename,
                            "content_type": part.content_type,
                            "size": part.content.len(),
                        })
                    })
                    .collect();
                json!({ "files": described })
            }
            Self::Json(value) => json!({ "json": value }),
        }
    }
}

fn new_boundary() -> String {
    format!("restwire-{:016x}", fastrand::u64(..))
}

fn render_multipart(parts: &[FilePart], boundary: &str) -> RenderedBody {
    let mut bytes = Vec::new();
    for part in parts {
        bytes.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        let disposition = part.filename.as_ref().map_or_else(
            || format!("Content-Disposition: form-data; name=\"{}\"\r\n", part.field),
            |filename| {
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{filename}\"\r\n",
                    part.field
                )
            },
        );
        bytes.extend_from_slice(disposition.as_bytes());
        let content_type = part
            .content_type
            .as_deref()
            .unwrap_or(constants::CONTENT_TYPE_OCTET_STREAM);
        bytes.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        bytes.extend_from_slice(&part.content);
        bytes.extend_from_slice(b"\r\n");
    }
    bytes.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    RenderedBody {
        bytes,
        content_type: Some(format!(
            "{}; boundary={boundary}",
            constants::CONTENT_TYPE_MULTIPART
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_body_is_urlencoded() {
        let body = Body::Form(vec![
            ("name".into(), "Ada Lovelace".into()),
            ("lang".into(), "en".into()),
        ]);
        let rendered = body.render().unwrap();
        assert_eq!(rendered.bytes, b"name=Ada%20Lovelace&lang=en");
        assert_eq!(
            rendered.content_type.as_deref(),
            Some(constants::CONTENT_TYPE_FORM)
        );
    }

    #[test]
    fn test_multipart_layout() {
        let parts = vec![FilePart::new("upload", b"abc".to_vec())
            .filename("a.txt")
            .content_type("text/plain")];
        let rendered = render_multipart(&parts, "XYZ");
        let text = String::from_utf8(rendered.bytes).unwrap();
        assert!(text.starts_with("--XYZ\r\n"));
        assert!(text.contains("name=\"upload\"; filename=\"a.txt\""));
        assert!(text.contains("Content-Type: text/plain\r\n\r\nabc\r\n"));
        assert!(text.ends_with("--XYZ--\r\n"));
        assert_eq!(
            rendered.content_type.as_deref(),
            Some("multipart/form-data; boundary=XYZ")
        );
    }

    #[test]
    fn test_raw_body_sets_no_content_type() {
        let rendered = Body::Raw(b"ping".to_vec()).render().unwrap();
        assert!(rendered.content_type.is_none());
    }
}
