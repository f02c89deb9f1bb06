use serde::{Deserialize, Serialize};

/// Extension appended to every saved document.
pub const PDF_EXTENSION: &str = "pdf";

/// One downloadable document as discovered on the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Opaque document key used in the API path.
    #[serde(rename = "pk")]
    pub id: String,
    /// Display name; also the basis of the saved filename.
    pub name: String,
}

impl DocumentRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// `<sanitized name>.pdf`
    pub fn pdf_filename(&self) -> String {
        format!("{}.{PDF_EXTENSION}", sanitize_filename(&self.name))
    }
}

/// Replace every filename-hostile character with `-`, one for one.
///
/// The output has exactly as many chars as the input.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if is_forbidden(c) { '-' } else { c })
        .collect()
}

fn is_forbidden(c: char) -> bool {
    matches!(c, ',' | '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_each_forbidden_char() {
        assert_eq!(sanitize_filename(r#"a,b/c\d:e*f?g"h<i>j|k"#), "a-b-c-d-e-f-g-h-i-j-k");
    }

    #[test]
    fn keeps_length_for_multibyte_names() {
        let name = "Fiche é/ü: 1";
        let sanitized = sanitize_filename(name);
        assert_eq!(sanitized, "Fiche é-ü- 1");
        assert_eq!(sanitized.chars().count(), name.chars().count());
    }

    #[test]
    fn clean_names_pass_through() {
        assert_eq!(sanitize_filename("Doc A"), "Doc A");
        assert_eq!(sanitize_filename(""), "");
    }

    #[test]
    fn pdf_filename_sanitizes_display_name() {
        assert_eq!(DocumentRef::new("b", "Doc/B").pdf_filename(), "Doc-B.pdf");
    }
}
