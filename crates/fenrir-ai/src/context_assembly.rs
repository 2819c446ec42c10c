use fenrir_core::ConceptStore;
use tracing::debug;

pub const CONTEXT_HEADER: &str = "### Reference concepts\n";

/// Build the retrieved-concept block for stage 2.
///
/// Keywords are rendered in input order; keywords missing from the store are
/// skipped. Returns an empty string when nothing matched.
pub fn assemble_context<S: AsRef<str>>(keywords: &[S], store: &ConceptStore) -> String {
    let mut sections = Vec::with_capacity(keywords.len() + 1);

    for keyword in keywords.iter().map(AsRef::as_ref) {
        match store.get(keyword) {
            Some(entry) => {
                let rendered =
                    serde_json::to_string_pretty(entry).unwrap_or_else(|_| entry.to_string());
                sections.push(format!("#### {}\n{}\n", keyword, rendered));
            }
            None => debug!("Skipping keyword outside the concept vocabulary: {}", keyword),
        }
    }

    if sections.is_empty() {
        return String::new();
    }

    sections.insert(0, CONTEXT_HEADER.to_string());
    sections.join("\n")
}
