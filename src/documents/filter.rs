use serde_json::{Map, Value};

use super::{Document, SOURCE_KEY};

/// Keeps page content and the `source` entry; everything else the loader
/// attached (page numbers, totals) is dropped. Count and order are preserved.
pub fn filter_documents(docs: Vec<Document>) -> Vec<Document> {
    docs.into_iter()
        .map(|doc| {
            let source = doc.metadata.get(SOURCE_KEY).cloned().unwrap_or(Value::Null);
            let mut metadata = Map::new();
            metadata.insert(SOURCE_KEY.to_string(), source);
            Document::new(doc.page_content, metadata)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn loaded(content: &str, source: &str, page: u64) -> Document {
        let metadata = json!({
            "source": source,
            "page": page,
            "total_pages": 12,
            "producer": "pdfTeX",
        });
        Document::new(content, metadata.as_object().cloned().unwrap())
    }

    #[test]
    fn keeps_only_source() {
        let docs = vec![
            loaded("first page", "/data/a.pdf", 0),
            loaded("second page", "/data/a.pdf", 1),
            loaded("other book", "/data/b.pdf", 0),
        ];

        let filtered = filter_documents(docs.clone());

        assert_eq!(filtered.len(), docs.len());
        for (before, after) in docs.iter().zip(&filtered) {
            assert_eq!(after.page_content, before.page_content);
            assert_eq!(after.metadata.len(), 1);
            assert_eq!(after.source(), before.source());
        }
    }

    #[test]
    fn missing_source_becomes_null() {
        let doc = Document::new("orphan", json!({"page": 3}).as_object().cloned().unwrap());
        let filtered = filter_documents(vec![doc]);
        assert_eq!(filtered[0].metadata.get(SOURCE_KEY), Some(&Value::Null));
        assert_eq!(filtered[0].source(), None);
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(filter_documents(Vec::new()).is_empty());
    }
}
