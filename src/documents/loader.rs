use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::{Document, SOURCE_KEY};
use crate::core::errors::IngestError;

/// Loads every `*.pdf` directly inside `dir`, one `Document` per page.
///
/// Files are visited in path order. Other files and subdirectories are
/// skipped. A missing directory or an unreadable/unparseable PDF aborts the
/// whole load.
pub fn load_pdf_directory(dir: &Path) -> Result<Vec<Document>, IngestError> {
    let io_err = |path: &Path| {
        let path = path.display().to_string();
        move |source| IngestError::Io { path, source }
    };

    let entries = fs::read_dir(dir).map_err(io_err(dir))?;
    let mut pdfs: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let path = entry.map_err(io_err(dir))?.path();
        if path.is_file() && is_pdf(&path) {
            pdfs.push(path);
        }
    }
    pdfs.sort();

    let mut documents = Vec::new();
    for path in pdfs {
        let absolute = fs::canonicalize(&path).map_err(io_err(&path))?;
        let pages = load_pdf_pages(&absolute)?;
        tracing::debug!("Loaded {} page(s) from {}", pages.len(), absolute.display());
        documents.extend(pages);
    }

    tracing::info!("Loaded {} page document(s) from {}", documents.len(), dir.display());
    Ok(documents)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

fn load_pdf_pages(path: &Path) -> Result<Vec<Document>, IngestError> {
    let source = path.display().to_string();
    let pdf_err = |reason: lopdf::Error| IngestError::Pdf {
        path: source.clone(),
        reason: reason.to_string(),
    };

    let pdf = lopdf::Document::load(path).map_err(|err| match err {
        lopdf::Error::IO(io) => IngestError::Io {
            path: source.clone(),
            source: io,
        },
        other => pdf_err(other),
    })?;

    let pages = pdf.get_pages();
    let total_pages = pages.len();
    let mut documents = Vec::with_capacity(total_pages);

    for (index, page_number) in pages.keys().enumerate() {
        let text = pdf.extract_text(&[*page_number]).map_err(&pdf_err)?;

        let mut metadata = Map::new();
        metadata.insert(SOURCE_KEY.to_string(), Value::String(source.clone()));
        metadata.insert("page".to_string(), Value::from(index));
        metadata.insert("total_pages".to_string(), Value::from(total_pages));
        documents.push(Document::new(text, metadata));
    }

    Ok(documents)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};
    use tempfile::TempDir;

    /// Writes a PDF with one text line per page.
    pub(crate) fn write_pdf(path: &Path, pages: &[&str]) {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[test]
    fn loads_one_document_per_page() {
        let dir = TempDir::new().unwrap();
        write_pdf(
            &dir.path().join("flu.pdf"),
            &["Influenza causes fever", "Rest and fluids help"],
        );

        let docs = load_pdf_directory(dir.path()).unwrap();

        assert_eq!(docs.len(), 2);
        assert!(docs[0].page_content.contains("Influenza"));
        assert!(docs[1].page_content.contains("fluids"));
        assert_eq!(docs[0].metadata["page"], 0);
        assert_eq!(docs[1].metadata["page"], 1);
        assert_eq!(docs[1].metadata["total_pages"], 2);

        let source = docs[0].source().unwrap();
        assert!(Path::new(source).is_absolute());
        assert!(source.ends_with("flu.pdf"));
    }

    #[test]
    fn skips_non_pdf_files_and_subdirectories() {
        let dir = TempDir::new().unwrap();
        write_pdf(&dir.path().join("b.PDF"), &["uppercase extension"]);
        write_pdf(&dir.path().join("a.pdf"), &["first file"]);
        fs::write(dir.path().join("notes.txt"), "not a pdf").unwrap();
        fs::create_dir(dir.path().join("nested.pdf")).unwrap();

        let docs = load_pdf_directory(dir.path()).unwrap();

        assert_eq!(docs.len(), 2);
        assert!(docs[0].source().unwrap().ends_with("a.pdf"));
        assert!(docs[1].source().unwrap().ends_with("b.PDF"));
    }

    #[test]
    fn missing_directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = load_pdf_directory(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, IngestError::Io { .. }));
    }

    #[test]
    fn corrupt_pdf_aborts_the_load() {
        let dir = TempDir::new().unwrap();
        write_pdf(&dir.path().join("good.pdf"), &["fine"]);
        fs::write(dir.path().join("broken.pdf"), b"%PDF-1.5 garbage").unwrap();

        assert!(load_pdf_directory(dir.path()).is_err());
    }

    #[test]
    fn empty_directory_yields_nothing() {
        let dir = TempDir::new().unwrap();
        assert!(load_pdf_directory(dir.path()).unwrap().is_empty());
    }
}
