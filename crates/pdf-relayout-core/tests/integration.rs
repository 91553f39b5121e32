//! End-to-end pipeline tests against synthetic PDF documents.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream};

use pdf_relayout_core::{
    AppConfig, ChunkConfig, DocumentTranslator, Error, Lang, PdfDocument, Result, Translator,
};

/// Build a minimal one-page PDF carrying `page_text` in Helvetica.
fn create_test_pdf(page_text: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let page_tree_id = doc.new_object_id();

    let font_id = doc.add_object(lopdf::Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));

    let resources_id = doc.add_object(lopdf::Dictionary::from_iter([(
        "Font",
        Object::Dictionary(lopdf::Dictionary::from_iter([(
            "F1",
            Object::Reference(font_id),
        )])),
    )]));

    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24.into()]),
            Operation::new("Td", vec![100.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal(page_text)]),
            Operation::new("ET", vec![]),
        ],
    };

    let content_bytes = content.encode().unwrap_or_default();
    let content_id = doc.add_object(Stream::new(lopdf::Dictionary::new(), content_bytes));

    let single_page_id = doc.add_object(lopdf::Dictionary::from_iter([
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(page_tree_id)),
        ("Contents", Object::Reference(content_id)),
        ("Resources", Object::Reference(resources_id)),
        (
            "MediaBox",
            Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
        ),
    ]));

    let page_tree = lopdf::Dictionary::from_iter([
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(vec![Object::Reference(single_page_id)])),
        ("Count", Object::Integer(1)),
    ]);
    doc.objects
        .insert(page_tree_id, Object::Dictionary(page_tree));

    let catalog_id = doc.add_object(lopdf::Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(page_tree_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut output = Vec::new();
    doc.save_to(&mut output).unwrap();
    output
}

/// Deterministic provider: records calls and uppercases, or fails.
struct MockTranslator {
    failing: bool,
    calls: Mutex<Vec<String>>,
}

impl MockTranslator {
    fn new() -> Self {
        Self {
            failing: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            failing: true,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Translator for MockTranslator {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn max_input_len(&self) -> usize {
        4000
    }

    async fn translate_chunk(&self, text: &str, _: &Lang, _: &Lang) -> Result<String> {
        self.calls.lock().unwrap().push(text.to_string());
        if self.failing {
            return Err(Error::ProviderTimeout);
        }
        Ok(text.to_uppercase())
    }
}

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.cache.memory_enabled = false;
    config.cache.disk_enabled = false;
    config.chunk = ChunkConfig {
        max_retries: 2,
        chunk_delay_ms: 0,
        retry_delay_ms: 0,
    };
    config
}

fn translator_with(provider: Arc<dyn Translator>) -> DocumentTranslator {
    DocumentTranslator::with_translator(provider, test_config()).unwrap()
}

#[tokio::test]
async fn test_translate_document_rewrites_page_content() {
    let pdf_bytes = create_test_pdf("Hello from the first page of this document");
    let doc = PdfDocument::from_bytes(pdf_bytes).unwrap();
    let translator = translator_with(Arc::new(MockTranslator::new()));

    let output = translator.translate_document(&doc, None, None).await.unwrap();

    assert!(output.starts_with(b"%PDF"));

    let rewritten = Document::load_mem(&output).unwrap();
    let pages = rewritten.get_pages();
    assert_eq!(pages.len(), 1);

    // The rewrite appends a second content stream to the page
    let page_dict = rewritten.get_dictionary(pages[&1]).unwrap();
    match page_dict.get(b"Contents").unwrap() {
        Object::Array(streams) => assert_eq!(streams.len(), 2),
        other => panic!("expected content array after rewrite, got {other:?}"),
    }
}

#[tokio::test]
async fn test_progress_reaches_completion() {
    let pdf_bytes = create_test_pdf("Some translatable content sits on this page");
    let doc = PdfDocument::from_bytes(pdf_bytes).unwrap();
    let translator = translator_with(Arc::new(MockTranslator::new()));

    let fractions = Mutex::new(Vec::new());
    let on_progress = |fraction: f32| fractions.lock().unwrap().push(fraction);

    translator
        .translate_document(&doc, Some(&on_progress), None)
        .await
        .unwrap();

    let fractions = fractions.lock().unwrap();
    assert!(!fractions.is_empty());
    assert!((fractions.last().unwrap() - 1.0).abs() < f32::EPSILON);
}

#[tokio::test]
async fn test_failing_provider_still_produces_valid_output() {
    // No glossary entry matches, so the unit fails and stays untouched
    let pdf_bytes = create_test_pdf("Nothing on this page matches any glossary entry");
    let doc = PdfDocument::from_bytes(pdf_bytes).unwrap();
    let translator = translator_with(Arc::new(MockTranslator::failing()));

    let warnings = Mutex::new(Vec::new());
    let on_warning = |msg: &str| warnings.lock().unwrap().push(msg.to_string());

    let output = translator
        .translate_document(&doc, None, Some(&on_warning))
        .await
        .unwrap();

    assert!(output.starts_with(b"%PDF"));
    assert!(!warnings.lock().unwrap().is_empty());

    // The untouched page keeps its single original content stream
    let rewritten = Document::load_mem(&output).unwrap();
    let pages = rewritten.get_pages();
    let page_dict = rewritten.get_dictionary(pages[&1]).unwrap();
    assert!(matches!(
        page_dict.get(b"Contents").unwrap(),
        Object::Reference(_)
    ));
}

#[tokio::test]
async fn test_numeric_unit_never_reaches_provider() {
    let pdf_bytes = create_test_pdf("4217");
    let doc = PdfDocument::from_bytes(pdf_bytes).unwrap();
    let provider = Arc::new(MockTranslator::new());
    let translator = translator_with(provider.clone());

    translator.translate_document(&doc, None, None).await.unwrap();

    assert!(provider.calls.lock().unwrap().is_empty());
}

#[test]
fn test_invalid_bytes_fail_to_parse() {
    let result = PdfDocument::from_bytes(b"this is not a pdf".to_vec());
    assert!(matches!(result, Err(Error::DocumentParse(_))));
}

#[tokio::test]
async fn test_extra_glossary_entries_apply_on_fallback() {
    let pdf_bytes = create_test_pdf("Quarterly update");
    let doc = PdfDocument::from_bytes(pdf_bytes).unwrap();

    let mut config = test_config();
    config.fallback.insert(
        "es".to_string(),
        std::collections::BTreeMap::from([(
            "Quarterly update".to_string(),
            "Informe trimestral".to_string(),
        )]),
    );
    let translator =
        DocumentTranslator::with_translator(Arc::new(MockTranslator::failing()), config).unwrap();

    let output = translator.translate_document(&doc, None, None).await.unwrap();

    // The glossary rewrite counts as success, so the page gets new content
    let rewritten = Document::load_mem(&output).unwrap();
    let pages = rewritten.get_pages();
    let page_dict = rewritten.get_dictionary(pages[&1]).unwrap();
    assert!(matches!(
        page_dict.get(b"Contents").unwrap(),
        Object::Array(_)
    ));
}
