pub mod document;
pub mod extract;
pub mod page_index;

pub use document::PdfDocument;
pub use extract::{
    BlockKind, BoundingBox, PageGeometry, Span, TextUnit, TextUnitExtractor,
};
pub use page_index::PageIndex;
