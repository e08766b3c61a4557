//! Document text extraction for stored uploads

mod extractor;

pub use extractor::{DocumentExtractor, FileExtractor};
