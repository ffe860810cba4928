//! Header pipeline: locate the header block, parse it, and coerce its values.

pub mod coerce;
pub mod header;
pub mod locator;

use crate::error::Result;
use crate::model::property::TypedPropertyMap;

use self::locator::HeaderBlock;

/// Run the whole header pipeline over a paragraph snapshot.
///
/// Returns the located block (for stripping the header afterwards) and the
/// typed properties. Nothing is returned unless every value coerces.
pub fn extract_properties(paragraphs: &[String]) -> Result<(HeaderBlock, TypedPropertyMap)> {
    let block = locator::locate(paragraphs);
    let raw = header::parse_header(&block.header)?;
    let typed = coerce::coerce_all(&raw)?;
    Ok((block, typed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_has_no_properties() {
        let (block, typed) = extract_properties(&[]).unwrap();
        assert!(block.header.is_empty());
        assert!(block.body.is_empty());
        assert!(typed.is_empty());
    }

    #[test]
    fn test_document_without_header() {
        let doc = vec!["Hello,".to_string(), "Bye".to_string()];
        let (block, typed) = extract_properties(&doc).unwrap();
        assert_eq!(block.body, doc);
        assert!(typed.is_empty());
    }
}
