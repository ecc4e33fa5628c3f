use crate::core::document::{FeedDocument, XmlElement};
use crate::utils::error::{ImportError, Result};

pub const OFFER_TAG: &str = "offer";
pub const INTERNAL_ID_ATTRIBUTE: &str = "internal-id";

/// 單筆刊登（feed 中的一個 offer 元素）的唯讀視圖
#[derive(Debug, Clone, Copy)]
pub struct ListingRecord<'a> {
    element: &'a XmlElement,
    namespace: &'a str,
}

impl<'a> ListingRecord<'a> {
    pub fn new(element: &'a XmlElement, namespace: &'a str) -> Self {
        Self { element, namespace }
    }

    pub fn element(&self) -> &'a XmlElement {
        self.element
    }

    pub fn namespace(&self) -> &'a str {
        self.namespace
    }

    /// External identifier assigned by the feed publisher.
    pub fn internal_id(&self) -> Result<&'a str> {
        self.element
            .attribute(INTERNAL_ID_ATTRIBUTE)
            .ok_or_else(|| ImportError::missing_field(INTERNAL_ID_ATTRIBUTE))
    }

    pub fn first_element(&self, tag: &str) -> Option<&'a XmlElement> {
        self.element.first_descendant(self.namespace, tag)
    }

    pub fn require_element(&self, tag: &str) -> Result<&'a XmlElement> {
        self.first_element(tag)
            .ok_or_else(|| ImportError::missing_field(tag))
    }

    /// Trimmed text of the first matching element.
    pub fn text(&self, tag: &str) -> Result<String> {
        self.require_element(tag)
            .map(|element| element.text().trim().to_string())
    }

    pub fn optional_text(&self, tag: &str) -> Option<String> {
        self.first_element(tag)
            .map(|element| element.text().trim().to_string())
    }

    /// A view scoped to the first matching sub-element, e.g. `area`.
    pub fn section(&self, tag: &str) -> Option<ListingRecord<'a>> {
        self.first_element(tag)
            .map(|element| ListingRecord::new(element, self.namespace))
    }

    /// Address block of the listing. Exposed for callers; the importer does not project it.
    pub fn location(&self) -> Option<&'a XmlElement> {
        self.first_element("location")
    }
}

/// All `offer` elements of the document at any depth, in document order.
///
/// The iterator borrows the immutable document, so calling this again yields the
/// same listings.
pub fn listings<'a>(
    document: &'a FeedDocument,
    namespace: &'a str,
) -> impl Iterator<Item = ListingRecord<'a>> + 'a {
    document
        .elements()
        .filter(move |element| element.is(namespace, OFFER_TAG))
        .map(move |element| ListingRecord::new(element, namespace))
}
