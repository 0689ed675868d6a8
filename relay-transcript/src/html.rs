//! Selector-based HTML querying behind a small capability trait.
//!
//! The transcript walk only needs four operations, so it is written against
//! [`HtmlNode`] rather than against `scraper` directly.

use relay_common::{RelayError, Result};
use scraper::{ElementRef, Html, Selector};

pub trait HtmlNode: Sized {
    /// All descendants matching a CSS selector, in document order.
    fn find_all(&self, selector: &str) -> Result<Vec<Self>>;

    fn attribute(&self, name: &str) -> Option<String>;

    fn inner_html(&self) -> String;

    /// Concatenated text content of the node and its descendants.
    fn text(&self) -> String;

    fn find_first(&self, selector: &str) -> Result<Option<Self>> {
        Ok(self.find_all(selector)?.into_iter().next())
    }

    fn contains(&self, selector: &str) -> Result<bool> {
        Ok(self.find_first(selector)?.is_some())
    }
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| RelayError::Structure(format!("invalid selector {selector:?}: {e:?}")))
}

/// A parsed HTML document.
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(raw: &str) -> Self {
        Self {
            html: Html::parse_document(raw),
        }
    }

    pub fn find_all(&self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = compile(selector)?;
        Ok(self.html.select(&sel).map(Element).collect())
    }

    pub fn find_first(&self, selector: &str) -> Result<Option<Element<'_>>> {
        Ok(self.find_all(selector)?.into_iter().next())
    }
}

/// An element borrowed from a [`Document`].
#[derive(Clone, Copy, Debug)]
pub struct Element<'a>(ElementRef<'a>);

impl HtmlNode for Element<'_> {
    fn find_all(&self, selector: &str) -> Result<Vec<Self>> {
        let sel = compile(selector)?;
        Ok(self.0.select(&sel).map(Element).collect())
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.0.value().attr(name).map(str::to_string)
    }

    fn inner_html(&self) -> String {
        self.0.inner_html()
    }

    fn text(&self) -> String {
        self.0.text().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <div id="outer">
          <p class="a" data-x="1">one <b>bold</b></p>
          <p class="a">two</p>
        </div>"#;

    #[test]
    fn finds_elements_in_document_order() {
        let doc = Document::parse(PAGE);
        let found = doc.find_all("#outer p.a").unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].text(), "one bold");
        assert_eq!(found[1].text(), "two");
    }

    #[test]
    fn reads_attributes_and_inner_html() {
        let doc = Document::parse(PAGE);
        let first = doc.find_first("p.a").unwrap().unwrap();
        assert_eq!(first.attribute("data-x").as_deref(), Some("1"));
        assert_eq!(first.attribute("missing"), None);
        assert_eq!(first.inner_html(), "one <b>bold</b>");
    }

    #[test]
    fn nested_queries_stay_inside_the_element() {
        let doc = Document::parse(PAGE);
        let outer = doc.find_first("#outer").unwrap().unwrap();
        assert!(outer.contains("b").unwrap());
        let second = outer.find_all("p").unwrap()[1];
        assert!(!second.contains("b").unwrap());
    }

    #[test]
    fn invalid_selector_is_a_structure_error() {
        let doc = Document::parse(PAGE);
        let err = doc.find_all("p[").unwrap_err();
        assert!(matches!(err, RelayError::Structure(_)));
    }
}
