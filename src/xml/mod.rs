//! Owned XML document tree built from the `quick-xml` event stream.
//!
//! The NAADSM grammar is walked tree-style (find a child path, list every
//! descendant of a given tag), so events are assembled into a small `Element`
//! tree up front. The builder also tracks in-scope `xmlns:` declarations:
//! legacy parameter files use an `xdf:` prefix without declaring it, and the
//! recovery reader needs that defect surfaced as a distinct error.

pub mod recovery;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::{ParseError, Result};

/// One XML element: local tag name, attributes, child elements and text.
///
/// Tag names are stored without their namespace prefix; `xmlns` declaration
/// attributes are consumed by the builder and do not appear in `attributes`.
#[derive(Debug, Clone, Default)]
pub struct Element {
    pub tag: String,
    pub attributes: FxHashMap<String, String>,
    pub children: Vec<Element>,
    pub text: String,
}

impl Element {
    fn new(tag: String) -> Self {
        Self {
            tag,
            ..Self::default()
        }
    }

    /// Attribute value, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// First child element, regardless of tag.
    pub fn first_child(&self) -> Option<&Element> {
        self.children.first()
    }

    /// First direct child with the given tag.
    pub fn child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// First element at a `/`-separated direct-child path,
    /// e.g. `location/latitude`.
    pub fn find(&self, path: &str) -> Option<&Element> {
        let mut current = self;
        for tag in path.split('/') {
            current = current.child(tag)?;
        }
        Some(current)
    }

    /// Direct children with the given tag, in document order.
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// Every descendant element in document order, excluding `self`.
    pub fn descendants(&self) -> Descendants<'_> {
        let mut stack: Vec<&Element> = Vec::new();
        stack.extend(self.children.iter().rev());
        Descendants { stack }
    }

    /// Descendants with the given tag, at any depth, in document order.
    pub fn deep_find_all<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> {
        self.descendants().filter(move |e| e.tag == tag)
    }

    /// First descendant with the given tag, at any depth.
    pub fn deep_find(&self, tag: &str) -> Option<&Element> {
        self.descendants().find(|e| e.tag == tag)
    }

    /// Whether any descendant with the given tag exists.
    pub fn has_deep(&self, tag: &str) -> bool {
        self.deep_find(tag).is_some()
    }

    /// Element at `path`, or a `MissingValue` error naming both the path and
    /// the enclosing element.
    pub fn required(&self, path: &str) -> Result<&Element> {
        self.find(path).ok_or_else(|| ParseError::MissingValue {
            tag: path.to_string(),
            element: self.tag.clone(),
        })
    }

    /// Text of the element at `path`; absent element or empty text is a
    /// `MissingValue` error naming both the path and the enclosing element.
    pub fn required_text(&self, path: &str) -> Result<&str> {
        match self.find(path) {
            Some(el) if !el.text.is_empty() => Ok(&el.text),
            _ => Err(ParseError::MissingValue {
                tag: path.to_string(),
                element: self.tag.clone(),
            }),
        }
    }

    /// Required numeric text at `path`.
    pub fn required_f64(&self, path: &str) -> Result<f64> {
        let text = self.required_text(path)?;
        parse_f64(text, &self.tag)
    }

    /// Required integer text at `path`.
    pub fn required_i32(&self, path: &str) -> Result<i32> {
        let text = self.required_text(path)?;
        text.trim()
            .parse()
            .map_err(|_| ParseError::InvalidNumber {
                text: text.to_string(),
                element: self.tag.clone(),
            })
    }

    /// Numeric text at `path`, or `None` when the element is absent.
    /// A present element with non-numeric text is still an error.
    pub fn optional_f64(&self, path: &str) -> Result<Option<f64>> {
        match self.find(path) {
            Some(el) => parse_f64(&el.text, &self.tag).map(Some),
            None => Ok(None),
        }
    }

    /// Integer text at `path`, or `None` when the element is absent.
    pub fn optional_i32(&self, path: &str) -> Result<Option<i32>> {
        match self.find(path) {
            Some(el) => el
                .text
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| ParseError::InvalidNumber {
                    text: el.text.clone(),
                    element: self.tag.clone(),
                }),
            None => Ok(None),
        }
    }

    /// NAADSM boolean text: `1`, `y`, `yes`, `t` and `true` are true.
    pub fn bool_value(&self) -> bool {
        matches!(
            self.text.to_lowercase().as_str(),
            "1" | "y" | "yes" | "t" | "true"
        )
    }

    /// Numeric value of this element's own text.
    pub fn f64_value(&self) -> Result<f64> {
        parse_f64(&self.text, &self.tag)
    }
}

/// Parse a float, reporting the enclosing element on failure.
pub(crate) fn parse_f64(text: &str, element: &str) -> Result<f64> {
    text.trim()
        .parse()
        .map_err(|_| ParseError::InvalidNumber {
            text: text.to_string(),
            element: element.to_string(),
        })
}

/// Depth-first, document-order iterator over descendant elements.
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let el = self.stack.pop()?;
        self.stack.extend(el.children.iter().rev());
        Some(el)
    }
}

/// Parse a complete document and return its root element.
///
/// Fails with `UnboundPrefix` when a tag or attribute uses a namespace prefix
/// with no `xmlns:` declaration in scope; the recovery reader relies on
/// telling that defect apart from every other parse error.
pub fn parse_document(text: &str) -> Result<Element> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    // One entry per open element: the prefixes its xmlns: attributes declare.
    let mut scopes: Vec<SmallVec<[String; 2]>> = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                let element = open_element(&start, &mut scopes)?;
                stack.push(element);
            }
            Ok(Event::Empty(start)) => {
                let element = open_element(&start, &mut scopes)?;
                scopes.pop();
                attach(element, &mut stack, &mut root)?;
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().map_err(|e| ParseError::Xml(e.to_string()))?;
                if let Some(parent) = stack.last_mut() {
                    parent.text.push_str(text.trim());
                }
            }
            Ok(Event::CData(t)) => {
                if let Some(parent) = stack.last_mut() {
                    let raw = String::from_utf8_lossy(&t);
                    parent.text.push_str(raw.trim());
                }
            }
            Ok(Event::End(_)) => {
                scopes.pop();
                let element = stack
                    .pop()
                    .ok_or_else(|| ParseError::Xml("unbalanced end tag".to_string()))?;
                attach(element, &mut stack, &mut root)?;
            }
            Ok(Event::Eof) => break,
            // Declarations, comments, processing instructions, doctypes
            Ok(_) => {}
            Err(e) => return Err(ParseError::Xml(e.to_string())),
        }
    }

    if !stack.is_empty() {
        return Err(ParseError::Xml("unclosed element at end of input".to_string()));
    }
    root.ok_or_else(|| ParseError::Xml("document has no root element".to_string()))
}

/// Build an `Element` from a start tag, recording and checking namespace
/// prefixes. Pushes a scope entry that the caller pops on the matching end.
fn open_element(
    start: &quick_xml::events::BytesStart<'_>,
    scopes: &mut Vec<SmallVec<[String; 2]>>,
) -> Result<Element> {
    let raw_name = String::from_utf8_lossy(start.name().as_ref()).into_owned();

    let mut declared: SmallVec<[String; 2]> = SmallVec::new();
    let mut attributes: Vec<(String, String)> = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| ParseError::Xml(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| ParseError::Xml(e.to_string()))?
            .into_owned();
        if key == "xmlns" {
            continue;
        }
        if let Some(prefix) = key.strip_prefix("xmlns:") {
            declared.push(prefix.to_string());
            continue;
        }
        attributes.push((key, value));
    }
    scopes.push(declared);

    check_prefix(&raw_name, scopes)?;
    for (key, _) in &attributes {
        check_prefix(key, scopes)?;
    }

    let local = raw_name.rsplit(':').next().unwrap_or(&raw_name).to_string();
    let mut element = Element::new(local);
    element.attributes = attributes.into_iter().collect();
    Ok(element)
}

fn check_prefix(name: &str, scopes: &[SmallVec<[String; 2]>]) -> Result<()> {
    let Some((prefix, _)) = name.split_once(':') else {
        return Ok(());
    };
    if prefix == "xml" || prefix == "xmlns" {
        return Ok(());
    }
    if scopes.iter().any(|s| s.iter().any(|p| p == prefix)) {
        return Ok(());
    }
    Err(ParseError::UnboundPrefix(prefix.to_string()))
}

fn attach(element: Element, stack: &mut Vec<Element>, root: &mut Option<Element>) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_some() {
                return Err(ParseError::Xml("multiple root elements".to_string()));
            }
            *root = Some(element);
        }
    }
    Ok(())
}
