//! A small retained XML element tree.
//!
//! Elements are addressed by stable [`ElementId`] handles so that a writer can come
//! back to an element it created earlier and update it in place. Re-serializing an
//! entity therefore refreshes its element instead of appending a duplicate.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(usize);

#[derive(Debug, Clone)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<ElementId>,
}

impl Element {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct XmlTree {
    elements: Vec<Element>,
}

impl XmlTree {
    pub fn new(root_name: &str) -> Self {
        Self {
            elements: vec![Element::new(root_name)],
        }
    }

    pub fn root(&self) -> ElementId {
        ElementId(0)
    }

    /// Appends a new, empty child element to `parent`.
    pub fn add_element(&mut self, parent: ElementId, name: &str) -> ElementId {
        let id = ElementId(self.elements.len());
        self.elements.push(Element::new(name));
        self.elements[parent.0].children.push(id);
        id
    }

    /// Sets an attribute, replacing an existing value without changing its position.
    pub fn set_attr(&mut self, element: ElementId, name: &str, value: &str) {
        let attributes = &mut self.elements[element.0].attributes;
        match attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => attributes.push((name.to_string(), value.to_string())),
        }
    }

    /// Moves `leading` to the front of `parent`'s children in the given order.
    /// The other children keep their relative order.
    pub fn move_to_front(&mut self, parent: ElementId, leading: &[ElementId]) {
        let children = &mut self.elements[parent.0].children;
        children.retain(|child| !leading.contains(child));
        children.splice(0..0, leading.iter().copied());
    }

    pub fn attr(&self, element: ElementId, name: &str) -> Option<&str> {
        self.elements[element.0]
            .attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_text(&mut self, element: ElementId, text: &str) {
        self.elements[element.0].text = Some(text.to_string());
    }

    pub fn children(&self, element: ElementId) -> &[ElementId] {
        &self.elements[element.0].children
    }

    pub fn name(&self, element: ElementId) -> &str {
        &self.elements[element.0].name
    }

    /// Total number of elements, the root included.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Renders the document with an XML declaration and two-space indentation.
    pub fn write_to_string(&self) -> Result<String, String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|e| e.to_string())?;
        self.write_element(&mut writer, self.root())?;
        String::from_utf8(writer.into_inner()).map_err(|e| e.to_string())
    }

    fn write_element(&self, writer: &mut Writer<Vec<u8>>, id: ElementId) -> Result<(), String> {
        let element = &self.elements[id.0];
        let mut start = BytesStart::new(element.name.as_str());
        for (name, value) in &element.attributes {
            start.push_attribute((name.as_str(), value.as_str()));
        }

        if element.children.is_empty() && element.text.is_none() {
            return writer
                .write_event(Event::Empty(start))
                .map_err(|e| e.to_string());
        }

        writer
            .write_event(Event::Start(start))
            .map_err(|e| e.to_string())?;
        if let Some(text) = &element.text {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(|e| e.to_string())?;
        }
        for child in &element.children {
            self.write_element(writer, *child)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(element.name.as_str())))
            .map_err(|e| e.to_string())
    }
}
