use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use quick_xml::escape::{partial_escape, unescape};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{Result, XmlError};
use crate::xml::path::{ElementPath, Segment};

/// A node in the document tree
#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    /// Character data, escaped as written (character references included)
    Text(String),
    CData(String),
    /// Raw comment body, between `<!--` and `-->`
    Comment(String),
    /// Raw instruction body, between `<?` and `?>`
    ProcessingInstruction(String),
    Declaration(BytesDecl<'static>),
    /// Raw DOCTYPE body
    DocType(String),
}

impl Node {
    /// The element, if this node is one
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Mutable counterpart of [`Node::as_element`]
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    fn is_text(&self) -> bool {
        matches!(self, Node::Text(_) | Node::CData(_))
    }
}

/// An XML element with its attributes and ordered children
#[derive(Debug, Clone)]
pub struct Element {
    name: String,
    /// Start tag content between `<` and `>`, written back verbatim so
    /// attribute quoting and spacing survive
    raw_start: String,
    /// Unescaped attribute values, for lookup
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
    /// Written as `<name/>` in the source
    self_closing: bool,
}

impl Element {
    /// An element with no attributes or children
    pub fn new<S: Into<String>>(name: S) -> Self {
        let name = name.into();
        Self {
            raw_start: name.clone(),
            name,
            attributes: Vec::new(),
            children: Vec::new(),
            self_closing: false,
        }
    }

    /// Tag name, including any namespace prefix
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unescaped value of an attribute
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// Every child node, in document order
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Child elements only, in document order
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> + '_ {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Mutable counterpart of [`Element::child_elements`]
    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut Element> + '_ {
        self.children.iter_mut().filter_map(Node::as_element_mut)
    }

    /// All elements matching `path` below this one, in document order
    pub fn select(&self, path: &ElementPath) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect(path.segments(), &mut found);
        found
    }

    /// First element matching `path` in document order
    pub fn first(&self, path: &ElementPath) -> Option<&Element> {
        self.find(path, |_| true)
    }

    /// Mutable counterpart of [`Element::first`]
    pub fn first_mut(&mut self, path: &ElementPath) -> Option<&mut Element> {
        self.find_mut(path, |_| true)
    }

    /// First element matching `path` that also satisfies `predicate`
    pub fn find<P>(&self, path: &ElementPath, predicate: P) -> Option<&Element>
    where
        P: Fn(&Element) -> bool,
    {
        self.find_at(path.segments(), &predicate)
    }

    /// Mutable counterpart of [`Element::find`]
    pub fn find_mut<P>(&mut self, path: &ElementPath, predicate: P) -> Option<&mut Element>
    where
        P: Fn(&Element) -> bool,
    {
        self.find_mut_at(path.segments(), &predicate)
    }

    /// Call `visit` on every element matching `path`, in document order,
    /// stopping at the first error
    pub fn for_each_mut<E, F>(&mut self, path: &ElementPath, visit: &mut F) -> std::result::Result<(), E>
    where
        F: FnMut(&mut Element) -> std::result::Result<(), E>,
    {
        self.visit_mut(path.segments(), visit)
    }

    /// Concatenated text and CDATA content of the direct children, unescaped
    pub fn text(&self) -> String {
        let mut content = String::new();
        for node in &self.children {
            match node {
                // validated on load; set_text only stores escaped output
                Node::Text(raw) => match unescape(raw) {
                    Ok(text) => content.push_str(&text),
                    Err(_) => content.push_str(raw),
                },
                Node::CData(text) => content.push_str(text),
                _ => {}
            }
        }
        content
    }

    /// Replace the direct text content, leaving child elements in place
    pub fn set_text<S: Into<String>>(&mut self, text: S) {
        let position = self.children.iter().position(Node::is_text);
        self.children.retain(|node| !node.is_text());

        let text = text.into();
        let node = Node::Text(partial_escape(text.as_str()).into_owned());
        match position {
            Some(index) => self.children.insert(index, node),
            None => self.children.push(node),
        }
    }

    fn collect<'a>(&'a self, segments: &[Segment], found: &mut Vec<&'a Element>) {
        match segments.split_first() {
            None => found.push(self),
            Some((head, rest)) => {
                for child in self.child_elements().filter(|child| head.matches(&child.name)) {
                    child.collect(rest, found);
                }
            }
        }
    }

    fn find_at(&self, segments: &[Segment], predicate: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        let Some((head, rest)) = segments.split_first() else {
            return predicate(self).then_some(self);
        };
        self.child_elements()
            .filter(|child| head.matches(&child.name))
            .find_map(|child| child.find_at(rest, predicate))
    }

    fn find_mut_at(&mut self, segments: &[Segment], predicate: &dyn Fn(&Element) -> bool) -> Option<&mut Element> {
        let Some((head, rest)) = segments.split_first() else {
            return if predicate(self) { Some(self) } else { None };
        };
        self.child_elements_mut()
            .filter(|child| head.matches(&child.name))
            .find_map(|child| child.find_mut_at(rest, predicate))
    }

    fn visit_mut<E, F>(&mut self, segments: &[Segment], visit: &mut F) -> std::result::Result<(), E>
    where
        F: FnMut(&mut Element) -> std::result::Result<(), E>,
    {
        let Some((head, rest)) = segments.split_first() else {
            return visit(self);
        };
        for child in self.child_elements_mut() {
            if head.matches(&child.name) {
                child.visit_mut(rest, visit)?;
            }
        }
        Ok(())
    }
}

/// A loaded XML document: prolog, one root element, epilog
#[derive(Debug, Clone)]
pub struct Document {
    prolog: Vec<Node>,
    root: Element,
    epilog: Vec<Node>,
}

impl Document {
    /// Load a document from an XML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Ok(Self::from_reader(BufReader::new(file))?)
    }

    /// Load a document from a string
    pub fn parse(xml: &str) -> std::result::Result<Self, XmlError> {
        Self::from_reader(xml.as_bytes())
    }

    /// Build the tree from a stream, keeping whitespace and markup as read
    pub fn from_reader<R: BufRead>(input: R) -> std::result::Result<Self, XmlError> {
        let mut reader = Reader::from_reader(input);
        let mut builder = TreeBuilder::default();
        let mut buf = Vec::new();

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| XmlError::ParseFailed {
                    position: reader.buffer_position() as u64,
                    reason: e.to_string(),
                })?;

            match event {
                Event::Start(start) => builder.open(element_from_start(&start, false)?)?,
                Event::Empty(start) => builder.push(Node::Element(element_from_start(&start, true)?))?,
                Event::End(_) => builder.close()?,
                Event::Text(text) => {
                    text.unescape().map_err(|e| XmlError::ParseFailed {
                        position: reader.buffer_position() as u64,
                        reason: e.to_string(),
                    })?;
                    builder.push(Node::Text(utf8(&text)?.to_string()))?;
                }
                Event::CData(data) => builder.push(Node::CData(utf8(&data)?.to_string()))?,
                Event::Comment(comment) => builder.push(Node::Comment(utf8(&comment)?.to_string()))?,
                Event::PI(pi) => builder.push(Node::ProcessingInstruction(utf8(&pi)?.to_string()))?,
                Event::Decl(decl) => builder.push(Node::Declaration(decl.into_owned()))?,
                Event::DocType(doctype) => builder.push(Node::DocType(utf8(&doctype)?.to_string()))?,
                Event::Eof => break,
            }
            buf.clear();
        }

        builder.finish()
    }

    /// The single root element
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Mutable counterpart of [`Document::root`]
    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// Elements matching `path`, whose first segment is matched against the root
    pub fn select(&self, path: &ElementPath) -> Vec<&Element> {
        let mut found = Vec::new();
        if let Some((head, rest)) = path.segments().split_first() {
            if head.matches(&self.root.name) {
                self.root.collect(rest, &mut found);
            }
        }
        found
    }

    /// Mutable counterpart of [`Document::select`]
    pub fn for_each_mut<E, F>(&mut self, path: &ElementPath, visit: &mut F) -> std::result::Result<(), E>
    where
        F: FnMut(&mut Element) -> std::result::Result<(), E>,
    {
        match path.segments().split_first() {
            Some((head, rest)) if head.matches(&self.root.name) => self.root.visit_mut(rest, visit),
            _ => Ok(()),
        }
    }

    /// Serialize the tree without re-indenting it
    pub fn write<W: Write>(&self, output: W) -> std::result::Result<(), XmlError> {
        let mut writer = Writer::new(output);
        for node in &self.prolog {
            write_node(&mut writer, node)?;
        }
        write_element(&mut writer, &self.root)?;
        for node in &self.epilog {
            write_node(&mut writer, node)?;
        }
        Ok(())
    }

    /// Serialize the tree into a string
    pub fn to_xml_string(&self) -> std::result::Result<String, XmlError> {
        let mut output = Vec::new();
        self.write(&mut output)?;
        String::from_utf8(output).map_err(|e| XmlError::WriteFailed { reason: e.to_string() })
    }

    /// Serialize the tree into a file, creating or truncating it
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut output = BufWriter::new(File::create(path.as_ref())?);
        self.write(&mut output)?;
        output.flush()?;
        Ok(())
    }
}

/// Assembles the tree from reader events
#[derive(Default)]
struct TreeBuilder {
    prolog: Vec<Node>,
    open: Vec<Element>,
    root: Option<Element>,
    epilog: Vec<Node>,
}

impl TreeBuilder {
    fn open(&mut self, element: Element) -> std::result::Result<(), XmlError> {
        if self.open.is_empty() && self.root.is_some() {
            return Err(malformed("more than one root element"));
        }
        self.open.push(element);
        Ok(())
    }

    fn close(&mut self) -> std::result::Result<(), XmlError> {
        let element = self
            .open
            .pop()
            .ok_or_else(|| malformed("closing tag without a matching opening tag"))?;
        self.push(Node::Element(element))
    }

    fn push(&mut self, node: Node) -> std::result::Result<(), XmlError> {
        if let Some(parent) = self.open.last_mut() {
            parent.children.push(node);
            return Ok(());
        }

        match node {
            Node::Element(element) => {
                if self.root.is_some() {
                    return Err(malformed("more than one root element"));
                }
                self.root = Some(element);
            }
            Node::Text(text) if text.trim().is_empty() => self.outside_root(Node::Text(text)),
            Node::Text(_) | Node::CData(_) => return Err(malformed("text outside the root element")),
            other => self.outside_root(other),
        }
        Ok(())
    }

    fn outside_root(&mut self, node: Node) {
        if self.root.is_none() {
            self.prolog.push(node);
        } else {
            self.epilog.push(node);
        }
    }

    fn finish(self) -> std::result::Result<Document, XmlError> {
        if let Some(element) = self.open.last() {
            return Err(malformed(&format!("element <{}> is never closed", element.name)));
        }
        let root = self.root.ok_or_else(|| malformed("no root element"))?;
        Ok(Document {
            prolog: self.prolog,
            root,
            epilog: self.epilog,
        })
    }
}

fn element_from_start(start: &BytesStart<'_>, self_closing: bool) -> std::result::Result<Element, XmlError> {
    let mut element = Element::new(utf8(start.name().as_ref())?);
    element.raw_start = utf8(start)?.to_string();
    element.self_closing = self_closing;

    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| malformed(&e.to_string()))?;
        let value = attribute.unescape_value().map_err(|e| malformed(&e.to_string()))?;
        element
            .attributes
            .push((utf8(attribute.key.as_ref())?.to_string(), value.into_owned()));
    }
    Ok(element)
}

fn write_element<W: Write>(writer: &mut Writer<W>, element: &Element) -> std::result::Result<(), XmlError> {
    let start = BytesStart::from_content(element.raw_start.as_str(), element.name.len());

    if element.self_closing && element.children.is_empty() {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    emit(writer, Event::End(BytesEnd::new(element.name.as_str())))
}

fn write_node<W: Write>(writer: &mut Writer<W>, node: &Node) -> std::result::Result<(), XmlError> {
    let event = match node {
        Node::Element(element) => return write_element(writer, element),
        Node::Text(raw) => Event::Text(BytesText::from_escaped(raw.as_str())),
        Node::CData(text) => Event::CData(BytesCData::new(text.as_str())),
        Node::Comment(raw) => Event::Comment(BytesText::from_escaped(raw.as_str())),
        Node::ProcessingInstruction(raw) => Event::PI(BytesPI::new(raw.as_str())),
        Node::Declaration(decl) => Event::Decl(decl.clone()),
        Node::DocType(raw) => Event::DocType(BytesText::from_escaped(raw.as_str())),
    };
    emit(writer, event)
}

fn emit<W: Write>(writer: &mut Writer<W>, event: Event<'_>) -> std::result::Result<(), XmlError> {
    writer
        .write_event(event)
        .map_err(|e| XmlError::WriteFailed { reason: e.to_string() })
}

fn utf8(bytes: &[u8]) -> std::result::Result<&str, XmlError> {
    std::str::from_utf8(bytes).map_err(|e| malformed(&format!("invalid UTF-8: {}", e)))
}

fn malformed(reason: &str) -> XmlError {
    XmlError::Malformed {
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const PROJECT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- exported -->
<xmeml version="5">
  <sequence id="seq-1">
    <name>Main &amp; Backup</name>
    <media>
      <video>
        <track><clipitem id="a"><name>A</name><start>0</start></clipitem></track>
      </video>
      <audio>
        <track><clipitem id="b"><name>B</name><start>5</start></clipitem></track>
        <track><enabled>TRUE</enabled></track>
      </audio>
    </media>
  </sequence>
  <sequence id="seq-2"><name>Second</name><empty/></sequence>
</xmeml>
"#;

    fn path(path: &str) -> ElementPath {
        path.parse().unwrap()
    }

    #[test]
    fn test_unmodified_document_round_trips() {
        let doc = Document::parse(PROJECT).unwrap();
        assert_eq!(doc.to_xml_string().unwrap(), PROJECT);
    }

    #[test]
    fn test_select_with_wildcards_in_document_order() {
        let doc = Document::parse(PROJECT).unwrap();

        let sequences = doc.select(&path("*/sequence"));
        assert_eq!(sequences.len(), 2);
        assert_eq!(sequences[0].attribute("id"), Some("seq-1"));

        let names: Vec<String> = sequences[0]
            .select(&path("media/*/track/clipitem/name"))
            .iter()
            .map(|name| name.text())
            .collect();
        assert_eq!(names, vec!["A", "B"]);

        assert!(doc.select(&path("project/sequence")).is_empty());
    }

    #[test]
    fn test_text_is_unescaped_and_written_back_escaped() {
        let mut doc = Document::parse(PROJECT).unwrap();
        let name_path = path("sequence/name");

        assert_eq!(doc.root().first(&name_path).unwrap().text(), "Main & Backup");

        doc.root_mut().first_mut(&name_path).unwrap().set_text("Cut <1>");
        let xml = doc.to_xml_string().unwrap();
        assert!(xml.contains("<name>Cut &lt;1&gt;</name>"));
    }

    #[test]
    fn test_attribute_quoting_survives_round_trip() {
        let xml = r#"<a b='say "hi"' c="x &amp; y"  d='it&apos;s'/>"#;
        let doc = Document::parse(xml).unwrap();

        let written = doc.to_xml_string().unwrap();
        assert_eq!(written, xml);

        let reloaded = Document::parse(&written).unwrap();
        assert_eq!(reloaded.root().attribute("b"), Some(r#"say "hi""#));
        assert_eq!(reloaded.root().attribute("c"), Some("x & y"));
        assert_eq!(reloaded.root().attribute("d"), Some("it's"));
    }

    #[test]
    fn test_character_references_survive_round_trip() {
        let xml = "<a><b>x&#13;y&#x41;&quot;</b><c>keep</c></a>";
        let mut doc = Document::parse(xml).unwrap();

        assert_eq!(doc.to_xml_string().unwrap(), xml);
        assert_eq!(doc.root().first(&path("b")).unwrap().text(), "x\ryA\"");

        doc.root_mut().first_mut(&path("c")).unwrap().set_text("1 & 2");
        assert_eq!(
            doc.to_xml_string().unwrap(),
            "<a><b>x&#13;y&#x41;&quot;</b><c>1 &amp; 2</c></a>"
        );
        assert_eq!(doc.root().first(&path("c")).unwrap().text(), "1 & 2");
    }

    #[test]
    fn test_for_each_mut_visits_every_match() {
        let mut doc = Document::parse(PROJECT).unwrap();
        let mut visited = 0;

        doc.for_each_mut(&path("*/sequence/media/*/track/clipitem/start"), &mut |start| {
            visited += 1;
            start.set_text("42");
            Ok::<(), XmlError>(())
        })
        .unwrap();

        assert_eq!(visited, 2);
        let starts: Vec<String> = doc
            .select(&path("*/sequence/media/*/track/clipitem/start"))
            .iter()
            .map(|start| start.text())
            .collect();
        assert_eq!(starts, vec!["42", "42"]);
    }

    #[test]
    fn test_for_each_mut_stops_on_error() {
        let mut doc = Document::parse(PROJECT).unwrap();
        let mut visited = 0;

        let result = doc.for_each_mut(&path("*/sequence"), &mut |_| {
            visited += 1;
            Err("stop")
        });

        assert_eq!(result, Err("stop"));
        assert_eq!(visited, 1);
    }

    #[test]
    fn test_find_with_predicate() {
        let mut doc = Document::parse(
            "<track><clipitem id=\"1\"/><clipitem id=\"2\"><name>B</name></clipitem></track>",
        )
        .unwrap();
        let clip = path("clipitem");
        let name = path("name");

        let named = doc.root().find(&clip, |c| c.first(&name).is_some()).unwrap();
        assert_eq!(named.attribute("id"), Some("2"));

        doc.root_mut()
            .find_mut(&clip, |c| c.first(&name).is_some())
            .unwrap()
            .set_text("x");
        assert!(doc.root().find(&clip, |c| c.attribute("id") == Some("3")).is_none());
        assert_eq!(doc.root().first(&clip).unwrap().text(), "");
    }

    #[test]
    fn test_empty_element_gains_text() {
        let mut doc = Document::parse("<a><b/><c k='v' /></a>").unwrap();
        assert_eq!(doc.to_xml_string().unwrap(), "<a><b/><c k='v' /></a>");

        doc.root_mut().first_mut(&path("b")).unwrap().set_text("12");
        doc.root_mut().first_mut(&path("c")).unwrap().set_text("3");
        assert_eq!(doc.to_xml_string().unwrap(), "<a><b>12</b><c k='v' >3</c></a>");
    }

    #[test]
    fn test_set_text_keeps_child_elements() {
        let mut doc = Document::parse("<a>old<b/>tail</a>").unwrap();
        doc.root_mut().set_text("new");
        assert_eq!(doc.to_xml_string().unwrap(), "<a>new<b/></a>");
    }

    #[test]
    fn test_malformed_documents_rejected() {
        assert!(Document::parse("").is_err());
        assert!(Document::parse("<a><b></a>").is_err());
        assert!(Document::parse("<a></a><b></b>").is_err());
        assert!(Document::parse("<a>").is_err());
        assert!(Document::parse("text<a></a>").is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("project.xml");

        let doc = Document::parse(PROJECT).unwrap();
        doc.write_to_file(&file_path).unwrap();

        let reloaded = Document::from_file(&file_path).unwrap();
        assert_eq!(reloaded.to_xml_string().unwrap(), PROJECT);
    }
}
