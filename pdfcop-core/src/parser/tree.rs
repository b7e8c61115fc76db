//! Parse tree for validated content streams
//!
//! A successful parse yields a tree of [`Group`] nodes (non-terminal
//! productions such as `pathObject` or `textObject`) whose leaves are
//! [`Invocation`]s: an operator keyword with its ordered operands.
//! The tree is immutable once built.

use super::operands::{Operand, PdfString};
use super::operators::OperatorCategory;
use super::Span;
use std::fmt;
use std::io;

/// Grammar productions of the content stream language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Production {
    // Grouping productions
    Content,
    PathObject,
    PathConstruction,
    TextObject,
    GraphicsStateBlock,
    MarkedContent,
    Compatibility,
    InlineImage,

    // Path construction
    MoveTo,
    LineTo,
    CurveTo,
    CurveTo2,
    CurveTo3,
    ClosePath,
    Rectangle,

    // Path painting and clipping
    PathPainting,
    EndPath,
    Clipping,

    // Text
    BeginText,
    EndText,
    CharacterSpace,
    WordSpace,
    HorizontalScale,
    Leading,
    TextFont,
    TextRender,
    TextRise,
    MoveText,
    MoveTextLeading,
    TextMatrix,
    NextLine,
    ShowText,
    ShowTextArray,
    NextLineShowText,
    NextLineShowTextSpaced,

    // Graphics state
    SaveState,
    RestoreState,
    ConcatMatrix,
    LineWidth,
    LineCap,
    LineJoin,
    MiterLimit,
    DashPattern,
    RenderingIntent,
    Flatness,
    ExtGState,

    // Color
    ColorSpace,
    Color,
    ColorN,
    Gray,
    Rgb,
    Cmyk,

    // Everything else
    Shading,
    DObject,
    GlyphWidth,
    GlyphWidthBoundingBox,
    BeginInlineImage,
    InlineImageData,
    EndInlineImage,
    MarkedContentPoint,
    BeginMarkedContent,
    EndMarkedContent,
    BeginCompatibility,
    EndCompatibility,
    /// Operator outside the catalog, tolerated inside `BX`...`EX`
    UnknownOperator,
}

impl Production {
    /// Grammar rule name
    pub fn name(&self) -> &'static str {
        match self {
            Production::Content => "content",
            Production::PathObject => "pathObject",
            Production::PathConstruction => "pathConstruction",
            Production::TextObject => "textObject",
            Production::GraphicsStateBlock => "graphicsStateBlock",
            Production::MarkedContent => "markedContent",
            Production::Compatibility => "compatibility",
            Production::InlineImage => "inlineImage",
            Production::MoveTo => "moveTo",
            Production::LineTo => "lineTo",
            Production::CurveTo => "curveTo",
            Production::CurveTo2 => "curveTo2",
            Production::CurveTo3 => "curveTo3",
            Production::ClosePath => "closePath",
            Production::Rectangle => "rectangle",
            Production::PathPainting => "pathPainting",
            Production::EndPath => "endPath",
            Production::Clipping => "clipping",
            Production::BeginText => "beginText",
            Production::EndText => "endText",
            Production::CharacterSpace => "characterSpace",
            Production::WordSpace => "wordSpace",
            Production::HorizontalScale => "horizontalScale",
            Production::Leading => "leading",
            Production::TextFont => "textFont",
            Production::TextRender => "textRender",
            Production::TextRise => "textRise",
            Production::MoveText => "moveText",
            Production::MoveTextLeading => "moveTextLeading",
            Production::TextMatrix => "textMatrix",
            Production::NextLine => "nextLine",
            Production::ShowText => "showText",
            Production::ShowTextArray => "showTextArray",
            Production::NextLineShowText => "nextLineShowText",
            Production::NextLineShowTextSpaced => "nextLineShowTextSpaced",
            Production::SaveState => "saveState",
            Production::RestoreState => "restoreState",
            Production::ConcatMatrix => "concatMatrix",
            Production::LineWidth => "lineWidth",
            Production::LineCap => "lineCap",
            Production::LineJoin => "lineJoin",
            Production::MiterLimit => "miterLimit",
            Production::DashPattern => "dashPattern",
            Production::RenderingIntent => "renderingIntent",
            Production::Flatness => "flatness",
            Production::ExtGState => "extGState",
            Production::ColorSpace => "colorSpace",
            Production::Color => "color",
            Production::ColorN => "colorN",
            Production::Gray => "gray",
            Production::Rgb => "rgb",
            Production::Cmyk => "cmyk",
            Production::Shading => "shading",
            Production::DObject => "dobject",
            Production::GlyphWidth => "glyphWidth",
            Production::GlyphWidthBoundingBox => "glyphWidthBoundingBox",
            Production::BeginInlineImage => "beginInlineImage",
            Production::InlineImageData => "inlineImageData",
            Production::EndInlineImage => "endInlineImage",
            Production::MarkedContentPoint => "markedContentPoint",
            Production::BeginMarkedContent => "beginMarkedContent",
            Production::EndMarkedContent => "endMarkedContent",
            Production::BeginCompatibility => "beginCompatibility",
            Production::EndCompatibility => "endCompatibility",
            Production::UnknownOperator => "unknownOperator",
        }
    }

    /// Whether the production builds a [`Group`] rather than an [`Invocation`]
    pub fn is_grouping(&self) -> bool {
        matches!(
            self,
            Production::Content
                | Production::PathObject
                | Production::PathConstruction
                | Production::TextObject
                | Production::GraphicsStateBlock
                | Production::MarkedContent
                | Production::Compatibility
                | Production::InlineImage
        )
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One operator together with the operands preceding it
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Invocation {
    pub(crate) production: Production,
    pub(crate) operator: String,
    /// `None` for operators outside the catalog
    pub(crate) category: Option<OperatorCategory>,
    pub(crate) operands: Vec<Operand>,
    /// First operand token through the operator token
    pub(crate) span: Span,
}

impl Invocation {
    pub fn production(&self) -> Production {
        self.production
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }

    pub fn category(&self) -> Option<OperatorCategory> {
        self.category
    }

    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn operand(&self, index: usize) -> Option<&Operand> {
        self.operands.get(index)
    }

    pub fn number(&self, index: usize) -> Option<f64> {
        self.operand(index)?.as_number()
    }

    pub fn integer(&self, index: usize) -> Option<i64> {
        self.operand(index)?.as_integer()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.operand(index)?.as_name()
    }

    pub fn string(&self, index: usize) -> Option<&PdfString> {
        self.operand(index)?.as_string()
    }

    pub fn array(&self, index: usize) -> Option<&[Operand]> {
        self.operand(index)?.as_array()
    }

    pub fn dictionary(&self, index: usize) -> Option<&[(String, Operand)]> {
        self.operand(index)?.as_dictionary()
    }

    /// All operands as numbers, if every operand is numeric
    pub fn numbers(&self) -> Option<Vec<f64>> {
        self.operands.iter().map(Operand::as_number).collect()
    }

    /// Byte-exact serialization; unlike `Display` it keeps inline image data intact
    pub fn write_to<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        for operand in &self.operands {
            operand.write_to(out)?;
            out.write_all(b" ")?;
        }
        out.write_all(self.operator.as_bytes())
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for operand in &self.operands {
            write!(f, "{operand} ")?;
        }
        f.write_str(&self.operator)
    }
}

/// A non-terminal production and its ordered children
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Group {
    pub(crate) production: Production,
    pub(crate) children: Vec<Node>,
    pub(crate) span: Span,
}

impl Group {
    pub(crate) fn new(production: Production, children: Vec<Node>) -> Self {
        let span = match (children.first(), children.last()) {
            (Some(first), Some(last)) => first.span().to(last.span()),
            _ => Span::default(),
        };
        Self {
            production,
            children,
            span,
        }
    }

    pub fn production(&self) -> Production {
        self.production
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.children.get(index)
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// Every invocation below this group, depth-first in document order
    pub fn invocations(&self) -> Invocations<'_> {
        Invocations {
            stack: vec![self.children.iter()],
        }
    }

    /// Writes every invocation of the group, separated by single spaces
    pub fn write_to<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        for (i, invocation) in self.invocations().enumerate() {
            if i > 0 {
                out.write_all(b" ")?;
            }
            invocation.write_to(out)?;
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        // Writing into a Vec cannot fail
        let _ = self.write_to(&mut out);
        out
    }
}

/// Parse tree node
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Node {
    Invocation(Invocation),
    Group(Group),
}

impl Node {
    pub fn production(&self) -> Production {
        match self {
            Node::Invocation(invocation) => invocation.production,
            Node::Group(group) => group.production,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Node::Invocation(invocation) => invocation.span,
            Node::Group(group) => group.span,
        }
    }

    /// Children of a group; invocations are leaves
    pub fn child_count(&self) -> usize {
        match self {
            Node::Invocation(_) => 0,
            Node::Group(group) => group.child_count(),
        }
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.as_group()?.child(index)
    }

    pub fn as_invocation(&self) -> Option<&Invocation> {
        match self {
            Node::Invocation(invocation) => Some(invocation),
            Node::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Node::Group(group) => Some(group),
            Node::Invocation(_) => None,
        }
    }
}

impl From<Invocation> for Node {
    fn from(invocation: Invocation) -> Self {
        Node::Invocation(invocation)
    }
}

impl From<Group> for Node {
    fn from(group: Group) -> Self {
        Node::Group(group)
    }
}

/// Depth-first iterator over the invocations of a subtree
pub struct Invocations<'a> {
    stack: Vec<std::slice::Iter<'a, Node>>,
}

impl<'a> Iterator for Invocations<'a> {
    type Item = &'a Invocation;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let iter = self.stack.last_mut()?;
            match iter.next() {
                Some(Node::Invocation(invocation)) => return Some(invocation),
                Some(Node::Group(group)) => self.stack.push(group.children.iter()),
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// Callbacks for a depth-first traversal of the tree
pub trait TreeListener {
    fn enter_group(&mut self, _group: &Group) {}

    fn exit_group(&mut self, _group: &Group) {}

    fn visit_invocation(&mut self, _invocation: &Invocation) {}
}

/// Walks `node` depth-first, notifying `listener` in document order
pub fn walk<L: TreeListener + ?Sized>(node: &Node, listener: &mut L) {
    match node {
        Node::Invocation(invocation) => listener.visit_invocation(invocation),
        Node::Group(group) => {
            listener.enter_group(group);
            for child in &group.children {
                walk(child, listener);
            }
            listener.exit_group(group);
        }
    }
}

/// A fully validated content stream
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ContentStream {
    root: Group,
}

impl ContentStream {
    pub(crate) fn new(root: Group) -> Self {
        Self { root }
    }

    /// Root `content` group
    pub fn root(&self) -> &Group {
        &self.root
    }

    /// Top-level productions, in order
    pub fn children(&self) -> &[Node] {
        &self.root.children
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }

    pub fn invocations(&self) -> Invocations<'_> {
        self.root.invocations()
    }

    pub fn operator_count(&self) -> usize {
        self.invocations().count()
    }

    pub fn walk<L: TreeListener + ?Sized>(&self, listener: &mut L) {
        listener.enter_group(&self.root);
        for child in &self.root.children {
            walk(child, listener);
        }
        listener.exit_group(&self.root);
    }

    /// The stream re-serialized from its invocations
    pub fn to_bytes(&self) -> Vec<u8> {
        self.root.to_bytes()
    }

    pub fn into_root(self) -> Group {
        self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation(operator: &str, operands: Vec<Operand>, start: usize) -> Invocation {
        Invocation {
            production: Production::UnknownOperator,
            operator: operator.to_string(),
            category: None,
            operands,
            span: Span::new(start, start + 1),
        }
    }

    fn sample() -> Group {
        let construction = Group::new(
            Production::PathConstruction,
            vec![
                invocation("m", vec![Operand::Integer(0), Operand::Integer(0)], 0).into(),
                invocation("l", vec![Operand::Integer(1), Operand::Integer(1)], 6).into(),
            ],
        );
        let path = Group::new(
            Production::PathObject,
            vec![construction.into(), invocation("S", vec![], 12).into()],
        );
        Group::new(
            Production::Content,
            vec![path.into(), invocation("Q", vec![], 14).into()],
        )
    }

    #[test]
    fn test_group_bytes_in_document_order() {
        assert_eq!(sample().to_bytes(), b"0 0 m 1 1 l S Q");

        let data = invocation("EI", vec![Operand::InlineData(vec![0x80, b' ', 0xFF])], 0);
        let mut out = Vec::new();
        data.write_to(&mut out).unwrap();
        assert_eq!(out, b"\x80 \xFF EI");
    }

    #[test]
    fn test_group_span_covers_children() {
        let root = sample();
        assert_eq!(root.span(), Span::new(0, 15));
        assert_eq!(root.child_count(), 2);
        assert_eq!(root.child(0).unwrap().child_count(), 2);
        assert!(root.child(5).is_none());
    }

    #[test]
    fn test_invocations_in_document_order() {
        let root = sample();
        let operators: Vec<&str> = root.invocations().map(Invocation::operator).collect();
        assert_eq!(operators, vec!["m", "l", "S", "Q"]);
    }

    #[test]
    fn test_walk_events() {
        #[derive(Default)]
        struct Recorder(Vec<String>);

        impl TreeListener for Recorder {
            fn enter_group(&mut self, group: &Group) {
                self.0.push(format!("+{}", group.production()));
            }
            fn exit_group(&mut self, group: &Group) {
                self.0.push(format!("-{}", group.production()));
            }
            fn visit_invocation(&mut self, invocation: &Invocation) {
                self.0.push(invocation.operator().to_string());
            }
        }

        let stream = ContentStream::new(sample());
        let mut recorder = Recorder::default();
        stream.walk(&mut recorder);
        assert_eq!(
            recorder.0,
            vec![
                "+content",
                "+pathObject",
                "+pathConstruction",
                "m",
                "l",
                "-pathConstruction",
                "S",
                "-pathObject",
                "Q",
                "-content"
            ]
        );
        assert_eq!(stream.operator_count(), 4);
    }

    #[test]
    fn test_invocation_accessors_and_display() {
        let inv = invocation(
            "Tf",
            vec![Operand::Name("F1".to_string()), Operand::Real(12.0)],
            0,
        );
        assert_eq!(inv.name(0), Some("F1"));
        assert_eq!(inv.number(1), Some(12.0));
        assert_eq!(inv.name(1), None);
        assert_eq!(inv.integer(1), None);
        assert!(inv.operand(2).is_none());
        assert_eq!(inv.numbers(), None);
        assert_eq!(inv.to_string(), "/F1 12.0 Tf");
    }

    #[test]
    fn test_production_names() {
        assert_eq!(Production::DObject.name(), "dobject");
        assert_eq!(Production::CurveTo2.to_string(), "curveTo2");
        assert!(Production::PathObject.is_grouping());
        assert!(!Production::EndPath.is_grouping());
    }
}
