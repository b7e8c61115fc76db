//! Content Stream Grammar
//!
//! A recursive-descent recognizer for the content stream language. Every
//! production collects the operand run in front of it, then requires its own
//! operator keyword; the operator catalog decides operand count and types.
//! Which production applies at a given point is chosen by one keyword of
//! lookahead: the parser scans past the pending operands to the next operator.
//!
//! ```text
//! content            := contentItem*
//! pathObject         := pathConstruction clipping? (pathPainting | endPath)
//! pathConstruction   := (moveTo | lineTo | curveTo | curveTo2 | curveTo3 | closePath | rectangle)+
//! textObject         := BT textItem* ET
//! graphicsStateBlock := q contentItem* Q
//! markedContent      := (BMC | BDC) item* EMC
//! compatibility      := BX item* EX
//! inlineImage        := BI ID <data> EI
//! ```
//!
//! The first violation aborts the parse. If an [`ErrorListener`] was lent to
//! the parser it sees that error exactly once.

use super::lexer::{ContentTokenizer, Token, TokenKind};
use super::listener::ErrorListener;
use super::operands::{Operand, PdfString};
use super::operators::{self, OperatorCategory, OperatorSpec};
use super::stack_safe::StackSafeContext;
use super::tree::{ContentStream, Group, Invocation, Node, Production};
use super::{ParseError, ParseOptions, ParseResult, Span};

/// Where a content item appears; decides which operators are legal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Page,
    Text,
}

impl Level {
    fn expected(self) -> &'static str {
        match self {
            Level::Page => "an operator allowed at page level",
            Level::Text => "an operator allowed inside a text object",
        }
    }
}

/// Recursive-descent parser over a single content stream
pub struct ContentParser<'a> {
    tokenizer: ContentTokenizer<'a>,
    /// Tokens read so far; the lexer runs only as far as lookahead needs
    tokens: Vec<Token>,
    position: usize,
    options: ParseOptions,
    groups: StackSafeContext,
    containers: StackSafeContext,
    compatibility_depth: usize,
    listener: Option<&'a mut dyn ErrorListener>,
}

impl<'a> ContentParser<'a> {
    /// Parser with default options
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_options(input, ParseOptions::default())
    }

    pub fn with_options(input: &'a [u8], options: ParseOptions) -> Self {
        Self {
            tokenizer: ContentTokenizer::new(input),
            tokens: Vec::new(),
            position: 0,
            groups: StackSafeContext::new("groups", options.max_nesting_depth),
            containers: StackSafeContext::new("arrays or dictionaries", options.max_nesting_depth),
            options,
            compatibility_depth: 0,
            listener: None,
        }
    }

    /// Parser that reports its failure to `listener`
    pub fn with_listener(
        input: &'a [u8],
        options: ParseOptions,
        listener: &'a mut dyn ErrorListener,
    ) -> Self {
        let mut parser = Self::with_options(input, options);
        parser.listener = Some(listener);
        parser
    }

    /// Validates a whole content stream
    pub fn parse(input: &[u8]) -> ParseResult<ContentStream> {
        ContentParser::new(input).content()
    }

    pub fn parse_with_options(input: &[u8], options: ParseOptions) -> ParseResult<ContentStream> {
        ContentParser::with_options(input, options).content()
    }

    /// Runs a single production over `input`, which must be consumed entirely
    pub fn parse_as(input: &[u8], production: Production) -> ParseResult<Node> {
        ContentParser::new(input).parse_production(production)
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// `content`: the whole stream, to end of input
    pub fn content(&mut self) -> ParseResult<ContentStream> {
        let stream = self.run(Production::Content, |parser| {
            parser.parse_content().map(ContentStream::new)
        })?;
        tracing::debug!(
            items = stream.children().len(),
            operators = stream.operator_count(),
            "content stream validated"
        );
        Ok(stream)
    }

    /// Runs `production` and then requires end of stream
    pub fn parse_production(&mut self, production: Production) -> ParseResult<Node> {
        self.run(production, |parser| {
            let node = parser.dispatch(production)?;
            parser.expect_end()?;
            Ok(node)
        })
    }

    pub fn path_object(&mut self) -> ParseResult<Group> {
        self.run(Production::PathObject, Self::parse_path_object)
    }

    pub fn path_construction(&mut self) -> ParseResult<Group> {
        self.run(Production::PathConstruction, Self::parse_path_construction)
    }

    pub fn text_object(&mut self) -> ParseResult<Group> {
        self.run(Production::TextObject, Self::parse_text_object)
    }

    pub fn graphics_state_block(&mut self) -> ParseResult<Group> {
        self.run(
            Production::GraphicsStateBlock,
            Self::parse_graphics_state_block,
        )
    }

    pub fn marked_content(&mut self) -> ParseResult<Group> {
        self.run(Production::MarkedContent, |parser| {
            parser.parse_marked_content(Level::Page)
        })
    }

    pub fn compatibility(&mut self) -> ParseResult<Group> {
        self.run(Production::Compatibility, |parser| {
            parser.parse_compatibility(Level::Page)
        })
    }

    pub fn inline_image(&mut self) -> ParseResult<Group> {
        self.run(Production::InlineImage, Self::parse_inline_image)
    }

    /// Wraps a production entry point: restores nesting state and notifies
    /// the listener when it fails
    fn run<T>(
        &mut self,
        production: Production,
        parse: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        tracing::trace!(
            production = production.name(),
            token = self.position,
            "entering production"
        );
        let depths = (
            self.groups.depth,
            self.containers.depth,
            self.compatibility_depth,
        );

        let result = parse(self);
        if let Err(error) = &result {
            (
                self.groups.depth,
                self.containers.depth,
                self.compatibility_depth,
            ) = depths;
            self.report(error);
        }
        result
    }

    fn report(&mut self, error: &ParseError) {
        tracing::debug!(kind = ?error.kind(), offset = error.offset(), "parse failed: {error}");
        if let Some(listener) = self.listener.as_mut() {
            listener.syntax_error(error);
        }
    }

    fn dispatch(&mut self, production: Production) -> ParseResult<Node> {
        let node: Node = match production {
            Production::Content => self.parse_content()?.into(),
            Production::PathObject => self.parse_path_object()?.into(),
            Production::PathConstruction => self.parse_path_construction()?.into(),
            Production::TextObject => self.parse_text_object()?.into(),
            Production::GraphicsStateBlock => self.parse_graphics_state_block()?.into(),
            Production::MarkedContent => self.parse_marked_content(Level::Page)?.into(),
            Production::Compatibility => self.parse_compatibility(Level::Page)?.into(),
            Production::InlineImage => self.parse_inline_image()?.into(),
            Production::UnknownOperator => self.unknown_operator()?.into(),
            single => self.invocation(single)?.into(),
        };
        Ok(node)
    }

    // Token buffer

    fn fill(&mut self, index: usize) -> ParseResult<()> {
        while self.tokens.len() <= index {
            if self.tokens.last().is_some_and(Token::is_eof) {
                break;
            }
            let token = self.tokenizer.next_token()?;
            self.tokens.push(token);
        }
        Ok(())
    }

    /// Token `n` places ahead; `Eof` past the end
    fn peek_nth(&mut self, n: usize) -> ParseResult<&Token> {
        let index = self.position + n;
        self.fill(index)?;
        // `fill` leaves at least one token, the last one being `Eof` when short
        let last = self.tokens.len() - 1;
        Ok(&self.tokens[index.min(last)])
    }

    fn peek(&mut self) -> ParseResult<&Token> {
        self.peek_nth(0)
    }

    fn advance(&mut self) -> ParseResult<Token> {
        let token = self.peek()?.clone();
        if !token.is_eof() {
            self.position += 1;
        }
        Ok(token)
    }

    /// The operator (or `Eof`) that ends the pending operand run
    fn peek_keyword(&mut self) -> ParseResult<Token> {
        let mut n = 0;
        loop {
            let token = self.peek_nth(n)?;
            if matches!(token.kind, TokenKind::Operator(_) | TokenKind::Eof) {
                return Ok(token.clone());
            }
            n += 1;
        }
    }

    fn peek_spec(&mut self) -> ParseResult<Option<&'static OperatorSpec>> {
        Ok(match self.peek_keyword()?.kind {
            TokenKind::Operator(keyword) => operators::lookup(&keyword),
            _ => None,
        })
    }

    fn expect_end(&mut self) -> ParseResult<()> {
        let token = self.peek()?;
        if token.is_eof() {
            return Ok(());
        }
        Err(ParseError::grammar(
            token.span,
            "end of stream",
            token.kind.describe(),
        ))
    }

    // Operands

    /// The maximal run of operands before the next operator
    fn operands(&mut self) -> ParseResult<(Vec<Operand>, Vec<Span>)> {
        let mut operands = Vec::new();
        let mut spans = Vec::new();
        while !matches!(self.peek()?.kind, TokenKind::Operator(_) | TokenKind::Eof) {
            let (operand, span) = self.operand()?;
            operands.push(operand);
            spans.push(span);
        }
        Ok((operands, spans))
    }

    fn operand(&mut self) -> ParseResult<(Operand, Span)> {
        let token = self.advance()?;
        let span = token.span;
        let operand = match token.kind {
            TokenKind::Integer(i) => Operand::Integer(i),
            TokenKind::Real(r) => Operand::Real(r),
            TokenKind::Boolean(b) => Operand::Boolean(b),
            TokenKind::Null => Operand::Null,
            TokenKind::Name(name) => Operand::Name(name),
            TokenKind::LiteralString(bytes) => Operand::String(PdfString::literal(bytes)),
            TokenKind::HexString(bytes) => Operand::String(PdfString::hex(bytes)),
            TokenKind::InlineData(data) => Operand::InlineData(data),
            TokenKind::ArrayOpen => return self.array(span),
            TokenKind::DictOpen => return self.dictionary(span),
            other => return Err(ParseError::grammar(span, "an operand", other.describe())),
        };
        Ok((operand, span))
    }

    fn array(&mut self, open: Span) -> ParseResult<(Operand, Span)> {
        self.containers.enter(open)?;
        let mut items = Vec::new();
        let close = loop {
            let token = self.peek()?;
            match token.kind {
                TokenKind::ArrayClose => {
                    let span = token.span;
                    self.position += 1;
                    break span;
                }
                TokenKind::Operator(_) | TokenKind::Eof | TokenKind::DictClose => {
                    return Err(ParseError::grammar(
                        token.span,
                        "']'",
                        token.kind.describe(),
                    ));
                }
                _ => items.push(self.operand()?.0),
            }
        };
        self.containers.exit();
        Ok((Operand::Array(items), open.to(close)))
    }

    fn dictionary(&mut self, open: Span) -> ParseResult<(Operand, Span)> {
        self.containers.enter(open)?;
        let mut entries = Vec::new();
        let close = loop {
            let token = self.advance()?;
            match token.kind {
                TokenKind::DictClose => break token.span,
                TokenKind::Name(key) => {
                    let (value, _) = self.operand()?;
                    entries.push((key, value));
                }
                other => {
                    return Err(ParseError::grammar(
                        token.span,
                        "a name key or '>>'",
                        other.describe(),
                    ));
                }
            }
        };
        self.containers.exit();
        Ok((Operand::Dictionary(entries), open.to(close)))
    }

    // Invocations

    /// Operands followed by one of the keywords of `production`
    fn invocation(&mut self, production: Production) -> ParseResult<Invocation> {
        let (operands, spans) = self.operands()?;
        let token = self.advance()?;
        let operator = match token.kind {
            TokenKind::Operator(keyword) => keyword,
            other => {
                return Err(ParseError::grammar(
                    token.span,
                    operators::expected_keywords(production),
                    other.describe(),
                ));
            }
        };

        let spec = operators::lookup(&operator)
            .filter(|spec| spec.production == production)
            .ok_or_else(|| {
                ParseError::grammar(
                    token.span,
                    operators::expected_keywords(production),
                    format!("'{operator}'"),
                )
            })?;
        spec.check_operands(&operands, &spans, token.span)?;

        Ok(Invocation {
            production,
            operator,
            category: Some(spec.category),
            span: spans.first().map_or(token.span, |first| first.to(token.span)),
            operands,
        })
    }

    /// An operator outside the catalog, accepted as-is
    fn unknown_operator(&mut self) -> ParseResult<Invocation> {
        let (operands, spans) = self.operands()?;
        let token = self.advance()?;
        match token.kind {
            TokenKind::Operator(operator) => Ok(Invocation {
                production: Production::UnknownOperator,
                operator,
                category: None,
                span: spans.first().map_or(token.span, |first| first.to(token.span)),
                operands,
            }),
            other => Err(ParseError::grammar(
                token.span,
                "an operator",
                other.describe(),
            )),
        }
    }

    // Content items

    fn parse_content(&mut self) -> ParseResult<Group> {
        let mut children = Vec::new();
        while !self.peek()?.is_eof() {
            // Type 3 glyph procedures open with d0/d1
            let glyph_allowed = children.is_empty();
            children.push(self.content_item(Level::Page, glyph_allowed)?);
        }
        Ok(Group::new(Production::Content, children))
    }

    fn content_item(&mut self, level: Level, glyph_allowed: bool) -> ParseResult<Node> {
        let token = self.peek_keyword()?;
        let keyword = match token.kind {
            TokenKind::Operator(keyword) => keyword,
            _ => return Err(self.dangling_operands(token.span)),
        };

        let Some(spec) = operators::lookup(&keyword) else {
            if self.compatibility_depth > 0 && self.options.allow_compatibility_operators {
                tracing::trace!(
                    operator = %keyword,
                    "unknown operator inside compatibility section"
                );
                return Ok(self.unknown_operator()?.into());
            }
            return Err(ParseError::grammar(
                token.span,
                "a content stream operator",
                format!("'{keyword}'"),
            ));
        };

        let page = level == Level::Page;
        let node: Node = match (spec.category, spec.production) {
            (OperatorCategory::PathConstruction, _) if page => self.parse_path_object()?.into(),
            (OperatorCategory::PathPainting | OperatorCategory::ClippingPath, _) => {
                return Err(ParseError::grammar(
                    token.span,
                    "a path construction operator",
                    format!("'{keyword}'"),
                ));
            }
            (_, Production::BeginText) if page => self.parse_text_object()?.into(),
            (_, Production::SaveState) if page => self.parse_graphics_state_block()?.into(),
            (_, Production::ConcatMatrix) if page => self.invocation(spec.production)?.into(),
            (_, Production::BeginMarkedContent) => self.parse_marked_content(level)?.into(),
            (_, Production::MarkedContentPoint) => self.invocation(spec.production)?.into(),
            (_, Production::BeginCompatibility) => self.parse_compatibility(level)?.into(),
            (_, Production::BeginInlineImage) if page => self.parse_inline_image()?.into(),
            (OperatorCategory::Type3Font, _) if page && glyph_allowed => {
                self.invocation(spec.production)?.into()
            }
            (
                OperatorCategory::GeneralGraphicsState
                | OperatorCategory::Color
                | OperatorCategory::TextState,
                _,
            ) => self.invocation(spec.production)?.into(),
            (OperatorCategory::TextPositioning | OperatorCategory::TextShowing, _) if !page => {
                self.invocation(spec.production)?.into()
            }
            (OperatorCategory::ShadingPattern | OperatorCategory::XObject, _) if page => {
                self.invocation(spec.production)?.into()
            }
            _ => {
                return Err(ParseError::grammar(
                    token.span,
                    level.expected(),
                    format!("'{keyword}'"),
                ));
            }
        };
        Ok(node)
    }

    /// Error for operands left over at end of stream
    fn dangling_operands(&mut self, eof: Span) -> ParseError {
        match self.peek() {
            Ok(first) if !first.is_eof() => {
                ParseError::grammar(first.span.to(eof), "an operator", "end of stream")
            }
            Ok(_) => ParseError::grammar(eof, "a content stream operator", "end of stream"),
            Err(error) => error,
        }
    }

    fn parse_path_construction(&mut self) -> ParseResult<Group> {
        let mut children: Vec<Node> = Vec::new();
        loop {
            match self.peek_spec()? {
                Some(spec) if spec.category == OperatorCategory::PathConstruction => {
                    children.push(self.invocation(spec.production)?.into());
                }
                _ if !children.is_empty() => break,
                _ => {
                    let token = self.peek_keyword()?;
                    return Err(ParseError::grammar(
                        token.span,
                        "a path construction operator",
                        token.kind.describe(),
                    ));
                }
            }
        }
        Ok(Group::new(Production::PathConstruction, children))
    }

    fn parse_path_object(&mut self) -> ParseResult<Group> {
        let mut children = vec![Node::from(self.parse_path_construction()?)];

        if self
            .peek_spec()?
            .is_some_and(|spec| spec.production == Production::Clipping)
        {
            children.push(self.invocation(Production::Clipping)?.into());
        }

        match self.peek_spec()? {
            Some(spec)
                if matches!(
                    spec.production,
                    Production::PathPainting | Production::EndPath
                ) =>
            {
                children.push(self.invocation(spec.production)?.into());
            }
            _ => {
                let token = self.peek_keyword()?;
                return Err(ParseError::grammar(
                    token.span,
                    "a path painting operator",
                    token.kind.describe(),
                ));
            }
        }

        Ok(Group::new(Production::PathObject, children))
    }

    fn parse_text_object(&mut self) -> ParseResult<Group> {
        let open = self.invocation(Production::BeginText)?;
        self.parse_group(Production::TextObject, open, Production::EndText, Level::Text)
    }

    fn parse_graphics_state_block(&mut self) -> ParseResult<Group> {
        let open = self.invocation(Production::SaveState)?;
        self.parse_group(
            Production::GraphicsStateBlock,
            open,
            Production::RestoreState,
            Level::Page,
        )
    }

    fn parse_marked_content(&mut self, level: Level) -> ParseResult<Group> {
        let open = self.invocation(Production::BeginMarkedContent)?;
        self.parse_group(
            Production::MarkedContent,
            open,
            Production::EndMarkedContent,
            level,
        )
    }

    fn parse_compatibility(&mut self, level: Level) -> ParseResult<Group> {
        let open = self.invocation(Production::BeginCompatibility)?;
        self.compatibility_depth += 1;
        let group = self.parse_group(
            Production::Compatibility,
            open,
            Production::EndCompatibility,
            level,
        )?;
        self.compatibility_depth -= 1;
        Ok(group)
    }

    fn parse_inline_image(&mut self) -> ParseResult<Group> {
        let begin = self.invocation(Production::BeginInlineImage)?;
        let data = self.invocation(Production::InlineImageData)?;
        let end = self.invocation(Production::EndInlineImage)?;
        Ok(Group::new(
            Production::InlineImage,
            vec![begin.into(), data.into(), end.into()],
        ))
    }

    /// Items at `level` after `open`, up to the operator of `close`
    fn parse_group(
        &mut self,
        production: Production,
        open: Invocation,
        close: Production,
        level: Level,
    ) -> ParseResult<Group> {
        self.groups.enter(open.span)?;
        let mut children = vec![Node::from(open)];

        loop {
            let token = self.peek_keyword()?;
            let closes = match &token.kind {
                TokenKind::Operator(keyword) => {
                    operators::lookup(keyword).is_some_and(|spec| spec.production == close)
                }
                _ => false,
            };

            if closes {
                children.push(self.invocation(close)?.into());
                break;
            }

            if token.is_eof() && self.peek()?.is_eof() {
                if production == Production::GraphicsStateBlock
                    && self.options.allow_unclosed_state_blocks
                {
                    tracing::debug!(offset = token.span.start, "closing unterminated 'q' block");
                    break;
                }
                return Err(ParseError::grammar(
                    token.span,
                    operators::expected_keywords(close),
                    "end of stream",
                ));
            }

            children.push(self.content_item(level, false)?);
        }

        self.groups.exit();
        Ok(Group::new(production, children))
    }
}

macro_rules! single_productions {
    ($($method:ident => $production:ident,)*) => {
        impl<'a> ContentParser<'a> {
            $(
                pub fn $method(&mut self) -> ParseResult<Invocation> {
                    self.run(Production::$production, |parser| {
                        parser.invocation(Production::$production)
                    })
                }
            )*
        }
    };
}

single_productions! {
    move_to => MoveTo,
    line_to => LineTo,
    curve_to => CurveTo,
    curve_to2 => CurveTo2,
    curve_to3 => CurveTo3,
    close_path => ClosePath,
    rectangle => Rectangle,
    path_painting => PathPainting,
    end_path => EndPath,
    clipping => Clipping,
    character_space => CharacterSpace,
    word_space => WordSpace,
    horizontal_scale => HorizontalScale,
    leading => Leading,
    text_font => TextFont,
    text_render => TextRender,
    text_rise => TextRise,
    move_text => MoveText,
    move_text_leading => MoveTextLeading,
    text_matrix => TextMatrix,
    next_line => NextLine,
    show_text => ShowText,
    show_text_array => ShowTextArray,
    next_line_show_text => NextLineShowText,
    next_line_show_text_spaced => NextLineShowTextSpaced,
    save_state => SaveState,
    restore_state => RestoreState,
    concat_matrix => ConcatMatrix,
    line_width => LineWidth,
    line_cap => LineCap,
    line_join => LineJoin,
    miter_limit => MiterLimit,
    dash_pattern => DashPattern,
    rendering_intent => RenderingIntent,
    flatness => Flatness,
    ext_g_state => ExtGState,
    color_space => ColorSpace,
    color => Color,
    color_n => ColorN,
    gray => Gray,
    rgb => Rgb,
    cmyk => Cmyk,
    shading => Shading,
    dobject => DObject,
    glyph_width => GlyphWidth,
    glyph_width_bounding_box => GlyphWidthBoundingBox,
    marked_content_point => MarkedContentPoint,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ErrorCollector, ErrorKind};

    fn parse(input: &str) -> ParseResult<ContentStream> {
        ContentParser::parse(input.as_bytes())
    }

    fn kind_of(input: &str) -> ErrorKind {
        parse(input).unwrap_err().kind()
    }

    #[test]
    fn test_empty_stream() {
        let stream = parse("").unwrap();
        assert!(stream.is_empty());
        assert_eq!(parse("  % only a comment\n").unwrap().operator_count(), 0);
    }

    #[test]
    fn test_dobject_entry_point() {
        let inv = ContentParser::new(b"/Test Do").dobject().unwrap();
        assert_eq!(inv.operator(), "Do");
        assert_eq!(inv.name(0), Some("Test"));
        assert_eq!(inv.span(), Span::new(0, 8));

        let err = ContentParser::new(b"/Test /Test Do").dobject().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Arity);
        let err = ContentParser::new(b"Do").dobject().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Arity);
        let err = ContentParser::new(b"Scooby Do").dobject().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Grammar);
        assert_eq!(
            err.to_string(),
            "Syntax error at byte 0: expected 'Do', found 'Scooby'"
        );
    }

    #[test]
    fn test_end_path_is_case_sensitive() {
        assert!(ContentParser::new(b"n").end_path().is_ok());
        let err = ContentParser::new(b"N").end_path().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Grammar);
    }

    #[test]
    fn test_character_space_rejects_identifier() {
        assert!(ContentParser::new(b"0 Tc").character_space().is_ok());
        let err = ContentParser::new(b"Abcde Tc").character_space().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Grammar);
    }

    #[test]
    fn test_path_construction_counts() {
        let cases = [
            ("h", 1),
            ("0 1 2 3 re h", 2),
            ("10 20 m 0 1 l", 2),
            ("h h", 2),
            ("0 1 2 3 4 5 c 0 1 2 3 v 0 1 2 3 y", 3),
        ];
        for (input, count) in cases {
            let group = ContentParser::new(input.as_bytes())
                .path_construction()
                .unwrap();
            assert_eq!(group.child_count(), count, "{input}");
        }
    }

    #[test]
    fn test_path_object_with_clip() {
        let input = "379.70001 806.5 m\n400 806.5 l\n400 757. l\nh\nW\nn";
        let group = ContentParser::new(input.as_bytes()).path_object().unwrap();
        assert_eq!(group.child_count(), 3);
        assert_eq!(group.child(1).unwrap().production(), Production::Clipping);
        assert_eq!(group.child(2).unwrap().production(), Production::EndPath);
    }

    #[test]
    fn test_painting_before_construction_fails() {
        let err = parse("S 0 0 m 1 1 l").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Grammar);
        assert_eq!(err.offset(), 0);

        let err = parse("0 0 m 1 1 l").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Grammar);
    }

    #[test]
    fn test_text_object_levels() {
        let stream = parse("BT /F1 12 Tf 72 712 Td (Hello) Tj ET").unwrap();
        let text = stream.children()[0].as_group().unwrap();
        assert_eq!(text.production(), Production::TextObject);
        assert_eq!(text.child_count(), 5);

        assert_eq!(kind_of("72 712 Td"), ErrorKind::Grammar);
        assert_eq!(kind_of("BT 0 0 m 1 1 l S ET"), ErrorKind::Grammar);
        assert_eq!(kind_of("BT BT ET ET"), ErrorKind::Grammar);
    }

    #[test]
    fn test_unclosed_groups() {
        let err = parse("q 1 0 0 1 0 0 cm").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Syntax error at byte 16: expected 'Q', found end of stream"
        );
        assert_eq!(kind_of("BT"), ErrorKind::Grammar);
        assert_eq!(kind_of("/Span BMC"), ErrorKind::Grammar);

        let lenient = ContentParser::parse_with_options(b"q 0 g", ParseOptions::lenient()).unwrap();
        let block = lenient.children()[0].as_group().unwrap();
        assert_eq!(block.child_count(), 2);
    }

    #[test]
    fn test_stray_terminators() {
        for input in ["ET", "Q", "EMC", "EX", "q Q Q"] {
            assert_eq!(kind_of(input), ErrorKind::Grammar, "{input}");
        }
    }

    #[test]
    fn test_compatibility_section() {
        let stream = parse("BX 1 2 foo EX").unwrap();
        let section = stream.children()[0].as_group().unwrap();
        let unknown = section.child(1).unwrap().as_invocation().unwrap();
        assert_eq!(unknown.production(), Production::UnknownOperator);
        assert_eq!(unknown.category(), None);
        assert_eq!(unknown.operands().len(), 2);

        assert_eq!(kind_of("1 2 foo"), ErrorKind::Grammar);
        let strict = ContentParser::parse_with_options(b"BX foo EX", ParseOptions::strict());
        assert_eq!(strict.unwrap_err().kind(), ErrorKind::Grammar);
    }

    #[test]
    fn test_inline_image() {
        let input = b"BI /W 2 /H 1 /BPC 8 /CS /G ID \x00\xFF EI Q";
        let mut parser = ContentParser::new(input);
        let image = parser.inline_image().unwrap();
        assert_eq!(image.child_count(), 3);
        let data = image.child(2).unwrap().as_invocation().unwrap();
        assert_eq!(
            data.operand(0).and_then(Operand::as_inline_data),
            Some(&[0x00, 0xFF][..])
        );
        let id = image.child(1).unwrap().as_invocation().unwrap();
        assert_eq!(id.operands().len(), 8);

        let image = ContentParser::new(b"BI /W 1 ID a EI/b EI").inline_image().unwrap();
        let data = image.child(2).unwrap().as_invocation().unwrap();
        assert_eq!(
            data.operand(0).and_then(Operand::as_inline_data),
            Some(&b"a EI/b"[..])
        );
    }

    #[test]
    fn test_marked_content_with_dictionary() {
        let stream = parse("/Span << /MCID 0 /ActualText (x) >> BDC 0 g EMC").unwrap();
        let marked = stream.children()[0].as_group().unwrap();
        let open = marked.child(0).unwrap().as_invocation().unwrap();
        assert_eq!(open.operator(), "BDC");
        assert_eq!(open.operand(1).and_then(|d| d.get("MCID")), Some(&Operand::Integer(0)));
    }

    #[test]
    fn test_operand_structure_errors() {
        assert_eq!(kind_of("[1 m] 0 d"), ErrorKind::Grammar);
        assert_eq!(kind_of("] 0 w"), ErrorKind::Grammar);
        assert_eq!(kind_of("<< 1 2 >> /P BDC EMC"), ErrorKind::Grammar);
        assert_eq!(kind_of("0 0"), ErrorKind::Grammar);
        assert_eq!(kind_of("(unterminated Tj"), ErrorKind::Lexical);
    }

    #[test]
    fn test_glyph_width_only_first() {
        assert!(parse("1000 0 d0 0 0 m 10 10 l S").is_ok());
        assert_eq!(kind_of("0 g 1000 0 d0"), ErrorKind::Grammar);
    }

    #[test]
    fn test_nesting_limit() {
        let depth = ParseOptions::default().max_nesting_depth;
        let ok = format!("{}{}", "q ".repeat(depth), "Q ".repeat(depth));
        assert!(parse(&ok).is_ok());
        let too_deep = format!("{}{}", "q ".repeat(depth + 1), "Q ".repeat(depth + 1));
        assert_eq!(kind_of(&too_deep), ErrorKind::Grammar);

        let arrays = format!("{}{}", "[".repeat(depth + 1), "]".repeat(depth + 1));
        assert_eq!(kind_of(&format!("{arrays} 0 d")), ErrorKind::Grammar);
    }

    #[test]
    fn test_lenient_nesting_limit_returns() {
        let options = ParseOptions::lenient();
        let depth = options.max_nesting_depth;
        assert_eq!(depth, crate::parser::stack_safe::MAX_RECURSION_DEPTH);
        let lenient =
            |input: &str| ContentParser::parse_with_options(input.as_bytes(), options.clone());

        let blocks = format!("{}{}", "q ".repeat(depth), "Q ".repeat(depth));
        assert_eq!(lenient(&blocks).unwrap().operator_count(), 2 * depth);
        let too_deep = format!("{}{}", "q ".repeat(depth + 1), "Q ".repeat(depth + 1));
        assert_eq!(lenient(&too_deep).unwrap_err().kind(), ErrorKind::Grammar);

        // Deepest legal array nesting reaches the operand type check
        let arrays = format!("{}{} 0 d", "[".repeat(depth), "]".repeat(depth));
        assert_eq!(lenient(&arrays).unwrap_err().kind(), ErrorKind::Type);
        let arrays = format!("{}{} 0 d", "[".repeat(depth + 1), "]".repeat(depth + 1));
        assert_eq!(lenient(&arrays).unwrap_err().kind(), ErrorKind::Grammar);

        // Text and marked content share the group budget
        let mixed = format!(
            "BT {}{}ET",
            "/P BMC ".repeat(depth - 1),
            "EMC ".repeat(depth - 1)
        );
        assert!(lenient(&mixed).is_ok());
    }

    #[test]
    fn test_parse_as_requires_full_consumption() {
        let node = ContentParser::parse_as(b"0 1 0 0 K", Production::Cmyk).unwrap();
        assert_eq!(node.as_invocation().unwrap().numbers(), Some(vec![0.0, 1.0, 0.0, 0.0]));

        let err = ContentParser::parse_as(b"0 1 0 0 K h", Production::Cmyk).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Grammar);

        let node = ContentParser::parse_as(b"0 0 m 0 0 l S", Production::PathObject).unwrap();
        assert_eq!(node.child_count(), 2);
    }

    #[test]
    fn test_listener_notified_once() {
        let mut collector = ErrorCollector::new();
        {
            let mut parser = ContentParser::with_listener(
                b"0 0 m 1 2 c S",
                ParseOptions::default(),
                &mut collector,
            );
            assert!(parser.content().is_err());
        }
        assert_eq!(collector.len(), 1);
        assert_eq!(collector.first().map(ParseError::kind), Some(ErrorKind::Arity));

        let mut quiet = ErrorCollector::new();
        {
            let mut parser = ContentParser::with_listener(
                b"0 0 m 1 1 l S",
                ParseOptions::default(),
                &mut quiet,
            );
            assert!(parser.content().is_ok());
        }
        assert!(quiet.is_empty());
    }

    #[test]
    fn test_first_error_wins() {
        // The grammar error comes before the lexical one
        let err = parse("Scooby Do (unterminated").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Grammar);
        assert_eq!(err.offset(), 0);
    }
}
