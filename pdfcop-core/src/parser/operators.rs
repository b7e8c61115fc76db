//! Operator Catalog
//!
//! The static table of every content stream operator defined by ISO 32000-1
//! (Annex A, "Operator Summary"), with the operand shape each one requires.
//! The grammar consults it for every invocation instead of hard-coding
//! per-operator checks, so new operators only need a new table row.

use super::operands::Operand;
use super::tree::Production;
use super::{ParseError, ParseResult, Span};
use std::collections::HashMap;
use std::fmt;

/// Operator categories (ISO 32000-1 Table 51)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum OperatorCategory {
    GeneralGraphicsState,
    SpecialGraphicsState,
    PathConstruction,
    PathPainting,
    ClippingPath,
    TextObject,
    TextState,
    TextPositioning,
    TextShowing,
    Type3Font,
    Color,
    ShadingPattern,
    InlineImage,
    XObject,
    MarkedContent,
    Compatibility,
}

/// Shape an operand must have at a given position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandType {
    /// Integer or real
    Number,
    Integer,
    Name,
    /// Literal or hexadecimal string
    String,
    Array,
    /// Array whose elements are all numbers (dash patterns)
    NumberArray,
    /// Array of strings and numbers (`TJ`)
    TextArray,
    /// Property list: a resource name or an inline dictionary
    NameOrDictionary,
    InlineData,
}

impl OperandType {
    pub fn accepts(&self, operand: &Operand) -> bool {
        match self {
            OperandType::Number => operand.is_number(),
            OperandType::Integer => matches!(operand, Operand::Integer(_)),
            OperandType::Name => matches!(operand, Operand::Name(_)),
            OperandType::String => matches!(operand, Operand::String(_)),
            OperandType::Array => matches!(operand, Operand::Array(_)),
            OperandType::NumberArray => match operand {
                Operand::Array(items) => items.iter().all(Operand::is_number),
                _ => false,
            },
            OperandType::TextArray => match operand {
                Operand::Array(items) => items
                    .iter()
                    .all(|item| item.is_number() || matches!(item, Operand::String(_))),
                _ => false,
            },
            OperandType::NameOrDictionary => {
                matches!(operand, Operand::Name(_) | Operand::Dictionary(_))
            }
            OperandType::InlineData => matches!(operand, Operand::InlineData(_)),
        }
    }
}

impl fmt::Display for OperandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            OperandType::Number => "number",
            OperandType::Integer => "integer",
            OperandType::Name => "name",
            OperandType::String => "string",
            OperandType::Array => "array",
            OperandType::NumberArray => "array of numbers",
            OperandType::TextArray => "array of strings and numbers",
            OperandType::NameOrDictionary => "name or dictionary",
            OperandType::InlineData => "inline image data",
        };
        f.write_str(text)
    }
}

/// Operand count requirement of an operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly these operands, in order
    Fixed(&'static [OperandType]),
    /// Between `min` and `max` operands, all of type `ty`
    Range {
        min: usize,
        max: usize,
        ty: OperandType,
    },
    /// `SCN`/`scn`: up to 32 numbers optionally followed by a pattern name
    PatternColor,
    /// `ID`: inline image dictionary as alternating keys and values
    KeyValuePairs,
    /// `EI`: exactly the raw image data
    InlineData,
}

/// Maximum color components accepted by `SCN`/`scn` (DeviceN limit)
pub const MAX_COLOR_COMPONENTS: usize = 32;

impl Arity {
    pub fn is_variadic(&self) -> bool {
        !matches!(self, Arity::Fixed(_) | Arity::InlineData)
    }

    /// Human readable operand count, used in arity errors
    pub fn describe(&self) -> String {
        match self {
            Arity::Fixed(types) => types.len().to_string(),
            Arity::Range { min, max, .. } => format!("{min} to {max}"),
            Arity::PatternColor => format!("1 to {}", MAX_COLOR_COMPONENTS + 1),
            Arity::KeyValuePairs => "an even number of".to_string(),
            Arity::InlineData => "1".to_string(),
        }
    }

    fn accepts_count(&self, count: usize) -> bool {
        match self {
            Arity::Fixed(types) => count == types.len(),
            Arity::Range { min, max, .. } => (*min..=*max).contains(&count),
            Arity::PatternColor => (1..=MAX_COLOR_COMPONENTS + 1).contains(&count),
            Arity::KeyValuePairs => count % 2 == 0,
            Arity::InlineData => count == 1,
        }
    }

    /// Expected type of the operand at `index` out of `count`
    fn expected_at(&self, index: usize, count: usize) -> Option<ExpectedOperand> {
        match self {
            Arity::Fixed(types) => types.get(index).copied().map(ExpectedOperand::Exactly),
            Arity::Range { ty, .. } => Some(ExpectedOperand::Exactly(*ty)),
            Arity::PatternColor if index + 1 == count => Some(ExpectedOperand::NumberOrName),
            Arity::PatternColor => Some(ExpectedOperand::Exactly(OperandType::Number)),
            Arity::KeyValuePairs if index % 2 == 0 => {
                Some(ExpectedOperand::Exactly(OperandType::Name))
            }
            Arity::KeyValuePairs => Some(ExpectedOperand::AnyValue),
            Arity::InlineData => Some(ExpectedOperand::Exactly(OperandType::InlineData)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ExpectedOperand {
    Exactly(OperandType),
    NumberOrName,
    AnyValue,
}

impl ExpectedOperand {
    fn accepts(&self, operand: &Operand) -> bool {
        match self {
            ExpectedOperand::Exactly(ty) => ty.accepts(operand),
            ExpectedOperand::NumberOrName => {
                operand.is_number() || matches!(operand, Operand::Name(_))
            }
            ExpectedOperand::AnyValue => !matches!(operand, Operand::InlineData(_)),
        }
    }

    fn describe(&self) -> String {
        match self {
            ExpectedOperand::Exactly(ty) => ty.to_string(),
            ExpectedOperand::NumberOrName => "number or name".to_string(),
            ExpectedOperand::AnyValue => "value".to_string(),
        }
    }
}

/// Catalog entry for one operator keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorSpec {
    pub keyword: &'static str,
    pub category: OperatorCategory,
    /// Grammar production an invocation of this operator belongs to
    pub production: Production,
    pub arity: Arity,
}

impl OperatorSpec {
    pub fn is_variadic(&self) -> bool {
        self.arity.is_variadic()
    }

    /// Checks operand count first, then each operand's type.
    ///
    /// `spans` holds the source span of each operand; `operator_span` is used
    /// when the count is wrong.
    pub fn check_operands(
        &self,
        operands: &[Operand],
        spans: &[Span],
        operator_span: Span,
    ) -> ParseResult<()> {
        let count = operands.len();
        if !self.arity.accepts_count(count) {
            let span = spans.first().map_or(operator_span, |first| first.to(operator_span));
            return Err(ParseError::Arity {
                span,
                operator: self.keyword.to_string(),
                expected: self.arity.describe(),
                found: count,
            });
        }

        for (index, operand) in operands.iter().enumerate() {
            let Some(expected) = self.arity.expected_at(index, count) else {
                continue;
            };
            if !expected.accepts(operand) {
                return Err(ParseError::Type {
                    span: spans.get(index).copied().unwrap_or(operator_span),
                    operator: self.keyword.to_string(),
                    index,
                    expected: expected.describe(),
                    found: operand.kind_name().to_string(),
                });
            }
        }

        Ok(())
    }
}

use Arity::Fixed;
use OperandType::{Integer, Name, Number};
use OperatorCategory as C;
use Production as P;

const NONE: &[OperandType] = &[];
const N1: &[OperandType] = &[Number];
const N2: &[OperandType] = &[Number, Number];
const N3: &[OperandType] = &[Number, Number, Number];
const N4: &[OperandType] = &[Number, Number, Number, Number];
const N6: &[OperandType] = &[Number, Number, Number, Number, Number, Number];
const I1: &[OperandType] = &[Integer];
const NAME: &[OperandType] = &[Name];

const fn op(
    keyword: &'static str,
    category: OperatorCategory,
    production: Production,
    arity: Arity,
) -> OperatorSpec {
    OperatorSpec {
        keyword,
        category,
        production,
        arity,
    }
}

/// Every operator of ISO 32000-1 Annex A
pub static OPERATORS: &[OperatorSpec] = &[
    // General graphics state
    op("w", C::GeneralGraphicsState, P::LineWidth, Fixed(N1)),
    op("J", C::GeneralGraphicsState, P::LineCap, Fixed(I1)),
    op("j", C::GeneralGraphicsState, P::LineJoin, Fixed(I1)),
    op("M", C::GeneralGraphicsState, P::MiterLimit, Fixed(N1)),
    op(
        "d",
        C::GeneralGraphicsState,
        P::DashPattern,
        Fixed(&[OperandType::NumberArray, Number]),
    ),
    op("ri", C::GeneralGraphicsState, P::RenderingIntent, Fixed(NAME)),
    op("i", C::GeneralGraphicsState, P::Flatness, Fixed(N1)),
    op("gs", C::GeneralGraphicsState, P::ExtGState, Fixed(NAME)),
    // Special graphics state
    op("q", C::SpecialGraphicsState, P::SaveState, Fixed(NONE)),
    op("Q", C::SpecialGraphicsState, P::RestoreState, Fixed(NONE)),
    op("cm", C::SpecialGraphicsState, P::ConcatMatrix, Fixed(N6)),
    // Path construction
    op("m", C::PathConstruction, P::MoveTo, Fixed(N2)),
    op("l", C::PathConstruction, P::LineTo, Fixed(N2)),
    op("c", C::PathConstruction, P::CurveTo, Fixed(N6)),
    op("v", C::PathConstruction, P::CurveTo2, Fixed(N4)),
    op("y", C::PathConstruction, P::CurveTo3, Fixed(N4)),
    op("h", C::PathConstruction, P::ClosePath, Fixed(NONE)),
    op("re", C::PathConstruction, P::Rectangle, Fixed(N4)),
    // Path painting
    op("S", C::PathPainting, P::PathPainting, Fixed(NONE)),
    op("s", C::PathPainting, P::PathPainting, Fixed(NONE)),
    op("f", C::PathPainting, P::PathPainting, Fixed(NONE)),
    op("F", C::PathPainting, P::PathPainting, Fixed(NONE)),
    op("f*", C::PathPainting, P::PathPainting, Fixed(NONE)),
    op("B", C::PathPainting, P::PathPainting, Fixed(NONE)),
    op("B*", C::PathPainting, P::PathPainting, Fixed(NONE)),
    op("b", C::PathPainting, P::PathPainting, Fixed(NONE)),
    op("b*", C::PathPainting, P::PathPainting, Fixed(NONE)),
    op("n", C::PathPainting, P::EndPath, Fixed(NONE)),
    // Clipping paths
    op("W", C::ClippingPath, P::Clipping, Fixed(NONE)),
    op("W*", C::ClippingPath, P::Clipping, Fixed(NONE)),
    // Text objects
    op("BT", C::TextObject, P::BeginText, Fixed(NONE)),
    op("ET", C::TextObject, P::EndText, Fixed(NONE)),
    // Text state
    op("Tc", C::TextState, P::CharacterSpace, Fixed(N1)),
    op("Tw", C::TextState, P::WordSpace, Fixed(N1)),
    op("Tz", C::TextState, P::HorizontalScale, Fixed(N1)),
    op("TL", C::TextState, P::Leading, Fixed(N1)),
    op("Tf", C::TextState, P::TextFont, Fixed(&[Name, Number])),
    op("Tr", C::TextState, P::TextRender, Fixed(I1)),
    op("Ts", C::TextState, P::TextRise, Fixed(N1)),
    // Text positioning
    op("Td", C::TextPositioning, P::MoveText, Fixed(N2)),
    op("TD", C::TextPositioning, P::MoveTextLeading, Fixed(N2)),
    op("Tm", C::TextPositioning, P::TextMatrix, Fixed(N6)),
    op("T*", C::TextPositioning, P::NextLine, Fixed(NONE)),
    // Text showing
    op("Tj", C::TextShowing, P::ShowText, Fixed(&[OperandType::String])),
    op(
        "TJ",
        C::TextShowing,
        P::ShowTextArray,
        Fixed(&[OperandType::TextArray]),
    ),
    op(
        "'",
        C::TextShowing,
        P::NextLineShowText,
        Fixed(&[OperandType::String]),
    ),
    op(
        "\"",
        C::TextShowing,
        P::NextLineShowTextSpaced,
        Fixed(&[Number, Number, OperandType::String]),
    ),
    // Type 3 fonts
    op("d0", C::Type3Font, P::GlyphWidth, Fixed(N2)),
    op("d1", C::Type3Font, P::GlyphWidthBoundingBox, Fixed(N6)),
    // Color
    op("CS", C::Color, P::ColorSpace, Fixed(NAME)),
    op("cs", C::Color, P::ColorSpace, Fixed(NAME)),
    op(
        "SC",
        C::Color,
        P::Color,
        Arity::Range {
            min: 1,
            max: 4,
            ty: Number,
        },
    ),
    op(
        "sc",
        C::Color,
        P::Color,
        Arity::Range {
            min: 1,
            max: 4,
            ty: Number,
        },
    ),
    op("SCN", C::Color, P::ColorN, Arity::PatternColor),
    op("scn", C::Color, P::ColorN, Arity::PatternColor),
    op("G", C::Color, P::Gray, Fixed(N1)),
    op("g", C::Color, P::Gray, Fixed(N1)),
    op("RG", C::Color, P::Rgb, Fixed(N3)),
    op("rg", C::Color, P::Rgb, Fixed(N3)),
    op("K", C::Color, P::Cmyk, Fixed(N4)),
    op("k", C::Color, P::Cmyk, Fixed(N4)),
    // Shading patterns
    op("sh", C::ShadingPattern, P::Shading, Fixed(NAME)),
    // Inline images
    op("BI", C::InlineImage, P::BeginInlineImage, Fixed(NONE)),
    op("ID", C::InlineImage, P::InlineImageData, Arity::KeyValuePairs),
    op("EI", C::InlineImage, P::EndInlineImage, Arity::InlineData),
    // XObjects
    op("Do", C::XObject, P::DObject, Fixed(NAME)),
    // Marked content
    op("MP", C::MarkedContent, P::MarkedContentPoint, Fixed(NAME)),
    op(
        "DP",
        C::MarkedContent,
        P::MarkedContentPoint,
        Fixed(&[Name, OperandType::NameOrDictionary]),
    ),
    op("BMC", C::MarkedContent, P::BeginMarkedContent, Fixed(NAME)),
    op(
        "BDC",
        C::MarkedContent,
        P::BeginMarkedContent,
        Fixed(&[Name, OperandType::NameOrDictionary]),
    ),
    op("EMC", C::MarkedContent, P::EndMarkedContent, Fixed(NONE)),
    // Compatibility
    op("BX", C::Compatibility, P::BeginCompatibility, Fixed(NONE)),
    op("EX", C::Compatibility, P::EndCompatibility, Fixed(NONE)),
];

lazy_static::lazy_static! {
    static ref BY_KEYWORD: HashMap<&'static str, &'static OperatorSpec> =
        OPERATORS.iter().map(|spec| (spec.keyword, spec)).collect();
}

/// Looks up an operator keyword; matching is case-sensitive
pub fn lookup(keyword: &str) -> Option<&'static OperatorSpec> {
    BY_KEYWORD.get(keyword).copied()
}

/// All catalog keywords, in table order
pub fn keywords() -> impl Iterator<Item = &'static str> {
    OPERATORS.iter().map(|spec| spec.keyword)
}

/// Catalog entries recognized by `production`
pub fn for_production(production: Production) -> impl Iterator<Item = &'static OperatorSpec> {
    OPERATORS
        .iter()
        .filter(move |spec| spec.production == production)
}

/// Quoted, human readable list of the keywords a production accepts
pub fn expected_keywords(production: Production) -> String {
    let quoted: Vec<String> = for_production(production)
        .map(|spec| format!("'{}'", spec.keyword))
        .collect();
    match quoted.len() {
        0 => production.name().to_string(),
        1 => quoted[0].clone(),
        n => format!("{} or {}", quoted[..n - 1].join(", "), quoted[n - 1]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ErrorKind, PdfString};
    use std::collections::HashSet;

    fn spans(count: usize) -> Vec<Span> {
        (0..count).map(|i| Span::new(i * 2, i * 2 + 1)).collect()
    }

    #[test]
    fn test_catalog_has_unique_keywords() {
        let unique: HashSet<&str> = keywords().collect();
        assert_eq!(unique.len(), OPERATORS.len());
        assert_eq!(OPERATORS.len(), 73);
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert_eq!(lookup("n").map(|s| s.production), Some(Production::EndPath));
        assert!(lookup("N").is_none());
        assert_eq!(lookup("K").map(|s| s.category), Some(OperatorCategory::Color));
        assert_eq!(lookup("k").map(|s| s.category), Some(OperatorCategory::Color));
        assert!(lookup("Scooby").is_none());
    }

    #[test]
    fn test_fixed_arity() {
        let spec = lookup("c").unwrap();
        assert!(!spec.is_variadic());
        let operands = vec![Operand::Integer(0), Operand::Integer(1), Operand::Integer(2)];
        let err = spec
            .check_operands(&operands, &spans(3), Span::new(6, 7))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Arity);
        assert_eq!(err.span(), Span::new(0, 7));
    }

    #[test]
    fn test_type_mismatch_reports_operand() {
        let spec = lookup("Tc").unwrap();
        let operands = vec![Operand::Name("Abc".to_string())];
        let err = spec
            .check_operands(&operands, &spans(1), Span::new(5, 7))
            .unwrap_err();
        match err {
            ParseError::Type {
                index,
                expected,
                found,
                ..
            } => {
                assert_eq!(index, 0);
                assert_eq!(expected, "number");
                assert_eq!(found, "name");
            }
            other => panic!("expected type error, got {other:?}"),
        }
    }

    #[test]
    fn test_integer_rejects_real() {
        let spec = lookup("Tr").unwrap();
        assert!(spec
            .check_operands(&[Operand::Integer(2)], &spans(1), Span::default())
            .is_ok());
        let err = spec
            .check_operands(&[Operand::Real(2.5)], &spans(1), Span::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn test_color_component_range() {
        let spec = lookup("sc").unwrap();
        assert!(spec.is_variadic());
        for count in 1..=4 {
            let operands = vec![Operand::Real(0.5); count];
            assert!(spec
                .check_operands(&operands, &spans(count), Span::default())
                .is_ok());
        }
        let err = spec
            .check_operands(&[], &[], Span::new(0, 2))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Arity);
        assert_eq!(
            err.to_string(),
            "Operator 'sc' at byte 0 expects 1 to 4 operand(s), found 0"
        );
    }

    #[test]
    fn test_pattern_color() {
        let spec = lookup("scn").unwrap();
        let name_only = vec![Operand::Name("P0".to_string())];
        assert!(spec
            .check_operands(&name_only, &spans(1), Span::default())
            .is_ok());

        let tinted = vec![
            Operand::Real(0.2),
            Operand::Real(0.4),
            Operand::Name("P1".to_string()),
        ];
        assert!(spec
            .check_operands(&tinted, &spans(3), Span::default())
            .is_ok());

        let misplaced = vec![Operand::Name("P1".to_string()), Operand::Real(0.2)];
        let err = spec
            .check_operands(&misplaced, &spans(2), Span::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn test_text_array() {
        let spec = lookup("TJ").unwrap();
        let good = vec![Operand::Array(vec![
            Operand::String(PdfString::literal(b"A".to_vec())),
            Operand::Integer(-120),
            Operand::String(PdfString::hex(vec![0x42])),
        ])];
        assert!(spec.check_operands(&good, &spans(1), Span::default()).is_ok());

        let bad = vec![Operand::Array(vec![Operand::Name("A".to_string())])];
        let err = spec
            .check_operands(&bad, &spans(1), Span::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn test_inline_image_pairs() {
        let spec = lookup("ID").unwrap();
        let pairs = vec![
            Operand::Name("W".to_string()),
            Operand::Integer(4),
            Operand::Name("IM".to_string()),
            Operand::Boolean(true),
        ];
        assert!(spec.check_operands(&pairs, &spans(4), Span::default()).is_ok());

        let odd = &pairs[..3];
        assert_eq!(
            spec.check_operands(odd, &spans(3), Span::default())
                .unwrap_err()
                .kind(),
            ErrorKind::Arity
        );

        let unnamed = vec![Operand::Integer(4), Operand::Integer(4)];
        assert_eq!(
            spec.check_operands(&unnamed, &spans(2), Span::default())
                .unwrap_err()
                .kind(),
            ErrorKind::Type
        );
    }

    #[test]
    fn test_expected_keywords() {
        assert_eq!(expected_keywords(Production::DObject), "'Do'");
        assert_eq!(expected_keywords(Production::Cmyk), "'K' or 'k'");
        assert_eq!(expected_keywords(Production::Clipping), "'W' or 'W*'");
        assert_eq!(expected_keywords(Production::PathObject), "pathObject");
    }
}
