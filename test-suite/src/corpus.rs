//! Test Corpus Management
//!
//! This module manages the collection of content stream fixtures used for
//! conformance checks. Every fixture carries its expected outcome so the
//! corpus can be replayed against any parser profile.

use std::collections::HashMap;

use pdfcop::parser::{ErrorKind, ParseOptions};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generators::ContentBuilder;

/// Categories of content stream fixtures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TestCategory {
    /// Smallest streams that are still valid
    Minimal,
    /// Streams with common page features
    Standard,
    /// Realistic pages mixing every kind of group
    Complex,
    /// Unusual syntax that is still valid
    EdgeCases,
    /// Streams that must be rejected
    Malformed,
    /// Streams whose outcome depends on the parser profile
    Profiles,
}

impl TestCategory {
    pub fn all() -> [TestCategory; 6] {
        [
            TestCategory::Minimal,
            TestCategory::Standard,
            TestCategory::Complex,
            TestCategory::EdgeCases,
            TestCategory::Malformed,
            TestCategory::Profiles,
        ]
    }
}

/// Expected behavior when validating a fixture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpectedOutcome {
    /// Should validate, optionally with an exact operator count
    Valid { operator_count: Option<usize> },
    /// Should be rejected with the given error class
    Invalid {
        error: ErrorKind,
        /// Byte offset of the violation, when it is pinned down
        offset: Option<usize>,
    },
}

/// Parser profile a fixture is validated under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Profile {
    #[default]
    Default,
    Strict,
    Lenient,
}

impl Profile {
    pub fn options(&self) -> ParseOptions {
        match self {
            Profile::Default => ParseOptions::default(),
            Profile::Strict => ParseOptions::strict(),
            Profile::Lenient => ParseOptions::lenient(),
        }
    }
}

/// A single content stream with its expectations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentFixture {
    pub name: String,
    pub category: TestCategory,
    pub description: String,
    pub content: Vec<u8>,
    pub profile: Profile,
    pub expected: ExpectedOutcome,
}

impl ContentFixture {
    pub fn valid(
        name: &str,
        category: TestCategory,
        description: &str,
        content: impl Into<Vec<u8>>,
        operator_count: Option<usize>,
    ) -> Self {
        Self {
            name: name.to_string(),
            category,
            description: description.to_string(),
            content: content.into(),
            profile: Profile::Default,
            expected: ExpectedOutcome::Valid { operator_count },
        }
    }

    pub fn invalid(
        name: &str,
        category: TestCategory,
        description: &str,
        content: impl Into<Vec<u8>>,
        error: ErrorKind,
    ) -> Self {
        Self {
            name: name.to_string(),
            category,
            description: description.to_string(),
            content: content.into(),
            profile: Profile::Default,
            expected: ExpectedOutcome::Invalid {
                error,
                offset: None,
            },
        }
    }

    /// Pin the byte offset of the expected violation
    pub fn at(mut self, offset: usize) -> Self {
        if let ExpectedOutcome::Invalid { offset: slot, .. } = &mut self.expected {
            *slot = Some(offset);
        }
        self
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    pub fn expects_valid(&self) -> bool {
        matches!(self.expected, ExpectedOutcome::Valid { .. })
    }
}

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Duplicate fixture name: {0}")]
    DuplicateFixture(String),

    #[error("Invalid corpus file: {0}")]
    Json(#[from] serde_json::Error),
}

/// The content stream conformance corpus
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ContentCorpus {
    fixtures: Vec<ContentFixture>,
}

impl ContentCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Corpus of built-in fixtures covering every category
    pub fn builtin() -> Self {
        let mut corpus = Self::new();
        for fixture in builtin_fixtures() {
            // Built-in names are unique
            corpus.fixtures.push(fixture);
        }
        corpus
    }

    /// Load fixtures from a JSON document produced by [`ContentCorpus::to_json`]
    pub fn from_json(json: &str) -> Result<Self, CorpusError> {
        let loaded: ContentCorpus = serde_json::from_str(json)?;
        let mut corpus = Self::new();
        for fixture in loaded.fixtures {
            corpus.add(fixture)?;
        }
        Ok(corpus)
    }

    pub fn to_json(&self) -> Result<String, CorpusError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn add(&mut self, fixture: ContentFixture) -> Result<(), CorpusError> {
        if self.get(&fixture.name).is_some() {
            return Err(CorpusError::DuplicateFixture(fixture.name));
        }
        self.fixtures.push(fixture);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ContentFixture> {
        self.fixtures.iter().find(|f| f.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContentFixture> {
        self.fixtures.iter()
    }

    pub fn by_category(&self, category: TestCategory) -> impl Iterator<Item = &ContentFixture> {
        self.fixtures.iter().filter(move |f| f.category == category)
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }

    /// Count fixtures per category
    pub fn statistics(&self) -> HashMap<TestCategory, usize> {
        let mut stats = HashMap::new();
        for fixture in &self.fixtures {
            *stats.entry(fixture.category).or_insert(0) += 1;
        }
        stats
    }
}

const REALISTIC_PAGE: &str = "\
% page content
q
1 0 0 1 72 72 cm
/GS0 gs
0.2 0.4 0.6 rg
0 0 200 100 re
f
Q
BT
/F1 12 Tf
14 TL
72 712 Td
(Hello, World!) Tj
T*
[(W) 120 (orld)] TJ
ET
/Artifact <</Type /Pagination>> BDC
0 g
0 0 m 100 0 l S
EMC
q
100 0 0 100 300 300 cm
/Im1 Do
Q
BI /W 2 /H 2 /BPC 1 /CS /G /F /AHx ID
F0F0>
EI
";

fn builtin_fixtures() -> Vec<ContentFixture> {
    use ErrorKind::*;
    use TestCategory::*;

    let nested = |depth: usize| {
        let mut builder = ContentBuilder::new();
        for _ in 0..depth {
            builder.save_state();
        }
        builder.gray_fill(0.0);
        for _ in 0..depth {
            builder.restore_state();
        }
        builder.build()
    };

    vec![
        // Minimal
        ContentFixture::valid("empty", Minimal, "Empty stream", "", Some(0)),
        ContentFixture::valid(
            "single_stroke",
            Minimal,
            "One stroked line",
            "0 0 m 100 100 l S",
            Some(3),
        ),
        ContentFixture::valid(
            "filled_rectangle",
            Minimal,
            "Rectangle filled with nonzero winding",
            "0 0 200 100 re f",
            Some(2),
        ),
        ContentFixture::valid("gray_fill", Minimal, "Lone color operator", "0.5 g", Some(1)),
        // Standard
        ContentFixture::valid(
            "text_block",
            Standard,
            "Single line of text",
            "BT /F1 12 Tf 72 712 Td (Hello) Tj ET",
            Some(5),
        ),
        ContentFixture::valid(
            "transformed_path",
            Standard,
            "Path drawn under a saved CTM",
            "q 1 0 0 1 50 50 cm 0 0 m 100 100 l S Q",
            Some(6),
        ),
        ContentFixture::valid(
            "image_xobject",
            Standard,
            "Image placed through Do",
            "q 100 0 0 100 0 0 cm /Im1 Do Q",
            Some(4),
        ),
        ContentFixture::valid(
            "named_xobject",
            Standard,
            "Do with a name operand",
            "/Test Do",
            Some(1),
        ),
        ContentFixture::valid(
            "artifact",
            Standard,
            "Marked content sequence",
            "/Artifact BMC 0 g EMC",
            Some(3),
        ),
        ContentFixture::valid(
            "page_level_text_state",
            Standard,
            "Text state outside a text object",
            "/F1 12 Tf 0 Tc",
            Some(2),
        ),
        ContentFixture::valid(
            "device_colors",
            Standard,
            "Every device color operator",
            "0.1 g 0.1 G 1 0 0 rg 0 1 0 RG 0 0 0 1 k 1 1 1 0 K",
            Some(6),
        ),
        ContentFixture::valid(
            "clipped_path",
            Standard,
            "Clip followed by no-op painting",
            "0 0 100 100 re W n",
            Some(3),
        ),
        // Complex
        ContentFixture::valid(
            "realistic_page",
            Complex,
            "Page mixing state blocks, text, marked content and an inline image",
            REALISTIC_PAGE,
            Some(28),
        ),
        ContentFixture::valid(
            "type3_glyph",
            Complex,
            "Type 3 glyph description with a bounding box",
            "750 0 0 -14 700 712 d1\n0 0 m 700 0 l 700 700 l h f",
            Some(6),
        ),
        ContentFixture::valid(
            "nested_state_blocks",
            Complex,
            "Ten nested graphics state blocks",
            nested(10),
            Some(21),
        ),
        ContentFixture::valid(
            "marked_text",
            Complex,
            "Marked content inside a text object",
            "BT /Span <</MCID 3>> BDC /F1 9 Tf (x) Tj EMC ET",
            Some(6),
        ),
        ContentFixture::valid(
            "compatibility_section",
            Complex,
            "Unknown operator inside BX/EX",
            "BX /Foo 1 2 zz EX",
            None,
        ),
        // Edge cases
        ContentFixture::valid(
            "comment_only",
            EdgeCases,
            "Comments are whitespace",
            "% nothing to see here\n",
            Some(0),
        ),
        ContentFixture::valid(
            "glyph_width",
            EdgeCases,
            "d0 as the only operator",
            "0 0 d0",
            Some(1),
        ),
        ContentFixture::valid(
            "leading_dot_numbers",
            EdgeCases,
            "Reals without an integer part",
            ".5 -.25 m 1 1 l S",
            Some(3),
        ),
        ContentFixture::valid(
            "hex_text",
            EdgeCases,
            "Hex string shown in a text object",
            "BT <48656C6C6F> Tj ET",
            Some(3),
        ),
        ContentFixture::valid(
            "kerned_array",
            EdgeCases,
            "TJ array mixing strings and numbers",
            "BT [(A) -120 (B)] TJ ET",
            Some(3),
        ),
        ContentFixture::valid(
            "nested_properties",
            EdgeCases,
            "Inline dictionary holding a dictionary and an array",
            "/OC <</Type /OCMD /Nested <</A [1 2 3]>>>> BDC EMC",
            Some(2),
        ),
        ContentFixture::valid(
            "binary_inline_image",
            EdgeCases,
            "Inline image with a binary sample",
            &b"BI /W 1 /H 1 /BPC 8 /CS /G ID \x00 EI"[..],
            Some(3),
        ),
        ContentFixture::valid(
            "no_whitespace_delimiters",
            EdgeCases,
            "Delimiters separate tokens without whitespace",
            "BT/F1 12 Tf[(a)2(b)]TJ ET",
            Some(4),
        ),
        // Malformed
        ContentFixture::invalid(
            "curve_missing_operands",
            Malformed,
            "c with three operands",
            "0 1 2 c",
            Arity,
        )
        .at(0),
        ContentFixture::invalid(
            "word_instead_of_number",
            Malformed,
            "Bare word before Tc",
            "Abcde Tc",
            Grammar,
        )
        .at(0),
        ContentFixture::invalid(
            "word_instead_of_name",
            Malformed,
            "Bare word before Do",
            "Scooby Do",
            Grammar,
        )
        .at(0),
        ContentFixture::invalid(
            "font_size_as_name",
            Malformed,
            "Tf with a name where a number belongs",
            "BT /F1 /Twelve Tf ET",
            Type,
        )
        .at(7),
        ContentFixture::invalid(
            "unterminated_string",
            Malformed,
            "Literal string never closed",
            "BT (unterminated Tj ET",
            Lexical,
        )
        .at(3),
        ContentFixture::invalid(
            "bad_hex_digit",
            Malformed,
            "Hex string with a non-hex character",
            "BT <4G> Tj ET",
            Lexical,
        ),
        ContentFixture::invalid(
            "malformed_number",
            Malformed,
            "Number with two decimal points",
            "1.2.3 g",
            Lexical,
        )
        .at(0),
        ContentFixture::invalid(
            "unclosed_text",
            Malformed,
            "BT without ET",
            "BT /F1 12 Tf",
            Grammar,
        ),
        ContentFixture::invalid(
            "unclosed_state_block",
            Malformed,
            "q without Q",
            "q 0 g",
            Grammar,
        ),
        ContentFixture::invalid("stray_restore", Malformed, "Q without q", "Q", Grammar).at(0),
        ContentFixture::invalid(
            "text_outside_object",
            Malformed,
            "Tj at page level",
            "(Hello) Tj",
            Grammar,
        )
        .at(8),
        ContentFixture::invalid(
            "paint_without_path",
            Malformed,
            "S with no path",
            "S",
            Grammar,
        )
        .at(0),
        ContentFixture::invalid(
            "unpainted_path",
            Malformed,
            "Path never painted",
            "0 0 m 1 1 l",
            Grammar,
        ),
        ContentFixture::invalid(
            "dangling_operands",
            Malformed,
            "Operands with no operator",
            "0 g 1 2 3",
            Grammar,
        ),
        ContentFixture::invalid(
            "matrix_in_text",
            Malformed,
            "cm inside a text object",
            "BT 1 0 0 1 0 0 cm ET",
            Grammar,
        ),
        ContentFixture::invalid(
            "late_glyph_width",
            Malformed,
            "d0 after other operators",
            "0 g 0 0 d0",
            Grammar,
        ),
        ContentFixture::invalid(
            "interleaved_sequences",
            Malformed,
            "Marked content closed after its text object",
            "BT /A BMC ET EMC",
            Grammar,
        ),
        ContentFixture::invalid(
            "too_deep",
            Malformed,
            "Graphics state nesting past the default limit",
            nested(40),
            Grammar,
        ),
        // Profiles
        ContentFixture::invalid(
            "strict_compatibility",
            Profiles,
            "Unknown operator rejected by the strict profile",
            "BX /Foo 1 2 zz EX",
            Grammar,
        )
        .with_profile(Profile::Strict),
        ContentFixture::valid(
            "lenient_unclosed_state",
            Profiles,
            "Page split across streams leaves q open",
            "q 1 0 0 1 0 0 cm q 0 g",
            Some(4),
        )
        .with_profile(Profile::Lenient),
        ContentFixture::valid(
            "lenient_deep_nesting",
            Profiles,
            "Deep nesting accepted by the lenient profile",
            nested(40),
            Some(81),
        )
        .with_profile(Profile::Lenient),
    ]
}
