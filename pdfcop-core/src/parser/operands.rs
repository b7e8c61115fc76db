//! Operand values consumed by content stream operators
//!
//! `Display` writes operands back as PDF syntax, so a parsed invocation can be
//! re-serialized and parsed again to the same values. Inline image data is
//! binary: `Display` maps its bytes to Latin-1 characters, which a UTF-8
//! `String` cannot carry back unchanged. [`Operand::write_to`] writes the exact
//! bytes.

use std::fmt::{self, Write as _};
use std::io;

/// String operand, remembering whether it was written in hex form
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PdfString {
    bytes: Vec<u8>,
    hex: bool,
}

impl PdfString {
    pub fn literal(bytes: Vec<u8>) -> Self {
        Self { bytes, hex: false }
    }

    pub fn hex(bytes: Vec<u8>) -> Self {
        Self { bytes, hex: true }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_hex(&self) -> bool {
        self.hex
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl fmt::Display for PdfString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hex {
            f.write_char('<')?;
            for byte in &self.bytes {
                write!(f, "{byte:02X}")?;
            }
            return f.write_char('>');
        }

        f.write_char('(')?;
        for &byte in &self.bytes {
            match byte {
                b'(' | b')' | b'\\' => write!(f, "\\{}", byte as char)?,
                b'\n' => f.write_str("\\n")?,
                b'\r' => f.write_str("\\r")?,
                b'\t' => f.write_str("\\t")?,
                0x20..=0x7E => f.write_char(byte as char)?,
                _ => write!(f, "\\{byte:03o}")?,
            }
        }
        f.write_char(')')
    }
}

/// A resolved operand value
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Operand {
    Integer(i64),
    Real(f64),
    Boolean(bool),
    Null,
    /// Name without the leading `/`
    Name(String),
    String(PdfString),
    Array(Vec<Operand>),
    /// Inline dictionary, entries in source order
    Dictionary(Vec<(String, Operand)>),
    /// Raw inline image bytes (only before `EI`)
    InlineData(Vec<u8>),
}

impl Operand {
    pub fn is_number(&self) -> bool {
        matches!(self, Operand::Integer(_) | Operand::Real(_))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Operand::Integer(i) => Some(*i as f64),
            Operand::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Operand::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Operand::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Operand::Name(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&PdfString> {
        match self {
            Operand::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Operand]> {
        match self {
            Operand::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&[(String, Operand)]> {
        match self {
            Operand::Dictionary(entries) => Some(entries),
            _ => None,
        }
    }

    /// Value of `key` if this is a dictionary
    pub fn get(&self, key: &str) -> Option<&Operand> {
        self.as_dictionary()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    pub fn as_inline_data(&self) -> Option<&[u8]> {
        match self {
            Operand::InlineData(data) => Some(data),
            _ => None,
        }
    }

    /// Writes the operand as PDF syntax, copying inline image data verbatim
    pub fn write_to<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        match self {
            Operand::InlineData(data) => out.write_all(data),
            // Everything else renders as ASCII; inline data never nests
            other => write!(out, "{other}"),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        // Writing into a Vec cannot fail
        let _ = self.write_to(&mut out);
        out
    }

    /// Lexical kind, as used in type errors
    pub fn kind_name(&self) -> &'static str {
        match self {
            Operand::Integer(_) => "integer",
            Operand::Real(_) => "real",
            Operand::Boolean(_) => "boolean",
            Operand::Null => "null",
            Operand::Name(_) => "name",
            Operand::String(_) => "string",
            Operand::Array(_) => "array",
            Operand::Dictionary(_) => "dictionary",
            Operand::InlineData(_) => "inline image data",
        }
    }
}

fn write_name(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    f.write_char('/')?;
    for &byte in name.as_bytes() {
        let regular = (0x21..=0x7E).contains(&byte)
            && !matches!(
                byte,
                b'#' | b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
            );
        if regular {
            f.write_char(byte as char)?;
        } else {
            write!(f, "#{byte:02X}")?;
        }
    }
    Ok(())
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Integer(i) => write!(f, "{i}"),
            // Keep a decimal point so the value reads back as a real
            Operand::Real(r) if r.is_finite() && r.fract() == 0.0 => write!(f, "{r:.1}"),
            Operand::Real(r) => write!(f, "{r}"),
            Operand::Boolean(b) => write!(f, "{b}"),
            Operand::Null => f.write_str("null"),
            Operand::Name(name) => write_name(f, name),
            Operand::String(s) => write!(f, "{s}"),
            Operand::Array(items) => {
                f.write_char('[')?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_char(' ')?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_char(']')
            }
            Operand::Dictionary(entries) => {
                f.write_str("<<")?;
                for (key, value) in entries {
                    f.write_char(' ')?;
                    write_name(f, key)?;
                    write!(f, " {value}")?;
                }
                f.write_str(" >>")
            }
            Operand::InlineData(data) => {
                for &byte in data {
                    f.write_char(char::from(byte))?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_display() {
        assert_eq!(Operand::Integer(-12).to_string(), "-12");
        assert_eq!(Operand::Real(757.0).to_string(), "757.0");
        assert_eq!(Operand::Real(379.70001).to_string(), "379.70001");
        assert_eq!(Operand::Real(-0.5).to_string(), "-0.5");
    }

    #[test]
    fn test_name_display_escapes() {
        assert_eq!(Operand::Name("Im1".to_string()).to_string(), "/Im1");
        assert_eq!(
            Operand::Name("Name with#".to_string()).to_string(),
            "/Name#20with#23"
        );
    }

    #[test]
    fn test_string_display() {
        let literal = PdfString::literal(b"a(b)\\c\n\x01".to_vec());
        assert_eq!(literal.to_string(), "(a\\(b\\)\\\\c\\n\\001)");
        let hex = PdfString::hex(vec![0xDE, 0xAD]);
        assert_eq!(hex.to_string(), "<DEAD>");
        assert!(hex.is_hex());
        assert_eq!(hex.as_bytes(), &[0xDE, 0xAD]);
    }

    #[test]
    fn test_composite_display() {
        let array = Operand::Array(vec![Operand::Integer(3), Operand::Real(1.5)]);
        assert_eq!(array.to_string(), "[3 1.5]");

        let dict = Operand::Dictionary(vec![
            ("MCID".to_string(), Operand::Integer(0)),
            ("Lang".to_string(), Operand::String(PdfString::literal(b"en".to_vec()))),
        ]);
        assert_eq!(dict.to_string(), "<< /MCID 0 /Lang (en) >>");
        assert_eq!(dict.get("MCID"), Some(&Operand::Integer(0)));
        assert_eq!(dict.get("Missing"), None);
    }

    #[test]
    fn test_inline_data_bytes_written_verbatim() {
        let data = Operand::InlineData(vec![0xC8, 0xFF, b'E', 0x00]);
        assert_eq!(data.to_bytes(), vec![0xC8, 0xFF, b'E', 0x00]);
        // Display goes through chars, so high bytes widen in UTF-8
        assert_eq!(data.to_string().into_bytes(), "\u{C8}\u{FF}E\0".as_bytes());

        let name = Operand::Name("F1".to_string());
        assert_eq!(name.to_bytes(), b"/F1");
        let hex = Operand::String(PdfString::hex(vec![0xC8]));
        assert_eq!(hex.to_bytes(), b"<C8>");
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Operand::Integer(4).as_number(), Some(4.0));
        assert_eq!(Operand::Real(4.5).as_integer(), None);
        assert_eq!(Operand::Name("F1".to_string()).as_name(), Some("F1"));
        assert_eq!(Operand::Boolean(true).as_bool(), Some(true));
        assert!(Operand::Null.as_array().is_none());
        assert_eq!(Operand::Null.kind_name(), "null");
        assert_eq!(Operand::InlineData(vec![1, 2]).as_inline_data(), Some(&[1u8, 2][..]));
    }
}
