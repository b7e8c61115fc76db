//! Content Stream Lexer
//!
//! Tokenizes the operator/operand syntax of PDF content streams according to
//! ISO 32000-1 Section 7.2. Whitespace and comments are skipped, never emitted.

use super::{ParseError, ParseResult, Span};

/// Token types in content streams
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Integer(i64),
    Real(f64),
    Boolean(bool),
    Null,
    /// Name without the leading `/`, `#xx` escapes decoded
    Name(String),
    LiteralString(Vec<u8>),
    HexString(Vec<u8>),
    ArrayOpen,
    ArrayClose,
    DictOpen,
    DictClose,
    /// Bare keyword; catalog membership is checked by the grammar
    Operator(String),
    /// Raw bytes between `ID` and `EI`
    InlineData(Vec<u8>),
    Eof,
}

impl TokenKind {
    /// Short description used in error messages
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Integer(i) => format!("integer {i}"),
            TokenKind::Real(r) => format!("real {r}"),
            TokenKind::Boolean(b) => format!("boolean {b}"),
            TokenKind::Null => "null".to_string(),
            TokenKind::Name(n) => format!("name /{n}"),
            TokenKind::LiteralString(_) => "literal string".to_string(),
            TokenKind::HexString(_) => "hex string".to_string(),
            TokenKind::ArrayOpen => "'['".to_string(),
            TokenKind::ArrayClose => "']'".to_string(),
            TokenKind::DictOpen => "'<<'".to_string(),
            TokenKind::DictClose => "'>>'".to_string(),
            TokenKind::Operator(op) => format!("'{op}'"),
            TokenKind::InlineData(data) => format!("{} bytes of inline image data", data.len()),
            TokenKind::Eof => "end of stream".to_string(),
        }
    }
}

/// A classified token together with its location in the input
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    /// Raw bytes of this token in `input`
    pub fn raw<'a>(&self, input: &'a [u8]) -> &'a [u8] {
        let end = self.span.end.min(input.len());
        let start = self.span.start.min(end);
        &input[start..end]
    }

    pub fn as_number(&self) -> Option<f64> {
        match self.kind {
            TokenKind::Integer(i) => Some(i as f64),
            TokenKind::Real(r) => Some(r),
            _ => None,
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}

fn is_whitespace(ch: u8) -> bool {
    matches!(ch, b'\0' | b'\t' | b'\n' | b'\x0C' | b'\r' | b' ')
}

fn is_delimiter(ch: u8) -> bool {
    matches!(
        ch,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

fn is_regular(ch: u8) -> bool {
    !is_whitespace(ch) && !is_delimiter(ch)
}

fn hex_value(ch: u8) -> Option<u8> {
    match ch {
        b'0'..=b'9' => Some(ch - b'0'),
        b'A'..=b'F' => Some(ch - b'A' + 10),
        b'a'..=b'f' => Some(ch - b'a' + 10),
        _ => None,
    }
}

/// Content stream tokenizer
pub struct ContentTokenizer<'a> {
    input: &'a [u8],
    position: usize,
    /// Set after an `ID` keyword: the next token is raw inline image data
    inline_data_pending: bool,
}

impl<'a> ContentTokenizer<'a> {
    /// Create a new tokenizer for the given input
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            position: 0,
            inline_data_pending: false,
        }
    }

    /// Current byte offset
    pub fn position(&self) -> usize {
        self.position
    }

    /// Get the next token from the stream, `Eof` once the input is exhausted
    pub fn next_token(&mut self) -> ParseResult<Token> {
        if self.inline_data_pending {
            self.inline_data_pending = false;
            return self.read_inline_data();
        }

        self.skip_whitespace();

        let start = self.position;
        let ch = match self.input.get(start) {
            Some(&ch) => ch,
            None => return Ok(self.token(TokenKind::Eof, start)),
        };

        match ch {
            b'+' | b'-' | b'.' | b'0'..=b'9' => self.read_number(),
            b'(' => self.read_literal_string(),
            b'<' => {
                if self.peek_next() == Some(b'<') {
                    self.position += 2;
                    Ok(self.token(TokenKind::DictOpen, start))
                } else {
                    self.read_hex_string()
                }
            }
            b'>' => {
                if self.peek_next() == Some(b'>') {
                    self.position += 2;
                    Ok(self.token(TokenKind::DictClose, start))
                } else {
                    Err(ParseError::lexical(start, "Unexpected '>'"))
                }
            }
            b'[' => {
                self.position += 1;
                Ok(self.token(TokenKind::ArrayOpen, start))
            }
            b']' => {
                self.position += 1;
                Ok(self.token(TokenKind::ArrayClose, start))
            }
            b'/' => self.read_name(),
            b')' | b'{' | b'}' => Err(ParseError::lexical(
                start,
                format!("Illegal character {:?} in token position", ch as char),
            )),
            _ => self.read_keyword(),
        }
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token {
        Token {
            kind,
            span: Span::new(start, self.position),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&ch) = self.input.get(self.position) {
            if is_whitespace(ch) {
                self.position += 1;
            } else if ch == b'%' {
                self.skip_comment();
            } else {
                break;
            }
        }
    }

    fn skip_comment(&mut self) {
        while let Some(&ch) = self.input.get(self.position) {
            if ch == b'\n' || ch == b'\r' {
                break;
            }
            self.position += 1;
        }
    }

    fn peek_next(&self) -> Option<u8> {
        self.input.get(self.position + 1).copied()
    }

    fn read_regular_run(&mut self) -> &'a [u8] {
        let start = self.position;
        while self.position < self.input.len() && is_regular(self.input[self.position]) {
            self.position += 1;
        }
        &self.input[start..self.position]
    }

    fn read_number(&mut self) -> ParseResult<Token> {
        let start = self.position;
        let text = self.read_regular_run();

        let malformed = || {
            ParseError::lexical(
                start,
                format!("Malformed number '{}'", String::from_utf8_lossy(text)),
            )
        };

        let (negative, unsigned) = match text.first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };

        let dot = unsigned.iter().position(|&b| b == b'.');
        let (int_part, frac_part) = match dot {
            Some(i) => (&unsigned[..i], Some(&unsigned[i + 1..])),
            None => (unsigned, None),
        };

        let all_digits = |part: &[u8]| part.iter().all(u8::is_ascii_digit);
        if !all_digits(int_part) || !frac_part.map_or(true, all_digits) {
            return Err(malformed());
        }
        if int_part.is_empty() && frac_part.map_or(true, <[u8]>::is_empty) {
            return Err(malformed());
        }

        // Digits only past this point, so the slices are valid UTF-8
        let int_str = std::str::from_utf8(int_part).map_err(|_| malformed())?;
        let sign = if negative { "-" } else { "" };

        let kind = match frac_part {
            None => match format!("{sign}{int_str}").parse::<i64>() {
                Ok(value) => TokenKind::Integer(value),
                Err(_) => {
                    let value = format!("{sign}{int_str}.0")
                        .parse::<f64>()
                        .map_err(|_| malformed())?;
                    TokenKind::Real(value)
                }
            },
            Some(frac) => {
                let frac_str = std::str::from_utf8(frac).map_err(|_| malformed())?;
                let int_str = if int_str.is_empty() { "0" } else { int_str };
                let frac_str = if frac_str.is_empty() { "0" } else { frac_str };
                let value = format!("{sign}{int_str}.{frac_str}")
                    .parse::<f64>()
                    .map_err(|_| malformed())?;
                TokenKind::Real(value)
            }
        };

        Ok(self.token(kind, start))
    }

    fn read_literal_string(&mut self) -> ParseResult<Token> {
        let start = self.position;
        self.position += 1; // Skip opening '('
        let mut result = Vec::new();
        let mut paren_depth = 1;

        while let Some(&ch) = self.input.get(self.position) {
            self.position += 1;

            match ch {
                b'\\' => self.read_escape(&mut result),
                b'(' => {
                    paren_depth += 1;
                    result.push(ch);
                }
                b')' => {
                    paren_depth -= 1;
                    if paren_depth == 0 {
                        return Ok(self.token(TokenKind::LiteralString(result), start));
                    }
                    result.push(ch);
                }
                b'\r' => {
                    // CR and CRLF both read as a single LF
                    if self.input.get(self.position) == Some(&b'\n') {
                        self.position += 1;
                    }
                    result.push(b'\n');
                }
                _ => result.push(ch),
            }
        }

        Err(ParseError::lexical(start, "Unterminated literal string"))
    }

    fn read_escape(&mut self, result: &mut Vec<u8>) {
        let ch = match self.input.get(self.position) {
            Some(&ch) => ch,
            None => return,
        };
        self.position += 1;

        match ch {
            b'n' => result.push(b'\n'),
            b'r' => result.push(b'\r'),
            b't' => result.push(b'\t'),
            b'b' => result.push(b'\x08'),
            b'f' => result.push(b'\x0C'),
            b'(' | b')' | b'\\' => result.push(ch),
            b'0'..=b'7' => {
                self.position -= 1;
                result.push(self.read_octal_escape());
            }
            b'\r' => {
                // Line continuation
                if self.input.get(self.position) == Some(&b'\n') {
                    self.position += 1;
                }
            }
            b'\n' => {}
            _ => result.push(ch), // Unknown escape: the backslash is dropped
        }
    }

    fn read_octal_escape(&mut self) -> u8 {
        let mut value: u16 = 0;
        let mut count = 0;

        while count < 3 {
            match self.input.get(self.position) {
                Some(&digit @ b'0'..=b'7') => {
                    value = value * 8 + u16::from(digit - b'0');
                    self.position += 1;
                    count += 1;
                }
                _ => break,
            }
        }

        // High-order overflow is ignored
        (value & 0xFF) as u8
    }

    fn read_hex_string(&mut self) -> ParseResult<Token> {
        let start = self.position;
        self.position += 1; // Skip opening '<'
        let mut result = Vec::new();
        let mut nibble = None;

        while let Some(&ch) = self.input.get(self.position) {
            if ch == b'>' {
                self.position += 1;
                if let Some(n) = nibble {
                    result.push(n << 4);
                }
                return Ok(self.token(TokenKind::HexString(result), start));
            }

            if is_whitespace(ch) {
                self.position += 1;
                continue;
            }

            let digit = hex_value(ch).ok_or_else(|| {
                ParseError::lexical(
                    self.position,
                    format!("Invalid character in hex string: {:?}", ch as char),
                )
            })?;

            match nibble.take() {
                Some(n) => result.push((n << 4) | digit),
                None => nibble = Some(digit),
            }
            self.position += 1;
        }

        Err(ParseError::lexical(start, "Unterminated hex string"))
    }

    fn read_name(&mut self) -> ParseResult<Token> {
        let start = self.position;
        self.position += 1; // Skip '/'
        let raw = self.read_regular_run();

        let mut decoded = Vec::with_capacity(raw.len());
        let mut i = 0;
        while i < raw.len() {
            if raw[i] == b'#' {
                let high = raw.get(i + 1).copied().and_then(hex_value);
                let low = raw.get(i + 2).copied().and_then(hex_value);
                match (high, low) {
                    (Some(h), Some(l)) => decoded.push((h << 4) | l),
                    _ => {
                        return Err(ParseError::lexical(
                            start + 1 + i,
                            "Invalid hex escape in name",
                        ))
                    }
                }
                i += 3;
            } else {
                decoded.push(raw[i]);
                i += 1;
            }
        }

        let name = String::from_utf8_lossy(&decoded).into_owned();
        Ok(self.token(TokenKind::Name(name), start))
    }

    fn read_keyword(&mut self) -> ParseResult<Token> {
        let start = self.position;
        let raw = self.read_regular_run();
        let keyword = String::from_utf8_lossy(raw).into_owned();

        let kind = match keyword.as_str() {
            "true" => TokenKind::Boolean(true),
            "false" => TokenKind::Boolean(false),
            "null" => TokenKind::Null,
            "ID" => {
                self.inline_data_pending = true;
                TokenKind::Operator(keyword)
            }
            _ => TokenKind::Operator(keyword),
        };

        Ok(self.token(kind, start))
    }

    /// Reads the binary payload of an inline image up to the closing `EI`.
    ///
    /// `EI` only terminates the data when it is preceded by whitespace and
    /// followed by whitespace or the end of input.
    fn read_inline_data(&mut self) -> ParseResult<Token> {
        if self.input.get(self.position).copied().is_some_and(is_whitespace) {
            self.position += 1;
        }
        let start = self.position;

        let mut i = start;
        while i + 1 < self.input.len() {
            let preceded = i > start && is_whitespace(self.input[i - 1]);
            let at_ei = self.input[i] == b'E' && self.input[i + 1] == b'I';
            let followed = self
                .input
                .get(i + 2)
                .map_or(true, |&ch| is_whitespace(ch));

            if at_ei && followed && (preceded || i == start) {
                let data_end = if preceded { i - 1 } else { i };
                let data = self.input[start..data_end].to_vec();
                self.position = data_end;
                return Ok(self.token(TokenKind::InlineData(data), start));
            }
            i += 1;
        }

        Err(ParseError::lexical(start, "Unterminated inline image data"))
    }
}

/// Tokenizes a whole content stream; the result always ends with `Eof`
pub fn tokenize(input: &[u8]) -> ParseResult<Vec<Token>> {
    let mut tokenizer = ContentTokenizer::new(input);
    let mut tokens = Vec::new();

    loop {
        let token = tokenizer.next_token()?;
        let done = token.is_eof();
        tokens.push(token);
        if done {
            break;
        }
    }

    tracing::trace!(tokens = tokens.len(), bytes = input.len(), "tokenized content stream");
    Ok(tokens)
}
