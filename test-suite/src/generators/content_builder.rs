//! Content Stream Builder
//!
//! A builder for writing content streams operator by operator, used by the
//! corpus, the conformance tests and the benchmarks.

use std::fmt::Write as _;

/// Builder for content stream bytes
#[derive(Debug, Clone, Default)]
pub struct ContentBuilder {
    buffer: String,
    operators: usize,
}

impl ContentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one operator with its already formatted operands
    pub fn op(&mut self, operands: &[&str], keyword: &str) -> &mut Self {
        for operand in operands {
            self.buffer.push_str(operand);
            self.buffer.push(' ');
        }
        self.buffer.push_str(keyword);
        self.buffer.push('\n');
        self.operators += 1;
        self
    }

    /// Append raw bytes of content text without counting operators
    pub fn raw(&mut self, text: &str) -> &mut Self {
        self.buffer.push_str(text);
        self
    }

    pub fn comment(&mut self, text: &str) -> &mut Self {
        let _ = writeln!(self.buffer, "% {text}");
        self
    }

    fn numbers(&mut self, values: &[f64], keyword: &str) -> &mut Self {
        let operands: Vec<String> = values.iter().map(|v| format_number(*v)).collect();
        let refs: Vec<&str> = operands.iter().map(String::as_str).collect();
        self.op(&refs, keyword)
    }

    // Graphics state

    pub fn save_state(&mut self) -> &mut Self {
        self.op(&[], "q")
    }

    pub fn restore_state(&mut self) -> &mut Self {
        self.op(&[], "Q")
    }

    pub fn transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> &mut Self {
        self.numbers(&[a, b, c, d, e, f], "cm")
    }

    pub fn line_width(&mut self, width: f64) -> &mut Self {
        self.numbers(&[width], "w")
    }

    pub fn dash(&mut self, pattern: &[f64], phase: f64) -> &mut Self {
        let items: Vec<String> = pattern.iter().map(|v| format_number(*v)).collect();
        let array = format!("[{}]", items.join(" "));
        let phase = format_number(phase);
        self.op(&[&array, &phase], "d")
    }

    pub fn ext_g_state(&mut self, name: &str) -> &mut Self {
        let name = format!("/{name}");
        self.op(&[&name], "gs")
    }

    // Paths

    pub fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.numbers(&[x, y], "m")
    }

    pub fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.numbers(&[x, y], "l")
    }

    pub fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) -> &mut Self {
        self.numbers(&[x1, y1, x2, y2, x3, y3], "c")
    }

    pub fn rectangle(&mut self, x: f64, y: f64, width: f64, height: f64) -> &mut Self {
        self.numbers(&[x, y, width, height], "re")
    }

    pub fn close_path(&mut self) -> &mut Self {
        self.op(&[], "h")
    }

    pub fn stroke(&mut self) -> &mut Self {
        self.op(&[], "S")
    }

    pub fn fill(&mut self) -> &mut Self {
        self.op(&[], "f")
    }

    pub fn clip(&mut self) -> &mut Self {
        self.op(&[], "W")
    }

    pub fn end_path(&mut self) -> &mut Self {
        self.op(&[], "n")
    }

    // Color

    pub fn gray_fill(&mut self, gray: f64) -> &mut Self {
        self.numbers(&[gray], "g")
    }

    pub fn rgb_fill(&mut self, r: f64, g: f64, b: f64) -> &mut Self {
        self.numbers(&[r, g, b], "rg")
    }

    pub fn rgb_stroke(&mut self, r: f64, g: f64, b: f64) -> &mut Self {
        self.numbers(&[r, g, b], "RG")
    }

    // Text

    pub fn begin_text(&mut self) -> &mut Self {
        self.op(&[], "BT")
    }

    pub fn end_text(&mut self) -> &mut Self {
        self.op(&[], "ET")
    }

    pub fn font(&mut self, name: &str, size: f64) -> &mut Self {
        let name = format!("/{name}");
        let size = format_number(size);
        self.op(&[&name, &size], "Tf")
    }

    pub fn move_text(&mut self, tx: f64, ty: f64) -> &mut Self {
        self.numbers(&[tx, ty], "Td")
    }

    pub fn show_text(&mut self, text: &str) -> &mut Self {
        let literal = escape_literal(text);
        self.op(&[&literal], "Tj")
    }

    /// Convenience for `BT /font size Tf x y Td (text) Tj ET`
    pub fn text_line(&mut self, font: &str, size: f64, x: f64, y: f64, text: &str) -> &mut Self {
        self.begin_text()
            .font(font, size)
            .move_text(x, y)
            .show_text(text)
            .end_text()
    }

    // Marked content and XObjects

    pub fn begin_marked_content(&mut self, tag: &str) -> &mut Self {
        let tag = format!("/{tag}");
        self.op(&[&tag], "BMC")
    }

    pub fn end_marked_content(&mut self) -> &mut Self {
        self.op(&[], "EMC")
    }

    pub fn draw_xobject(&mut self, name: &str) -> &mut Self {
        let name = format!("/{name}");
        self.op(&[&name], "Do")
    }

    /// Number of operators written so far
    pub fn operator_count(&self) -> usize {
        self.operators
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn build(&self) -> Vec<u8> {
        self.buffer.clone().into_bytes()
    }

    /// A page of `paths` stroked polylines, each in its own state block
    pub fn page_with_paths(paths: usize) -> Self {
        let mut builder = Self::new();
        for i in 0..paths {
            let offset = (i % 500) as f64;
            builder
                .save_state()
                .line_width(0.5)
                .rgb_stroke(0.1, 0.2, 0.3)
                .move_to(offset, 0.0)
                .line_to(offset, 100.0)
                .curve_to(offset, 110.0, offset + 10.0, 120.0, offset + 20.0, 120.0)
                .stroke()
                .restore_state();
        }
        builder
    }

    /// A page of `lines` text lines in a single text object
    pub fn page_with_text(lines: usize) -> Self {
        let mut builder = Self::new();
        builder.begin_text().font("F1", 10.0);
        for i in 0..lines {
            builder
                .move_text(0.0, -12.0)
                .show_text(&format!("Line {i} of generated (text)"));
        }
        builder.end_text();
        builder
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

fn escape_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('(');
    for ch in text.chars() {
        match ch {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out.push(')');
    out
}
