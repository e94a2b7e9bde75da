//! PDF content stream builder for Type 3 glyph procedures.
//!
//! Covers the glyph metric operators (`d0`, `d1`) and the graphics
//! operators a glyph description may use (ISO 32000-1:2008, 8.4-8.5 and
//! 9.6.5).

use crate::error::Result;
use std::io::Write;

/// Operations that can be added to a content stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentStreamOp {
    /// Set glyph width, colored glyph (d0)
    GlyphWidth(f32, f32),
    /// Set glyph width and bounding box, uncolored glyph (d1)
    GlyphWidthBBox(f32, f32, f32, f32, f32, f32),
    /// Save graphics state (q)
    SaveState,
    /// Restore graphics state (Q)
    RestoreState,
    /// Set transformation matrix (cm)
    Transform(f32, f32, f32, f32, f32, f32),
    /// Set fill color RGB (rg)
    SetFillColorRGB(f32, f32, f32),
    /// Set fill color gray (g)
    SetFillColorGray(f32),
    /// Set stroke color gray (G)
    SetStrokeColorGray(f32),
    /// Set line width (w)
    SetLineWidth(f32),
    /// Move to (m)
    MoveTo(f32, f32),
    /// Line to (l)
    LineTo(f32, f32),
    /// Curve to (c)
    CurveTo(f32, f32, f32, f32, f32, f32),
    /// Rectangle (re)
    Rectangle(f32, f32, f32, f32),
    /// Close path (h)
    ClosePath,
    /// Stroke (S)
    Stroke,
    /// Fill (f)
    Fill,
    /// Fill using even-odd rule (f*)
    FillEvenOdd,
    /// Fill and stroke (B)
    FillStroke,
    /// End path without filling/stroking (n)
    EndPath,
}

/// Builder for PDF content streams.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ContentStreamBuilder {
    operations: Vec<ContentStreamOp>,
}

impl ContentStreamBuilder {
    /// Create a new content stream builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an operation to the stream.
    pub fn op(&mut self, op: ContentStreamOp) -> &mut Self {
        self.operations.push(op);
        self
    }

    /// Operations added so far.
    pub fn operations(&self) -> &[ContentStreamOp] {
        &self.operations
    }

    /// Whether no operation has been added.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Set fill gray level.
    pub fn set_fill_gray(&mut self, gray: f32) -> &mut Self {
        self.op(ContentStreamOp::SetFillColorGray(gray))
    }

    /// Set stroke gray level.
    pub fn set_stroke_gray(&mut self, gray: f32) -> &mut Self {
        self.op(ContentStreamOp::SetStrokeColorGray(gray))
    }

    /// Set fill RGB color.
    pub fn set_fill_color(&mut self, r: f32, g: f32, b: f32) -> &mut Self {
        self.op(ContentStreamOp::SetFillColorRGB(r, g, b))
    }

    /// Set line width.
    pub fn set_line_width(&mut self, width: f32) -> &mut Self {
        self.op(ContentStreamOp::SetLineWidth(width))
    }

    /// Move to a point.
    pub fn move_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.op(ContentStreamOp::MoveTo(x, y))
    }

    /// Line to a point.
    pub fn line_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.op(ContentStreamOp::LineTo(x, y))
    }

    /// Bézier curve to (x3, y3).
    pub fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x3: f32, y3: f32) -> &mut Self {
        self.op(ContentStreamOp::CurveTo(x1, y1, x2, y2, x3, y3))
    }

    /// Append a rectangle.
    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32) -> &mut Self {
        self.op(ContentStreamOp::Rectangle(x, y, width, height))
    }

    /// Close the current subpath.
    pub fn close_path(&mut self) -> &mut Self {
        self.op(ContentStreamOp::ClosePath)
    }

    /// Stroke the path.
    pub fn stroke(&mut self) -> &mut Self {
        self.op(ContentStreamOp::Stroke)
    }

    /// Fill the path.
    pub fn fill(&mut self) -> &mut Self {
        self.op(ContentStreamOp::Fill)
    }

    /// Fill the path with the even-odd rule.
    pub fn fill_even_odd(&mut self) -> &mut Self {
        self.op(ContentStreamOp::FillEvenOdd)
    }

    /// Fill and stroke the path.
    pub fn fill_stroke(&mut self) -> &mut Self {
        self.op(ContentStreamOp::FillStroke)
    }

    /// End the path without painting it (clipping paths).
    pub fn end_path(&mut self) -> &mut Self {
        self.op(ContentStreamOp::EndPath)
    }

    /// Save graphics state.
    pub fn save_state(&mut self) -> &mut Self {
        self.op(ContentStreamOp::SaveState)
    }

    /// Restore graphics state.
    pub fn restore_state(&mut self) -> &mut Self {
        self.op(ContentStreamOp::RestoreState)
    }

    /// Concatenate a matrix to the CTM.
    pub fn transform(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> &mut Self {
        self.op(ContentStreamOp::Transform(a, b, c, d, e, f))
    }

    /// Build the content stream to bytes.
    pub fn build(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    /// Write all operations, one per line.
    pub fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        for op in &self.operations {
            write_op(w, op)?;
            writeln!(w)?;
        }
        Ok(())
    }
}

/// Write a single operation.
pub fn write_op<W: Write>(w: &mut W, op: &ContentStreamOp) -> std::io::Result<()> {
    match op {
        ContentStreamOp::GlyphWidth(wx, wy) => write!(w, "{} {} d0", wx, wy),
        ContentStreamOp::GlyphWidthBBox(wx, wy, llx, lly, urx, ury) => {
            write!(w, "{} {} {} {} {} {} d1", wx, wy, llx, lly, urx, ury)
        },
        ContentStreamOp::SaveState => write!(w, "q"),
        ContentStreamOp::RestoreState => write!(w, "Q"),
        ContentStreamOp::Transform(a, b, c, d, e, f) => {
            write!(w, "{} {} {} {} {} {} cm", a, b, c, d, e, f)
        },
        ContentStreamOp::SetFillColorRGB(r, g, b) => write!(w, "{} {} {} rg", r, g, b),
        ContentStreamOp::SetFillColorGray(g) => write!(w, "{} g", g),
        ContentStreamOp::SetStrokeColorGray(g) => write!(w, "{} G", g),
        ContentStreamOp::SetLineWidth(width) => write!(w, "{} w", width),
        ContentStreamOp::MoveTo(x, y) => write!(w, "{} {} m", x, y),
        ContentStreamOp::LineTo(x, y) => write!(w, "{} {} l", x, y),
        ContentStreamOp::CurveTo(x1, y1, x2, y2, x3, y3) => {
            write!(w, "{} {} {} {} {} {} c", x1, y1, x2, y2, x3, y3)
        },
        ContentStreamOp::Rectangle(x, y, w_val, h) => write!(w, "{} {} {} {} re", x, y, w_val, h),
        ContentStreamOp::ClosePath => write!(w, "h"),
        ContentStreamOp::Stroke => write!(w, "S"),
        ContentStreamOp::Fill => write!(w, "f"),
        ContentStreamOp::FillEvenOdd => write!(w, "f*"),
        ContentStreamOp::FillStroke => write!(w, "B"),
        ContentStreamOp::EndPath => write!(w, "n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colored_glyph() {
        let mut builder = ContentStreamBuilder::new();
        builder
            .op(ContentStreamOp::GlyphWidth(500.0, 0.0))
            .set_fill_color(1.0, 0.0, 0.0)
            .rect(0.0, 0.0, 500.0, 500.0)
            .fill()
            .set_stroke_gray(0.5)
            .rect(0.0, 0.0, 500.0, 500.0)
            .stroke();
        let content = String::from_utf8(builder.build().unwrap()).unwrap();
        assert_eq!(
            content,
            "500 0 d0\n1 0 0 rg\n0 0 500 500 re\nf\n0.5 G\n0 0 500 500 re\nS\n"
        );
        assert_eq!(builder.operations().len(), 7);
    }

    #[test]
    fn test_glyph_procedure() {
        let mut builder = ContentStreamBuilder::new();
        builder
            .op(ContentStreamOp::GlyphWidthBBox(600.0, 0.0, 0.0, 0.0, 600.0, 700.0))
            .rect(50.0, 0.0, 500.0, 700.0)
            .fill();
        let content = String::from_utf8(builder.build().unwrap()).unwrap();
        assert_eq!(content, "600 0 0 0 600 700 d1\n50 0 500 700 re\nf\n");
    }

    #[test]
    fn test_path_ops() {
        let mut builder = ContentStreamBuilder::new();
        builder
            .save_state()
            .set_line_width(0.5)
            .move_to(0.0, 0.0)
            .curve_to(10.0, 10.0, 20.0, 10.0, 30.0, 0.0)
            .close_path()
            .stroke()
            .restore_state();
        let content = String::from_utf8(builder.build().unwrap()).unwrap();
        assert!(content.contains("0.5 w"));
        assert!(content.contains("10 10 20 10 30 0 c"));
        assert!(content.starts_with("q\n"));
        assert!(content.ends_with("Q\n"));
    }
}
