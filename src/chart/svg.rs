//! Minimal SVG surface for headless chart output

use std::fmt::Write;

use super::renderer::{Anchor, Pos, Rgb, Size, Surface};

/// Accumulates SVG elements; `finish` wraps them in a document
pub struct SvgSurface {
    size: Size,
    body: String,
}

impl SvgSurface {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            body: String::new(),
        }
    }

    pub fn finish(self) -> String {
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif" font-size="11">
{body}</svg>
"#,
            w = self.size.width,
            h = self.size.height,
            body = self.body
        )
    }
}

impl Surface for SvgSurface {
    fn polyline(&mut self, points: &[Pos], color: Rgb, width: f32) {
        if points.is_empty() {
            return;
        }
        let mut coords = String::with_capacity(points.len() * 12);
        for p in points {
            let _ = write!(coords, "{:.1},{:.1} ", p.x, p.y);
        }
        let _ = writeln!(
            self.body,
            r#"<polyline fill="none" stroke="{}" stroke-width="{}" points="{}"/>"#,
            color.to_hex(),
            width,
            coords.trim_end()
        );
    }

    fn line(&mut self, from: Pos, to: Pos, color: Rgb, width: f32) {
        let _ = writeln!(
            self.body,
            r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-width="{}"/>"#,
            from.x,
            from.y,
            to.x,
            to.y,
            color.to_hex(),
            width
        );
    }

    fn text(&mut self, at: Pos, text: &str, anchor: Anchor, color: Rgb) {
        let (text_anchor, baseline) = match anchor {
            Anchor::TopCenter => ("middle", "hanging"),
            Anchor::RightMiddle => ("end", "middle"),
            Anchor::BottomCenter => ("middle", "auto"),
        };
        let _ = writeln!(
            self.body,
            r#"<text x="{:.1}" y="{:.1}" fill="{}" text-anchor="{}" dominant-baseline="{}">{}</text>"#,
            at.x,
            at.y,
            color.to_hex(),
            text_anchor,
            baseline,
            escape(text)
        );
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elements_written() {
        let mut svg = SvgSurface::new(Size {
            width: 100.0,
            height: 50.0,
        });
        svg.polyline(&[Pos::new(0.0, 1.0), Pos::new(2.5, 3.0)], Rgb(255, 0, 0), 1.5);
        svg.line(Pos::new(0.0, 0.0), Pos::new(10.0, 0.0), Rgb(0, 0, 0), 1.0);
        svg.text(Pos::new(5.0, 5.0), "a<b", Anchor::TopCenter, Rgb(0, 0, 0));
        let doc = svg.finish();

        assert!(doc.starts_with("<svg"));
        assert!(doc.contains(r#"points="0.0,1.0 2.5,3.0""#));
        assert!(doc.contains(r##"stroke="#ff0000""##));
        assert!(doc.contains("a&lt;b"));
        assert!(doc.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_empty_polyline_skipped() {
        let mut svg = SvgSurface::new(Size {
            width: 10.0,
            height: 10.0,
        });
        svg.polyline(&[], Rgb(0, 0, 0), 1.0);
        assert!(!svg.finish().contains("polyline"));
    }
}
