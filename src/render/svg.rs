use std::fmt::Write as _;
use std::io::Write;

use crate::render::{Direction, DrawCommand, DrawingSink, RenderError, Style};

const FONT_FAMILY: &str = "Helvetica";

/// Escape special XML characters.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn style_attrs(style: &Style) -> String {
    let mut attrs = String::new();
    if let Some(fill) = &style.fill {
        let _ = write!(attrs, r#" fill="{}""#, escape_xml(fill));
    }
    if let Some(stroke) = &style.stroke {
        let _ = write!(attrs, r#" stroke="{}""#, escape_xml(stroke));
    }
    if let Some(width) = style.stroke_width {
        let _ = write!(attrs, r#" stroke-width="{width}""#);
    }
    if let Some(opacity) = style.opacity {
        let _ = write!(attrs, r#" opacity="{opacity}""#);
    }
    if let Some(id) = &style.id {
        let _ = write!(attrs, r#" id="{}""#, escape_xml(id));
    }
    attrs
}

/// Outline of a block arrow as polygon points.
fn block_arrow_points(x: f64, y: f64, width: f64, height: f64, arrow_width: f64, direction: Direction) -> String {
    let arrow_width = arrow_width.min(width).max(0.0);
    let mid = y + height / 2.0;
    let bottom = y + height;
    let points = match direction {
        Direction::Right => {
            let shoulder = x + width - arrow_width;
            [(x, y), (shoulder, y), (x + width, mid), (shoulder, bottom), (x, bottom)]
        }
        Direction::Left => {
            let shoulder = x + arrow_width;
            let right = x + width;
            [(right, y), (shoulder, y), (x, mid), (shoulder, bottom), (right, bottom)]
        }
    };
    points
        .iter()
        .map(|(px, py)| format!("{px:.2},{py:.2}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Triangular arrowhead with its tip at `(x, y)`.
fn arrowhead_path(x: f64, y: f64, direction: Direction, scale: f64) -> String {
    let back = match direction {
        Direction::Right => x - 10.0 * scale,
        Direction::Left => x + 10.0 * scale,
    };
    format!(
        "M {back:.2} {:.2} L {x:.2} {y:.2} L {back:.2} {:.2} z",
        y - 5.0 * scale,
        y + 5.0 * scale
    )
}

/// Serializes a command stream as an SVG 1.1 document.
pub struct SvgWriter<W: Write> {
    out: W,
    depth: usize,
}

impl<W: Write> SvgWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, depth: 0 }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, tag: &str) -> Result<(), RenderError> {
        writeln!(self.out, "{}{}", "  ".repeat(self.depth), tag)?;
        Ok(())
    }
}

impl<W: Write> DrawingSink for SvgWriter<W> {
    fn begin_document(&mut self, width: f64, height: f64) -> Result<(), RenderError> {
        writeln!(self.out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(
            self.out,
            r#"<svg version="1.1" baseProfile="full" width="{width}" height="{height}" xmlns="http://www.w3.org/2000/svg">"#
        )?;
        self.depth = 1;
        Ok(())
    }

    fn draw(&mut self, command: DrawCommand) -> Result<(), RenderError> {
        match command {
            DrawCommand::Line { x1, y1, x2, y2, style } => {
                let tag = format!(
                    r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}"{} />"#,
                    style_attrs(&style)
                );
                self.line(&tag)
            }
            DrawCommand::Rect {
                x,
                y,
                width,
                height,
                style,
            } => {
                let tag = format!(
                    r#"<rect x="{x:.2}" y="{y:.2}" width="{width:.2}" height="{height:.2}"{} />"#,
                    style_attrs(&style)
                );
                self.line(&tag)
            }
            DrawCommand::Text {
                x,
                y,
                text,
                size,
                anchor,
                style,
            } => {
                let tag = format!(
                    r#"<text x="{x:.2}" y="{y:.2}" font-size="{size}" font-family="{FONT_FAMILY}" text-anchor="{anchor}"{}>{}</text>"#,
                    style_attrs(&style),
                    escape_xml(&text)
                );
                self.line(&tag)
            }
            DrawCommand::BlockArrow {
                x,
                y,
                width,
                height,
                arrow_width,
                direction,
                style,
            } => {
                let tag = format!(
                    r#"<polygon points="{}"{} />"#,
                    block_arrow_points(x, y, width, height, arrow_width, direction),
                    style_attrs(&style)
                );
                self.line(&tag)
            }
            DrawCommand::ArrowLine {
                x1,
                y1,
                x2,
                y2,
                direction,
                arrows,
                arrow_scale,
                filled,
                style,
            } => {
                let tag = format!(
                    r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}"{} />"#,
                    style_attrs(&style)
                );
                self.line(&tag)?;
                let color = style.stroke.as_deref().unwrap_or("black");
                let paint = if filled {
                    format!(r#"fill="{}" stroke="none""#, escape_xml(color))
                } else {
                    format!(r#"fill="none" stroke="{}""#, escape_xml(color))
                };
                for fraction in arrows {
                    let ax = x1 + (x2 - x1) * fraction;
                    let ay = y1 + (y2 - y1) * fraction;
                    let tag = format!(
                        r#"<path d="{}" {paint} />"#,
                        arrowhead_path(ax, ay, direction, arrow_scale)
                    );
                    self.line(&tag)?;
                }
                Ok(())
            }
            DrawCommand::BeginClip {
                id,
                name,
                x,
                y,
                width,
                height,
            } => {
                self.line(&format!("<!-- {} -->", escape_xml(&name).replace("--", "- -")))?;
                self.line(&format!(
                    r#"<clipPath id="clip_path_{id}"><rect x="{x:.2}" y="{y:.2}" width="{width:.2}" height="{height:.2}" /></clipPath>"#
                ))?;
                self.line(&format!(r#"<g clip-path="url(#clip_path_{id})">"#))?;
                self.depth += 1;
                Ok(())
            }
            DrawCommand::EndClip => {
                self.depth = self.depth.saturating_sub(1).max(1);
                self.line("</g>")
            }
        }
    }

    fn end_document(&mut self) -> Result<(), RenderError> {
        self.depth = 0;
        writeln!(self.out, "</svg>")?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Anchor;

    fn render(commands: Vec<DrawCommand>) -> String {
        let mut writer = SvgWriter::new(Vec::new());
        writer.begin_document(100.0, 50.0).unwrap();
        for command in commands {
            writer.draw(command).unwrap();
        }
        writer.end_document().unwrap();
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml(r#"<a & "b">"#), "&lt;a &amp; &quot;b&quot;&gt;");
    }

    #[test]
    fn test_document_frame() {
        let svg = render(Vec::new());
        assert!(svg.contains(r#"width="100" height="50""#));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_text_is_escaped() {
        let svg = render(vec![DrawCommand::text(1.0, 2.0, "a<b", 10.0, Anchor::Start)]);
        assert!(svg.contains(r#"text-anchor="start""#));
        assert!(svg.contains(">a&lt;b</text>"));
    }

    #[test]
    fn test_clip_group_wraps_contents() {
        let svg = render(vec![
            DrawCommand::BeginClip {
                id: 7,
                name: "reads".to_string(),
                x: 0.0,
                y: 0.0,
                width: 10.0,
                height: 10.0,
            },
            DrawCommand::rect(1.0, 1.0, 2.0, 2.0, Style::filled("blue")),
            DrawCommand::EndClip,
        ]);
        let clip = svg.find(r#"<clipPath id="clip_path_7">"#).unwrap();
        let group = svg.find(r#"<g clip-path="url(#clip_path_7)">"#).unwrap();
        let rect = svg.find(r#"fill="blue""#).unwrap();
        let close = svg.find("</g>").unwrap();
        assert!(clip < group && group < rect && rect < close);
    }

    #[test]
    fn test_arrow_line_emits_one_path_per_arrow() {
        let svg = render(vec![DrawCommand::ArrowLine {
            x1: 0.0,
            y1: 5.0,
            x2: 100.0,
            y2: 5.0,
            direction: Direction::Right,
            arrows: vec![0.25, 0.5, 0.75],
            arrow_scale: 1.0,
            filled: true,
            style: Style::stroked("red", 1.0),
        }]);
        assert_eq!(svg.matches("<path").count(), 3);
        // tip of the middle arrow sits at x=50
        assert!(svg.contains("M 40.00 0.00 L 50.00 5.00 L 40.00 10.00 z"));
    }

    #[test]
    fn test_block_arrow_points() {
        assert_eq!(
            block_arrow_points(0.0, 0.0, 10.0, 8.0, 4.0, Direction::Right),
            "0.00,0.00 6.00,0.00 10.00,4.00 6.00,8.00 0.00,8.00"
        );
        assert_eq!(
            block_arrow_points(0.0, 0.0, 10.0, 8.0, 4.0, Direction::Left),
            "10.00,0.00 4.00,0.00 0.00,4.00 4.00,8.00 10.00,8.00"
        );
    }
}
