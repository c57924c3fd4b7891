use crate::layout::LayoutError;
use crate::render::{Anchor, Commands, DrawCommand, Style};
use crate::scale::Scale;
use crate::tracks::Track;

/// Approximate glyph width relative to the font size.
const CHAR_WIDTH_FACTOR: f64 = 0.8;
/// Target spacing between tick labels, in pixels.
const PIXELS_PER_LABEL: f64 = 120.0;

/// A horizontal ruler with labelled ticks.
pub struct Axis {
    pub name: String,
    pub height: f64,
    pub font_size: f64,
}

impl Axis {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            height: 50.0,
            font_size: 16.0,
        }
    }

    fn label_width(&self, label: &str) -> f64 {
        label.chars().count() as f64 * self.font_size * CHAR_WIDTH_FACTOR
    }
}

impl Track for Axis {
    fn name(&self) -> &str {
        &self.name
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn layout(&mut self, _scale: &Scale) -> Result<(), LayoutError> {
        Ok(())
    }

    fn render<'a>(&'a self, scale: &'a Scale) -> Commands<'a> {
        let (start, end) = (scale.start(), scale.end());
        let pixel_width = scale.pixel_width();
        let mut commands = vec![DrawCommand::line(
            scale.to_pixels(start as f64),
            5.0,
            scale.to_pixels(end as f64),
            5.0,
            Style::stroked("black", 1.0),
        )];

        let ticks = get_ticks(start as f64, end as f64, (pixel_width / PIXELS_PER_LABEL).max(1.0));
        let last = ticks.len().saturating_sub(1);
        let mut prev_right = f64::NEG_INFINITY;

        for (i, (tick, label)) in ticks.iter().enumerate() {
            let mut x = scale.to_pixels(*tick as f64);
            if x < 0.0 || x > pixel_width {
                continue;
            }
            commands.push(DrawCommand::line(x, 0.0, x, 20.0, Style::stroked("black", 1.0)));

            let width = self.label_width(label);
            let (anchor, left) = if x < 50.0 && i == 0 {
                x = x.min(5.0);
                (Anchor::Start, x)
            } else if x > pixel_width - 50.0 && i == last {
                x = x.max(pixel_width - 5.0);
                (Anchor::End, x - width)
            } else {
                (Anchor::Middle, x - width / 2.0)
            };

            // don't clobber labels already drawn
            if left > prev_right {
                commands.push(DrawCommand::text(x, 35.0, label.as_str(), self.font_size, anchor));
                prev_right = match anchor {
                    Anchor::Start => x + width,
                    Anchor::Middle => x + width / 2.0,
                    Anchor::End => x,
                };
            }
        }
        Commands::from_vec(commands)
    }

    fn post_render<'a>(&'a self, _scale: &'a Scale) -> Commands<'a> {
        Commands::empty()
    }
}

/// Evenly spaced "nice" tick positions in `[start, end)` with labels in
/// bp, kb or mb depending on the resolution.
pub fn get_ticks(start: f64, end: f64, target_n_labels: f64) -> Vec<(i64, String)> {
    let start = start.trunc() as i64;
    let end = end.trunc() as i64;
    let width = (end - start) as f64;
    if width <= 0.0 || target_n_labels <= 0.0 {
        return Vec::new();
    }

    let mut res = 10f64.powf(width.log10().round()) / 10f64.powf(target_n_labels.log10().floor());
    let ratio = width / res;
    if ratio > target_n_labels * 2.0 {
        res *= 5.0;
    } else if ratio > target_n_labels * 1.5 {
        res *= 2.5;
    } else if ratio < target_n_labels * 0.15 {
        res /= 10.0;
    } else if ratio < target_n_labels * 0.25 {
        res /= 8.0;
    } else if ratio < target_n_labels * 0.5 {
        res /= 4.0;
    } else if ratio < target_n_labels * 0.8 {
        res /= 2.0;
    }

    let round_start = (start as f64 - (start as f64).rem_euclid(res)) as i64;
    let step = (res as i64).max(1);
    let digits = (step as f64).log10();

    let mut ticks = Vec::new();
    let mut tick = round_start;
    while tick < end {
        let label = if digits >= 6.0 {
            format!("{}mb", float_label(tick as f64 / 1e6))
        } else if digits >= 3.0 {
            format!("{}kb", with_thousands(&float_label(tick as f64 / 1e3)))
        } else {
            with_thousands(&tick.to_string())
        };
        ticks.push((tick, label));
        tick += step;
    }
    ticks
}

/// Shortest decimal form, always with a fractional part (`2.0`, `1.25`).
fn float_label(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Insert `,` separators into the integer part of a decimal string.
fn with_thousands(number: &str) -> String {
    let (sign, unsigned) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}
