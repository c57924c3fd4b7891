use log::debug;

use crate::layout::{Interval, LayoutError, RowPacker};
use crate::render::{Anchor, Commands, Direction, DrawCommand, Style};
use crate::region::Strand;
use crate::scale::Scale;
use crate::tracks::Track;

pub const PLUS_STRAND_COLOR: &str = "#E89E9D";
pub const MINUS_STRAND_COLOR: &str = "#8C8FCE";
const LABEL_FONT_SIZE: f64 = 10.0;

pub fn color_by_strand(interval: &Interval) -> String {
    match interval.strand {
        Strand::Plus => PLUS_STRAND_COLOR.to_string(),
        Strand::Minus => MINUS_STRAND_COLOR.to_string(),
    }
}

/// The standard interval glyph: a strand-directed block arrow on the
/// interval's row, followed by its label if it has one.
pub fn interval_glyph(
    packer: &RowPacker,
    label_distance: f64,
    scale: &Scale,
    interval: &Interval,
    row: usize,
    color: String,
) -> Vec<DrawCommand> {
    let start = scale.to_pixels(interval.start as f64);
    let end = scale.to_pixels(interval.end as f64);
    let top = packer.row_top(row);
    let arrow_width = (packer.row_height / 2.0)
        .min(packer.margin_x * 0.7)
        .min(scale.rel_pixels(30.0));
    let direction = match interval.strand {
        Strand::Plus => Direction::Right,
        Strand::Minus => Direction::Left,
    };
    let id = interval.label.as_deref().unwrap_or(&interval.id);

    let mut commands = vec![DrawCommand::BlockArrow {
        x: start,
        y: top,
        width: end - start,
        height: packer.row_height,
        arrow_width,
        direction,
        style: Style::filled(color).with_id(id),
    }];
    if let Some(label) = &interval.label {
        commands.push(DrawCommand::text(
            end + label_distance,
            top + packer.row_height - 2.0,
            label.as_str(),
            LABEL_FONT_SIZE,
            Anchor::Start,
        ));
    }
    commands
}

/// Generic intervals packed into rows and drawn as block arrows.
pub struct IntervalTrack {
    pub name: String,
    pub intervals: Vec<Interval>,
    pub packer: RowPacker,
    /// Gap between an interval's right edge and its label.
    pub label_distance: f64,
    pub color_fn: fn(&Interval) -> String,
    height: f64,
}

impl IntervalTrack {
    pub fn new(name: impl Into<String>, intervals: Vec<Interval>) -> Self {
        let packer = RowPacker::new(8.0, 15.0, 2.0);
        let height = packer.height();
        Self {
            name: name.into(),
            intervals,
            packer,
            label_distance: 3.0,
            color_fn: color_by_strand,
            height,
        }
    }

    pub fn row_of(&self, id: &str) -> Option<usize> {
        self.packer.row_of(id)
    }
}

impl Track for IntervalTrack {
    fn name(&self) -> &str {
        &self.name
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn layout(&mut self, scale: &Scale) -> Result<(), LayoutError> {
        self.packer.reset();
        for interval in &self.intervals {
            self.packer.place(interval, scale)?;
        }
        self.height = self.packer.height();
        debug!(
            "track '{}': {} intervals in {} rows",
            self.name,
            self.intervals.len(),
            self.packer.row_count()
        );
        Ok(())
    }

    fn render<'a>(&'a self, scale: &'a Scale) -> Commands<'a> {
        Commands::new(
            self.intervals
                .iter()
                .filter_map(move |interval| {
                    let row = self.packer.row_of(&interval.id)?;
                    Some(interval_glyph(
                        &self.packer,
                        self.label_distance,
                        scale,
                        interval,
                        row,
                        (self.color_fn)(interval),
                    ))
                })
                .flatten()
                .map(Ok),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scale() -> Scale {
        let mut scale = Scale::new("chr1", 0, 1000, Strand::Plus).unwrap();
        scale.set_pixel_width(1000.0).unwrap();
        scale
    }

    fn track() -> IntervalTrack {
        IntervalTrack::new(
            "genes",
            vec![
                Interval::new("A", "chr1", 100, 150, Strand::Plus),
                Interval::new("B", "chr1", 140, 200, Strand::Minus).with_label("bee"),
            ],
        )
    }

    #[test]
    fn test_layout_assigns_rows_and_height() {
        let mut track = track();
        track.layout(&scale()).unwrap();
        assert_eq!(track.row_of("A"), Some(0));
        assert_eq!(track.row_of("B"), Some(1));
        assert_eq!(track.height(), 30.0);
    }

    #[test]
    fn test_empty_track_has_one_spare_row() {
        let mut track = IntervalTrack::new("empty", Vec::new());
        track.layout(&scale()).unwrap();
        assert_eq!(track.height(), 10.0);
        assert_eq!(track.render(&scale()).count(), 0);
    }

    #[test]
    fn test_glyphs_follow_rows_and_strand() {
        let scale = scale();
        let mut track = track();
        track.layout(&scale).unwrap();
        let commands: Vec<_> = track.render(&scale).collect::<Result<_, _>>().unwrap();
        assert_eq!(commands.len(), 3);

        match &commands[0] {
            DrawCommand::BlockArrow {
                x,
                y,
                width,
                arrow_width,
                direction,
                style,
                ..
            } => {
                assert_eq!((*x, *y, *width), (100.0, 0.0, 50.0));
                assert_eq!(*arrow_width, 4.0);
                assert_eq!(*direction, Direction::Right);
                assert_eq!(style.fill.as_deref(), Some(PLUS_STRAND_COLOR));
                assert_eq!(style.id.as_deref(), Some("A"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            &commands[1],
            DrawCommand::BlockArrow { y, direction: Direction::Left, .. } if *y == 10.0
        ));
        assert!(matches!(
            &commands[2],
            DrawCommand::Text { x, text, .. } if *x == 203.0 && text == "bee"
        ));
    }

    #[test]
    fn test_duplicate_ids_fail_layout() {
        let mut track = IntervalTrack::new(
            "dups",
            vec![
                Interval::new("X", "chr1", 0, 10, Strand::Plus),
                Interval::new("X", "chr1", 500, 510, Strand::Plus),
            ],
        );
        assert!(matches!(track.layout(&scale()), Err(LayoutError::DuplicateId(_))));
    }
}
