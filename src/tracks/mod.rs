//! Track kinds: everything that can be stacked inside a genome view.

pub mod alignment;
pub mod axis;
pub mod bed;
pub mod graph;
pub mod interval;

use crate::layout::LayoutError;
use crate::render::{Anchor, Commands, DrawCommand, RenderError, Style};
use crate::scale::Scale;

pub use alignment::{AlignmentTrack, AlignmentTrackConfig};
pub use axis::{get_ticks, Axis};
pub use bed::{BedTrack, BedTrackConfig};
pub use graph::{GraphTrack, Series};
pub use interval::{color_by_strand, IntervalTrack};

const NAME_FONT_SIZE: f64 = 10.0;

/// The capability every track kind implements.
///
/// `layout` is called once per pass with the owning view's scale and must be
/// called before `render`; `height` is only meaningful after layout.
pub trait Track {
    fn name(&self) -> &str;

    fn height(&self) -> f64;

    fn layout(&mut self, scale: &Scale) -> Result<(), LayoutError>;

    fn render<'a>(&'a self, scale: &'a Scale) -> Commands<'a>;

    fn pre_render<'a>(&'a self, _scale: &'a Scale) -> Commands<'a> {
        Commands::empty()
    }

    /// Defaults to the track name over a translucent backing rectangle.
    fn post_render<'a>(&'a self, _scale: &'a Scale) -> Commands<'a> {
        name_label(self.name())
    }
}

/// The track name in the top-left corner, over a translucent white box.
pub fn name_label(name: &str) -> Commands<'static> {
    if name.is_empty() {
        return Commands::empty();
    }
    let width = name.chars().count() as f64 * NAME_FONT_SIZE * 0.6 + 6.0;
    Commands::from_vec(vec![
        DrawCommand::rect(0.0, 0.0, width, NAME_FONT_SIZE + 4.0, Style::filled("white").with_opacity(0.75)),
        DrawCommand::text(3.0, NAME_FONT_SIZE, name, NAME_FONT_SIZE, Anchor::Start),
    ])
}

/// Turn a per-item result into a stream item sequence.
pub(crate) fn spread(result: Result<Vec<DrawCommand>, RenderError>) -> Vec<Result<DrawCommand, RenderError>> {
    match result {
        Ok(commands) => commands.into_iter().map(Ok).collect(),
        Err(e) => vec![Err(e)],
    }
}

/// The closed set of track kinds a view can hold.
pub enum TrackKind {
    Interval(IntervalTrack),
    Alignment(AlignmentTrack),
    Bed(BedTrack),
    Graph(GraphTrack),
    Axis(Axis),
}

impl TrackKind {
    fn inner(&self) -> &dyn Track {
        match self {
            TrackKind::Interval(t) => t,
            TrackKind::Alignment(t) => t,
            TrackKind::Bed(t) => t,
            TrackKind::Graph(t) => t,
            TrackKind::Axis(t) => t,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Track {
        match self {
            TrackKind::Interval(t) => t,
            TrackKind::Alignment(t) => t,
            TrackKind::Bed(t) => t,
            TrackKind::Graph(t) => t,
            TrackKind::Axis(t) => t,
        }
    }
}

impl Track for TrackKind {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn height(&self) -> f64 {
        self.inner().height()
    }

    fn layout(&mut self, scale: &Scale) -> Result<(), LayoutError> {
        self.inner_mut().layout(scale)
    }

    fn render<'a>(&'a self, scale: &'a Scale) -> Commands<'a> {
        self.inner().render(scale)
    }

    fn pre_render<'a>(&'a self, scale: &'a Scale) -> Commands<'a> {
        self.inner().pre_render(scale)
    }

    fn post_render<'a>(&'a self, scale: &'a Scale) -> Commands<'a> {
        self.inner().post_render(scale)
    }
}

impl From<IntervalTrack> for TrackKind {
    fn from(track: IntervalTrack) -> Self {
        TrackKind::Interval(track)
    }
}

impl From<AlignmentTrack> for TrackKind {
    fn from(track: AlignmentTrack) -> Self {
        TrackKind::Alignment(track)
    }
}

impl From<BedTrack> for TrackKind {
    fn from(track: BedTrack) -> Self {
        TrackKind::Bed(track)
    }
}

impl From<GraphTrack> for TrackKind {
    fn from(track: GraphTrack) -> Self {
        TrackKind::Graph(track)
    }
}

impl From<Axis> for TrackKind {
    fn from(track: Axis) -> Self {
        TrackKind::Axis(track)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_label_draws_box_then_text() {
        let commands: Vec<_> = name_label("reads").collect::<Result<_, _>>().unwrap();
        assert!(matches!(commands[0], DrawCommand::Rect { .. }));
        assert!(matches!(&commands[1], DrawCommand::Text { text, .. } if text == "reads"));
        assert_eq!(name_label("").count(), 0);
    }

    #[test]
    fn test_track_kind_delegates() {
        let mut track: TrackKind = Axis::new("ruler").into();
        let scale = Scale::new("chr1", 0, 1000, crate::region::Strand::Plus).unwrap();
        track.layout(&scale).unwrap();
        assert_eq!(track.name(), "ruler");
        assert_eq!(track.height(), 50.0);
    }
}
