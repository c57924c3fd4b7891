use log::debug;

use crate::layout::LayoutError;
use crate::render::{DrawingSink, Element, Frame, RenderError, RenderStats, Renderer};
use crate::scale::Scale;
use crate::tracks::{Track, TrackKind};

/// A stack of tracks sharing one genomic window.
pub struct GenomeView {
    pub name: String,
    /// Vertical gap after each track.
    pub margin_y: f64,
    scale: Scale,
    tracks: Vec<TrackKind>,
    height: f64,
}

impl GenomeView {
    pub fn new(scale: Scale) -> Self {
        Self {
            name: String::new(),
            margin_y: 10.0,
            scale,
            tracks: Vec::new(),
            height: 0.0,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn add_track(&mut self, track: impl Into<TrackKind>) {
        self.tracks.push(track.into());
    }

    pub fn scale(&self) -> &Scale {
        &self.scale
    }

    pub fn tracks(&self) -> &[TrackKind] {
        &self.tracks
    }

    pub fn tracks_mut(&mut self) -> &mut [TrackKind] {
        &mut self.tracks
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Tracks with the given name, or all tracks for `None`.
    pub fn get_tracks(&self, name: Option<&str>) -> Vec<&TrackKind> {
        self.tracks
            .iter()
            .filter(|track| name.is_none_or(|name| track.name() == name))
            .collect()
    }

    /// Fix the pixel width and lay out every track against it.
    pub fn layout(&mut self, width: f64) -> Result<(), LayoutError> {
        self.scale.set_pixel_width(width)?;
        self.height = 0.0;
        for track in &mut self.tracks {
            track.layout(&self.scale)?;
            self.height += track.height() + self.margin_y;
        }
        Ok(())
    }
}

impl Element for GenomeView {
    fn name(&self) -> &str {
        &self.name
    }

    fn render_contents(&self, renderer: &mut Renderer<'_>) -> Result<(), RenderError> {
        let mut y = 0.0;
        for track in &self.tracks {
            let mut sub = renderer.subrenderer(0.0, y, None, Some(track.height()))?;
            sub.render(&ScaledTrack {
                track,
                scale: &self.scale,
            })?;
            y += track.height() + self.margin_y;
        }
        Ok(())
    }
}

/// A track paired with the scale it was laid out against.
struct ScaledTrack<'a> {
    track: &'a TrackKind,
    scale: &'a Scale,
}

impl Element for ScaledTrack<'_> {
    fn name(&self) -> &str {
        self.track.name()
    }

    fn pre_render(&self, renderer: &mut Renderer<'_>) -> Result<(), RenderError> {
        renderer.draw_all(self.track.pre_render(self.scale))
    }

    fn render_contents(&self, renderer: &mut Renderer<'_>) -> Result<(), RenderError> {
        renderer.draw_all(self.track.render(self.scale))
    }

    fn post_render(&self, renderer: &mut Renderer<'_>) -> Result<(), RenderError> {
        renderer.draw_all(self.track.post_render(self.scale))
    }
}

/// Views drawn side by side, splitting the row width evenly.
pub struct ViewRow {
    pub name: String,
    pub space_between: f64,
    views: Vec<GenomeView>,
    each_width: f64,
    height: f64,
}

impl ViewRow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            space_between: 5.0,
            views: Vec::new(),
            each_width: 0.0,
            height: 0.0,
        }
    }

    pub fn add_view(&mut self, view: GenomeView) {
        self.views.push(view);
    }

    pub fn views(&self) -> &[GenomeView] {
        &self.views
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn get_tracks(&self, name: Option<&str>) -> Vec<&TrackKind> {
        self.views.iter().flat_map(|view| view.get_tracks(name)).collect()
    }

    pub fn layout(&mut self, width: f64) -> Result<(), LayoutError> {
        let n = self.views.len().max(1) as f64;
        self.each_width = (width - self.space_between * (n - 1.0)) / n;
        self.height = 0.0;
        for view in &mut self.views {
            view.layout(self.each_width)?;
            self.height = self.height.max(view.height());
        }
        Ok(())
    }
}

impl Element for ViewRow {
    fn name(&self) -> &str {
        &self.name
    }

    fn render_contents(&self, renderer: &mut Renderer<'_>) -> Result<(), RenderError> {
        let mut x = 0.0;
        for view in &self.views {
            let mut sub = renderer.subrenderer(x, 0.0, Some(self.each_width), Some(view.height()))?;
            sub.render(view)?;
            x += self.each_width + self.space_between;
        }
        Ok(())
    }
}

/// A top-level entry of a document.
pub enum DocumentElement {
    View(GenomeView),
    Row(ViewRow),
}

impl DocumentElement {
    fn height(&self) -> f64 {
        match self {
            DocumentElement::View(view) => view.height(),
            DocumentElement::Row(row) => row.height(),
        }
    }

    fn layout(&mut self, width: f64) -> Result<(), LayoutError> {
        match self {
            DocumentElement::View(view) => view.layout(width),
            DocumentElement::Row(row) => row.layout(width),
        }
    }

    fn as_element(&self) -> &dyn Element {
        match self {
            DocumentElement::View(view) => view,
            DocumentElement::Row(row) => row,
        }
    }

    fn get_tracks(&self, name: Option<&str>) -> Vec<&TrackKind> {
        match self {
            DocumentElement::View(view) => view.get_tracks(name),
            DocumentElement::Row(row) => row.get_tracks(name),
        }
    }
}

/// The root of the drawing tree: views stacked vertically inside margins.
pub struct Document {
    pub width: f64,
    pub margin_x: f64,
    pub margin_y: f64,
    pub between_views: f64,
    elements: Vec<DocumentElement>,
}

impl Document {
    pub fn new(width: f64) -> Self {
        Self {
            width,
            margin_x: 5.0,
            margin_y: 5.0,
            between_views: 5.0,
            elements: Vec::new(),
        }
    }

    pub fn add_view(&mut self, view: GenomeView) {
        self.elements.push(DocumentElement::View(view));
    }

    pub fn add_row(&mut self, row: ViewRow) {
        self.elements.push(DocumentElement::Row(row));
    }

    pub fn elements(&self) -> &[DocumentElement] {
        &self.elements
    }

    /// Tracks with the given name anywhere in the document, or all tracks.
    pub fn get_tracks(&self, name: Option<&str>) -> Vec<&TrackKind> {
        self.elements.iter().flat_map(|e| e.get_tracks(name)).collect()
    }

    pub fn view_width(&self) -> f64 {
        self.width - self.margin_x * 2.0
    }

    pub fn layout(&mut self) -> Result<(), LayoutError> {
        let view_width = self.view_width();
        for element in &mut self.elements {
            element.layout(view_width)?;
        }
        Ok(())
    }

    /// Total pixel height; valid after layout.
    pub fn height(&self) -> f64 {
        self.elements
            .iter()
            .map(|e| e.height() + self.between_views)
            .sum::<f64>()
            + self.margin_y * 2.0
    }

    /// Lay out, then stream the whole document into `sink`.
    pub fn render(&mut self, sink: &mut dyn DrawingSink) -> Result<RenderStats, RenderError> {
        self.layout()?;
        let view_width = self.view_width();
        let height = self.height();

        let mut stats = RenderStats::default();
        sink.begin_document(self.width, height)?;
        let mut y = self.margin_y;
        for element in &self.elements {
            let frame = Frame::new(self.margin_x, y, view_width, element.height());
            Renderer::new(&mut *sink, &mut stats, frame).render(element.as_element())?;
            y += element.height() + self.between_views;
        }
        sink.end_document()?;

        debug!(
            "rendered {} elements as {} commands into {}x{} px",
            stats.elements, stats.commands, self.width, height
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Interval;
    use crate::region::Strand;
    use crate::render::DrawCommand;
    use crate::tracks::{Axis, IntervalTrack};

    fn view(name: &str) -> GenomeView {
        let scale = Scale::new("chr1", 0, 1000, Strand::Plus).unwrap();
        let mut view = GenomeView::new(scale).with_name(name);
        view.add_track(IntervalTrack::new(
            "genes",
            vec![
                Interval::new("A", "chr1", 100, 150, Strand::Plus),
                Interval::new("B", "chr1", 140, 200, Strand::Minus),
            ],
        ));
        view.add_track(Axis::new("axis"));
        view
    }

    #[test]
    fn test_layout_sets_view_width_and_heights() {
        let mut doc = Document::new(510.0);
        doc.add_view(view("main"));
        doc.layout().unwrap();

        let DocumentElement::View(view) = &doc.elements()[0] else {
            panic!("expected a view");
        };
        assert_eq!(view.scale().pixel_width(), 500.0);
        // interval track 30 + axis 50, each followed by a 10 px margin
        assert_eq!(view.height(), 100.0);
        assert_eq!(doc.height(), 100.0 + 5.0 + 10.0);
    }

    #[test]
    fn test_render_nests_clip_groups() {
        let mut doc = Document::new(510.0);
        doc.add_view(view("main"));
        let mut sink: Vec<DrawCommand> = Vec::new();
        let stats = doc.render(&mut sink).unwrap();

        // view + two tracks
        assert_eq!(stats.elements, 3);
        assert_eq!(stats.commands, sink.len());
        let opens = sink.iter().filter(|c| matches!(c, DrawCommand::BeginClip { .. })).count();
        let closes = sink.iter().filter(|c| matches!(c, DrawCommand::EndClip)).count();
        assert_eq!(opens, 3);
        assert_eq!(closes, 3);

        // the axis starts below the interval track and its margin
        assert!(sink.iter().any(|c| matches!(
            c,
            DrawCommand::BeginClip { name, y, .. } if name == "axis" && *y == 5.0 + 30.0 + 10.0
        )));
    }

    #[test]
    fn test_view_row_splits_width() {
        let mut row = ViewRow::new("row");
        row.add_view(view("left"));
        row.add_view(view("right"));
        let mut doc = Document::new(515.0);
        doc.add_row(row);
        let mut sink: Vec<DrawCommand> = Vec::new();
        doc.render(&mut sink).unwrap();

        let view_frames: Vec<(f64, f64)> = sink
            .iter()
            .filter_map(|c| match c {
                DrawCommand::BeginClip { name, x, width, .. } if name == "left" || name == "right" => {
                    Some((*x, *width))
                }
                _ => None,
            })
            .collect();
        assert_eq!(view_frames, vec![(5.0, 250.0), (260.0, 250.0)]);
    }

    #[test]
    fn test_get_tracks_by_name() {
        let mut doc = Document::new(510.0);
        doc.add_view(view("a"));
        let mut row = ViewRow::new("row");
        row.add_view(view("b"));
        doc.add_row(row);

        assert_eq!(doc.get_tracks(Some("axis")).len(), 2);
        assert_eq!(doc.get_tracks(None).len(), 4);
        assert!(doc.get_tracks(Some("missing")).is_empty());
    }

    #[test]
    fn test_invalid_width_fails_layout() {
        let mut doc = Document::new(8.0);
        doc.add_view(view("tiny"));
        assert!(matches!(doc.layout(), Err(LayoutError::Scale(_))));
    }
}
