use crate::layout::LayoutError;
use crate::render::{Anchor, Commands, DrawCommand, Style};
use crate::scale::Scale;
use crate::tracks::{get_ticks, Track};

const COLORS: [&str; 4] = ["blue", "red", "green", "black"];
const AXIS_COLOR: &str = "gray";

/// One named line of `(genomic position, value)` points.
#[derive(Debug, Clone)]
pub struct Series {
    pub label: String,
    pub color: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// Line plots of numeric series over genomic position, with a y-axis.
pub struct GraphTrack {
    pub name: String,
    pub height: f64,
    pub ymargin: f64,
    series: Vec<Series>,
    min_y: f64,
    max_y: f64,
}

impl GraphTrack {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            height: 100.0,
            ymargin: 5.0,
            series: Vec::new(),
            min_y: 0.0,
            max_y: 0.0,
        }
    }

    /// Add a series; the label defaults to `series_N` and the color cycles
    /// through a fixed palette. The y range always includes zero.
    pub fn add_series(
        &mut self,
        x: Vec<f64>,
        y: Vec<f64>,
        color: Option<&str>,
        label: Option<&str>,
    ) -> Result<(), LayoutError> {
        let label = match label {
            Some(label) => label.to_string(),
            None => format!("series_{}", self.series.len()),
        };
        if self.series.iter().any(|s| s.label == label) {
            return Err(LayoutError::DuplicateSeries(label));
        }
        let color = color
            .unwrap_or(COLORS[self.series.len() % COLORS.len()])
            .to_string();

        for &value in y.iter().filter(|v| v.is_finite()) {
            self.min_y = self.min_y.min(value);
            self.max_y = self.max_y.max(value);
        }
        self.series.push(Series { label, color, x, y });
        Ok(())
    }

    pub fn series(&self) -> &[Series] {
        &self.series
    }

    pub fn y_range(&self) -> (f64, f64) {
        (self.min_y, self.max_y)
    }

    /// Vertical pixel of a value; larger values are higher up.
    pub fn ytopixels(&self, value: f64) -> f64 {
        let span = self.max_y - self.min_y;
        let span = if span > 0.0 { span } else { 1.0 };
        self.height - ((value - self.min_y) / span * (self.height - 2.0 * self.ymargin) + self.ymargin)
    }

    fn axis_commands(&self) -> Vec<DrawCommand> {
        // keep the top label clear of the track's upper edge
        let axis_max_y = self.min_y + (self.max_y - self.min_y) * (1.0 - 7.0 / self.height);
        let ticks = get_ticks(self.min_y, axis_max_y, 4.0);
        let (Some(first), Some(last)) = (ticks.first(), ticks.last()) else {
            return Vec::new();
        };

        let style = Style::stroked(AXIS_COLOR, 2.0);
        let mut commands = vec![DrawCommand::line(
            1.0,
            self.ytopixels(first.0 as f64),
            1.0,
            self.ytopixels(last.0 as f64),
            style.clone(),
        )];
        for (tick, label) in &ticks {
            let y = self.ytopixels(*tick as f64);
            commands.push(DrawCommand::line(1.0, y, 10.0, y, style.clone()));
            commands.push(DrawCommand::Text {
                x: 14.0,
                y,
                text: label.clone(),
                size: 10.0,
                anchor: Anchor::Start,
                style: Style {
                    fill: Some(AXIS_COLOR.to_string()),
                    ..Style::default()
                },
            });
        }
        commands
    }
}

impl Track for GraphTrack {
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
        let segments = self.series.iter().flat_map(move |series| {
            let points = series.x.iter().zip(&series.y);
            points
                .clone()
                .zip(points.skip(1))
                .filter(|((x1, y1), (x2, y2))| [x1, y1, x2, y2].iter().all(|v| !v.is_nan()))
                .map(move |((x1, y1), (x2, y2))| {
                    Ok(DrawCommand::line(
                        scale.to_pixels(*x1),
                        self.ytopixels(*y1),
                        scale.to_pixels(*x2),
                        self.ytopixels(*y2),
                        Style::stroked(series.color.as_str(), 1.0),
                    ))
                })
        });
        Commands::new(segments).chain(Commands::from_vec(self.axis_commands()))
    }
}
