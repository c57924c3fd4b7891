use std::collections::HashMap;

use log::debug;

use crate::alignment::AlignedRead;
use crate::annotator::{AnnotatorConfig, CigarAnnotator, Decoration};
use crate::consensus::MismatchCounts;
use crate::layout::{Interval, LayoutError, RowPacker};
use crate::render::{Anchor, Commands, DrawCommand, RenderError, Style};
use crate::scale::Scale;
use crate::tracks::interval::{color_by_strand, interval_glyph};
use crate::tracks::{spread, Track};

pub const INSERTION_COLOR: &str = "cyan";
pub const CLIPPING_COLOR: &str = "cyan";
pub const DELETION_COLOR: &str = "gray";
pub const CONNECTOR_COLOR: &str = "gray";

pub fn nucleotide_color(base: u8) -> &'static str {
    match base.to_ascii_uppercase() {
        b'A' => "blue",
        b'C' => "orange",
        b'G' => "green",
        b'T' => "black",
        _ => "gray",
    }
}

#[derive(Debug, Clone)]
pub struct AlignmentTrackConfig {
    /// Tally a consensus at layout and hide decorations it does not support.
    pub quick_consensus: bool,
    /// Draw per-base decorations at all.
    pub draw_mismatches: bool,
    pub include_secondary: bool,
    pub draw_read_labels: bool,
    /// Group reads by name and draw mates on one row.
    pub paired: bool,
    pub annotator: AnnotatorConfig,
}

impl Default for AlignmentTrackConfig {
    fn default() -> Self {
        Self {
            quick_consensus: true,
            draw_mismatches: true,
            include_secondary: true,
            draw_read_labels: false,
            paired: false,
            annotator: AnnotatorConfig::default(),
        }
    }
}

/// The reads of one template, laid out as a single span.
#[derive(Debug, Clone)]
struct ReadGroup {
    name: String,
    /// Indices into the track's reads, ordered by position.
    reads: Vec<usize>,
    start: u64,
    end: u64,
}

/// Aligned reads stacked into rows, with CIGAR decorations on top.
pub struct AlignmentTrack {
    pub name: String,
    pub reads: Vec<AlignedRead>,
    pub config: AlignmentTrackConfig,
    pub packer: RowPacker,
    pub label_distance: f64,
    /// Single-end: one entry per visible read, keyed `name#index`.
    intervals: Vec<Interval>,
    /// Paired-end: one entry per template, keyed by read name.
    groups: Vec<ReadGroup>,
    consensus: Option<MismatchCounts>,
    height: f64,
}

impl AlignmentTrack {
    pub fn new(name: impl Into<String>, reads: Vec<AlignedRead>) -> Self {
        Self::with_config(name, reads, AlignmentTrackConfig::default())
    }

    pub fn with_config(name: impl Into<String>, reads: Vec<AlignedRead>, config: AlignmentTrackConfig) -> Self {
        let packer = RowPacker::new(8.0, 15.0, 2.0);
        let height = packer.height();
        Self {
            name: name.into(),
            reads,
            config,
            packer,
            label_distance: 3.0,
            intervals: Vec::new(),
            groups: Vec::new(),
            consensus: None,
            height,
        }
    }

    pub fn consensus(&self) -> Option<&MismatchCounts> {
        self.consensus.as_ref()
    }

    pub fn row_count(&self) -> usize {
        self.packer.row_count()
    }

    fn is_visible(&self, read: &AlignedRead, scale: &Scale) -> bool {
        !read.is_unmapped
            && (self.config.include_secondary || !read.is_secondary)
            && read.chrom == scale.chrom()
            && read.start < scale.end()
            && read.end > scale.start()
    }

    fn layout_single(&mut self, scale: &Scale) -> Result<(), LayoutError> {
        self.intervals = self
            .reads
            .iter()
            .enumerate()
            .filter(|(_, read)| self.is_visible(read, scale))
            .map(|(i, read)| {
                let interval = Interval::new(
                    format!("{}#{}", read.name, i),
                    read.chrom.clone(),
                    read.start,
                    read.end,
                    read.strand(),
                )
                .with_source(i);
                if self.config.draw_read_labels {
                    interval.with_label(read.name.clone())
                } else {
                    interval
                }
            })
            .collect();

        for interval in &self.intervals {
            self.packer.place(interval, scale)?;
        }
        Ok(())
    }

    fn layout_paired(&mut self, scale: &Scale) -> Result<(), LayoutError> {
        let mut by_name: HashMap<&str, usize> = HashMap::new();
        let mut members: Vec<Vec<usize>> = Vec::new();
        for (i, read) in self.reads.iter().enumerate() {
            if !self.is_visible(read, scale) {
                continue;
            }
            let group = *by_name.entry(read.name.as_str()).or_insert_with(|| {
                members.push(Vec::new());
                members.len() - 1
            });
            members[group].push(i);
        }

        let mut groups: Vec<(Vec<(u64, u64)>, ReadGroup)> = members
            .into_iter()
            .map(|mut reads| {
                reads.sort_by_key(|&i| (self.reads[i].start, self.reads[i].end));
                let mut coords: Vec<(u64, u64)> =
                    reads.iter().map(|&i| (self.reads[i].start, self.reads[i].end)).collect();
                // extend a lone proper-pair read toward its off-window mate
                let first = &self.reads[reads[0]];
                if reads.len() == 1
                    && first.is_proper_pair
                    && let Some(mate) = first.mate_start
                {
                    coords.push((mate, mate));
                    coords.sort_unstable();
                }
                let start = coords[0].0;
                let end = coords.iter().map(|c| c.1).max().unwrap_or(start);
                let group = ReadGroup {
                    name: first.name.clone(),
                    reads,
                    start,
                    end,
                };
                (coords, group)
            })
            .collect();
        groups.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.name.cmp(&b.1.name)));
        self.groups = groups.into_iter().map(|(_, group)| group).collect();

        for group in &self.groups {
            let label = self.config.draw_read_labels.then_some(group.name.as_str());
            self.packer.place_span(&group.name, group.start, group.end, label, scale)?;
        }
        Ok(())
    }

    fn read_commands(
        &self,
        scale: &Scale,
        annotator: &CigarAnnotator<'_>,
        read: &AlignedRead,
        row: usize,
        interval: &Interval,
    ) -> Result<Vec<DrawCommand>, RenderError> {
        let mut commands = interval_glyph(
            &self.packer,
            self.label_distance,
            scale,
            interval,
            row,
            color_by_strand(interval),
        );
        if !self.config.draw_mismatches {
            return Ok(commands);
        }

        let top = self.packer.row_top(row);
        let row_height = self.packer.row_height;
        for decoration in annotator.annotate(read)? {
            let color = match &decoration {
                Decoration::Mismatch { base, .. } => nucleotide_color(*base),
                Decoration::Deletion { .. } => DELETION_COLOR,
                Decoration::Insertion { .. } => INSERTION_COLOR,
                Decoration::Clip { .. } => CLIPPING_COLOR,
            };
            commands.push(DrawCommand::rect(
                decoration.x(),
                top,
                decoration.width(),
                row_height,
                Style::filled(color),
            ));
            if let Decoration::Insertion {
                x,
                width,
                length,
                labelled: true,
            } = decoration
            {
                commands.push(DrawCommand::Text {
                    x: x + width + 1.0,
                    y: top + row_height - 1.0,
                    text: length.to_string(),
                    size: row_height,
                    anchor: Anchor::Start,
                    style: Style::filled(INSERTION_COLOR),
                });
            }
        }
        Ok(commands)
    }

    fn group_commands(
        &self,
        scale: &Scale,
        annotator: &CigarAnnotator<'_>,
        group: &ReadGroup,
    ) -> Result<Vec<DrawCommand>, RenderError> {
        let Some(row) = self.packer.row_of(&group.name) else {
            return Ok(Vec::new());
        };
        let top = self.packer.row_top(row);
        let mut commands = Vec::new();

        let first = &self.reads[group.reads[0]];
        let connector = match group.reads.as_slice() {
            [_, .., last] => Some((first.end, self.reads[*last].start)),
            [_] if first.is_proper_pair => first
                .mate_start
                .map(|mate| if mate < first.start { (mate, first.start) } else { (first.start, mate) }),
            _ => None,
        };
        if let Some((from, to)) = connector {
            let y = top + self.packer.row_height / 2.0;
            commands.push(DrawCommand::line(
                scale.to_pixels(from as f64),
                y,
                scale.to_pixels(to as f64),
                y,
                Style::stroked(CONNECTOR_COLOR, 1.0),
            ));
        }

        for (n, &i) in group.reads.iter().enumerate() {
            let read = &self.reads[i];
            let interval = Interval::new(read.name.clone(), read.chrom.clone(), read.start, read.end, read.strand());
            commands.extend(self.read_commands(scale, annotator, read, row, &interval)?);
            if n == 1 && self.config.draw_read_labels {
                commands.push(DrawCommand::text(
                    scale.to_pixels(read.end as f64) + self.label_distance,
                    top + self.packer.row_height,
                    read.name.as_str(),
                    10.0,
                    Anchor::Start,
                ));
            }
        }
        Ok(commands)
    }
}

impl Track for AlignmentTrack {
    fn name(&self) -> &str {
        &self.name
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn layout(&mut self, scale: &Scale) -> Result<(), LayoutError> {
        self.packer.reset();
        self.intervals.clear();
        self.groups.clear();

        self.consensus = if self.config.quick_consensus && self.config.draw_mismatches {
            Some(MismatchCounts::from_reads(
                scale.chrom(),
                scale.start(),
                scale.end(),
                &self.reads,
            ))
        } else {
            None
        };

        if self.config.paired {
            self.layout_paired(scale)?;
        } else {
            self.layout_single(scale)?;
        }
        self.height = self.packer.height();

        debug!(
            "track '{}': {} reads, {} laid out in {} rows",
            self.name,
            self.reads.len(),
            if self.config.paired { self.groups.len() } else { self.intervals.len() },
            self.packer.row_count()
        );
        Ok(())
    }

    fn render<'a>(&'a self, scale: &'a Scale) -> Commands<'a> {
        let annotator = CigarAnnotator::new(scale, self.consensus.as_ref(), &self.config.annotator);
        if self.config.paired {
            Commands::new(
                self.groups
                    .iter()
                    .flat_map(move |group| spread(self.group_commands(scale, &annotator, group))),
            )
        } else {
            Commands::new(self.intervals.iter().flat_map(move |interval| {
                let (Some(i), Some(row)) = (interval.source, self.packer.row_of(&interval.id)) else {
                    return Vec::new();
                };
                spread(self.read_commands(scale, &annotator, &self.reads[i], row, interval))
            }))
        }
    }
}
