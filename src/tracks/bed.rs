use log::debug;

use crate::annotation::Transcript;
use crate::layout::{Interval, LayoutError, RowPacker};
use crate::render::{Anchor, Commands, Direction, DrawCommand, Style};
use crate::region::Strand;
use crate::scale::Scale;
use crate::tracks::interval::{color_by_strand, interval_glyph};
use crate::tracks::Track;

#[derive(Debug, Clone)]
pub struct BedTrackConfig {
    pub row_height: f64,
    /// Height of coding exon blocks.
    pub thick_width: f64,
    /// Height of untranslated exon blocks.
    pub thin_width: f64,
    /// Height of intron lines.
    pub thinnest_width: f64,
    pub min_exon_width: f64,
    /// Features narrower than this many pixels are drawn as plain intervals.
    pub min_detail_width: f64,
    pub draw_locus_labels: bool,
}

impl Default for BedTrackConfig {
    fn default() -> Self {
        Self {
            row_height: 12.0,
            thick_width: 12.0,
            thin_width: 5.0,
            thinnest_width: 1.0,
            min_exon_width: 1.0,
            min_detail_width: 12.0,
            draw_locus_labels: true,
        }
    }
}

/// Gene models with exon/intron structure.
pub struct BedTrack {
    pub name: String,
    pub transcripts: Vec<Transcript>,
    pub config: BedTrackConfig,
    pub packer: RowPacker,
    pub label_distance: f64,
    /// Laid-out intervals; `source` points into `transcripts`.
    intervals: Vec<Interval>,
    height: f64,
}

impl BedTrack {
    pub fn new(name: impl Into<String>, transcripts: Vec<Transcript>) -> Self {
        Self::with_config(name, transcripts, BedTrackConfig::default())
    }

    pub fn with_config(name: impl Into<String>, transcripts: Vec<Transcript>, config: BedTrackConfig) -> Self {
        let packer = RowPacker::new(config.row_height, 15.0, 2.0);
        let height = packer.height();
        Self {
            name: name.into(),
            transcripts,
            config,
            packer,
            label_distance: 3.0,
            intervals: Vec::new(),
            height,
        }
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    fn transcript_commands(&self, scale: &Scale, interval: &Interval, tx: &Transcript, row: usize) -> Vec<DrawCommand> {
        let color = color_by_strand(interval);
        if scale.rel_pixels((tx.end - tx.start) as f64) < self.config.min_detail_width {
            return interval_glyph(&self.packer, self.label_distance, scale, interval, row, color);
        }

        let row_height = self.packer.row_height;
        let top = self.packer.row_top(row);
        let top_thin = top + row_height / 2.0 - self.config.thin_width / 2.0;
        let midline = top + row_height / 2.0 - self.config.thinnest_width / 2.0;
        let id = interval.label.as_deref().unwrap_or(&interval.id);
        let direction = match interval.strand {
            Strand::Plus => Direction::Right,
            Strand::Minus => Direction::Left,
        };
        let mut commands = Vec::new();

        for pair in tx.exons.windows(2) {
            let intron_start = scale.to_pixels(pair[0].1 as f64);
            let intron_end = scale.to_pixels(pair[1].0 as f64);
            let n_arrows = ((intron_end - intron_start) / (row_height * 0.75)).round().max(0.0) as usize;
            let arrows = (1..=n_arrows).map(|k| k as f64 / (n_arrows + 1) as f64).collect();
            commands.push(DrawCommand::ArrowLine {
                x1: intron_start,
                y1: midline,
                x2: intron_end,
                y2: midline,
                direction,
                arrows,
                arrow_scale: self.config.thinnest_width * 0.4,
                filled: false,
                style: Style::stroked(color.clone(), self.config.thinnest_width),
            });
        }

        // untranslated blocks first, coding blocks drawn over them
        for &(exon_start, exon_end) in &tx.exons {
            if let (Some(cs), Some(ce)) = (tx.coding_start, tx.coding_end)
                && tx.is_coding()
                && exon_start > cs
                && exon_end < ce
            {
                continue;
            }
            commands.push(self.exon_block(scale, exon_start, exon_end, top_thin, self.config.thin_width, &color, id));
        }
        if let (Some(cs), Some(ce)) = (tx.coding_start, tx.coding_end)
            && tx.is_coding()
        {
            for &(exon_start, exon_end) in &tx.exons {
                if exon_end < cs || exon_start > ce {
                    continue;
                }
                let (start, end) = (exon_start.max(cs), exon_end.min(ce));
                commands.push(self.exon_block(scale, start, end, top, self.config.thick_width, &color, id));
            }
        }

        if let Some(label) = &interval.label {
            commands.push(DrawCommand::text(
                scale.to_pixels(interval.end as f64) + self.label_distance,
                top + row_height - 2.0,
                label.as_str(),
                10.0,
                Anchor::Start,
            ));
        }
        commands
    }

    #[allow(clippy::too_many_arguments)]
    fn exon_block(
        &self,
        scale: &Scale,
        start: u64,
        end: u64,
        y: f64,
        height: f64,
        color: &str,
        id: &str,
    ) -> DrawCommand {
        let mut x = scale.to_pixels(start as f64);
        let mut width = scale.to_pixels(end as f64) - x;
        if width < self.config.min_exon_width {
            x -= self.config.min_exon_width / 2.0;
            width = self.config.min_exon_width;
        }
        DrawCommand::rect(x, y, width, height, Style::filled(color).with_id(id))
    }
}

impl Track for BedTrack {
    fn name(&self) -> &str {
        &self.name
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn layout(&mut self, scale: &Scale) -> Result<(), LayoutError> {
        self.packer.reset();
        self.intervals = self
            .transcripts
            .iter()
            .enumerate()
            .filter(|(_, tx)| tx.chrom == scale.chrom() && tx.end >= scale.start() && tx.start <= scale.end())
            .enumerate()
            .map(|(n, (i, tx))| {
                let id = format!("{}_{}", tx.name.as_deref().unwrap_or("feature"), n);
                let interval = Interval::new(id, tx.chrom.clone(), tx.start, tx.end, tx.strand).with_source(i);
                match &tx.name {
                    Some(name) if self.config.draw_locus_labels => interval.with_label(name.clone()),
                    _ => interval,
                }
            })
            .collect();

        for interval in &self.intervals {
            self.packer.place(interval, scale)?;
        }
        self.height = self.packer.height();
        debug!(
            "track '{}': {} features in {} rows",
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
                    let tx = self.transcripts.get(interval.source?)?;
                    let row = self.packer.row_of(&interval.id)?;
                    Some(self.transcript_commands(scale, interval, tx, row))
                })
                .flatten()
                .map(Ok),
        )
    }
}
