use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use genomeview::alignment::AlignmentReader;
use genomeview::annotation::read_bed;
use genomeview::consensus::{MismatchCounts, Symbol};
use genomeview::document::{Document, GenomeView};
use genomeview::reference::ReferenceGenome;
use genomeview::region::{Region, Strand};
use genomeview::render::SvgWriter;
use genomeview::scale::Scale;
use genomeview::tracks::{AlignmentTrack, AlignmentTrackConfig, Axis, BedTrack};

#[derive(Parser)]
#[command(
    name = "genomeview",
    about = "Render aligned reads and annotations for a genomic region as SVG",
    version
)]
struct Cli {
    /// Verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a region to an SVG document
    Render {
        /// Path to reference FASTA file; without one, mismatches are not drawn
        #[arg(short, long)]
        reference: Option<PathBuf>,

        /// Region to render (format: chr:start-end, 0-based half-open)
        #[arg(short = 'L', long)]
        region: String,

        /// BAM files to draw, one track each (sorted and indexed)
        #[arg(short, long)]
        bam: Vec<PathBuf>,

        /// BED files to draw, one track each
        #[arg(long)]
        bed: Vec<PathBuf>,

        /// Draw mates of a read pair on one row
        #[arg(long)]
        paired: bool,

        /// Draw every discordant base, not only well-supported ones
        #[arg(long)]
        no_quick_consensus: bool,

        /// Only draw indels longer than this
        #[arg(long, default_value = "0")]
        min_indel_size: u32,

        /// Label reads with their names
        #[arg(long)]
        read_labels: bool,

        /// Put the axis above the data tracks instead of below
        #[arg(long)]
        axis_on_top: bool,

        /// Document width in pixels
        #[arg(short, long, default_value = "900")]
        width: f64,

        /// Output SVG path
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Print per-position base, deletion and insertion counts as TSV
    Counts {
        /// Path to BAM file (sorted and indexed)
        #[arg(short, long)]
        bam: PathBuf,

        /// Region to tally (format: chr:start-end, 0-based half-open)
        #[arg(short = 'L', long)]
        region: String,
    },
}

struct RenderOptions {
    paired: bool,
    quick_consensus: bool,
    min_indel_size: u32,
    read_labels: bool,
    axis_on_top: bool,
    width: f64,
}

fn build_document(
    reference: Option<&Path>,
    region: &Region,
    bams: &[PathBuf],
    beds: &[PathBuf],
    options: &RenderOptions,
) -> Result<Document> {
    let mut scale = Scale::from_region(region, Strand::Plus)?;
    match reference {
        Some(path) => scale = scale.with_source(Arc::new(ReferenceGenome::from_file(path)?)),
        None => info!("no reference given; drawing reads without mismatches"),
    }
    let mut view = GenomeView::new(scale).with_name("view");

    if options.axis_on_top {
        view.add_track(Axis::new("axis"));
    }

    let mut config = AlignmentTrackConfig {
        paired: options.paired,
        quick_consensus: options.quick_consensus,
        draw_read_labels: options.read_labels,
        ..AlignmentTrackConfig::default()
    };
    config.annotator.min_indel_size = options.min_indel_size;

    for (i, path) in bams.iter().enumerate() {
        let reads = AlignmentReader::read_bam(path, region)?;
        info!("loaded {} reads from {}", reads.len(), path.display());
        view.add_track(AlignmentTrack::with_config(format!("BAM{i}"), reads, config.clone()));
    }

    for (i, path) in beds.iter().enumerate() {
        let transcripts = read_bed(path, region)?;
        info!("loaded {} features from {}", transcripts.len(), path.display());
        view.add_track(BedTrack::new(format!("BED{i}"), transcripts));
    }

    if !options.axis_on_top {
        view.add_track(Axis::new("axis"));
    }

    let mut doc = Document::new(options.width);
    doc.add_view(view);
    Ok(doc)
}

fn write_counts(counts: &MismatchCounts, out: &mut impl Write) -> Result<()> {
    let symbols = [Symbol::A, Symbol::C, Symbol::G, Symbol::T, Symbol::Del, Symbol::Ins];
    write!(out, "position")?;
    for symbol in &symbols {
        write!(out, "\t{symbol}")?;
    }
    writeln!(out)?;

    for position in counts.start()..counts.end() {
        write!(out, "{position}")?;
        for &symbol in &symbols {
            write!(out, "\t{}", counts.count(symbol, position).unwrap_or(0))?;
        }
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    match cli.command {
        Commands::Render {
            reference,
            region,
            bam,
            bed,
            paired,
            no_quick_consensus,
            min_indel_size,
            read_labels,
            axis_on_top,
            width,
            out,
        } => {
            let region: Region = region.parse().context("failed to parse region")?;
            let options = RenderOptions {
                paired,
                quick_consensus: !no_quick_consensus,
                min_indel_size,
                read_labels,
                axis_on_top,
                width,
            };
            let mut doc = build_document(reference.as_deref(), &region, &bam, &bed, &options)?;

            let file = File::create(&out).with_context(|| format!("failed to create {}", out.display()))?;
            let mut writer = SvgWriter::new(BufWriter::new(file));
            let stats = doc
                .render(&mut writer)
                .with_context(|| format!("failed to render {region}"))?;
            info!(
                "wrote {} ({} elements, {} drawing commands)",
                out.display(),
                stats.elements,
                stats.commands
            );
        }

        Commands::Counts { bam, region } => {
            let region: Region = region.parse().context("failed to parse region")?;
            let reads = AlignmentReader::read_bam(&bam, &region)?;
            info!("loaded {} reads in region {}", reads.len(), region);

            let counts = MismatchCounts::from_reads(region.chrom.as_str(), region.start, region.end, &reads);
            let stdout = io::stdout();
            write_counts(&counts, &mut stdout.lock())?;
        }
    }

    Ok(())
}
