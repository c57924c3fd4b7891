//! End-to-end tests: synthetic reads, annotations and reference through layout,
//! annotation, rendering and SVG serialization.

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use genomeview::alignment::{parse_cigar, AlignedRead};
use genomeview::annotation::read_bed;
use genomeview::consensus::{MismatchCounts, Symbol};
use genomeview::document::{Document, GenomeView, ViewRow};
use genomeview::reference::{ReferenceGenome, ReferenceSource};
use genomeview::region::{Region, Strand};
use genomeview::render::{DrawCommand, SvgWriter};
use genomeview::scale::Scale;
use genomeview::tracks::{
    AlignmentTrack, AlignmentTrackConfig, Axis, BedTrack, GraphTrack, Track, TrackKind,
};

const CHROM: &str = "chr1";
const REF_LEN: usize = 2000;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A deterministic pseudo-random reference.
fn reference_bases() -> Vec<u8> {
    let mut state: u32 = 17;
    (0..REF_LEN)
        .map(|_| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            b"ACGT"[((state >> 16) % 4) as usize]
        })
        .collect()
}

fn genome() -> Arc<ReferenceGenome> {
    let mut sequences = HashMap::new();
    sequences.insert(CHROM.to_string(), reference_bases());
    Arc::new(ReferenceGenome::from_sequences(sequences))
}

/// A read that matches the reference exactly over `[start, start + len)`.
fn perfect_read(name: &str, start: u64, len: u64) -> AlignedRead {
    let seq = reference_bases()[start as usize..(start + len) as usize].to_vec();
    AlignedRead::new(name, CHROM, start, parse_cigar(&format!("{len}M")).unwrap(), seq)
}

/// Start of the 4 bp deletion shared by every variant read.
const DELETION_AT: u64 = 1060;

/// A 6 bp soft clip, then 100 aligned bases with a SNV at `snv` and a 4 bp
/// deletion at `DELETION_AT`.
fn variant_read(name: &str, start: u64, snv: u64) -> AlignedRead {
    let reference = reference_bases();
    let before = DELETION_AT - start;
    let after = 100 - before;
    let mut seq = b"NNNNNN".to_vec();
    seq.extend_from_slice(&reference[start as usize..DELETION_AT as usize]);
    seq.extend_from_slice(&reference[(DELETION_AT + 4) as usize..(DELETION_AT + 4 + after) as usize]);
    let offset = 6 + (snv - start) as usize;
    seq[offset] = if seq[offset] == b'A' { b'C' } else { b'A' };
    let cigar = parse_cigar(&format!("6S{before}M4D{after}M")).unwrap();
    AlignedRead::new(name, CHROM, start, cigar, seq)
}

fn scale(start: u64, end: u64) -> Scale {
    Scale::new(CHROM, start, end, Strand::Plus)
        .unwrap()
        .with_source(genome())
}

fn reads() -> Vec<AlignedRead> {
    let mut reads = Vec::new();
    for i in 0..6 {
        reads.push(variant_read(&format!("var{i}"), 1010 + i * 3, 1030));
    }
    for i in 0..6 {
        reads.push(perfect_read(&format!("ref{i}"), 1005 + i * 4, 120));
    }
    // a lone sequencing error
    let mut noisy = perfect_read("noisy", 1000, 150);
    let pos = 70usize;
    noisy.sequence[pos] = if noisy.sequence[pos] == b'G' { b'T' } else { b'G' };
    reads.push(noisy);
    reads
}

fn count_fills(commands: &[DrawCommand], color: &str) -> usize {
    commands
        .iter()
        .filter(|c| matches!(c, DrawCommand::Rect { style, .. } if style.fill.as_deref() == Some(color)))
        .count()
}

// ---------------------------------------------------------------------------
// Reference & consensus
// ---------------------------------------------------------------------------

#[test]
fn test_reference_round_trips_through_scale() {
    let scale = scale(1000, 1100);
    let expected = &reference_bases()[1000..1100];
    assert_eq!(scale.get_seq(None, None, None).unwrap(), expected);

    let minus = genome().get_sequence(CHROM, 1000, 1004, Strand::Minus).unwrap();
    let complement: Vec<u8> = expected[..4]
        .iter()
        .rev()
        .map(|&b| match b {
            b'A' => b'T',
            b'C' => b'G',
            b'G' => b'C',
            _ => b'A',
        })
        .collect();
    assert_eq!(minus, complement);
}

#[test]
fn test_consensus_separates_variant_from_noise() {
    let reads = reads();
    let counts = MismatchCounts::from_reads(CHROM, 1000, 1200, &reads);
    let reference = reference_bases();

    // read 0 starts at 1010 behind a 6 bp soft clip
    let variant_base = reads[0].sequence[6 + 20];
    assert_ne!(variant_base, reference[1030]);
    assert!(counts.query(Symbol::from_base(variant_base).unwrap(), 1030, None));

    let noise_base = reads[12].sequence[70];
    assert_ne!(noise_base, reference[1070]);
    assert!(!counts.query(Symbol::from_base(noise_base).unwrap(), 1070, None));

    // six of thirteen reads delete these columns
    assert_eq!(counts.count(Symbol::Del, DELETION_AT), Some(6));
    assert!(counts.query(Symbol::Del, DELETION_AT, Some(DELETION_AT + 3)));
    assert!(!counts.query(Symbol::Del, DELETION_AT + 4, None));
}

// ---------------------------------------------------------------------------
// Alignment tracks
// ---------------------------------------------------------------------------

#[test]
fn test_quick_consensus_hides_lone_errors() {
    let scale_with_width = {
        let mut s = scale(1000, 1200);
        s.set_pixel_width(800.0).unwrap();
        s
    };

    let mut filtered = AlignmentTrack::new("filtered", reads());
    filtered.layout(&scale_with_width).unwrap();
    let filtered_commands: Vec<_> = filtered.render(&scale_with_width).collect::<Result<_, _>>().unwrap();

    let config = AlignmentTrackConfig {
        quick_consensus: false,
        ..AlignmentTrackConfig::default()
    };
    let mut unfiltered = AlignmentTrack::with_config("raw", reads(), config);
    unfiltered.layout(&scale_with_width).unwrap();
    let raw_commands: Vec<_> = unfiltered.render(&scale_with_width).collect::<Result<_, _>>().unwrap();

    let mismatch_colors = ["blue", "orange", "green", "black"];
    let filtered_mismatches: usize = mismatch_colors.iter().map(|c| count_fills(&filtered_commands, c)).sum();
    let raw_mismatches: usize = mismatch_colors.iter().map(|c| count_fills(&raw_commands, c)).sum();
    assert_eq!(filtered_mismatches, 6);
    assert_eq!(raw_mismatches, 7);

    // six deletions and six clips either way
    assert_eq!(count_fills(&filtered_commands, "gray"), 6);
    assert_eq!(count_fills(&filtered_commands, "cyan"), 6);
    assert_eq!(count_fills(&raw_commands, "cyan"), 6);
}

#[test]
fn test_track_height_follows_rows() {
    let scale = scale(1000, 1200);
    let mut track = AlignmentTrack::new("reads", reads());
    track.layout(&scale).unwrap();
    assert!(track.row_count() > 1);
    assert_eq!(track.height(), (track.row_count() + 1) as f64 * 10.0);
}

#[test]
fn test_reads_render_without_reference() {
    let mut scale = Scale::new(CHROM, 1000, 1200, Strand::Plus).unwrap();
    scale.set_pixel_width(800.0).unwrap();
    let mut track = AlignmentTrack::new("reads", reads());
    track.layout(&scale).unwrap();
    let commands: Vec<_> = track.render(&scale).collect::<Result<_, _>>().unwrap();

    let mismatches: usize = ["blue", "orange", "green", "black"]
        .iter()
        .map(|c| count_fills(&commands, c))
        .sum();
    assert_eq!(mismatches, 0);
    assert_eq!(count_fills(&commands, "gray"), 6);
    assert_eq!(count_fills(&commands, "cyan"), 6);
}

// ---------------------------------------------------------------------------
// Full document
// ---------------------------------------------------------------------------

fn bed_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "chr1\t1020\t1180\tGENE1\t0\t+\t1040\t1160\t0\t3\t30,40,30,\t0,60,130,"
    )
    .unwrap();
    writeln!(file, "chr1\t1100\t1110\tsmall\t0\t-").unwrap();
    file.flush().unwrap();
    file
}

fn document() -> Document {
    let region = Region::new(CHROM, 1000, 1200).unwrap();
    let bed = bed_file();
    let transcripts = read_bed(bed.path(), &region).unwrap();
    assert_eq!(transcripts.len(), 2);

    let mut view = GenomeView::new(scale(1000, 1200)).with_name("main");
    view.add_track(AlignmentTrack::new("reads", reads()));
    view.add_track(BedTrack::new("genes", transcripts));

    let mut graph = GraphTrack::new("depth");
    let counts = MismatchCounts::from_reads(CHROM, 1000, 1200, &reads());
    let xs: Vec<f64> = (1000..1200).map(|p| p as f64).collect();
    let ys: Vec<f64> = (1000..1200).map(|p| counts.depth(p).unwrap_or(0) as f64).collect();
    graph.add_series(xs, ys, None, Some("depth")).unwrap();
    view.add_track(graph);
    view.add_track(Axis::new("axis"));

    let mut doc = Document::new(810.0);
    doc.add_view(view);
    doc
}

#[test]
fn test_document_renders_every_track() {
    let mut doc = document();
    let mut sink: Vec<DrawCommand> = Vec::new();
    let stats = doc.render(&mut sink).unwrap();

    // one view plus four tracks
    assert_eq!(stats.elements, 5);
    assert_eq!(stats.commands, sink.len());

    let names: Vec<&str> = sink
        .iter()
        .filter_map(|c| match c {
            DrawCommand::BeginClip { name, .. } => Some(name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(names, vec!["main", "reads", "genes", "depth", "axis"]);

    // all drawing sits inside the document margins horizontally
    for command in &sink {
        if let DrawCommand::BeginClip { x, width, .. } = command {
            assert!(*x >= 5.0 && x + width <= 805.0 + 1e-6);
        }
    }

    assert_eq!(doc.get_tracks(Some("genes")).len(), 1);
    assert!(matches!(doc.get_tracks(Some("axis"))[0], TrackKind::Axis(_)));
}

#[test]
fn test_svg_output_is_well_formed() {
    let mut doc = document();
    let mut writer = SvgWriter::new(Vec::new());
    doc.render(&mut writer).unwrap();
    let svg = String::from_utf8(writer.into_inner()).unwrap();

    assert!(svg.starts_with("<?xml"));
    assert!(svg.contains(r#"width="810""#));
    assert_eq!(svg.matches("<clipPath").count(), 5);
    assert_eq!(svg.matches("<g clip-path").count(), svg.matches("</g>").count());
    assert!(svg.contains(">GENE1</text>"));
    assert!(svg.trim_end().ends_with("</svg>"));
}

#[test]
fn test_svg_written_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("region.svg");
    let mut doc = document();
    {
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = SvgWriter::new(std::io::BufWriter::new(file));
        doc.render(&mut writer).unwrap();
    }
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("<polygon"));
}

#[test]
fn test_side_by_side_views() {
    let mut row = ViewRow::new("pair");
    let mut left = GenomeView::new(scale(1000, 1100)).with_name("left");
    left.add_track(AlignmentTrack::new("reads", reads()));
    let mut right = GenomeView::new(scale(1100, 1200)).with_name("right");
    right.add_track(Axis::new("axis"));
    row.add_view(left);
    row.add_view(right);

    let mut doc = Document::new(410.0);
    doc.add_row(row);
    let mut sink: Vec<DrawCommand> = Vec::new();
    doc.render(&mut sink).unwrap();

    let right_frame = sink
        .iter()
        .find_map(|c| match c {
            DrawCommand::BeginClip { name, x, width, .. } if name == "right" => Some((*x, *width)),
            _ => None,
        })
        .unwrap();
    assert_eq!(right_frame, (207.5, 197.5));
}

#[test]
fn test_fasta_file_drives_scale() {
    let mut fasta = tempfile::NamedTempFile::new().unwrap();
    writeln!(fasta, ">1").unwrap();
    writeln!(fasta, "acgtACGTNNacgt").unwrap();
    fasta.flush().unwrap();

    let genome = ReferenceGenome::from_file(fasta.path()).unwrap();
    let scale = Scale::new("chr1", 2, 10, Strand::Plus)
        .unwrap()
        .with_source(Arc::new(genome));
    assert_eq!(scale.get_seq(None, None, None).unwrap(), b"GTACGTNN");
}
