use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{bail, Context, Result};
use noodles::csi::BinningIndex;
use log::{debug, warn};

use crate::region::{match_chrom_format, Region, Strand};

/// A gene model: an overall span, an optional coding region and its exons.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub strand: Strand,
    pub name: Option<String>,
    pub coding_start: Option<u64>,
    pub coding_end: Option<u64>,
    /// Absolute `[start, end)` exon spans in ascending order. A transcript
    /// without block structure has one exon covering its whole span.
    pub exons: Vec<(u64, u64)>,
}

impl Transcript {
    pub fn new(chrom: impl Into<String>, start: u64, end: u64, strand: Strand) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            end,
            strand,
            name: None,
            coding_start: None,
            coding_end: None,
            exons: vec![(start, end)],
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_coding(mut self, coding_start: u64, coding_end: u64) -> Self {
        self.coding_start = Some(coding_start);
        self.coding_end = Some(coding_end);
        self
    }

    pub fn with_exons(mut self, exons: Vec<(u64, u64)>) -> Self {
        self.exons = exons;
        self
    }

    pub fn is_coding(&self) -> bool {
        matches!((self.coding_start, self.coding_end), (Some(s), Some(e)) if e > s)
    }

    /// Build a transcript from the whitespace-split fields of a BED3..BED12 line.
    ///
    /// Field 4 is the name, field 6 the strand, fields 7-8 the thick (coding)
    /// span and fields 10-12 the block count, sizes and relative starts.
    pub fn from_bed_fields(fields: &[&str]) -> Result<Self> {
        if fields.len() < 3 {
            bail!("BED line needs at least 3 fields, got {}", fields.len());
        }
        let chrom = fields[0];
        let start: u64 = fields[1]
            .parse()
            .with_context(|| format!("invalid BED start '{}'", fields[1]))?;
        let end: u64 = fields[2]
            .parse()
            .with_context(|| format!("invalid BED end '{}'", fields[2]))?;
        if end < start {
            bail!("BED end {end} precedes start {start}");
        }

        let strand = match fields.get(5) {
            Some(&"-") => Strand::Minus,
            _ => Strand::Plus,
        };
        let mut tx = Transcript::new(chrom, start, end, strand);

        if let Some(&name) = fields.get(3)
            && !name.is_empty()
            && name != "."
        {
            tx.name = Some(name.to_string());
        }

        if fields.len() >= 8 {
            let thick_start: u64 = fields[6]
                .parse()
                .with_context(|| format!("invalid BED thickStart '{}'", fields[6]))?;
            let thick_end: u64 = fields[7]
                .parse()
                .with_context(|| format!("invalid BED thickEnd '{}'", fields[7]))?;
            if thick_end > thick_start {
                tx = tx.with_coding(thick_start, thick_end);
            }
        }

        if fields.len() >= 12 {
            let block_count: usize = fields[9]
                .parse()
                .with_context(|| format!("invalid BED blockCount '{}'", fields[9]))?;
            if block_count > 0 {
                let sizes = parse_block_list(fields[10]).context("invalid BED blockSizes")?;
                let starts = parse_block_list(fields[11]).context("invalid BED blockStarts")?;
                let mut exons: Vec<(u64, u64)> = starts
                    .iter()
                    .zip(&sizes)
                    .map(|(&rel_start, &size)| (start + rel_start, start + rel_start + size))
                    .collect();
                exons.sort_unstable();
                if !exons.is_empty() {
                    tx.exons = exons;
                }
            }
        }

        Ok(tx)
    }
}

fn parse_block_list(field: &str) -> Result<Vec<u64>> {
    field
        .split(',')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u64>().with_context(|| format!("invalid block value '{s}'")))
        .collect()
}

/// Whitespace-split fields of a data line; `None` for blank, comment,
/// `track` and `browser` lines.
fn bed_fields(line: &str) -> Option<Vec<&str>> {
    let trimmed = line.trim();
    if trimmed.is_empty()
        || trimmed.starts_with('#')
        || trimmed.starts_with("track")
        || trimmed.starts_with("browser")
    {
        return None;
    }
    Some(trimmed.split_whitespace().collect())
}

fn touches_region(tx: &Transcript, region: &Region) -> bool {
    tx.end >= region.start && tx.start <= region.end
}

fn warn_missing_chrom(region: &Region, path: &Path) {
    warn!(
        "didn't find chromosome {} in {}; make sure it's formatted correctly (eg 'chr1' vs '1')",
        region.chrom,
        path.display()
    );
}

/// Read transcripts overlapping `region` from a BED file.
///
/// Files ending in `.gz` are read as bgzip-compressed BED through their
/// tabix index (`<path>.tbi`); anything else is scanned as plain text.
pub fn read_bed(path: &Path, region: &Region) -> Result<Vec<Transcript>> {
    let transcripts = if path.extension().is_some_and(|ext| ext == "gz") {
        read_indexed_bed(path, region)?
    } else {
        read_plain_bed(path, region)?
    };
    debug!("read {} BED records overlapping {}", transcripts.len(), region);
    Ok(transcripts)
}

/// Scan a plain BED file. Header, track and comment lines are skipped. A
/// warning is logged when the region's chromosome never occurs in the file,
/// which usually means a `chr1` vs `1` naming mismatch.
fn read_plain_bed(path: &Path, region: &Region) -> Result<Vec<Transcript>> {
    let file = File::open(path).with_context(|| format!("failed to open BED file: {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut transcripts = Vec::new();
    let mut found_chrom = false;
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read {}", path.display()))?;
        let Some(fields) = bed_fields(&line) else {
            continue;
        };
        if fields[0] != region.chrom {
            continue;
        }
        found_chrom = true;

        let tx = Transcript::from_bed_fields(&fields)
            .with_context(|| format!("{}:{}: malformed BED record", path.display(), line_no + 1))?;
        if touches_region(&tx, region) {
            transcripts.push(tx);
        }
    }

    if !found_chrom {
        warn_missing_chrom(region, path);
    }
    Ok(transcripts)
}

/// Query a bgzipped, tabix-indexed BED file. The region's chromosome is
/// matched against the index's sequence names, and records are reported
/// under the caller's naming.
fn read_indexed_bed(path: &Path, region: &Region) -> Result<Vec<Transcript>> {
    use noodles::tabix;

    let mut reader = tabix::io::indexed_reader::Builder::default()
        .build_from_path(path)
        .with_context(|| format!("failed to open indexed BED file: {}", path.display()))?;

    let names: Vec<String> = reader
        .index()
        .header()
        .map(|header| {
            header
                .reference_sequence_names()
                .iter()
                .map(|name| name.to_string())
                .collect()
        })
        .unwrap_or_default();
    let chrom = match_chrom_format(&region.chrom, names.iter().map(String::as_str));
    if !names.contains(&chrom) {
        warn_missing_chrom(region, path);
        return Ok(Vec::new());
    }

    // noodles regions are 1-based and inclusive; widen by one base on each
    // side to keep features that only touch the window.
    let region_str = format!("{}:{}-{}", chrom, region.start.max(1), region.end + 1);
    let query_region: noodles::core::Region = region_str
        .parse()
        .with_context(|| format!("failed to parse region: {region_str}"))?;
    let query = reader
        .query(&query_region)
        .with_context(|| format!("failed to query {} over {}", path.display(), region_str))?;

    let mut transcripts = Vec::new();
    for result in query {
        let record = result.with_context(|| format!("failed to read {}", path.display()))?;
        let line: &str = record.as_ref();
        let Some(fields) = bed_fields(line) else {
            continue;
        };
        let mut tx = Transcript::from_bed_fields(&fields)
            .with_context(|| format!("{}: malformed BED record '{}'", path.display(), line))?;
        if touches_region(&tx, region) {
            tx.chrom.clone_from(&region.chrom);
            transcripts.push(tx);
        }
    }
    Ok(transcripts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_bed3() {
        let tx = Transcript::from_bed_fields(&["chr1", "100", "200"]).unwrap();
        assert_eq!(tx.strand, Strand::Plus);
        assert_eq!(tx.name, None);
        assert_eq!(tx.exons, vec![(100, 200)]);
        assert!(!tx.is_coding());
    }

    #[test]
    fn test_bed6_minus_strand() {
        let tx = Transcript::from_bed_fields(&["chr1", "100", "200", "geneA", "0", "-"]).unwrap();
        assert_eq!(tx.name.as_deref(), Some("geneA"));
        assert_eq!(tx.strand, Strand::Minus);
    }

    #[test]
    fn test_bed12_blocks() {
        let fields = [
            "chr1", "1000", "2000", "tx1", "0", "+", "1100", "1900", "0", "3", "100,200,100,", "0,400,900,",
        ];
        let tx = Transcript::from_bed_fields(&fields).unwrap();
        assert_eq!(tx.exons, vec![(1000, 1100), (1400, 1600), (1900, 2000)]);
        assert_eq!(tx.coding_start, Some(1100));
        assert_eq!(tx.coding_end, Some(1900));
        assert!(tx.is_coding());
    }

    #[test]
    fn test_empty_thick_span_is_non_coding() {
        let fields = ["chr1", "10", "20", "nc", "0", "+", "20", "20"];
        let tx = Transcript::from_bed_fields(&fields).unwrap();
        assert!(!tx.is_coding());
    }

    #[test]
    fn test_malformed_fields() {
        assert!(Transcript::from_bed_fields(&["chr1", "10"]).is_err());
        assert!(Transcript::from_bed_fields(&["chr1", "x", "20"]).is_err());
        assert!(Transcript::from_bed_fields(&["chr1", "30", "20"]).is_err());
    }

    #[test]
    fn test_read_bed_filters_region() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "track name=genes").unwrap();
        writeln!(file, "chr1\t100\t200\tinside\t0\t+").unwrap();
        writeln!(file, "chr1\t5000\t6000\toutside\t0\t+").unwrap();
        writeln!(file, "chr2\t100\t200\tother\t0\t-").unwrap();
        writeln!(file, "chr1\t900\t1100\tspanning\t0\t-").unwrap();
        file.flush().unwrap();

        let region: Region = "chr1:150-1000".parse().unwrap();
        let transcripts = read_bed(file.path(), &region).unwrap();
        let names: Vec<_> = transcripts.iter().filter_map(|t| t.name.as_deref()).collect();
        assert_eq!(names, vec!["inside", "spanning"]);
    }

    #[test]
    fn test_read_bed_missing_chromosome_is_empty() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "1\t100\t200\tnamed").unwrap();
        file.flush().unwrap();

        let region: Region = "chr1:0-1000".parse().unwrap();
        assert!(read_bed(file.path(), &region).unwrap().is_empty());
    }

    /// Write bgzipped BED lines plus a tabix index next to them.
    fn write_indexed_bed(dir: &Path, lines: &[(&str, u64, u64, &str)]) -> std::path::PathBuf {
        use noodles::bgzf;
        use noodles::core::Position;
        use noodles::csi::binning_index::index::{header, reference_sequence::bin::Chunk};
        use noodles::tabix;

        let path = dir.join("genes.bed.gz");
        let mut writer = bgzf::Writer::new(File::create(&path).unwrap());
        let mut indexer = tabix::index::Indexer::default();
        indexer.set_header(header::Builder::bed().build());

        for &(chrom, start, end, name) in lines {
            let chunk_start = writer.virtual_position();
            writeln!(writer, "{chrom}\t{start}\t{end}\t{name}\t0\t+").unwrap();
            let chunk_end = writer.virtual_position();
            indexer
                .add_record(
                    chrom,
                    Position::try_from(start as usize + 1).unwrap(),
                    Position::try_from(end as usize).unwrap(),
                    Chunk::new(chunk_start, chunk_end),
                )
                .unwrap();
        }
        writer.finish().unwrap();
        tabix::fs::write(dir.join("genes.bed.gz.tbi"), &indexer.build()).unwrap();
        path
    }

    #[test]
    fn test_read_indexed_bed_matches_chrom_naming() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_indexed_bed(
            dir.path(),
            &[
                ("1", 100, 200, "inside"),
                ("1", 900, 1100, "spanning"),
                ("1", 5000, 6000, "outside"),
                ("2", 100, 200, "other"),
            ],
        );

        let region: Region = "chr1:150-1000".parse().unwrap();
        let transcripts = read_bed(&path, &region).unwrap();
        let names: Vec<_> = transcripts.iter().filter_map(|t| t.name.as_deref()).collect();
        assert_eq!(names, vec!["inside", "spanning"]);
        assert!(transcripts.iter().all(|t| t.chrom == "chr1"));
    }

    #[test]
    fn test_read_indexed_bed_unknown_chrom_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_indexed_bed(dir.path(), &[("1", 100, 200, "a")]);
        let region: Region = "chr7:0-1000".parse().unwrap();
        assert!(read_bed(&path, &region).unwrap().is_empty());
    }

    #[test]
    fn test_read_indexed_bed_requires_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_indexed_bed(dir.path(), &[("1", 100, 200, "a")]);
        std::fs::remove_file(dir.path().join("genes.bed.gz.tbi")).unwrap();
        let region: Region = "1:0-1000".parse().unwrap();
        assert!(read_bed(&path, &region).is_err());
    }
}
