//! Tab-separated hit table, one line per hit.
//!
//! Columns: target, model, start, end, strand, trunc, pass, mdl, band,
//! score, evalue, inc. With comments on, a `#` header names the columns and a
//! trailer gives the hit count.

use std::io::Write;

use anyhow::Context;

use crate::common::{hit_report_order, Hit};
use crate::pipeline::PipelineStats;
use crate::sequence::Strand;

#[derive(Debug, Clone)]
pub struct TabularOptions {
    /// Write `#` header and trailer lines.
    pub comments: bool,
    /// Sort into report order before writing.
    pub sort: bool,
    /// Only write hits flagged as included.
    pub included_only: bool,
    pub score_decimals: usize,
}

impl Default for TabularOptions {
    fn default() -> Self {
        Self {
            comments: true,
            sort: true,
            included_only: false,
            score_decimals: 1,
        }
    }
}

/// E-value text: two-digit scientific below 0.001, fixed otherwise.
pub fn format_evalue(evalue: f64) -> String {
    if evalue == 0.0 {
        "0".to_string()
    } else if evalue < 0.001 {
        format!("{:.1e}", evalue)
    } else {
        format!("{:.3}", evalue)
    }
}

fn strand_symbol(strand: Strand) -> char {
    match strand {
        Strand::Forward => '+',
        Strand::Reverse => '-',
    }
}

fn write_hit<W: Write>(writer: &mut W, hit: &Hit, opts: &TabularOptions) -> std::io::Result<()> {
    writeln!(
        writer,
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.prec$}\t{}\t{}",
        hit.target,
        hit.model,
        hit.start,
        hit.end,
        strand_symbol(hit.strand),
        hit.trunc_mode.label(),
        hit.pass.label(),
        hit.scorer.label(),
        hit.scorer.band_label(),
        hit.score,
        format_evalue(hit.evalue),
        if hit.included { '!' } else { '?' },
        prec = opts.score_decimals,
    )
}

/// Write `hits` as a hit table.
pub fn write_tabular<W: Write>(writer: &mut W, hits: &[Hit], opts: &TabularOptions) -> anyhow::Result<()> {
    let mut rows: Vec<&Hit> = hits.iter().filter(|h| !opts.included_only || h.included).collect();
    if opts.sort {
        rows.sort_by(|a, b| hit_report_order(a, b));
    }
    if opts.comments {
        writeln!(writer, "# target\tmodel\tstart\tend\tstrand\ttrunc\tpass\tmdl\tbands\tscore\tevalue\tinc")
            .context("failed to write hit table header")?;
    }
    for hit in &rows {
        write_hit(writer, hit, opts)
            .with_context(|| format!("failed to write hit {}:{}-{}", hit.target, hit.start, hit.end))?;
    }
    if opts.comments {
        writeln!(writer, "# {} hits ({} included)", rows.len(), rows.iter().filter(|h| h.included).count())
            .context("failed to write hit table trailer")?;
    }
    Ok(())
}

/// Write the pipeline counter summary.
pub fn write_stats<W: Write>(writer: &mut W, stats: &PipelineStats) -> anyhow::Result<()> {
    writeln!(writer, "{}", stats).context("failed to write pipeline summary")?;
    Ok(())
}
