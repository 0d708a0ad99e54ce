//! Profile-only final stage: envelope domains become hits without a
//! covariance model scan.

use log::trace;

use crate::common::{Hit, PassKind, Scorer, TruncMode};
use crate::config::PipelineConfig;
use crate::model::CovarianceModel;
use crate::sequence::DigitalSeq;
use crate::stats::SearchSpace;

use super::stages::ScoredDomain;

pub(crate) struct ProfileHits<'a> {
    pub model: &'a CovarianceModel,
    pub config: &'a PipelineConfig,
}

impl ProfileHits<'_> {
    /// Turn scored domains into hits. E-values count one trial per W-long
    /// window of the search space.
    pub fn report(&self, seq: &DigitalSeq, domains: &[ScoredDomain], pass: PassKind, space: &SearchSpace, hits: &mut Vec<Hit>) {
        let cfg = self.config;
        let trials = space.windows(self.model.max_width);
        for dom in domains {
            let evalue = dom.pvalue * trials;
            let reported = cfg.report.accepts(self.model, dom.score, evalue);
            trace!(
                "{}: profile domain [{}, {}] = {:.2} bits, E = {:.2e}{}",
                seq.name,
                dom.domain.start,
                dom.domain.end,
                dom.score,
                evalue,
                if reported { "" } else { " (not reported)" }
            );
            if !reported {
                continue;
            }
            let (start, end) = seq.source_coords(dom.domain.start, dom.domain.end);
            hits.push(Hit {
                target: seq.name.clone(),
                model: self.model.name.clone(),
                start,
                end,
                strand: seq.strand,
                score: dom.score,
                pvalue: dom.pvalue,
                evalue,
                pass,
                trunc_mode: TruncMode::Joint,
                root_state: 0,
                scorer: Scorer::Profile,
                envelope: seq.source_coords(dom.padded.start, dom.padded.end),
                included: cfg.inclusion.accepts(self.model, dom.score, evalue),
            });
        }
    }
}
