//! Profile filter stages 1-3: windows in, envelopes out.

use log::{debug, trace};

use crate::common::PassKind;
use crate::config::{PipelineConfig, Stage};
use crate::post::windows::{covered_residues, expand_seed, merge, pad_envelope, split_long, tile, Window};
use crate::profile::ProfileScorer;
use crate::sequence::DigitalSeq;

use super::accounting::{PassStats, StageCount};

/// Result of running the profile stages of one pass.
pub(crate) enum Filtered {
    Envelopes(Vec<Window>),
    /// `stop_after` was reached.
    Stopped,
}

/// A domain that passed stage 3, in pass-sequence coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ScoredDomain {
    pub domain: Window,
    /// Envelope handed to the covariance model stages.
    pub padded: Window,
    /// Forward bits, less the domain's bias when the bias filter is on.
    pub score: f32,
    pub pvalue: f64,
}

fn count(windows: &[Window]) -> StageCount {
    StageCount::new(windows.len(), covered_residues(windows))
}

pub(crate) struct ProfileStages<'a> {
    pub profile: &'a dyn ProfileScorer,
    pub config: &'a PipelineConfig,
    /// Model's maximum hit length.
    pub w: usize,
}

impl ProfileStages<'_> {
    pub fn run(&self, seq: &DigitalSeq, region: Window, pass: PassKind, stats: &mut PassStats) -> Filtered {
        let Some(windows) = self.survivors(seq, region, pass, stats) else {
            return Filtered::Stopped;
        };
        let mut envelopes = if self.config.filters.envelope {
            self.domains(seq, windows, pass, stats)
                .into_iter()
                .map(|d| d.padded)
                .collect()
        } else {
            stats.envelopes = count(&windows);
            stats.dom_bias = stats.envelopes;
            windows
        };
        for env in envelopes.iter_mut() {
            if pass.forces_start() {
                env.start = region.start;
            }
            if pass.forces_end() {
                env.end = region.end;
            }
        }
        let envelopes = merge(envelopes);
        debug!("{} [{}]: {} envelopes", seq.name, pass.label(), envelopes.len());
        if self.config.stop_after == Some(Stage::Envelope) {
            return Filtered::Stopped;
        }
        Filtered::Envelopes(envelopes)
    }

    /// Stages 1-3 for a profile-only search: the scored domains themselves.
    /// `None` if `stop_after` cut the pass short.
    pub fn scored_domains(
        &self,
        seq: &DigitalSeq,
        region: Window,
        pass: PassKind,
        stats: &mut PassStats,
    ) -> Option<Vec<ScoredDomain>> {
        let windows = self.survivors(seq, region, pass, stats)?;
        let domains = self.domains(seq, windows, pass, stats);
        debug!("{} [{}]: {} domains", seq.name, pass.label(), domains.len());
        if self.config.stop_after == Some(Stage::Envelope) {
            return None;
        }
        Some(domains)
    }

    /// Stages 1-2b. Forward survivors are merged so one domain is defined
    /// once, however many overlapping windows carried it.
    fn survivors(&self, seq: &DigitalSeq, region: Window, pass: PassKind, stats: &mut PassStats) -> Option<Vec<Window>> {
        let stop = self.config.stop_after;
        let windows = self.ungapped(seq, region, stats);
        debug!("{} [{}]: {} windows after ungapped filter", seq.name, pass.label(), windows.len());
        if stop == Some(Stage::Ungapped) {
            return None;
        }

        let windows = self.viterbi(seq, windows, stats);
        if stop == Some(Stage::Viterbi) {
            return None;
        }
        let windows = merge(self.forward(seq, windows, stats));
        debug!("{} [{}]: {} windows after forward filter", seq.name, pass.label(), windows.len());
        if stop == Some(Stage::Forward) {
            return None;
        }
        Some(windows)
    }

    /// Stage 1: seed windows from ungapped hits, or tile the region.
    fn ungapped(&self, seq: &DigitalSeq, region: Window, stats: &mut PassStats) -> Vec<Window> {
        let cfg = self.config;
        let evd = self.profile.evd();
        if !cfg.filters.msv {
            let windows = tile(region.start, region.end, self.w);
            stats.msv = count(&windows);
            stats.msv_bias = stats.msv;
            return windows;
        }

        let min_score = evd.msv.score_for_pvalue(cfg.thresholds.f1) as f32;
        let seeds = self.profile.ungapped_seeds(seq, region, min_score);
        trace!("{}: {} ungapped seeds >= {:.2} bits", seq.name, seeds.len(), min_score);
        let windows: Vec<Window> = seeds
            .iter()
            .map(|s| expand_seed(s.start, s.end, self.w, region.start, region.end))
            .collect();
        let mut windows = merge(windows);
        if cfg.split_windows {
            windows = split_long(windows, self.w, cfg.wmult);
        }
        stats.msv = count(&windows);

        if cfg.filters.msv_bias {
            windows.retain(|&win| {
                let sc = self.profile.ungapped_score(seq, win) - self.profile.bias(seq, win);
                evd.msv.pvalue(sc as f64) <= cfg.thresholds.f1
            });
        }
        stats.msv_bias = count(&windows);
        windows
    }

    /// Stage 2a: local Viterbi and its bias filter.
    fn viterbi(&self, seq: &DigitalSeq, mut windows: Vec<Window>, stats: &mut PassStats) -> Vec<Window> {
        let cfg = self.config;
        let evd = self.profile.evd();
        let f2 = cfg.thresholds.f2;
        if cfg.filters.vit {
            windows.retain(|&win| {
                let sc = self.profile.viterbi(seq, win);
                trace!("{}: viterbi [{}, {}] = {:.2}", seq.name, win.start, win.end, sc);
                evd.viterbi.pvalue(sc as f64) <= f2
            });
        }
        stats.vit = count(&windows);
        if cfg.filters.vit && cfg.filters.vit_bias {
            windows.retain(|&win| {
                let sc = self.profile.viterbi(seq, win) - self.profile.bias(seq, win);
                evd.viterbi.pvalue(sc as f64) <= f2
            });
        }
        stats.vit_bias = count(&windows);
        windows
    }

    /// Stage 2b: local Forward and its bias filter.
    fn forward(&self, seq: &DigitalSeq, mut windows: Vec<Window>, stats: &mut PassStats) -> Vec<Window> {
        let cfg = self.config;
        let evd = self.profile.evd();
        let f3 = cfg.thresholds.f3;
        if cfg.filters.fwd {
            windows.retain(|&win| {
                let sc = self.profile.forward(seq, win);
                trace!("{}: forward [{}, {}] = {:.2}", seq.name, win.start, win.end, sc);
                evd.forward.pvalue(sc as f64) <= f3
            });
        }
        stats.fwd = count(&windows);
        if cfg.filters.fwd && cfg.filters.fwd_bias {
            windows.retain(|&win| {
                let sc = self.profile.forward(seq, win) - self.profile.bias(seq, win);
                evd.forward.pvalue(sc as f64) <= f3
            });
        }
        stats.fwd_bias = count(&windows);
        windows
    }

    /// Stage 3: domains in each window, scored and padded.
    fn domains(&self, seq: &DigitalSeq, windows: Vec<Window>, pass: PassKind, stats: &mut PassStats) -> Vec<ScoredDomain> {
        let cfg = self.config;
        let glocal = pass != PassKind::AnyTruncation;
        let evd = self.profile.evd();
        let tail = if glocal { &evd.glocal_forward } else { &evd.forward };
        let df3 = cfg.thresholds.df3;
        let min_score = tail.score_for_pvalue(df3) as f32;

        let mut passed = Vec::new();
        let mut unbiased = Vec::new();
        for win in windows {
            for dom in self.profile.domains(seq, win, glocal, min_score) {
                let pvalue = tail.pvalue(dom.score as f64);
                if pvalue > df3 {
                    continue;
                }
                let padded = if cfg.pad_envelopes {
                    pad_envelope(dom.window, win, self.w)
                } else {
                    dom.window
                };
                passed.push(padded);
                let scored = if cfg.filters.dom_bias {
                    let score = dom.score - dom.bias;
                    ScoredDomain {
                        domain: dom.window,
                        padded,
                        score,
                        pvalue: tail.pvalue(score as f64),
                    }
                } else {
                    ScoredDomain {
                        domain: dom.window,
                        padded,
                        score: dom.score,
                        pvalue,
                    }
                };
                if scored.pvalue <= df3 {
                    unbiased.push(scored);
                }
            }
        }
        stats.envelopes = count(&passed);
        let kept: Vec<Window> = unbiased.iter().map(|d| d.padded).collect();
        stats.dom_bias = count(&kept);
        unbiased
    }
}
