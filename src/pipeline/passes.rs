//! Which passes run over a target, and on what.

use std::borrow::Cow;

use crate::common::PassKind;
use crate::config::TruncationMode;
use crate::post::windows::Window;
use crate::sequence::DigitalSeq;

/// One pass over a target: the sequence it scans and the residues it may use.
#[derive(Debug, Clone)]
pub(crate) struct PassPlan<'s> {
    pub pass: PassKind,
    /// The target itself, or a re-based copy of its 3' tail.
    pub seq: Cow<'s, DigitalSeq>,
    pub region: Window,
}

/// Plan the passes over `seq`, in run order.
///
/// `w` is the model's maximum hit length. Passes at a terminus only run when
/// `seq` actually holds that terminus of its source.
pub(crate) fn plan_passes(seq: &DigitalSeq, w: usize, mode: TruncationMode) -> Vec<PassPlan<'_>> {
    let n = seq.len();
    if n == 0 {
        return Vec::new();
    }
    let mut plans = vec![PassPlan {
        pass: PassKind::Standard,
        seq: Cow::Borrowed(seq),
        region: Window::new(1, n),
    }];
    let m = w.min(n);
    match mode {
        TruncationMode::Off => {}
        TruncationMode::Termini => {
            let five = seq.has_five_prime_end();
            let three = seq.has_three_prime_end();
            if five {
                plans.push(PassPlan {
                    pass: PassKind::FivePrime,
                    seq: Cow::Borrowed(seq),
                    region: Window::new(1, m),
                });
            }
            if three {
                let tail = seq.subseq(n - m + 1, n);
                plans.push(PassPlan {
                    pass: PassKind::ThreePrime,
                    seq: Cow::Owned(tail),
                    region: Window::new(1, m),
                });
            }
            if five && three && n <= w {
                plans.push(PassPlan {
                    pass: PassKind::BothTermini,
                    seq: Cow::Borrowed(seq),
                    region: Window::new(1, n),
                });
            }
        }
        TruncationMode::Anywhere => plans.push(PassPlan {
            pass: PassKind::AnyTruncation,
            seq: Cow::Borrowed(seq),
            region: Window::new(1, n),
        }),
    }
    plans
}
