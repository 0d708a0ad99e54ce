//! Window and envelope bookkeeping.
//!
//! All coordinates are 1-based and inclusive. After `merge`, a window list is
//! sorted and non-overlapping, and adjacent windows are fused.

/// A stretch of the target handed to the next stage. `end < start` is an
/// empty window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Window {
    pub start: usize,
    pub end: usize,
}

impl Window {
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start >= 1);
        Self { start, end }
    }

    #[inline]
    pub fn len(&self) -> usize {
        (self.end + 1).saturating_sub(self.start)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    #[inline]
    pub fn contains(&self, start: usize, end: usize) -> bool {
        self.start <= start && end <= self.end
    }

    /// Same window shifted right by `offset` residues.
    #[inline]
    pub fn shifted(&self, offset: usize) -> Self {
        Self::new(self.start + offset, self.end + offset)
    }
}

/// Sort and fuse windows that overlap or touch (`end + 1 >= next.start`).
/// Empty windows are dropped.
pub fn merge(mut windows: Vec<Window>) -> Vec<Window> {
    windows.retain(|w| !w.is_empty());
    windows.sort_unstable();
    let mut merged: Vec<Window> = Vec::with_capacity(windows.len());
    for w in windows {
        match merged.last_mut() {
            Some(last) if last.end + 1 >= w.start => last.end = last.end.max(w.end),
            _ => merged.push(w),
        }
    }
    merged
}

/// Cover `lo..=hi` with windows of length 2W, each starting W+1 after the
/// previous one, so any span of at most W residues fits inside one window.
pub fn tile(lo: usize, hi: usize, w: usize) -> Vec<Window> {
    if hi < lo {
        return Vec::new();
    }
    let w = w.max(1);
    let mut out = Vec::new();
    let mut s = lo;
    loop {
        let e = (s + 2 * w - 1).min(hi);
        out.push(Window::new(s, e));
        if e == hi {
            break;
        }
        s += w + 1;
    }
    out
}

/// Re-tile windows longer than `wmult * W`.
pub fn split_long(windows: Vec<Window>, w: usize, wmult: f64) -> Vec<Window> {
    let limit = (wmult * w as f64) as usize;
    windows
        .into_iter()
        .flat_map(|win| {
            if win.len() > limit {
                tile(win.start, win.end, w)
            } else {
                vec![win]
            }
        })
        .collect()
}

/// Window around a seed: W residues of slack on each side, clipped to
/// `lo..=hi`.
#[inline]
pub fn expand_seed(start: usize, end: usize, w: usize, lo: usize, hi: usize) -> Window {
    Window::new(start.saturating_sub(w).max(lo), (end + w).min(hi))
}

/// Grow an envelope so that every hit of length at most W overlapping it
/// fits, clipped to the window it came from.
pub fn pad_envelope(env: Window, win: Window, w: usize) -> Window {
    let pad = w.saturating_sub(1);
    if env.len() <= w {
        Window::new(
            env.end.saturating_sub(pad).max(win.start),
            (env.start + pad).min(win.end),
        )
    } else {
        Window::new(
            env.start.saturating_sub(pad).max(win.start),
            (env.end + pad).min(win.end),
        )
    }
}

/// Residues covered by the union of `windows`.
pub fn covered_residues(windows: &[Window]) -> u64 {
    merge(windows.to_vec())
        .iter()
        .map(|w| w.len() as u64)
        .sum()
}
