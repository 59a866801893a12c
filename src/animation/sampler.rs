use serde::Deserialize;

/// How keyframe brackets are located. Both produce identical brackets.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum KeyframeSearch {
    #[default]
    Binary,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub before: usize,
    pub after: usize,
    /// in [0, 1]
    pub local_t: f32,
}

/// Finds the keyframe pair around `t`.
///
/// `after` is the first keyframe later than `t`. At or past the last key the
/// last segment is used with `local_t = 1`, at or before the first key the
/// first segment with `local_t = 0`, even when those segments have zero
/// length. When every key shares one time the last key wins. Any other
/// zero-length span gives `local_t = 0`.
pub fn bracket(times: &[f32], t: f32, search: KeyframeSearch) -> Bracket {
    let n = times.len();
    if n < 2 {
        return Bracket { before: 0, after: 0, local_t: 0.0 };
    }
    // NaN sorts before everything
    let t = if t.is_nan() { f32::NEG_INFINITY } else { t };
    if t >= times[n - 1] {
        return Bracket { before: n - 2, after: n - 1, local_t: 1.0 };
    }
    if t <= times[0] {
        return Bracket { before: 0, after: 1, local_t: 0.0 };
    }

    let first_later = match search {
        KeyframeSearch::Binary => times.partition_point(|&x| x <= t),
        KeyframeSearch::Linear => times.iter().position(|&x| x > t).unwrap_or(n),
    };
    let after = first_later.clamp(1, n - 1);
    let before = after - 1;

    let (tb, ta) = (times[before], times[after]);
    let span = ta - tb;
    let local_t = if span <= 0.0 {
        tracing::trace!("degenerate keyframe span at {} ({} -> {})", before, tb, ta);
        0.0
    } else {
        ((t - tb) / span).clamp(0.0, 1.0)
    };
    Bracket { before, after, local_t }
}
