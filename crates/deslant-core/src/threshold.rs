//! Otsu thresholding.

/// Compute the Otsu threshold of a set of intensities.
///
/// The returned value `t` splits the samples into a dark class `v <= t` and a
/// bright class `v > t`. Returns `None` when there is nothing to separate:
/// an empty slice or a single constant intensity.
pub fn otsu_threshold(samples: &[u8]) -> Option<u8> {
    if samples.is_empty() {
        return None;
    }

    let mut hist = [0u32; 256];
    for &v in samples {
        hist[v as usize] += 1;
    }

    let min_v = hist.iter().position(|&h| h > 0)? as u8;
    let max_v = hist.iter().rposition(|&h| h > 0)? as u8;
    if min_v == max_v {
        return None;
    }
    let nonzero_bins = hist.iter().filter(|&&h| h > 0).count();
    if nonzero_bins <= 2 {
        return Some(((min_v as u16 + max_v as u16) / 2) as u8);
    }

    let total = samples.len() as f64;
    let sum_total: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &h)| i as f64 * h as f64)
        .sum();

    let mut sum_b = 0f64;
    let mut w_b = 0f64;
    let mut best_var = -1f64;
    let mut best_t = min_v;

    for (t, &h) in hist.iter().enumerate() {
        w_b += h as f64;
        if w_b < 1.0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f < 1.0 {
            break;
        }

        sum_b += t as f64 * h as f64;
        let m_b = sum_b / w_b;
        let m_f = (sum_total - sum_b) / w_f;

        let var_between = w_b * w_f * (m_b - m_f) * (m_b - m_f);
        if var_between > best_var {
            best_var = var_between;
            best_t = t as u8;
        }
    }

    Some(best_t)
}
