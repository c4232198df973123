//! Bounded derivative-free maximisation of the shear score.
//!
//! In one dimension Powell's method reduces to a single line minimisation,
//! done here with Brent's bounded method (golden-section steps with parabolic
//! interpolation). The score is piecewise constant, so the result is a local
//! optimum; the grid optimizer remains the default.

use crate::{Candidate, SearchOutcome, ShearBounds};

const GOLDEN: f64 = 0.381_966_011_250_105_1; // (3 - sqrt(5)) / 2

/// Maximise `score(alpha)` over `bounds`.
///
/// The neutral shear is evaluated first so a page without ink resolves to it.
/// Every evaluation is reported, in order, as a candidate of the outcome.
pub fn maximize_bounded(
    bounds: ShearBounds,
    tolerance: f32,
    max_evaluations: usize,
    mut score: impl FnMut(f32) -> u64,
) -> SearchOutcome {
    let mut evaluated: Vec<Candidate> = Vec::new();
    let mut eval = |alpha: f64, evaluated: &mut Vec<Candidate>| -> f64 {
        let alpha = alpha as f32;
        let s = score(alpha);
        log::trace!("powell: alpha={alpha:.4} score={s}");
        evaluated.push(Candidate { alpha, score: s });
        -(s as f64)
    };

    eval(bounds.neutral() as f64, &mut evaluated);

    let (mut a, mut b) = (bounds.lower as f64, bounds.upper as f64);
    if b - a <= 0.0 {
        return SearchOutcome::from_candidates(evaluated);
    }

    let xtol = tolerance as f64;
    let sqrt_eps = f64::EPSILON.sqrt();

    let mut fulc = a + GOLDEN * (b - a);
    let mut nfc = fulc;
    let mut xf = fulc;
    let mut rat = 0.0f64;
    let mut e = 0.0f64;
    let mut fx = eval(xf, &mut evaluated);
    let mut ffulc = fx;
    let mut fnfc = fx;
    let mut xm = 0.5 * (a + b);
    let mut tol1 = sqrt_eps * xf.abs() + xtol / 3.0;
    let mut tol2 = 2.0 * tol1;

    while (xf - xm).abs() > tol2 - 0.5 * (b - a) && evaluated.len() < max_evaluations {
        let mut golden = true;

        if e.abs() > tol1 {
            // parabolic fit through xf, nfc, fulc
            let mut r = (xf - nfc) * (fx - ffulc);
            let mut q = (xf - fulc) * (fx - fnfc);
            let mut p = (xf - fulc) * q - (xf - nfc) * r;
            q = 2.0 * (q - r);
            if q > 0.0 {
                p = -p;
            }
            q = q.abs();
            r = e;
            e = rat;

            if p.abs() < (0.5 * q * r).abs() && p > q * (a - xf) && p < q * (b - xf) {
                rat = p / q;
                let x = xf + rat;
                golden = false;
                if (x - a) < tol2 || (b - x) < tol2 {
                    rat = tol1 * signum_or_one(xm - xf);
                }
            }
        }

        if golden {
            e = if xf >= xm { a - xf } else { b - xf };
            rat = GOLDEN * e;
        }

        let x = xf + signum_or_one(rat) * rat.abs().max(tol1);
        let fu = eval(x, &mut evaluated);

        if fu <= fx {
            if x >= xf {
                a = xf;
            } else {
                b = xf;
            }
            fulc = nfc;
            ffulc = fnfc;
            nfc = xf;
            fnfc = fx;
            xf = x;
            fx = fu;
        } else {
            if x < xf {
                a = x;
            } else {
                b = x;
            }
            if fu <= fnfc || nfc == xf {
                fulc = nfc;
                ffulc = fnfc;
                nfc = x;
                fnfc = fu;
            } else if fu <= ffulc || fulc == xf || fulc == nfc {
                fulc = x;
                ffulc = fu;
            }
        }

        xm = 0.5 * (a + b);
        tol1 = sqrt_eps * xf.abs() + xtol / 3.0;
        tol2 = 2.0 * tol1;
    }

    SearchOutcome::from_candidates(evaluated)
}

fn signum_or_one(v: f64) -> f64 {
    if v < 0.0 {
        -1.0
    } else {
        1.0
    }
}
