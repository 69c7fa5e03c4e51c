/// `tf * ln(n / df) / len`.
///
/// Returns 0.0 instead of a non-finite value when any of `df`, `n` or `len`
/// is zero.
pub fn tf_idf(tf: usize, n: usize, df: usize, len: u32) -> f64 {
    if df == 0 || n == 0 || len == 0 {
        return 0.0;
    }
    let idf = (n as f64 / df as f64).ln();
    tf as f64 * idf / f64::from(len)
}
