use once_cell::sync::Lazy;

const MAX_N: usize = 53;

/// Process-wide binomial coefficient table. Built once behind a one-shot
/// gate; purely read-only afterwards, so workers may consult it freely.
static TABLE: Lazy<Box<[[u64; MAX_N]; MAX_N]>> = Lazy::new(|| {
    let mut table = Box::new([[0u64; MAX_N]; MAX_N]);
    for n in 0..MAX_N {
        table[n][0] = 1;
        for k in 1..=n {
            table[n][k] = table[n - 1][k - 1] + table[n - 1][k];
        }
    }
    table
});

/// `n choose k`, zero when `k > n`. Covers the full deck range `n <= 52`.
pub fn choose(n: usize, k: usize) -> u64 {
    if n >= MAX_N || k > n {
        return 0;
    }
    TABLE[n][k]
}

/// Natural log of `n choose k`; every table entry fits a f64 exactly.
pub fn ln_choose(n: usize, k: usize) -> f64 {
    (choose(n, k) as f64).ln()
}
