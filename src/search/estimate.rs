/// Floor applied when any external inventory is confirmed: providers do not
/// expose cheap exact counts, so assume at least this many pages' worth
/// exist. Tunable; only drives the has-more signal.
pub const EXTERNAL_ESTIMATE_MULTIPLIER: i64 = 10;

/// Combines the store's exact count with a conservative guess at external
/// inventory. With no external records in play the store count is returned
/// untouched.
pub fn estimate_total(internal_exact: i64, external_observed: i64, limit: i64) -> i64 {
    if external_observed == 0 {
        return internal_exact;
    }
    internal_exact + external_observed.max(limit * EXTERNAL_ESTIMATE_MULTIPLIER)
}
