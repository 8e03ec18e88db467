/// Asserts that a numerical hyperparameter is in the provided interval `[a,b]` and panics
/// with a helpful message if not
///
/// ### Example
/// ```should_panic
/// # use a3c::assert_interval;
/// let gamma = 1.5;
/// assert_interval!(gamma, 0.0, 1.0);
/// ```
/// This will panic with the message "Invalid value for \`gamma\` (1.5). Must be in the interval \[0, 1\]."
#[macro_export]
macro_rules! assert_interval {
    ($var:expr, $a:expr, $b:expr) => {
        assert!(
            $var >= $a && $var <= $b,
            "Invalid value for `{}` ({}). Must be in the interval [{}, {}].",
            stringify!($var),
            $var,
            $a,
            $b,
        );
    };
}
