use crate::f;

/// Extends primitives with more specific formatting options
pub trait ValueExt {
    /// Scientific formatting with a signed, padded exponent
    ///
    /// Rust prints `1e0` for `{:e}`, which reads badly next to the fortran
    /// style numbers found in decks. This always signs and pads the exponent.
    ///
    /// ```rust
    /// # use mcnptools_utils::ValueExt;
    /// assert_eq!((-1.0).sci(5, 2), "-1.00000e+00".to_string());
    /// assert_eq!((0.0012).sci(2, 2), "1.20e-03".to_string());
    /// assert_eq!((2.5e11).sci(1, 3), "2.5e+011".to_string());
    /// ```
    fn sci(&self, precision: usize, exp_pad: usize) -> String;
}

impl<T: std::fmt::LowerExp> ValueExt for T {
    fn sci(&self, precision: usize, exp_pad: usize) -> String {
        let raw = f!("{:.precision$e}", &self, precision = precision);
        // LowerExp output always contains exactly one 'e'
        match raw.split_once('e') {
            Some((mantissa, exponent)) => {
                let (sign, digits) = match exponent.strip_prefix('-') {
                    Some(digits) => ('-', digits),
                    None => ('+', exponent),
                };
                f!("{mantissa}e{sign}{digits:0>exp_pad$}")
            }
            None => raw,
        }
    }
}
