/// Column width a tab advances to, as used by MCNP when reading input
pub const TAB_WIDTH: usize = 8;

/// Extends string types with line classification helpers
pub trait StringExt {
    /// Capilalises the first letter in a string
    ///
    /// ```rust
    /// # use mcnptools_utils::StringExt;
    /// assert_eq!("fatal".capitalise(), "Fatal".to_string());
    /// assert_eq!("".capitalise(), "".to_string());
    /// ```
    fn capitalise(&self) -> String;

    /// True for empty strings or strings of only whitespace
    ///
    /// ```rust
    /// # use mcnptools_utils::StringExt;
    /// assert!("".is_blank());
    /// assert!(" \t  ".is_blank());
    /// assert!(!"  1 0 -1".is_blank());
    /// ```
    fn is_blank(&self) -> bool;

    /// Number of columns occupied by leading whitespace
    ///
    /// Tabs advance to the next multiple of eight columns, so a single tab
    /// counts as a full continuation indent.
    ///
    /// ```rust
    /// # use mcnptools_utils::StringExt;
    /// assert_eq!("     imp:n=1".indent_width(), 5);
    /// assert_eq!("\timp:n=1".indent_width(), 8);
    /// assert_eq!("  \timp:n=1".indent_width(), 8);
    /// assert_eq!("1 0 -1".indent_width(), 0);
    /// ```
    fn indent_width(&self) -> usize;
}

impl<T: AsRef<str>> StringExt for T {
    fn capitalise(&self) -> String {
        let mut c = self.as_ref().chars();
        match c.next() {
            Some(first) => first.to_uppercase().chain(c).collect(),
            None => String::new(),
        }
    }

    fn is_blank(&self) -> bool {
        self.as_ref().trim().is_empty()
    }

    fn indent_width(&self) -> usize {
        let mut width = 0;
        for c in self.as_ref().chars() {
            match c {
                ' ' => width += 1,
                '\t' => width += TAB_WIDTH - (width % TAB_WIDTH),
                _ => break,
            }
        }
        width
    }
}
