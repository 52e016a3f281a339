//! Preprocessing of raw deck text into logical lines
//!
//! MCNP input is line oriented, but a single card may be spread over many
//! physical lines and interleaved with comments. The lexer removes comments,
//! joins continuations, and splits the deck into its three content blocks so
//! that the parsers only ever see one complete card at a time.
//!
//! ```text
//! title card
//! 1 0 -1 imp:n=1          $ inline comment
//! c whole-line comment
//! 2 0  1                  &
//!       imp:n=0           (explicit and indented continuations)
//!                         <- blank line ends the cell block
//! 1 so 1.0
//!                         <- blank line ends the surface block
//! mode n
//! nps 1000
//! ```

// standard library
use std::fmt;

// external crates
use log::{debug, trace};
use serde::Serialize;

// mcnptools modules
use mcnptools_utils::{f, StringExt};

// crate modules
use crate::diagnostic::Span;
use crate::error::{Error, Result};

/// Minimum indent, in columns, for a line to continue the previous card
pub const CONTINUATION_INDENT: usize = 5;

/// The three content blocks of a deck
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Block {
    Cells,
    Surfaces,
    Data,
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Cells => "cell",
            Self::Surfaces => "surface",
            Self::Data => "data",
        };
        write!(f, "{s}")
    }
}

/// One complete card after comments are removed and continuations joined
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalLine {
    /// Card text with continuation lines joined by single spaces
    pub text: String,
    /// Physical lines the card was read from
    pub span: Span,
    /// Inline `$` comments, kept with the line they were found on
    pub comments: Vec<(usize, String)>,
}

impl LogicalLine {
    fn new(text: &str, line: usize) -> Self {
        Self {
            text: text.trim().to_string(),
            span: Span::line(line),
            comments: Vec::new(),
        }
    }

    fn append(&mut self, text: &str, line: usize) {
        let text = text.trim();
        if !text.is_empty() {
            if !self.text.is_empty() {
                self.text.push(' ');
            }
            self.text.push_str(text);
        }
        self.span.extend_to(line);
    }
}

/// A deck split into title, message block and three content blocks
#[derive(Debug, Clone, Default)]
pub struct Segmentation {
    /// Title card text
    pub title: String,
    /// Physical line of the title card
    pub title_line: usize,
    /// Optional message block lines, excluding the `message:` keyword
    pub messages: Vec<String>,
    /// Logical lines of the cell block
    pub cells: Vec<LogicalLine>,
    /// Logical lines of the surface block
    pub surfaces: Vec<LogicalLine>,
    /// Logical lines of the data block
    pub data: Vec<LogicalLine>,
}

/// Segment raw deck text into logical lines for each block
///
/// Structural problems are fatal and returned as an [Error]:
///
/// - [Error::MissingTitle] if the title card is blank or absent
/// - [Error::BadBlockSeparator] if a block delimiter is more than one blank
///   line, or the deck ends before the data block starts
/// - [Error::EmptyBlock] if a block holds only comments
///
/// ```rust
/// # use mcnptools_deck::lexer::segment;
/// let text = "simple\n1 0 -1 imp:n=1\n2 0  1 imp:n=0\n\n1 so 1.0\n\nmode n\nnps 1000\n";
/// let segments = segment(text).unwrap();
///
/// assert_eq!(segments.title, "simple");
/// assert_eq!(segments.cells.len(), 2);
/// assert_eq!(segments.surfaces[0].text, "1 so 1.0");
/// assert_eq!(segments.data[1].span.start, 8);
/// ```
pub fn segment(text: &str) -> Result<Segmentation> {
    let lines: Vec<&str> = text.lines().collect();
    let mut segmentation = Segmentation::default();
    let mut index = 0;

    // optional message block, terminated by a blank line
    if let Some(first) = lines.first() {
        if let Some(rest) = strip_message_keyword(first) {
            push_message(&mut segmentation.messages, rest);
            index = 1;
            while index < lines.len() && !lines[index].is_blank() {
                push_message(&mut segmentation.messages, lines[index]);
                index += 1;
            }
            index += 1;
            debug!("Message block of {} lines", segmentation.messages.len());
        }
    }

    // title card must be the next line
    match lines.get(index) {
        Some(title) if !title.is_blank() => {
            segmentation.title = title.trim().to_string();
            segmentation.title_line = index + 1;
        }
        _ => return Err(Error::MissingTitle { line: index + 1 }),
    }
    index += 1;

    // split the remaining lines on blank delimiters
    let blocks = split_blocks(&lines, index)?;
    let last = lines.len().max(1);

    segmentation.cells = block_lines(Block::Cells, &blocks[0], last)?;
    segmentation.surfaces = block_lines(Block::Surfaces, &blocks[1], last)?;
    segmentation.data = block_lines(Block::Data, &blocks[2], last)?;

    debug!(
        "Segmented deck into {} cells, {} surfaces, {} data cards",
        segmentation.cells.len(),
        segmentation.surfaces.len(),
        segmentation.data.len()
    );

    Ok(segmentation)
}

/// True for whole-line comment cards
///
/// The first non-whitespace token is a `c` (any case) followed by whitespace
/// or the end of the line.
///
/// ```rust
/// # use mcnptools_deck::lexer::is_comment;
/// assert!(is_comment("c this is a comment"));
/// assert!(is_comment("   C"));
/// assert!(is_comment("c\tpin cell"));
/// assert!(!is_comment("cut:n j 0.1"));
/// assert!(!is_comment("1 c/z 0 0 1"));
/// ```
pub fn is_comment(line: &str) -> bool {
    let mut chars = line.trim_start().chars();
    match chars.next() {
        Some('c') | Some('C') => chars.next().map_or(true, char::is_whitespace),
        _ => false,
    }
}

/// Split a content line on the first unquoted `$`
///
/// ```rust
/// # use mcnptools_deck::lexer::split_inline_comment;
/// assert_eq!(split_inline_comment("1 0 -1 $ fuel"), ("1 0 -1 ", Some(" fuel")));
/// assert_eq!(split_inline_comment("fc4 \"cost $\" $ x"), ("fc4 \"cost $\" ", Some(" x")));
/// assert_eq!(split_inline_comment("nps 100"), ("nps 100", None));
/// ```
pub fn split_inline_comment(line: &str) -> (&str, Option<&str>) {
    let mut quote: Option<char> = None;
    for (i, c) in line.char_indices() {
        match (c, quote) {
            ('"' | '\'', None) => quote = Some(c),
            (c, Some(q)) if c == q => quote = None,
            ('$', None) => return (&line[..i], Some(&line[i + 1..])),
            _ => (),
        }
    }
    (line, None)
}

fn strip_message_keyword(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let keyword = trimmed.get(..8)?;
    if keyword.eq_ignore_ascii_case("message:") {
        Some(&trimmed[8..])
    } else {
        None
    }
}

fn push_message(messages: &mut Vec<String>, line: &str) {
    if !line.is_blank() {
        messages.push(line.trim().to_string());
    }
}

/// Numbered raw lines belonging to each content block
type RawBlock<'a> = Vec<(usize, &'a str)>;

fn split_blocks<'a>(lines: &[&'a str], start: usize) -> Result<[RawBlock<'a>; 3]> {
    let mut blocks: [RawBlock<'a>; 3] = Default::default();
    let mut current = 0;
    let mut i = start;

    while i < lines.len() {
        if !lines[i].is_blank() {
            blocks[current].push((i + 1, lines[i]));
            i += 1;
            continue;
        }

        // measure the run of blank lines
        let run_start = i;
        while i < lines.len() && lines[i].is_blank() {
            i += 1;
        }

        if current == 2 {
            if i < lines.len() {
                debug!("Ignoring {} lines after the data block", lines.len() - i);
            }
            break;
        }

        let run = i - run_start;
        if run > 1 {
            return Err(Error::BadBlockSeparator {
                line: run_start + 2,
                reason: f!(
                    "{run} consecutive blank lines after the {} block, expected one",
                    [Block::Cells, Block::Surfaces][current]
                ),
            });
        }

        current += 1;
    }

    if current < 2 {
        return Err(Error::BadBlockSeparator {
            line: lines.len().max(1),
            reason: f!("deck ends after {} of 3 blocks", current + 1),
        });
    }

    Ok(blocks)
}

fn block_lines(block: Block, raw: &[(usize, &str)], fallback: usize) -> Result<Vec<LogicalLine>> {
    let lines = join_lines(raw);
    if lines.is_empty() {
        let line = raw.first().map_or(fallback, |(n, _)| *n);
        return Err(Error::EmptyBlock { block, line });
    }
    Ok(lines)
}

/// Join physical lines into logical lines
///
/// Comment cards are dropped, inline comments removed, and both `&` and
/// indented continuations appended to the card they continue.
fn join_lines(raw: &[(usize, &str)]) -> Vec<LogicalLine> {
    let mut logical: Vec<LogicalLine> = Vec::new();
    let mut explicit = false;

    for &(number, line) in raw {
        if is_comment(line) {
            trace!("{number:>6}: comment");
            continue;
        }

        let (content, comment) = split_inline_comment(line);
        let content = content.trim_end();
        if content.is_blank() {
            // nothing but an inline comment
            if let (Some(last), Some(comment)) = (logical.last_mut(), comment) {
                last.comments.push((number, comment.trim().to_string()));
            }
            continue;
        }

        // trailing ampersand continues onto the next card line
        let (body, ampersand) = match content.strip_suffix('&') {
            Some(body) => (body, true),
            None => (content, false),
        };

        let indented = line.indent_width() >= CONTINUATION_INDENT;
        match logical.last_mut() {
            Some(last) if explicit || indented => {
                trace!("{number:>6}: continuation");
                last.append(body, number);
            }
            _ => logical.push(LogicalLine::new(body, number)),
        }

        if let (Some(last), Some(comment)) = (logical.last_mut(), comment) {
            last.comments.push((number, comment.trim().to_string()));
        }
        explicit = ampersand;
    }

    logical
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn deck(body: &str) -> String {
        f!("title card\n{body}")
    }

    #[test]
    fn continuation_styles() {
        let raw = [
            (2, "1 0 -1 &"),
            (3, "c interleaved comment"),
            (4, "imp:n=1 $ explicit"),
            (5, "2 0 1"),
            (6, "      imp:n=0"),
            (7, "\tvol=1.0"),
        ];
        let lines = join_lines(&raw);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "1 0 -1 imp:n=1");
        assert_eq!(lines[0].span, Span::new(2, 4));
        assert_eq!(lines[0].comments, vec![(4, "explicit".to_string())]);
        assert_eq!(lines[1].text, "2 0 1 imp:n=0 vol=1.0");
        assert_eq!(lines[1].span, Span::new(5, 7));
    }

    #[test]
    fn indented_first_line_starts_a_card() {
        let lines = join_lines(&[(2, "      1 0 -1"), (3, "      imp:n=1")]);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "1 0 -1 imp:n=1");
    }

    #[test]
    fn message_block() {
        let text = "message: xsdir=/data/xsdir\n  outp=run.o\n\ntitle\n1 0 -1\n\n1 so 1\n\nnps 1\n";
        let segments = segment(text).unwrap();
        assert_eq!(segments.messages, vec!["xsdir=/data/xsdir", "outp=run.o"]);
        assert_eq!(segments.title, "title");
        assert_eq!(segments.title_line, 4);
        assert_eq!(segments.cells[0].span.start, 5);
    }

    #[test]
    fn trailing_text_is_ignored() {
        let segments = segment(&deck("1 0 -1\n\n1 so 1\n\nnps 1\n\nanything goes here\n")).unwrap();
        assert_eq!(segments.data.len(), 1);
    }

    #[test]
    fn missing_title() {
        let result = segment("\n1 0 -1\n\n1 so 1\n\nnps 1\n");
        assert!(matches!(result, Err(Error::MissingTitle { line: 1 })));
    }

    #[rstest]
    #[case("1 0 -1\n\n\n1 so 1\n\nnps 1\n", 4)] // doubled first delimiter
    #[case("1 0 -1\n\n1 so 1\n\n\nnps 1\n", 6)] // doubled second delimiter
    #[case("1 0 -1\n\n1 so 1\n", 4)] // no data block
    fn bad_separators(#[case] body: &str, #[case] line: usize) {
        match segment(&deck(body)) {
            Err(Error::BadBlockSeparator { line: found, .. }) => assert_eq!(found, line),
            other => panic!("expected a bad separator, found {other:?}"),
        }
    }

    #[rstest]
    #[case("c only comments\n\n1 so 1\n\nnps 1\n", Block::Cells)]
    #[case("1 0 -1\n\nc nothing\n\nnps 1\n", Block::Surfaces)]
    #[case("1 0 -1\n\n1 so 1\n\nc nothing\n", Block::Data)]
    fn empty_blocks(#[case] body: &str, #[case] expected: Block) {
        match segment(&deck(body)) {
            Err(Error::EmptyBlock { block, .. }) => assert_eq!(block, expected),
            other => panic!("expected an empty block, found {other:?}"),
        }
    }
}
