// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::fmt::{self, Debug, Formatter};
use core::iter::Peekable;
use core::ops::Range;
use core::str::CharIndices;

use crate::error::RuleSyntaxError;
use crate::Rc;

struct SourceText {
    name: String,
    text: String,
    // Byte range of every line, line terminator excluded.
    lines: Vec<Range<usize>>,
}

/// Rule text together with its line table, shared by every span cut from it.
#[derive(Clone)]
pub struct Source {
    inner: Rc<SourceText>,
}

impl PartialEq for Source {
    fn eq(&self, other: &Source) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Source {}

impl Debug for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.name)
    }
}

impl Source {
    pub fn from_contents(name: String, contents: String) -> Result<Source, RuleSyntaxError> {
        // Offsets and columns are stored as u32.
        if u32::try_from(contents.len() + 1).is_err() {
            return Err(RuleSyntaxError::new(format!("{name} is too large")));
        }

        let mut lines = vec![];
        let mut offset = 0;
        for line in contents.split_inclusive('\n') {
            let body = line.strip_suffix('\n').unwrap_or(line);
            let body = body.strip_suffix('\r').unwrap_or(body);
            lines.push(offset..offset + body.len());
            offset += line.len();
        }
        if lines.is_empty() || contents.ends_with('\n') {
            lines.push(offset..offset);
        }

        Ok(Self {
            inner: Rc::new(SourceText {
                name,
                text: contents,
                lines,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn contents(&self) -> &str {
        &self.inner.text
    }

    /// Text of the 1-based `line`, if there is one.
    pub fn line(&self, line: u32) -> Option<&str> {
        let range = self.inner.lines.get((line as usize).checked_sub(1)?)?;
        self.inner.text.get(range.clone())
    }

    /// Render `msg` under the offending line with a caret at `col`.
    pub fn message(&self, line: u32, col: u32, kind: &str, msg: &str) -> String {
        let name = self.name();
        let Some(text) = self.line(line) else {
            return format!("{name}: no line {line}\n{kind}: {msg}");
        };
        let width = line.to_string().len() + 1;
        let gutter = " ".repeat(width);
        let indent = " ".repeat((col as usize).saturating_sub(1));
        format!("\n--> {name}:{line}:{col}\n{gutter}|\n{line:<width$}| {text}\n{gutter}| {indent}^\n{kind}: {msg}")
    }

    /// Error at a single position, for text that never became a token.
    pub fn error(&self, line: u32, col: u32, start: u32, msg: &str) -> RuleSyntaxError {
        let at = Span {
            source: self.clone(),
            line,
            col,
            start,
            end: start,
        };
        RuleSyntaxError::at(&at, msg)
    }
}

/// Location of a piece of rule text. Lines and columns are 1-based, `start`
/// and `end` are byte offsets.
#[derive(Clone, PartialEq, Eq)]
pub struct Span {
    pub source: Source,
    pub line: u32,
    pub col: u32,
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn text(&self) -> &str {
        self.source
            .contents()
            .get(self.start as usize..self.end as usize)
            .unwrap_or_default()
    }

    /// Span running from the start of `self` to the end of `other`.
    pub fn to(&self, other: &Span) -> Span {
        Span {
            end: self.end.max(other.end),
            ..self.clone()
        }
    }

    pub fn message(&self, kind: &str, msg: &str) -> String {
        self.source.message(self.line, self.col, kind, msg)
    }

    pub fn error(&self, msg: &str) -> RuleSyntaxError {
        RuleSyntaxError::at(self, msg)
    }
}

impl Debug for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        const MAX: usize = 32;
        let text = self.text();
        match text.char_indices().nth(MAX) {
            Some((cut, _)) => write!(f, "{}:{} {:?}...", self.line, self.col, &text[..cut]),
            None => write!(f, "{}:{} {:?}", self.line, self.col, text),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TokenKind {
    Symbol,
    String,
    Number,
    Ident,
    DateTime,
    TimeDelta,
    Eof,
}

/// A token and the span of its text. For quoted tokens the span excludes
/// the prefix and the quotes.
#[derive(Debug, Clone)]
pub struct Token(pub TokenKind, pub Span);

#[derive(Clone)]
pub struct Lexer<'source> {
    source: Source,
    iter: Peekable<CharIndices<'source>>,
    line: u32,
    col: u32,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source Source) -> Self {
        Self {
            source: source.clone(),
            iter: source.contents().char_indices().peekable(),
            line: 1,
            col: 1,
        }
    }

    fn peek(&mut self) -> (usize, char) {
        match self.iter.peek() {
            Some((index, chr)) => (*index, *chr),
            _ => (self.source.contents().len(), '\x00'),
        }
    }

    fn peekahead(&mut self, n: usize) -> (usize, char) {
        match self.iter.clone().nth(n) {
            Some((index, chr)) => (index, chr),
            _ => (self.source.contents().len(), '\x00'),
        }
    }

    fn span(&self, line: u32, col: u32, start: usize, end: usize) -> Span {
        Span {
            source: self.source.clone(),
            line,
            col,
            start: start as u32,
            end: end as u32,
        }
    }

    fn read_ident(&mut self) -> Result<Token, RuleSyntaxError> {
        let (start, col) = (self.peek().0, self.col);
        let end = self.eat_while(|ch| ch == '_' || ch.is_ascii_alphanumeric());
        self.col += (end - start) as u32;
        Ok(Token(TokenKind::Ident, self.span(self.line, col, start, end)))
    }

    // Consumes characters while `pred` holds and returns the offset reached.
    fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> usize {
        while self.iter.next_if(|&(_, ch)| pred(ch)).is_some() {}
        self.peek().0
    }

    // Numbers are `0` or a non-zero digit run, an optional fraction and an
    // optional exponent. A trailing '.' without digits is left for the parser.
    fn read_number(&mut self) -> Result<Token, RuleSyntaxError> {
        let (start, first) = self.peek();
        let col = self.col;
        self.iter.next();
        if first != '0' {
            self.eat_while(|ch| ch.is_ascii_digit());
        }

        if self.peek().1 == '.' && self.peekahead(1).1.is_ascii_digit() {
            self.iter.next();
            self.eat_while(|ch| ch.is_ascii_digit());
        }

        if matches!(self.peek().1, 'e' | 'E') {
            self.iter.next();
            self.iter.next_if(|&(_, ch)| ch == '+' || ch == '-');
            let (at, digit) = self.peek();
            if !digit.is_ascii_digit() {
                let at_col = col + (at - start) as u32;
                return Err(self.source.error(
                    self.line,
                    at_col,
                    at as u32,
                    "invalid number: missing exponent digits",
                ));
            }
            self.eat_while(|ch| ch.is_ascii_digit());
        }

        let (end, next) = self.peek();
        self.col += (end - start) as u32;
        if next == '_' || next.is_ascii_alphanumeric() {
            return Err(self
                .source
                .error(self.line, self.col, end as u32, "invalid number"));
        }
        Ok(Token(TokenKind::Number, self.span(self.line, col, start, end)))
    }

    // Reads a quoted string starting at the opening quote. Escapes are only
    // validated here, `unescape` decodes them once the token is accepted.
    fn read_string(&mut self, kind: TokenKind) -> Result<Token, RuleSyntaxError> {
        let (line, col) = (self.line, self.col);
        let (open, quote) = self.peek();
        self.iter.next();
        let start = open + quote.len_utf8();
        let col_of = |offset: usize| col + 1 + (offset - start) as u32;

        let end = loop {
            let Some((offset, ch)) = self.iter.next() else {
                return Err(self.unterminated(line, col, open, quote));
            };
            match ch {
                c if c == quote => break offset,
                '\n' => return Err(self.unterminated(line, col, open, quote)),
                '\\' => match self.iter.next() {
                    Some((_, '"' | '\'' | '\\' | '/' | '0' | 'b' | 'f' | 'n' | 'r' | 't')) => (),
                    Some((_, 'u')) => {
                        for _ in 0..4 {
                            let (at, digit) = self.peek();
                            if !digit.is_ascii_hexdigit() {
                                return Err(self.source.error(
                                    line,
                                    col_of(at),
                                    at as u32,
                                    "invalid hex escape sequence",
                                ));
                            }
                            self.iter.next();
                        }
                    }
                    _ => {
                        return Err(self.source.error(
                            line,
                            col_of(offset),
                            offset as u32,
                            "invalid escape sequence",
                        ))
                    }
                },
                _ => (),
            }
        };

        self.col = col_of(end) + 1;
        Ok(Token(kind, self.span(line, col + 1, start, end)))
    }

    fn unterminated(&self, line: u32, col: u32, open: usize, quote: char) -> RuleSyntaxError {
        self.source.error(
            line,
            col,
            open as u32,
            &format!("unterminated string, unmatched {quote}"),
        )
    }

    // Skips blanks, line breaks and `#` comments. A tab counts as four columns.
    fn skip_ws(&mut self) -> Result<(), RuleSyntaxError> {
        loop {
            let (offset, ch) = self.peek();
            match ch {
                ' ' => self.col += 1,
                '\t' => self.col += 4,
                '\n' => {
                    self.line += 1;
                    self.col = 1;
                }
                '\r' if self.peekahead(1).1 == '\n' => (),
                '\r' => {
                    return Err(self.source.error(
                        self.line,
                        self.col,
                        offset as u32,
                        "\\r must be followed by \\n",
                    ))
                }
                '#' => {
                    self.eat_while(|ch| ch != '\n');
                    continue;
                }
                _ => return Ok(()),
            }
            self.iter.next();
        }
    }

    fn symbol(&mut self, start: usize, col: u32, len: usize) -> Result<Token, RuleSyntaxError> {
        for _ in 0..len {
            self.iter.next();
        }
        self.col += len as u32;
        Ok(Token(
            TokenKind::Symbol,
            self.span(self.line, col, start, start + len),
        ))
    }

    pub fn next_token(&mut self) -> Result<Token, RuleSyntaxError> {
        self.skip_ws()?;

        let (start, chr) = self.peek();
        let col = self.col;

        match chr {
            '\x00' if start >= self.source.contents().len() => Ok(Token(
                TokenKind::Eof,
                self.span(self.line, col, start, start),
            )),
            // grouping characters
            '{' | '}' | '[' | ']' | '(' | ')' |
            // arith operators
            '+' | '-' | '/' | '%' |
            // separators
            ',' | '.' | ':' => self.symbol(start, col, 1),
            // * **
            '*' => {
                let len = if self.peekahead(1).1 == '*' { 2 } else { 1 };
                self.symbol(start, col, len)
            }
            // < <= > >=
            '<' | '>' => {
                let len = if self.peekahead(1).1 == '=' { 2 } else { 1 };
                self.symbol(start, col, len)
            }
            // == =~ =~~
            '=' => match (self.peekahead(1).1, self.peekahead(2).1) {
                ('=', _) => self.symbol(start, col, 2),
                ('~', '~') => self.symbol(start, col, 3),
                ('~', _) => self.symbol(start, col, 2),
                _ => Err(self.source.error(
                    self.line,
                    col,
                    start as u32,
                    "invalid operator '=', use '==' for equality",
                )),
            },
            // != !~ !~~
            '!' => match (self.peekahead(1).1, self.peekahead(2).1) {
                ('=', _) => self.symbol(start, col, 2),
                ('~', '~') => self.symbol(start, col, 3),
                ('~', _) => self.symbol(start, col, 2),
                _ => Err(self.source.error(
                    self.line,
                    col,
                    start as u32,
                    "invalid operator '!', use 'not' for negation",
                )),
            },
            '"' | '\'' => self.read_string(TokenKind::String),
            'd' | 't' if matches!(self.peekahead(1).1, '"' | '\'') => {
                let kind = if chr == 'd' {
                    TokenKind::DateTime
                } else {
                    TokenKind::TimeDelta
                };
                self.iter.next();
                self.col += 1;
                self.read_string(kind)
            }
            _ if chr.is_ascii_digit() => self.read_number(),
            _ if chr.is_ascii_alphabetic() || chr == '_' => self.read_ident(),
            _ => Err(self
                .source
                .error(self.line, self.col, start as u32, "invalid character")),
        }
    }
}

/// Decode the escape sequences of a string token.
pub fn unescape(span: &Span) -> Result<String, RuleSyntaxError> {
    let text = span.text();
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let decoded = match chars.next() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('r') => '\r',
            Some('b') => '\x08',
            Some('f') => '\x0c',
            Some('0') => '\0',
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| span.error(&format!("invalid unicode escape \\u{hex}")))?
            }
            Some(c) => c,
            None => return Err(span.error("dangling escape character")),
        };
        out.push(decoded);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> Result<Vec<(TokenKind, String)>, RuleSyntaxError> {
        let source = Source::from_contents("<rule>".to_string(), text.to_string())?;
        let mut lexer = Lexer::new(&source);
        let mut out = vec![];
        loop {
            let Token(kind, span) = lexer.next_token()?;
            if kind == TokenKind::Eof {
                break;
            }
            out.push((kind, span.text().to_string()));
        }
        Ok(out)
    }

    #[test]
    fn operators_are_maximal_munch() {
        let toks = tokens("a ** b =~~ c !~ d <= e != f").unwrap();
        let texts: Vec<&str> = toks.iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(
            texts,
            ["a", "**", "b", "=~~", "c", "!~", "d", "<=", "e", "!=", "f"]
        );
    }

    #[test]
    fn prefixed_literals() {
        let toks = tokens("d'2024-01-01' t\"P1D\" d").unwrap();
        assert_eq!(toks[0], (TokenKind::DateTime, "2024-01-01".to_string()));
        assert_eq!(toks[1], (TokenKind::TimeDelta, "P1D".to_string()));
        assert_eq!(toks[2], (TokenKind::Ident, "d".to_string()));
    }

    #[test]
    fn comments_are_skipped() {
        let toks = tokens("a # trailing comment\n== 1").unwrap();
        assert_eq!(toks.len(), 3);
    }

    #[test]
    fn unterminated_string_reports_position() {
        let err = tokens("name == 'abc").unwrap_err();
        assert_eq!(err.position(), Some((1, 9)));
        assert!(err.message().contains("unterminated"));
    }

    #[test]
    fn invalid_characters() {
        assert!(tokens("a = 1").is_err());
        assert!(tokens("a $ 1").is_err());
        assert!(tokens("12abc").is_err());
        assert!(tokens("1e").is_err());
    }

    #[test]
    fn escapes_are_decoded() {
        let source = Source::from_contents("<rule>".to_string(), r"'a\n\'bA'".to_string())
            .unwrap();
        let mut lexer = Lexer::new(&source);
        let Token(kind, span) = lexer.next_token().unwrap();
        assert_eq!(kind, TokenKind::String);
        assert_eq!(unescape(&span).unwrap(), "a\n'bA");
    }
}
