//! Restricted literal parser for model output.
//!
//! Accepts the list/tuple/string/number/bool/null subset of Python literal
//! syntax and nothing else. Input is never evaluated.

use thiserror::Error;

const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    List(Vec<Literal>),
    Tuple(Vec<Literal>),
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl Literal {
    pub fn kind(&self) -> &'static str {
        match self {
            Literal::List(_) => "list",
            Literal::Tuple(_) => "tuple",
            Literal::Str(_) => "string",
            Literal::Int(_) => "integer",
            Literal::Float(_) => "float",
            Literal::Bool(_) => "bool",
            Literal::Null => "null",
        }
    }

    /// Elements of a list or tuple.
    pub fn as_sequence(&self) -> Option<&[Literal]> {
        match self {
            Literal::List(v) | Literal::Tuple(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {offset}")]
pub struct LiteralError {
    pub offset: usize,
    pub message: String,
}

pub fn parse(input: &str) -> Result<Literal, LiteralError> {
    let mut p = Parser { src: input, pos: 0, depth: 0 };
    p.skip_trivia();
    let value = p.value()?;
    p.skip_trivia();
    if p.pos < p.src.len() {
        return Err(p.error("unexpected trailing input"));
    }
    Ok(value)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> LiteralError {
        LiteralError { offset: self.pos, message: message.into() }
    }

    /// Whitespace, newlines and `#` comments.
    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn value(&mut self) -> Result<Literal, LiteralError> {
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some('[') => self.sequence('[', ']').map(|(items, _)| Literal::List(items)),
            Some('(') => {
                let (mut items, trailing_comma) = self.sequence('(', ')')?;
                // `(x)` is just a parenthesized value, `(x,)` is a tuple
                if items.len() == 1 && !trailing_comma {
                    Ok(items.remove(0))
                } else {
                    Ok(Literal::Tuple(items))
                }
            }
            Some(_) if self.at_string_start() => self.strings(),
            Some(c) if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => self.number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.keyword(),
            Some(c) => Err(self.error(format!("unexpected character {c:?}"))),
        }
    }

    fn sequence(&mut self, open: char, close: char) -> Result<(Vec<Literal>, bool), LiteralError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        debug_assert_eq!(self.peek(), Some(open));
        self.bump();

        let mut items = Vec::new();
        let mut trailing_comma = false;
        loop {
            self.skip_trivia();
            if self.peek() == Some(close) {
                self.bump();
                break;
            }
            items.push(self.value()?);
            self.skip_trivia();
            match self.peek() {
                Some(',') => {
                    self.bump();
                    trailing_comma = true;
                }
                Some(c) if c == close => {
                    self.bump();
                    trailing_comma = false;
                    break;
                }
                Some(c) => return Err(self.error(format!("expected ',' or {close:?}, found {c:?}"))),
                None => return Err(self.error(format!("unclosed {open:?}"))),
            }
        }
        self.depth -= 1;
        Ok((items, trailing_comma))
    }

    fn at_string_start(&self) -> bool {
        let mut i = 0;
        while i < 2 {
            match self.peek_at(i) {
                Some('\'') | Some('"') => return true,
                Some('r' | 'R' | 'u' | 'U') => i += 1,
                _ => return false,
            }
        }
        false
    }

    /// One or more adjacent string literals, concatenated.
    fn strings(&mut self) -> Result<Literal, LiteralError> {
        let mut out = self.string()?;
        loop {
            let save = self.pos;
            self.skip_trivia();
            if self.at_string_start() {
                out.push_str(&self.string()?);
            } else {
                self.pos = save;
                return Ok(Literal::Str(out));
            }
        }
    }

    fn string(&mut self) -> Result<String, LiteralError> {
        let mut raw = false;
        while let Some(c @ ('r' | 'R' | 'u' | 'U')) = self.peek() {
            raw |= matches!(c, 'r' | 'R');
            self.bump();
        }
        let start = self.pos;
        let quote = match self.bump() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error("expected string quote")),
        };
        let triple = self.peek() == Some(quote) && self.peek_at(1) == Some(quote);
        if triple {
            self.bump();
            self.bump();
        }

        let mut out = String::new();
        loop {
            let c = match self.bump() {
                Some(c) => c,
                None => {
                    return Err(LiteralError { offset: start, message: "unterminated string".into() });
                }
            };
            if c == quote {
                if !triple {
                    return Ok(out);
                }
                if self.peek() == Some(quote) && self.peek_at(1) == Some(quote) {
                    self.bump();
                    self.bump();
                    return Ok(out);
                }
                out.push(c);
                continue;
            }
            match c {
                '\n' if !triple => return Err(self.error("newline in single-quoted string")),
                '\\' if raw => {
                    // raw strings keep the backslash but still cannot end on an escaped quote
                    out.push('\\');
                    if let Some(n) = self.bump() {
                        out.push(n);
                    }
                }
                '\\' => self.escape(&mut out)?,
                _ => out.push(c),
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<(), LiteralError> {
        let c = self.bump().ok_or_else(|| self.error("dangling escape"))?;
        match c {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0C}'),
            'v' => out.push('\u{0B}'),
            'x' => out.push(self.hex_escape(2)?),
            'u' => out.push(self.hex_escape(4)?),
            'U' => out.push(self.hex_escape(8)?),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn hex_escape(&mut self, len: usize) -> Result<char, LiteralError> {
        let digits: String = self.rest().chars().take(len).collect();
        if digits.len() != len || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(self.error("invalid hex escape"));
        }
        self.pos += len;
        u32::from_str_radix(&digits, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error("escape is not a valid code point"))
    }

    fn number(&mut self) -> Result<Literal, LiteralError> {
        let start = self.pos;
        if matches!(self.peek(), Some('-' | '+')) {
            self.bump();
        }
        let mut is_float = false;
        let mut digits = 0;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => digits += 1,
                '_' => {}
                '.' if !is_float => is_float = true,
                'e' | 'E' if digits > 0 => {
                    is_float = true;
                    self.bump();
                    if matches!(self.peek(), Some('-' | '+')) {
                        self.bump();
                    }
                    continue;
                }
                _ => break,
            }
            self.bump();
        }
        if digits == 0 {
            return Err(LiteralError { offset: start, message: "malformed number".into() });
        }
        let text: String = self.src[start..self.pos].chars().filter(|c| *c != '_').collect();
        let bad = || LiteralError { offset: start, message: format!("malformed number {text:?}") };
        if is_float {
            text.parse::<f64>().map(Literal::Float).map_err(|_| bad())
        } else {
            text.parse::<i64>().map(Literal::Int).map_err(|_| bad())
        }
    }

    fn keyword(&mut self) -> Result<Literal, LiteralError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.bump();
        }
        match &self.src[start..self.pos] {
            "True" | "true" => Ok(Literal::Bool(true)),
            "False" | "false" => Ok(Literal::Bool(false)),
            "None" | "null" => Ok(Literal::Null),
            word => Err(LiteralError { offset: start, message: format!("unexpected identifier {word:?}") }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(items: &[&str]) -> Literal {
        Literal::List(items.iter().map(|s| Literal::Str(s.to_string())).collect())
    }

    #[test]
    fn parses_python_style_string_list() {
        let got = parse("['index.html', \"styles.css\", 'app.js']").expect("parse");
        assert_eq!(got, strs(&["index.html", "styles.css", "app.js"]));
    }

    #[test]
    fn tolerates_whitespace_newlines_and_trailing_comma() {
        let got = parse("\n[\n  'a.py',\n  'b/c.py',  # entry point\n]\n").expect("parse");
        assert_eq!(got, strs(&["a.py", "b/c.py"]));
    }

    #[test]
    fn tuples_and_parenthesized_values() {
        assert_eq!(parse("('a',)").expect("parse"), Literal::Tuple(vec![Literal::Str("a".into())]));
        assert_eq!(parse("('a')").expect("parse"), Literal::Str("a".into()));
        assert_eq!(parse("()").expect("parse"), Literal::Tuple(vec![]));
    }

    #[test]
    fn scalars() {
        assert_eq!(parse("-42").expect("parse"), Literal::Int(-42));
        assert_eq!(parse("1_000").expect("parse"), Literal::Int(1000));
        assert_eq!(parse("2.5e3").expect("parse"), Literal::Float(2500.0));
        assert_eq!(parse("True").expect("parse"), Literal::Bool(true));
        assert_eq!(parse("null").expect("parse"), Literal::Null);
    }

    #[test]
    fn string_escapes_and_concatenation() {
        assert_eq!(parse(r"'it\'s\n'").expect("parse"), Literal::Str("it's\n".into()));
        assert_eq!(parse(r"'\x41é'").expect("parse"), Literal::Str("Aé".into()));
        assert_eq!(parse(r"r'a\d'").expect("parse"), Literal::Str("a\\d".into()));
        assert_eq!(parse("'ab' \"cd\"").expect("parse"), Literal::Str("abcd".into()));
        assert_eq!(parse("'''multi\nline'''").expect("parse"), Literal::Str("multi\nline".into()));
    }

    #[test]
    fn rejects_code_and_prose() {
        assert!(parse("__import__('os').system('rm -rf /')").is_err());
        assert!(parse("Here are the files: ['a.js']").is_err());
        assert!(parse("['a.js'] and more").is_err());
        assert!(parse("['a.js' 'b.js',").is_err());
        assert!(parse("['a.js', os.path]").is_err());
        assert!(parse("").is_err());
        assert!(parse("'unterminated").is_err());
        assert!(parse("{'a': 1}").is_err());
    }

    #[test]
    fn deep_nesting_is_bounded() {
        let deep = "[".repeat(MAX_DEPTH + 1) + &"]".repeat(MAX_DEPTH + 1);
        assert!(parse(&deep).is_err());
        let ok = "[".repeat(8) + &"]".repeat(8);
        assert!(parse(&ok).is_ok());
    }

    #[test]
    fn error_reports_offset() {
        let err = parse("[1, ?]").expect_err("should fail");
        assert_eq!(err.offset, 4);
    }
}
