use num_bigint::BigInt;

use crate::error::{LispError, LispResult};
use crate::input::LineSource;

/// A literal atom as it appears in source text.
#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    Nil,
    Int(i64),
    BigInt(BigInt),
    Float(f64),
    Str(String),
    /// Plain symbol or `:keyword`, name as written.
    Symbol(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
    Quote,
    BackQuote,
    Comma,
    CommaAt,
    Tilde,
    Atom(Atom),
    Eof,
}

/// Characters that may appear in a symbol besides letters and digits.
const SYMBOL_PUNCT: &str = "_&$*/%+-<>=!?";

pub fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || SYMBOL_PUNCT.contains(c)
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || "()[]'\"`,~;".contains(c)
}

/// Tokenizer over a line source with one character of lookahead.
/// Every line gets a trailing `\n` so tokens never straddle a fetch.
pub struct Lexer {
    source: Box<dyn LineSource>,
    line: Vec<char>,
    pos: usize,
    line_number: usize,
    prompt: bool,
    at_eof: bool,
}

impl Lexer {
    pub fn new(source: Box<dyn LineSource>) -> Self {
        Lexer {
            source,
            line: Vec::new(),
            pos: 0,
            line_number: 0,
            prompt: true,
            at_eof: false,
        }
    }

    /// The next line fetched will be the first of a new top-level form.
    pub fn begin_form(&mut self) {
        self.prompt = true;
    }

    /// Drop whatever is left of the current line.
    pub fn skip_line(&mut self) {
        self.pos = self.line.len();
    }

    pub fn close(&mut self) -> std::io::Result<()> {
        self.source.close()
    }

    /// A syntax error pointing at the current line.
    pub fn error(&self, message: impl Into<String>) -> LispError {
        let text: String = self.line.iter().collect();
        LispError::syntax(message, self.line_number, text.trim_end_matches('\n'))
    }

    fn peek(&mut self) -> LispResult<Option<char>> {
        while self.pos >= self.line.len() {
            if self.at_eof {
                return Ok(None);
            }
            match self.source.read_line(self.prompt)? {
                Some(text) => {
                    self.line = text.chars().collect();
                    self.line.push('\n');
                    self.pos = 0;
                    self.line_number += 1;
                    self.prompt = false;
                }
                None => {
                    self.at_eof = true;
                    return Ok(None);
                }
            }
        }
        Ok(Some(self.line[self.pos]))
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    pub fn next_token(&mut self) -> LispResult<Token> {
        let c = loop {
            match self.peek()? {
                None => return Ok(Token::Eof),
                Some(';') => self.skip_line(),
                Some(c) if c.is_whitespace() => self.bump(),
                Some(c) => break c,
            }
        };
        let single = match c {
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            '[' => Some(Token::LBracket),
            ']' => Some(Token::RBracket),
            '\'' => Some(Token::Quote),
            '`' => Some(Token::BackQuote),
            '~' => Some(Token::Tilde),
            _ => None,
        };
        if let Some(token) = single {
            self.bump();
            return Ok(token);
        }
        match c {
            ',' => {
                self.bump();
                if self.peek()? == Some('@') {
                    self.bump();
                    Ok(Token::CommaAt)
                } else {
                    Ok(Token::Comma)
                }
            }
            '"' => {
                self.bump();
                self.string()
            }
            '.' => {
                self.bump();
                Ok(Token::Dot)
            }
            _ => self.word(),
        }
    }

    fn string(&mut self) -> LispResult<Token> {
        let mut text = String::new();
        loop {
            match self.peek()? {
                None | Some('\n') => return Err(self.error("string not terminated")),
                Some('"') => {
                    self.bump();
                    return Ok(Token::Atom(Atom::Str(text)));
                }
                Some('\\') => {
                    self.bump();
                    let c = self.escape()?;
                    text.push(c);
                }
                Some(c) => {
                    self.bump();
                    text.push(c);
                }
            }
        }
    }

    fn escape(&mut self) -> LispResult<char> {
        let Some(c) = self.peek()? else {
            return Err(self.error("string not terminated"));
        };
        let simple = match c {
            '"' => Some('"'),
            '\\' => Some('\\'),
            'a' => Some('\x07'),
            'b' => Some('\x08'),
            'f' => Some('\x0c'),
            'n' => Some('\n'),
            'r' => Some('\r'),
            't' => Some('\t'),
            'v' => Some('\x0b'),
            _ => None,
        };
        if let Some(decoded) = simple {
            self.bump();
            return Ok(decoded);
        }
        let (radix, max_digits) = match c {
            '0'..='7' => (8, 3),
            'x' => {
                self.bump();
                (16, 2)
            }
            _ => return Err(self.error("bad escape")),
        };
        let mut code = 0u32;
        let mut digits = 0;
        while digits < max_digits {
            match self.peek()?.and_then(|d| d.to_digit(radix)) {
                Some(d) => {
                    code = code * radix + d;
                    digits += 1;
                    self.bump();
                }
                None => break,
            }
        }
        if digits == 0 {
            return Err(self.error("bad escape"));
        }
        char::from_u32(code).ok_or_else(|| self.error("bad escape"))
    }

    fn word(&mut self) -> LispResult<Token> {
        let mut text = String::new();
        while let Some(c) = self.peek()? {
            if is_delimiter(c) {
                break;
            }
            text.push(c);
            self.bump();
        }
        classify(&text)
            .map(Token::Atom)
            .ok_or_else(|| self.error(format!("bad token: {}", text)))
    }
}

/// Decide what a run of non-delimiter characters denotes.
fn classify(text: &str) -> Option<Atom> {
    if text == "nil" {
        return Some(Atom::Nil);
    }
    if let Some(number) = parse_number(text) {
        return Some(number);
    }
    let name = text.strip_prefix(':').unwrap_or(text);
    if !name.is_empty() && name.chars().all(is_symbol_char) {
        return Some(Atom::Symbol(text.to_string()));
    }
    None
}

/// Parse a numeric literal: an optional sign, an optional `#b`/`#o`/`#x`
/// radix prefix in either case, then digits. Integers too wide for `i64`
/// become bignums. Decimal text that is not an integer may still be a float.
pub fn parse_number(text: &str) -> Option<Atom> {
    let (negative, body) = match text.as_bytes().first() {
        Some(b'-') if text.len() > 1 => (true, &text[1..]),
        Some(b'+') if text.len() > 1 => (false, &text[1..]),
        _ => (false, text),
    };
    let (radix, digits) = match body.as_bytes() {
        [b'#', b'b' | b'B', _, ..] => (2, &body[2..]),
        [b'#', b'o' | b'O', _, ..] => (8, &body[2..]),
        [b'#', b'x' | b'X', _, ..] => (16, &body[2..]),
        _ => (10, body),
    };
    if !digits.is_empty() && digits.chars().all(|c| c.is_digit(radix)) {
        let signed = if negative {
            format!("-{}", digits)
        } else {
            digits.to_string()
        };
        if let Ok(n) = i64::from_str_radix(&signed, radix) {
            return Some(Atom::Int(n));
        }
        return BigInt::parse_bytes(signed.as_bytes(), radix).map(Atom::BigInt);
    }
    if radix == 10 && looks_like_float(text) {
        return text.parse::<f64>().ok().map(Atom::Float);
    }
    None
}

fn looks_like_float(text: &str) -> bool {
    let first_ok = text
        .chars()
        .next()
        .map_or(false, |c| c.is_ascii_digit() || "+-.".contains(c));
    first_ok
        && text.chars().any(|c| c.is_ascii_digit())
        && text.chars().any(|c| matches!(c, '.' | 'e' | 'E'))
        && text.chars().all(|c| c.is_ascii_digit() || "+-.eE".contains(c))
}
