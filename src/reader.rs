use std::collections::VecDeque;

use crate::error::{LispError, LispResult};
use crate::heap::Heap;
use crate::input::LineSource;
use crate::lexer::{Atom, Lexer, Token};
use crate::symbol::SymbolTable;
use crate::value::Value;

/// Parsed source before it is moved into the heap. Unquote markers only
/// exist here; quasiquote expansion removes them before lowering.
#[derive(Debug, Clone, PartialEq)]
enum Form {
    Atom(Atom),
    /// Non-empty list, with an optional non-nil dotted tail.
    List(Vec<Form>, Option<Box<Form>>),
    Vector(Vec<Form>),
    Unquote(Box<Form>),
    Splice(Box<Form>),
}

impl Form {
    fn nil() -> Form {
        Form::Atom(Atom::Nil)
    }

    fn symbol(name: &str) -> Form {
        Form::Atom(Atom::Symbol(name.to_string()))
    }

    fn is_nil(&self) -> bool {
        matches!(self, Form::Atom(Atom::Nil))
    }

    /// `(name x)`
    fn wrap(name: &str, inner: Form) -> Form {
        Form::List(vec![Form::symbol(name), inner], None)
    }

    /// Build a list, splicing a list-shaped tail and dropping a nil one.
    fn list(mut items: Vec<Form>, tail: Option<Form>) -> Form {
        let tail = match tail {
            Some(Form::List(more, rest)) => {
                items.extend(more);
                rest
            }
            Some(tail) if tail.is_nil() => None,
            Some(tail) => Some(Box::new(tail)),
            None => None,
        };
        if items.is_empty() {
            return tail.map_or_else(Form::nil, |t| *t);
        }
        Form::List(items, tail)
    }
}

/// True for a proper call form `(name ...)`.
fn is_call(items: &[Form], name: &str) -> bool {
    matches!(items.first(), Some(Form::Atom(Atom::Symbol(s))) if s == name)
}

/// Reads top-level forms from a line source.
pub struct Reader {
    lexer: Lexer,
    erred: bool,
}

impl Reader {
    pub fn new(source: Box<dyn LineSource>) -> Self {
        Reader {
            lexer: Lexer::new(source),
            erred: false,
        }
    }

    /// Read one form, or `Value::Eof` at end of input. After a syntax error
    /// the rest of the offending line is discarded on the next call.
    pub fn read(&mut self, heap: &mut Heap, symbols: &mut SymbolTable) -> LispResult<Value> {
        self.lexer.begin_form();
        if self.erred {
            self.erred = false;
            self.lexer.skip_line();
        }
        let result = self.read_form().and_then(|form| match form {
            None => Ok(Value::Eof),
            Some(form) => lower(form, heap, symbols).map_err(|msg| self.lexer.error(msg)),
        });
        if let Err(err) = &result {
            if !matches!(err.kind, crate::error::ErrorKind::Io(_)) {
                log::warn!("{}; skipping rest of line", err.message());
                self.erred = true;
            }
        }
        result
    }

    pub fn close(&mut self) -> std::io::Result<()> {
        self.lexer.close()
    }

    fn read_form(&mut self) -> LispResult<Option<Form>> {
        match self.lexer.next_token()? {
            Token::Eof => Ok(None),
            token => self.parse(token).map(Some),
        }
    }

    fn parse_next(&mut self) -> LispResult<Form> {
        let token = self.lexer.next_token()?;
        self.parse(token)
    }

    fn parse(&mut self, token: Token) -> LispResult<Form> {
        match token {
            Token::Atom(atom) => Ok(Form::Atom(atom)),
            Token::LParen => self.parse_list(),
            Token::LBracket => self.parse_vector(),
            Token::Quote => Ok(Form::wrap("quote", self.parse_next()?)),
            Token::Tilde => Ok(Form::wrap("delay", self.parse_next()?)),
            Token::BackQuote => Ok(quasi::expand(self.parse_next()?)),
            Token::Comma => Ok(Form::Unquote(Box::new(self.parse_next()?))),
            Token::CommaAt => Ok(Form::Splice(Box::new(self.parse_next()?))),
            Token::RParen => Err(self.lexer.error("unexpected \")\"")),
            Token::RBracket => Err(self.lexer.error("unexpected \"]\"")),
            Token::Dot => Err(self.lexer.error("unexpected \".\"")),
            Token::Eof => Err(self.lexer.error("unexpected EOF")),
        }
    }

    fn parse_list(&mut self) -> LispResult<Form> {
        let mut items = Vec::new();
        loop {
            match self.lexer.next_token()? {
                Token::RParen => return Ok(Form::list(items, None)),
                Token::Dot if !items.is_empty() => {
                    let tail = self.parse_next()?;
                    return match self.lexer.next_token()? {
                        Token::RParen => Ok(Form::list(items, Some(tail))),
                        Token::Eof => Err(self.lexer.error("unexpected EOF")),
                        _ => Err(self.lexer.error("\")\" expected")),
                    };
                }
                token => items.push(self.parse(token)?),
            }
        }
    }

    fn parse_vector(&mut self) -> LispResult<Form> {
        let mut items = Vec::new();
        loop {
            match self.lexer.next_token()? {
                Token::RBracket => return Ok(Form::Vector(items)),
                token => items.push(self.parse(token)?),
            }
        }
    }
}

/// Move a parsed form into the heap.
fn lower(form: Form, heap: &mut Heap, symbols: &mut SymbolTable) -> Result<Value, String> {
    let oom = |e: LispError| e.message();
    Ok(match form {
        Form::Atom(Atom::Nil) => Value::Nil,
        Form::Atom(Atom::Int(n)) => Value::Int(n),
        Form::Atom(Atom::BigInt(n)) => heap.alloc_bigint(n),
        Form::Atom(Atom::Float(x)) => Value::Float(x),
        Form::Atom(Atom::Str(s)) => heap.alloc_string(s),
        Form::Atom(Atom::Symbol(name)) => Value::Symbol(symbols.intern(&name)),
        Form::List(items, tail) => {
            let mut list = match tail {
                Some(tail) => lower(*tail, heap, symbols)?,
                None => Value::Nil,
            };
            for item in items.into_iter().rev() {
                let car = lower(item, heap, symbols)?;
                list = heap.cons(car, list).map_err(oom)?;
            }
            list
        }
        Form::Vector(items) => {
            let values = items
                .into_iter()
                .map(|item| lower(item, heap, symbols))
                .collect::<Result<Vec<_>, _>>()?;
            heap.alloc_vector(values)
        }
        Form::Unquote(_) => return Err("unquote outside quasiquote".into()),
        Form::Splice(_) => return Err("unquote-splicing outside quasiquote".into()),
    })
}

/// Quasiquote expansion: rewrite a template into `append`/`list`/`cons`
/// calls at read time.
mod quasi {
    use super::*;

    pub(super) fn expand(x: Form) -> Form {
        match x {
            Form::List(items, tail) => {
                let mut args = expand_items(items, tail);
                if args.len() == 1 {
                    if let Some(Form::List(call, None)) = args.front() {
                        if is_call(call, "list") || is_call(call, "cons") {
                            return args.pop_front().unwrap_or_else(Form::nil);
                        }
                    }
                }
                let mut call = vec![Form::symbol("append")];
                call.extend(args);
                Form::List(call, None)
            }
            Form::Unquote(inner) => *inner,
            other => quote(other),
        }
    }

    /// Only symbols and lists need quoting; other atoms evaluate to themselves.
    fn quote(x: Form) -> Form {
        match x {
            Form::Atom(Atom::Symbol(_)) | Form::List(..) => Form::wrap("quote", x),
            other => other,
        }
    }

    /// The argument list for `append`, one entry per element, built from
    /// the tail end so each element sees the already-expanded rest.
    fn expand_items(items: Vec<Form>, tail: Option<Box<Form>>) -> VecDeque<Form> {
        let mut args = VecDeque::new();
        args.push_back(match tail.map(|t| *t) {
            None => Form::nil(),
            Some(Form::Unquote(inner)) => *inner,
            Some(other) => quote(other),
        });
        for item in items.into_iter().rev() {
            args = combine(element(item), args);
        }
        args
    }

    fn element(x: Form) -> Form {
        match x {
            Form::Unquote(inner) => Form::List(vec![Form::symbol("list"), *inner], None),
            Form::Splice(inner) => *inner,
            other => Form::List(vec![Form::symbol("list"), expand(other)], None),
        }
    }

    /// Prepend `head` to `rest`, merging adjacent `list` calls and turning
    /// `(list a ...)` before a non-list into nested `cons`.
    fn combine(head: Form, mut rest: VecDeque<Form>) -> VecDeque<Form> {
        if rest.len() == 1 && rest.front().map_or(false, Form::is_nil) {
            rest.clear();
            rest.push_back(head);
            return rest;
        }
        match head {
            Form::List(mut call, None) if is_call(&call, "list") => {
                if let Some(Form::List(next, None)) = rest.front_mut() {
                    if is_call(next, "list") {
                        call.extend(next.drain(1..));
                        rest[0] = Form::List(call, None);
                        return rest;
                    }
                }
                if call.len() > 1 {
                    let first = rest.pop_front().unwrap_or_else(Form::nil);
                    let args = call.split_off(1);
                    rest.push_front(cons_chain(args, first));
                } else {
                    rest.push_front(Form::List(call, None));
                }
                rest
            }
            other => {
                rest.push_front(other);
                rest
            }
        }
    }

    fn cons_chain(args: Vec<Form>, tail: Form) -> Form {
        args.into_iter().rev().fold(tail, |acc, arg| {
            Form::List(vec![Form::symbol("cons"), arg, acc], None)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::LinesFromStr;
    use crate::printer::print_val;

    fn read_all(text: &str) -> (Vec<String>, Vec<String>) {
        let mut heap = Heap::new(10_000);
        let mut symbols = SymbolTable::new();
        let mut reader = Reader::new(Box::new(LinesFromStr::new(text)));
        let mut forms = Vec::new();
        let mut errors = Vec::new();
        loop {
            match reader.read(&mut heap, &mut symbols) {
                Ok(Value::Eof) => return (forms, errors),
                Ok(v) => forms.push(print_val(v, &heap, &symbols, true, 10)),
                Err(e) => errors.push(e.message()),
            }
        }
    }

    fn read_one(text: &str) -> String {
        let (forms, errors) = read_all(text);
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(forms.len(), 1, "{:?}", forms);
        forms.into_iter().next().unwrap()
    }

    #[test]
    fn lists_vectors_and_dotted_pairs() {
        assert_eq!(read_one("(a (b c) . d)"), "(a (b c) . d)");
        assert_eq!(read_one("(a . (b c))"), "(a b c)");
        assert_eq!(read_one("(a . nil)"), "(a)");
        assert_eq!(read_one("()"), "nil");
        assert_eq!(read_one("[1 \"two\" (3)]"), "[1 \"two\" (3)]");
    }

    #[test]
    fn reader_macros_wrap_next_form() {
        assert_eq!(read_one("'x"), "'x");
        assert_eq!(read_one("~(f x)"), "(delay (f x))");
    }

    #[test]
    fn quasiquote_collapses_list_calls() {
        assert_eq!(read_one("`(1 ,x ,@y)"), "(cons 1 (cons x y))");
        assert_eq!(read_one("`(a ,b)"), "(list 'a b)");
        assert_eq!(read_one("`(,@x b)"), "(append x (list 'b))");
        assert_eq!(read_one("`(1 ,(+ 1 1) ,@(list 3 4))"), "(list 1 (+ 1 1) 3 4)");
        assert_eq!(read_one("`(a . ,b)"), "(cons 'a b)");
    }

    #[test]
    fn quasiquote_of_atoms() {
        assert_eq!(read_one("`x"), "'x");
        assert_eq!(read_one("`5"), "5");
        assert_eq!(read_one("`,y"), "y");
    }

    #[test]
    fn nested_quasiquote_expands_inner_first() {
        assert_eq!(
            read_one("`(a `(b ,c))"),
            "(list 'a (list 'list (list 'quote 'b) 'c))"
        );
    }

    #[test]
    fn syntax_error_skips_rest_of_line() {
        let (forms, errors) = read_all("(a ]) (lost)\n(kept)");
        assert_eq!(errors, vec!["SyntaxError: unexpected \"]\" -- 1: (a ]) (lost)"]);
        assert_eq!(forms, vec!["(kept)"]);
    }

    #[test]
    fn unbalanced_input_reports_eof() {
        let (forms, errors) = read_all("(a (b)");
        assert!(forms.is_empty());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("unexpected EOF"));
    }

    #[test]
    fn stray_unquote_is_an_error() {
        let (_, errors) = read_all(",x");
        assert!(errors[0].contains("unquote outside quasiquote"));
    }
}
