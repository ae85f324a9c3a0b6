mod lexer;

use std::mem;

use crate::error::{Error, Result};
use crate::scheme::Scheme;
use crate::syntax::Keyword;

pub use self::lexer::{tokenize, Lexer, Token};

/// Read every top-level form in `input`.
pub fn read_program(input: &str) -> Result<Vec<Scheme>> {
    let mut reader = Reader::new(input);
    let mut forms = Vec::new();
    while reader.peek_token()?.is_some() {
        forms.push(reader.read_expr()?);
    }
    Ok(forms)
}

/// Read the first form in `input`.
pub fn read(input: &str) -> Result<Scheme> {
    Reader::new(input).read_expr()
}

fn read_error(msg: &str) -> Error {
    Error::Read(msg.to_string())
}

pub struct Reader<'a> {
    lexer: Lexer<'a>,
    cur_token: Option<Token>,
}

impl<'a> Reader<'a> {
    pub fn new(input: &'a str) -> Self {
        Reader {
            lexer: Lexer::new(input),
            cur_token: None,
        }
    }

    fn fill_cur_token(&mut self) -> Result<()> {
        if self.cur_token.is_none() {
            self.cur_token = self.lexer.next().transpose()?;
        }
        Ok(())
    }

    pub fn peek_token(&mut self) -> Result<Option<&Token>> {
        self.fill_cur_token()?;
        Ok(self.cur_token.as_ref())
    }

    pub fn read_token(&mut self) -> Result<Option<Token>> {
        self.fill_cur_token()?;
        Ok(mem::replace(&mut self.cur_token, None))
    }

    pub fn read_expr(&mut self) -> Result<Scheme> {
        match self.read_token()? {
            Some(Token::Identifier(ident)) => Ok(Scheme::symbol(ident)),
            Some(Token::LeftParen) => self.read_list(),
            Some(Token::Quote) => {
                let operand = self
                    .read_expr()
                    .map_err(|err| match err {
                        Error::Read(ref msg) if msg == "unexpected end of input" => {
                            read_error("missing expression after quote")
                        }
                        err => err,
                    })?;
                Ok(Scheme::list(vec![Scheme::symbol(Keyword::Quote.name()), operand]))
            }
            Some(Token::Integer(n)) => Ok(Scheme::int(n)),
            Some(Token::Double(d)) => Ok(Scheme::double(d)),
            Some(Token::Str(s)) => Ok(Scheme::string(s)),
            Some(Token::Boolean(b)) => Ok(Scheme::boolean(b)),
            Some(Token::RightParen) => Err(read_error("premature close parenthesis")),
            Some(Token::Dot) => Err(read_error("unexpected dot")),
            None => Err(read_error("unexpected end of input")),
        }
    }

    fn read_list(&mut self) -> Result<Scheme> {
        let mut list = Vec::new();
        let mut list_expr = Scheme::null();

        loop {
            match self.peek_token()? {
                None => return Err(read_error("unclosed parenthesis")),
                Some(Token::RightParen) => break,
                Some(Token::Dot) => {
                    self.read_token()?;
                    if list.is_empty() {
                        return Err(read_error("unexpected dot"));
                    }
                    list_expr = match self.peek_token()? {
                        None => return Err(read_error("unclosed parenthesis")),
                        Some(Token::RightParen) => return Err(read_error("unexpected dot")),
                        Some(_) => self.read_expr()?,
                    };
                    match self.peek_token()? {
                        None => return Err(read_error("unclosed parenthesis")),
                        Some(Token::RightParen) => break,
                        Some(_) => return Err(read_error("more than one expression after dot")),
                    }
                }
                Some(_) => list.push(self.read_expr()?),
            }
        }
        self.read_token()?;

        for term in list.into_iter().rev() {
            list_expr = Scheme::cons(term, list_expr);
        }
        Ok(list_expr)
    }
}
