//! Recursive-descent parser.
//!
//! ```text
//! SEQ        ::= '{' { STATEMENT } '}'
//! STATEMENT  ::= IF | WHILE | EXPRESSION
//! EXPRESSION ::= E1 { ( == | != | < | > ) E1 }
//! E1         ::= E2 { ( + | - ) E2 }
//! E2         ::= E3 { ( * | / ) E3 }
//! E3         ::= F { INDEX | CALL | ASSIGNMENT }
//! F          ::= NUMBER | STRING | IDENT | FUNCTION | SPECIAL_CALL
//!              | '(' EXPRESSION ')'
//! CALL       ::= '(' [ EXPRESSION { ',' EXPRESSION } ] ')'
//! INDEX      ::= '[' EXPRESSION ']' [ ASSIGNMENT ]
//! ASSIGNMENT ::= ( <- | = ) EXPRESSION
//! ```
//!
//! Semicolons are statement separators and may appear freely between
//! statements. A missing `else` clause parses as the literal `0`.

use crate::ast::{BinOp, Exp};
use riftc_lex::{LexError, Lexer, Token};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{0}")]
pub struct SyntaxError(pub String);

impl From<LexError> for SyntaxError {
    fn from(e: LexError) -> SyntaxError {
        SyntaxError(e.0)
    }
}

pub type Result<T> = std::result::Result<T, SyntaxError>;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Parse a whole program: a brace-less statement sequence.
    pub fn parse(input: &str) -> Result<Exp> {
        let tokens = Lexer::tokenize(input)?;
        let mut parser = Parser { tokens, pos: 0 };
        let body = parser.parse_sequence_body(&[Token::Eof])?;
        parser.expect(Token::Eof)?;
        Ok(Exp::Seq(body))
    }

    fn top(&self) -> Token {
        self.tokens[self.pos]
    }

    fn pop(&mut self) -> Token {
        let t = self.tokens[self.pos];
        if t != Token::Eof {
            self.pos += 1;
        }
        t
    }

    fn expect(&mut self, expected: Token) -> Result<Token> {
        if self.top() == expected {
            Ok(self.pop())
        } else {
            Err(SyntaxError(format!(
                "Expected {} but found {}",
                expected,
                self.top()
            )))
        }
    }

    fn cond_pop(&mut self, expected: Token) -> bool {
        if self.top() == expected {
            self.pop();
            true
        } else {
            false
        }
    }

    /// Statements until one of `terminators`; stray semicolons are skipped.
    fn parse_sequence_body(&mut self, terminators: &[Token]) -> Result<Vec<Exp>> {
        let mut body = Vec::new();
        loop {
            while self.cond_pop(Token::Semicolon) {}
            if terminators.contains(&self.top()) {
                return Ok(body);
            }
            body.push(self.parse_statement()?);
        }
    }

    fn parse_sequence(&mut self) -> Result<Exp> {
        self.expect(Token::OCbr)?;
        let body = self.parse_sequence_body(&[Token::CCbr])?;
        self.expect(Token::CCbr)?;
        Ok(Exp::Seq(body))
    }

    fn parse_statement(&mut self) -> Result<Exp> {
        match self.top() {
            Token::KwIf => self.parse_if(),
            Token::KwWhile => self.parse_while(),
            _ => self.parse_expression(),
        }
    }

    fn parse_if(&mut self) -> Result<Exp> {
        self.expect(Token::KwIf)?;
        self.expect(Token::OPar)?;
        let guard = self.parse_expression()?;
        self.expect(Token::CPar)?;
        let if_clause = self.parse_sequence()?;
        let else_clause = if self.cond_pop(Token::KwElse) {
            self.parse_sequence()?
        } else {
            Exp::Num(0.0)
        };
        Ok(Exp::IfElse {
            guard: Box::new(guard),
            if_clause: Box::new(if_clause),
            else_clause: Box::new(else_clause),
        })
    }

    fn parse_while(&mut self) -> Result<Exp> {
        self.expect(Token::KwWhile)?;
        self.expect(Token::OPar)?;
        let guard = self.parse_expression()?;
        self.expect(Token::CPar)?;
        let body = self.parse_sequence()?;
        Ok(Exp::WhileLoop {
            guard: Box::new(guard),
            body: Box::new(body),
        })
    }

    fn parse_expression(&mut self) -> Result<Exp> {
        let mut x = self.parse_e1()?;
        loop {
            let op = match self.top() {
                Token::Eq => BinOp::Eq,
                Token::Neq => BinOp::Neq,
                Token::Lt => BinOp::Lt,
                Token::Gt => BinOp::Gt,
                _ => return Ok(x),
            };
            self.pop();
            let rhs = self.parse_e1()?;
            x = Exp::BinExp {
                op,
                lhs: Box::new(x),
                rhs: Box::new(rhs),
            };
        }
    }

    fn parse_e1(&mut self) -> Result<Exp> {
        let mut x = self.parse_e2()?;
        loop {
            let op = match self.top() {
                Token::Add => BinOp::Add,
                Token::Sub => BinOp::Sub,
                _ => return Ok(x),
            };
            self.pop();
            let rhs = self.parse_e2()?;
            x = Exp::BinExp {
                op,
                lhs: Box::new(x),
                rhs: Box::new(rhs),
            };
        }
    }

    fn parse_e2(&mut self) -> Result<Exp> {
        let mut x = self.parse_e3()?;
        loop {
            let op = match self.top() {
                Token::Mul => BinOp::Mul,
                Token::Div => BinOp::Div,
                _ => return Ok(x),
            };
            self.pop();
            let rhs = self.parse_e3()?;
            x = Exp::BinExp {
                op,
                lhs: Box::new(x),
                rhs: Box::new(rhs),
            };
        }
    }

    /// Postfix chain: indexing, calls and assignment bind tightest.
    fn parse_e3(&mut self) -> Result<Exp> {
        let mut f = self.parse_f()?;
        loop {
            match self.top() {
                Token::OSbr => f = self.parse_index(f)?,
                Token::OPar => f = self.parse_call(f)?,
                Token::Assign => f = self.parse_assignment(f)?,
                _ => return Ok(f),
            }
        }
    }

    fn parse_call(&mut self, callee: Exp) -> Result<Exp> {
        self.expect(Token::OPar)?;
        let mut args = Vec::new();
        while self.top() != Token::CPar {
            args.push(self.parse_expression()?);
            if !self.cond_pop(Token::Comma) {
                break;
            }
        }
        self.expect(Token::CPar)?;
        Ok(Exp::UserCall {
            callee: Box::new(callee),
            args,
        })
    }

    fn parse_index(&mut self, value: Exp) -> Result<Exp> {
        self.expect(Token::OSbr)?;
        let index = self.parse_expression()?;
        self.expect(Token::CSbr)?;
        if self.cond_pop(Token::Assign) {
            let rhs = self.parse_expression()?;
            Ok(Exp::IndexAssignment {
                value: Box::new(value),
                index: Box::new(index),
                rhs: Box::new(rhs),
            })
        } else {
            Ok(Exp::Index {
                value: Box::new(value),
                index: Box::new(index),
            })
        }
    }

    fn parse_assignment(&mut self, target: Exp) -> Result<Exp> {
        self.expect(Token::Assign)?;
        let name = match target {
            Exp::Var(name) => name,
            _ => {
                return Err(SyntaxError(
                    "Assignment is only possible into variables".to_string(),
                ))
            }
        };
        let rhs = self.parse_expression()?;
        Ok(Exp::SimpleAssignment {
            name,
            rhs: Box::new(rhs),
        })
    }

    fn parse_f(&mut self) -> Result<Exp> {
        match self.top() {
            Token::Ident(s) => {
                self.pop();
                Ok(Exp::Var(s))
            }
            Token::Number(n) => {
                self.pop();
                Ok(Exp::Num(n))
            }
            Token::Character(s) => {
                self.pop();
                Ok(Exp::Str(s))
            }
            Token::OPar => {
                self.pop();
                let x = self.parse_expression()?;
                self.expect(Token::CPar)?;
                Ok(x)
            }
            Token::KwFunction => self.parse_function(),
            Token::KwEval => {
                let arg = self.parse_special_unary(Token::KwEval)?;
                Ok(Exp::EvalCall(Box::new(arg)))
            }
            Token::KwLength => {
                let arg = self.parse_special_unary(Token::KwLength)?;
                Ok(Exp::LengthCall(Box::new(arg)))
            }
            Token::KwType => {
                let arg = self.parse_special_unary(Token::KwType)?;
                Ok(Exp::TypeCall(Box::new(arg)))
            }
            Token::KwC => self.parse_c(),
            t => Err(SyntaxError(format!(
                "literal, variable, call or special call expected, found {}",
                t
            ))),
        }
    }

    fn parse_special_unary(&mut self, keyword: Token) -> Result<Exp> {
        self.expect(keyword)?;
        self.expect(Token::OPar)?;
        let arg = self.parse_expression()?;
        self.expect(Token::CPar)?;
        Ok(arg)
    }

    fn parse_c(&mut self) -> Result<Exp> {
        self.expect(Token::KwC)?;
        self.expect(Token::OPar)?;
        let mut args = Vec::new();
        loop {
            args.push(self.parse_expression()?);
            if !self.cond_pop(Token::Comma) {
                break;
            }
        }
        self.expect(Token::CPar)?;
        Ok(Exp::CCall { args })
    }

    fn parse_function(&mut self) -> Result<Exp> {
        self.expect(Token::KwFunction)?;
        self.expect(Token::OPar)?;
        let mut params = Vec::new();
        while self.top() != Token::CPar {
            match self.pop() {
                Token::Ident(s) => params.push(s),
                t => return Err(SyntaxError(format!("Expected identifier, found {}", t))),
            }
            if !self.cond_pop(Token::Comma) {
                break;
            }
        }
        self.expect(Token::CPar)?;
        let body = self.parse_sequence()?;
        Ok(Exp::Fun {
            params,
            body: Box::new(body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riftc_util::Symbol;

    fn parse(input: &str) -> Exp {
        Parser::parse(input).unwrap()
    }

    fn single(input: &str) -> Exp {
        match parse(input) {
            Exp::Seq(mut body) => {
                assert_eq!(body.len(), 1);
                body.pop().unwrap()
            }
            other => panic!("expected sequence, got {:?}", other),
        }
    }

    #[test]
    fn test_number() {
        assert_eq!(single("42"), Exp::Num(42.0));
    }

    #[test]
    fn test_precedence() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        match single("1 + 2 * 3") {
            Exp::BinExp { op: BinOp::Add, rhs, .. } => match *rhs {
                Exp::BinExp { op: BinOp::Mul, .. } => {}
                other => panic!("expected mul on the right, got {:?}", other),
            },
            other => panic!("expected add at the top, got {:?}", other),
        }
    }

    #[test]
    fn test_comparison_binds_loosest() {
        match single("1 + 2 < 3 * 4") {
            Exp::BinExp { op: BinOp::Lt, lhs, rhs } => {
                assert!(matches!(*lhs, Exp::BinExp { op: BinOp::Add, .. }));
                assert!(matches!(*rhs, Exp::BinExp { op: BinOp::Mul, .. }));
            }
            other => panic!("expected comparison at the top, got {:?}", other),
        }
    }

    #[test]
    fn test_left_associativity() {
        // 1 - 2 - 3 parses as (1 - 2) - 3
        match single("1 - 2 - 3") {
            Exp::BinExp { op: BinOp::Sub, lhs, rhs } => {
                assert!(matches!(*lhs, Exp::BinExp { op: BinOp::Sub, .. }));
                assert_eq!(*rhs, Exp::Num(3.0));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parenthesized() {
        match single("(1 + 2) * 3") {
            Exp::BinExp { op: BinOp::Mul, lhs, .. } => {
                assert!(matches!(*lhs, Exp::BinExp { op: BinOp::Add, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_both_assignment_forms() {
        let a = single("a <- 1");
        let b = single("a = 1");
        assert_eq!(a, b);
        match a {
            Exp::SimpleAssignment { name, rhs } => {
                assert_eq!(name, Symbol::intern("a"));
                assert_eq!(*rhs, Exp::Num(1.0));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_assignment_into_literal_fails() {
        assert!(Parser::parse("1 <- 2").is_err());
    }

    #[test]
    fn test_index_read_and_write() {
        match single("a[0]") {
            Exp::Index { value, index } => {
                assert_eq!(*value, Exp::Var(Symbol::intern("a")));
                assert_eq!(*index, Exp::Num(0.0));
            }
            other => panic!("unexpected {:?}", other),
        }
        match single("a[0] <- 5") {
            Exp::IndexAssignment { rhs, .. } => assert_eq!(*rhs, Exp::Num(5.0)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_call_with_args() {
        match single("f(1, 2)") {
            Exp::UserCall { callee, args } => {
                assert_eq!(*callee, Exp::Var(Symbol::intern("f")));
                assert_eq!(args, vec![Exp::Num(1.0), Exp::Num(2.0)]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_chained_postfix() {
        // f(1)[0] parses as (f(1))[0]
        match single("f(1)[0]") {
            Exp::Index { value, .. } => {
                assert!(matches!(*value, Exp::UserCall { .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_function_literal() {
        match single("function(a, b) { a + b }") {
            Exp::Fun { params, body } => {
                assert_eq!(params, vec![Symbol::intern("a"), Symbol::intern("b")]);
                assert_eq!(body.statement_count(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_if_without_else_defaults_to_zero() {
        match single("if (1) { 2 }") {
            Exp::IfElse { else_clause, .. } => assert_eq!(*else_clause, Exp::Num(0.0)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_if_with_else() {
        match single("if (1) { 2 } else { 3 }") {
            Exp::IfElse { else_clause, .. } => {
                assert_eq!(else_clause.statement_count(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_while() {
        match single("while (a > 0) { a <- a - 1 }") {
            Exp::WhileLoop { guard, body } => {
                assert!(matches!(*guard, Exp::BinExp { op: BinOp::Gt, .. }));
                assert_eq!(body.statement_count(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_special_calls() {
        assert!(matches!(single("c(1, 2, 3)"), Exp::CCall { .. }));
        assert!(matches!(single("eval(\"1\")"), Exp::EvalCall(_)));
        assert!(matches!(single("length(a)"), Exp::LengthCall(_)));
        assert!(matches!(single("type(a)"), Exp::TypeCall(_)));
    }

    #[test]
    fn test_semicolon_separated_statements() {
        match parse("a <- 1; b <- 2; a + b") {
            Exp::Seq(body) => assert_eq!(body.len(), 3),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_empty_program() {
        assert_eq!(parse(""), Exp::Seq(vec![]));
        assert_eq!(parse(";;"), Exp::Seq(vec![]));
    }

    #[test]
    fn test_unbalanced_parens_fail() {
        assert!(Parser::parse("(1 + 2").is_err());
        assert!(Parser::parse("f(1,").is_err());
        assert!(Parser::parse("while (1) { 2").is_err());
    }

    #[test]
    fn test_garbage_fails() {
        assert!(Parser::parse("if if").is_err());
        assert!(Parser::parse("1 +").is_err());
    }
}
