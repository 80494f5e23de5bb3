//! Expression parsing
//!
//! Precedence ladder, lowest first: lambda / conditional, `or`, `and`,
//! `not`, comparisons, `|`, `^`, `&`, shifts, `+ -`, `* / // %`,
//! unary, `**`, trailers, atoms.

use super::ast::*;
use super::parser_state::{ParseResult, ParserState};
use crate::frontend::lexer::tokens::*;

impl<'a> ParserState<'a> {
    /// Whether the current token can begin an expression
    pub fn can_start_expr(&self) -> bool {
        match self.kind() {
            TokenKind::Name(_)
            | TokenKind::Int(_)
            | TokenKind::Long(_)
            | TokenKind::Float(_)
            | TokenKind::Imaginary(_)
            | TokenKind::Str(_)
            | TokenKind::Unicode(_)
            | TokenKind::LParen
            | TokenKind::LBracket
            | TokenKind::LBrace
            | TokenKind::Backquote
            | TokenKind::Minus
            | TokenKind::Plus
            | TokenKind::Tilde => true,
            TokenKind::Kw(Keyword::Not) | TokenKind::Kw(Keyword::Lambda) => true,
            _ => false,
        }
    }

    /// `test (',' test)* [',']`, yielding a tuple when a comma is present
    pub fn parse_testlist(&mut self) -> ParseResult<Expr> {
        let line = self.line();
        let first = self.parse_test()?;
        if !self.at(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.skip(&TokenKind::Comma) {
            if !self.can_start_expr() {
                break;
            }
            items.push(self.parse_test()?);
        }
        Ok(Expr::new(ExprKind::Tuple(items), line))
    }

    /// Assignment targets of `for` and comprehensions: `expr (',' expr)* [',']`
    pub fn parse_exprlist(&mut self) -> ParseResult<Expr> {
        let line = self.line();
        let first = self.parse_bitor()?;
        if !self.at(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.skip(&TokenKind::Comma) {
            if !self.can_start_expr() {
                break;
            }
            items.push(self.parse_bitor()?);
        }
        Ok(Expr::new(ExprKind::Tuple(items), line))
    }

    /// `yield [testlist]`
    pub fn parse_yield_expr(&mut self) -> ParseResult<Expr> {
        let line = self.line();
        self.expect_kw(Keyword::Yield)?;
        let value = if self.can_start_expr() {
            Some(Box::new(self.parse_testlist()?))
        } else {
            None
        };
        Ok(Expr::new(ExprKind::Yield(value), line))
    }

    pub fn parse_test(&mut self) -> ParseResult<Expr> {
        if self.at_kw(Keyword::Lambda) {
            return self.parse_lambda(true);
        }
        let line = self.line();
        let body = self.parse_or_test()?;
        if self.skip_kw(Keyword::If) {
            let test = self.parse_or_test()?;
            self.expect_kw(Keyword::Else)?;
            let orelse = self.parse_test()?;
            return Ok(Expr::new(
                ExprKind::IfExp {
                    test: Box::new(test),
                    body: Box::new(body),
                    orelse: Box::new(orelse),
                },
                line,
            ));
        }
        Ok(body)
    }

    /// `lambda args: body`; inside comprehension conditions the body may
    /// not contain an unparenthesized conditional expression
    fn parse_lambda(
        &mut self,
        allow_cond: bool,
    ) -> ParseResult<Expr> {
        let line = self.line();
        self.expect_kw(Keyword::Lambda)?;
        let args = self.parse_arguments(&TokenKind::Colon)?;
        self.expect(&TokenKind::Colon)?;
        let body = if allow_cond {
            self.parse_test()?
        } else {
            self.parse_or_test()?
        };
        Ok(Expr::new(
            ExprKind::Lambda {
                args: Box::new(args),
                body: Box::new(body),
            },
            line,
        ))
    }

    fn parse_or_test(&mut self) -> ParseResult<Expr> {
        let line = self.line();
        let first = self.parse_and_test()?;
        if !self.at_kw(Keyword::Or) {
            return Ok(first);
        }
        let mut values = vec![first];
        while self.skip_kw(Keyword::Or) {
            values.push(self.parse_and_test()?);
        }
        Ok(Expr::new(
            ExprKind::BoolOp {
                op: BoolOp::Or,
                values,
            },
            line,
        ))
    }

    fn parse_and_test(&mut self) -> ParseResult<Expr> {
        let line = self.line();
        let first = self.parse_not_test()?;
        if !self.at_kw(Keyword::And) {
            return Ok(first);
        }
        let mut values = vec![first];
        while self.skip_kw(Keyword::And) {
            values.push(self.parse_not_test()?);
        }
        Ok(Expr::new(
            ExprKind::BoolOp {
                op: BoolOp::And,
                values,
            },
            line,
        ))
    }

    fn parse_not_test(&mut self) -> ParseResult<Expr> {
        let line = self.line();
        if self.skip_kw(Keyword::Not) {
            let operand = self.parse_not_test()?;
            return Ok(Expr::new(
                ExprKind::UnaryOp {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                line,
            ));
        }
        self.parse_comparison()
    }

    fn comparison_op(&mut self) -> Option<CmpOp> {
        let op = match self.kind().clone() {
            TokenKind::EqEq => CmpOp::Eq,
            TokenKind::NotEq => CmpOp::NotEq,
            TokenKind::Lt => CmpOp::Lt,
            TokenKind::Le => CmpOp::Le,
            TokenKind::Gt => CmpOp::Gt,
            TokenKind::Ge => CmpOp::Ge,
            TokenKind::Kw(Keyword::In) => CmpOp::In,
            TokenKind::Kw(Keyword::Not) if self.peek_kind().is_kw(Keyword::In) => {
                self.bump();
                CmpOp::NotIn
            }
            TokenKind::Kw(Keyword::Is) => {
                self.bump();
                return Some(if self.skip_kw(Keyword::Not) {
                    CmpOp::IsNot
                } else {
                    CmpOp::Is
                });
            }
            _ => return None,
        };
        self.bump();
        Some(op)
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let line = self.line();
        let left = self.parse_bitor()?;
        let mut ops = Vec::new();
        while let Some(op) = self.comparison_op() {
            ops.push((op, self.parse_bitor()?));
        }
        if ops.is_empty() {
            return Ok(left);
        }
        Ok(Expr::new(
            ExprKind::Compare {
                left: Box::new(left),
                ops,
            },
            line,
        ))
    }

    fn binop(
        left: Expr,
        op: BinOp,
        right: Expr,
        line: usize,
    ) -> Expr {
        Expr::new(
            ExprKind::BinOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            line,
        )
    }

    /// A single `expr`, as in the target of `with ... as`
    pub fn parse_bitor(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_bitxor()?;
        while self.at(&TokenKind::Pipe) {
            let line = self.line();
            self.bump();
            let right = self.parse_bitxor()?;
            left = Self::binop(left, BinOp::BitOr, right, line);
        }
        Ok(left)
    }

    fn parse_bitxor(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_bitand()?;
        while self.at(&TokenKind::Caret) {
            let line = self.line();
            self.bump();
            let right = self.parse_bitand()?;
            left = Self::binop(left, BinOp::BitXor, right, line);
        }
        Ok(left)
    }

    fn parse_bitand(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_shift()?;
        while self.at(&TokenKind::Amp) {
            let line = self.line();
            self.bump();
            let right = self.parse_shift()?;
            left = Self::binop(left, BinOp::BitAnd, right, line);
        }
        Ok(left)
    }

    fn parse_shift(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_arith()?;
        loop {
            let op = match self.kind() {
                TokenKind::LShift => BinOp::LShift,
                TokenKind::RShift => BinOp::RShift,
                _ => break,
            };
            let line = self.line();
            self.bump();
            let right = self.parse_arith()?;
            left = Self::binop(left, op, right, line);
        }
        Ok(left)
    }

    fn parse_arith(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let line = self.line();
            self.bump();
            let right = self.parse_term()?;
            left = Self::binop(left, op, right, line);
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_factor()?;
        loop {
            let op = match self.kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::DoubleSlash => BinOp::FloorDiv,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            let line = self.line();
            self.bump();
            let right = self.parse_factor()?;
            left = Self::binop(left, op, right, line);
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> ParseResult<Expr> {
        let op = match self.kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Pos,
            TokenKind::Tilde => UnaryOp::Invert,
            _ => return self.parse_power(),
        };
        let line = self.line();
        self.bump();
        let operand = self.parse_factor()?;
        Ok(Expr::new(
            ExprKind::UnaryOp {
                op,
                operand: Box::new(operand),
            },
            line,
        ))
    }

    fn parse_power(&mut self) -> ParseResult<Expr> {
        let mut base = self.parse_atom()?;
        base = self.parse_trailers(base)?;
        if self.at(&TokenKind::DoubleStar) {
            let line = self.line();
            self.bump();
            let exponent = self.parse_factor()?;
            return Ok(Self::binop(base, BinOp::Pow, exponent, line));
        }
        Ok(base)
    }

    fn parse_trailers(
        &mut self,
        mut expr: Expr,
    ) -> ParseResult<Expr> {
        loop {
            let line = self.line();
            match self.kind() {
                TokenKind::LParen => {
                    self.bump();
                    expr = self.parse_call(expr, line)?;
                }
                TokenKind::LBracket => {
                    self.bump();
                    expr = self.parse_subscript(expr, line)?;
                    self.expect(&TokenKind::RBracket)?;
                }
                TokenKind::Dot => {
                    self.bump();
                    let attr = self.expect_name()?;
                    expr = Expr::new(
                        ExprKind::Attribute {
                            value: Box::new(expr),
                            attr,
                        },
                        line,
                    );
                }
                _ => return Ok(expr),
            }
        }
    }

    /// Argument list after `(`, consuming the closing `)`
    fn parse_call(
        &mut self,
        func: Expr,
        line: usize,
    ) -> ParseResult<Expr> {
        let mut args = Vec::new();
        let mut keywords = Vec::new();
        let mut star = None;
        let mut dstar = None;

        while !self.at(&TokenKind::RParen) {
            if self.skip(&TokenKind::Star) {
                star = Some(Box::new(self.parse_test()?));
            } else if self.skip(&TokenKind::DoubleStar) {
                dstar = Some(Box::new(self.parse_test()?));
            } else if matches!(self.kind(), TokenKind::Name(_))
                && self.peek_kind() == &TokenKind::Assign
            {
                let name = self.expect_name()?;
                self.bump();
                keywords.push((name, self.parse_test()?));
            } else {
                let arg = self.parse_test()?;
                if self.at_kw(Keyword::For) {
                    // f(x for x in y)
                    let generators = self.parse_comprehension_clauses()?;
                    let arg_line = arg.line;
                    args.push(Expr::new(
                        ExprKind::GeneratorExp {
                            elt: Box::new(arg),
                            generators,
                        },
                        arg_line,
                    ));
                } else {
                    args.push(arg);
                }
            }
            if !self.skip(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;

        Ok(Expr::new(
            ExprKind::Call {
                func: Box::new(func),
                args,
                keywords,
                star,
                dstar,
            },
            line,
        ))
    }

    /// One subscript item: a test or a slice object
    fn parse_subscript_item(&mut self) -> ParseResult<Expr> {
        let line = self.line();
        let lower = if self.at(&TokenKind::Colon) {
            None
        } else {
            Some(self.parse_test()?)
        };
        if !self.at(&TokenKind::Colon) {
            return lower.ok_or_else(|| self.expected("subscript"));
        }
        self.bump();
        let upper = if self.can_start_expr() {
            Some(Box::new(self.parse_test()?))
        } else {
            None
        };
        let step = if self.skip(&TokenKind::Colon) && self.can_start_expr() {
            Some(Box::new(self.parse_test()?))
        } else {
            None
        };
        Ok(Expr::new(
            ExprKind::SliceObj {
                lower: lower.map(Box::new),
                upper,
                step,
            },
            line,
        ))
    }

    /// Contents of `[...]` after a primary
    fn parse_subscript(
        &mut self,
        value: Expr,
        line: usize,
    ) -> ParseResult<Expr> {
        let first = self.parse_subscript_item()?;
        let index = if self.at(&TokenKind::Comma) {
            let mut items = vec![first];
            while self.skip(&TokenKind::Comma) {
                if self.at(&TokenKind::RBracket) {
                    break;
                }
                items.push(self.parse_subscript_item()?);
            }
            Expr::new(ExprKind::Tuple(items), line)
        } else {
            first
        };

        // 简单切片 a[i:j] 单独成为 Slice 节点
        if let ExprKind::SliceObj {
            lower,
            upper,
            step: None,
        } = index.kind
        {
            return Ok(Expr::new(
                ExprKind::Slice {
                    value: Box::new(value),
                    lower,
                    upper,
                },
                line,
            ));
        }
        Ok(Expr::new(
            ExprKind::Subscript {
                value: Box::new(value),
                index: Box::new(index),
            },
            line,
        ))
    }

    /// `for target in iter [if cond]...` clauses (at least one)
    pub fn parse_comprehension_clauses(&mut self) -> ParseResult<Vec<Comprehension>> {
        let mut generators = Vec::new();
        while self.skip_kw(Keyword::For) {
            let target = self.parse_exprlist()?;
            self.expect_kw(Keyword::In)?;
            let iter = self.parse_or_test()?;
            let mut ifs = Vec::new();
            while self.at_kw(Keyword::If) {
                self.bump();
                let cond = if self.at_kw(Keyword::Lambda) {
                    self.parse_lambda(false)?
                } else {
                    self.parse_or_test()?
                };
                ifs.push(cond);
            }
            generators.push(Comprehension { target, iter, ifs });
        }
        if generators.is_empty() {
            return Err(self.expected("'for'"));
        }
        Ok(generators)
    }

    fn parse_atom(&mut self) -> ParseResult<Expr> {
        let line = self.line();
        let kind = self.kind().clone();
        match kind {
            TokenKind::Name(name) => {
                self.bump();
                Ok(Expr::new(ExprKind::Name(name), line))
            }
            TokenKind::Int(n) => {
                self.bump();
                Ok(Expr::new(ExprKind::Const(Constant::Int(n)), line))
            }
            TokenKind::Long(s) => {
                self.bump();
                Ok(Expr::new(ExprKind::Const(Constant::Long(s)), line))
            }
            TokenKind::Float(f) => {
                self.bump();
                Ok(Expr::new(ExprKind::Const(Constant::Float(f)), line))
            }
            TokenKind::Imaginary(f) => {
                self.bump();
                Ok(Expr::new(ExprKind::Const(Constant::Complex(f)), line))
            }
            TokenKind::Str(_) | TokenKind::Unicode(_) => self.parse_strings(line),
            TokenKind::Backquote => {
                self.bump();
                let value = self.parse_testlist()?;
                self.expect(&TokenKind::Backquote)?;
                Ok(Expr::new(ExprKind::Backquote(Box::new(value)), line))
            }
            TokenKind::LParen => {
                self.bump();
                self.parse_paren(line)
            }
            TokenKind::LBracket => {
                self.bump();
                self.parse_list_display(line)
            }
            TokenKind::LBrace => {
                self.bump();
                self.parse_brace_display(line)
            }
            _ => Err(self.unexpected()),
        }
    }

    /// Adjacent string literals concatenate; any unicode part makes the result unicode
    fn parse_strings(
        &mut self,
        line: usize,
    ) -> ParseResult<Expr> {
        let mut text = String::new();
        let mut unicode = false;
        loop {
            match self.kind().clone() {
                TokenKind::Str(s) => text.push_str(&s),
                TokenKind::Unicode(s) => {
                    unicode = true;
                    text.push_str(&s);
                }
                _ => break,
            }
            self.bump();
        }
        let constant = if unicode {
            Constant::Unicode(text)
        } else {
            Constant::Str(text)
        };
        Ok(Expr::new(ExprKind::Const(constant), line))
    }

    /// After `(`: unit tuple, parenthesized expr, tuple, generator or yield
    fn parse_paren(
        &mut self,
        line: usize,
    ) -> ParseResult<Expr> {
        if self.skip(&TokenKind::RParen) {
            return Ok(Expr::new(ExprKind::Tuple(Vec::new()), line));
        }
        if self.at_kw(Keyword::Yield) {
            let expr = self.parse_yield_expr()?;
            self.expect(&TokenKind::RParen)?;
            return Ok(expr);
        }
        let first = self.parse_test()?;
        if self.at_kw(Keyword::For) {
            let generators = self.parse_comprehension_clauses()?;
            self.expect(&TokenKind::RParen)?;
            return Ok(Expr::new(
                ExprKind::GeneratorExp {
                    elt: Box::new(first),
                    generators,
                },
                line,
            ));
        }
        if !self.at(&TokenKind::Comma) {
            self.expect(&TokenKind::RParen)?;
            return Ok(first);
        }
        let mut items = vec![first];
        while self.skip(&TokenKind::Comma) {
            if self.at(&TokenKind::RParen) {
                break;
            }
            items.push(self.parse_test()?);
        }
        self.expect(&TokenKind::RParen)?;
        Ok(Expr::new(ExprKind::Tuple(items), line))
    }

    /// After `[`: list display or list comprehension
    fn parse_list_display(
        &mut self,
        line: usize,
    ) -> ParseResult<Expr> {
        if self.skip(&TokenKind::RBracket) {
            return Ok(Expr::new(ExprKind::List(Vec::new()), line));
        }
        let first = self.parse_test()?;
        if self.at_kw(Keyword::For) {
            let generators = self.parse_comprehension_clauses()?;
            self.expect(&TokenKind::RBracket)?;
            return Ok(Expr::new(
                ExprKind::ListComp {
                    elt: Box::new(first),
                    generators,
                },
                line,
            ));
        }
        let mut items = vec![first];
        while self.skip(&TokenKind::Comma) {
            if self.at(&TokenKind::RBracket) {
                break;
            }
            items.push(self.parse_test()?);
        }
        self.expect(&TokenKind::RBracket)?;
        Ok(Expr::new(ExprKind::List(items), line))
    }

    /// After `{`: dict or set display
    fn parse_brace_display(
        &mut self,
        line: usize,
    ) -> ParseResult<Expr> {
        if self.skip(&TokenKind::RBrace) {
            return Ok(Expr::new(ExprKind::Dict(Vec::new()), line));
        }
        let first = self.parse_test()?;
        if self.skip(&TokenKind::Colon) {
            let value = self.parse_test()?;
            let mut pairs = vec![(first, value)];
            while self.skip(&TokenKind::Comma) {
                if self.at(&TokenKind::RBrace) {
                    break;
                }
                let key = self.parse_test()?;
                self.expect(&TokenKind::Colon)?;
                pairs.push((key, self.parse_test()?));
            }
            self.expect(&TokenKind::RBrace)?;
            return Ok(Expr::new(ExprKind::Dict(pairs), line));
        }
        let mut items = vec![first];
        while self.skip(&TokenKind::Comma) {
            if self.at(&TokenKind::RBrace) {
                break;
            }
            items.push(self.parse_test()?);
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(Expr::new(ExprKind::Set(items), line))
    }

    /// Parameter list of `def` (terminated by `)`) or `lambda` (terminated by `:`)
    pub fn parse_arguments(
        &mut self,
        terminator: &TokenKind,
    ) -> ParseResult<Arguments> {
        let mut args = Arguments::default();
        while !self.at(terminator) {
            if self.skip(&TokenKind::Star) {
                args.vararg = Some(self.expect_name()?);
            } else if self.skip(&TokenKind::DoubleStar) {
                args.kwarg = Some(self.expect_name()?);
            } else {
                let param = self.parse_param()?;
                if self.skip(&TokenKind::Assign) {
                    args.defaults.push(self.parse_test()?);
                } else if !args.defaults.is_empty() {
                    return Err(self.expected("default value"));
                }
                args.params.push(param);
            }
            if !self.skip(&TokenKind::Comma) {
                break;
            }
        }
        Ok(args)
    }

    fn parse_param(&mut self) -> ParseResult<Param> {
        if self.skip(&TokenKind::LParen) {
            let mut items = Vec::new();
            while !self.at(&TokenKind::RParen) {
                items.push(self.parse_param()?);
                if !self.skip(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RParen)?;
            return Ok(Param::Tuple(items));
        }
        Ok(Param::Name(self.expect_name()?))
    }
}
