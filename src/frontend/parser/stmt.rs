//! Statement parsing

use super::ast::*;
use super::parser_state::{ParseError, ParseResult, ParserState};
use crate::frontend::lexer::tokens::*;

impl<'a> ParserState<'a> {
    /// Parse statements until end of input
    pub fn parse_file_input(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut body = Vec::new();
        loop {
            while self.skip(&TokenKind::Newline) {}
            if self.at_end() {
                return Ok(body);
            }
            body.extend(self.parse_statement()?);
        }
    }

    /// One logical statement; a simple-statement line may yield several
    pub fn parse_statement(&mut self) -> ParseResult<Vec<Stmt>> {
        let line = self.line();
        let stmt = match self.kind() {
            TokenKind::At => self.parse_decorated()?,
            TokenKind::Kw(Keyword::Def) => self.parse_funcdef(Vec::new(), line)?,
            TokenKind::Kw(Keyword::Class) => self.parse_classdef(Vec::new(), line)?,
            TokenKind::Kw(Keyword::If) => self.parse_if()?,
            TokenKind::Kw(Keyword::While) => self.parse_while()?,
            TokenKind::Kw(Keyword::For) => self.parse_for()?,
            TokenKind::Kw(Keyword::Try) => self.parse_try()?,
            TokenKind::Kw(Keyword::With) => self.parse_with()?,
            _ => return self.parse_simple_line(),
        };
        Ok(vec![stmt])
    }

    /// `small (';' small)* [';'] NEWLINE`
    fn parse_simple_line(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut stmts = vec![self.parse_small_stmt()?];
        while self.skip(&TokenKind::Semicolon) {
            if matches!(self.kind(), TokenKind::Newline | TokenKind::Eof) {
                break;
            }
            stmts.push(self.parse_small_stmt()?);
        }
        if !self.skip(&TokenKind::Newline) && !self.at_end() {
            return Err(self.expected("newline"));
        }
        Ok(stmts)
    }

    /// Indented block, or simple statements on the same line
    fn parse_suite(&mut self) -> ParseResult<Vec<Stmt>> {
        self.expect(&TokenKind::Colon)?;
        if !self.skip(&TokenKind::Newline) {
            return self.parse_simple_line();
        }
        while self.skip(&TokenKind::Newline) {}
        self.expect(&TokenKind::Indent)?;
        let mut body = Vec::new();
        while !self.skip(&TokenKind::Dedent) {
            if self.at_end() {
                return Err(self.expected("dedent"));
            }
            if self.skip(&TokenKind::Newline) {
                continue;
            }
            body.extend(self.parse_statement()?);
        }
        Ok(body)
    }

    fn parse_small_stmt(&mut self) -> ParseResult<Stmt> {
        let line = self.line();
        let kind = match self.kind() {
            TokenKind::Kw(Keyword::Pass) => {
                self.bump();
                StmtKind::Pass
            }
            TokenKind::Kw(Keyword::Break) => {
                self.bump();
                StmtKind::Break
            }
            TokenKind::Kw(Keyword::Continue) => {
                self.bump();
                StmtKind::Continue
            }
            TokenKind::Kw(Keyword::Return) => {
                self.bump();
                let value = if self.can_start_expr() {
                    Some(self.parse_testlist()?)
                } else {
                    None
                };
                StmtKind::Return(value)
            }
            TokenKind::Kw(Keyword::Raise) => self.parse_raise()?,
            TokenKind::Kw(Keyword::Global) => {
                self.bump();
                let mut names = vec![self.expect_name()?];
                while self.skip(&TokenKind::Comma) {
                    names.push(self.expect_name()?);
                }
                StmtKind::Global(names)
            }
            TokenKind::Kw(Keyword::Del) => {
                self.bump();
                let target = self.parse_exprlist()?;
                let targets = match target {
                    Expr {
                        kind: ExprKind::Tuple(items),
                        ..
                    } => items,
                    other => vec![other],
                };
                for t in &targets {
                    self.check_target(t, "deletion")?;
                }
                StmtKind::Delete(targets)
            }
            TokenKind::Kw(Keyword::Print) => self.parse_print()?,
            TokenKind::Kw(Keyword::Exec) => {
                self.bump();
                let code = self.parse_exec_code()?;
                let (mut globals, mut locals) = (None, None);
                if self.skip_kw(Keyword::In) {
                    globals = Some(self.parse_test()?);
                    if self.skip(&TokenKind::Comma) {
                        locals = Some(self.parse_test()?);
                    }
                }
                StmtKind::Exec {
                    code,
                    globals,
                    locals,
                }
            }
            TokenKind::Kw(Keyword::Assert) => {
                self.bump();
                let test = self.parse_test()?;
                let msg = if self.skip(&TokenKind::Comma) {
                    Some(self.parse_test()?)
                } else {
                    None
                };
                StmtKind::Assert { test, msg }
            }
            TokenKind::Kw(Keyword::Import) => self.parse_import()?,
            TokenKind::Kw(Keyword::From) => self.parse_import_from()?,
            _ => self.parse_expr_stmt()?,
        };
        Ok(Stmt { kind, line })
    }

    /// `exec` takes an expression, not a test, before an optional `in`
    fn parse_exec_code(&mut self) -> ParseResult<Expr> {
        let line = self.line();
        let expr = self.parse_exprlist()?;
        if let ExprKind::Tuple(_) = expr.kind {
            return Err(ParseError::InvalidTarget {
                what: "exec tuple".to_string(),
                line,
            });
        }
        Ok(expr)
    }

    fn parse_raise(&mut self) -> ParseResult<StmtKind> {
        self.expect_kw(Keyword::Raise)?;
        let mut operands = [None, None, None];
        if self.can_start_expr() {
            for (i, slot) in operands.iter_mut().enumerate() {
                if i > 0 && !self.skip(&TokenKind::Comma) {
                    break;
                }
                *slot = Some(self.parse_test()?);
            }
        }
        let [expt, arg, traceback] = operands;
        Ok(StmtKind::Raise {
            expt,
            arg,
            traceback,
        })
    }

    fn parse_print(&mut self) -> ParseResult<StmtKind> {
        self.expect_kw(Keyword::Print)?;
        let mut dest = None;
        let mut values = Vec::new();
        if self.skip(&TokenKind::RShift) {
            dest = Some(self.parse_test()?);
            if !self.skip(&TokenKind::Comma) {
                return Ok(StmtKind::Print { dest, values });
            }
        }
        while self.can_start_expr() {
            values.push(self.parse_test()?);
            if !self.skip(&TokenKind::Comma) {
                break;
            }
        }
        Ok(StmtKind::Print { dest, values })
    }

    fn parse_dotted_name(&mut self) -> ParseResult<String> {
        let mut name = self.expect_name()?;
        while self.skip(&TokenKind::Dot) {
            name.push('.');
            name.push_str(&self.expect_name()?);
        }
        Ok(name)
    }

    fn parse_import(&mut self) -> ParseResult<StmtKind> {
        self.expect_kw(Keyword::Import)?;
        let mut aliases = Vec::new();
        loop {
            let name = self.parse_dotted_name()?;
            let asname = if self.skip_kw(Keyword::As) {
                Some(self.expect_name()?)
            } else {
                None
            };
            aliases.push(ImportAlias { name, asname });
            if !self.skip(&TokenKind::Comma) {
                break;
            }
        }
        Ok(StmtKind::Import(aliases))
    }

    fn parse_import_from(&mut self) -> ParseResult<StmtKind> {
        self.expect_kw(Keyword::From)?;
        let mut level = 0;
        while self.skip(&TokenKind::Dot) {
            level += 1;
        }
        let module = if level > 0 && self.at_kw(Keyword::Import) {
            String::new()
        } else {
            self.parse_dotted_name()?
        };
        self.expect_kw(Keyword::Import)?;

        if self.skip(&TokenKind::Star) {
            return Ok(StmtKind::ImportFrom {
                module,
                names: Vec::new(),
                level,
            });
        }

        let parens = self.skip(&TokenKind::LParen);
        let mut names = Vec::new();
        loop {
            let name = self.expect_name()?;
            let asname = if self.skip_kw(Keyword::As) {
                Some(self.expect_name()?)
            } else {
                None
            };
            names.push(ImportAlias { name, asname });
            if !self.skip(&TokenKind::Comma) {
                break;
            }
            if parens && self.at(&TokenKind::RParen) {
                break;
            }
        }
        if parens {
            self.expect(&TokenKind::RParen)?;
        }
        Ok(StmtKind::ImportFrom {
            module,
            names,
            level,
        })
    }

    /// Expression statement, assignment chain or augmented assignment
    fn parse_expr_stmt(&mut self) -> ParseResult<StmtKind> {
        let first = self.parse_rhs()?;

        if let TokenKind::AugAssign(symbol) = self.kind() {
            let op = BinOp::from_symbol(symbol).ok_or_else(|| self.unexpected())?;
            self.bump();
            self.check_aug_target(&first)?;
            let value = self.parse_rhs()?;
            return Ok(StmtKind::AugAssign {
                target: first,
                op,
                value,
            });
        }

        if !self.at(&TokenKind::Assign) {
            return Ok(StmtKind::Expr(first));
        }

        let mut exprs = vec![first];
        while self.skip(&TokenKind::Assign) {
            exprs.push(self.parse_rhs()?);
        }
        let value = exprs.pop().ok_or_else(|| self.unexpected())?;
        for target in &exprs {
            self.check_target(target, "assignment")?;
        }
        Ok(StmtKind::Assign {
            targets: exprs,
            value,
        })
    }

    fn parse_rhs(&mut self) -> ParseResult<Expr> {
        if self.at_kw(Keyword::Yield) {
            self.parse_yield_expr()
        } else {
            self.parse_testlist()
        }
    }

    /// Reject expressions that cannot be bound
    fn check_target(
        &self,
        expr: &Expr,
        context: &str,
    ) -> ParseResult<()> {
        match &expr.kind {
            ExprKind::Name(_)
            | ExprKind::Attribute { .. }
            | ExprKind::Subscript { .. }
            | ExprKind::Slice { .. } => Ok(()),
            ExprKind::Tuple(items) | ExprKind::List(items) => {
                items.iter().try_for_each(|e| self.check_target(e, context))
            }
            other => Err(ParseError::InvalidTarget {
                what: format!("{} in {}", describe(other), context),
                line: expr.line,
            }),
        }
    }

    fn check_aug_target(
        &self,
        expr: &Expr,
    ) -> ParseResult<()> {
        match &expr.kind {
            ExprKind::Name(_)
            | ExprKind::Attribute { .. }
            | ExprKind::Subscript { .. }
            | ExprKind::Slice { .. } => Ok(()),
            other => Err(ParseError::InvalidTarget {
                what: format!("{} in augmented assignment", describe(other)),
                line: expr.line,
            }),
        }
    }

    fn parse_decorated(&mut self) -> ParseResult<Stmt> {
        let mut decorators = Vec::new();
        while self.skip(&TokenKind::At) {
            decorators.push(self.parse_test()?);
            self.expect(&TokenKind::Newline)?;
        }
        let line = self.line();
        match self.kind() {
            TokenKind::Kw(Keyword::Def) => self.parse_funcdef(decorators, line),
            TokenKind::Kw(Keyword::Class) => self.parse_classdef(decorators, line),
            _ => Err(self.expected("'def' or 'class' after decorator")),
        }
    }

    fn parse_funcdef(
        &mut self,
        decorators: Vec<Expr>,
        line: usize,
    ) -> ParseResult<Stmt> {
        self.expect_kw(Keyword::Def)?;
        let name = self.expect_name()?;
        self.expect(&TokenKind::LParen)?;
        let args = self.parse_arguments(&TokenKind::RParen)?;
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_suite()?;
        Ok(Stmt {
            kind: StmtKind::FunctionDef(FuncDef {
                id: AstId::fresh(),
                name,
                args,
                body,
                decorators,
                line,
            }),
            line,
        })
    }

    fn parse_classdef(
        &mut self,
        decorators: Vec<Expr>,
        line: usize,
    ) -> ParseResult<Stmt> {
        self.expect_kw(Keyword::Class)?;
        let name = self.expect_name()?;
        let mut bases = Vec::new();
        if self.skip(&TokenKind::LParen) {
            while !self.at(&TokenKind::RParen) {
                bases.push(self.parse_test()?);
                if !self.skip(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RParen)?;
        }
        let body = self.parse_suite()?;
        Ok(Stmt {
            kind: StmtKind::ClassDef(ClassDef {
                id: AstId::fresh(),
                name,
                bases,
                body,
                decorators,
                line,
            }),
            line,
        })
    }

    /// `if`/`elif` chains nest in the `orelse` branch
    fn parse_if(&mut self) -> ParseResult<Stmt> {
        let line = self.line();
        self.bump(); // 'if' or 'elif'
        let test = self.parse_test()?;
        let body = self.parse_suite()?;
        let orelse = if self.at_kw(Keyword::Elif) {
            vec![self.parse_if()?]
        } else if self.skip_kw(Keyword::Else) {
            self.parse_suite()?
        } else {
            Vec::new()
        };
        Ok(Stmt {
            kind: StmtKind::If { test, body, orelse },
            line,
        })
    }

    fn parse_else(&mut self) -> ParseResult<Vec<Stmt>> {
        if self.skip_kw(Keyword::Else) {
            self.parse_suite()
        } else {
            Ok(Vec::new())
        }
    }

    fn parse_while(&mut self) -> ParseResult<Stmt> {
        let line = self.line();
        self.expect_kw(Keyword::While)?;
        let test = self.parse_test()?;
        let body = self.parse_suite()?;
        let orelse = self.parse_else()?;
        Ok(Stmt {
            kind: StmtKind::While { test, body, orelse },
            line,
        })
    }

    fn parse_for(&mut self) -> ParseResult<Stmt> {
        let line = self.line();
        self.expect_kw(Keyword::For)?;
        let target = self.parse_exprlist()?;
        self.check_target(&target, "for loop")?;
        self.expect_kw(Keyword::In)?;
        let iter = self.parse_testlist()?;
        let body = self.parse_suite()?;
        let orelse = self.parse_else()?;
        Ok(Stmt {
            kind: StmtKind::For {
                target,
                iter,
                body,
                orelse,
            },
            line,
        })
    }

    /// `try/except/else/finally`; with both handlers and `finally` the
    /// except part nests inside a `TryFinally`
    fn parse_try(&mut self) -> ParseResult<Stmt> {
        let line = self.line();
        self.expect_kw(Keyword::Try)?;
        let body = self.parse_suite()?;

        let mut handlers = Vec::new();
        while self.at_kw(Keyword::Except) {
            let handler_line = self.line();
            self.bump();
            let (mut class, mut target) = (None, None);
            if !self.at(&TokenKind::Colon) {
                class = Some(self.parse_test()?);
                if self.skip_kw(Keyword::As) || self.skip(&TokenKind::Comma) {
                    let t = self.parse_test()?;
                    self.check_target(&t, "except clause")?;
                    target = Some(t);
                }
            }
            let handler_body = self.parse_suite()?;
            handlers.push(ExceptHandler {
                class,
                target,
                body: handler_body,
                line: handler_line,
            });
        }

        let orelse = if handlers.is_empty() {
            Vec::new()
        } else {
            self.parse_else()?
        };
        let finalbody = if self.skip_kw(Keyword::Finally) {
            Some(self.parse_suite()?)
        } else {
            None
        };

        let kind = match (handlers.is_empty(), finalbody) {
            (true, None) => return Err(self.expected("'except' or 'finally'")),
            (true, Some(finalbody)) => StmtKind::TryFinally { body, finalbody },
            (false, None) => StmtKind::TryExcept {
                body,
                handlers,
                orelse,
            },
            (false, Some(finalbody)) => StmtKind::TryFinally {
                body: vec![Stmt {
                    kind: StmtKind::TryExcept {
                        body,
                        handlers,
                        orelse,
                    },
                    line,
                }],
                finalbody,
            },
        };
        Ok(Stmt { kind, line })
    }

    /// `with a as x, b as y:` nests one `With` per item
    fn parse_with(&mut self) -> ParseResult<Stmt> {
        let line = self.line();
        self.expect_kw(Keyword::With)?;
        let mut items = Vec::new();
        loop {
            let context = self.parse_test()?;
            let target = if self.skip_kw(Keyword::As) {
                // `as` binds one target; a following comma starts the next item
                let t = self.parse_bitor()?;
                self.check_target(&t, "with statement")?;
                Some(t)
            } else {
                None
            };
            items.push((context, target));
            if !self.skip(&TokenKind::Comma) {
                break;
            }
        }
        let mut body = self.parse_suite()?;
        while let Some((context, target)) = items.pop() {
            body = vec![Stmt {
                kind: StmtKind::With {
                    context,
                    target,
                    body,
                },
                line,
            }];
        }
        body.pop().ok_or_else(|| self.expected("with item"))
    }
}

fn describe(kind: &ExprKind) -> &'static str {
    match kind {
        ExprKind::Call { .. } => "function call",
        ExprKind::Const(_) => "literal",
        ExprKind::Lambda { .. } => "lambda",
        ExprKind::BinOp { .. } | ExprKind::UnaryOp { .. } => "operator",
        ExprKind::Compare { .. } => "comparison",
        ExprKind::BoolOp { .. } => "boolean operation",
        ExprKind::ListComp { .. } => "list comprehension",
        ExprKind::GeneratorExp { .. } => "generator expression",
        ExprKind::Dict(_) | ExprKind::Set(_) => "display",
        ExprKind::IfExp { .. } => "conditional expression",
        ExprKind::Yield(_) => "yield expression",
        ExprKind::Tuple(_) | ExprKind::List(_) => "sequence",
        _ => "expression",
    }
}
