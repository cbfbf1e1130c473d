use crate::diag::{codes, Diagnostic};
use crate::ir::ast::{
    BinaryOp, ClassDecl, Expr, MethodDecl, Modifiers, NamespaceDecl, Param, QualifiedName,
    SourceUnit, Stmt, SyntaxTree, TypeName, UnaryOp, UsingDirective,
};
use crate::parsing::tokenization::{CodeLocation, Token, TokenInfo, Tokenizer};
use crate::runner::LoadedFile;

/// Parse one loaded file into a SourceUnit. Never fails outright: syntax
/// errors are recorded as diagnostics and the parser recovers at the next
/// declaration or statement boundary, so later pipeline stages still see
/// whatever declarations did parse.
pub fn parse_file(file: LoadedFile) -> SourceUnit {
    let (tree, diagnostics) = {
        let mut parser = Parser::new(Tokenizer::new(&file.source));
        let tree = parser.parse_compilation_unit();
        (tree, parser.diagnostics)
    };

    SourceUnit {
        filepath: file.filepath,
        source: file.source,
        tree,
        diagnostics,
    }
}

// Statement- and member-level productions return Err(()) after recording a
// diagnostic; the caller synchronizes and keeps going.
type ParseResult<T> = Result<T, ()>;

struct Parser<'file> {
    tokenizer: Tokenizer<'file>,
    diagnostics: Vec<Diagnostic>,
}

impl<'file> Parser<'file> {
    fn new(tokenizer: Tokenizer<'file>) -> Self {
        Self {
            tokenizer,
            diagnostics: Vec::new(),
        }
    }

    fn peek_token(&mut self) -> Token {
        loop {
            match self.tokenizer.peek(0) {
                Ok(_) => break,
                Err(diag) => self.diagnostics.push(diag),
            }
        }
        self.tokenizer
            .peek(0)
            .ok()
            .expect("[INTERNAL ERR] Peek failed after draining tokenizer errors.")
            .clone()
    }

    fn next_token(&mut self) -> Token {
        loop {
            match self.tokenizer.next() {
                Ok(token) => return token,
                Err(diag) => self.diagnostics.push(diag),
            }
        }
    }

    fn check(&mut self, info: TokenInfo) -> bool {
        self.peek_token().info == info
    }

    fn match_token(&mut self, info: TokenInfo) -> bool {
        if self.check(info) {
            _ = self.next_token();
            return true;
        }

        false
    }

    fn match_op(&mut self, kinds: &[TokenInfo]) -> Option<Token> {
        let token = self.peek_token();
        if kinds.contains(&token.info) {
            _ = self.next_token();
            return Some(token);
        }

        None
    }

    fn expect_token(&mut self, expected: TokenInfo, ctx: &str) -> ParseResult<Token> {
        let token = self.peek_token();
        if token.info == expected {
            return Ok(self.next_token());
        }

        self.diagnostics.push(Diagnostic::error(
            codes::UNEXPECTED_TOKEN,
            format!(
                "expected {} {ctx}, found {}",
                expected.describe(),
                token.info.describe()
            ),
            Some(token.loc),
        ));
        Err(())
    }

    fn expect_ident(&mut self, ctx: &str) -> ParseResult<(String, CodeLocation)> {
        let token = self.peek_token();
        if let TokenInfo::Ident(name) = token.info {
            _ = self.next_token();
            return Ok((name, token.loc));
        }

        self.diagnostics.push(Diagnostic::error(
            codes::UNEXPECTED_TOKEN,
            format!("expected {ctx}, found {}", token.info.describe()),
            Some(token.loc),
        ));
        Err(())
    }

    fn error_at(&mut self, code: &'static str, message: String, loc: CodeLocation) {
        self.diagnostics
            .push(Diagnostic::error(code, message, Some(loc)));
    }
}

// Declarations.
impl<'file> Parser<'file> {
    fn parse_compilation_unit(&mut self) -> SyntaxTree {
        let mut tree = SyntaxTree::default();

        loop {
            let token = self.peek_token();
            match token.info {
                TokenInfo::End => break,
                TokenInfo::Using => match self.parse_using() {
                    Ok(using) => tree.usings.push(using),
                    Err(()) => self.synchronize_top_level(),
                },
                TokenInfo::Namespace => match self.parse_namespace() {
                    Ok(ns) => tree.namespaces.push(ns),
                    Err(()) => self.synchronize_top_level(),
                },
                TokenInfo::Class
                | TokenInfo::Static
                | TokenInfo::Public
                | TokenInfo::Private => match self.parse_class() {
                    Ok(class) => tree.classes.push(class),
                    Err(()) => self.synchronize_top_level(),
                },
                other => {
                    self.error_at(
                        codes::TOP_LEVEL_DECL_EXPECTED,
                        format!(
                            "expected a using directive, namespace or class, found {}",
                            other.describe()
                        ),
                        token.loc,
                    );
                    self.synchronize_top_level();
                }
            }
        }

        tree
    }

    fn parse_using(&mut self) -> ParseResult<UsingDirective> {
        let using_tok = self.next_token();
        let name = self.parse_dotted_name("a namespace name")?;
        self.expect_token(TokenInfo::Semicolon, "after using directive")?;

        Ok(UsingDirective {
            name: name.dotted(),
            loc: using_tok.loc,
        })
    }

    fn parse_namespace(&mut self) -> ParseResult<NamespaceDecl> {
        let ns_tok = self.next_token();
        let name = self.parse_dotted_name("a namespace name")?;
        self.expect_token(TokenInfo::CurlyOpen, "to open namespace body")?;

        let mut classes = Vec::new();
        loop {
            let token = self.peek_token();
            match token.info {
                TokenInfo::CurlyClose => {
                    _ = self.next_token();
                    break;
                }
                TokenInfo::End => {
                    self.error_at(
                        codes::UNEXPECTED_TOKEN,
                        "expected `}` to close namespace body, found end of file".into(),
                        token.loc,
                    );
                    break;
                }
                TokenInfo::Class
                | TokenInfo::Static
                | TokenInfo::Public
                | TokenInfo::Private => match self.parse_class() {
                    Ok(class) => classes.push(class),
                    Err(()) => self.synchronize_body(),
                },
                other => {
                    self.error_at(
                        codes::TOP_LEVEL_DECL_EXPECTED,
                        format!("expected a class declaration, found {}", other.describe()),
                        token.loc,
                    );
                    self.synchronize_body();
                }
            }
        }

        Ok(NamespaceDecl {
            name: name.dotted(),
            classes,
            loc: ns_tok.loc,
        })
    }

    fn parse_class(&mut self) -> ParseResult<ClassDecl> {
        let modifiers = self.parse_modifiers();
        let class_tok = self.expect_token(TokenInfo::Class, "to begin a class declaration")?;
        let (name, _) = self.expect_ident("a class name")?;
        self.expect_token(TokenInfo::CurlyOpen, "to open class body")?;

        let mut methods = Vec::new();
        loop {
            let token = self.peek_token();
            match token.info {
                TokenInfo::CurlyClose => {
                    _ = self.next_token();
                    break;
                }
                TokenInfo::End => {
                    self.error_at(
                        codes::UNEXPECTED_TOKEN,
                        "expected `}` to close class body, found end of file".into(),
                        token.loc,
                    );
                    break;
                }
                _ => match self.parse_method() {
                    Ok(method) => methods.push(method),
                    Err(()) => self.synchronize_body(),
                },
            }
        }

        Ok(ClassDecl {
            name,
            modifiers,
            methods,
            loc: class_tok.loc,
        })
    }

    fn parse_modifiers(&mut self) -> Modifiers {
        let mut modifiers = Modifiers::empty();
        loop {
            match self.peek_token().info {
                TokenInfo::Static => modifiers |= Modifiers::STATIC,
                TokenInfo::Public => modifiers |= Modifiers::PUBLIC,
                TokenInfo::Private => modifiers |= Modifiers::PRIVATE,
                _ => break,
            }
            _ = self.next_token();
        }

        modifiers
    }

    fn parse_method(&mut self) -> ParseResult<MethodDecl> {
        let modifiers = self.parse_modifiers();
        let return_type = self.parse_type_name()?;
        let (name, loc) = self.expect_ident("a method name")?;
        self.expect_token(TokenInfo::ParenOpen, "to open parameter list")?;

        let mut params = Vec::new();
        if !self.match_token(TokenInfo::ParenClose) {
            loop {
                let typ = self.parse_type_name()?;
                let (pname, ploc) = self.expect_ident("a parameter name")?;
                params.push(Param {
                    typ,
                    name: pname,
                    loc: ploc,
                });
                if !self.match_token(TokenInfo::Comma) {
                    break;
                }
            }
            self.expect_token(TokenInfo::ParenClose, "to close parameter list")?;
        }

        let body = self.parse_block()?;

        Ok(MethodDecl {
            name,
            modifiers,
            return_type,
            params,
            body,
            loc,
        })
    }

    fn parse_type_name(&mut self) -> ParseResult<TypeName> {
        let token = self.peek_token();
        let typ = match token.info {
            TokenInfo::Void => TypeName::Void,
            TokenInfo::IntType => TypeName::Int,
            TokenInfo::BoolType => TypeName::Bool,
            TokenInfo::StringType => {
                _ = self.next_token();
                if self.match_token(TokenInfo::SqrBracketOpen) {
                    self.expect_token(TokenInfo::SqrBracketClose, "to close array type")?;
                    return Ok(TypeName::StringArray);
                }
                return Ok(TypeName::String);
            }
            other => {
                self.error_at(
                    codes::UNEXPECTED_TOKEN,
                    format!("expected a type, found {}", other.describe()),
                    token.loc,
                );
                return Err(());
            }
        };
        _ = self.next_token();

        Ok(typ)
    }

    fn parse_dotted_name(&mut self, ctx: &str) -> ParseResult<QualifiedName> {
        let (first, loc) = self.expect_ident(ctx)?;
        let mut segments = vec![first];
        while self.match_token(TokenInfo::Dot) {
            let (next, _) = self.expect_ident("a name after `.`")?;
            segments.push(next);
        }

        Ok(QualifiedName { segments, loc })
    }
}

// Statements.
impl<'file> Parser<'file> {
    fn parse_block(&mut self) -> ParseResult<Vec<Stmt>> {
        self.expect_token(TokenInfo::CurlyOpen, "to open block")?;

        let mut stmts = Vec::new();
        loop {
            let token = self.peek_token();
            match token.info {
                TokenInfo::CurlyClose => {
                    _ = self.next_token();
                    return Ok(stmts);
                }
                TokenInfo::End => {
                    self.error_at(
                        codes::UNEXPECTED_TOKEN,
                        "expected `}` to close block, found end of file".into(),
                        token.loc,
                    );
                    return Err(());
                }
                _ => match self.parse_statement() {
                    Ok(stmt) => stmts.push(stmt),
                    Err(()) => self.synchronize_body(),
                },
            }
        }
    }

    fn parse_statement(&mut self) -> ParseResult<Stmt> {
        let token = self.peek_token();
        match token.info {
            TokenInfo::Var
            | TokenInfo::IntType
            | TokenInfo::StringType
            | TokenInfo::BoolType => self.parse_local_decl(),
            TokenInfo::If => self.parse_if(),
            TokenInfo::While => self.parse_while(),
            TokenInfo::Return => self.parse_return(),
            TokenInfo::CurlyOpen => Ok(Stmt::Block(self.parse_block()?)),
            _ => {
                let expr = self.parse_expression()?;
                self.expect_token(TokenInfo::Semicolon, "after expression statement")?;
                if !matches!(expr, Expr::Call { .. } | Expr::Assign { .. }) {
                    self.error_at(
                        codes::UNEXPECTED_TOKEN,
                        "only call and assignment expressions can be used as a statement".into(),
                        expr.loc(),
                    );
                }
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn parse_local_decl(&mut self) -> ParseResult<Stmt> {
        let typ = if self.match_token(TokenInfo::Var) {
            None
        } else {
            Some(self.parse_type_name()?)
        };
        let (name, loc) = self.expect_ident("a variable name")?;
        self.expect_token(TokenInfo::Assign, "after variable name")?;
        let init = self.parse_expression()?;
        self.expect_token(TokenInfo::Semicolon, "after variable declaration")?;

        Ok(Stmt::Local {
            name,
            typ,
            init,
            loc,
        })
    }

    fn parse_if(&mut self) -> ParseResult<Stmt> {
        let if_tok = self.next_token();
        self.expect_token(TokenInfo::ParenOpen, "after `if`")?;
        let cond = self.parse_expression()?;
        self.expect_token(TokenInfo::ParenClose, "after condition")?;
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.match_token(TokenInfo::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            cond,
            then_branch,
            else_branch,
            loc: if_tok.loc,
        })
    }

    fn parse_while(&mut self) -> ParseResult<Stmt> {
        let while_tok = self.next_token();
        self.expect_token(TokenInfo::ParenOpen, "after `while`")?;
        let cond = self.parse_expression()?;
        self.expect_token(TokenInfo::ParenClose, "after condition")?;
        let body = Box::new(self.parse_statement()?);

        Ok(Stmt::While {
            cond,
            body,
            loc: while_tok.loc,
        })
    }

    fn parse_return(&mut self) -> ParseResult<Stmt> {
        let return_tok = self.next_token();
        let value = if self.match_token(TokenInfo::Semicolon) {
            None
        } else {
            let expr = self.parse_expression()?;
            self.expect_token(TokenInfo::Semicolon, "after return value")?;
            Some(expr)
        };

        Ok(Stmt::Return {
            value,
            loc: return_tok.loc,
        })
    }
}

// Expressions, lowest precedence first.
impl<'file> Parser<'file> {
    fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> ParseResult<Expr> {
        let expr = self.parse_or()?;
        if let Some(assign_tok) = self.match_op(&[TokenInfo::Assign]) {
            let value = self.parse_assignment()?;
            return match expr {
                Expr::Name(target) => Ok(Expr::Assign {
                    target,
                    value: Box::new(value),
                    loc: assign_tok.loc,
                }),
                other => {
                    self.error_at(
                        codes::INVALID_ASSIGN_TARGET,
                        "invalid assignment target".into(),
                        other.loc(),
                    );
                    Err(())
                }
            };
        }

        Ok(expr)
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_and()?;
        while let Some(op_tok) = self.match_op(&[TokenInfo::OrOr]) {
            let rhs = self.parse_and()?;
            lhs = Expr::Binary(BinaryOp::Or, Box::new(lhs), Box::new(rhs), op_tok.loc);
        }

        Ok(lhs)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_equality()?;
        while let Some(op_tok) = self.match_op(&[TokenInfo::AndAnd]) {
            let rhs = self.parse_equality()?;
            lhs = Expr::Binary(BinaryOp::And, Box::new(lhs), Box::new(rhs), op_tok.loc);
        }

        Ok(lhs)
    }

    fn parse_equality(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_comparison()?;
        while let Some(op_tok) = self.match_op(&[TokenInfo::Eq, TokenInfo::Ne]) {
            let op = match op_tok.info {
                TokenInfo::Eq => BinaryOp::Eq,
                _ => BinaryOp::Ne,
            };
            let rhs = self.parse_comparison()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs), op_tok.loc);
        }

        Ok(lhs)
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_term()?;
        while let Some(op_tok) =
            self.match_op(&[TokenInfo::Lt, TokenInfo::Le, TokenInfo::Gt, TokenInfo::Ge])
        {
            let op = match op_tok.info {
                TokenInfo::Lt => BinaryOp::Lt,
                TokenInfo::Le => BinaryOp::Le,
                TokenInfo::Gt => BinaryOp::Gt,
                _ => BinaryOp::Ge,
            };
            let rhs = self.parse_term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs), op_tok.loc);
        }

        Ok(lhs)
    }

    fn parse_term(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_factor()?;
        while let Some(op_tok) = self.match_op(&[TokenInfo::Plus, TokenInfo::Dash]) {
            let op = match op_tok.info {
                TokenInfo::Plus => BinaryOp::Add,
                _ => BinaryOp::Sub,
            };
            let rhs = self.parse_factor()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs), op_tok.loc);
        }

        Ok(lhs)
    }

    fn parse_factor(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_unary()?;
        while let Some(op_tok) =
            self.match_op(&[TokenInfo::Star, TokenInfo::Slash, TokenInfo::Percent])
        {
            let op = match op_tok.info {
                TokenInfo::Star => BinaryOp::Mul,
                TokenInfo::Slash => BinaryOp::Div,
                _ => BinaryOp::Mod,
            };
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs), op_tok.loc);
        }

        Ok(lhs)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        if let Some(op_tok) = self.match_op(&[TokenInfo::Bang, TokenInfo::Dash]) {
            let op = match op_tok.info {
                TokenInfo::Bang => UnaryOp::Not,
                _ => UnaryOp::Neg,
            };
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary(op, Box::new(operand), op_tok.loc));
        }

        self.parse_call()
    }

    fn parse_call(&mut self) -> ParseResult<Expr> {
        let expr = self.parse_primary()?;

        if let Expr::Name(callee) = expr {
            if self.match_token(TokenInfo::ParenOpen) {
                let args = self.parse_arguments()?;
                let loc = callee.loc;
                return Ok(Expr::Call { callee, args, loc });
            }
            return Ok(Expr::Name(callee));
        }

        Ok(expr)
    }

    fn parse_arguments(&mut self) -> ParseResult<Vec<Expr>> {
        let mut args = Vec::new();
        if self.match_token(TokenInfo::ParenClose) {
            return Ok(args);
        }

        loop {
            args.push(self.parse_expression()?);
            if !self.match_token(TokenInfo::Comma) {
                break;
            }
        }
        self.expect_token(TokenInfo::ParenClose, "to close argument list")?;

        Ok(args)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        // The offending token is left unconsumed on error so recovery can
        // synchronize on it.
        let token = self.peek_token();
        match token.info {
            TokenInfo::Int(n) => {
                _ = self.next_token();
                Ok(Expr::Int(n, token.loc))
            }
            TokenInfo::Str(s) => {
                _ = self.next_token();
                Ok(Expr::Str(s, token.loc))
            }
            TokenInfo::True => {
                _ = self.next_token();
                Ok(Expr::Bool(true, token.loc))
            }
            TokenInfo::False => {
                _ = self.next_token();
                Ok(Expr::Bool(false, token.loc))
            }
            TokenInfo::ParenOpen => {
                _ = self.next_token();
                let expr = self.parse_expression()?;
                self.expect_token(TokenInfo::ParenClose, "to close parenthesized expression")?;
                Ok(expr)
            }
            TokenInfo::Ident(first) => {
                _ = self.next_token();
                let mut segments = vec![first];
                while self.match_token(TokenInfo::Dot) {
                    let (next, _) = self.expect_ident("a name after `.`")?;
                    segments.push(next);
                }
                Ok(Expr::Name(QualifiedName {
                    segments,
                    loc: token.loc,
                }))
            }
            other => {
                self.error_at(
                    codes::UNEXPECTED_TOKEN,
                    format!("expected an expression, found {}", other.describe()),
                    token.loc,
                );
                Err(())
            }
        }
    }
}

// Recovery.
impl<'file> Parser<'file> {
    /// Skip to the next plausible top-level declaration, consuming a whole
    /// brace-balanced body if one was started.
    fn synchronize_top_level(&mut self) {
        let mut depth = 0usize;
        loop {
            let token = self.peek_token();
            match token.info {
                TokenInfo::End => return,
                TokenInfo::CurlyOpen => {
                    depth += 1;
                    _ = self.next_token();
                }
                TokenInfo::CurlyClose => {
                    _ = self.next_token();
                    if depth > 0 {
                        depth -= 1;
                        if depth == 0 {
                            return;
                        }
                    }
                }
                TokenInfo::Semicolon if depth == 0 => {
                    _ = self.next_token();
                    return;
                }
                TokenInfo::Using | TokenInfo::Namespace | TokenInfo::Class if depth == 0 => {
                    return;
                }
                _ => _ = self.next_token(),
            }
        }
    }

    /// Skip to the next `;` or past a brace-balanced sub-body, leaving a
    /// closing `}` of the enclosing body for the caller.
    fn synchronize_body(&mut self) {
        let mut depth = 0usize;
        loop {
            let token = self.peek_token();
            match token.info {
                TokenInfo::End => return,
                TokenInfo::CurlyOpen => {
                    depth += 1;
                    _ = self.next_token();
                }
                TokenInfo::CurlyClose => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                    _ = self.next_token();
                    if depth == 0 {
                        return;
                    }
                }
                TokenInfo::Semicolon if depth == 0 => {
                    _ = self.next_token();
                    return;
                }
                _ => _ = self.next_token(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(source: &str) -> SourceUnit {
        parse_file(LoadedFile {
            filepath: PathBuf::from("test.cs"),
            source: source.to_string(),
        })
    }

    const HELLO: &str = r#"
using System;

class Program
{
    static void Main()
    {
        Console.WriteLine("Hello, World!");
    }
}
"#;

    #[test]
    fn parses_hello_world_shape() {
        let unit = parse(HELLO);
        assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
        assert_eq!(unit.tree.usings.len(), 1);
        assert_eq!(unit.tree.usings[0].name, "System");
        assert_eq!(unit.tree.classes.len(), 1);

        let class = &unit.tree.classes[0];
        assert_eq!(class.name, "Program");
        assert_eq!(class.methods.len(), 1);

        let main = &class.methods[0];
        assert_eq!(main.name, "Main");
        assert!(main.modifiers.contains(Modifiers::STATIC));
        assert_eq!(main.return_type, TypeName::Void);
        assert!(main.params.is_empty());
        assert_eq!(main.body.len(), 1);
    }

    #[test]
    fn parses_namespaces_with_qualified_classes() {
        let unit = parse(
            "namespace My.App { class Program { static void Main() { } } }",
        );
        assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);

        let classes: Vec<_> = unit.tree.qualified_classes().collect();
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].0, "My.App.Program");
    }

    #[test]
    fn parses_string_array_parameter() {
        let unit = parse("class P { static void Main(string[] args) { } }");
        assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
        let main = &unit.tree.classes[0].methods[0];
        assert_eq!(main.params.len(), 1);
        assert_eq!(main.params[0].typ, TypeName::StringArray);
    }

    #[test]
    fn recovers_from_statement_error_and_keeps_declarations() {
        let unit = parse(
            r#"
class P
{
    static void Main()
    {
        var x = ;
        Console.WriteLine("still here");
    }
}
"#,
        );
        assert!(!unit.diagnostics.is_empty());
        assert!(unit
            .diagnostics
            .iter()
            .any(|d| d.code == codes::UNEXPECTED_TOKEN));

        // Recovery keeps the class and its Main discoverable.
        let main = &unit.tree.classes[0].methods[0];
        assert_eq!(main.name, "Main");
        assert_eq!(main.body.len(), 1);
    }

    #[test]
    fn rejects_stray_top_level_statements() {
        let unit = parse("var x = 1;");
        assert!(unit
            .diagnostics
            .iter()
            .any(|d| d.code == codes::TOP_LEVEL_DECL_EXPECTED));
        assert!(unit.tree.classes.is_empty());
    }

    #[test]
    fn method_outside_class_is_skipped_with_a_diagnostic() {
        let unit = parse("static void Main() { }");
        assert!(!unit.diagnostics.is_empty());
        assert!(unit.tree.classes.is_empty());
    }

    #[test]
    fn parses_control_flow_and_expressions() {
        let unit = parse(
            r#"
class P
{
    static int Sum(int n)
    {
        var total = 0;
        var i = 1;
        while (i <= n)
        {
            total = total + i;
            i = i + 1;
        }
        if (total > 10 && n != 0) { return total; } else { return 0 - total; }
    }

    static void Main() { Sum(4); }
}
"#,
        );
        assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
        let sum = &unit.tree.classes[0].methods[0];
        assert_eq!(sum.params.len(), 1);
        assert_eq!(sum.body.len(), 4);
    }
}
