use std::path::PathBuf;

use bitflags::bitflags;

use crate::diag::Diagnostic;
use crate::parsing::tokenization::CodeLocation;

/// One parsed source file: the text, its derived syntax tree and any
/// syntax diagnostics recorded while building it. Immutable after parse.
#[derive(Debug)]
pub struct SourceUnit {
    pub filepath: PathBuf,
    pub source: String,
    pub tree: SyntaxTree,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Default)]
pub struct SyntaxTree {
    pub usings: Vec<UsingDirective>,
    pub namespaces: Vec<NamespaceDecl>,
    pub classes: Vec<ClassDecl>,
}

impl SyntaxTree {
    /// All declared classes paired with their fully qualified names.
    pub fn qualified_classes(&self) -> impl Iterator<Item = (String, &ClassDecl)> {
        let top_level = self.classes.iter().map(|class| (class.name.clone(), class));
        let namespaced = self.namespaces.iter().flat_map(|ns| {
            ns.classes
                .iter()
                .map(move |class| (format!("{}.{}", ns.name, class.name), class))
        });
        top_level.chain(namespaced)
    }
}

#[derive(Debug)]
pub struct UsingDirective {
    pub name: String,
    pub loc: CodeLocation,
}

#[derive(Debug)]
pub struct NamespaceDecl {
    pub name: String,
    pub classes: Vec<ClassDecl>,
    pub loc: CodeLocation,
}

#[derive(Debug)]
pub struct ClassDecl {
    pub name: String,
    pub modifiers: Modifiers,
    pub methods: Vec<MethodDecl>,
    pub loc: CodeLocation,
}

#[derive(Debug)]
pub struct MethodDecl {
    pub name: String,
    pub modifiers: Modifiers,
    pub return_type: TypeName,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub loc: CodeLocation,
}

#[derive(Debug)]
pub struct Param {
    pub typ: TypeName,
    pub name: String,
    pub loc: CodeLocation,
}

bitflags! {
    #[derive(Default)]
    pub struct Modifiers: u32 {
        const STATIC  = 0x1;
        const PUBLIC  = 0x2;
        const PRIVATE = 0x4;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeName {
    Void,
    Int,
    Bool,
    String,
    StringArray,
}

#[derive(Debug)]
pub enum Stmt {
    Local {
        name: String,
        typ: Option<TypeName>,
        init: Expr,
        loc: CodeLocation,
    },
    Expr(Expr),
    Return {
        value: Option<Expr>,
        loc: CodeLocation,
    },
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
        loc: CodeLocation,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
        loc: CodeLocation,
    },
    Block(Vec<Stmt>),
}

/// A possibly dotted name as written in the source (`x`, `Console.WriteLine`).
#[derive(Clone, Debug)]
pub struct QualifiedName {
    pub segments: Vec<String>,
    pub loc: CodeLocation,
}

impl QualifiedName {
    pub fn is_simple(&self) -> bool {
        self.segments.len() == 1
    }

    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }
}

#[derive(Debug)]
pub enum Expr {
    Int(i64, CodeLocation),
    Bool(bool, CodeLocation),
    Str(String, CodeLocation),
    Name(QualifiedName),
    Unary(UnaryOp, Box<Expr>, CodeLocation),
    Binary(BinaryOp, Box<Expr>, Box<Expr>, CodeLocation),
    Assign {
        target: QualifiedName,
        value: Box<Expr>,
        loc: CodeLocation,
    },
    Call {
        callee: QualifiedName,
        args: Vec<Expr>,
        loc: CodeLocation,
    },
}

impl Expr {
    pub fn loc(&self) -> CodeLocation {
        match self {
            Expr::Int(_, loc)
            | Expr::Bool(_, loc)
            | Expr::Str(_, loc)
            | Expr::Unary(_, _, loc)
            | Expr::Binary(_, _, _, loc) => *loc,
            Expr::Name(name) => name.loc,
            Expr::Assign { loc, .. } | Expr::Call { loc, .. } => *loc,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}
