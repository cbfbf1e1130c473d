use std::fs;

use crate::codegen::exe::{CompiledImage, ImageBuilder, OutputKind};
use crate::codegen::inst::Instruction;
use crate::diag::{codes, Diagnostic, Severity};
use crate::ir::ast::{BinaryOp, Expr, MethodDecl, QualifiedName, SourceUnit, Stmt, UnaryOp};
use crate::parsing::tokenization::CodeLocation;
use crate::resolve::refs::{ReferenceSet, BASE_NAMESPACE};
use crate::runtime::builtins::{self, BUILTINS};
use crate::runtime::module::{LoadedModule, Resolution};

#[derive(Clone, Copy, Debug)]
pub struct CompileOptions {
    pub kind: OutputKind,
    pub warnings_as_errors: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            kind: OutputKind::Executable,
            warnings_as_errors: false,
        }
    }
}

/// A successful compilation: the image, any warnings that didn't fail the
/// build, and the referenced library modules keyed by their runtime index
/// (`libraries[i]` runs as module `i + 1`).
#[derive(Debug)]
pub struct CompiledOutput {
    pub image: CompiledImage,
    pub warnings: Vec<Diagnostic>,
    pub libraries: Vec<LoadedModule>,
}

/// Compile one parsed source unit against its resolved references.
/// Fails with the full diagnostic list if anything reportable was found,
/// syntax diagnostics from the parse included.
pub fn compile_unit(
    unit: &SourceUnit,
    refs: &ReferenceSet,
    options: &CompileOptions,
) -> Result<CompiledOutput, Vec<Diagnostic>> {
    let mut diagnostics = unit.diagnostics.clone();

    let libs = import_references(refs, &mut diagnostics);

    let mut builder = ImageBuilder::new(options.kind);
    let methods = declare_methods(unit, &mut builder, &mut diagnostics);

    for declared in &methods {
        let mut function = FunctionCompiler {
            builder: &mut builder,
            methods: &methods,
            libs: &libs,
            options,
            diagnostics: &mut diagnostics,
            current_type: &declared.type_name,
            code: Vec::new(),
            scopes: Vec::new(),
            n_locals: 0,
            jump_overflow: false,
        };
        let (n_locals, code) = function.compile(declared.decl);
        builder.attach_code(declared.sym, n_locals, code);
    }

    if options.warnings_as_errors {
        for diagnostic in &mut diagnostics {
            if diagnostic.severity == Severity::Warning {
                diagnostic.escalated = true;
            }
        }
    }

    if diagnostics.iter().any(Diagnostic::is_reportable) {
        return Err(diagnostics);
    }

    Ok(CompiledOutput {
        image: builder.build(),
        warnings: diagnostics,
        libraries: libs.into_iter().map(|lib| lib.module).collect(),
    })
}

struct ImportedLib {
    namespace: String,
    lib_index: u8,
    module: LoadedModule,
}

/// Load every referenced library image so calls into them can be resolved
/// at compile time. Unreadable images become empty modules so runtime
/// indices stay aligned; the failure is surfaced as a warning.
fn import_references(refs: &ReferenceSet, diagnostics: &mut Vec<Diagnostic>) -> Vec<ImportedLib> {
    let mut libs = Vec::new();
    for (i, lib) in refs.external().enumerate() {
        let path = lib
            .path
            .as_ref()
            .expect("[INTERNAL ERR] External reference without a path.");

        let module = match fs::read(path).map_err(|e| e.to_string()).and_then(|bytes| {
            LoadedModule::load(&bytes).map_err(|e| e.to_string())
        }) {
            Ok(module) => module,
            Err(reason) => {
                diagnostics.push(Diagnostic::warning(
                    codes::UNREADABLE_REFERENCE,
                    format!(
                        "referenced library `{}` could not be loaded from {}: {reason}",
                        lib.namespace,
                        path.display()
                    ),
                    None,
                ));
                LoadedModule::empty()
            }
        };

        libs.push(ImportedLib {
            namespace: lib.namespace.clone(),
            lib_index: (i + 1) as u8,
            module,
        });
    }

    libs
}

struct DeclaredMethod<'unit> {
    type_name: String,
    method_name: String,
    arity: u8,
    sym: u16,
    decl: &'unit MethodDecl,
}

fn declare_methods<'unit>(
    unit: &'unit SourceUnit,
    builder: &mut ImageBuilder,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<DeclaredMethod<'unit>> {
    let mut methods: Vec<DeclaredMethod> = Vec::new();

    for (type_name, class) in unit.tree.qualified_classes() {
        for method in &class.methods {
            let arity = match u8::try_from(method.params.len()) {
                Ok(arity) => arity,
                Err(_) => {
                    diagnostics.push(Diagnostic::error(
                        codes::TOO_MANY_LOCALS,
                        format!(
                            "method `{type_name}.{}` has too many parameters",
                            method.name
                        ),
                        Some(method.loc),
                    ));
                    continue;
                }
            };

            let duplicate = methods.iter().any(|m| {
                m.type_name == type_name && m.method_name == method.name && m.arity == arity
            });
            if duplicate {
                diagnostics.push(Diagnostic::error(
                    codes::DUPLICATE_METHOD,
                    format!(
                        "type `{type_name}` already defines a method `{}` with {arity} parameters",
                        method.name
                    ),
                    Some(method.loc),
                ));
                continue;
            }

            let sym = builder.declare_method(&type_name, &method.name, arity);
            methods.push(DeclaredMethod {
                type_name: type_name.clone(),
                method_name: method.name.clone(),
                arity,
                sym,
                decl: method,
            });
        }
    }

    methods
}

struct LocalSlot {
    name: String,
    slot: u8,
    loc: CodeLocation,
    used: bool,
}

struct FunctionCompiler<'a, 'unit> {
    builder: &'a mut ImageBuilder,
    methods: &'a [DeclaredMethod<'unit>],
    libs: &'a [ImportedLib],
    options: &'a CompileOptions,
    diagnostics: &'a mut Vec<Diagnostic>,
    current_type: &'a str,
    code: Vec<u8>,
    scopes: Vec<Vec<LocalSlot>>,
    n_locals: u8,
    jump_overflow: bool,
}

impl<'a, 'unit> FunctionCompiler<'a, 'unit> {
    /// Compile a method body to bytecode. Never aborts: resolution failures
    /// are recorded as diagnostics and stand-in code keeps the stack shape
    /// intact, so one bad call doesn't hide errors after it.
    fn compile(&mut self, method: &MethodDecl) -> (u8, Vec<u8>) {
        self.begin_scope();
        for param in &method.params {
            self.declare_local(&param.name, param.loc, true);
        }

        for stmt in &method.body {
            self.compile_stmt(stmt);
        }

        self.end_scope();
        self.emit(Instruction::Ret_0); // fall-off-the-end guard

        if self.jump_overflow {
            self.error(
                codes::METHOD_TOO_LARGE,
                format!(
                    "method `{}` compiles to more code than a jump can span",
                    method.name
                ),
                method.loc,
            );
        }

        (self.n_locals, std::mem::take(&mut self.code))
    }

    fn error(&mut self, code: &'static str, message: String, loc: CodeLocation) {
        self.diagnostics
            .push(Diagnostic::error(code, message, Some(loc)));
    }

    // Scopes and locals.

    fn begin_scope(&mut self) {
        self.scopes.push(Vec::new());
    }

    fn end_scope(&mut self) {
        let scope = self
            .scopes
            .pop()
            .expect("[INTERNAL ERR] Popped scope that was never pushed.");
        for local in &scope {
            if !local.used {
                self.diagnostics.push(Diagnostic::warning(
                    codes::UNUSED_LOCAL,
                    format!("the variable `{}` is declared but never used", local.name),
                    Some(local.loc),
                ));
            }
        }
    }

    fn active_locals(&self) -> usize {
        self.scopes.iter().map(Vec::len).sum()
    }

    fn declare_local(&mut self, name: &str, loc: CodeLocation, used: bool) -> Option<u8> {
        if self
            .scopes
            .iter()
            .flatten()
            .any(|local| local.name == name)
        {
            self.error(
                codes::DUPLICATE_LOCAL,
                format!("a variable named `{name}` is already declared in this method"),
                loc,
            );
            return None;
        }

        // Slot 255 is unusable: n_locals itself is a u8.
        let slot = match u8::try_from(self.active_locals()) {
            Ok(slot) if slot < u8::MAX => slot,
            _ => {
                self.error(
                    codes::TOO_MANY_LOCALS,
                    format!("too many locals, cannot declare `{name}`"),
                    loc,
                );
                return None;
            }
        };

        self.n_locals = self.n_locals.max(slot + 1);
        self.scopes
            .last_mut()
            .expect("[INTERNAL ERR] Declared local outside any scope.")
            .push(LocalSlot {
                name: name.to_string(),
                slot,
                loc,
                used,
            });

        Some(slot)
    }

    fn lookup_local(&mut self, name: &str) -> Option<u8> {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(local) = scope.iter_mut().find(|local| local.name == name) {
                local.used = true;
                return Some(local.slot);
            }
        }

        None
    }

    // Emission.

    fn emit(&mut self, inst: Instruction) {
        self.code.push(inst as u8);
    }

    fn emit_u8(&mut self, byte: u8) {
        self.code.push(byte);
    }

    fn emit_u16(&mut self, value: u16) {
        self.code.extend_from_slice(&value.to_le_bytes());
    }

    fn emit_i64(&mut self, value: i64) {
        self.code.extend_from_slice(&value.to_le_bytes());
    }

    /// Emit a forward jump with a placeholder offset; returns the operand
    /// position for `patch_jump`.
    fn emit_jump(&mut self, inst: Instruction) -> usize {
        self.emit(inst);
        let operand_at = self.code.len();
        self.emit_u16(0);
        operand_at
    }

    /// A jump operand is a u16, so a method body can outgrow what its jumps
    /// can span. The overflow is flagged and reported once per method; the
    /// zeroed operand never runs because the diagnostic fails the build.
    fn patch_jump(&mut self, operand_at: usize) {
        match u16::try_from(self.code.len() - (operand_at + 2)) {
            Ok(rel) => self.code[operand_at..operand_at + 2].copy_from_slice(&rel.to_le_bytes()),
            Err(_) => self.jump_overflow = true,
        }
    }

    fn emit_jump_back(&mut self, target: usize) {
        let rel = match u16::try_from(self.code.len() + 3 - target) {
            Ok(rel) => rel,
            Err(_) => {
                self.jump_overflow = true;
                0
            }
        };
        self.emit(Instruction::JumpBack);
        self.emit_u16(rel);
    }

    /// Replaces a failed expression's value so surrounding code still sees
    /// the operands it expects.
    fn emit_error_placeholder(&mut self) {
        self.emit(Instruction::Lit_0);
    }

    // Statements.

    fn compile_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Local {
                name, init, loc, ..
            } => {
                self.compile_expr(init);
                match self.declare_local(name, *loc, false) {
                    Some(slot) => {
                        self.emit(Instruction::Store);
                        self.emit_u8(slot);
                    }
                    None => self.emit(Instruction::Pop),
                }
            }
            Stmt::Expr(expr) => {
                self.compile_expr(expr);
                self.emit(Instruction::Pop);
            }
            Stmt::Return { value, .. } => match value {
                Some(expr) => {
                    self.compile_expr(expr);
                    self.emit(Instruction::Ret);
                }
                None => self.emit(Instruction::Ret_0),
            },
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                self.compile_expr(cond);
                let to_else = self.emit_jump(Instruction::JumpFalse);
                self.compile_stmt(then_branch);
                match else_branch {
                    Some(else_branch) => {
                        let to_end = self.emit_jump(Instruction::Jump);
                        self.patch_jump(to_else);
                        self.compile_stmt(else_branch);
                        self.patch_jump(to_end);
                    }
                    None => self.patch_jump(to_else),
                }
            }
            Stmt::While { cond, body, .. } => {
                let loop_start = self.code.len();
                self.compile_expr(cond);
                let to_end = self.emit_jump(Instruction::JumpFalse);
                self.compile_stmt(body);
                self.emit_jump_back(loop_start);
                self.patch_jump(to_end);
            }
            Stmt::Block(stmts) => {
                self.begin_scope();
                for stmt in stmts {
                    self.compile_stmt(stmt);
                }
                self.end_scope();
            }
        }
    }

    // Expressions. Each leaves exactly one value on the stack.

    fn compile_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Int(0, _) => self.emit(Instruction::Lit_0),
            Expr::Int(1, _) => self.emit(Instruction::Lit_1),
            Expr::Int(n, _) => {
                self.emit(Instruction::Lit_Int);
                self.emit_i64(*n);
            }
            Expr::Bool(true, _) => self.emit(Instruction::Lit_True),
            Expr::Bool(false, _) => self.emit(Instruction::Lit_False),
            Expr::Str(s, _) => {
                let idx = self.builder.add_str_constant(s);
                self.emit(Instruction::PushConst_Str);
                self.emit_u16(idx);
            }
            Expr::Name(name) => self.compile_name(name),
            Expr::Unary(op, operand, _) => {
                self.compile_expr(operand);
                self.emit(match op {
                    UnaryOp::Neg => Instruction::Neg,
                    UnaryOp::Not => Instruction::Not,
                });
            }
            Expr::Binary(BinaryOp::And, lhs, rhs, _) => {
                self.compile_expr(lhs);
                let short_circuit = self.emit_jump(Instruction::JumpFalseNoPop);
                self.emit(Instruction::Pop);
                self.compile_expr(rhs);
                self.patch_jump(short_circuit);
            }
            Expr::Binary(BinaryOp::Or, lhs, rhs, _) => {
                self.compile_expr(lhs);
                let short_circuit = self.emit_jump(Instruction::JumpTrueNoPop);
                self.emit(Instruction::Pop);
                self.compile_expr(rhs);
                self.patch_jump(short_circuit);
            }
            Expr::Binary(op, lhs, rhs, _) => {
                self.compile_expr(lhs);
                self.compile_expr(rhs);
                self.emit(match op {
                    BinaryOp::Add => Instruction::Add,
                    BinaryOp::Sub => Instruction::Sub,
                    BinaryOp::Mul => Instruction::Mul,
                    BinaryOp::Div => Instruction::Div,
                    BinaryOp::Mod => Instruction::Mod,
                    BinaryOp::Eq => Instruction::Eq,
                    BinaryOp::Ne => Instruction::Ne,
                    BinaryOp::Lt => Instruction::Lt,
                    BinaryOp::Le => Instruction::Le,
                    BinaryOp::Gt => Instruction::Gt,
                    BinaryOp::Ge => Instruction::Ge,
                    BinaryOp::And | BinaryOp::Or => {
                        panic!("[INTERNAL ERR] Logic operators compile to jumps.")
                    }
                });
            }
            Expr::Assign { target, value, loc } => {
                self.compile_expr(value);
                self.emit(Instruction::Dup);
                if !target.is_simple() {
                    self.error(
                        codes::INVALID_ASSIGN_TARGET,
                        format!("cannot assign to `{}`", target.dotted()),
                        *loc,
                    );
                    self.emit(Instruction::Pop);
                    return;
                }
                match self.lookup_local(&target.segments[0]) {
                    Some(slot) => {
                        self.emit(Instruction::Store);
                        self.emit_u8(slot);
                    }
                    None => {
                        self.error(
                            codes::UNDEFINED_NAME,
                            format!(
                                "the name `{}` does not exist in the current context",
                                target.dotted()
                            ),
                            *loc,
                        );
                        self.emit(Instruction::Pop);
                    }
                }
            }
            Expr::Call { callee, args, loc } => {
                for arg in args {
                    self.compile_expr(arg);
                }
                self.compile_call(callee, args.len() as u8, *loc);
            }
        }
    }

    fn compile_name(&mut self, name: &QualifiedName) {
        if name.is_simple() {
            if let Some(slot) = self.lookup_local(&name.segments[0]) {
                self.emit(Instruction::Load);
                self.emit_u8(slot);
                return;
            }
        }

        self.error(
            codes::UNDEFINED_NAME,
            format!(
                "the name `{}` does not exist in the current context",
                name.dotted()
            ),
            name.loc,
        );
        self.emit_error_placeholder();
    }

    // Call resolution: methods of this unit first, then builtins of the
    // base namespace, then symbols of referenced library images.

    fn compile_call(&mut self, callee: &QualifiedName, argc: u8, loc: CodeLocation) {
        let method_name = callee
            .segments
            .last()
            .expect("[INTERNAL ERR] Callee with no segments.");
        let qualifier = callee.segments[..callee.segments.len() - 1].join(".");

        // Unit methods. A bare name targets the enclosing class.
        let mut name_matched = false;
        for m in self.methods {
            let type_matches = if callee.is_simple() {
                m.type_name == self.current_type
            } else {
                m.type_name == qualifier || m.type_name.ends_with(&format!(".{qualifier}"))
            };
            if !type_matches || &m.method_name != method_name {
                continue;
            }

            name_matched = true;
            if m.arity == argc {
                let sym = m.sym;
                self.emit(Instruction::Call);
                self.emit_u16(sym);
                self.emit_u8(argc);
                return;
            }
        }
        if name_matched {
            self.error(
                codes::ARGUMENT_COUNT_MISMATCH,
                format!("no overload for method `{method_name}` takes {argc} arguments"),
                loc,
            );
            self.discard_args_and_placeholder(argc);
            return;
        }

        // Builtins. The base namespace prefix is optional.
        if !callee.is_simple() {
            let dotted = callee.dotted();
            let builtin_name = dotted
                .strip_prefix(&format!("{BASE_NAMESPACE}."))
                .unwrap_or(&dotted);
            if let Some(&builtin) = builtins::BUILTIN_IDS.get(builtin_name) {
                let info = &BUILTINS[builtin as usize];
                if argc < info.min_args || argc > info.max_args {
                    self.error(
                        codes::ARGUMENT_COUNT_MISMATCH,
                        format!("no overload for method `{method_name}` takes {argc} arguments"),
                        loc,
                    );
                    self.discard_args_and_placeholder(argc);
                    return;
                }
                self.emit(Instruction::CallBuiltin);
                self.emit_u8(builtin);
                self.emit_u8(argc);
                return;
            }
        }

        // Referenced libraries.
        if !callee.is_simple() {
            for i in 0..self.libs.len() {
                let lib = &self.libs[i];
                // Library symbols carry namespace-qualified type names; the
                // caller may have written the short form.
                let mut resolution = lib.module.resolve_with_arity(&qualifier, method_name, argc);
                if resolution == Resolution::NotFound {
                    resolution = lib.module.resolve_with_arity(
                        &format!("{}.{qualifier}", lib.namespace),
                        method_name,
                        argc,
                    );
                }
                match resolution {
                    Resolution::NotFound => continue,
                    Resolution::AmbiguousArity => {
                        self.error(
                            codes::ARGUMENT_COUNT_MISMATCH,
                            format!(
                                "no overload for method `{method_name}` takes {argc} arguments"
                            ),
                            loc,
                        );
                        self.discard_args_and_placeholder(argc);
                        return;
                    }
                    Resolution::Ok(handle) => {
                        if self.options.kind == OutputKind::Library {
                            let namespace = self.libs[i].namespace.clone();
                            self.error(
                                codes::EXTERN_CALL_IN_LIBRARY,
                                format!(
                                    "library code cannot call into referenced library `{namespace}`"
                                ),
                                loc,
                            );
                            self.discard_args_and_placeholder(argc);
                            return;
                        }
                        let lib_index = self.libs[i].lib_index;
                        let sym: u16 = handle
                            .symbol
                            .try_into()
                            .expect("[INTERNAL ERR] Library symbol index exceeds u16.");
                        self.emit(Instruction::CallExtern);
                        self.emit_u8(lib_index);
                        self.emit_u16(sym);
                        self.emit_u8(argc);
                        return;
                    }
                }
            }
        }

        // Nothing matched. Blame the type if we know it, the name otherwise.
        let known_type = !qualifier.is_empty()
            && self.methods.iter().any(|m| {
                m.type_name == qualifier || m.type_name.ends_with(&format!(".{qualifier}"))
            });
        if known_type {
            self.error(
                codes::UNKNOWN_METHOD,
                format!("`{qualifier}` does not contain a method named `{method_name}`"),
                loc,
            );
        } else {
            self.error(
                codes::UNDEFINED_NAME,
                format!(
                    "the name `{}` does not exist in the current context",
                    callee.dotted()
                ),
                loc,
            );
        }
        self.discard_args_and_placeholder(argc);
    }

    /// Pop the already-compiled arguments of an unresolvable call and push
    /// a stand-in result.
    fn discard_args_and_placeholder(&mut self, argc: u8) {
        for _ in 0..argc {
            self.emit(Instruction::Pop);
        }
        self.emit_error_placeholder();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::parsing::parse_file;
    use crate::resolve::refs::NullResolver;
    use crate::runner::LoadedFile;
    use std::path::PathBuf;

    fn unit_of(source: &str) -> SourceUnit {
        parse_file(LoadedFile {
            filepath: PathBuf::from("test.cs"),
            source: source.to_string(),
        })
    }

    fn compile(source: &str) -> Result<CompiledOutput, Vec<Diagnostic>> {
        compile_with(source, &CompileOptions::default())
    }

    fn compile_with(
        source: &str,
        options: &CompileOptions,
    ) -> Result<CompiledOutput, Vec<Diagnostic>> {
        let unit = unit_of(source);
        let refs = ReferenceSet::resolve(&unit.tree, &NullResolver);
        compile_unit(&unit, &refs, options)
    }

    fn codes_of(diagnostics: &[Diagnostic]) -> Vec<&'static str> {
        diagnostics.iter().map(|d| d.code).collect()
    }

    #[test]
    fn compiles_hello_world() {
        let output = compile(
            r#"
using System;
class Program { static void Main() { Console.WriteLine("Hello, World!"); } }
"#,
        )
        .unwrap();

        assert!(output.warnings.is_empty());
        let image = &output.image;
        assert_eq!(image.kind, OutputKind::Executable);
        assert_eq!(image.symbols.len(), 1);
        assert_eq!(image.symbols[0].type_name, "Program");
        assert_eq!(image.symbols[0].method_name, "Main");
        assert_eq!(image.constants, vec!["Hello, World!".to_string()]);
        assert!(image.code.contains(&(Instruction::CallBuiltin as u8)));
    }

    #[test]
    fn console_resolves_with_explicit_system_prefix() {
        assert!(compile(
            r#"class P { static void Main() { System.Console.WriteLine("x"); } }"#
        )
        .is_ok());
    }

    #[test]
    fn undefined_name_in_call_is_an_error() {
        let diagnostics = compile("class P { static void Main() { Missing(); } }").unwrap_err();
        assert!(codes_of(&diagnostics).contains(&codes::UNDEFINED_NAME));
    }

    #[test]
    fn unknown_method_on_known_class_gets_its_own_code() {
        let diagnostics = compile(
            "class P { static void Main() { P.Missing(); } static void Known() { } }",
        )
        .unwrap_err();
        assert!(codes_of(&diagnostics).contains(&codes::UNKNOWN_METHOD));
    }

    #[test]
    fn argument_count_mismatch_is_an_error() {
        let diagnostics = compile(
            r#"
class P
{
    static void Helper(int x) { Helper(x); }
    static void Main() { Helper(1, 2); }
}
"#,
        )
        .unwrap_err();
        assert!(codes_of(&diagnostics).contains(&codes::ARGUMENT_COUNT_MISMATCH));
    }

    #[test]
    fn duplicate_methods_are_rejected_but_overloads_by_arity_are_not() {
        let diagnostics = compile(
            "class P { static void Main() { } static void Main() { } }",
        )
        .unwrap_err();
        assert!(codes_of(&diagnostics).contains(&codes::DUPLICATE_METHOD));

        // Same name, different arity: fine at compile time.
        assert!(compile(
            "class P { static void F() { } static void F(int x) { F(x); } static void Main() { F(); } }"
        )
        .is_ok());
    }

    #[test]
    fn duplicate_local_is_an_error() {
        let diagnostics = compile(
            "class P { static void Main() { var x = 1; var x = 2; Use(x); } static void Use(int n) { Use(n); } }",
        )
        .unwrap_err();
        assert!(codes_of(&diagnostics).contains(&codes::DUPLICATE_LOCAL));
    }

    #[test]
    fn unused_local_warns_without_failing_the_build() {
        let output = compile("class P { static void Main() { var x = 1; } }").unwrap();
        assert_eq!(codes_of(&output.warnings), vec![codes::UNUSED_LOCAL]);
    }

    #[test]
    fn warnings_as_errors_escalates_unused_local() {
        let options = CompileOptions {
            warnings_as_errors: true,
            ..Default::default()
        };
        let diagnostics =
            compile_with("class P { static void Main() { var x = 1; } }", &options).unwrap_err();
        assert!(diagnostics.iter().all(Diagnostic::is_reportable));
        assert_eq!(codes_of(&diagnostics), vec![codes::UNUSED_LOCAL]);
    }

    #[test]
    fn parse_diagnostics_fail_the_compilation() {
        let diagnostics = compile("class P { static void Main() { var = 1; } }").unwrap_err();
        assert!(codes_of(&diagnostics).contains(&codes::UNEXPECTED_TOKEN));
    }

    #[test]
    fn loop_body_too_large_for_a_jump_is_a_diagnostic() {
        // Each assignment costs a handful of bytes; a few thousand of them
        // push the while loop's jump distance past u16::MAX.
        let mut body = String::new();
        for _ in 0..6000 {
            body.push_str("x = x + 1000000; ");
        }
        let source =
            format!("class P {{ static void Main() {{ var x = 0; while (x < 1) {{ {body} }} }} }}");
        let diagnostics = compile(&source).unwrap_err();
        assert!(codes_of(&diagnostics).contains(&codes::METHOD_TOO_LARGE));
    }

    #[test]
    fn small_int_literals_use_short_encodings() {
        let output = compile(
            "class P { static int Main2() { return 0 + 1 + 7; } static void Main() { Main2(); } }",
        )
        .unwrap();
        let code = &output.image.code;
        assert!(code.contains(&(Instruction::Lit_0 as u8)));
        assert!(code.contains(&(Instruction::Lit_1 as u8)));
        assert!(code.contains(&(Instruction::Lit_Int as u8)));
    }
}
