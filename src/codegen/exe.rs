use std::fmt::Write as _;

use crate::codegen::inst::Instruction;
use crate::util::byte_reader::ByteReader;

pub const IMAGE_MAGIC: [u8; 4] = *b"CSRI";
pub const IMAGE_VERSION: u16 = 1;

/// What kind of image a compilation produces. Executables carry an entry
/// point and may call into referenced libraries; libraries may not.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputKind {
    Executable,
    Library,
}

impl OutputKind {
    pub fn as_byte(self) -> u8 {
        match self {
            OutputKind::Executable => 0,
            OutputKind::Library => 1,
        }
    }
}

/// One callable method in an image's symbol table. `code_offset` and
/// `code_len` index the image's code blob.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    pub type_name: String,
    pub method_name: String,
    pub arity: u8,
    pub n_locals: u8,
    pub code_offset: u32,
    pub code_len: u32,
}

/// A complete in-memory image. Everything the loader needs to run the
/// program lives here: string constants, a symbol table, and bytecode.
#[derive(Debug)]
pub struct CompiledImage {
    pub kind: OutputKind,
    pub constants: Vec<String>,
    pub symbols: Vec<Symbol>,
    pub code: Vec<u8>,
}

impl CompiledImage {
    /// Serialize to the on-disk/in-memory wire format. All integers are
    /// little endian.
    ///
    /// ```text
    /// magic[4] version:u16 kind:u8
    /// n_constants:u16 { len:u16 bytes[len] }*
    /// n_symbols:u16 { type_name method_name arity:u8 n_locals:u8
    ///                 code_offset:u32 code_len:u32 }*
    /// code_len:u32 code[code_len]
    /// ```
    pub fn encode(&self) -> Vec<u8> {
        fn put_str(out: &mut Vec<u8>, s: &str) {
            let len: u16 = s
                .len()
                .try_into()
                .expect("[INTERNAL ERR] String too long for image format.");
            out.extend_from_slice(&len.to_le_bytes());
            out.extend_from_slice(s.as_bytes());
        }

        let mut out = Vec::new();
        out.extend_from_slice(&IMAGE_MAGIC);
        out.extend_from_slice(&IMAGE_VERSION.to_le_bytes());
        out.push(self.kind.as_byte());

        let n_constants: u16 = self
            .constants
            .len()
            .try_into()
            .expect("[INTERNAL ERR] Too many string constants.");
        out.extend_from_slice(&n_constants.to_le_bytes());
        for constant in &self.constants {
            put_str(&mut out, constant);
        }

        let n_symbols: u16 = self
            .symbols
            .len()
            .try_into()
            .expect("[INTERNAL ERR] Too many symbols.");
        out.extend_from_slice(&n_symbols.to_le_bytes());
        for sym in &self.symbols {
            put_str(&mut out, &sym.type_name);
            put_str(&mut out, &sym.method_name);
            out.push(sym.arity);
            out.push(sym.n_locals);
            out.extend_from_slice(&sym.code_offset.to_le_bytes());
            out.extend_from_slice(&sym.code_len.to_le_bytes());
        }

        let code_len: u32 = self
            .code
            .len()
            .try_into()
            .expect("[INTERNAL ERR] Code blob too large.");
        out.extend_from_slice(&code_len.to_le_bytes());
        out.extend_from_slice(&self.code);

        out
    }

    /// Human readable listing of every symbol's code, for debug traces.
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        for sym in &self.symbols {
            _ = writeln!(
                out,
                "{}.{}/{} (locals: {}):",
                sym.type_name, sym.method_name, sym.arity, sym.n_locals
            );

            let begin = sym.code_offset as usize;
            let end = begin + sym.code_len as usize;
            let mut reader = ByteReader::new(&self.code[begin..end]);
            while reader.offset() < sym.code_len as usize {
                let at = reader.offset();
                let inst: Instruction = Instruction::from(reader.read::<u8>());
                _ = write!(out, "  {at:04} {inst:?}");
                match inst {
                    Instruction::Lit_Int => _ = write!(out, " {}", reader.read::<i64>()),
                    Instruction::PushConst_Str => {
                        let idx = reader.read::<u16>();
                        _ = write!(out, " {:?}", self.constants[idx as usize]);
                    }
                    Instruction::Load | Instruction::Store => {
                        _ = write!(out, " {}", reader.read::<u8>())
                    }
                    Instruction::Jump
                    | Instruction::JumpBack
                    | Instruction::JumpFalse
                    | Instruction::JumpTrueNoPop
                    | Instruction::JumpFalseNoPop => {
                        _ = write!(out, " {}", reader.read::<u16>())
                    }
                    Instruction::Call => {
                        let sym = reader.read::<u16>();
                        let argc = reader.read::<u8>();
                        _ = write!(out, " {sym} {argc}");
                    }
                    Instruction::CallExtern => {
                        let lib = reader.read::<u8>();
                        let sym = reader.read::<u16>();
                        let argc = reader.read::<u8>();
                        _ = write!(out, " {lib} {sym} {argc}");
                    }
                    Instruction::CallBuiltin => {
                        let builtin = reader.read::<u8>();
                        let argc = reader.read::<u8>();
                        _ = write!(out, " {builtin} {argc}");
                    }
                    _ => {}
                }
                _ = writeln!(out);
            }
        }

        out
    }
}

struct PendingSymbol {
    type_name: String,
    method_name: String,
    arity: u8,
    n_locals: u8,
    code: Option<Vec<u8>>,
}

/// Accumulates constants, symbols and code during compilation and lays
/// them out into a `CompiledImage` at the end.
pub struct ImageBuilder {
    kind: OutputKind,
    constants: Vec<String>,
    symbols: Vec<PendingSymbol>,
}

impl ImageBuilder {
    pub fn new(kind: OutputKind) -> Self {
        Self {
            kind,
            constants: Vec::new(),
            symbols: Vec::new(),
        }
    }

    /// Intern a string constant and return its pool index.
    pub fn add_str_constant(&mut self, s: &str) -> u16 {
        if let Some(idx) = self.constants.iter().position(|c| c == s) {
            return idx as u16;
        }

        let idx: u16 = self
            .constants
            .len()
            .try_into()
            .expect("[INTERNAL ERR] Too many string constants.");
        self.constants.push(s.to_string());
        idx
    }

    /// Reserve a symbol table slot. Code is attached later so calls can be
    /// emitted against methods that haven't been compiled yet.
    pub fn declare_method(&mut self, type_name: &str, method_name: &str, arity: u8) -> u16 {
        let idx: u16 = self
            .symbols
            .len()
            .try_into()
            .expect("[INTERNAL ERR] Too many symbols.");
        self.symbols.push(PendingSymbol {
            type_name: type_name.to_string(),
            method_name: method_name.to_string(),
            arity,
            n_locals: arity,
            code: None,
        });
        idx
    }

    pub fn attach_code(&mut self, sym: u16, n_locals: u8, code: Vec<u8>) {
        let pending = &mut self.symbols[sym as usize];
        debug_assert!(pending.code.is_none());
        pending.n_locals = n_locals;
        pending.code = Some(code);
    }

    pub fn build(self) -> CompiledImage {
        let mut symbols = Vec::with_capacity(self.symbols.len());
        let mut code = Vec::new();

        for pending in self.symbols {
            let body = pending
                .code
                .expect("[INTERNAL ERR] Symbol declared but never compiled.");
            symbols.push(Symbol {
                type_name: pending.type_name,
                method_name: pending.method_name,
                arity: pending.arity,
                n_locals: pending.n_locals,
                code_offset: code.len() as u32,
                code_len: body.len() as u32,
            });
            code.extend_from_slice(&body);
        }

        CompiledImage {
            kind: self.kind,
            constants: self.constants,
            symbols,
            code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_interned() {
        let mut builder = ImageBuilder::new(OutputKind::Executable);
        let a = builder.add_str_constant("hello");
        let b = builder.add_str_constant("world");
        let c = builder.add_str_constant("hello");
        assert_eq!(a, c);
        assert_ne!(a, b);
    }

    #[test]
    fn build_lays_out_code_contiguously() {
        let mut builder = ImageBuilder::new(OutputKind::Library);
        let first = builder.declare_method("A", "One", 0);
        let second = builder.declare_method("A", "Two", 2);
        builder.attach_code(first, 0, vec![Instruction::Ret_0 as u8]);
        builder.attach_code(
            second,
            3,
            vec![Instruction::Lit_0 as u8, Instruction::Ret as u8],
        );

        let image = builder.build();
        assert_eq!(image.kind, OutputKind::Library);
        assert_eq!(image.symbols[0].code_offset, 0);
        assert_eq!(image.symbols[0].code_len, 1);
        assert_eq!(image.symbols[1].code_offset, 1);
        assert_eq!(image.symbols[1].code_len, 2);
        assert_eq!(image.symbols[1].arity, 2);
        assert_eq!(image.symbols[1].n_locals, 3);
        assert_eq!(image.code.len(), 3);
    }

    #[test]
    fn encode_starts_with_magic_and_version() {
        let image = ImageBuilder::new(OutputKind::Executable).build();
        let bytes = image.encode();
        assert_eq!(&bytes[..4], &IMAGE_MAGIC);
        assert_eq!(u16::from_le_bytes([bytes[4], bytes[5]]), IMAGE_VERSION);
        assert_eq!(bytes[6], OutputKind::Executable.as_byte());
    }
}
