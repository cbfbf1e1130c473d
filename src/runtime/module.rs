use std::rc::Rc;

use miette::Diagnostic;
use thiserror::Error;

use crate::codegen::exe::{OutputKind, Symbol, IMAGE_MAGIC, IMAGE_VERSION};

#[derive(Error, Diagnostic, Debug, PartialEq, Eq)]
pub enum LoadError {
    #[error("not a compiled image: bad magic number")]
    BadMagic,

    #[error("unsupported image version {0}")]
    UnsupportedVersion(u16),

    #[error("image is truncated")]
    Truncated,

    #[error("malformed image: {0}")]
    Invalid(&'static str),
}

/// A validated reference into a module's symbol table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MethodHandle {
    pub symbol: usize,
}

/// Outcome of a symbol table lookup. `AmbiguousArity` means the name
/// exists but the arity didn't pin down a single overload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    NotFound,
    AmbiguousArity,
    Ok(MethodHandle),
}

/// A decoded image ready for execution. Constants are shared so pushing
/// one onto the value stack never copies the text.
#[derive(Debug)]
pub struct LoadedModule {
    pub kind: OutputKind,
    pub constants: Vec<Rc<str>>,
    pub symbols: Vec<Symbol>,
    pub code: Vec<u8>,
}

impl LoadedModule {
    /// Decode an encoded image, validating structure as it goes. Input is
    /// untrusted; every read is bounds checked.
    pub fn load(bytes: &[u8]) -> Result<Self, LoadError> {
        let mut cursor = Cursor { bytes, i: 0 };

        if cursor.take(4)? != &IMAGE_MAGIC[..] {
            return Err(LoadError::BadMagic);
        }

        let version = cursor.u16()?;
        if version != IMAGE_VERSION {
            return Err(LoadError::UnsupportedVersion(version));
        }

        let kind = match cursor.u8()? {
            0 => OutputKind::Executable,
            1 => OutputKind::Library,
            _ => return Err(LoadError::Invalid("unknown image kind")),
        };

        let n_constants = cursor.u16()?;
        let mut constants = Vec::with_capacity(n_constants as usize);
        for _ in 0..n_constants {
            constants.push(Rc::from(cursor.str()?));
        }

        let n_symbols = cursor.u16()?;
        let mut symbols = Vec::with_capacity(n_symbols as usize);
        for _ in 0..n_symbols {
            let type_name = cursor.str()?.to_string();
            let method_name = cursor.str()?.to_string();
            let arity = cursor.u8()?;
            let n_locals = cursor.u8()?;
            let code_offset = cursor.u32()?;
            let code_len = cursor.u32()?;
            symbols.push(Symbol {
                type_name,
                method_name,
                arity,
                n_locals,
                code_offset,
                code_len,
            });
        }

        let code_len = cursor.u32()? as usize;
        let code = cursor.take(code_len)?.to_vec();

        if cursor.i != bytes.len() {
            return Err(LoadError::Invalid("trailing bytes after code blob"));
        }

        for sym in &symbols {
            let end = (sym.code_offset as usize)
                .checked_add(sym.code_len as usize)
                .filter(|&end| end <= code.len());
            if end.is_none() {
                return Err(LoadError::Invalid("symbol code range out of bounds"));
            }
            if sym.n_locals < sym.arity {
                return Err(LoadError::Invalid("symbol declares fewer locals than parameters"));
            }
        }

        Ok(Self {
            kind,
            constants,
            symbols,
            code,
        })
    }

    /// Placeholder that resolves nothing, used to keep module indices
    /// aligned when a referenced image couldn't be read.
    pub fn empty() -> Self {
        Self {
            kind: OutputKind::Library,
            constants: Vec::new(),
            symbols: Vec::new(),
            code: Vec::new(),
        }
    }

    /// Look up a method by name alone. Several same-named overloads need
    /// `resolve_with_arity` to disambiguate.
    pub fn resolve(&self, type_name: &str, method_name: &str) -> Resolution {
        let mut found = None;
        for (i, sym) in self.symbols.iter().enumerate() {
            if sym.type_name == type_name && sym.method_name == method_name {
                if found.is_some() {
                    return Resolution::AmbiguousArity;
                }
                found = Some(MethodHandle { symbol: i });
            }
        }

        match found {
            Some(handle) => Resolution::Ok(handle),
            None => Resolution::NotFound,
        }
    }

    pub fn resolve_with_arity(&self, type_name: &str, method_name: &str, arity: u8) -> Resolution {
        let mut name_matched = false;
        for (i, sym) in self.symbols.iter().enumerate() {
            if sym.type_name == type_name && sym.method_name == method_name {
                name_matched = true;
                if sym.arity == arity {
                    return Resolution::Ok(MethodHandle { symbol: i });
                }
            }
        }

        if name_matched {
            Resolution::AmbiguousArity
        } else {
            Resolution::NotFound
        }
    }

    pub fn symbol(&self, handle: MethodHandle) -> &Symbol {
        &self.symbols[handle.symbol]
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    i: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], LoadError> {
        let data = self
            .bytes
            .get(self.i..self.i + n)
            .ok_or(LoadError::Truncated)?;
        self.i += n;
        Ok(data)
    }

    fn u8(&mut self) -> Result<u8, LoadError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, LoadError> {
        let data = self.take(2)?;
        Ok(u16::from_le_bytes([data[0], data[1]]))
    }

    fn u32(&mut self) -> Result<u32, LoadError> {
        let data = self.take(4)?;
        Ok(u32::from_le_bytes([data[0], data[1], data[2], data[3]]))
    }

    fn str(&mut self) -> Result<&'a str, LoadError> {
        let len = self.u16()? as usize;
        let data = self.take(len)?;
        std::str::from_utf8(data).map_err(|_| LoadError::Invalid("string is not valid UTF-8"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::exe::ImageBuilder;
    use crate::codegen::inst::Instruction;

    fn sample_image() -> Vec<u8> {
        let mut builder = ImageBuilder::new(OutputKind::Executable);
        _ = builder.add_str_constant("hello");
        let main = builder.declare_method("Program", "Main", 0);
        builder.attach_code(main, 1, vec![Instruction::Ret_0 as u8]);
        let other = builder.declare_method("Program", "Helper", 2);
        builder.attach_code(other, 2, vec![Instruction::Lit_0 as u8, Instruction::Ret as u8]);
        builder.build().encode()
    }

    #[test]
    fn loads_what_the_builder_encodes() {
        let module = LoadedModule::load(&sample_image()).unwrap();
        assert_eq!(module.kind, OutputKind::Executable);
        assert_eq!(module.constants, vec![Rc::from("hello")]);
        assert_eq!(module.symbols.len(), 2);
        assert_eq!(module.symbols[1].method_name, "Helper");
        assert_eq!(module.symbols[1].arity, 2);
        assert_eq!(module.code.len(), 3);
    }

    #[test]
    fn rejects_bad_magic() {
        assert_eq!(LoadedModule::load(b"NOPE").unwrap_err(), LoadError::BadMagic);
    }

    #[test]
    fn rejects_unsupported_version() {
        let mut bytes = sample_image();
        bytes[4] = 0xFF;
        let expected = u16::from_le_bytes([0xFF, bytes[5]]);
        assert_eq!(
            LoadedModule::load(&bytes).unwrap_err(),
            LoadError::UnsupportedVersion(expected)
        );
    }

    #[test]
    fn rejects_truncated_images() {
        let bytes = sample_image();
        assert_eq!(
            LoadedModule::load(&bytes[..bytes.len() - 1]).unwrap_err(),
            LoadError::Truncated
        );
    }

    #[test]
    fn resolves_by_name_and_arity() {
        let module = LoadedModule::load(&sample_image()).unwrap();

        let Resolution::Ok(main) = module.resolve("Program", "Main") else {
            panic!("expected Main to resolve");
        };
        assert_eq!(module.symbol(main).method_name, "Main");

        assert_eq!(module.resolve("Program", "Absent"), Resolution::NotFound);
        assert_eq!(
            module.resolve_with_arity("Program", "Helper", 1),
            Resolution::AmbiguousArity
        );
        assert!(matches!(
            module.resolve_with_arity("Program", "Helper", 2),
            Resolution::Ok(_)
        ));
    }

    #[test]
    fn ambiguous_overloads_need_an_arity() {
        let mut builder = ImageBuilder::new(OutputKind::Library);
        let a = builder.declare_method("T", "F", 0);
        let b = builder.declare_method("T", "F", 1);
        builder.attach_code(a, 0, vec![Instruction::Ret_0 as u8]);
        builder.attach_code(b, 1, vec![Instruction::Ret_0 as u8]);

        let module = LoadedModule::load(&builder.build().encode()).unwrap();
        assert_eq!(module.resolve("T", "F"), Resolution::AmbiguousArity);
        assert!(matches!(
            module.resolve_with_arity("T", "F", 1),
            Resolution::Ok(_)
        ));
    }
}
