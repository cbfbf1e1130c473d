use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use debug_print::debug_eprintln as dprintln;

use crate::codegen::compile::{compile_unit, CompileOptions};
use crate::diag::Diagnostic;
use crate::parsing::parsing::parse_file;
use crate::resolve::entry::locate_entry;
use crate::resolve::refs::{DirectoryResolver, LibraryResolver, ReferenceSet};
use crate::runtime::module::{LoadedModule, Resolution};
use crate::runtime::value::Value;
use crate::runtime::vm::Vm;
use crate::util::errors::RunFailure;

/// Source text read off disk, ready for parsing.
pub struct LoadedFile {
    pub filepath: PathBuf,
    pub source: String,
}

pub fn load_file(path: &Path) -> Result<LoadedFile, RunFailure> {
    let source = fs::read_to_string(path).map_err(|source| RunFailure::ReadSource {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(LoadedFile {
        filepath: path.to_path_buf(),
        source,
    })
}

/// Drives the whole pipeline for one source file: parse, locate the entry
/// point, resolve references, compile to an in-memory image, load it and
/// invoke `Main`.
pub struct Runner {
    resolver: Box<dyn LibraryResolver>,
    options: CompileOptions,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(
            Box::new(DirectoryResolver::beside_runner()),
            CompileOptions::default(),
        )
    }
}

impl Runner {
    pub fn new(resolver: Box<dyn LibraryResolver>, options: CompileOptions) -> Self {
        Self { resolver, options }
    }

    pub fn run_file(&self, path: &Path) -> Result<(), RunFailure> {
        let file = load_file(path)?;

        dprintln!("[INFO] Parsing {}", file.filepath.display());
        let unit = parse_file(file);

        // A syntax error can take the entry method's declaration with it
        // during recovery; in that case the recorded diagnostics are the
        // real story, not the entry-point miss.
        let entry = match locate_entry(&unit.tree) {
            Ok(entry) => entry,
            Err(err) => {
                if unit.diagnostics.iter().any(Diagnostic::is_reportable) {
                    return Err(RunFailure::Compile {
                        diagnostics: unit.diagnostics,
                    });
                }
                return Err(err.into());
            }
        };
        dprintln!(
            "[INFO] Entry point is `{}.{}`",
            entry.type_name,
            entry.method_name
        );

        let refs = ReferenceSet::resolve(&unit.tree, self.resolver.as_ref());
        for miss in &refs.missing {
            eprintln!("warning: no library found for using directive `{miss}`");
        }

        let output = compile_unit(&unit, &refs, &self.options)
            .map_err(|diagnostics| RunFailure::Compile { diagnostics })?;
        dprintln!(
            "[INFO] Compiled {} symbols, {} bytes of code",
            output.image.symbols.len(),
            output.image.code.len()
        );
        dprintln!("[INFO] Disassembly:\n{}", output.image.disassemble());

        // Round-trip through the wire format; the program runs from the
        // loaded image, not the compiler's in-memory structures.
        let program = LoadedModule::load(&output.image.encode())?;
        let mut modules = vec![program];
        modules.extend(output.libraries);

        let handle = match modules[0].resolve(&entry.type_name, &entry.method_name) {
            Resolution::Ok(handle) => handle,
            Resolution::NotFound | Resolution::AmbiguousArity => {
                return Err(RunFailure::MissingEntrySymbol {
                    type_name: entry.type_name,
                })
            }
        };

        let arity = modules[0].symbol(handle).arity;
        let args = match arity {
            0 => vec![],
            1 => vec![Value::StrArray(Rc::from([]))],
            arity => {
                return Err(RunFailure::Signature {
                    type_name: entry.type_name,
                    arity,
                })
            }
        };

        dprintln!("[INFO] Invoking `{}.Main`", entry.type_name);
        let mut vm = Vm::new(&modules);
        _ = vm.invoke(0, handle, args)?;

        Ok(())
    }
}
