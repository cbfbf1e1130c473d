use std::path::{Path, PathBuf};

use crate::ir::ast::SyntaxTree;

/// The namespace whose members are built into the runtime itself.
/// Programs get it whether or not they write `using System;`.
pub const BASE_NAMESPACE: &str = "System";

/// File extension of compiled library images.
pub const LIB_EXTENSION: &str = "csl";

/// Maps a `using` directive's namespace to a library image on disk.
/// The default probes a single directory; tests substitute their own.
pub trait LibraryResolver {
    fn resolve(&self, namespace: &str) -> Option<PathBuf>;
}

/// Resolves `<namespace>.csl` inside one directory.
pub struct DirectoryResolver {
    lib_dir: PathBuf,
}

impl DirectoryResolver {
    pub fn new(lib_dir: impl Into<PathBuf>) -> Self {
        Self {
            lib_dir: lib_dir.into(),
        }
    }

    /// Resolver rooted at the directory holding the runner binary, falling
    /// back to the working directory when the binary's path is unknowable.
    pub fn beside_runner() -> Self {
        let lib_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(lib_dir)
    }
}

impl LibraryResolver for DirectoryResolver {
    fn resolve(&self, namespace: &str) -> Option<PathBuf> {
        let candidate = self.lib_dir.join(format!("{namespace}.{LIB_EXTENSION}"));
        candidate.is_file().then_some(candidate)
    }
}

/// Resolves nothing. Every non-base `using` becomes a miss.
pub struct NullResolver;

impl LibraryResolver for NullResolver {
    fn resolve(&self, _namespace: &str) -> Option<PathBuf> {
        None
    }
}

/// One referenced library. `path` is `None` for the base namespace,
/// which has no image file.
#[derive(Debug)]
pub struct LibraryRef {
    pub namespace: String,
    pub path: Option<PathBuf>,
}

/// The references a compilation gets: the base namespace plus one library
/// per resolvable `using`, with unresolvable directives listed in `missing`.
#[derive(Debug)]
pub struct ReferenceSet {
    pub libraries: Vec<LibraryRef>,
    pub missing: Vec<String>,
}

impl ReferenceSet {
    pub fn resolve(tree: &SyntaxTree, resolver: &dyn LibraryResolver) -> Self {
        let mut libraries = vec![LibraryRef {
            namespace: BASE_NAMESPACE.to_string(),
            path: None,
        }];
        let mut missing = Vec::new();

        for using in &tree.usings {
            if using.name == BASE_NAMESPACE
                || libraries.iter().any(|lib| lib.namespace == using.name)
            {
                continue;
            }

            match resolver.resolve(&using.name) {
                Some(path) => libraries.push(LibraryRef {
                    namespace: using.name.clone(),
                    path: Some(path),
                }),
                None => {
                    if !missing.contains(&using.name) {
                        missing.push(using.name.clone());
                    }
                }
            }
        }

        Self { libraries, missing }
    }

    /// Referenced libraries that live in an image file, in the order their
    /// modules are assigned runtime indices (first external is module 1).
    pub fn external(&self) -> impl Iterator<Item = &LibraryRef> {
        self.libraries.iter().filter(|lib| lib.path.is_some())
    }
}
