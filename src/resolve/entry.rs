use miette::Diagnostic;
use thiserror::Error;

use crate::ir::ast::SyntaxTree;

/// The method a program starts in, identified before compilation so the
/// compiled image can be probed for the matching symbol afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryCandidate {
    pub type_name: String,
    pub method_name: String,
}

#[derive(Error, Diagnostic, Debug, PartialEq, Eq)]
pub enum EntryError {
    #[error("no entry point: expected exactly one method named `Main`")]
    NotFound,

    #[error("ambiguous entry point: found {0} methods named `Main`")]
    Ambiguous(usize),
}

const ENTRY_METHOD_NAME: &str = "Main";

/// Find the one `Main` method in the tree. More than one `Main` is an
/// error even when the declarations live in different classes.
pub fn locate_entry(tree: &SyntaxTree) -> Result<EntryCandidate, EntryError> {
    let mut candidates = Vec::new();
    for (type_name, class) in tree.qualified_classes() {
        for method in &class.methods {
            if method.name == ENTRY_METHOD_NAME {
                candidates.push(EntryCandidate {
                    type_name: type_name.clone(),
                    method_name: method.name.clone(),
                });
            }
        }
    }

    match candidates.len() {
        0 => Err(EntryError::NotFound),
        1 => Ok(candidates.remove(0)),
        n => Err(EntryError::Ambiguous(n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::parsing::parse_file;
    use crate::runner::LoadedFile;
    use std::path::PathBuf;

    fn tree_of(source: &str) -> SyntaxTree {
        let unit = parse_file(LoadedFile {
            filepath: PathBuf::from("test.cs"),
            source: source.to_string(),
        });
        assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
        unit.tree
    }

    #[test]
    fn finds_the_single_main() {
        let tree = tree_of("class Program { static void Main() { } }");
        let entry = locate_entry(&tree).unwrap();
        assert_eq!(entry.type_name, "Program");
        assert_eq!(entry.method_name, "Main");
    }

    #[test]
    fn entry_name_is_namespace_qualified() {
        let tree = tree_of("namespace My.App { class Program { static void Main() { } } }");
        let entry = locate_entry(&tree).unwrap();
        assert_eq!(entry.type_name, "My.App.Program");
    }

    #[test]
    fn no_main_is_an_error() {
        let tree = tree_of("class Program { static void Helper() { } }");
        assert_eq!(locate_entry(&tree), Err(EntryError::NotFound));
    }

    #[test]
    fn mains_in_different_classes_are_ambiguous() {
        let tree = tree_of(
            "class A { static void Main() { } } class B { static void Main() { } }",
        );
        assert_eq!(locate_entry(&tree), Err(EntryError::Ambiguous(2)));
    }

    #[test]
    fn overloaded_mains_in_one_class_are_ambiguous() {
        let tree = tree_of(
            "class A { static void Main() { } static void Main(string[] args) { } }",
        );
        assert_eq!(locate_entry(&tree), Err(EntryError::Ambiguous(2)));
    }
}
