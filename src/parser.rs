//! Source inventory: every function and method definition in a Python file,
//! with a `::`-qualified identifier reflecting lexical nesting.

use std::path::Path;
use std::rc::Rc;

use tree_sitter::{Language, Node, Parser, Tree};

use crate::error::Error;
use crate::grammar;
use crate::types::{Function, SCOPE_SEPARATOR};

/// Maximum source file size (16 MiB).
const MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Names of the enclosing classes and functions, outermost first.
/// Shared between siblings and replaced, never mutated, when a scope opens.
type Context = Rc<[String]>;

/// Build the `Function` record for one definition node.
fn build_function(node: Node<'_>, filepath: &Path, name: &str, scope: &[String]) -> Function {
    let position = node.start_position();
    return Function {
        column: position.column,
        filepath: filepath.to_path_buf(),
        identifier: scope.join(SCOPE_SEPARATOR),
        line: position.row.saturating_add(1),
        name: name.to_string(),
    };
}

/// Walk the tree depth-first and collect function definitions in pre-order.
///
/// Function definitions emit a record and open a scope for their body.
/// Class definitions only open a scope. Everything else is transparent.
fn collect_functions(root: Node<'_>, source: &str, filepath: &Path) -> Vec<Function> {
    let mut functions = Vec::new();
    let mut pending: Vec<(Node<'_>, Context)> = vec![(root, Rc::from(Vec::new()))];

    while let Some((node, context)) = pending.pop() {
        let inner = match (node.kind(), definition_name(node, source)) {
            ("function_definition", Some(name)) => {
                let scope = extend_context(&context, name);
                functions.push(build_function(node, filepath, name, &scope));
                scope
            },
            ("class_definition", Some(name)) => extend_context(&context, name),
            _ => context,
        };
        push_children_in_reverse(node, &inner, &mut pending);
    }

    return functions;
}

/// Read the `name` field of a class or function definition.
fn definition_name<'a>(node: Node<'_>, source: &'a str) -> Option<&'a str> {
    let name_node = node.child_by_field_name("name")?;
    return name_node.utf8_text(source.as_bytes()).ok();
}

/// Copy the context and append one more scope name.
fn extend_context(context: &[String], name: &str) -> Context {
    let mut scope = context.to_vec();
    scope.push(name.to_string());
    return Rc::from(scope);
}

/// Locate the first node in pre-order that makes the source invalid Python:
/// an `ERROR` or `MISSING` node, or a `block` without a single statement
/// (comments do not count).
///
/// The grammar accepts a body that is not indented (`def f():\npass`) by
/// producing an empty `block` and moving the statement out to the enclosing
/// level, so empty blocks count as errors too.
fn first_invalid_node(root: Node<'_>) -> Option<Node<'_>> {
    let mut pending = vec![root];
    while let Some(node) = pending.pop() {
        if is_invalid(node) {
            return Some(node);
        }
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
        pending.extend(children.into_iter().rev());
    }
    return None;
}

/// Whether a single node is a syntax error on its own.
fn is_invalid(node: Node<'_>) -> bool {
    if node.is_error() || node.is_missing() {
        return true;
    }
    if node.kind() != "block" {
        return false;
    }
    let mut cursor = node.walk();
    return node.named_children(&mut cursor).all(|child| return child.kind() == "comment");
}

/// Read a Python file and list every function defined in it.
///
/// The file is parsed from scratch on every call.
///
/// # Errors
///
/// Returns `Error::FileNotFound` if the file does not exist, `Error::Io` for
/// other read failures, and everything `parse_source` returns.
pub fn parse_file(filepath: &Path) -> Result<Vec<Function>, Error> {
    tracing::debug!("Parsing Python file: {}", filepath.display());
    let source = match std::fs::read_to_string(filepath) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::FileNotFound { path: filepath.to_path_buf() });
        },
        Err(e) => return Err(Error::Io(e)),
        Ok(s) => s,
    };

    let functions = parse_source(filepath, &source)?;
    tracing::debug!("Parsed {} functions from {}", functions.len(), filepath.display());
    return Ok(functions);
}

/// List every function defined in `source`, treating it as the contents of `filepath`.
///
/// # Errors
///
/// Returns `Error::FileTooLarge` if the source exceeds the size limit,
/// `Error::UnsupportedLanguage` if `filepath` is not a Python path,
/// `Error::ParseFailed` if tree-sitter cannot run,
/// or `Error::SyntaxError` if the source does not parse cleanly.
pub fn parse_source(filepath: &Path, source: &str) -> Result<Vec<Function>, Error> {
    let source_len: u64 = source.len().try_into().unwrap_or(u64::MAX);
    if source_len > MAX_FILE_SIZE {
        return Err(Error::FileTooLarge {
            file: filepath.to_path_buf(),
            max_bytes: MAX_FILE_SIZE,
            size_bytes: source_len,
        });
    }

    let language = grammar::language_for_path(filepath)?;
    let tree = parse_tree(filepath, source, &language)?;
    let root = tree.root_node();
    if let Some(invalid) = first_invalid_node(root) {
        let position = invalid.start_position();
        return Err(Error::SyntaxError {
            column: position.column,
            file: filepath.to_path_buf(),
            line: position.row.saturating_add(1),
        });
    }

    return Ok(collect_functions(root, source, filepath));
}

/// Parse source into a tree-sitter tree.
///
/// # Errors
///
/// Returns `Error::ParseFailed` if the language cannot be set or parsing fails.
fn parse_tree(filepath: &Path, source: &str, language: &Language) -> Result<Tree, Error> {
    let mut parser = Parser::new();
    parser.set_language(language).map_err(|e| {
        return Error::ParseFailed {
            file: filepath.to_path_buf(),
            reason: e.to_string(),
        };
    })?;

    return parser.parse(source, None).ok_or_else(|| {
        return Error::ParseFailed {
            file: filepath.to_path_buf(),
            reason: "tree-sitter returned None".to_string(),
        };
    });
}

/// Queue a node's children so that the first child is popped next.
fn push_children_in_reverse<'tree>(
    node: Node<'tree>,
    context: &Context,
    pending: &mut Vec<(Node<'tree>, Context)>,
) {
    let mut cursor = node.walk();
    let children: Vec<Node<'tree>> = node.children(&mut cursor).collect();
    for child in children.into_iter().rev() {
        pending.push((child, Rc::clone(context)));
    }
}
