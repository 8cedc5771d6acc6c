//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::Colorize;
use termtree::Tree;

use crate::domain::{NodeHandle, NodePath, TreeDocument};

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Print success status (green checkmark)
pub fn success(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Print completed action (green label)
pub fn action(label: &str, msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}: {}", label.green(), msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print indented detail (no color)
pub fn detail(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {}", msg);
}

/// Print plain output (no color, for data)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

/// Build a printable tree with `title` as its root line.
///
/// With `with_paths`, every label is prefixed by its node path.
pub fn document_tree(doc: &TreeDocument, title: &str, with_paths: bool) -> Tree<String> {
    fn build(
        doc: &TreeDocument,
        handle: NodeHandle,
        path: NodePath,
        with_paths: bool,
    ) -> Tree<String> {
        let Some(node) = doc.node(handle) else {
            return Tree::new(String::new());
        };
        let text = if with_paths {
            format!("[{path}] {}", node.label())
        } else {
            node.label().to_string()
        };
        let leaves = node
            .children()
            .iter()
            .enumerate()
            .map(|(i, &child)| build(doc, child, path.child(i), with_paths));
        Tree::new(text).with_leaves(leaves)
    }

    let leaves = doc
        .roots()
        .iter()
        .enumerate()
        .map(|(i, &root)| build(doc, root, NodePath::root().child(i), with_paths));
    Tree::new(title.to_string()).with_leaves(leaves)
}
