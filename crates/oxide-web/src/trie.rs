//! Prefix tree of path segments.
//!
//! One tree is kept per HTTP method. A node only matches a request if a
//! registration ended exactly on it: registering `/hello/doc` creates a
//! `hello` node, but `/hello` alone does not resolve.

use tracing::trace;

/// A node in the route trie.
#[derive(Debug, Clone, Default)]
pub struct Node {
    /// Full registered pattern, empty unless a route terminates here.
    pattern: String,
    /// The segment token of this node, e.g. `:lang` or `doc`.
    part: String,
    /// Children in insertion order.
    children: Vec<Node>,
    /// Whether `part` starts with `:` or `*`.
    is_wild: bool,
}

impl Node {
    /// Creates an empty root node.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_part(part: &str) -> Self {
        Self {
            pattern: String::new(),
            part: part.to_string(),
            children: Vec::new(),
            is_wild: part.starts_with(':') || part.starts_with('*'),
        }
    }

    /// The pattern registered on this node, empty for intermediate nodes.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The segment token of this node.
    pub fn part(&self) -> &str {
        &self.part
    }

    /// Whether this node matches any segment.
    pub fn is_wild(&self) -> bool {
        self.is_wild
    }

    /// The children of this node in insertion order.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Inserts `pattern`, whose tokens are `parts`, below this node.
    ///
    /// At each depth the first child that either has the same part or is
    /// wild is reused. A wild child therefore absorbs a literal registered
    /// after it at the same depth: inserting `/a/:x` then `/a/b` rewrites
    /// the `:x` node's pattern to `/a/b` instead of adding a `b` sibling.
    pub fn insert(&mut self, pattern: &str, parts: &[&str], depth: usize) {
        let Some(part) = parts.get(depth) else {
            self.pattern = pattern.to_string();
            return;
        };

        let index = match self
            .children
            .iter()
            .position(|child| child.part == *part || child.is_wild)
        {
            Some(index) => index,
            None => {
                self.children.push(Self::with_part(part));
                self.children.len() - 1
            }
        };

        self.children[index].insert(pattern, parts, depth + 1);
    }

    /// Finds the node registered for `parts`, starting at `depth`.
    ///
    /// Every child whose part equals the segment or that is wild is tried
    /// in insertion order, and the first hit wins. Literal children get no
    /// priority over earlier wild siblings.
    pub fn search(&self, parts: &[&str], depth: usize) -> Option<&Self> {
        if depth == parts.len() || self.part.starts_with('*') {
            if self.pattern.is_empty() {
                trace!(part = %self.part, "reached unregistered node");
                return None;
            }
            return Some(self);
        }

        let part = parts[depth];
        self.children
            .iter()
            .filter(|child| child.part == part || child.is_wild)
            .find_map(|child| child.search(parts, depth + 1))
    }

    /// Collects every registered pattern below this node in pre-order.
    pub fn collect_patterns<'a>(&'a self, out: &mut Vec<&'a str>) {
        if !self.pattern.is_empty() {
            out.push(&self.pattern);
        }
        for child in &self.children {
            child.collect_patterns(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::tokenize;

    fn tree(patterns: &[&str]) -> Node {
        let mut root = Node::new();
        for pattern in patterns {
            root.insert(pattern, &tokenize(pattern), 0);
        }
        root
    }

    fn lookup<'a>(root: &'a Node, path: &str) -> Option<&'a str> {
        root.search(&tokenize(path), 0).map(Node::pattern)
    }

    #[test]
    fn test_literal_and_param_lookup() {
        let root = tree(&["/", "/hello", "/hello/:name", "/hello/:name/doc"]);
        assert_eq!(lookup(&root, "/"), Some("/"));
        assert_eq!(lookup(&root, "/hello"), Some("/hello"));
        assert_eq!(lookup(&root, "/hello/alice"), Some("/hello/:name"));
        assert_eq!(lookup(&root, "/hello/alice/doc"), Some("/hello/:name/doc"));
        assert_eq!(lookup(&root, "/hello/alice/doc/more"), None);
    }

    #[test]
    fn test_intermediate_node_does_not_match() {
        let root = tree(&["/hello/doc"]);
        assert_eq!(lookup(&root, "/hello"), None);
        assert_eq!(lookup(&root, "/"), None);
        assert_eq!(lookup(&root, "/hello/doc"), Some("/hello/doc"));
    }

    #[test]
    fn test_wildcard_needs_at_least_one_segment() {
        let root = tree(&["/assets/*filepath"]);
        assert_eq!(lookup(&root, "/assets/a/b/c.css"), Some("/assets/*filepath"));
        assert_eq!(lookup(&root, "/assets/x"), Some("/assets/*filepath"));
        assert_eq!(lookup(&root, "/assets"), None);
    }

    #[test]
    fn test_wild_child_absorbs_later_literal() {
        let root = tree(&["/a/:x", "/a/b"]);
        let a = &root.children()[0];
        assert_eq!(a.children().len(), 1);
        assert_eq!(a.children()[0].part(), ":x");
        assert_eq!(a.children()[0].pattern(), "/a/b");
        assert_eq!(lookup(&root, "/a/b"), Some("/a/b"));
        assert_eq!(lookup(&root, "/a/other"), Some("/a/b"));
    }

    #[test]
    fn test_literal_before_wild_keeps_both_branches() {
        let root = tree(&["/a/b", "/a/:x"]);
        let a = &root.children()[0];
        assert_eq!(a.children().len(), 2);
        assert_eq!(lookup(&root, "/a/b"), Some("/a/b"));
        assert_eq!(lookup(&root, "/a/c"), Some("/a/:x"));
    }

    #[test]
    fn test_search_backtracks_into_later_sibling() {
        let root = tree(&["/a/b/c", "/a/:x/d"]);
        assert_eq!(lookup(&root, "/a/b/c"), Some("/a/b/c"));
        assert_eq!(lookup(&root, "/a/b/d"), Some("/a/:x/d"));
    }

    #[test]
    fn test_reinsert_overwrites_pattern_only() {
        let mut root = tree(&["/p/:lang/doc"]);
        root.insert("/p/:lang/doc", &tokenize("/p/:lang/doc"), 0);
        let mut patterns = Vec::new();
        root.collect_patterns(&mut patterns);
        assert_eq!(patterns, vec!["/p/:lang/doc"]);
        assert_eq!(root.children().len(), 1);
    }

    #[test]
    fn test_collect_patterns_pre_order() {
        let root = tree(&["/hello/:name", "/", "/hello", "/assets/*filepath"]);
        let mut patterns = Vec::new();
        root.collect_patterns(&mut patterns);
        assert_eq!(
            patterns,
            vec!["/", "/hello", "/hello/:name", "/assets/*filepath"]
        );
    }
}
