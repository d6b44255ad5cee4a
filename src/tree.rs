//! The spec tree and its builder API.
//!
//! A parsed document is turned into a tree of [`SpecNode`]s once per file
//! load; the runner walks the tree and the tree is discarded afterwards.
//! Builder methods append child nodes in declaration order and reject any
//! structure a document must not have.

use crate::schema::{Step, SuiteDoc};
use std::fmt;

/// What a node in the spec tree represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Suite,
    Test,
    BeforeAll,
    BeforeEach,
    AfterEach,
    AfterAll,
}

impl NodeKind {
    /// Spec-vocabulary name of this kind.
    pub fn label(self) -> &'static str {
        match self {
            NodeKind::Suite => "suite",
            NodeKind::Test => "test",
            NodeKind::BeforeAll => "before_all",
            NodeKind::BeforeEach => "before_each",
            NodeKind::AfterEach => "after_each",
            NodeKind::AfterAll => "after_all",
        }
    }
}

/// Error type for spec tree construction.
#[derive(Debug)]
pub enum BuildError {
    /// A child was appended to a test or hook node.
    NotASuite(NodeKind),
    /// A nested suite has no name.
    UnnamedSuite,
    /// A test has no name.
    UnnamedTest,
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::NotASuite(kind) => {
                write!(f, "cannot declare children on a {} node", kind.label())
            }
            BuildError::UnnamedSuite => write!(f, "nested suites require a name"),
            BuildError::UnnamedTest => write!(f, "tests require a name"),
        }
    }
}

impl std::error::Error for BuildError {}

/// A node of the spec tree: a suite, a test, or a lifecycle hook.
///
/// Only suites own children; tests and hooks carry a step body instead.
#[derive(Debug, Clone)]
pub struct SpecNode {
    kind: NodeKind,
    name: Option<String>,
    body: Vec<Step>,
    children: Vec<SpecNode>,
}

impl SpecNode {
    /// The unnamed suite at the root of a spec file.
    pub fn root() -> Self {
        Self {
            kind: NodeKind::Suite,
            name: None,
            body: Vec::new(),
            children: Vec::new(),
        }
    }

    /// A named suite.
    pub fn suite(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::root()
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn body(&self) -> &[Step] {
        &self.body
    }

    /// Append a nested suite.
    pub fn describe(&mut self, child: SpecNode) -> Result<(), BuildError> {
        if child.name.as_deref().is_none_or(str::is_empty) {
            return Err(BuildError::UnnamedSuite);
        }
        self.append(child)
    }

    /// Append a test leaf.
    pub fn it(&mut self, name: impl Into<String>, body: Vec<Step>) -> Result<(), BuildError> {
        let name = name.into();
        if name.is_empty() {
            return Err(BuildError::UnnamedTest);
        }
        self.append(SpecNode {
            kind: NodeKind::Test,
            name: Some(name),
            body,
            children: Vec::new(),
        })
    }

    /// Append a hook run once before this suite's first test.
    pub fn before_all(&mut self, body: Vec<Step>) -> Result<(), BuildError> {
        self.append_hook(NodeKind::BeforeAll, body)
    }

    /// Append a hook run before each of this suite's tests.
    pub fn before_each(&mut self, body: Vec<Step>) -> Result<(), BuildError> {
        self.append_hook(NodeKind::BeforeEach, body)
    }

    /// Append a hook run after each of this suite's tests.
    pub fn after_each(&mut self, body: Vec<Step>) -> Result<(), BuildError> {
        self.append_hook(NodeKind::AfterEach, body)
    }

    /// Append a hook run once after this suite's last test.
    pub fn after_all(&mut self, body: Vec<Step>) -> Result<(), BuildError> {
        self.append_hook(NodeKind::AfterAll, body)
    }

    fn append_hook(&mut self, kind: NodeKind, body: Vec<Step>) -> Result<(), BuildError> {
        self.append(SpecNode {
            kind,
            name: None,
            body,
            children: Vec::new(),
        })
    }

    fn append(&mut self, child: SpecNode) -> Result<(), BuildError> {
        if self.kind != NodeKind::Suite {
            return Err(BuildError::NotASuite(self.kind));
        }
        self.children.push(child);
        Ok(())
    }

    /// Child suites, in declaration order.
    pub fn child_suites(&self) -> impl Iterator<Item = &SpecNode> {
        self.children_of(NodeKind::Suite)
    }

    /// Direct test children, in declaration order.
    pub fn tests(&self) -> impl Iterator<Item = &SpecNode> {
        self.children_of(NodeKind::Test)
    }

    /// Hooks of one kind, in declaration order.
    pub fn hooks(&self, kind: NodeKind) -> impl Iterator<Item = &SpecNode> {
        self.children_of(kind)
    }

    fn children_of(&self, kind: NodeKind) -> impl Iterator<Item = &SpecNode> {
        self.children.iter().filter(move |c| c.kind == kind)
    }

    /// Number of tests in this node and all descendants.
    pub fn test_count(&self) -> usize {
        let own = usize::from(self.kind == NodeKind::Test);
        own + self.children.iter().map(SpecNode::test_count).sum::<usize>()
    }

    /// Build the tree for a whole spec document.
    pub fn from_doc(doc: &SuiteDoc) -> Result<SpecNode, BuildError> {
        let mut root = match doc.suite.as_deref() {
            Some(name) if !name.is_empty() => SpecNode::suite(name),
            _ => SpecNode::root(),
        };
        Self::fill_from_doc(&mut root, doc)?;
        Ok(root)
    }

    fn fill_from_doc(node: &mut SpecNode, doc: &SuiteDoc) -> Result<(), BuildError> {
        if !doc.before_all.is_empty() {
            node.before_all(doc.before_all.clone())?;
        }
        if !doc.before_each.is_empty() {
            node.before_each(doc.before_each.clone())?;
        }
        if !doc.after_each.is_empty() {
            node.after_each(doc.after_each.clone())?;
        }
        if !doc.after_all.is_empty() {
            node.after_all(doc.after_all.clone())?;
        }
        for test in &doc.tests {
            node.it(test.name.clone(), test.body.clone())?;
        }
        for nested in &doc.suites {
            let name = match nested.suite.as_deref() {
                Some(name) if !name.is_empty() => name,
                _ => return Err(BuildError::UnnamedSuite),
            };
            let mut child = SpecNode::suite(name);
            Self::fill_from_doc(&mut child, nested)?;
            node.describe(child)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Value;

    fn set_step(key: &str, value: &str) -> Step {
        Step::Set {
            key: key.to_string(),
            value: Value::from(value),
        }
    }

    #[test]
    fn builder_appends_in_order() {
        let mut root = SpecNode::root();
        root.before_all(vec![set_step("a", "1")]).unwrap();
        root.it("first", vec![]).unwrap();
        root.it("second", vec![]).unwrap();
        root.describe(SpecNode::suite("nested")).unwrap();

        let tests: Vec<_> = root.tests().filter_map(SpecNode::name).collect();
        assert_eq!(tests, vec!["first", "second"]);
        assert_eq!(root.child_suites().count(), 1);
        assert_eq!(root.hooks(NodeKind::BeforeAll).count(), 1);
        assert_eq!(root.hooks(NodeKind::AfterAll).count(), 0);
    }

    #[test]
    fn leaves_reject_children() {
        let mut root = SpecNode::root();
        root.it("leaf", vec![]).unwrap();

        // A test node pulled out of a tree must refuse to grow.
        let mut leaf = root.tests().next().unwrap().clone();
        assert!(matches!(
            leaf.it("child", vec![]),
            Err(BuildError::NotASuite(NodeKind::Test))
        ));
        assert!(matches!(
            leaf.before_each(vec![]),
            Err(BuildError::NotASuite(NodeKind::Test))
        ));
    }

    #[test]
    fn unnamed_declarations_rejected() {
        let mut root = SpecNode::root();
        assert!(matches!(root.it("", vec![]), Err(BuildError::UnnamedTest)));
        assert!(matches!(
            root.describe(SpecNode::root()),
            Err(BuildError::UnnamedSuite)
        ));
    }

    #[test]
    fn from_doc_builds_nested_tree() {
        let yaml = r#"
suite: outer
before_each:
  - set: { key: a, value: "1" }
tests:
  - name: outer test
suites:
  - suite: inner
    tests:
      - name: inner one
      - name: inner two
"#;
        let doc: SuiteDoc = serde_yaml::from_str(yaml).unwrap();
        let tree = SpecNode::from_doc(&doc).unwrap();

        assert_eq!(tree.kind(), NodeKind::Suite);
        assert_eq!(tree.name(), Some("outer"));
        assert_eq!(tree.hooks(NodeKind::BeforeEach).count(), 1);
        assert_eq!(tree.tests().count(), 1);
        assert_eq!(tree.test_count(), 3);

        let inner = tree.child_suites().next().unwrap();
        assert_eq!(inner.name(), Some("inner"));
        let names: Vec<_> = inner.tests().filter_map(SpecNode::name).collect();
        assert_eq!(names, vec!["inner one", "inner two"]);
    }

    #[test]
    fn from_doc_rejects_unnamed_nested_suite() {
        let yaml = r#"
suites:
  - tests:
      - name: orphan
"#;
        let doc: SuiteDoc = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(
            SpecNode::from_doc(&doc),
            Err(BuildError::UnnamedSuite)
        ));
    }

    #[test]
    fn from_doc_allows_unnamed_root() {
        let doc: SuiteDoc = serde_yaml::from_str("tests:\n  - name: t\n").unwrap();
        let tree = SpecNode::from_doc(&doc).unwrap();
        assert_eq!(tree.name(), None);
        assert_eq!(tree.test_count(), 1);
    }
}
