use serde::{Deserialize, Serialize};

/// Index of a field node inside a [`FieldPaths`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldRef(usize);

impl FieldRef {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// One segment of a field path. `owner` points at the enclosing field,
/// `None` marks a root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldNode {
    pub name: String,
    pub owner: Option<FieldRef>,
}

/// Arena of field nodes. Children refer to their owners by index, so the
/// chain is walked without any shared ownership.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPaths {
    nodes: Vec<FieldNode>,
}

impl FieldPaths {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Add a root field.
    pub fn root(&mut self, name: impl Into<String>) -> FieldRef {
        self.push(name.into(), None)
    }

    /// Add a field nested under `owner`.
    pub fn child(&mut self, owner: FieldRef, name: impl Into<String>) -> FieldRef {
        self.push(name.into(), Some(owner))
    }

    /// Add every segment of a dotted path, returning the leaf.
    pub fn dotted(&mut self, path: &str) -> FieldRef {
        let mut segments = path.split('.');
        let first = segments.next().unwrap_or_default();
        let mut current = self.root(first);
        for segment in segments {
            current = self.child(current, segment);
        }
        current
    }

    pub fn get(&self, field: FieldRef) -> Option<&FieldNode> {
        self.nodes.get(field.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Segment names from root to `field`, or `None` if any link in the
    /// chain is not part of this arena.
    pub fn segments(&self, field: FieldRef) -> Option<Vec<&str>> {
        let mut names = Vec::new();
        let mut current = Some(field);

        while let Some(id) = current {
            let node = self.get(id)?;
            names.push(node.name.as_str());
            current = node.owner;
            // Owners are always added before their children.
            if current.is_some_and(|owner| owner.0 >= id.0) {
                return None;
            }
        }

        names.reverse();
        Some(names)
    }

    fn push(&mut self, name: String, owner: Option<FieldRef>) -> FieldRef {
        let id = FieldRef(self.nodes.len());
        self.nodes.push(FieldNode { name, owner });
        id
    }
}
