use crate::document::Chunk;

/// Index of a node in a [`TreeArena`]
pub type NodeId = usize;

struct ArenaNode {
    chunk: Chunk,
    children: Vec<NodeId>,
}

/// Flat storage for a chunk tree under construction.
///
/// Nodes only know their children, by index; parents are tracked by the
/// builders' explicit stacks. The tree is turned into owned [`Chunk`]s once
/// construction is finished.
#[derive(Default)]
pub struct TreeArena {
    nodes: Vec<ArenaNode>,
    roots: Vec<NodeId>,
}

impl TreeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk as the last child of `parent`, or as a root
    pub fn append(&mut self, parent: Option<NodeId>, chunk: Chunk) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(ArenaNode {
            chunk,
            children: Vec::new(),
        });
        match parent {
            Some(p) => self.nodes[p].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Last child of `parent` (or last root)
    pub fn last_child(&self, parent: Option<NodeId>) -> Option<NodeId> {
        match parent {
            Some(p) => self.nodes[p].children.last().copied(),
            None => self.roots.last().copied(),
        }
    }

    /// Freeze the arena into owned root chunks
    pub fn into_chunks(mut self) -> Vec<Chunk> {
        let roots = std::mem::take(&mut self.roots);
        roots.into_iter().map(|id| self.freeze(id)).collect()
    }

    fn freeze(&mut self, id: NodeId) -> Chunk {
        let node = &mut self.nodes[id];
        let mut chunk = std::mem::replace(&mut node.chunk, Chunk::placeholder());
        let children = std::mem::take(&mut node.children);
        if !children.is_empty() {
            chunk.children = Some(children.into_iter().map(|c| self.freeze(c)).collect());
        }
        chunk
    }
}

#[cfg(test)]
mod arena_tests {
    use super::*;

    #[test]
    fn test_freeze_nested() {
        let mut arena = TreeArena::new();
        let a = arena.append(None, Chunk::new("1", "a"));
        let b = arena.append(Some(a), Chunk::new("2", "b"));
        arena.append(Some(b), Chunk::new("3", "c"));
        arena.append(None, Chunk::new("4", "d"));

        assert_eq!(arena.last_child(Some(a)), Some(b));
        let roots = arena.into_chunks();
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].children()[0].children()[0].data, "c");
        assert!(roots[1].children.is_none());
    }
}
