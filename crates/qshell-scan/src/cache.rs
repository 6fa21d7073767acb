// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;

/// Child names known for each identifier path, filled lazily from the
/// server. Entries live for the whole session.
#[derive(Debug, Default)]
pub struct CompletionCache {
    root: Node,
}

#[derive(Debug, Default)]
struct Node {
    names: Option<Vec<String>>,
    pending: bool,
    children: BTreeMap<String, Node>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    Ready(&'a [String]),
    /// A request for this path is already out.
    Pending,
    /// First miss: the caller must fetch. The path is now marked pending.
    Fetch,
}

impl Node {
    fn descend(&self, path: &[String]) -> Option<&Node> {
        path.iter()
            .try_fold(self, |node, segment| node.children.get(segment))
    }

    fn descend_mut(&mut self, path: &[String]) -> &mut Node {
        path.iter().fold(self, |node, segment| {
            node.children.entry(segment.clone()).or_default()
        })
    }
}

impl CompletionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&mut self, path: &[String]) -> Lookup<'_> {
        let node = self.root.descend_mut(path);
        match node.names {
            Some(ref names) => Lookup::Ready(names),
            None if node.pending => Lookup::Pending,
            None => {
                log::debug!("completion cache miss for {path:?}");
                node.pending = true;
                Lookup::Fetch
            }
        }
    }

    pub fn get(&self, path: &[String]) -> Option<&[String]> {
        self.root.descend(path)?.names.as_deref()
    }

    pub fn is_pending(&self, path: &[String]) -> bool {
        self.root.descend(path).is_some_and(|node| node.pending)
    }

    pub fn fill(&mut self, path: &[String], names: Vec<String>) {
        let node = self.root.descend_mut(path);
        node.pending = false;
        node.names = Some(names);
    }

    /// Releases the pending mark so a later lookup can try again.
    pub fn fail(&mut self, path: &[String]) {
        if self.root.descend(path).is_some() {
            self.root.descend_mut(path).pending = false;
        }
    }
}
