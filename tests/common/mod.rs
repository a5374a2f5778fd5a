//! Scripted in-memory DOM backends standing in for the live client.

// not every test binary uses both fakes
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

use chatgrab::dom::{Dom, DomError, DomResult};

/// Drives the history loader with a scripted sequence of message counts.
/// Each observation consumes one entry; the last entry repeats forever.
pub struct ScriptedPanel {
    counts: RefCell<VecDeque<usize>>,
    pub observations: RefCell<usize>,
    pub scrolls: RefCell<usize>,
    panel_present: bool,
}

impl ScriptedPanel {
    pub fn new(counts: &[usize]) -> Self {
        Self {
            counts: RefCell::new(counts.iter().copied().collect()),
            observations: RefCell::new(0),
            scrolls: RefCell::new(0),
            panel_present: true,
        }
    }

    pub fn without_panel() -> Self {
        let mut panel = Self::new(&[]);
        panel.panel_present = false;
        panel
    }

    fn next_count(&self) -> usize {
        let mut counts = self.counts.borrow_mut();
        if counts.len() > 1 {
            counts.pop_front().unwrap()
        } else {
            counts.front().copied().unwrap_or(0)
        }
    }
}

impl Dom for ScriptedPanel {
    type Node = usize;

    fn find(&self, _scope: Option<&usize>, selector: &str) -> DomResult<usize> {
        Err(DomError::NotFound(selector.to_string()))
    }

    fn find_all(&self, _scope: Option<&usize>, _selector: &str) -> DomResult<Vec<usize>> {
        *self.observations.borrow_mut() += 1;
        Ok((0..self.next_count()).collect())
    }

    fn wait_for(&self, selector: &str, timeout: Duration) -> DomResult<usize> {
        if self.panel_present {
            Ok(usize::MAX)
        } else {
            Err(DomError::Timeout(timeout, selector.to_string()))
        }
    }

    fn wait_visible(&self, _node: &usize, _timeout: Duration) -> DomResult<()> {
        Ok(())
    }

    fn attribute(&self, _node: &usize, _name: &str) -> DomResult<Option<String>> {
        Ok(None)
    }

    fn text(&self, _node: &usize) -> DomResult<String> {
        Ok(String::new())
    }

    fn scroll_into_view(&self, _node: &usize) -> DomResult<()> {
        *self.scrolls.borrow_mut() += 1;
        Ok(())
    }

    fn is_visible(&self, _node: &usize) -> DomResult<bool> {
        Ok(true)
    }
}

#[derive(Clone, Default)]
pub struct NodeSpec {
    pub parent: Option<usize>,
    pub matches: Vec<String>,
    pub attrs: Vec<(String, String)>,
    pub text: String,
    pub visible: bool,
    /// Every read on this node fails with a backend error.
    pub poisoned: bool,
    /// Every access to this node fails with `DomError::Stale`.
    pub stale: bool,
}

/// A static node tree with selector matching by exact selector string.
/// `"*"` matches any node, like the wildcard it stands for.
#[derive(Default)]
pub struct FakeTree {
    nodes: Vec<NodeSpec>,
}

impl FakeTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, parent: Option<usize>, matches: &[&str]) -> usize {
        self.nodes.push(NodeSpec {
            parent,
            matches: matches.iter().map(|s| s.to_string()).collect(),
            visible: true,
            ..NodeSpec::default()
        });
        self.nodes.len() - 1
    }

    pub fn set_text(&mut self, node: usize, text: &str) {
        self.nodes[node].text = text.to_string();
    }

    pub fn set_attr(&mut self, node: usize, name: &str, value: &str) {
        self.nodes[node]
            .attrs
            .push((name.to_string(), value.to_string()));
    }

    pub fn poison(&mut self, node: usize) {
        self.nodes[node].poisoned = true;
    }

    pub fn hide(&mut self, node: usize) {
        self.nodes[node].visible = false;
    }

    pub fn make_stale(&mut self, node: usize) {
        self.nodes[node].stale = true;
    }

    fn is_descendant(&self, node: usize, ancestor: usize) -> bool {
        let mut cur = self.nodes[node].parent;
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.nodes[p].parent;
        }
        false
    }

    fn check(&self, node: usize) -> DomResult<&NodeSpec> {
        let spec = &self.nodes[node];
        if spec.stale {
            return Err(DomError::Stale);
        }
        if spec.poisoned {
            return Err(DomError::Backend(anyhow::anyhow!("poisoned node")));
        }
        Ok(spec)
    }

    fn select(&self, scope: Option<usize>, selector: &str) -> DomResult<Vec<usize>> {
        if let Some(scope) = scope {
            self.check(scope)?;
        }
        Ok((0..self.nodes.len())
            .filter(|&i| Some(i) != scope)
            .filter(|&i| scope.map_or(true, |s| self.is_descendant(i, s)))
            .filter(|&i| {
                selector == "*" || self.nodes[i].matches.iter().any(|m| m == selector)
            })
            .collect())
    }
}

impl Dom for FakeTree {
    type Node = usize;

    fn find(&self, scope: Option<&usize>, selector: &str) -> DomResult<usize> {
        self.select(scope.copied(), selector)?
            .into_iter()
            .next()
            .ok_or_else(|| DomError::NotFound(selector.to_string()))
    }

    fn find_all(&self, scope: Option<&usize>, selector: &str) -> DomResult<Vec<usize>> {
        self.select(scope.copied(), selector)
    }

    fn wait_for(&self, selector: &str, timeout: Duration) -> DomResult<usize> {
        self.find(None, selector)
            .map_err(|_| DomError::Timeout(timeout, selector.to_string()))
    }

    fn wait_visible(&self, node: &usize, timeout: Duration) -> DomResult<()> {
        let spec = self.check(*node)?;
        if spec.visible {
            Ok(())
        } else {
            Err(DomError::Timeout(timeout, "visibility".to_string()))
        }
    }

    fn attribute(&self, node: &usize, name: &str) -> DomResult<Option<String>> {
        let spec = self.check(*node)?;
        Ok(spec
            .attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone()))
    }

    fn text(&self, node: &usize) -> DomResult<String> {
        Ok(self.check(*node)?.text.clone())
    }

    fn scroll_into_view(&self, node: &usize) -> DomResult<()> {
        self.check(*node).map(|_| ())
    }

    fn is_visible(&self, node: &usize) -> DomResult<bool> {
        Ok(self.check(*node)?.visible)
    }
}
