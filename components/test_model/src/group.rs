//! The `Group` container.

use crate::handle::ExecutionHandle;
use crate::node::Node;
use crate::reporter::Reporter;
use crate::style::Styler;
use std::rc::Rc;
use tokio::time::Instant;

/// Named, fixed-shape container of tests and groups
#[derive(Debug)]
pub struct Group {
    name: String,
    children: Vec<Node>,
}

impl Group {
    /// Create a group; children keep their declaration order
    pub fn new(name: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            name: name.into(),
            children,
        }
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Children in declaration order
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// `"<name>:"` followed by every child, each nesting level indented one space
    pub fn render(&self, styler: &Styler) -> String {
        const SEP: &str = "\n ";
        std::iter::once(format!("{}:", styler.bold(&self.name)))
            .chain(
                self.children
                    .iter()
                    .map(|child| child.render(styler).replace('\n', SEP)),
            )
            .collect::<Vec<_>>()
            .join(SEP)
    }

    /// Start every child without waiting for any of them.
    ///
    /// Must be called inside a [`tokio::task::LocalSet`].
    pub fn execute(&self, start: Instant, reporter: Rc<dyn Reporter>) -> ExecutionHandle {
        let mut handle = ExecutionHandle::default();
        for child in &self.children {
            handle.extend(child.execute(start, reporter.clone()));
        }
        handle
    }
}
