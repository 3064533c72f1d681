//! Tree nodes and the main-execution entry point.

use crate::group::Group;
use crate::handle::ExecutionHandle;
use crate::leaf::Test;
use crate::reporter::{RenderReporter, Reporter, TimeoutPolicy};
use crate::style::Styler;
use crate::surface::Surface;
use std::rc::Rc;
use tokio::time::Instant;

/// A test or a group
#[derive(Debug, Clone)]
pub enum Node {
    /// Leaf
    Test(Rc<Test>),
    /// Container
    Group(Rc<Group>),
}

impl Node {
    /// Display name
    pub fn name(&self) -> &str {
        match self {
            Node::Test(test) => test.name(),
            Node::Group(group) => group.name(),
        }
    }

    /// Snapshot of this subtree
    pub fn render(&self, styler: &Styler) -> String {
        match self {
            Node::Test(test) => test.render(styler),
            Node::Group(group) => group.render(styler),
        }
    }

    /// Start this subtree; each leaf runs as its own local task.
    ///
    /// Every callback has been invoked by the time this returns, so the
    /// synchronous part of each test runs before the caller continues.
    /// Must be called inside a [`tokio::task::LocalSet`].
    pub fn execute(&self, start: Instant, reporter: Rc<dyn Reporter>) -> ExecutionHandle {
        match self {
            Node::Test(test) => {
                let test = Rc::clone(test);
                let pending = test.begin(reporter.as_ref());
                ExecutionHandle::single(tokio::task::spawn_local(async move {
                    test.finish(start, pending, reporter.as_ref()).await
                }))
            }
            Node::Group(group) => group.execute(start, reporter),
        }
    }

    /// Run the tree as the root, repainting `surface` with the whole tree on
    /// every status change. A stuck test aborts the process.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::rc::Rc;
    /// use test_model::{FnCallback, Group, MemorySurface, Node, Styler, Test};
    ///
    /// let root = Node::from(Group::new(
    ///     "G",
    ///     vec![
    ///         Test::new("a", FnCallback::sync(|| true)).into(),
    ///         Test::new("b", FnCallback::sync(|| false)).into(),
    ///     ],
    /// ));
    /// let surface = Rc::new(MemorySurface::new());
    ///
    /// let runtime = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
    /// let local = tokio::task::LocalSet::new();
    /// local.block_on(&runtime, async {
    ///     root.execute_as_main(surface.clone(), Styler::plain()).wait().await.unwrap();
    /// });
    /// assert_eq!(surface.last().unwrap(), "G:\n ✔  00s a\n ✖  00s b");
    /// ```
    pub fn execute_as_main(&self, surface: Rc<dyn Surface>, styler: Styler) -> ExecutionHandle {
        self.execute_as_main_with(surface, styler, TimeoutPolicy::Exit)
    }

    /// [`Node::execute_as_main`] with an explicit timeout policy
    pub fn execute_as_main_with(
        &self,
        surface: Rc<dyn Surface>,
        styler: Styler,
        policy: TimeoutPolicy,
    ) -> ExecutionHandle {
        let reporter = Rc::new(RenderReporter::new(self.clone(), surface, styler, policy));
        self.execute(Instant::now(), reporter)
    }

    /// Every leaf with its path of names from this node, in declaration order
    pub fn leaves(&self) -> Vec<(Vec<String>, Rc<Test>)> {
        let mut leaves = Vec::new();
        self.collect(&mut Vec::new(), &mut leaves);
        leaves
    }

    fn collect(&self, path: &mut Vec<String>, out: &mut Vec<(Vec<String>, Rc<Test>)>) {
        path.push(self.name().to_string());
        match self {
            Node::Test(test) => out.push((path.clone(), Rc::clone(test))),
            Node::Group(group) => {
                for child in group.children() {
                    child.collect(path, out);
                }
            }
        }
        path.pop();
    }
}

impl From<Test> for Node {
    fn from(test: Test) -> Self {
        Node::Test(Rc::new(test))
    }
}

impl From<Group> for Node {
    fn from(group: Group) -> Self {
        Node::Group(Rc::new(group))
    }
}
