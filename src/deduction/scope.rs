use tracing::{trace, warn};

use crate::core::CheckError;

/// Index of a scope frame in the order its `BeginScope` was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

/// One sub-proof frame. `start` is bound by the first Assumption read while
/// the frame is innermost; `end` is fixed when the frame is closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    start: Option<u32>,
    end: Option<u32>,
    closed: bool,
    level: usize,
    parent: Option<ScopeId>,
}

impl Scope {
    pub fn start(&self) -> Option<u32> {
        self.start
    }

    pub fn assumption_line(&self) -> Option<u32> {
        self.start
    }

    pub fn end(&self) -> Option<u32> {
        self.end
    }

    pub fn last_line(&self) -> Option<u32> {
        self.end
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Nesting level of the lines directly inside this frame.
    pub fn level(&self) -> usize {
        self.level
    }

    /// Frame that was innermost when this one was opened.
    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }
}

/// Every frame opened so far, plus the stack of those still open.
#[derive(Debug, Clone, Default)]
pub struct ScopeTracker {
    scopes: Vec<Scope>,
    open: Vec<ScopeId>,
}

impl ScopeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.open.len()
    }

    pub fn innermost(&self) -> Option<ScopeId> {
        self.open.last().copied()
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn begin(&mut self) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            start: None,
            end: None,
            closed: false,
            level: self.depth() + 1,
            parent: self.innermost(),
        });
        self.open.push(id);
        trace!(scope = id.0, depth = self.depth(), "opened scope");
        id
    }

    /// Closes the most recently opened frame that is still open.
    pub fn end(&mut self, last_line: Option<u32>) -> Result<ScopeId, CheckError> {
        let id = self.open.pop().ok_or_else(|| {
            CheckError::scope("Invalid scope nesting: EndScope without matching BeginScope")
        })?;
        let scope = &mut self.scopes[id.0];
        scope.end = last_line;
        scope.closed = true;
        if scope.start.is_none() {
            warn!(
                scope = id.0,
                "scope closed without an Assumption; it cannot be cited"
            );
        }
        trace!(scope = id.0, end = ?last_line, depth = self.depth(), "closed scope");
        Ok(id)
    }

    /// Binds `line` as the start of the innermost open frame if it has none yet.
    pub fn bind_assumption(&mut self, line: u32) -> bool {
        let Some(id) = self.innermost() else {
            return false;
        };
        let scope = &mut self.scopes[id.0];
        if scope.start.is_some() {
            return false;
        }
        scope.start = Some(line);
        trace!(scope = id.0, start = line, "bound scope assumption");
        true
    }

    /// True when `frame` is top level or lies on the parent chain of `from`.
    pub fn encloses(&self, frame: Option<ScopeId>, from: Option<ScopeId>) -> bool {
        let Some(frame) = frame else {
            return true;
        };
        let mut current = from;
        while let Some(id) = current {
            if id == frame {
                return true;
            }
            current = self.get(id).parent;
        }
        false
    }

    pub fn find_closed(&self, start: u32, end: u32) -> Option<&Scope> {
        self.scopes
            .iter()
            .find(|scope| scope.closed && scope.start == Some(start) && scope.end == Some(end))
    }
}
