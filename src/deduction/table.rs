use std::collections::BTreeMap;

use crate::core::CheckError;
use crate::formula::Formula;

use super::rules::Rule;
use super::scope::{ScopeId, ScopeTracker};
use super::script::Reference;

/// A numbered line that has been entered into the proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRecord {
    pub number: u32,
    pub formula: Formula,
    pub rule: Rule,
    pub scope_level: usize,
    /// Innermost open frame when the line was read; `None` at top level.
    pub frame: Option<ScopeId>,
}

/// The position a reference is resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vantage {
    pub number: u32,
    pub scope_level: usize,
    pub frame: Option<ScopeId>,
}

/// A reference after validation: the cited line, or the first and last
/// lines of a closed scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cited<'a> {
    Line(&'a LineRecord),
    Scope(CitedScope<'a>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CitedScope<'a> {
    pub start: &'a LineRecord,
    pub end: &'a LineRecord,
    pub level: usize,
}

#[derive(Debug, Clone, Default)]
pub struct LineTable {
    lines: BTreeMap<u32, LineRecord>,
}

impl LineTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: LineRecord) {
        self.lines.insert(record.number, record);
    }

    pub fn get(&self, number: u32) -> Option<&LineRecord> {
        self.lines.get(&number)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn resolve_all(
        &self,
        references: &[Reference],
        at: Vantage,
        scopes: &ScopeTracker,
    ) -> Result<Vec<Cited<'_>>, CheckError> {
        references
            .iter()
            .map(|reference| self.resolve(*reference, at, scopes))
            .collect()
    }

    /// Applies the visibility rules to one reference.
    pub fn resolve(
        &self,
        reference: Reference,
        at: Vantage,
        scopes: &ScopeTracker,
    ) -> Result<Cited<'_>, CheckError> {
        match reference {
            Reference::Line(number) => self.resolve_line(number, at, scopes).map(Cited::Line),
            Reference::Scope { start, end } => self.resolve_scope(start, end, at, scopes),
        }
    }

    fn resolve_line(
        &self,
        number: u32,
        at: Vantage,
        scopes: &ScopeTracker,
    ) -> Result<&LineRecord, CheckError> {
        if number >= at.number {
            return Err(CheckError::reference(format!(
                "line {number} is not before line {}",
                at.number
            )));
        }
        let record = self.get(number).ok_or_else(|| {
            CheckError::reference(format!("line {number} is not part of the proof"))
        })?;

        if scopes.encloses(record.frame, at.frame) {
            Ok(record)
        } else {
            Err(CheckError::reference(format!(
                "line {number} lies in a scope that does not enclose line {}",
                at.number
            )))
        }
    }

    fn resolve_scope(
        &self,
        start: u32,
        end: u32,
        at: Vantage,
        scopes: &ScopeTracker,
    ) -> Result<Cited<'_>, CheckError> {
        let scope = scopes.find_closed(start, end).ok_or_else(|| {
            CheckError::reference(format!("{start}-{end} does not name a closed scope"))
        })?;
        if end >= at.number {
            return Err(CheckError::reference(format!(
                "scope {start}-{end} does not end before line {}",
                at.number
            )));
        }
        if !scopes.encloses(scope.parent(), at.frame) {
            return Err(CheckError::reference(format!(
                "scope {start}-{end} is nested in a scope that does not enclose line {}",
                at.number
            )));
        }

        let line = |number: u32| {
            self.get(number).ok_or_else(|| {
                CheckError::reference(format!(
                    "line {number} of scope {start}-{end} is not part of the proof"
                ))
            })
        };
        Ok(Cited::Scope(CitedScope {
            start: line(start)?,
            end: line(end)?,
            level: scope.level(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::{Cited, LineRecord, LineTable, Vantage};
    use crate::core::CheckErrorKind;
    use crate::deduction::rules::Rule;
    use crate::deduction::scope::{ScopeId, ScopeTracker};
    use crate::deduction::script::Reference;
    use crate::formula::parse_formula;

    fn record(number: u32, scope_level: usize, frame: Option<ScopeId>, rule: Rule) -> LineRecord {
        LineRecord {
            number,
            formula: parse_formula("p").expect("formula should parse"),
            rule,
            scope_level,
            frame,
        }
    }

    /// 1 at top level, 2..3 inside a closed scope, 4..5 inside a sibling scope.
    fn sibling_scopes() -> (LineTable, ScopeTracker, ScopeId) {
        let mut table = LineTable::new();
        let mut scopes = ScopeTracker::new();
        table.insert(record(1, 0, None, Rule::Premise));

        let first = scopes.begin();
        scopes.bind_assumption(2);
        table.insert(record(2, 1, Some(first), Rule::Assumption));
        table.insert(record(3, 1, Some(first), Rule::Copy));
        scopes.end(Some(3)).expect("first scope closes");

        let second = scopes.begin();
        scopes.bind_assumption(4);
        table.insert(record(4, 1, Some(second), Rule::Assumption));
        (table, scopes, second)
    }

    #[test]
    fn outer_lines_are_visible_from_nested_scope() {
        let (table, scopes, second) = sibling_scopes();
        let at = Vantage {
            number: 5,
            scope_level: 1,
            frame: Some(second),
        };
        let cited = table
            .resolve(Reference::Line(1), at, &scopes)
            .expect("premise should be visible");
        assert!(matches!(cited, Cited::Line(record) if record.number == 1));
        assert!(table.resolve(Reference::Line(4), at, &scopes).is_ok());
    }

    #[test]
    fn sibling_scope_lines_are_hidden() {
        let (table, scopes, second) = sibling_scopes();
        let at = Vantage {
            number: 5,
            scope_level: 1,
            frame: Some(second),
        };
        let err = table
            .resolve(Reference::Line(2), at, &scopes)
            .expect_err("sibling line should be hidden");
        assert_eq!(err.kind(), CheckErrorKind::Reference);
        assert!(err.message().contains("does not enclose"));
    }

    #[test]
    fn closed_sibling_lines_are_hidden_from_deeper_levels() {
        let (mut table, mut scopes, _) = sibling_scopes();
        let nested = scopes.begin();
        scopes.bind_assumption(5);
        table.insert(record(5, 2, Some(nested), Rule::Assumption));
        let at = Vantage {
            number: 6,
            scope_level: 2,
            frame: Some(nested),
        };
        let err = table
            .resolve(Reference::Line(2), at, &scopes)
            .expect_err("closed sibling line should be hidden");
        assert!(err.message().contains("does not enclose line 6"));
        assert!(table.resolve(Reference::Line(4), at, &scopes).is_ok());
        assert!(table.resolve(Reference::Line(1), at, &scopes).is_ok());
    }

    #[test]
    fn scope_nested_in_closed_scope_is_hidden() {
        let mut table = LineTable::new();
        let mut scopes = ScopeTracker::new();
        let outer = scopes.begin();
        scopes.bind_assumption(1);
        table.insert(record(1, 1, Some(outer), Rule::Assumption));
        let inner = scopes.begin();
        scopes.bind_assumption(2);
        table.insert(record(2, 2, Some(inner), Rule::Assumption));
        scopes.end(Some(2)).expect("inner closes");
        scopes.end(Some(2)).expect("outer closes");

        let at = Vantage {
            number: 3,
            scope_level: 0,
            frame: None,
        };
        let err = table
            .resolve(Reference::Scope { start: 2, end: 2 }, at, &scopes)
            .expect_err("inner scope is out of reach");
        assert_eq!(err.kind(), CheckErrorKind::Reference);
        assert!(err.message().contains("is nested in a scope"));
    }

    #[test]
    fn inner_lines_are_hidden_from_top_level() {
        let (table, scopes, _) = sibling_scopes();
        let at = Vantage {
            number: 6,
            scope_level: 0,
            frame: None,
        };
        assert!(table.resolve(Reference::Line(3), at, &scopes).is_err());
    }

    #[test]
    fn rejects_forward_and_missing_lines() {
        let (table, scopes, _) = sibling_scopes();
        let at = Vantage {
            number: 3,
            scope_level: 0,
            frame: None,
        };
        let err = table
            .resolve(Reference::Line(3), at, &scopes)
            .expect_err("self reference should fail");
        assert!(err.message().contains("is not before"));

        let at = Vantage {
            number: 10,
            scope_level: 0,
            frame: None,
        };
        let err = table
            .resolve(Reference::Line(7), at, &scopes)
            .expect_err("missing line should fail");
        assert!(err.message().contains("not part of the proof"));
    }

    #[test]
    fn resolves_closed_scope_range() {
        let (table, scopes, _) = sibling_scopes();
        let at = Vantage {
            number: 6,
            scope_level: 0,
            frame: None,
        };
        let cited = table
            .resolve(Reference::Scope { start: 2, end: 3 }, at, &scopes)
            .expect("closed scope should resolve");
        let Cited::Scope(scope) = cited else {
            panic!("expected scope citation");
        };
        assert_eq!(scope.start.number, 2);
        assert_eq!(scope.end.number, 3);
        assert_eq!(scope.level, 1);
    }

    #[test]
    fn rejects_open_or_unknown_scope_range() {
        let (table, scopes, second) = sibling_scopes();
        let at = Vantage {
            number: 5,
            scope_level: 1,
            frame: Some(second),
        };
        let err = table
            .resolve(Reference::Scope { start: 4, end: 4 }, at, &scopes)
            .expect_err("open scope should not resolve");
        assert_eq!(err.kind(), CheckErrorKind::Reference);
        assert!(table
            .resolve(Reference::Scope { start: 1, end: 3 }, at, &scopes)
            .is_err());
    }
}
