//! Clause grammar for the statement builder

use std::fmt;

/// One SQL statement fragment the builder can append
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Clause {
    Select,
    From,
    Where,
    Like,
    Update,
    Set,
    InsertInto,
    Values,
    DeleteFrom,
}

impl Clause {
    pub const ALL: [Clause; 9] = [
        Clause::Select,
        Clause::From,
        Clause::Where,
        Clause::Like,
        Clause::Update,
        Clause::Set,
        Clause::InsertInto,
        Clause::Values,
        Clause::DeleteFrom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Clause::Select => "SELECT",
            Clause::From => "FROM",
            Clause::Where => "WHERE",
            Clause::Like => "LIKE",
            Clause::Update => "UPDATE",
            Clause::Set => "SET",
            Clause::InsertInto => "INSERT_INTO",
            Clause::Values => "VALUES",
            Clause::DeleteFrom => "DELETE_FROM",
        }
    }

    /// Clauses that may directly follow `state` (`None` = empty history)
    pub fn successors(state: Option<Clause>) -> &'static [Clause] {
        match state {
            None => &[
                Clause::Select,
                Clause::Update,
                Clause::InsertInto,
                Clause::DeleteFrom,
            ],
            Some(Clause::Select) => &[Clause::From],
            Some(Clause::From) => &[Clause::Where],
            Some(Clause::Where) => &[Clause::Like],
            Some(Clause::Like) => &[],
            Some(Clause::Update) => &[Clause::Set],
            Some(Clause::Set) => &[Clause::Where],
            Some(Clause::InsertInto) => &[Clause::Values],
            Some(Clause::Values) => &[],
            Some(Clause::DeleteFrom) => &[Clause::Where],
        }
    }

    /// Whether a statement may end in `state`
    pub fn is_terminal(state: Option<Clause>) -> bool {
        matches!(
            state,
            Some(
                Clause::From
                    | Clause::Where
                    | Clause::Like
                    | Clause::Set
                    | Clause::Values
                    | Clause::DeleteFrom
            )
        )
    }

    pub fn can_follow(self, state: Option<Clause>) -> bool {
        Self::successors(state).contains(&self)
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render a state for error messages
pub(crate) fn describe(state: Option<Clause>) -> &'static str {
    state.map_or("(start)", |clause| clause.as_str())
}

pub(crate) fn describe_all(clauses: &[Clause]) -> String {
    if clauses.is_empty() {
        return "(none; the statement is complete)".to_string();
    }
    clauses
        .iter()
        .map(Clause::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
