//! SELECT projections

/// Fields projected by a SELECT
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// `*`, resolved against the table's columns when the query runs
    All,
    /// Explicit field names, in order
    Fields(Vec<String>),
}

impl Selection {
    /// Text placed after `SELECT`
    pub fn to_sql(&self) -> String {
        match self {
            Selection::All => "*".to_string(),
            Selection::Fields(fields) => fields.join(", "),
        }
    }
}

/// Trait for types that can be converted to a projection
pub trait IntoSelection {
    fn into_selection(self) -> Selection;
}

impl IntoSelection for Selection {
    fn into_selection(self) -> Selection {
        self
    }
}

/// `"*"` selects everything; any other text is a comma-separated field list
impl IntoSelection for &str {
    fn into_selection(self) -> Selection {
        if self.trim() == "*" {
            return Selection::All;
        }
        Selection::Fields(
            self.split(',')
                .map(str::trim)
                .filter(|field| !field.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

impl IntoSelection for String {
    fn into_selection(self) -> Selection {
        self.as_str().into_selection()
    }
}

impl IntoSelection for Vec<&str> {
    fn into_selection(self) -> Selection {
        Selection::Fields(self.into_iter().map(str::to_string).collect())
    }
}

impl IntoSelection for Vec<String> {
    fn into_selection(self) -> Selection {
        Selection::Fields(self)
    }
}

impl IntoSelection for &[&str] {
    fn into_selection(self) -> Selection {
        Selection::Fields(self.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> IntoSelection for [&str; N] {
    fn into_selection(self) -> Selection {
        Selection::Fields(self.iter().map(|s| s.to_string()).collect())
    }
}
