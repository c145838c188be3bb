/// Lifecycle of a session: `Idle -> Processing -> Idle`, ending in `Closed`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Processing {
        query_id: String,
    },
    Closed,
}

impl SessionState {
    pub fn in_flight(&self) -> Option<&str> {
        match self {
            Self::Processing { query_id } => Some(query_id),
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}
