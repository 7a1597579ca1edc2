use serde::Deserialize;

/// Name of the transition applied to every linked issue.
pub const RESOLVE_TRANSITION: &str = "Resolve";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Internal numeric id, used for transition calls.
    pub id: String,
    pub key: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Transition {
    pub id: String,
    pub name: String,
}

impl Transition {
    pub fn find_resolve(transitions: &[Transition]) -> Option<&Transition> {
        transitions
            .iter()
            .find(|transition| transition.name == RESOLVE_TRANSITION)
    }
}
