use std::fmt;

/// Semantic identifier for one cached query.
///
/// Keys group related values for the same resource: the list, the detail
/// record, and the volatile live counters are cached and refreshed
/// independently.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    EventsList,
    UpcomingEvents,
    EventDetail(i64),
    EventLive(i64),
    BlogList,
    BlogDetail(String),
}

/// Policy class of a key. Every key maps to exactly one class; the class
/// decides staleness, refetch, and retry behavior (see `QueryPolicy`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyClass {
    List,
    Detail,
    Live,
}

impl QueryKey {
    pub fn class(&self) -> KeyClass {
        match self {
            QueryKey::EventsList | QueryKey::UpcomingEvents | QueryKey::BlogList => KeyClass::List,
            QueryKey::EventDetail(_) | QueryKey::BlogDetail(_) => KeyClass::Detail,
            QueryKey::EventLive(_) => KeyClass::Live,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::EventsList => write!(f, "events:list"),
            QueryKey::UpcomingEvents => write!(f, "events:upcoming"),
            QueryKey::EventDetail(id) => write!(f, "events:detail:{}", id),
            QueryKey::EventLive(id) => write!(f, "events:live:{}", id),
            QueryKey::BlogList => write!(f, "blogs:list"),
            QueryKey::BlogDetail(slug) => write!(f, "blogs:detail:{}", slug),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_classes() {
        assert_eq!(QueryKey::EventsList.class(), KeyClass::List);
        assert_eq!(QueryKey::UpcomingEvents.class(), KeyClass::List);
        assert_eq!(QueryKey::BlogList.class(), KeyClass::List);
        assert_eq!(QueryKey::EventDetail(1).class(), KeyClass::Detail);
        assert_eq!(QueryKey::BlogDetail("slug".into()).class(), KeyClass::Detail);
        assert_eq!(QueryKey::EventLive(1).class(), KeyClass::Live);
    }

    #[test]
    fn test_display() {
        assert_eq!(QueryKey::EventLive(42).to_string(), "events:live:42");
        assert_eq!(QueryKey::BlogDetail("rest-days".into()).to_string(), "blogs:detail:rest-days");
    }
}
