//! Input validation. Everything here runs before any I/O.

use std::collections::HashSet;

use phoenix_types::{KeyKind, Node, Page, RelatedTopic, Source};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::update::Update;

/// Length of a hyphenated UUID string.
const HYPHENATED_UUID_LEN: usize = 36;

pub fn validate_source(source: &Source) -> Result<(), ValidationError> {
    if source.id <= 0 {
        return Err(ValidationError::MissingSourceId);
    }
    if source.revision <= 0 {
        return Err(ValidationError::MissingRevision);
    }
    if source.time_uuid.len() != HYPHENATED_UUID_LEN || Uuid::try_parse(&source.time_uuid).is_err()
    {
        return Err(ValidationError::InvalidTimeUuid(source.time_uuid.clone()));
    }
    if source.authority.is_empty() {
        return Err(ValidationError::MissingAuthority);
    }
    Ok(())
}

/// Page fields that must be set regardless of `has_part`.
fn validate_page_fields(page: &Page) -> Result<(), ValidationError> {
    if page.name.is_empty() {
        return Err(ValidationError::MissingPageName);
    }
    if page.url.is_empty() {
        return Err(ValidationError::MissingPageUrl);
    }
    if page.date_modified.is_none() {
        return Err(ValidationError::MissingPageDateModified);
    }
    Ok(())
}

pub fn validate_page(page: &Page) -> Result<(), ValidationError> {
    validate_page_fields(page)?;
    if page.has_part.is_empty() {
        return Err(ValidationError::EmptyHasPart);
    }
    validate_source(&page.source)
}

pub fn validate_node(node: &Node) -> Result<(), ValidationError> {
    if node.date_modified.is_none() {
        return Err(ValidationError::MissingNodeDateModified {
            name: node.name.clone(),
        });
    }
    validate_source(&node.source)
}

/// Everything `apply` would otherwise discover mid-write.
///
/// `has_part` is rebuilt from the nodes, so the update must carry at least
/// one. Nodes inherit the page's source, so only their own fields are
/// checked here. Node names must be unique: node IDs derive from the name,
/// and a repeated name would overwrite an earlier section.
pub fn validate_update(update: &Update) -> Result<(), ValidationError> {
    validate_source(&update.page.source)?;
    validate_page_fields(&update.page)?;
    if update.nodes.is_empty() {
        return Err(ValidationError::NoNodes);
    }

    let mut seen = HashSet::with_capacity(update.nodes.len());
    for node in &update.nodes {
        if node.date_modified.is_none() {
            return Err(ValidationError::MissingNodeDateModified {
                name: node.name.clone(),
            });
        }
        if !seen.insert(node.name.as_str()) {
            return Err(ValidationError::DuplicateNodeName(node.name.clone()));
        }
    }
    Ok(())
}

pub fn validate_topics(topics: &[RelatedTopic]) -> Result<(), ValidationError> {
    match topics.iter().find(|t| !t.has_valid_salience()) {
        Some(t) => Err(ValidationError::Salience {
            topic: t.id.clone(),
            salience: t.salience,
        }),
        None => Ok(()),
    }
}

pub fn validate_key(key: &str, expected: KeyKind) -> Result<(), ValidationError> {
    if KeyKind::of(key) == Some(expected) {
        Ok(())
    } else {
        Err(ValidationError::WrongKeyKind {
            key: key.to_string(),
            expected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn source() -> Source {
        Source {
            id: 1,
            revision: 1,
            time_uuid: "0c0e5bde-4f0b-11eb-9b6c-5f6e2b2f3a1d".into(),
            authority: "fake.wikipedia.org".into(),
        }
    }

    fn page() -> Page {
        Page {
            source: source(),
            name: "San Antonio".into(),
            url: "//fake.wikipedia.org/wiki/San_Antonio".into(),
            date_modified: Some(Utc::now()),
            has_part: vec!["/node/1".into()],
            ..Page::default()
        }
    }

    fn node(name: &str) -> Node {
        Node {
            name: name.into(),
            date_modified: Some(Utc::now()),
            ..Node::default()
        }
    }

    // -----------------------------------------------------------------------
    // Source
    // -----------------------------------------------------------------------

    #[test]
    fn valid_source_passes() {
        assert_eq!(validate_source(&source()), Ok(()));
    }

    #[test]
    fn source_rules() {
        let mut s = source();
        s.id = 0;
        assert_eq!(validate_source(&s), Err(ValidationError::MissingSourceId));

        let mut s = source();
        s.revision = -1;
        assert_eq!(validate_source(&s), Err(ValidationError::MissingRevision));

        let mut s = source();
        s.authority.clear();
        assert_eq!(validate_source(&s), Err(ValidationError::MissingAuthority));
    }

    #[test]
    fn time_uuid_must_be_hyphenated_uuid() {
        for bad in [
            "",
            "not-a-uuid",
            "0c0e5bde4f0b11eb9b6c5f6e2b2f3a1d",
            "{0c0e5bde-4f0b-11eb-9b6c-5f6e2b2f3a1d}",
            "0c0e5bde-4f0b-11eb-9b6c-5f6e2b2f3aZZ",
        ] {
            let mut s = source();
            s.time_uuid = bad.into();
            assert_eq!(
                validate_source(&s),
                Err(ValidationError::InvalidTimeUuid(bad.into())),
                "{bad:?} should be rejected"
            );
        }
    }

    // -----------------------------------------------------------------------
    // Page / Node
    // -----------------------------------------------------------------------

    #[test]
    fn page_rules() {
        assert_eq!(validate_page(&page()), Ok(()));

        let mut p = page();
        p.name.clear();
        assert_eq!(validate_page(&p), Err(ValidationError::MissingPageName));

        let mut p = page();
        p.url.clear();
        assert_eq!(validate_page(&p), Err(ValidationError::MissingPageUrl));

        let mut p = page();
        p.date_modified = None;
        assert_eq!(validate_page(&p), Err(ValidationError::MissingPageDateModified));

        let mut p = page();
        p.has_part.clear();
        assert_eq!(validate_page(&p), Err(ValidationError::EmptyHasPart));

        let mut p = page();
        p.source.authority.clear();
        assert_eq!(validate_page(&p), Err(ValidationError::MissingAuthority));
    }

    #[test]
    fn node_rules() {
        let mut n = node("History");
        n.source = source();
        assert_eq!(validate_node(&n), Ok(()));

        n.date_modified = None;
        assert_eq!(
            validate_node(&n),
            Err(ValidationError::MissingNodeDateModified {
                name: "History".into()
            })
        );

        let unsourced = node("History");
        assert_eq!(validate_node(&unsourced), Err(ValidationError::MissingSourceId));
    }

    // -----------------------------------------------------------------------
    // Update
    // -----------------------------------------------------------------------

    #[test]
    fn update_requires_nodes() {
        let update = Update::new(page());
        assert_eq!(validate_update(&update), Err(ValidationError::NoNodes));
    }

    #[test]
    fn update_ignores_incoming_has_part() {
        let mut p = page();
        p.has_part.clear();
        let update = Update::new(p).with_node(node("History"));
        assert_eq!(validate_update(&update), Ok(()));
    }

    #[test]
    fn update_rejects_duplicate_node_names() {
        let update = Update::new(page())
            .with_node(node("History"))
            .with_node(node("Geography"))
            .with_node(node("History"));
        assert_eq!(
            validate_update(&update),
            Err(ValidationError::DuplicateNodeName("History".into()))
        );
    }

    #[test]
    fn update_checks_node_dates() {
        let mut undated = node("Geography");
        undated.date_modified = None;
        let update = Update::new(page()).with_node(node("History")).with_node(undated);
        assert!(matches!(
            validate_update(&update),
            Err(ValidationError::MissingNodeDateModified { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Topics / keys
    // -----------------------------------------------------------------------

    #[test]
    fn topic_salience_bounds() {
        assert_eq!(
            validate_topics(&[RelatedTopic::new("Q1", 0.0), RelatedTopic::new("Q2", 1.0)]),
            Ok(())
        );
        assert!(matches!(
            validate_topics(&[RelatedTopic::new("Q1", 0.5), RelatedTopic::new("Q2", 1.01)]),
            Err(ValidationError::Salience { ref topic, .. }) if topic == "Q2"
        ));
    }

    #[test]
    fn key_kind_checks() {
        assert_eq!(validate_key("/data/abc", KeyKind::Data), Ok(()));
        assert!(validate_key("/node/abc", KeyKind::Data).is_err());
        assert!(validate_key("abc", KeyKind::Data).is_err());
    }
}
