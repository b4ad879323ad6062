// Copyright (c) 2026 Flynn Controller gRPC Contributors
// SPDX-License-Identifier: BSD-3-Clause

//! # Resource Names
//!
//! Hierarchical, slash-delimited names used on the wire to address controller
//! entities:
//!
//! ```text
//! apps/{app_id}
//! apps/{app_id}/releases/{release_id}
//! apps/{app_id}/deployments/{deployment_id}
//! events/{event_id}
//! ```
//!
//! Two layers are provided:
//!
//! - [`parse_resource_name`] / [`ResourcePath`]: permissive pairing of
//!   `kind/id` tokens into a map and back. Never rejects input; an unpaired
//!   trailing kind denotes a collection and produces no entry.
//! - [`ResourceName`]: the tagged form used by the RPC surface. Each variant
//!   is built through a validated constructor and malformed input fails with
//!   [`ResourceNameError::Malformed`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub const APPS: &str = "apps";
pub const RELEASES: &str = "releases";
pub const DEPLOYMENTS: &str = "deployments";
pub const EVENTS: &str = "events";

const COLLECTION_KINDS: [&str; 4] = [APPS, RELEASES, DEPLOYMENTS, EVENTS];

/// Split `name` on `/` and pair tokens left to right into a kind→id map.
///
/// No kind vocabulary is enforced; unknown kinds pass through as keys.
pub fn parse_resource_name(name: &str) -> HashMap<String, String> {
    let parts: Vec<&str> = name.split('/').collect();
    let mut ids = HashMap::with_capacity(parts.len() / 2);
    for pair in parts.chunks_exact(2) {
        ids.insert(pair[0].to_string(), pair[1].to_string());
    }
    ids
}

/// Ordered `kind/id` pairs, formatted parent first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourcePath {
    segments: Vec<(String, String)>,
}

impl ResourcePath {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            segments: vec![(kind.into(), id.into())],
        }
    }

    /// Nest a child `kind/id` pair under the current path.
    pub fn child(mut self, kind: impl Into<String>, id: impl Into<String>) -> Self {
        self.segments.push((kind.into(), id.into()));
        self
    }

    pub fn segments(&self) -> &[(String, String)] {
        &self.segments
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (kind, id)) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}/{}", kind, id)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceNameError {
    #[error("malformed resource name '{name}': {reason}")]
    Malformed { name: String, reason: &'static str },

    #[error("expected {expected} resource name, got '{name}'")]
    UnexpectedKind { name: String, expected: &'static str },
}

impl ResourceNameError {
    fn malformed(name: &str, reason: &'static str) -> Self {
        Self::Malformed {
            name: name.to_string(),
            reason,
        }
    }
}

/// A fully specified resource name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceName {
    App { app_id: String },
    Release { app_id: String, release_id: String },
    Deployment { app_id: String, deployment_id: String },
    Event { event_id: String },
}

impl ResourceName {
    pub fn app(app_id: impl Into<String>) -> Result<Self, ResourceNameError> {
        Ok(Self::App {
            app_id: checked_id(app_id.into())?,
        })
    }

    pub fn release(
        app_id: impl Into<String>,
        release_id: impl Into<String>,
    ) -> Result<Self, ResourceNameError> {
        Ok(Self::Release {
            app_id: checked_id(app_id.into())?,
            release_id: checked_id(release_id.into())?,
        })
    }

    pub fn deployment(
        app_id: impl Into<String>,
        deployment_id: impl Into<String>,
    ) -> Result<Self, ResourceNameError> {
        Ok(Self::Deployment {
            app_id: checked_id(app_id.into())?,
            deployment_id: checked_id(deployment_id.into())?,
        })
    }

    pub fn event(event_id: i64) -> Self {
        Self::Event {
            event_id: event_id.to_string(),
        }
    }

    /// Parse a collection parent such as `apps/{id}` or `apps/{id}/releases`.
    ///
    /// A trailing unpaired collection kind is dropped before validation.
    pub fn parse_parent(name: &str) -> Result<Self, ResourceNameError> {
        let trimmed = match name.rsplit_once('/') {
            Some((parent, kind))
                if name.split('/').count() % 2 == 1 && COLLECTION_KINDS.contains(&kind) =>
            {
                parent
            }
            _ => name,
        };
        trimmed.parse()
    }

    pub fn app_id(&self) -> Option<&str> {
        match self {
            Self::App { app_id }
            | Self::Release { app_id, .. }
            | Self::Deployment { app_id, .. } => Some(app_id),
            Self::Event { .. } => None,
        }
    }

    /// Require an application name and return its id.
    pub fn expect_app(self, name: &str) -> Result<String, ResourceNameError> {
        match self {
            Self::App { app_id } => Ok(app_id),
            _ => Err(unexpected(name, "application")),
        }
    }

    /// Require a release name and return `(app_id, release_id)`.
    pub fn expect_release(self, name: &str) -> Result<(String, String), ResourceNameError> {
        match self {
            Self::Release { app_id, release_id } => Ok((app_id, release_id)),
            _ => Err(unexpected(name, "release")),
        }
    }

    /// Require a deployment name and return `(app_id, deployment_id)`.
    pub fn expect_deployment(self, name: &str) -> Result<(String, String), ResourceNameError> {
        match self {
            Self::Deployment {
                app_id,
                deployment_id,
            } => Ok((app_id, deployment_id)),
            _ => Err(unexpected(name, "deployment")),
        }
    }

    pub fn to_path(&self) -> ResourcePath {
        match self {
            Self::App { app_id } => ResourcePath::new(APPS, app_id),
            Self::Release { app_id, release_id } => {
                ResourcePath::new(APPS, app_id).child(RELEASES, release_id)
            }
            Self::Deployment {
                app_id,
                deployment_id,
            } => ResourcePath::new(APPS, app_id).child(DEPLOYMENTS, deployment_id),
            Self::Event { event_id } => ResourcePath::new(EVENTS, event_id),
        }
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_path().fmt(f)
    }
}

impl FromStr for ResourceName {
    type Err = ResourceNameError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        if name.is_empty() {
            return Err(ResourceNameError::malformed(name, "name is empty"));
        }
        let parts: Vec<&str> = name.split('/').collect();
        if parts.iter().any(|part| part.is_empty()) {
            return Err(ResourceNameError::malformed(name, "empty path segment"));
        }

        match parts.as_slice() {
            [APPS, app_id] => Self::app(*app_id),
            [APPS, app_id, RELEASES, release_id] => Self::release(*app_id, *release_id),
            [APPS, app_id, DEPLOYMENTS, deployment_id] => {
                Self::deployment(*app_id, *deployment_id)
            }
            [EVENTS, event_id] => Ok(Self::Event {
                event_id: event_id.to_string(),
            }),
            _ if parts.len() % 2 == 1 => Err(ResourceNameError::malformed(
                name,
                "collection names do not address a single resource",
            )),
            _ => Err(ResourceNameError::malformed(name, "unknown resource kind")),
        }
    }
}

fn checked_id(id: String) -> Result<String, ResourceNameError> {
    if id.is_empty() {
        return Err(ResourceNameError::malformed(&id, "identifier is empty"));
    }
    if id.contains('/') {
        return Err(ResourceNameError::malformed(&id, "identifier contains '/'"));
    }
    Ok(id)
}

fn unexpected(name: &str, expected: &'static str) -> ResourceNameError {
    ResourceNameError::UnexpectedKind {
        name: name.to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_release_name() {
        let ids = parse_resource_name("apps/app1/releases/rel1");
        assert_eq!(ids.len(), 2);
        assert_eq!(ids["apps"], "app1");
        assert_eq!(ids["releases"], "rel1");
    }

    #[test]
    fn test_format_nests_children() {
        let name = ResourcePath::new("apps", "app1").child("releases", "rel1");
        assert_eq!(name.to_string(), "apps/app1/releases/rel1");
    }

    #[test]
    fn test_parse_format_identity() {
        let paths = [
            ResourcePath::new(APPS, "a"),
            ResourcePath::new(APPS, "a-1").child(RELEASES, "r_2"),
            ResourcePath::new(APPS, "x").child(DEPLOYMENTS, "d"),
            ResourcePath::new(EVENTS, "42"),
            ResourcePath::new("widgets", "w").child("gears", "g"),
        ];
        for path in paths {
            let ids = parse_resource_name(&path.to_string());
            let expected: HashMap<String, String> = path.segments().iter().cloned().collect();
            assert_eq!(ids, expected, "round trip of {}", path);
        }
    }

    #[test]
    fn test_parse_is_permissive() {
        assert!(parse_resource_name("").is_empty());

        // trailing unpaired kind is a collection address
        let ids = parse_resource_name("apps/app1/releases");
        assert_eq!(ids.len(), 1);
        assert_eq!(ids["apps"], "app1");
        assert!(!ids.contains_key("releases"));

        // unknown kinds pass through
        let ids = parse_resource_name("things/t1");
        assert_eq!(ids["things"], "t1");

        // empty identifiers are kept for the caller to deal with
        let ids = parse_resource_name("apps/");
        assert_eq!(ids["apps"], "");
    }

    #[test]
    fn test_resource_name_parse() {
        assert_eq!(
            "apps/a1".parse::<ResourceName>().unwrap(),
            ResourceName::App { app_id: "a1".into() }
        );
        assert_eq!(
            "apps/a1/releases/r1".parse::<ResourceName>().unwrap(),
            ResourceName::Release {
                app_id: "a1".into(),
                release_id: "r1".into()
            }
        );
        assert_eq!(
            "apps/a1/deployments/d1".parse::<ResourceName>().unwrap(),
            ResourceName::Deployment {
                app_id: "a1".into(),
                deployment_id: "d1".into()
            }
        );
        assert_eq!(
            "events/7".parse::<ResourceName>().unwrap(),
            ResourceName::event(7)
        );
    }

    #[test]
    fn test_resource_name_rejects_malformed() {
        for name in [
            "",
            "apps",
            "apps/",
            "apps//releases/r1",
            "apps/a1/releases",
            "releases/r1",
            "apps/a1/widgets/w1",
            "apps/a1/releases/r1/extra",
        ] {
            let err = name.parse::<ResourceName>().unwrap_err();
            assert!(
                matches!(err, ResourceNameError::Malformed { .. }),
                "{} should be malformed, got {:?}",
                name,
                err
            );
        }
    }

    #[test]
    fn test_resource_name_display_round_trip() {
        let names = [
            ResourceName::app("a1").unwrap(),
            ResourceName::release("a1", "r1").unwrap(),
            ResourceName::deployment("a1", "d1").unwrap(),
            ResourceName::event(99),
        ];
        for name in names {
            assert_eq!(name.to_string().parse::<ResourceName>().unwrap(), name);
        }
    }

    #[test]
    fn test_constructor_validation() {
        assert!(ResourceName::app("").is_err());
        assert!(ResourceName::release("a1", "r/1").is_err());
        assert!(ResourceName::deployment("", "d1").is_err());
    }

    #[test]
    fn test_parse_parent_drops_collection_kind() {
        assert_eq!(
            ResourceName::parse_parent("apps/a1/releases").unwrap(),
            ResourceName::App { app_id: "a1".into() }
        );
        assert_eq!(
            ResourceName::parse_parent("apps/a1").unwrap(),
            ResourceName::App { app_id: "a1".into() }
        );
        assert!(ResourceName::parse_parent("apps/a1/widgets").is_err());
    }

    #[test]
    fn test_expect_kind() {
        let name = "apps/a1/releases/r1";
        let parsed: ResourceName = name.parse().unwrap();
        assert_eq!(
            parsed.clone().expect_release(name).unwrap(),
            ("a1".to_string(), "r1".to_string())
        );
        assert!(matches!(
            parsed.expect_app(name),
            Err(ResourceNameError::UnexpectedKind { .. })
        ));
    }
}
