use std::convert::Infallible;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// A chat-protocol address: `node@domain/resource`.
///
/// Parsing is permissive: anything is accepted and split on a best-effort
/// basis. Equality and hashing only look at the short form, so
/// `alice@example.com/phone` and `alice@example.com/laptop` are the same
/// contact.
#[derive(Debug, Clone)]
pub struct Identity {
    node: Option<String>,
    domain: String,
    resource: Option<String>,
}

impl Identity {
    pub fn new(
        node: Option<impl Into<String>>,
        domain: impl Into<String>,
        resource: Option<impl Into<String>>,
    ) -> Self {
        Self {
            node: node.map(Into::into).filter(|n: &String| !n.is_empty()),
            domain: domain.into(),
            resource: resource.map(Into::into).filter(|r: &String| !r.is_empty()),
        }
    }

    /// Parse `node@domain/resource`. The resource starts at the first `/`,
    /// the node ends at the first `@` before it.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let (bare, resource) = match raw.split_once('/') {
            Some((bare, resource)) => (bare, Some(resource)),
            None => (raw, None),
        };
        let (node, domain) = match bare.split_once('@') {
            Some((node, domain)) => (Some(node), domain),
            None => (None, bare),
        };
        Self::new(node, domain, resource)
    }

    pub fn node(&self) -> Option<&str> {
        self.node.as_deref()
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    /// Canonical lookup key: `node@domain`, or the domain alone.
    pub fn short(&self) -> String {
        match &self.node {
            Some(node) => format!("{}@{}", node, self.domain),
            None => self.domain.clone(),
        }
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node && self.domain == other.domain
    }
}

impl Eq for Identity {}

impl Hash for Identity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.node.hash(state);
        self.domain.hash(state);
    }
}

impl FromStr for Identity {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short())?;
        if let Some(resource) = &self.resource {
            write!(f, "/{}", resource)?;
        }
        Ok(())
    }
}
