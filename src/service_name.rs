//! Validated protobuf-style dotted service identifiers.
//!
//! A [`ServiceName`] is the `package.Service` pair carried on the wire as
//! the first path segment of every gRPC call (`/pkg.Service/Method`).

use std::fmt;

/// A validated, immutable `package.Service` identifier.
///
/// Equality and hashing are defined on `(package, service)` only —
/// `fully_qualified` is derived and must never participate, or two
/// `ServiceName`s built from different constructors could compare unequal
/// despite carrying the same identity.
#[derive(Debug, Clone)]
pub struct ServiceName {
    package: Option<String>,
    service: String,
    fully_qualified: String,
}

/// The identifier failed validation: empty, blank, or containing a
/// character outside `[A-Za-z0-9_.]`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid service identifier: {0}")]
pub struct InvalidIdentifier(String);

fn is_valid_char(c: char, allow_dot: bool) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || (allow_dot && c == '.')
}

fn validate_part(part: &str, allow_dot: bool) -> Result<(), InvalidIdentifier> {
    if part.is_empty() {
        return Err(InvalidIdentifier(format!("empty identifier component: {part:?}")));
    }
    if !part.chars().all(|c| is_valid_char(c, allow_dot)) {
        return Err(InvalidIdentifier(format!(
            "identifier {part:?} contains characters outside [A-Za-z0-9_.]"
        )));
    }
    Ok(())
}

impl ServiceName {
    /// Parses a fully-qualified `package.Service` (or bare `Service`)
    /// identifier, splitting on the *last* `.`.
    pub fn parse(fully_qualified: &str) -> Result<Self, InvalidIdentifier> {
        validate_part(fully_qualified, true)?;

        match fully_qualified.rfind('.') {
            Some(idx) => {
                let (package, service) = fully_qualified.split_at(idx);
                let service = &service[1..]; // drop the '.'
                Self::of(Some(package), service)
            }
            None => Self::of(None::<&str>, fully_qualified),
        }
    }

    /// Builds a `ServiceName` from an already-split package/service pair,
    /// validating each part independently.
    pub fn of(
        package: Option<impl AsRef<str>>,
        service: impl AsRef<str>,
    ) -> Result<Self, InvalidIdentifier> {
        let service = service.as_ref();
        validate_part(service, false)?;

        let package = match package {
            Some(p) => {
                let p = p.as_ref();
                validate_part(p, true)?;
                Some(p.to_string())
            }
            None => None,
        };

        let fully_qualified = match &package {
            Some(p) => format!("{p}.{service}"),
            None => service.to_string(),
        };

        Ok(Self {
            package,
            service: service.to_string(),
            fully_qualified,
        })
    }

    /// The `package` component, if any.
    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    /// The bare service name (no package prefix).
    pub fn service(&self) -> &str {
        &self.service
    }

    /// `package + "." + service`, or just `service` when there is no package.
    pub fn fully_qualified(&self) -> &str {
        &self.fully_qualified
    }

    /// Builds the full gRPC method path `/package.Service/method`.
    ///
    /// The method component is passed through unvalidated — callers invoke
    /// this with a method name already extracted from a trusted route table.
    pub fn method_path(&self, method: &str) -> String {
        format!("/{}/{}", self.fully_qualified, method)
    }
}

impl PartialEq for ServiceName {
    fn eq(&self, other: &Self) -> bool {
        self.package == other.package && self.service == other.service
    }
}

impl Eq for ServiceName {}

impl std::hash::Hash for ServiceName {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.package.hash(state);
        self.service.hash(state);
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fully_qualified)
    }
}
