//! Classification of directory tool stderr into SCIM-mappable categories.
//!
//! The AD cmdlets report failures as free-text stderr; substring matching
//! against the lowercased text is how the bridge decides which HTTP status
//! and `scimType` an identity provider sees. Matching is ordered: the
//! first rule that applies wins.

/// Category of a failed directory command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryErrorKind {
    /// The object (or an attribute value) already exists → 409 `uniqueness`.
    AlreadyExists,
    /// The target object was not found → 404 `noTarget`.
    NotFound,
    /// The password was rejected by domain policy → 400 `invalidValue`.
    PasswordPolicy,
    /// The service account lacks rights → 403.
    AccessDenied,
    /// The tool rejected the request as malformed → 400 `invalidValue`.
    InvalidRequest,
    /// Anything else → 500.
    Unknown,
}

/// Classify a directory tool stderr string.
///
/// Rules are checked in order against the lowercased text; the caller
/// keeps the original stderr for the user-visible error detail.
#[must_use]
pub fn classify(stderr: &str) -> DirectoryErrorKind {
    let text = stderr.to_lowercase();

    if text.contains("already exists") || text.contains("already in use") {
        return DirectoryErrorKind::AlreadyExists;
    }
    if text.contains("cannot find an object with identity")
        || text.contains("not found")
        || text.contains("no such object")
    {
        return DirectoryErrorKind::NotFound;
    }
    if text.contains("password")
        && (text.contains("complexity")
            || text.contains("length")
            || text.contains("requirement"))
    {
        return DirectoryErrorKind::PasswordPolicy;
    }
    if text.contains("access") && text.contains("denied") {
        return DirectoryErrorKind::AccessDenied;
    }
    if text.contains("invalid") || text.contains("bad request") {
        return DirectoryErrorKind::InvalidRequest;
    }

    DirectoryErrorKind::Unknown
}

/// Whether a delete failure means the object was already gone.
///
/// `Remove-ADUser` against a missing object is treated as success so that
/// deprovisioning is idempotent from the identity provider's view.
#[must_use]
pub fn is_already_gone(stderr: &str) -> bool {
    let text = stderr.to_lowercase();
    text.contains("cannot find") || text.contains("not found")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_exists() {
        assert_eq!(
            classify("The specified account already exists"),
            DirectoryErrorKind::AlreadyExists
        );
        assert_eq!(
            classify("The name is already in use on this server"),
            DirectoryErrorKind::AlreadyExists
        );
    }

    #[test]
    fn test_not_found() {
        assert_eq!(
            classify("Cannot find an object with identity: 'CN=Bob,...'"),
            DirectoryErrorKind::NotFound
        );
        assert_eq!(classify("Directory object not found"), DirectoryErrorKind::NotFound);
        assert_eq!(classify("NO SUCH OBJECT"), DirectoryErrorKind::NotFound);
    }

    #[test]
    fn test_password_policy() {
        assert_eq!(
            classify("The password does not meet the length, complexity, or history requirement of the domain."),
            DirectoryErrorKind::PasswordPolicy
        );
        // "password" alone is not enough
        assert_eq!(classify("password was wrong"), DirectoryErrorKind::Unknown);
    }

    #[test]
    fn test_access_denied() {
        assert_eq!(classify("Access is denied."), DirectoryErrorKind::AccessDenied);
    }

    #[test]
    fn test_invalid_request() {
        assert_eq!(
            classify("The attribute value is invalid"),
            DirectoryErrorKind::InvalidRequest
        );
        assert_eq!(classify("Bad request"), DirectoryErrorKind::InvalidRequest);
    }

    #[test]
    fn test_unknown_fallback() {
        assert_eq!(classify("RPC server unavailable"), DirectoryErrorKind::Unknown);
        assert_eq!(classify(""), DirectoryErrorKind::Unknown);
    }

    #[test]
    fn test_first_match_wins() {
        // "already exists" outranks the not-found rule even when both apply
        assert_eq!(
            classify("object not found, but a conflicting entry already exists"),
            DirectoryErrorKind::AlreadyExists
        );
    }

    #[test]
    fn test_already_gone() {
        assert!(is_already_gone("Cannot find an object with identity: 'alice'"));
        assert!(is_already_gone("object NOT FOUND"));
        assert!(!is_already_gone("Access is denied."));
    }
}
