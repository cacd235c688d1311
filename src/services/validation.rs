// Hand-written input rules shared by the services

use super::error::ServiceError;

/// Trim and check a folder or document name.
pub fn validate_name(raw: &str, max_len: usize) -> Result<String, ServiceError> {
    let name = raw.trim();

    if name.is_empty() {
        return Err(ServiceError::field("name", "must not be empty"));
    }
    if name.chars().count() > max_len {
        return Err(ServiceError::field("name", format!("must be at most {} characters", max_len)));
    }
    if name == "." || name == ".." {
        return Err(ServiceError::field("name", "must not be '.' or '..'"));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(ServiceError::field("name", "must not contain '/' or '\\'"));
    }
    if name.chars().any(char::is_control) {
        return Err(ServiceError::field("name", "must not contain control characters"));
    }

    Ok(name.to_string())
}

/// Person and tenant display names: trimmed, non-empty, bounded
pub fn validate_display_name(raw: &str, max_len: usize) -> Result<String, ServiceError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ServiceError::field("name", "must not be empty"));
    }
    if name.chars().count() > max_len || name.chars().any(char::is_control) {
        return Err(ServiceError::field("name", "is too long or contains control characters"));
    }
    Ok(name.to_string())
}

/// Lowercase ASCII alphanumerics; every other run collapses to one `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

pub fn normalize_email(raw: &str) -> Result<String, ServiceError> {
    let email = raw.trim().to_lowercase();

    let invalid = || ServiceError::field("email", format!("'{}' is not a valid address", raw.trim()));

    if email.len() > 320 || email.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(invalid());
    }
    if domain.starts_with('.') || domain.ends_with('.') || domain.contains("..") {
        return Err(invalid());
    }

    Ok(email)
}

pub fn validate_content_type(raw: &str) -> Result<String, ServiceError> {
    let ct = raw.trim().to_ascii_lowercase();
    match ct.split_once('/') {
        Some((kind, sub)) if !kind.is_empty() && !sub.is_empty() && ct.len() <= 255 && ct.is_ascii() => Ok(ct),
        _ => Err(ServiceError::field("content_type", format!("'{}' is not a media type", raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_trimmed() {
        assert_eq!(validate_name("  Q3 Report.pdf \t", 255).unwrap(), "Q3 Report.pdf");
    }

    #[test]
    fn rejects_bad_names() {
        for bad in ["", "   ", ".", "..", "a/b", "a\\b", "tab\there", "nul\0"] {
            assert!(validate_name(bad, 255).is_err(), "{:?} should be rejected", bad);
        }
        assert!(validate_name(&"x".repeat(256), 255).is_err());
        assert!(validate_name(&"é".repeat(255), 255).is_ok());
        assert!(validate_name("..hidden", 255).is_ok());
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Acme Corp"), "acme-corp");
        assert_eq!(slugify("  Foo__Bar!! "), "foo-bar");
        assert_eq!(slugify("Dépôt 42"), "d-p-t-42");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn emails_are_lowercased_and_checked() {
        assert_eq!(normalize_email("  Dana.Scully@ACME.test ").unwrap(), "dana.scully@acme.test");
        for bad in ["", "dana", "@acme.test", "dana@acme", "dana@@acme.test", "da na@acme.test", "dana@acme..test"] {
            assert!(normalize_email(bad).is_err(), "{:?} should be rejected", bad);
        }
    }

    #[test]
    fn content_types_need_a_slash() {
        assert_eq!(validate_content_type("Application/PDF").unwrap(), "application/pdf");
        assert!(validate_content_type("pdf").is_err());
        assert!(validate_content_type("text/").is_err());
    }
}
