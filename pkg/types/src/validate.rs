use anyhow::{Result, bail};
use pkg_constants::collector::MAX_NAME_LEN;

/// Validate a namespace name (RFC 1123 label).
/// Rules: lowercase `[a-z0-9-]`, max 63 chars, no leading/trailing hyphens.
pub fn validate_namespace_name(name: &str) -> Result<()> {
    validate_label("namespace", name)
}

/// Validate a Service name (RFC 1035 label).
/// Same rules as a namespace, and the first character must be a letter.
pub fn validate_service_name(name: &str) -> Result<()> {
    validate_label("service", name)?;
    if !name.starts_with(|c: char| c.is_ascii_lowercase()) {
        bail!("service name '{}' must start with a lowercase letter", name);
    }
    Ok(())
}

fn validate_label(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("{} name must not be empty", kind);
    }
    if name.len() > MAX_NAME_LEN {
        bail!(
            "{} name '{}' exceeds {} characters (got {})",
            kind,
            name,
            MAX_NAME_LEN,
            name.len()
        );
    }
    if name.starts_with('-') || name.ends_with('-') {
        bail!("{} name '{}' must not start or end with a hyphen", kind, name);
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        bail!(
            "{} name '{}' must contain only lowercase letters, digits, and hyphens [a-z0-9-]",
            kind,
            name
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        assert!(validate_namespace_name("default").is_ok());
        assert!(validate_namespace_name("kube-system").is_ok());
        assert!(validate_namespace_name("0team").is_ok());
        assert!(validate_service_name("nginx").is_ok());
        assert!(validate_service_name("my-app-123").is_ok());
    }

    #[test]
    fn invalid_names() {
        assert!(validate_namespace_name("").is_err());
        assert!(validate_namespace_name("My-Ns").is_err());
        assert!(validate_namespace_name("my_ns").is_err());
        assert!(validate_namespace_name("-leading").is_err());
        assert!(validate_namespace_name("trailing-").is_err());
        assert!(validate_namespace_name(&"a".repeat(64)).is_err());
        assert!(validate_service_name("").is_err());
        assert!(validate_service_name("1web").is_err());
        assert!(validate_service_name("web.svc").is_err());
    }

    #[test]
    fn error_names_the_field() {
        let err = validate_service_name("").unwrap_err();
        assert_eq!(err.to_string(), "service name must not be empty");
    }
}
