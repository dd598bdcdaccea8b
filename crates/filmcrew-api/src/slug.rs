//! URL slugs for company pages. A slug is lowercase alphanumerics separated
//! by single hyphens, 3 to 50 characters.

pub const MIN_LEN: usize = 3;
pub const MAX_LEN: usize = 50;

/// Derive a slug candidate from a human-readable name: lowercase, runs of
/// anything non-alphanumeric collapse to one hyphen, edges trimmed.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug.truncate(MAX_LEN);
    if slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Check a slug a client supplied directly.
pub fn validate(slug: &str) -> Result<(), String> {
    if slug.len() < MIN_LEN {
        return Err(format!("slug must be at least {} characters", MIN_LEN));
    }
    if slug.len() > MAX_LEN {
        return Err(format!("slug must be at most {} characters", MAX_LEN));
    }
    if slug.starts_with('-') || slug.ends_with('-') {
        return Err("slug cannot start or end with a hyphen".into());
    }
    if slug.contains("--") {
        return Err("slug cannot contain consecutive hyphens".into());
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("slug may only contain lowercase letters, digits, and hyphens".into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_hyphenated_lowercase() {
        assert_eq!(slugify("My Film Co!!"), "my-film-co");
        assert_eq!(slugify("  Stray   Light  "), "stray-light");
        assert_eq!(slugify("42nd Street Pictures"), "42nd-street-pictures");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn derived_slugs_pass_validation() {
        for name in ["My Film Co!!", "Stray Light", "A24-style Outfit"] {
            assert!(validate(&slugify(name)).is_ok(), "{}", name);
        }
    }

    #[test]
    fn rejects_malformed_slugs() {
        assert!(validate("ab").is_err());
        assert!(validate("-leading").is_err());
        assert!(validate("trailing-").is_err());
        assert!(validate("double--hyphen").is_err());
        assert!(validate("Upper-Case").is_err());
        assert!(validate("spa ce").is_err());
        assert!(validate(&"x".repeat(MAX_LEN + 1)).is_err());
    }
}
