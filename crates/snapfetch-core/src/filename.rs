//! Local filename derivation from artifact URLs.
//!
//! The fetch-if-absent contract keys on the URL's last path segment: that is
//! the name the download lands under and the name checked for presence.

/// Extracts the last non-empty path segment of `url`, sanitized for use as a
/// Linux filename.
///
/// Returns `None` if the URL cannot be parsed or has no usable path segment
/// (bare host, root path, or a segment that sanitizes to nothing).
pub fn filename_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let path = parsed.path();
    let segment = path.split('/').filter(|s| !s.is_empty()).last()?;
    if segment == "." || segment == ".." {
        return None;
    }
    let sanitized = sanitize(segment);
    if sanitized.is_empty() {
        return None;
    }
    Some(sanitized)
}

/// Replaces NUL, separators, control chars, and whitespace with `_`,
/// collapses runs of `_`, and trims leading/trailing dots and underscores.
fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_underscore = false;

    for c in name.chars() {
        let replacement = if c == '\0' || c == '/' || c == '\\' || c.is_control() {
            '_'
        } else if c == ' ' || c == '\t' {
            '_'
        } else {
            c
        };

        if replacement == '_' {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(replacement);
            prev_underscore = false;
        }
    }

    out.trim_matches(|c| c == '.' || c == '_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_segment_of_artifact_urls() {
        assert_eq!(
            filename_from_url(
                "https://s3-us-west-1.amazonaws.com/cdh5-snapshots/public-snapshot.tar.gz"
            )
            .as_deref(),
            Some("public-snapshot.tar.gz")
        );
        assert_eq!(
            filename_from_url(
                "http://jenkins.example/job/x/lastStableBuild/artifact/hive_impala_dump_cdh5-123.txt"
            )
            .as_deref(),
            Some("hive_impala_dump_cdh5-123.txt")
        );
    }

    #[test]
    fn root_or_empty_path() {
        assert_eq!(filename_from_url("https://example.com/"), None);
        assert_eq!(filename_from_url("https://example.com"), None);
        assert_eq!(filename_from_url("not a url"), None);
    }

    #[test]
    fn query_string_ignored() {
        assert_eq!(
            filename_from_url("https://example.com/file.tar.gz?token=abc").as_deref(),
            Some("file.tar.gz")
        );
    }

    #[test]
    fn sanitizes_hostile_segments() {
        assert_eq!(sanitize("a\\b c.txt"), "a_b_c.txt");
        assert_eq!(sanitize("..."), "");
        assert_eq!(sanitize("file\x00name"), "file_name");
    }
}
