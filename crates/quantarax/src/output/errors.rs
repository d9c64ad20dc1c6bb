//! Smart error diagnosis with actionable guidance

/// Provide context-aware guidance for common error patterns.
///
/// Returns `Some(hint)` if the error message matches a known pattern,
/// providing the user with actionable steps to resolve the issue.
pub fn diagnose(err: &dyn std::fmt::Display) -> Option<String> {
    let msg = err.to_string();
    let lower = msg.to_lowercase();

    if lower.contains("connection refused") {
        return Some(
            "The peer may not be listening yet, or is behind a firewall. Try:\n  \
             1. Check the peer address and port\n  \
             2. Start the receiver first: quantarax receive --listen <address>\n  \
             3. Run 'quantarax doctor' to diagnose"
                .to_string(),
        );
    }
    if lower.contains("address already in use") {
        return Some(
            "Another quantarax instance may already be listening on that port.\n  \
             Check with: lsof -i :4433 (Unix) or netstat -an | findstr 4433 (Windows)"
                .to_string(),
        );
    }
    if lower.contains("permission denied") {
        return Some(
            "Permission denied. Try:\n  \
             1. Check file/directory permissions\n  \
             2. Specify a different output directory: quantarax receive -o ~/Downloads"
                .to_string(),
        );
    }
    if lower.contains("no such file or directory") || lower.contains("not found") {
        return Some(
            "File or directory not found. Verify the path exists and is spelled correctly."
                .to_string(),
        );
    }
    if lower.contains("timed out") || lower.contains("timeout") {
        return Some(
            "Connection timed out. The peer may not be reachable yet.\n  \
             Try again, or check 'quantarax doctor' for connectivity issues."
                .to_string(),
        );
    }
    if lower.contains("no space left on device") || lower.contains("disk full") {
        return Some(
            "Disk full. Free up space or specify a different output directory: \
             quantarax receive -o /path/with/space"
                .to_string(),
        );
    }
    if lower.contains("broken pipe") {
        return Some("The connection was interrupted. The peer may have disconnected.".to_string());
    }
    if lower.contains("authentication") || lower.contains("auth failed") || lower.contains("not trusted") {
        return Some(
            "The peer's manifest signature did not verify. This can mean the file was \
             tampered with in transit, or the peer's identity changed since the last transfer."
                .to_string(),
        );
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_connection_refused() {
        let err = io::Error::new(io::ErrorKind::ConnectionRefused, "Connection refused");
        let hint = diagnose(&err);
        assert!(hint.is_some());
        assert!(hint.unwrap().contains("listening"));
    }

    #[test]
    fn test_permission_denied() {
        let err = io::Error::new(io::ErrorKind::PermissionDenied, "Permission denied");
        let hint = diagnose(&err);
        assert!(hint.is_some());
        assert!(hint.unwrap().contains("permissions"));
    }

    #[test]
    fn test_timeout() {
        let err = io::Error::new(io::ErrorKind::TimedOut, "operation timed out");
        let hint = diagnose(&err);
        assert!(hint.is_some());
        assert!(hint.unwrap().contains("doctor"));
    }

    #[test]
    fn test_unknown_error_returns_none() {
        let err = io::Error::new(io::ErrorKind::Other, "unknown error xyz");
        assert!(diagnose(&err).is_none());
    }

    #[test]
    fn test_disk_full() {
        let err = io::Error::new(io::ErrorKind::Other, "no space left on device");
        let hint = diagnose(&err);
        assert!(hint.is_some());
        assert!(hint.unwrap().contains("space"));
    }

    #[test]
    fn test_broken_pipe() {
        let err = io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe");
        let hint = diagnose(&err);
        assert!(hint.is_some());
        assert!(hint.unwrap().contains("disconnected"));
    }

    #[test]
    fn test_auth_failed() {
        let err = io::Error::new(io::ErrorKind::Other, "Authentication failed");
        let hint = diagnose(&err);
        assert!(hint.is_some());
        assert!(hint.unwrap().contains("signature"));
    }
}
