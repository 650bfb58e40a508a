use std::collections::HashSet;
use std::path::Path;

use crate::error::SinkError;

/// Rewrite the local `.txt` input file to drop only lines that were both
/// (a) inside this run's processing scope and (b) successfully processed
/// (§4.9, §9 resolved Open Question). Lines outside scope, blank lines, and
/// lines that errored or had no ad tech are preserved verbatim.
///
/// `normalize` maps a trimmed raw line to the comparable URL form (the
/// caller supplies the same scheme-promotion logic the loader used, so a
/// bare hostname line matches its `https://`-promoted counterpart).
pub async fn rewrite_txt_source<F>(
    path: &Path,
    in_scope: &HashSet<String>,
    successfully_processed: &HashSet<String>,
    normalize: F,
) -> Result<(), SinkError>
where
    F: Fn(&str) -> String,
{
    let content = tokio::fs::read_to_string(path).await?;

    let kept: Vec<&str> = content
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                return true;
            }
            let candidate = normalize(trimmed);
            !(in_scope.contains(&candidate) && successfully_processed.contains(&candidate))
        })
        .collect();

    let mut rewritten = kept.join("\n");
    if content.ends_with('\n') && !rewritten.is_empty() {
        rewritten.push('\n');
    }
    tokio::fs::write(path, rewritten).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(s: &str) -> String {
        s.to_string()
    }

    fn temp_file(content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("adscan-rewrite-test-{:?}.txt", std::time::Instant::now()));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn removes_only_successfully_processed_in_scope_lines() {
        let path = temp_file("https://a.com\nhttps://b.com\nhttps://c.com\nhttps://d.com\n");
        let in_scope: HashSet<String> =
            ["https://a.com", "https://b.com", "https://c.com"].iter().map(|s| s.to_string()).collect();
        let success: HashSet<String> = ["https://a.com", "https://c.com"].iter().map(|s| s.to_string()).collect();

        rewrite_txt_source(&path, &in_scope, &success, identity).await.unwrap();

        let result = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(result, "https://b.com\nhttps://d.com\n");
        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn preserves_out_of_scope_line_even_if_marked_successful_elsewhere() {
        let path = temp_file("https://a.com\nhttps://out-of-scope.com\n");
        let in_scope: HashSet<String> = ["https://a.com"].iter().map(|s| s.to_string()).collect();
        let success: HashSet<String> =
            ["https://a.com", "https://out-of-scope.com"].iter().map(|s| s.to_string()).collect();

        rewrite_txt_source(&path, &in_scope, &success, identity).await.unwrap();

        let result = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(result, "https://out-of-scope.com\n");
        let _ = tokio::fs::remove_file(&path).await;
    }
}
