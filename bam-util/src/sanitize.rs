//! Non-destructive whitespace sanitizer for tabular input.
//!
//! Rewrites header names and cell values with leading/trailing whitespace
//! trimmed, without touching quoting, delimiters, comment lines, or row
//! count. Idempotent: running it twice produces the same bytes as running
//! it once.

use std::io::Write;

/// Sanitize a CSV document held entirely in memory, returning the rewritten
/// bytes. Lines beginning with `#` (metadata comments) pass through
/// unchanged.
pub fn sanitize_csv(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for (idx, line) in input.split_inclusive('\n').enumerate() {
        let _ = idx;
        if line.trim_start().starts_with('#') {
            out.push_str(line);
            continue;
        }
        let (body, terminator) = split_terminator(line);
        out.push_str(&sanitize_line(body));
        out.push_str(terminator);
    }
    out
}

/// Sanitize a CSV file in place: reads `path`, sanitizes, and writes the
/// result back only if it differs from the original (so mtimes are left
/// alone on already-clean files).
pub fn sanitize_csv_file(path: &std::path::Path) -> std::io::Result<bool> {
    let original = std::fs::read_to_string(path)?;
    let sanitized = sanitize_csv(&original);
    if sanitized == original {
        return Ok(false);
    }
    let mut file = std::fs::File::create(path)?;
    file.write_all(sanitized.as_bytes())?;
    Ok(true)
}

fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(stripped) = line.strip_suffix("\r\n") {
        (stripped, "\r\n")
    } else if let Some(stripped) = line.strip_suffix('\n') {
        (stripped, "\n")
    } else {
        (line, "")
    }
}

fn sanitize_line(line: &str) -> String {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                field.push(c);
                in_quotes = !in_quotes;
            }
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut field));
            }
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
        .into_iter()
        .map(|f| sanitize_field(&f))
        .collect::<Vec<_>>()
        .join(",")
}

fn sanitize_field(field: &str) -> String {
    let trimmed = field.trim();
    if let Some(inner) = trimmed.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        format!("\"{}\"", inner.trim())
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_header_and_cells() {
        let input = "row_id , object_type\n  r1 ,  ip4_block \n";
        let sanitized = sanitize_csv(input);
        assert_eq!(sanitized, "row_id,object_type\nr1,ip4_block\n");
    }

    #[test]
    fn passes_comment_lines_through() {
        let input = "# exported 2026-07-31  \nrow_id,object_type\nr1, ip4_block \n";
        let sanitized = sanitize_csv(input);
        assert!(sanitized.starts_with("# exported 2026-07-31  \n"));
    }

    #[test]
    fn preserves_quoted_commas() {
        let input = "row_id,tags\nr1, \"a, b\" \n";
        let sanitized = sanitize_csv(input);
        assert_eq!(sanitized, "row_id,tags\nr1,\"a, b\"\n");
    }

    #[test]
    fn is_idempotent() {
        let input = "row_id,object_type\nr1, ip4_block \n";
        let once = sanitize_csv(input);
        let twice = sanitize_csv(&once);
        assert_eq!(once, twice);
    }
}
