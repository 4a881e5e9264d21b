//! Normalization of raw generation responses into compilable source text.

/// Strip Markdown presentation fences from a raw model response.
///
/// Generation services routinely wrap source in ``` fences with an optional
/// language tag. Extraction drops every fence line and trims surrounding
/// whitespace. The operation is idempotent: applying it to its own output is
/// the identity.
pub fn extract_code(raw: &str) -> String {
    let kept: Vec<&str> = raw.lines().filter(|line| !is_fence_line(line)).collect();
    kept.join("\n").trim().to_string()
}

fn is_fence_line(line: &str) -> bool {
    line.trim_start().starts_with("```")
}
