//! Code-frame rendering for parse diagnostics.

/// Replaces leading tabs with two spaces each so caret columns line up.
fn tabs_to_spaces(line: &str) -> String {
    let tabs = line.chars().take_while(|&c| c == '\t').count();
    let mut out = String::with_capacity(line.len() + tabs);
    for _ in 0..tabs {
        out.push_str("  ");
    }
    out.push_str(&line[tabs..]);
    out
}

/// Renders a snippet of `source` around the error position with a gutter of
/// line numbers and a caret under the error column.
///
/// `line` is 0-indexed, `column` is a byte column within that line. Two
/// lines of context are shown on either side.
pub fn code_frame(source: &str, line: u32, column: u32) -> String {
    let lines: Vec<&str> = source.split('\n').collect();
    let line = line as usize;
    let frame_start = line.saturating_sub(2);
    let frame_end = std::cmp::min(line + 3, lines.len());
    let digits = (frame_end + 1).to_string().len();

    let mut out = Vec::with_capacity(frame_end - frame_start);
    for (i, &text) in lines[frame_start..frame_end].iter().enumerate() {
        let line_no = frame_start + i + 1;
        let rendered = tabs_to_spaces(text);
        if frame_start + i == line {
            let prefix = text
                .get(..column as usize)
                .map(tabs_to_spaces)
                .unwrap_or_default();
            out.push(format!(
                "{line_no:>digits$}: {rendered}\n{caret:>width$}",
                caret = '^',
                width = digits + 2 + prefix.len() + 1,
            ));
        } else {
            out.push(format!("{line_no:>digits$}: {rendered}"));
        }
    }
    out.join("\n")
}
