/// Split a raw roster cell into individual names.
///
/// Cells may hold one name or a list separated by newlines, commas, or
/// semicolons, in any combination. Splitting is nested in that order:
/// the whole value by newline, each piece by comma, each of those by
/// semicolon, trimming whitespace at every stage. Pieces that are empty
/// after trimming are dropped. Order follows the cell; duplicates are
/// kept.
pub fn split_names(raw: &str) -> Vec<String> {
    let mut names = Vec::new();

    for line in raw.split('\n') {
        for piece in line.split(',') {
            for name in piece.split(';') {
                let name = name.trim();
                if !name.is_empty() {
                    names.push(name.to_string());
                }
            }
        }
    }

    names
}
