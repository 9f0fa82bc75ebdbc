//! Where markers go: coordinates read back from the rendered SVG.
//!
//! The toolkit positions note heads with `<use x= y=>`, ellipses with
//! `cx`/`cy`, and staff lines and bar lines as `<path d="M x y L ...">`. A
//! marker is horizontally aligned with its element and vertically with the
//! top line of the enclosing staff.

use super::tree::{NodeId, Tree};

/// Anchor origin of an element, before any stacking offset.
pub(super) fn anchor_origin(tree: &Tree, id: NodeId) -> Option<(f64, f64)> {
    let (x, mut y) = first_position(tree, id)?;
    if let Some(staff) = tree.ancestor_with_class(id, "staff") {
        if let Some(staff_y) = staff_line_y(tree, staff) {
            y = staff_y;
        }
    }
    Some((x, y))
}

/// First coordinate pair found in a pre-order walk of the element.
pub(super) fn first_position(tree: &Tree, id: NodeId) -> Option<(f64, f64)> {
    tree.subtree(id).into_iter().find_map(|n| node_position(tree, n))
}

fn node_position(tree: &Tree, n: NodeId) -> Option<(f64, f64)> {
    let num = |key: &str| tree.attr(n, key).and_then(|v| v.trim().parse::<f64>().ok());
    if let (Some(x), Some(y)) = (num("x"), num("y")) {
        return Some((x, y));
    }
    if let (Some(x), Some(y)) = (num("cx"), num("cy")) {
        return Some((x, y));
    }
    if tree.name(n) == Some("path") {
        return tree.attr(n, "d").and_then(move_to);
    }
    None
}

/// y of the staff's top line: second space-separated token of the first
/// `<path>` child's `d`, read as a leading integer.
fn staff_line_y(tree: &Tree, staff: NodeId) -> Option<f64> {
    let path = tree.nodes[staff]
        .children
        .iter()
        .copied()
        .find(|&c| tree.name(c) == Some("path"))?;
    let d = tree.attr(path, "d")?;
    let token = d.split(' ').nth(1)?;
    leading_int(token).map(|v| v as f64)
}

/// The initial `M x y` of a path.
pub(super) fn move_to(d: &str) -> Option<(f64, f64)> {
    let rest = d.trim_start().strip_prefix(&['M', 'm'][..])?;
    let mut nums = rest
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(leading_number);
    let x = nums.next()??;
    let y = nums.next()??;
    Some((x, y))
}

fn leading_int(token: &str) -> Option<i64> {
    let token = token.trim_start();
    let (sign, digits) = match token.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, token.strip_prefix('+').unwrap_or(token)),
    };
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|v| sign * v)
}

fn leading_number(token: &str) -> Option<f64> {
    let end = token
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && (c == '-' || c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(token.len());
    token[..end].parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_to_reads_first_pair() {
        assert_eq!(move_to("M361 1420 L5479 1420"), Some((361.0, 1420.0)));
        assert_eq!(move_to("m 10,20 l 5 5"), Some((10.0, 20.0)));
        assert_eq!(move_to("L 1 2"), None);
    }

    #[test]
    fn leading_int_behaves_like_parse_int() {
        assert_eq!(leading_int("1420"), Some(1420));
        assert_eq!(leading_int("1420L"), Some(1420));
        assert_eq!(leading_int("-35.5"), Some(-35));
        assert_eq!(leading_int("L5"), None);
    }
}
