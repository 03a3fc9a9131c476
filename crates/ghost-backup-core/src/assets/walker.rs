//! Deep string walker over a parsed JSON export.

use serde_json::Value;

/// Lazily yields every string scalar reachable from `root`, in document order.
///
/// Object values are visited in the map's enumeration order (file order, since
/// `serde_json` is built with `preserve_order`), array elements by index. Keys,
/// numbers, booleans and nulls are never yielded. Each call starts a fresh walk.
pub fn walk_strings(root: &Value) -> Strings<'_> {
    Strings { stack: vec![root] }
}

/// Iterator returned by [`walk_strings`].
#[derive(Debug, Clone)]
pub struct Strings<'a> {
    stack: Vec<&'a Value>,
}

impl<'a> Iterator for Strings<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        while let Some(v) = self.stack.pop() {
            match v {
                Value::String(s) => return Some(s.as_str()),
                // Pushed in reverse so the first child is popped first.
                Value::Array(items) => self.stack.extend(items.iter().rev()),
                Value::Object(map) => self.stack.extend(map.values().rev()),
                Value::Null | Value::Bool(_) | Value::Number(_) => {}
            }
        }
        None
    }
}
