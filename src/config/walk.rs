//! Depth-first traversal of the configuration tree.
//!
//! Children are processed before their parent. When a table node carries the
//! marker of one of the phase's handlers, the handler receives a snapshot of
//! the node and its result is written back into the parent slot by path. The
//! walker never re-walks a handler's output within the same pass.

use tracing::warn;

use super::handler::Handler;
use super::{ConfigError, ConfigStore, Table, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// Walks every top-level entry of the store. The root table itself is never replaced.
pub(crate) fn walk(store: &mut ConfigStore, handlers: &mut [Handler<'_>]) -> Result<(), ConfigError> {
    let keys: Vec<String> = store.table().keys().cloned().collect();
    let mut path = Vec::new();

    for key in keys {
        path.push(Segment::Key(key));
        visit(store, &mut path, handlers)?;
        path.pop();
    }

    Ok(())
}

fn visit(
    store: &mut ConfigStore,
    path: &mut Vec<Segment>,
    handlers: &mut [Handler<'_>],
) -> Result<(), ConfigError> {
    let children: Vec<Segment> = match node_at(store.table(), path) {
        Some(Value::Table(t)) => t.keys().cloned().map(Segment::Key).collect(),
        Some(Value::Array(arr)) => (0..arr.len()).map(Segment::Index).collect(),
        _ => return Ok(()),
    };

    for child in children {
        path.push(child);
        visit(store, path, handlers)?;
        path.pop();
    }

    let Some(Value::Table(node)) = node_at(store.table(), path) else {
        return Ok(());
    };
    let Some(index) = handlers.iter().position(|h| node.contains_key(h.marker())) else {
        return Ok(());
    };

    let snapshot = node.clone();
    let replacement = handlers[index].apply(snapshot, store)?;

    match node_at_mut(store.table_mut(), path) {
        Some(slot) => *slot = replacement,
        None => warn!(path = %display_path(path), "node removed while processing, result discarded"),
    }

    Ok(())
}

fn node_at<'a>(root: &'a Table, path: &[Segment]) -> Option<&'a Value> {
    let (Segment::Key(first), rest) = path.split_first()? else {
        return None;
    };
    let mut current = root.get(first)?;
    for segment in rest {
        current = match (current, segment) {
            (Value::Table(t), Segment::Key(key)) => t.get(key)?,
            (Value::Array(arr), Segment::Index(i)) => arr.get(*i)?,
            _ => return None,
        };
    }
    Some(current)
}

fn node_at_mut<'a>(root: &'a mut Table, path: &[Segment]) -> Option<&'a mut Value> {
    let (Segment::Key(first), rest) = path.split_first()? else {
        return None;
    };
    let mut current = root.get_mut(first)?;
    for segment in rest {
        current = match (current, segment) {
            (Value::Table(t), Segment::Key(key)) => t.get_mut(key)?,
            (Value::Array(arr), Segment::Index(i)) => arr.get_mut(*i)?,
            _ => return None,
        };
    }
    Some(current)
}

fn display_path(path: &[Segment]) -> String {
    let mut out = String::new();
    for segment in path {
        match segment {
            Segment::Key(key) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(key);
            }
            Segment::Index(i) => out.push_str(&format!("[{i}]")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::handler::{CopyHandler, ScriptHandler};
    use crate::config::TomlScript;

    fn store(toml_str: &str) -> ConfigStore {
        ConfigStore::from_toml_str(toml_str).unwrap()
    }

    #[test]
    fn test_node_lookup_by_path() {
        let config = store(
            r#"
            [a]
            items = [{ name = "x" }, { name = "y" }]
            "#,
        );
        let path = vec![
            Segment::Key("a".into()),
            Segment::Key("items".into()),
            Segment::Index(1),
            Segment::Key("name".into()),
        ];
        assert_eq!(node_at(config.table(), &path), Some(&Value::from("y")));
        assert_eq!(display_path(&path), "a.items[1].name");
        assert!(node_at(config.table(), &path[..1]).is_some());
        assert!(node_at(config.table(), &[Segment::Index(0)]).is_none());
    }

    #[test]
    fn test_replaces_nodes_inside_arrays() {
        let mut config = store(
            r#"
            base = { x = 1 }
            list = [{ copy-marker = "base" }, 5, [{ copy-marker = "base", y = 2 }]]
            "#,
        );
        let mut handlers = [Handler::Copy(CopyHandler)];
        walk(&mut config, &mut handlers).unwrap();

        let list = config.get("list").unwrap().as_array().unwrap();
        assert_eq!(list[0], config.get("base").unwrap().clone());
        assert_eq!(list[1], Value::Integer(5));
        let nested = list[2].as_array().unwrap()[0].as_table().unwrap();
        assert_eq!(nested["x"], Value::Integer(1));
        assert_eq!(nested["y"], Value::Integer(2));
    }

    #[test]
    fn test_root_marker_is_left_alone() {
        let mut config = store(
            r#"
            copy-marker = "a"
            [a]
            x = 1
            "#,
        );
        let mut handlers = [Handler::Copy(CopyHandler)];
        walk(&mut config, &mut handlers).unwrap();
        assert_eq!(config.get("copy-marker").unwrap().as_str(), Some("a"));
    }

    #[test]
    fn test_first_registered_marker_wins() {
        let mut config = store(
            r#"
            [source]
            x = 1
            [both]
            copy-marker = "source"
            script-marker = "ran = true"
            "#,
        );
        let engine = TomlScript;
        let mut handlers = [
            Handler::Copy(CopyHandler),
            Handler::Script(ScriptHandler::new(Some(&engine))),
        ];
        walk(&mut config, &mut handlers).unwrap();

        assert!(!config.contains_key("ran"));
        let both = config.get("both").unwrap().as_table().unwrap();
        assert_eq!(both["x"], Value::Integer(1));
        assert_eq!(both["script-marker"], Value::from("ran = true"));
    }

    #[test]
    fn test_handler_output_is_not_rewalked() {
        let mut config = store(
            r#"
            [target]
            z = 3
            [outer]
            copy-marker = "later"
            [later]
            copy-marker = "target"
            "#,
        );
        let mut handlers = [Handler::Copy(CopyHandler)];
        walk(&mut config, &mut handlers).unwrap();

        // `later` is still unresolved when `outer` copies it.
        let outer = config.get("outer").unwrap().as_table().unwrap();
        assert_eq!(outer.get("copy-marker"), Some(&Value::from("target")));
        let later = config.get("later").unwrap().as_table().unwrap();
        assert_eq!(later["z"], Value::Integer(3));
    }
}
