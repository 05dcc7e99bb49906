//! Graphviz rendering of the explored DAG.
use std::io;

use rustc_hash::FxHashMap;

use losat_formula::FormulaId;

use crate::node::{NodeEntry, NodeStatus};

fn dot_name(id: FormulaId) -> String {
    if id == FormulaId::terminal(true) {
        "T".to_owned()
    } else if id == FormulaId::terminal(false) {
        "F".to_owned()
    } else {
        id.to_string()
    }
}

/// Write the explored DAG in DOT format.
///
/// Unique nodes are labelled with their canonical body, redundant targets are drawn red, the
/// terminal sentinels as boxes. Nodes are emitted in id order so the output is deterministic.
pub fn write_dot(
    target: &mut impl io::Write,
    entries: &FxHashMap<FormulaId, NodeEntry>,
) -> io::Result<()> {
    writeln!(target, "digraph explored {{")?;
    writeln!(target, "    graph [splines=polyline];")?;

    let mut ids: Vec<FormulaId> = entries.keys().copied().collect();
    ids.sort_unstable();

    let mut has_true = false;
    let mut has_false = false;

    for id in &ids {
        let entry = &entries[id];
        let color = match entry.status {
            NodeStatus::Redundant => "red",
            _ => "black",
        };
        writeln!(
            target,
            "    \"{}\" [label=\"{}\", color={}];",
            id, entry.body, color
        )?;
        for &child in &entry.children {
            has_true |= child == FormulaId::terminal(true);
            has_false |= child == FormulaId::terminal(false);
        }
    }

    if has_true {
        writeln!(target, "    \"T\" [shape=box];")?;
    }
    if has_false {
        writeln!(target, "    \"F\" [shape=box];")?;
    }

    for id in &ids {
        for &child in &entries[id].children {
            writeln!(target, "    \"{}\" -> \"{}\";", id, dot_name(child))?;
        }
    }

    writeln!(target, "}}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_nodes_edges_and_sentinels() {
        let id = FormulaId::of_bytes(b"1");
        let mut entries = FxHashMap::default();
        entries.insert(
            id,
            NodeEntry {
                body: "1".to_owned(),
                children: vec![FormulaId::terminal(true), FormulaId::terminal(false)],
                ..NodeEntry::default()
            },
        );

        let mut output = vec![];
        write_dot(&mut output, &entries).unwrap();
        let text = String::from_utf8(output).unwrap();

        assert!(text.starts_with("digraph explored {"));
        assert!(text.contains(&format!("\"{}\" [label=\"1\", color=black];", id)));
        assert!(text.contains("\"T\" [shape=box];"));
        assert!(text.contains(&format!("\"{}\" -> \"T\";", id)));
        assert!(text.trim_end().ends_with('}'));
    }
}
