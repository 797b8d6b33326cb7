//! Supervision hierarchy built from each member's `supervisor` reference.

use std::collections::{HashMap, HashSet};

use crate::models::Member;

/// One member and everyone they directly supervise.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartNode<'a> {
    pub member: &'a Member,
    pub children: Vec<ChartNode<'a>>,
}

/// The supervision forest plus anyone unreachable from a root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chart<'a> {
    pub roots: Vec<ChartNode<'a>>,
    /// Members caught in a supervision cycle, sorted by last name.
    pub cycles: Vec<&'a Member>,
}

impl<'a> Chart<'a> {
    /// Depth-first rows for an indented tree view.
    pub fn rows(&self) -> Vec<(usize, &'a Member)> {
        fn walk<'a>(node: &ChartNode<'a>, depth: usize, out: &mut Vec<(usize, &'a Member)>) {
            out.push((depth, node.member));
            for child in &node.children {
                walk(child, depth + 1, out);
            }
        }

        let mut out = Vec::new();
        for root in &self.roots {
            walk(root, 0, &mut out);
        }
        out
    }
}

/// Highest rank first, then by last name.
fn chart_order(a: &Member, b: &Member) -> std::cmp::Ordering {
    b.rank
        .order()
        .cmp(&a.rank.order())
        .then_with(|| a.last_name.cmp(&b.last_name))
}

/// Build the supervision forest.
///
/// A member whose supervisor names another member on the roster hangs under
/// that member; everyone else is a root. A dangling or self reference makes
/// the member a root.
pub fn build_chart(members: &[Member]) -> Chart<'_> {
    let ids: HashSet<&str> = members.iter().map(|m| m.id.as_str()).collect();

    let mut children: HashMap<&str, Vec<&Member>> = HashMap::new();
    let mut roots: Vec<&Member> = Vec::new();
    for member in members {
        match resolved_supervisor(member, &ids) {
            Some(sup) => children.entry(sup).or_default().push(member),
            None => roots.push(member),
        }
    }

    roots.sort_by(|a, b| chart_order(a, b));
    for list in children.values_mut() {
        list.sort_by(|a, b| chart_order(a, b));
    }

    let mut placed: HashSet<&str> = HashSet::new();
    let root_nodes = roots
        .into_iter()
        .map(|m| build_node(m, &children, &mut placed))
        .collect();

    let mut cycles: Vec<&Member> = members
        .iter()
        .filter(|m| !placed.contains(m.id.as_str()))
        .collect();
    cycles.sort_by(|a, b| a.last_name.cmp(&b.last_name));

    Chart {
        roots: root_nodes,
        cycles,
    }
}

fn build_node<'a>(
    member: &'a Member,
    children: &HashMap<&str, Vec<&'a Member>>,
    placed: &mut HashSet<&'a str>,
) -> ChartNode<'a> {
    placed.insert(member.id.as_str());

    let mut kids = Vec::new();
    if let Some(list) = children.get(member.id.as_str()) {
        for &child in list {
            if !placed.contains(child.id.as_str()) {
                kids.push(build_node(child, children, placed));
            }
        }
    }

    ChartNode {
        member,
        children: kids,
    }
}

fn resolved_supervisor<'a>(member: &'a Member, ids: &HashSet<&str>) -> Option<&'a str> {
    member
        .supervisor
        .as_deref()
        .filter(|sup| *sup != member.id && ids.contains(sup))
}

/// Members who may be picked as a supervisor, sorted by last name.
pub fn supervisor_candidates<'a>(members: &'a [Member], exclude: Option<&str>) -> Vec<&'a Member> {
    let mut candidates: Vec<&Member> = members
        .iter()
        .filter(|m| m.rank.can_supervise() && Some(m.id.as_str()) != exclude)
        .collect();
    candidates.sort_by(|a, b| a.last_name.cmp(&b.last_name));
    candidates
}

/// Members listing `id` as their supervisor.
pub fn supervisees<'a>(members: &'a [Member], id: &str) -> Vec<&'a Member> {
    members
        .iter()
        .filter(|m| m.supervisor.as_deref() == Some(id))
        .collect()
}

/// Whether making `supervisor` the supervisor of `id` would close a loop.
pub fn would_create_cycle(members: &[Member], id: &str, supervisor: &str) -> bool {
    let by_id: HashMap<&str, &Member> = members.iter().map(|m| (m.id.as_str(), m)).collect();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut current = Some(supervisor);
    while let Some(cur) = current {
        if cur == id {
            return true;
        }
        if !seen.insert(cur) {
            // Existing loop above us that does not include `id`
            return false;
        }
        current = by_id.get(cur).and_then(|m| m.supervisor.as_deref());
    }
    false
}
