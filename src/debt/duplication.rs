use crate::core::ast::{node_end_line, node_line};
use crate::core::{LineRange, SourceUnit};
use crate::extraction::UnitStructure;
use crate::metrics::LocCounter;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};

/// Functions of one unit whose bodies normalize to the same text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub fingerprint: String,
    /// Indexes into `UnitStructure::functions`, in source order
    pub members: Vec<usize>,
    pub lines: usize,
}

/// Group functions by body fingerprint.
///
/// Bodies shorter than `min_lines` code lines are ignored; only groups with
/// two or more members are returned.
pub fn detect_duplicate_functions(
    unit: &SourceUnit,
    structure: &UnitStructure<'_>,
    min_lines: usize,
) -> Vec<DuplicateGroup> {
    let loc = LocCounter::new(unit);
    let mut by_hash: BTreeMap<String, (usize, Vec<usize>)> = BTreeMap::new();

    for (idx, function) in structure.functions.iter().enumerate() {
        let body = LineRange::new(node_line(&function.body), node_end_line(&function.body));
        let lines = loc.code_lines(unit.source(), body);
        if lines.len() < min_lines.max(1) {
            continue;
        }
        let entry = by_hash
            .entry(calculate_hash(&normalize_body(&lines)))
            .or_insert((lines.len(), Vec::new()));
        entry.1.push(idx);
    }

    let mut groups: Vec<_> = by_hash
        .into_iter()
        .filter(|(_, (_, members))| members.len() > 1)
        .map(|(fingerprint, (lines, members))| DuplicateGroup {
            fingerprint,
            members,
            lines,
        })
        .collect();
    groups.sort_by_key(|group| group.members[0]);
    groups
}

/// The other members of a duplicate group, seen from one member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateTwins {
    /// Qualified names, in source order
    pub names: Vec<String>,
    /// Code lines of the shared body, the measure the group was gated on
    pub body_lines: usize,
}

/// Map each duplicated function to its twins.
pub fn twins_by_function(
    groups: &[DuplicateGroup],
    structure: &UnitStructure<'_>,
) -> HashMap<usize, DuplicateTwins> {
    let mut twins = HashMap::new();
    for group in groups {
        for &member in &group.members {
            let names = group
                .members
                .iter()
                .filter(|&&other| other != member)
                .map(|&other| structure.functions[other].qualified_name.clone())
                .collect();
            twins.insert(
                member,
                DuplicateTwins {
                    names,
                    body_lines: group.lines,
                },
            );
        }
    }
    twins
}

fn normalize_body(lines: &[&str]) -> String {
    lines
        .iter()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

fn calculate_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
