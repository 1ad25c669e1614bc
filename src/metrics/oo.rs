//! Object-oriented design proxies over a single unit.
//!
//! Only what is visible inside the unit is used: imported modules stand in
//! for coupling, `self` attribute sharing for cohesion, and in-unit base
//! classes for inheritance depth.

use crate::extraction::{ClassInfo, UnitStructure};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Distinct imported modules.
pub fn coupling(structure: &UnitStructure<'_>) -> usize {
    structure.imported_modules().len()
}

/// Share of method pairs that use no common `self` attribute (LCOM ratio).
///
/// 0.0 for classes with fewer than two methods.
pub fn lack_of_cohesion(class: &ClassInfo) -> f64 {
    let usage = &class.method_attribute_usage;
    if usage.len() < 2 {
        return 0.0;
    }

    let mut pairs = 0usize;
    let mut disjoint = 0usize;
    for (i, left) in usage.iter().enumerate() {
        for right in &usage[i + 1..] {
            pairs += 1;
            if left.is_disjoint(right) {
                disjoint += 1;
            }
        }
    }
    disjoint as f64 / pairs as f64
}

/// Mean LCOM ratio over all classes of the unit.
pub fn mean_lack_of_cohesion(classes: &[ClassInfo]) -> f64 {
    if classes.is_empty() {
        return 0.0;
    }
    classes.iter().map(lack_of_cohesion).sum::<f64>() / classes.len() as f64
}

/// Inheritance depth of every class, keyed by name.
///
/// A class without bases (or only `object`) has depth 0, a base defined
/// outside the unit counts as one level. Cycles are cut. Each class is
/// resolved once, so shared ancestors are never re-walked.
pub fn inheritance_depths(classes: &[ClassInfo]) -> HashMap<&str, u32> {
    let by_name: HashMap<&str, &ClassInfo> =
        classes.iter().map(|c| (c.name.as_str(), c)).collect();

    let mut depths = HashMap::with_capacity(by_name.len());
    for class in classes {
        resolve_depth(class.name.as_str(), &by_name, &mut depths);
    }
    depths
}

/// Post-order walk over in-unit bases with an explicit stack.
fn resolve_depth<'a>(
    root: &'a str,
    by_name: &HashMap<&'a str, &'a ClassInfo>,
    depths: &mut HashMap<&'a str, u32>,
) {
    let mut on_path = HashSet::new();
    let mut stack = vec![(root, false)];
    while let Some((name, expanded)) = stack.pop() {
        if depths.contains_key(name) {
            continue;
        }
        let Some(class) = by_name.get(name).copied() else {
            continue;
        };
        let bases = class
            .bases
            .iter()
            .map(String::as_str)
            .filter(|base| *base != "object");

        if expanded {
            // a base still on the path closes a cycle and counts as a root
            let depth = bases
                .map(|base| {
                    if by_name.contains_key(base) {
                        1 + depths.get(base).copied().unwrap_or(0)
                    } else {
                        1
                    }
                })
                .max()
                .unwrap_or(0);
            depths.insert(name, depth);
            on_path.remove(name);
        } else if on_path.insert(name) {
            stack.push((name, true));
            stack.extend(
                bases
                    .filter(|base| by_name.contains_key(base) && !on_path.contains(base))
                    .map(|base| (base, false)),
            );
        }
    }
}

/// Distinct method-name prefixes (`get_x`, `get_y` share `get`), a proxy for
/// the number of responsibilities a class carries.
pub fn method_prefixes(class: &ClassInfo) -> BTreeSet<String> {
    class
        .methods
        .iter()
        .filter(|name| !(name.starts_with("__") && name.ends_with("__")))
        .map(|name| name.trim_start_matches('_'))
        .filter(|name| name.contains('_'))
        .filter_map(|name| name.split('_').next())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::core::parse_source;
    use crate::extraction::extract_structure;
    use indoc::indoc;

    fn class(name: &str, bases: &[&str], methods: &[&str]) -> ClassInfo {
        ClassInfo {
            name: name.to_string(),
            bases: bases.iter().map(|b| b.to_string()).collect(),
            span: crate::core::LineRange::single(1),
            methods: methods.iter().map(|m| m.to_string()).collect(),
            attributes: BTreeSet::new(),
            method_attribute_usage: Vec::new(),
        }
    }

    #[test]
    fn test_inheritance_depth_follows_in_unit_chain() {
        let classes = vec![
            class("Base", &["object"], &[]),
            class("Middle", &["Base"], &[]),
            class("Leaf", &["Middle", "Mixin"], &[]),
            class("External", &["django.Model"], &[]),
        ];
        let depths = inheritance_depths(&classes);
        assert_eq!(depths["Base"], 0);
        assert_eq!(depths["Middle"], 1);
        assert_eq!(depths["Leaf"], 2);
        assert_eq!(depths["External"], 1);
    }

    #[test]
    fn test_inheritance_cycle_terminates() {
        let classes = vec![class("A", &["B"], &[]), class("B", &["A"], &[])];
        let depths = inheritance_depths(&classes);
        assert!(depths["A"] <= 2);
    }

    #[test]
    fn test_chained_diamonds_resolve_each_class_once() {
        // Top <- (L0, R0) <- J0 <- (L1, R1) <- J1 ...; 64 levels of
        // diamonds would never finish if every path were walked.
        let mut classes = vec![class("Top", &[], &[])];
        let mut joint = "Top".to_string();
        for level in 0..64 {
            let (left, right) = (format!("L{level}"), format!("R{level}"));
            classes.push(class(&left, &[joint.as_str()], &[]));
            classes.push(class(&right, &[joint.as_str()], &[]));
            joint = format!("J{level}");
            classes.push(class(&joint, &[left.as_str(), right.as_str()], &[]));
        }
        let depths = inheritance_depths(&classes);
        assert_eq!(depths.len(), classes.len());
        assert_eq!(depths["Top"], 0);
        assert_eq!(depths["L0"], 1);
        assert_eq!(depths["J0"], 2);
        assert_eq!(depths["J63"], 128);
    }

    #[test]
    fn test_deep_chain_does_not_recurse() {
        let names: Vec<String> = (0..20_000).map(|i| format!("C{i}")).collect();
        let classes: Vec<_> = names
            .iter()
            .enumerate()
            .map(|(i, name)| match i {
                0 => class(name, &[], &[]),
                _ => class(name, &[names[i - 1].as_str()], &[]),
            })
            .rev()
            .collect();
        let depths = inheritance_depths(&classes);
        assert_eq!(depths["C19999"], 19_999);
    }

    #[test]
    fn test_lack_of_cohesion_from_source() {
        let unit = parse_source(
            indoc! {"
                class Split:
                    def a(self):
                        return self.x
                    def b(self):
                        return self.x + 1
                    def c(self):
                        return self.y
            "},
            "t.py",
            &ParserConfig::default(),
        )
        .unwrap();
        let structure = extract_structure(&unit);
        // pairs: (a,b) share x, (a,c) and (b,c) disjoint
        let lcom = lack_of_cohesion(&structure.classes[0]);
        assert!((lcom - 2.0 / 3.0).abs() < 1e-9);
        assert!((mean_lack_of_cohesion(&structure.classes) - lcom).abs() < 1e-9);
    }

    #[test]
    fn test_single_method_class_is_cohesive() {
        assert_eq!(lack_of_cohesion(&class("A", &[], &["run"])), 0.0);
        assert_eq!(mean_lack_of_cohesion(&[]), 0.0);
    }

    #[test]
    fn test_method_prefixes() {
        let c = class(
            "Service",
            &[],
            &["get_user", "get_order", "save_user", "__init__", "_load_cache", "run"],
        );
        let prefixes: Vec<_> = method_prefixes(&c).into_iter().collect();
        assert_eq!(prefixes, vec!["get", "load", "save"]);
    }
}
