use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::config::RankingConfig;
use crate::ir::{Edge, Graph};

/// Node id to level, in graph node order.
pub type LevelMap = IndexMap<String, i32>;

/// Level to the node ids placed on it.
pub type LevelGroups = BTreeMap<i32, Vec<String>>;

#[derive(Debug, Clone, Default)]
pub struct LevelAssignment {
    pub levels: LevelMap,
    /// Nodes found on some directed cycle, in graph node order.
    pub cycle_nodes: Vec<String>,
}

impl LevelAssignment {
    pub fn is_cycle_node(&self, id: &str) -> bool {
        self.cycle_nodes.iter().any(|node| node == id)
    }
}

/// Dense indices for node ids. The first occurrence of an id wins.
struct NodeIndex<'a> {
    ids: Vec<&'a str>,
    lookup: HashMap<&'a str, usize>,
}

impl<'a> NodeIndex<'a> {
    fn build(graph: &'a Graph) -> Self {
        let mut ids = Vec::with_capacity(graph.nodes.len());
        let mut lookup = HashMap::with_capacity(graph.nodes.len());
        for node in &graph.nodes {
            if lookup.contains_key(node.id.as_str()) {
                continue;
            }
            lookup.insert(node.id.as_str(), ids.len());
            ids.push(node.id.as_str());
        }
        Self { ids, lookup }
    }

    fn len(&self) -> usize {
        self.ids.len()
    }
}

pub fn assign_levels(graph: &Graph, config: &RankingConfig) -> LevelAssignment {
    if graph.nodes.is_empty() {
        return LevelAssignment::default();
    }

    let index = NodeIndex::build(graph);
    let dependencies = build_dependencies(&index, &graph.edges);
    let in_cycle = find_cycle_nodes(&dependencies);
    let mut levels = wave_levels(&dependencies);
    let passes = refine_levels(&mut levels, &dependencies, &in_cycle, config);
    let levels = compress_levels(&levels);

    let cycle_nodes: Vec<String> = index
        .ids
        .iter()
        .zip(&in_cycle)
        .filter(|(_, cyclic)| **cyclic)
        .map(|(id, _)| id.to_string())
        .collect();

    debug!(
        nodes = index.len(),
        edges = graph.edges.len(),
        cycle_nodes = cycle_nodes.len(),
        passes,
        max_level = levels.iter().copied().max().unwrap_or(0),
        "assigned levels"
    );

    LevelAssignment {
        levels: index
            .ids
            .iter()
            .zip(levels)
            .map(|(id, level)| (id.to_string(), level))
            .collect(),
        cycle_nodes,
    }
}

/// Unique one-step targets per node. Self-edges, repeated pairs and edges
/// touching unknown ids are left out.
fn build_dependencies(index: &NodeIndex<'_>, edges: &[Edge]) -> Vec<Vec<usize>> {
    let mut dependencies: Vec<Vec<usize>> = vec![Vec::new(); index.len()];
    for edge in edges {
        if edge.is_self_loop() {
            continue;
        }
        let (Some(&from), Some(&to)) = (
            index.lookup.get(edge.source.as_str()),
            index.lookup.get(edge.target.as_str()),
        ) else {
            continue;
        };
        if !dependencies[from].contains(&to) {
            dependencies[from].push(to);
        }
    }
    dependencies
}

/// Marks both ends of every edge that closes onto a node still on the
/// depth-first stack.
fn find_cycle_nodes(dependencies: &[Vec<usize>]) -> Vec<bool> {
    let count = dependencies.len();
    let mut visited = vec![false; count];
    let mut on_stack = vec![false; count];
    let mut in_cycle = vec![false; count];
    // (node, index of the next dependency to visit)
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..count {
        if visited[root] {
            continue;
        }
        visited[root] = true;
        on_stack[root] = true;
        stack.push((root, 0));

        while let Some(&(node, cursor)) = stack.last() {
            let Some(&next) = dependencies[node].get(cursor) else {
                on_stack[node] = false;
                stack.pop();
                continue;
            };
            let top = stack.len() - 1;
            stack[top].1 += 1;

            if on_stack[next] {
                in_cycle[node] = true;
                in_cycle[next] = true;
            } else if !visited[next] {
                visited[next] = true;
                on_stack[next] = true;
                stack.push((next, 0));
            }
        }
    }

    in_cycle
}

/// First-pass leveling. Each wave peels the nodes whose predecessors are all
/// leveled; nodes held back by a cycle are placed one below their
/// shallowest leveled predecessor afterwards.
fn wave_levels(dependencies: &[Vec<usize>]) -> Vec<i32> {
    let count = dependencies.len();
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); count];
    for (node, targets) in dependencies.iter().enumerate() {
        for &target in targets {
            predecessors[target].push(node);
        }
    }

    let mut waiting: Vec<usize> = predecessors.iter().map(Vec::len).collect();
    let mut levels: Vec<Option<i32>> = vec![None; count];
    let mut frontier: Vec<usize> = (0..count).filter(|&node| waiting[node] == 0).collect();
    let mut wave = 0;

    while !frontier.is_empty() {
        let mut next = Vec::new();
        for &node in &frontier {
            levels[node] = Some(wave);
        }
        for &node in &frontier {
            for &target in &dependencies[node] {
                waiting[target] -= 1;
                if waiting[target] == 0 {
                    next.push(target);
                }
            }
        }
        next.sort_unstable();
        frontier = next;
        wave += 1;
    }

    for node in 0..count {
        if levels[node].is_some() {
            continue;
        }
        let shallowest = predecessors[node]
            .iter()
            .filter_map(|&pred| levels[pred])
            .min();
        levels[node] = Some(shallowest.map_or(wave, |level| level + 1));
    }

    levels.into_iter().map(|level| level.unwrap_or(wave)).collect()
}

/// Pushes targets below their sources. Edges between two cycle members are
/// never pushed forward; when other raises stretch such an edge past the
/// gap cap, its source is pulled down to close the gap instead. If the pass
/// limit is hit first, a final cap-only sweep restores the cycle bound.
fn refine_levels(
    levels: &mut [i32],
    dependencies: &[Vec<usize>],
    in_cycle: &[bool],
    config: &RankingConfig,
) -> usize {
    let cap = config.cycle_gap_cap.max(1);
    let mut passes = 0;

    for pass in 0..config.refine_iterations {
        passes = pass + 1;
        let mut raised = 0usize;
        for (node, targets) in dependencies.iter().enumerate() {
            for &dep in targets {
                if in_cycle[node] && in_cycle[dep] {
                    if levels[dep] - levels[node] > cap {
                        levels[node] = levels[dep] - cap;
                        raised += 1;
                    }
                } else if levels[dep] <= levels[node] {
                    levels[dep] = levels[node] + 1;
                    raised += 1;
                }
            }
        }
        trace!(pass, raised, "level refinement pass");
        if raised == 0 {
            return passes;
        }
    }

    let pulled = enforce_cycle_cap(levels, dependencies, in_cycle, cap);
    if pulled > 0 {
        trace!(pulled, "pulled cycle sources after last pass");
    }
    passes
}

/// Pulls sources of over-stretched cycle edges down until every edge between
/// two cycle members spans at most `cap` levels. Levels only rise and never
/// pass the current maximum, so this settles.
fn enforce_cycle_cap(
    levels: &mut [i32],
    dependencies: &[Vec<usize>],
    in_cycle: &[bool],
    cap: i32,
) -> usize {
    let mut pulled = 0;
    loop {
        let mut changed = false;
        for (node, targets) in dependencies.iter().enumerate() {
            if !in_cycle[node] {
                continue;
            }
            for &dep in targets {
                if in_cycle[dep] && levels[dep] - levels[node] > cap {
                    levels[node] = levels[dep] - cap;
                    pulled += 1;
                    changed = true;
                }
            }
        }
        if !changed {
            return pulled;
        }
    }
}

fn compress_levels(levels: &[i32]) -> Vec<i32> {
    let mut used = levels.to_vec();
    used.sort_unstable();
    used.dedup();
    levels
        .iter()
        .map(|level| match used.binary_search(level) {
            Ok(idx) | Err(idx) => idx as i32,
        })
        .collect()
}

/// Shifts every level so the smallest becomes zero.
pub fn normalize_levels(levels: &LevelMap) -> LevelMap {
    let Some(min) = levels.values().copied().min() else {
        return LevelMap::new();
    };
    if min == 0 {
        return levels.clone();
    }
    levels
        .iter()
        .map(|(id, level)| (id.clone(), level - min))
        .collect()
}

pub fn group_by_level(levels: &LevelMap) -> LevelGroups {
    let mut groups = LevelGroups::new();
    for (id, level) in levels {
        groups.entry(*level).or_default().push(id.clone());
    }
    groups
}

/// Orders one level by the mean index of its neighbours on the adjacent
/// levels (sources above, targets below). Nodes without such neighbours
/// keep their current index as score; ties keep their relative order.
pub fn order_level(
    level: i32,
    groups: &LevelGroups,
    edges: &[Edge],
    levels: &LevelMap,
) -> Vec<String> {
    let Some(bucket) = groups.get(&level) else {
        return Vec::new();
    };
    if bucket.len() <= 1 {
        return bucket.clone();
    }

    let index_of = |lvl: i32| -> HashMap<&str, usize> {
        groups
            .get(&lvl)
            .map(|ids| {
                ids.iter()
                    .enumerate()
                    .map(|(idx, id)| (id.as_str(), idx))
                    .collect()
            })
            .unwrap_or_default()
    };
    let current = index_of(level);
    let above = index_of(level - 1);
    let below = index_of(level + 1);

    let mut totals: HashMap<&str, (f32, usize)> = HashMap::new();
    let mut add = |id: &str, pos: usize| {
        if let Some((&key, _)) = current.get_key_value(id) {
            let entry = totals.entry(key).or_insert((0.0, 0));
            entry.0 += pos as f32;
            entry.1 += 1;
        }
    };

    for edge in edges {
        if edge.is_self_loop() {
            continue;
        }
        if levels.get(&edge.source) == Some(&(level - 1)) {
            if let Some(&pos) = above.get(edge.source.as_str()) {
                add(edge.target.as_str(), pos);
            }
        }
        if levels.get(&edge.target) == Some(&(level + 1)) {
            if let Some(&pos) = below.get(edge.target.as_str()) {
                add(edge.source.as_str(), pos);
            }
        }
    }

    let mut scored: Vec<(f32, &String)> = bucket
        .iter()
        .enumerate()
        .map(|(idx, id)| {
            let score = match totals.get(id.as_str()) {
                Some(&(sum, count)) if count > 0 => sum / count as f32,
                _ => idx as f32,
            };
            (score, id)
        })
        .collect();
    scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
    scored.into_iter().map(|(_, id)| id.clone()).collect()
}
