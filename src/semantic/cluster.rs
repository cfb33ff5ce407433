//! Hierarchical clustering of semantic neighborhoods.
//!
//! Neighborhoods are disjoint file sets, so member overlap is useless as
//! a similarity signal. Distance is instead 1 minus the Jaccard index of
//! the directory sets their files live in: neighborhoods rooted in the
//! same part of the tree cluster together. Average-linkage agglomerative
//! merging runs until no pair is closer than `MERGE_THRESHOLD`.

use std::collections::HashSet;

use super::{
    common_dir, ClusterInfo, ClusterQualityMetrics, ClusteredNeighborhood, IntraClusterMetrics,
    SemanticNeighborhood,
};

/// Pairs at or beyond this distance are never merged.
const MERGE_THRESHOLD: f64 = 0.6;

/// Clusters neighborhoods and scores each cluster.
pub fn cluster_neighborhoods(
    neighborhoods: &[SemanticNeighborhood],
) -> Vec<ClusteredNeighborhood> {
    if neighborhoods.is_empty() {
        return Vec::new();
    }

    let n = neighborhoods.len();
    let distances = distance_matrix(neighborhoods);

    // Each neighborhood starts in its own cluster.
    let mut clusters: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();

    loop {
        let mut best: Option<(usize, usize, f64)> = None;
        for i in 0..clusters.len() {
            for j in (i + 1)..clusters.len() {
                let d = average_linkage(&clusters[i], &clusters[j], &distances, n);
                if d < MERGE_THRESHOLD && best.map_or(true, |(_, _, bd)| d < bd) {
                    best = Some((i, j, d));
                }
            }
        }
        match best {
            Some((i, j, _)) => {
                let merged = clusters.swap_remove(j);
                clusters[i].extend(merged);
                clusters[i].sort_unstable();
            }
            None => break,
        }
    }

    // Silhouette per neighborhood against the final clustering.
    let silhouettes = silhouette_scores(&clusters, &distances, n);

    let mut out = Vec::with_capacity(clusters.len());
    for (idx, members) in clusters.iter().enumerate() {
        let hood_refs: Vec<&SemanticNeighborhood> =
            members.iter().map(|&i| &neighborhoods[i]).collect();

        let silhouette_score = members
            .iter()
            .map(|&i| silhouettes[i])
            .sum::<f64>()
            / members.len() as f64;
        let davies_bouldin_index =
            davies_bouldin_term(idx, &clusters, &distances, n);

        let cohesion = 1.0 - intra_distance(members, &distances, n);
        let coupling = nearest_cluster_distance(idx, &clusters, &distances, n)
            .map(|d| 1.0 - d)
            .unwrap_or(0.0);

        out.push(ClusteredNeighborhood {
            cluster: describe_cluster(&hood_refs, cohesion, coupling),
            neighborhoods: hood_refs.iter().map(|&h| h.clone()).collect(),
            quality_metrics: ClusterQualityMetrics {
                silhouette_score,
                davies_bouldin_index,
            },
        });
    }

    out.sort_by(|a, b| {
        b.cluster
            .strength
            .partial_cmp(&a.cluster.strength)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.cluster.name.cmp(&b.cluster.name))
    });
    out
}

fn directory_set(neighborhood: &SemanticNeighborhood) -> HashSet<String> {
    neighborhood
        .files
        .iter()
        .map(|f| match f.rsplit_once('/') {
            Some((dir, _)) => dir.to_string(),
            None => String::new(),
        })
        .collect()
}

/// 1 - Jaccard over directory sets; identical layouts are distance 0.
fn neighborhood_distance(a: &SemanticNeighborhood, b: &SemanticNeighborhood) -> f64 {
    let dirs_a = directory_set(a);
    let dirs_b = directory_set(b);
    let intersection = dirs_a.intersection(&dirs_b).count();
    let union = dirs_a.union(&dirs_b).count();
    if union == 0 {
        return 1.0;
    }
    1.0 - intersection as f64 / union as f64
}

fn distance_matrix(neighborhoods: &[SemanticNeighborhood]) -> Vec<f64> {
    let n = neighborhoods.len();
    let mut m = vec![0.0; n * n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = neighborhood_distance(&neighborhoods[i], &neighborhoods[j]);
            m[i * n + j] = d;
            m[j * n + i] = d;
        }
    }
    m
}

fn average_linkage(a: &[usize], b: &[usize], distances: &[f64], n: usize) -> f64 {
    let mut sum = 0.0;
    for &i in a {
        for &j in b {
            sum += distances[i * n + j];
        }
    }
    sum / (a.len() * b.len()) as f64
}

/// Average pairwise distance inside one cluster; 0 for singletons.
fn intra_distance(members: &[usize], distances: &[f64], n: usize) -> f64 {
    if members.len() < 2 {
        return 0.0;
    }
    let mut sum = 0.0;
    let mut count = 0usize;
    for (a, &i) in members.iter().enumerate() {
        for &j in members.iter().skip(a + 1) {
            sum += distances[i * n + j];
            count += 1;
        }
    }
    sum / count as f64
}

fn nearest_cluster_distance(
    idx: usize,
    clusters: &[Vec<usize>],
    distances: &[f64],
    n: usize,
) -> Option<f64> {
    clusters
        .iter()
        .enumerate()
        .filter(|(other, _)| *other != idx)
        .map(|(_, other)| average_linkage(&clusters[idx], other, distances, n))
        .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
}

/// Standard silhouette per element: `(b - a) / max(a, b)` where `a` is
/// mean intra-cluster distance and `b` the mean distance to the nearest
/// other cluster. Zero when either term is undefined.
fn silhouette_scores(clusters: &[Vec<usize>], distances: &[f64], n: usize) -> Vec<f64> {
    let mut scores = vec![0.0; n];
    if clusters.len() < 2 {
        return scores;
    }

    for (idx, members) in clusters.iter().enumerate() {
        for &i in members {
            let a = if members.len() < 2 {
                0.0
            } else {
                members
                    .iter()
                    .filter(|&&j| j != i)
                    .map(|&j| distances[i * n + j])
                    .sum::<f64>()
                    / (members.len() - 1) as f64
            };
            let b = clusters
                .iter()
                .enumerate()
                .filter(|(other, _)| *other != idx)
                .map(|(_, other)| {
                    other.iter().map(|&j| distances[i * n + j]).sum::<f64>()
                        / other.len() as f64
                })
                .fold(f64::INFINITY, f64::min);
            let denom = a.max(b);
            scores[i] = if denom > 0.0 { (b - a) / denom } else { 0.0 };
        }
    }
    scores
}

/// Per-cluster Davies-Bouldin term: the worst-case spread-to-separation
/// ratio against every other cluster. Lower is better; 0 for a lone
/// cluster.
fn davies_bouldin_term(idx: usize, clusters: &[Vec<usize>], distances: &[f64], n: usize) -> f64 {
    let own_spread = intra_distance(&clusters[idx], distances, n);
    clusters
        .iter()
        .enumerate()
        .filter(|(other, members)| *other != idx && !members.is_empty())
        .map(|(_, other)| {
            let separation = average_linkage(&clusters[idx], other, distances, n);
            let spread = own_spread + intra_distance(other, distances, n);
            if separation > 0.0 {
                spread / separation
            } else {
                0.0
            }
        })
        .fold(0.0, f64::max)
}

fn describe_cluster(
    neighborhoods: &[&SemanticNeighborhood],
    cohesion: f64,
    coupling: f64,
) -> ClusterInfo {
    let all_files: Vec<String> = neighborhoods
        .iter()
        .flat_map(|n| n.files.iter().cloned())
        .collect();
    let size = all_files.len();
    let strength = neighborhoods
        .iter()
        .map(|n| n.correlation_strength)
        .sum::<f64>()
        / neighborhoods.len() as f64;

    let root = common_dir(&all_files);
    let name = if root.is_empty() {
        neighborhoods
            .first()
            .map(|n| n.name.clone())
            .unwrap_or_else(|| "cluster".to_string())
    } else {
        root
    };

    let test_share = all_files
        .iter()
        .filter(|f| f.contains("test") || f.contains("spec"))
        .count() as f64
        / size.max(1) as f64;

    let mut optimal_tasks = Vec::new();
    if strength >= 0.7 {
        optimal_tasks.push("coordinated refactoring".to_string());
    }
    if test_share < 0.2 {
        optimal_tasks.push("test coverage improvement".to_string());
    }
    if neighborhoods.len() > 1 {
        optimal_tasks.push("module boundary review".to_string());
    }
    if optimal_tasks.is_empty() {
        optimal_tasks.push("feature development".to_string());
    }

    let recommendation_reason = format!(
        "{} neighborhood(s), {} file(s), average co-change strength {:.2}",
        neighborhoods.len(),
        size,
        strength
    );

    let description = format!("Files under '{}' that change together", name);

    ClusterInfo {
        name,
        description,
        size,
        strength,
        intra_metrics: IntraClusterMetrics { cohesion, coupling },
        optimal_tasks,
        recommendation_reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hood(name: &str, files: &[&str], strength: f64) -> SemanticNeighborhood {
        SemanticNeighborhood {
            name: name.to_string(),
            files: files.iter().map(|f| f.to_string()).collect(),
            correlation_strength: strength,
            change_frequency: 3,
            last_changed: 1_700_000_000,
        }
    }

    #[test]
    fn test_empty_input_yields_no_clusters() {
        assert!(cluster_neighborhoods(&[]).is_empty());
    }

    #[test]
    fn test_same_directory_neighborhoods_merge() {
        let hoods = vec![
            hood("auth-a", &["src/auth/login.ts", "src/auth/token.ts"], 0.8),
            hood("auth-b", &["src/auth/session.ts", "src/auth/logout.ts"], 0.7),
            hood("docs", &["docs/guide.md", "docs/api.md"], 0.5),
        ];
        let clusters = cluster_neighborhoods(&hoods);
        assert_eq!(clusters.len(), 2);
        let auth = clusters
            .iter()
            .find(|c| c.cluster.name == "src/auth")
            .unwrap();
        assert_eq!(auth.neighborhoods.len(), 2);
        assert_eq!(auth.cluster.size, 4);
    }

    #[test]
    fn test_well_separated_clusters_score_high() {
        let hoods = vec![
            hood("a1", &["src/auth/a.ts"], 0.8),
            hood("a2", &["src/auth/b.ts"], 0.8),
            hood("d1", &["docs/x.md"], 0.5),
            hood("d2", &["docs/y.md"], 0.5),
        ];
        let clusters = cluster_neighborhoods(&hoods);
        assert_eq!(clusters.len(), 2);
        for c in &clusters {
            // Identical directory sets: intra distance 0, inter distance 1.
            assert!(c.quality_metrics.silhouette_score > 0.9);
            assert!(c.quality_metrics.davies_bouldin_index < 0.1);
        }
    }

    #[test]
    fn test_singleton_cluster_metrics() {
        let hoods = vec![hood("only", &["src/a.ts", "src/b.ts"], 0.6)];
        let clusters = cluster_neighborhoods(&hoods);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].quality_metrics.silhouette_score, 0.0);
        assert_eq!(clusters[0].quality_metrics.davies_bouldin_index, 0.0);
        assert_eq!(clusters[0].cluster.intra_metrics.cohesion, 1.0);
    }
}
