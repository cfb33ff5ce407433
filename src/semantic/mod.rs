//! Git-history semantic neighborhoods.
//!
//! Mines the git log within a configurable window, groups files that
//! change together into neighborhoods, joins them with the static import
//! graph, hierarchically clusters them, and scores cluster quality.
//! Every step may fail independently; partial results are returned with
//! `error` set and the caller never treats that as fatal.

mod cluster;
mod git;

pub use cluster::cluster_neighborhoods;
pub use git::{collect_history, CommitRecord};

use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::GraphStore;
use crate::types::EdgeKind;

/// Tunables for the semantic analysis pass.
#[derive(Debug, Clone)]
pub struct SemanticConfig {
    /// History window in days.
    pub window_days: i64,
    /// Minimum pairwise correlation for two files to share a neighborhood.
    pub min_correlation: f64,
    /// Minimum number of shared commits for a pair to count at all.
    pub min_shared_commits: usize,
    /// Upper bound on commits examined, newest first.
    pub max_commits: usize,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            window_days: 30,
            min_correlation: 0.3,
            min_shared_commits: 2,
            max_commits: 1_000,
        }
    }
}

/// A set of files that frequently change together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticNeighborhood {
    pub name: String,
    pub files: Vec<String>,
    /// Average pairwise correlation, in [0, 1].
    pub correlation_strength: f64,
    /// Number of commits in the window touching at least one member.
    pub change_frequency: usize,
    /// UNIX timestamp of the most recent change.
    pub last_changed: i64,
}

/// A neighborhood joined with the static import graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancedNeighborhood {
    #[serde(flatten)]
    pub neighborhood: SemanticNeighborhood,
    /// Members that are present in the current code graph.
    pub graph_files: Vec<String>,
    /// `imports` edges between members in the static graph.
    pub static_import_edges: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntraClusterMetrics {
    pub cohesion: f64,
    pub coupling: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterInfo {
    pub name: String,
    pub description: String,
    /// Total number of files across member neighborhoods.
    pub size: usize,
    /// Average correlation strength of member neighborhoods.
    pub strength: f64,
    pub intra_metrics: IntraClusterMetrics,
    pub optimal_tasks: Vec<String>,
    pub recommendation_reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterQualityMetrics {
    /// In [-1, 1]; higher is better.
    pub silhouette_score: f64,
    /// Lower is better.
    pub davies_bouldin_index: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteredNeighborhood {
    pub cluster: ClusterInfo,
    pub neighborhoods: Vec<SemanticNeighborhood>,
    pub quality_metrics: ClusterQualityMetrics,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualityScores {
    pub average_silhouette: f64,
    pub average_davies_bouldin: f64,
    pub rating: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub period_days: i64,
    pub total_commits: usize,
    pub total_neighborhoods: usize,
    pub total_clusters: usize,
    pub average_cluster_size: f64,
    pub analysis_duration_ms: u64,
    pub quality_scores: QualityScores,
}

/// Complete output of one semantic analysis pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SemanticResult {
    pub is_git_repository: bool,
    pub semantic_neighborhoods: Vec<SemanticNeighborhood>,
    pub enhanced_neighborhoods: Vec<EnhancedNeighborhood>,
    pub clustered_neighborhoods: Vec<ClusteredNeighborhood>,
    pub analysis_metadata: AnalysisMetadata,
    /// Message of the first failing step, if any.
    pub error: Option<String>,
}

pub struct SemanticAnalyzer {
    config: SemanticConfig,
}

impl SemanticAnalyzer {
    pub fn new(config: SemanticConfig) -> Self {
        Self { config }
    }

    /// Runs the full semantic pass. Never fails: a non-repository target
    /// yields `is_git_repository = false`, and any failing step records
    /// its message in `error` while keeping partial results.
    pub fn analyze(&self, target_dir: &Path, store: &GraphStore) -> SemanticResult {
        let start = Instant::now();
        let mut result = SemanticResult {
            analysis_metadata: AnalysisMetadata {
                period_days: self.config.window_days,
                ..Default::default()
            },
            ..Default::default()
        };

        let commits = match collect_history(target_dir, &self.config) {
            Ok(Some(commits)) => commits,
            Ok(None) => {
                debug!(path = %target_dir.display(), "not a git repository");
                result.analysis_metadata.analysis_duration_ms =
                    start.elapsed().as_millis() as u64;
                return result;
            }
            Err(e) => {
                result.error = Some(format!("git history collection failed: {e}"));
                result.analysis_metadata.analysis_duration_ms =
                    start.elapsed().as_millis() as u64;
                return result;
            }
        };

        result.is_git_repository = true;
        result.analysis_metadata.total_commits = commits.len();

        result.semantic_neighborhoods = build_neighborhoods(&commits, &self.config);
        result.analysis_metadata.total_neighborhoods = result.semantic_neighborhoods.len();

        result.enhanced_neighborhoods =
            enhance_neighborhoods(&result.semantic_neighborhoods, store, target_dir);

        result.clustered_neighborhoods = cluster_neighborhoods(&result.semantic_neighborhoods);
        result.analysis_metadata.total_clusters = result.clustered_neighborhoods.len();
        if !result.clustered_neighborhoods.is_empty() {
            let total_size: usize = result
                .clustered_neighborhoods
                .iter()
                .map(|c| c.cluster.size)
                .sum();
            result.analysis_metadata.average_cluster_size =
                total_size as f64 / result.clustered_neighborhoods.len() as f64;
        }

        result.analysis_metadata.quality_scores =
            aggregate_quality(&result.clustered_neighborhoods);
        result.analysis_metadata.analysis_duration_ms = start.elapsed().as_millis() as u64;
        result
    }
}

/// Builds co-change neighborhoods from commit records.
///
/// Pair correlation is `shared / max(changes_a, changes_b)`; files join a
/// neighborhood through pairs above the configured correlation with at
/// least `min_shared_commits` shared commits. Neighborhoods are the
/// connected components of that pair graph.
pub fn build_neighborhoods(
    commits: &[CommitRecord],
    config: &SemanticConfig,
) -> Vec<SemanticNeighborhood> {
    use std::collections::HashMap;

    let mut change_counts: HashMap<&str, usize> = HashMap::new();
    let mut pair_counts: HashMap<(&str, &str), usize> = HashMap::new();
    let mut last_changed: HashMap<&str, i64> = HashMap::new();

    for commit in commits {
        for file in &commit.files {
            *change_counts.entry(file).or_insert(0) += 1;
            let entry = last_changed.entry(file).or_insert(commit.timestamp);
            *entry = (*entry).max(commit.timestamp);
        }
        for (i, a) in commit.files.iter().enumerate() {
            for b in commit.files.iter().skip(i + 1) {
                let key = if a < b {
                    (a.as_str(), b.as_str())
                } else {
                    (b.as_str(), a.as_str())
                };
                *pair_counts.entry(key).or_insert(0) += 1;
            }
        }
    }

    // Adjacency over correlated pairs.
    let mut adjacency: HashMap<&str, Vec<(&str, f64)>> = HashMap::new();
    for (&(a, b), &shared) in &pair_counts {
        if shared < config.min_shared_commits {
            continue;
        }
        let max_changes = change_counts[a].max(change_counts[b]);
        let correlation = shared as f64 / max_changes as f64;
        if correlation < config.min_correlation {
            continue;
        }
        adjacency.entry(a).or_default().push((b, correlation));
        adjacency.entry(b).or_default().push((a, correlation));
    }

    // Connected components, deterministic order.
    let mut members: Vec<&str> = adjacency.keys().copied().collect();
    members.sort_unstable();

    let mut visited: std::collections::HashSet<&str> = std::collections::HashSet::new();
    let mut neighborhoods = Vec::new();

    for seed in members {
        if visited.contains(seed) {
            continue;
        }
        let mut component = Vec::new();
        let mut queue = vec![seed];
        let mut strengths = Vec::new();
        while let Some(file) = queue.pop() {
            if !visited.insert(file) {
                continue;
            }
            component.push(file.to_string());
            if let Some(neighbors) = adjacency.get(file) {
                for &(next, correlation) in neighbors {
                    strengths.push(correlation);
                    if !visited.contains(next) {
                        queue.push(next);
                    }
                }
            }
        }
        component.sort_unstable();

        let change_frequency = commits
            .iter()
            .filter(|c| c.files.iter().any(|f| component.contains(f)))
            .count();
        let last = component
            .iter()
            .filter_map(|f| last_changed.get(f.as_str()))
            .copied()
            .max()
            .unwrap_or_default();
        let strength = if strengths.is_empty() {
            0.0
        } else {
            (strengths.iter().sum::<f64>() / strengths.len() as f64).clamp(0.0, 1.0)
        };

        neighborhoods.push(SemanticNeighborhood {
            name: neighborhood_name(&component),
            files: component,
            correlation_strength: strength,
            change_frequency,
            last_changed: last,
        });
    }

    neighborhoods.sort_by(|a, b| {
        b.correlation_strength
            .partial_cmp(&a.correlation_strength)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    neighborhoods
}

/// Names a neighborhood after the deepest directory shared by its members.
fn neighborhood_name(files: &[String]) -> String {
    let prefix = common_dir(files);
    if prefix.is_empty() {
        files
            .first()
            .and_then(|f| f.rsplit('/').next())
            .and_then(|base| base.split('.').next())
            .unwrap_or("neighborhood")
            .to_string()
    } else {
        prefix
    }
}

pub(crate) fn common_dir(files: &[String]) -> String {
    let mut iter = files.iter();
    let Some(first) = iter.next() else {
        return String::new();
    };
    let mut prefix: Vec<&str> = match first.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => return String::new(),
    };
    for file in iter {
        let dir: Vec<&str> = match file.rsplit_once('/') {
            Some((dir, _)) => dir.split('/').collect(),
            None => Vec::new(),
        };
        let shared = prefix
            .iter()
            .zip(dir.iter())
            .take_while(|(a, b)| a == b)
            .count();
        prefix.truncate(shared);
        if prefix.is_empty() {
            break;
        }
    }
    prefix.join("/")
}

/// Joins neighborhoods with the static import graph: which members exist
/// in the current graph and how many `imports` edges connect them.
fn enhance_neighborhoods(
    neighborhoods: &[SemanticNeighborhood],
    store: &GraphStore,
    target_dir: &Path,
) -> Vec<EnhancedNeighborhood> {
    let base = target_dir.display().to_string().replace('\\', "/");

    neighborhoods
        .iter()
        .map(|n| {
            let graph_files: Vec<String> = n
                .files
                .iter()
                .filter_map(|f| {
                    let absolute = format!("{}/{}", base, f);
                    if store.file(&absolute).is_some() {
                        Some(absolute)
                    } else {
                        store
                            .files()
                            .find(|info| info.path.ends_with(&format!("/{}", f)))
                            .map(|info| info.path.clone())
                    }
                })
                .collect();

            let static_import_edges = store
                .edges()
                .filter(|e| e.kind == EdgeKind::Imports)
                .filter(|e| {
                    graph_files
                        .iter()
                        .any(|f| e.from == crate::types::file_node_id(f))
                        && graph_files
                            .iter()
                            .any(|f| e.to == crate::types::file_node_id(f))
                })
                .count();

            EnhancedNeighborhood {
                neighborhood: n.clone(),
                graph_files,
                static_import_edges,
            }
        })
        .collect()
}

/// Aggregates quality across clusters whose silhouette is positive.
///
/// Ratings on the average silhouette: ≥ 0.7 Excellent, ≥ 0.5 Good,
/// ≥ 0.25 Fair, else Poor. No valid clusters yields "Insufficient data";
/// an empty cluster list yields "No clusters".
pub fn aggregate_quality(clusters: &[ClusteredNeighborhood]) -> QualityScores {
    if clusters.is_empty() {
        return QualityScores {
            rating: "No clusters".to_string(),
            ..Default::default()
        };
    }

    let valid: Vec<&ClusteredNeighborhood> = clusters
        .iter()
        .filter(|c| c.quality_metrics.silhouette_score > 0.0)
        .collect();
    if valid.is_empty() {
        return QualityScores {
            rating: "Insufficient data".to_string(),
            ..Default::default()
        };
    }

    let average_silhouette = valid
        .iter()
        .map(|c| c.quality_metrics.silhouette_score)
        .sum::<f64>()
        / valid.len() as f64;
    let average_davies_bouldin = valid
        .iter()
        .map(|c| c.quality_metrics.davies_bouldin_index)
        .sum::<f64>()
        / valid.len() as f64;

    let rating = if average_silhouette >= 0.7 {
        "Excellent"
    } else if average_silhouette >= 0.5 {
        "Good"
    } else if average_silhouette >= 0.25 {
        "Fair"
    } else {
        "Poor"
    };

    QualityScores {
        average_silhouette,
        average_davies_bouldin,
        rating: rating.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(files: &[&str], timestamp: i64) -> CommitRecord {
        CommitRecord {
            files: files.iter().map(|f| f.to_string()).collect(),
            timestamp,
        }
    }

    #[test]
    fn test_cochanging_files_grouped() {
        let commits = vec![
            commit(&["src/a.ts", "src/b.ts"], 100),
            commit(&["src/a.ts", "src/b.ts"], 200),
            commit(&["src/a.ts", "src/b.ts"], 300),
            commit(&["docs/readme.md"], 400),
        ];
        let hoods = build_neighborhoods(&commits, &SemanticConfig::default());
        assert_eq!(hoods.len(), 1);
        assert_eq!(hoods[0].files, vec!["src/a.ts", "src/b.ts"]);
        assert!(hoods[0].correlation_strength > 0.9);
        assert_eq!(hoods[0].change_frequency, 3);
        assert_eq!(hoods[0].last_changed, 300);
    }

    #[test]
    fn test_weak_pairs_excluded() {
        // One shared commit out of many: below both thresholds.
        let mut commits = vec![commit(&["src/a.ts", "src/b.ts"], 100)];
        for i in 0..10 {
            commits.push(commit(&["src/a.ts"], 200 + i));
        }
        let hoods = build_neighborhoods(&commits, &SemanticConfig::default());
        assert!(hoods.is_empty());
    }

    #[test]
    fn test_neighborhood_named_after_common_dir() {
        let commits = vec![
            commit(&["src/auth/login.ts", "src/auth/session.ts"], 100),
            commit(&["src/auth/login.ts", "src/auth/session.ts"], 200),
        ];
        let hoods = build_neighborhoods(&commits, &SemanticConfig::default());
        assert_eq!(hoods[0].name, "src/auth");
    }

    #[test]
    fn test_quality_rating_thresholds() {
        fn with_silhouette(s: f64) -> ClusteredNeighborhood {
            ClusteredNeighborhood {
                cluster: ClusterInfo {
                    name: "c".to_string(),
                    description: String::new(),
                    size: 2,
                    strength: 0.5,
                    intra_metrics: IntraClusterMetrics::default(),
                    optimal_tasks: Vec::new(),
                    recommendation_reason: String::new(),
                },
                neighborhoods: Vec::new(),
                quality_metrics: ClusterQualityMetrics {
                    silhouette_score: s,
                    davies_bouldin_index: 0.5,
                },
            }
        }

        assert_eq!(aggregate_quality(&[]).rating, "No clusters");
        assert_eq!(
            aggregate_quality(&[with_silhouette(-0.2)]).rating,
            "Insufficient data"
        );
        assert_eq!(aggregate_quality(&[with_silhouette(0.8)]).rating, "Excellent");
        assert_eq!(aggregate_quality(&[with_silhouette(0.6)]).rating, "Good");
        assert_eq!(aggregate_quality(&[with_silhouette(0.3)]).rating, "Fair");
        assert_eq!(aggregate_quality(&[with_silhouette(0.1)]).rating, "Poor");
    }

    #[test]
    fn test_common_dir() {
        let files = vec![
            "src/auth/login.ts".to_string(),
            "src/auth/api/session.ts".to_string(),
        ];
        assert_eq!(common_dir(&files), "src/auth");
        assert_eq!(common_dir(&["a.ts".to_string()]), "");
    }
}
