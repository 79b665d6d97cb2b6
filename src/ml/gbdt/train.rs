use rand::rngs::StdRng;
use rand::{Rng, SeedableRng, seq::SliceRandom};
use rayon::prelude::*;

use super::model::{GbdtModel, MODEL_VERSION, Tree, TreeNode, sigmoid};

/// Training hyperparameters for logistic tree boosting.
///
/// Defaults are the fixed values of the production training run; the CLI
/// does not expose any of them.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    /// Number of boosting rounds.
    pub rounds: usize,
    /// Shrinkage applied to each tree's leaf weights.
    pub learning_rate: f32,
    /// Minimum loss reduction required to keep a split.
    pub gamma: f64,
    /// Maximum tree depth.
    pub max_depth: usize,
    /// Minimum hessian sum required in each child.
    pub min_child_weight: f64,
    /// Fraction of rows sampled per round.
    pub subsample: f32,
    /// Fraction of features sampled per tree.
    pub colsample_bytree: f32,
    /// L2 regularization on leaf weights.
    pub reg_lambda: f64,
    /// L1 regularization on leaf weights.
    pub reg_alpha: f64,
    /// Gradient/hessian multiplier for positive-class rows.
    pub scale_pos_weight: f32,
    /// Initial probability estimate before any tree.
    pub base_score: f32,
    /// Number of histogram bins used for split search.
    pub bins: usize,
    /// Worker threads for the per-feature split search.
    pub threads: usize,
    /// Seed for row/column subsampling.
    pub seed: u64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            rounds: 100,
            learning_rate: 0.3,
            gamma: 0.0,
            max_depth: 6,
            min_child_weight: 1.0,
            subsample: 1.0,
            colsample_bytree: 1.0,
            reg_lambda: 1.0,
            reg_alpha: 0.0,
            scale_pos_weight: 1.0,
            base_score: 0.5,
            bins: 256,
            threads: 6,
            seed: 27,
        }
    }
}

/// In-memory dataset used for training.
#[derive(Debug, Clone)]
pub struct TrainDataset {
    /// Number of `f32` values in each feature vector.
    pub feature_len: usize,
    /// Feature matrix, row-major.
    pub x: Vec<Vec<f32>>,
    /// Binary labels (0.0 or 1.0) aligned with `x`.
    pub y: Vec<f32>,
}

/// Train a binary gradient-boosted tree model.
pub fn train_gbdt(dataset: &TrainDataset, options: &TrainOptions) -> Result<GbdtModel, String> {
    if dataset.x.len() != dataset.y.len() {
        return Err("Mismatched X/Y lengths".to_string());
    }
    if dataset.x.is_empty() {
        return Err("Empty dataset".to_string());
    }
    if dataset.feature_len == 0 {
        return Err("Dataset has no features".to_string());
    }
    for row in &dataset.x {
        if row.len() != dataset.feature_len {
            return Err(format!(
                "Inconsistent feature row length {} (expected {})",
                row.len(),
                dataset.feature_len
            ));
        }
    }
    if dataset.y.iter().any(|&label| label != 0.0 && label != 1.0) {
        return Err("Labels must be 0 or 1".to_string());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.threads.max(1))
        .build()
        .map_err(|err| err.to_string())?;
    pool.install(|| boost(dataset, options))
}

fn boost(dataset: &TrainDataset, options: &TrainOptions) -> Result<GbdtModel, String> {
    let n = dataset.x.len();
    let d = dataset.feature_len;
    let bins = options.bins.clamp(2, 256);
    let (mins, maxs) = compute_feature_min_max(&dataset.x, d);
    let binned = bin_features(&dataset.x, &mins, &maxs, bins);

    let base = options.base_score.clamp(1e-6, 1.0 - 1e-6);
    let base_raw = (base / (1.0 - base)).ln();
    let mut raw = vec![base_raw; n];
    let mut grad = vec![0.0f32; n];
    let mut hess = vec![0.0f32; n];
    let mut rng = StdRng::seed_from_u64(options.seed);

    let mut trees = Vec::with_capacity(options.rounds);
    for _round in 0..options.rounds {
        for i in 0..n {
            let p = sigmoid(raw[i]);
            let weight = if dataset.y[i] > 0.5 {
                options.scale_pos_weight
            } else {
                1.0
            };
            grad[i] = (p - dataset.y[i]) * weight;
            hess[i] = (p * (1.0 - p)).max(1e-16) * weight;
        }

        let rows = sample_rows(n, options.subsample, &mut rng);
        if rows.is_empty() {
            continue;
        }
        let features = sample_features(d, options.colsample_bytree, &mut rng);

        let grower = TreeGrower {
            x: &dataset.x,
            binned: &binned,
            mins: &mins,
            maxs: &maxs,
            bins,
            grad: &grad,
            hess: &hess,
            features: &features,
            options,
        };
        let tree = grower.grow(rows);
        for i in 0..n {
            raw[i] += options.learning_rate * tree.predict(&dataset.x[i]);
        }
        trees.push(tree);
    }

    Ok(GbdtModel {
        model_version: MODEL_VERSION,
        feature_len: d,
        learning_rate: options.learning_rate,
        base_raw,
        trees,
    })
}

fn sample_rows(n: usize, subsample: f32, rng: &mut StdRng) -> Vec<u32> {
    if subsample >= 1.0 {
        return (0..n as u32).collect();
    }
    (0..n as u32)
        .filter(|_| rng.random::<f32>() < subsample)
        .collect()
}

fn sample_features(d: usize, colsample: f32, rng: &mut StdRng) -> Vec<usize> {
    if colsample >= 1.0 {
        return (0..d).collect();
    }
    let keep = (((colsample as f64) * d as f64).floor() as usize).max(1);
    let mut indices: Vec<usize> = (0..d).collect();
    indices.shuffle(rng);
    indices.truncate(keep);
    indices.sort_unstable();
    indices
}

struct TreeGrower<'a> {
    x: &'a [Vec<f32>],
    binned: &'a [Vec<u8>],
    mins: &'a [f32],
    maxs: &'a [f32],
    bins: usize,
    grad: &'a [f32],
    hess: &'a [f32],
    features: &'a [usize],
    options: &'a TrainOptions,
}

struct NodeTask {
    rows: Vec<u32>,
    depth: usize,
    slot: usize,
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    gain: f64,
    feature_index: usize,
    split_bin: usize,
}

impl TreeGrower<'_> {
    fn grow(&self, rows: Vec<u32>) -> Tree {
        let mut nodes = vec![TreeNode::Leaf { value: 0.0 }];
        let mut pending = vec![NodeTask {
            rows,
            depth: 0,
            slot: 0,
        }];
        while let Some(task) = pending.pop() {
            let (grad_sum, hess_sum) = self.node_sums(&task.rows);
            let fallback_leaf = TreeNode::Leaf {
                value: leaf_weight(grad_sum, hess_sum, self.options),
            };
            if task.depth >= self.options.max_depth || task.rows.len() < 2 {
                nodes[task.slot] = fallback_leaf;
                continue;
            }
            let Some(best) = self.best_split(&task.rows, grad_sum, hess_sum) else {
                nodes[task.slot] = fallback_leaf;
                continue;
            };
            let threshold = threshold_for_bin(
                self.mins[best.feature_index],
                self.maxs[best.feature_index],
                best.split_bin,
                self.bins,
            );
            let (left_rows, right_rows) = self.partition(&task.rows, best.feature_index, threshold);
            if left_rows.is_empty() || right_rows.is_empty() {
                // Bin edges and raw thresholds can disagree on boundary
                // rows; an empty side means the split is not realizable.
                nodes[task.slot] = fallback_leaf;
                continue;
            }
            let left_slot = nodes.len();
            nodes.push(TreeNode::Leaf { value: 0.0 });
            let right_slot = nodes.len();
            nodes.push(TreeNode::Leaf { value: 0.0 });
            nodes[task.slot] = TreeNode::Split {
                feature_index: best.feature_index as u16,
                threshold,
                left: left_slot as u32,
                right: right_slot as u32,
            };
            pending.push(NodeTask {
                rows: left_rows,
                depth: task.depth + 1,
                slot: left_slot,
            });
            pending.push(NodeTask {
                rows: right_rows,
                depth: task.depth + 1,
                slot: right_slot,
            });
        }
        Tree { nodes }
    }

    fn node_sums(&self, rows: &[u32]) -> (f64, f64) {
        let mut grad_sum = 0f64;
        let mut hess_sum = 0f64;
        for &i in rows {
            grad_sum += f64::from(self.grad[i as usize]);
            hess_sum += f64::from(self.hess[i as usize]);
        }
        (grad_sum, hess_sum)
    }

    fn best_split(&self, rows: &[u32], grad_sum: f64, hess_sum: f64) -> Option<SplitCandidate> {
        self.features
            .par_iter()
            .filter_map(|&feature_index| {
                self.best_split_for_feature(rows, feature_index, grad_sum, hess_sum)
            })
            .reduce_with(better_candidate)
    }

    fn best_split_for_feature(
        &self,
        rows: &[u32],
        feature_index: usize,
        grad_sum: f64,
        hess_sum: f64,
    ) -> Option<SplitCandidate> {
        let bins = self.bins;
        let mut counts = vec![0u32; bins];
        let mut grad_bins = vec![0f64; bins];
        let mut hess_bins = vec![0f64; bins];
        for &i in rows {
            let bin = self.binned[i as usize][feature_index] as usize;
            counts[bin] += 1;
            grad_bins[bin] += f64::from(self.grad[i as usize]);
            hess_bins[bin] += f64::from(self.hess[i as usize]);
        }

        let lambda = self.options.reg_lambda;
        let parent_score = grad_sum * grad_sum / (hess_sum + lambda);
        let mut best: Option<SplitCandidate> = None;

        let mut left_count = 0u32;
        let mut left_grad = 0f64;
        let mut left_hess = 0f64;
        for split_bin in 0..bins - 1 {
            left_count += counts[split_bin];
            left_grad += grad_bins[split_bin];
            left_hess += hess_bins[split_bin];
            let right_count = rows.len() as u32 - left_count;
            if left_count == 0 || right_count == 0 {
                continue;
            }
            let right_grad = grad_sum - left_grad;
            let right_hess = hess_sum - left_hess;
            if left_hess < self.options.min_child_weight
                || right_hess < self.options.min_child_weight
            {
                continue;
            }
            let gain = 0.5
                * (left_grad * left_grad / (left_hess + lambda)
                    + right_grad * right_grad / (right_hess + lambda)
                    - parent_score)
                - self.options.gamma;
            if gain <= 0.0 {
                continue;
            }
            let candidate = SplitCandidate {
                gain,
                feature_index,
                split_bin,
            };
            best = Some(match best {
                Some(current) => better_candidate(current, candidate),
                None => candidate,
            });
        }
        best
    }

    fn partition(&self, rows: &[u32], feature_index: usize, threshold: f32) -> (Vec<u32>, Vec<u32>) {
        let mut left = Vec::new();
        let mut right = Vec::new();
        for &i in rows {
            if self.x[i as usize][feature_index] <= threshold {
                left.push(i);
            } else {
                right.push(i);
            }
        }
        (left, right)
    }
}

/// Deterministic total order over candidates: higher gain wins, ties break
/// toward the lower feature index, then the lower bin. Keeps the parallel
/// reduction independent of thread scheduling.
fn better_candidate(a: SplitCandidate, b: SplitCandidate) -> SplitCandidate {
    if b.gain > a.gain {
        return b;
    }
    if b.gain < a.gain {
        return a;
    }
    if (b.feature_index, b.split_bin) < (a.feature_index, a.split_bin) {
        b
    } else {
        a
    }
}

fn leaf_weight(grad_sum: f64, hess_sum: f64, options: &TrainOptions) -> f32 {
    let numerator = threshold_l1(grad_sum, options.reg_alpha);
    let denominator = hess_sum + options.reg_lambda;
    if denominator <= 0.0 {
        return 0.0;
    }
    (-numerator / denominator) as f32
}

fn threshold_l1(value: f64, alpha: f64) -> f64 {
    if value > alpha {
        value - alpha
    } else if value < -alpha {
        value + alpha
    } else {
        0.0
    }
}

fn compute_feature_min_max(x: &[Vec<f32>], feature_len: usize) -> (Vec<f32>, Vec<f32>) {
    let mut mins = vec![f32::INFINITY; feature_len];
    let mut maxs = vec![f32::NEG_INFINITY; feature_len];
    for row in x {
        for (j, &value) in row.iter().take(feature_len).enumerate() {
            if value.is_finite() {
                mins[j] = mins[j].min(value);
                maxs[j] = maxs[j].max(value);
            }
        }
    }
    for j in 0..feature_len {
        if !mins[j].is_finite() || !maxs[j].is_finite() {
            mins[j] = 0.0;
            maxs[j] = 0.0;
        }
        if mins[j] == maxs[j] {
            maxs[j] = mins[j] + 1.0;
        }
    }
    (mins, maxs)
}

fn bin_features(x: &[Vec<f32>], mins: &[f32], maxs: &[f32], bins: usize) -> Vec<Vec<u8>> {
    let scale = (bins - 1) as f32;
    let mut out: Vec<Vec<u8>> = Vec::with_capacity(x.len());
    for row in x {
        let mut binned = Vec::with_capacity(mins.len());
        for (j, &min) in mins.iter().enumerate() {
            let max = maxs[j];
            let value = row.get(j).copied().unwrap_or(0.0);
            let t = if max > min {
                ((value - min) / (max - min)).clamp(0.0, 1.0)
            } else {
                0.0
            };
            binned.push((t * scale).round() as u8);
        }
        out.push(binned);
    }
    out
}

fn threshold_for_bin(min: f32, max: f32, split_bin: usize, bins: usize) -> f32 {
    // Upper edge of `split_bin` under the rounding used in `bin_features`.
    let t = (split_bin as f32 + 0.5) / (bins - 1) as f32;
    min + t.min(1.0) * (max - min)
}
