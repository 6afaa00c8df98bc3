use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("Cannot fit on an empty training set")]
    EmptyTrainingSet,

    #[error("Features and targets differ in length: {features} rows vs {targets} targets")]
    LengthMismatch { features: usize, targets: usize },

    #[error("Target class {class} out of range for {n_classes} classes")]
    ClassOutOfRange { class: usize, n_classes: usize },
}

/// Capacidad fit/predict de un clasificador multiclase.
/// Las filas ya vienen escaladas y las clases codificadas como 0..n_classes.
pub trait Classifier {
    fn fit(&mut self, rows: &[Vec<f32>], targets: &[usize], n_classes: usize)
        -> Result<(), FitError>;

    /// Distribución de probabilidad sobre las n_classes clases
    fn predict_proba(&self, row: &[f32]) -> Vec<f32>;
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        proba: Vec<f32>,
    },
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
    },
}

/// Árbol CART con impureza de Gini; los nodos viven en un Vec y se enlazan por índice
#[derive(Debug, Clone, Default)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_classes: usize,
}

struct SplitCandidate {
    feature: usize,
    threshold: f32,
    impurity: f32,
}

impl DecisionTree {
    /// Construye el árbol sobre `sample` (índices en `rows`, con repeticiones si es bootstrap)
    fn grow(
        rows: &[Vec<f32>],
        targets: &[usize],
        sample: Vec<usize>,
        n_classes: usize,
        max_features: usize,
        rng: &mut StdRng,
    ) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            n_classes,
        };
        tree.build_node(rows, targets, sample, max_features, rng);
        tree
    }

    fn build_node(
        &mut self,
        rows: &[Vec<f32>],
        targets: &[usize],
        sample: Vec<usize>,
        max_features: usize,
        rng: &mut StdRng,
    ) -> usize {
        let counts = class_counts(targets, &sample, self.n_classes);
        let is_pure = counts.iter().filter(|&&c| c > 0).count() <= 1;

        let split = if is_pure || sample.len() < 2 {
            None
        } else {
            best_split(rows, targets, &sample, &counts, max_features, rng)
        };

        let Some(split) = split else {
            let total = sample.len().max(1) as f32;
            let proba = counts.iter().map(|&c| c as f32 / total).collect();
            self.nodes.push(Node::Leaf { proba });
            return self.nodes.len() - 1;
        };

        let (left_sample, right_sample): (Vec<usize>, Vec<usize>) = sample
            .into_iter()
            .partition(|&i| rows[i][split.feature] <= split.threshold);

        // Reservar el nodo antes de construir los hijos
        let node_idx = self.nodes.len();
        self.nodes.push(Node::Leaf { proba: Vec::new() });

        let left = self.build_node(rows, targets, left_sample, max_features, rng);
        let right = self.build_node(rows, targets, right_sample, max_features, rng);
        self.nodes[node_idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node_idx
    }

    pub fn predict_proba(&self, row: &[f32]) -> Vec<f32> {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(Node::Leaf { proba }) => return proba.clone(),
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = row.get(*feature).copied().unwrap_or(0.0);
                    idx = if value <= *threshold { *left } else { *right };
                }
                None => return vec![0.0; self.n_classes],
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

fn class_counts(targets: &[usize], sample: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &i in sample {
        counts[targets[i]] += 1;
    }
    counts
}

fn gini(counts: &[usize], total: usize) -> f32 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f32;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f32 / total;
            p * p
        })
        .sum::<f32>()
}

/// Busca el corte de menor Gini ponderado. Recorre las features en orden aleatorio
/// hasta haber evaluado `max_features` que no sean constantes en el nodo.
fn best_split(
    rows: &[Vec<f32>],
    targets: &[usize],
    sample: &[usize],
    counts: &[usize],
    max_features: usize,
    rng: &mut StdRng,
) -> Option<SplitCandidate> {
    let n_features = rows.first().map(|r| r.len()).unwrap_or(0);
    let mut features: Vec<usize> = (0..n_features).collect();
    features.shuffle(rng);

    let mut best: Option<SplitCandidate> = None;
    let mut sorted = sample.to_vec();
    let mut visited = 0;

    for feature in features {
        if visited >= max_features {
            break;
        }
        sorted.sort_by(|&a, &b| rows[a][feature].total_cmp(&rows[b][feature]));

        let first = rows[sorted[0]][feature];
        let last = rows[sorted[sorted.len() - 1]][feature];
        if last <= first {
            continue;
        }
        visited += 1;

        let mut left_counts = vec![0usize; counts.len()];
        let mut right_counts = counts.to_vec();

        for pos in 0..sorted.len() - 1 {
            let class = targets[sorted[pos]];
            left_counts[class] += 1;
            right_counts[class] -= 1;

            let current = rows[sorted[pos]][feature];
            let next = rows[sorted[pos + 1]][feature];
            if next <= current {
                continue;
            }

            let n_left = pos + 1;
            let n_right = sorted.len() - n_left;
            let impurity = (n_left as f32 * gini(&left_counts, n_left)
                + n_right as f32 * gini(&right_counts, n_right))
                / sorted.len() as f32;

            if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                let mut threshold = current + (next - current) / 2.0;
                // El punto medio puede redondear a `next` con valores muy cercanos
                if threshold >= next {
                    threshold = current;
                }
                best = Some(SplitCandidate {
                    feature,
                    threshold,
                    impurity,
                });
            }
        }
    }

    best
}

/// Bosque aleatorio: árboles sobre muestras bootstrap que promedian sus probabilidades
#[derive(Debug, Clone)]
pub struct RandomForest {
    n_trees: usize,
    seed: u64,
    trees: Vec<DecisionTree>,
    n_classes: usize,
}

impl RandomForest {
    pub fn new(n_trees: usize, seed: u64) -> Self {
        Self {
            n_trees,
            seed,
            trees: Vec::new(),
            n_classes: 0,
        }
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }
}

impl Classifier for RandomForest {
    fn fit(
        &mut self,
        rows: &[Vec<f32>],
        targets: &[usize],
        n_classes: usize,
    ) -> Result<(), FitError> {
        if rows.is_empty() {
            return Err(FitError::EmptyTrainingSet);
        }
        if rows.len() != targets.len() {
            return Err(FitError::LengthMismatch {
                features: rows.len(),
                targets: targets.len(),
            });
        }
        if let Some(&class) = targets.iter().find(|&&t| t >= n_classes) {
            return Err(FitError::ClassOutOfRange { class, n_classes });
        }

        let n_features = rows[0].len();
        let max_features = ((n_features as f32).sqrt() as usize).max(1);
        let mut rng = StdRng::seed_from_u64(self.seed);

        self.n_classes = n_classes;
        self.trees = (0..self.n_trees.max(1))
            .map(|_| {
                let bootstrap: Vec<usize> =
                    (0..rows.len()).map(|_| rng.gen_range(0..rows.len())).collect();
                let mut tree_rng = StdRng::seed_from_u64(rng.gen());
                DecisionTree::grow(rows, targets, bootstrap, n_classes, max_features, &mut tree_rng)
            })
            .collect();

        Ok(())
    }

    fn predict_proba(&self, row: &[f32]) -> Vec<f32> {
        let mut proba = vec![0.0f32; self.n_classes];
        if self.trees.is_empty() {
            return proba;
        }
        for tree in &self.trees {
            for (acc, p) in proba.iter_mut().zip(tree.predict_proba(row)) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f32;
        proba.iter_mut().for_each(|p| *p /= n);
        proba
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blobs() -> (Vec<Vec<f32>>, Vec<usize>) {
        let mut rows = Vec::new();
        let mut targets = Vec::new();
        for i in 0..20 {
            let jitter = i as f32 * 0.01;
            rows.push(vec![0.1 + jitter, 0.2, 0.9 - jitter]);
            targets.push(0);
            rows.push(vec![0.8 + jitter, 0.2, 0.1 + jitter]);
            targets.push(1);
        }
        (rows, targets)
    }

    #[test]
    fn test_forest_separates_blobs() {
        let (rows, targets) = two_blobs();
        let mut forest = RandomForest::new(12, 7);
        forest.fit(&rows, &targets, 2).unwrap();

        assert_eq!(forest.trees().len(), 12);
        let low = forest.predict_proba(&[0.12, 0.2, 0.88]);
        let high = forest.predict_proba(&[0.85, 0.2, 0.12]);
        assert!(low[0] > 0.5, "{:?}", low);
        assert!(high[1] > 0.5, "{:?}", high);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let (rows, targets) = two_blobs();
        let mut forest = RandomForest::new(5, 99);
        forest.fit(&rows, &targets, 2).unwrap();

        for row in &rows {
            let sum: f32 = forest.predict_proba(row).iter().sum();
            assert!((sum - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (rows, targets) = two_blobs();
        let mut a = RandomForest::new(8, 1567892);
        let mut b = RandomForest::new(8, 1567892);
        a.fit(&rows, &targets, 2).unwrap();
        b.fit(&rows, &targets, 2).unwrap();

        for row in &rows {
            assert_eq!(a.predict_proba(row), b.predict_proba(row));
        }
    }

    #[test]
    fn test_pure_node_is_single_leaf() {
        let rows = vec![vec![1.0], vec![2.0], vec![3.0]];
        let targets = vec![1, 1, 1];
        let mut forest = RandomForest::new(3, 0);
        forest.fit(&rows, &targets, 3).unwrap();

        for tree in forest.trees() {
            assert_eq!(tree.node_count(), 1);
        }
        assert_eq!(forest.predict_proba(&[10.0]), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_fit_rejects_bad_input() {
        let mut forest = RandomForest::new(3, 0);
        assert_eq!(forest.fit(&[], &[], 2), Err(FitError::EmptyTrainingSet));
        assert!(matches!(
            forest.fit(&[vec![1.0]], &[0, 1], 2),
            Err(FitError::LengthMismatch { .. })
        ));
        assert!(matches!(
            forest.fit(&[vec![1.0]], &[4], 2),
            Err(FitError::ClassOutOfRange { class: 4, .. })
        ));
    }
}
