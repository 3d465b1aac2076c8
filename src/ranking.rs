use crate::error::ShapeMismatchError;
use crate::models::Prediction;

pub const TOP_K: usize = 3;

/// Pairs each probability with its label and keeps the `TOP_K` most likely classes.
///
/// Sorting is stable, so equal probabilities keep the lower class index first.
/// Non-finite scores are reported as 0.0.
pub fn rank(probabilities: &[f32], labels: &[&str]) -> Result<Vec<Prediction>, ShapeMismatchError> {
    if probabilities.len() != labels.len() {
        return Err(ShapeMismatchError {
            probabilities: probabilities.len(),
            labels: labels.len(),
        });
    }

    let mut scored: Vec<(f32, &str)> = probabilities
        .iter()
        .map(|p| if p.is_finite() { *p } else { 0.0 })
        .zip(labels.iter().copied())
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    Ok(scored
        .into_iter()
        .take(TOP_K)
        .map(|(probability, class_name)| Prediction {
            probability,
            class_name: class_name.to_string(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TARGET_CLASSES;

    fn names(preds: &[Prediction]) -> Vec<&str> {
        preds.iter().map(|p| p.class_name.as_str()).collect()
    }

    #[test]
    fn keeps_three_highest_in_descending_order() {
        let probs = [0.05, 0.10, 0.02, 0.03, 0.60, 0.15, 0.05];
        let top = rank(&probs, &TARGET_CLASSES).unwrap();
        assert_eq!(top.len(), 3);
        assert_eq!(
            names(&top),
            vec!["Melanoma", "Melanocytic Nevi", "Basal Cell Carcinoma"]
        );
        assert!(top.windows(2).all(|w| w[0].probability >= w[1].probability));
        assert!(top.iter().all(|p| (0.0..=1.0).contains(&p.probability)));
    }

    #[test]
    fn ties_go_to_lower_index() {
        let probs = [0.1, 0.2, 0.2, 0.1, 0.2, 0.1, 0.1];
        let top = rank(&probs, &TARGET_CLASSES).unwrap();
        assert_eq!(
            names(&top),
            vec![TARGET_CLASSES[1], TARGET_CLASSES[2], TARGET_CLASSES[4]]
        );

        let uniform = [1.0 / 7.0; 7];
        let top = rank(&uniform, &TARGET_CLASSES).unwrap();
        assert_eq!(names(&top), TARGET_CLASSES[..3].to_vec());
    }

    #[test]
    fn non_finite_scores_are_reported_as_zero() {
        let probs = [f32::NAN, 0.1, f32::INFINITY, 0.0, 0.0, 0.0, 0.9];
        let top = rank(&probs, &TARGET_CLASSES).unwrap();
        assert_eq!(top[0].class_name, TARGET_CLASSES[6]);
        assert_eq!(top[1].class_name, TARGET_CLASSES[1]);
        assert_eq!(top[2].class_name, TARGET_CLASSES[0]);
        assert_eq!(top[2].probability, 0.0);

        let json = serde_json::to_value(&top).unwrap();
        assert!(json
            .as_array()
            .unwrap()
            .iter()
            .all(|p| p["probability"].is_number()));
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let err = rank(&[0.5, 0.5], &TARGET_CLASSES).unwrap_err();
        assert_eq!(err.probabilities, 2);
        assert_eq!(err.labels, 7);
    }

    #[test]
    fn short_inputs_yield_what_exists() {
        let top = rank(&[0.3, 0.7], &["a", "b"]).unwrap();
        assert_eq!(names(&top), vec!["b", "a"]);
    }
}
