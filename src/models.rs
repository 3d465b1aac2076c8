use serde::{Deserialize, Serialize};

/// Diagnostic categories, indexed by the model's output position.
pub const TARGET_CLASSES: [&str; 7] = [
    "Actinic Keratoses (Solar Keratoses) or intraepithelial Carcinoma (Bowen’s disease)",
    "Basal Cell Carcinoma",
    "Benign Keratosis",
    "Dermatofibroma",
    "Melanoma",
    "Melanocytic Nevi",
    "Vascular skin lesion",
];

/// Side length of the square image the model expects.
pub const INPUT_SIZE: u32 = 224;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub probability: f32,
    pub class_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prediction_serializes_with_camel_case_keys() {
        let p = Prediction {
            probability: 0.5,
            class_name: TARGET_CLASSES[4].to_string(),
        };
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["className"], "Melanoma");
        assert_eq!(json["probability"], 0.5);
    }
}
