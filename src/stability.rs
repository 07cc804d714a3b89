//! Characteristic equation input and Routh-Hurwitz report formatting
//!
//! The stability test itself runs in the analysis service. This module
//! collects the polynomial from the coefficient fields and formats what
//! comes back.

use serde::{Deserialize, Serialize};

/// Order used when the form first opens
pub const DEFAULT_ORDER: usize = 1;

/// Coefficient text fields for a polynomial of a given order.
/// Field `i` holds the coefficient of `s^(order - i)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacteristicForm {
    order: usize,
    fields: Vec<String>,
}

impl CharacteristicForm {
    pub fn new(order: usize) -> Self {
        Self {
            order,
            fields: vec!["0".to_string(); order + 1],
        }
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Changes the order, keeping the text of fields that still exist
    pub fn set_order(&mut self, order: usize) {
        self.order = order;
        self.fields.resize(order + 1, "0".to_string());
    }

    /// Parses an order field; negative or non-numeric text is rejected
    pub fn parse_order(raw: &str) -> Option<usize> {
        raw.trim().parse::<usize>().ok()
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut [String] {
        &mut self.fields
    }

    /// Power of `s` labelling field `index`
    pub fn power_of(&self, index: usize) -> usize {
        self.order.saturating_sub(index)
    }

    /// Numeric coefficients, highest power first; unreadable fields count as 0
    pub fn coefficients(&self) -> Vec<f64> {
        self.fields
            .iter()
            .map(|field| {
                field
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .unwrap_or(0.0)
            })
            .collect()
    }

    pub fn request(&self) -> StabilityRequest {
        StabilityRequest {
            coeffs: self.coefficients(),
            order: self.order,
        }
    }
}

impl Default for CharacteristicForm {
    fn default() -> Self {
        Self::new(DEFAULT_ORDER)
    }
}

/// Body of `POST /solve_characteristic_equation`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityRequest {
    pub coeffs: Vec<f64>,
    pub order: usize,
}

/// A pole as the service sends it: a bare real or a complex pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Pole {
    Real(f64),
    Complex { real: f64, imag: f64 },
}

impl Pole {
    pub fn format(&self) -> String {
        match self {
            Pole::Real(value) => format!("{:.4}", value),
            Pole::Complex { real, imag } => {
                let sign = if *imag >= 0.0 { "+" } else { "" };
                format!("{:.4} {}{:.4}i", real, sign, imag)
            }
        }
    }
}

/// Body returned by `POST /solve_characteristic_equation`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityResponse {
    pub message: String,
    pub poles: Option<Vec<Pole>>,
    pub matrix: Option<Vec<Vec<f64>>>,
}

/// One labelled row of the Routh array
#[derive(Debug, Clone, PartialEq)]
pub struct RouthRow {
    pub label: String,
    pub cells: Vec<String>,
}

/// Display-ready stability result
#[derive(Debug, Clone, PartialEq)]
pub struct StabilityReport {
    pub message: String,
    pub stable: bool,
    pub unstable_poles: Vec<String>,
    pub routh_rows: Vec<RouthRow>,
}

impl StabilityReport {
    /// Formats a response for the polynomial order it was requested with
    pub fn from_response(response: &StabilityResponse, order: usize) -> Self {
        let lowered = response.message.to_lowercase();
        let stable = lowered.contains("stable") && !lowered.contains("unstable");

        let unstable_poles = response
            .poles
            .iter()
            .flatten()
            .map(Pole::format)
            .collect();

        let routh_rows = response
            .matrix
            .iter()
            .flatten()
            .enumerate()
            .map(|(i, row)| RouthRow {
                label: format!("Row {}", order as i64 - i as i64),
                cells: row.iter().map(|v| format!("{:.3}", v)).collect(),
            })
            .collect();

        Self {
            message: response.message.clone(),
            stable,
            unstable_poles,
            routh_rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_form_collects_coefficients_highest_power_first() {
        let mut form = CharacteristicForm::new(2);
        form.fields_mut()[0] = "1".into();
        form.fields_mut()[1] = "3.5".into();
        form.fields_mut()[2] = "oops".into();

        assert_eq!(form.power_of(0), 2);
        assert_eq!(form.power_of(2), 0);
        assert_eq!(
            serde_json::to_value(form.request()).unwrap(),
            json!({ "coeffs": [1.0, 3.5, 0.0], "order": 2 })
        );
    }

    #[test]
    fn test_order_change_keeps_existing_fields() {
        let mut form = CharacteristicForm::default();
        form.fields_mut()[0] = "4".into();
        form.set_order(3);
        assert_eq!(form.fields().len(), 4);
        assert_eq!(form.fields()[0], "4");

        form.set_order(0);
        assert_eq!(form.coefficients(), vec![4.0]);
        assert_eq!(CharacteristicForm::parse_order("-1"), None);
        assert_eq!(CharacteristicForm::parse_order(" 5 "), Some(5));
    }

    #[test]
    fn test_unstable_report_formats_poles_and_routh_rows() {
        let response: StabilityResponse = serde_json::from_value(json!({
            "message": "The system is unstable.",
            "poles": [0.5, { "real": 1.0, "imag": -2.0 }, { "real": 1.0, "imag": 2.0 }],
            "matrix": [[1.0, 2.0], [-1.0, 0.0], [2.0, 0.0]]
        }))
        .unwrap();

        let report = StabilityReport::from_response(&response, 2);
        assert!(!report.stable);
        assert_eq!(
            report.unstable_poles,
            vec!["0.5000", "1.0000 -2.0000i", "1.0000 +2.0000i"]
        );
        assert_eq!(report.routh_rows[0].label, "Row 2");
        assert_eq!(report.routh_rows[2].label, "Row 0");
        assert_eq!(report.routh_rows[1].cells, vec!["-1.000", "0.000"]);
    }

    #[test]
    fn test_stable_report() {
        let response: StabilityResponse = serde_json::from_value(json!({
            "message": "The system is stable.",
            "poles": []
        }))
        .unwrap();

        let report = StabilityReport::from_response(&response, 1);
        assert!(report.stable);
        assert!(report.unstable_poles.is_empty());
        assert!(report.routh_rows.is_empty());
    }
}
