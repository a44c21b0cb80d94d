use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdType {
    #[default]
    Above,
    Below,
}

impl ThresholdType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Above => "above",
            Self::Below => "below",
        }
    }
}

impl fmt::Display for ThresholdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThresholdType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "above" | ">=" => Ok(Self::Above),
            "below" | "<=" => Ok(Self::Below),
            other => Err(format!("threshold type must be above or below, got {other:?}")),
        }
    }
}

/// What the user wants to be alerted about. This is the unit of local persistence.
///
/// `threshold` keeps the raw text exactly as typed so half-finished input
/// ("3.") survives a reload; it is only parsed when submitted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertSettings {
    #[serde(deserialize_with = "blank_as_none")]
    pub threshold: Option<String>,
    pub threshold_type: ThresholdType,
    pub threshold_enabled: bool,
    pub volatility_enabled: bool,
}

impl AlertSettings {
    pub fn any_enabled(&self) -> bool {
        self.threshold_enabled || self.volatility_enabled
    }

    /// Threshold text parsed as a float, `None` when blank or not a finite number.
    pub fn parsed_threshold(&self) -> Option<f64> {
        self.threshold
            .as_deref()
            .map(str::trim)
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }

    /// Value sent to the backend: the backend treats a non-null threshold as
    /// "threshold alert on", so a disabled toggle always submits `None`.
    pub fn submitted_threshold(&self) -> Option<f64> {
        if self.threshold_enabled {
            self.parsed_threshold()
        } else {
            None
        }
    }

    /// Toggle on with an empty or unparsable field.
    pub fn is_armed_but_unset(&self) -> bool {
        self.threshold_enabled && self.parsed_threshold().is_none()
    }
}

/// Renders a backend threshold the way it is shown in the input field.
pub fn format_threshold(value: f64) -> String {
    format!("{value}")
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_uses_camel_case_field_names() {
        let s = AlertSettings {
            threshold: Some("3.45".into()),
            threshold_type: ThresholdType::Above,
            threshold_enabled: true,
            volatility_enabled: false,
        };

        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["threshold"], "3.45");
        assert_eq!(v["thresholdType"], "above");
        assert_eq!(v["thresholdEnabled"], true);
        assert_eq!(v["volatilityEnabled"], false);
    }

    #[test]
    fn missing_fields_default_individually() {
        let s: AlertSettings = serde_json::from_str(r#"{"volatilityEnabled":true}"#).unwrap();
        assert_eq!(s.threshold, None);
        assert_eq!(s.threshold_type, ThresholdType::Above);
        assert!(!s.threshold_enabled);
        assert!(s.volatility_enabled);
    }

    #[test]
    fn empty_threshold_text_reads_as_unset() {
        let s: AlertSettings =
            serde_json::from_str(r#"{"threshold":"","thresholdEnabled":true}"#).unwrap();
        assert_eq!(s.threshold, None);
        assert!(s.is_armed_but_unset());
    }

    #[test]
    fn partial_input_is_kept_verbatim() {
        let s = AlertSettings {
            threshold: Some("3.".into()),
            threshold_enabled: true,
            ..Default::default()
        };
        assert_eq!(s.parsed_threshold(), Some(3.0));

        let junk = AlertSettings {
            threshold: Some("3.4x".into()),
            threshold_enabled: true,
            ..Default::default()
        };
        assert_eq!(junk.parsed_threshold(), None);
        assert_eq!(junk.threshold.as_deref(), Some("3.4x"));
    }

    #[test]
    fn disabled_threshold_submits_null() {
        let s = AlertSettings {
            threshold: Some("3.45".into()),
            threshold_enabled: false,
            volatility_enabled: true,
            ..Default::default()
        };
        assert_eq!(s.submitted_threshold(), None);
    }

    #[test]
    fn non_finite_text_is_not_a_threshold() {
        let s = AlertSettings {
            threshold: Some("inf".into()),
            threshold_enabled: true,
            ..Default::default()
        };
        assert_eq!(s.submitted_threshold(), None);
    }

    #[test]
    fn backend_numbers_render_like_the_input_field() {
        assert_eq!(format_threshold(3.5), "3.5");
        assert_eq!(format_threshold(4.0), "4");
        assert_eq!(format_threshold(3.4512), "3.4512");
    }

    #[test]
    fn threshold_type_parses_symbols_and_words() {
        assert_eq!("BELOW".parse::<ThresholdType>(), Ok(ThresholdType::Below));
        assert_eq!(">=".parse::<ThresholdType>(), Ok(ThresholdType::Above));
        assert!("sideways".parse::<ThresholdType>().is_err());
    }
}
