use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::models::{Nutrient, NutrientRange};

/// Targets, acceptable ranges, and recommender thresholds.
///
/// Every field has a default, so a config file only needs the values it
/// changes. Targets replace defaults per nutrient rather than wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub targets: BTreeMap<Nutrient, f64>,
    pub ranges: BTreeMap<Nutrient, NutrientRange>,
    /// Range used for nutrients without an entry in `ranges`.
    pub default_range: NutrientRange,
    pub recommend: RecommendConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendConfig {
    /// Maximum foods returned per deficient nutrient.
    pub limit: usize,
    /// Words must be longer than this to count as keywords.
    pub keyword_min_len: usize,
    /// How many leading keywords identify a food during deduplication.
    pub keywords_per_food: usize,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            limit: 10,
            keyword_min_len: 3,
            keywords_per_food: 2,
        }
    }
}

#[must_use]
pub fn default_targets() -> BTreeMap<Nutrient, f64> {
    BTreeMap::from([
        (Nutrient::Calories, 2000.0),
        (Nutrient::Protein, 150.0),
        (Nutrient::Carbs, 250.0),
        (Nutrient::Fat, 65.0),
        (Nutrient::Fiber, 25.0),
        (Nutrient::Sugar, 50.0),
        (Nutrient::Sodium, 2300.0),
        (Nutrient::Calcium, 1000.0),
        (Nutrient::Iron, 18.0),
        (Nutrient::VitaminC, 90.0),
    ])
}

/// Sugar deliberately has no entry and falls back to `default_range`.
#[must_use]
pub fn default_ranges() -> BTreeMap<Nutrient, NutrientRange> {
    BTreeMap::from([
        (Nutrient::Calories, NutrientRange::new(0.8, 1.2)),
        (Nutrient::Protein, NutrientRange::new(0.8, 2.0)),
        (Nutrient::Carbs, NutrientRange::new(0.45, 1.3)),
        (Nutrient::Fat, NutrientRange::new(0.7, 1.5)),
        (Nutrient::Fiber, NutrientRange::at_least(0.8)),
        (Nutrient::Sodium, NutrientRange::new(0.0, 1.0)),
        (Nutrient::Calcium, NutrientRange::at_least(0.8)),
        (Nutrient::Iron, NutrientRange::at_least(0.8)),
        (Nutrient::VitaminC, NutrientRange::at_least(0.8)),
    ])
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            targets: default_targets(),
            ranges: default_ranges(),
            default_range: NutrientRange::new(0.8, 1.2),
            recommend: RecommendConfig::default(),
        }
    }
}

impl AnalysisConfig {
    #[must_use]
    pub fn target(&self, nutrient: Nutrient) -> Option<f64> {
        self.targets.get(&nutrient).copied()
    }

    #[must_use]
    pub fn range(&self, nutrient: Nutrient) -> NutrientRange {
        self.ranges
            .get(&nutrient)
            .copied()
            .unwrap_or(self.default_range)
    }

    /// Copy of this config with some targets replaced.
    #[must_use]
    pub fn with_targets(&self, overrides: &BTreeMap<Nutrient, f64>) -> Self {
        let mut config = self.clone();
        config
            .targets
            .extend(overrides.iter().map(|(&n, &v)| (n, v)));
        config
    }

    /// Copy of this config with some acceptable ranges replaced.
    #[must_use]
    pub fn with_ranges(&self, overrides: &BTreeMap<Nutrient, NutrientRange>) -> Self {
        let mut config = self.clone();
        config
            .ranges
            .extend(overrides.iter().map(|(&n, &r)| (n, r)));
        config
    }

    /// Parse a JSON config. Targets and ranges given in the file are merged
    /// over the defaults per nutrient; other sections replace their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        #[derive(Deserialize)]
        struct Partial {
            #[serde(default)]
            targets: BTreeMap<Nutrient, f64>,
            #[serde(default)]
            ranges: BTreeMap<Nutrient, NutrientRange>,
            #[serde(default)]
            default_range: Option<NutrientRange>,
            #[serde(default)]
            recommend: RecommendConfig,
        }

        let partial: Partial = serde_json::from_str(json).context("Invalid config JSON")?;
        let defaults = Self::default();
        let config = Self {
            default_range: partial.default_range.unwrap_or(defaults.default_range),
            recommend: partial.recommend,
            ..defaults
                .with_targets(&partial.targets)
                .with_ranges(&partial.ranges)
        };
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, or the defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("In config file {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        for (nutrient, target) in &self.targets {
            if !target.is_finite() || *target < 0.0 {
                bail!("Target for {nutrient} must be a non-negative number (got {target})");
            }
        }
        let ranges = self
            .ranges
            .iter()
            .map(|(n, r)| (n.key(), r))
            .chain(std::iter::once(("default_range", &self.default_range)));
        for (name, range) in ranges {
            if !range.min.is_finite() || range.min < 0.0 {
                bail!("Range minimum for {name} must be a non-negative number");
            }
            if let Some(max) = range.max {
                if !max.is_finite() || max < range.min {
                    bail!("Range maximum for {name} must be at least its minimum");
                }
            }
        }
        if self.recommend.limit == 0 {
            bail!("recommend.limit must be greater than 0");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::models::{NutrientStatus, NutrientTotals};

    #[test]
    fn test_default_targets_cover_every_nutrient() {
        let config = AnalysisConfig::default();
        for n in Nutrient::ALL {
            assert!(config.target(n).is_some(), "missing target for {n}");
        }
        assert!((config.target(Nutrient::Protein).unwrap() - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sugar_uses_default_range() {
        let config = AnalysisConfig::default();
        assert_eq!(config.range(Nutrient::Sugar), NutrientRange::new(0.8, 1.2));
        assert_eq!(config.range(Nutrient::Fiber), NutrientRange::at_least(0.8));
    }

    #[test]
    fn test_from_json_merges_targets() {
        let config = AnalysisConfig::from_json(r#"{"targets": {"protein": 120}}"#).unwrap();
        assert!((config.target(Nutrient::Protein).unwrap() - 120.0).abs() < f64::EPSILON);
        assert!((config.target(Nutrient::Calories).unwrap() - 2000.0).abs() < f64::EPSILON);
        assert_eq!(config.ranges, default_ranges());
        assert_eq!(config.recommend.limit, 10);
    }

    #[test]
    fn test_from_json_recommend_section() {
        let config =
            AnalysisConfig::from_json(r#"{"recommend": {"limit": 4, "keywords_per_food": 1}}"#)
                .unwrap();
        assert_eq!(config.recommend.limit, 4);
        assert_eq!(config.recommend.keywords_per_food, 1);
        assert_eq!(config.recommend.keyword_min_len, 3);
    }

    #[test]
    fn test_from_json_unbounded_range() {
        let json = r#"{"ranges": {"sugar": {"min": 0.0, "max": 1.0}, "iron": {"min": 0.5}}}"#;
        let config = AnalysisConfig::from_json(json).unwrap();
        assert_eq!(config.range(Nutrient::Sugar), NutrientRange::new(0.0, 1.0));
        assert_eq!(config.range(Nutrient::Iron), NutrientRange::at_least(0.5));
        assert_eq!(config.range(Nutrient::Protein), NutrientRange::new(0.8, 2.0));
    }

    #[test]
    fn test_partial_ranges_keep_other_defaults() {
        let config =
            AnalysisConfig::from_json(r#"{"ranges": {"sugar": {"min": 0.0, "max": 1.0}}}"#)
                .unwrap();
        let defaults = default_ranges();
        assert_eq!(config.range(Nutrient::Sodium), defaults[&Nutrient::Sodium]);
        assert_eq!(config.range(Nutrient::Fiber), defaults[&Nutrient::Fiber]);

        let mut totals = NutrientTotals::zeroed();
        totals.set(Nutrient::Fiber, 50.0);
        let analysis = analyze(&totals, &config);
        assert_eq!(
            analysis.status(Nutrient::Sodium),
            Some(NutrientStatus::WithinRange)
        );
        assert_eq!(
            analysis.status(Nutrient::Fiber),
            Some(NutrientStatus::WithinRange)
        );
    }

    #[test]
    fn test_from_json_rejects_bad_values() {
        assert!(AnalysisConfig::from_json(r#"{"targets": {"iron": -1}}"#).is_err());
        assert!(AnalysisConfig::from_json(r#"{"recommend": {"limit": 0}}"#).is_err());
        assert!(
            AnalysisConfig::from_json(r#"{"ranges": {"fat": {"min": 1.5, "max": 1.0}}}"#).is_err()
        );
        assert!(AnalysisConfig::from_json(r#"{"targets": {"zinc": 10}}"#).is_err());
        assert!(AnalysisConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_with_targets_overrides_only_given() {
        let base = AnalysisConfig::default();
        let custom = base.with_targets(&BTreeMap::from([(Nutrient::Calories, 1800.0)]));
        assert!((custom.target(Nutrient::Calories).unwrap() - 1800.0).abs() < f64::EPSILON);
        assert!((custom.target(Nutrient::Iron).unwrap() - 18.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let config = AnalysisConfig::load(Path::new("/nonexistent/platewise/config.json")).unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }
}
