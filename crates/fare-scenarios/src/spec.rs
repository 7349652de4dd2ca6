use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use fare_algo::{
    default_criteria, validate_weights, CriterionMetric, FareOptimizer, McdaCriterion, ModeJob,
    ObjectiveBlend, ObjectiveKind, SweepParameter, WelfareSettings,
};
use fare_core::{CostModel, FareModel, ModeEconomicProfile, PriceBounds};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSpec {
    pub version: Option<u32>,
    pub title: Option<String>,
    #[serde(default)]
    pub defaults: AnalysisDefaults,
    #[serde(default)]
    pub modes: Vec<ModeSpec>,
    /// Falls back to the standard five-criterion set when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<Vec<CriterionSpec>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sweeps: Vec<SweepSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blend: Option<ObjectiveBlend>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisDefaults {
    #[serde(default)]
    pub bounds: BoundsDefaults,
    #[serde(default)]
    pub welfare: WelfareSettings,
    #[serde(default)]
    pub optimizer: OptimizerDefaults,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundsDefaults {
    #[serde(default = "default_lower_multiplier")]
    pub lower_multiplier: f64,
    #[serde(default = "default_upper_multiplier")]
    pub upper_multiplier: f64,
}

fn default_lower_multiplier() -> f64 {
    0.5
}

fn default_upper_multiplier() -> f64 {
    2.0
}

impl Default for BoundsDefaults {
    fn default() -> Self {
        Self {
            lower_multiplier: default_lower_multiplier(),
            upper_multiplier: default_upper_multiplier(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerDefaults {
    #[serde(default = "default_grid_points")]
    pub grid_points: usize,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u64,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Operating-cost ceiling applied to every mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_budget: Option<f64>,
}

fn default_grid_points() -> usize {
    101
}

fn default_max_iterations() -> u64 {
    100
}

fn default_tolerance() -> f64 {
    1e-8
}

impl Default for OptimizerDefaults {
    fn default() -> Self {
        Self {
            grid_points: default_grid_points(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            cost_budget: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeSpec {
    pub name: String,
    pub base_price: f64,
    pub base_demand: f64,
    pub price_elasticity: f64,
    pub unit_cost: f64,
    /// Explicit fare interval; overrides the multipliers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<BoundsSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_multiplier: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_multiplier: Option<f64>,
    /// Replaces the linear `unit_cost` cost curve
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<CostModel>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoundsSpec {
    pub lo: f64,
    pub hi: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriterionSpec {
    pub metric: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepSpec {
    pub mode: String,
    pub parameter: String,
    pub values: Vec<f64>,
    /// Defaults to social welfare
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,
}

/// A mode ready to optimize.
#[derive(Debug, Clone)]
pub struct ResolvedMode {
    pub profile: ModeEconomicProfile,
    pub bounds: PriceBounds,
    pub cost: CostModel,
}

impl ResolvedMode {
    pub fn model(&self) -> Result<FareModel> {
        let model = FareModel::from_profile(&self.profile)?.with_cost_model(self.cost.clone())?;
        Ok(model)
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedSweep {
    pub mode: String,
    pub parameter: SweepParameter,
    pub values: Vec<f64>,
    pub objective: ObjectiveKind,
}

/// Validated analysis with every default filled in.
#[derive(Debug, Clone)]
pub struct ResolvedAnalysis {
    pub title: String,
    pub modes: Vec<ResolvedMode>,
    pub criteria: Vec<McdaCriterion>,
    pub sweeps: Vec<ResolvedSweep>,
    pub blend: Option<ObjectiveBlend>,
    pub optimizer: FareOptimizer,
}

impl ResolvedAnalysis {
    pub fn profiles(&self) -> Vec<ModeEconomicProfile> {
        self.modes.iter().map(|m| m.profile.clone()).collect()
    }

    pub fn mode(&self, name: &str) -> Option<&ResolvedMode> {
        self.modes.iter().find(|m| m.profile.name() == name)
    }

    pub fn jobs(&self) -> Result<Vec<ModeJob>> {
        self.modes
            .iter()
            .map(|m| Ok(ModeJob::new(m.model()?, m.bounds)))
            .collect()
    }
}

pub fn load_spec_from_path(path: &Path) -> Result<AnalysisSpec> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading analysis spec '{}'", path.display()))?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
            serde_yaml::from_str(&data).context("parsing analysis spec yaml")
        }
        Some(ext) if ext.eq_ignore_ascii_case("json") => {
            serde_json::from_str(&data).context("parsing analysis spec json")
        }
        _ => serde_yaml::from_str(&data)
            .or_else(|_| serde_json::from_str(&data))
            .context("parsing analysis spec"),
    }
}

/// Write a spec as JSON for `.json` paths, YAML otherwise.
pub fn write_spec_to_path(spec: &AnalysisSpec, path: &Path) -> Result<()> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let contents = if is_json {
        serde_json::to_string_pretty(spec).context("serializing analysis spec json")?
    } else {
        serde_yaml::to_string(spec).context("serializing analysis spec yaml")?
    };
    fs::write(path, contents)
        .with_context(|| format!("writing analysis spec '{}'", path.display()))
}

impl AnalysisSpec {
    /// Minimal spec listing `profiles` with all defaults.
    pub fn from_profiles(title: impl Into<String>, profiles: &[ModeEconomicProfile]) -> Self {
        Self {
            version: Some(1),
            title: Some(title.into()),
            defaults: AnalysisDefaults::default(),
            modes: profiles
                .iter()
                .map(|p| ModeSpec {
                    name: p.name().to_string(),
                    base_price: p.base_price(),
                    base_demand: p.base_demand(),
                    price_elasticity: p.price_elasticity(),
                    unit_cost: p.unit_cost(),
                    bounds: None,
                    lower_multiplier: None,
                    upper_multiplier: None,
                    cost: None,
                })
                .collect(),
            criteria: None,
            sweeps: Vec::new(),
            blend: None,
        }
    }
}

pub fn resolve_analysis(spec: &AnalysisSpec) -> Result<ResolvedAnalysis> {
    if spec.modes.is_empty() {
        return Err(anyhow!("analysis spec contains no modes"));
    }
    let defaults = &spec.defaults;

    let mut seen = HashSet::new();
    let mut modes = Vec::with_capacity(spec.modes.len());
    for mode in &spec.modes {
        if mode.name.trim().is_empty() {
            return Err(anyhow!("mode name cannot be empty"));
        }
        if !seen.insert(mode.name.clone()) {
            return Err(anyhow!("duplicate mode '{}' in spec", mode.name));
        }
        let profile = ModeEconomicProfile::new(
            mode.name.clone(),
            mode.base_price,
            mode.base_demand,
            mode.price_elasticity,
            mode.unit_cost,
        )
        .with_context(|| format!("invalid profile for mode '{}'", mode.name))?;

        let bounds = match mode.bounds {
            Some(b) => PriceBounds::new(b.lo, b.hi),
            None => PriceBounds::around(
                mode.base_price,
                mode.lower_multiplier
                    .unwrap_or(defaults.bounds.lower_multiplier),
                mode.upper_multiplier
                    .unwrap_or(defaults.bounds.upper_multiplier),
            ),
        }
        .with_context(|| format!("invalid fare bounds for mode '{}'", mode.name))?;

        let cost = mode
            .cost
            .clone()
            .unwrap_or_else(|| CostModel::linear(mode.unit_cost));
        cost.validate()
            .with_context(|| format!("invalid cost model for mode '{}'", mode.name))?;

        modes.push(ResolvedMode {
            profile,
            bounds,
            cost,
        });
    }

    let criteria = match &spec.criteria {
        Some(list) => list
            .iter()
            .map(|c| {
                let metric: CriterionMetric = c
                    .metric
                    .parse()
                    .with_context(|| format!("parsing criterion '{}'", c.metric))?;
                Ok(McdaCriterion::new(metric, c.weight))
            })
            .collect::<Result<Vec<_>>>()?,
        None => default_criteria(),
    };
    validate_weights(&criteria).context("validating criteria weights")?;

    let mut sweeps = Vec::with_capacity(spec.sweeps.len());
    for sweep in &spec.sweeps {
        if !seen.contains(&sweep.mode) {
            return Err(anyhow!("sweep references unknown mode '{}'", sweep.mode));
        }
        if sweep.values.is_empty() {
            return Err(anyhow!(
                "sweep over '{}' for '{}' has no values",
                sweep.parameter,
                sweep.mode
            ));
        }
        let parameter: SweepParameter = sweep
            .parameter
            .parse()
            .with_context(|| format!("sweep for mode '{}'", sweep.mode))?;
        let objective: ObjectiveKind = match &sweep.objective {
            Some(name) => name
                .parse()
                .with_context(|| format!("sweep for mode '{}'", sweep.mode))?,
            None => ObjectiveKind::MaxSocialWelfare,
        };
        sweeps.push(ResolvedSweep {
            mode: sweep.mode.clone(),
            parameter,
            values: sweep.values.clone(),
            objective,
        });
    }

    if let Some(blend) = &spec.blend {
        blend.validate().context("validating blend weights")?;
    }

    let opt = &defaults.optimizer;
    let mut optimizer = FareOptimizer::new()
        .with_grid_points(opt.grid_points)
        .with_max_iterations(opt.max_iterations)
        .with_tolerance(opt.tolerance)
        .with_welfare(defaults.welfare);
    if let Some(budget) = opt.cost_budget {
        optimizer = optimizer.with_cost_budget(budget);
    }
    optimizer.validate().context("validating optimizer settings")?;

    Ok(ResolvedAnalysis {
        title: spec
            .title
            .clone()
            .unwrap_or_else(|| "Transport fare analysis".to_string()),
        modes,
        criteria,
        sweeps,
        blend: spec.blend,
        optimizer,
    })
}

pub fn validate(spec: &AnalysisSpec) -> Result<()> {
    resolve_analysis(spec).map(|_| ())
}
