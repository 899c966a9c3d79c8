//! Two-phase entry point: configure a [`PrecBuilder`], then build shapes from
//! the immutable [`Prec`] it produces.

use std::cell::OnceCell;

use log::{info, warn};
use prec_core::{PrecError, Regime};
use prec_frame::{
    CompiledExpr, CutMap, CutRecord, CutReport, DataSource, SelectionProvider, Table,
};
use prec_pdf::KdeOptions;
use serde::Serialize;

use crate::assembler::{TableAssembler, WGT_BR, WGT_DEC, WGT_SAM};
use crate::cache::{CacheKey, ContentCache};
use crate::categories::{CategoryMap, CategoryScheme};
use crate::config::{BoundsPolicy, Observable, PrecConfig};
use crate::density::DensityBuilder;
use crate::loader::{BremCategory, SampleLoader};
use crate::mixture::{combine, PrecShape};
use crate::readers::{
    DecayWeightReader, MotherIdDecayWeights, ProcessShareWeights, SampleWeightReader,
};
use crate::report::{BuildReport, CacheEvent};
use crate::weights::WeightConfig;

/// External services a [`Prec`] reads from.
pub struct Collaborators {
    /// Rows per `(sample, trigger)`.
    pub source: Box<dyn DataSource>,
    /// Default selection per `(regime, sample)`.
    pub selection: Box<dyn SelectionProvider>,
    /// Decay weight per row.
    pub decay_weights: Box<dyn DecayWeightReader>,
    /// Sample weights over the combined table.
    pub sample_weights: Box<dyn SampleWeightReader>,
}

impl Collaborators {
    /// Uses unit decay factors and uniform sample shares until replaced.
    pub fn new(
        source: impl DataSource + 'static,
        selection: impl SelectionProvider + 'static,
    ) -> Self {
        Self {
            source: Box::new(source),
            selection: Box::new(selection),
            decay_weights: Box::new(MotherIdDecayWeights::default()),
            sample_weights: Box::new(ProcessShareWeights::uniform()),
        }
    }

    /// Replaces the decay weight reader.
    pub fn with_decay_weights(mut self, reader: impl DecayWeightReader + 'static) -> Self {
        self.decay_weights = Box::new(reader);
        self
    }

    /// Replaces the sample weight reader.
    pub fn with_sample_weights(mut self, reader: impl SampleWeightReader + 'static) -> Self {
        self.sample_weights = Box::new(reader);
        self
    }
}

/// Configuration phase. Cut overrides can only be set here.
#[derive(Debug, Clone)]
pub struct PrecBuilder {
    samples: Vec<String>,
    trigger: String,
    regime: String,
    weights: WeightConfig,
    cuts: Option<CutMap>,
    nbrem: Option<BremCategory>,
    scheme: CategoryScheme,
    config: PrecConfig,
}

impl PrecBuilder {
    /// Starts a builder; `regime` is validated by [`PrecBuilder::build`].
    pub fn new<S: Into<String>>(
        samples: impl IntoIterator<Item = S>,
        trigger: impl Into<String>,
        regime: impl Into<String>,
        weights: WeightConfig,
    ) -> Self {
        Self {
            samples: samples.into_iter().map(Into::into).collect(),
            trigger: trigger.into(),
            regime: regime.into(),
            weights,
            cuts: None,
            nbrem: None,
            scheme: CategoryScheme::default(),
            config: PrecConfig::default(),
        }
    }

    /// Cuts taking precedence over same-named default cuts. An empty map is
    /// the same as no overrides.
    pub fn cuts(mut self, cuts: CutMap) -> Self {
        self.cuts = (!cuts.is_empty()).then_some(cuts);
        self
    }

    /// Restricts the brem multiplicity.
    pub fn nbrem(mut self, nbrem: BremCategory) -> Self {
        self.nbrem = Some(nbrem);
        self
    }

    /// Category decomposition.
    pub fn scheme(mut self, scheme: CategoryScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Cache and threshold settings.
    pub fn config(mut self, config: PrecConfig) -> Self {
        self.config = config;
        self
    }

    /// Validates the regime and scheme and freezes the configuration.
    pub fn build(self, collaborators: Collaborators) -> Result<Prec, PrecError> {
        let regime: Regime = self.regime.parse()?;
        let categories = self.scheme.categories(regime)?;
        Ok(Prec {
            samples: self.samples,
            trigger: self.trigger,
            regime,
            weights: self.weights,
            cuts: self.cuts,
            nbrem: self.nbrem,
            categories,
            config: self.config,
            collaborators,
            combined: OnceCell::new(),
        })
    }
}

struct Combined {
    table: Table,
    selection: CutReport,
    unmatched: usize,
}

/// Everything that decides which rows end up in one category table.
#[derive(Serialize)]
struct CacheKeyInputs<'a> {
    cuts: Option<&'a CutMap>,
    weights: WeightConfig,
    cut: String,
    mass: &'a str,
    samples: &'a [String],
    trigger: &'a str,
    regime: Regime,
    shape: &'a KdeOptions,
    nbrem: Option<BremCategory>,
    bounds: Option<(f64, f64)>,
}

/// Result of [`Prec::get_sum`].
#[derive(Debug, Clone)]
pub struct PrecOutcome {
    /// `None` when no category has enough entries.
    pub shape: Option<PrecShape>,
    /// Diagnostics of the call.
    pub report: BuildReport,
}

/// Ready phase: immutable configuration plus a lazily built combined table.
pub struct Prec {
    samples: Vec<String>,
    trigger: String,
    regime: Regime,
    weights: WeightConfig,
    cuts: Option<CutMap>,
    nbrem: Option<BremCategory>,
    categories: CategoryMap,
    config: PrecConfig,
    collaborators: Collaborators,
    combined: OnceCell<Combined>,
}

impl Prec {
    /// Resolved regime.
    pub fn regime(&self) -> Regime {
        self.regime
    }

    /// Categories in use.
    pub fn categories(&self) -> &CategoryMap {
        &self.categories
    }

    /// True once the combined table has been built.
    pub fn is_materialized(&self) -> bool {
        self.combined.get().is_some()
    }

    /// Builds the background shape named `name` on `mass` within `observable`.
    ///
    /// Each category table comes from the cache when possible. Categories
    /// below the entries threshold are left out; with none left the shape is
    /// `None`.
    pub fn get_sum(
        &self,
        name: &str,
        mass: &str,
        observable: &Observable,
        shape: &KdeOptions,
    ) -> Result<PrecOutcome, PrecError> {
        let mut report = BuildReport::default();
        let builder = DensityBuilder::new(self.config.min_entries);
        let cache = self
            .config
            .use_cache
            .then(|| ContentCache::new(&self.config.cache_dir));
        let columns = [mass, WGT_BR, WGT_DEC, WGT_SAM];

        let mut densities = Vec::new();
        for category in self.categories.iter() {
            let predicate = category.predicate.render();
            let table = match &cache {
                Some(cache) => {
                    let key = self.cache_key(&predicate, mass, observable, shape)?;
                    let lookup = cache.get_or_build(&key, &columns, || {
                        self.category_table(
                            &category.label,
                            &predicate,
                            mass,
                            observable,
                            &mut report,
                        )
                    })?;
                    report.cache.push(CacheEvent {
                        label: category.label.clone(),
                        key: key.as_str().to_string(),
                        path: lookup.path.display().to_string(),
                        hit: lookup.hit,
                    });
                    lookup.table
                }
                None => self.category_table(
                    &category.label,
                    &predicate,
                    mass,
                    observable,
                    &mut report,
                )?,
            };
            let density =
                builder.build(&category.label, &table, mass, observable, shape, &mut report)?;
            if let Some(density) = density {
                report.components.push(category.label.clone());
                densities.push(density);
            }
        }

        if let Some(combined) = self.combined.get() {
            report.unmatched_rows = Some(combined.unmatched);
            let mut cut_flow = combined.selection.clone();
            cut_flow.extend(&report.cut_flow);
            report.cut_flow = cut_flow;
        }
        report.cut_flow.log(name);

        let shape = combine(name, densities)?;
        Ok(PrecOutcome { shape, report })
    }

    fn cache_key(
        &self,
        predicate: &str,
        mass: &str,
        observable: &Observable,
        shape: &KdeOptions,
    ) -> Result<CacheKey, PrecError> {
        CacheKey::compute(&CacheKeyInputs {
            cuts: self.cuts.as_ref(),
            weights: self.weights,
            cut: predicate.to_string(),
            mass,
            samples: &self.samples,
            trigger: &self.trigger,
            regime: self.regime,
            shape,
            nbrem: self.nbrem,
            bounds: match self.config.bounds_policy {
                BoundsPolicy::AfterCache => None,
                BoundsPolicy::InKey => Some(observable.bounds()),
            },
        })
    }

    /// Category rows of the combined table, windowed when bounds are in the key.
    fn category_table(
        &self,
        label: &str,
        predicate: &str,
        mass: &str,
        observable: &Observable,
        report: &mut BuildReport,
    ) -> Result<Table, PrecError> {
        let combined = &self.combined()?.table;
        info!("Applying cut: {predicate}");
        let mut table = combined.query(predicate)?;
        report.cut_flow.push(CutRecord {
            name: label.to_string(),
            expr: predicate.to_string(),
            total: combined.n_rows(),
            passed: table.n_rows(),
        });
        if self.config.bounds_policy == BoundsPolicy::InKey {
            let window = observable.window_expr(mass);
            let total = table.n_rows();
            table = table.query(&window)?;
            report.cut_flow.push(CutRecord {
                name: format!("{label} / cached mass"),
                expr: window,
                total,
                passed: table.n_rows(),
            });
        }
        Ok(table)
    }

    fn combined(&self) -> Result<&Combined, PrecError> {
        if let Some(combined) = self.combined.get() {
            return Ok(combined);
        }
        let built = self.assemble()?;
        Ok(self.combined.get_or_init(|| built))
    }

    fn assemble(&self) -> Result<Combined, PrecError> {
        let Collaborators {
            source,
            selection,
            decay_weights,
            sample_weights,
        } = &self.collaborators;
        let loader = SampleLoader::new(source.as_ref(), selection.as_ref());
        let mut tables = Vec::with_capacity(self.samples.len());
        let mut cut_flow = CutReport::default();
        for sample in &self.samples {
            let loaded = loader.load(
                sample,
                &self.trigger,
                self.regime,
                self.cuts.as_ref(),
                self.nbrem,
            )?;
            cut_flow.extend(&loaded.report);
            tables.push(loaded.table);
        }
        let assembler =
            TableAssembler::new(self.weights, decay_weights.as_ref(), sample_weights.as_ref());
        let table = assembler.assemble(tables)?;

        let unmatched = CompiledExpr::compile(&self.categories.unmatched_predicate().render())?;
        let unmatched = table.mask(&unmatched)?.into_iter().filter(|m| *m).count();
        if unmatched > 0 {
            warn!(
                "{unmatched} of {} rows match no category and are dropped",
                table.n_rows()
            );
        }
        Ok(Combined {
            table,
            selection: cut_flow,
            unmatched,
        })
    }
}
