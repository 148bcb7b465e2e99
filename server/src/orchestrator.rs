//! Background retraining orchestration.
//!
//! A retraining run is an independent unit of work decoupled from the
//! request that triggered it: curate pending sources, build the sample
//! views through the shared preprocessing contract, train, evaluate,
//! persist, then hand the artifact to the lifecycle manager for the swap.
//! At most one job is ever in flight; a second trigger is rejected
//! immediately rather than queued.

use crate::lifecycle::ModelLifecycle;
use chrono::{DateTime, Utc};
use ecosort_core::{
    AugmentationConfig, Category, CuratorConfig, DataPaths, Error, EvaluationReport, Result,
    Split, TrainingHistory, TrainingParams,
};
use ecosort_dataset::loader::scan_images;
use ecosort_dataset::{AugmentationPipeline, CurationReport, DatasetCurator, ImagePreprocessor, RawSource};
use ecosort_model::{EcoSortModel, Sample, TrainableClassifier};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Everything one retraining run needs, captured at trigger time.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub paths: DataPaths,
    pub training: TrainingParams,
    pub curator: CuratorConfig,
    pub augmentation: AugmentationConfig,
    /// Additional bulk raw sources beyond the upload store
    pub source_dirs: Vec<PathBuf>,
}

/// Per-cell dataset counts in a serializable shape for job records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurationSummary {
    pub organic_train: usize,
    pub organic_test: usize,
    pub recyclable_train: usize,
    pub recyclable_test: usize,
    pub skipped: usize,
}

impl From<&CurationReport> for CurationSummary {
    fn from(report: &CurationReport) -> Self {
        Self {
            organic_train: report.count(Category::Organic, Split::Train),
            organic_test: report.count(Category::Organic, Split::Test),
            recyclable_train: report.count(Category::Recyclable, Split::Train),
            recyclable_test: report.count(Category::Recyclable, Split::Test),
            skipped: report.total_skipped(),
        }
    }
}

/// Result of a successful pipeline run, before the swap.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub artifact_path: PathBuf,
    pub history: TrainingHistory,
    pub evaluation: EvaluationReport,
    pub curation: Option<CurationSummary>,
}

/// Lifecycle states of a retraining job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Idle,
    Running,
    Succeeded,
    Failed,
}

/// Record of the current or most recent retraining job.
#[derive(Debug, Clone, Serialize)]
pub struct RetrainingJob {
    pub id: Option<Uuid>,
    pub status: JobStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub evaluation: Option<EvaluationReport>,
    pub curation: Option<CurationSummary>,
    pub model_generation: Option<u64>,
}

impl RetrainingJob {
    fn idle() -> Self {
        Self {
            id: None,
            status: JobStatus::Idle,
            started_at: None,
            finished_at: None,
            error: None,
            evaluation: None,
            curation: None,
            model_generation: None,
        }
    }

    fn running(id: Uuid) -> Self {
        Self {
            id: Some(id),
            status: JobStatus::Running,
            started_at: Some(Utc::now()),
            finished_at: None,
            error: None,
            evaluation: None,
            curation: None,
            model_generation: None,
        }
    }
}

/// Outcome of a retrain trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrainResponse {
    Started { job_id: Uuid },
    AlreadyRunning,
}

/// Clears the in-flight flag when the job ends, however it ends.
pub(crate) struct JobGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for JobGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Enforces the singleton-in-flight invariant and runs accepted jobs on a
/// background task.
pub struct RetrainOrchestrator {
    in_flight: Arc<AtomicBool>,
    last_job: Arc<RwLock<RetrainingJob>>,
}

impl Default for RetrainOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl RetrainOrchestrator {
    pub fn new() -> Self {
        Self {
            in_flight: Arc::new(AtomicBool::new(false)),
            last_job: Arc::new(RwLock::new(RetrainingJob::idle())),
        }
    }

    /// Claims the in-flight slot; `None` when a job is already running.
    pub(crate) fn claim_slot(&self) -> Option<JobGuard> {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| JobGuard {
                flag: Arc::clone(&self.in_flight),
            })
    }

    pub async fn last_job(&self) -> RetrainingJob {
        self.last_job.read().await.clone()
    }

    /// Accepts a retrain request unless a job is already in flight.
    ///
    /// The caller gets an immediate acknowledgment; the pipeline runs on a
    /// blocking worker and hands the finished artifact to `lifecycle`.
    pub async fn request_retrain(
        &self,
        config: PipelineConfig,
        lifecycle: Arc<ModelLifecycle<EcoSortModel>>,
    ) -> RetrainResponse {
        let guard = match self.claim_slot() {
            Some(guard) => guard,
            None => {
                info!("Retrain requested while a job is running; existing job continues");
                return RetrainResponse::AlreadyRunning;
            }
        };

        let job_id = Uuid::new_v4();
        *self.last_job.write().await = RetrainingJob::running(job_id);
        info!("Retraining job {} accepted", job_id);

        let last_job = Arc::clone(&self.last_job);
        tokio::spawn(async move {
            let _guard = guard;
            let result = tokio::task::spawn_blocking(move || run_pipeline(&config)).await;

            let mut job = last_job.write().await;
            job.finished_at = Some(Utc::now());
            match result {
                Ok(Ok(outcome)) => match lifecycle.swap_from(&outcome.artifact_path).await {
                    Ok(generation) => {
                        info!(
                            "Retraining job {} succeeded (generation {}, test accuracy {:.4})",
                            job_id, generation, outcome.evaluation.accuracy
                        );
                        job.status = JobStatus::Succeeded;
                        job.evaluation = Some(outcome.evaluation);
                        job.curation = outcome.curation;
                        job.model_generation = Some(generation);
                    }
                    Err(e) => {
                        error!("Retraining job {} failed at swap: {}", job_id, e);
                        job.status = JobStatus::Failed;
                        job.error = Some(e.to_string());
                    }
                },
                Ok(Err(e)) => {
                    error!("Retraining job {} failed: {}", job_id, e);
                    job.status = JobStatus::Failed;
                    job.error = Some(e.to_string());
                }
                Err(e) => {
                    error!("Retraining job {} panicked: {}", job_id, e);
                    job.status = JobStatus::Failed;
                    job.error = Some(format!("job task aborted: {}", e));
                }
            }
        });

        RetrainResponse::Started { job_id }
    }
}

/// The full retraining pipeline, run synchronously on a blocking worker.
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineOutcome> {
    let mut sources = Vec::new();
    let mut unreadable_sources = Vec::new();
    if config.paths.uploads_dir.exists() {
        let uploads = RawSource::from_directory(&config.paths.uploads_dir)?;
        if !uploads.is_empty() {
            sources.push(uploads);
        }
    }
    for dir in &config.source_dirs {
        // A bad configured source never sinks the whole run; it is logged,
        // counted, and skipped like an unmapped image.
        match RawSource::from_directory(dir) {
            Ok(source) if !source.is_empty() => sources.push(source),
            Ok(_) => {}
            Err(e) => {
                warn!("Skipping unreadable source {}: {}", dir.display(), e);
                unreadable_sources.push(dir.display().to_string());
            }
        }
    }

    let curation = if sources.is_empty() {
        if !config.paths.train_dir.exists() {
            return Err(Error::NoValidSources);
        }
        info!("No raw sources pending; retraining on the existing curated dataset");
        None
    } else {
        let curator = DatasetCurator::new(
            config.curator.clone(),
            &config.paths.train_dir,
            &config.paths.test_dir,
        )?;
        let mut report = curator.curate(&sources)?;
        for name in &unreadable_sources {
            *report.skipped.entry(name.clone()).or_insert(0) += 1;
        }
        Some(report)
    };

    let preprocessor = ImagePreprocessor::default();
    let augmenter = AugmentationPipeline::new(config.augmentation.clone());
    let mut rng = StdRng::seed_from_u64(config.training.seed);

    let mut train_samples = load_split(
        &config.paths.train_dir,
        &preprocessor,
        Some(&augmenter),
        &mut rng,
    )?;
    let test_samples = load_split(&config.paths.test_dir, &preprocessor, None, &mut rng)?;

    if train_samples.is_empty() {
        return Err(Error::Training("curated train split is empty".to_string()));
    }

    // Hold out the tail of a shuffled train split for validation.
    for i in (1..train_samples.len()).rev() {
        let j = rng.gen_range(0..=i);
        train_samples.swap(i, j);
    }
    let val_len = (train_samples.len() as f32 * config.training.validation_split) as usize;
    let val_samples = if val_len > 0 && val_len < train_samples.len() {
        train_samples.split_off(train_samples.len() - val_len)
    } else {
        Vec::new()
    };

    info!(
        "Training on {} samples ({} validation, {} test)",
        train_samples.len(),
        val_samples.len(),
        test_samples.len()
    );

    let mut model = EcoSortModel::new(config.training.clone());
    let history = model.train(&train_samples, &val_samples, config.training.epochs)?;
    let evaluation = model.evaluate(&test_samples)?;
    info!(
        "Evaluation on test split: loss={:.4}, accuracy={:.4}",
        evaluation.loss, evaluation.accuracy
    );

    model.save(&config.paths.model_path)?;
    history.save(&config.paths.metrics_path)?;

    Ok(PipelineOutcome {
        artifact_path: config.paths.model_path.clone(),
        history,
        evaluation,
        curation: curation.as_ref().map(CurationSummary::from),
    })
}

/// Loads every image in a split through the shared base transform,
/// augmenting first when building the train view.
fn load_split(
    split_dir: &std::path::Path,
    preprocessor: &ImagePreprocessor,
    augmenter: Option<&AugmentationPipeline>,
    rng: &mut StdRng,
) -> Result<Vec<Sample>> {
    let mut samples = Vec::new();
    for category in Category::ALL {
        let cell_dir = split_dir.join(category.to_string());
        if !cell_dir.exists() {
            continue;
        }
        for path in scan_images(&cell_dir)? {
            let image = match image::open(&path) {
                Ok(image) => image,
                Err(e) => {
                    warn!("Skipping unreadable image {}: {}", path.display(), e);
                    continue;
                }
            };
            let image = match augmenter {
                Some(augmenter) => augmenter.augment(&image, rng),
                None => image,
            };
            samples.push(Sample::new(preprocessor.preprocess(&image), category));
        }
    }
    Ok(samples)
}
