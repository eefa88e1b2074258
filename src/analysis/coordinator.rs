//! Parallel fan-out of closest-approach scans over a debris catalog
//!
//! Every debris object gets its own scan task with its own copies of the
//! element sets. Tasks run on a bounded worker pool and report back over a
//! channel; the only synchronization is waiting for the pool to drain. A
//! failed or panicking task is recorded and left out of the ranking.

use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;

use indicatif::ProgressBar;

use super::classifier::RiskClassifier;
use super::report::{rank, AssessmentReport, ClosestApproachResult, ScanFailure};
use super::scanner::{scan, ClosestApproach, ScanPlan};
use crate::config::AssessmentConfig;
use crate::data::{as_satellite, ElementLookup, OrbitalElements};
use crate::error::{AssessmentError, ConfigError};
use crate::propagation::{OrbitTrack, PositionProvider};

/// Message sent from a scan task back to the coordinator
struct TaskOutcome {
    index: usize,
    debris_id: String,
    outcome: Result<ClosestApproach, String>,
}

pub struct AssessmentCoordinator<P> {
    provider: P,
    classifier: RiskClassifier,
    worker_limit: usize,
    progress: Option<ProgressBar>,
}

impl<P: PositionProvider> AssessmentCoordinator<P> {
    pub fn new(provider: P, config: &AssessmentConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            provider,
            classifier: RiskClassifier::new(&config.risk)?,
            worker_limit: config.worker_limit,
            progress: None,
        })
    }

    /// Tick a progress bar once per finished scan task
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Scan every debris object against the satellite and rank the results
    pub fn assess(
        &self,
        satellite: &OrbitalElements,
        debris: &[OrbitalElements],
        plan: &ScanPlan,
    ) -> Result<AssessmentReport, AssessmentError> {
        self.check_satellite(satellite, plan)?;

        log::info!(
            "Assessing {} debris objects against {} ({} samples each, {} workers)",
            debris.len(),
            satellite.object_id,
            plan.sample_count(),
            self.worker_limit
        );

        let (results, failures) = self.scan_all(satellite, debris, plan)?;
        Ok(self.build_report(satellite, plan, debris.len(), results, failures))
    }

    /// Two-tier search: coarse pass over the whole catalog, then a re-scan
    /// of the top-k survivors over the same window at `fine_step_seconds`.
    pub fn assess_refined(
        &self,
        satellite: &OrbitalElements,
        debris: &[OrbitalElements],
        coarse_plan: &ScanPlan,
        fine_step_seconds: f64,
    ) -> Result<AssessmentReport, AssessmentError> {
        let fine_plan = coarse_plan.with_step(fine_step_seconds)?;
        let coarse = self.assess(satellite, debris, coarse_plan)?;

        // Survivors stay in input order so fine-pass ties break the same way
        let kept: HashSet<&str> = coarse
            .results
            .iter()
            .map(|result| result.debris_id.as_str())
            .collect();
        let survivors: Vec<OrbitalElements> = debris
            .iter()
            .filter(|elements| kept.contains(elements.object_id.as_str()))
            .cloned()
            .collect();

        log::info!(
            "Refining {} of {} debris objects at {} s",
            survivors.len(),
            debris.len(),
            fine_plan.step_seconds()
        );

        let (results, fine_failures) = self.scan_all(satellite, &survivors, &fine_plan)?;
        let mut failures = coarse.failures;
        failures.extend(fine_failures);

        Ok(self.build_report(satellite, &fine_plan, debris.len(), results, failures))
    }

    /// Resolve the satellite and the debris catalog, then assess.
    ///
    /// Lookup failures are fatal and surface before any scan starts. With
    /// `fine_step_seconds` set the two-tier search is used.
    pub fn assess_catalog<L: ElementLookup + ?Sized>(
        &self,
        lookup: &L,
        satellite_id: &str,
        plan: &ScanPlan,
        fine_step_seconds: Option<f64>,
    ) -> Result<AssessmentReport, AssessmentError> {
        let satellite = as_satellite(lookup.get_elements(satellite_id)?);

        let debris = lookup
            .list_debris()
            .into_iter()
            .filter(|id| *id != satellite.object_id)
            .map(|id| lookup.get_elements(&id))
            .collect::<Result<Vec<_>, _>>()?;

        match fine_step_seconds {
            Some(step) => self.assess_refined(&satellite, &debris, plan, step),
            None => self.assess(&satellite, &debris, plan),
        }
    }

    /// A satellite that cannot be propagated would fail every task
    fn check_satellite(
        &self,
        satellite: &OrbitalElements,
        plan: &ScanPlan,
    ) -> Result<(), AssessmentError> {
        let mut track = self.provider.track(satellite)?;
        track.position_at(&plan.start())?;
        Ok(())
    }

    /// Run one task per debris object; results and failures come back in
    /// input order.
    fn scan_all(
        &self,
        satellite: &OrbitalElements,
        debris: &[OrbitalElements],
        plan: &ScanPlan,
    ) -> Result<(Vec<ClosestApproachResult>, Vec<ScanFailure>), ConfigError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.worker_limit)
            .thread_name(|index| format!("scan-worker-{}", index))
            .build()
            .map_err(|e| ConfigError::WorkerPool(e.to_string()))?;

        if let Some(progress) = &self.progress {
            progress.inc_length(debris.len() as u64);
        }

        let (sender, receiver) = mpsc::channel::<TaskOutcome>();
        let provider = &self.provider;
        let progress = self.progress.as_ref();

        pool.scope(|scope| {
            for (index, debris) in debris.iter().enumerate() {
                let sender = sender.clone();
                let satellite = satellite.clone();
                let debris = debris.clone();
                let plan = *plan;

                scope.spawn(move |_| {
                    let outcome = match panic::catch_unwind(AssertUnwindSafe(|| {
                        scan(provider, &satellite, &debris, &plan)
                    })) {
                        Ok(Ok(approach)) => Ok(approach),
                        Ok(Err(e)) => Err(e.to_string()),
                        Err(payload) => Err(format!(
                            "scan task panicked: {}",
                            panic_message(payload.as_ref())
                        )),
                    };

                    if let Some(progress) = progress {
                        progress.inc(1);
                    }

                    // The receiver outlives the scope, so this cannot fail
                    let _ = sender.send(TaskOutcome {
                        index,
                        debris_id: debris.object_id,
                        outcome,
                    });
                });
            }
        });
        drop(sender);

        let mut outcomes: Vec<TaskOutcome> = receiver.into_iter().collect();
        outcomes.sort_by_key(|outcome| outcome.index);

        let mut results = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for TaskOutcome {
            debris_id, outcome, ..
        } in outcomes
        {
            match outcome {
                Ok(approach) => {
                    results.push(ClosestApproachResult::classify(approach, &self.classifier));
                }
                Err(reason) => {
                    log::warn!("Skipping debris {}: {}", debris_id, reason);
                    failures.push(ScanFailure { debris_id, reason });
                }
            }
        }

        Ok((results, failures))
    }

    fn build_report(
        &self,
        satellite: &OrbitalElements,
        plan: &ScanPlan,
        debris_scanned: usize,
        mut results: Vec<ClosestApproachResult>,
        failures: Vec<ScanFailure>,
    ) -> AssessmentReport {
        let succeeded = results.len();
        rank(&mut results);

        log::info!(
            "Assessment of {} done: {} scanned, {} failed, {} ranked",
            satellite.object_id,
            succeeded,
            failures.len(),
            results.len()
        );

        AssessmentReport {
            satellite_id: satellite.object_id.clone(),
            window_start: plan.start(),
            window_seconds: plan.duration_seconds(),
            step_seconds: plan.step_seconds(),
            debris_scanned,
            results,
            failures,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::testing::{
        after_iss_epoch, epoch, CircularOrbit, CircularOrbitProvider, HIGH_DRAG_ISS_LINE1,
        ISS_LINE1, ISS_LINE2,
    };
    use crate::analysis::RiskLevel;
    use crate::config::TOP_K;
    use crate::data::{ObjectCatalog, ObjectRole, SpaceObject, SpaceObjectDatabase, TleData};
    use crate::error::PropagationError;
    use crate::propagation::{PositionSample, Sgp4Provider};
    use nalgebra::Vector3;
    use satkit::Instant;
    use std::collections::HashMap;
    use std::f64::consts::TAU;

    const LEO_RADIUS_KM: f64 = 6771.0;

    fn config(workers: usize) -> AssessmentConfig {
        AssessmentConfig {
            worker_limit: workers,
            ..AssessmentConfig::default()
        }
    }

    fn plan() -> ScanPlan {
        ScanPlan::new(epoch(), 3600.0, 60.0).unwrap()
    }

    /// Debris `d{i}` trails the satellite on its own orbit by a growing phase
    fn trailing_catalog(count: usize) -> (CircularOrbitProvider, Vec<OrbitalElements>) {
        let mut provider = CircularOrbitProvider::new()
            .with_orbit("sat", CircularOrbit::equatorial(LEO_RADIUS_KM, 0.0));
        let mut debris = Vec::new();
        for i in 0..count {
            let id = format!("d{}", i);
            let phase = (count - i) as f64 * 1e-4;
            provider = provider.with_orbit(&id, CircularOrbit::equatorial(LEO_RADIUS_KM, phase));
            debris.push(provider.elements(&id));
        }
        (provider, debris)
    }

    fn ids(report: &AssessmentReport) -> Vec<&str> {
        report.results.iter().map(|r| r.debris_id.as_str()).collect()
    }

    /// Debris sitting on the x axis at one distance on whole minutes and
    /// another in between; the satellite stays at the origin
    #[derive(Default)]
    struct SteppedProvider {
        distances: HashMap<String, (f64, f64)>,
    }

    impl SteppedProvider {
        fn with_debris(mut self, id: &str, on_minute_km: f64, between_km: f64) -> Self {
            self.distances
                .insert(id.to_string(), (on_minute_km, between_km));
            self
        }
    }

    struct SteppedTrack {
        on_minute_km: f64,
        between_km: f64,
    }

    impl PositionProvider for SteppedProvider {
        type Track = SteppedTrack;

        fn track(&self, elements: &OrbitalElements) -> Result<SteppedTrack, PropagationError> {
            let (on_minute_km, between_km) = self
                .distances
                .get(&elements.object_id)
                .copied()
                .unwrap_or((0.0, 0.0));
            Ok(SteppedTrack {
                on_minute_km,
                between_km,
            })
        }
    }

    impl OrbitTrack for SteppedTrack {
        fn position_at(&mut self, time: &Instant) -> Result<PositionSample, PropagationError> {
            let seconds = (*time - epoch()).as_seconds().round() as i64;
            let x = if seconds % 60 == 0 {
                self.on_minute_km
            } else {
                self.between_km
            };
            Ok(PositionSample {
                position_km: Vector3::new(x, 0.0, 0.0),
                time: *time,
            })
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let provider = CircularOrbitProvider::new();
        assert!(matches!(
            AssessmentCoordinator::new(provider, &config(0)),
            Err(ConfigError::InvalidWorkerLimit)
        ));
    }

    #[test]
    fn test_output_is_sorted_and_truncated_to_top_k() {
        let (provider, debris) = trailing_catalog(60);
        let coordinator = AssessmentCoordinator::new(provider, &config(4)).unwrap();

        let report = coordinator
            .assess(&coordinator.provider.elements("sat"), &debris, &plan())
            .unwrap();

        assert_eq!(report.len(), 50);
        assert_eq!(report.debris_scanned, 60);
        assert!(report.failures.is_empty());
        assert!(report
            .results
            .windows(2)
            .all(|w| w[0].closest_approach_distance <= w[1].closest_approach_distance));
        // Smallest phase offset belongs to the last debris object
        assert_eq!(report.results[0].debris_id, "d59");
    }

    #[test]
    fn test_length_is_successes_when_below_top_k() {
        let (provider, debris) = trailing_catalog(7);
        let coordinator = AssessmentCoordinator::new(provider, &config(3)).unwrap();
        let report = coordinator
            .assess(&coordinator.provider.elements("sat"), &debris, &plan())
            .unwrap();
        assert_eq!(report.len(), 7);
    }

    #[test]
    fn test_ties_keep_input_order_regardless_of_workers() {
        // Five debris objects sharing one orbit are all equally far away
        let names = ["zeta", "alpha", "mid", "beta", "omega"];
        let tied_provider = || {
            names.iter().fold(
                CircularOrbitProvider::new()
                    .with_orbit("sat", CircularOrbit::equatorial(LEO_RADIUS_KM, 0.0)),
                |provider, name| {
                    provider.with_orbit(name, CircularOrbit::equatorial(LEO_RADIUS_KM, 0.5))
                },
            )
        };

        for workers in [1, 2, 8] {
            let coordinator = AssessmentCoordinator::new(tied_provider(), &config(workers)).unwrap();
            let debris: Vec<_> = names
                .iter()
                .map(|name| coordinator.provider.elements(name))
                .collect();

            let report = coordinator
                .assess(&coordinator.provider.elements("sat"), &debris, &plan())
                .unwrap();
            assert_eq!(ids(&report), names.to_vec());
        }
    }

    #[test]
    fn test_failed_debris_is_omitted() {
        let (provider, mut debris) = trailing_catalog(5);
        let provider = provider.with_failing("broken");
        debris.insert(2, provider.elements("broken"));

        let coordinator = AssessmentCoordinator::new(provider, &config(2)).unwrap();
        let report = coordinator
            .assess(&coordinator.provider.elements("sat"), &debris, &plan())
            .unwrap();

        assert_eq!(report.debris_scanned, 6);
        assert_eq!(report.len(), 5);
        assert!(!ids(&report).contains(&"broken"));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].debris_id, "broken");
    }

    #[test]
    fn test_panicking_task_is_isolated() {
        let (provider, mut debris) = trailing_catalog(3);
        let provider = provider
            .with_orbit("boom", CircularOrbit::equatorial(LEO_RADIUS_KM, 1.0))
            .with_panicking("boom");
        debris.push(provider.elements("boom"));

        let coordinator = AssessmentCoordinator::new(provider, &config(2)).unwrap();
        let report = coordinator
            .assess(&coordinator.provider.elements("sat"), &debris, &plan())
            .unwrap();

        assert_eq!(report.len(), 3);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].reason.contains("panicked"));
    }

    #[test]
    fn test_unpropagatable_satellite_is_fatal() {
        let (provider, debris) = trailing_catalog(3);
        let provider = provider.with_failing("sat");
        let coordinator = AssessmentCoordinator::new(provider, &config(2)).unwrap();

        let result = coordinator.assess(&coordinator.provider.elements("sat"), &debris, &plan());
        assert!(matches!(result, Err(AssessmentError::Propagation(_))));
    }

    #[test]
    fn test_refined_pass_never_increases_distance() {
        let sat = CircularOrbit::equatorial(LEO_RADIUS_KM, 0.0);
        let mut provider = CircularOrbitProvider::new().with_orbit("sat", sat);
        let mut debris = Vec::new();
        for i in 0..8 {
            let id = format!("x{}", i);
            provider = provider.with_orbit(
                &id,
                CircularOrbit {
                    radius_km: LEO_RADIUS_KM + i as f64,
                    angular_rate_rad_s: sat.angular_rate_rad_s * (1.0 + 0.01 * i as f64),
                    phase_rad: TAU * i as f64 / 8.0,
                    inclination_rad: 0.3 * i as f64,
                },
            );
            debris.push(provider.elements(&id));
        }
        let coordinator = AssessmentCoordinator::new(provider, &config(4)).unwrap();
        let satellite = coordinator.provider.elements("sat");

        let coarse = coordinator.assess(&satellite, &debris, &plan()).unwrap();
        let fine = coordinator
            .assess_refined(&satellite, &debris, &plan(), 1.0)
            .unwrap();

        assert_eq!(fine.step_seconds, 1.0);
        assert_eq!(fine.len(), coarse.len());
        for result in &fine.results {
            let coarse_result = coarse
                .results
                .iter()
                .find(|r| r.debris_id == result.debris_id)
                .unwrap();
            assert!(result.closest_approach_distance <= coarse_result.closest_approach_distance);
        }
    }

    #[test]
    fn test_refined_rejects_bad_fine_step() {
        let (provider, debris) = trailing_catalog(2);
        let coordinator = AssessmentCoordinator::new(provider, &config(2)).unwrap();
        let result = coordinator.assess_refined(
            &coordinator.provider.elements("sat"),
            &debris,
            &plan(),
            0.0,
        );
        assert!(matches!(
            result,
            Err(AssessmentError::Configuration(ConfigError::InvalidTimeStep(_)))
        ));
    }

    #[test]
    fn test_near_miss_is_critical() {
        let provider = CircularOrbitProvider::new()
            .with_orbit("sat", CircularOrbit::equatorial(LEO_RADIUS_KM, 0.0))
            .with_orbit("close", CircularOrbit::equatorial(LEO_RADIUS_KM + 0.5, 0.0))
            .with_orbit("far", CircularOrbit::equatorial(LEO_RADIUS_KM, 1.0));
        let debris = vec![provider.elements("far"), provider.elements("close")];
        let coordinator = AssessmentCoordinator::new(provider, &config(2)).unwrap();

        let report = coordinator
            .assess(&coordinator.provider.elements("sat"), &debris, &plan())
            .unwrap();
        assert_eq!(report.results[0].debris_id, "close");
        assert_eq!(report.results[0].risk_level, RiskLevel::Critical);
        assert_eq!(report.results[1].risk_level, RiskLevel::Low);
    }

    fn object(id: u32, object_type: &str) -> SpaceObject {
        SpaceObject {
            norad_cat_id: id,
            cospar_id: None,
            name: None,
            object_type: Some(object_type.to_string()),
            country: None,
            decay_date: None,
            tle: Some(TleData {
                epoch: String::new(),
                line1: String::new(),
                line2: String::new(),
            }),
        }
    }

    #[test]
    fn test_assess_catalog_unknown_satellite_is_not_found() {
        let catalog = ObjectCatalog::new(SpaceObjectDatabase::default());
        let coordinator =
            AssessmentCoordinator::new(CircularOrbitProvider::new(), &config(2)).unwrap();

        let result = coordinator.assess_catalog(&catalog, "25544", &plan(), None);
        assert!(matches!(result, Err(AssessmentError::NotFound(id)) if id == "25544"));
    }

    #[test]
    fn test_assess_catalog_resolves_debris() {
        let mut objects = HashMap::new();
        for obj in [object(1, "PAYLOAD"), object(2, "DEBRIS"), object(3, "DEBRIS")] {
            objects.insert(obj.norad_cat_id.to_string(), obj);
        }
        let catalog = ObjectCatalog::new(SpaceObjectDatabase {
            generated_at: String::new(),
            objects,
        });

        let provider = CircularOrbitProvider::new()
            .with_orbit("1", CircularOrbit::equatorial(LEO_RADIUS_KM, 0.0))
            .with_orbit("2", CircularOrbit::equatorial(LEO_RADIUS_KM, 2.0))
            .with_orbit("3", CircularOrbit::equatorial(LEO_RADIUS_KM, 0.001));
        let coordinator = AssessmentCoordinator::new(provider, &config(2)).unwrap();

        let report = coordinator
            .assess_catalog(&catalog, "1", &plan(), Some(30.0))
            .unwrap();
        assert_eq!(report.satellite_id, "1");
        assert_eq!(ids(&report), vec!["3", "2"]);
        assert_eq!(report.step_seconds, 30.0);
    }

    #[test]
    fn test_refined_ties_follow_input_order() {
        let provider = SteppedProvider::default()
            .with_debris("a", 10.0, 5.0)
            .with_debris("b", 7.0, 5.0);
        let debris = vec![
            OrbitalElements::new("a", ObjectRole::Debris, "", ""),
            OrbitalElements::new("b", ObjectRole::Debris, "", ""),
        ];
        let satellite = OrbitalElements::new("sat", ObjectRole::Satellite, "", "");
        let coordinator = AssessmentCoordinator::new(provider, &config(2)).unwrap();

        let coarse = coordinator.assess(&satellite, &debris, &plan()).unwrap();
        assert_eq!(ids(&coarse), vec!["b", "a"]);

        let fine = coordinator
            .assess_refined(&satellite, &debris, &plan(), 1.0)
            .unwrap();
        assert_eq!(ids(&fine), vec!["a", "b"]);
        assert!(fine
            .results
            .iter()
            .all(|r| r.closest_approach_distance == 5.0));
    }

    #[test]
    fn test_config_file_cannot_raise_result_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orbitrisk.toml");
        std::fs::write(&path, "top_k = 500\nworker_limit = 4\n").unwrap();
        let config = AssessmentConfig::from_toml_file(&path).unwrap();

        let (provider, debris) = trailing_catalog(80);
        let coordinator = AssessmentCoordinator::new(provider, &config).unwrap();
        let report = coordinator
            .assess(&coordinator.provider.elements("sat"), &debris, &plan())
            .unwrap();

        assert_eq!(report.debris_scanned, 80);
        assert_eq!(report.len(), TOP_K);
    }

    #[test]
    fn test_sgp4_decayed_debris_is_left_out() {
        let satellite = OrbitalElements::new("25544", ObjectRole::Satellite, ISS_LINE1, ISS_LINE2);
        let debris = vec![
            OrbitalElements::new("40001", ObjectRole::Debris, HIGH_DRAG_ISS_LINE1, ISS_LINE2),
            OrbitalElements::new("40002", ObjectRole::Debris, ISS_LINE1, ISS_LINE2),
        ];
        let plan = ScanPlan::new(after_iss_epoch(10.0), 3600.0, 60.0).unwrap();
        let coordinator = AssessmentCoordinator::new(Sgp4Provider::new(), &config(2)).unwrap();

        let report = coordinator.assess(&satellite, &debris, &plan).unwrap();

        assert_eq!(report.debris_scanned, 2);
        assert_eq!(ids(&report), vec!["40002"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].debris_id, "40001");
        assert!(report.failures[0].reason.contains("SGP4"));
    }
}
