//! Fan-out/fan-in over every dashboard source

use alerting::{AlertRules, LiveReadings};
use chrono::{DateTime, Utc};
use incident_history::{HistoryAnalyzer, HistorySummary, Incident};
use log_source::{LogSource, SourceError};
use metrics::{counter, histogram};
use sensor_extract::{
    AlcoholExtractor, AlcoholReading, DrowsinessExtractor, DrowsinessReading, Extractor,
    ObdExtractor, ObdReading, SensorReading, Validator, VisibilityExtractor, VisibilityReading,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::AggregatorConfig;
use crate::error::AggregateError;
use crate::snapshot::{ActiveIncident, DashboardSnapshot, SensorStatus, SensorsStatus};

const HISTORY_SOURCE: &str = "history";

/// Builds dashboard snapshots from an injected log source
pub struct Aggregator {
    config: AggregatorConfig,
    source: Arc<dyn LogSource>,
    alcohol: AlcoholExtractor,
    visibility: VisibilityExtractor,
    drowsiness: DrowsinessExtractor,
    obd: ObdExtractor,
    history: HistoryAnalyzer,
    rules: AlertRules,
}

impl Aggregator {
    /// Create an aggregator; fails when `config` is unusable
    pub fn new(config: AggregatorConfig, source: Arc<dyn LogSource>) -> Result<Self, AggregateError> {
        config.validate()?;
        let normalizer = config.normalizer()?;
        let validator = Validator::new(config.validation.clone());

        info!(
            "Creating aggregator (offset {} min, timeout {}s, tail {} lines)",
            config.source_offset_minutes, config.fetch_timeout_secs, config.tail_lines
        );

        Ok(Self {
            alcohol: AlcoholExtractor::new(normalizer),
            visibility: VisibilityExtractor::new(normalizer, validator.clone()),
            drowsiness: DrowsinessExtractor::new(normalizer),
            obd: ObdExtractor::new(normalizer, validator, config.default_coordinates)
                .with_live_window(config.obd_live_window()),
            history: HistoryAnalyzer::new(config.scoring.clone(), normalizer),
            rules: AlertRules::new(config.alerts.clone()),
            config,
            source,
        })
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// The injected log source
    pub fn source(&self) -> &Arc<dyn LogSource> {
        &self.source
    }

    /// Latest alcohol reading
    pub async fn alcohol(&self, now: DateTime<Utc>) -> SensorReading<AlcoholReading> {
        self.read_sensor(&self.alcohol, &self.config.paths.alcohol, now)
            .await
    }

    /// Latest visibility reading
    pub async fn visibility(&self, now: DateTime<Utc>) -> SensorReading<VisibilityReading> {
        self.read_sensor(&self.visibility, &self.config.paths.visibility, now)
            .await
    }

    /// Latest driver state
    pub async fn drowsiness(&self, now: DateTime<Utc>) -> SensorReading<DrowsinessReading> {
        self.read_sensor(&self.drowsiness, &self.config.paths.drowsiness, now)
            .await
    }

    /// Latest OBD/GPS reading
    pub async fn obd(&self, now: DateTime<Utc>) -> SensorReading<ObdReading> {
        self.read_sensor(&self.obd, &self.config.paths.obd, now).await
    }

    /// History summary; neutral when the incident log cannot be read
    pub async fn history(&self, now: DateTime<Utc>) -> HistorySummary {
        self.history_report(now).await.0
    }

    /// History summary together with every parsed incident
    pub async fn history_report(&self, now: DateTime<Utc>) -> (HistorySummary, Vec<Incident>) {
        let path = &self.config.paths.history;
        match self.fetch(path, self.config.history_tail_lines).await {
            Ok(raw) => {
                let incidents = self.history.parse(&raw);
                let summary = if incidents.is_empty() {
                    HistorySummary::neutral()
                } else {
                    self.history.summarize(&incidents, now)
                };
                (summary, incidents)
            }
            Err(e) => {
                record_failure(HISTORY_SOURCE, &e);
                (HistorySummary::neutral(), Vec::new())
            }
        }
    }

    /// Build a complete snapshot; every source is fetched concurrently and
    /// a failing source only replaces its own slice with a fallback
    pub async fn aggregate(&self, now: DateTime<Utc>) -> DashboardSnapshot {
        let started = Instant::now();

        let (alcohol, visibility, drowsiness, obd, (history, _)) = tokio::join!(
            self.alcohol(now),
            self.visibility(now),
            self.drowsiness(now),
            self.obd(now),
            self.history_report(now),
        );

        let readings = LiveReadings {
            alcohol,
            visibility,
            drowsiness,
            obd,
        };
        let snapshot = self.compose(readings, history, now);

        counter!("dashboard_aggregations_total").increment(1);
        histogram!("dashboard_aggregation_seconds").record(started.elapsed().as_secs_f64());
        debug!(
            "Aggregated snapshot: score {:.2}, {} active incident(s)",
            snapshot.driver_score,
            snapshot.active_incidents.len()
        );

        snapshot
    }

    fn compose(
        &self,
        readings: LiveReadings,
        history: HistorySummary,
        now: DateTime<Utc>,
    ) -> DashboardSnapshot {
        let alerts = self
            .rules
            .evaluate(&readings, now, self.config.freshness.alerting());

        let active_incidents: Vec<ActiveIncident> = alerts
            .into_iter()
            .map(ActiveIncident::from)
            .chain(history.recent_incidents.iter().cloned().map(ActiveIncident::from))
            .take(self.config.active_incident_limit)
            .collect();

        let display = self.config.freshness.display();
        let sensors = SensorsStatus {
            alcohol: SensorStatus::of(&readings.alcohol, now, display),
            visibility: SensorStatus::of(&readings.visibility, now, display),
            drowsiness: SensorStatus::of(&readings.drowsiness, now, display),
            obd: SensorStatus::of(&readings.obd, now, display),
        };

        let is_connected = readings.obd.value.is_connected;
        let coordinates = if is_connected {
            readings.obd.value.coordinates
        } else {
            self.obd.default_coordinates()
        };

        DashboardSnapshot {
            alcohol_level: readings.alcohol.value.level,
            visibility_score: readings.visibility.value.score,
            drowsiness_state: readings.drowsiness.value.state,
            speed: readings.obd.value.speed_kmh,
            coordinates,
            is_connected,
            driver_score: history.driver_score,
            total_incidents: history.total_incidents,
            monthly_incidents: history.monthly_incidents,
            recent_incidents: history.windowed_incidents,
            active_incidents,
            historical_incidents: history.recent_incidents,
            sensors,
            alcohol: readings.alcohol,
            visibility: readings.visibility,
            drowsiness: readings.drowsiness,
            obd: readings.obd,
            generated_at: now,
        }
    }

    async fn read_sensor<E>(&self, extractor: &E, path: &str, now: DateTime<Utc>) -> SensorReading<E::Output>
    where
        E: Extractor + Sync,
        E::Output: Send,
    {
        match self.fetch(path, Some(self.config.tail_lines)).await {
            Ok(raw) => extractor.extract(&raw, now),
            Err(e) => {
                record_failure(extractor.name(), &e);
                extractor.fallback_reading()
            }
        }
    }

    /// Fetch a tail (or the whole log) under the per-fetch timeout
    async fn fetch(&self, path: &str, max_lines: Option<usize>) -> Result<String, SourceError> {
        let timeout = self.config.fetch_timeout();
        let read = async {
            match max_lines {
                Some(lines) => self.source.tail(path, lines).await,
                None => self.source.read_all(path).await,
            }
        };

        match tokio::time::timeout(timeout, read).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout {
                path: path.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }
}

fn record_failure(source: &'static str, error: &SourceError) {
    warn!(source, error = %error, "Source fetch failed, using fallback");
    counter!("dashboard_source_failures_total", "source" => source).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::IncidentSource;
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use incident_history::Severity;
    use log_source::MemorySource;
    use sensor_extract::{Coordinates, DriverState};
    use std::time::Duration;

    const HOME: Coordinates = Coordinates { lat: 12.97, lng: 77.59 };

    fn config() -> AggregatorConfig {
        AggregatorConfig {
            source_offset_minutes: 0,
            default_coordinates: HOME,
            ..Default::default()
        }
    }

    fn at(now: DateTime<Utc>, age_secs: i64) -> String {
        (now - ChronoDuration::seconds(age_secs))
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }

    fn obd_row(now: DateTime<Utc>, age_secs: i64, speed: &str) -> String {
        let mut cols = vec!["-".to_string(); 30];
        cols[1] = at(now, age_secs);
        cols[2] = "77.2".to_string();
        cols[3] = "28.6".to_string();
        cols[29] = speed.to_string();
        cols.join(",")
    }

    /// Logs of a healthy drive: nothing alarming, empty history
    fn nominal_source(now: DateTime<Utc>) -> MemorySource {
        let paths = config().paths;
        let captured = at(now, 5);
        let (date, time) = captured.split_at(10);
        MemorySource::new()
            .with_log(
                &paths.alcohol,
                &format!("{},\"MQ3 Sensor Value: 90\"", captured),
            )
            .with_log(
                &paths.visibility,
                &format!("{},{},clear,82.2", date, time.trim()),
            )
            .with_log(
                &paths.drowsiness,
                &format!("1,{},0.3,0.3,10,0.4,Driver is Awake", captured),
            )
            .with_log(&paths.obd, &obd_row(now, 5, "45"))
            .with_log(&paths.history, "")
    }

    fn aggregator(source: MemorySource) -> Aggregator {
        Aggregator::new(config(), Arc::new(source)).unwrap()
    }

    #[tokio::test]
    async fn test_nominal_snapshot() {
        let now = Utc::now();
        let snapshot = aggregator(nominal_source(now)).aggregate(now).await;

        assert_eq!(snapshot.alcohol.value.raw_level, 90);
        assert_eq!(snapshot.alcohol_level, 0.5);
        assert_eq!(snapshot.visibility_score, 82);
        assert_eq!(snapshot.drowsiness_state, DriverState::Awake);
        assert_eq!(snapshot.speed, 45.0);
        assert!(snapshot.is_connected);
        assert_eq!(snapshot.coordinates, Coordinates { lat: 28.6, lng: 77.2 });
        assert_eq!(snapshot.driver_score, 100.0);
        assert_eq!(snapshot.total_incidents, 0);
        assert!(snapshot.active_incidents.is_empty());
        assert!(snapshot.sensors.alcohol.online);
        assert!(snapshot.sensors.obd.online);
        assert_eq!(snapshot.sensors.visibility.age_ms, Some(5_000));
        assert_eq!(snapshot.generated_at, now);
    }

    #[tokio::test]
    async fn test_stale_obd_uses_default_location_and_no_alert() {
        let now = Utc::now();
        let source = nominal_source(now);
        source.set_log(&config().paths.obd, &obd_row(now, 120, "150"));
        let snapshot = aggregator(source).aggregate(now).await;

        assert!(!snapshot.is_connected);
        assert_eq!(snapshot.coordinates, HOME);
        assert_eq!(snapshot.speed, 150.0);
        assert!(!snapshot.sensors.obd.online);
        assert!(snapshot.active_incidents.is_empty());
    }

    #[tokio::test]
    async fn test_single_source_failure_is_isolated() {
        let now = Utc::now();
        let source = nominal_source(now);
        source.fail_path(&config().paths.visibility);
        let snapshot = aggregator(source).aggregate(now).await;

        assert!(!snapshot.visibility.is_valid);
        assert_eq!(snapshot.visibility_score, 0);
        assert!(!snapshot.sensors.visibility.online);
        // fallback readings are never fresh enough to alert
        assert!(snapshot.active_incidents.is_empty());

        assert!(snapshot.alcohol.is_valid);
        assert!(snapshot.drowsiness.is_valid);
        assert!(snapshot.is_connected);
    }

    #[tokio::test]
    async fn test_history_failure_is_isolated() {
        let now = Utc::now();
        let source = nominal_source(now);
        let paths = config().paths;
        source.set_log(&paths.history, &format!("{},Harsh Braking,High,NH48,Sudden stop", at(now, 3600)));
        source.fail_path(&paths.history);
        let snapshot = aggregator(source).aggregate(now).await;

        assert_eq!(snapshot.driver_score, 100.0);
        assert_eq!(snapshot.total_incidents, 0);
        assert!(snapshot.historical_incidents.is_empty());

        assert!(snapshot.alcohol.is_valid);
        assert!(snapshot.visibility.is_valid);
        assert!(snapshot.drowsiness.is_valid);
        assert!(snapshot.obd.is_valid);
        assert!(snapshot.is_connected);
    }

    #[tokio::test]
    async fn test_obd_failure_is_isolated() {
        let now = Utc::now();
        let source = nominal_source(now);
        source.fail_path(&config().paths.obd);
        let snapshot = aggregator(source).aggregate(now).await;

        assert!(!snapshot.obd.is_valid);
        assert!(!snapshot.is_connected);
        assert_eq!(snapshot.speed, 0.0);
        assert_eq!(snapshot.coordinates, HOME);
        assert!(!snapshot.sensors.obd.online);

        assert!(snapshot.alcohol.is_valid);
        assert!(snapshot.visibility.is_valid);
        assert!(snapshot.drowsiness.is_valid);
        assert_eq!(snapshot.visibility_score, 82);
        assert_eq!(snapshot.driver_score, 100.0);
    }

    #[tokio::test]
    async fn test_total_failure_still_yields_snapshot() {
        let now = Utc::now();
        let snapshot = aggregator(MemorySource::new()).aggregate(now).await;

        assert!(!snapshot.alcohol.is_valid);
        assert!(!snapshot.visibility.is_valid);
        assert!(!snapshot.drowsiness.is_valid);
        assert!(!snapshot.obd.is_valid);
        assert_eq!(snapshot.drowsiness_state, DriverState::Unknown);
        assert_eq!(snapshot.coordinates, HOME);
        assert_eq!(snapshot.driver_score, 100.0);
        assert!(snapshot.active_incidents.is_empty());
    }

    #[tokio::test]
    async fn test_live_alerts_precede_history() {
        let now = Utc::now();
        let source = nominal_source(now);
        let paths = config().paths;
        source.set_log(&paths.obd, &obd_row(now, 2, "140"));
        let history: String = (1..=5)
            .map(|h| format!("{},Harsh Braking,High,NH48,Sudden stop\n", at(now, h * 3600)))
            .collect();
        source.set_log(&paths.history, &format!("datetime,type,severity,location,description\n{}", history));

        let snapshot = aggregator(source).aggregate(now).await;

        assert_eq!(snapshot.active_incidents.len(), 4);
        let first = &snapshot.active_incidents[0];
        assert_eq!(first.kind, "High Speed");
        assert_eq!(first.severity, Severity::High);
        assert_eq!(first.source, IncidentSource::Live);
        assert_eq!(first.id, format!("speed-{}", now.timestamp_millis()));
        assert!(snapshot.active_incidents[1..]
            .iter()
            .all(|i| i.source == IncidentSource::History));
        assert!(snapshot.active_incidents[1].time > snapshot.active_incidents[2].time);

        assert_eq!(snapshot.total_incidents, 5);
        assert_eq!(snapshot.recent_incidents, 5);
        assert!((snapshot.driver_score - (100.0 - 5.0 * 0.15 / 2.0)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_history_report_lists_all_incidents() {
        let now = Utc::now();
        let source = nominal_source(now);
        let rows = format!(
            "{},Overspeed,Medium,Ring Road,Over limit\nnot-a-date,Bad,High,X,Y\n{},Drowsy,Low,NH8,Yawning",
            at(now, 100 * 3600),
            at(now, 60)
        );
        source.set_log(&config().paths.history, &rows);

        let (summary, incidents) = aggregator(source).history_report(now).await;
        assert_eq!(incidents.len(), 2);
        assert_eq!(summary.total_incidents, 2);
        assert_eq!(summary.windowed_incidents, 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = AggregatorConfig {
            fetch_timeout_secs: 0,
            ..Default::default()
        };
        let result = Aggregator::new(config, Arc::new(MemorySource::new()));
        assert!(matches!(result, Err(AggregateError::InvalidConfig(_))));
    }

    #[test]
    fn test_oversized_window_is_rejected() {
        let mut config = config();
        config.scoring.window_hours = u32::MAX;
        let result = Aggregator::new(config, Arc::new(MemorySource::new()));
        assert!(matches!(result, Err(AggregateError::InvalidConfig(_))));
    }

    /// Source whose fetches never finish in time
    struct StalledSource;

    #[async_trait]
    impl LogSource for StalledSource {
        async fn open(&self) -> Result<(), SourceError> {
            Ok(())
        }

        async fn tail(&self, _path: &str, _max_lines: usize) -> Result<String, SourceError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(String::new())
        }

        async fn read_all(&self, path: &str) -> Result<String, SourceError> {
            self.tail(path, 0).await
        }

        async fn append_line(&self, _path: &str, _line: &str) -> Result<(), SourceError> {
            Ok(())
        }

        async fn close(&self) {}

        fn is_open(&self) -> bool {
            true
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_timeout_falls_back() {
        let now = Utc::now();
        let aggregator = Aggregator::new(config(), Arc::new(StalledSource)).unwrap();
        let snapshot = aggregator.aggregate(now).await;

        assert!(!snapshot.obd.is_valid);
        assert_eq!(snapshot.driver_score, 100.0);
    }
}
