//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 参考配置 (63 维布局) 校验
//! - Mock 原始日志 → 重采样 → 帧对齐 的端到端测试
//! - 批处理失败隔离与原子输出

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{ChannelOrder, FeatureLayout};

    const REFERENCE_CONFIG: &str = include_str!("../../../config/cmu_mmac.toml");

    #[test]
    fn test_reference_config_is_63_wide() {
        let blueprint = ConfigLoader::load_from_str(REFERENCE_CONFIG, ConfigFormat::Toml)
            .expect("reference config must load");
        assert_eq!(blueprint.devices.len(), 8);

        let layout = FeatureLayout::new(&blueprint.devices, blueprint.general.channel_order);
        assert_eq!(layout.dimension(), 63);
        assert_eq!(layout.dimension(), blueprint.general.feature_dimension);

        // Channel-major: the same quantity of every device is adjacent
        let labels = layout.labels();
        assert_eq!(labels[0], "3dmgx1_2794_accel_x");
        assert_eq!(labels[1], "3dmgx1_2795_accel_x");
        assert_eq!(labels[7], "6dofv4_waist_accel_x");
        assert_eq!(labels[62], "3dmgx1_3337_mag_z");
    }

    #[test]
    fn test_reference_config_device_major() {
        let blueprint =
            ConfigLoader::load_from_str(REFERENCE_CONFIG, ConfigFormat::Toml).unwrap();
        let layout = FeatureLayout::new(&blueprint.devices, ChannelOrder::DeviceMajor);
        let labels = layout.labels();
        assert_eq!(labels.len(), 63);
        assert_eq!(labels[8], "3dmgx1_2794_mag_z");
        assert_eq!(labels[45], "6dofv4_left_arm_accel_x");
    }

    /// 3DMGX1 日志：设备行 + 列名行，按列名取 SysTime 与通道
    #[test]
    fn test_reference_config_reads_cmu_log() {
        let blueprint =
            ConfigLoader::load_from_str(REFERENCE_CONFIG, ConfigFormat::Toml).unwrap();
        let device = blueprint.device("3dmgx1_2794").unwrap();

        let header = "Count\tSysTime\tTicks\tAccel_X\tAccel_Y\tAccel_Z\t\
                      Gyro_X\tGyro_Y\tGyro_Z\tMag_X\tMag_Y\tMag_Z";
        let row = |count: u32, time: &str| {
            format!("{count}\t{time}\t{count}0\t0.1\t0.2\t0.3\t1.1\t1.2\t1.3\t2.1\t2.2\t2.3\n")
        };
        let log = format!(
            "3DMGX1 2794\n{header}\n{}{}",
            row(1, "16_30_49_0000000"),
            row(2, "16_30_49_0100000"),
        );

        let readings = ingestion::parse_raw_log(
            std::io::Cursor::new(log),
            std::path::Path::new("2794_01-30_16_30_49-time.txt"),
            device,
            blueprint.general.timestamp_format,
        )
        .unwrap();
        assert_eq!(readings.len(), 2);
        assert_eq!(
            readings[0].values,
            vec![0.1, 0.2, 0.3, 1.1, 1.2, 1.3, 2.1, 2.2, 2.3]
        );
        let dt = readings[1].timestamp - readings[0].timestamp;
        assert!((dt - 0.01).abs() < 1e-9, "got {dt}");
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::{Path, PathBuf};

    use config_loader::ConfigLoader;
    use contracts::{
        ConfigVersion, ContractError, DeviceConfig, GeneralConfig, PathsConfig,
        PipelineBlueprint, SessionConfig,
    };
    use ingestion::{read_resampled_series, MockSensorConfig, MockSensorSource};
    use pipeline::{
        BatchMode, BatchReport, Orchestrator, OrchestratorConfig, PipelineContext, SinkKind,
    };
    use tempfile::TempDir;

    const RATE: f64 = 30.0;

    /// Two 3-axis devices recorded at different native rates
    fn devices() -> Vec<DeviceConfig> {
        let axes = || vec!["x".to_string(), "y".to_string(), "z".to_string()];
        vec![
            DeviceConfig {
                id: "left_arm".into(),
                channels: axes(),
                header_lines: 1,
                timestamp_column: None,
                source_columns: None,
            },
            DeviceConfig {
                id: "right_arm".into(),
                channels: axes(),
                header_lines: 1,
                timestamp_column: None,
                source_columns: None,
            },
        ]
    }

    /// Workspace with raw logs, frame files and a TOML config on disk
    struct Fixture {
        dir: TempDir,
        config_path: PathBuf,
    }

    impl Fixture {
        fn new(sessions: &[&str]) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let root = dir.path();

            let blueprint = PipelineBlueprint {
                version: ConfigVersion::V1,
                general: GeneralConfig {
                    sample_rate_hz: RATE,
                    feature_dimension: 6,
                    ..Default::default()
                },
                paths: PathsConfig {
                    raw_root: root.join("raw"),
                    frames_root: root.join("frames"),
                    resampled_dir: root.join("out/resampled"),
                    features_dir: root.join("out/features"),
                },
                devices: devices(),
                sessions: sessions
                    .iter()
                    .map(|id| SessionConfig {
                        id: (*id).into(),
                        frames: format!("{id}.frames").into(),
                        anchor: None,
                        frames_header_lines: 0,
                        devices: BTreeMap::from([
                            ("left_arm".into(), format!("{id}/left_arm.txt").into()),
                            ("right_arm".into(), format!("{id}/right_arm.txt").into()),
                        ]),
                    })
                    .collect(),
            };

            for (i, id) in sessions.iter().enumerate() {
                mock(148.0, i as u64)
                    .write_to(&root.join(format!("raw/{id}/left_arm.txt")), Some("time x y z"))
                    .unwrap();
                mock(125.0, 100 + i as u64)
                    .write_to(&root.join(format!("raw/{id}/right_arm.txt")), Some("time x y z"))
                    .unwrap();
                write_frames(&root.join(format!("frames/{id}.frames")), 300);
            }

            let config_path = root.join("egosync.toml");
            fs::write(&config_path, ConfigLoader::to_toml(&blueprint).unwrap()).unwrap();
            Self { dir, config_path }
        }

        fn root(&self) -> &Path {
            self.dir.path()
        }

        fn context(&self) -> PipelineContext {
            PipelineContext::load(&self.config_path).unwrap()
        }

        fn raw_path(&self, session: &str, device: &str) -> PathBuf {
            self.root().join(format!("raw/{session}/{device}.txt"))
        }

        fn resampled_path(&self, session: &str, device: &str) -> PathBuf {
            self.root()
                .join(format!("out/resampled/{session}/{device}_resample_30.0Hz.csv"))
        }

        fn features_path(&self, session: &str) -> PathBuf {
            self.root()
                .join(format!("out/features/{session}_features_30.0Hz.csv"))
        }

        async fn run(&self, mode: BatchMode, sink: SinkKind, jobs: usize) -> BatchReport {
            let config = OrchestratorConfig {
                mode,
                jobs,
                sink,
                sessions: Vec::new(),
            };
            Orchestrator::new(self.context(), config)
                .run()
                .await
                .unwrap()
        }
    }

    /// 10 s of jittered 3-axis readings starting at t = 0
    fn mock(frequency_hz: f64, seed: u64) -> MockSensorSource {
        MockSensorSource::new(MockSensorConfig {
            channels: 3,
            frequency_hz,
            duration_s: 10.0,
            seed,
            ..Default::default()
        })
    }

    /// Frames exactly on the 30 Hz grid
    fn write_frames(path: &Path, count: usize) {
        let text: String = (0..count)
            .map(|k| format!("{} {}\n", k, k as f64 / RATE))
            .collect();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    /// Feature file rows as (frame_index, timestamp, features)
    fn read_features(path: &Path) -> (Vec<String>, Vec<(u64, f64, Vec<f64>)>) {
        let mut reader = csv::Reader::from_path(path).unwrap();
        let header: Vec<String> = reader
            .headers()
            .unwrap()
            .iter()
            .map(str::to_string)
            .collect();
        let rows = reader
            .records()
            .map(|record| {
                let record = record.unwrap();
                let index: u64 = record[0].parse().unwrap();
                let timestamp: f64 = record[1].parse().unwrap();
                let features: Vec<f64> = record
                    .iter()
                    .skip(2)
                    .map(|v| v.parse().unwrap())
                    .collect();
                (index, timestamp, features)
            })
            .collect();
        (header, rows)
    }

    /// End-to-end: raw logs at 148 Hz and 125 Hz -> 30 Hz series -> 300 frame rows
    ///
    /// 验证完整的数据流：
    /// 1. 每个设备重采样为 300 行，间隔恒定
    /// 2. 每帧一行，维度固定
    /// 3. 帧恰好落在网格上时，特征值等于重采样值
    #[tokio::test]
    async fn test_e2e_resample_and_synchronize() {
        let fixture = Fixture::new(&["S07"]);
        let report = fixture.run(BatchMode::Run, SinkKind::Csv, 1).await;
        assert!(report.is_success(), "failures: {:?}", report.failed);
        assert_eq!(report.succeeded[0].rows_resampled, 600);
        assert_eq!(report.succeeded[0].frames_synced, 300);
        assert_eq!(report.succeeded[0].files.len(), 3);

        let ctx = fixture.context();
        let series: Vec<_> = ctx
            .blueprint
            .devices
            .iter()
            .map(|device| {
                let path = fixture.resampled_path("S07", &device.id);
                read_resampled_series(&path, &"S07".into(), device, RATE).unwrap()
            })
            .collect();

        for s in &series {
            assert_eq!(s.len(), 300);
            assert_eq!(s.start, 0.0);
            for k in 1..s.len() {
                let spacing = s.timestamp(k) - s.timestamp(k - 1);
                assert!((spacing - 1.0 / RATE).abs() < 1e-9);
            }
        }

        let (header, rows) = read_features(&fixture.features_path("S07"));
        assert_eq!(
            header,
            vec![
                "frame_index",
                "timestamp",
                "left_arm_x",
                "right_arm_x",
                "left_arm_y",
                "right_arm_y",
                "left_arm_z",
                "right_arm_z",
            ]
        );
        assert_eq!(rows.len(), 300);
        for (k, (index, timestamp, features)) in rows.iter().enumerate() {
            assert_eq!(*index, k as u64);
            assert_eq!(*timestamp, k as f64 / RATE);
            assert_eq!(features.len(), 6);
            let expected =
                ctx.layout
                    .assemble(&[series[0].samples[k].clone(), series[1].samples[k].clone()]);
            assert_eq!(features, &expected, "frame {k}");
        }
    }

    #[tokio::test]
    async fn test_rerun_is_byte_identical() {
        let fixture = Fixture::new(&["S07"]);
        fixture.run(BatchMode::Run, SinkKind::Csv, 1).await;
        let first_series = fs::read(fixture.resampled_path("S07", "left_arm")).unwrap();
        let first_features = fs::read(fixture.features_path("S07")).unwrap();

        fixture.run(BatchMode::Run, SinkKind::Csv, 1).await;
        assert_eq!(
            fs::read(fixture.resampled_path("S07", "left_arm")).unwrap(),
            first_series
        );
        assert_eq!(fs::read(fixture.features_path("S07")).unwrap(), first_features);
    }

    #[tokio::test]
    async fn test_malformed_raw_line_fails_session_without_output() {
        let fixture = Fixture::new(&["S07"]);
        let raw = fixture.raw_path("S07", "right_arm");
        let text = fs::read_to_string(&raw).unwrap();
        let broken: String = text
            .lines()
            .enumerate()
            .map(|(i, line)| {
                if i + 1 == 10 {
                    let timestamp = line.split_whitespace().next().unwrap();
                    format!("{timestamp} 0.5 n/a 0.1\n")
                } else {
                    format!("{line}\n")
                }
            })
            .collect();
        fs::write(&raw, broken).unwrap();

        let report = fixture.run(BatchMode::Run, SinkKind::Csv, 1).await;
        assert!(!report.is_success());
        let failure = &report.failed[0];
        assert_eq!(failure.stage, pipeline::Stage::Resample);
        match &failure.error {
            ContractError::Parse { path, line, .. } => {
                assert_eq!(*line, 10);
                assert_eq!(path, &raw);
            }
            other => panic!("expected parse error, got {other:?}"),
        }

        // The healthy device of the same session is not written either
        assert!(!fixture.resampled_path("S07", "left_arm").exists());
        assert!(!fixture.features_path("S07").exists());
    }

    #[tokio::test]
    async fn test_synchronize_without_resampled_series() {
        let fixture = Fixture::new(&["S07"]);
        let report = fixture.run(BatchMode::Synchronize, SinkKind::Csv, 1).await;

        let failure = &report.failed[0];
        assert_eq!(failure.stage, pipeline::Stage::Synchronize);
        match &failure.error {
            ContractError::MissingSensorStream {
                session, device, ..
            } => {
                assert_eq!(session, "S07");
                assert_eq!(device, "left_arm");
            }
            other => panic!("expected missing stream, got {other:?}"),
        }
        assert!(!fixture.features_path("S07").exists());
    }

    #[tokio::test]
    async fn test_batch_isolates_failing_session() {
        let fixture = Fixture::new(&["S01", "S02", "S03"]);
        fs::remove_file(fixture.raw_path("S02", "left_arm")).unwrap();

        let report = fixture.run(BatchMode::Run, SinkKind::Csv, 3).await;
        assert_eq!(report.total(), 3);

        let ok: Vec<&str> = report.succeeded.iter().map(|s| s.session.as_str()).collect();
        assert_eq!(ok, vec!["S01", "S03"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].session, "S02");
        assert_eq!(report.failed[0].error.kind(), "configuration");

        assert!(fixture.features_path("S01").exists());
        assert!(fixture.features_path("S03").exists());
        assert!(!fixture.features_path("S02").exists());
        assert!(!fixture.resampled_path("S02", "right_arm").exists());

        let summary = report.metrics.summary();
        assert_eq!(summary.sessions_ok, 2);
        assert_eq!(summary.sessions_failed, 1);
    }

    /// 单个数值合法但明显损坏的时间戳只让本 session 失败
    #[tokio::test]
    async fn test_corrupt_timestamp_fails_only_its_session() {
        let fixture = Fixture::new(&["S01", "S02"]);
        let raw = fixture.raw_path("S02", "left_arm");
        let mut text = fs::read_to_string(&raw).unwrap();
        text.push_str("1e18 0.1 0.2 0.3\n");
        fs::write(&raw, text).unwrap();

        let report = fixture.run(BatchMode::Run, SinkKind::Csv, 2).await;
        assert_eq!(report.total(), 2);
        assert_eq!(report.succeeded.len(), 1);
        assert_eq!(report.succeeded[0].session, "S01");
        assert!(fixture.features_path("S01").exists());

        let failure = &report.failed[0];
        assert_eq!(failure.session, "S02");
        assert_eq!(failure.stage, pipeline::Stage::Resample);
        match &failure.error {
            ContractError::Parse { path, message, .. } => {
                assert_eq!(path, &raw);
                assert!(message.contains("limit"), "got: {message}");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
        assert!(!fixture.resampled_path("S02", "left_arm").exists());
        assert!(!fixture.features_path("S02").exists());
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let fixture = Fixture::new(&["S07"]);
        let report = fixture.run(BatchMode::Run, SinkKind::Log, 1).await;

        assert!(report.is_success(), "failures: {:?}", report.failed);
        assert_eq!(report.succeeded[0].frames_synced, 300);
        assert!(report.succeeded[0].files.is_empty());
        assert!(!fixture.root().join("out").exists());
    }

    #[tokio::test]
    async fn test_unknown_session_is_rejected() {
        let fixture = Fixture::new(&["S07"]);
        let config = OrchestratorConfig {
            sessions: vec!["S99".into()],
            ..Default::default()
        };
        let err = Orchestrator::new(fixture.context(), config)
            .run()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("S99"));
    }
}
