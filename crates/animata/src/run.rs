use anyhow::{Context, Result};
use encoder::FfmpegStatus;
use metadata::{ParamSidecar, RenderSettings};
use params::ParameterSet;
use renderer::{GpuRenderer, RenderJob};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::BatchConfig;
use crate::paths::OutputLayout;
use crate::pipeline::render_token;
use crate::report::{BatchReport, TokenReport, TokenStatus};

const WRAPPED_SHADER_DUMP: &str = "debug_wrapped.frag";

pub fn run(cli: Cli) -> Result<BatchReport> {
    let mut config = BatchConfig::resolve(&cli).context("invalid configuration")?;
    let layout = OutputLayout::new(&config.out_root);
    layout.ensure()?;

    if config.metadata_only {
        return write_metadata_only(&config, &layout);
    }

    config.encoders.ffmpeg_available = match encoder::check_ffmpeg() {
        FfmpegStatus::Available(version) => {
            tracing::debug!(%version, "ffmpeg");
            true
        }
        FfmpegStatus::Unknown => {
            tracing::debug!("ffmpeg printed no version");
            true
        }
        FfmpegStatus::NotFound => {
            tracing::warn!("ffmpeg not found on PATH, mp4 and webm will be skipped");
            false
        }
    };

    let mut renderer =
        GpuRenderer::new(&config.renderer).context("failed to initialise the GPU renderer")?;

    if config.debug_dump {
        let path = layout.root().join(WRAPPED_SHADER_DUMP);
        std::fs::write(&path, renderer.wrapped_source())
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "wrote wrapped shader");
    }

    tracing::info!(
        tokens = config.plan.batch_len(config.count),
        resolution = %config.resolution(),
        fps = config.timing.fps(),
        seconds = config.timing.seconds(),
        out = %layout.root().display(),
        "starting batch"
    );

    let mut report = BatchReport::default();
    for (position, token) in config.token_ids() {
        let params = config.plan.params_for(token, position);
        if let Err(err) = write_token_records(&config, &layout, token, &params) {
            tracing::error!(token, error = %format!("{err:#}"), "failed to write token records");
            report.push(TokenReport::failed(token, format!("{err:#}")));
            continue;
        }

        let job = RenderJob::new(
            token,
            params,
            config.timing,
            config.resolution(),
            config.poster_time,
        );
        let dump_root = (config.debug_dump && position == 0).then(|| layout.root());
        let token_report = render_token(&mut renderer, &job, &layout, &config.encoders, dump_root);

        if !matches!(token_report.status, TokenStatus::Failed { .. }) {
            log_token(token, &params, &token_report);
        }
        report.push(token_report);
    }

    report.log_summary();
    Ok(report)
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn settings(config: &BatchConfig) -> RenderSettings {
    let resolution = config.resolution();
    RenderSettings {
        width: resolution.width,
        height: resolution.height,
        fps: config.timing.fps(),
        duration_seconds: config.timing.seconds(),
        poster_frame: config.poster_index(),
    }
}

/// Sidecar and metadata go out before rendering so a crash mid-batch still
/// leaves the records for every token it reached.
fn write_token_records(
    config: &BatchConfig,
    layout: &OutputLayout,
    token: u64,
    params: &ParameterSet,
) -> Result<()> {
    let sweep = config.plan.sweep_kind();
    ParamSidecar::new(token, params, settings(config), sweep).save(&layout.sidecar_path(token))?;
    write_metadata(config, layout, token, params, sweep)
}

fn write_metadata(
    config: &BatchConfig,
    layout: &OutputLayout,
    token: u64,
    params: &ParameterSet,
    sweep: Option<params::SweepKind>,
) -> Result<()> {
    let record = metadata::build(token, params, &config.addressing, &config.metadata, sweep);
    let path = layout.metadata_path(token);
    std::fs::write(&path, record.to_json()?)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn write_metadata_only(config: &BatchConfig, layout: &OutputLayout) -> Result<BatchReport> {
    let mut report = BatchReport::default();
    for (position, token) in config.token_ids() {
        let outcome = rebuild_metadata(config, layout, token, position);
        let token_report = match outcome {
            Ok(()) => TokenReport {
                token_id: token,
                frames_rendered: 0,
                formats: Vec::new(),
                poster: None,
                status: TokenStatus::Complete,
            },
            Err(err) => {
                tracing::error!(token, error = %format!("{err:#}"), "failed to rebuild metadata");
                TokenReport::failed(token, format!("{err:#}"))
            }
        };
        report.push(token_report);
    }
    report.log_summary();
    Ok(report)
}

fn rebuild_metadata(
    config: &BatchConfig,
    layout: &OutputLayout,
    token: u64,
    position: usize,
) -> Result<()> {
    let sidecar_path = layout.sidecar_path(token);
    let sidecar = if sidecar_path.is_file() {
        ParamSidecar::load(&sidecar_path)?
    } else {
        let params = config.plan.params_for(token, position);
        let sidecar = ParamSidecar::new(token, &params, settings(config), config.plan.sweep_kind());
        sidecar.save(&sidecar_path)?;
        tracing::debug!(token, path = %sidecar_path.display(), "sidecar missing, derived parameters");
        sidecar
    };
    write_metadata(config, layout, token, &sidecar.params(), sidecar.sweep)?;
    tracing::info!(token, "metadata written");
    Ok(())
}

fn log_token(token: u64, params: &ParameterSet, report: &TokenReport) {
    tracing::info!(
        token,
        frames = report.frames_rendered,
        status = %report.status,
        "speed={} scale={:.2} dot={:.1} hues={:?}",
        params.rotation_speed,
        params.scale,
        params.dot_divisor,
        params.hues,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use params::SweepKind;

    fn config(out_root: &std::path::Path, cli: Cli) -> BatchConfig {
        let cli = Cli {
            out_root: Some(out_root.to_path_buf()),
            count: Some(3),
            animations_cid: Some("animCid".to_string()),
            images_cid: Some("imageCid".to_string()),
            ..cli
        };
        BatchConfig::merge(&cli, crate::config::FileConfig::default()).unwrap()
    }

    /// Writes records the way a full render does and returns every
    /// metadata file's bytes.
    fn render_path_records(config: &BatchConfig, layout: &OutputLayout) -> Vec<Vec<u8>> {
        config
            .token_ids()
            .map(|(position, token)| {
                let params = config.plan.params_for(token, position);
                write_token_records(config, layout, token, &params).unwrap();
                std::fs::read(layout.metadata_path(token)).unwrap()
            })
            .collect()
    }

    fn metadata_only_records(config: &BatchConfig, layout: &OutputLayout) -> Vec<Vec<u8>> {
        let report = write_metadata_only(config, layout).unwrap();
        assert!(report.is_success());
        config
            .token_ids()
            .map(|(_, token)| std::fs::read(layout.metadata_path(token)).unwrap())
            .collect()
    }

    fn assert_rebuild_matches(config: &BatchConfig, drop_sidecars: bool) {
        let layout = OutputLayout::new(&config.out_root);
        layout.ensure().unwrap();
        let rendered = render_path_records(config, &layout);

        for (_, token) in config.token_ids() {
            std::fs::remove_file(layout.metadata_path(token)).unwrap();
            if drop_sidecars {
                std::fs::remove_file(layout.sidecar_path(token)).unwrap();
            }
        }

        assert_eq!(metadata_only_records(config, &layout), rendered);
    }

    #[test]
    fn metadata_only_reproduces_render_metadata_from_sidecars() {
        let dir = tempfile::tempdir().unwrap();
        assert_rebuild_matches(&config(dir.path(), Cli::default()), false);
    }

    #[test]
    fn metadata_only_reproduces_render_metadata_without_sidecars() {
        let dir = tempfile::tempdir().unwrap();
        assert_rebuild_matches(&config(dir.path(), Cli::default()), true);
    }

    #[test]
    fn metadata_only_reproduces_sweep_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli {
            sweep: Some(SweepKind::Scale),
            sweep_values: Some([0.08, 0.11, 0.15, 0.18]),
            ..Cli::default()
        };
        let config = config(dir.path(), cli);
        assert_eq!(config.token_ids().count(), 4);
        assert_rebuild_matches(&config, false);
    }

    #[test]
    fn metadata_only_run_needs_no_renderer() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli {
            out_root: Some(dir.path().to_path_buf()),
            count: Some(2),
            metadata_only: true,
            ..Cli::default()
        };
        let report = run(cli).unwrap();
        assert_eq!(report.tokens().len(), 2);
        assert!(report.is_success());

        let layout = OutputLayout::new(dir.path());
        for token in [1, 2] {
            assert!(layout.metadata_path(token).is_file());
            assert!(layout.sidecar_path(token).is_file());
            for format in encoder::Format::ALL {
                assert!(!layout.animation_path(token, format).exists());
            }
        }
    }
}
