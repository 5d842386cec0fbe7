use std::path::PathBuf;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use floodprep::api::{self, BatchReport};
use floodprep::core::auxiliary::{load_auxiliary_keys, verify_auxiliary_coverage};
use floodprep::observer::TracingObserver;
use floodprep::{PipelineParams, RadiometricDirection, ReferenceStrategy};

use super::args::{CliArgs, Command, Inputs};
use super::errors::AppError;

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Config file first, then command-line overrides.
fn build_params(args: &CliArgs) -> Result<PipelineParams, AppError> {
    let mut params = match &args.config {
        Some(path) => PipelineParams::from_json_file(path)?,
        None => PipelineParams::default(),
    };
    if let Some(jobs) = args.jobs {
        if jobs == 0 {
            return Err(AppError::ZeroJobs { jobs });
        }
        params.concurrency = jobs;
    }
    if let Some(crs) = &args.target_crs {
        params.target_crs = crs.clone();
    }
    if let Some(dir) = &args.output_dir {
        params.output_directory = dir.clone();
    }
    if let Some(pols) = &args.polarizations {
        params.polarization_whitelist = pols.clone();
    }
    if let Some(tile_size) = args.tile_size {
        params.tile_size = tile_size;
    }
    if let Some(margin) = args.clip_margin {
        params.clip_margin = margin;
    }
    if let Some(nodata) = args.nodata {
        params.nodata_value = nodata;
    }
    params.validate()?;
    Ok(params)
}

fn rasters(inputs: &Inputs) -> Result<Vec<PathBuf>, AppError> {
    let files = api::collect_rasters(&inputs.inputs)?;
    if files.is_empty() {
        return Err(AppError::NoInputs {
            inputs: inputs.inputs.clone(),
        });
    }
    info!("{} raster file(s) to process", files.len());
    Ok(files)
}

fn summarize(report: &BatchReport) -> Result<(), AppError> {
    for failure in &report.failures {
        warn!(
            "FAILED {:?} [{}]: {}",
            failure.path, failure.kind, failure.message
        );
    }
    info!("Processed: {}", report.processed());
    info!("Errors: {}", report.errors());
    if report.is_success() {
        Ok(())
    } else {
        Err(AppError::BatchFailed {
            failed: report.errors(),
            total: report.processed() + report.errors(),
        })
    }
}

pub fn run(args: CliArgs) -> Result<(), AppError> {
    init_logging(args.log);
    let mut params = build_params(&args)?;
    let observer = TracingObserver;

    let report = match &args.command {
        Command::Reproject { inputs, out_dir } => {
            api::reproject_batch(&rasters(inputs)?, &params, out_dir.as_deref(), &observer)?
        }
        Command::Clip { inputs, cutline } => {
            let files = rasters(inputs)?;
            let cutline = api::prepare_cutline(cutline, &params)?;
            api::clip_batch(&files, &cutline, &params, &observer)?
        }
        Command::Align { inputs, reference } => {
            if let Some(path) = reference {
                params.reference = ReferenceStrategy::Explicit(path.clone());
            }
            api::align_batch(&rasters(inputs)?, &params, None, &observer)?
        }
        Command::ToLinear { inputs } => api::radiometric_batch(
            &rasters(inputs)?,
            RadiometricDirection::ToLinear,
            &params,
            &observer,
        )?,
        Command::ToDb { inputs } => api::radiometric_batch(
            &rasters(inputs)?,
            RadiometricDirection::ToDb,
            &params,
            &observer,
        )?,
        Command::Extract { products, out_dir } => {
            let out_dir = out_dir
                .clone()
                .unwrap_or_else(|| params.output_directory.clone());
            api::extract_batch(products, &out_dir, &params, &observer)?
        }
        Command::Sort { inputs } => api::sort_batch(&rasters(inputs)?, &params, &observer)?,
        Command::CheckAux { inputs, aux } => {
            let files = rasters(inputs)?;
            let keys = load_auxiliary_keys(aux)?;
            verify_auxiliary_coverage(&files, &keys)?;
            info!("Auxiliary data covers all {} input file(s)", files.len());
            return Ok(());
        }
        Command::Prepare { inputs, cutline } => {
            api::prepare_scene(&rasters(inputs)?, cutline, &params, &observer)?
        }
        Command::Finish { inputs } => api::finish_scene(&rasters(inputs)?, &params, &observer)?,
    };

    summarize(&report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use floodprep::{BatchFailure, Polarization};

    #[test]
    fn flags_override_defaults() {
        let args = CliArgs::parse_from([
            "floodprep",
            "--jobs",
            "2",
            "--polarizations",
            "vh",
            "--tile-size",
            "512",
            "--nodata",
            "-1",
            "to-db",
            "a.tif",
        ]);
        let params = build_params(&args).unwrap();
        assert_eq!(params.concurrency, 2);
        assert_eq!(params.polarization_whitelist, vec![Polarization::Vh]);
        assert_eq!(params.tile_size, 512);
        assert_eq!(params.nodata_value, -1.0);
    }

    #[test]
    fn zero_jobs_is_rejected() {
        let args = CliArgs::parse_from(["floodprep", "--jobs", "0", "sort", "a.tif"]);
        assert!(matches!(build_params(&args), Err(AppError::ZeroJobs { .. })));
    }

    #[test]
    fn failed_batch_is_an_error() {
        let mut report = BatchReport::default();
        report.completed.push(PathBuf::from("ok.tif"));
        report.failures.push(BatchFailure {
            path: PathBuf::from("bad.tif"),
            kind: "GeometryError",
            message: "empty".into(),
        });
        assert!(matches!(
            summarize(&report),
            Err(AppError::BatchFailed { failed: 1, total: 2 })
        ));
    }
}
