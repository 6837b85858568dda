use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use super::config::Config;
use super::error::{ProcessorError, SinkError, SourceError};
use super::frame_source::ReaderSource;
use super::image_stats::{baseline_stats, ImageStack};
use super::pipeline::{ImageSink, Pipeline, RunSummary};
use super::pixel_image::PixelImage;
use super::scope::ScopeTrace;

/// Sink which folds every image into per-ASIC statistics.
///
/// Images read without ASIC splitting all land under the `None` key.
#[derive(Debug, Default)]
pub struct StatsSink {
    pub stacks: BTreeMap<Option<u8>, ImageStack>,
    pub last_images: BTreeMap<Option<u8>, PixelImage>,
    pub scope_traces: u64,
}

impl ImageSink for StatsSink {
    fn accept_image(&mut self, image: PixelImage) -> Result<(), SinkError> {
        self.stacks.entry(image.asic_id).or_default().push(&image)?;
        self.last_images.insert(image.asic_id, image);
        Ok(())
    }

    fn accept_scope(&mut self, _trace: ScopeTrace) -> Result<(), SinkError> {
        self.scope_traces += 1;
        Ok(())
    }
}

/// Write a fraction into the shared progress value, ignoring a poisoned lock
fn report_progress(status: &Arc<Mutex<f32>>, progress: f32) {
    if let Ok(mut stat) = status.lock() {
        *stat = progress;
    }
}

/// Run the configured input file through the pipeline, gathering statistics.
///
/// Progress (0.0 to 1.0, by bytes) is published through `status`.
pub fn process_file(
    config: &Config,
    status: Arc<Mutex<f32>>,
) -> Result<(RunSummary, StatsSink), ProcessorError> {
    if !config.does_input_exist() {
        return Err(SourceError::BadFilePath(config.input_path.clone()).into());
    }
    let total_bytes = config
        .input_path
        .metadata()
        .map_err(SourceError::IOError)?
        .len();
    spdlog::info!(
        "Total input size: {}",
        human_bytes::human_bytes(total_bytes as f64)
    );

    let source = ReaderSource::open(&config.input_path, config.chunk_size)?;
    let mut pipeline = Pipeline::new(config)?;
    let mut sink = StatsSink::default();

    let flush_frac: f32 = 0.01;
    let flush_val = ((total_bytes as f64 * flush_frac as f64) as u64).max(1);
    let mut last_flush: u64 = 0;
    report_progress(&status, 0.0);
    let summary = pipeline.run_with_progress(source, &mut sink, |bytes| {
        if bytes - last_flush >= flush_val {
            last_flush = bytes;
            report_progress(&status, bytes as f32 / total_bytes.max(1) as f32);
        }
    })?;
    report_progress(&status, 1.0);

    Ok((summary, sink))
}

/// Log what the statistics show for each ASIC
fn log_stats(sink: &StatsSink) -> Result<(), ProcessorError> {
    for (asic, stack) in sink.stacks.iter() {
        let label = match asic {
            Some(id) => format!("ASIC {id}"),
            None => String::from("camera"),
        };
        let dark = stack.mean()?;
        let noise = stack.std()?;
        spdlog::info!(
            "{label}: {} images of shape {:?}, mean dark level {:.3} ADU, mean noise {:.3} ADU",
            stack.len(),
            dark.dim(),
            dark.mean().unwrap_or(0.0),
            noise.mean().unwrap_or(0.0)
        );
        if let Some(image) = sink.last_images.get(asic) {
            let (baseline, spread) = baseline_stats(image);
            for (row, (avg, std)) in baseline.iter().zip(spread.iter()).enumerate() {
                spdlog::debug!("{label} channel {row}: baseline {avg:.3} +/- {std:.3}");
            }
        }
    }
    if sink.scope_traces > 0 {
        spdlog::info!("Saw {} scope traces", sink.scope_traces);
    }
    Ok(())
}

/// The function to be called by a separate thread (typically the CLI).
///
/// Processes the configured file and logs the resulting statistics.
pub fn process(config: Config, status: Arc<Mutex<f32>>) -> Result<RunSummary, ProcessorError> {
    spdlog::info!("Processing {}...", config.input_path.to_string_lossy());
    let (summary, sink) = process_file(&config, status)?;
    log_stats(&sink)?;
    spdlog::info!("Finished processing {}.", config.input_path.to_string_lossy());
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{IMAGE_PACKET_TYPE, SCOPE_PACKET_TYPE};
    use crate::raw_frame::RawFrame;
    use std::io::Write;

    #[test]
    fn test_process_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let frames = [
            RawFrame::new(IMAGE_PACKET_TYPE, vec![100; 8192]),
            RawFrame::new(SCOPE_PACKET_TYPE, vec![0; 32]),
            RawFrame::new(IMAGE_PACKET_TYPE, vec![200; 8192]),
        ];
        for frame in frames.iter() {
            file.write_all(&frame.to_bytes()).unwrap();
        }
        file.flush().unwrap();

        let config = Config {
            input_path: file.path().to_path_buf(),
            chunk_size: 1024,
            ..Default::default()
        };
        let status = Arc::new(Mutex::new(0.0));
        let (summary, sink) = process_file(&config, status.clone()).unwrap();
        assert_eq!(summary.images_built, 2);
        assert_eq!(sink.scope_traces, 1);
        let stack = &sink.stacks[&None];
        assert_eq!(stack.mean().unwrap()[[3, 7]], 150.0);
        assert_eq!(stack.std().unwrap()[[63, 0]], 50.0);
        assert_eq!(*status.lock().unwrap(), 1.0);
    }

    #[test]
    fn test_process_missing_file() {
        let config = Config {
            input_path: std::path::PathBuf::from("/no/such/run.dat"),
            ..Default::default()
        };
        let result = process(config, Arc::new(Mutex::new(0.0)));
        assert!(matches!(
            result,
            Err(ProcessorError::SourceError(SourceError::BadFilePath(_)))
        ));
    }
}
