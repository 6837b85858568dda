use std::collections::BTreeMap;
use std::fmt::Display;

use super::config::Config;
use super::descrambler::ImageDescrambler;
use super::error::{PipelineError, ReaderError, SinkError};
use super::frame_assembler::FrameAssembler;
use super::frame_source::FrameSource;
use super::packet_reader::PacketReader;
use super::pixel_image::PixelImage;
use super::raw_frame::PacketType;
use super::scope::ScopeTrace;

/// The consumer end of the pipeline. Every image built is handed over exactly once.
pub trait ImageSink {
    fn accept_image(&mut self, image: PixelImage) -> Result<(), SinkError>;

    /// Scope traces are dropped unless a sink asks for them
    fn accept_scope(&mut self, _trace: ScopeTrace) -> Result<(), SinkError> {
        Ok(())
    }
}

impl ImageSink for Vec<PixelImage> {
    fn accept_image(&mut self, image: PixelImage) -> Result<(), SinkError> {
        self.push(image);
        Ok(())
    }
}

/// Counters describing what happened over one pass through a source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub packets_read: u64,
    pub images_built: u64,
    pub scope_traces: u64,
    pub packets_ignored: u64,
    pub framing_errors: u64,
    pub shape_mismatches: u64,
    pub partial_packets_dropped: u64,
    pub bytes_read: u64,
}

impl Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "packets: {} images: {} scope traces: {} ignored: {} framing errors: {} shape mismatches: {} dropped partial packets: {} bytes: {}",
            self.packets_read,
            self.images_built,
            self.scope_traces,
            self.packets_ignored,
            self.framing_errors,
            self.shape_mismatches,
            self.partial_packets_dropped,
            self.bytes_read
        )
    }
}

/// Pipeline wires a PacketReader, FrameAssemblers and an ImageDescrambler together.
///
/// Everything runs on the calling thread: each frame is read, assembled and descrambled
/// before the next packet is pulled. Framing errors and malformed frames are logged and
/// skipped. Only a failing source or sink stops a run early.
#[derive(Debug)]
pub struct Pipeline {
    descrambler: ImageDescrambler,
    packets_per_frame: usize,
    split_by_asic: bool,
    max_frames: Option<u64>,
    max_packet_bytes: u32,
    assemblers: BTreeMap<Option<u8>, FrameAssembler>,
}

impl Pipeline {
    pub fn new(config: &Config) -> Result<Self, PipelineError> {
        config.validate()?;
        let layout = config.layout()?;
        Ok(Self {
            packets_per_frame: layout.packets_per_frame,
            descrambler: ImageDescrambler::new(layout),
            split_by_asic: config.split_by_asic,
            max_frames: config.max_frames,
            max_packet_bytes: config.max_packet_bytes,
            assemblers: BTreeMap::new(),
        })
    }

    pub fn descrambler(&self) -> &ImageDescrambler {
        &self.descrambler
    }

    /// Run until the source is exhausted (or the frame limit is hit)
    pub fn run<S, K>(&mut self, source: S, sink: &mut K) -> Result<RunSummary, PipelineError>
    where
        S: FrameSource,
        K: ImageSink + ?Sized,
    {
        self.run_with_progress(source, sink, |_| ())
    }

    /// Same as `run`, calling `progress` with the number of bytes consumed after every
    /// packet
    pub fn run_with_progress<S, K, P>(
        &mut self,
        source: S,
        sink: &mut K,
        mut progress: P,
    ) -> Result<RunSummary, PipelineError>
    where
        S: FrameSource,
        K: ImageSink + ?Sized,
        P: FnMut(u64),
    {
        let mut reader = PacketReader::with_max_packet_bytes(source, self.max_packet_bytes);
        let mut summary = RunSummary::default();
        let ignored_before = self.packets_ignored();

        loop {
            if let Some(limit) = self.max_frames {
                if summary.images_built >= limit {
                    spdlog::info!("Reached frame limit of {limit}, stopping.");
                    break;
                }
            }

            let packet = match reader.next_packet() {
                Ok(Some(packet)) => packet,
                Ok(None) => break,
                Err(ReaderError::Framing(e)) => {
                    spdlog::warn!("{e} -- dropping partial frame and resyncing");
                    summary.framing_errors += 1;
                    summary.partial_packets_dropped += self.discard_partials();
                    continue;
                }
                Err(ReaderError::Source(e)) => return Err(PipelineError::SourceError(e)),
            };
            summary.packets_read += 1;
            progress(reader.bytes_consumed());

            if packet.packet_type() == PacketType::Scope {
                if let Some(trace) = ScopeTrace::from_packet(&packet) {
                    sink.accept_scope(trace)?;
                    summary.scope_traces += 1;
                }
                continue;
            }

            let key = if self.split_by_asic {
                packet.asic_id()
            } else {
                None
            };
            let packets_per_frame = self.packets_per_frame;
            let assembler = self.assemblers.entry(key).or_insert_with(|| match key {
                Some(asic) => FrameAssembler::for_asic(packets_per_frame, asic),
                None => FrameAssembler::new(packets_per_frame),
            });

            if let Some(frame) = assembler.append_packet(packet) {
                match self.descrambler.descramble(&frame) {
                    Ok(image) => {
                        sink.accept_image(image)?;
                        summary.images_built += 1;
                    }
                    Err(e) => {
                        spdlog::warn!("Skipping frame {}: {e}", frame.event_index);
                        summary.shape_mismatches += 1;
                    }
                }
            }
        }

        summary.partial_packets_dropped += self.discard_partials();
        summary.packets_ignored = self.packets_ignored() - ignored_before;
        summary.bytes_read = reader.bytes_consumed();
        spdlog::info!("Run complete -- {summary}");
        Ok(summary)
    }

    /// Packets of unknown type turned away by the assemblers so far
    fn packets_ignored(&self) -> u64 {
        self.assemblers
            .values()
            .map(|assembler| assembler.packets_ignored())
            .sum()
    }

    /// Drop every partially built frame, returning how many packets were thrown away
    fn discard_partials(&mut self) -> u64 {
        self.assemblers
            .values_mut()
            .map(|assembler| assembler.discard_partial() as u64)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera_layout::CameraKind;
    use crate::constants::{IMAGE_PACKET_TYPE, SCOPE_PACKET_TYPE};
    use crate::error::SourceError;
    use crate::frame_source::MemorySource;
    use crate::raw_frame::RawFrame;

    fn source(frames: &[RawFrame]) -> MemorySource {
        let bytes: Vec<u8> = frames.iter().flat_map(|f| f.to_bytes()).collect();
        MemorySource::from_bytes(&bytes, 1000)
    }

    #[test]
    fn test_frame_limit() {
        let config = Config {
            max_frames: Some(2),
            ..Default::default()
        };
        let frames = vec![RawFrame::new(IMAGE_PACKET_TYPE, vec![1; 8192]); 5];
        let mut images: Vec<PixelImage> = Vec::new();
        let summary = Pipeline::new(&config)
            .unwrap()
            .run(source(&frames), &mut images)
            .unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(summary.images_built, 2);
    }

    #[test]
    fn test_shape_mismatch_skips_frame() {
        let config = Config::default();
        let frames = vec![
            RawFrame::new(IMAGE_PACKET_TYPE, vec![1; 8000]),
            RawFrame::new(IMAGE_PACKET_TYPE, vec![2; 8192]),
        ];
        let mut images: Vec<PixelImage> = Vec::new();
        let summary = Pipeline::new(&config)
            .unwrap()
            .run(source(&frames), &mut images)
            .unwrap();
        assert_eq!(summary.shape_mismatches, 1);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].get(0, 0), Some(2));
        assert_eq!(images[0].event_index, 1);
    }

    #[test]
    fn test_split_by_asic() {
        let config = Config {
            camera: CameraKind::Cryo64x128,
            packets_per_frame: Some(2),
            split_by_asic: true,
            ..Default::default()
        };
        let asic0 = RawFrame::new(IMAGE_PACKET_TYPE, vec![0x00; 4096]);
        let asic1 = RawFrame::new(IMAGE_PACKET_TYPE, vec![0x10; 4096]);
        // Interleaved packets from the two ASICs
        let frames = vec![asic0.clone(), asic1.clone(), asic0, asic1];
        let mut images: Vec<PixelImage> = Vec::new();
        let summary = Pipeline::new(&config)
            .unwrap()
            .run(source(&frames), &mut images)
            .unwrap();
        assert_eq!(summary.images_built, 2);
        assert_eq!(images[0].asic_id, Some(0));
        assert_eq!(images[1].asic_id, Some(1));
        assert!(images[1].data().iter().all(|&s| s == 0x10));
    }

    #[derive(Default)]
    struct ScopeCollector {
        traces: Vec<ScopeTrace>,
        images: usize,
    }

    impl ImageSink for ScopeCollector {
        fn accept_image(&mut self, _image: PixelImage) -> Result<(), SinkError> {
            self.images += 1;
            Ok(())
        }

        fn accept_scope(&mut self, trace: ScopeTrace) -> Result<(), SinkError> {
            self.traces.push(trace);
            Ok(())
        }
    }

    #[test]
    fn test_scope_traces_routed_to_sink() {
        let frames = vec![
            RawFrame::new(SCOPE_PACKET_TYPE, vec![0x0002_0001]),
            RawFrame::new(IMAGE_PACKET_TYPE, vec![0; 8192]),
            RawFrame::new(0x09, vec![1, 2, 3]),
        ];
        let mut sink = ScopeCollector::default();
        let summary = Pipeline::new(&Config::default())
            .unwrap()
            .run(source(&frames), &mut sink)
            .unwrap();
        assert_eq!(sink.traces[0].samples, vec![1, 2]);
        assert_eq!(sink.images, 1);
        assert_eq!(summary.scope_traces, 1);
        assert_eq!(summary.packets_ignored, 1);
    }

    struct FailingSink;

    impl ImageSink for FailingSink {
        fn accept_image(&mut self, _image: PixelImage) -> Result<(), SinkError> {
            Err(SinkError::Rejected(String::from("disk full")))
        }
    }

    #[test]
    fn test_sink_failure_aborts() {
        let frames = vec![RawFrame::new(IMAGE_PACKET_TYPE, vec![0; 8192])];
        let result = Pipeline::new(&Config::default())
            .unwrap()
            .run(source(&frames), &mut FailingSink);
        assert!(matches!(result, Err(PipelineError::SinkError(_))));
    }

    /// Hands out its chunks, then fails instead of ending
    struct BrokenSource {
        chunks: Vec<Vec<u8>>,
    }

    impl FrameSource for BrokenSource {
        fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, SourceError> {
            if self.chunks.is_empty() {
                return Err(SourceError::IOError(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "device unplugged",
                )));
            }
            Ok(Some(self.chunks.remove(0)))
        }
    }

    #[test]
    fn test_source_failure_aborts() {
        let frame = RawFrame::new(IMAGE_PACKET_TYPE, vec![3; 8192]);
        let source = BrokenSource {
            chunks: vec![frame.to_bytes()],
        };
        let mut images: Vec<PixelImage> = Vec::new();
        let result = Pipeline::new(&Config::default())
            .unwrap()
            .run(source, &mut images);
        assert!(matches!(result, Err(PipelineError::SourceError(_))));
        assert_eq!(images.len(), 1);
    }

    #[test]
    fn test_unknown_packets_counted_per_run() {
        let frames = vec![
            RawFrame::new(0x07, vec![1]),
            RawFrame::new(IMAGE_PACKET_TYPE, vec![0; 8192]),
            RawFrame::new(0x08, vec![2]),
        ];
        let mut pipeline = Pipeline::new(&Config::default()).unwrap();
        let mut images: Vec<PixelImage> = Vec::new();
        let first = pipeline.run(source(&frames), &mut images).unwrap();
        let second = pipeline.run(source(&frames), &mut images).unwrap();
        assert_eq!(first.packets_ignored, 2);
        assert_eq!(second.packets_ignored, 2);
        assert_eq!(images.len(), 2);
    }
}
