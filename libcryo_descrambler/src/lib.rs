//! # cryo_descrambler
//!
//! cryo_descrambler turns the raw data streams written by the Cryo ASIC readout (ePix HR,
//! Cryo and FEMB boards) into images. The acquisition system writes `.dat` files made of
//! packets; each packet carries a small header and a payload of 32 bit words. Image
//! packets are gathered into frames, and each frame is descrambled from the order the
//! hardware transmits samples in to a `channels x samples` pixel array.
//!
//! ## Building & Install
//!
//! To build and install the CLI use `cargo install --path ./cryo_descrambler_cli` from the
//! top level repository. The binary is installed to your cargo install location (typically
//! something like `~/.cargo/bin/`).
//!
//! ## Data Format
//!
//! Every packet starts with two little-endian 32 bit words:
//!
//! ```text
//! word 0: number of bytes following this word (flag word + payload)
//! word 1: flags; bits 31-24 hold the packet type (1 = image, 2 = scope)
//! word 2..: payload
//! ```
//!
//! Image packets are assembled into frames (one or more packets per frame depending on the
//! camera). Scope packets hold analog monitor traces packed as two 16 bit samples per word.
//! Any other packet type is skipped.
//!
//! ## Cameras
//!
//! Supported camera layouts are
//!
//! - `cryo64xN` (alias `cryo64x128`): 64 channels x 128 samples, one packet per frame
//! - `cryo64x256`: 64 channels x 256 samples, two packets per frame
//!
//! ## Configuration
//!
//! Configurations are YAML files. A template can be generated with the CLI
//! (`cryo_descrambler_cli new -p config.yml`). The format is as follows:
//!
//! ```yml
//! input_path: None
//! camera: cryo64xN
//! bit_mask: 65535
//! packets_per_frame: null
//! max_frames: null
//! split_by_asic: false
//! chunk_size: 65536
//! max_packet_bytes: 4194304
//! ```
//!
//! - `packets_per_frame`: if `null`, the camera default is used
//! - `max_frames`: stop after this many images; `null` reads the whole file
//! - `split_by_asic`: FEMB boards interleave packets from two ASICs; if set, frames are
//!   built separately for each ASIC (taken from bit 4 of the first payload word)
//!
//! ## Using the library
//!
//! ```no_run
//! use libcryo_descrambler::config::Config;
//! use libcryo_descrambler::frame_source::ReaderSource;
//! use libcryo_descrambler::pipeline::Pipeline;
//! use libcryo_descrambler::pixel_image::PixelImage;
//!
//! let config = Config::default();
//! let source = ReaderSource::open(std::path::Path::new("run.dat"), config.chunk_size).unwrap();
//! let mut images: Vec<PixelImage> = Vec::new();
//! let summary = Pipeline::new(&config).unwrap().run(source, &mut images).unwrap();
//! println!("{summary}");
//! ```
pub mod camera_layout;
pub mod config;
pub mod constants;
pub mod descrambler;
pub mod error;
pub mod frame_assembler;
pub mod frame_source;
pub mod image_stats;
pub mod packet_reader;
pub mod pipeline;
pub mod pixel_image;
pub mod process;
pub mod raw_frame;
pub mod scope;
