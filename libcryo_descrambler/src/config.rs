use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::camera_layout::{CameraKind, CameraLayout};
use super::constants::{DEFAULT_BIT_MASK, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_PACKET_BYTES};
use super::error::ConfigError;

/// Structure representing the application configuration. Contains the input file and
/// the camera description.
/// Configs are seralizable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub input_path: PathBuf,
    pub camera: CameraKind,
    pub bit_mask: u32,
    pub packets_per_frame: Option<usize>,
    pub max_frames: Option<u64>,
    pub split_by_asic: bool,
    pub chunk_size: usize,
    pub max_packet_bytes: u32,
}

impl Default for Config {
    /// Generate a new Config object. The input path will be invalid
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("None"),
            camera: CameraKind::default(),
            bit_mask: DEFAULT_BIT_MASK,
            packets_per_frame: None,
            max_frames: None,
            split_by_asic: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_packet_bytes: DEFAULT_MAX_PACKET_BYTES,
        }
    }
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        let config = serde_yaml::from_str::<Self>(&yaml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the fields which cannot be checked by the type system alone
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::BadChunkSize);
        }
        self.layout()?;
        Ok(())
    }

    /// Build the camera layout this config describes, applying the mask and any packet
    /// count override
    pub fn layout(&self) -> Result<CameraLayout, ConfigError> {
        let layout = CameraLayout::new(self.camera).with_bit_mask(self.bit_mask);
        match self.packets_per_frame {
            Some(packets) => Ok(layout.with_packets_per_frame(packets)?),
            None => Ok(layout),
        }
    }

    pub fn does_input_exist(&self) -> bool {
        self.input_path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LayoutError;

    #[test]
    fn test_yaml_round_trip() {
        let config = Config {
            camera: CameraKind::Cryo64x256,
            max_frames: Some(4),
            ..Default::default()
        };
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("camera: cryo64x256"));
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_parses_script_camera_name() {
        let yaml = "input_path: run.dat\n\
                    camera: cryo64xN\n\
                    bit_mask: 16383\n\
                    packets_per_frame: 2\n\
                    max_frames: null\n\
                    split_by_asic: true\n\
                    chunk_size: 4096\n\
                    max_packet_bytes: 1048576\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.camera, CameraKind::Cryo64x128);
        let layout = config.layout().unwrap();
        assert_eq!(layout.bit_mask, 0x3fff);
        assert_eq!(layout.packets_per_frame, 2);
    }

    #[test]
    fn test_unknown_camera_rejected() {
        let yaml = "input_path: run.dat\ncamera: epix100\nbit_mask: 1\npackets_per_frame: null\nmax_frames: null\nsplit_by_asic: false\nchunk_size: 1\nmax_packet_bytes: 8\n";
        assert!(serde_yaml::from_str::<Config>(yaml).is_err());
    }

    #[test]
    fn test_validate() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());
        config.packets_per_frame = Some(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::LayoutError(LayoutError::BadPacketCount(0)))
        ));
        config.packets_per_frame = None;
        config.chunk_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::BadChunkSize)));
    }

    #[test]
    fn test_missing_config_file() {
        let result = Config::read_config_file(Path::new("/no/such/config.yml"));
        assert!(matches!(result, Err(ConfigError::BadFilePath(_))));
    }
}
