//! Configuration options.

use std::fmt::{self, Formatter};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{Error as _, Visitor};
use serde::{Deserialize, Deserializer};
use tracing::{error, info};

use crate::wave::WaveParams;

/// Configuration file name, inside the XDG config directory.
const CONFIG_PATH: &str = "horologe/horologe.toml";

#[derive(Deserialize, Default, PartialEq, Debug)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub font: Font,
    pub colors: Colors,
    pub wave: Wave,
    pub clock: Clock,
}

impl Config {
    /// Load the configuration from the default location.
    ///
    /// Falls back to the default configuration if the file is missing or
    /// invalid.
    pub fn load() -> Self {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load the configuration from a file.
    pub fn load_from(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Self::default(),
            Err(err) => {
                error!("Could not read config {path:?}: {err}");
                return Self::default();
            },
        };

        match toml::from_str(&content) {
            Ok(config) => {
                info!("Loaded config from {path:?}");
                config
            },
            Err(err) => {
                error!("Invalid config {path:?}: {err}");
                Self::default()
            },
        }
    }

    /// Default configuration file path.
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_PATH))
    }
}

/// Font configuration.
#[derive(Deserialize, PartialEq, Clone, Debug)]
#[serde(default, deny_unknown_fields)]
pub struct Font {
    /// Font family.
    pub family: String,
    /// Font size.
    pub size: f32,
}

impl Default for Font {
    fn default() -> Self {
        Self { family: "sans".into(), size: 24. }
    }
}

/// Color configuration.
#[derive(Deserialize, PartialEq, Debug)]
#[serde(default, deny_unknown_fields)]
pub struct Colors {
    /// Window background.
    pub background: Color,
    /// Decorative wave fill.
    pub wave: Color,

    /// Readout button background.
    pub button: Color,
    /// Readout button text.
    pub button_text: Color,

    pub hour_hand: Color,
    pub minute_hand: Color,
    pub second_hand: Color,
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            background: Color::new(28, 27, 31),
            wave: Color::new(103, 80, 164),

            button: Color::new(208, 188, 255),
            button_text: Color::new(56, 30, 114),

            hour_hand: Color::new(255, 255, 255),
            minute_hand: Color::new(255, 255, 255),
            second_hand: Color::new(255, 0, 0),
        }
    }
}

/// Decorative wave configuration.
#[derive(Deserialize, PartialEq, Debug)]
#[serde(default, deny_unknown_fields)]
pub struct Wave {
    /// Number of wave crests.
    pub edges: u32,
    /// Radial crest displacement.
    pub amplitude: f32,
    /// Outline allowance subtracted from the radius.
    pub stroke_width: f32,
    /// Rotation in degrees.
    pub rotation: f32,
    /// Diameter of the wave's canvas.
    pub width: f32,
}

impl Default for Wave {
    fn default() -> Self {
        let params = WaveParams::default();
        Self {
            edges: params.edges,
            amplitude: params.amplitude,
            stroke_width: params.stroke_width,
            rotation: params.rotation,
            width: 256.,
        }
    }
}

impl Wave {
    /// Wave shape, with all lengths multiplied by `scale`.
    pub fn params(&self, scale: f32) -> WaveParams {
        WaveParams {
            edges: self.edges,
            amplitude: self.amplitude * scale,
            stroke_width: self.stroke_width * scale,
            rotation: self.rotation,
        }
    }
}

/// Time sampling configuration.
#[derive(Deserialize, PartialEq, Debug)]
#[serde(default, deny_unknown_fields)]
pub struct Clock {
    /// Time between clock updates.
    #[serde(deserialize_with = "duration_ms")]
    pub interval: Duration,
}

impl Default for Clock {
    fn default() -> Self {
        Self { interval: Duration::from_secs(1) }
    }
}

/// RGB color.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn as_f32(&self) -> [f32; 3] {
        [self.r as f32 / 255., self.g as f32 / 255., self.b as f32 / 255.]
    }
}

/// Deserialize rgb color from a hex string.
impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ColorVisitor;

        impl Visitor<'_> for ColorVisitor {
            type Value = Color;

            fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str("hex color like #ff00ff")
            }

            fn visit_str<E>(self, value: &str) -> Result<Color, E>
            where
                E: serde::de::Error,
            {
                let channels = match value.strip_prefix('#') {
                    Some(channels) => channels,
                    None => {
                        return Err(E::custom(format!("color {value:?} is missing leading '#'")));
                    },
                };

                let digits = channels.len();
                if digits != 6 {
                    let msg = format!("color {value:?} has {digits} digits; expected 6");
                    return Err(E::custom(msg));
                }

                match u32::from_str_radix(channels, 16) {
                    Ok(mut color) => {
                        let b = (color & 0xFF) as u8;
                        color >>= 8;
                        let g = (color & 0xFF) as u8;
                        color >>= 8;
                        let r = color as u8;

                        Ok(Color::new(r, g, b))
                    },
                    Err(_) => Err(E::custom(format!("color {value:?} contains non-hex digits"))),
                }
            }
        }

        deserializer.deserialize_str(ColorVisitor)
    }
}

/// Deserialize a non-zero duration from milliseconds.
fn duration_ms<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    match u64::deserialize(deserializer)? {
        0 => Err(D::Error::custom("interval must be at least 1ms")),
        ms => Ok(Duration::from_millis(ms)),
    }
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::process;

    use super::*;

    #[test]
    fn empty_config_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_config() {
        let config: Config = toml::from_str(
            r##"
            [colors]
            wave = "#ff8000"

            [wave]
            edges = 7

            [clock]
            interval = 250
            "##,
        )
        .unwrap();

        assert_eq!(config.colors.wave, Color::new(255, 128, 0));
        assert_eq!(config.colors.background, Colors::default().background);
        assert_eq!(config.wave.edges, 7);
        assert_eq!(config.wave.amplitude, 20.);
        assert_eq!(config.clock.interval, Duration::from_millis(250));
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(toml::from_str::<Config>("[wave]\nfrequency = 3").is_err());
    }

    #[test]
    fn rejects_zero_interval() {
        assert!(toml::from_str::<Config>("[clock]\ninterval = 0").is_err());

        let config: Config = toml::from_str("[clock]\ninterval = 1").unwrap();
        assert_eq!(config.clock.interval, Duration::from_millis(1));
    }

    #[test]
    fn rejects_bad_colors() {
        for color in ["ff00ff", "#ff00f", "#gg00ff"] {
            let toml = format!("[colors]\nbackground = \"{color}\"");
            assert!(toml::from_str::<Config>(&toml).is_err(), "accepted {color}");
        }
    }

    #[test]
    fn scaled_wave_params() {
        let wave = Wave { stroke_width: 4., ..Wave::default() };
        let params = wave.params(2.);
        assert_eq!(params.edges, 12);
        assert_eq!(params.amplitude, 40.);
        assert_eq!(params.stroke_width, 8.);
        assert_eq!(params.rotation, 0.);
    }

    #[test]
    fn missing_file_is_default() {
        let path = env::temp_dir().join("horologe-does-not-exist.toml");
        assert_eq!(Config::load_from(&path), Config::default());
    }

    #[test]
    fn invalid_file_is_default() {
        let path = env::temp_dir().join(format!("horologe-invalid-{}.toml", process::id()));
        fs::write(&path, "[font]\nsize = \"large\"").unwrap();
        let config = Config::load_from(&path);
        let _ = fs::remove_file(&path);

        assert_eq!(config, Config::default());
    }

    #[test]
    fn file_is_loaded() {
        let path = env::temp_dir().join(format!("horologe-valid-{}.toml", process::id()));
        fs::write(&path, "[font]\nfamily = \"mono\"").unwrap();
        let config = Config::load_from(&path);
        let _ = fs::remove_file(&path);

        assert_eq!(config.font.family, "mono");
    }
}
