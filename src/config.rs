//! Command line configuration.

use std::{ffi::OsString, fmt, str::FromStr};

use anyhow::{Context as _, bail, ensure};
use pico_args::Arguments;

pub const HELP: &str = "\
orbit-shapes

Procedurally generated shapes rendered with an orbiting camera.

usage: orbit-shapes [options]

Meta:
  -h --help            This menu.

Scene:
  --demo <name>        Scene to show ('shapes', 'land'). Default shapes.

Rendering:
  --frames <count>     Frame resources in flight. Default 3.
  --msaa               Start with 4x multisampling. F2 toggles it at runtime.
  --solid              Fill triangles instead of drawing wireframes.

Windowing:
  --width <px>         Initial client width. Default 1280.
  --height <px>        Initial client height. Default 720.
  --title <text>       Window caption.

Controls:
  left drag orbits, right drag zooms, Escape quits.
";

/// Which hard-coded scene to build.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum DemoKind {
    #[default]
    Shapes,
    LandAndWaves,
}

impl FromStr for DemoKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "shapes" => Ok(Self::Shapes),
            "land" | "waves" | "land-and-waves" => Ok(Self::LandAndWaves),
            other => bail!("Unknown demo '{}', expected 'shapes' or 'land'", other),
        }
    }
}

impl fmt::Display for DemoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shapes => f.write_str("shapes"),
            Self::LandAndWaves => f.write_str("land"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub demo: DemoKind,
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub frame_resources: usize,
    pub msaa: bool,
    pub wireframe: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            demo: DemoKind::Shapes,
            title: "Orbit Shapes".to_string(),
            width: 1280,
            height: 720,
            frame_resources: 3,
            msaa: false,
            wireframe: true,
        }
    }
}

impl AppConfig {
    /// Read the process arguments. `Ok(None)` means help was requested.
    pub fn from_env() -> anyhow::Result<Option<Self>> {
        // Skip the binary name.
        Self::parse(std::env::args_os().skip(1).collect())
    }

    pub fn parse(args: Vec<OsString>) -> anyhow::Result<Option<Self>> {
        let mut args = Arguments::from_vec(args);

        if args.contains(["-h", "--help"]) {
            return Ok(None);
        }

        let mut config = Self::default();

        if let Some(demo) = args.opt_value_from_str::<_, DemoKind>("--demo")? {
            config.demo = demo;
            if demo == DemoKind::LandAndWaves {
                config.title = "Land and Waves".to_string();
            }
        }
        if let Some(frames) = args.opt_value_from_str("--frames")? {
            config.frame_resources = frames;
        }
        if let Some(width) = args.opt_value_from_str("--width")? {
            config.width = width;
        }
        if let Some(height) = args.opt_value_from_str("--height")? {
            config.height = height;
        }
        if let Some(title) = args.opt_value_from_str("--title")? {
            config.title = title;
        }
        config.msaa = args.contains("--msaa");
        config.wireframe = !args.contains("--solid");

        let remaining = args.finish();
        if !remaining.is_empty() {
            bail!("Unexpected arguments: {:?}\n\n{}", remaining, HELP);
        }

        config.validate().context("Invalid configuration")?;
        Ok(Some(config))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.frame_resources >= 1,
            "At least one frame resource is required"
        );
        ensure!(
            self.width > 0 && self.height > 0,
            "The window size must not be zero ({}x{})",
            self.width,
            self.height
        );
        Ok(())
    }
}
