use std::path::PathBuf;

use clap::Parser;

use iterview_core::{Complex, PlaneRect, Space};

#[derive(Debug, Parser)]
#[command(name = "iterview")]
#[command(about = "Render parameter and dynamical planes of iterated complex functions")]
pub struct Cli {
    /// Registered function name (see --list)
    #[arg(short, long)]
    pub function: Option<String>,

    /// Plane to render: parameter (p) or dynamical (d)
    #[arg(short, long)]
    pub space: Option<Space>,

    /// Plane rectangle as xmin,xmax,ymin,ymax (defaults to the function's range)
    #[arg(short, long, value_parser = parse_rect, allow_hyphen_values = true)]
    pub rect: Option<PlaneRect>,

    /// Frame width in pixels
    #[arg(short = 'W', long)]
    pub width: Option<u32>,

    /// Frame height in pixels (defaults to the rectangle's aspect ratio)
    #[arg(short = 'H', long)]
    pub height: Option<u32>,

    /// Function argument as name=value; repeatable
    #[arg(short, long = "arg", value_parser = parse_arg, allow_hyphen_values = true)]
    pub args: Vec<(String, String)>,

    /// Colormap: formula name, `grayscale`, or a table file
    #[arg(short, long)]
    pub colormap: Option<String>,

    /// Zoom into a pixel selection px,py,pw,ph of the previous frame; repeatable
    #[arg(short, long, value_parser = parse_selection)]
    pub zoom: Vec<[u32; 4]>,

    /// Step back this many zooms through the history before exporting
    #[arg(short, long, default_value_t = 0)]
    pub back: usize,

    /// Overlay the orbit of this point (re,im)
    #[arg(long, value_parser = parse_complex, allow_hyphen_values = true)]
    pub orbit: Option<Complex>,

    /// Orbit steps to draw
    #[arg(long, default_value_t = 100)]
    pub orbit_steps: usize,

    /// Also write a dynamical-space preview for this parameter (re,im)
    #[arg(long, value_parser = parse_complex, allow_hyphen_values = true)]
    pub preview: Option<Complex>,

    /// Run the function's sandbox hook after rendering
    #[arg(long)]
    pub sandbox: bool,

    /// Run the function's annotate hook after rendering
    #[arg(long)]
    pub annotate: bool,

    /// Render on one thread without progressive refinement
    #[arg(long)]
    pub single_threaded: bool,

    /// Worker threads
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Output PNG (defaults to images/<function>-<space>.png next to the executable)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Store this run's view and settings as preferences
    #[arg(long)]
    pub save_prefs: bool,

    /// List functions and colormaps, then exit
    #[arg(long)]
    pub list: bool,
}

fn numbers<const N: usize>(s: &str) -> Result<[f64; N], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != N {
        return Err(format!("expected {N} comma-separated numbers, got {s:?}"));
    }
    let mut out = [0.0; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part
            .parse()
            .map_err(|_| format!("{part:?} is not a number"))?;
    }
    Ok(out)
}

fn parse_rect(s: &str) -> Result<PlaneRect, String> {
    let [xmin, xmax, ymin, ymax] = numbers::<4>(s)?;
    let rect = PlaneRect::new(xmin, xmax, ymin, ymax);
    rect.validate().map_err(|e| e.to_string())?;
    Ok(rect)
}

fn parse_complex(s: &str) -> Result<Complex, String> {
    Complex::parse(s).ok_or_else(|| format!("expected re,im, got {s:?}"))
}

fn parse_selection(s: &str) -> Result<[u32; 4], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(format!("expected px,py,pw,ph, got {s:?}"));
    }
    let mut out = [0u32; 4];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part
            .parse()
            .map_err(|_| format!("{part:?} is not a pixel count"))?;
    }
    Ok(out)
}

fn parse_arg(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got {s:?}"))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_command_line() {
        let cli = Cli::try_parse_from([
            "iterview",
            "-f",
            "mandi",
            "-s",
            "d",
            "--rect",
            "-2,2,-1.5,1.5",
            "-a",
            "C=-0.12,0.75",
            "-a",
            "depth=300",
            "--zoom",
            "10,10,100,80",
            "--orbit",
            "-0.5,0.1",
        ])
        .unwrap();
        assert_eq!(cli.space, Some(Space::Dynamical));
        assert_eq!(cli.rect, Some(PlaneRect::new(-2.0, 2.0, -1.5, 1.5)));
        assert_eq!(cli.args.len(), 2);
        assert_eq!(cli.args[0], ("C".to_string(), "-0.12,0.75".to_string()));
        assert_eq!(cli.zoom, vec![[10, 10, 100, 80]]);
        assert_eq!(cli.orbit, Some(Complex::new(-0.5, 0.1)));
        assert_eq!(cli.back, 0);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(parse_rect("1,0,0,1").is_err());
        assert!(parse_rect("0,1,0").is_err());
        assert!(parse_complex("1").is_err());
        assert!(parse_selection("1,2,3,-4").is_err());
        assert!(parse_arg("depth").is_err());
    }
}
